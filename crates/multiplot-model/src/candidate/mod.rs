// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod err;
pub mod loader;

use crate::{
    candidate::err::{
        CandidateSetError, CardinalityOverflowError, DimensionMismatchError,
        InvalidProbabilityError, ValueOutOfRangeError,
    },
    common::DataPointIdentifier,
};

/// One fully instantiated candidate query.
///
/// The query is encoded as a vector with one value index per replaceable
/// template slot. `probability` is the confidence that this query is what the
/// user asked for. `cost` is the estimated processing cost and starts at
/// `+inf` until a cost estimate lowers it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    id: DataPointIdentifier,
    vector: Vec<usize>,
    probability: f64,
    cost: f64,
    highlighted: bool,
}

impl DataPoint {
    #[inline]
    pub fn new(id: DataPointIdentifier, vector: Vec<usize>, probability: f64) -> Self {
        Self {
            id,
            vector,
            probability,
            cost: f64::INFINITY,
            highlighted: false,
        }
    }

    #[inline]
    pub fn id(&self) -> DataPointIdentifier {
        self.id
    }

    #[inline]
    pub fn vector(&self) -> &[usize] {
        &self.vector
    }

    #[inline]
    pub fn nr_dims(&self) -> usize {
        self.vector.len()
    }

    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Lowers the cost to `cost` if it is cheaper than the current estimate.
    #[inline]
    pub fn set_cost(&mut self, cost: f64) {
        self.cost = self.cost.min(cost);
    }

    #[inline]
    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    #[inline]
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }
}

impl std::fmt::Display for DataPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:?} p={:.4}", self.id, self.vector, self.probability)
    }
}

/// Validated candidate list together with the per-dimension cardinalities.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    points: Vec<DataPoint>,
    max_indices: Vec<usize>,
}

impl CandidateSet {
    pub fn new(points: Vec<DataPoint>, max_indices: Vec<usize>) -> Result<Self, CandidateSetError> {
        let nr_dims = max_indices.len();
        max_indices
            .iter()
            .try_fold(1u64, |acc, &m| acc.checked_mul(m as u64))
            .ok_or_else(|| CardinalityOverflowError::new(max_indices.clone()))?;

        for point in &points {
            if point.nr_dims() != nr_dims {
                return Err(
                    DimensionMismatchError::new(point.id(), nr_dims, point.nr_dims()).into(),
                );
            }
            for (dim, (&value, &cardinality)) in
                point.vector().iter().zip(max_indices.iter()).enumerate()
            {
                if value >= cardinality {
                    return Err(
                        ValueOutOfRangeError::new(point.id(), dim, value, cardinality).into(),
                    );
                }
            }
            let p = point.probability();
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(InvalidProbabilityError::new(point.id(), p).into());
            }
        }

        Ok(Self {
            points,
            max_indices,
        })
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            max_indices: Vec::new(),
        }
    }

    #[inline]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[inline]
    pub fn max_indices(&self) -> &[usize] {
        &self.max_indices
    }

    #[inline]
    pub fn nr_dims(&self) -> usize {
        self.max_indices.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn total_probability(&self) -> f64 {
        self.points.iter().map(DataPoint::probability).sum()
    }

    /// Keeps the `k` most probable candidates. Ties are broken by input
    /// position and the survivors keep their input order.
    pub fn top_k(&self, k: usize) -> Self {
        if k >= self.points.len() {
            return self.clone();
        }
        let mut order: Vec<usize> = (0..self.points.len()).collect();
        order.sort_by(|&a, &b| {
            self.points[b]
                .probability()
                .total_cmp(&self.points[a].probability())
                .then_with(|| a.cmp(&b))
        });
        order.truncate(k);
        order.sort_unstable();

        Self {
            points: order.into_iter().map(|i| self.points[i].clone()).collect(),
            max_indices: self.max_indices.clone(),
        }
    }

    #[inline]
    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dp(id: usize, vector: &[usize], p: f64) -> DataPoint {
        DataPoint::new(DataPointIdentifier::new(id), vector.to_vec(), p)
    }

    #[test]
    fn test_cost_starts_infinite_and_only_decreases() {
        let mut point = dp(0, &[0], 1.0);
        assert!(point.cost().is_infinite());

        point.set_cost(10.0);
        assert_eq!(point.cost(), 10.0);
        point.set_cost(25.0);
        assert_eq!(point.cost(), 10.0);
        point.set_cost(3.5);
        assert_eq!(point.cost(), 3.5);
    }

    #[test]
    fn test_new_accepts_valid_set() {
        let set = CandidateSet::new(
            vec![dp(0, &[0, 1], 0.5), dp(1, &[2, 0], 0.5)],
            vec![3, 2],
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.nr_dims(), 2);
        assert!((set.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_new_accepts_empty_set() {
        let set = CandidateSet::new(Vec::new(), vec![4, 4]).unwrap();
        assert!(set.is_empty());
        assert!(CandidateSet::empty().is_empty());
    }

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let err = CandidateSet::new(vec![dp(3, &[0], 1.0)], vec![2, 2]).unwrap_err();
        match err {
            CandidateSetError::DimensionMismatch(e) => {
                assert_eq!(e.id(), DataPointIdentifier::new(3));
                assert_eq!(e.expected(), 2);
                assert_eq!(e.found(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_rejects_value_out_of_range() {
        let err = CandidateSet::new(vec![dp(0, &[0, 2], 1.0)], vec![2, 2]).unwrap_err();
        assert!(matches!(err, CandidateSetError::ValueOutOfRange(e) if e.dimension() == 1));
    }

    #[test]
    fn test_new_rejects_invalid_probability() {
        for p in [f64::NAN, -0.1, 1.5, f64::INFINITY] {
            let err = CandidateSet::new(vec![dp(0, &[0], p)], vec![1]).unwrap_err();
            assert!(matches!(err, CandidateSetError::InvalidProbability(_)));
        }
    }

    #[test]
    fn test_new_rejects_cardinality_overflow() {
        let err = CandidateSet::new(Vec::new(), vec![usize::MAX, 3]).unwrap_err();
        assert!(matches!(err, CandidateSetError::CardinalityOverflow(_)));
    }

    #[test]
    fn test_top_k_keeps_most_probable_in_input_order() {
        let set = CandidateSet::new(
            vec![
                dp(0, &[0], 0.1),
                dp(1, &[1], 0.4),
                dp(2, &[2], 0.2),
                dp(3, &[3], 0.3),
            ],
            vec![4],
        )
        .unwrap();

        let top = set.top_k(2);
        let ids: Vec<usize> = top.points().iter().map(|p| p.id().into_inner()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(set.top_k(10), set);
    }
}
