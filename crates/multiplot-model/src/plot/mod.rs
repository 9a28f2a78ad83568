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

pub mod grouping;

/// Canonical identity of a group: the free dimension together with the
/// mixed-radix point id that has the free dimension zeroed out.
///
/// The free dimension is part of the identity. The zeroed point id alone is
/// not unique across dimensions: `(0, 0)` yields group id `0` for both of its
/// free dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlotId {
    free_index: usize,
    group: u64,
}

impl PlotId {
    #[inline]
    pub fn new(free_index: usize, group: u64) -> Self {
        Self { free_index, group }
    }

    #[inline]
    pub fn free_index(&self) -> usize {
        self.free_index
    }

    #[inline]
    pub fn group(&self) -> u64 {
        self.group
    }
}

impl std::fmt::Display for PlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.free_index, self.group)
    }
}

/// A group of data points that agree on every dimension except the free one.
///
/// Members are indices into the data point list the group was built from and
/// are ordered by probability, most probable first.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    id: PlotId,
    members: Vec<usize>,
    probability: f64,
    cost: f64,
}

impl Plot {
    #[inline]
    pub fn new(id: PlotId) -> Self {
        Self {
            id,
            members: Vec::new(),
            probability: 0.0,
            cost: 0.0,
        }
    }

    #[inline]
    pub fn id(&self) -> PlotId {
        self.id
    }

    #[inline]
    pub fn free_index(&self) -> usize {
        self.id.free_index()
    }

    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of member probabilities.
    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Estimated processing cost per displayed data point.
    #[inline]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    #[inline]
    pub fn set_cost(&mut self, cost: f64) {
        self.cost = cost;
    }

    #[inline]
    pub(crate) fn push_member(&mut self, index: usize, probability: f64) {
        self.members.push(index);
        self.probability += probability;
    }

    #[inline]
    pub(crate) fn members_mut(&mut self) -> &mut Vec<usize> {
        &mut self.members
    }
}
