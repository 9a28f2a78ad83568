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

use fixedbitset::FixedBitSet;
use fxhash::FxHashSet;
use multiplot_model::prelude::*;

/// A prefix of a group's members, considered for placement as one plot.
#[derive(Debug, Clone, PartialEq)]
pub struct SubPlot {
    plot: usize,
    members: Vec<usize>,
    probability: f64,
}

impl SubPlot {
    fn new(plot: usize, members: Vec<usize>, points: &[DataPoint]) -> Self {
        let probability = members.iter().map(|&m| points[m].probability()).sum();
        Self {
            plot,
            members,
            probability,
        }
    }

    /// Index of the group in the grouping.
    #[inline]
    pub fn plot(&self) -> usize {
        self.plot
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

    #[inline]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Members not in `shown` and their probability mass.
    #[inline]
    pub fn unseen(&self, shown: &FixedBitSet, points: &[DataPoint]) -> (usize, f64) {
        self.members
            .iter()
            .filter(|&&m| !shown.contains(m))
            .fold((0, 0.0), |(n, p), &m| (n + 1, p + points[m].probability()))
    }
}

/// Nested prefixes of size `1..=len` for every group, in group order.
pub fn sub_plots(grouping: &Grouping) -> Vec<SubPlot> {
    let mut out = Vec::new();
    for (slot, plot) in grouping.plots().iter().enumerate() {
        for k in 1..=plot.len() {
            out.push(SubPlot::new(
                slot,
                plot.members()[..k].to_vec(),
                grouping.points(),
            ));
        }
    }
    out
}

/// Drops every candidate of `plot`.
pub fn retire(candidates: &mut Vec<SubPlot>, plot: usize) {
    candidates.retain(|c| c.plot != plot);
}

/// Removes shown data points from every candidate, drops candidates that end
/// up empty and keeps only the first of several identical member lists.
pub fn remove_shown(candidates: &mut Vec<SubPlot>, shown: &FixedBitSet, points: &[DataPoint]) {
    let mut seen: FxHashSet<Vec<usize>> = FxHashSet::default();
    candidates.retain_mut(|c| {
        if c.members.iter().any(|&m| shown.contains(m)) {
            c.members.retain(|&m| !shown.contains(m));
            c.probability = c.members.iter().map(|&m| points[m].probability()).sum();
        }
        !c.members.is_empty() && seen.insert(c.members.clone())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouping() -> Grouping {
        let rows: [(f64, [usize; 2]); 4] = [
            (0.4, [0, 0]),
            (0.3, [1, 0]),
            (0.2, [2, 0]),
            (0.1, [0, 1]),
        ];
        let points = rows
            .iter()
            .enumerate()
            .map(|(i, (p, v))| DataPoint::new(DataPointIdentifier::new(i), v.to_vec(), *p))
            .collect();
        Grouping::build(&CandidateSet::new(points, vec![3, 3]).unwrap())
    }

    #[test]
    fn test_sub_plots_are_nested_prefixes() {
        let g = grouping();
        let subs = sub_plots(&g);
        assert_eq!(subs.len(), 5);
        assert_eq!(subs[0].members(), &[0]);
        assert_eq!(subs[1].members(), &[0, 1]);
        assert_eq!(subs[2].members(), &[0, 1, 2]);
        assert_eq!(subs[3].members(), &[0]);
        assert_eq!(subs[4].members(), &[0, 3]);
        assert!((subs[2].probability() - 0.9).abs() < 1e-12);
        assert_eq!(subs[4].plot(), 1);
    }

    #[test]
    fn test_remove_shown_prunes_and_dedups() {
        let g = grouping();
        let mut subs = sub_plots(&g);
        retire(&mut subs, 0);
        assert_eq!(subs.len(), 2);

        let mut shown = FixedBitSet::with_capacity(g.nr_points());
        shown.insert(0);
        remove_shown(&mut subs, &shown, g.points());

        // {0} vanished, {0, 3} became {3}.
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].members(), &[3]);
        assert!((subs[0].probability() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_remove_shown_keeps_first_of_identical_lists() {
        let g = grouping();
        let mut subs = sub_plots(&g);
        let mut shown = FixedBitSet::with_capacity(g.nr_points());
        shown.insert(1);
        remove_shown(&mut subs, &shown, g.points());

        // {0, 1} collapses onto {0}; the first {0} of plot 0 survives.
        let plots: Vec<usize> = subs.iter().map(SubPlot::plot).collect();
        assert_eq!(plots, vec![0, 0, 1]);
        assert_eq!(subs[0].members(), &[0]);
        assert_eq!(subs[1].members(), &[0, 2]);
        assert_eq!(subs[2].members(), &[0, 3]);
    }

    #[test]
    fn test_unseen_counts_members_outside_shown_set() {
        let g = grouping();
        let subs = sub_plots(&g);
        let mut shown = FixedBitSet::with_capacity(g.nr_points());
        shown.insert(1);
        let (n, p) = subs[2].unseen(&shown, g.points());
        assert_eq!(n, 2);
        assert!((p - 0.6).abs() < 1e-12);
    }
}
