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

use crate::{
    candidate::{CandidateSet, DataPoint},
    plot::{Plot, PlotId},
};
use fxhash::FxHashMap;
use smallvec::SmallVec;

/// Cumulative cardinalities: `cardinal[0] = 1`, `cardinal[k + 1] = cardinal[k] * max_indices[k]`.
///
/// The candidate set guarantees that the full product fits into 64 bits.
#[inline]
pub fn cardinals(max_indices: &[usize]) -> Vec<u64> {
    let mut cardinal = Vec::with_capacity(max_indices.len());
    let mut acc = 1u64;
    for &m in max_indices {
        cardinal.push(acc);
        acc = acc.saturating_mul(m as u64);
    }
    cardinal
}

/// Mixed-radix scalar identity of a vector.
#[inline]
pub fn point_id(cardinal: &[u64], vector: &[usize]) -> u64 {
    cardinal
        .iter()
        .zip(vector)
        .map(|(&c, &v)| c * v as u64)
        .sum()
}

/// Identity of the group of `vector` when `free` is the free dimension.
#[inline]
pub fn group_id(cardinal: &[u64], vector: &[usize], free: usize) -> PlotId {
    let full = point_id(cardinal, vector);
    PlotId::new(free, full - cardinal[free] * vector[free] as u64)
}

/// Per-call candidate model: a private copy of the data points and the
/// surviving groups over them.
#[derive(Debug, Clone)]
pub struct Grouping {
    points: Vec<DataPoint>,
    plots: Vec<Plot>,
    covering: Vec<SmallVec<[usize; 4]>>,
}

impl Grouping {
    /// Groups the candidates of `set` along every dimension and prunes
    /// single-member groups.
    ///
    /// A data point that ends up in no surviving group keeps its group for
    /// dimension 0, unless it is the only candidate. Plots appear in the order
    /// they were first created, which only depends on the input order.
    pub fn build(set: &CandidateSet) -> Self {
        let points = set.points().to_vec();
        let nr_dims = set.nr_dims();
        if nr_dims == 0 || points.is_empty() {
            return Self {
                covering: vec![SmallVec::new(); points.len()],
                points,
                plots: Vec::new(),
            };
        }

        let cardinal = cardinals(set.max_indices());
        let mut index: FxHashMap<PlotId, usize> = FxHashMap::default();
        let mut all: Vec<Plot> = Vec::new();
        let mut first_group = Vec::with_capacity(points.len());

        for (i, point) in points.iter().enumerate() {
            for free in 0..nr_dims {
                let id = group_id(&cardinal, point.vector(), free);
                let slot = *index.entry(id).or_insert_with(|| {
                    all.push(Plot::new(id));
                    all.len() - 1
                });
                all[slot].push_member(i, point.probability());
                if free == 0 {
                    first_group.push(slot);
                }
            }
        }

        let mut keep: Vec<bool> = all.iter().map(|p| p.len() > 1).collect();
        if points.len() > 1 {
            for (i, point) in points.iter().enumerate() {
                let covered = (0..nr_dims)
                    .any(|free| keep[index[&group_id(&cardinal, point.vector(), free)]]);
                if !covered {
                    keep[first_group[i]] = true;
                }
            }
        }

        let mut plots: Vec<Plot> = all
            .into_iter()
            .zip(keep)
            .filter_map(|(plot, k)| k.then_some(plot))
            .collect();

        let mut covering = vec![SmallVec::new(); points.len()];
        for (slot, plot) in plots.iter_mut().enumerate() {
            plot.members_mut().sort_by(|&a, &b| {
                points[b].probability().total_cmp(&points[a].probability())
            });
            for &m in plot.members() {
                covering[m].push(slot);
            }
        }

        tracing::debug!(
            "Grouped {} data points over {} dimensions into {} plots",
            points.len(),
            nr_dims,
            plots.len()
        );

        Self {
            points,
            plots,
            covering,
        }
    }

    #[inline]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut [DataPoint] {
        &mut self.points
    }

    #[inline]
    pub fn point(&self, index: usize) -> &DataPoint {
        &self.points[index]
    }

    #[inline]
    pub fn plots(&self) -> &[Plot] {
        &self.plots
    }

    #[inline]
    pub fn plots_mut(&mut self) -> &mut [Plot] {
        &mut self.plots
    }

    /// Split borrow for callers that update plots and their members together.
    #[inline]
    pub fn parts_mut(&mut self) -> (&mut [Plot], &mut [DataPoint]) {
        (&mut self.plots, &mut self.points)
    }

    /// Indices of the surviving plots that contain `point`.
    #[inline]
    pub fn covering(&self, point: usize) -> &[usize] {
        &self.covering[point]
    }

    #[inline]
    pub fn nr_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn nr_plots(&self) -> usize {
        self.plots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// Iterates the data points of `plot` in display order.
    #[inline]
    pub fn members<'a>(&'a self, plot: &'a Plot) -> impl Iterator<Item = &'a DataPoint> + 'a {
        plot.members().iter().map(move |&m| &self.points[m])
    }
}
