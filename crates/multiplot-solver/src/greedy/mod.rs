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

pub mod candidates;

use crate::{
    greedy::candidates::{SubPlot, remove_shown, retire, sub_plots},
    planner::{PlanOutcome, Planner},
};
use fixedbitset::FixedBitSet;
use multiplot_model::prelude::*;
use std::time::Instant;

/// How the greedy planner accounts for data points that are already on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CostMode {
    /// Shown data points are removed from every remaining candidate.
    #[default]
    Dynamic,
    /// Candidates keep their members; savings only count unseen members.
    Static,
}

impl std::fmt::Display for CostMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostMode::Dynamic => write!(f, "dynamic"),
            CostMode::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone)]
struct Screen {
    shown: FixedBitSet,
    shown_slots: usize,
    accepted: usize,
    accepted_probability: f64,
}

impl Screen {
    fn new(nr_points: usize) -> Self {
        Self {
            shown: FixedBitSet::with_capacity(nr_points),
            shown_slots: 0,
            accepted: 0,
            accepted_probability: 0.0,
        }
    }

    /// Records a placed candidate. The probability counted towards later
    /// picks is the candidate's full mass, whatever the cost mode.
    fn accept(&mut self, candidate: &SubPlot) {
        for &m in candidate.members() {
            self.shown.insert(m);
        }
        self.shown_slots += candidate.len();
        self.accepted += 1;
        self.accepted_probability += candidate.probability();
    }
}

/// Result of one greedy run before highlighting.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyRun {
    pub result: PlanResult,
    /// Savings of every accepted plot, in acceptance order.
    pub accepted: Vec<f64>,
}

impl GreedyRun {
    #[inline]
    pub fn total_savings(&self) -> f64 {
        self.accepted.iter().sum()
    }
}

/// Fills rows one at a time with the candidate sub-plot of highest marginal
/// savings that still fits the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GreedyPlanner {
    mode: CostMode,
}

impl GreedyPlanner {
    #[inline]
    pub fn new(mode: CostMode) -> Self {
        Self { mode }
    }

    #[inline]
    pub fn mode(&self) -> CostMode {
        self.mode
    }

    fn savings(
        &self,
        candidate: &SubPlot,
        grouping: &Grouping,
        screen: &Screen,
        config: &PlanConfig,
        penalty: f64,
    ) -> f64 {
        let (effective, probability) = match self.mode {
            CostMode::Dynamic => (candidate.len(), candidate.probability()),
            CostMode::Static => candidate.unseen(&screen.shown, grouping.points()),
        };
        let plot_cost = grouping.plots()[candidate.plot()].cost();
        let rd = config.read_data_ms;
        let rt = config.read_title_ms;

        let time = config.processing_weight * plot_cost * effective as f64
            + 0.5
                * ((screen.shown_slots + candidate.len()) as f64 * rd
                    + (1 + screen.accepted) as f64 * rt);
        let own = probability * (penalty - time);
        let others = screen.accepted_probability * 0.5 * (rt + candidate.len() as f64 * rd);
        own - others
    }

    pub fn run(
        &self,
        grouping: &Grouping,
        config: &PlanConfig,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> GreedyRun {
        self.place(sub_plots(grouping), grouping, config, nr_rows, width_budget)
    }

    fn place(
        &self,
        mut candidates: Vec<SubPlot>,
        grouping: &Grouping,
        config: &PlanConfig,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> GreedyRun {
        let mut screen = Screen::new(grouping.nr_points());
        let penalty = config.penalty(grouping.nr_points(), grouping.nr_plots());
        let mut accepted = Vec::new();
        let mut rows = Vec::with_capacity(nr_rows);
        let mut exhausted = candidates.is_empty();

        for _ in 0..nr_rows {
            let mut row = PlanRow::new();
            let mut row_pixels: Pixels = 0;

            while !exhausted {
                let mut best: Option<(usize, f64)> = None;
                let mut any_positive = false;
                for (i, c) in candidates.iter().enumerate() {
                    let s = self.savings(c, grouping, &screen, config, penalty);
                    if s <= 0.0 {
                        continue;
                    }
                    any_positive = true;
                    if row_pixels + config.plot_pixels(c.len()) > width_budget {
                        continue;
                    }
                    if best.is_none_or(|(_, b)| s > b) {
                        best = Some((i, s));
                    }
                }

                let Some((i, s)) = best else {
                    exhausted = !any_positive;
                    break;
                };

                let pick = candidates[i].clone();
                let plot = &grouping.plots()[pick.plot()];
                row_pixels += config.plot_pixels(pick.len());
                screen.accept(&pick);
                accepted.push(s);
                row.push(PlacedPlot::new(
                    plot.id(),
                    pick.members()
                        .iter()
                        .map(|&m| grouping.point(m).clone())
                        .collect(),
                ));
                tracing::debug!(
                    "Placed {} ({} data points) with savings {:.3}",
                    plot.id(),
                    pick.len(),
                    s
                );

                retire(&mut candidates, pick.plot());
                if self.mode == CostMode::Dynamic {
                    remove_shown(&mut candidates, &screen.shown, grouping.points());
                }
                exhausted = candidates.is_empty();
            }
            rows.push(row);
        }

        GreedyRun {
            result: PlanResult::from_rows(rows),
            accepted,
        }
    }
}

impl Planner for GreedyPlanner {
    fn name(&self) -> &str {
        match self.mode {
            CostMode::Dynamic => "Greedy",
            CostMode::Static => "GreedyStatic",
        }
    }

    fn plan(
        &self,
        grouping: &Grouping,
        config: &PlanConfig,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> PlanOutcome {
        let build_start = Instant::now();
        let candidates = sub_plots(grouping);
        let build_millis = build_start.elapsed().as_millis() as u64;

        let start = Instant::now();
        let run = self.place(candidates, grouping, config, nr_rows, width_budget);
        let penalty = config.penalty(grouping.nr_points(), grouping.nr_plots());
        let mass: f64 = grouping.points().iter().map(DataPoint::probability).sum();

        PlanOutcome {
            stats: PlanStats {
                build_millis,
                optimize_millis: start.elapsed().as_millis() as u64,
                wait_time: mass * penalty - run.total_savings(),
                ..PlanStats::default()
            },
            result: run.result,
        }
    }
}
