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
pub mod highs;
pub mod milp;

use crate::{
    exact::{
        err::RowOverflowError,
        highs::HighsBackend,
        milp::{LinearExpr, MilpBackend, MilpModel, MilpSolution, Sense, SolveStatus, VarId},
    },
    planner::{PlanOutcome, Planner},
};
use multiplot_model::prelude::*;
use std::time::Instant;

/// Variable handles of a layout model.
#[derive(Debug, Clone)]
struct Layout {
    /// `(data point, plot)` for every membership of a data point in a plot.
    occurrences: Vec<(usize, usize)>,
    by_point: Vec<Vec<usize>>,
    by_plot: Vec<Vec<usize>>,
    /// `[plot][row]`
    placed: Vec<Vec<VarId>>,
    /// `[occurrence][row]`
    highlighted: Vec<Vec<VarId>>,
    /// `[occurrence][row]`
    uncolored: Vec<Vec<VarId>>,
}

impl Layout {
    fn new(grouping: &Grouping) -> Self {
        let mut occurrences = Vec::new();
        let mut by_point = Vec::with_capacity(grouping.nr_points());
        let mut by_plot = vec![Vec::new(); grouping.nr_plots()];
        for q in 0..grouping.nr_points() {
            let mut own = Vec::with_capacity(grouping.covering(q).len());
            for &g in grouping.covering(q) {
                own.push(occurrences.len());
                by_plot[g].push(occurrences.len());
                occurrences.push((q, g));
            }
            by_point.push(own);
        }
        // Display order within a plot follows the plot's member order.
        for (g, occ) in by_plot.iter_mut().enumerate() {
            let members = grouping.plots()[g].members();
            occ.sort_by_key(|&o| members.iter().position(|&m| m == occurrences[o].0));
        }
        Self {
            occurrences,
            by_point,
            by_plot,
            placed: Vec::new(),
            highlighted: Vec::new(),
            uncolored: Vec::new(),
        }
    }

    fn sum_over(&self, occurrences: &[usize], form: &[Vec<VarId>]) -> LinearExpr {
        let mut e = LinearExpr::new();
        for &o in occurrences {
            for &v in &form[o] {
                e.add(v, 1.0);
            }
        }
        e
    }
}

/// Upper bound of every expected reading time expression in the model.
#[inline]
pub fn big_m(config: &PlanConfig, nr_points: usize, nr_plots: usize) -> f64 {
    nr_points as f64 * config.read_data_ms + 2.0 * nr_plots as f64 * config.read_title_ms
}

fn build_model(
    grouping: &Grouping,
    config: &PlanConfig,
    nr_rows: usize,
    width_budget: Pixels,
) -> (MilpModel, Layout) {
    let mut model = MilpModel::new();
    let mut layout = Layout::new(grouping);
    let nr_points = grouping.nr_points();
    let nr_plots = grouping.nr_plots();
    let rd = config.read_data_ms;
    let rt = config.read_title_ms;
    let penalty = config.penalty(nr_points, nr_plots);
    let m = big_m(config, nr_points, nr_plots);

    layout.placed = (0..nr_plots)
        .map(|_| (0..nr_rows).map(|_| model.add_binary()).collect())
        .collect();
    layout.highlighted = (0..layout.occurrences.len())
        .map(|_| (0..nr_rows).map(|_| model.add_binary()).collect())
        .collect();
    layout.uncolored = (0..layout.occurrences.len())
        .map(|_| (0..nr_rows).map(|_| model.add_binary()).collect())
        .collect();
    let plot_has_highlight: Vec<VarId> = (0..nr_plots).map(|_| model.add_binary()).collect();
    let plot_has_uncolored: Vec<VarId> = (0..nr_plots).map(|_| model.add_binary()).collect();

    // (1) every data point is displayed at most once
    for occ in &layout.by_point {
        if occ.is_empty() {
            continue;
        }
        let mut e = layout.sum_over(occ, &layout.highlighted);
        e.add_scaled(&layout.sum_over(occ, &layout.uncolored), 1.0);
        model.add_constraint(e, Sense::Le, 1.0);
    }

    // (2) display needs the covering plot in the same row, a placed plot needs a member
    for (g, occ) in layout.by_plot.iter().enumerate() {
        for r in 0..nr_rows {
            let mut members = LinearExpr::new();
            for &o in occ {
                let mut e = LinearExpr::new();
                e.add(layout.highlighted[o][r], 1.0)
                    .add(layout.uncolored[o][r], 1.0)
                    .add(layout.placed[g][r], -1.0);
                model.add_constraint(e, Sense::Le, 0.0);
                members
                    .add(layout.highlighted[o][r], 1.0)
                    .add(layout.uncolored[o][r], 1.0);
            }
            members.add(layout.placed[g][r], -1.0);
            model.add_constraint(members, Sense::Ge, 0.0);
        }
    }

    // (3) every plot is placed in at most one row
    for rows in &layout.placed {
        let mut e = LinearExpr::new();
        for &v in rows {
            e.add(v, 1.0);
        }
        model.add_constraint(e, Sense::Le, 1.0);
    }

    // (4) row width
    for r in 0..nr_rows {
        let mut e = LinearExpr::new();
        for rows in &layout.placed {
            e.add(rows[r], config.plot_width as f64);
        }
        for o in 0..layout.occurrences.len() {
            e.add(layout.highlighted[o][r], config.data_point_width as f64)
                .add(layout.uncolored[o][r], config.data_point_width as f64);
        }
        model.add_constraint(e, Sense::Le, width_budget as f64);
    }

    // (5) at most half of the displayed data points are highlighted
    let all: Vec<usize> = (0..layout.occurrences.len()).collect();
    let total_highlighted = layout.sum_over(&all, &layout.highlighted);
    let total_uncolored = layout.sum_over(&all, &layout.uncolored);
    let mut balance = total_highlighted.clone();
    balance.add_scaled(&total_uncolored, -1.0);
    model.add_constraint(balance, Sense::Le, 0.0);

    // (6) per plot indicators for "has a highlighted / uncolored member"
    for (g, occ) in layout.by_plot.iter().enumerate() {
        for (flag, form) in [
            (plot_has_highlight[g], &layout.highlighted),
            (plot_has_uncolored[g], &layout.uncolored),
        ] {
            let shown = layout.sum_over(occ, form);

            let mut upper = LinearExpr::new();
            upper.add(flag, 1.0).add_scaled(&shown, -1.0);
            model.add_constraint(upper, Sense::Le, 0.0);

            let mut lower = LinearExpr::new();
            lower.add(flag, occ.len() as f64).add_scaled(&shown, -1.0);
            model.add_constraint(lower, Sense::Ge, 0.0);
        }
    }

    // (7) reading time of the highlighted and the uncolored part of the screen
    let mut highlighted_plots = LinearExpr::new();
    let mut uncolored_plots = LinearExpr::new();
    for g in 0..nr_plots {
        highlighted_plots.add(plot_has_highlight[g], 1.0);
        uncolored_plots.add(plot_has_uncolored[g], 1.0);
    }
    let mut time_highlighted = LinearExpr::new();
    time_highlighted
        .add_scaled(&total_highlighted, 0.5 * rd)
        .add_scaled(&highlighted_plots, 0.5 * rt);
    let mut time_uncolored = LinearExpr::new();
    time_uncolored
        .add_scaled(&total_highlighted, rd)
        .add_scaled(&highlighted_plots, rt)
        .add_scaled(&total_uncolored, 0.5 * rd)
        .add_scaled(&uncolored_plots, 0.5 * rt);

    let mut objective = LinearExpr::new();
    for (q, occ) in layout.by_point.iter().enumerate() {
        if occ.is_empty() {
            continue;
        }
        let point = grouping.point(q);
        let p = point.probability();
        let cost = if point.cost().is_finite() { point.cost() } else { 0.0 };

        for (form, time) in [
            (&layout.highlighted, &time_highlighted),
            (&layout.uncolored, &time_uncolored),
        ] {
            let indicator = layout.sum_over(occ, form);
            let product = model.add_continuous(0.0, m);

            // product >= time - M (1 - indicator)
            let mut lo = LinearExpr::new();
            lo.add(product, 1.0)
                .add_scaled(time, -1.0)
                .add_scaled(&indicator, -m);
            model.add_constraint(lo, Sense::Ge, -m);

            // product <= time + M (1 - indicator)
            let mut hi = LinearExpr::new();
            hi.add(product, 1.0)
                .add_scaled(time, -1.0)
                .add_scaled(&indicator, m);
            model.add_constraint(hi, Sense::Le, m);

            // product <= M indicator
            let mut off = LinearExpr::new();
            off.add(product, 1.0).add_scaled(&indicator, -m);
            model.add_constraint(off, Sense::Le, 0.0);

            objective
                .add_scaled(&indicator, (config.processing_weight * cost - penalty) * p)
                .add(product, p);
        }
    }
    model.set_objective(objective);

    (model, layout)
}

fn decode(
    grouping: &Grouping,
    layout: &Layout,
    solution: &MilpSolution,
    config: &PlanConfig,
    nr_rows: usize,
    width_budget: Pixels,
) -> Result<PlanResult, RowOverflowError> {
    let mut rows = Vec::with_capacity(nr_rows);
    for r in 0..nr_rows {
        let mut row = PlanRow::new();
        for (g, plot) in grouping.plots().iter().enumerate() {
            if !solution.is_set(layout.placed[g][r]) {
                continue;
            }
            let mut points = Vec::new();
            for &o in &layout.by_plot[g] {
                let highlighted = solution.is_set(layout.highlighted[o][r]);
                if highlighted || solution.is_set(layout.uncolored[o][r]) {
                    let mut point = grouping.point(layout.occurrences[o].0).clone();
                    point.set_highlighted(highlighted);
                    points.push(point);
                }
            }
            if !points.is_empty() {
                row.push(PlacedPlot::new(plot.id(), points));
            }
        }
        let pixels = row.pixels(config);
        if pixels > width_budget {
            return Err(RowOverflowError::new(r, pixels, width_budget));
        }
        rows.push(row);
    }
    Ok(PlanResult::from_rows(rows))
}

/// Solves the layout as a mixed integer program.
///
/// Solver failures, including a time limit without incumbent, produce an
/// empty plan flagged as timed out.
#[derive(Debug, Clone, Default)]
pub struct ExactPlanner<B = HighsBackend> {
    backend: B,
}

impl ExactPlanner<HighsBackend> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: MilpBackend> ExactPlanner<B> {
    #[inline]
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: MilpBackend> Planner for ExactPlanner<B> {
    fn name(&self) -> &str {
        "Exact"
    }

    fn plan(
        &self,
        grouping: &Grouping,
        config: &PlanConfig,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> PlanOutcome {
        let mass: f64 = grouping.points().iter().map(DataPoint::probability).sum();
        let baseline = mass * config.penalty(grouping.nr_points(), grouping.nr_plots());
        let give_up = |stats: PlanStats| PlanOutcome {
            result: PlanResult::empty(nr_rows),
            stats: PlanStats {
                wait_time: baseline,
                ..stats
            },
        };

        if grouping.is_empty() || nr_rows == 0 {
            return give_up(PlanStats::default());
        }

        let build_start = Instant::now();
        let (model, layout) = build_model(grouping, config, nr_rows, width_budget);
        let build_millis = build_start.elapsed().as_millis() as u64;
        tracing::debug!(
            "Built layout model with {} variables and {} constraints",
            model.nr_vars(),
            model.constraints().len()
        );

        let solve_start = Instant::now();
        let solved = self.backend.solve(&model, config.timeout());
        let mut stats = PlanStats {
            build_millis,
            optimize_millis: solve_start.elapsed().as_millis() as u64,
            ..PlanStats::default()
        };

        let solution = match solved {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("{} returned no layout: {}", self.backend.name(), e);
                stats.is_timeout = true;
                return give_up(stats);
            }
        };

        match decode(grouping, &layout, &solution, config, nr_rows, width_budget) {
            Ok(result) => {
                stats.is_timeout = solution.status() == SolveStatus::TimeLimit;
                if stats.is_timeout {
                    tracing::warn!("{} hit the time limit, using incumbent", self.backend.name());
                }
                stats.wait_time = model.objective().eval(solution.values()) + baseline;
                PlanOutcome { result, stats }
            }
            Err(e) => {
                tracing::warn!("Discarding {} layout: {}", self.backend.name(), e);
                stats.is_timeout = true;
                give_up(stats)
            }
        }
    }
}
