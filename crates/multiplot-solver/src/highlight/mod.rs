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

use multiplot_model::prelude::*;

#[derive(Debug, Clone, Copy)]
struct Tally {
    /// Plots with at least one highlighted data point.
    highlighted_plots: usize,
    /// Plots with at least one uncolored data point.
    uncolored_plots: usize,
    highlighted: usize,
    highlighted_probability: f64,
}

impl Tally {
    fn of(plan: &PlanResult) -> Self {
        let mut t = Self {
            highlighted_plots: 0,
            uncolored_plots: 0,
            highlighted: 0,
            highlighted_probability: 0.0,
        };
        for plot in plan.iter_plots() {
            let nh = plot.nr_highlighted();
            t.highlighted_plots += usize::from(nh > 0);
            t.uncolored_plots += usize::from(nh < plot.len());
            t.highlighted += nh;
            t.highlighted_probability += plot
                .data_points()
                .iter()
                .filter(|d| d.is_highlighted())
                .map(DataPoint::probability)
                .sum::<f64>();
        }
        t
    }

    /// Expected reading time after highlighting one more data point of
    /// probability `p` in a plot with `nh` of `len` data points highlighted.
    fn time_with(&self, p: f64, nh: usize, len: usize, displayed: usize, config: &PlanConfig) -> f64 {
        let rd = config.read_data_ms;
        let rt = config.read_title_ms;
        let hp = self.highlighted_plots + usize::from(nh == 0);
        let up = self.uncolored_plots - usize::from(nh + 1 == len);
        let t_highlighted = hp as f64 * rt + (self.highlighted + 1) as f64 * rd;
        let t_uncolored = up as f64 * rt + (displayed - self.highlighted - 1) as f64 * rd;
        let ph = self.highlighted_probability + p;
        ph * 0.5 * t_highlighted + (1.0 - ph) * (t_highlighted + 0.5 * t_uncolored)
    }
}

/// Greedily highlights displayed data points while that beats `saving`.
///
/// Each step highlights the data point with the lowest resulting expected
/// reading time, provided `penalty_mass - time` exceeds the best savings so
/// far. At most half of the displayed data points end up highlighted,
/// counting highlights already present in `plan`. Returns the final savings.
pub fn colorize(plan: &mut PlanResult, config: &PlanConfig, penalty_mass: f64, saving: f64) -> f64 {
    let displayed = plan.nr_displayed();
    let limit = displayed / 2;
    let mut tally = Tally::of(plan);
    let mut best = saving;

    while tally.highlighted < limit {
        let mut pick: Option<(usize, usize, f64)> = None;
        for (pi, plot) in plan.iter_plots().enumerate() {
            let nh = plot.nr_highlighted();
            for (di, d) in plot.data_points().iter().enumerate() {
                if d.is_highlighted() {
                    continue;
                }
                let time = tally.time_with(d.probability(), nh, plot.len(), displayed, config);
                if pick.is_none_or(|(_, _, t)| time < t) {
                    pick = Some((pi, di, time));
                }
            }
        }

        let Some((pi, di, time)) = pick else {
            break;
        };
        let candidate = penalty_mass - time;
        if candidate <= best {
            break;
        }
        let Some(plot) = plan.iter_plots_mut().nth(pi) else {
            break;
        };

        let nh = plot.nr_highlighted();
        tally.highlighted_plots += usize::from(nh == 0);
        tally.uncolored_plots -= usize::from(nh + 1 == plot.len());
        tally.highlighted += 1;
        let point = &mut plot.data_points_mut()[di];
        tally.highlighted_probability += point.probability();
        point.set_highlighted(true);
        best = candidate;

        tracing::debug!("Highlighted {} with expected time {:.3}", point.id(), time);
    }

    best
}
