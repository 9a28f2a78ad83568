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
    candidate::DataPoint,
    common::{Millis, Pixels},
    config::PlanConfig,
    plot::PlotId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A plot as it appears on screen: a group identity and the data points
/// shown for it, most probable first.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPlot {
    id: PlotId,
    data_points: Vec<DataPoint>,
}

impl PlacedPlot {
    #[inline]
    pub fn new(id: PlotId, data_points: Vec<DataPoint>) -> Self {
        Self { id, data_points }
    }

    #[inline]
    pub fn id(&self) -> PlotId {
        self.id
    }

    #[inline]
    pub fn data_points(&self) -> &[DataPoint] {
        &self.data_points
    }

    #[inline]
    pub fn data_points_mut(&mut self) -> &mut [DataPoint] {
        &mut self.data_points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data_points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }

    #[inline]
    pub fn probability(&self) -> f64 {
        self.data_points.iter().map(DataPoint::probability).sum()
    }

    #[inline]
    pub fn nr_highlighted(&self) -> usize {
        self.data_points.iter().filter(|d| d.is_highlighted()).count()
    }

    #[inline]
    pub fn pixels(&self, config: &PlanConfig) -> Pixels {
        config.plot_pixels(self.len())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanRow {
    plots: Vec<PlacedPlot>,
}

impl PlanRow {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, plot: PlacedPlot) {
        self.plots.push(plot);
    }

    #[inline]
    pub fn plots(&self) -> &[PlacedPlot] {
        &self.plots
    }

    #[inline]
    pub fn plots_mut(&mut self) -> &mut [PlacedPlot] {
        &mut self.plots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    #[inline]
    pub fn get(&self, id: &PlotId) -> Option<&PlacedPlot> {
        self.plots.iter().find(|p| p.id() == *id)
    }

    /// Total width of the row under `config`.
    #[inline]
    pub fn pixels(&self, config: &PlanConfig) -> Pixels {
        self.plots.iter().map(|p| p.pixels(config)).sum()
    }
}

/// The screen layout: exactly one entry per requested row, possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanResult {
    rows: Vec<PlanRow>,
}

impl PlanResult {
    #[inline]
    pub fn empty(nr_rows: usize) -> Self {
        Self {
            rows: vec![PlanRow::new(); nr_rows],
        }
    }

    #[inline]
    pub fn from_rows(rows: Vec<PlanRow>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    #[inline]
    pub fn rows_mut(&mut self) -> &mut [PlanRow] {
        &mut self.rows
    }

    #[inline]
    pub fn nr_rows(&self) -> usize {
        self.rows.len()
    }

    /// True if no row holds a plot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(PlanRow::is_empty)
    }

    #[inline]
    pub fn iter_plots(&self) -> impl Iterator<Item = &PlacedPlot> + '_ {
        self.rows.iter().flat_map(|r| r.plots().iter())
    }

    #[inline]
    pub fn iter_plots_mut(&mut self) -> impl Iterator<Item = &mut PlacedPlot> + '_ {
        self.rows.iter_mut().flat_map(|r| r.plots_mut().iter_mut())
    }

    #[inline]
    pub fn nr_plots(&self) -> usize {
        self.rows.iter().map(PlanRow::len).sum()
    }

    /// Number of data point slots on screen.
    #[inline]
    pub fn nr_displayed(&self) -> usize {
        self.iter_plots().map(PlacedPlot::len).sum()
    }

    #[inline]
    pub fn nr_highlighted(&self) -> usize {
        self.iter_plots().map(PlacedPlot::nr_highlighted).sum()
    }

    /// Per row, the stringified group identity mapped to its data points.
    pub fn keyed(&self) -> Vec<BTreeMap<String, Vec<DataPoint>>> {
        self.rows
            .iter()
            .map(|row| {
                row.plots()
                    .iter()
                    .map(|p| (p.id().to_string(), p.data_points().to_vec()))
                    .collect()
            })
            .collect()
    }
}

impl std::fmt::Display for PlanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (r, row) in self.rows.iter().enumerate() {
            write!(f, "row {}:", r)?;
            for plot in row.plots() {
                write!(f, " [{}:", plot.id())?;
                for d in plot.data_points() {
                    let mark = if d.is_highlighted() { "*" } else { "" };
                    write!(f, " {}{}", d.id().into_inner(), mark)?;
                }
                write!(f, "]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Side channel of a planning call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanStats {
    pub nr_queries: usize,
    pub nr_plots: usize,
    pub init_millis: u64,
    pub build_millis: u64,
    pub optimize_millis: u64,
    pub wait_time: Millis,
    pub is_timeout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DataPointIdentifier;

    fn dp(id: usize, p: f64, highlighted: bool) -> DataPoint {
        let mut d = DataPoint::new(DataPointIdentifier::new(id), vec![id], p);
        d.set_highlighted(highlighted);
        d
    }

    fn sample() -> PlanResult {
        let mut top = PlanRow::new();
        top.push(PlacedPlot::new(
            PlotId::new(0, 3),
            vec![dp(0, 0.5, true), dp(1, 0.2, false)],
        ));
        top.push(PlacedPlot::new(PlotId::new(1, 0), vec![dp(2, 0.1, false)]));
        PlanResult::from_rows(vec![top, PlanRow::new()])
    }

    #[test]
    fn test_empty_plan_keeps_rows() {
        let plan = PlanResult::empty(3);
        assert_eq!(plan.nr_rows(), 3);
        assert!(plan.is_empty());
        assert_eq!(plan.nr_plots(), 0);
        assert_eq!(plan.keyed().len(), 3);
    }

    #[test]
    fn test_counts_and_pixels() {
        let plan = sample();
        let cfg = PlanConfig::default();
        assert!(!plan.is_empty());
        assert_eq!(plan.nr_plots(), 2);
        assert_eq!(plan.nr_displayed(), 3);
        assert_eq!(plan.nr_highlighted(), 1);
        assert_eq!(plan.rows()[0].pixels(&cfg), 150 + 100);
        assert_eq!(plan.rows()[1].pixels(&cfg), 0);

        let first = plan.rows()[0].get(&PlotId::new(0, 3)).unwrap();
        assert!((first.probability() - 0.7).abs() < 1e-12);
        assert!(plan.rows()[0].get(&PlotId::new(0, 0)).is_none());
    }

    #[test]
    fn test_keyed_uses_stringified_ids() {
        let keyed = sample().keyed();
        assert_eq!(keyed.len(), 2);
        let keys: Vec<&str> = keyed[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["0:3", "1:0"]);
        assert_eq!(keyed[0]["0:3"].len(), 2);
        assert!(keyed[1].is_empty());
    }

    #[test]
    fn test_display_marks_highlights() {
        let text = sample().to_string();
        assert_eq!(text, "row 0: [0:3: 0* 1] [1:0: 2]\nrow 1:\n");
    }
}
