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

use crate::{
    common::{Millis, Pixels},
    config::err::{ConfigError, InvalidConstantError, ZeroRowWidthError},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Screen geometry, cognitive constants and solver limits for one planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Pixel budget of one row.
    pub row_width: Pixels,
    /// Pixels taken by one displayed data point.
    pub data_point_width: Pixels,
    /// Fixed chrome pixels of one plot (axes, title).
    pub plot_width: Pixels,
    /// Number of rows on screen.
    pub nr_rows: usize,
    /// Time to read one plot title.
    pub read_title_ms: Millis,
    /// Time to read one data point.
    pub read_data_ms: Millis,
    /// Weight of the estimated processing cost in the objective.
    pub processing_weight: f64,
    /// Wall-clock limit of the exact planner.
    pub timeout_ms: u64,
    /// Keep only this many of the most probable candidates.
    pub max_candidates: Option<usize>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            row_width: 900,
            data_point_width: 50,
            plot_width: 50,
            nr_rows: 2,
            read_title_ms: 1000.0,
            read_data_ms: 500.0,
            processing_weight: 0.0,
            timeout_ms: 1000,
            max_candidates: None,
        }
    }
}

impl PlanConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_row_width(mut self, px: Pixels) -> Self {
        self.row_width = px;
        self
    }

    #[inline]
    pub fn with_data_point_width(mut self, px: Pixels) -> Self {
        self.data_point_width = px;
        self
    }

    #[inline]
    pub fn with_plot_width(mut self, px: Pixels) -> Self {
        self.plot_width = px;
        self
    }

    #[inline]
    pub fn with_nr_rows(mut self, rows: usize) -> Self {
        self.nr_rows = rows;
        self
    }

    #[inline]
    pub fn with_read_times(mut self, title_ms: Millis, data_ms: Millis) -> Self {
        self.read_title_ms = title_ms;
        self.read_data_ms = data_ms;
        self
    }

    #[inline]
    pub fn with_processing_weight(mut self, weight: f64) -> Self {
        self.processing_weight = weight;
        self
    }

    #[inline]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    #[inline]
    pub fn with_max_candidates(mut self, k: Option<usize>) -> Self {
        self.max_candidates = k;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_width == 0 {
            return Err(ZeroRowWidthError.into());
        }
        for (name, value) in [
            ("read_title_ms", self.read_title_ms),
            ("read_data_ms", self.read_data_ms),
            ("processing_weight", self.processing_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidConstantError::new(name, value).into());
            }
        }
        Ok(())
    }

    /// Pixels needed by a plot showing `nr_data_points` data points.
    #[inline]
    pub fn plot_pixels(&self, nr_data_points: usize) -> Pixels {
        self.plot_width + self.data_point_width * nr_data_points as Pixels
    }

    /// Expected wait when the intended query is shown nowhere.
    #[inline]
    pub fn penalty(&self, nr_queries: usize, nr_plots: usize) -> Millis {
        nr_queries as f64 * self.read_data_ms + nr_plots as f64 * self.read_title_ms
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[inline]
    pub fn uses_processing_cost(&self) -> bool {
        self.processing_weight > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = PlanConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.plot_pixels(3), 200);
        assert_eq!(cfg.penalty(4, 2), 4000.0);
        assert_eq!(cfg.timeout(), Duration::from_secs(1));
        assert!(!cfg.uses_processing_cost());
    }

    #[test]
    fn test_builders_set_fields() {
        let cfg = PlanConfig::new()
            .with_row_width(300)
            .with_data_point_width(10)
            .with_plot_width(20)
            .with_nr_rows(3)
            .with_read_times(100.0, 10.0)
            .with_processing_weight(0.5)
            .with_timeout_ms(250)
            .with_max_candidates(Some(8));

        assert_eq!(cfg.row_width, 300);
        assert_eq!(cfg.plot_pixels(2), 40);
        assert_eq!(cfg.nr_rows, 3);
        assert_eq!(cfg.penalty(1, 1), 110.0);
        assert_eq!(cfg.max_candidates, Some(8));
        assert!(cfg.uses_processing_cost());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = PlanConfig::new().with_row_width(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRowWidth(_)));

        let err = PlanConfig::new()
            .with_read_times(-1.0, 500.0)
            .validate()
            .unwrap_err();
        match err {
            ConfigError::InvalidConstant(e) => assert_eq!(e.name(), "read_title_ms"),
            other => panic!("unexpected error: {other}"),
        }

        let err = PlanConfig::new()
            .with_processing_weight(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConstant(e) if e.name() == "processing_weight"));
    }

    #[test]
    fn test_serde_round_trip_and_partial_input() {
        let cfg = PlanConfig::new().with_nr_rows(4).with_max_candidates(Some(5));
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PlanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);

        let partial: PlanConfig = serde_json::from_str(r#"{ "row_width": 600 }"#).unwrap();
        assert_eq!(partial.row_width, 600);
        assert_eq!(partial.nr_rows, PlanConfig::default().nr_rows);
    }
}
