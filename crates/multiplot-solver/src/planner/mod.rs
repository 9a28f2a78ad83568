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
    cost::{CostSource, estimate_costs},
    err::PlanError,
    exact::ExactPlanner,
    greedy::{CostMode, GreedyPlanner},
    highlight::colorize,
};
use multiplot_model::prelude::*;
use std::time::Instant;

/// A layout and the statistics of the call that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanOutcome {
    pub result: PlanResult,
    pub stats: PlanStats,
}

/// One way of choosing plots and rows for a prepared candidate model.
///
/// Implementations fill `build_millis`, `optimize_millis`, `wait_time` and
/// `is_timeout` of the returned statistics.
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    fn plan(
        &self,
        grouping: &Grouping,
        config: &PlanConfig,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> PlanOutcome;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    #[default]
    Greedy,
    GreedyStatic,
    Exact,
}

impl Strategy {
    pub fn planner(&self) -> Box<dyn Planner> {
        match self {
            Strategy::Greedy => Box::new(GreedyPlanner::new(CostMode::Dynamic)),
            Strategy::GreedyStatic => Box::new(GreedyPlanner::new(CostMode::Static)),
            Strategy::Exact => Box::new(ExactPlanner::new()),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Greedy => write!(f, "greedy"),
            Strategy::GreedyStatic => write!(f, "greedy-static"),
            Strategy::Exact => write!(f, "exact"),
        }
    }
}

/// Runs one planning call: top-k cut, grouping, cost estimation, the chosen
/// planner and highlighting.
pub struct MultiplotPlanner {
    config: PlanConfig,
    cost_source: Option<CostSource>,
    planner: Box<dyn Planner>,
}

impl MultiplotPlanner {
    pub fn new(config: PlanConfig) -> Self {
        Self {
            config,
            cost_source: None,
            planner: Strategy::default().planner(),
        }
    }

    pub fn with_cost_source(mut self, source: CostSource) -> Self {
        self.cost_source = Some(source);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.planner = strategy.planner();
        self
    }

    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    #[inline]
    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    #[inline]
    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    /// Plans with the row count and row width of the configuration.
    pub fn plan_default(&self, candidates: &CandidateSet) -> Result<PlanOutcome, PlanError> {
        self.plan(candidates, self.config.nr_rows, self.config.row_width)
    }

    pub fn plan(
        &self,
        candidates: &CandidateSet,
        nr_rows: usize,
        width_budget: Pixels,
    ) -> Result<PlanOutcome, PlanError> {
        self.config.validate()?;

        let init_start = Instant::now();
        let cut;
        let candidates = match self.config.max_candidates {
            Some(k) => {
                cut = candidates.top_k(k);
                &cut
            }
            None => candidates,
        };
        let mut grouping = Grouping::build(candidates);
        estimate_costs(&mut grouping, self.cost_source.as_ref(), &self.config);
        let init_millis = init_start.elapsed().as_millis() as u64;

        let PlanOutcome { mut result, stats } =
            self.planner.plan(&grouping, &self.config, nr_rows, width_budget);

        let mass: f64 = grouping.points().iter().map(DataPoint::probability).sum();
        let penalty_mass = mass * self.config.penalty(grouping.nr_points(), grouping.nr_plots());
        let saving = colorize(
            &mut result,
            &self.config,
            penalty_mass,
            penalty_mass - stats.wait_time,
        );

        let stats = PlanStats {
            nr_queries: grouping.nr_points(),
            nr_plots: grouping.nr_plots(),
            init_millis,
            wait_time: penalty_mass - saving,
            ..stats
        };
        tracing::debug!(
            "{} planned {} plots for {} queries, expected wait {:.1} ms{}",
            self.planner.name(),
            result.nr_plots(),
            stats.nr_queries,
            stats.wait_time,
            if stats.is_timeout { " (timeout)" } else { "" }
        );

        Ok(PlanOutcome { result, stats })
    }
}

impl std::fmt::Debug for MultiplotPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplotPlanner")
            .field("config", &self.config)
            .field("cost_source", &self.cost_source)
            .field("planner", &self.planner.name())
            .finish()
    }
}

/// Plans a layout for `candidates` in one call.
///
/// The solver timeout comes from `config.timeout_ms`.
pub fn plan(
    candidates: &CandidateSet,
    nr_rows: usize,
    width_budget: Pixels,
    cost_source: Option<&CostSource>,
    strategy: Strategy,
    config: &PlanConfig,
) -> Result<(PlanResult, PlanStats), PlanError> {
    let mut planner = MultiplotPlanner::new(config.clone()).with_strategy(strategy);
    if let Some(source) = cost_source {
        planner = planner.with_cost_source(source.clone());
    }
    let outcome = planner.plan(candidates, nr_rows, width_budget)?;
    Ok((outcome.result, outcome.stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{CostEstimator, TemplateAccessor, err::CostEstimateError};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;

    const STRATEGIES: [Strategy; 3] = [Strategy::Greedy, Strategy::GreedyStatic, Strategy::Exact];

    fn candidates(max_indices: &[usize], rows: &[(f64, Vec<usize>)]) -> CandidateSet {
        let points = rows
            .iter()
            .enumerate()
            .map(|(i, (p, v))| DataPoint::new(DataPointIdentifier::new(i), v.clone(), *p))
            .collect();
        CandidateSet::new(points, max_indices.to_vec()).unwrap()
    }

    fn four_points() -> CandidateSet {
        candidates(
            &[3, 3],
            &[
                (0.4, vec![0, 0]),
                (0.3, vec![1, 0]),
                (0.2, vec![2, 0]),
                (0.1, vec![0, 1]),
            ],
        )
    }

    fn config() -> PlanConfig {
        PlanConfig::default().with_timeout_ms(10_000)
    }

    struct Template;

    impl TemplateAccessor for Template {
        fn base_query(&self) -> String {
            "SELECT 1".to_string()
        }

        fn combined_predicate(&self, plot: &Plot, _points: &[DataPoint], size: usize) -> String {
            format!("SELECT 1 WHERE {} IN {}", plot.free_index(), size)
        }
    }

    struct Broken;

    impl CostEstimator for Broken {
        fn estimate(&self, _queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            Err(crate::cost::err::EstimatorUnavailableError::new("down").into())
        }
    }

    #[test]
    fn test_greedy_scenario_through_entry_point() {
        let (result, stats) = plan(&four_points(), 2, 900, None, Strategy::Greedy, &config()).unwrap();

        assert_eq!(stats.nr_queries, 4);
        assert_eq!(stats.nr_plots, 2);
        assert!(!stats.is_timeout);
        assert_eq!(result.nr_rows(), 2);
        let first = &result.rows()[0].plots()[0];
        assert_eq!(first.id(), PlotId::new(0, 0));
        assert_eq!(first.len(), 3);
        assert!(result.nr_highlighted() <= result.nr_displayed() / 2);
        assert!(stats.wait_time <= 1525.0 + 1e-9);
    }

    #[test]
    fn test_all_strategies_share_output_shape() {
        for strategy in STRATEGIES {
            let (result, stats) = plan(&four_points(), 2, 900, None, strategy, &config()).unwrap();
            assert_eq!(result.nr_rows(), 2, "{strategy}");
            assert!(!result.is_empty(), "{strategy}");
            assert_eq!(result.keyed().len(), 2);
            assert!(stats.wait_time < 4000.0, "{strategy}");
        }
    }

    #[test]
    fn test_degenerate_inputs_yield_empty_plans() {
        let single = candidates(&[2], &[(1.0, vec![1])]);
        let no_dims = candidates(&[], &[(0.5, vec![]), (0.5, vec![])]);
        for strategy in STRATEGIES {
            for set in [&single, &no_dims, &CandidateSet::empty()] {
                let (result, stats) = plan(set, 2, 900, None, strategy, &config()).unwrap();
                assert!(result.is_empty(), "{strategy}");
                assert_eq!(result.nr_rows(), 2);
                assert!(!stats.is_timeout);
            }

            let (result, _) = plan(&four_points(), 2, 50, None, strategy, &config()).unwrap();
            assert!(result.is_empty(), "{strategy}");
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = config().with_row_width(0);
        let err = plan(&four_points(), 2, 900, None, Strategy::Greedy, &cfg).unwrap_err();
        assert!(matches!(err, PlanError::Config(_)));
    }

    #[test]
    fn test_broken_estimator_does_not_fail_the_plan() {
        let source = CostSource::new(Arc::new(Template), Arc::new(Broken));
        let cfg = config().with_processing_weight(1.0);
        for strategy in STRATEGIES {
            let (with, _) = plan(&four_points(), 2, 900, Some(&source), strategy, &cfg).unwrap();
            let (without, _) = plan(&four_points(), 2, 900, None, strategy, &config()).unwrap();
            assert_eq!(with.nr_plots(), without.nr_plots(), "{strategy}");
        }
    }

    #[test]
    fn test_max_candidates_cuts_before_grouping() {
        let cfg = config().with_max_candidates(Some(2));
        let (result, stats) = plan(&four_points(), 2, 900, None, Strategy::Greedy, &cfg).unwrap();
        assert_eq!(stats.nr_queries, 2);
        assert_eq!(stats.nr_plots, 1);
        assert_eq!(result.nr_displayed(), 2);
    }

    #[test]
    fn test_builder_defaults_and_custom_planner() {
        let planner = MultiplotPlanner::new(config().with_nr_rows(3));
        assert_eq!(planner.planner_name(), "Greedy");
        let outcome = planner.plan_default(&four_points()).unwrap();
        assert_eq!(outcome.result.nr_rows(), 3);

        let planner = MultiplotPlanner::new(config())
            .with_planner(Box::new(GreedyPlanner::new(CostMode::Static)));
        assert_eq!(planner.planner_name(), "GreedyStatic");
        assert_eq!(
            MultiplotPlanner::new(config()).with_strategy(Strategy::Exact).planner_name(),
            "Exact"
        );
    }

    #[test]
    fn test_repeated_calls_are_deterministic() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let max_indices = vec![3, 4, 2];
        let rows: Vec<(f64, Vec<usize>)> = (0..16)
            .map(|_| {
                let v = max_indices.iter().map(|&m| rng.random_range(0..m)).collect();
                (1.0 / 16.0, v)
            })
            .collect();
        let set = candidates(&max_indices, &rows);

        for strategy in [Strategy::Greedy, Strategy::GreedyStatic] {
            let (a, _) = plan(&set, 3, 400, None, strategy, &config()).unwrap();
            let (b, _) = plan(&set, 3, 400, None, strategy, &config()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_calls_do_not_share_state() {
        let set = four_points();
        let planner = MultiplotPlanner::new(config());
        let (set_ref, planner_ref) = (&set, &planner);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(move || planner_ref.plan_default(set_ref)))
                .collect();
            let results: Vec<PlanResult> = handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap().result)
                .collect();
            assert!(results.windows(2).all(|w| w[0] == w[1]));
        });
        assert!(set.points().iter().all(|p| !p.is_highlighted() && p.cost().is_infinite()));
    }
}
