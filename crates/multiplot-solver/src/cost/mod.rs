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
pub mod memo;

use crate::cost::err::{CostEstimateError, EstimateCountMismatchError};
use multiplot_model::prelude::*;
use std::sync::Arc;

/// Access to the parameterized query that the candidates instantiate.
pub trait TemplateAccessor: Send + Sync {
    /// The query without any substitution, used as the cost baseline.
    fn base_query(&self) -> String;

    /// One query covering the first `size` members of `plot`.
    ///
    /// `points` is the data point list the plot's member indices refer to.
    fn combined_predicate(&self, plot: &Plot, points: &[DataPoint], size: usize) -> String;
}

/// Estimates the processing cost of a batch of queries.
///
/// Implementations may block on a database round trip and must tolerate
/// concurrent calls from independent planning calls.
pub trait CostEstimator: Send + Sync {
    fn estimate(&self, queries: &[String]) -> Result<Vec<f64>, CostEstimateError>;
}

/// The two collaborators the cost adapter needs.
#[derive(Clone)]
pub struct CostSource {
    template: Arc<dyn TemplateAccessor>,
    estimator: Arc<dyn CostEstimator>,
}

impl CostSource {
    pub fn new(template: Arc<dyn TemplateAccessor>, estimator: Arc<dyn CostEstimator>) -> Self {
        Self {
            template,
            estimator,
        }
    }

    #[inline]
    pub fn template(&self) -> &dyn TemplateAccessor {
        self.template.as_ref()
    }

    #[inline]
    pub fn estimator(&self) -> &dyn CostEstimator {
        self.estimator.as_ref()
    }
}

impl std::fmt::Debug for CostSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostSource").finish_non_exhaustive()
    }
}

fn zero_costs(grouping: &mut Grouping) {
    let (plots, points) = grouping.parts_mut();
    for plot in plots.iter_mut() {
        plot.set_cost(0.0);
    }
    for point in points.iter_mut() {
        point.set_cost(0.0);
    }
}

fn query_costs(
    grouping: &Grouping,
    source: &CostSource,
) -> Result<(f64, Vec<f64>), CostEstimateError> {
    let template = source.template();
    let mut queries = Vec::with_capacity(grouping.nr_plots() + 1);
    queries.push(template.base_query());
    for plot in grouping.plots() {
        queries.push(template.combined_predicate(plot, grouping.points(), plot.len()));
    }

    let estimates = source.estimator().estimate(&queries)?;
    if estimates.len() != queries.len() {
        return Err(EstimateCountMismatchError::new(queries.len(), estimates.len()).into());
    }
    Ok((estimates[0], estimates[1..].to_vec()))
}

/// Writes processing costs into the plots and their members.
///
/// Every plot carries the estimate of the base query. Each member is charged
/// the plot's estimate above that base, spread over the plot's members, and
/// keeps the cheapest charge over all its plots. With a zero processing
/// weight or no cost source the estimator is not consulted and every cost is
/// zero. Estimator failures degrade to zero costs as well.
pub fn estimate_costs(grouping: &mut Grouping, source: Option<&CostSource>, config: &PlanConfig) {
    let Some(source) = source.filter(|_| config.uses_processing_cost()) else {
        zero_costs(grouping);
        return;
    };
    if grouping.is_empty() {
        return;
    }

    let (base, per_plot) = match query_costs(grouping, source) {
        Ok(costs) => costs,
        Err(e) => {
            tracing::warn!("Cost estimation failed, planning without processing cost: {}", e);
            zero_costs(grouping);
            return;
        }
    };

    let base = if base.is_finite() { base } else { 0.0 };
    let (plots, points) = grouping.parts_mut();
    for (plot, estimate) in plots.iter_mut().zip(per_plot) {
        let per_point = if estimate.is_finite() {
            (estimate - base) / plot.len() as f64
        } else {
            0.0
        };
        plot.set_cost(base);
        for &m in plot.members() {
            points[m].set_cost(per_point);
        }
    }

    tracing::debug!(
        "Estimated processing cost of {} plots against base {:.3}",
        plots.len(),
        base
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::err::EstimatorUnavailableError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LenTemplate;

    impl TemplateAccessor for LenTemplate {
        fn base_query(&self) -> String {
            String::new()
        }

        fn combined_predicate(&self, plot: &Plot, points: &[DataPoint], size: usize) -> String {
            plot.members()[..size]
                .iter()
                .map(|&m| points[m].id().into_inner().to_string())
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    /// Costs each query at `scale` per character, plus `base` for every query.
    struct ScaledEstimator {
        base: f64,
        scale: f64,
        calls: AtomicUsize,
    }

    impl ScaledEstimator {
        fn new(base: f64, scale: f64) -> Self {
            Self {
                base,
                scale,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CostEstimator for ScaledEstimator {
        fn estimate(&self, queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(queries
                .iter()
                .map(|q| self.base + self.scale * q.len() as f64)
                .collect())
        }
    }

    struct FailingEstimator;

    impl CostEstimator for FailingEstimator {
        fn estimate(&self, _queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            Err(EstimatorUnavailableError::new("connection refused").into())
        }
    }

    struct ShortEstimator;

    impl CostEstimator for ShortEstimator {
        fn estimate(&self, _queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            Ok(vec![1.0])
        }
    }

    fn grouping() -> Grouping {
        let points = [[0, 0], [1, 0], [2, 0], [0, 1]]
            .iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(DataPointIdentifier::new(i), v.to_vec(), 0.25))
            .collect();
        Grouping::build(&CandidateSet::new(points, vec![3, 3]).unwrap())
    }

    fn source(estimator: Arc<dyn CostEstimator>) -> CostSource {
        CostSource::new(Arc::new(LenTemplate), estimator)
    }

    #[test]
    fn test_costs_are_spread_over_members() {
        let mut g = grouping();
        let cfg = PlanConfig::default().with_processing_weight(1.0);
        let src = source(Arc::new(ScaledEstimator::new(2.0, 1.0)));
        estimate_costs(&mut g, Some(&src), &cfg);

        // Plots carry the base estimate.
        assert_eq!(g.plots()[0].cost(), 2.0);
        assert_eq!(g.plots()[1].cost(), 2.0);

        // "0,1,2" is 5 characters over 3 members, "0,3" is 3 over 2.

        // Point 0 sits in both plots and keeps the cheaper estimate.
        assert!((g.point(0).cost() - 1.5).abs() < 1e-12);
        assert!((g.point(1).cost() - 5.0 / 3.0).abs() < 1e-12);
        assert!((g.point(3).cost() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weight_skips_estimator() {
        let mut g = grouping();
        let est = Arc::new(ScaledEstimator::new(0.0, 1.0));
        let src = source(est.clone());
        estimate_costs(&mut g, Some(&src), &PlanConfig::default());

        assert_eq!(est.calls.load(Ordering::SeqCst), 0);
        assert!(g.points().iter().all(|p| p.cost() == 0.0));
        assert!(g.plots().iter().all(|p| p.cost() == 0.0));
    }

    #[test]
    fn test_missing_source_zeroes_costs() {
        let mut g = grouping();
        let cfg = PlanConfig::default().with_processing_weight(1.0);
        estimate_costs(&mut g, None, &cfg);
        assert!(g.points().iter().all(|p| p.cost() == 0.0));
    }

    #[test]
    fn test_failures_fall_back_to_zero() {
        let cfg = PlanConfig::default().with_processing_weight(1.0);
        for estimator in [
            Arc::new(FailingEstimator) as Arc<dyn CostEstimator>,
            Arc::new(ShortEstimator),
        ] {
            let mut g = grouping();
            estimate_costs(&mut g, Some(&source(estimator)), &cfg);
            assert!(g.points().iter().all(|p| p.cost() == 0.0));
            assert!(g.plots().iter().all(|p| p.cost() == 0.0));
        }
    }

    #[test]
    fn test_point_cost_never_increases() {
        let mut g = grouping();
        let cfg = PlanConfig::default().with_processing_weight(1.0);

        let mut last: Vec<f64> = g.points().iter().map(DataPoint::cost).collect();
        for scale in [3.0, 1.0, 5.0, 0.5, 4.0] {
            let src = source(Arc::new(ScaledEstimator::new(0.0, scale)));
            estimate_costs(&mut g, Some(&src), &cfg);
            for (point, prev) in g.points().iter().zip(&last) {
                assert!(point.cost() <= *prev);
            }
            last = g.points().iter().map(DataPoint::cost).collect();
        }
        estimate_costs(&mut g, Some(&source(Arc::new(FailingEstimator))), &cfg);
        assert!(g.points().iter().all(|p| p.cost() == 0.0));
    }

    #[test]
    fn test_plot_cost_is_the_base_estimate() {
        let mut g = grouping();
        let cfg = PlanConfig::default().with_processing_weight(1.0);
        let src = source(Arc::new(ScaledEstimator::new(10.0, 1.0)));
        estimate_costs(&mut g, Some(&src), &cfg);

        assert!(g.plots().iter().all(|p| p.cost() == 10.0));
        assert!((g.point(1).cost() - 5.0 / 3.0).abs() < 1e-12);
    }

    /// Prices every query below the base query.
    struct CheaperThanBase;

    impl CostEstimator for CheaperThanBase {
        fn estimate(&self, queries: &[String]) -> Result<Vec<f64>, CostEstimateError> {
            Ok(queries
                .iter()
                .map(|q| if q.is_empty() { 8.0 } else { 2.0 })
                .collect())
        }
    }

    #[test]
    fn test_member_costs_are_not_clamped() {
        let mut g = grouping();
        let cfg = PlanConfig::default().with_processing_weight(1.0);
        estimate_costs(&mut g, Some(&source(Arc::new(CheaperThanBase))), &cfg);

        assert_eq!(g.plots()[0].cost(), 8.0);
        // (2 - 8) / 3 for the three member plot, (2 - 8) / 2 for the pair.
        assert!((g.point(1).cost() + 2.0).abs() < 1e-12);
        assert!((g.point(0).cost() + 3.0).abs() < 1e-12);
        assert!((g.point(3).cost() + 3.0).abs() < 1e-12);
    }
}
