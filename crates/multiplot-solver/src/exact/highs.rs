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

use crate::exact::{
    err::MilpSolveError,
    milp::{LinearExpr, MilpBackend, MilpModel, MilpSolution, Sense, SolveStatus, VarKind},
};
use good_lp::solvers::highs::highs;
use good_lp::*;
use std::time::{Duration, Instant};

/// HiGHS through `good_lp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighsBackend;

impl HighsBackend {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

fn solve_status(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::TimeLimit => SolveStatus::TimeLimit,
        SolutionStatus::Optimal | SolutionStatus::GapLimit => SolveStatus::Optimal,
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from(expr.constant_term()), |acc, &(v, c)| {
            acc + c * vars[v.into_inner()]
        })
}

impl MilpBackend for HighsBackend {
    fn name(&self) -> &str {
        "HiGHS"
    }

    fn solve(&self, model: &MilpModel, time_limit: Duration) -> Result<MilpSolution, MilpSolveError> {
        let mut pv = variables!();
        let vars: Vec<Variable> = model
            .vars()
            .iter()
            .enumerate()
            .map(|(i, kind)| match *kind {
                VarKind::Binary => pv.add(variable().binary().name(format!("b_{i}"))),
                VarKind::Continuous { lower, upper } => {
                    pv.add(variable().min(lower).max(upper).name(format!("c_{i}")))
                }
            })
            .collect();

        let objective = to_expression(model.objective(), &vars);
        let mut prob = pv
            .minimise(objective)
            .using(highs)
            .with_time_limit(time_limit.as_secs_f64());

        for c in model.constraints() {
            let lhs = to_expression(&c.expr, &vars);
            prob.add_constraint(match c.sense {
                Sense::Le => lhs.leq(c.rhs),
                Sense::Ge => lhs.geq(c.rhs),
                Sense::Eq => lhs.eq(c.rhs),
            });
        }

        let start = Instant::now();
        let sol = prob.solve().map_err(|e| match e {
            ResolutionError::Infeasible => MilpSolveError::Infeasible,
            ResolutionError::Unbounded => MilpSolveError::Unbounded,
            other => MilpSolveError::Backend(other.to_string()),
        })?;
        let elapsed = start.elapsed();

        let values: Vec<f64> = vars.iter().map(|&v| sol.value(v)).collect();
        let status = solve_status(sol.status());
        if status == SolveStatus::TimeLimit && !model.is_feasible(&values, 1e-6) {
            return Err(MilpSolveError::NoIncumbent);
        }

        tracing::debug!(
            "HiGHS solved {} variables / {} constraints in {:?} ({:?})",
            model.nr_vars(),
            model.constraints().len(),
            elapsed,
            status
        );
        Ok(MilpSolution::new(values, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_solver_report() {
        assert_eq!(solve_status(SolutionStatus::Optimal), SolveStatus::Optimal);
        assert_eq!(solve_status(SolutionStatus::GapLimit), SolveStatus::Optimal);
        assert_eq!(solve_status(SolutionStatus::TimeLimit), SolveStatus::TimeLimit);
    }

    #[test]
    fn test_small_knapsack() {
        // max 3a + 2b + 2c  s.t.  2a + b + 2c <= 3
        let mut m = MilpModel::new();
        let a = m.add_binary();
        let b = m.add_binary();
        let c = m.add_binary();

        let mut obj = LinearExpr::new();
        obj.add(a, -3.0).add(b, -2.0).add(c, -2.0);
        m.set_objective(obj);

        let mut cap = LinearExpr::new();
        cap.add(a, 2.0).add(b, 1.0).add(c, 2.0);
        m.add_constraint(cap, Sense::Le, 3.0);

        let sol = HighsBackend::new()
            .solve(&m, Duration::from_secs(10))
            .expect("HiGHS should solve a three variable knapsack");
        assert!(sol.is_set(a));
        assert!(sol.is_set(b));
        assert!(!sol.is_set(c));
        assert_eq!(sol.status(), SolveStatus::Optimal);
        assert!((m.objective().eval(sol.values()) + 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_continuous_bounds_are_respected() {
        // min -y  s.t.  y <= 4 x,  x binary,  y in [0, 2.5]
        let mut m = MilpModel::new();
        let x = m.add_binary();
        let y = m.add_continuous(0.0, 2.5);

        let mut obj = LinearExpr::new();
        obj.add(y, -1.0);
        m.set_objective(obj);

        let mut link = LinearExpr::new();
        link.add(y, 1.0).add(x, -4.0);
        m.add_constraint(link, Sense::Le, 0.0);

        let sol = HighsBackend::new()
            .solve(&m, Duration::from_secs(10))
            .expect("HiGHS should solve a bounded model");
        assert!((sol.value(y) - 2.5).abs() < 1e-6);
        assert!(sol.is_set(x));
    }

    #[test]
    fn test_infeasible_model_is_reported() {
        let mut m = MilpModel::new();
        let x = m.add_binary();
        let mut e = LinearExpr::new();
        e.add(x, 1.0);
        m.add_constraint(e, Sense::Ge, 2.0);

        let err = HighsBackend::new()
            .solve(&m, Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(err, MilpSolveError::Infeasible);
    }
}
