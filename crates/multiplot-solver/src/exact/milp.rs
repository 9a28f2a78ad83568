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

use crate::exact::err::MilpSolveError;
use multiplot_model::common::{IdKind, Identifier};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarTag;

impl IdKind for VarTag {
    const LABEL: &'static str = "Var";
}

pub type VarId = Identifier<usize, VarTag>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarKind {
    Binary,
    Continuous { lower: f64, upper: f64 },
}

/// `Σ coef · var + constant`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn constant(c: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    #[inline]
    pub fn add(&mut self, var: VarId, coef: f64) -> &mut Self {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
        self
    }

    #[inline]
    pub fn add_constant(&mut self, c: f64) -> &mut Self {
        self.constant += c;
        self
    }

    /// Adds `scale * other`.
    pub fn add_scaled(&mut self, other: &LinearExpr, scale: f64) -> &mut Self {
        for &(v, c) in &other.terms {
            self.add(v, c * scale);
        }
        self.constant += other.constant * scale;
        self
    }

    #[inline]
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    #[inline]
    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    pub fn eval(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.into_inner()])
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expr.eval(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tolerance,
            Sense::Ge => lhs >= self.rhs - tolerance,
            Sense::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// A minimization problem, independent of any solver library.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MilpModel {
    vars: Vec<VarKind>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MilpModel {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_binary(&mut self) -> VarId {
        self.vars.push(VarKind::Binary);
        VarId::new(self.vars.len() - 1)
    }

    #[inline]
    pub fn add_continuous(&mut self, lower: f64, upper: f64) -> VarId {
        self.vars.push(VarKind::Continuous { lower, upper });
        VarId::new(self.vars.len() - 1)
    }

    #[inline]
    pub fn add_constraint(&mut self, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.constraints.push(LinearConstraint { expr, sense, rhs });
    }

    #[inline]
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    #[inline]
    pub fn vars(&self) -> &[VarKind] {
        &self.vars
    }

    #[inline]
    pub fn nr_vars(&self) -> usize {
        self.vars.len()
    }

    #[inline]
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    #[inline]
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Checks bounds, integrality and every constraint.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.vars.len() {
            return false;
        }
        let bounded = self.vars.iter().zip(values).all(|(kind, &x)| match *kind {
            VarKind::Binary => x.abs() <= tolerance || (x - 1.0).abs() <= tolerance,
            VarKind::Continuous { lower, upper } => x >= lower - tolerance && x <= upper + tolerance,
        });
        bounded
            && self
                .constraints
                .iter()
                .all(|c| c.is_satisfied(values, tolerance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Optimal,
    /// The time limit was hit; the values are the best incumbent.
    TimeLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilpSolution {
    values: Vec<f64>,
    status: SolveStatus,
}

impl MilpSolution {
    #[inline]
    pub fn new(values: Vec<f64>, status: SolveStatus) -> Self {
        Self { values, status }
    }

    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.into_inner()]
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn status(&self) -> SolveStatus {
        self.status
    }

    #[inline]
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

/// A MILP solver that can be swapped without touching model construction.
pub trait MilpBackend: Send + Sync {
    fn name(&self) -> &str;

    fn solve(&self, model: &MilpModel, time_limit: Duration) -> Result<MilpSolution, MilpSolveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_eval_and_scaling() {
        let mut m = MilpModel::new();
        let x = m.add_binary();
        let y = m.add_continuous(0.0, 10.0);

        let mut e = LinearExpr::constant(1.0);
        e.add(x, 2.0).add(y, -0.5).add(y, 0.0);
        assert_eq!(e.terms().len(), 2);
        assert_eq!(e.eval(&[1.0, 4.0]), 1.0 + 2.0 - 2.0);

        let mut f = LinearExpr::new();
        f.add_scaled(&e, 3.0).add_constant(1.0);
        assert_eq!(f.eval(&[1.0, 4.0]), 3.0 * 1.0 + 1.0);
        assert_eq!(f.constant_term(), 4.0);
    }

    #[test]
    fn test_feasibility_check() {
        let mut m = MilpModel::new();
        let x = m.add_binary();
        let y = m.add_continuous(0.0, 5.0);
        let mut e = LinearExpr::new();
        e.add(x, 1.0).add(y, 1.0);
        m.add_constraint(e, Sense::Le, 3.0);

        assert!(m.is_feasible(&[1.0, 2.0], 1e-9));
        assert!(!m.is_feasible(&[1.0, 2.5], 1e-9));
        assert!(!m.is_feasible(&[0.5, 0.0], 1e-9));
        assert!(!m.is_feasible(&[0.0, 6.0], 1e-9));
        assert!(!m.is_feasible(&[0.0], 1e-9));
    }

    #[test]
    fn test_solution_accessors() {
        let s = MilpSolution::new(vec![0.0, 0.9999], SolveStatus::TimeLimit);
        assert!(!s.is_set(VarId::new(0)));
        assert!(s.is_set(VarId::new(1)));
        assert_eq!(s.status(), SolveStatus::TimeLimit);
    }
}
