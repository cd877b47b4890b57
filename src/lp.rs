//! Linear and mixed-integer problem formulation.
//!
//! The engine only ever builds a [`LinearProblem`] and hands it to an
//! [`LpSolver`]. Nothing here knows how problems are solved, so a different
//! backend can be dropped in without touching the cutting-stock models.

use crate::types::SolveStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(usize);

impl RowId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Var {
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub terms: Vec<(VarId, f64)>,
    pub cmp: Comparison,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub struct LinearProblem {
    sense: Sense,
    vars: Vec<Var>,
    rows: Vec<Row>,
}

impl LinearProblem {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            vars: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn add_var(&mut self, kind: VarKind, (lower, upper): (f64, f64), objective: f64) -> VarId {
        self.vars.push(Var {
            kind,
            lower,
            upper,
            objective,
        });
        VarId(self.vars.len() - 1)
    }

    pub fn add_continuous(&mut self, bounds: (f64, f64), objective: f64) -> VarId {
        self.add_var(VarKind::Continuous, bounds, objective)
    }

    pub fn add_integer(&mut self, bounds: (f64, f64), objective: f64) -> VarId {
        self.add_var(VarKind::Integer, bounds, objective)
    }

    pub fn add_binary(&mut self, objective: f64) -> VarId {
        self.add_var(VarKind::Integer, (0.0, 1.0), objective)
    }

    /// Adds `Σ coeff·var  cmp  rhs`. Repeated variables are summed and zero
    /// coefficients dropped, so callers can emit terms naively.
    pub fn add_row(
        &mut self,
        terms: impl IntoIterator<Item = (VarId, f64)>,
        cmp: Comparison,
        rhs: f64,
    ) -> RowId {
        let mut merged: Vec<(VarId, f64)> = Vec::new();
        for (var, coeff) in terms {
            debug_assert!(var.0 < self.vars.len(), "unknown variable {var:?}");
            match merged.iter_mut().find(|(v, _)| *v == var) {
                Some((_, c)) => *c += coeff,
                None => merged.push((var, coeff)),
            }
        }
        merged.retain(|&(_, c)| c != 0.0);
        self.rows.push(Row {
            terms: merged,
            cmp,
            rhs,
        });
        RowId(self.rows.len() - 1)
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// True when no variable is integer, i.e. duals are meaningful.
    pub fn is_relaxation(&self) -> bool {
        self.vars.iter().all(|v| v.kind == VarKind::Continuous)
    }
}

/// What a backend reports back for one problem.
#[derive(Debug, Clone, PartialEq)]
pub struct LpOutcome {
    pub status: SolveStatus,
    pub objective: f64,
    values: Vec<f64>,
    duals: Option<Vec<f64>>,
}

impl LpOutcome {
    pub fn solved(
        status: SolveStatus,
        objective: f64,
        values: Vec<f64>,
        duals: Option<Vec<f64>>,
    ) -> Self {
        Self {
            status,
            objective,
            values,
            duals,
        }
    }

    pub fn failed(status: SolveStatus) -> Self {
        Self {
            status,
            objective: 0.0,
            values: Vec::new(),
            duals: None,
        }
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Value of an integer variable, rounded to remove solver noise.
    pub fn count(&self, var: VarId) -> u32 {
        let rounded = self.value(var).round();
        if rounded <= 0.0 { 0 } else { rounded as u32 }
    }

    pub fn dual(&self, row: RowId) -> f64 {
        self.duals
            .as_ref()
            .and_then(|d| d.get(row.0).copied())
            .unwrap_or(0.0)
    }

    pub fn has_duals(&self) -> bool {
        self.duals.is_some()
    }
}

/// A linear/mixed-integer solving capability.
///
/// Implementations must treat every call independently; the engine builds
/// each formulation fresh and never expects state to carry over.
pub trait LpSolver {
    fn solve(&self, problem: &LinearProblem) -> LpOutcome;
}

impl<S: LpSolver + ?Sized> LpSolver for &S {
    fn solve(&self, problem: &LinearProblem) -> LpOutcome {
        (**self).solve(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_row_merges_terms() {
        let mut problem = LinearProblem::new(Sense::Minimize);
        let x = problem.add_continuous((0.0, f64::INFINITY), 1.0);
        let y = problem.add_continuous((0.0, f64::INFINITY), 1.0);
        let row = problem.add_row([(x, 1.0), (y, 0.0), (x, 2.0)], Comparison::Ge, 3.0);
        assert_eq!(problem.rows()[row.index()].terms, vec![(x, 3.0)]);
    }

    #[test]
    fn test_relaxation_detection() {
        let mut problem = LinearProblem::new(Sense::Maximize);
        problem.add_continuous((0.0, 1.0), 1.0);
        assert!(problem.is_relaxation());
        problem.add_binary(1.0);
        assert!(!problem.is_relaxation());
    }

    #[test]
    fn test_outcome_count_rounds_noise() {
        let outcome = LpOutcome::solved(
            SolveStatus::Optimal,
            2.0,
            vec![0.9999999, -1e-12, 2.0000001],
            None,
        );
        let mut problem = LinearProblem::new(Sense::Minimize);
        let a = problem.add_integer((0.0, 5.0), 1.0);
        let b = problem.add_integer((0.0, 5.0), 1.0);
        let c = problem.add_integer((0.0, 5.0), 1.0);
        assert_eq!(outcome.count(a), 1);
        assert_eq!(outcome.count(b), 0);
        assert_eq!(outcome.count(c), 2);
        assert_eq!(outcome.dual(RowId(0)), 0.0);
    }
}
