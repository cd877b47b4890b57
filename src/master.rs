use tracing::debug;

use crate::error::{Stage, StageError};
use crate::lp::{Comparison, LinearProblem, LpSolver, RowId, Sense, VarId};
use crate::pattern::{PatternId, PatternPool};
use crate::types::{Demand, SolveStatus};

/// Set-cover over the pattern pool: minimize stock units such that every
/// item gets at least its demanded copies.
pub struct MasterProblem<'a> {
    demands: &'a [Demand],
    pool: &'a PatternPool,
}

/// Solution of the LP relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relaxation {
    pub objective: f64,
    pub usage: Vec<f64>,
    /// One price per demand row.
    pub duals: Vec<f64>,
}

/// Relaxed usage within this distance of an integer counts as that integer.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

impl<'a> MasterProblem<'a> {
    pub fn new(demands: &'a [Demand], pool: &'a PatternPool) -> Self {
        Self { demands, pool }
    }

    fn formulate(&self) -> (LinearProblem, Vec<VarId>, Vec<RowId>) {
        let mut problem = LinearProblem::new(Sense::Minimize);
        let vars: Vec<VarId> = self
            .pool
            .iter()
            .map(|_| problem.add_continuous((0.0, f64::INFINITY), 1.0))
            .collect();

        let rows = self
            .demands
            .iter()
            .enumerate()
            .map(|(item, demand)| {
                let terms = self
                    .pool
                    .iter()
                    .map(|(id, pattern)| (vars[id.index()], pattern.count(item) as f64));
                problem.add_row(terms, Comparison::Ge, demand.qty as f64)
            })
            .collect();

        (problem, vars, rows)
    }

    pub fn solve_relaxation<S: LpSolver>(&self, lp: &S) -> Result<Relaxation, StageError> {
        let (problem, vars, rows) = self.formulate();
        let outcome = lp.solve(&problem);
        if outcome.status != SolveStatus::Optimal {
            return Err(StageError::new(Stage::MasterRelaxation, outcome.status));
        }
        if !outcome.has_duals() {
            return Err(StageError::new(Stage::MasterRelaxation, SolveStatus::Error));
        }

        let relaxation = Relaxation {
            objective: outcome.objective,
            usage: vars.iter().map(|&v| outcome.value(v)).collect(),
            duals: rows.iter().map(|&r| outcome.dual(r).max(0.0)).collect(),
        };
        debug!(
            objective = relaxation.objective,
            patterns = self.pool.len(),
            "master relaxation solved"
        );
        Ok(relaxation)
    }

    /// Integer usage per pattern, indexed by `PatternId`, built from a
    /// relaxed solution over the same pool.
    ///
    /// Relaxed usage is rounded down, then whatever demand is left is
    /// covered one unit at a time by the pool pattern that covers the most
    /// remaining length (first in pool order on ties). Seed patterns keep
    /// this finite for any residual, and a pattern covering nothing is never
    /// picked.
    pub fn round(&self, relaxation: &Relaxation) -> Vec<u32> {
        let mut usage: Vec<u32> = relaxation
            .usage
            .iter()
            .map(|&x| (x + INTEGRALITY_TOLERANCE).floor().max(0.0) as u32)
            .collect();

        let mut residual: Vec<u32> = self
            .demands
            .iter()
            .enumerate()
            .map(|(item, demand)| {
                let covered: u32 = self
                    .pool
                    .iter()
                    .map(|(id, pattern)| pattern.count(item) * usage[id.index()])
                    .sum();
                demand.qty.saturating_sub(covered)
            })
            .collect();
        let rounded_down: u32 = usage.iter().sum();

        while residual.iter().any(|&r| r > 0) {
            let mut best: Option<(PatternId, f64)> = None;
            for (id, pattern) in self.pool.iter() {
                let gain: f64 = residual
                    .iter()
                    .zip(pattern.counts())
                    .zip(self.demands)
                    .map(|((&r, &c), d)| r.min(c) as f64 * d.width)
                    .sum();
                if gain > 0.0 && best.is_none_or(|(_, g)| gain > g) {
                    best = Some((id, gain));
                }
            }
            let Some((id, _)) = best else {
                break;
            };
            usage[id.index()] += 1;
            for (r, &c) in residual.iter_mut().zip(self.pool.get(id).counts()) {
                *r = r.saturating_sub(c);
            }
        }

        debug!(
            relaxed = relaxation.objective,
            rounded_down,
            units = usage.iter().sum::<u32>(),
            "master usage rounded"
        );
        usage
    }
}
