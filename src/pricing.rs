use tracing::debug;

use crate::error::{Stage, StageError};
use crate::lp::{Comparison, LinearProblem, LpSolver, Sense};
use crate::pattern::Pattern;
use crate::types::{Demand, SolveStatus};

/// Bounded knapsack proposing the pattern the current duals value most.
pub struct PricingSubproblem<'a> {
    demands: &'a [Demand],
    stock_length: f64,
    copies: &'a [u32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedPattern {
    pub pattern: Pattern,
    /// `Σ dual_i · count_i` at the knapsack optimum.
    pub value: f64,
}

impl PricedPattern {
    /// `1 − Σ dual_i · count_i`, the cost of one more unit of this pattern
    /// against what the current duals pay for it. Negative means the
    /// pattern can lower the master bound.
    pub fn reduced_cost(&self) -> f64 {
        1.0 - self.value
    }
}

impl<'a> PricingSubproblem<'a> {
    pub fn new(demands: &'a [Demand], stock_length: f64, copies: &'a [u32]) -> Self {
        Self {
            demands,
            stock_length,
            copies,
        }
    }

    pub fn solve<S: LpSolver>(&self, lp: &S, duals: &[f64]) -> Result<PricedPattern, StageError> {
        let mut problem = LinearProblem::new(Sense::Maximize);
        let vars: Vec<_> = self
            .copies
            .iter()
            .zip(duals)
            .map(|(&bound, &dual)| problem.add_integer((0.0, bound as f64), dual))
            .collect();
        problem.add_row(
            vars.iter().zip(self.demands).map(|(&v, d)| (v, d.width)),
            Comparison::Le,
            self.stock_length,
        );

        let outcome = lp.solve(&problem);
        if outcome.status != SolveStatus::Optimal {
            return Err(StageError::new(Stage::Pricing, outcome.status));
        }

        let pattern = Pattern::new(vars.iter().map(|&v| outcome.count(v)).collect());
        debug!(?pattern, value = outcome.objective, "priced pattern");
        Ok(PricedPattern {
            pattern,
            value: outcome.objective,
        })
    }
}
