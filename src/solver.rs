use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assemble::{assemble, expand_usage};
use crate::bounds::{self, Bounds};
use crate::column_generation::{ColumnGeneration, DEFAULT_ITERATIONS};
use crate::error::StageError;
use crate::exact::ExactModel;
use crate::lp::LpSolver;
use crate::lp_backend::MicroLp;
use crate::types::{Demand, EPSILON, Solution, SolveStatus};

pub const DEFAULT_MAX_EXACT_UNITS: usize = 6;

/// Which model answers a solve, resolved once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Model {
    Exact,
    ColumnGeneration {
        iterations: usize,
    },
    /// Exact when the greedy estimate needs at most `max_exact_units` units,
    /// column generation otherwise.
    Auto {
        iterations: usize,
        max_exact_units: usize,
    },
}

impl Default for Model {
    fn default() -> Self {
        Self::ColumnGeneration {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl Model {
    fn resolve(self, bounds: &Bounds) -> Self {
        match self {
            Self::Auto {
                iterations,
                max_exact_units,
            } => {
                if bounds.max_units <= max_exact_units {
                    Self::Exact
                } else {
                    Self::ColumnGeneration { iterations }
                }
            }
            other => other,
        }
    }
}

pub struct Solver<S = MicroLp> {
    stock_length: f64,
    demands: Vec<Demand>,
    model: Model,
    lp: S,
}

impl Solver<MicroLp> {
    pub fn new(stock_length: f64, demands: Vec<Demand>) -> Self {
        Self {
            stock_length,
            demands,
            model: Model::default(),
            lp: MicroLp,
        }
    }
}

impl<S: LpSolver> Solver<S> {
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Swaps the LP/MIP backend.
    pub fn with_lp<T: LpSolver>(self, lp: T) -> Solver<T> {
        Solver {
            stock_length: self.stock_length,
            demands: self.demands,
            model: self.model,
            lp,
        }
    }

    pub fn solve(&self) -> Solution {
        if let Some(reason) = self.invalid_input() {
            warn!(stock_length = self.stock_length, reason, "rejecting input");
            return Solution::empty(SolveStatus::Infeasible, self.stock_length);
        }
        if self.demands.iter().all(|d| d.qty == 0) {
            return Solution::empty(SolveStatus::Optimal, self.stock_length);
        }

        let bounds = bounds::estimate(&self.demands, self.stock_length);
        let model = self.model.resolve(&bounds);
        info!(
            items = self.demands.len(),
            min_units = bounds.min_units,
            max_units = bounds.max_units,
            ?model,
            "solving"
        );

        match self.run(model, &bounds) {
            Ok(solution) => solution,
            Err(err) => {
                warn!(%err, "solve failed");
                Solution::empty(err.status, self.stock_length)
            }
        }
    }

    fn invalid_input(&self) -> Option<&'static str> {
        if !self.stock_length.is_finite() || self.stock_length <= 0.0 {
            return Some("stock length must be positive");
        }
        for d in &self.demands {
            if !d.width.is_finite() || d.width <= 0.0 {
                return Some("piece width must be positive");
            }
            if d.width > self.stock_length + EPSILON {
                return Some("piece longer than stock");
            }
        }
        None
    }

    fn run(&self, model: Model, bounds: &Bounds) -> Result<Solution, StageError> {
        let (status, units) = match model {
            Model::Exact => {
                let assignment =
                    ExactModel::new(&self.demands, self.stock_length, bounds).solve(&self.lp)?;
                (assignment.status, assignment.units)
            }
            Model::ColumnGeneration { iterations } | Model::Auto { iterations, .. } => {
                let outcome = ColumnGeneration::new(
                    &self.lp,
                    &self.demands,
                    self.stock_length,
                    &bounds.copies,
                )
                .iterations(iterations)
                .run()?;
                (outcome.status, expand_usage(&outcome.pool, &outcome.usage))
            }
        };

        Ok(Solution {
            status,
            stock_length: self.stock_length,
            units: assemble(&self.demands, self.stock_length, units),
        })
    }
}
