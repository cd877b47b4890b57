//! Dantzig–Wolfe column generation over cutting patterns.
//!
//! Each round solves the master relaxation, prices a new pattern against
//! its duals and appends it to the pool. The number of rounds is fixed up
//! front: candidates are added whatever their reduced cost, so the work
//! done is the same for every input of a given size. After the last round
//! the relaxation over the final pool is rounded to integer usage.
//!
//! The result is `Optimal` only when the rounded unit count meets a lower
//! bound: the total-length bound, or the LP bound once pricing found no
//! improving pattern. Otherwise it is `Feasible`.

use tracing::{debug, info};

use crate::error::StageError;
use crate::lp::LpSolver;
use crate::master::MasterProblem;
use crate::pattern::PatternPool;
use crate::pricing::PricingSubproblem;
use crate::types::{Demand, EPSILON, SolveStatus};

pub const DEFAULT_ITERATIONS: usize = 20;

const BOUND_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Iterating { iteration: usize },
    Converged,
}

pub struct ColumnGeneration<'a, S> {
    lp: &'a S,
    demands: &'a [Demand],
    stock_length: f64,
    copies: &'a [u32],
    iterations: usize,
}

#[derive(Debug, Clone)]
pub struct ColumnGenerationOutcome {
    pub status: SolveStatus,
    pub pool: PatternPool,
    /// Integer usage per pattern, indexed by `PatternId`.
    pub usage: Vec<u32>,
    /// Objective of the master relaxation over the final pool.
    pub lp_bound: f64,
    /// Whether the final pricing round found no improving pattern.
    pub priced_out: bool,
}

impl<'a, S: LpSolver> ColumnGeneration<'a, S> {
    pub fn new(lp: &'a S, demands: &'a [Demand], stock_length: f64, copies: &'a [u32]) -> Self {
        Self {
            lp,
            demands,
            stock_length,
            copies,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn run(&self) -> Result<ColumnGenerationOutcome, StageError> {
        let mut pool = PatternPool::seeded(self.demands.len());
        let pricing = PricingSubproblem::new(self.demands, self.stock_length, self.copies);
        let mut priced_out = false;

        let mut state = EngineState::Iterating { iteration: 0 };
        while let EngineState::Iterating { iteration } = state {
            if iteration >= self.iterations {
                state = EngineState::Converged;
                continue;
            }

            let relaxation = MasterProblem::new(self.demands, &pool).solve_relaxation(self.lp)?;

            let priced = pricing.solve(self.lp, &relaxation.duals)?;
            let reduced_cost = priced.reduced_cost();
            priced_out = reduced_cost >= -BOUND_TOLERANCE;
            let (id, added) = pool.push(priced.pattern);
            debug!(
                iteration,
                lp_bound = relaxation.objective,
                reduced_cost,
                pattern = id.index(),
                added,
                "column generation round"
            );

            state = EngineState::Iterating {
                iteration: iteration + 1,
            };
        }

        let master = MasterProblem::new(self.demands, &pool);
        let relaxation = master.solve_relaxation(self.lp)?;
        let lp_bound = relaxation.objective;
        let usage = master.round(&relaxation);
        let units = usage.iter().sum::<u32>() as f64;

        let status = if units <= self.length_bound()
            || (priced_out && units <= (lp_bound - BOUND_TOLERANCE).ceil())
        {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        };
        info!(
            patterns = pool.len(),
            units,
            lp_bound,
            priced_out,
            %status,
            "column generation finished"
        );

        Ok(ColumnGenerationOutcome {
            status,
            pool,
            usage,
            lp_bound,
            priced_out,
        })
    }

    /// `ceil(total demanded length / stock length)`.
    fn length_bound(&self) -> f64 {
        let total: f64 = self.demands.iter().map(Demand::total_length).sum();
        (total / self.stock_length - EPSILON).ceil()
    }
}
