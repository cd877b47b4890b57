//! Bin-indexed integer model for instances small enough to solve directly.
//!
//! One binary per candidate unit says whether it is cut, one bounded integer
//! per (item, unit) says how many copies go on it. Units must be filled in
//! index order, with a lower-indexed unit never holding fewer pieces than
//! the next, and the objective weights unit `j` by `j + 1`. Both only pin
//! down one canonical layout among equivalent ones; the minimum number of
//! units is unaffected.

use tracing::info;

use crate::bounds::Bounds;
use crate::error::{Stage, StageError};
use crate::lp::{Comparison, LinearProblem, LpSolver, Sense, VarId};
use crate::types::{Demand, SolveStatus};

pub struct ExactModel<'a> {
    demands: &'a [Demand],
    stock_length: f64,
    bounds: &'a Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExactAssignment {
    pub status: SolveStatus,
    /// Per used unit, copies of each item.
    pub units: Vec<Vec<u32>>,
}

impl<'a> ExactModel<'a> {
    pub fn new(demands: &'a [Demand], stock_length: f64, bounds: &'a Bounds) -> Self {
        Self {
            demands,
            stock_length,
            bounds,
        }
    }

    pub fn solve<S: LpSolver>(&self, lp: &S) -> Result<ExactAssignment, StageError> {
        let units = self.bounds.max_units;
        let mut problem = LinearProblem::new(Sense::Minimize);

        let used: Vec<VarId> = (0..units)
            .map(|j| problem.add_binary((j + 1) as f64))
            .collect();
        let copies: Vec<Vec<VarId>> = self
            .bounds
            .copies
            .iter()
            .map(|&bound| {
                (0..units)
                    .map(|_| problem.add_integer((0.0, bound as f64), 0.0))
                    .collect()
            })
            .collect();

        for (item, demand) in self.demands.iter().enumerate() {
            problem.add_row(
                copies[item].iter().map(|&x| (x, 1.0)),
                Comparison::Ge,
                demand.qty as f64,
            );
        }

        for j in 0..units {
            let load = self
                .demands
                .iter()
                .enumerate()
                .map(|(item, d)| (copies[item][j], d.width));
            problem.add_row(
                load.chain([(used[j], -self.stock_length)]),
                Comparison::Le,
                0.0,
            );

            if j + 1 < units {
                let this = (0..self.demands.len()).map(|item| (copies[item][j], 1.0));
                let next = (0..self.demands.len()).map(|item| (copies[item][j + 1], -1.0));
                problem.add_row(this.chain(next), Comparison::Ge, 0.0);
            }
        }

        problem.add_row(
            used.iter().map(|&y| (y, 1.0)),
            Comparison::Ge,
            self.bounds.min_units as f64,
        );

        let outcome = lp.solve(&problem);
        if outcome.status != SolveStatus::Optimal {
            return Err(StageError::new(Stage::ExactModel, outcome.status));
        }

        let assignment: Vec<Vec<u32>> = (0..units)
            .filter(|&j| outcome.count(used[j]) > 0)
            .map(|j| copies.iter().map(|row| outcome.count(row[j])).collect())
            .collect();
        info!(
            candidates = units,
            units = assignment.len(),
            "exact model solved"
        );

        Ok(ExactAssignment {
            status: outcome.status,
            units: assignment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds;
    use crate::lp_backend::MicroLp;

    fn solve(demands: &[Demand], stock_length: f64) -> ExactAssignment {
        let bounds = bounds::estimate(demands, stock_length);
        ExactModel::new(demands, stock_length, &bounds)
            .solve(&MicroLp)
            .unwrap()
    }

    #[test]
    fn test_single_item() {
        let assignment = solve(&[Demand::new(3, 40.0)], 100.0);
        assert_eq!(assignment.status, SolveStatus::Optimal);
        assert_eq!(assignment.units.len(), 2);
        // Canonical order puts the fuller unit first. Surplus copies on the
        // second unit are allowed here and trimmed during assembly.
        assert_eq!(assignment.units[0], vec![2]);
        assert!(assignment.units[1][0] >= 1);
    }

    #[test]
    fn test_units_respect_capacity_and_order() {
        let demands = [
            Demand::new(1, 5.0),
            Demand::new(1, 10.0),
            Demand::new(1, 15.0),
            Demand::new(6, 20.0),
        ];
        let assignment = solve(&demands, 50.0);
        assert_eq!(assignment.units.len(), 4);
        let mut previous = u32::MAX;
        for unit in &assignment.units {
            let load: f64 = unit
                .iter()
                .zip(&demands)
                .map(|(&c, d)| c as f64 * d.width)
                .sum();
            assert!(load <= 50.0 + 1e-9);
            let pieces: u32 = unit.iter().sum();
            assert!(pieces <= previous);
            previous = pieces;
        }
        for (item, demand) in demands.iter().enumerate() {
            let total: u32 = assignment.units.iter().map(|u| u[item]).sum();
            assert!(total >= demand.qty);
        }
    }
}
