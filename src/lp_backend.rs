//! [`LpSolver`] backed by the pure-Rust `microlp` simplex/branch-and-bound.

use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use tracing::debug;

use crate::lp::{Comparison, LinearProblem, LpOutcome, LpSolver, Sense, VarKind};
use crate::types::SolveStatus;

#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

impl LpSolver for MicroLp {
    fn solve(&self, problem: &LinearProblem) -> LpOutcome {
        debug!(
            vars = problem.vars().len(),
            rows = problem.rows().len(),
            relaxation = problem.is_relaxation(),
            "solving linear problem"
        );

        let (model, vars) = build(problem);
        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => return LpOutcome::failed(status_of(&err)),
        };
        let values: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
        let objective = solution.objective();

        if !problem.is_relaxation() {
            return LpOutcome::solved(SolveStatus::Optimal, objective, values, None);
        }
        match dual_prices(problem) {
            Ok(duals) => LpOutcome::solved(SolveStatus::Optimal, objective, values, Some(duals)),
            Err(err) => {
                debug!(%err, "dual problem failed");
                LpOutcome::failed(SolveStatus::Error)
            }
        }
    }
}

fn status_of(err: &microlp::Error) -> SolveStatus {
    match err {
        microlp::Error::Infeasible => SolveStatus::Infeasible,
        microlp::Error::Unbounded => SolveStatus::Unbounded,
        _ => SolveStatus::Error,
    }
}

fn comparison_op(cmp: Comparison) -> ComparisonOp {
    match cmp {
        Comparison::Le => ComparisonOp::Le,
        Comparison::Ge => ComparisonOp::Ge,
        Comparison::Eq => ComparisonOp::Eq,
    }
}

fn integer_bound(value: f64) -> i32 {
    if value >= i32::MAX as f64 {
        i32::MAX
    } else if value <= i32::MIN as f64 {
        i32::MIN
    } else {
        value as i32
    }
}

fn build(problem: &LinearProblem) -> (Problem, Vec<Variable>) {
    let direction = match problem.sense() {
        Sense::Minimize => OptimizationDirection::Minimize,
        Sense::Maximize => OptimizationDirection::Maximize,
    };
    let mut model = Problem::new(direction);

    let vars: Vec<Variable> = problem
        .vars()
        .iter()
        .map(|v| match v.kind {
            VarKind::Continuous => model.add_var(v.objective, (v.lower, v.upper)),
            VarKind::Integer => model.add_integer_var(
                v.objective,
                (integer_bound(v.lower.ceil()), integer_bound(v.upper.floor())),
            ),
        })
        .collect();

    for row in problem.rows() {
        let terms: Vec<(Variable, f64)> = row
            .terms
            .iter()
            .map(|&(var, coeff)| (vars[var.index()], coeff))
            .collect();
        model.add_constraint(terms, comparison_op(row.cmp), row.rhs);
    }

    (model, vars)
}

/// `microlp` reports no duals, so they come from solving the dual program.
///
/// The primal is read as `min s·c x` with `s = -1` for maximization. Each
/// row gets a multiplier signed by its comparison, each finite variable
/// bound gets a non-negative (lower) or non-positive (upper) multiplier, and
/// every column yields one equality. The row multipliers, scaled back by
/// `s`, are the rates of change of the primal objective in each rhs.
fn dual_prices(problem: &LinearProblem) -> Result<Vec<f64>, microlp::Error> {
    let sign = match problem.sense() {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };

    let mut dual = Problem::new(OptimizationDirection::Maximize);
    let mut columns: Vec<Vec<(Variable, f64)>> = vec![Vec::new(); problem.vars().len()];

    let row_vars: Vec<Variable> = problem
        .rows()
        .iter()
        .map(|row| {
            let bounds = match row.cmp {
                Comparison::Ge => (0.0, f64::INFINITY),
                Comparison::Le => (f64::NEG_INFINITY, 0.0),
                Comparison::Eq => (f64::NEG_INFINITY, f64::INFINITY),
            };
            let y = dual.add_var(row.rhs, bounds);
            for &(var, coeff) in &row.terms {
                columns[var.index()].push((y, coeff));
            }
            y
        })
        .collect();

    for (j, var) in problem.vars().iter().enumerate() {
        if var.lower.is_finite() {
            let z = dual.add_var(var.lower, (0.0, f64::INFINITY));
            columns[j].push((z, 1.0));
        }
        if var.upper.is_finite() {
            let w = dual.add_var(var.upper, (f64::NEG_INFINITY, 0.0));
            columns[j].push((w, 1.0));
        }
    }

    for (column, var) in columns.into_iter().zip(problem.vars()) {
        let cost = sign * var.objective;
        if column.is_empty() {
            if cost != 0.0 {
                return Err(microlp::Error::Infeasible);
            }
            continue;
        }
        dual.add_constraint(column, ComparisonOp::Eq, cost);
    }

    let solution = dual.solve()?;
    Ok(row_vars.iter().map(|&y| sign * solution[y]).collect())
}
