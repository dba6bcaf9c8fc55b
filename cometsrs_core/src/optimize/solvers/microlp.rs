//! Pure Rust simplex backend built on microlp
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{
    check_supported, has_infeasible_empty_row, LinearSolver, SolverError, SolverSettings,
};
use crate::optimize::variable::BoundType;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex solver, always available without a C toolchain
///
/// microlp has no iteration or time limits, so only the tolerance of the
/// settings is used.
#[derive(Clone, Debug)]
pub struct MicrolpSolver {
    settings: SolverSettings,
}

impl MicrolpSolver {
    pub fn new(settings: SolverSettings) -> Self {
        MicrolpSolver { settings }
    }

    fn translate(problem: &Problem) -> (::microlp::Problem, Vec<::microlp::Variable>) {
        let direction = match problem.objective().sense() {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut lp = ::microlp::Problem::new(direction);
        let columns: Vec<::microlp::Variable> = problem
            .variables()
            .zip(problem.objective().coefficients())
            .map(|(var, &coef)| lp.add_var(coef, (var.lower_bound, var.upper_bound)))
            .collect();

        for (_, cons) in problem.constraints() {
            if cons.terms().is_empty() {
                continue;
            }
            let expr = || {
                let mut expr = LinearExpr::empty();
                for term in cons.terms() {
                    expr.add(columns[term.variable], term.coefficient);
                }
                expr
            };
            let (lower, upper) = cons.bounds();
            match BoundType::classify(lower, upper) {
                BoundType::Free => {}
                BoundType::Fixed => lp.add_constraint(expr(), ComparisonOp::Eq, lower),
                BoundType::Upper => lp.add_constraint(expr(), ComparisonOp::Le, upper),
                BoundType::Lower => lp.add_constraint(expr(), ComparisonOp::Ge, lower),
                BoundType::Double => {
                    lp.add_constraint(expr(), ComparisonOp::Ge, lower);
                    lp.add_constraint(expr(), ComparisonOp::Le, upper);
                }
            }
        }
        (lp, columns)
    }
}

impl LinearSolver for MicrolpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        check_supported(problem)?;
        if has_infeasible_empty_row(problem, self.settings.tolerance) {
            return Ok(ProblemSolution::failed(OptimizationStatus::Infeasible));
        }
        let (lp, columns) = Self::translate(problem);
        log::trace!(
            "microlp: {} variables, {} constraints",
            columns.len(),
            problem.num_constraints()
        );
        match lp.solve() {
            Ok(solution) => {
                let values: Vec<f64> = columns.iter().map(|&col| solution[col]).collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(problem.objective().evaluate(&values)),
                    variable_values: Some(values),
                })
            }
            Err(::microlp::Error::Infeasible) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(::microlp::Error::Unbounded) => {
                Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            Err(err) => {
                log::debug!("microlp failed: {}", err);
                Ok(ProblemSolution::failed(OptimizationStatus::NumericalError))
            }
        }
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::solvers::tests::{check_infeasible_lp, check_small_lp};

    #[test]
    fn small_lp() {
        check_small_lp(&MicrolpSolver::new(SolverSettings::default()), 1e-8);
    }

    #[test]
    fn infeasible_lp() {
        check_infeasible_lp(&MicrolpSolver::new(SolverSettings::default()));
    }

    #[test]
    fn unbounded_lp() {
        let mut problem = Problem::new_maximization("unbounded");
        problem.add_new_variable("x", 0., f64::INFINITY, 1.).unwrap();
        let solution = MicrolpSolver::new(SolverSettings::default())
            .solve(&problem)
            .unwrap();
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }

    #[test]
    fn double_bounded_row() {
        let mut problem = Problem::new_minimization("double");
        problem.add_new_variable("x", f64::NEG_INFINITY, f64::INFINITY, 1.).unwrap();
        problem.add_new_variable("y", 0., 5., 0.).unwrap();
        problem
            .add_new_inequality_constraint("c", &[(0, 1.), (1, -1.)], -2., 3.)
            .unwrap();
        problem.update_variable_bounds(1, 4., 4.).unwrap();
        let solution = MicrolpSolver::new(SolverSettings::default())
            .solve(&problem)
            .unwrap();
        assert!((solution.objective_value.unwrap() - 2.).abs() < 1e-9);
    }
}
