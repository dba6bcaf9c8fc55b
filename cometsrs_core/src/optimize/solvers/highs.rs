//! Simplex backend using the HiGHS solver
use ::highs::{HighsModelStatus, RowProblem, Sense};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{
    check_supported, has_infeasible_empty_row, LinearSolver, SolverError, SolverSettings,
};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug)]
pub struct HighsSolver {
    settings: SolverSettings,
}

impl HighsSolver {
    pub fn new(settings: SolverSettings) -> Self {
        HighsSolver { settings }
    }
}

fn convert_status(status: HighsModelStatus) -> OptimizationStatus {
    match status {
        HighsModelStatus::Optimal => OptimizationStatus::Optimal,
        HighsModelStatus::Infeasible => OptimizationStatus::Infeasible,
        HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
            OptimizationStatus::Unbounded
        }
        HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
            OptimizationStatus::SolverHalted
        }
        HighsModelStatus::NotSet => OptimizationStatus::Unoptimized,
        _ => OptimizationStatus::NumericalError,
    }
}

impl LinearSolver for HighsSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        check_supported(problem)?;
        if has_infeasible_empty_row(problem, self.settings.tolerance) {
            return Ok(ProblemSolution::failed(OptimizationStatus::Infeasible));
        }
        let mut row_problem = RowProblem::default();
        let columns: Vec<_> = problem
            .variables()
            .zip(problem.objective().coefficients())
            .map(|(var, &coef)| row_problem.add_column(coef, var.lower_bound..=var.upper_bound))
            .collect();
        for (_, cons) in problem.constraints() {
            if cons.terms().is_empty() {
                continue;
            }
            let (lower, upper) = cons.bounds();
            row_problem.add_row(
                lower..=upper,
                cons.terms()
                    .iter()
                    .map(|t| (columns[t.variable], t.coefficient)),
            );
        }

        let sense = match problem.objective().sense() {
            ObjectiveSense::Minimize => Sense::Minimise,
            ObjectiveSense::Maximize => Sense::Maximise,
        };
        let mut model = row_problem.optimise(sense);
        model.set_option("output_flag", false);
        model.set_option("solver", "simplex");
        model.set_option("presolve", if problem.presolve() { "on" } else { "off" });
        model.set_option(
            "simplex_iteration_limit",
            i32::try_from(self.settings.max_iterations).unwrap_or(i32::MAX),
        );
        model.set_option("primal_feasibility_tolerance", self.settings.tolerance);
        model.set_option("dual_feasibility_tolerance", self.settings.tolerance);
        if let Some(limit) = self.settings.time_limit {
            model.set_option("time_limit", limit);
        }

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => {
                log::debug!("HiGHS failed to run: {:?}", status);
                return Ok(ProblemSolution::failed(OptimizationStatus::NumericalError));
            }
        };
        let status = convert_status(solved.status());
        if !status.is_success() {
            return Ok(ProblemSolution::failed(status));
        }
        let values = solved.get_solution().columns().to_vec();
        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective().evaluate(&values)),
            variable_values: Some(values),
        })
    }

    fn name(&self) -> &str {
        "highs"
    }
}
