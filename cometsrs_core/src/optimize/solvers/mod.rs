//! Pluggable linear program solvers
//!
//! Every backend takes a [`Problem`] and hands back a [`ProblemSolution`]. Failing
//! to find an optimum (infeasible, unbounded, limits reached) is reported through
//! the solution status, a [`SolverError`] means the problem could not be handed to
//! the backend at all.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "minilp")]
pub mod microlp;

/// A linear program solver backend
pub trait LinearSolver: Send + Sync {
    /// Solve the problem, blocking until the backend finishes
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;

    /// Name of the backend, for logging
    fn name(&self) -> &str;
}

/// Numerical method used to solve the linear programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SolverMethod {
    /// Primal simplex
    #[default]
    Simplex,
    /// Interior point (barrier)
    InteriorPoint,
}

impl Display for SolverMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverMethod::Simplex => write!(f, "SIMPLEX"),
            SolverMethod::InteriorPoint => write!(f, "INTERIOR"),
        }
    }
}

impl FromStr for SolverMethod {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLEX" | "GLPK" => Ok(SolverMethod::Simplex),
            "INTERIOR" | "INTERIOR_POINT" | "IPM" | "BARRIER" => Ok(SolverMethod::InteriorPoint),
            other => Err(SolverError::UnknownMethod(other.to_string())),
        }
    }
}

/// Limits applied to every solve, fixed when a model is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings {
    /// Maximum number of iterations
    pub max_iterations: u32,
    /// Wall clock limit in seconds, None for no limit
    pub time_limit: Option<f64>,
    /// Feasibility and optimality tolerance
    pub tolerance: f64,
}

impl SolverSettings {
    /// Settings taken from the global configuration
    pub fn from_configuration(configuration: &Configuration) -> Self {
        SolverSettings {
            max_iterations: configuration.max_iterations,
            time_limit: configuration.time_limit,
            tolerance: configuration.tolerance,
        }
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings::from_configuration(&Configuration::current())
    }
}

/// Create the backend used for `method`
///
/// Interior point always uses Clarabel. Simplex uses HiGHS when the `highs`
/// feature is enabled, microlp otherwise.
pub fn solver_for(
    method: SolverMethod,
    settings: SolverSettings,
) -> Result<Box<dyn LinearSolver>, SolverError> {
    match method {
        SolverMethod::InteriorPoint => Ok(Box::new(clarabel::ClarabelSolver::new(settings))),
        SolverMethod::Simplex => {
            cfg_if::cfg_if! {
                if #[cfg(feature = "highs")] {
                    Ok(Box::new(highs::HighsSolver::new(settings)))
                } else if #[cfg(feature = "minilp")] {
                    Ok(Box::new(microlp::MicrolpSolver::new(settings)))
                } else {
                    let _ = settings;
                    Err(SolverError::Unavailable(method))
                }
            }
        }
    }
}

/// Checks shared by every backend before a problem is translated
pub(crate) fn check_supported(problem: &Problem) -> Result<(), SolverError> {
    if problem.has_integer_variables() {
        return Err(SolverError::UnsupportedVariableType);
    }
    Ok(())
}

/// Whether a constraint without terms excludes zero, making the problem infeasible
///
/// Backends skip empty rows, so this has to be caught before translation.
pub(crate) fn has_infeasible_empty_row(problem: &Problem, tolerance: f64) -> bool {
    problem.constraints().any(|(_, cons)| {
        let (lower, upper) = cons.bounds();
        cons.terms().is_empty() && (lower > tolerance || upper < -tolerance)
    })
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// No backend for the requested method was compiled in
    #[error("No solver backend is available for the {0} method")]
    Unavailable(SolverMethod),
    /// Unknown method name
    #[error("Unknown solver method `{0}`")]
    UnknownMethod(String),
    /// Linear solvers only accept continuous variables
    #[error("Problem contains integer or binary variables")]
    UnsupportedVariableType,
    /// The backend rejected its settings
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::optimize::problem::Problem;
    use crate::optimize::OptimizationStatus;

    /// max x + y subject to x + 2y <= 4, 3x + y <= 6, x, y >= 0; optimum 2.8 at (1.6, 1.2)
    pub(crate) fn small_lp() -> Problem {
        let mut problem = Problem::new_maximization("small");
        problem.add_new_variable("x", 0., f64::INFINITY, 1.).unwrap();
        problem.add_new_variable("y", 0., f64::INFINITY, 1.).unwrap();
        problem
            .add_new_inequality_constraint("c1", &[(0, 1.), (1, 2.)], f64::NEG_INFINITY, 4.)
            .unwrap();
        problem
            .add_new_inequality_constraint("c2", &[(0, 3.), (1, 1.)], f64::NEG_INFINITY, 6.)
            .unwrap();
        problem
    }

    /// x + y = 1 and x + y >= 3 can't both hold
    pub(crate) fn infeasible_lp() -> Problem {
        let mut problem = Problem::new_maximization("infeasible");
        problem.add_new_variable("x", 0., 10., 1.).unwrap();
        problem.add_new_variable("y", 0., 10., 0.).unwrap();
        problem
            .add_new_equality_constraint("c1", &[(0, 1.), (1, 1.)], 1.)
            .unwrap();
        problem
            .add_new_inequality_constraint("c2", &[(0, 1.), (1, 1.)], 3., f64::INFINITY)
            .unwrap();
        problem
    }

    pub(crate) fn check_small_lp(solver: &dyn LinearSolver, tolerance: f64) {
        let solution = solver.solve(&small_lp()).unwrap();
        assert!(solution.status.is_success(), "{:?}", solution.status);
        let values = solution.variable_values.unwrap();
        assert!((solution.objective_value.unwrap() - 2.8).abs() < tolerance);
        assert!((values[0] - 1.6).abs() < tolerance);
        assert!((values[1] - 1.2).abs() < tolerance);
    }

    pub(crate) fn check_infeasible_lp(solver: &dyn LinearSolver) {
        let solution = solver.solve(&infeasible_lp()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.objective_value.is_none());
        assert!(solution.variable_values.is_none());
    }

    #[test]
    fn method_names() {
        assert_eq!("simplex".parse::<SolverMethod>().unwrap(), SolverMethod::Simplex);
        assert_eq!(
            "Interior".parse::<SolverMethod>().unwrap(),
            SolverMethod::InteriorPoint
        );
        assert!("newton".parse::<SolverMethod>().is_err());
        assert_eq!(SolverMethod::InteriorPoint.to_string(), "INTERIOR");
    }

    #[test]
    fn empty_row_detection() {
        let mut problem = small_lp();
        assert!(!has_infeasible_empty_row(&problem, 1e-9));
        problem.add_new_equality_constraint("empty_ok", &[], 0.).unwrap();
        assert!(!has_infeasible_empty_row(&problem, 1e-9));
        problem.add_new_equality_constraint("empty_bad", &[], 1.).unwrap();
        assert!(has_infeasible_empty_row(&problem, 1e-9));
    }

    #[test]
    fn both_methods_available_by_default() {
        assert_eq!(
            solver_for(SolverMethod::InteriorPoint, SolverSettings::default())
                .unwrap()
                .name(),
            "clarabel"
        );
        assert!(solver_for(SolverMethod::Simplex, SolverSettings::default()).is_ok());
    }
}
