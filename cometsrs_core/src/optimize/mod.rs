//! Module for constructing and solving optimization problems

pub mod constraint;
pub mod matrix;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

/// Struct representing the solution to an optimization problem
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemSolution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Values of the variables at the optimum, in problem column order
    ///
    /// Some(Vec) if the problem could be solved, None otherwise
    pub variable_values: Option<Vec<f64>>,
}

impl ProblemSolution {
    /// A solution carrying only a (failed) status
    pub fn failed(status: OptimizationStatus) -> Self {
        ProblemSolution {
            status,
            objective_value: None,
            variable_values: None,
        }
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// An approximate solution has been found
    AlmostOptimal,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

impl OptimizationStatus {
    /// Integer status code, 0 signals success
    pub fn code(&self) -> i32 {
        match self {
            OptimizationStatus::Optimal => 0,
            OptimizationStatus::Unoptimized => 1,
            OptimizationStatus::Unbounded => 2,
            OptimizationStatus::Infeasible => 3,
            OptimizationStatus::AlmostOptimal => 4,
            OptimizationStatus::NumericalError => 5,
            OptimizationStatus::SolverHalted => 6,
        }
    }

    /// Whether a solution with usable values was found
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        )
    }
}
