//! Implements the interior point solver interface with Clarabel
//!
//! Clarabel solves `min q'x` subject to `Ax + s = b` with `s` in a product of
//! cones. Equalities (rows and fixed variables) go in the zero cone, every finite
//! one-sided bound becomes a row of the nonnegative cone.
use ::clarabel::algebra::CscMatrix as ClarabelMatrix;
use ::clarabel::solver::*;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{
    check_supported, has_infeasible_empty_row, LinearSolver, SolverError, SolverSettings,
};
use crate::optimize::variable::BoundType;
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    settings: SolverSettings,
}

impl ClarabelSolver {
    pub fn new(settings: SolverSettings) -> Self {
        ClarabelSolver { settings }
    }
}

/// Rows of the conic form, split by cone
#[derive(Default)]
struct ConicRows {
    equalities: Vec<(Vec<(usize, f64)>, f64)>,
    inequalities: Vec<(Vec<(usize, f64)>, f64)>,
}

impl ConicRows {
    /// Add `lower <= terms <= upper`
    fn push(&mut self, terms: Vec<(usize, f64)>, lower: f64, upper: f64) {
        match BoundType::classify(lower, upper) {
            BoundType::Fixed => self.equalities.push((terms, lower)),
            BoundType::Free => {}
            BoundType::Upper => self.inequalities.push((terms, upper)),
            BoundType::Lower => self.inequalities.push((negate(&terms), -lower)),
            BoundType::Double => {
                self.inequalities.push((negate(&terms), -lower));
                self.inequalities.push((terms, upper));
            }
        }
    }

    fn from_problem(problem: &Problem) -> Self {
        let mut rows = ConicRows::default();
        for (_, cons) in problem.constraints() {
            if cons.terms().is_empty() {
                continue;
            }
            let terms = cons
                .terms()
                .iter()
                .map(|t| (t.variable, t.coefficient))
                .collect();
            let (lower, upper) = cons.bounds();
            rows.push(terms, lower, upper);
        }
        for (index, var) in problem.variables().enumerate() {
            rows.push(vec![(index, 1.)], var.lower_bound, var.upper_bound);
        }
        rows
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::new();
        if !self.equalities.is_empty() {
            cones.push(ZeroConeT(self.equalities.len()));
        }
        if !self.inequalities.is_empty() {
            cones.push(NonnegativeConeT(self.inequalities.len()));
        }
        cones
    }

    /// Constraint matrix and right hand side, equalities first
    fn assemble(&self, num_variables: usize) -> (ClarabelMatrix<f64>, Vec<f64>) {
        let num_rows = self.equalities.len() + self.inequalities.len();
        let mut coo = CooMatrix::new(num_rows, num_variables);
        let mut rhs = Vec::with_capacity(num_rows);
        for (row, (terms, b)) in self
            .equalities
            .iter()
            .chain(self.inequalities.iter())
            .enumerate()
        {
            for &(col, value) in terms {
                coo.push(row, col, value);
            }
            rhs.push(*b);
        }
        let csc = CscMatrix::from(&coo);
        let matrix = ClarabelMatrix::new(
            num_rows,
            num_variables,
            csc.col_offsets().to_vec(),
            csc.row_indices().to_vec(),
            csc.values().to_vec(),
        );
        (matrix, rhs)
    }
}

fn negate(terms: &[(usize, f64)]) -> Vec<(usize, f64)> {
    terms.iter().map(|&(col, value)| (col, -value)).collect()
}

fn convert_status(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::MaxIterations | SolverStatus::MaxTime => OptimizationStatus::SolverHalted,
        SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
        _ => OptimizationStatus::NumericalError,
    }
}

impl LinearSolver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        check_supported(problem)?;
        if has_infeasible_empty_row(problem, self.settings.tolerance) {
            return Ok(ProblemSolution::failed(OptimizationStatus::Infeasible));
        }
        let n = problem.num_variables();
        let objective = problem.objective();
        // Clarabel only minimizes
        let q: Vec<f64> = match objective.sense() {
            ObjectiveSense::Minimize => objective.coefficients().to_vec(),
            ObjectiveSense::Maximize => objective.coefficients().iter().map(|c| -c).collect(),
        };
        let p = ClarabelMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let rows = ConicRows::from_problem(problem);
        let (a, b) = rows.assemble(n);
        let cones = rows.cones();

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(self.settings.max_iterations)
            .time_limit(self.settings.time_limit.unwrap_or(f64::INFINITY))
            .presolve_enable(problem.presolve())
            .tol_feas(self.settings.tolerance)
            .tol_gap_abs(self.settings.tolerance)
            .build()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;

        log::trace!(
            "clarabel: {} variables, {} equality rows, {} inequality rows",
            n,
            rows.equalities.len(),
            rows.inequalities.len()
        );
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = convert_status(solver.solution.status.clone());
        if !status.is_success() {
            return Ok(ProblemSolution::failed(status));
        }
        let values = solver.solution.x.clone();
        Ok(ProblemSolution {
            status,
            objective_value: Some(objective.evaluate(&values)),
            variable_values: Some(values),
        })
    }

    fn name(&self) -> &str {
        "clarabel"
    }
}
