//! Stoichiometric matrix storage, and construction of the two linear programs a
//! flux balance model is solved with.
//!
//! The standard problem has one column per reaction and one row per metabolite,
//! every row fixed at zero (`S v = 0`).
//!
//! The absolute flux (MSA) problem doubles the columns: columns `0..N` are the
//! fluxes, columns `N..2N` are non-negative dummies `d`. Its rows are the
//! metabolite rows followed by `v_i - d_i <= 0` and `-v_i - d_i <= 0`, so that at
//! any feasible point `d_i >= |v_i|`.
use indexmap::IndexMap;
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix, CsrMatrix};
use thiserror::Error;

use crate::optimize::problem::{Problem, ProblemError};

/// Name of the objective of the standard problem
pub const STANDARD_OBJECTIVE: &str = "fba_objective";
/// Name of the objective of the absolute flux problem
pub const MSA_OBJECTIVE: &str = "msa_objective";

/// Sparse metabolite x reaction matrix, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct StoichiometricMatrix {
    matrix: CscMatrix<f64>,
}

impl StoichiometricMatrix {
    /// Build from 0-based `(metabolite, reaction, coefficient)` triplets
    ///
    /// Zero coefficients are dropped, a repeated position keeps the last value.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, MatrixError> {
        let mut entries: IndexMap<(usize, usize), f64> = IndexMap::new();
        for &(row, col, value) in triplets {
            if row >= nrows || col >= ncols {
                return Err(MatrixError::IndexOutOfBounds {
                    row,
                    col,
                    nrows,
                    ncols,
                });
            }
            if !value.is_finite() {
                return Err(MatrixError::NonFiniteCoefficient { row, col });
            }
            entries.insert((row, col), value);
        }
        let mut coo = CooMatrix::new(nrows, ncols);
        for ((row, col), value) in entries {
            if value != 0. {
                coo.push(row, col, value);
            }
        }
        Ok(StoichiometricMatrix {
            matrix: CscMatrix::from(&coo),
        })
    }

    /// Build from a dense matrix, keeping only the nonzero entries
    pub fn from_dense(dense: &DMatrix<f64>) -> Result<Self, MatrixError> {
        let mut triplets = Vec::new();
        for col in 0..dense.ncols() {
            for row in 0..dense.nrows() {
                let value = dense[(row, col)];
                if value != 0. {
                    triplets.push((row, col, value));
                }
            }
        }
        Self::from_triplets(dense.nrows(), dense.ncols(), &triplets)
    }

    /// Number of metabolites
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of reactions
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Coefficient at (metabolite, reaction), zero when not stored
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.nrows() || col >= self.ncols() {
            return 0.;
        }
        self.matrix
            .get_entry(row, col)
            .map(|entry| entry.into_value())
            .unwrap_or(0.)
    }

    /// Nonzero entries as 0-based `(row, col, value)`, column by column
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        self.matrix
            .triplet_iter()
            .map(|(row, col, value)| (row, col, *value))
            .collect()
    }

    /// Rows holding a nonzero in column `col`, in increasing order
    pub fn column_rows(&self, col: usize) -> Vec<usize> {
        self.matrix.col(col).row_indices().to_vec()
    }

    /// Dense copy of the matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());
        for (row, col, value) in self.matrix.triplet_iter() {
            dense[(row, col)] = *value;
        }
        dense
    }
}

/// Entries of the absolute flux constraint matrix, `(M + 2N) x 2N`
///
/// Produces exactly `nnz(S) + 4N` entries: the stoichiometric block, then per
/// reaction the pairs of the `v - d <= 0` and `-v - d <= 0` rows.
pub fn msa_triplets(stoichiometry: &StoichiometricMatrix) -> Vec<(usize, usize, f64)> {
    let m = stoichiometry.nrows();
    let n = stoichiometry.ncols();
    let mut triplets = stoichiometry.triplets();
    triplets.reserve(4 * n);
    for i in 0..n {
        triplets.push((m + i, i, 1.));
        triplets.push((m + i, n + i, -1.));
    }
    for i in 0..n {
        triplets.push((m + n + i, i, -1.));
        triplets.push((m + n + i, n + i, -1.));
    }
    triplets
}

/// Rows of a triplet list, each as `(column, value)` terms
fn rows_of(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Vec<Vec<(usize, f64)>> {
    let mut coo = CooMatrix::new(nrows, ncols);
    for &(row, col, value) in triplets {
        coo.push(row, col, value);
    }
    let csr = CsrMatrix::from(&coo);
    csr.row_iter()
        .map(|row| {
            row.col_indices()
                .iter()
                .copied()
                .zip(row.values().iter().copied())
                .collect()
        })
        .collect()
}

fn check_bounds_length(
    stoichiometry: &StoichiometricMatrix,
    lower: &[f64],
    upper: &[f64],
) -> Result<(), ProblemError> {
    for bounds in [lower, upper] {
        if bounds.len() != stoichiometry.ncols() {
            return Err(ProblemError::BoundsLengthMismatch {
                expected: stoichiometry.ncols(),
                found: bounds.len(),
            });
        }
    }
    Ok(())
}

/// Build the standard flux balance problem, all objective coefficients zero
pub fn build_standard_problem(
    stoichiometry: &StoichiometricMatrix,
    lower: &[f64],
    upper: &[f64],
) -> Result<Problem, ProblemError> {
    check_bounds_length(stoichiometry, lower, upper)?;
    let n = stoichiometry.ncols();
    let m = stoichiometry.nrows();
    let mut problem = Problem::new_maximization(STANDARD_OBJECTIVE);
    for j in 0..n {
        problem.add_new_variable(&format!("v{}", j), lower[j], upper[j], 0.)?;
    }
    for (i, terms) in rows_of(m, n, &stoichiometry.triplets())
        .into_iter()
        .enumerate()
    {
        problem.add_new_equality_constraint(&format!("m{}", i), &terms, 0.)?;
    }
    log::debug!(
        "Built standard problem: {} rows, {} columns, {} nonzeros",
        problem.num_constraints(),
        problem.num_variables(),
        problem.num_nonzeros()
    );
    Ok(problem)
}

/// Build the absolute flux problem
///
/// Flux columns mirror `lower`/`upper` with objective 0, dummy columns are
/// bounded `[0, inf)` with objective 1.
pub fn build_msa_problem(
    stoichiometry: &StoichiometricMatrix,
    lower: &[f64],
    upper: &[f64],
) -> Result<Problem, ProblemError> {
    check_bounds_length(stoichiometry, lower, upper)?;
    let n = stoichiometry.ncols();
    let m = stoichiometry.nrows();
    let mut problem = Problem::new_minimization(MSA_OBJECTIVE);
    for j in 0..n {
        problem.add_new_variable(&format!("v{}", j), lower[j], upper[j], 0.)?;
    }
    for j in 0..n {
        problem.add_new_variable(&format!("d{}", j), 0., f64::INFINITY, 1.)?;
    }
    let rows = rows_of(m + 2 * n, 2 * n, &msa_triplets(stoichiometry));
    for (i, terms) in rows.into_iter().enumerate() {
        if i < m {
            problem.add_new_equality_constraint(&format!("m{}", i), &terms, 0.)?;
        } else if i < m + n {
            problem.add_new_inequality_constraint(
                &format!("abs_pos{}", i - m),
                &terms,
                f64::NEG_INFINITY,
                0.,
            )?;
        } else {
            problem.add_new_inequality_constraint(
                &format!("abs_neg{}", i - m - n),
                &terms,
                f64::NEG_INFINITY,
                0.,
            )?;
        }
    }
    log::debug!(
        "Built absolute flux problem: {} rows, {} columns, {} nonzeros",
        problem.num_constraints(),
        problem.num_variables(),
        problem.num_nonzeros()
    );
    Ok(problem)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// An entry lies outside of the declared dimensions
    #[error("Entry ({row}, {col}) is outside of a {nrows}x{ncols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// An entry is NaN or infinite
    #[error("Entry ({row}, {col}) is not a finite number")]
    NonFiniteCoefficient { row: usize, col: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::Constraint;
    use crate::optimize::objective::ObjectiveSense;

    /// Small network: A -> B -> C with an uptake of A and secretion of C
    fn chain() -> StoichiometricMatrix {
        // columns: EX_A, R1 (A->B), R2 (B->C), EX_C
        StoichiometricMatrix::from_dense(&DMatrix::from_row_slice(
            3,
            4,
            &[
                1., -1., 0., 0., //
                0., 1., -1., 0., //
                0., 0., 1., -1., //
            ],
        ))
        .unwrap()
    }

    #[test]
    fn triplets_and_lookup() {
        let s = chain();
        assert_eq!(s.nrows(), 3);
        assert_eq!(s.ncols(), 4);
        assert_eq!(s.nnz(), 6);
        assert_eq!(s.get(1, 2), -1.);
        assert_eq!(s.get(0, 3), 0.);
        assert_eq!(s.get(10, 10), 0.);
        assert_eq!(s.column_rows(1), vec![0, 1]);
        assert_eq!(s.to_dense()[(2, 3)], -1.);
    }

    #[test]
    fn repeated_entries_keep_last() {
        let s = StoichiometricMatrix::from_triplets(1, 2, &[(0, 0, 2.), (0, 1, 1.), (0, 0, 5.)])
            .unwrap();
        assert_eq!(s.get(0, 0), 5.);
        assert_eq!(s.nnz(), 2);
        let zeroed = StoichiometricMatrix::from_triplets(1, 1, &[(0, 0, 1.), (0, 0, 0.)]).unwrap();
        assert_eq!(zeroed.nnz(), 0);
    }

    #[test]
    fn out_of_bounds_triplet() {
        assert_eq!(
            StoichiometricMatrix::from_triplets(1, 2, &[(1, 0, 1.)]),
            Err(MatrixError::IndexOutOfBounds {
                row: 1,
                col: 0,
                nrows: 1,
                ncols: 2
            })
        );
    }

    #[test]
    fn standard_problem_shape() {
        let s = chain();
        let problem = build_standard_problem(&s, &[-10.; 4], &[10.; 4]).unwrap();
        assert_eq!(problem.num_variables(), 4);
        assert_eq!(problem.num_constraints(), 3);
        assert_eq!(problem.num_nonzeros(), s.nnz());
        assert_eq!(problem.objective().sense(), ObjectiveSense::Maximize);
        for (_, cons) in problem.constraints() {
            assert_eq!(cons.bounds(), (0., 0.));
        }
        assert_eq!(
            problem.constraint("m1").unwrap(),
            &Constraint::new_equality(&[(1, 1.), (2, -1.)], 0.)
        );
    }

    #[test]
    fn msa_entry_count() {
        let s = chain();
        let triplets = msa_triplets(&s);
        assert_eq!(triplets.len(), s.nnz() + 4 * s.ncols());
        // Nothing is ever placed in the dummy columns of the metabolite rows
        assert!(triplets
            .iter()
            .all(|&(row, col, _)| row >= s.nrows() || col < s.ncols()));
    }

    #[test]
    fn msa_problem_shape() {
        let s = chain();
        let n = s.ncols();
        let problem = build_msa_problem(&s, &[-10.; 4], &[10.; 4]).unwrap();
        assert_eq!(problem.num_variables(), 2 * n);
        assert_eq!(problem.num_constraints(), s.nrows() + 2 * n);
        assert_eq!(problem.num_nonzeros(), s.nnz() + 4 * n);
        assert_eq!(problem.objective().name(), MSA_OBJECTIVE);
        assert_ne!(problem.objective().name(), STANDARD_OBJECTIVE);

        let coefficients = problem.objective().coefficients();
        assert!(coefficients[..n].iter().all(|&c| c == 0.));
        assert!(coefficients[n..].iter().all(|&c| c == 1.));
        for j in 0..n {
            assert_eq!(problem.variable_bounds(j), Some((-10., 10.)));
            assert_eq!(problem.variable_bounds(n + j), Some((0., f64::INFINITY)));
        }

        assert_eq!(
            problem.constraint("abs_pos2").unwrap(),
            &Constraint::new_inequality(&[(2, 1.), (n + 2, -1.)], f64::NEG_INFINITY, 0.)
        );
        assert_eq!(
            problem.constraint("abs_neg0").unwrap(),
            &Constraint::new_inequality(&[(0, -1.), (n, -1.)], f64::NEG_INFINITY, 0.)
        );
    }

    #[test]
    fn mismatched_bounds() {
        let s = chain();
        assert!(build_standard_problem(&s, &[0.; 3], &[1.; 4]).is_err());
    }
}
