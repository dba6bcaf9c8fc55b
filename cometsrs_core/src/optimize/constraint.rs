//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};

use crate::optimize::variable::BoundType;

/// Represents a linear constraint (a row) in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint, either bound may be infinite
    Inequality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `terms`: pairs of (variable index, coefficient)
    /// - `equals`: The right hand side of the equality
    ///
    /// # Examples
    /// ```rust
    /// use cometsrs_core::optimize::constraint::Constraint;
    /// // Represents 3*x0 + 2*x1 = 6
    /// let new_constraint = Constraint::new_equality(&[(0, 3.0), (1, 2.0)], 6.);
    /// assert_eq!(new_constraint.bounds(), (6., 6.));
    /// ```
    pub fn new_equality(terms: &[(usize, f64)], equals: f64) -> Self {
        Constraint::Equality {
            terms: Constraint::zip_into_terms(terms),
            equals,
        }
    }

    /// Create a new inequality constraint
    ///
    /// # Parameters
    /// - `terms`: pairs of (variable index, coefficient)
    /// - `lower_bound`: The lowest value the constraint can take
    /// - `upper_bound`: The highest value the constraint can take
    ///
    /// # Examples
    /// ```rust
    /// use cometsrs_core::optimize::constraint::Constraint;
    /// // Represents x0 - x1 <= 0
    /// let new_constraint =
    ///     Constraint::new_inequality(&[(0, 1.0), (1, -1.0)], f64::NEG_INFINITY, 0.);
    /// assert_eq!(new_constraint.terms().len(), 2);
    /// ```
    pub fn new_inequality(terms: &[(usize, f64)], lower_bound: f64, upper_bound: f64) -> Self {
        Constraint::Inequality {
            terms: Constraint::zip_into_terms(terms),
            lower_bound,
            upper_bound,
        }
    }

    /// Terms of the constraint
    pub fn terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Row bounds as a (lower, upper) pair
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Constraint::Equality { equals, .. } => (*equals, *equals),
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => (*lower_bound, *upper_bound),
        }
    }

    pub fn bound_type(&self) -> BoundType {
        let (lower, upper) = self.bounds();
        BoundType::classify(lower, upper)
    }

    /// Evaluate the left hand side of the constraint at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms()
            .iter()
            .map(|t| t.coefficient * values[t.variable])
            .sum()
    }

    fn zip_into_terms(terms: &[(usize, f64)]) -> Vec<ConstraintTerm> {
        terms
            .iter()
            .map(|&(variable, coefficient)| ConstraintTerm {
                variable,
                coefficient,
            })
            .collect()
    }

    /// Create a string representation of the terms in the Constraint
    fn constraint_to_string(&self) -> String {
        match self {
            Constraint::Equality { terms, equals } => {
                format!("{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
            } => {
                format!(
                    "{} <= {} <= {}",
                    lower_bound,
                    Self::terms_to_string(terms),
                    upper_bound
                )
            }
        }
    }

    /// Convert a slice of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        if terms.is_empty() {
            return "0".to_string();
        }
        terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.constraint_to_string())
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintTerm {
    /// Index of the variable within its problem
    pub variable: usize,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*x{}", self.coefficient, self.variable)
    }
}
