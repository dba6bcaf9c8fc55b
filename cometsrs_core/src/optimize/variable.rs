//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A column of a linear program
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Variable {
    /// Used to identify the variable within its problem
    pub id: String,
    /// Kind of values the variable may take
    #[builder(default = "VariableType::Continuous")]
    pub variable_type: VariableType,
    /// Lowest value the variable may take
    #[builder(default = "f64::NEG_INFINITY")]
    pub lower_bound: f64,
    /// Highest value the variable may take
    #[builder(default = "f64::INFINITY")]
    pub upper_bound: f64,
}

impl Variable {
    /// Create a new continuous variable
    pub fn new_continuous(id: &str, lower_bound: f64, upper_bound: f64) -> Variable {
        Variable {
            id: id.to_string(),
            variable_type: VariableType::Continuous,
            lower_bound,
            upper_bound,
        }
    }

    /// How the bounds of the variable should be handed to a solver
    pub fn bound_type(&self) -> BoundType {
        BoundType::classify(self.lower_bound, self.upper_bound)
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} [{}, {}]",
            self.id, self.variable_type, self.lower_bound, self.upper_bound
        )
    }
}

/// Represents the type of variable in an optimization problem
///
/// # Notes:
/// The flux balance formulations only ever create continuous variables, the other
/// kinds are rejected by the linear solvers
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}

/// Shape of a pair of bounds, for a variable or a constraint row
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum BoundType {
    /// No finite bound on either side
    Free,
    /// Only the lower bound is finite
    Lower,
    /// Only the upper bound is finite
    Upper,
    /// Both bounds are finite and differ
    Double,
    /// Both bounds are equal, the value is fixed
    Fixed,
}

impl BoundType {
    pub fn classify(lower_bound: f64, upper_bound: f64) -> BoundType {
        if lower_bound == upper_bound {
            return BoundType::Fixed;
        }
        match (lower_bound.is_finite(), upper_bound.is_finite()) {
            (true, true) => BoundType::Double,
            (true, false) => BoundType::Lower,
            (false, true) => BoundType::Upper,
            (false, false) => BoundType::Free,
        }
    }
}
