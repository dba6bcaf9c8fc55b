//! Provides struct representing a linear optimization problem
use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::variable::{Variable, VariableType};

/// A linear optimization problem
///
/// Variables (columns) and constraints (rows) are kept in insertion order, and
/// addressed either by id or by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
    /// Whether the solver may presolve this problem
    presolve: bool,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem, `name` is used as the objective name
    pub fn new(name: &str, objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(name, objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            presolve: true,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization(name: &str) -> Self {
        Self::new(name, ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization(name: &str) -> Self {
        Self::new(name, ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Objective
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Set the objective coefficient of a single variable
    pub fn set_objective_coefficient(
        &mut self,
        index: usize,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        match self.objective.coefficients_mut().get_mut(index) {
            Some(c) => {
                *c = coefficient;
                Ok(())
            }
            None => Err(ProblemError::NonExistentVariable),
        }
    }

    /// Replace the whole objective coefficient vector
    pub fn set_objective_coefficients(&mut self, coefficients: &[f64]) -> Result<(), ProblemError> {
        if coefficients.len() != self.num_variables() {
            return Err(ProblemError::ObjectiveLengthMismatch {
                expected: self.num_variables(),
                found: coefficients.len(),
            });
        }
        self.objective
            .coefficients_mut()
            .copy_from_slice(coefficients);
        Ok(())
    }
    // endregion Objective

    // region Adding Variables
    /// Add a variable to the optimization problem, returning its index
    pub fn add_variable(
        &mut self,
        variable: Variable,
        objective_coefficient: f64,
    ) -> Result<usize, ProblemError> {
        self.validate_variable(&variable)?;
        let index = self.variables.len();
        self.variables.insert(variable.id.clone(), variable);
        self.objective.push_coefficient(objective_coefficient);
        Ok(index)
    }

    /// Create a new continuous variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
    ) -> Result<usize, ProblemError> {
        self.add_variable(
            Variable::new_continuous(id, lower_bound, upper_bound),
            objective_coefficient,
        )
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, id: &str, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(id, &constraint)?;
        self.constraints.insert(id.to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint and add it to the model
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        terms: &[(usize, f64)],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(id, Constraint::new_equality(terms, equals))
    }

    /// Create a new inequality constraint and add it to the model
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        terms: &[(usize, f64)],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(
            id,
            Constraint::new_inequality(terms, lower_bound, upper_bound),
        )
    }
    // endregion Adding Constraints

    // region update variable bounds
    /// Update the bounds of the variable at `index`
    pub fn update_variable_bounds(
        &mut self,
        index: usize,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get_index_mut(index) {
            Some((_, var)) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
                Ok(())
            }
            None => Err(ProblemError::NonExistentVariable),
        }
    }

    /// Bounds of the variable at `index`
    pub fn variable_bounds(&self, index: usize) -> Option<(f64, f64)> {
        self.variables
            .get_index(index)
            .map(|(_, var)| (var.lower_bound, var.upper_bound))
    }
    // endregion update variable bounds

    // region Remove Constraints
    /// Remove a constraint (by id) from the model, returning it if it existed
    pub fn remove_constraint(&mut self, constraint_id: &str) -> Option<Constraint> {
        self.constraints.shift_remove(constraint_id)
    }
    // endregion Remove Constraints

    // region Presolve
    pub fn presolve(&self) -> bool {
        self.presolve
    }

    /// Allow or forbid the solver from presolving this problem
    pub fn set_presolve(&mut self, presolve: bool) {
        self.presolve = presolve;
    }
    // endregion Presolve

    // region Accessors
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of nonzero coefficients over all constraints
    pub fn num_nonzeros(&self) -> usize {
        self.constraints
            .values()
            .map(|c| c.terms().iter().filter(|t| t.coefficient != 0.).count())
            .sum()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&String, &Constraint)> {
        self.constraints.iter()
    }

    pub fn constraint(&self, id: &str) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    /// Index of the variable with the given id
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }
    // endregion Accessors

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, id: &str, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds);
            }
        }
        if constraint
            .terms()
            .iter()
            .any(|t| t.variable >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInConstraint);
        }
        Ok(())
    }
    // endregion Validation Functions

    // region Check Problem
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|var| var.variable_type != VariableType::Continuous)
    }
    // endregion Check Problem
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when trying to perform an update on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
    /// Error when an objective vector doesn't match the number of variables
    #[error("Objective has {found} coefficients but the problem has {expected} variables")]
    ObjectiveLengthMismatch { expected: usize, found: usize },
    /// Error when a bounds vector doesn't match the number of columns being built
    #[error("Expected {expected} bounds but found {found}")]
    BoundsLengthMismatch { expected: usize, found: usize },
}
