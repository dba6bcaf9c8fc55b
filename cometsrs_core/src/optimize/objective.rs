//! Provides structs for representing an optimization problem's objective, and the
//! objective styles a flux balance model can be optimized with
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents the linear objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Name of the objective row
    name: String,
    /// One coefficient per problem variable
    coefficients: Vec<f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(name: &str, sense: ObjectiveSense) -> Self {
        Self {
            name: name.to_string(),
            coefficients: Vec::new(),
            sense,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Extend the coefficient vector with a new variable
    pub(crate) fn push_coefficient(&mut self, coefficient: f64) {
        self.coefficients.push(coefficient);
    }

    pub(crate) fn coefficients_mut(&mut self) -> &mut [f64] {
        &mut self.coefficients
    }

    /// Objective value at `values`
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// The ways a flux balance model can be optimized
///
/// The two `*_MAX_TOTAL` styles are numerically admissible but treated as experimental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectiveStyle {
    /// Maximize the objective flux in a single solve
    #[default]
    MaximizeObjectiveFlux,
    /// Minimize the objective flux in a single solve
    MinimizeObjectiveFlux,
    /// Maximize the objective, then maximize the sum of all fluxes at that optimum
    MaximizeTotalFlux,
    /// Maximize the objective, then minimize the sum of all fluxes at that optimum
    MinimizeTotalFlux,
    /// Maximize the objective, then minimize the sum of absolute fluxes
    MaxObjectiveMinTotal,
    /// Maximize the objective, then maximize the sum of absolute fluxes
    MaxObjectiveMaxTotal,
    /// Minimize the objective, then minimize the sum of absolute fluxes
    MinObjectiveMinTotal,
    /// Minimize the objective, then maximize the sum of absolute fluxes
    MinObjectiveMaxTotal,
}

impl ObjectiveStyle {
    pub const ALL: [ObjectiveStyle; 8] = [
        ObjectiveStyle::MaximizeObjectiveFlux,
        ObjectiveStyle::MinimizeObjectiveFlux,
        ObjectiveStyle::MaximizeTotalFlux,
        ObjectiveStyle::MinimizeTotalFlux,
        ObjectiveStyle::MaxObjectiveMinTotal,
        ObjectiveStyle::MaxObjectiveMaxTotal,
        ObjectiveStyle::MinObjectiveMinTotal,
        ObjectiveStyle::MinObjectiveMaxTotal,
    ];

    /// Canonical name, as written in model files
    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveStyle::MaximizeObjectiveFlux => "MAXIMIZE_OBJECTIVE_FLUX",
            ObjectiveStyle::MinimizeObjectiveFlux => "MINIMIZE_OBJECTIVE_FLUX",
            ObjectiveStyle::MaximizeTotalFlux => "MAXIMIZE_TOTAL_FLUX",
            ObjectiveStyle::MinimizeTotalFlux => "MINIMIZE_TOTAL_FLUX",
            ObjectiveStyle::MaxObjectiveMinTotal => "MAX_OBJECTIVE_MIN_TOTAL",
            ObjectiveStyle::MaxObjectiveMaxTotal => "MAX_OBJECTIVE_MAX_TOTAL",
            ObjectiveStyle::MinObjectiveMinTotal => "MIN_OBJECTIVE_MIN_TOTAL",
            ObjectiveStyle::MinObjectiveMaxTotal => "MIN_OBJECTIVE_MAX_TOTAL",
        }
    }

    /// Whether the style sums plain fluxes in its second phase
    ///
    /// These styles overwrite the objective coefficients while running
    pub fn is_total_flux(&self) -> bool {
        matches!(
            self,
            ObjectiveStyle::MaximizeTotalFlux | ObjectiveStyle::MinimizeTotalFlux
        )
    }

    /// Whether the style sums absolute fluxes in its second phase
    pub fn uses_absolute_flux(&self) -> bool {
        matches!(
            self,
            ObjectiveStyle::MaxObjectiveMinTotal
                | ObjectiveStyle::MaxObjectiveMaxTotal
                | ObjectiveStyle::MinObjectiveMinTotal
                | ObjectiveStyle::MinObjectiveMaxTotal
        )
    }

    pub fn is_experimental(&self) -> bool {
        matches!(
            self,
            ObjectiveStyle::MaxObjectiveMaxTotal | ObjectiveStyle::MinObjectiveMaxTotal
        )
    }

    /// Sense of the solve that optimizes the objective itself
    pub fn objective_sense(&self) -> ObjectiveSense {
        match self {
            ObjectiveStyle::MinimizeObjectiveFlux
            | ObjectiveStyle::MinObjectiveMinTotal
            | ObjectiveStyle::MinObjectiveMaxTotal => ObjectiveSense::Minimize,
            // The total flux styles always maximize the objective first
            _ => ObjectiveSense::Maximize,
        }
    }

    /// Sense of the second solve, None for single phase styles
    pub fn total_flux_sense(&self) -> Option<ObjectiveSense> {
        match self {
            ObjectiveStyle::MaximizeObjectiveFlux | ObjectiveStyle::MinimizeObjectiveFlux => None,
            ObjectiveStyle::MaximizeTotalFlux
            | ObjectiveStyle::MaxObjectiveMaxTotal
            | ObjectiveStyle::MinObjectiveMaxTotal => Some(ObjectiveSense::Maximize),
            ObjectiveStyle::MinimizeTotalFlux
            | ObjectiveStyle::MaxObjectiveMinTotal
            | ObjectiveStyle::MinObjectiveMinTotal => Some(ObjectiveSense::Minimize),
        }
    }
}

impl Display for ObjectiveStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ObjectiveStyle {
    type Err = UnknownObjectiveStyle;

    /// Parse a style name, case-insensitive, accepting the older spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let style = match upper.as_str() {
            "MAXIMIZE_OBJECTIVE_FLUX" | "MAX_OBJECTIVE_FLUX" | "MAXIMIZE_OBJECTIVE" => {
                ObjectiveStyle::MaximizeObjectiveFlux
            }
            "MINIMIZE_OBJECTIVE_FLUX" | "MIN_OBJECTIVE_FLUX" | "MINIMIZE_OBJECTIVE" => {
                ObjectiveStyle::MinimizeObjectiveFlux
            }
            "MAXIMIZE_TOTAL_FLUX" | "MAX_TOTAL_FLUX" => ObjectiveStyle::MaximizeTotalFlux,
            "MINIMIZE_TOTAL_FLUX" | "MIN_TOTAL_FLUX" => ObjectiveStyle::MinimizeTotalFlux,
            "MAX_OBJECTIVE_MIN_TOTAL" | "MAXIMIZE_OBJECTIVE_MINIMIZE_TOTAL" => {
                ObjectiveStyle::MaxObjectiveMinTotal
            }
            "MAX_OBJECTIVE_MAX_TOTAL" | "MAXIMIZE_OBJECTIVE_MAXIMIZE_TOTAL" => {
                ObjectiveStyle::MaxObjectiveMaxTotal
            }
            "MIN_OBJECTIVE_MIN_TOTAL" | "MINIMIZE_OBJECTIVE_MINIMIZE_TOTAL" => {
                ObjectiveStyle::MinObjectiveMinTotal
            }
            "MIN_OBJECTIVE_MAX_TOTAL" | "MINIMIZE_OBJECTIVE_MAXIMIZE_TOTAL" => {
                ObjectiveStyle::MinObjectiveMaxTotal
            }
            _ => return Err(UnknownObjectiveStyle(s.trim().to_string())),
        };
        Ok(style)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown objective style `{0}`")]
pub struct UnknownObjectiveStyle(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_names_parse_back() {
        for style in ObjectiveStyle::ALL {
            assert_eq!(style.name().parse::<ObjectiveStyle>().unwrap(), style);
            assert_eq!(
                style.name().to_lowercase().parse::<ObjectiveStyle>().unwrap(),
                style
            );
        }
    }

    #[test]
    fn legacy_aliases() {
        assert_eq!(
            "max_objective_flux".parse::<ObjectiveStyle>().unwrap(),
            ObjectiveStyle::MaximizeObjectiveFlux
        );
        assert_eq!(
            " Min_Total_Flux ".parse::<ObjectiveStyle>().unwrap(),
            ObjectiveStyle::MinimizeTotalFlux
        );
        assert!("MAXIMIZE_GROWTH".parse::<ObjectiveStyle>().is_err());
    }

    #[test]
    fn phase_senses() {
        assert_eq!(
            ObjectiveStyle::MinimizeTotalFlux.objective_sense(),
            ObjectiveSense::Maximize
        );
        assert_eq!(
            ObjectiveStyle::MinObjectiveMaxTotal.objective_sense(),
            ObjectiveSense::Minimize
        );
        assert_eq!(
            ObjectiveStyle::MinObjectiveMaxTotal.total_flux_sense(),
            Some(ObjectiveSense::Maximize)
        );
        assert_eq!(ObjectiveStyle::MaximizeObjectiveFlux.total_flux_sense(), None);
        assert!(ObjectiveStyle::MaxObjectiveMaxTotal.is_experimental());
        assert!(!ObjectiveStyle::MaxObjectiveMinTotal.is_experimental());
    }

    #[test]
    fn evaluate() {
        let mut objective = Objective::new("obj", ObjectiveSense::Maximize);
        objective.push_coefficient(1.);
        objective.push_coefficient(-2.);
        assert_eq!(objective.evaluate(&[3., 1.]), 1.);
    }
}
