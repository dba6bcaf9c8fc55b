//! The complete, immutable description a flux balance model is built from
//!
//! A definition is what the model file parser and the JSON reader produce. All
//! indices are 0-based; the 1-based convention of the model file format is
//! converted at the parser boundary.
use serde::{Deserialize, Serialize};

use crate::configuration::{Configuration, KineticDefaults};
use crate::metabolic_model::exchange::KineticParameters;
use crate::optimize::objective::ObjectiveStyle;
use crate::optimize::solvers::SolverMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub num_metabolites: usize,
    pub num_reactions: usize,
    /// `(metabolite, reaction, coefficient)` entries of the stoichiometric matrix
    pub stoichiometry: Vec<(usize, usize, f64)>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
    /// `(reaction, coefficient)` terms of the objective, the first reaction is
    /// the objective reaction
    #[serde(default)]
    pub objective: Vec<(usize, f64)>,
    #[serde(default)]
    pub objective_style: ObjectiveStyle,
    /// Method to solve with, None uses the configured default
    #[serde(default)]
    pub solver_method: Option<SolverMethod>,
    pub metabolite_names: Vec<String>,
    pub reaction_names: Vec<String>,
    /// Sorted, deduplicated reaction indices
    #[serde(default)]
    pub exchange_reactions: Vec<usize>,
    #[serde(default)]
    pub kinetic_defaults: KineticDefaults,
    /// Per exchange reaction overrides, same order as `exchange_reactions`
    #[serde(default)]
    pub kinetics: Vec<KineticParameters>,
}

impl ModelDefinition {
    /// Definition of a network with default names and the configured default bounds
    pub fn new(num_metabolites: usize, num_reactions: usize, stoichiometry: &[(usize, usize, f64)]) -> Self {
        let config = Configuration::current();
        ModelDefinition {
            num_metabolites,
            num_reactions,
            stoichiometry: stoichiometry.to_vec(),
            lower_bounds: vec![config.lower_bound; num_reactions],
            upper_bounds: vec![config.upper_bound; num_reactions],
            objective: Vec::new(),
            objective_style: ObjectiveStyle::default(),
            solver_method: None,
            metabolite_names: default_names("met", num_metabolites),
            reaction_names: default_names("rxn", num_reactions),
            exchange_reactions: Vec::new(),
            kinetic_defaults: config.kinetics,
            kinetics: Vec::new(),
        }
    }

    /// Objective reaction, the reaction of the first objective term
    pub fn objective_reaction(&self) -> Option<usize> {
        self.objective.first().map(|&(reaction, _)| reaction)
    }

    /// Dense objective coefficient vector, repeated reactions are summed
    pub fn objective_coefficients(&self) -> Vec<f64> {
        let mut coefficients = vec![0.; self.num_reactions];
        for &(reaction, coefficient) in &self.objective {
            if let Some(c) = coefficients.get_mut(reaction) {
                *c += coefficient;
            }
        }
        coefficients
    }
}

/// `{prefix}1` to `{prefix}{count}`
pub(crate) fn default_names(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{}{}", prefix, i)).collect()
}
