//! This module provides the flux balance model and its construction
//!
//! Reaction bounds and objective coefficients have a single authoritative copy
//! in the model. Before every solve they are written into the two linear
//! programs (the standard problem and the absolute flux problem), so the two
//! problems never drift apart.
use std::path::Path;

use thiserror::Error;

use crate::configuration::{Configuration, KineticDefaults};
use crate::io::model_file::{read_model_file, ModelFileError};
use crate::metabolic_model::definition::ModelDefinition;
use crate::metabolic_model::exchange::ExchangeReaction;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::matrix::{
    build_msa_problem, build_standard_problem, MatrixError, StoichiometricMatrix,
};
use crate::optimize::objective::ObjectiveStyle;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{solver_for, SolverError, SolverMethod, SolverSettings};
use crate::optimize::OptimizationStatus;

/// Status code of a successful configuration call
pub const PARAMS_OK: i32 = 0;
/// Status code of a configuration call given invalid parameters
pub const PARAMS_ERROR: i32 = -1;
/// Status code of a configuration call on a model without a network
pub const MODEL_NOT_INITIALIZED: i32 = -2;

/// A flux balance model of a single species
///
/// A model is either empty (no network loaded yet) or holds a complete network.
/// Calls that change an empty model fail with [`ModelError::ModelNotInitialized`],
/// queries on an empty model return empty results.
#[derive(Clone, Debug)]
pub struct FbaModel {
    pub(crate) network: Option<Network>,
    pub(crate) settings: SolverSettings,
}

/// Everything a loaded model holds
#[derive(Clone, Debug)]
pub(crate) struct Network {
    pub(crate) stoichiometry: StoichiometricMatrix,
    pub(crate) metabolites: Vec<Metabolite>,
    pub(crate) reactions: Vec<Reaction>,
    pub(crate) exchanges: Vec<ExchangeReaction>,
    pub(crate) kinetic_defaults: KineticDefaults,
    pub(crate) objective_reaction: Option<usize>,
    pub(crate) objective_coefficients: Vec<f64>,
    pub(crate) objective_style: ObjectiveStyle,
    pub(crate) solver_method: SolverMethod,
    /// Standard problem, N columns and M rows
    pub(crate) standard: Problem,
    /// Absolute flux problem, 2N columns and M + 2N rows
    pub(crate) msa: Problem,
    pub(crate) status: OptimizationStatus,
    pub(crate) solution: Option<FbaSolution>,
}

/// Results of the last successful run
#[derive(Clone, Debug, PartialEq)]
pub struct FbaSolution {
    pub status: OptimizationStatus,
    /// Objective value of the last solve of the run
    pub objective_value: f64,
    /// Flux of every reaction
    pub fluxes: Vec<f64>,
    /// Values of the absolute value dummies, for the absolute flux styles only
    pub absolute_fluxes: Option<Vec<f64>>,
}

impl Default for FbaModel {
    fn default() -> Self {
        FbaModel::new_empty()
    }
}

impl FbaModel {
    // region Construction
    /// A model without a network
    pub fn new_empty() -> Self {
        FbaModel {
            network: None,
            settings: SolverSettings::default(),
        }
    }

    /// Build a model from a definition
    pub fn from_definition(definition: &ModelDefinition) -> Result<Self, ModelError> {
        let mut model = FbaModel::new_empty();
        model.load(definition)?;
        Ok(model)
    }

    /// Read and build a model from a model file
    pub fn from_model_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelFileError> {
        let definition = read_model_file(path)?;
        Ok(FbaModel::from_definition(&definition)?)
    }

    /// Replace the network of this model with the one described by `definition`
    ///
    /// Solver limits are read from the global configuration at this point. On
    /// error the model keeps its previous network.
    pub fn load(&mut self, definition: &ModelDefinition) -> Result<(), ModelError> {
        let settings = SolverSettings::default();
        let network = Network::build(definition)?;
        // Make sure the requested method can actually be solved with
        solver_for(network.solver_method, settings)?;
        log::debug!(
            "Loaded model with {} metabolites, {} reactions and {} exchange reactions",
            network.metabolites.len(),
            network.reactions.len(),
            network.exchanges.len()
        );
        self.network = Some(network);
        self.settings = settings;
        Ok(())
    }

    /// Export the current state of the model as a definition
    ///
    /// Current bounds are exported as the bounds of the definition.
    pub fn to_definition(&self) -> Result<ModelDefinition, ModelError> {
        let network = self.network()?;
        let objective = network
            .objective_reaction
            .into_iter()
            .chain(
                network
                    .objective_coefficients
                    .iter()
                    .enumerate()
                    .filter(|&(j, c)| *c != 0. && Some(j) != network.objective_reaction)
                    .map(|(j, _)| j),
            )
            .map(|j| (j, network.objective_coefficients[j]))
            .collect();
        Ok(ModelDefinition {
            num_metabolites: network.metabolites.len(),
            num_reactions: network.reactions.len(),
            stoichiometry: network.stoichiometry.triplets(),
            lower_bounds: network.reactions.iter().map(|r| r.lower_bound).collect(),
            upper_bounds: network.reactions.iter().map(|r| r.upper_bound).collect(),
            objective,
            objective_style: network.objective_style,
            solver_method: Some(network.solver_method),
            metabolite_names: network.metabolites.iter().map(|m| m.name.clone()).collect(),
            reaction_names: network.reactions.iter().map(|r| r.name.clone()).collect(),
            exchange_reactions: network.exchanges.iter().map(|e| e.reaction).collect(),
            kinetic_defaults: network.kinetic_defaults,
            kinetics: network.exchanges.iter().map(|e| e.kinetics).collect(),
        })
    }
    // endregion Construction

    // region Internal Access
    pub(crate) fn network(&self) -> Result<&Network, ModelError> {
        self.network.as_ref().ok_or(ModelError::ModelNotInitialized)
    }

    pub(crate) fn network_mut(&mut self) -> Result<&mut Network, ModelError> {
        self.network.as_mut().ok_or(ModelError::ModelNotInitialized)
    }

    /// Apply `f` to the network, or return `default` when there is none
    fn query<T>(&self, default: T, f: impl FnOnce(&Network) -> T) -> T {
        self.network.as_ref().map(f).unwrap_or(default)
    }
    // endregion Internal Access

    // region Accessors
    pub fn is_initialized(&self) -> bool {
        self.network.is_some()
    }

    pub fn num_reactions(&self) -> usize {
        self.query(0, |n| n.reactions.len())
    }

    pub fn num_metabolites(&self) -> usize {
        self.query(0, |n| n.metabolites.len())
    }

    pub fn num_exchange_reactions(&self) -> usize {
        self.query(0, |n| n.exchanges.len())
    }

    pub fn stoichiometry(&self) -> Option<&StoichiometricMatrix> {
        self.network.as_ref().map(|n| &n.stoichiometry)
    }

    pub fn reactions(&self) -> &[Reaction] {
        self.network
            .as_ref()
            .map(|n| n.reactions.as_slice())
            .unwrap_or_default()
    }

    pub fn metabolites(&self) -> &[Metabolite] {
        self.network
            .as_ref()
            .map(|n| n.metabolites.as_slice())
            .unwrap_or_default()
    }

    pub fn exchange_reactions(&self) -> &[ExchangeReaction] {
        self.network
            .as_ref()
            .map(|n| n.exchanges.as_slice())
            .unwrap_or_default()
    }

    pub fn reaction_names(&self) -> Vec<String> {
        self.reactions().iter().map(|r| r.name.clone()).collect()
    }

    pub fn metabolite_names(&self) -> Vec<String> {
        self.metabolites().iter().map(|m| m.name.clone()).collect()
    }

    /// Reaction indices of the exchange reactions
    pub fn exchange_reaction_indices(&self) -> Vec<usize> {
        self.exchange_reactions().iter().map(|e| e.reaction).collect()
    }

    pub fn exchange_reaction_names(&self) -> Vec<String> {
        self.query(Vec::new(), |n| {
            n.exchanges
                .iter()
                .map(|e| n.reactions[e.reaction].name.clone())
                .collect()
        })
    }

    /// Names of the exchanged metabolites, empty for an exchange reaction without metabolite
    pub fn exchange_metabolite_names(&self) -> Vec<String> {
        self.query(Vec::new(), |n| {
            n.exchanges
                .iter()
                .map(|e| {
                    e.metabolite
                        .map(|m| n.metabolites[m].name.clone())
                        .unwrap_or_default()
                })
                .collect()
        })
    }

    /// The standard linear program, as last materialized
    pub fn standard_problem(&self) -> Option<&Problem> {
        self.network.as_ref().map(|n| &n.standard)
    }

    /// The absolute flux linear program, as last materialized
    pub fn msa_problem(&self) -> Option<&Problem> {
        self.network.as_ref().map(|n| &n.msa)
    }

    pub fn solver_settings(&self) -> SolverSettings {
        self.settings
    }
    // endregion Accessors
}

impl Network {
    fn build(definition: &ModelDefinition) -> Result<Self, ModelError> {
        let n = definition.num_reactions;
        let m = definition.num_metabolites;
        check_length("lower bounds", n, definition.lower_bounds.len())?;
        check_length("upper bounds", n, definition.upper_bounds.len())?;
        check_length("reaction names", n, definition.reaction_names.len())?;
        check_length("metabolite names", m, definition.metabolite_names.len())?;
        check_bounds(&definition.lower_bounds, &definition.upper_bounds)?;
        if let Some(&(reaction, _)) = definition.objective.iter().find(|(r, _)| *r >= n) {
            return Err(ModelError::Params(format!(
                "objective reaction {} is out of range for {} reactions",
                reaction, n
            )));
        }
        if let Some(&reaction) = definition.exchange_reactions.iter().find(|&&r| r >= n) {
            return Err(ModelError::Params(format!(
                "exchange reaction {} is out of range for {} reactions",
                reaction, n
            )));
        }
        if !definition.kinetics.is_empty() {
            check_length(
                "exchange kinetics",
                definition.exchange_reactions.len(),
                definition.kinetics.len(),
            )?;
        }

        let stoichiometry = StoichiometricMatrix::from_triplets(m, n, &definition.stoichiometry)?;
        let standard = build_standard_problem(
            &stoichiometry,
            &definition.lower_bounds,
            &definition.upper_bounds,
        )?;
        let msa = build_msa_problem(
            &stoichiometry,
            &definition.lower_bounds,
            &definition.upper_bounds,
        )?;

        let mut metabolites: Vec<Metabolite> = definition
            .metabolite_names
            .iter()
            .map(|name| Metabolite::new(name))
            .collect();
        let reactions = definition
            .reaction_names
            .iter()
            .zip(definition.lower_bounds.iter().zip(&definition.upper_bounds))
            .map(|(name, (&lb, &ub))| Reaction::new(name, lb, ub))
            .collect::<Vec<_>>();

        let mut exchange_indices = definition.exchange_reactions.clone();
        exchange_indices.sort_unstable();
        exchange_indices.dedup();
        let mut exchanges = Vec::with_capacity(exchange_indices.len());
        for (ordinal, &reaction) in exchange_indices.iter().enumerate() {
            let metabolite = exchange_metabolite(&stoichiometry, reaction, &reactions);
            if let Some(met) = metabolite {
                metabolites[met].extracellular = true;
            }
            let mut exchange = ExchangeReaction::new(reaction, metabolite);
            // Overrides are stored in the order of the definition's exchange list
            if let Some(position) = definition
                .exchange_reactions
                .iter()
                .position(|&r| r == reaction)
            {
                if let Some(kinetics) = definition.kinetics.get(position) {
                    exchange.kinetics = *kinetics;
                }
            }
            log::trace!("exchange {} is reaction {}", ordinal, reaction);
            exchanges.push(exchange);
        }

        let solver_method = definition
            .solver_method
            .unwrap_or_else(|| Configuration::current().solver_method);
        let mut network = Network {
            stoichiometry,
            metabolites,
            reactions,
            exchanges,
            kinetic_defaults: definition.kinetic_defaults,
            objective_reaction: None,
            objective_coefficients: vec![0.; n],
            objective_style: definition.objective_style,
            solver_method,
            standard,
            msa,
            status: OptimizationStatus::Unoptimized,
            solution: None,
        };
        if let Some(reaction) = definition.objective_reaction() {
            network.set_objective_reaction(reaction)?;
        }
        if network.objective_style.is_experimental() {
            log::warn!(
                "Objective style {} is experimental",
                network.objective_style
            );
        }
        let single_term = matches!(definition.objective.as_slice(), [(_, c)] if *c == 1.);
        if !definition.objective.is_empty() && !single_term {
            network.objective_coefficients = definition.objective_coefficients();
        }
        network.materialize()?;
        Ok(network)
    }

    /// Write the authoritative bounds and objective coefficients into both problems
    pub(crate) fn materialize(&mut self) -> Result<(), ModelError> {
        for (j, reaction) in self.reactions.iter().enumerate() {
            self.standard
                .update_variable_bounds(j, reaction.lower_bound, reaction.upper_bound)?;
            self.msa
                .update_variable_bounds(j, reaction.lower_bound, reaction.upper_bound)?;
        }
        self.standard
            .set_objective_coefficients(&self.objective_coefficients)?;
        Ok(())
    }
}

/// The exchanged metabolite of an exchange reaction: the first row with a
/// nonzero entry in the reaction's column
fn exchange_metabolite(
    stoichiometry: &StoichiometricMatrix,
    reaction: usize,
    reactions: &[Reaction],
) -> Option<usize> {
    let rows = stoichiometry.column_rows(reaction);
    if rows.len() > 1 {
        log::warn!(
            "Exchange reaction {} involves {} metabolites, using the first one",
            reactions[reaction].name,
            rows.len()
        );
    }
    rows.first().copied()
}

pub(crate) fn check_length(what: &str, expected: usize, found: usize) -> Result<(), ModelError> {
    if expected != found {
        return Err(ModelError::Params(format!(
            "expected {} {}, found {}",
            expected, what, found
        )));
    }
    Ok(())
}

/// Every pair must satisfy `lower <= upper`, which also rejects NaN
pub(crate) fn check_bounds(lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
    check_length("upper bounds", lower.len(), upper.len())?;
    match lower.iter().zip(upper).position(|(lb, ub)| !(lb <= ub)) {
        Some(i) => Err(ModelError::Params(format!(
            "bounds at {} are invalid: lower bound {} > upper bound {}",
            i, lower[i], upper[i]
        ))),
        None => Ok(()),
    }
}

/// Errors returned by configuration calls on a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Parameters of the call were invalid (lengths, indices, bounds)
    #[error("Invalid parameters: {0}")]
    Params(String),
    /// The model has no network loaded
    #[error("The model has not been initialized")]
    ModelNotInitialized,
    /// The requested solver could not be used
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// The linear programs could not be built
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// The stoichiometric matrix could not be built
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl ModelError {
    /// Integer status code of the error
    pub fn code(&self) -> i32 {
        match self {
            ModelError::ModelNotInitialized => MODEL_NOT_INITIALIZED,
            _ => PARAMS_ERROR,
        }
    }
}

/// Status code of a configuration call result
pub fn status_code<T>(result: &Result<T, ModelError>) -> i32 {
    match result {
        Ok(_) => PARAMS_OK,
        Err(err) => err.code(),
    }
}
