//! Module providing JSON IO for model definitions
//!
//! The layout follows COBRA JSON models: metabolites and reactions are listed
//! by id, reactions name their metabolites in a coefficient map. The kinetic
//! data of the exchange reactions is stored next to them.
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::KineticDefaults;
use crate::metabolic_model::definition::ModelDefinition;
use crate::metabolic_model::exchange::KineticParameters;
use crate::optimize::objective::ObjectiveStyle;
use crate::optimize::solvers::SolverMethod;

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing definitions in json format
#[derive(Serialize, Deserialize, Debug)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    /// Id of the objective reaction, when it is not the first objective term
    #[serde(default)]
    objective_reaction: Option<String>,
    #[serde(default)]
    objective_style: ObjectiveStyle,
    #[serde(default)]
    solver_method: Option<SolverMethod>,
    #[serde(default)]
    kinetic_defaults: Option<KineticDefaults>,
    #[serde(default)]
    exchange_reactions: Vec<JsonExchange>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonMetabolite {
    id: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonReaction {
    id: String,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    objective_coefficient: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug)]
struct JsonExchange {
    reaction: String,
    #[serde(flatten)]
    kinetics: KineticParameters,
}
// endregion JSON Model

// region Conversions
/// Position of every id, failing on repeated ids
fn index_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Result<IndexMap<&'a str, usize>, JsonError> {
    let mut index = IndexMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id, i).is_some() {
            return Err(JsonError::DuplicateId(id.to_string()));
        }
    }
    Ok(index)
}

fn lookup(index: &IndexMap<&str, usize>, id: &str) -> Result<usize, JsonError> {
    index
        .get(id)
        .copied()
        .ok_or_else(|| JsonError::UnknownId(id.to_string()))
}

impl ModelDefinition {
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<ModelDefinition, JsonError> {
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        ModelDefinition::from_json_str(&model_str)
    }

    pub fn from_json_str(data: &str) -> Result<ModelDefinition, JsonError> {
        let json_model = match serde_json::from_str::<JsonModel>(data) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        ModelDefinition::from_json(json_model)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, JsonError> {
        let json_model = self.to_json()?;
        Ok(serde_json::to_string_pretty(&json_model)?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let metabolites = index_ids(json_model.metabolites.iter().map(|m| m.id.as_str()))?;
        let reactions = index_ids(json_model.reactions.iter().map(|r| r.id.as_str()))?;

        let mut stoichiometry = Vec::new();
        let mut objective = Vec::new();
        for (j, rxn) in json_model.reactions.iter().enumerate() {
            for (met, &coef) in &rxn.metabolites {
                stoichiometry.push((lookup(&metabolites, met)?, j, coef));
            }
            if let Some(coef) = rxn.objective_coefficient.filter(|&c| c != 0.) {
                objective.push((j, coef));
            }
        }
        // The named objective reaction leads the objective terms
        if let Some(id) = &json_model.objective_reaction {
            let reaction = lookup(&reactions, id)?;
            match objective.iter().position(|&(j, _)| j == reaction) {
                Some(position) => {
                    let term = objective.remove(position);
                    objective.insert(0, term);
                }
                None => objective.insert(0, (reaction, 1.)),
            }
        }

        let mut exchanges = Vec::with_capacity(json_model.exchange_reactions.len());
        for exchange in &json_model.exchange_reactions {
            exchanges.push((lookup(&reactions, &exchange.reaction)?, exchange.kinetics));
        }
        exchanges.sort_by_key(|&(reaction, _)| reaction);
        exchanges.dedup_by_key(|&mut (reaction, _)| reaction);

        let mut definition = ModelDefinition::new(
            json_model.metabolites.len(),
            json_model.reactions.len(),
            &stoichiometry,
        );
        definition.lower_bounds = json_model.reactions.iter().map(|r| r.lower_bound).collect();
        definition.upper_bounds = json_model.reactions.iter().map(|r| r.upper_bound).collect();
        definition.objective = objective;
        definition.objective_style = json_model.objective_style;
        definition.solver_method = json_model.solver_method;
        definition.metabolite_names = json_model.metabolites.into_iter().map(|m| m.id).collect();
        definition.reaction_names = json_model.reactions.into_iter().map(|r| r.id).collect();
        definition.exchange_reactions = exchanges.iter().map(|&(reaction, _)| reaction).collect();
        definition.kinetics = exchanges.into_iter().map(|(_, kinetics)| kinetics).collect();
        if let Some(defaults) = json_model.kinetic_defaults {
            definition.kinetic_defaults = defaults;
        }
        Ok(definition)
    }

    fn to_json(&self) -> Result<JsonModel, JsonError> {
        self.check_consistent()?;
        // JSON has no representation of infinite bounds
        let bounds = self.lower_bounds.iter().zip(&self.upper_bounds);
        if let Some(j) = bounds.clone().position(|(lb, ub)| !lb.is_finite() || !ub.is_finite()) {
            return Err(JsonError::NonFiniteValue(self.reaction_names[j].clone()));
        }
        index_ids(self.metabolite_names.iter().map(String::as_str))?;
        index_ids(self.reaction_names.iter().map(String::as_str))?;

        let mut reaction_metabolites: Vec<IndexMap<String, f64>> =
            vec![IndexMap::new(); self.num_reactions];
        for &(met, rxn, coef) in &self.stoichiometry {
            reaction_metabolites[rxn].insert(self.metabolite_names[met].clone(), coef);
        }
        let coefficients = self.objective_coefficients();
        let json_reactions = reaction_metabolites
            .into_iter()
            .zip(bounds)
            .enumerate()
            .map(|(j, (metabolites, (&lower_bound, &upper_bound)))| JsonReaction {
                id: self.reaction_names[j].clone(),
                metabolites,
                lower_bound,
                upper_bound,
                objective_coefficient: Some(coefficients[j]).filter(|&c| c != 0.),
            })
            .collect();

        Ok(JsonModel {
            metabolites: self
                .metabolite_names
                .iter()
                .map(|id| JsonMetabolite { id: id.clone() })
                .collect(),
            reactions: json_reactions,
            objective_reaction: self
                .objective_reaction()
                .map(|j| self.reaction_names[j].clone()),
            objective_style: self.objective_style,
            solver_method: self.solver_method,
            kinetic_defaults: Some(self.kinetic_defaults),
            exchange_reactions: self
                .exchange_reactions
                .iter()
                .enumerate()
                .map(|(i, &reaction)| JsonExchange {
                    reaction: self.reaction_names[reaction].clone(),
                    kinetics: self.kinetics.get(i).copied().unwrap_or_default(),
                })
                .collect(),
        })
    }
}

impl ModelDefinition {
    fn check_consistent(&self) -> Result<(), JsonError> {
        let n = self.num_reactions;
        let m = self.num_metabolites;
        if self.lower_bounds.len() != n
            || self.upper_bounds.len() != n
            || self.reaction_names.len() != n
            || self.metabolite_names.len() != m
        {
            return Err(JsonError::InvalidDefinition(format!(
                "expected {} reactions and {} metabolites",
                n, m
            )));
        }
        let bad_entry = self
            .stoichiometry
            .iter()
            .any(|&(met, rxn, _)| met >= m || rxn >= n);
        let bad_reaction = self
            .exchange_reactions
            .iter()
            .chain(self.objective.iter().map(|(rxn, _)| rxn))
            .any(|&rxn| rxn >= n);
        if bad_entry || bad_reaction {
            return Err(JsonError::InvalidDefinition(
                "index out of range".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    /// Two metabolites or two reactions share an id
    #[error("Id {0} is used more than once")]
    DuplicateId(String),
    /// A reaction or exchange refers to an id that is not defined
    #[error("Id {0} is not defined")]
    UnknownId(String),
    /// The definition to write does not hold together
    #[error("Invalid definition, {0}")]
    InvalidDefinition(String),
    /// Infinite bounds can not be written as JSON numbers
    #[error("Reaction {0} has non finite bounds")]
    NonFiniteValue(String),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}
// endregion Conversions
