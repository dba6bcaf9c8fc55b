//! Exchange reactions and the kinetic parameters limiting their uptake
//!
//! Each exchange reaction may override any kinetic parameter. A parameter left
//! unset follows the model wide default, so changing the default later changes
//! every exchange that never received an explicit value.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::configuration::KineticDefaults;
use crate::metabolic_model::model::{check_length, FbaModel, ModelError};

/// A kinetic parameter of an exchange reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KineticParameter {
    /// Michaelis constant
    Km,
    /// Maximum uptake rate
    Vmax,
    /// Hill coefficient
    Hill,
    /// Slope of the linear uptake model
    Alpha,
    /// Saturation of the linear uptake model
    W,
    /// Diffusion constant of the exchanged metabolite
    DiffusionConstant,
}

impl KineticParameter {
    pub const ALL: [KineticParameter; 6] = [
        KineticParameter::Km,
        KineticParameter::Vmax,
        KineticParameter::Hill,
        KineticParameter::Alpha,
        KineticParameter::W,
        KineticParameter::DiffusionConstant,
    ];

    /// Whether `value` is an acceptable value for this parameter
    pub fn is_valid(&self, value: f64) -> bool {
        match self {
            KineticParameter::Hill => value.is_finite() && value > 0.,
            _ => value.is_finite() && value >= 0.,
        }
    }
}

impl Display for KineticParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KineticParameter::Km => "Km",
            KineticParameter::Vmax => "Vmax",
            KineticParameter::Hill => "Hill coefficient",
            KineticParameter::Alpha => "alpha",
            KineticParameter::W => "W",
            KineticParameter::DiffusionConstant => "diffusion constant",
        };
        write!(f, "{}", name)
    }
}

impl KineticDefaults {
    pub fn value(&self, parameter: KineticParameter) -> f64 {
        match parameter {
            KineticParameter::Km => self.km,
            KineticParameter::Vmax => self.vmax,
            KineticParameter::Hill => self.hill,
            KineticParameter::Alpha => self.alpha,
            KineticParameter::W => self.w,
            KineticParameter::DiffusionConstant => self.diffusion_constant,
        }
    }

    pub fn set_value(&mut self, parameter: KineticParameter, value: f64) {
        match parameter {
            KineticParameter::Km => self.km = value,
            KineticParameter::Vmax => self.vmax = value,
            KineticParameter::Hill => self.hill = value,
            KineticParameter::Alpha => self.alpha = value,
            KineticParameter::W => self.w = value,
            KineticParameter::DiffusionConstant => self.diffusion_constant = value,
        }
    }
}

/// Explicit kinetic values of one exchange reaction, None follows the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticParameters {
    pub km: Option<f64>,
    pub vmax: Option<f64>,
    pub hill: Option<f64>,
    pub alpha: Option<f64>,
    pub w: Option<f64>,
    pub diffusion_constant: Option<f64>,
}

impl KineticParameters {
    pub fn get(&self, parameter: KineticParameter) -> Option<f64> {
        match parameter {
            KineticParameter::Km => self.km,
            KineticParameter::Vmax => self.vmax,
            KineticParameter::Hill => self.hill,
            KineticParameter::Alpha => self.alpha,
            KineticParameter::W => self.w,
            KineticParameter::DiffusionConstant => self.diffusion_constant,
        }
    }

    pub fn set(&mut self, parameter: KineticParameter, value: Option<f64>) {
        let slot = match parameter {
            KineticParameter::Km => &mut self.km,
            KineticParameter::Vmax => &mut self.vmax,
            KineticParameter::Hill => &mut self.hill,
            KineticParameter::Alpha => &mut self.alpha,
            KineticParameter::W => &mut self.w,
            KineticParameter::DiffusionConstant => &mut self.diffusion_constant,
        };
        *slot = value;
    }

    /// Explicit value if set, the default otherwise
    pub fn resolve(&self, parameter: KineticParameter, defaults: &KineticDefaults) -> f64 {
        self.get(parameter)
            .unwrap_or_else(|| defaults.value(parameter))
    }
}

/// A reaction moving a metabolite between the cell and its surroundings
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReaction {
    /// Index of the reaction in the network
    pub reaction: usize,
    /// Index of the exchanged metabolite, None if the reaction column is empty
    pub metabolite: Option<usize>,
    pub kinetics: KineticParameters,
}

impl ExchangeReaction {
    pub fn new(reaction: usize, metabolite: Option<usize>) -> Self {
        ExchangeReaction {
            reaction,
            metabolite,
            kinetics: KineticParameters::default(),
        }
    }

    /// Maximum uptake rate at `concentration` following Michaelis-Menten/Hill kinetics
    pub fn michaelis_menten_uptake(&self, concentration: f64, defaults: &KineticDefaults) -> f64 {
        michaelis_menten_uptake(
            concentration,
            self.kinetics.resolve(KineticParameter::Km, defaults),
            self.kinetics.resolve(KineticParameter::Vmax, defaults),
            self.kinetics.resolve(KineticParameter::Hill, defaults),
        )
    }

    /// Maximum uptake rate at `concentration` following the linear model
    pub fn linear_uptake(&self, concentration: f64, defaults: &KineticDefaults) -> f64 {
        linear_uptake(
            concentration,
            self.kinetics.resolve(KineticParameter::Alpha, defaults),
            self.kinetics.resolve(KineticParameter::W, defaults),
        )
    }
}

impl FbaModel {
    // region Kinetics
    /// Model wide kinetic defaults
    pub fn kinetic_defaults(&self) -> KineticDefaults {
        self.network
            .as_ref()
            .map(|n| n.kinetic_defaults)
            .unwrap_or_default()
    }

    /// Change a model wide default
    ///
    /// Exchange reactions without an explicit value for `parameter` follow the
    /// new default.
    pub fn set_default_kinetic_value(
        &mut self,
        parameter: KineticParameter,
        value: f64,
    ) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        check_kinetic_value(parameter, value)?;
        network.kinetic_defaults.set_value(parameter, value);
        Ok(())
    }

    /// Effective value of `parameter` for every exchange reaction
    pub fn kinetic_values(&self, parameter: KineticParameter) -> Vec<f64> {
        self.network
            .as_ref()
            .map(|n| {
                n.exchanges
                    .iter()
                    .map(|e| e.kinetics.resolve(parameter, &n.kinetic_defaults))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Give every exchange reaction an explicit value of `parameter`
    pub fn set_kinetic_values(
        &mut self,
        parameter: KineticParameter,
        values: &[f64],
    ) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        check_length(
            &format!("{} values", parameter),
            network.exchanges.len(),
            values.len(),
        )?;
        for &value in values {
            check_kinetic_value(parameter, value)?;
        }
        for (exchange, &value) in network.exchanges.iter_mut().zip(values) {
            exchange.kinetics.set(parameter, Some(value));
        }
        Ok(())
    }

    /// Drop the explicit values of `parameter`, so every exchange follows the default again
    pub fn clear_kinetic_values(&mut self, parameter: KineticParameter) -> Result<(), ModelError> {
        self.network_mut()?
            .exchanges
            .iter_mut()
            .for_each(|e| e.kinetics.set(parameter, None));
        Ok(())
    }

    /// Maximum Michaelis-Menten uptake of every exchange reaction
    ///
    /// `concentrations` holds the concentration of each exchanged metabolite,
    /// in exchange order.
    pub fn michaelis_menten_uptakes(&self, concentrations: &[f64]) -> Result<Vec<f64>, ModelError> {
        let network = self.network()?;
        check_length("concentrations", network.exchanges.len(), concentrations.len())?;
        Ok(network
            .exchanges
            .iter()
            .zip(concentrations)
            .map(|(e, &c)| e.michaelis_menten_uptake(c, &network.kinetic_defaults))
            .collect())
    }

    /// Maximum linear model uptake of every exchange reaction
    pub fn linear_uptakes(&self, concentrations: &[f64]) -> Result<Vec<f64>, ModelError> {
        let network = self.network()?;
        check_length("concentrations", network.exchanges.len(), concentrations.len())?;
        Ok(network
            .exchanges
            .iter()
            .zip(concentrations)
            .map(|(e, &c)| e.linear_uptake(c, &network.kinetic_defaults))
            .collect())
    }
    // endregion Kinetics
}

fn check_kinetic_value(parameter: KineticParameter, value: f64) -> Result<(), ModelError> {
    if !parameter.is_valid(value) {
        return Err(ModelError::Params(format!(
            "{} is not a valid {}",
            value, parameter
        )));
    }
    Ok(())
}

/// `vmax * c^h / (km^h + c^h)`, zero for non-positive concentrations
pub fn michaelis_menten_uptake(concentration: f64, km: f64, vmax: f64, hill: f64) -> f64 {
    if concentration <= 0. {
        return 0.;
    }
    let c = concentration.powf(hill);
    vmax * c / (km.powf(hill) + c)
}

/// `min(alpha * c, w)`, zero for non-positive concentrations
pub fn linear_uptake(concentration: f64, alpha: f64, w: f64) -> f64 {
    if concentration <= 0. {
        return 0.;
    }
    (alpha * concentration).min(w)
}
