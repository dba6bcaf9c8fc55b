//! Process wide defaults used when building models and solver settings
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};

use crate::optimize::solvers::SolverMethod;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Lower flux bound given to reactions when a model file has no BOUNDS block
    pub lower_bound: f64,
    /// Upper flux bound given to reactions when a model file has no BOUNDS block
    pub upper_bound: f64,
    /// Numerical tolerance handed to the solver backends
    pub tolerance: f64,
    /// Method used by newly created models
    pub solver_method: SolverMethod,
    /// Maximum number of solver iterations per solve
    pub max_iterations: u32,
    /// Wall clock limit for a single solve in seconds, None for no limit
    pub time_limit: Option<f64>,
    /// Number of worker threads the simulation scheduler should use
    pub processes: u32,
    /// Defaults for the exchange reaction kinetic parameters
    pub kinetics: KineticDefaults,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver_method: SolverMethod::Simplex,
            max_iterations: 10_000,
            time_limit: None,
            processes: 1,
            kinetics: KineticDefaults::default(),
        }
    }
}

impl Configuration {
    /// Snapshot of the current global configuration
    ///
    /// A poisoned lock still holds a usable configuration, so it is recovered
    /// rather than propagated.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the global configuration
    pub fn install(self) {
        match CONFIGURATION.write() {
            Ok(mut config) => *config = self,
            Err(poisoned) => *poisoned.into_inner() = self,
        }
    }

    /// Read a configuration from a JSON string, missing fields take their defaults
    pub fn from_json_str(data: &str) -> Result<Configuration, serde_json::Error> {
        serde_json::from_str(data)
    }
}

/// Model wide defaults for the uptake kinetics of exchange reactions
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticDefaults {
    /// Michaelis constant
    pub km: f64,
    /// Maximum uptake rate
    pub vmax: f64,
    /// Hill coefficient
    pub hill: f64,
    /// Slope of the linear uptake model
    pub alpha: f64,
    /// Saturation level of the linear uptake model
    pub w: f64,
    /// Diffusion constant of the exchanged metabolite
    pub diffusion_constant: f64,
}

impl Default for KineticDefaults {
    fn default() -> Self {
        KineticDefaults {
            km: 0.01,
            vmax: 10.,
            hill: 1.,
            alpha: 1.,
            w: 1.,
            diffusion_constant: 1e-5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_configuration() {
        let config =
            Configuration::from_json_str(r#"{"lower_bound": -20.0, "kinetics": {"vmax": 5.0}}"#)
                .unwrap();
        assert_eq!(config.lower_bound, -20.);
        assert_eq!(config.upper_bound, 1000.);
        assert_eq!(config.kinetics.vmax, 5.);
        assert_eq!(config.kinetics.km, 0.01);
        assert_eq!(config.solver_method, SolverMethod::Simplex);
    }

    #[test]
    fn current_matches_default() {
        // Nothing in the test suite installs a different configuration
        assert_eq!(Configuration::current(), Configuration::default());
    }
}
