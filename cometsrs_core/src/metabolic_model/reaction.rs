//! This module provides a struct for representing reactions and their flux bounds
use derive_builder::Builder;

use crate::configuration::Configuration;

/// Represents a reaction (a column of the stoichiometric matrix)
///
/// Every reaction carries two pairs of bounds. The base bounds are the values
/// loaded with the model and can be restored at any time, the current bounds are
/// what the next solve uses.
///
/// # Examples
/// ```rust
/// use cometsrs_core::metabolic_model::reaction::ReactionBuilder;
/// let reaction = ReactionBuilder::default()
///     .name("EX_glc")
///     .lower_bound(-10.)
///     .upper_bound(0.)
///     .build()
///     .unwrap();
/// assert_eq!(reaction.base_lower_bound, -10.);
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(private, name = "build_unchecked"))]
pub struct Reaction {
    /// Human-readable reaction name
    #[builder(setter(into))]
    pub name: String,
    /// Current lower flux bound
    #[builder(default = "Configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Current upper flux bound
    #[builder(default = "Configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Lower bound restored by [`Reaction::reset_bounds`]
    #[builder(setter(skip))]
    pub base_lower_bound: f64,
    /// Upper bound restored by [`Reaction::reset_bounds`]
    #[builder(setter(skip))]
    pub base_upper_bound: f64,
}

impl ReactionBuilder {
    /// Build the reaction, the base bounds start equal to the current bounds
    pub fn build(&self) -> Result<Reaction, ReactionBuilderError> {
        let mut reaction = self.build_unchecked()?;
        reaction.base_lower_bound = reaction.lower_bound;
        reaction.base_upper_bound = reaction.upper_bound;
        Ok(reaction)
    }
}

impl Reaction {
    /// Create a reaction whose base and current bounds are both `[lower, upper]`
    pub fn new(name: &str, lower_bound: f64, upper_bound: f64) -> Self {
        Reaction {
            name: name.to_string(),
            lower_bound,
            upper_bound,
            base_lower_bound: lower_bound,
            base_upper_bound: upper_bound,
        }
    }

    /// Replace the current bounds with the base bounds
    pub fn reset_bounds(&mut self) {
        self.lower_bound = self.base_lower_bound;
        self.upper_bound = self.base_upper_bound;
    }

    /// Whether the flux through the reaction is fixed to a single value
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }

    /// Whether the reaction may carry flux in the reverse direction
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_copies_base_bounds() {
        let reaction = ReactionBuilder::default()
            .name("R1")
            .lower_bound(-5.)
            .upper_bound(7.)
            .build()
            .unwrap();
        assert_eq!(reaction, Reaction::new("R1", -5., 7.));
    }

    #[test]
    fn builder_defaults_from_configuration() {
        let reaction = ReactionBuilder::default().name("R1").build().unwrap();
        let config = Configuration::current();
        assert_eq!(reaction.lower_bound, config.lower_bound);
        assert_eq!(reaction.base_upper_bound, config.upper_bound);
    }

    #[test]
    fn builder_requires_name() {
        assert!(ReactionBuilder::default().lower_bound(0.).build().is_err());
    }

    #[test]
    fn reset() {
        let mut reaction = Reaction::new("R1", -1., 1.);
        reaction.lower_bound = 0.5;
        reaction.upper_bound = 0.5;
        assert!(reaction.is_fixed());
        assert!(!reaction.is_reversible());
        reaction.reset_bounds();
        assert_eq!((reaction.lower_bound, reaction.upper_bound), (-1., 1.));
        assert!(reaction.is_reversible());
    }
}
