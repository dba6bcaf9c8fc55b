//! Core rust implementation of cometsrs, a flux balance analysis engine for
//! the species of a dynamic community simulation.
//!
//! A [`metabolic_model::model::FbaModel`] is built from a
//! [`metabolic_model::definition::ModelDefinition`], read from a model file or
//! JSON, and solved with one of the linear programming backends in
//! [`optimize::solvers`].

pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
