//! This module provides the metabolite struct representing a metabolite

/// Represents a metabolite (a row of the stoichiometric matrix)
#[derive(Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Human-readable name of the metabolite
    pub name: String,
    /// Whether some exchange reaction moves this metabolite across the boundary
    pub extracellular: bool,
}

impl Metabolite {
    pub fn new(name: &str) -> Self {
        Metabolite {
            name: name.to_string(),
            extracellular: false,
        }
    }
}
