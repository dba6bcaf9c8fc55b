//! Flux balance models: the network, its bounds, and how it is optimized

pub mod bounds;
pub mod definition;
pub mod exchange;
pub mod fba;
pub mod force_flux;
pub mod metabolite;
pub mod model;
pub mod reaction;
