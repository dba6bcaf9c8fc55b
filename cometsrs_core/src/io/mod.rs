//! Module for reading and writing model definitions
pub mod json;
pub mod model_file;
