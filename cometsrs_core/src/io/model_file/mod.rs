//! Reading and writing models in the block structured model file format
//!
//! ```text
//! SMATRIX 2 3
//!     1 1 1
//!     1 2 -1
//!     2 2 1
//!     2 3 -1
//! //
//! BOUNDS 0 1000
//!     1 0 10
//! //
//! OBJECTIVE
//!     3
//! //
//! ```
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::metabolic_model::definition::ModelDefinition;
use crate::metabolic_model::model::ModelError;

pub mod block;
pub mod parser;
pub mod writer;

pub use parser::ParseError;
pub use writer::format_model_file;

/// Parse the text of a model file
pub fn parse_model_file(input: &str) -> Result<ModelDefinition, ParseError> {
    parser::ModelFileParser::new(input).parse()
}

/// Read and parse a model file
pub fn read_model_file<P: AsRef<Path>>(path: P) -> Result<ModelDefinition, ModelFileError> {
    let input = fs::read_to_string(path.as_ref())?;
    let definition = parse_model_file(&input)?;
    log::debug!(
        "Read model file {} ({} metabolites, {} reactions)",
        path.as_ref().display(),
        definition.num_metabolites,
        definition.num_reactions
    );
    Ok(definition)
}

/// Write `definition` to a model file
pub fn write_model_file<P: AsRef<Path>>(
    definition: &ModelDefinition,
    path: P,
) -> Result<(), ModelFileError> {
    fs::write(path, format_model_file(definition))?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum ModelFileError {
    /// The file could not be read or written
    #[error("Model file could not be accessed: {0}")]
    Io(#[from] std::io::Error),
    /// The file content is not a valid model file
    #[error("Invalid model file, {0}")]
    Parse(#[from] ParseError),
    /// The file parsed, but does not describe a valid model
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
}
