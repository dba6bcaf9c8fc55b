//! Block headers of the model file format
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::metabolic_model::exchange::KineticParameter;

/// The kinds of blocks a model file can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Smatrix,
    Bounds,
    Objective,
    ObjectiveStyle,
    Optimizer,
    MetaboliteNames,
    ReactionNames,
    ExchangeReactions,
    KmValues,
    VmaxValues,
    HillCoefficients,
    AlphaValues,
    WValues,
    DiffusionConstants,
}

impl BlockKind {
    /// Header as written in model files
    pub fn header(&self) -> &'static str {
        match self {
            BlockKind::Smatrix => "SMATRIX",
            BlockKind::Bounds => "BOUNDS",
            BlockKind::Objective => "OBJECTIVE",
            BlockKind::ObjectiveStyle => "OBJECTIVE_STYLE",
            BlockKind::Optimizer => "OPTIMIZER",
            BlockKind::MetaboliteNames => "METABOLITE_NAMES",
            BlockKind::ReactionNames => "REACTION_NAMES",
            BlockKind::ExchangeReactions => "EXCHANGE_REACTIONS",
            BlockKind::KmValues => "KM_VALUES",
            BlockKind::VmaxValues => "VMAX_VALUES",
            BlockKind::HillCoefficients => "HILL_COEFFICIENTS",
            BlockKind::AlphaValues => "ALPHA_VALUES",
            BlockKind::WValues => "W_VALUES",
            BlockKind::DiffusionConstants => "DIFFUSION_CONSTANTS",
        }
    }

    /// Kinetic parameter set by a per exchange reaction block
    pub fn kinetic_parameter(&self) -> Option<KineticParameter> {
        match self {
            BlockKind::KmValues => Some(KineticParameter::Km),
            BlockKind::VmaxValues => Some(KineticParameter::Vmax),
            BlockKind::HillCoefficients => Some(KineticParameter::Hill),
            BlockKind::AlphaValues => Some(KineticParameter::Alpha),
            BlockKind::WValues => Some(KineticParameter::W),
            BlockKind::DiffusionConstants => Some(KineticParameter::DiffusionConstant),
            _ => None,
        }
    }

    /// Block of the per exchange reaction values of `parameter`
    pub fn for_kinetic_parameter(parameter: KineticParameter) -> BlockKind {
        match parameter {
            KineticParameter::Km => BlockKind::KmValues,
            KineticParameter::Vmax => BlockKind::VmaxValues,
            KineticParameter::Hill => BlockKind::HillCoefficients,
            KineticParameter::Alpha => BlockKind::AlphaValues,
            KineticParameter::W => BlockKind::WValues,
            KineticParameter::DiffusionConstant => BlockKind::DiffusionConstants,
        }
    }

    /// Whether the block refers to the dimensions of the stoichiometric matrix
    pub fn needs_matrix(&self) -> bool {
        !matches!(
            self,
            BlockKind::Smatrix | BlockKind::ObjectiveStyle | BlockKind::Optimizer
        )
    }

    /// Whether the block is indexed by exchange reaction
    pub fn needs_exchange_reactions(&self) -> bool {
        self.kinetic_parameter().is_some()
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.header())
    }
}

impl FromStr for BlockKind {
    type Err = ();

    /// Parse a block header, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "SMATRIX" => BlockKind::Smatrix,
            "BOUNDS" => BlockKind::Bounds,
            "OBJECTIVE" => BlockKind::Objective,
            "OBJECTIVE_STYLE" => BlockKind::ObjectiveStyle,
            "OPTIMIZER" => BlockKind::Optimizer,
            "METABOLITE_NAMES" => BlockKind::MetaboliteNames,
            "REACTION_NAMES" => BlockKind::ReactionNames,
            "EXCHANGE_REACTIONS" => BlockKind::ExchangeReactions,
            "KM_VALUES" => BlockKind::KmValues,
            "VMAX_VALUES" => BlockKind::VmaxValues,
            "HILL_COEFFICIENTS" => BlockKind::HillCoefficients,
            "ALPHA_VALUES" => BlockKind::AlphaValues,
            "W_VALUES" => BlockKind::WValues,
            "DIFFUSION_CONSTANTS" => BlockKind::DiffusionConstants,
            _ => return Err(()),
        };
        Ok(kind)
    }
}
