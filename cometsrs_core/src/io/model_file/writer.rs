//! Writes a [`ModelDefinition`] in the model file format
use std::fmt::Write;

use crate::io::model_file::block::BlockKind;
use crate::metabolic_model::definition::ModelDefinition;
use crate::metabolic_model::exchange::{KineticParameter, KineticParameters};

const TERMINATOR: &str = "//";

/// Model file text of `definition`, readable by [`super::parse_model_file`]
pub fn format_model_file(definition: &ModelDefinition) -> String {
    let mut out = String::new();
    // Writing into a String can not fail
    let _ = write_blocks(&mut out, definition);
    out
}

fn write_blocks(out: &mut String, definition: &ModelDefinition) -> std::fmt::Result {
    writeln!(
        out,
        "{} {} {}",
        BlockKind::Smatrix,
        definition.num_metabolites,
        definition.num_reactions
    )?;
    for &(metabolite, reaction, value) in &definition.stoichiometry {
        writeln!(out, "    {} {} {}", metabolite + 1, reaction + 1, value)?;
    }
    writeln!(out, "{}", TERMINATOR)?;

    // Every reaction gets its own line, so the header defaults never apply
    writeln!(out, "{} 0 0", BlockKind::Bounds)?;
    let bounds = definition.lower_bounds.iter().zip(&definition.upper_bounds);
    for (reaction, (lower, upper)) in bounds.enumerate() {
        writeln!(out, "    {} {} {}", reaction + 1, lower, upper)?;
    }
    writeln!(out, "{}", TERMINATOR)?;

    if !definition.objective.is_empty() {
        writeln!(out, "{}", BlockKind::Objective)?;
        for &(reaction, coefficient) in &definition.objective {
            writeln!(out, "    {} {}", reaction + 1, coefficient)?;
        }
        writeln!(out, "{}", TERMINATOR)?;
    }

    writeln!(out, "{}", BlockKind::ObjectiveStyle)?;
    writeln!(out, "    {}", definition.objective_style)?;
    writeln!(out, "{}", TERMINATOR)?;

    if let Some(method) = definition.solver_method {
        writeln!(out, "{}", BlockKind::Optimizer)?;
        writeln!(out, "    {}", method)?;
        writeln!(out, "{}", TERMINATOR)?;
    }

    write_names(out, BlockKind::MetaboliteNames, &definition.metabolite_names)?;
    write_names(out, BlockKind::ReactionNames, &definition.reaction_names)?;

    if definition.exchange_reactions.is_empty() {
        return Ok(());
    }
    let exchanges = sorted_exchanges(definition);
    writeln!(out, "{}", BlockKind::ExchangeReactions)?;
    let indices: Vec<String> = exchanges
        .iter()
        .map(|(reaction, _)| (reaction + 1).to_string())
        .collect();
    writeln!(out, "    {}", indices.join(" "))?;
    writeln!(out, "{}", TERMINATOR)?;

    for parameter in KineticParameter::ALL {
        writeln!(
            out,
            "{} {}",
            BlockKind::for_kinetic_parameter(parameter),
            definition.kinetic_defaults.value(parameter)
        )?;
        for (ordinal, (_, kinetics)) in exchanges.iter().enumerate() {
            if let Some(value) = kinetics.get(parameter) {
                writeln!(out, "    {} {}", ordinal + 1, value)?;
            }
        }
        writeln!(out, "{}", TERMINATOR)?;
    }
    Ok(())
}

fn write_names(out: &mut String, block: BlockKind, names: &[String]) -> std::fmt::Result {
    writeln!(out, "{}", block)?;
    for name in names {
        writeln!(out, "    {}", name)?;
    }
    writeln!(out, "{}", TERMINATOR)
}

/// Exchange reactions in file order with their overrides, duplicates dropped
fn sorted_exchanges(definition: &ModelDefinition) -> Vec<(usize, KineticParameters)> {
    let mut exchanges: Vec<(usize, KineticParameters)> = definition
        .exchange_reactions
        .iter()
        .enumerate()
        .map(|(i, &reaction)| {
            let kinetics = definition.kinetics.get(i).copied().unwrap_or_default();
            (reaction, kinetics)
        })
        .collect();
    exchanges.sort_by_key(|&(reaction, _)| reaction);
    exchanges.dedup_by_key(|&mut (reaction, _)| reaction);
    exchanges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::model_file::parse_model_file;
    use crate::metabolic_model::model::tests::chain_definition;
    use crate::optimize::objective::ObjectiveStyle;
    use crate::optimize::solvers::SolverMethod;

    #[test]
    fn written_model_reads_back() {
        let mut definition = chain_definition();
        definition.objective = vec![(3, 1.), (1, -0.25)];
        definition.objective_style = ObjectiveStyle::MinObjectiveMinTotal;
        definition.solver_method = Some(SolverMethod::InteriorPoint);
        definition.lower_bounds[1] = f64::NEG_INFINITY;
        definition.kinetic_defaults.hill = 2.;
        definition.kinetics = vec![KineticParameters::default(); 2];
        definition.kinetics[0].set(KineticParameter::Km, Some(0.05));

        let text = format_model_file(&definition);
        let parsed = parse_model_file(&text).unwrap();
        // The chain lists its exchanges out of order, the file sorts them
        let mut expected = definition.clone();
        expected.exchange_reactions = vec![0, 3];
        expected.kinetics = vec![definition.kinetics[1], definition.kinetics[0]];
        assert_eq!(parsed, expected);
    }

    #[test]
    fn optional_blocks_are_left_out() {
        let definition = ModelDefinition::new(1, 2, &[(0, 0, 1.), (0, 1, -1.)]);
        let text = format_model_file(&definition);
        assert!(text.starts_with("SMATRIX 1 2\n    1 1 1\n    1 2 -1\n//\n"));
        assert!(!text.contains("OBJECTIVE\n"));
        assert!(!text.contains("OPTIMIZER"));
        assert!(!text.contains("EXCHANGE_REACTIONS"));
        assert!(text.contains("OBJECTIVE_STYLE\n    MAXIMIZE_OBJECTIVE_FLUX\n//\n"));
    }
}
