//! Parser for the block structured model file format
//!
//! A model file is a sequence of blocks. Each block starts with a header line
//! (`NAME [arguments]`), holds any number of data lines, and ends with a line
//! starting with `//`. Indices in the file are 1-based. Parsing stops at the
//! first error, which carries the 1-based line it was found on.
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

use crate::configuration::{Configuration, KineticDefaults};
use crate::io::model_file::block::BlockKind;
use crate::metabolic_model::definition::{default_names, ModelDefinition};
use crate::metabolic_model::exchange::{KineticParameter, KineticParameters};
use crate::optimize::objective::ObjectiveStyle;
use crate::optimize::solvers::SolverMethod;

/// A non blank line, split into tokens
struct Line<'a> {
    number: usize,
    text: &'a str,
    tokens: Vec<&'a str>,
}

/// A block with its header and data lines, terminator excluded
struct Block<'a> {
    kind: BlockKind,
    header: Line<'a>,
    data: Vec<Line<'a>>,
    /// Line of the `//` terminator
    end: usize,
}

pub(crate) struct ModelFileParser<'a> {
    lines: Vec<Line<'a>>,
    current: usize,
    /// Header line of every block seen so far
    seen: IndexMap<BlockKind, usize>,
    num_lines: usize,
    dimensions: Option<(usize, usize)>,
    stoichiometry: Vec<(usize, usize, f64)>,
    bounds: Option<(Vec<f64>, Vec<f64>)>,
    objective: Vec<(usize, f64)>,
    objective_style: Option<ObjectiveStyle>,
    solver_method: Option<SolverMethod>,
    metabolite_names: Option<Vec<String>>,
    reaction_names: Option<Vec<String>>,
    exchange_reactions: Option<Vec<usize>>,
    kinetic_defaults: KineticDefaults,
    kinetics: Vec<KineticParameters>,
}

impl<'a> ModelFileParser<'a> {
    pub fn new(input: &'a str) -> Self {
        let lines = input
            .lines()
            .enumerate()
            .map(|(i, text)| Line {
                number: i + 1,
                text: text.trim(),
                tokens: text.split_whitespace().collect(),
            })
            .filter(|line| !line.tokens.is_empty())
            .collect();
        ModelFileParser {
            lines,
            current: 0,
            seen: IndexMap::new(),
            num_lines: input.lines().count(),
            dimensions: None,
            stoichiometry: Vec::new(),
            bounds: None,
            objective: Vec::new(),
            objective_style: None,
            solver_method: None,
            metabolite_names: None,
            reaction_names: None,
            exchange_reactions: None,
            kinetic_defaults: Configuration::current().kinetics,
            kinetics: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<ModelDefinition, ParseError> {
        while let Some(block) = self.block()? {
            self.check_order(&block)?;
            self.seen.insert(block.kind, block.header.number);
            match block.kind {
                BlockKind::Smatrix => self.smatrix(&block)?,
                BlockKind::Bounds => self.bounds(&block)?,
                BlockKind::Objective => self.objective(&block)?,
                BlockKind::ObjectiveStyle => {
                    let value = single_value(&block)?;
                    let style = ObjectiveStyle::from_str(value.text).map_err(|_| {
                        ParseError::UnknownObjectiveStyle {
                            line: value.number,
                            name: value.text.to_string(),
                        }
                    })?;
                    self.objective_style = Some(style);
                }
                BlockKind::Optimizer => {
                    let value = single_value(&block)?;
                    let method = SolverMethod::from_str(value.text).map_err(|_| {
                        ParseError::UnknownSolverMethod {
                            line: value.number,
                            name: value.text.to_string(),
                        }
                    })?;
                    self.solver_method = Some(method);
                }
                BlockKind::MetaboliteNames => {
                    let (m, _) = self.matrix_dimensions();
                    self.metabolite_names = Some(names(&block, m)?);
                }
                BlockKind::ReactionNames => {
                    let (_, n) = self.matrix_dimensions();
                    self.reaction_names = Some(names(&block, n)?);
                }
                BlockKind::ExchangeReactions => self.exchange_reactions(&block)?,
                _ => self.kinetic_values(&block)?,
            }
        }
        self.finish()
    }

    // region Blocks
    /// Next block, None at the end of the input
    fn block(&mut self) -> Result<Option<Block<'a>>, ParseError> {
        let Some(header) = self.advance() else {
            return Ok(None);
        };
        let first = header.tokens[0];
        if first.starts_with("//") {
            return Err(ParseError::UnexpectedTerminator { line: header.number });
        }
        let kind = BlockKind::from_str(first).map_err(|_| ParseError::UnknownBlock {
            line: header.number,
            header: first.to_string(),
        })?;
        let mut data = Vec::new();
        loop {
            match self.advance() {
                Some(line) if line.tokens[0].starts_with("//") => {
                    return Ok(Some(Block {
                        kind,
                        header,
                        data,
                        end: line.number,
                    }));
                }
                Some(line) => data.push(line),
                None => {
                    return Err(ParseError::UnterminatedBlock {
                        line: header.number,
                        block: kind,
                    })
                }
            }
        }
    }

    fn check_order(&self, block: &Block) -> Result<(), ParseError> {
        let line = block.header.number;
        if self.seen.contains_key(&block.kind) {
            return Err(ParseError::DuplicateBlock {
                line,
                block: block.kind,
            });
        }
        if block.kind.needs_matrix() && self.dimensions.is_none() {
            return Err(ParseError::MatrixNotDefined {
                line,
                block: block.kind,
            });
        }
        if block.kind.needs_exchange_reactions() && self.exchange_reactions.is_none() {
            return Err(ParseError::ExchangeReactionsNotDefined {
                line,
                block: block.kind,
            });
        }
        Ok(())
    }

    fn smatrix(&mut self, block: &Block) -> Result<(), ParseError> {
        let header = &block.header;
        expect_tokens(header, 3, "SMATRIX rows columns")?;
        let m = parse_count(header, header.tokens[1])?;
        let n = parse_count(header, header.tokens[2])?;
        for line in &block.data {
            expect_tokens(line, 3, "row column value")?;
            let row = parse_index(line, line.tokens[0], m)?;
            let col = parse_index(line, line.tokens[1], n)?;
            let value = parse_finite(line, line.tokens[2])?;
            self.stoichiometry.push((row, col, value));
        }
        self.dimensions = Some((m, n));
        Ok(())
    }

    fn bounds(&mut self, block: &Block) -> Result<(), ParseError> {
        let (_, n) = self.matrix_dimensions();
        let header = &block.header;
        expect_tokens(header, 3, "BOUNDS lower upper")?;
        let default_lower = parse_float(header, header.tokens[1])?;
        let default_upper = parse_float(header, header.tokens[2])?;
        check_bounds(header, default_lower, default_upper)?;
        let mut lower = vec![default_lower; n];
        let mut upper = vec![default_upper; n];
        for line in &block.data {
            expect_tokens(line, 3, "reaction lower upper")?;
            let reaction = parse_index(line, line.tokens[0], n)?;
            let lb = parse_float(line, line.tokens[1])?;
            let ub = parse_float(line, line.tokens[2])?;
            check_bounds(line, lb, ub)?;
            lower[reaction] = lb;
            upper[reaction] = ub;
        }
        self.bounds = Some((lower, upper));
        Ok(())
    }

    /// Objective terms, `[-]reaction [coefficient]`; a negative index negates the term
    fn objective(&mut self, block: &Block) -> Result<(), ParseError> {
        let (_, n) = self.matrix_dimensions();
        expect_tokens(&block.header, 1, "OBJECTIVE")?;
        for line in &block.data {
            if line.tokens.len() > 2 {
                return Err(ParseError::WrongTokenCount {
                    line: line.number,
                    expected: "reaction [coefficient]",
                    found: line.tokens.len(),
                });
            }
            let signed: i64 = line.tokens[0]
                .parse()
                .map_err(|_| invalid_number(line, line.tokens[0]))?;
            let reaction = parse_index(line, &signed.unsigned_abs().to_string(), n)?;
            let coefficient = match line.tokens.get(1) {
                Some(token) => parse_finite(line, token)?,
                None => 1.,
            };
            let sign = if signed < 0 { -1. } else { 1. };
            self.objective.push((reaction, sign * coefficient));
        }
        Ok(())
    }

    fn exchange_reactions(&mut self, block: &Block) -> Result<(), ParseError> {
        let (_, n) = self.matrix_dimensions();
        expect_tokens(&block.header, 1, "EXCHANGE_REACTIONS")?;
        let mut reactions = Vec::new();
        for line in &block.data {
            for token in &line.tokens {
                reactions.push(parse_index(line, token, n)?);
            }
        }
        reactions.sort_unstable();
        reactions.dedup();
        self.kinetics = vec![KineticParameters::default(); reactions.len()];
        self.exchange_reactions = Some(reactions);
        Ok(())
    }

    /// `HEADER [default]` followed by `exchange value` overrides
    fn kinetic_values(&mut self, block: &Block) -> Result<(), ParseError> {
        let Some(parameter) = block.kind.kinetic_parameter() else {
            return Ok(());
        };
        let header = &block.header;
        match header.tokens.len() {
            1 => {}
            2 => {
                let value = parse_kinetic(header, header.tokens[1], parameter)?;
                self.kinetic_defaults.set_value(parameter, value);
            }
            found => {
                return Err(ParseError::WrongTokenCount {
                    line: header.number,
                    expected: "HEADER [default]",
                    found,
                })
            }
        }
        let num_exchange = self.kinetics.len();
        for line in &block.data {
            expect_tokens(line, 2, "exchange value")?;
            let exchange = parse_index(line, line.tokens[0], num_exchange)?;
            let value = parse_kinetic(line, line.tokens[1], parameter)?;
            self.kinetics[exchange].set(parameter, Some(value));
        }
        Ok(())
    }
    // endregion Blocks

    fn finish(self) -> Result<ModelDefinition, ParseError> {
        let Some((m, n)) = self.dimensions else {
            return Err(ParseError::MissingMatrix {
                line: self.num_lines,
            });
        };
        let (lower_bounds, upper_bounds) = self.bounds.unwrap_or_else(|| {
            let config = Configuration::current();
            (vec![config.lower_bound; n], vec![config.upper_bound; n])
        });
        Ok(ModelDefinition {
            num_metabolites: m,
            num_reactions: n,
            stoichiometry: self.stoichiometry,
            lower_bounds,
            upper_bounds,
            objective: self.objective,
            objective_style: self.objective_style.unwrap_or_default(),
            solver_method: self.solver_method,
            metabolite_names: self
                .metabolite_names
                .unwrap_or_else(|| default_names("met", m)),
            reaction_names: self
                .reaction_names
                .unwrap_or_else(|| default_names("rxn", n)),
            exchange_reactions: self.exchange_reactions.unwrap_or_default(),
            kinetic_defaults: self.kinetic_defaults,
            kinetics: self.kinetics,
        })
    }

    fn advance(&mut self) -> Option<Line<'a>> {
        if self.is_at_end() {
            return None;
        }
        self.current += 1;
        // Lines are handed out once, so the slot can be emptied
        let line = &mut self.lines[self.current - 1];
        Some(Line {
            number: line.number,
            text: line.text,
            tokens: std::mem::take(&mut line.tokens),
        })
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.lines.len()
    }

    /// Only called after `check_order` made sure the matrix is defined
    fn matrix_dimensions(&self) -> (usize, usize) {
        self.dimensions.unwrap_or((0, 0))
    }
}

// region Token Helpers
fn expect_tokens(line: &Line, count: usize, expected: &'static str) -> Result<(), ParseError> {
    if line.tokens.len() != count {
        return Err(ParseError::WrongTokenCount {
            line: line.number,
            expected,
            found: line.tokens.len(),
        });
    }
    Ok(())
}

fn invalid_number(line: &Line, token: &str) -> ParseError {
    ParseError::InvalidNumber {
        line: line.number,
        token: token.to_string(),
    }
}

/// A positive dimension
fn parse_count(line: &Line, token: &str) -> Result<usize, ParseError> {
    match token.parse::<usize>() {
        Ok(0) => Err(ParseError::InvalidDimension { line: line.number }),
        Ok(count) => Ok(count),
        Err(_) => Err(invalid_number(line, token)),
    }
}

/// A 1-based index in `1..=max`, returned 0-based
fn parse_index(line: &Line, token: &str, max: usize) -> Result<usize, ParseError> {
    let index: usize = token.parse().map_err(|_| invalid_number(line, token))?;
    if index == 0 || index > max {
        return Err(ParseError::IndexOutOfRange {
            line: line.number,
            index,
            max,
        });
    }
    Ok(index - 1)
}

fn parse_float(line: &Line, token: &str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(invalid_number(line, token)),
    }
}

fn parse_finite(line: &Line, token: &str) -> Result<f64, ParseError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid_number(line, token)),
    }
}

fn parse_kinetic(line: &Line, token: &str, parameter: KineticParameter) -> Result<f64, ParseError> {
    let value = parse_finite(line, token)?;
    if !parameter.is_valid(value) {
        return Err(ParseError::InvalidKineticValue {
            line: line.number,
            parameter,
            value,
        });
    }
    Ok(value)
}

fn check_bounds(line: &Line, lower: f64, upper: f64) -> Result<(), ParseError> {
    if lower > upper {
        return Err(ParseError::InvalidBounds {
            line: line.number,
            lower,
            upper,
        });
    }
    Ok(())
}

/// The one data line of a single value block
fn single_value<'b>(block: &'b Block) -> Result<&'b Line<'b>, ParseError> {
    expect_tokens(&block.header, 1, block.kind.header())?;
    match block.data.as_slice() {
        [line] => Ok(line),
        _ => Err(ParseError::WrongLineCount {
            line: block.end,
            block: block.kind,
            expected: 1,
            found: block.data.len(),
        }),
    }
}

/// One name per data line, exactly `expected` of them
fn names(block: &Block, expected: usize) -> Result<Vec<String>, ParseError> {
    expect_tokens(&block.header, 1, block.kind.header())?;
    if block.data.len() != expected {
        return Err(ParseError::WrongLineCount {
            line: block.end,
            block: block.kind,
            expected,
            found: block.data.len(),
        });
    }
    Ok(block.data.iter().map(|line| line.text.to_string()).collect())
}
// endregion Token Helpers

/// Errors found while parsing a model file, each with the 1-based line it occurred on
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: unknown block `{header}`")]
    UnknownBlock { line: usize, header: String },
    #[error("line {line}: block {block} appears more than once")]
    DuplicateBlock { line: usize, block: BlockKind },
    #[error("line {line}: block {block} is never closed with `//`")]
    UnterminatedBlock { line: usize, block: BlockKind },
    #[error("line {line}: `//` outside of a block")]
    UnexpectedTerminator { line: usize },
    #[error("line {line}: block {block} must come after SMATRIX")]
    MatrixNotDefined { line: usize, block: BlockKind },
    #[error("line {line}: block {block} must come after EXCHANGE_REACTIONS")]
    ExchangeReactionsNotDefined { line: usize, block: BlockKind },
    #[error("line {line}: the model file has no SMATRIX block")]
    MissingMatrix { line: usize },
    #[error("line {line}: expected `{expected}`, found {found} tokens")]
    WrongTokenCount {
        line: usize,
        expected: &'static str,
        found: usize,
    },
    #[error("line {line}: block {block} needs {expected} lines, found {found}")]
    WrongLineCount {
        line: usize,
        block: BlockKind,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: `{token}` is not a valid number")]
    InvalidNumber { line: usize, token: String },
    #[error("line {line}: matrix dimensions must be positive")]
    InvalidDimension { line: usize },
    #[error("line {line}: index {index} is outside of 1..={max}")]
    IndexOutOfRange { line: usize, index: usize, max: usize },
    #[error("line {line}: lower bound {lower} is larger than upper bound {upper}")]
    InvalidBounds { line: usize, lower: f64, upper: f64 },
    #[error("line {line}: {value} is not a valid {parameter}")]
    InvalidKineticValue {
        line: usize,
        parameter: KineticParameter,
        value: f64,
    },
    #[error("line {line}: unknown objective style `{name}`")]
    UnknownObjectiveStyle { line: usize, name: String },
    #[error("line {line}: unknown optimizer `{name}`")]
    UnknownSolverMethod { line: usize, name: String },
}

impl ParseError {
    /// 1-based line the error was found on
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnknownBlock { line, .. }
            | ParseError::DuplicateBlock { line, .. }
            | ParseError::UnterminatedBlock { line, .. }
            | ParseError::UnexpectedTerminator { line }
            | ParseError::MatrixNotDefined { line, .. }
            | ParseError::ExchangeReactionsNotDefined { line, .. }
            | ParseError::MissingMatrix { line }
            | ParseError::WrongTokenCount { line, .. }
            | ParseError::WrongLineCount { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::InvalidDimension { line }
            | ParseError::IndexOutOfRange { line, .. }
            | ParseError::InvalidBounds { line, .. }
            | ParseError::InvalidKineticValue { line, .. }
            | ParseError::UnknownObjectiveStyle { line, .. }
            | ParseError::UnknownSolverMethod { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<ModelDefinition, ParseError> {
        ModelFileParser::new(input).parse()
    }

    const CHAIN: &str = "\
SMATRIX 3 4
    1 1 1
    1 2 -1
    2 2 1
    2 3 -1
    3 3 1
    3 4 -1
//

BOUNDS 0 1000
    1 0 10
//
OBJECTIVE
    4
//
OBJECTIVE_STYLE
    MAX_OBJECTIVE_MIN_TOTAL
//
OPTIMIZER
    INTERIOR
//
METABOLITE_NAMES
    A
    B
    C
//
REACTION_NAMES
    EX_A
    R1
    R2
    EX_C
//
EXCHANGE_REACTIONS
    4 1
//
KM_VALUES 0.5
    2 0.01
//
VMAX_VALUES
    1 20
//
";

    #[test]
    fn parse_complete_model() {
        let definition = parse(CHAIN).unwrap();
        assert_eq!(definition.num_metabolites, 3);
        assert_eq!(definition.num_reactions, 4);
        assert_eq!(definition.stoichiometry[0], (0, 0, 1.));
        assert_eq!(definition.stoichiometry[5], (2, 3, -1.));
        assert_eq!(definition.lower_bounds, vec![0.; 4]);
        assert_eq!(definition.upper_bounds, vec![10., 1000., 1000., 1000.]);
        assert_eq!(definition.objective, vec![(3, 1.)]);
        assert_eq!(
            definition.objective_style,
            ObjectiveStyle::MaxObjectiveMinTotal
        );
        assert_eq!(definition.solver_method, Some(SolverMethod::InteriorPoint));
        assert_eq!(definition.metabolite_names, vec!["A", "B", "C"]);
        assert_eq!(definition.reaction_names[3], "EX_C");
        assert_eq!(definition.exchange_reactions, vec![0, 3]);
        assert_eq!(definition.kinetic_defaults.km, 0.5);
        assert_eq!(definition.kinetics[1].get(KineticParameter::Km), Some(0.01));
        assert_eq!(definition.kinetics[0].get(KineticParameter::Km), None);
        assert_eq!(definition.kinetics[0].get(KineticParameter::Vmax), Some(20.));
    }

    #[test]
    fn defaults_are_filled_in() {
        let definition = parse("SMATRIX 1 2\n1 1 1\n1 2 -1\n//\n").unwrap();
        let config = Configuration::current();
        assert_eq!(definition.lower_bounds, vec![config.lower_bound; 2]);
        assert_eq!(definition.upper_bounds, vec![config.upper_bound; 2]);
        assert_eq!(definition.reaction_names, default_names("rxn", 2));
        assert_eq!(definition.metabolite_names, default_names("met", 1));
        assert_eq!(definition.objective_style, ObjectiveStyle::default());
        assert!(definition.objective.is_empty());
        assert!(definition.exchange_reactions.is_empty());
        assert_eq!(definition.solver_method, None);
    }

    #[test]
    fn objective_terms() {
        let definition =
            parse("SMATRIX 1 3\n1 1 1\n//\nOBJECTIVE\n2\n-3 0.5\n1 2\n//\n").unwrap();
        assert_eq!(definition.objective, vec![(1, 1.), (2, -0.5), (0, 2.)]);
        assert_eq!(definition.objective_reaction(), Some(1));
    }

    #[test]
    fn errors_carry_their_line() {
        let cases: [(&str, usize); 12] = [
            ("SMATRIX 2 2\n1 1 1\n3 1 1\n//\n", 3),
            ("SMATRIX 2 2\n1 1 x\n//\n", 2),
            ("SMATRIX 2 2\n1 1\n//\n", 2),
            ("\n\nFOO\n//\n", 3),
            ("SMATRIX 1 1\n1 1 1\n//\nSMATRIX 1 1\n//\n", 4),
            ("SMATRIX 1 1\n1 1 1\n//\n\nBOUNDS 0 1\n", 5),
            ("//\n", 1),
            ("\nBOUNDS 0 1\n//\n", 2),
            ("SMATRIX 1 1\n//\nKM_VALUES\n//\n", 3),
            ("SMATRIX 1 2\n//\nBOUNDS 0 1\n2 5 1\n//\n", 4),
            ("SMATRIX 1 1\n//\nOBJECTIVE_STYLE\nFASTEST\n//\n", 4),
            ("SMATRIX 0 1\n//\n", 1),
        ];
        for (input, line) in cases {
            let err = parse(input).unwrap_err();
            assert_eq!(err.line(), line, "{:?} for {:?}", err, input);
        }
    }

    #[test]
    fn error_kinds() {
        assert!(matches!(
            parse("SMATRIX 1 1\n1 1 1\n//\nBOUNDS 0 1\n1 2 1\n//\n"),
            Err(ParseError::InvalidBounds { line: 5, .. })
        ));
        assert!(matches!(
            parse("OPTIMIZER\nSIMPLEX\n//\n"),
            Err(ParseError::MissingMatrix { line: 3 })
        ));
        assert!(matches!(
            parse("SMATRIX 2 1\n//\nMETABOLITE_NAMES\nA\n//\n"),
            Err(ParseError::WrongLineCount {
                line: 5,
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            parse("SMATRIX 1 1\n//\nOPTIMIZER\nFASTEST\n//\n"),
            Err(ParseError::UnknownSolverMethod { line: 4, .. })
        ));
        assert!(matches!(
            parse("SMATRIX 1 1\n//\nEXCHANGE_REACTIONS\n1\n//\nHILL_COEFFICIENTS 0\n//\n"),
            Err(ParseError::InvalidKineticValue { line: 6, .. })
        ));
        assert!(matches!(
            parse("SMATRIX 1 1\n//\nEXCHANGE_REACTIONS\n1\n//\nVMAX_VALUES\n2 1\n//\n"),
            Err(ParseError::IndexOutOfRange { line: 7, index: 2, max: 1 })
        ));
    }

    #[test]
    fn exchange_reactions_are_sorted_and_unique() {
        let definition =
            parse("SMATRIX 1 5\n//\nEXCHANGE_REACTIONS\n5 2\n2\n4\n//\n").unwrap();
        assert_eq!(definition.exchange_reactions, vec![1, 3, 4]);
        assert_eq!(definition.kinetics.len(), 3);
    }
}
