//! This module provides the parser for `.tm` machine definitions, utilizing the `pest` crate.
//! It defines the grammar of the text format and functions to turn it into a
//! `MachineDefinition`.

use crate::{
    analyzer::{analyze, AnalysisError},
    types::{
        Direction, Kind, MachineDefinition, Transition, TuringMachineError, DEFAULT_BLANK_SYMBOL,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{HashMap, HashSet};

/// Derives a `PestParser` for the machine definition grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// Parses the given input string into a `MachineDefinition`.
///
/// This is the main entry point for parsing machine definitions. The parsed definition is
/// analyzed before being returned, so a successful parse is ready to be loaded.
///
/// # Returns
///
/// * `Ok(MachineDefinition)` if the input is successfully parsed and validated.
/// * `Err(TuringMachineError::ParseError)` if there are any syntax errors.
/// * `Err(TuringMachineError::MalformedMachine)` if the definition fails validation.
pub fn parse(input: &str) -> Result<MachineDefinition, TuringMachineError> {
    let root = TuringMachineParser::parse(Rule::program, input.trim())
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| {
            TuringMachineError::ParseError(Box::new(Error::new_from_pos(
                ErrorVariant::CustomError {
                    message: "Empty program".to_string(),
                },
                pest::Position::from_start(input),
            )))
        })?;

    let definition = parse_program(root)?;

    analyze(&definition)?;

    Ok(definition)
}

/// Parses the top-level structure of a definition from a `Pair<Rule::program>`.
///
/// Every section may appear at most once, except that a repeated `start` section is
/// reported as a malformed machine with multiple start states.
fn parse_program(pair: Pair<Rule>) -> Result<MachineDefinition, TuringMachineError> {
    let program_span = pair.as_span();
    let mut name: Option<String> = None;
    let mut kind: Option<Kind> = None;
    let mut blank: Option<char> = None;
    let mut input_alphabet: Option<Vec<char>> = None;
    let mut tape_alphabet: Option<Vec<char>> = None;
    let mut states: Option<Vec<String>> = None;
    let mut start_states: Vec<String> = Vec::new();
    let mut accept_states: Option<Vec<String>> = None;
    let mut reject_states: Option<Vec<String>> = None;
    let mut rules: Option<HashMap<String, Vec<Transition>>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_inner_string(p)?.trim().to_string()),
            Rule::kind => kind = Some(parse_kind(p)?),
            Rule::blank => blank = Some(parse_symbol(&parse_inner_string(p)?)),
            Rule::input => input_alphabet = Some(parse_symbols(p)),
            Rule::tape => tape_alphabet = Some(parse_symbols(p)),
            Rule::states => states = Some(parse_identifiers(p)),
            Rule::start => start_states.push(parse_inner_string(p)?),
            Rule::accept => accept_states = Some(parse_identifiers(p)),
            Rule::reject => reject_states = Some(parse_identifiers(p)),
            Rule::rules => rules = Some(parse_rules(p)?),
            _ => {} // Skip EOI
        }
    }

    let name = name.ok_or_else(|| parse_error("Missing 'name' section", program_span))?;
    let rules = rules.ok_or_else(|| parse_error("Missing 'rules' section", program_span))?;
    let start_state = check_single_start(start_states)?;

    Ok(MachineDefinition {
        name,
        kind: kind.unwrap_or_default(),
        states: states.unwrap_or_default(),
        input_alphabet: input_alphabet.unwrap_or_default(),
        tape_alphabet: tape_alphabet.unwrap_or_default(),
        blank: blank.unwrap_or(DEFAULT_BLANK_SYMBOL),
        start_state,
        accept_states: accept_states.unwrap_or_default(),
        reject_states: reject_states.unwrap_or_default(),
        rules,
    })
}

/// Parses the `rules` section into transitions keyed by source state.
fn parse_rules(pair: Pair<Rule>) -> Result<HashMap<String, Vec<Transition>>, TuringMachineError> {
    let mut rules = HashMap::new();

    // Rule: rules > [state_block]
    for block in pair.into_inner() {
        let span = block.as_span();
        let mut pairs = block.into_inner();
        let state = pairs
            .next()
            .map(|p| p.as_str().to_string())
            .ok_or_else(|| parse_error("Missing state name", span))?;

        let transitions = pairs
            .filter(|p| p.as_rule() == Rule::transition)
            .map(parse_transition)
            .collect::<Result<Vec<_>, _>>()?;

        // Prevent duplicated state blocks
        if rules.contains_key(&state) {
            return Err(parse_error(
                &format!("Duplicate rule block for state: {state}"),
                span,
            ));
        }

        rules.insert(state, transitions);
    }

    Ok(rules)
}

/// Parses a single transition line.
///
/// If the write symbol is omitted, the transition writes back what it read.
fn parse_transition(pair: Pair<Rule>) -> Result<Transition, TuringMachineError> {
    let span = pair.as_span();
    let mut read = None;
    let mut write = None;
    let mut direction = None;
    let mut next_state = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::read => read = Some(parse_symbol(p.as_str())),
            Rule::write => write = Some(parse_symbol(p.as_str())),
            Rule::direction => direction = Some(parse_direction(p)?),
            Rule::identifier => next_state = Some(p.as_str().to_string()),
            _ => {}
        }
    }

    let read = read.ok_or_else(|| parse_error("Missing read symbol", span))?;
    let direction = direction.ok_or_else(|| parse_error("Missing direction", span))?;
    let next_state = next_state.ok_or_else(|| parse_error("Missing next state", span))?;

    Ok(Transition {
        read,
        write: write.unwrap_or(read),
        direction,
        next_state,
    })
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left, '>' or 'R' for Right, and '-', 'S' or 'N' for Stay.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        "-" | "S" | "N" => Ok(Direction::Stay),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

fn parse_kind(pair: Pair<Rule>) -> Result<Kind, TuringMachineError> {
    let span = pair.as_span();
    match parse_inner_string(pair)?.as_str() {
        "deterministic" => Ok(Kind::Deterministic),
        "nondeterministic" => Ok(Kind::Nondeterministic),
        other => Err(parse_error(&format!("Unsupported kind: {other}"), span)),
    }
}

/// Parses a list of symbols from a section holding a `Pair<Rule::symbols>`.
fn parse_symbols(pair: Pair<Rule>) -> Vec<char> {
    // Rule: (input | tape) > symbols > [symbol]
    pair.into_inner()
        .flat_map(|list| list.into_inner())
        .filter(|p| p.as_rule() == Rule::symbol)
        .map(|p| parse_symbol(p.as_str()))
        .collect()
}

/// Parses a list of state names from a section holding a `Pair<Rule::identifiers>`.
fn parse_identifiers(pair: Pair<Rule>) -> Vec<String> {
    // Rule: (states | accept | reject) > identifiers > [identifier]
    pair.into_inner()
        .flat_map(|list| list.into_inner())
        .filter(|p| p.as_rule() == Rule::identifier)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Parses a single character symbol from a string, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> char {
    let quoted = input.len() >= 3 && input.starts_with('\'') && input.ends_with('\'');
    let inner = if quoted {
        &input[1..input.len() - 1]
    } else {
        input
    };

    inner.chars().next().unwrap_or(DEFAULT_BLANK_SYMBOL)
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>) -> Result<String, TuringMachineError> {
    let span = pair.as_span();
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| parse_error("Missing value", span))
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), TuringMachineError> {
    if !matches!(
        rule,
        Rule::name
            | Rule::kind
            | Rule::blank
            | Rule::input
            | Rule::tape
            | Rule::states
            | Rule::accept
            | Rule::reject
            | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks that exactly one start state was declared.
fn check_single_start(mut start_states: Vec<String>) -> Result<String, TuringMachineError> {
    match start_states.len() {
        0 => Err(AnalysisError::MissingStartState.into()),
        1 => Ok(start_states.remove(0)),
        _ => Err(AnalysisError::MultipleStartStates(start_states).into()),
    }
}
