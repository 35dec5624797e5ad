//! This module provides the load-time checks of machine definitions. A definition that fails
//! any of them is malformed and never reaches the engine; suspicious but legal definitions
//! (such as unreachable states) are only reported through the log.

use crate::types::{Kind, MachineDefinition, TuringMachineError};
use log::warn;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Represents the ways a machine definition (or its input) can be malformed.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum AnalysisError {
    /// No start state was given.
    #[error("No start state defined")]
    MissingStartState,
    /// More than one start state was given.
    #[error("Multiple start states defined: {0:?}")]
    MultipleStartStates(Vec<String>),
    /// The start state is not part of the state set.
    #[error("Start state '{0}' is not a declared state")]
    UndeclaredStartState(String),
    /// Accept/reject states, rule sources or rule targets that are not part of the state set.
    #[error("Undeclared states referenced: {0:?}")]
    UndeclaredStates(Vec<String>),
    /// Rules read or write symbols outside the tape alphabet.
    #[error("Transitions use symbols outside the tape alphabet: {0:?}")]
    UndeclaredSymbols(Vec<char>),
    /// Input alphabet symbols missing from the tape alphabet.
    #[error("Input alphabet symbols missing from the tape alphabet: {0:?}")]
    InputAlphabetNotInTape(Vec<char>),
    /// The blank symbol is part of the input alphabet.
    #[error("Blank symbol '{0}' must not be part of the input alphabet")]
    BlankInInputAlphabet(char),
    /// States that are both accepting and rejecting.
    #[error("States cannot be both accepting and rejecting: {0:?}")]
    ConflictingHaltStates(Vec<String>),
    /// A deterministic machine has two rules for the same (state, symbol).
    #[error("Deterministic machine has more than one transition for ({state}, {symbol})")]
    DuplicateTransition { state: String, symbol: char },
    /// The input string contains a symbol outside the input alphabet.
    #[error("Input symbol '{symbol}' at position {position} is not in the input alphabet")]
    InvalidInputSymbol { symbol: char, position: usize },
}

/// Analyzes a machine definition for structural errors.
///
/// Runs [`validate`], then logs the states that cannot be reached from the start state.
/// Unreachable states are a warning, not a failure. The parser and the loader call this
/// once per definition they read.
///
/// # Returns
///
/// * `Ok(())` if the definition is well formed.
/// * `Err(TuringMachineError::MalformedMachine)` otherwise.
pub fn analyze(definition: &MachineDefinition) -> Result<(), TuringMachineError> {
    validate(definition)?;

    let unreachable = unreachable_states(definition);
    if !unreachable.is_empty() {
        warn!(
            "machine '{}': unreachable states {:?}",
            definition.name, unreachable
        );
    }

    Ok(())
}

/// Runs the structural checks in a fixed order and returns the first failure. Logs nothing.
pub fn validate(definition: &MachineDefinition) -> Result<(), TuringMachineError> {
    let checks: [fn(&MachineDefinition) -> Result<(), AnalysisError>; 7] = [
        check_start_state,
        check_halt_states,
        check_alphabets,
        check_rule_states,
        check_rule_symbols,
        check_determinism,
        check_halt_states_disjoint,
    ];

    match checks.iter().find_map(|check| check(definition).err()) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Checks that every symbol of `input` belongs to the definition's input alphabet.
pub fn check_input(definition: &MachineDefinition, input: &str) -> Result<(), TuringMachineError> {
    let alphabet = definition.input_symbols();

    input
        .chars()
        .enumerate()
        .find(|(_, symbol)| !alphabet.contains(symbol))
        .map_or(Ok(()), |(position, symbol)| {
            Err(AnalysisError::InvalidInputSymbol { symbol, position }.into())
        })
}

/// Checks that exactly one start state exists and that it is part of the state set.
fn check_start_state(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let start = definition.start_state.as_str();
    if start.trim().is_empty() {
        return Err(AnalysisError::MissingStartState);
    }

    // Compared verbatim: the engine starts from this exact label.
    if !definition.state_set().contains(start) {
        return Err(AnalysisError::UndeclaredStartState(start.to_string()));
    }

    Ok(())
}

/// Checks that accepting and rejecting states are part of the state set.
fn check_halt_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let states = definition.state_set();

    let undeclared = definition
        .accept_states
        .iter()
        .chain(&definition.reject_states)
        .filter(|state| !states.contains(state.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredStates(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that no state is both accepting and rejecting.
fn check_halt_states_disjoint(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let accept: HashSet<&String> = definition.accept_states.iter().collect();
    let mut conflicting: Vec<String> = definition
        .reject_states
        .iter()
        .filter(|state| accept.contains(state))
        .cloned()
        .collect();

    if !conflicting.is_empty() {
        conflicting.sort();
        conflicting.dedup();
        return Err(AnalysisError::ConflictingHaltStates(conflicting));
    }

    Ok(())
}

/// Checks the input alphabet against the tape alphabet and the blank symbol.
fn check_alphabets(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let input = definition.input_symbols();

    if input.contains(&definition.blank) {
        return Err(AnalysisError::BlankInInputAlphabet(definition.blank));
    }

    let tape = definition.tape_symbols();
    let missing: Vec<char> = input.difference(&tape).copied().collect();
    if !missing.is_empty() {
        return Err(AnalysisError::InputAlphabetNotInTape(missing));
    }

    Ok(())
}

/// Checks that every rule source and target is a declared state.
fn check_rule_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let states = definition.state_set();

    let undeclared = definition
        .rules
        .iter()
        .flat_map(|(state, transitions)| {
            std::iter::once(state).chain(transitions.iter().map(|t| &t.next_state))
        })
        .filter(|state| !states.contains(state.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredStates(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that every symbol read or written by a rule belongs to the tape alphabet.
fn check_rule_symbols(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let tape = definition.tape_symbols();

    let undeclared = definition
        .rules
        .values()
        .flatten()
        .flat_map(|t| [t.read, t.write])
        .filter(|symbol| !tape.contains(symbol))
        .collect::<BTreeSet<_>>();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredSymbols(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that a deterministic machine has at most one rule per (state, symbol).
fn check_determinism(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    if definition.kind == Kind::Nondeterministic {
        return Ok(());
    }

    // Sorted so the reported conflict does not depend on hash map order.
    let mut states: Vec<&String> = definition.rules.keys().collect();
    states.sort();

    for state in states {
        let mut seen = HashSet::new();
        for transition in &definition.rules[state] {
            if !seen.insert(transition.read) {
                return Err(AnalysisError::DuplicateTransition {
                    state: state.clone(),
                    symbol: transition.read,
                });
            }
        }
    }

    Ok(())
}

/// Returns the states that cannot be reached from the start state, sorted.
pub fn unreachable_states(definition: &MachineDefinition) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.start_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        if let Some(transitions) = definition.rules.get(state) {
            for transition in transitions {
                if !visited.contains(transition.next_state.as_str()) {
                    queue.push(&transition.next_state);
                }
            }
        }
    }

    definition
        .state_set()
        .into_iter()
        .filter(|state| !visited.contains(state))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Transition, DEFAULT_BLANK_SYMBOL};
    use std::collections::HashMap;

    fn transition(read: char, write: char, direction: Direction, next: &str) -> Transition {
        Transition {
            read,
            write,
            direction,
            next_state: next.to_string(),
        }
    }

    fn create_test_definition() -> MachineDefinition {
        let mut rules = HashMap::new();
        rules.insert(
            "even".to_string(),
            vec![
                transition('1', '1', Direction::Right, "odd"),
                transition('_', '_', Direction::Stay, "accept"),
            ],
        );
        rules.insert(
            "odd".to_string(),
            vec![
                transition('1', '1', Direction::Right, "even"),
                transition('_', '_', Direction::Stay, "reject"),
            ],
        );

        MachineDefinition {
            name: "Even ones".to_string(),
            kind: Kind::Deterministic,
            states: Vec::new(),
            input_alphabet: vec!['1'],
            tape_alphabet: Vec::new(),
            blank: DEFAULT_BLANK_SYMBOL,
            start_state: "even".to_string(),
            accept_states: vec!["accept".to_string()],
            reject_states: vec!["reject".to_string()],
            rules,
        }
    }

    fn malformed(definition: &MachineDefinition) -> AnalysisError {
        match analyze(definition) {
            Err(TuringMachineError::MalformedMachine(error)) => error,
            other => panic!("Expected MalformedMachine, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(analyze(&create_test_definition()).is_ok());
    }

    #[test]
    fn test_missing_start_state() {
        let mut def = create_test_definition();
        def.start_state = String::new();
        assert_eq!(malformed(&def), AnalysisError::MissingStartState);
    }

    #[test]
    fn test_undeclared_start_state() {
        let mut def = create_test_definition();
        def.states = vec!["odd".to_string(), "accept".to_string(), "reject".to_string()];
        def.rules.remove("even");
        assert_eq!(
            malformed(&def),
            AnalysisError::UndeclaredStartState("even".to_string())
        );
    }

    #[test]
    fn test_transition_to_undeclared_state() {
        let mut def = create_test_definition();
        def.rules
            .get_mut("odd")
            .unwrap()
            .push(transition('X', 'X', Direction::Left, "nowhere"));
        def.tape_alphabet = vec!['1', 'X'];
        assert_eq!(
            malformed(&def),
            AnalysisError::UndeclaredStates(vec!["nowhere".to_string()])
        );
    }

    #[test]
    fn test_declared_states_exclude_inferred() {
        let mut def = create_test_definition();
        def.states = vec!["even".to_string(), "odd".to_string(), "accept".to_string()];
        assert_eq!(
            malformed(&def),
            AnalysisError::UndeclaredStates(vec!["reject".to_string()])
        );
    }

    #[test]
    fn test_undeclared_symbol() {
        let mut def = create_test_definition();
        def.rules
            .get_mut("even")
            .unwrap()
            .push(transition('0', '0', Direction::Right, "even"));
        assert_eq!(malformed(&def), AnalysisError::UndeclaredSymbols(vec!['0']));
    }

    #[test]
    fn test_blank_in_input_alphabet() {
        let mut def = create_test_definition();
        def.input_alphabet.push('_');
        assert_eq!(malformed(&def), AnalysisError::BlankInInputAlphabet('_'));
    }

    #[test]
    fn test_input_alphabet_must_be_on_tape() {
        let mut def = create_test_definition();
        def.tape_alphabet = vec!['X'];
        assert_eq!(
            malformed(&def),
            AnalysisError::InputAlphabetNotInTape(vec!['1'])
        );
    }

    #[test]
    fn test_conflicting_halt_states() {
        let mut def = create_test_definition();
        def.reject_states.push("accept".to_string());
        assert_eq!(
            malformed(&def),
            AnalysisError::ConflictingHaltStates(vec!["accept".to_string()])
        );
    }

    #[test]
    fn test_duplicate_deterministic_transition() {
        let mut def = create_test_definition();
        def.rules
            .get_mut("even")
            .unwrap()
            .push(transition('1', '1', Direction::Stay, "even"));
        assert_eq!(
            malformed(&def),
            AnalysisError::DuplicateTransition {
                state: "even".to_string(),
                symbol: '1'
            }
        );

        def.kind = Kind::Nondeterministic;
        assert!(analyze(&def).is_ok());
    }

    #[test]
    fn test_unreachable_states_are_not_errors() {
        let mut def = create_test_definition();
        def.rules.insert("island".to_string(), Vec::new());
        assert!(analyze(&def).is_ok());
        assert_eq!(unreachable_states(&def), vec!["island".to_string()]);
    }

    #[test]
    fn test_validate_matches_analyze() {
        let mut island = create_test_definition();
        island.rules.insert("island".to_string(), Vec::new());
        assert!(validate(&island).is_ok());

        let mut broken = create_test_definition();
        broken.input_alphabet.push('_');
        assert_eq!(validate(&broken), analyze(&broken));
        assert_eq!(
            validate(&broken),
            Err(TuringMachineError::MalformedMachine(
                AnalysisError::BlankInInputAlphabet('_')
            ))
        );
    }

    #[test]
    fn test_padded_start_state_is_undeclared() {
        let mut def = create_test_definition();
        def.states = vec![
            "even".to_string(),
            "odd".to_string(),
            "accept".to_string(),
            "reject".to_string(),
        ];
        def.start_state = " even ".to_string();
        assert_eq!(
            malformed(&def),
            AnalysisError::UndeclaredStartState(" even ".to_string())
        );

        def.start_state = "   ".to_string();
        assert_eq!(malformed(&def), AnalysisError::MissingStartState);
    }

    #[test]
    fn test_check_input() {
        let def = create_test_definition();
        assert!(check_input(&def, "").is_ok());
        assert!(check_input(&def, "111").is_ok());

        let error = check_input(&def, "1a1").unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MalformedMachine(AnalysisError::InvalidInputSymbol {
                symbol: 'a',
                position: 1
            })
        );
        assert!(error.to_string().contains("position 1"));
    }
}
