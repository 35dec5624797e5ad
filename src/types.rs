//! This module defines the core data structures and types used throughout the Turing Machine
//! simulator, including machine definitions, transitions, verdicts, run limits and error types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use crate::analyzer::AnalysisError;
use crate::automaton::AutomatonError;
use crate::Rule;

/// The default blank symbol used on the Turing Machine tape.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The default step bound of a run (maximum number of recorded configurations).
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// The default cap on configurations explored by a nondeterministic run.
pub const DEFAULT_MAX_CONFIGURATIONS: usize = 100_000;

/// A symbol of the tape alphabet.
pub type Symbol = char;
/// An opaque state label.
pub type State = String;

/// Whether a machine maps each (state, symbol) pair to at most one action or to a set of them.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// At most one transition per (state, symbol).
    #[default]
    Deterministic,
    /// Any number of transitions per (state, symbol).
    Nondeterministic,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Deterministic => write!(f, "deterministic"),
            Kind::Nondeterministic => write!(f, "nondeterministic"),
        }
    }
}

/// A Turing Machine definition as written by its author.
///
/// This is plain data: it is what the parser and the JSON loader produce, and what the
/// catalog ships. [`crate::TuringMachine::load`] validates it and compiles the rules
/// into a transition table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MachineDefinition {
    /// The name of the machine.
    pub name: String,
    /// Deterministic or nondeterministic transition semantics.
    #[serde(default)]
    pub kind: Kind,
    /// Declared states. When empty, the state set is inferred from the rule sources and
    /// the start, accept and reject states.
    #[serde(default)]
    pub states: Vec<State>,
    /// Symbols an input string may contain. When empty, defaults to the tape alphabet
    /// without the blank.
    #[serde(default)]
    pub input_alphabet: Vec<Symbol>,
    /// Symbols the tape may hold. When empty, defaults to the input alphabet plus the blank.
    #[serde(default)]
    pub tape_alphabet: Vec<Symbol>,
    /// The symbol filling every untouched cell.
    #[serde(default = "default_blank")]
    pub blank: Symbol,
    /// The state every run starts in.
    pub start_state: State,
    /// Halting states that accept.
    #[serde(default)]
    pub accept_states: Vec<State>,
    /// Halting states that reject.
    #[serde(default)]
    pub reject_states: Vec<State>,
    /// Transition rules keyed by source state. A state may map to an empty list.
    #[serde(default)]
    pub rules: HashMap<State, Vec<Transition>>,
}

fn default_blank() -> Symbol {
    DEFAULT_BLANK_SYMBOL
}

impl MachineDefinition {
    /// Returns the state set: the declared states, or the inferred set when none are declared.
    pub fn state_set(&self) -> BTreeSet<&str> {
        if !self.states.is_empty() {
            return self.states.iter().map(String::as_str).collect();
        }

        self.rules
            .keys()
            .chain(std::iter::once(&self.start_state))
            .chain(&self.accept_states)
            .chain(&self.reject_states)
            .filter(|state| !state.is_empty())
            .map(String::as_str)
            .collect()
    }

    /// Returns the tape alphabet, always including the blank symbol.
    pub fn tape_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols: BTreeSet<Symbol> = if self.tape_alphabet.is_empty() {
            self.input_alphabet.iter().copied().collect()
        } else {
            self.tape_alphabet.iter().copied().collect()
        };
        symbols.insert(self.blank);
        symbols
    }

    /// Returns the input alphabet.
    pub fn input_symbols(&self) -> BTreeSet<Symbol> {
        if self.input_alphabet.is_empty() {
            let mut symbols = self.tape_symbols();
            symbols.remove(&self.blank);
            symbols
        } else {
            self.input_alphabet.iter().copied().collect()
        }
    }

    /// Checks whether `state` is an accepting state.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept_states.iter().any(|s| s == state)
    }

    /// Checks whether `state` is a rejecting state.
    pub fn is_rejecting(&self, state: &str) -> bool {
        self.reject_states.iter().any(|s| s == state)
    }

    /// Total number of transition rules.
    pub fn transition_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

/// A single transition rule of a source state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The symbol under the head that enables this transition.
    pub read: Symbol,
    /// The symbol written in place of `read`.
    pub write: Symbol,
    /// The head movement after writing.
    pub direction: Direction,
    /// The state the machine transitions to.
    pub next_state: State,
}

impl Transition {
    /// The effect of this transition, without the symbol it matches on.
    pub fn action(&self) -> Action {
        Action {
            next_state: self.next_state.clone(),
            write: self.write,
            direction: self.direction,
        }
    }
}

/// What a transition does once it fires: (next state, symbol to write, head movement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub next_state: State,
    pub write: Symbol,
    pub direction: Direction,
}

/// Represents the possible directions a Turing Machine head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// The signed head offset of this movement.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'S',
        };
        write!(f, "{c}")
    }
}

/// Why a configuration has no successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// The current state is accepting.
    Accept,
    /// The current state is rejecting.
    Reject,
    /// No transition applies in a state that is neither accepting nor rejecting.
    NoTransition,
}

/// Final classification of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Halted in an accepting state.
    Accepted,
    /// Halted in a rejecting state.
    Rejected,
    /// Halted in a state that is neither accepting nor rejecting.
    HaltedNonFinal,
    /// The step bound was exhausted before the machine halted.
    Timeout,
}

impl From<Halt> for Verdict {
    fn from(halt: Halt) -> Self {
        match halt {
            Halt::Accept => Verdict::Accepted,
            Halt::Reject => Verdict::Rejected,
            Halt::NoTransition => Verdict::HaltedNonFinal,
        }
    }
}

impl Verdict {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::Rejected => "Rejected",
            Verdict::HaltedNonFinal => "Halted",
            Verdict::Timeout => "Timeout",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Resource limits of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of configurations recorded in a trace, the start one included.
    pub max_steps: usize,
    /// Maximum number of distinct configurations a nondeterministic run may explore.
    pub max_configurations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_configurations: DEFAULT_MAX_CONFIGURATIONS,
        }
    }
}

impl Limits {
    /// Limits with the given step bound and the default configuration cap.
    pub fn steps(max_steps: usize) -> Self {
        Self {
            max_steps,
            ..Self::default()
        }
    }

    /// Reads limits from a JSON object. Missing fields keep their defaults.
    pub fn from_json(content: &str) -> Result<Self, TuringMachineError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Represents various errors that can occur while loading Turing Machine definitions.
///
/// Execution outcomes are never errors: they are [`Verdict`]s.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The definition or the input violates a structural rule.
    #[error("Malformed machine: {0}")]
    MalformedMachine(#[from] AnalysisError),
    /// Indicates an error during the parsing of a machine definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a JSON definition that does not match the expected shape.
    #[error("Invalid JSON definition: {0}")]
    DeserializeError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// An automaton description references undeclared states or symbols.
    #[error("Invalid automaton: {0}")]
    InvalidAutomaton(#[from] AutomatonError),
}

impl From<serde_json::Error> for TuringMachineError {
    fn from(error: serde_json::Error) -> Self {
        TuringMachineError::DeserializeError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> MachineDefinition {
        let mut rules = HashMap::new();
        rules.insert(
            "q0".to_string(),
            vec![Transition {
                read: '1',
                write: '1',
                direction: Direction::Right,
                next_state: "q0".to_string(),
            }],
        );

        MachineDefinition {
            name: "Test".to_string(),
            kind: Kind::default(),
            states: Vec::new(),
            input_alphabet: vec!['1'],
            tape_alphabet: Vec::new(),
            blank: DEFAULT_BLANK_SYMBOL,
            start_state: "q0".to_string(),
            accept_states: vec!["yes".to_string()],
            reject_states: vec!["no".to_string()],
            rules,
        }
    }

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(left_json, "\"Left\"");

        let right: Direction = serde_json::from_str("\"Right\"").unwrap();
        assert_eq!(right, Direction::Right);
    }

    #[test]
    fn test_inferred_state_set() {
        let def = definition();
        let states: Vec<&str> = def.state_set().into_iter().collect();
        assert_eq!(states, vec!["no", "q0", "yes"]);
    }

    #[test]
    fn test_declared_state_set_wins() {
        let mut def = definition();
        def.states = vec!["q0".to_string(), "yes".to_string()];
        assert_eq!(def.state_set().len(), 2);
    }

    #[test]
    fn test_alphabet_defaults() {
        let def = definition();
        assert_eq!(def.tape_symbols(), ['1', '_'].into_iter().collect());
        assert_eq!(def.input_symbols(), ['1'].into_iter().collect());

        let mut def = definition();
        def.input_alphabet.clear();
        def.tape_alphabet = vec!['0', '1', 'X'];
        assert_eq!(def.input_symbols(), ['0', '1', 'X'].into_iter().collect());
    }

    #[test]
    fn test_json_defaults() {
        let def: MachineDefinition =
            serde_json::from_str(r#"{"name": "Tiny", "start_state": "q0"}"#).unwrap();
        assert_eq!(def.kind, Kind::Deterministic);
        assert_eq!(def.blank, DEFAULT_BLANK_SYMBOL);
        assert!(def.rules.is_empty());
    }

    #[test]
    fn test_verdict_from_halt() {
        assert_eq!(Verdict::from(Halt::Accept), Verdict::Accepted);
        assert_eq!(Verdict::from(Halt::Reject), Verdict::Rejected);
        assert_eq!(Verdict::from(Halt::NoTransition), Verdict::HaltedNonFinal);
        assert_eq!(Verdict::HaltedNonFinal.to_string(), "Halted");
    }

    #[test]
    fn test_limits_from_partial_json() {
        let limits = Limits::from_json(r#"{"max_steps": 50}"#).unwrap();
        assert_eq!(limits.max_steps, 50);
        assert_eq!(limits.max_configurations, DEFAULT_MAX_CONFIGURATIONS);

        assert_eq!(Limits::from_json("{}").unwrap(), Limits::default());
        assert!(matches!(
            Limits::from_json(r#"{"max_steps": -1}"#),
            Err(TuringMachineError::DeserializeError(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::FileError("missing.tm".to_string());
        assert_eq!(error.to_string(), "File error: missing.tm");
    }
}
