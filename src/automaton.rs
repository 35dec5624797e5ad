//! Finite automaton descriptions handed to state diagram visualizers.
//!
//! An [`AutomatonDescription`] is plain data. It is either shipped alongside a catalog entry
//! or derived from a machine definition, and it never takes part in a run.

use crate::types::{Kind, MachineDefinition, State, Symbol, TuringMachineError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomatonKind {
    Dfa,
    Nfa,
}

/// A labelled edge of the state diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: State,
    pub symbol: Symbol,
    pub to: State,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonDescription {
    pub kind: AutomatonKind,
    pub states: Vec<State>,
    pub alphabet: Vec<Symbol>,
    pub start: State,
    #[serde(default)]
    pub accept: Vec<State>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Represents the ways an automaton description can be inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomatonError {
    #[error("Start state '{0}' is not a declared state")]
    UndeclaredStart(String),
    #[error("Undeclared states referenced: {0:?}")]
    UndeclaredStates(Vec<String>),
    #[error("Edges use symbols outside the alphabet: {0:?}")]
    UndeclaredSymbols(Vec<char>),
    #[error("DFA has more than one edge for ({state}, {symbol})")]
    NondeterministicEdge { state: String, symbol: char },
}

impl AutomatonDescription {
    /// Parses and validates a JSON description.
    pub fn from_json(content: &str) -> Result<Self, TuringMachineError> {
        let description: AutomatonDescription = serde_json::from_str(content)?;
        description.validate()?;
        Ok(description)
    }

    /// Derives the state diagram of a Turing machine: one edge per transition, labelled
    /// with the symbol it reads.
    ///
    /// Deterministic machines give a DFA-shaped diagram, nondeterministic ones an NFA.
    /// Writes and head movements are not part of the diagram.
    pub fn from_machine(definition: &MachineDefinition) -> Self {
        let kind = match definition.kind {
            Kind::Deterministic => AutomatonKind::Dfa,
            Kind::Nondeterministic => AutomatonKind::Nfa,
        };

        let mut sources: Vec<&State> = definition.rules.keys().collect();
        sources.sort();

        let edges = sources
            .into_iter()
            .flat_map(|state| {
                definition.rules[state].iter().map(move |t| Edge {
                    from: state.clone(),
                    symbol: t.read,
                    to: t.next_state.clone(),
                })
            })
            .collect();

        Self {
            kind,
            states: definition
                .state_set()
                .into_iter()
                .map(str::to_string)
                .collect(),
            alphabet: definition.tape_symbols().into_iter().collect(),
            start: definition.start_state.clone(),
            accept: definition.accept_states.clone(),
            edges,
        }
    }

    /// Checks that every referenced state and symbol is declared, and that a DFA has at
    /// most one edge per (state, symbol).
    pub fn validate(&self) -> Result<(), AutomatonError> {
        let states: HashSet<&str> = self.states.iter().map(String::as_str).collect();

        if !states.contains(self.start.as_str()) {
            return Err(AutomatonError::UndeclaredStart(self.start.clone()));
        }

        let undeclared: BTreeSet<String> = self
            .accept
            .iter()
            .chain(self.edges.iter().flat_map(|e| [&e.from, &e.to]))
            .filter(|state| !states.contains(state.as_str()))
            .cloned()
            .collect();
        if !undeclared.is_empty() {
            return Err(AutomatonError::UndeclaredStates(
                undeclared.into_iter().collect(),
            ));
        }

        let alphabet: HashSet<Symbol> = self.alphabet.iter().copied().collect();
        let foreign: BTreeSet<Symbol> = self
            .edges
            .iter()
            .map(|e| e.symbol)
            .filter(|symbol| !alphabet.contains(symbol))
            .collect();
        if !foreign.is_empty() {
            return Err(AutomatonError::UndeclaredSymbols(
                foreign.into_iter().collect(),
            ));
        }

        if self.kind == AutomatonKind::Dfa {
            let mut seen = HashSet::new();
            for edge in &self.edges {
                if !seen.insert((edge.from.as_str(), edge.symbol)) {
                    return Err(AutomatonError::NondeterministicEdge {
                        state: edge.from.clone(),
                        symbol: edge.symbol,
                    });
                }
            }
        }

        Ok(())
    }

    /// Runs the automaton over `input`, tracking every state it may be in.
    /// Symbols without an edge kill the run.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current: BTreeSet<&str> = BTreeSet::from([self.start.as_str()]);

        for symbol in input.chars() {
            current = self
                .edges
                .iter()
                .filter(|e| e.symbol == symbol && current.contains(e.from.as_str()))
                .map(|e| e.to.as_str())
                .collect();

            if current.is_empty() {
                return false;
            }
        }

        self.accept.iter().any(|state| current.contains(state.as_str()))
    }
}
