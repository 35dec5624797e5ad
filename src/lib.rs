//! This crate provides the core of a Turing Machine simulator.
//! It includes modules for parsing and loading machine definitions, validating them, running
//! them deterministically or nondeterministically with verdicts and traces, reporting
//! the results, and a catalog of predefined machines.

pub mod analyzer;
pub mod automaton;
pub mod explorer;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod report;
pub mod tape;
pub mod trace;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, validate, AnalysisError};
/// Re-exports the automaton description types.
pub use automaton::{AutomatonDescription, AutomatonKind, Edge};
/// Re-exports the `DefinitionLoader` struct and source `Format` from the loader module.
pub use loader::{DefinitionLoader, Format};
/// Re-exports the engine types from the machine module.
pub use machine::{Execution, Status, Step, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the example catalog.
pub use programs::{Catalog, CatalogEntry, ProgramInfo, CATALOG};
pub use tape::Tape;
pub use trace::{AppliedTransition, Configuration, Run, Trace, TraceEntry};
/// Re-exports the definition, verdict and error types from the types module.
pub use types::{
    Direction, Kind, Limits, MachineDefinition, Transition, TuringMachineError, Verdict,
    DEFAULT_BLANK_SYMBOL, DEFAULT_MAX_STEPS, MAX_PROGRAM_SIZE,
};
