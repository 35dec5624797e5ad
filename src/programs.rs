//! The built-in example catalog: machine definitions embedded at compile time, with
//! representative inputs and an automaton description for each entry.

use crate::automaton::AutomatonDescription;
use crate::machine::TuringMachine;
use crate::parser::parse;
use crate::types::{Kind, MachineDefinition, TuringMachineError};
use log::error;

struct EmbeddedProgram {
    source: &'static str,
    samples: &'static [&'static str],
    automaton: Option<&'static str>,
}

// Default embedded programs
const EMBEDDED_PROGRAMS: [EmbeddedProgram; 6] = [
    EmbeddedProgram {
        source: include_str!("../programs/zero-n-one-n.tm"),
        samples: &["000111", "0011", "0110", ""],
        automaton: None,
    },
    EmbeddedProgram {
        source: include_str!("../programs/unary-increment.tm"),
        samples: &["111", ""],
        automaton: None,
    },
    EmbeddedProgram {
        source: include_str!("../programs/even-ones.tm"),
        samples: &["11", "1", ""],
        automaton: Some(include_str!("../programs/even-ones.automaton.json")),
    },
    EmbeddedProgram {
        source: include_str!("../programs/binary-palindrome.tm"),
        samples: &["10101", "1011", ""],
        automaton: None,
    },
    EmbeddedProgram {
        source: include_str!("../programs/contains-101.tm"),
        samples: &["0011010", "1001"],
        automaton: Some(include_str!("../programs/contains-101.automaton.json")),
    },
    EmbeddedProgram {
        source: include_str!("../programs/loop-forever.tm"),
        samples: &["", "11"],
        automaton: None,
    },
];

lazy_static::lazy_static! {
    /// Every embedded program that parsed successfully, in catalog order.
    pub static ref CATALOG: Vec<CatalogEntry> = load_catalog();
}

/// A ready-made machine with inputs worth running it on.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub definition: MachineDefinition,
    /// The `.tm` text the definition was parsed from.
    pub source: &'static str,
    pub samples: &'static [&'static str],
    /// The state diagram shown next to the machine. Entries without a dedicated automaton
    /// use the diagram derived from the definition.
    pub automaton: AutomatonDescription,
}

impl CatalogEntry {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Loads this entry's machine with the given input.
    pub fn load(&self, input: &str) -> Result<TuringMachine, TuringMachineError> {
        TuringMachine::load(self.definition.clone(), input)
    }
}

fn load_catalog() -> Vec<CatalogEntry> {
    EMBEDDED_PROGRAMS
        .iter()
        .filter_map(|program| {
            let definition = match parse(program.source) {
                Ok(definition) => definition,
                Err(e) => {
                    error!("Failed to parse embedded program: {e}");
                    return None;
                }
            };

            let automaton = program
                .automaton
                .and_then(|json| match AutomatonDescription::from_json(json) {
                    Ok(automaton) => Some(automaton),
                    Err(e) => {
                        error!("Invalid automaton for '{}': {e}", definition.name);
                        None
                    }
                })
                .unwrap_or_else(|| AutomatonDescription::from_machine(&definition));

            Some(CatalogEntry {
                definition,
                source: program.source,
                samples: program.samples,
                automaton,
            })
        })
        .collect()
}

/// Lookup functions over [`CATALOG`].
pub struct Catalog;

impl Catalog {
    /// Get the number of available programs
    pub fn count() -> usize {
        CATALOG.len()
    }

    pub fn entries() -> &'static [CatalogEntry] {
        CATALOG.as_slice()
    }

    /// Get a program by its index
    pub fn by_index(index: usize) -> Option<&'static CatalogEntry> {
        CATALOG.get(index)
    }

    /// Get a program by its name, ignoring case
    pub fn by_name(name: &str) -> Option<&'static CatalogEntry> {
        CATALOG
            .iter()
            .find(|entry| entry.name().eq_ignore_ascii_case(name))
    }

    /// List all program names
    pub fn names() -> Vec<&'static str> {
        CATALOG.iter().map(|entry| entry.definition.name.as_str()).collect()
    }

    /// Search for programs by name, returning their indices
    pub fn search(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();
        CATALOG
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.name().to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get summary information about a program by its index
    pub fn info(index: usize) -> Option<ProgramInfo> {
        let entry = Self::by_index(index)?;
        let definition = &entry.definition;

        Some(ProgramInfo {
            index,
            name: definition.name.clone(),
            kind: definition.kind,
            start_state: definition.start_state.clone(),
            samples: entry.samples.iter().map(|s| s.to_string()).collect(),
            state_count: definition.state_set().len(),
            transition_count: definition.transition_count(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub kind: Kind,
    pub start_state: String,
    pub samples: Vec<String>,
    pub state_count: usize,
    pub transition_count: usize,
}
