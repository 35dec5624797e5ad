//! This module provides the `DefinitionLoader` struct, responsible for loading machine
//! definitions from files and strings, in either the `.tm` text format or JSON.

use crate::analyzer::analyze;
use crate::parser::parse;
use crate::types::{MachineDefinition, TuringMachineError, MAX_PROGRAM_SIZE};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// The source format of a machine definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// The `.tm` text format.
    Text,
    /// The serde form of `MachineDefinition`.
    Json,
}

impl Format {
    /// Picks the format from a file extension: `.json` is JSON, anything else is text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Text,
        }
    }

    /// Guesses the format of unnamed content, such as a definition piped on stdin.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            Format::Json
        } else {
            Format::Text
        }
    }
}

/// `DefinitionLoader` is a utility struct for loading machine definitions.
/// Every definition it returns has passed analysis.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single machine definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineDefinition)` if the file is read, parsed and validated.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(TuringMachineError::ParseError)` / `DeserializeError` for malformed content.
    /// * `Err(TuringMachineError::MalformedMachine)` if the definition fails validation.
    pub fn load_definition(path: &Path) -> Result<MachineDefinition, TuringMachineError> {
        let metadata = fs::metadata(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if metadata.len() > MAX_PROGRAM_SIZE as u64 {
            return Err(TuringMachineError::FileError(format!(
                "File {} exceeds the maximum definition size of {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!("loading definition from {}", path.display());
        Self::load_definition_from_string(&content, Format::from_path(path))
    }

    /// Loads a single machine definition from string content in the given format.
    pub fn load_definition_from_string(
        content: &str,
        format: Format,
    ) -> Result<MachineDefinition, TuringMachineError> {
        if content.len() > MAX_PROGRAM_SIZE {
            return Err(TuringMachineError::FileError(format!(
                "Definition exceeds the maximum size of {MAX_PROGRAM_SIZE} bytes"
            )));
        }

        match format {
            Format::Text => parse(content),
            Format::Json => {
                let definition: MachineDefinition = serde_json::from_str(content)?;
                analyze(&definition)?;
                Ok(definition)
            }
        }
    }

    /// Loads every definition file (`.tm` or `.json`) found in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each element of the result
    /// is either the loaded definition with its path, or the error that prevented loading it.
    pub fn load_definitions(
        directory: &Path,
    ) -> Vec<Result<(PathBuf, MachineDefinition), TuringMachineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut results = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(TuringMachineError::FileError(format!(
                    "Failed to read directory entry: {e}"
                )))),
            }
        }

        // Directory order is platform dependent.
        paths.sort();

        results.extend(
            paths
                .into_iter()
                .filter(|path| path.is_file() && is_definition_file(path))
                .map(|path| match Self::load_definition(&path) {
                    Ok(definition) => Ok((path, definition)),
                    Err(e) => Err(TuringMachineError::FileError(format!(
                        "Failed to load definition from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }
}

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("tm") | Some("json")
    )
}
