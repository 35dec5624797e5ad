//! Configurations, traces and run results: the data an engine run hands to the outside world.

use crate::tape::Tape;
use crate::types::{Action, State, Symbol, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete snapshot of a machine: current state, tape and head position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub state: State,
    pub tape: Tape,
    pub head: i64,
}

impl Configuration {
    /// The start configuration: `input` on the tape, head on position 0.
    pub fn initial(state: &str, input: &str, blank: Symbol) -> Self {
        Self {
            state: state.to_string(),
            tape: Tape::new(input, blank),
            head: 0,
        }
    }

    /// The symbol under the head.
    pub fn symbol(&self) -> Symbol {
        self.tape.read(self.head)
    }

    /// Returns the configuration reached by applying `action` to this one.
    pub fn apply(&self, action: &Action) -> Configuration {
        let mut tape = self.tape.clone();
        tape.write(self.head, action.write);

        Configuration {
            state: action.next_state.clone(),
            tape,
            head: self.head + action.direction.offset(),
        }
    }
}

/// A transition as it was applied during a run: the (state, symbol) it matched and its action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedTransition {
    pub state: State,
    pub read: Symbol,
    pub action: Action,
}

impl fmt::Display for AppliedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) → ({}, {}, {})",
            self.state,
            self.read,
            self.action.next_state,
            self.action.write,
            self.action.direction
        )
    }
}

/// One recorded configuration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Number of transitions applied before reaching this configuration.
    pub step: usize,
    /// The transition that produced this configuration; `None` for the start configuration.
    pub transition: Option<AppliedTransition>,
    pub configuration: Configuration,
}

/// The ordered history of configurations produced by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Number of recorded configurations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Iterates over the recorded configurations in order.
    pub fn configurations(&self) -> impl Iterator<Item = &Configuration> {
        self.entries.iter().map(|entry| &entry.configuration)
    }

    /// Iterates over the transitions applied between configurations.
    pub fn transitions(&self) -> impl Iterator<Item = &AppliedTransition> {
        self.entries.iter().filter_map(|entry| entry.transition.as_ref())
    }

    pub fn first(&self) -> Option<&Configuration> {
        self.entries.first().map(|entry| &entry.configuration)
    }

    pub fn last(&self) -> Option<&Configuration> {
        self.entries.last().map(|entry| &entry.configuration)
    }

    /// Rebuilds the final configuration by re-applying every recorded transition to the
    /// first configuration.
    pub fn replay(&self) -> Option<Configuration> {
        let first = self.first()?.clone();
        Some(
            self.transitions()
                .fold(first, |configuration, applied| configuration.apply(&applied.action)),
        )
    }
}

impl FromIterator<TraceEntry> for Trace {
    fn from_iter<I: IntoIterator<Item = TraceEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The outcome of a run: a verdict and the trace that led to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub verdict: Verdict,
    pub trace: Trace,
    /// Number of configurations examined. Equals the trace length for deterministic runs.
    pub explored: usize,
}

impl Run {
    /// The tape contents of the last recorded configuration, blanks trimmed.
    pub fn output(&self) -> String {
        self.trace
            .last()
            .map(|configuration| configuration.tape.contents())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn action(next: &str, write: char, direction: Direction) -> Action {
        Action {
            next_state: next.to_string(),
            write,
            direction,
        }
    }

    #[test]
    fn test_apply_writes_then_moves() {
        let start = Configuration::initial("q0", "01", '_');
        let next = start.apply(&action("q1", 'X', Direction::Left));

        assert_eq!(next.state, "q1");
        assert_eq!(next.head, -1);
        assert_eq!(next.symbol(), '_');
        assert_eq!(next.tape.contents(), "X1");
        // The source configuration is untouched.
        assert_eq!(start.tape.contents(), "01");
    }

    #[test]
    fn test_applied_transition_display() {
        let applied = AppliedTransition {
            state: "q0".to_string(),
            read: '0',
            action: action("q1", 'X', Direction::Right),
        };
        assert_eq!(applied.to_string(), "(q0, 0) → (q1, X, R)");
    }

    #[test]
    fn test_replay_rebuilds_last_configuration() {
        let start = Configuration::initial("q0", "1", '_');
        let first = action("q0", '1', Direction::Right);
        let second = action("done", '1', Direction::Stay);
        let middle = start.apply(&first);
        let last = middle.apply(&second);

        let trace: Trace = vec![
            TraceEntry {
                step: 0,
                transition: None,
                configuration: start,
            },
            TraceEntry {
                step: 1,
                transition: Some(AppliedTransition {
                    state: "q0".to_string(),
                    read: '1',
                    action: first,
                }),
                configuration: middle,
            },
            TraceEntry {
                step: 2,
                transition: Some(AppliedTransition {
                    state: "q0".to_string(),
                    read: '_',
                    action: second,
                }),
                configuration: last.clone(),
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.transitions().count(), 2);
        assert_eq!(trace.replay(), Some(last));
        assert_eq!(Trace::default().replay(), None);
    }
}
