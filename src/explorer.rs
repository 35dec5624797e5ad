//! Breadth-first exploration of a nondeterministic machine's configuration tree.
//!
//! The tree is expanded one level (one step) at a time, so the first accepting configuration
//! found lies on a shortest accepting path. Identical configurations on the same level have
//! identical futures and are expanded once.

use crate::machine::{Step, Successor, TuringMachine};
use crate::trace::{Configuration, TraceEntry};
use crate::types::{Halt, Limits, Verdict};
use log::debug;
use std::collections::HashSet;

/// The result of exploring a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Exploration {
    pub verdict: Verdict,
    /// Path from the start configuration to the configuration that decided the verdict.
    pub path: Vec<TraceEntry>,
    /// Number of configurations created.
    pub explored: usize,
}

struct Node {
    parent: Option<usize>,
    entry: TraceEntry,
}

/// First node reaching each kind of branch outcome.
#[derive(Default)]
struct Outcomes {
    accepted: Option<usize>,
    timeout: Option<usize>,
    rejected: Option<usize>,
    halted: Option<usize>,
}

impl Outcomes {
    fn record(&mut self, verdict: Verdict, node: usize) {
        let slot = match verdict {
            Verdict::Accepted => &mut self.accepted,
            Verdict::Timeout => &mut self.timeout,
            Verdict::Rejected => &mut self.rejected,
            Verdict::HaltedNonFinal => &mut self.halted,
        };
        slot.get_or_insert(node);
    }

    /// Accepted beats everything; a branch cut off by the limits beats rejection, so a
    /// possibly infinite computation is never reported as rejected.
    fn decide(&self) -> Option<(Verdict, usize)> {
        [
            (Verdict::Accepted, self.accepted),
            (Verdict::Timeout, self.timeout),
            (Verdict::Rejected, self.rejected),
            (Verdict::HaltedNonFinal, self.halted),
        ]
        .into_iter()
        .find_map(|(verdict, node)| node.map(|node| (verdict, node)))
    }
}

/// Explores every branch of `machine` from its start configuration.
///
/// A branch ends when it halts, when its path holds `limits.max_steps` configurations, or
/// when the total number of configurations reaches `limits.max_configurations`. Works for
/// deterministic machines too, where the tree is a single path.
pub fn explore(machine: &TuringMachine, limits: Limits) -> Exploration {
    let max_depth = limits.max_steps.max(1);

    let mut nodes = vec![Node {
        parent: None,
        entry: TraceEntry {
            step: 0,
            transition: None,
            configuration: machine.initial_configuration(),
        },
    }];
    let mut frontier = vec![0];
    let mut outcomes = Outcomes::default();
    let mut capped = false;

    'levels: for depth in 0.. {
        if frontier.is_empty() {
            break;
        }

        let mut next_frontier = Vec::new();
        let mut seen: HashSet<Configuration> = HashSet::new();

        for index in frontier {
            let successors = match machine.step(&nodes[index].entry.configuration) {
                Step::Halt(halt) => {
                    outcomes.record(halt.into(), index);
                    if halt == Halt::Accept {
                        break 'levels;
                    }
                    continue;
                }
                Step::Continue(successor) => vec![successor],
                Step::Branch(successors) => successors,
            };

            if successors.is_empty() {
                outcomes.record(Verdict::HaltedNonFinal, index);
                continue;
            }

            if depth + 1 >= max_depth {
                outcomes.record(Verdict::Timeout, index);
                continue;
            }

            for Successor {
                transition,
                configuration,
            } in successors
            {
                if nodes.len() >= limits.max_configurations {
                    debug!("exploration stopped at {} configurations", nodes.len());
                    outcomes.record(Verdict::Timeout, index);
                    capped = true;
                    break 'levels;
                }

                if !seen.insert(configuration.clone()) {
                    continue;
                }

                next_frontier.push(nodes.len());
                nodes.push(Node {
                    parent: Some(index),
                    entry: TraceEntry {
                        step: depth + 1,
                        transition: Some(transition),
                        configuration,
                    },
                });
            }
        }

        frontier = next_frontier;
    }

    // Nodes created before the cap but never expanded may already be accepting.
    if capped && outcomes.accepted.is_none() {
        if let Some(index) = first_accepting(machine, &nodes) {
            outcomes.record(Verdict::Accepted, index);
        }
    }

    let (verdict, decisive) = outcomes.decide().unwrap_or((Verdict::Timeout, 0));
    let explored = nodes.len();
    debug!(
        "explored {} configurations of '{}': {}",
        explored,
        machine.definition().name,
        verdict
    );

    Exploration {
        verdict,
        path: path_to(nodes, decisive),
        explored,
    }
}

/// Index of the first node sitting in an accepting state. Nodes are stored in creation
/// order, so this is a shallowest one.
fn first_accepting(machine: &TuringMachine, nodes: &[Node]) -> Option<usize> {
    nodes.iter().position(|node| {
        machine.halting_state(&node.entry.configuration.state) == Some(Halt::Accept)
    })
}

/// Collects the entries from the root to `target`.
fn path_to(mut nodes: Vec<Node>, target: usize) -> Vec<TraceEntry> {
    let mut indices = Vec::new();
    let mut cursor = Some(target);
    while let Some(index) = cursor {
        indices.push(index);
        cursor = nodes[index].parent;
    }

    // Indices along a path are strictly decreasing towards the root, so taking entries
    // out in that order never disturbs one that is still needed.
    let mut path: Vec<TraceEntry> = indices
        .into_iter()
        .map(|index| {
            let node = nodes.swap_remove(index);
            node.entry
        })
        .collect();
    path.reverse();
    path
}
