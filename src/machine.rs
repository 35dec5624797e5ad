//! This module defines the `TuringMachine` struct, the execution engine. A machine is loaded
//! once from a validated definition and an input string, and is immutable afterwards: every
//! run starts from the same start configuration, so runs are pure and repeatable.

use crate::analyzer::{check_input, validate};
use crate::explorer::explore;
use crate::trace::{AppliedTransition, Configuration, Run, Trace, TraceEntry};
use crate::types::{
    Action, Halt, Kind, Limits, MachineDefinition, State, Symbol, TuringMachineError, Verdict,
};
use log::{debug, trace};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// A configuration reachable in one step, with the transition that reaches it.
#[derive(Debug, Clone, PartialEq)]
pub struct Successor {
    pub transition: AppliedTransition,
    pub configuration: Configuration,
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The deterministic successor.
    Continue(Successor),
    /// The nondeterministic successors, possibly none.
    Branch(Vec<Successor>),
    /// The configuration has no successor.
    Halt(Halt),
}

/// Where an [`Execution`] is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been produced yet.
    Ready,
    /// Configurations are being produced.
    Running,
    /// The run is over. Terminal.
    Halted(Verdict),
}

/// The compiled transition function.
#[derive(Debug, Clone)]
enum TransitionTable {
    Deterministic(HashMap<State, HashMap<Symbol, Action>>),
    Nondeterministic(HashMap<State, HashMap<Symbol, Vec<Action>>>),
}

impl TransitionTable {
    fn compile(definition: &MachineDefinition) -> Self {
        match definition.kind {
            Kind::Deterministic => {
                let mut table: HashMap<State, HashMap<Symbol, Action>> = HashMap::new();
                for (state, transitions) in &definition.rules {
                    let row = table.entry(state.clone()).or_default();
                    for transition in transitions {
                        row.insert(transition.read, transition.action());
                    }
                }
                TransitionTable::Deterministic(table)
            }
            Kind::Nondeterministic => {
                let mut table: HashMap<State, HashMap<Symbol, Vec<Action>>> = HashMap::new();
                for (state, transitions) in &definition.rules {
                    let row = table.entry(state.clone()).or_default();
                    for transition in transitions {
                        row.entry(transition.read)
                            .or_default()
                            .push(transition.action());
                    }
                }
                TransitionTable::Nondeterministic(table)
            }
        }
    }
}

/// A loaded Turing Machine: a validated definition bound to one input string.
///
/// The machine owns no live configuration. [`TuringMachine::step`] maps a configuration to
/// its successors and [`TuringMachine::execute`] hands out a fresh [`Execution`] each time.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    definition: MachineDefinition,
    input: String,
    table: TransitionTable,
    tape_symbols: BTreeSet<Symbol>,
}

impl TuringMachine {
    /// Validates `definition` and `input` and builds the machine.
    ///
    /// Definitions read through [`crate::parse`] or [`crate::DefinitionLoader`] have already
    /// been analyzed, so only the silent checks run again here.
    ///
    /// # Returns
    ///
    /// * `Ok(TuringMachine)` if the definition is well formed and every input symbol belongs
    ///   to the input alphabet.
    /// * `Err(TuringMachineError::MalformedMachine)` otherwise.
    pub fn load(definition: MachineDefinition, input: &str) -> Result<Self, TuringMachineError> {
        validate(&definition)?;
        check_input(&definition, input)?;

        let table = TransitionTable::compile(&definition);
        let tape_symbols = definition.tape_symbols();

        debug!(
            "loaded machine '{}' ({}, {} states, {} transitions) with input {:?}",
            definition.name,
            definition.kind,
            definition.state_set().len(),
            definition.transition_count(),
            input
        );

        Ok(Self {
            definition,
            input: input.to_string(),
            table,
            tape_symbols,
        })
    }

    /// Returns the definition this machine was loaded from.
    pub fn definition(&self) -> &MachineDefinition {
        &self.definition
    }

    /// Returns the input string this machine was loaded with.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn kind(&self) -> Kind {
        self.definition.kind
    }

    /// Returns the blank symbol used by this machine.
    pub fn blank(&self) -> Symbol {
        self.definition.blank
    }

    /// The configuration every run starts from.
    pub fn initial_configuration(&self) -> Configuration {
        Configuration::initial(
            &self.definition.start_state,
            &self.input,
            self.definition.blank,
        )
    }

    /// Classifies `state` as accepting or rejecting, if it is either.
    pub fn halting_state(&self, state: &str) -> Option<Halt> {
        if self.definition.is_accepting(state) {
            Some(Halt::Accept)
        } else if self.definition.is_rejecting(state) {
            Some(Halt::Reject)
        } else {
            None
        }
    }

    /// Computes the successors of `configuration`.
    ///
    /// Accepting and rejecting states halt regardless of their outgoing rules. Otherwise a
    /// deterministic machine continues with its single matching transition or halts when
    /// there is none; a nondeterministic machine branches into every matching transition.
    ///
    /// # Panics
    ///
    /// Panics if a transition writes a symbol outside the tape alphabet. `load` rules this
    /// out, so reaching it means the engine itself is broken.
    pub fn step(&self, configuration: &Configuration) -> Step {
        if let Some(halt) = self.halting_state(&configuration.state) {
            return Step::Halt(halt);
        }

        let symbol = configuration.symbol();

        match &self.table {
            TransitionTable::Deterministic(table) => {
                match table
                    .get(&configuration.state)
                    .and_then(|row| row.get(&symbol))
                {
                    Some(action) => Step::Continue(self.successor(configuration, symbol, action)),
                    None => Step::Halt(Halt::NoTransition),
                }
            }
            TransitionTable::Nondeterministic(table) => Step::Branch(
                table
                    .get(&configuration.state)
                    .and_then(|row| row.get(&symbol))
                    .map(|actions| {
                        actions
                            .iter()
                            .map(|action| self.successor(configuration, symbol, action))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
        }
    }

    fn successor(&self, configuration: &Configuration, read: Symbol, action: &Action) -> Successor {
        assert!(
            self.tape_symbols.contains(&action.write),
            "transition ({}, {}) writes '{}' outside the tape alphabet",
            configuration.state,
            read,
            action.write
        );

        Successor {
            transition: AppliedTransition {
                state: configuration.state.clone(),
                read,
                action: action.clone(),
            },
            configuration: configuration.apply(action),
        }
    }

    /// Starts a lazy execution recording at most `max_steps` configurations.
    pub fn execute(&self, max_steps: usize) -> Execution<'_> {
        self.execute_with(Limits::steps(max_steps))
    }

    /// Starts a lazy execution under the given limits.
    pub fn execute_with(&self, limits: Limits) -> Execution<'_> {
        Execution {
            machine: self,
            limits,
            status: Status::Ready,
            current: None,
            recorded: 0,
            explored: 0,
            buffered: VecDeque::new(),
            pending: None,
        }
    }

    /// Runs the machine from its start configuration until it halts or the trace holds
    /// `max_steps` configurations.
    pub fn run(&self, max_steps: usize) -> Run {
        self.run_with(Limits::steps(max_steps))
    }

    /// Runs the machine under the given limits.
    pub fn run_with(&self, limits: Limits) -> Run {
        let mut execution = self.execute_with(limits);
        let trace: Trace = execution.by_ref().collect();

        // A drained execution is always halted.
        let verdict = execution.verdict().unwrap_or(Verdict::Timeout);
        debug!(
            "machine '{}' finished: {} after {} configurations",
            self.definition.name,
            verdict,
            trace.len()
        );

        Run {
            verdict,
            trace,
            explored: execution.explored,
        }
    }
}

/// A lazy, finite run of a machine, yielding one [`TraceEntry`] per configuration.
///
/// Deterministic machines are stepped on demand. Nondeterministic machines are explored
/// breadth first on the first call to `next`, after which the path to the deciding
/// configuration is yielded.
pub struct Execution<'a> {
    machine: &'a TuringMachine,
    limits: Limits,
    status: Status,
    /// The last configuration yielded by a deterministic execution.
    current: Option<Configuration>,
    recorded: usize,
    explored: usize,
    buffered: VecDeque<TraceEntry>,
    pending: Option<Verdict>,
}

impl Execution<'_> {
    pub fn status(&self) -> Status {
        self.status
    }

    /// The verdict, once the execution has halted.
    pub fn verdict(&self) -> Option<Verdict> {
        match self.status {
            Status::Halted(verdict) => Some(verdict),
            Status::Ready | Status::Running => None,
        }
    }

    fn halt(&mut self, verdict: Verdict) -> Option<TraceEntry> {
        self.status = Status::Halted(verdict);
        self.current = None;
        None
    }

    fn start(&mut self) -> Option<TraceEntry> {
        self.status = Status::Running;

        if self.machine.kind() == Kind::Nondeterministic {
            let exploration = explore(self.machine, self.limits);
            self.explored = exploration.explored;
            self.pending = Some(exploration.verdict);
            self.buffered = exploration.path.into();
            return self.next_buffered();
        }

        let configuration = self.machine.initial_configuration();
        self.current = Some(configuration.clone());
        self.recorded = 1;
        self.explored = 1;

        Some(TraceEntry {
            step: 0,
            transition: None,
            configuration,
        })
    }

    fn next_buffered(&mut self) -> Option<TraceEntry> {
        match self.buffered.pop_front() {
            Some(entry) => Some(entry),
            None => {
                let verdict = self.pending.take().unwrap_or(Verdict::Timeout);
                self.halt(verdict)
            }
        }
    }

    fn next_deterministic(&mut self) -> Option<TraceEntry> {
        let current = self.current.as_ref()?;

        match self.machine.step(current) {
            Step::Halt(halt) => self.halt(halt.into()),
            Step::Branch(_) => unreachable!("deterministic machines never branch"),
            Step::Continue(_) if self.recorded >= self.limits.max_steps => {
                self.halt(Verdict::Timeout)
            }
            Step::Continue(successor) => {
                trace!("{}", successor.transition);

                let entry = TraceEntry {
                    step: self.recorded,
                    transition: Some(successor.transition),
                    configuration: successor.configuration.clone(),
                };
                self.current = Some(successor.configuration);
                self.recorded += 1;
                self.explored += 1;
                Some(entry)
            }
        }
    }
}

impl Iterator for Execution<'_> {
    type Item = TraceEntry;

    fn next(&mut self) -> Option<Self::Item> {
        match self.status {
            Status::Halted(_) => None,
            Status::Ready => self.start(),
            Status::Running if self.machine.kind() == Kind::Nondeterministic => {
                self.next_buffered()
            }
            Status::Running => self.next_deterministic(),
        }
    }
}
