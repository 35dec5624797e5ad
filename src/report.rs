//! Turns finished runs into display lines and JSON.
//!
//! Everything here reads a [`Run`] and produces text or serializable values; nothing feeds
//! back into the engine.

use crate::machine::TuringMachine;
use crate::trace::{Configuration, Run, Trace};
use crate::types::{Symbol, Verdict};
use serde::Serialize;

/// Number of cells shown on each side of the head in a tape window.
pub const TAPE_WINDOW_RADIUS: usize = 10;

/// Formats one configuration as `Step {n}: State={state}, Head={head}, Tape={tape}`,
/// with the tape's surrounding blanks trimmed.
pub fn step_line(step: usize, configuration: &Configuration) -> String {
    format!(
        "Step {}: State={}, Head={}, Tape={}",
        step,
        configuration.state,
        configuration.head,
        configuration.tape.contents()
    )
}

/// One step line per recorded configuration.
pub fn step_lines(trace: &Trace) -> Vec<String> {
    trace
        .entries()
        .iter()
        .map(|entry| step_line(entry.step, &entry.configuration))
        .collect()
}

/// One `(state, read) → (next, write, dir)` line per applied transition.
pub fn transition_lines(trace: &Trace) -> Vec<String> {
    trace.transitions().map(ToString::to_string).collect()
}

/// A single cell of a tape window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub position: i64,
    pub symbol: Symbol,
    pub head: bool,
}

/// The `2 * radius + 1` cells centred on the head of `configuration`.
pub fn tape_window(configuration: &Configuration, radius: usize) -> Vec<Cell> {
    configuration
        .tape
        .window(configuration.head, radius)
        .into_iter()
        .map(|(position, symbol)| Cell {
            position,
            symbol,
            head: position == configuration.head,
        })
        .collect()
}

/// Renders a tape window on one line, the head cell in brackets.
pub fn render_window(cells: &[Cell]) -> String {
    cells
        .iter()
        .map(|cell| {
            if cell.head {
                format!("[{}]", cell.symbol)
            } else {
                format!(" {} ", cell.symbol)
            }
        })
        .collect()
}

/// One-line outcome, e.g. `Accepted after 6 steps`.
pub fn summary(run: &Run) -> String {
    let steps = run.trace.transitions().count();
    let unit = if steps == 1 { "step" } else { "steps" };
    match run.verdict {
        Verdict::Timeout => format!("Timeout: no halt within {steps} {unit}"),
        verdict => format!("{verdict} after {steps} {unit}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub state: String,
    pub head: i64,
    pub tape: String,
    /// The transition that led here, `None` for the start configuration.
    pub transition: Option<String>,
}

/// The serializable form of a run, as printed by `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub machine: String,
    pub input: String,
    pub verdict: Verdict,
    /// Number of transitions applied.
    pub steps: usize,
    pub explored: usize,
    pub output: String,
    pub trace: Vec<StepReport>,
}

impl RunReport {
    pub fn new(machine: &TuringMachine, run: &Run) -> Self {
        Self {
            machine: machine.definition().name.clone(),
            input: machine.input().to_string(),
            verdict: run.verdict,
            steps: run.trace.transitions().count(),
            explored: run.explored,
            output: run.output(),
            trace: run
                .trace
                .entries()
                .iter()
                .map(|entry| StepReport {
                    step: entry.step,
                    state: entry.configuration.state.clone(),
                    head: entry.configuration.head,
                    tape: entry.configuration.tape.contents(),
                    transition: entry.transition.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const FLIP: &str = r#"
name: Flip
input: [0, 1]
start: flip
accept: [done]
rules:
  flip:
    0 -> 1, R, flip
    1 -> 0, R, flip
    _, L, done
"#;

    fn run(input: &str) -> (TuringMachine, Run) {
        let machine = TuringMachine::load(parse(FLIP).unwrap(), input).unwrap();
        let run = machine.run(100);
        (machine, run)
    }

    #[test]
    fn test_step_lines() {
        let (_, run) = run("01");
        assert_eq!(
            step_lines(&run.trace),
            vec![
                "Step 0: State=flip, Head=0, Tape=01",
                "Step 1: State=flip, Head=1, Tape=11",
                "Step 2: State=flip, Head=2, Tape=10",
                "Step 3: State=done, Head=1, Tape=10",
            ]
        );
    }

    #[test]
    fn test_transition_lines() {
        let (_, run) = run("0");
        assert_eq!(
            transition_lines(&run.trace),
            vec!["(flip, 0) → (flip, 1, R)", "(flip, _) → (done, _, L)"]
        );
    }

    #[test]
    fn test_tape_window() {
        let (_, run) = run("01");
        let last = run.trace.last().unwrap();
        let cells = tape_window(last, 2);

        assert_eq!(cells.len(), 5);
        assert_eq!(cells[2].position, 1);
        assert!(cells[2].head);
        assert_eq!(render_window(&cells), " _  1 [0] _  _ ");
    }

    #[test]
    fn test_summary() {
        let (_, run) = run("01");
        assert_eq!(summary(&run), "Accepted after 3 steps");
    }

    #[test]
    fn test_run_report_json() {
        let (machine, run) = run("1");
        let report = RunReport::new(&machine, &run);
        assert_eq!(report.verdict, Verdict::Accepted);
        assert_eq!(report.steps, 2);
        assert_eq!(report.output, "0");
        assert_eq!(report.trace[0].transition, None);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["verdict"], "Accepted");
        assert_eq!(json["machine"], "Flip");
        assert_eq!(json["trace"][1]["transition"], "(flip, 1) → (flip, 0, R)");
    }
}
