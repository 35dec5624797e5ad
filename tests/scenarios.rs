//! End-to-end runs through the public API: parse, load, run, report.

use tmsim::report::{step_line, RunReport};
use tmsim::{
    parse, AnalysisError, Catalog, DefinitionLoader, Format, Kind, Limits, TuringMachine,
    TuringMachineError, Verdict,
};

const EVEN_ONES: &str = r#"
name: Even number of 1s
input: [1]
start: even
accept: [accept]
reject: [reject]
rules:
  even:
    1 -> 1, R, odd
    _ -> _, S, accept
  odd:
    1 -> 1, R, even
    _ -> _, S, reject
"#;

const SELF_LOOP: &str = r#"
name: Self loop
input: [1]
start: spin
accept: [accept]
rules:
  spin:
    1, S, spin
    _, S, spin
  accept:
"#;

fn load(source: &str, input: &str) -> TuringMachine {
    TuringMachine::load(parse(source).unwrap(), input).unwrap()
}

#[test]
fn even_count_of_ones() {
    assert_eq!(load(EVEN_ONES, "11").run(1000).verdict, Verdict::Accepted);
    assert_eq!(load(EVEN_ONES, "1").run(1000).verdict, Verdict::Rejected);

    let empty = load(EVEN_ONES, "").run(1000);
    assert_eq!(empty.verdict, Verdict::Accepted);
    assert_eq!(empty.trace.len(), 2);
}

#[test]
fn zero_n_one_n_from_catalog() {
    let entry = Catalog::by_name("Match 0^n1^n").unwrap();
    let verdict = |input: &str| entry.load(input).unwrap().run(1000).verdict;

    assert_eq!(verdict("000111"), Verdict::Accepted);
    assert_eq!(verdict("0110"), Verdict::Rejected);
    assert_eq!(verdict("00111"), Verdict::Rejected);
    assert_eq!(verdict(""), Verdict::Accepted);
}

#[test]
fn unary_increment_halts_outside_final_states() {
    let entry = Catalog::by_name("Unary increment").unwrap();
    let run = entry.load("111").unwrap().run(1000);

    assert_eq!(run.verdict, Verdict::HaltedNonFinal);
    assert_ne!(run.verdict, Verdict::Rejected);
    assert_eq!(run.output(), "1111");
}

#[test]
fn accepting_start_state_on_empty_input() {
    let source = r#"
name: Accept everything
input: [a]
start: yes
accept: [yes]
rules:
  yes:
    a, R, yes
"#;
    let run = load(source, "").run(1000);

    assert_eq!(run.verdict, Verdict::Accepted);
    assert_eq!(run.trace.len(), 1);
    assert_eq!(
        step_line(0, run.trace.first().unwrap()),
        "Step 0: State=yes, Head=0, Tape="
    );
}

#[test]
fn self_loop_times_out_within_the_bound() {
    let run = load(SELF_LOOP, "").run(1000);
    assert_eq!(run.verdict, Verdict::Timeout);
    assert!(run.trace.len() <= 1000);

    let short = load(SELF_LOOP, "1").run(10);
    assert_eq!(short.verdict, Verdict::Timeout);
    assert_eq!(short.trace.len(), 10);
}

#[test]
fn timeout_is_reported_distinctly() {
    let run = load(SELF_LOOP, "").run(5);
    let report = RunReport::new(&load(SELF_LOOP, ""), &run);

    assert_eq!(report.verdict, Verdict::Timeout);
    assert_eq!(report.steps, 4);
    assert!(report.to_json().unwrap().contains("\"Timeout\""));
}

#[test]
fn nondeterministic_catalog_machine() {
    let entry = Catalog::by_name("Contains 101").unwrap();
    assert_eq!(entry.definition.kind, Kind::Nondeterministic);

    let machine = entry.load("0110100").unwrap();
    let run = machine.run(1000);
    assert_eq!(run.verdict, Verdict::Accepted);
    assert_eq!(run.trace.last().unwrap().state, "accept");
    assert!(run.explored >= run.trace.len());

    let capped = machine.run_with(Limits {
        max_steps: 1000,
        max_configurations: 2,
    });
    assert_eq!(capped.verdict, Verdict::Timeout);
}

#[test]
fn malformed_definitions_fail_at_load() {
    let undeclared_target = r#"
name: Broken
input: [a]
states: [q0]
start: q0
rules:
  q0:
    a, R, q1
"#;
    assert_eq!(
        parse(undeclared_target).unwrap_err(),
        TuringMachineError::MalformedMachine(AnalysisError::UndeclaredStates(vec![
            "q1".to_string()
        ]))
    );

    let definition = parse(EVEN_ONES).unwrap();
    assert_eq!(
        TuringMachine::load(definition, "12").unwrap_err(),
        TuringMachineError::MalformedMachine(AnalysisError::InvalidInputSymbol {
            symbol: '2',
            position: 1
        })
    );
}

#[test]
fn json_and_text_definitions_agree() {
    let text = parse(EVEN_ONES).unwrap();
    let json = serde_json::to_string(&text).unwrap();
    let loaded = DefinitionLoader::load_definition_from_string(&json, Format::Json).unwrap();

    for input in ["", "1", "11", "111"] {
        let a = TuringMachine::load(text.clone(), input).unwrap().run(1000);
        let b = TuringMachine::load(loaded.clone(), input).unwrap().run(1000);
        assert_eq!(a, b);
    }
}
