use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tmsim::report::{
    render_window, step_lines, summary, tape_window, transition_lines, RunReport,
    TAPE_WINDOW_RADIUS,
};
use tmsim::{
    AutomatonDescription, Catalog, CatalogEntry, DefinitionLoader, Format, Limits,
    MachineDefinition, TuringMachine, Verdict,
};

/// Exit code for errors while loading a definition or its input.
const EXIT_ERROR: u8 = 2;
/// Exit code for runs that hit the step bound.
const EXIT_TIMEOUT: u8 = 124;

/// A Turing Machine simulator.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli list
  tmsim-cli run \"Even number of 1s\" --input 1111
  tmsim-cli run programs/zero-n-one-n.tm -i 000111 --trace
  tmsim-cli run \"Contains 101\" -i 0110100 --limits limits.json
  cat machine.json | tmsim-cli run -i 0101 --json")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in example machines
    List,
    /// Run a machine on an input
    Run(RunArgs),
    /// Validate a machine definition
    Check {
        /// A definition file (.tm or .json), or the name or index of a built-in machine.
        /// Read from stdin when omitted.
        program: Option<String>,
    },
    /// Print the automaton description of a machine as JSON
    Automaton {
        /// A definition file (.tm or .json), or the name or index of a built-in machine.
        /// Read from stdin when omitted.
        program: Option<String>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// A definition file (.tm or .json), or the name or index of a built-in machine.
    /// Read from stdin when omitted.
    program: Option<String>,

    /// The input string. Built-in machines run on their sample inputs when omitted.
    #[clap(short, long)]
    input: Option<String>,

    /// JSON file with run limits, e.g. {"max_steps": 500, "max_configurations": 10000}.
    /// Missing fields keep their defaults.
    #[clap(long, value_name = "FILE")]
    limits: Option<PathBuf>,

    /// Maximum number of configurations recorded per run [default: 1000]. Overrides --limits.
    #[clap(short = 'n', long)]
    max_steps: Option<usize>,

    /// Maximum number of configurations explored by a nondeterministic run
    /// [default: 100000]. Overrides --limits.
    #[clap(long)]
    max_configurations: Option<usize>,

    /// Print each configuration of the trace
    #[clap(short, long)]
    trace: bool,

    /// Print each applied transition
    #[clap(long)]
    transitions: bool,

    /// Print the run as JSON
    #[clap(long)]
    json: bool,
}

/// Where a definition came from.
struct Source {
    definition: MachineDefinition,
    entry: Option<&'static CatalogEntry>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Command::List => {
            list();
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => run(&args),
        Command::Check { program } => check(program.as_deref()),
        Command::Automaton { program } => automaton(program.as_deref()),
    };

    result.unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn list() {
    for (index, entry) in Catalog::entries().iter().enumerate() {
        let samples = entry
            .samples
            .iter()
            .map(|s| format!("{s:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>2}  {:<20} {:<17} samples: {}",
            index,
            entry.name(),
            entry.definition.kind.to_string(),
            samples
        );
    }
}

fn run(args: &RunArgs) -> Result<ExitCode, String> {
    let source = resolve(args.program.as_deref())?;
    let limits = limits(args)?;

    let inputs: Vec<String> = match (&args.input, source.entry) {
        (Some(input), _) => vec![input.clone()],
        (None, Some(entry)) => entry.samples.iter().map(|s| s.to_string()).collect(),
        (None, None) => vec![String::new()],
    };

    let mut verdict = None;
    for input in &inputs {
        let machine =
            TuringMachine::load(source.definition.clone(), input).map_err(|e| e.to_string())?;
        debug!("running '{}' on {:?}", machine.definition().name, input);

        let result = machine.run_with(limits);
        print_run(&machine, &result, args)?;
        verdict = Some(result.verdict);
    }

    // A single run reports its verdict through the exit code.
    Ok(match (inputs.len(), verdict) {
        (1, Some(Verdict::Rejected)) => ExitCode::FAILURE,
        (1, Some(Verdict::Timeout)) => ExitCode::from(EXIT_TIMEOUT),
        _ => ExitCode::SUCCESS,
    })
}

/// Limits from the `--limits` file, or the defaults, with the command line flags on top.
fn limits(args: &RunArgs) -> Result<Limits, String> {
    let mut limits = match &args.limits {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            Limits::from_json(&content).map_err(|e| e.to_string())?
        }
        None => Limits::default(),
    };

    if let Some(max_steps) = args.max_steps {
        limits.max_steps = max_steps;
    }
    if let Some(max_configurations) = args.max_configurations {
        limits.max_configurations = max_configurations;
    }

    debug!("run limits: {:?}", limits);
    Ok(limits)
}

fn print_run(machine: &TuringMachine, run: &tmsim::Run, args: &RunArgs) -> Result<(), String> {
    if args.json {
        let json = RunReport::new(machine, run)
            .to_json()
            .map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!("Input: {:?}", machine.input());

    if args.trace {
        for line in step_lines(&run.trace) {
            println!("{line}");
        }
    }

    if args.transitions {
        for line in transition_lines(&run.trace) {
            println!("{line}");
        }
    }

    if let Some(last) = run.trace.last() {
        println!("{}", render_window(&tape_window(last, TAPE_WINDOW_RADIUS)));
    }
    println!("Output: {}", run.output());
    println!("{}", summary(run));

    Ok(())
}

fn check(program: Option<&str>) -> Result<ExitCode, String> {
    let source = resolve(program)?;
    let definition = &source.definition;

    println!(
        "OK: {} ({}, {} states, {} transitions)",
        definition.name,
        definition.kind,
        definition.state_set().len(),
        definition.transition_count()
    );

    Ok(ExitCode::SUCCESS)
}

fn automaton(program: Option<&str>) -> Result<ExitCode, String> {
    let source = resolve(program)?;
    let description = match source.entry {
        Some(entry) => entry.automaton.clone(),
        None => AutomatonDescription::from_machine(&source.definition),
    };

    let json = serde_json::to_string_pretty(&description).map_err(|e| e.to_string())?;
    println!("{json}");

    Ok(ExitCode::SUCCESS)
}

/// Resolves a program argument.
///
/// An existing file path wins, then a catalog index, then a catalog name. Without an
/// argument the definition is read from stdin, if it is piped.
fn resolve(program: Option<&str>) -> Result<Source, String> {
    match program {
        Some(program) if Path::new(program).is_file() => {
            DefinitionLoader::load_definition(Path::new(program))
                .map(|definition| Source {
                    definition,
                    entry: None,
                })
                .map_err(|e| e.to_string())
        }
        Some(program) => program
            .parse::<usize>()
            .ok()
            .and_then(Catalog::by_index)
            .or_else(|| Catalog::by_name(program))
            .map(|entry| Source {
                definition: entry.definition.clone(),
                entry: Some(entry),
            })
            .ok_or_else(|| format!("'{}' is neither a file nor a built-in machine", program)),
        None if atty::isnt(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read from stdin: {}", e))?;

            DefinitionLoader::load_definition_from_string(&buffer, Format::detect(&buffer))
                .map(|definition| Source {
                    definition,
                    entry: None,
                })
                .map_err(|e| e.to_string())
        }
        None => Err("No program given. Pass a file or a built-in machine name, or pipe a definition on stdin.".to_string()),
    }
}
