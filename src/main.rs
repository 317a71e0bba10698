//! Vogel Layout CLI
//!
//! Usage:
//!   vogel-layout [OPTIONS] [INPUT]
//!
//! Options:
//!   -c, --config <FILE>      Optimiser configuration (TOML format)
//!   -o, --output <FILE>      Write the layout JSON here instead of stdout
//!   --seed <N>               Random seed (overrides the config file)
//!   --target-count <N>       Keep only the first N entities
//!   --no-relax               Skip force relaxation
//!   --no-baseline            Skip the random baseline stage
//!   -v, --verbose            More log output (repeat for debug)
//!   -h, --help               Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vogel_layout::{optimize, GraphInput, OptimizerConfig};

#[derive(Parser)]
#[command(name = "vogel-layout")]
#[command(about = "Golden-angle spiral layout optimiser for relationship graphs")]
struct Cli {
    /// Input graph JSON (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Optimiser configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file for the layout JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Random seed for the baseline and local search
    #[arg(long)]
    seed: Option<u64>,

    /// Optimise only the first N entities
    #[arg(long)]
    target_count: Option<usize>,

    /// Skip the force relaxation stage
    #[arg(long)]
    no_relax: bool,

    /// Skip the random baseline stage
    #[arg(long)]
    no_baseline: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Load configuration, then apply command-line overrides
    let mut config = match &cli.config {
        Some(path) => match OptimizerConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => OptimizerConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(count) = cli.target_count {
        config = config.with_target_count(count);
    }
    if cli.no_relax {
        config = config.without_relaxation();
    }
    if cli.no_baseline {
        config = config.with_random_baseline(false);
    }

    // Read input
    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };
    let input = match GraphInput::from_json(&source) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let output = match optimize(&input, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    for metrics in &output.metrics {
        eprintln!("{}\n", metrics);
    }
    if !output.separation_violations.is_empty() {
        eprintln!(
            "{} entity pairs closer than {:.1}",
            output.separation_violations.len(),
            config.relax.min_distance
        );
    }

    let json = match output.to_json() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serialising layout: {}", e);
            std::process::exit(1);
        }
    };
    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, json) {
                eprintln!("Error writing '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => println!("{}", json),
    }
}

fn print_intro() {
    println!(
        r#"Vogel Layout - golden-angle spiral layout optimiser

USAGE:
    vogel-layout [OPTIONS] [INPUT]
    cat graph.json | vogel-layout

OPTIONS:
    -c, --config <FILE>   Optimiser configuration (TOML)
    -o, --output <FILE>   Write layout JSON to a file
    --seed <N>            Random seed (default 42)
    --target-count <N>    Optimise only the first N entities
    --no-relax            Skip force relaxation
    --no-baseline         Skip the random baseline stage
    -v, --verbose         More log output (repeat for debug)
    -h, --help            Print help

INPUT FORMAT:
    {{"entities": [{{"id": 1}}, {{"id": 2}}], "edges": [{{"source": 1, "target": 2}}]}}

A per-stage summary goes to stderr; the layout JSON goes to stdout."#
    );
}
