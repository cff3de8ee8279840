//! `inkmark` command line entry point.

use clap::Parser;
use inkmark_cli::{load_script, run_script};
use inkmark_core::EngineConfig;
use std::path::PathBuf;
use std::process::ExitCode;

/// Replay a recorded annotation input script and print the resulting state
/// as JSON.
///
/// Examples:
///   inkmark stroke.json                   # Replay with default settings
///   inkmark --config engine.json s.json   # Replay with a config file
#[derive(Parser, Debug)]
#[command(name = "inkmark", version, about = "Replay Inkmark annotation input scripts")]
struct Cli {
    /// Engine configuration file (JSON). Missing fields use defaults.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,

    /// Script to replay (JSON array of steps).
    script: PathBuf,
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let steps = load_script(&cli.script)?;
    log::info!("Replaying {} step(s) from {}", steps.len(), cli.script.display());

    let report = run_script(&steps, config)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Replay failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
