use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use odisf_rs::{run_command, CommandOutcome, OdisfEngine, OdisfError, RawArguments};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))?;

    let args = RawArguments::parse();
    let engine = OdisfEngine::new().with_progress(std::io::stderr().is_terminal());

    let outcome = run_command(&args, &engine);
    match &outcome {
        CommandOutcome::Finished(_) => {}
        CommandOutcome::Usage => println!("{}", RawArguments::usage()),
        CommandOutcome::Failed(failure) => {
            eprintln!("{}", failure);
            if matches!(failure.source, OdisfError::MissingInput { .. }) {
                eprintln!("\n{}", RawArguments::usage());
            }
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
