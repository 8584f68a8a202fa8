//! rstfsm - finite state machine runner
//!
//! Loads a machine definition and drives it from one-shot commands or an
//! interactive REPL with undo/redo.

mod commands;
mod config;
mod error;
mod repl;
mod steps;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use error::CliError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rstfsm")]
#[command(about = "Finite state machine runner with undo/redo")]
#[command(version)]
struct Cli {
    /// Settings file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Machine definition file (JSON, or YAML by extension)
    #[arg(short, long)]
    machine: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive REPL
    Repl,

    #[command(flatten)]
    OneShot(OneShot),
}

/// Commands that run once and exit.
#[derive(Subcommand)]
enum OneShot {
    /// Validate the machine definition
    Validate,

    /// List states
    States {
        /// Only states that declare this event
        #[arg(short, long)]
        event: Option<String>,
    },

    /// Apply a script of steps, e.g. `t:timer goto:red undo redo`
    Run {
        /// Steps to apply in order
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.machine {
        config.machine.path = Some(path);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = config.machine.path.clone().ok_or(CliError::NoMachine)?;
    let machine_config = Arc::new(config::load_machine(&path)?);
    tracing::info!(
        "Loaded machine from {} ({} states, checksum {})",
        path.display(),
        machine_config.len(),
        machine_config.checksum()
    );

    match cli.command {
        Some(Commands::Repl) | None => repl::run(machine_config, &path, &config.repl)?,
        Some(Commands::OneShot(cmd)) => {
            let stdout = std::io::stdout();
            commands::execute(machine_config, &path, cmd, &mut stdout.lock())?;
        }
    }

    Ok(())
}
