//! Interactive REPL.

use crate::config::ReplConfig;
use crate::error::CliError;
use crate::steps::{self, Step};
use colored::Colorize;
use rstfsm_core::{Machine, MachineConfig};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::Path;
use std::sync::Arc;

const HELP_TEXT: &str = r#"
Available commands:
  help                    Show this help

  state                   Show the current state
  states [event]          List states (only those declaring event, if given)
  events                  List events available from the current state

  trigger <event>, t      Fire an event from the current state
  goto <state>, go        Jump to a state, ignoring transitions

  undo, u                 Step back to the previous state
  redo, r                 Re-apply the last undone state
  history, h              Show past and future states
  reset                   Return to the initial state and forget history
  clear                   Forget history, keep the current state

  quit, exit              Exit the REPL
"#;

pub fn run(
    config: Arc<MachineConfig>,
    path: &Path,
    repl_config: &ReplConfig,
) -> Result<(), CliError> {
    println!("{}", "rstfsm".bold().cyan());
    println!(
        "Loaded {} ({} states, checksum {})",
        path.display(),
        config.len(),
        config.checksum()
    );

    let mut machine = Machine::new(config);

    // Create readline editor
    let editor_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;

    // Load history
    let history_path = repl_config.history_path();
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!(
            "{} [{}] ",
            repl_config.prompt.cyan(),
            machine.state().as_str().yellow()
        );
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut machine, line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    // Save history
    if let Err(e) = rl.save_history(&history_path) {
        tracing::warn!("failed to save history to {}: {}", history_path.display(), e);
    }

    Ok(())
}

fn execute_repl_command(machine: &mut Machine, line: &str) -> Result<Option<String>, CliError> {
    let cmd = line
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        _ => {
            let step = Step::parse_line(line)?;
            steps::execute(machine, &step).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn machine() -> Machine {
        Machine::from_json(&json!({
            "initial": "locked",
            "states": {
                "locked": {"transitions": {"coin": "unlocked"}},
                "unlocked": {"transitions": {"push": "locked"}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_help_and_quit() {
        let mut machine = machine();
        let help = execute_repl_command(&mut machine, "help").unwrap().unwrap();
        assert!(help.contains("trigger <event>"));
        assert!(execute_repl_command(&mut machine, "QUIT").unwrap().is_none());
    }

    #[test]
    fn test_session() {
        let mut machine = machine();
        execute_repl_command(&mut machine, "trigger coin").unwrap();
        assert_eq!(machine.state().as_str(), "unlocked");

        execute_repl_command(&mut machine, "u").unwrap();
        assert_eq!(machine.state().as_str(), "locked");

        let err = execute_repl_command(&mut machine, "trigger push").unwrap_err();
        assert!(matches!(err, CliError::Core(_)));

        let output = execute_repl_command(&mut machine, "dance").unwrap_err();
        assert!(output.to_string().contains("unknown command"));
    }
}
