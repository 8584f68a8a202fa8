//! Step language shared by `rstfsm run` and the REPL.
//!
//! REPL lines are `cmd [arg]`; script tokens are `cmd` or `cmd:arg`.

use crate::error::CliError;
use colored::Colorize;
use rstfsm_core::{ApplyResult, Machine};

/// A single operation on a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Trigger(String),
    Goto(String),
    Undo,
    Redo,
    Reset,
    Clear,
    State,
    States(Option<String>),
    Events,
    History,
}

impl Step {
    /// Parses a REPL line such as `trigger timer`.
    pub fn parse_line(line: &str) -> Result<Self, CliError> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(CliError::bad_step(line, "too many arguments"));
        }
        Self::from_parts(line, cmd, arg)
    }

    /// Parses a script token such as `t:timer` or `undo`.
    pub fn parse_token(token: &str) -> Result<Self, CliError> {
        match token.split_once(':') {
            Some((cmd, arg)) => Self::from_parts(token, cmd, Some(arg)),
            None => Self::from_parts(token, token, None),
        }
    }

    fn from_parts(raw: &str, cmd: &str, arg: Option<&str>) -> Result<Self, CliError> {
        let arg = arg.filter(|a| !a.is_empty());
        let required = |what: &str| {
            arg.map(str::to_string)
                .ok_or_else(|| CliError::bad_step(raw, format!("missing {}", what)))
        };

        let step = match cmd.to_lowercase().as_str() {
            "trigger" | "t" => Step::Trigger(required("event")?),
            "goto" | "go" => Step::Goto(required("state")?),
            "states" | "ls" => return Ok(Step::States(arg.map(str::to_string))),
            "undo" | "u" => Step::Undo,
            "redo" | "r" => Step::Redo,
            "reset" => Step::Reset,
            "clear" => Step::Clear,
            "state" | "s" => Step::State,
            "events" | "e" => Step::Events,
            "history" | "h" => Step::History,
            "" => return Err(CliError::bad_step(raw, "empty step")),
            other => return Err(CliError::bad_step(raw, format!("unknown command '{}'", other))),
        };

        if arg.is_some() && !matches!(step, Step::Trigger(_) | Step::Goto(_)) {
            return Err(CliError::bad_step(raw, "unexpected argument"));
        }
        Ok(step)
    }
}

/// Applies a step and returns the formatted outcome.
pub fn execute(machine: &mut Machine, step: &Step) -> Result<String, CliError> {
    match step {
        Step::Trigger(event) => Ok(format_apply(&machine.trigger(event)?)),

        Step::Goto(state) => Ok(format_apply(&machine.change_state(state)?)),

        Step::Undo => {
            let from = machine.state().clone();
            if machine.undo() {
                Ok(format!(
                    "{} {} → {}",
                    "undo".cyan(),
                    from,
                    machine.state().as_str().yellow()
                ))
            } else {
                Ok("Nothing to undo".yellow().to_string())
            }
        }

        Step::Redo => {
            let from = machine.state().clone();
            if machine.redo() {
                Ok(format!(
                    "{} {} → {}",
                    "redo".cyan(),
                    from,
                    machine.state().as_str().yellow()
                ))
            } else {
                Ok("Nothing to redo".yellow().to_string())
            }
        }

        Step::Reset => {
            machine.reset();
            Ok(format!(
                "{} to {}",
                "Reset".green(),
                machine.state().as_str().yellow()
            ))
        }

        Step::Clear => {
            machine.clear_history();
            Ok("History cleared".green().to_string())
        }

        Step::State => Ok(machine.state().as_str().yellow().to_string()),

        Step::States(event) => {
            let states = machine.states(event.as_deref());
            if states.is_empty() {
                return Ok("No states".yellow().to_string());
            }
            let current = machine.state();
            let lines: Vec<String> = states
                .into_iter()
                .map(|s| {
                    if s == current {
                        format!("* {}", s.as_str().yellow())
                    } else {
                        format!("  {}", s)
                    }
                })
                .collect();
            Ok(lines.join("\n"))
        }

        Step::Events => {
            let current = machine.state().clone();
            let config = machine.config();
            let lines: Vec<String> = config
                .events_from(&current)
                .into_iter()
                .filter_map(|event| {
                    config
                        .get_transition(&current, event)
                        .map(|to| format!("  {} → {}", event.cyan(), to))
                })
                .collect();
            if lines.is_empty() {
                Ok(format!("No events from {}", current.as_str().yellow()))
            } else {
                Ok(lines.join("\n"))
            }
        }

        Step::History => {
            let join = |states: &[rstfsm_core::State]| {
                states
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(" → ")
            };
            let mut future: Vec<_> = machine.future().to_vec();
            future.reverse();
            Ok(format!(
                "  Past: {}\n  Current: {}\n  Future: {}{}",
                join(machine.history()),
                machine.state().as_str().yellow(),
                join(future.as_slice()),
                if machine.can_redo() || future.is_empty() {
                    String::new()
                } else {
                    format!(" {}", "(stale)".dimmed())
                }
            ))
        }
    }
}

fn format_apply(result: &ApplyResult) -> String {
    match &result.event {
        Some(event) => format!(
            "{} {} → {}",
            event.cyan(),
            result.from_state,
            result.to_state.as_str().yellow()
        ),
        None => format!(
            "{} {} → {}",
            "goto".cyan(),
            result.from_state,
            result.to_state.as_str().yellow()
        ),
    }
}
