//! Command execution.

use crate::error::CliError;
use crate::steps::{self, Step};
use crate::OneShot;
use colored::Colorize;
use rstfsm_core::{Machine, MachineConfig};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Executes a one-shot command, writing its output to `out`.
pub fn execute(
    config: Arc<MachineConfig>,
    path: &Path,
    cmd: OneShot,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match cmd {
        OneShot::Validate => {
            let transitions: usize = config
                .definitions()
                .iter()
                .map(|s| s.transitions().count())
                .sum();
            writeln!(
                out,
                "{} {} (checksum: {})\n  Initial: {}\n  States: {}\n  Transitions: {}",
                "Valid".green(),
                path.display().to_string().cyan(),
                config.checksum(),
                config.initial().as_str().yellow(),
                config.len(),
                transitions
            )?;
        }

        OneShot::States { event } => {
            let machine = Machine::new(config);
            for state in machine.states(event.as_deref()) {
                writeln!(out, "{}", state)?;
            }
        }

        OneShot::Run { steps: tokens } => {
            let parsed = tokens
                .iter()
                .map(|t| Step::parse_token(t))
                .collect::<Result<Vec<_>, _>>()?;

            let mut machine = Machine::new(config);
            for (i, step) in parsed.iter().enumerate() {
                let output = steps::execute(&mut machine, step)?;
                writeln!(out, "[{}] {}", (i + 1).to_string().cyan(), output)?;
            }
            writeln!(
                out,
                "{}: {}",
                "Final state".bold(),
                machine.state().as_str().yellow()
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstfsm_core::MachineConfigRaw;

    fn traffic_light() -> Arc<MachineConfig> {
        let raw = MachineConfigRaw::new("green")
            .with_transition("green", "timer", "yellow")
            .with_transition("yellow", "timer", "red")
            .with_transition("red", "timer", "green");
        Arc::new(MachineConfig::from_raw(raw).unwrap())
    }

    fn execute_to_string(cmd: OneShot) -> Result<String, CliError> {
        let mut out = Vec::new();
        execute(traffic_light(), Path::new("light.json"), cmd, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_validate() {
        let output = execute_to_string(OneShot::Validate).unwrap();
        assert!(output.contains("Valid"));
        assert!(output.contains("States: 3"));
        assert!(output.contains("Transitions: 3"));
    }

    #[test]
    fn test_states() {
        let output = execute_to_string(OneShot::States { event: None }).unwrap();
        assert_eq!(output, "green\nyellow\nred\n");

        let output = execute_to_string(OneShot::States {
            event: Some("nope".to_string()),
        })
        .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_run() {
        let output = execute_to_string(OneShot::Run {
            steps: vec![
                "t:timer".to_string(),
                "t:timer".to_string(),
                "undo".to_string(),
            ],
        })
        .unwrap();

        let last = output.lines().last().unwrap();
        assert!(last.contains("Final state"));
        assert!(last.contains("yellow"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_run_rejects_bad_script_before_applying() {
        let err = execute_to_string(OneShot::Run {
            steps: vec!["t:timer".to_string(), "jump".to_string()],
        })
        .unwrap_err();
        assert!(matches!(err, CliError::BadStep { .. }));
    }

    #[test]
    fn test_run_stops_on_unknown_transition() {
        let err = execute_to_string(OneShot::Run {
            steps: vec!["t:timer".to_string(), "t:panic".to_string()],
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Core(_)));
    }
}
