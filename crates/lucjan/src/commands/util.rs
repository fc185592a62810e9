//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};

use lucjan_core::{Command as CoreCommand, CommandResult, Poller, PollerConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::Painter;

/// Execute one command in a single-shot session and report the outcome.
pub async fn apply(
    config: PollerConfig,
    cmd: CoreCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let label = cmd.to_string();
    let result = Poller::oneshot(config, |poller| async move { poller.execute(cmd).await }).await?;
    report(result, &label, global)
}

/// Turn a device outcome into the CLI result, printing a confirmation.
pub fn report(result: CommandResult, label: &str, global: &GlobalOpts) -> Result<(), CliError> {
    match result {
        CommandResult::Applied => {
            if !global.quiet {
                let painter = Painter::new(global.color);
                eprintln!("{} {label}", painter.good("✓"));
            }
            Ok(())
        }
        CommandResult::Failed => Err(CliError::CommandRejected {
            command: label.to_owned(),
        }),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;
    Ok(confirmed)
}

/// Format an optional number with a unit, `-` when absent.
pub fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v}{unit}"))
}
