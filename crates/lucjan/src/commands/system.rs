//! System command handlers: alarm reset, config reload, hopper full, reset.

use lucjan_core::{Command as CoreCommand, PollerConfig, SystemCommand};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

async fn run(
    config: PollerConfig,
    command: SystemCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::apply(config, CoreCommand::System(command), global).await
}

pub async fn alarm_reset(config: PollerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    run(config, SystemCommand::AlarmReset, global).await
}

pub async fn config_reload(config: PollerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    run(config, SystemCommand::ConfigReload, global).await
}

pub async fn hopper_full(config: PollerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    run(config, SystemCommand::HopperFull, global).await
}

/// Restart the controller. Asks first unless `--yes`.
pub async fn reset(config: PollerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm("Restart the boiler controller?", "reset", global.yes)? {
        return Ok(());
    }
    run(config, SystemCommand::Reset, global).await
}
