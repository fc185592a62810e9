//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod controls;
pub mod device_config;
pub mod status;
pub mod system;
pub mod util;
pub mod watch;

use lucjan_core::{Circuit, Command as CoreCommand, PollerConfig};

use crate::cli::{CircuitArg, Command, GlobalOpts, ModeArg, Toggle};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: PollerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(config, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::DeviceConfig(args) => device_config::handle(config, args, global).await,
        Command::Controls(args) => controls::handle(config, args, global).await,

        Command::SetParam { name, value } => {
            util::apply(config, CoreCommand::SetConfigParam { name, value }, global).await
        }
        Command::SetVar { name, value } => {
            util::apply(config, CoreCommand::SetRuntimeVariable { name, value }, global).await
        }
        Command::Mode { mode } => {
            let auto = matches!(mode, ModeArg::Auto);
            util::apply(config, CoreCommand::SetBoilerMode { auto }, global).await
        }
        Command::CoCircuit { state } => {
            let enabled = matches!(state, Toggle::On);
            util::apply(config, CoreCommand::SetCoCircuit { enabled }, global).await
        }
        Command::Setpoint { circuit, temp } => {
            let circuit = match circuit {
                CircuitArg::Boiler => Circuit::Boiler,
                CircuitArg::HotWater => Circuit::HotWater,
            };
            check_setpoint(circuit, temp)?;
            util::apply(
                config,
                CoreCommand::SetTargetTemperature { circuit, temp },
                global,
            )
            .await
        }

        Command::AlarmReset => system::alarm_reset(config, global).await,
        Command::ConfigReload => system::config_reload(config, global).await,
        Command::HopperFull => system::hopper_full(config, global).await,
        Command::Reset => system::reset(config, global).await,

        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Reject setpoints outside the circuit's range before connecting.
fn check_setpoint(circuit: Circuit, temp: i64) -> Result<(), CliError> {
    let (min, max) = circuit.setpoint_range();
    if (min..=max).contains(&temp) {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: format!("{circuit} setpoint"),
            reason: format!("{temp}°C is outside {min}..={max}°C"),
        })
    }
}
