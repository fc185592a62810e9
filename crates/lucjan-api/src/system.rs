// System endpoints
//
// One-shot GETs to fixed paths. None of them take parameters or return a
// body worth reading.

use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::{error, info};

use crate::client::{DeviceClient, endpoints};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SystemCommand {
    /// Acknowledge and clear the active alarm.
    AlarmReset,
    /// Re-read `config.txt` from flash.
    ConfigReload,
    /// Tell the controller the hopper was refilled.
    HopperFull,
    /// Reboot the controller.
    Reset,
}

impl SystemCommand {
    pub fn path(self) -> &'static str {
        match self {
            Self::AlarmReset => endpoints::ALARM_RESET,
            Self::ConfigReload => endpoints::CONFIG_RELOAD,
            Self::HopperFull => endpoints::HOPPER_FULL,
            Self::Reset => endpoints::RESET,
        }
    }
}

impl DeviceClient {
    /// Issue a system command. Failures are logged and reported as `false`.
    pub async fn run_system_command(&self, command: SystemCommand) -> bool {
        match self.get(command.path()).await {
            Ok(_) => {
                info!(%command, "system command sent");
                true
            }
            Err(err) => {
                error!(error = %err, %command, "system command failed");
                false
            }
        }
    }

    /// `GET /alarmreset`
    pub async fn alarm_reset(&self) -> bool {
        self.run_system_command(SystemCommand::AlarmReset).await
    }

    /// `GET /configreload`
    pub async fn config_reload(&self) -> bool {
        self.run_system_command(SystemCommand::ConfigReload).await
    }

    /// `GET /zasobnikfull`
    pub async fn hopper_full(&self) -> bool {
        self.run_system_command(SystemCommand::HopperFull).await
    }

    /// `GET /reset`
    pub async fn reset_controller(&self) -> bool {
        self.run_system_command(SystemCommand::Reset).await
    }
}
