// Runtime control via `/set{NAME}={VALUE}`
//
// Runtime variables take effect immediately but are not persisted to
// `config.txt`. Output variables are only honoured while the boiler runs in
// manual (RECZNY) mode; in AUTO the firmware overrides them on its next
// control cycle.

use std::fmt::Display;

use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use tracing::{debug, error};

use crate::client::DeviceClient;
use crate::error::Error;

/// Directly switchable device outputs (manual mode only).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Output {
    CoPump,
    HotWaterPump,
    HotWaterPump2,
    CirculationPump,
    Feeder,
}

impl Output {
    /// Runtime variable name controlling this output.
    pub fn variable(self) -> &'static str {
        match self {
            Self::CoPump => "OUT_POMPACO",
            Self::HotWaterPump => "OUT_POMPACWU",
            Self::HotWaterPump2 => "OUT_POMPACWU2",
            Self::CirculationPump => "OUT_POMPACYRK",
            Self::Feeder => "OUT_PODAJNIK",
        }
    }
}

/// Runtime variable for fan power, 0-100 %.
pub const FAN_POWER_VARIABLE: &str = "OUT_WENTYLATOR";

/// Heating circuits with a user-adjustable target temperature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Circuit {
    /// Central-heating boiler loop (CO).
    Boiler,
    /// Domestic hot water (CWU).
    HotWater,
}

impl Circuit {
    /// Name shared by the runtime variable and the `config.txt` key.
    pub fn setpoint_param(self) -> &'static str {
        match self {
            Self::Boiler => "PIEC_ZADANA",
            Self::HotWater => "CWU_ZADANA",
        }
    }

    /// Accepted setpoint range in °C, inclusive.
    pub fn setpoint_range(self) -> (i64, i64) {
        match self {
            Self::Boiler => (30, 80),
            Self::HotWater => (30, 65),
        }
    }
}

impl DeviceClient {
    /// Set a runtime variable.
    ///
    /// `GET /set{name}={value}`
    ///
    /// Never fails: transport, auth and HTTP errors are logged and reported
    /// as `false`.
    pub async fn set_runtime_variable(&self, name: &str, value: impl Display) -> bool {
        let value = value.to_string();
        match self.try_set_runtime_variable(name, &value).await {
            Ok(()) => {
                debug!("Set {}={} OK", name, value);
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to set {}={}", name, value);
                false
            }
        }
    }

    /// Fallible form of [`set_runtime_variable`](Self::set_runtime_variable)
    /// for sequences that need the error.
    pub(crate) async fn try_set_runtime_variable(
        &self,
        name: &str,
        value: &str,
    ) -> Result<(), Error> {
        self.get(&format!("/set{name}={value}")).await?;
        Ok(())
    }

    /// Switch one output on or off (manual mode only).
    pub async fn set_output(&self, output: Output, on: bool) -> bool {
        self.set_runtime_variable(output.variable(), u8::from(on))
            .await
    }

    /// Set fan power in percent (manual mode only). Values above 100 are
    /// clamped.
    pub async fn set_fan_power(&self, percent: u8) -> bool {
        self.set_runtime_variable(FAN_POWER_VARIABLE, percent.min(100))
            .await
    }

    /// Change a circuit's target temperature for the running program only.
    ///
    /// The device forgets this on its next config reload; use
    /// [`set_target_temperature`](Self::set_target_temperature) to persist.
    pub async fn set_runtime_setpoint(&self, circuit: Circuit, temp: i64) -> bool {
        self.set_runtime_variable(circuit.setpoint_param(), temp)
            .await
    }
}
