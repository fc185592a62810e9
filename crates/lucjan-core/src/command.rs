// ── Command API ──
//
// All writes flow through a unified `Command` enum. The poller routes each
// variant to the matching `DeviceClient` call on its command processor
// task, so command sequences for one device never run in parallel.

use std::fmt;

use lucjan_api::{Circuit, Output, SystemCommand};
use tokio::sync::oneshot;

use crate::error::CoreError;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All write operations against a boiler controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Runtime (not persisted) ──────────────────────────────────────
    SetRuntimeVariable { name: String, value: String },
    SetOutput { output: Output, on: bool },
    SetFanPower { percent: u8 },

    // ── Persisted via config.txt ─────────────────────────────────────
    SetConfigParam { name: String, value: String },
    SetBoilerMode { auto: bool },
    SetCoCircuit { enabled: bool },
    /// Runtime write plus `config.txt` write of the same setpoint.
    SetTargetTemperature { circuit: Circuit, temp: i64 },

    // ── System ───────────────────────────────────────────────────────
    System(SystemCommand),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetRuntimeVariable { name, value } => write!(f, "set {name}={value}"),
            Self::SetOutput { output, on } => {
                write!(f, "{output} {}", if *on { "on" } else { "off" })
            }
            Self::SetFanPower { percent } => write!(f, "fan power {percent}%"),
            Self::SetConfigParam { name, value } => write!(f, "config {name}={value}"),
            Self::SetBoilerMode { auto } => {
                write!(f, "boiler mode {}", if *auto { "AUTO" } else { "RECZNY" })
            }
            Self::SetCoCircuit { enabled } => {
                write!(f, "CO circuit {}", if *enabled { "on" } else { "off" })
            }
            Self::SetTargetTemperature { circuit, temp } => {
                write!(f, "{circuit} setpoint {temp}°C")
            }
            Self::System(cmd) => write!(f, "{cmd}"),
        }
    }
}

/// Outcome of a command. The device reports nothing beyond success, so a
/// failed command carries no detail; the cause is in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// The device accepted every step.
    Applied,
    /// Some step failed; treat the device state as unchanged.
    Failed,
}

impl CommandResult {
    pub fn from_success(ok: bool) -> Self {
        if ok { Self::Applied } else { Self::Failed }
    }

    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}
