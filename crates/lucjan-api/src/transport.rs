// Shared transport configuration for building the device's reqwest::Client.
//
// The controller is a small embedded web server on the LAN: plain HTTP,
// no cookies, no TLS. The only tuning knobs are the total per-call timeout
// and the pauses the firmware needs between config writes.

use std::time::Duration;

use crate::error::Error;

/// Total timeout applied to every single HTTP call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between uploading `config.txt` and triggering `/configreload`.
pub const DEFAULT_UPLOAD_SETTLE: Duration = Duration::from_millis(500);

/// Pause between the steps of the CO circuit choreography.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_secs(1);

/// Device-mandated delays inside multi-step write sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait after the config upload before asking the device to reload it.
    pub upload_settle: Duration,
    /// Wait between mode switch and circuit change in `set_co_circuit`.
    pub step_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            upload_settle: DEFAULT_UPLOAD_SETTLE,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }
}

impl Timings {
    /// No delays at all. Used against fake devices in tests.
    pub fn immediate() -> Self {
        Self {
            upload_settle: Duration::ZERO,
            step_delay: Duration::ZERO,
        }
    }
}

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub timings: Timings,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            timings: Timings::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("lucjan/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}
