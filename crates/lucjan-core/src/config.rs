// ── Runtime poller configuration ──
//
// Describes how to reach one boiler controller and how often to poll it.
// Carries credentials but never touches disk: the CLI builds a
// `PollerConfig` from its profile and hands it in.

use std::time::Duration;

use lucjan_api::{Credentials, DEFAULT_PORT, Timings, TransportConfig};
use secrecy::SecretString;

/// Scheduled refresh interval when none is configured.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Accepted bounds for a user-supplied poll interval, inclusive.
pub const MIN_POLL_INTERVAL_SECS: u64 = 10;
pub const MAX_POLL_INTERVAL_SECS: u64 = 300;

/// Wait after an applied command before re-polling, so the device has
/// time to act on it.
pub const DEFAULT_COMMAND_SETTLE: Duration = Duration::from_secs(3);

/// Configuration for polling a single controller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Device hostname or IP address.
    pub host: String,
    pub port: u16,
    /// Basic auth username; empty disables the Authorization header.
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Scheduled refresh interval (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    /// Delay between an applied command and the follow-up refresh.
    pub command_settle: Duration,
    /// Device-mandated pauses inside config write sequences.
    pub timings: Timings,
}

impl PollerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Credentials to send, if a username is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            timings: self.timings,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: lucjan_api::auth::DEFAULT_USERNAME.into(),
            password: SecretString::from(lucjan_api::auth::DEFAULT_PASSWORD.to_owned()),
            timeout: transport.timeout,
            refresh_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            command_settle: DEFAULT_COMMAND_SETTLE,
            timings: transport.timings,
        }
    }
}
