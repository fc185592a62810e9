// ── Core error types ──
//
// User-facing errors from lucjan-core. Consumers never match on reqwest
// failures or raw status codes; the `From<lucjan_api::Error>` impl folds
// transport errors into the auth / connectivity / device buckets.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to boiler controller at {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Boiler controller at {host} timed out after {timeout_secs}s")]
    Timeout { host: String, timeout_secs: u64 },

    #[error("Poller is not connected")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Update failed: {message}")]
    UpdateFailed { message: String },

    #[error("No snapshot available yet")]
    NoSnapshot,

    // ── Control errors ───────────────────────────────────────────────
    #[error("Unknown control: {key}")]
    UnknownControl { key: String },

    #[error("Control {key} is unavailable: {reason}")]
    ControlUnavailable { key: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Device errors (wrapped, not exposed raw) ─────────────────────
    #[error("Device error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for errors caused by rejected credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Returns `true` for errors caused by an unreachable device.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lucjan_api::Error> for CoreError {
    fn from(err: lucjan_api::Error) -> Self {
        match err {
            lucjan_api::Error::Authentication => CoreError::AuthenticationFailed {
                message: "device rejected the configured username/password".into(),
            },
            lucjan_api::Error::Timeout { host, timeout_secs } => {
                CoreError::Timeout { host, timeout_secs }
            }
            lucjan_api::Error::Connection { host, source } => CoreError::ConnectionFailed {
                host,
                reason: source.to_string(),
            },
            lucjan_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid device address: {e}"),
            },
            lucjan_api::Error::ClientBuild(message) => CoreError::Internal(message),
            lucjan_api::Error::Http { status, url } => CoreError::Api {
                message: format!("HTTP {status} from {url}"),
                status: Some(status),
            },
            lucjan_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unreadable status response: {message}"),
                status: None,
            },
            lucjan_api::Error::ParameterNotFound { name } => CoreError::Api {
                message: format!("parameter {name} not found in config.txt"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_connectivity_are_distinguished() {
        let auth = CoreError::from(lucjan_api::Error::Authentication);
        assert!(auth.is_auth());
        assert!(!auth.is_connectivity());

        let timeout = CoreError::from(lucjan_api::Error::Timeout {
            host: "boiler".into(),
            timeout_secs: 10,
        });
        assert!(timeout.is_connectivity());
        assert!(!timeout.is_auth());
    }

    #[test]
    fn http_status_is_carried_through() {
        let err = CoreError::from(lucjan_api::Error::Http {
            status: 503,
            url: "http://boiler/thermos.json".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    }
}
