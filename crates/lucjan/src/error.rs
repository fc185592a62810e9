//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use lucjan_config::ConfigError;
use lucjan_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const REJECTED: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to boiler controller at {host}")]
    #[diagnostic(
        code(lucjan::connection_failed),
        help(
            "Check that the controller is powered and reachable on the network.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { host: String, reason: String },

    #[error("Boiler controller at {host} did not answer within {seconds}s")]
    #[diagnostic(
        code(lucjan::timeout),
        help("Increase the timeout with --timeout or check the controller's network link.")
    )]
    Timeout { host: String, seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(lucjan::auth_failed),
        help(
            "The controller rejected the username/password (factory default: admin/admin).\n\
             Store the right one with: lucjan config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("The controller rejected '{command}'")]
    #[diagnostic(
        code(lucjan::rejected),
        help("Run with -v for the failing request. The device state is unchanged.")
    )]
    CommandRejected { command: String },

    #[error("Device error: {message}")]
    #[diagnostic(code(lucjan::device))]
    Device { message: String },

    // ── Controls ─────────────────────────────────────────────────────
    #[error("Unknown control '{key}'")]
    #[diagnostic(
        code(lucjan::unknown_control),
        help("Run: lucjan controls list")
    )]
    UnknownControl { key: String },

    #[error("Control '{key}' is unavailable: {reason}")]
    #[diagnostic(
        code(lucjan::control_unavailable),
        help("Switch the boiler to manual first: lucjan mode manual")
    )]
    ControlUnavailable { key: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lucjan::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lucjan::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lucjan config set host <address> --profile {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No boiler controller configured")]
    #[diagnostic(
        code(lucjan::no_config),
        help(
            "Pass --host (or set LUCJAN_HOST), or add a profile to {path}\n\
             with: lucjan config set host <address>"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lucjan::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(lucjan::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(lucjan::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::CommandRejected { .. } => exit_code::REJECTED,
            Self::UnknownControl { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, reason } => {
                CliError::ConnectionFailed { host, reason }
            }

            CoreError::NotConnected => CliError::ConnectionFailed {
                host: "(disconnected)".into(),
                reason: "the poller is not connected".into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { host, timeout_secs } => CliError::Timeout {
                host,
                seconds: timeout_secs,
            },

            CoreError::UnknownControl { key } => CliError::UnknownControl { key },

            CoreError::ControlUnavailable { key, reason } => {
                CliError::ControlUnavailable { key, reason }
            }

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "value".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::UpdateFailed { message }
            | CoreError::Api { message, .. }
            | CoreError::Internal(message) => CliError::Device { message },

            CoreError::NoSnapshot => CliError::Device {
                message: "no status has been read from the controller yet".into(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(see: lucjan config profiles)".into(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}
