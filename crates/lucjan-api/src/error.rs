use thiserror::Error;

/// Coarse failure class of an [`Error`].
///
/// The controller speaks plain HTTP with no structured error body, so every
/// failure collapses into one of three buckets: the device could not be
/// reached, it rejected the credentials, or it answered with something
/// other than success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout.
    Connection,
    /// HTTP 401 from the device.
    Auth,
    /// Any other non-200 response or an unreadable body.
    Api,
}

/// Top-level error type for the `lucjan-api` crate.
///
/// `lucjan-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Connection refused, DNS failure, reset mid-body, etc.
    #[error("Error connecting to {host}: {source}")]
    Connection {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded the fixed per-call timeout.
    #[error("Timeout connecting to {host} after {timeout_secs}s")]
    Timeout { host: String, timeout_secs: u64 },

    /// Base URL could not be built from host and port.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client itself could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Authentication ──────────────────────────────────────────────
    /// The device answered 401.
    #[error("Invalid credentials")]
    Authentication,

    // ── Device responses ────────────────────────────────────────────
    /// Any non-200, non-401 status.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Status body was not a JSON object.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// `set_config_param` target key is missing from `config.txt`.
    #[error("Parameter {name} not found in config.txt")]
    ParameterNotFound { name: String },
}

impl Error {
    /// Classify this error into the device failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. }
            | Self::Timeout { .. }
            | Self::InvalidUrl(_)
            | Self::ClientBuild(_) => ErrorKind::Connection,
            Self::Authentication => ErrorKind::Auth,
            Self::Http { .. } | Self::Deserialization { .. } | Self::ParameterNotFound { .. } => {
                ErrorKind::Api
            }
        }
    }

    /// Returns `true` if the device could not be reached at all.
    pub fn is_connection(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// Returns `true` if the device rejected the credentials.
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication => Some(401),
            _ => None,
        }
    }
}
