use secrecy::{ExposeSecret, SecretString};

/// Default credentials shipped with the controller firmware.
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin";

/// Static HTTP Basic credentials for the controller's web server.
///
/// The device has no sessions or tokens; the same header goes out with
/// every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Build credentials. Returns `None` for an empty username, which
    /// means "send requests without an Authorization header".
    pub fn new(username: impl Into<String>, password: SecretString) -> Option<Self> {
        let username = username.into();
        if username.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Attach the Basic header to an outgoing request.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.into(),
            password: SecretString::from(DEFAULT_PASSWORD.to_owned()),
        }
    }
}
