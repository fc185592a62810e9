//! Shared configuration for the Lucjan CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! poll interval validation and translation to `lucjan_core::PollerConfig`.
//! The CLI layers its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use lucjan_core::PollerConfig;
use lucjan_core::config::{
    DEFAULT_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS,
};

/// Keyring service name; entries are `<profile>/password`.
pub const KEYRING_SERVICE: &str = "lucjan";

/// Environment variable consulted for the password of any profile.
pub const PASSWORD_ENV: &str = "LUCJAN_PASSWORD";

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named boiler profiles, in file order.
    #[serde(default)]
    pub profiles: IndexMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: IndexMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up a profile, or the default one when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name.unwrap_or_else(|| self.active_profile_name());
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Scheduled refresh interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// A named boiler controller profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller hostname or IP address.
    pub host: String,

    /// HTTP port (default 80).
    pub port: Option<u16>,

    /// Basic auth username (default "admin"; empty disables auth).
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lucjan", "lucjan").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lucjan");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
///
/// Environment keys use `__` for nesting, e.g.
/// `LUCJAN_DEFAULTS__POLL_INTERVAL=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LUCJAN_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the password for a profile.
///
/// Order: the profile's `password_env` variable, `LUCJAN_PASSWORD`, the
/// system keyring, the plaintext value, then the device default.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> SecretString {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_password,
    )
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> SecretString {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return SecretString::from(pw);
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return SecretString::from(pw);
    }

    // 3. System keyring
    if let Some(pw) = keyring(profile_name) {
        return SecretString::from(pw);
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return SecretString::from(pw.clone());
    }

    SecretString::from(DEFAULT_PASSWORD.to_owned())
}

// ── Validation ──────────────────────────────────────────────────────

/// Check a poll interval against the accepted 10–300 s range.
pub fn validate_poll_interval(secs: u64) -> Result<u64, ConfigError> {
    if (MIN_POLL_INTERVAL_SECS..=MAX_POLL_INTERVAL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Validation {
            field: "poll_interval".into(),
            reason: format!(
                "{secs}s is outside {MIN_POLL_INTERVAL_SECS}..={MAX_POLL_INTERVAL_SECS}s"
            ),
        })
    }
}

/// Build a `PollerConfig` from a profile. No CLI flag overrides.
pub fn profile_to_poller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PollerConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let poll_interval =
        validate_poll_interval(profile.poll_interval.unwrap_or(defaults.poll_interval))?;

    let mut config = PollerConfig::new(host);
    if let Some(port) = profile.port {
        config.port = port;
    }
    config.username = profile
        .username
        .clone()
        .unwrap_or_else(|| DEFAULT_USERNAME.into());
    config.password = resolve_password(profile, profile_name);
    config.timeout = Duration::from_secs(timeout);
    config.refresh_interval_secs = poll_interval;
    Ok(config)
}
