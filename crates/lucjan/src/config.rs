//! CLI configuration: thin wrapper around `lucjan_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --port, --username, --password, --timeout).

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use lucjan_core::PollerConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use lucjan_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Output format: flag, then the config default, then table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Build the `PollerConfig` for this invocation.
///
/// A matching profile supplies the base values and flags override them.
/// Without a profile, `--host` alone is enough.
pub fn build_poller_config(global: &GlobalOpts, cfg: &Config) -> Result<PollerConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut poller = if let Some(profile) = cfg.profiles.get(&profile_name) {
        // Flag host wins before validation so an empty profile host is fine.
        let mut profile = profile.clone();
        if let Some(ref host) = global.host {
            profile.host.clone_from(host);
        }
        lucjan_config::profile_to_poller_config(&profile, &profile_name, &cfg.defaults)?
    } else if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(cfg),
        });
    } else {
        let host = global.host.as_deref().ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
        let fallback = Profile {
            host: host.to_owned(),
            ..Profile::default()
        };
        lucjan_config::profile_to_poller_config(&fallback, &profile_name, &cfg.defaults)?
    };

    if let Some(port) = global.port {
        poller.port = port;
    }
    if let Some(ref username) = global.username {
        poller.username.clone_from(username);
    }
    if let Some(ref password) = global.password {
        poller.password = SecretString::from(password.clone());
    }
    if let Some(timeout) = global.timeout {
        if timeout == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        poller.timeout = Duration::from_secs(timeout);
    }
    Ok(poller)
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
