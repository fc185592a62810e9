// Persistent configuration writes
//
// The controller has no per-parameter config API. Every persisted change is
// a full read-modify-upload of `config.txt` followed by `/configreload`.
// All sequences here run under `DeviceClient::config_lock` so overlapping
// callers cannot lose each other's updates.

use strum::{Display, EnumString, IntoStaticStr};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::client::{DeviceClient, endpoints};
use crate::config_text::replace_param;
use crate::control::Circuit;
use crate::error::Error;

/// Config key selecting AUTO vs manual operation.
pub const BOILER_MODE_PARAM: &str = "PIEC_TRYB";

/// Config key selecting the CO (space heating) circuit program.
pub const CO_CIRCUIT_PARAM: &str = "CO_TRYB";

/// `CO_TRYB` token for a running CO circuit with the 4D valve in play.
pub const CO_CIRCUIT_ENABLED: &str = "ZIMA";

/// `CO_TRYB` token that disables the CO circuit and closes the 4D valve.
///
/// Not a documented value. The firmware falls back to "circuit off" for any
/// token it does not recognize, and this one is known to trigger that path.
/// Fragile: depends on the controller firmware build.
pub const CO_CIRCUIT_DISABLED: &str = "ZIM";

/// Boiler operating mode as stored in `PIEC_TRYB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum BoilerMode {
    #[strum(serialize = "AUTO")]
    Auto,
    #[strum(serialize = "RECZNY")]
    Manual,
}

impl BoilerMode {
    pub fn from_auto(auto: bool) -> Self {
        if auto { Self::Auto } else { Self::Manual }
    }

    pub fn token(self) -> &'static str {
        self.into()
    }
}

impl DeviceClient {
    /// Persist one `config.txt` parameter.
    ///
    /// Fetches the file, rewrites the single assignment line for `name`,
    /// uploads the whole file and triggers a reload. Returns `false` if any
    /// step fails; a missing parameter fails before anything is uploaded.
    pub async fn set_config_param(&self, name: &str, value: &str) -> bool {
        let _guard = self.config_lock.lock().await;
        match self.write_config_param(name, value).await {
            Ok(()) => {
                info!("Config {}={} saved and reloaded", name, value);
                true
            }
            Err(err) => {
                error!(error = %err, "Failed to set config {}={}", name, value);
                false
            }
        }
    }

    /// The read-modify-upload-reload sequence. Caller must hold `config_lock`.
    pub(crate) async fn write_config_param(&self, name: &str, value: &str) -> Result<(), Error> {
        let current = self.get_config_raw().await?;

        let updated =
            replace_param(&current, name, value).ok_or_else(|| Error::ParameterNotFound {
                name: name.to_owned(),
            })?;

        self.put(endpoints::CONFIG_UPLOAD, updated.into_bytes())
            .await?;
        debug!(param = name, "config.txt uploaded");

        sleep(self.timings().upload_settle).await;

        self.get(endpoints::CONFIG_RELOAD).await?;
        Ok(())
    }

    /// Switch between AUTO and manual (RECZNY) operation.
    pub async fn set_boiler_mode(&self, auto: bool) -> bool {
        self.set_config_param(BOILER_MODE_PARAM, BoilerMode::from_auto(auto).token())
            .await
    }

    /// Enable or disable the CO circuit together with the 4D mixing valve.
    ///
    /// The firmware only applies `CO_TRYB` changes cleanly in manual mode,
    /// so this drops to RECZNY, writes the circuit token and returns to AUTO,
    /// pausing `step_delay` between steps. If any step fails, AUTO is
    /// restored on a best-effort basis.
    pub async fn set_co_circuit(&self, enabled: bool) -> bool {
        let token = if enabled {
            CO_CIRCUIT_ENABLED
        } else {
            CO_CIRCUIT_DISABLED
        };

        let _guard = self.config_lock.lock().await;
        match self.co_circuit_sequence(token).await {
            Ok(()) => {
                info!(enabled, "CO circuit updated");
                true
            }
            Err(err) => {
                error!(error = %err, enabled, "Failed to set CO circuit");
                if let Err(restore) = self
                    .write_config_param(BOILER_MODE_PARAM, BoilerMode::Auto.token())
                    .await
                {
                    error!(error = %restore, "Failed to restore AUTO mode");
                }
                false
            }
        }
    }

    async fn co_circuit_sequence(&self, token: &str) -> Result<(), Error> {
        let step_delay = self.timings().step_delay;

        self.write_config_param(BOILER_MODE_PARAM, BoilerMode::Manual.token())
            .await?;
        sleep(step_delay).await;

        self.write_config_param(CO_CIRCUIT_PARAM, token).await?;
        sleep(step_delay).await;

        self.write_config_param(BOILER_MODE_PARAM, BoilerMode::Auto.token())
            .await
    }

    /// Change a circuit's target temperature and persist it.
    ///
    /// Writes the runtime variable first so the change takes effect at once,
    /// then the `config.txt` parameter of the same name. Both writes run
    /// under the config lock. Returns `true` only if both succeed; when
    /// only the runtime write lands, the device runs on a value its config
    /// file does not hold until the next reload.
    pub async fn set_target_temperature(&self, circuit: Circuit, temp: i64) -> bool {
        let param = circuit.setpoint_param();
        let value = temp.to_string();

        let _guard = self.config_lock.lock().await;

        if let Err(err) = self.try_set_runtime_variable(param, &value).await {
            error!(error = %err, "Failed to set {}={}", param, value);
            return false;
        }

        match self.write_config_param(param, &value).await {
            Ok(()) => {
                info!(%circuit, temp, "target temperature updated");
                true
            }
            Err(err) => {
                warn!(
                    error = %err,
                    %circuit,
                    temp,
                    "runtime setpoint applied but config.txt not updated; values diverge until next reload"
                );
                false
            }
        }
    }
}
