// Read endpoints: `thermos.json` status and `config.txt`.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::client::{DeviceClient, endpoints};
use crate::config_text::DeviceConfig;
use crate::error::Error;

/// Raw status object as returned by `/thermos.json`.
///
/// Kept loosely typed: field presence and value types vary across firmware
/// builds, and the snapshot builder degrades per field instead of failing.
pub type StatusMap = Map<String, Value>;

impl DeviceClient {
    /// Fetch the status snapshot.
    ///
    /// `GET /thermos.json`
    pub async fn get_status(&self) -> Result<StatusMap, Error> {
        let resp = self.get(endpoints::STATUS).await?;
        let body = self.read_text(resp).await?;
        let status = parse_status(&body)?;
        trace!(fields = status.len(), "thermos data");
        Ok(status)
    }

    /// Fetch and parse `config.txt`.
    ///
    /// `GET /config.txt`
    pub async fn get_config(&self) -> Result<DeviceConfig, Error> {
        let text = self.get_config_raw().await?;
        let config = DeviceConfig::parse(&text);
        debug!(params = config.len(), "parsed config.txt");
        Ok(config)
    }

    /// Fetch `config.txt` verbatim, for read-modify-write.
    pub async fn get_config_raw(&self) -> Result<String, Error> {
        let resp = self.get(endpoints::CONFIG).await?;
        self.read_text(resp).await
    }

    /// Probe the device, returning its status on success.
    pub async fn test_connection(&self) -> Result<StatusMap, Error> {
        self.get_status().await
    }
}

/// Parse a status body. The device does not send a JSON content type, so
/// the body is decoded regardless of headers; it must be a JSON object.
fn parse_status(body: &str) -> Result<StatusMap, Error> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::Deserialization {
            message: format!("expected a JSON object, got {}", json_type(&other)),
            body: body.to_owned(),
        }),
        Err(e) => {
            let preview: String = body.chars().take(200).collect();
            Err(Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.to_owned(),
            })
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
