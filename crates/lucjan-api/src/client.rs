// Device HTTP client
//
// Wraps `reqwest::Client` with the controller's URL scheme, Basic auth and
// status classification. Endpoint operations are implemented as inherent
// methods in sibling files to keep this module focused on transport
// mechanics.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::{Timings, TransportConfig};

/// Port the controller's web server listens on out of the box.
pub const DEFAULT_PORT: u16 = 80;

/// Fixed endpoint paths on the controller.
pub mod endpoints {
    pub const STATUS: &str = "/thermos.json";
    pub const CONFIG: &str = "/config.txt";
    pub const CONFIG_UPLOAD: &str = "/upload/config.txt";
    pub const CONFIG_RELOAD: &str = "/configreload";
    pub const ALARM_RESET: &str = "/alarmreset";
    pub const HOPPER_FULL: &str = "/zasobnikfull";
    pub const RESET: &str = "/reset";
}

/// Request/response wrapper around one controller's HTTP endpoints.
///
/// Stateless apart from `config_lock`, which serializes every
/// read-modify-upload-reload sequence against `config.txt`. The device has
/// no transactional config API, so two overlapping uploads would silently
/// drop one of the changes.
pub struct DeviceClient {
    http: reqwest::Client,
    host: String,
    base_url: Url,
    credentials: Option<Credentials>,
    timeout: Duration,
    timings: Timings,
    pub(crate) config_lock: Mutex<()>,
}

impl DeviceClient {
    /// Create a client for `host`, talking to `http://{host}` on port 80 or
    /// `http://{host}:{port}` otherwise.
    pub fn new(
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(
            http,
            host,
            build_base_url(host, port)?,
            credentials,
            transport,
        ))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        host: &str,
        base_url: Url,
        credentials: Option<Credentials>,
        transport: &TransportConfig,
    ) -> Self {
        Self {
            http,
            host: host.to_owned(),
            base_url,
            credentials,
            timeout: transport.timeout,
            timings: transport.timings,
            config_lock: Mutex::new(()),
        }
    }

    /// The configured device host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append an endpoint path to the base URL verbatim.
    ///
    /// Runtime commands embed `NAME=VALUE` in the path itself, so this
    /// deliberately does no escaping.
    pub(crate) fn url(&self, endpoint: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{endpoint}")
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request, returning the response only on HTTP 200.
    pub(crate) async fn get(&self, endpoint: &str) -> Result<reqwest::Response, Error> {
        let url = self.url(endpoint);
        debug!("GET {}", url);

        let builder = self.authorize(self.http.get(&url));
        self.send(builder, url).await
    }

    /// Send a PUT request with a binary body.
    pub(crate) async fn put(
        &self,
        endpoint: &str,
        body: Vec<u8>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(endpoint);
        debug!("PUT {} ({} bytes)", url, body.len());

        let builder = self.authorize(self.http.put(&url).body(body));
        self.send(builder, url).await
    }

    /// Read a successful response body as text.
    pub(crate) async fn read_text(&self, resp: reqwest::Response) -> Result<String, Error> {
        resp.text().await.map_err(|e| self.transport_error(e))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(creds) => creds.apply(builder),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        url: String,
    ) -> Result<reqwest::Response, Error> {
        let resp = builder.send().await.map_err(|e| self.transport_error(e))?;

        match resp.status() {
            reqwest::StatusCode::OK => Ok(resp),
            reqwest::StatusCode::UNAUTHORIZED => Err(Error::Authentication),
            status => Err(Error::Http {
                status: status.as_u16(),
                url,
            }),
        }
    }

    /// Classify a reqwest failure as timeout or generic connection error.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                host: self.host.clone(),
                timeout_secs: whole_secs_rounded_up(self.timeout),
            }
        } else {
            Error::Connection {
                host: self.host.clone(),
                source: err,
            }
        }
    }
}

/// Seconds in `d`, with any fraction counted as a full second.
fn whole_secs_rounded_up(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// `http://{host}` for the default port, `http://{host}:{port}` otherwise.
pub fn build_base_url(host: &str, port: u16) -> Result<Url, Error> {
    let raw = if port == DEFAULT_PORT {
        format!("http://{host}")
    } else {
        format!("http://{host}:{port}")
    };
    Ok(Url::parse(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_omitted() {
        let url = build_base_url("192.168.1.50", 80).expect("valid");
        assert_eq!(url.as_str(), "http://192.168.1.50/");
    }

    #[test]
    fn custom_port_is_kept() {
        let url = build_base_url("boiler.lan", 8080).expect("valid");
        assert_eq!(url.as_str(), "http://boiler.lan:8080/");
    }

    #[test]
    fn endpoint_paths_are_appended_verbatim() {
        let client = DeviceClient::new("boiler.lan", 80, None, &TransportConfig::default())
            .expect("client");
        assert_eq!(
            client.url("/setPIEC_ZADANA=60"),
            "http://boiler.lan/setPIEC_ZADANA=60"
        );
    }

    #[test]
    fn partial_seconds_round_up() {
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(300)), 1);
        assert_eq!(whole_secs_rounded_up(Duration::from_secs(10)), 10);
        assert_eq!(whole_secs_rounded_up(Duration::from_millis(10_001)), 11);
    }

    #[test]
    fn invalid_host_is_rejected() {
        assert!(build_base_url("bad host", 80).is_err());
    }
}
