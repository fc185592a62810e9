#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock as the boiler controller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use lucjan_api::{
    Circuit, Credentials, DeviceClient, DeviceConfig, Error, ErrorKind, Output, SystemCommand,
    Timings, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

const CONFIG: &str = "\
# Lucjan config
PIEC_TRYB = AUTO
PIEC_ZADANA = 55
CO_TRYB=ZIMA # winter
CWU_ZADANA=48
";

fn transport() -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_secs(5),
        timings: Timings::immediate(),
    }
}

async fn setup() -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        "127.0.0.1",
        Url::parse(&server.uri()).unwrap(),
        Some(Credentials::default()),
        &transport(),
    );
    (server, client)
}

/// A `config.txt` held in memory: GET serves it, PUT replaces it.
#[derive(Clone)]
struct ConfigFile {
    text: Arc<Mutex<String>>,
    uploads: Arc<Mutex<Vec<String>>>,
}

impl ConfigFile {
    fn new(text: &str) -> Self {
        Self {
            text: Arc::new(Mutex::new(text.to_owned())),
            uploads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn current(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/config.txt"))
            .respond_with(ServeConfig(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/config.txt"))
            .respond_with(StoreConfig(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/configreload"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }
}

struct ServeConfig(ConfigFile);

impl Respond for ServeConfig {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        // Widen the read-modify-write window so unserialized writers would overlap.
        ResponseTemplate::new(200)
            .set_body_string(self.0.current())
            .set_delay(Duration::from_millis(50))
    }
}

struct StoreConfig(ConfigFile);

impl Respond for StoreConfig {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8(request.body.clone()).unwrap();
        *self.0.text.lock().unwrap() = body.clone();
        self.0.uploads.lock().unwrap().push(body);
        ResponseTemplate::new(200)
    }
}

// ── Read endpoints ──────────────────────────────────────────────────

#[tokio::test]
async fn test_get_status_parses_object() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .and(basic_auth("admin", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({"thermos": [{"t": 52.6}], "co": 1, "ver": "0.1.0.130.35"}).to_string(),
        ))
        .mount(&server)
        .await;

    let status = client.get_status().await.unwrap();
    assert_eq!(status.get("co"), Some(&json!(1)));
    assert_eq!(status.get("ver"), Some(&json!("0.1.0.130.35")));
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.get_status().await.unwrap_err();
    assert!(
        matches!(err, Error::Authentication),
        "expected Authentication, got: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Auth);
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/config.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.get_config().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn test_unreachable_device_is_connection_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let base_url = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();

    let client = DeviceClient::with_client(
        reqwest::Client::new(),
        "127.0.0.1",
        base_url,
        None,
        &transport(),
    );
    let err = client.get_status().await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got: {err:?}");
}

#[tokio::test]
async fn test_slow_device_times_out_as_connection_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"co": 1}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_millis(300),
        timings: Timings::immediate(),
    };
    let client =
        DeviceClient::new("127.0.0.1", server.address().port(), None, &transport).unwrap();

    let err = client.get_status().await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }), "expected timeout, got: {err:?}");
    assert!(err.is_connection());
    assert_eq!(err.kind(), ErrorKind::Connection);
    assert_eq!(err.to_string(), "Timeout connecting to 127.0.0.1 after 1s");
}

#[tokio::test]
async fn test_get_config_parses_text() {
    let (server, client) = setup().await;
    ConfigFile::new(CONFIG).mount(&server).await;

    let config = client.get_config().await.unwrap();
    assert_eq!(config, DeviceConfig::parse(CONFIG));
    assert_eq!(config.get("CO_TRYB"), Some("ZIMA"));
}

// ── Runtime variables ───────────────────────────────────────────────

#[tokio::test]
async fn test_set_runtime_variable_embeds_name_and_value() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/setPIEC_ZADANA=60"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.set_runtime_variable("PIEC_ZADANA", 60).await);
}

#[tokio::test]
async fn test_set_output_sends_one_or_zero() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/setOUT_PODAJNIK=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/setOUT_POMPACO=0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.set_output(Output::Feeder, true).await);
    assert!(client.set_output(Output::CoPump, false).await);
}

#[tokio::test]
async fn test_set_runtime_variable_swallows_errors() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/setOUT_WENTYLATOR=100"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(!client.set_fan_power(250).await);
}

// ── Config writes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_set_config_param_rewrites_single_line() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    assert!(client.set_config_param("PIEC_ZADANA", "60").await);

    let expected = CONFIG.replace("PIEC_ZADANA = 55", "PIEC_ZADANA = 60");
    assert_eq!(device.uploads(), vec![expected]);
}

#[tokio::test]
async fn test_set_config_param_missing_key_uploads_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/config.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/config.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/configreload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!client.set_config_param("NIE_MA", "1").await);
}

#[tokio::test]
async fn test_set_config_param_fails_when_reload_fails() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/config.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/upload/config.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/configreload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client.set_config_param("PIEC_ZADANA", "60").await);
}

#[tokio::test]
async fn test_overlapping_config_writes_are_not_lost() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    let (a, b) = tokio::join!(
        client.set_config_param("PIEC_ZADANA", "70"),
        client.set_config_param("CWU_ZADANA", "52"),
    );
    assert!(a && b);

    let final_config = DeviceConfig::parse(&device.current());
    assert_eq!(final_config.get("PIEC_ZADANA"), Some("70"));
    assert_eq!(final_config.get("CWU_ZADANA"), Some("52"));
    assert_eq!(device.uploads().len(), 2);
}

#[tokio::test]
async fn test_set_boiler_mode_writes_token() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    assert!(client.set_boiler_mode(false).await);
    assert!(device.current().contains("PIEC_TRYB = RECZNY\n"));
}

#[tokio::test]
async fn test_co_circuit_disable_runs_manual_token_auto_sequence() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    assert!(client.set_co_circuit(false).await);

    let steps: Vec<(Option<String>, Option<String>)> = device
        .uploads()
        .iter()
        .map(|text| {
            let cfg = DeviceConfig::parse(text);
            (
                cfg.get("PIEC_TRYB").map(str::to_owned),
                cfg.get("CO_TRYB").map(str::to_owned),
            )
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            (Some("RECZNY".into()), Some("ZIMA".into())),
            (Some("RECZNY".into()), Some("ZIM".into())),
            (Some("AUTO".into()), Some("ZIM".into())),
        ]
    );
}

#[tokio::test]
async fn test_co_circuit_failure_restores_auto() {
    let (server, client) = setup().await;
    // No CO_TRYB line: the second step fails after manual mode was set.
    let device = ConfigFile::new("PIEC_TRYB=AUTO\n");
    device.mount(&server).await;

    assert!(!client.set_co_circuit(true).await);
    assert_eq!(device.current(), "PIEC_TRYB=AUTO\n");
    assert_eq!(device.uploads().len(), 2);
}

#[tokio::test]
async fn test_set_target_temperature_writes_runtime_and_config() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/setCWU_ZADANA=50"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.set_target_temperature(Circuit::HotWater, 50).await);
    assert_eq!(
        DeviceConfig::parse(&device.current()).get("CWU_ZADANA"),
        Some("50")
    );
}

#[tokio::test]
async fn test_set_target_temperature_skips_config_when_runtime_fails() {
    let (server, client) = setup().await;
    let device = ConfigFile::new(CONFIG);
    device.mount(&server).await;

    Mock::given(method("GET"))
        .and(path("/setPIEC_ZADANA=65"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client.set_target_temperature(Circuit::Boiler, 65).await);
    assert!(device.uploads().is_empty());
}

// ── System commands ─────────────────────────────────────────────────

#[tokio::test]
async fn test_system_commands_hit_fixed_paths() {
    let (server, client) = setup().await;

    for p in ["/alarmreset", "/zasobnikfull"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    assert!(client.alarm_reset().await);
    assert!(client.hopper_full().await);
}

#[tokio::test]
async fn test_system_command_failure_is_false() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/reset"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!client.reset_controller().await);
    assert!(!client.run_system_command(SystemCommand::ConfigReload).await);
}
