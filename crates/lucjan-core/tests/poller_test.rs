#![allow(clippy::unwrap_used)]
// Integration tests for `Poller` against a wiremock boiler controller.

use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lucjan_api::Timings;
use lucjan_core::{
    Command, CommandResult, ConnectionState, ControlHandle, ControlValue, CoreError, Output,
    Poller, PollerConfig, Probe,
};

// ── Helpers ─────────────────────────────────────────────────────────

const CONFIG: &str = "PIEC_TRYB=RECZNY\nPIEC_ZADANA=60\nCO_TRYB=ZIMA\nCWU_TRYB=WLACZ\n";

fn status_body() -> serde_json::Value {
    json!({
        "thermos": [{"t": 61.5}, {"t": 44.0}],
        "wen0": 35, "pod": 0, "co": 1, "al": 0,
        "time": 3725, "ver": "0.1.0.130.35"
    })
}

fn poller_config(server: &MockServer) -> PollerConfig {
    PollerConfig {
        port: server.address().port(),
        timeout: Duration::from_secs(2),
        refresh_interval_secs: 0,
        command_settle: Duration::from_millis(20),
        timings: Timings::immediate(),
        ..PollerConfig::new("127.0.0.1")
    }
}

async fn mount_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(server)
        .await;
}

async fn mount_config(server: &MockServer, text: &str) {
    Mock::given(method("GET"))
        .and(path("/config.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(text))
        .mount(server)
        .await;
}

async fn status_hits(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/thermos.json")
        .count()
}

// ── Connect ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_builds_first_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    assert_eq!(*poller.connection_state().borrow(), ConnectionState::Connected);
    let snap = poller.snapshot().unwrap();
    assert_eq!(snap.temperature(Probe::Boiler), Some(61.5));
    assert_eq!(snap.fan_power, Some(35.0));
    assert!(snap.co_pump);
    assert!(snap.is_heating());
    assert!(!snap.is_auto_mode());
    assert_eq!(snap.settings.boiler_target, Some(60.0));
    assert_eq!(snap.uptime_formatted().as_deref(), Some("1h 2m"));
    assert!(poller.status().last_update_success);

    poller.disconnect().await;
    assert_eq!(
        *poller.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

#[tokio::test]
async fn test_connect_rejected_credentials_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let poller = Poller::new(poller_config(&server));
    let err = poller.connect().await.unwrap_err();

    assert!(err.is_auth(), "expected auth error, got {err:?}");
    assert!(poller.snapshot().is_none());
    assert_eq!(*poller.connection_state().borrow(), ConnectionState::Failed);
}

#[tokio::test]
async fn test_connect_unreachable_is_connectivity_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = PollerConfig {
        port,
        timeout: Duration::from_secs(2),
        refresh_interval_secs: 0,
        ..PollerConfig::new("127.0.0.1")
    };

    let poller = Poller::new(config);
    let err = poller.connect().await.unwrap_err();
    assert!(err.is_connectivity(), "expected connectivity error, got {err:?}");
}

#[tokio::test]
async fn test_missing_config_still_builds_snapshot() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    Mock::given(method("GET"))
        .and(path("/config.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    let snap = poller.snapshot().unwrap();
    assert_eq!(snap.temperature(Probe::Return), Some(44.0));
    assert_eq!(snap.settings.boiler_mode, "unknown");
    assert_eq!(snap.settings.boiler_target, None);
    poller.disconnect().await;
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_poll_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();
    let first = poller.snapshot().unwrap();

    let err = poller.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));

    let kept = poller.snapshot().unwrap();
    assert_eq!(kept.fetched_at, first.fetched_at);

    let status = poller.status();
    assert!(status.is_stale());
    assert_eq!(status.consecutive_failures, 1);
    assert!(status.last_error.is_some());
    poller.disconnect().await;
}

#[tokio::test]
async fn test_scheduled_refresh_polls_on_interval() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(PollerConfig {
        refresh_interval_secs: 1,
        ..poller_config(&server)
    });
    poller.connect().await.unwrap();
    let first = poller.snapshot().unwrap();

    tokio::time::sleep(Duration::from_millis(2600)).await;

    // The connect poll plus at least two scheduled ticks.
    assert!(status_hits(&server).await >= 3);
    let latest = poller.snapshot().unwrap();
    assert!(latest.fetched_at > first.fetched_at);
    assert!(poller.status().last_update_success);
    poller.disconnect().await;
}

#[tokio::test]
async fn test_scheduled_refresh_continues_after_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(PollerConfig {
        refresh_interval_secs: 1,
        ..poller_config(&server)
    });
    poller.connect().await.unwrap();
    let first = poller.snapshot().unwrap();

    let mut status = poller.status_changes();
    let after_one = tokio::time::timeout(
        Duration::from_secs(3),
        status.wait_for(|s| s.consecutive_failures >= 1),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert!(after_one.is_stale());

    let after_two = tokio::time::timeout(
        Duration::from_secs(3),
        status.wait_for(|s| s.consecutive_failures >= 2),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert!(after_two.consecutive_failures > after_one.consecutive_failures);
    assert!(after_two.last_attempt_at > after_one.last_attempt_at);

    assert!(status_hits(&server).await >= 3);
    let kept = poller.snapshot().unwrap();
    assert_eq!(kept.fetched_at, first.fetched_at);
    assert_eq!(*poller.connection_state().borrow(), ConnectionState::Connected);
    poller.disconnect().await;
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thermos.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    let (a, b) = tokio::join!(poller.refresh(), poller.refresh());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.fetched_at, b.fetched_at);

    poller.disconnect().await;
    server.verify().await;
}

#[tokio::test]
async fn test_snapshot_stream_yields_replacements() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    let mut stream = poller.snapshots();
    assert!(stream.current().is_some());

    poller.request_refresh();
    let next = tokio::time::timeout(Duration::from_secs(2), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.firmware_version, "0.1.0.130.35");

    let mut items = poller.snapshots().into_stream();
    let first = tokio::time::timeout(Duration::from_secs(2), items.next())
        .await
        .unwrap();
    assert!(first.is_some());
    poller.disconnect().await;
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_before_connect_is_not_connected() {
    let poller = Poller::new(PollerConfig::new("127.0.0.1"));
    let err = poller
        .execute(Command::SetFanPower { percent: 10 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotConnected));
}

#[tokio::test]
async fn test_applied_command_triggers_follow_up_refresh() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;
    Mock::given(method("GET"))
        .and(path("/setOUT_POMPACO=0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();
    assert_eq!(status_hits(&server).await, 1);

    let result = poller
        .execute(Command::SetOutput {
            output: Output::CoPump,
            on: false,
        })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Applied);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(status_hits(&server).await >= 2);

    poller.disconnect().await;
    server.verify().await;
}

#[tokio::test]
async fn test_rejected_command_reports_failed() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;
    Mock::given(method("GET"))
        .and(path("/setOUT_WENTYLATOR=50"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    let result = poller
        .execute(Command::SetFanPower { percent: 50 })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Failed);
    poller.disconnect().await;
}

#[tokio::test]
async fn test_manual_only_control_refused_in_auto_mode() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, "PIEC_TRYB=AUTO\n").await;
    Mock::given(method("GET"))
        .and(path("/setOUT_PODAJNIK=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let poller = Poller::new(poller_config(&server));
    poller.connect().await.unwrap();

    let feeder = ControlHandle::new(poller.clone(), "feeder").unwrap();
    assert!(!feeder.is_available());
    let err = feeder.set(ControlValue::Bool(true)).await.unwrap_err();
    assert!(matches!(err, CoreError::ControlUnavailable { .. }));
    assert_eq!(feeder.value(), Some(ControlValue::Bool(false)));

    poller.disconnect().await;
    server.verify().await;
}

#[tokio::test]
async fn test_control_handle_shows_pending_value_until_next_poll() {
    let server = MockServer::start().await;
    mount_status(&server).await;
    mount_config(&server, CONFIG).await;
    Mock::given(method("GET"))
        .and(path("/setOUT_WENTYLATOR=80"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = poller_config(&server);
    config.command_settle = Duration::from_secs(60);
    let poller = Poller::new(config);
    poller.connect().await.unwrap();

    let fan = ControlHandle::new(poller.clone(), "fan_power").unwrap();
    assert_eq!(fan.value(), Some(ControlValue::Number(35.0)));

    let result = fan.set(ControlValue::Number(80.0)).await.unwrap();
    assert!(result.is_applied());
    assert_eq!(fan.value(), Some(ControlValue::Number(80.0)));

    // The device still reports 35; a newer snapshot wins.
    tokio::time::sleep(Duration::from_millis(5)).await;
    poller.refresh().await.unwrap();
    assert_eq!(fan.value(), Some(ControlValue::Number(35.0)));

    poller.disconnect().await;
    server.verify().await;
}
