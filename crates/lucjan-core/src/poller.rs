// ── Poller ──
//
// Lifecycle management for one boiler controller: the mandatory first
// refresh, the scheduled refresh task, on-demand refresh requests and
// command routing. The latest snapshot is published lock-free through
// `ArcSwapOption` and pushed to subscribers through a `watch` channel.

use std::future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use lucjan_api::{DeviceClient, DeviceConfig};
use serde::Serialize;
use tokio::sync::{Mutex, Notify, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::snapshot::Snapshot;
use crate::stream::SnapshotStream;

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── Observable state ─────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Health of the polling loop.
///
/// A failed poll leaves the previous snapshot in place; consumers use
/// this to flag what they show as stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollStatus {
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl PollStatus {
    /// A snapshot exists but the latest poll did not refresh it.
    pub fn is_stale(&self) -> bool {
        self.last_success_at.is_some() && !self.last_update_success
    }
}

// ── Poller ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<PollerInner>`.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    config: PollerConfig,
    client: ArcSwapOption<DeviceClient>,
    snapshot: ArcSwapOption<Snapshot>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    status_tx: watch::Sender<PollStatus>,
    connection_state: watch::Sender<ConnectionState>,
    /// Held for the whole of a poll; at most one poll is in flight.
    poll_lock: Mutex<()>,
    /// Number of polls completed, successful or not.
    poll_generation: AtomicU64,
    refresh_requested: Notify,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Poller {
    /// Create a new Poller from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to run the first refresh and start
    /// background tasks.
    pub fn new(config: PollerConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel(PollStatus::default());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(PollerInner {
                config,
                client: ArcSwapOption::empty(),
                snapshot: ArcSwapOption::empty(),
                snapshot_tx,
                status_tx,
                connection_state,
                poll_lock: Mutex::new(()),
                poll_generation: AtomicU64::new(0),
                refresh_requested: Notify::new(),
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// The device client, once connected.
    pub fn client(&self) -> Result<Arc<DeviceClient>, CoreError> {
        self.inner.client.load_full().ok_or(CoreError::NotConnected)
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the controller.
    ///
    /// The first refresh must succeed; its error is returned as is, so the
    /// caller can tell rejected credentials from an unreachable device.
    /// Then spawns the refresh task and the command processor.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let config = &self.inner.config;
        let client = match DeviceClient::new(
            &config.host,
            config.port,
            config.credentials(),
            &config.transport(),
        ) {
            Ok(client) => client,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        self.inner.client.store(Some(Arc::new(client)));

        if let Err(e) = self.refresh().await {
            self.inner.client.store(None);
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let poller = self.clone();
            handles.push(tokio::spawn(command_processor_task(poller, rx)));
        }

        let poller = self.clone();
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(refresh_task(
            poller,
            config.refresh_interval_secs,
            cancel,
        )));

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(host = %config.host, "connected to boiler controller");
        Ok(())
    }

    /// Stop background tasks and drop the device client.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.client.store(None);
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Poll the device now.
    ///
    /// Single-flight: a caller that arrives while a poll is running waits
    /// for it and shares its outcome instead of starting another.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let seen = self.inner.poll_generation.load(Ordering::Acquire);
        let _guard = self.inner.poll_lock.lock().await;

        if self.inner.poll_generation.load(Ordering::Acquire) != seen {
            return self.last_outcome();
        }

        let result = self.poll_once().await;
        self.inner.poll_generation.fetch_add(1, Ordering::AcqRel);
        result
    }

    /// Ask the refresh task for a poll without waiting for it.
    ///
    /// Requests made while a poll is pending collapse into one.
    pub fn request_refresh(&self) {
        self.inner.refresh_requested.notify_one();
    }

    async fn poll_once(&self) -> Result<Arc<Snapshot>, CoreError> {
        let client = self.client()?;
        let attempt_at = Utc::now();

        let status = match client.get_status().await {
            Ok(status) => status,
            Err(e) => {
                let err = CoreError::from(e);
                self.record_failure(&err, attempt_at);
                return Err(err);
            }
        };

        let config = match client.get_config().await {
            Ok(config) => config,
            Err(e) => {
                debug!(error = %e, "config.txt unavailable, continuing without settings");
                DeviceConfig::default()
            }
        };

        let snapshot = Arc::new(Snapshot::build_at(&status, &config, attempt_at));
        self.inner.snapshot.store(Some(Arc::clone(&snapshot)));
        self.inner.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
        self.inner.status_tx.send_modify(|s| {
            s.last_update_success = true;
            s.last_error = None;
            s.last_success_at = Some(attempt_at);
            s.last_attempt_at = Some(attempt_at);
            s.consecutive_failures = 0;
        });

        debug!(
            firmware = %snapshot.firmware_version,
            settings = config.len(),
            "poll complete"
        );
        Ok(snapshot)
    }

    fn record_failure(&self, err: &CoreError, attempt_at: DateTime<Utc>) {
        self.inner.status_tx.send_modify(|s| {
            s.last_update_success = false;
            s.last_error = Some(err.to_string());
            s.last_attempt_at = Some(attempt_at);
            s.consecutive_failures = s.consecutive_failures.saturating_add(1);
        });
    }

    /// Outcome of the most recently completed poll.
    fn last_outcome(&self) -> Result<Arc<Snapshot>, CoreError> {
        let status = self.inner.status_tx.borrow().clone();
        match (status.last_update_success, self.snapshot()) {
            (true, Some(snapshot)) => Ok(snapshot),
            _ => Err(CoreError::UpdateFailed {
                message: status
                    .last_error
                    .unwrap_or_else(|| "no successful poll yet".into()),
            }),
        }
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the controller.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result. A command the device rejects
    /// is `Ok(CommandResult::Failed)`; `Err` means it never reached the
    /// device.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::NotConnected);
        }

        let (tx, rx) = oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotConnected)?;

        rx.await.map_err(|_| CoreError::NotConnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Optimized for CLI: the scheduled refresh is disabled since we only
    /// need a single request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: PollerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Poller) -> Fut,
        Fut: future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let poller = Poller::new(cfg);
        poller.connect().await?;
        let result = f(poller.clone()).await;
        poller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Latest snapshot, if any poll has succeeded.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Watch the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Snapshot updates as a subscription with `Stream` support.
    pub fn snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.subscribe())
    }

    /// Current polling health.
    pub fn status(&self) -> PollStatus {
        self.inner.status_tx.borrow().clone()
    }

    /// Watch polling health.
    pub fn status_changes(&self) -> watch::Receiver<PollStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Poll on the configured interval and whenever a refresh is requested.
///
/// A requested refresh restarts the interval, so a command's follow-up
/// poll and the next scheduled one do not fire back to back.
async fn refresh_task(poller: Poller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = (interval_secs > 0).then(|| {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
    if let Some(interval) = interval.as_mut() {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        let requested = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = poller.inner.refresh_requested.notified() => true,
            () = next_tick(interval.as_mut()) => false,
        };
        if requested {
            if let Some(interval) = interval.as_mut() {
                interval.reset();
            }
        }

        if let Err(e) = poller.refresh().await {
            warn!(error = %e, "scheduled refresh failed");
        }
    }
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

/// Process commands from the mpsc channel one at a time.
///
/// After an applied command a refresh is requested once the device has had
/// `command_settle` to act on it.
async fn command_processor_task(poller: Poller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = poller.inner.cancel.clone();
    let settle = poller.inner.config.command_settle;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&poller, envelope.command).await;
                let applied = matches!(result, Ok(CommandResult::Applied));
                let _ = envelope.response_tx.send(result);

                if applied {
                    let poller = poller.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            () = cancel.cancelled() => {}
                            () = tokio::time::sleep(settle) => poller.request_refresh(),
                        }
                    });
                }
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(poller: &Poller, cmd: Command) -> Result<CommandResult, CoreError> {
    let client = poller.client()?;
    debug!(command = %cmd, "executing");

    let ok = match &cmd {
        Command::SetRuntimeVariable { name, value } => {
            client.set_runtime_variable(name, value).await
        }
        Command::SetOutput { output, on } => client.set_output(*output, *on).await,
        Command::SetFanPower { percent } => client.set_fan_power(*percent).await,
        Command::SetConfigParam { name, value } => client.set_config_param(name, value).await,
        Command::SetBoilerMode { auto } => client.set_boiler_mode(*auto).await,
        Command::SetCoCircuit { enabled } => client.set_co_circuit(*enabled).await,
        Command::SetTargetTemperature { circuit, temp } => {
            client.set_target_temperature(*circuit, *temp).await
        }
        Command::System(system) => client.run_system_command(*system).await,
    };

    if !ok {
        warn!(command = %cmd, "device rejected command");
    }
    Ok(CommandResult::from_success(ok))
}
