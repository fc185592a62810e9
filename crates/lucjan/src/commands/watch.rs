//! `watch`: keep polling and print a line per snapshot or failed poll.

use futures_util::StreamExt;

use lucjan_core::{Poller, PollerConfig, Probe, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Painter};

use super::status::StatusView;
use super::util::fmt_opt;

fn summary(snapshot: &Snapshot, painter: Painter) -> String {
    let temp = |probe: Probe| fmt_opt(snapshot.temperature(probe), "°C");
    let mut line = format!(
        "{} boiler {} return {} cwu {} fan {} feeder {}",
        snapshot.fetched_at.format("%H:%M:%S"),
        temp(Probe::Boiler),
        temp(Probe::Return),
        temp(Probe::HotWater),
        fmt_opt(snapshot.fan_power, "%"),
        painter.flag(snapshot.feeder),
    );
    if snapshot.alarm {
        line.push(' ');
        line.push_str(&painter.bad("ALARM"));
    }
    line
}

fn render_line(snapshot: &Snapshot, global: &GlobalOpts) -> Result<String, CliError> {
    match global.format() {
        OutputFormat::Table | OutputFormat::Plain => {
            Ok(summary(snapshot, Painter::new(global.color)))
        }
        // One document per line so the stream stays parseable.
        _ => output::render_single(
            OutputFormat::JsonCompact,
            &StatusView::new(snapshot),
            |_| String::new(),
            |_| String::new(),
        ),
    }
}

pub async fn handle(
    mut config: PollerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(interval) = args.interval {
        config.refresh_interval_secs = lucjan_config::validate_poll_interval(interval)?;
    }

    let poller = Poller::new(config);
    poller.connect().await?;

    let painter = Painter::new(global.color);
    let mut snapshots = poller.snapshots().into_stream();
    let mut status = poller.status_changes();

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            next = snapshots.next() => {
                let Some(snapshot) = next else { break Ok(()) };
                match render_line(&snapshot, global) {
                    Ok(line) => output::print_output(&line, global.quiet),
                    Err(e) => break Err(e),
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = status.borrow_and_update().clone();
                if !current.last_update_success {
                    let reason = current.last_error.unwrap_or_default();
                    eprintln!(
                        "{} poll failed ({} in a row): {reason}",
                        painter.bad("!"),
                        current.consecutive_failures
                    );
                }
            }
        }
    };

    poller.disconnect().await;
    outcome
}
