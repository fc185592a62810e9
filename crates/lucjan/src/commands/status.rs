//! `status`: one poll, rendered.

use std::sync::Arc;

use serde::Serialize;
use strum::IntoEnumIterator;

use lucjan_core::{CoreError, Poller, PollerConfig, Probe, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util::fmt_opt;

// ── Serialized view ─────────────────────────────────────────────────

/// Snapshot plus the values derived from it.
#[derive(Serialize)]
pub struct StatusView<'a> {
    #[serde(flatten)]
    pub snapshot: &'a Snapshot,
    pub probes: Vec<ProbeReading>,
    pub heating: bool,
    pub auto_mode: bool,
    pub hopper_level_percent: Option<f64>,
    pub fuel_consumption_kg: Option<f64>,
    pub uptime: Option<String>,
}

#[derive(Serialize)]
pub struct ProbeReading {
    pub probe: String,
    pub celsius: f64,
}

impl<'a> StatusView<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        let probes = Probe::iter()
            .filter_map(|probe| {
                snapshot.temperature(probe).map(|celsius| ProbeReading {
                    probe: probe.to_string(),
                    celsius,
                })
            })
            .collect();
        Self {
            snapshot,
            probes,
            heating: snapshot.is_heating(),
            auto_mode: snapshot.is_auto_mode(),
            hopper_level_percent: snapshot.hopper_level_percent(),
            fuel_consumption_kg: snapshot.fuel_consumption_kg(),
            uptime: snapshot.uptime_formatted(),
        }
    }
}

// ── Detail rendering ────────────────────────────────────────────────

fn detail(view: &StatusView<'_>, painter: Painter) -> String {
    let s = view.snapshot;
    let settings = &s.settings;

    let mut lines = vec![
        format!("Firmware:     {}", s.firmware_version),
        format!("Uptime:       {}", view.uptime.as_deref().unwrap_or("-")),
        format!(
            "Mode:         {}",
            if view.auto_mode { "AUTO" } else { "manual" }
        ),
        format!(
            "Heating:      {}",
            if view.heating {
                painter.good("yes")
            } else {
                painter.dim("no")
            }
        ),
        format!(
            "Alarm:        {}",
            if s.alarm {
                painter.bad("ACTIVE")
            } else {
                painter.dim("none")
            }
        ),
        String::new(),
        "Temperatures".into(),
    ];
    for reading in &view.probes {
        lines.push(format!("  {:<12}{:.1}°C", reading.probe, reading.celsius));
    }
    if view.probes.is_empty() {
        lines.push("  (no probes reporting)".into());
    }

    lines.extend([
        String::new(),
        "Outputs".into(),
        format!("  CO pump      {}", painter.flag(s.co_pump)),
        format!("  CWU pump     {}", painter.flag(s.hot_water_pump)),
        format!("  CWU2 pump    {}", painter.flag(s.hot_water_pump2)),
        format!("  Circulation  {}", painter.flag(s.circulation_pump)),
        format!("  Feeder       {}", painter.flag(s.feeder)),
        format!("  Thermostat   {}", painter.flag(s.thermostat)),
        format!("  Fan          {}", fmt_opt(s.fan_power, "%")),
        String::new(),
        "Fuel".into(),
        format!("  Hopper       {}", fmt_opt(view.hopper_level_percent, "%")),
        format!("  Hopper level {}", fmt_opt(s.hopper_level_cm, " cm")),
        format!("  Feed rate    {}", fmt_opt(s.feed_rate_g_per_min, " g/min")),
        format!("  Burned       {}", fmt_opt(view.fuel_consumption_kg, " kg")),
        String::new(),
        "Settings".into(),
        format!("  Boiler target    {}", fmt_opt(settings.boiler_target, "°C")),
        format!("  CWU target       {}", fmt_opt(settings.hot_water_target, "°C")),
        format!("  Boiler mode      {}", settings.boiler_mode),
        format!("  CO mode          {}", settings.co_mode),
        format!("  CWU mode         {}", settings.hot_water_mode),
        format!("  Burner algorithm {}", settings.burner_algorithm),
        format!("  4D valve         {}", settings.valve_mode),
        format!(
            "  Hysteresis       {}",
            fmt_opt(settings.boiler_hysteresis(), "°C")
        ),
    ]);
    lines.join("\n")
}

/// `key=value` lines for scripting.
fn plain(view: &StatusView<'_>) -> String {
    let s = view.snapshot;
    let mut lines: Vec<String> = view
        .probes
        .iter()
        .map(|r| format!("{}={}", r.probe, r.celsius))
        .collect();
    lines.push(format!("heating={}", view.heating));
    lines.push(format!("alarm={}", s.alarm));
    lines.push(format!("fan_power={}", fmt_opt(s.fan_power, "")));
    lines.push(format!("boiler_mode={}", s.settings.boiler_mode));
    lines.join("\n")
}

/// Render a snapshot in the selected format.
pub fn render(snapshot: &Snapshot, global: &GlobalOpts) -> Result<String, CliError> {
    let painter = Painter::new(global.color);
    let view = StatusView::new(snapshot);
    output::render_single(global.format(), &view, |v| detail(v, painter), plain)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(config: PollerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot: Arc<Snapshot> = Poller::oneshot(config, |poller| async move {
        poller.snapshot().ok_or(CoreError::NoSnapshot)
    })
    .await?;

    let out = render(&snapshot, global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
