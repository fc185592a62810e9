//! `controls list|set`: the declarative control table.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use lucjan_core::{
    ControlDescriptor, ControlHandle, ControlKind, ControlValue, CoreError, Poller, PollerConfig,
    Snapshot, controls, find_control,
};

use crate::cli::{ControlsArgs, ControlsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rows ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ControlInfo {
    key: &'static str,
    name: &'static str,
    kind: String,
    allowed: String,
    manual_only: bool,
    available: bool,
    value: Option<ControlValue>,
}

#[derive(Tabled)]
struct ControlRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Allowed")]
    allowed: String,
}

impl From<&ControlInfo> for ControlRow {
    fn from(c: &ControlInfo) -> Self {
        let mut value = c.value.as_ref().map_or_else(|| "-".into(), ToString::to_string);
        if !c.available {
            value.push_str(" (manual only)");
        }
        Self {
            key: c.key.into(),
            name: c.name.into(),
            kind: c.kind.clone(),
            value,
            allowed: c.allowed.clone(),
        }
    }
}

fn allowed(kind: ControlKind) -> String {
    match kind {
        ControlKind::Switch => "on, off".into(),
        ControlKind::Select { options } => options.join(", "),
        ControlKind::Number { min, max, unit } => format!("{min}..={max}{unit}"),
        ControlKind::Button => "press".into(),
    }
}

fn info(descriptor: &'static ControlDescriptor, snapshot: &Snapshot) -> ControlInfo {
    ControlInfo {
        key: descriptor.key,
        name: descriptor.name,
        kind: descriptor.kind.to_string(),
        allowed: allowed(descriptor.kind),
        manual_only: descriptor.manual_only,
        available: descriptor.is_available(Some(snapshot)),
        value: (descriptor.read)(snapshot),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: PollerConfig,
    args: ControlsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ControlsCommand::List => {
            let snapshot: Arc<Snapshot> = Poller::oneshot(config, |poller| async move {
                poller.snapshot().ok_or(CoreError::NoSnapshot)
            })
            .await?;

            let rows: Vec<ControlInfo> = controls()
                .iter()
                .map(|descriptor| info(descriptor, &snapshot))
                .collect();
            let out = output::render_list(
                global.format(),
                &rows,
                |c| ControlRow::from(c),
                |c| {
                    let value = c.value.as_ref().map_or_else(|| "-".into(), ToString::to_string);
                    format!("{}={value}", c.key)
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ControlsCommand::Set { key, value } => {
            // Validate offline so bad input never opens a session.
            let descriptor = find_control(&key)?;
            let value = match (descriptor.kind, value) {
                (ControlKind::Button, _) => ControlValue::Bool(true),
                (_, Some(raw)) => descriptor.parse_value(&raw)?,
                (_, None) => {
                    return Err(CliError::Validation {
                        field: key,
                        reason: format!("a value is required ({})", allowed(descriptor.kind)),
                    });
                }
            };

            if descriptor.key == "reset_controller"
                && !util::confirm("Restart the boiler controller?", "reset", global.yes)?
            {
                return Ok(());
            }

            let label = format!("{} = {value}", descriptor.key);
            let result = Poller::oneshot(config, |poller| async move {
                let handle = ControlHandle::new(poller, descriptor.key)?;
                handle.set(value).await
            })
            .await?;
            util::report(result, &label, global)
        }
    }
}
