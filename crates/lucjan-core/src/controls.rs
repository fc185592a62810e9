// ── Declarative control table ──
//
// Every user-adjustable setting of the boiler as one row: how to read its
// current value from a snapshot, what constraints a new value must meet,
// and which command applies it. A single generic adapter interprets the
// table, so adding a control is a one-row change.

use std::fmt;

use lucjan_api::{Circuit, Output, SystemCommand};
use serde::Serialize;

use crate::command::Command;
use crate::error::CoreError;
use crate::snapshot::{Snapshot, UNKNOWN};

// ── Values ───────────────────────────────────────────────────────

/// A control's value, as read or as requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Bool(bool),
    Text(String),
    Number(f64),
}

impl ControlValue {
    fn flag(&self) -> bool {
        matches!(self, Self::Bool(true))
    }

    fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    fn integer(&self) -> i64 {
        match self {
            Self::Number(n) => n.round() as i64,
            Self::Bool(b) => i64::from(*b),
            Self::Text(_) => 0,
        }
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("on"),
            Self::Bool(false) => f.write_str("off"),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

// ── Descriptors ──────────────────────────────────────────────────

/// Kind of control and the constraints its values must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Switch,
    Select { options: &'static [&'static str] },
    /// Whole numbers in `min..=max`.
    Number {
        min: i64,
        max: i64,
        unit: &'static str,
    },
    Button,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("switch"),
            Self::Select { .. } => f.write_str("select"),
            Self::Number { .. } => f.write_str("number"),
            Self::Button => f.write_str("button"),
        }
    }
}

/// One row of the control table.
pub struct ControlDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub kind: ControlKind,
    /// Only honoured by the device in manual (RECZNY) mode.
    pub manual_only: bool,
    /// Current value, or `None` when the device does not report it.
    pub read: fn(&Snapshot) -> Option<ControlValue>,
    /// Command applying an already validated value.
    pub write: fn(&ControlValue) -> Command,
}

impl fmt::Debug for ControlDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlDescriptor")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("manual_only", &self.manual_only)
            .finish_non_exhaustive()
    }
}

impl ControlDescriptor {
    /// Whether the control accepts writes given the latest snapshot.
    pub fn check_available(&self, snapshot: Option<&Snapshot>) -> Result<(), CoreError> {
        if self.manual_only && snapshot.is_some_and(Snapshot::is_auto_mode) {
            return Err(CoreError::ControlUnavailable {
                key: self.key.into(),
                reason: "requires manual (RECZNY) mode".into(),
            });
        }
        Ok(())
    }

    pub fn is_available(&self, snapshot: Option<&Snapshot>) -> bool {
        self.check_available(snapshot).is_ok()
    }

    /// Check a value against this control's constraints, returning it in
    /// canonical form (select options upper-cased, numbers rounded).
    pub fn validate(&self, value: &ControlValue) -> Result<ControlValue, CoreError> {
        match (self.kind, value) {
            (ControlKind::Switch, ControlValue::Bool(_)) => Ok(value.clone()),
            (ControlKind::Select { options }, ControlValue::Text(option)) => {
                let upper = option.trim().to_uppercase();
                if options.contains(&upper.as_str()) {
                    Ok(ControlValue::Text(upper))
                } else {
                    Err(self.invalid(format!(
                        "'{option}' is not one of {}",
                        options.join(", ")
                    )))
                }
            }
            (ControlKind::Number { min, max, .. }, ControlValue::Number(n)) => {
                let rounded = n.round();
                if !rounded.is_finite() {
                    return Err(self.invalid(format!("{n} is not a number")));
                }
                let whole = ControlValue::Number(rounded).integer();
                if (min..=max).contains(&whole) {
                    Ok(ControlValue::Number(rounded))
                } else {
                    Err(self.invalid(format!("{whole} is outside {min}..={max}")))
                }
            }
            (ControlKind::Button, _) => Ok(ControlValue::Bool(true)),
            (kind, other) => Err(self.invalid(format!("{kind} does not accept '{other}'"))),
        }
    }

    /// Parse user input for this control.
    pub fn parse_value(&self, input: &str) -> Result<ControlValue, CoreError> {
        let input = input.trim();
        let value = match self.kind {
            ControlKind::Switch => match input.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" | "yes" => ControlValue::Bool(true),
                "off" | "false" | "0" | "no" => ControlValue::Bool(false),
                _ => return Err(self.invalid(format!("'{input}' is not on/off"))),
            },
            ControlKind::Select { .. } => ControlValue::Text(input.to_owned()),
            ControlKind::Number { .. } => input
                .parse()
                .map(ControlValue::Number)
                .map_err(|_| self.invalid(format!("'{input}' is not a number")))?,
            ControlKind::Button => ControlValue::Bool(true),
        };
        self.validate(&value)
    }

    /// Validate `value` and availability, then build the command. Nothing
    /// is sent to the device if either check fails.
    pub fn command_for(
        &self,
        value: &ControlValue,
        snapshot: Option<&Snapshot>,
    ) -> Result<Command, CoreError> {
        self.check_available(snapshot)?;
        let value = self.validate(value)?;
        Ok((self.write)(&value))
    }

    fn invalid(&self, message: String) -> CoreError {
        CoreError::ValidationFailed {
            message: format!("{}: {message}", self.key),
        }
    }
}

// ── Lookup ───────────────────────────────────────────────────────

/// All controls, in display order.
pub fn controls() -> &'static [ControlDescriptor] {
    &CONTROLS
}

pub fn find_control(key: &str) -> Result<&'static ControlDescriptor, CoreError> {
    CONTROLS
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| CoreError::UnknownControl { key: key.into() })
}

// ── Table ────────────────────────────────────────────────────────

const CO_MODES: &[&str] = &["ZIMA", "LATO", "ECOAL", "BRULI"];
const HOT_WATER_MODES: &[&str] = &["WLACZ", "WYLACZ", "BRULI", "ECOAL", "MIESZANIE"];
const BURNER_ALGORITHMS: &[&str] = &["RRM", "RRM2", "RR", "ECOAL", "ZASYPOWY", "WYLACZONY"];
const VALVE_MODES: &[&str] = &["ZADANA", "KRZYWA", "WYLACZONY"];
const CIRCULATION_ALGORITHMS: &[&str] = &["CIAGLY", "CYKLICZNY", "WYLACZONY"];
const PUMP_ALGORITHMS: &[&str] = &["CIAGLY", "CYKLICZNY"];

const CELSIUS: &str = "°C";

fn select_value(raw: &str) -> Option<ControlValue> {
    (raw != UNKNOWN).then(|| ControlValue::Text(raw.to_owned()))
}

fn config_write(name: &str, value: &ControlValue) -> Command {
    Command::SetConfigParam {
        name: name.into(),
        value: value.text(),
    }
}

fn config_number(name: &str, value: &ControlValue) -> Command {
    Command::SetConfigParam {
        name: name.into(),
        value: value.integer().to_string(),
    }
}

fn output_write(output: Output, value: &ControlValue) -> Command {
    Command::SetOutput {
        output,
        on: value.flag(),
    }
}

static CONTROLS: [ControlDescriptor; 29] = [
    // ── Switches ─────────────────────────────────────────────────
    ControlDescriptor {
        key: "auto_mode",
        name: "Boiler AUTO mode",
        kind: ControlKind::Switch,
        manual_only: false,
        read: |s| Some(ControlValue::Bool(s.is_auto_mode())),
        write: |v| Command::SetBoilerMode { auto: v.flag() },
    },
    ControlDescriptor {
        key: "co_pump",
        name: "CO pump",
        kind: ControlKind::Switch,
        manual_only: true,
        read: |s| Some(ControlValue::Bool(s.co_pump)),
        write: |v| output_write(Output::CoPump, v),
    },
    ControlDescriptor {
        key: "hot_water_pump",
        name: "CWU pump",
        kind: ControlKind::Switch,
        manual_only: true,
        read: |s| Some(ControlValue::Bool(s.hot_water_pump)),
        write: |v| output_write(Output::HotWaterPump, v),
    },
    ControlDescriptor {
        key: "hot_water_pump2",
        name: "CWU2 pump",
        kind: ControlKind::Switch,
        manual_only: true,
        read: |s| Some(ControlValue::Bool(s.hot_water_pump2)),
        write: |v| output_write(Output::HotWaterPump2, v),
    },
    ControlDescriptor {
        key: "circulation_pump",
        name: "Circulation pump",
        kind: ControlKind::Switch,
        manual_only: true,
        read: |s| Some(ControlValue::Bool(s.circulation_pump)),
        write: |v| output_write(Output::CirculationPump, v),
    },
    ControlDescriptor {
        key: "feeder",
        name: "Fuel feeder",
        kind: ControlKind::Switch,
        manual_only: true,
        read: |s| Some(ControlValue::Bool(s.feeder)),
        write: |v| output_write(Output::Feeder, v),
    },
    ControlDescriptor {
        key: "hot_water_priority",
        name: "CWU priority",
        kind: ControlKind::Switch,
        manual_only: false,
        read: |s| Some(ControlValue::Bool(s.settings.hot_water_priority == "WLACZ")),
        write: |v| Command::SetConfigParam {
            name: "CWU_PRIORYTET".into(),
            value: if v.flag() { "WLACZ" } else { "WYLACZ" }.into(),
        },
    },
    ControlDescriptor {
        key: "co_circuit",
        name: "CO circuit + 4D valve",
        kind: ControlKind::Switch,
        manual_only: false,
        read: |s| Some(ControlValue::Bool(s.settings.co_mode == lucjan_api::CO_CIRCUIT_ENABLED)),
        write: |v| Command::SetCoCircuit { enabled: v.flag() },
    },
    // ── Selects ──────────────────────────────────────────────────
    ControlDescriptor {
        key: "co_mode",
        name: "CO mode",
        kind: ControlKind::Select { options: CO_MODES },
        manual_only: false,
        read: |s| select_value(&s.settings.co_mode),
        write: |v| config_write("CO_TRYB", v),
    },
    ControlDescriptor {
        key: "hot_water_mode",
        name: "CWU mode",
        kind: ControlKind::Select {
            options: HOT_WATER_MODES,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.hot_water_mode),
        write: |v| config_write("CWU_TRYB", v),
    },
    ControlDescriptor {
        key: "burner_algorithm",
        name: "Burner algorithm",
        kind: ControlKind::Select {
            options: BURNER_ALGORITHMS,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.burner_algorithm),
        write: |v| config_write("PIEC_ALGORYTM", v),
    },
    ControlDescriptor {
        key: "valve_mode",
        name: "4D valve mode",
        kind: ControlKind::Select {
            options: VALVE_MODES,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.valve_mode),
        write: |v| config_write("ZAWOR4D-TRYB", v),
    },
    ControlDescriptor {
        key: "circulation_algorithm",
        name: "CWU circulation",
        kind: ControlKind::Select {
            options: CIRCULATION_ALGORITHMS,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.circulation_algorithm),
        write: |v| config_write("CYRKULACJA_ALGORYTM", v),
    },
    ControlDescriptor {
        key: "co_pump_algorithm",
        name: "CO pump algorithm",
        kind: ControlKind::Select {
            options: PUMP_ALGORITHMS,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.co_pump_algorithm),
        write: |v| config_write("CO_ALGORYTM", v),
    },
    ControlDescriptor {
        key: "hot_water_pump_algorithm",
        name: "CWU pump algorithm",
        kind: ControlKind::Select {
            options: PUMP_ALGORITHMS,
        },
        manual_only: false,
        read: |s| select_value(&s.settings.hot_water_pump_algorithm),
        write: |v| config_write("CWU_ALGORYTM", v),
    },
    // ── Numbers ──────────────────────────────────────────────────
    ControlDescriptor {
        key: "fan_power",
        name: "Fan power",
        kind: ControlKind::Number {
            min: 0,
            max: 100,
            unit: "%",
        },
        manual_only: true,
        read: |s| s.fan_power.map(ControlValue::Number),
        write: |v| Command::SetFanPower {
            percent: u8::try_from(v.integer()).unwrap_or(100),
        },
    },
    ControlDescriptor {
        key: "boiler_target",
        name: "Boiler target temperature",
        kind: ControlKind::Number {
            min: 30,
            max: 80,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.boiler_target.map(ControlValue::Number),
        write: |v| Command::SetTargetTemperature {
            circuit: Circuit::Boiler,
            temp: v.integer(),
        },
    },
    ControlDescriptor {
        key: "hot_water_target",
        name: "CWU target temperature",
        kind: ControlKind::Number {
            min: 30,
            max: 65,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.hot_water_target.map(ControlValue::Number),
        write: |v| Command::SetTargetTemperature {
            circuit: Circuit::HotWater,
            temp: v.integer(),
        },
    },
    ControlDescriptor {
        key: "valve_target",
        name: "4D valve target temperature",
        kind: ControlKind::Number {
            min: 25,
            max: 60,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.valve_target.map(ControlValue::Number),
        write: |v| config_number("ZAWOR4D-ZADANA", v),
    },
    ControlDescriptor {
        key: "summer_outdoor_threshold",
        name: "Auto-summer outdoor threshold",
        kind: ControlKind::Number {
            min: 5,
            max: 25,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.summer_outdoor_threshold.map(ControlValue::Number),
        write: |v| config_number("AUTOLATO_TEMP", v),
    },
    ControlDescriptor {
        key: "summer_indoor_threshold",
        name: "Auto-summer indoor threshold",
        kind: ControlKind::Number {
            min: 18,
            max: 30,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.summer_indoor_threshold.map(ControlValue::Number),
        write: |v| config_number("AUTOLATO_TWEW", v),
    },
    ControlDescriptor {
        key: "boiler_max_temp",
        name: "Boiler maximum temperature",
        kind: ControlKind::Number {
            min: 60,
            max: 95,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.boiler_max_temp.map(ControlValue::Number),
        write: |v| config_number("PIEC_T_MAX", v),
    },
    ControlDescriptor {
        key: "pump_start_temp",
        name: "Pump start temperature",
        kind: ControlKind::Number {
            min: 30,
            max: 55,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.pump_start_temp.map(ControlValue::Number),
        write: |v| config_number("PIEC_T_MIN", v),
    },
    ControlDescriptor {
        key: "circulation_min_temp",
        name: "Circulation minimum CWU temperature",
        kind: ControlKind::Number {
            min: 20,
            max: 60,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.circulation_min_temp.map(ControlValue::Number),
        write: |v| config_number("CYRKULACJA_TMIN", v),
    },
    ControlDescriptor {
        key: "hot_water_max_temp",
        name: "CWU maximum temperature",
        kind: ControlKind::Number {
            min: 40,
            max: 95,
            unit: CELSIUS,
        },
        manual_only: false,
        read: |s| s.settings.hot_water_max_temp.map(ControlValue::Number),
        write: |v| config_number("CWU_T_MAX", v),
    },
    // ── Buttons ──────────────────────────────────────────────────
    ControlDescriptor {
        key: "alarm_reset",
        name: "Reset alarm",
        kind: ControlKind::Button,
        manual_only: false,
        read: |_| None,
        write: |_| Command::System(SystemCommand::AlarmReset),
    },
    ControlDescriptor {
        key: "config_reload",
        name: "Reload config.txt",
        kind: ControlKind::Button,
        manual_only: false,
        read: |_| None,
        write: |_| Command::System(SystemCommand::ConfigReload),
    },
    ControlDescriptor {
        key: "hopper_full",
        name: "Hopper refilled",
        kind: ControlKind::Button,
        manual_only: false,
        read: |_| None,
        write: |_| Command::System(SystemCommand::HopperFull),
    },
    ControlDescriptor {
        key: "reset_controller",
        name: "Restart controller",
        kind: ControlKind::Button,
        manual_only: false,
        read: |_| None,
        write: |_| Command::System(SystemCommand::Reset),
    },
];
