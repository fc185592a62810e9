// ── Boiler snapshot ──
//
// One immutable, self-consistent view of the controller, built from a
// `thermos.json` status object and the parsed `config.txt`. A snapshot is
// never patched in place: each successful poll builds a new one.

use chrono::{DateTime, Utc};
use lucjan_api::{DeviceConfig, StatusMap};
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::convert::{parse_f64, round_to, to_f64, to_flag, to_i64, to_non_negative};

/// Number of temperature slots in `thermos`.
pub const PROBE_COUNT: usize = 16;

/// Placeholder for string settings missing from `config.txt`.
pub const UNKNOWN: &str = "unknown";

/// `PIEC_TRYB` value for automatic operation.
pub const AUTO_MODE: &str = "AUTO";

// ── Probe ────────────────────────────────────────────────────────────

/// Temperature probe slots, in `thermos` array order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
pub enum Probe {
    /// Boiler water.
    #[strum(serialize = "tPIEC")]
    Boiler,
    /// Return water.
    #[strum(serialize = "tPOWROT")]
    Return,
    #[strum(serialize = "tPODAJNIK")]
    Feeder,
    #[strum(serialize = "tZEW")]
    Outdoor,
    #[strum(serialize = "tWEW")]
    Indoor,
    /// Hot water tank.
    #[strum(serialize = "tCWU")]
    HotWater,
    /// Floor heating loop, after the 4D valve.
    #[strum(serialize = "tPODLOGA")]
    Floor,
    /// Flue gas.
    #[strum(serialize = "tSPALINY")]
    Exhaust,
    #[strum(serialize = "tT1")]
    T1,
    #[strum(serialize = "tT2")]
    T2,
    #[strum(serialize = "tT3")]
    T3,
    #[strum(serialize = "tT4")]
    T4,
    #[strum(serialize = "tT5")]
    T5,
    #[strum(serialize = "tT6")]
    T6,
    #[strum(serialize = "tT7")]
    T7,
    #[strum(serialize = "tT8")]
    T8,
}

impl Probe {
    /// Slot index in the `thermos` array.
    #[allow(clippy::as_conversions)]
    pub fn index(self) -> usize {
        self as usize
    }
}

// ── Settings ─────────────────────────────────────────────────────────

/// Values read from `config.txt`.
///
/// Numeric settings are `None` when absent or non-numeric; string selectors
/// fall back to [`UNKNOWN`]. Hysteresis fields suffixed `_raw` are stored by
/// the firmware in tenths of a degree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoilerSettings {
    /// `PIEC_ZADANA`
    pub boiler_target: Option<f64>,
    /// `CWU_ZADANA`
    pub hot_water_target: Option<f64>,
    /// `PIEC_TRYB`: `AUTO` or `RECZNY`.
    pub boiler_mode: String,
    /// `CO_TRYB`
    pub co_mode: String,
    /// `CWU_TRYB`
    pub hot_water_mode: String,
    /// `PIEC_ALGORYTM`
    pub burner_algorithm: String,
    /// `PIEC_T_MAX`
    pub boiler_max_temp: Option<f64>,
    /// `PIEC_T_MIN`: pumps start above this boiler temperature.
    pub pump_start_temp: Option<f64>,
    /// `PIEC_HISTEREZA`, tenths of °C.
    pub boiler_hysteresis_raw: Option<f64>,
    /// `CO_ALGORYTM`
    pub co_pump_algorithm: String,
    /// `CWU_ALGORYTM`
    pub hot_water_pump_algorithm: String,
    /// `CWU_PRIORYTET`: `WLACZ` or `WYLACZ`.
    pub hot_water_priority: String,
    /// `CWU_HISTEREZA`, whole °C.
    pub hot_water_hysteresis: Option<f64>,
    /// `CWU_T_MAX`
    pub hot_water_max_temp: Option<f64>,
    /// `ZAWOR4D-TRYB`
    pub valve_mode: String,
    /// `ZAWOR4D-ZADANA`
    pub valve_target: Option<f64>,
    /// `ZAWOR4D-CZUJNIK`
    pub valve_sensor: String,
    /// `ZAWOR4D-HISTEREZA`, tenths of °C.
    pub valve_hysteresis_raw: Option<f64>,
    /// `ZAWOR4D-PRESET`
    pub valve_preset: Option<f64>,
    /// `CYRKULACJA_ALGORYTM`
    pub circulation_algorithm: String,
    /// `CYRKULACJA_TMIN`
    pub circulation_min_temp: Option<f64>,
    /// `AUTOLATO_TEMP`: outdoor threshold for automatic summer mode.
    pub summer_outdoor_threshold: Option<f64>,
    /// `AUTOLATO_TWEW`: indoor threshold for automatic summer mode.
    pub summer_indoor_threshold: Option<f64>,
    /// `AUTOLATO_HISTEREZA`, tenths of °C.
    pub summer_hysteresis_raw: Option<f64>,
}

impl BoilerSettings {
    pub fn from_config(config: &DeviceConfig) -> Self {
        let num = |key: &str| config.get(key).and_then(parse_f64);
        let text = |key: &str| config.get(key).unwrap_or(UNKNOWN).to_owned();

        Self {
            boiler_target: num("PIEC_ZADANA"),
            hot_water_target: num("CWU_ZADANA"),
            boiler_mode: text("PIEC_TRYB"),
            co_mode: text("CO_TRYB"),
            hot_water_mode: text("CWU_TRYB"),
            burner_algorithm: text("PIEC_ALGORYTM"),
            boiler_max_temp: num("PIEC_T_MAX"),
            pump_start_temp: num("PIEC_T_MIN"),
            boiler_hysteresis_raw: num("PIEC_HISTEREZA"),
            co_pump_algorithm: text("CO_ALGORYTM"),
            hot_water_pump_algorithm: text("CWU_ALGORYTM"),
            hot_water_priority: text("CWU_PRIORYTET"),
            hot_water_hysteresis: num("CWU_HISTEREZA"),
            hot_water_max_temp: num("CWU_T_MAX"),
            valve_mode: text("ZAWOR4D-TRYB"),
            valve_target: num("ZAWOR4D-ZADANA"),
            valve_sensor: text("ZAWOR4D-CZUJNIK"),
            valve_hysteresis_raw: num("ZAWOR4D-HISTEREZA"),
            valve_preset: num("ZAWOR4D-PRESET"),
            circulation_algorithm: text("CYRKULACJA_ALGORYTM"),
            circulation_min_temp: num("CYRKULACJA_TMIN"),
            summer_outdoor_threshold: num("AUTOLATO_TEMP"),
            summer_indoor_threshold: num("AUTOLATO_TWEW"),
            summer_hysteresis_raw: num("AUTOLATO_HISTEREZA"),
        }
    }

    /// Boiler hysteresis in °C.
    pub fn boiler_hysteresis(&self) -> Option<f64> {
        self.boiler_hysteresis_raw.map(|v| v / 10.0)
    }

    /// 4D valve hysteresis in °C.
    pub fn valve_hysteresis(&self) -> Option<f64> {
        self.valve_hysteresis_raw.map(|v| v / 10.0)
    }

    /// Auto-summer hysteresis in °C.
    pub fn summer_hysteresis(&self) -> Option<f64> {
        self.summer_hysteresis_raw.map(|v| v / 10.0)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Everything known about the boiler after one successful poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,

    /// Readings indexed by [`Probe::index`].
    pub temperatures: [Option<f64>; PROBE_COUNT],

    // Outputs and inputs (`co`, `cwu1`, `cwu2`, `cyrk`, `pod`, `ter`, `al`)
    pub co_pump: bool,
    pub hot_water_pump: bool,
    pub hot_water_pump2: bool,
    pub circulation_pump: bool,
    pub feeder: bool,
    pub thermostat: bool,
    pub alarm: bool,

    /// `wen0`, %.
    pub fan_power: Option<f64>,
    /// `wen1`, %.
    pub fan_modulation: Option<f64>,

    /// `podcz`: cumulative feeder runtime, seconds.
    pub feeder_runtime_secs: Option<f64>,
    /// `podczzas`: feeder seconds left before the hopper runs dry.
    pub feeder_remaining_secs: Option<f64>,
    /// `podczdo`: feeder seconds a full hopper lasts.
    pub feeder_total_secs: Option<f64>,
    /// `podgmin`: feeder throughput, g/min.
    pub feed_rate_g_per_min: Option<f64>,
    /// `podcm`: hopper fuel level sensor, cm.
    pub hopper_level_cm: Option<f64>,
    /// `podcmp`: hopper fill reported directly by the device, %.
    pub hopper_percent_raw: Option<f64>,

    /// `ver`
    pub firmware_version: String,
    /// `time`
    pub uptime_secs: Option<i64>,

    pub settings: BoilerSettings,
}

impl Snapshot {
    /// Build a snapshot stamped with the current time.
    pub fn build(status: &StatusMap, config: &DeviceConfig) -> Self {
        Self::build_at(status, config, Utc::now())
    }

    /// Build a snapshot from raw device data. Pure: identical inputs always
    /// give identical snapshots.
    pub fn build_at(status: &StatusMap, config: &DeviceConfig, fetched_at: DateTime<Utc>) -> Self {
        let slots = status.get("thermos").and_then(Value::as_array);
        let mut temperatures = [None; PROBE_COUNT];
        for probe in Probe::iter() {
            let reading = slots
                .and_then(|s| s.get(probe.index()))
                .and_then(|entry| entry.get("t"));
            temperatures[probe.index()] = to_f64(reading);
        }

        Self {
            fetched_at,
            temperatures,
            co_pump: to_flag(status.get("co")),
            hot_water_pump: to_flag(status.get("cwu1")),
            hot_water_pump2: to_flag(status.get("cwu2")),
            circulation_pump: to_flag(status.get("cyrk")),
            feeder: to_flag(status.get("pod")),
            thermostat: to_flag(status.get("ter")),
            alarm: to_flag(status.get("al")),
            fan_power: to_f64(status.get("wen0")),
            fan_modulation: to_f64(status.get("wen1")),
            feeder_runtime_secs: to_f64(status.get("podcz")),
            feeder_remaining_secs: to_non_negative(status.get("podczzas")),
            feeder_total_secs: to_non_negative(status.get("podczdo")),
            feed_rate_g_per_min: to_non_negative(status.get("podgmin")),
            hopper_level_cm: to_non_negative(status.get("podcm")),
            hopper_percent_raw: to_non_negative(status.get("podcmp")),
            firmware_version: firmware_version(status.get("ver")),
            uptime_secs: to_i64(status.get("time")),
            settings: BoilerSettings::from_config(config),
        }
    }

    pub fn temperature(&self, probe: Probe) -> Option<f64> {
        self.temperatures[probe.index()]
    }

    /// `PIEC_TRYB` is `AUTO`. Manual-only controls are locked while true.
    pub fn is_auto_mode(&self) -> bool {
        self.settings.boiler_mode == AUTO_MODE
    }

    /// The burner is firing: fan running or feeder active.
    pub fn is_heating(&self) -> bool {
        self.fan_power.is_some_and(|p| p > 0.0) || self.feeder
    }

    /// Hopper fill in percent.
    ///
    /// Prefers the device's own percentage; otherwise derives it from the
    /// remaining vs. full-hopper feeder time.
    pub fn hopper_level_percent(&self) -> Option<f64> {
        if let Some(raw) = self.hopper_percent_raw {
            return Some(raw);
        }
        match (self.feeder_remaining_secs, self.feeder_total_secs) {
            (Some(remaining), Some(total)) if total > 0.0 => {
                Some(round_to(remaining / total * 100.0, 1))
            }
            _ => None,
        }
    }

    /// Fuel burned since boot, in kg.
    pub fn fuel_consumption_kg(&self) -> Option<f64> {
        match (self.feeder_runtime_secs, self.feed_rate_g_per_min) {
            (Some(runtime), Some(rate)) if rate > 0.0 => {
                Some(round_to(runtime / 60.0 * rate / 1000.0, 2))
            }
            _ => None,
        }
    }

    /// Uptime as `"{hours}h {minutes}m"`.
    pub fn uptime_formatted(&self) -> Option<String> {
        self.uptime_secs.map(format_uptime)
    }
}

pub fn format_uptime(secs: i64) -> String {
    let hours = secs.div_euclid(3600);
    let minutes = secs.rem_euclid(3600) / 60;
    format!("{hours}h {minutes}m")
}

fn firmware_version(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => UNKNOWN.to_owned(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn status(value: Value) -> StatusMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("status fixture must be an object"),
        }
    }

    fn sample_status() -> StatusMap {
        status(json!({
            "thermos": [{"t": 52.6}, {"t": 38.0}, {"t": "x"}, {"t": -4.5}],
            "wen0": 41, "wen1": 41,
            "podcm": -1, "podcmp": -1,
            "podcz": 4165, "podczzas": 0, "podczdo": 41538, "podgmin": 260,
            "pod": 0, "co": 1, "cwu1": 0, "cwu2": 0, "cyrk": 0, "ter": 0, "al": 0,
            "time": 83198, "ver": "0.1.0.130.35"
        }))
    }

    fn build(status: &StatusMap) -> Snapshot {
        Snapshot::build_at(status, &DeviceConfig::default(), DateTime::<Utc>::UNIX_EPOCH)
    }

    #[test]
    fn probes_are_indexed_in_array_order() {
        let snap = build(&sample_status());
        assert_eq!(snap.temperature(Probe::Boiler), Some(52.6));
        assert_eq!(snap.temperature(Probe::Return), Some(38.0));
        assert_eq!(snap.temperature(Probe::Feeder), None);
        assert_eq!(snap.temperature(Probe::Outdoor), Some(-4.5));
        assert_eq!(snap.temperature(Probe::T8), None);
        assert_eq!(Probe::T8.index(), PROBE_COUNT - 1);
        assert_eq!(Probe::Exhaust.to_string(), "tSPALINY");
    }

    #[test]
    fn absent_sensor_sentinels_are_none() {
        let snap = build(&sample_status());
        assert_eq!(snap.hopper_level_cm, None);
        assert_eq!(snap.hopper_percent_raw, None);
        assert_eq!(snap.feeder_remaining_secs, Some(0.0));

        let missing = build(&StatusMap::new());
        assert_eq!(missing.feeder_total_secs, None);
        assert_eq!(missing.feed_rate_g_per_min, None);
    }

    #[test]
    fn hopper_percentage_is_derived_from_feeder_time() {
        let snap = build(&status(json!({"podczzas": 600, "podczdo": 1200})));
        assert_eq!(snap.hopper_level_percent(), Some(50.0));

        let snap = build(&status(json!({"podczzas": 49, "podczdo": 400})));
        assert_eq!(snap.hopper_level_percent(), Some(12.2));

        let snap = build(&status(json!({"podczzas": 600, "podczdo": 0})));
        assert_eq!(snap.hopper_level_percent(), None);
    }

    #[test]
    fn direct_hopper_percentage_wins() {
        let snap = build(&status(json!({"podcmp": 72, "podczzas": 600, "podczdo": 1200})));
        assert_eq!(snap.hopper_level_percent(), Some(72.0));
    }

    #[test]
    fn fuel_consumption() {
        let snap = build(&status(json!({"podcz": 120, "podgmin": 300})));
        assert_eq!(snap.fuel_consumption_kg(), Some(0.6));

        let snap = build(&status(json!({"podcz": 120, "podgmin": 0})));
        assert_eq!(snap.fuel_consumption_kg(), None);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(3665), "1h 1m");
        assert_eq!(format_uptime(0), "0h 0m");
        assert_eq!(build(&sample_status()).uptime_formatted().as_deref(), Some("23h 6m"));
        assert_eq!(build(&StatusMap::new()).uptime_formatted(), None);
    }

    #[test]
    fn integer_flags() {
        assert!(build(&status(json!({"co": 1}))).co_pump);
        assert!(!build(&status(json!({"co": 0}))).co_pump);
        assert!(!build(&status(json!({"co": "x"}))).co_pump);
    }

    #[test]
    fn firmware_version_defaults_to_unknown() {
        assert_eq!(build(&sample_status()).firmware_version, "0.1.0.130.35");
        assert_eq!(build(&StatusMap::new()).firmware_version, "unknown");
    }

    #[test]
    fn settings_scale_hysteresis_and_default_selectors() {
        let config = DeviceConfig::parse(
            "PIEC_TRYB=AUTO\nPIEC_HISTEREZA=25\nCWU_HISTEREZA=5\nZAWOR4D-HISTEREZA = 10\nPIEC_ZADANA=x\n",
        );
        let settings = BoilerSettings::from_config(&config);
        assert_eq!(settings.boiler_hysteresis(), Some(2.5));
        assert_eq!(settings.valve_hysteresis(), Some(1.0));
        assert_eq!(settings.hot_water_hysteresis, Some(5.0));
        assert_eq!(settings.summer_hysteresis(), None);
        assert_eq!(settings.boiler_target, None);
        assert_eq!(settings.co_mode, "unknown");
    }

    #[test]
    fn building_twice_is_identical() {
        let raw = sample_status();
        let config = DeviceConfig::parse("PIEC_TRYB=RECZNY\nCO_TRYB=ZIMA\n");
        let a = Snapshot::build_at(&raw, &config, DateTime::<Utc>::UNIX_EPOCH);
        let b = Snapshot::build_at(&raw, &config, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(a, b);
        assert!(!a.is_auto_mode());
        assert!(a.is_heating());
    }
}
