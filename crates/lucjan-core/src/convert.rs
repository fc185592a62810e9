// ── Raw-to-domain value conversions ──
//
// The controller's JSON is loosely typed: the same field may arrive as a
// number, a numeric string, or be missing entirely depending on firmware.
// These helpers degrade per value to `None`/`false` instead of failing a
// whole snapshot.

use serde_json::Value;

/// Numbers and numeric strings as `f64`; anything else is `None`.
pub(crate) fn to_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Like [`to_f64`], but negative readings mean "sensor absent".
pub(crate) fn to_non_negative(value: Option<&Value>) -> Option<f64> {
    to_f64(value).filter(|v| *v >= 0.0)
}

/// Integers, integral strings and fractional numbers (truncated toward zero).
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn to_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// 0/1 integer flags. Anything that is not an integer reads as `false`.
pub(crate) fn to_flag(value: Option<&Value>) -> bool {
    to_i64(value).is_some_and(|v| v != 0)
}

/// Numeric `config.txt` value.
pub(crate) fn parse_f64(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Round to a fixed number of decimal places, ties to even.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
