//! Scalar extraction from loosely-shaped platform records.
//!
//! Each metric kind owns an ordered table of probes. A probe looks at one
//! place a value may live; the first probe that finds a number wins.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{MetricKind, RawHealthRecord};

type Probe = fn(&Value) -> Option<f64>;

const HEART_RATE_PROBES: &[Probe] = &[bpm, value, sample_bpm, sample_value];
const SPO2_PROBES: &[Probe] = &[percentage, value, saturation, sample_value];

/// Timestamp fields in priority order.
const TIMESTAMP_FIELDS: &[&str] = &["time", "startTime", "endTime", "timestamp", "startDate"];

/// Reduce a record to the scalar charted for `kind`, or `None` when the
/// record has no recognisable value.
pub fn extract_value(record: &RawHealthRecord, kind: MetricKind) -> Option<f64> {
    let raw = record.as_value();
    if raw.is_null() {
        return None;
    }
    match kind {
        MetricKind::Steps => Some(number(raw.get("count")).unwrap_or(0.0)),
        MetricKind::HeartRate => first_match(raw, HEART_RATE_PROBES),
        MetricKind::Spo2 => first_match(raw, SPO2_PROBES).map(normalize_spo2),
        MetricKind::Sleep => sleep_minutes(record),
        MetricKind::Mood | MetricKind::Calories => None,
    }
}

/// Bring an oxygen saturation reading to a fraction.
///
/// Values above 1.0 are taken as percentages. A reading still above 1.0 after
/// one division is divided again and capped at 1.0; a bad sensor value above
/// 100% and a doubly-scaled percentage look the same here.
pub fn normalize_spo2(reading: f64) -> f64 {
    if reading <= 1.0 {
        return reading;
    }
    let fraction = reading / 100.0;
    if fraction > 1.0 {
        (fraction / 100.0).min(1.0)
    } else {
        fraction
    }
}

/// Session length in minutes, never negative. `None` unless both bounds parse.
pub fn sleep_minutes(record: &RawHealthRecord) -> Option<f64> {
    let start = record.get("startTime").and_then(parse_instant)?;
    let end = record.get("endTime").and_then(parse_instant)?;
    let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
    Some(minutes.max(0.0))
}

/// The record's representative instant.
pub fn extract_timestamp(record: &RawHealthRecord) -> Option<DateTime<Utc>> {
    TIMESTAMP_FIELDS
        .iter()
        .find_map(|field| record.get(field).filter(|v| !v.is_null()))
        .and_then(parse_instant)
}

/// RFC 3339 strings or epoch milliseconds.
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn first_match(raw: &Value, probes: &[Probe]) -> Option<f64> {
    probes.iter().find_map(|probe| probe(raw))
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn first_sample(raw: &Value) -> Option<&Value> {
    raw.get("samples")?.as_array()?.first()
}

fn bpm(raw: &Value) -> Option<f64> {
    number(raw.get("beatsPerMinute"))
}

fn value(raw: &Value) -> Option<f64> {
    number(raw.get("value"))
}

fn percentage(raw: &Value) -> Option<f64> {
    number(raw.get("percentage"))
}

fn saturation(raw: &Value) -> Option<f64> {
    number(raw.get("saturation"))
}

fn sample_bpm(raw: &Value) -> Option<f64> {
    first_sample(raw).and_then(bpm)
}

fn sample_value(raw: &Value) -> Option<f64> {
    first_sample(raw).and_then(value)
}
