use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wellness_api_client::GraphMode;

use crate::error::HealthError;

/// A chartable metric. `Mood` and `Calories` are recognised but have no data source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Steps,
    HeartRate,
    Spo2,
    Sleep,
    Mood,
    Calories,
}

/// How the values inside one bucket collapse to a single point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl MetricKind {
    pub const SUPPORTED: [MetricKind; 4] = [
        MetricKind::Steps,
        MetricKind::HeartRate,
        MetricKind::Spo2,
        MetricKind::Sleep,
    ];

    /// Name used on the backend wire (`metric=` query parameter).
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::HeartRate => "heartRate",
            MetricKind::Spo2 => "spo2",
            MetricKind::Sleep => "sleep",
            MetricKind::Mood => "mood",
            MetricKind::Calories => "calories",
        }
    }

    pub fn is_supported(&self) -> bool {
        self.record_type().is_some()
    }

    pub fn record_type(&self) -> Option<RecordType> {
        match self {
            MetricKind::Steps => Some(RecordType::Steps),
            MetricKind::HeartRate => Some(RecordType::HeartRate),
            MetricKind::Spo2 => Some(RecordType::OxygenSaturation),
            MetricKind::Sleep => Some(RecordType::SleepSession),
            MetricKind::Mood | MetricKind::Calories => None,
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            MetricKind::HeartRate | MetricKind::Spo2 => Aggregation::Mean,
            _ => Aggregation::Sum,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "steps" => Ok(MetricKind::Steps),
            "heartrate" | "hr" => Ok(MetricKind::HeartRate),
            "spo2" | "oxygensaturation" => Ok(MetricKind::Spo2),
            "sleep" => Ok(MetricKind::Sleep),
            "mood" => Ok(MetricKind::Mood),
            "calories" => Ok(MetricKind::Calories),
            _ => Err(HealthError::Config(format!("unknown metric: {s}"))),
        }
    }
}

/// Width of one chart bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Day => Granularity::Hour,
            Period::Week | Period::Month => Granularity::Day,
            Period::Year => Granularity::Month,
        }
    }

    /// Days of history fetched for the period; `Day` means "since local midnight".
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            Period::Day => None,
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Year => Some(365),
        }
    }

    pub fn graph_mode(&self) -> GraphMode {
        match self {
            Period::Day => GraphMode::Daily,
            Period::Week => GraphMode::Weekly,
            Period::Month => GraphMode::Monthly,
            Period::Year => GraphMode::Yearly,
        }
    }
}

impl FromStr for Period {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Period::Day),
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            "year" | "yearly" => Ok(Period::Year),
            _ => Err(HealthError::Config(format!("unknown period: {s}"))),
        }
    }
}

/// Record kinds the platform health store can be asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Steps,
    HeartRate,
    OxygenSaturation,
    SleepSession,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Steps,
        RecordType::HeartRate,
        RecordType::OxygenSaturation,
        RecordType::SleepSession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Steps => "Steps",
            RecordType::HeartRate => "HeartRate",
            RecordType::OxygenSaturation => "OxygenSaturation",
            RecordType::SleepSession => "SleepSession",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record exactly as the platform store returned it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawHealthRecord(pub serde_json::Value);

impl RawHealthRecord {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for RawHealthRecord {
    fn from(value: serde_json::Value) -> Self {
        RawHealthRecord(value)
    }
}

/// One chart point. `timestamp` is the bucket start for on-device data and
/// absent for points that came pre-aggregated from the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetricPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Inclusive instant range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}
