//! Platform health store access.
//!
//! [`HealthStore`] is the capability the device exposes (Health Connect on
//! Android, HealthKit on iOS). [`HealthAdapter`] is what the rest of the
//! pipeline talks to: one implementation per platform, chosen once at startup
//! by [`select_adapter`].
//!
//! Adapters never fail loudly. Initialisation reports `false`, permission
//! requests report `None`, and data fetches report an empty list.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::error::{HealthError, HealthResult};
use crate::types::{MetricKind, RawHealthRecord, RecordType, TimeRange};

pub mod file_store;
pub mod health_connect;
pub mod healthkit;
pub mod ranges;

pub use health_connect::HealthConnectAdapter;
pub use healthkit::HealthKitAdapter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub access_type: AccessType,
    pub record_type: RecordType,
}

/// Read access to the four record kinds the pipeline charts.
pub fn required_permissions() -> Vec<PermissionRequest> {
    RecordType::ALL
        .iter()
        .map(|&record_type| PermissionRequest {
            access_type: AccessType::Read,
            record_type,
        })
        .collect()
}

/// Permissions the store reports as granted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub granted: Vec<PermissionRequest>,
}

impl PermissionGrant {
    pub fn is_granted(&self) -> bool {
        !self.granted.is_empty()
    }

    pub fn covers(&self, record_type: RecordType) -> bool {
        self.granted.iter().any(|p| p.record_type == record_type)
    }
}

/// `{operator: "between", startTime, endTime}` as the store expects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeFilter {
    pub operator: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeRangeFilter {
    pub fn between(range: TimeRange) -> Self {
        Self {
            operator: "between".into(),
            start_time: range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_time: range.end.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Parse the bounds back into a range; `None` if either bound is malformed.
    pub fn range(&self) -> Option<TimeRange> {
        let start = DateTime::parse_from_rfc3339(&self.start_time).ok()?;
        let end = DateTime::parse_from_rfc3339(&self.end_time).ok()?;
        Some(TimeRange::new(start.to_utc(), end.to_utc()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsPage {
    #[serde(default)]
    pub records: Vec<RawHealthRecord>,
}

/// The device health store.
#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// `Ok(false)` when the store exists but is not usable on this device.
    async fn init(&self) -> HealthResult<bool>;

    /// `Ok(None)` when the user dismissed the prompt.
    async fn request_permission(
        &self,
        permissions: &[PermissionRequest],
    ) -> HealthResult<Option<PermissionGrant>>;

    async fn read_records(
        &self,
        record_type: RecordType,
        filter: &TimeRangeFilter,
    ) -> HealthResult<RecordsPage>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "ios") {
            Platform::Ios
        } else {
            Platform::Android
        }
    }
}

impl FromStr for Platform {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            _ => Err(HealthError::Config(format!("unknown platform: {s}"))),
        }
    }
}

/// Build the adapter for `platform` over `store`.
pub fn select_adapter(platform: Platform, store: Arc<dyn HealthStore>) -> Arc<dyn HealthAdapter> {
    match platform {
        Platform::Android => Arc::new(HealthConnectAdapter::new(store)),
        Platform::Ios => Arc::new(HealthKitAdapter::new(store)),
    }
}

/// Uniform access to the platform store. Records come back in their native
/// shape; normalisation happens in the aggregator.
#[async_trait]
pub trait HealthAdapter: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    /// Connect to the store; cheap and `true` once it has succeeded.
    async fn init(&self) -> bool;

    async fn request_all_permissions(&self) -> Option<PermissionGrant>;

    async fn check_all_permissions(&self) -> bool;

    /// Read one record kind, surfacing failures.
    async fn try_fetch_records(
        &self,
        record_type: RecordType,
        range: TimeRange,
    ) -> HealthResult<Vec<RawHealthRecord>>;

    /// Read one record kind; failures are logged and read as "no data".
    async fn fetch_records(&self, record_type: RecordType, range: TimeRange) -> Vec<RawHealthRecord> {
        match self.try_fetch_records(record_type, range).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(%record_type, platform = ?self.platform(), error = %e, "health store read failed");
                Vec::new()
            }
        }
    }

    async fn fetch_metric(&self, kind: MetricKind, range: TimeRange) -> Vec<RawHealthRecord> {
        match kind.record_type() {
            Some(record_type) => self.fetch_records(record_type, range).await,
            None => Vec::new(),
        }
    }

    async fn fetch_steps_data(&self, range: TimeRange) -> Vec<RawHealthRecord> {
        self.fetch_records(RecordType::Steps, range).await
    }

    async fn fetch_heart_rate_data(&self, range: TimeRange) -> Vec<RawHealthRecord> {
        self.fetch_records(RecordType::HeartRate, range).await
    }

    async fn fetch_oxygen_saturation_data(&self, range: TimeRange) -> Vec<RawHealthRecord> {
        self.fetch_records(RecordType::OxygenSaturation, range).await
    }

    async fn fetch_sleep_session_data(&self, range: TimeRange) -> Vec<RawHealthRecord> {
        self.fetch_records(RecordType::SleepSession, range).await
    }

    // === Fixed windows relative to `now` (device local time) ===

    async fn today_steps(&self, now: DateTime<FixedOffset>) -> Vec<RawHealthRecord> {
        self.fetch_steps_data(ranges::today(now)).await
    }

    async fn weekly_steps(&self, now: DateTime<FixedOffset>) -> Vec<RawHealthRecord> {
        self.fetch_steps_data(ranges::weekly(now)).await
    }

    async fn today_heart_rate(&self, now: DateTime<FixedOffset>) -> Vec<RawHealthRecord> {
        self.fetch_heart_rate_data(ranges::today(now)).await
    }

    async fn today_oxygen_saturation(&self, now: DateTime<FixedOffset>) -> Vec<RawHealthRecord> {
        self.fetch_oxygen_saturation_data(ranges::today(now)).await
    }

    async fn today_sleep_data(&self, now: DateTime<FixedOffset>) -> Vec<RawHealthRecord> {
        self.fetch_sleep_session_data(ranges::sleep_window(now)).await
    }
}

/// Shared read path: connect if needed, then ask the store for one kind.
pub(crate) async fn read_from_store(
    store: &dyn HealthStore,
    connected: bool,
    record_type: RecordType,
    range: TimeRange,
) -> HealthResult<Vec<RawHealthRecord>> {
    if !connected {
        return Err(HealthError::Unavailable);
    }
    let filter = TimeRangeFilter::between(range);
    let page = store.read_records(record_type, &filter).await?;
    tracing::debug!(%record_type, count = page.records.len(), "read health records");
    Ok(page.records)
}
