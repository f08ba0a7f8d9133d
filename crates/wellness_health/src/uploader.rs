//! Pushes recent on-device readings to the backend at full resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{SecondsFormat, TimeDelta};
use wellness_api_client::retry::RetryPolicy;
use wellness_api_client::{BackendError, HealthSavePayload, WellnessBackend};

use crate::clock::Clock;
use crate::normalizer::{extract_timestamp, extract_value};
use crate::platform::{HealthAdapter, ranges};
use crate::throttle::ThrottleStore;
use crate::types::{MetricKind, RawHealthRecord};

pub const DEFAULT_UPLOAD_INTERVAL: TimeDelta = TimeDelta::hours(4);
const UPLOAD_LOOKBACK_DAYS: i64 = 7;

pub struct SyncUploader {
    adapter: Arc<dyn HealthAdapter>,
    backend: Arc<dyn WellnessBackend>,
    throttle: Arc<dyn ThrottleStore>,
    clock: Arc<dyn Clock>,
    interval: TimeDelta,
    retry: RetryPolicy,
}

impl SyncUploader {
    pub fn new(
        adapter: Arc<dyn HealthAdapter>,
        backend: Arc<dyn WellnessBackend>,
        throttle: Arc<dyn ThrottleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            adapter,
            backend,
            throttle,
            clock,
            interval: DEFAULT_UPLOAD_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_interval(mut self, interval: TimeDelta) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Due when no marker is stored, the marker is unreadable, or more than
    /// the upload interval has passed since it.
    pub async fn should_upload(&self) -> bool {
        match self.throttle.last_upload().await {
            Ok(Some(last)) => self.clock.now() - last > self.interval,
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(error = %e, "could not read last upload marker; treating upload as due");
                true
            }
        }
    }

    /// Upload the last seven days of readings. `true` only when the backend
    /// accepted them; every other outcome is `false`.
    pub async fn upload(&self) -> bool {
        if !self.adapter.check_all_permissions().await {
            tracing::debug!("health permissions unavailable; skipping sync upload");
            record_outcome("skipped");
            return false;
        }

        let payload = self.collect_payload().await;
        if payload.is_empty() {
            tracing::debug!("no on-device readings to upload");
            record_outcome("skipped");
            return false;
        }

        let result = self
            .retry
            .retry_if(
                || self.backend.save_health_data(&payload),
                BackendError::is_transient,
            )
            .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, entries = payload.len(), "health sync upload failed");
            record_outcome("failed");
            return false;
        }

        if let Err(e) = self.throttle.set_last_upload(self.clock.now()).await {
            tracing::warn!(error = %e, "could not persist last upload marker");
        }
        tracing::info!(entries = payload.len(), "health data uploaded");
        record_outcome("ok");
        true
    }

    /// Read the four record kinds concurrently; a failed kind contributes nothing.
    pub async fn collect_payload(&self) -> HealthSavePayload {
        let range = ranges::last_days(self.clock.local_now(), UPLOAD_LOOKBACK_DAYS);
        let (steps, heart_rate, spo2, sleep) = tokio::join!(
            self.adapter.fetch_steps_data(range),
            self.adapter.fetch_heart_rate_data(range),
            self.adapter.fetch_oxygen_saturation_data(range),
            self.adapter.fetch_sleep_session_data(range),
        );
        build_payload(&steps, &heart_rate, &spo2, &sleep)
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("wellness_sync_uploads_total", "outcome" => outcome).increment(1);
}

/// One entry per record, keyed by the record's ISO-8601 instant. Records
/// sharing an instant collapse to the last one.
pub fn build_payload(
    steps: &[RawHealthRecord],
    heart_rate: &[RawHealthRecord],
    spo2: &[RawHealthRecord],
    sleep: &[RawHealthRecord],
) -> HealthSavePayload {
    HealthSavePayload {
        steps: keyed(steps, MetricKind::Steps),
        heart_rate: keyed(heart_rate, MetricKind::HeartRate),
        spo2: keyed(spo2, MetricKind::Spo2),
        sleep: keyed(sleep, MetricKind::Sleep),
    }
}

fn keyed(records: &[RawHealthRecord], kind: MetricKind) -> BTreeMap<String, f64> {
    records
        .iter()
        .filter_map(|record| {
            let at = extract_timestamp(record)?;
            let value = upload_value(record, kind)?;
            Some((at.to_rfc3339_opts(SecondsFormat::Millis, true), value))
        })
        .collect()
}

/// Steps as a count, heart rate in bpm, SpO2 as a percentage, sleep in minutes.
fn upload_value(record: &RawHealthRecord, kind: MetricKind) -> Option<f64> {
    match kind {
        MetricKind::Spo2 => extract_value(record, kind).map(|f| (f * 1000.0).round() / 10.0),
        _ => extract_value(record, kind),
    }
}
