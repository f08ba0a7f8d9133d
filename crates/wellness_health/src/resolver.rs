//! Chart data from the device first, the backend second.

use std::sync::Arc;

use wellness_api_client::{GraphDataResponse, WellnessBackend};

use crate::aggregator::to_chart_points_in;
use crate::clock::Clock;
use crate::executor::BackgroundExecutor;
use crate::platform::{HealthAdapter, ranges};
use crate::types::{MetricKind, NormalizedMetricPoint, Period};
use crate::uploader::SyncUploader;

const SYNC_TASK: &str = "health-sync-upload";

pub struct DualSourceResolver {
    adapter: Arc<dyn HealthAdapter>,
    backend: Arc<dyn WellnessBackend>,
    uploader: Arc<SyncUploader>,
    executor: Arc<dyn BackgroundExecutor>,
    clock: Arc<dyn Clock>,
}

impl DualSourceResolver {
    pub fn new(
        adapter: Arc<dyn HealthAdapter>,
        backend: Arc<dyn WellnessBackend>,
        uploader: Arc<SyncUploader>,
        executor: Arc<dyn BackgroundExecutor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            adapter,
            backend,
            uploader,
            executor,
            clock,
        }
    }

    /// Chart points for `kind` over `period`.
    ///
    /// A non-empty on-device series wins and schedules a background sync.
    /// Otherwise the backend's pre-aggregated series is used. Every failure
    /// reads as "no data"; the result is empty when neither source has any.
    pub async fn get_metric_data(&self, kind: MetricKind, period: Period) -> Vec<NormalizedMetricPoint> {
        if !kind.is_supported() {
            tracing::debug!(metric = %kind, "metric has no data source");
            record_source("none");
            return Vec::new();
        }

        let device = self.device_points(kind, period).await;
        if !device.is_empty() {
            self.schedule_sync();
            record_source("device");
            return device;
        }

        let backend = self.backend_points(kind, period).await;
        record_source(if backend.is_empty() { "none" } else { "backend" });
        backend
    }

    /// The backend's textual summary for `kind`, or `None` when it cannot be fetched.
    pub async fn get_metric_summary(&self, kind: MetricKind, period: Period) -> Option<serde_json::Value> {
        if !kind.is_supported() {
            return None;
        }
        match self
            .backend
            .get_health_summary(kind.as_str(), period.graph_mode())
            .await
        {
            Ok(summary) if summary.is_null() => None,
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(metric = %kind, mode = %period.graph_mode(), error = %e, "health summary unavailable");
                None
            }
        }
    }

    async fn device_points(&self, kind: MetricKind, period: Period) -> Vec<NormalizedMetricPoint> {
        let Some(record_type) = kind.record_type() else {
            return Vec::new();
        };
        let now = self.clock.local_now();
        let range = ranges::for_period(period, now);
        match self.adapter.try_fetch_records(record_type, range).await {
            Ok(records) => to_chart_points_in(&records, period, kind, *now.offset()),
            Err(e) => {
                tracing::debug!(metric = %kind, error = %e, "device read failed; falling back to backend");
                Vec::new()
            }
        }
    }

    async fn backend_points(&self, kind: MetricKind, period: Period) -> Vec<NormalizedMetricPoint> {
        match self
            .backend
            .get_graph_data(kind.as_str(), period.graph_mode())
            .await
        {
            Ok(response) => graph_to_points(response),
            Err(e) => {
                tracing::warn!(metric = %kind, error = %e, "backend graph data unavailable");
                Vec::new()
            }
        }
    }

    fn schedule_sync(&self) {
        let uploader = self.uploader.clone();
        self.executor.spawn(
            SYNC_TASK,
            Box::pin(async move {
                if uploader.should_upload().await {
                    uploader.upload().await;
                }
            }),
        );
    }
}

/// Backend points carry no bucket instant; points without a value are dropped.
fn graph_to_points(response: GraphDataResponse) -> Vec<NormalizedMetricPoint> {
    response
        .graph
        .into_iter()
        .filter_map(|point| {
            Some(NormalizedMetricPoint {
                label: point.x,
                value: point.y?,
                timestamp: None,
            })
        })
        .collect()
}

fn record_source(source: &'static str) {
    metrics::counter!("wellness_chart_requests_total", "source" => source).increment(1);
}
