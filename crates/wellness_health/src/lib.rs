//! Health-data normalization and aggregation pipeline.
//!
//! Raw records from the device health store are normalized to scalars,
//! bucketed into chart points, and served ahead of the backend's own
//! aggregates. Whenever on-device data is served, a throttled background
//! upload mirrors the last week of readings to the backend.

use std::sync::Arc;

use chrono::TimeDelta;
use wellness_api_client::WellnessBackend;

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod middleware;
pub mod normalizer;
pub mod platform;
pub mod resolver;
pub mod throttle;
pub mod types;
pub mod uploader;

#[cfg(test)]
mod test_utils;

pub use aggregator::{to_chart_points, to_chart_points_in};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{HealthError, HealthResult};
pub use executor::{BackgroundExecutor, BackgroundTask, TokioExecutor};
pub use middleware::LoggingBackend;
pub use platform::{HealthAdapter, HealthStore, Platform, select_adapter};
pub use resolver::DualSourceResolver;
pub use throttle::{FileThrottleStore, MemoryThrottleStore, ThrottleStore};
pub use types::{MetricKind, NormalizedMetricPoint, Period, RawHealthRecord};
pub use uploader::SyncUploader;

/// The wired pipeline: one adapter and one uploader shared by the resolver.
pub struct Pipeline {
    pub adapter: Arc<dyn HealthAdapter>,
    pub uploader: Arc<SyncUploader>,
    pub resolver: DualSourceResolver,
}

impl Pipeline {
    pub fn new(
        platform: Platform,
        store: Arc<dyn HealthStore>,
        backend: Arc<dyn WellnessBackend>,
        throttle: Arc<dyn ThrottleStore>,
        clock: Arc<dyn Clock>,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Self {
        Self::with_upload_interval(
            platform,
            store,
            backend,
            throttle,
            clock,
            executor,
            uploader::DEFAULT_UPLOAD_INTERVAL,
        )
    }

    pub fn with_upload_interval(
        platform: Platform,
        store: Arc<dyn HealthStore>,
        backend: Arc<dyn WellnessBackend>,
        throttle: Arc<dyn ThrottleStore>,
        clock: Arc<dyn Clock>,
        executor: Arc<dyn BackgroundExecutor>,
        interval: TimeDelta,
    ) -> Self {
        let adapter = select_adapter(platform, store);
        let uploader = Arc::new(
            SyncUploader::new(adapter.clone(), backend.clone(), throttle, clock.clone())
                .with_interval(interval),
        );
        let resolver =
            DualSourceResolver::new(adapter.clone(), backend, uploader.clone(), executor, clock);
        Self {
            adapter,
            uploader,
            resolver,
        }
    }
}
