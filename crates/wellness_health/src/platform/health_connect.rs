//! Android-style adapter over a Health Connect store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{
    HealthAdapter, HealthStore, PermissionGrant, Platform, read_from_store, required_permissions,
};
use crate::error::HealthResult;
use crate::types::{RawHealthRecord, RecordType, TimeRange};

pub struct HealthConnectAdapter {
    store: Arc<dyn HealthStore>,
    initialized: AtomicBool,
}

impl HealthConnectAdapter {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            store,
            initialized: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl HealthAdapter for HealthConnectAdapter {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn init(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        match self.store.init().await {
            Ok(true) => {
                self.initialized.store(true, Ordering::Release);
                tracing::debug!("health connect initialized");
                true
            }
            Ok(false) => {
                tracing::warn!("health connect is not available on this device");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "health connect initialization failed");
                false
            }
        }
    }

    async fn request_all_permissions(&self) -> Option<PermissionGrant> {
        if !self.init().await {
            return None;
        }
        match self.store.request_permission(&required_permissions()).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(error = %e, "health connect permission request failed");
                None
            }
        }
    }

    /// Health Connect has no silent status query here, so this asks again.
    async fn check_all_permissions(&self) -> bool {
        self.request_all_permissions()
            .await
            .is_some_and(|grant| grant.is_granted())
    }

    async fn try_fetch_records(
        &self,
        record_type: RecordType,
        range: TimeRange,
    ) -> HealthResult<Vec<RawHealthRecord>> {
        let connected = self.init().await;
        read_from_store(self.store.as_ref(), connected, record_type, range).await
    }
}
