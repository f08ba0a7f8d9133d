//! iOS-style adapter over a HealthKit store.
//!
//! HealthKit asks for authorization as part of initialisation and cannot tell
//! an app whether read access was granted, so "has permissions" here means
//! "initialisation went through".

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{
    HealthAdapter, HealthStore, PermissionGrant, Platform, read_from_store, required_permissions,
};
use crate::error::HealthResult;
use crate::types::{RawHealthRecord, RecordType, TimeRange};

pub struct HealthKitAdapter {
    store: Arc<dyn HealthStore>,
    initialized: AtomicBool,
}

impl HealthKitAdapter {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            store,
            initialized: AtomicBool::new(false),
        }
    }

    async fn authorize(&self) -> Option<PermissionGrant> {
        match self.store.request_permission(&required_permissions()).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(error = %e, "healthkit authorization failed");
                None
            }
        }
    }
}

#[async_trait]
impl HealthAdapter for HealthKitAdapter {
    fn platform(&self) -> Platform {
        Platform::Ios
    }

    async fn init(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        match self.store.init().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("healthkit is not available on this device");
                return false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "healthkit initialization failed");
                return false;
            }
        }
        if self.authorize().await.is_none() {
            return false;
        }
        self.initialized.store(true, Ordering::Release);
        tracing::debug!("healthkit initialized");
        true
    }

    async fn request_all_permissions(&self) -> Option<PermissionGrant> {
        if !self.init().await {
            return None;
        }
        Some(PermissionGrant {
            granted: required_permissions(),
        })
    }

    async fn check_all_permissions(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
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
