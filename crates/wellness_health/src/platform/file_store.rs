//! A [`HealthStore`] backed by an exported JSON file.
//!
//! The file holds one array of native records per record type:
//!
//! ```json
//! { "Steps": [{"count": 420, "startTime": "...", "endTime": "..."}], "HeartRate": [] }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{HealthStore, PermissionGrant, PermissionRequest, RecordsPage, TimeRangeFilter};
use crate::error::{HealthError, HealthResult};
use crate::normalizer::extract_timestamp;
use crate::types::{RawHealthRecord, RecordType};

type RecordsByType = HashMap<RecordType, Vec<RawHealthRecord>>;

pub struct FileHealthStore {
    path: PathBuf,
    records: RwLock<Option<RecordsByType>>,
}

impl FileHealthStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(None),
        }
    }
}

#[async_trait]
impl HealthStore for FileHealthStore {
    async fn init(&self) -> HealthResult<bool> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let parsed: RecordsByType = serde_json::from_str(&text)?;
        *self.records.write().await = Some(parsed);
        Ok(true)
    }

    /// Exported data carries no access control; everything asked for is granted.
    async fn request_permission(
        &self,
        permissions: &[PermissionRequest],
    ) -> HealthResult<Option<PermissionGrant>> {
        Ok(Some(PermissionGrant {
            granted: permissions.to_vec(),
        }))
    }

    async fn read_records(
        &self,
        record_type: RecordType,
        filter: &TimeRangeFilter,
    ) -> HealthResult<RecordsPage> {
        let range = filter.range().ok_or_else(|| {
            HealthError::Store(format!(
                "invalid time range {}..{}",
                filter.start_time, filter.end_time
            ))
        })?;
        let guard = self.records.read().await;
        let all = guard
            .as_ref()
            .ok_or_else(|| HealthError::Store("file store not initialized".into()))?;
        let records = all
            .get(&record_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| extract_timestamp(r).is_some_and(|at| range.contains(at)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(RecordsPage { records })
    }
}
