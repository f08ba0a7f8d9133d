//! Persisted "last health upload" marker.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::Mutex;

use crate::error::{HealthError, HealthResult};

/// Key the marker is stored under.
pub const LAST_UPLOAD_KEY: &str = "last_health_upload";

#[async_trait]
pub trait ThrottleStore: Send + Sync + 'static {
    async fn last_upload(&self) -> HealthResult<Option<DateTime<Utc>>>;

    async fn set_last_upload(&self, at: DateTime<Utc>) -> HealthResult<()>;

    async fn clear(&self) -> HealthResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryThrottleStore {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThrottleStore for MemoryThrottleStore {
    async fn last_upload(&self) -> HealthResult<Option<DateTime<Utc>>> {
        Ok(*self.last.lock().await)
    }

    async fn set_last_upload(&self, at: DateTime<Utc>) -> HealthResult<()> {
        *self.last.lock().await = Some(at);
        Ok(())
    }

    async fn clear(&self) -> HealthResult<()> {
        *self.last.lock().await = None;
        Ok(())
    }
}

/// Key-value file holding `{"last_health_upload": "<rfc3339>"}`.
#[derive(Debug, Clone)]
pub struct FileThrottleStore {
    path: PathBuf,
}

impl FileThrottleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> HealthResult<serde_json::Map<String, serde_json::Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(serde_json::Map::new()),
            Ok(text) => match serde_json::from_str(&text)? {
                serde_json::Value::Object(map) => Ok(map),
                _ => Err(HealthError::Storage(format!(
                    "{} does not hold a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: serde_json::Map<String, serde_json::Value>) -> HealthResult<()> {
        let body = serde_json::to_vec_pretty(&serde_json::Value::Object(map))?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl ThrottleStore for FileThrottleStore {
    async fn last_upload(&self) -> HealthResult<Option<DateTime<Utc>>> {
        let map = self.read_map().await?;
        let Some(raw) = map.get(LAST_UPLOAD_KEY).and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| HealthError::Storage(format!("bad {LAST_UPLOAD_KEY} value {raw:?}: {e}")))
    }

    async fn set_last_upload(&self, at: DateTime<Utc>) -> HealthResult<()> {
        // other keys survive; a corrupt file is replaced
        let mut map = self.read_map().await.unwrap_or_default();
        map.insert(
            LAST_UPLOAD_KEY.to_string(),
            serde_json::Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.write_map(map).await
    }

    async fn clear(&self) -> HealthResult<()> {
        let mut map = match self.read_map().await {
            Ok(map) => map,
            Err(_) => {
                tokio::fs::remove_file(&self.path)
                    .await
                    .or_else(ignore_missing)?;
                return Ok(());
            }
        };
        if map.remove(LAST_UPLOAD_KEY).is_none() {
            return Ok(());
        }
        self.write_map(map).await
    }
}

fn ignore_missing(e: std::io::Error) -> std::io::Result<()> {
    if e.kind() == std::io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(e)
    }
}
