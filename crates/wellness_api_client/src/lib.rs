//! `WellnessBackend` trait and the payload types of the wellness REST backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod http_client;
pub mod retry;

/// Versioned prefix shared by every backend route.
pub const API_PREFIX: &str = "/api/v2";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unauthorized: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decoding response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn from_status(status: u16, body: String) -> Self {
        BackendError::Status { status, body }
    }

    /// Transport failures and 5xx answers are worth another attempt; anything
    /// the server rejected on its merits is not.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            BackendError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Aggregation window understood by the graph-data and summary endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl GraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphMode::Daily => "daily",
            GraphMode::Weekly => "weekly",
            GraphMode::Monthly => "monthly",
            GraphMode::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for GraphMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphPoint {
    #[serde(deserialize_with = "deserialize_label")]
    pub x: String,
    #[serde(default)]
    pub y: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphDataResponse {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub graph: Vec<GraphPoint>,
}

/// Body of `POST /health/save`: one timestamp-keyed map per metric.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthSavePayload {
    pub steps: BTreeMap<String, f64>,
    pub heart_rate: BTreeMap<String, f64>,
    pub spo2: BTreeMap<String, f64>,
    pub sleep: BTreeMap<String, f64>,
}

impl HealthSavePayload {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
            && self.heart_rate.is_empty()
            && self.spo2.is_empty()
            && self.sleep.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len() + self.heart_rate.len() + self.spo2.len() + self.sleep.len()
    }
}

/// Starts a journal conversation when `conversation_id` is `None`, continues it otherwise.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationEdit {
    pub conversation_id: String,
    pub message_index: u32,
    pub message: String,
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number label, got {other}"
        ))),
    }
}

fn deserialize_null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
pub trait WellnessBackend: Send + Sync + 'static {
    // === Health data ===

    /// Chart series for one metric, pre-aggregated by the backend.
    async fn get_graph_data(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<GraphDataResponse, BackendError>;

    /// The `summary` member of the health summary endpoint (null when absent).
    async fn get_health_summary(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<serde_json::Value, BackendError>;

    /// Upsert full-resolution on-device readings.
    async fn save_health_data(
        &self,
        payload: &HealthSavePayload,
    ) -> Result<serde_json::Value, BackendError>;

    // === Journal ===

    async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<serde_json::Value, BackendError>;

    async fn edit_conversation(
        &self,
        edit: &ConversationEdit,
    ) -> Result<serde_json::Value, BackendError>;

    async fn get_journal_by_day(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<serde_json::Value, BackendError>;

    async fn get_monthly_summary(&self) -> Result<serde_json::Value, BackendError>;
}
