//! HTTP client implementation for the wellness backend.
//!
//! This module provides a reqwest-based implementation of the [`WellnessBackend`](crate::WellnessBackend) trait.

use std::sync::Arc;

use crate::auth::{StaticTokenProvider, TokenProvider, requires_auth};
use crate::{
    API_PREFIX, BackendError, ConversationEdit, ConversationRequest, GraphDataResponse, GraphMode,
    HealthSavePayload, WellnessBackend,
};
use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};

const HEALTH_BASE: &str = "/health_data/health";
const JOURNAL_BASE: &str = "/journal/journal";

/// Client for the wellness REST API using reqwest.
#[derive(Clone)]
pub struct ReqwestWellnessClient {
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ReqwestWellnessClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestWellnessClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ReqwestWellnessClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - Origin of the backend (e.g., "https://api.example.com"); the `/api/v2` prefix is added per route
    /// * `tokens` - Source of the bearer token attached to authenticated routes
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>) -> Self {
        let client = reqwest::Client::builder()
            .gzip(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            client,
        }
    }

    /// Convenience constructor for a fixed (or absent) token.
    pub fn with_token(base_url: &str, token: Option<SecretString>) -> Self {
        Self::new(base_url, Arc::new(StaticTokenProvider::new(token)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, route: &str) -> (String, String) {
        let path = format!("{API_PREFIX}{route}");
        (format!("{}{}", self.base_url, path), path)
    }

    /// Build a request, attaching the bearer token unless the route is public.
    async fn request(&self, method: Method, route: &str) -> reqwest::RequestBuilder {
        let (url, path) = self.url_for(route);
        let builder = self.client.request(method, url);
        if !requires_auth(&path) {
            return builder;
        }
        match self.tokens.bearer_token().await {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => {
                tracing::debug!(%path, "no bearer token available; sending unauthenticated");
                builder
            }
        }
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let resp = request.send().await?;
        self.handle_response(resp).await
    }

    /// Handle a response, converting status codes to appropriate errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, BackendError> {
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        // Read body as text first so decode failures can quote what came back.
        let text = resp.text().await?;
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str::<T>(body).map_err(|e| {
            let body_snippet: String = text.chars().take(256).collect();
            BackendError::Decode(format!("{e} - body: {body_snippet}"))
        })
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> BackendError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();

        match status {
            404 => BackendError::NotFound(body_snippet),
            401 | 403 => BackendError::Auth(body_snippet),
            422 => BackendError::InvalidInput(body_snippet),
            _ => BackendError::from_status(status, body_snippet),
        }
    }
}

#[async_trait]
impl WellnessBackend for ReqwestWellnessClient {
    async fn get_graph_data(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<GraphDataResponse, BackendError> {
        let route = format!("{HEALTH_BASE}/graph-data");
        let qp = [("metric", metric), ("mode", mode.as_str())];
        let req = self.request(Method::GET, &route).await.query(&qp);
        self.execute_json(req).await
    }

    async fn get_health_summary(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<serde_json::Value, BackendError> {
        #[derive(serde::Deserialize)]
        struct SummaryPayload {
            #[serde(default)]
            summary: serde_json::Value,
        }

        let route = format!("{HEALTH_BASE}/summary");
        let qp = [("metric", metric), ("mode", mode.as_str())];
        let req = self.request(Method::GET, &route).await.query(&qp);
        let payload: Option<SummaryPayload> = self.execute_json(req).await?;
        Ok(payload.map(|p| p.summary).unwrap_or_default())
    }

    async fn save_health_data(
        &self,
        payload: &HealthSavePayload,
    ) -> Result<serde_json::Value, BackendError> {
        let route = format!("{HEALTH_BASE}/save");
        let req = self.request(Method::POST, &route).await.json(payload);
        self.execute_json(req).await
    }

    async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<serde_json::Value, BackendError> {
        if request.message.trim().is_empty() {
            return Err(BackendError::InvalidInput(
                "conversation message must not be empty".into(),
            ));
        }
        let route = format!("{JOURNAL_BASE}/conversation");
        let req = self.request(Method::POST, &route).await.json(request);
        self.execute_json(req).await
    }

    async fn edit_conversation(
        &self,
        edit: &ConversationEdit,
    ) -> Result<serde_json::Value, BackendError> {
        let route = format!("{JOURNAL_BASE}/conversation");
        let req = self.request(Method::PATCH, &route).await.json(edit);
        self.execute_json(req).await
    }

    async fn get_journal_by_day(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<serde_json::Value, BackendError> {
        let route = format!("{JOURNAL_BASE}/by-day");
        let day = date.format("%Y-%m-%d").to_string();
        let req = self
            .request(Method::GET, &route)
            .await
            .query(&[("date", day.as_str())]);
        self.execute_json(req).await
    }

    async fn get_monthly_summary(&self) -> Result<serde_json::Value, BackendError> {
        let route = format!("{JOURNAL_BASE}/summary/month");
        let req = self.request(Method::GET, &route).await;
        self.execute_json(req).await
    }
}
