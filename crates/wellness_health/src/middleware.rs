//! Logging layer around a [`WellnessBackend`].

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::debug;
use wellness_api_client::{
    BackendError, ConversationEdit, ConversationRequest, GraphDataResponse, GraphMode,
    HealthSavePayload, WellnessBackend,
};

/// Wraps a backend and logs each call's start, outcome and duration.
#[derive(Clone)]
pub struct LoggingBackend<C: WellnessBackend> {
    inner: Arc<C>,
}

impl<C: WellnessBackend> LoggingBackend<C> {
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    async fn with_logging<F, Fut, T>(&self, operation: F, name: &str) -> Result<T, BackendError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: std::future::Future<Output = Result<T, BackendError>>,
    {
        let start = Instant::now();
        debug!(operation = name, "backend call started");

        let result = operation(self.inner.clone()).await;

        let elapsed = start.elapsed();
        match &result {
            Ok(_) => debug!(operation = name, ?elapsed, "backend call completed"),
            Err(e) => debug!(operation = name, ?elapsed, error = %e, "backend call failed"),
        }
        result
    }
}

#[async_trait::async_trait]
impl<C: WellnessBackend> WellnessBackend for LoggingBackend<C> {
    async fn get_graph_data(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<GraphDataResponse, BackendError> {
        self.with_logging(
            |client| async move { client.get_graph_data(metric, mode).await },
            "get_graph_data",
        )
        .await
    }

    async fn get_health_summary(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<serde_json::Value, BackendError> {
        self.with_logging(
            |client| async move { client.get_health_summary(metric, mode).await },
            "get_health_summary",
        )
        .await
    }

    async fn save_health_data(
        &self,
        payload: &HealthSavePayload,
    ) -> Result<serde_json::Value, BackendError> {
        let name = format!("save_health_data({} entries)", payload.len());
        self.with_logging(
            |client| async move { client.save_health_data(payload).await },
            &name,
        )
        .await
    }

    async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<serde_json::Value, BackendError> {
        self.with_logging(
            |client| async move { client.start_conversation(request).await },
            "start_conversation",
        )
        .await
    }

    async fn edit_conversation(
        &self,
        edit: &ConversationEdit,
    ) -> Result<serde_json::Value, BackendError> {
        self.with_logging(
            |client| async move { client.edit_conversation(edit).await },
            "edit_conversation",
        )
        .await
    }

    async fn get_journal_by_day(&self, date: NaiveDate) -> Result<serde_json::Value, BackendError> {
        self.with_logging(
            |client| async move { client.get_journal_by_day(date).await },
            "get_journal_by_day",
        )
        .await
    }

    async fn get_monthly_summary(&self) -> Result<serde_json::Value, BackendError> {
        self.with_logging(
            |client| async move { client.get_monthly_summary().await },
            "get_monthly_summary",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;
    use serde_json::json;

    #[tokio::test]
    async fn passes_results_through() {
        let backend = LoggingBackend::new(MockBackend::default().with_graph(vec![("Mon", Some(3.0))]));
        let graph = backend
            .get_graph_data("steps", GraphMode::Weekly)
            .await
            .unwrap();
        assert_eq!(graph.graph.len(), 1);
        assert_eq!(backend.inner.graph_requests()[0].0, "steps");

        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let journal = backend.get_journal_by_day(day).await.unwrap();
        assert_eq!(journal["date"], "2024-01-15");
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let backend = LoggingBackend::new(MockBackend::default().failing_save());
        let err = backend
            .save_health_data(&HealthSavePayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));

        let summary = LoggingBackend::new(MockBackend::default().with_summary(json!("ok")))
            .get_health_summary("sleep", GraphMode::Daily)
            .await
            .unwrap();
        assert_eq!(summary, json!("ok"));
    }
}
