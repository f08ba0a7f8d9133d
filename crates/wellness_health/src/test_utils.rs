//! Shared mocks for the store, adapter, backend and executor seams used by unit tests.
#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use wellness_api_client::{
    BackendError, ConversationEdit, ConversationRequest, GraphDataResponse, GraphMode, GraphPoint,
    HealthSavePayload, WellnessBackend,
};

use crate::error::{HealthError, HealthResult};
use crate::executor::{BackgroundExecutor, BackgroundTask};
use crate::platform::{
    HealthAdapter, HealthStore, PermissionGrant, PermissionRequest, Platform, RecordsPage,
    TimeRangeFilter,
};
use crate::types::{RawHealthRecord, RecordType, TimeRange};

pub fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// 2024-01-15, midnight to 23:59:59.999 UTC.
pub fn today_range() -> TimeRange {
    TimeRange::new(
        instant("2024-01-15T00:00:00Z"),
        instant("2024-01-15T23:59:59.999Z"),
    )
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// === Store ===

enum InitBehaviour {
    Ready,
    Unavailable,
    Fails,
}

/// Scripted device store. By default it initializes, grants whatever is
/// asked for and holds no records.
pub struct MockStore {
    init: InitBehaviour,
    // `None` echoes the request back as granted
    permission: Option<Option<PermissionGrant>>,
    records: HashMap<RecordType, Vec<RawHealthRecord>>,
    read_errors: HashSet<RecordType>,
    init_calls: AtomicUsize,
    permission_calls: AtomicUsize,
    reads: Mutex<Vec<(RecordType, TimeRangeFilter)>>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            init: InitBehaviour::Ready,
            permission: None,
            records: HashMap::new(),
            read_errors: HashSet::new(),
            init_calls: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
            reads: Mutex::new(Vec::new()),
        }
    }
}

impl MockStore {
    pub fn unavailable() -> Self {
        Self {
            init: InitBehaviour::Unavailable,
            ..Self::default()
        }
    }

    pub fn with_init_error(mut self) -> Self {
        self.init = InitBehaviour::Fails;
        self
    }

    pub fn with_permission(mut self, grant: Option<PermissionGrant>) -> Self {
        self.permission = Some(grant);
        self
    }

    pub fn with_records(mut self, record_type: RecordType, records: Vec<Value>) -> Self {
        self.records
            .insert(record_type, records.into_iter().map(RawHealthRecord).collect());
        self
    }

    pub fn with_read_error(mut self, record_type: RecordType) -> Self {
        self.read_errors.insert(record_type);
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> Vec<(RecordType, TimeRangeFilter)> {
        lock(&self.reads).clone()
    }
}

#[async_trait]
impl HealthStore for MockStore {
    async fn init(&self) -> HealthResult<bool> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        match self.init {
            InitBehaviour::Ready => Ok(true),
            InitBehaviour::Unavailable => Ok(false),
            InitBehaviour::Fails => Err(HealthError::Store("sdk not installed".into())),
        }
    }

    async fn request_permission(
        &self,
        permissions: &[PermissionRequest],
    ) -> HealthResult<Option<PermissionGrant>> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.permission {
            Some(scripted) => scripted.clone(),
            None => Some(PermissionGrant {
                granted: permissions.to_vec(),
            }),
        })
    }

    async fn read_records(
        &self,
        record_type: RecordType,
        filter: &TimeRangeFilter,
    ) -> HealthResult<RecordsPage> {
        lock(&self.reads).push((record_type, filter.clone()));
        if self.read_errors.contains(&record_type) {
            return Err(HealthError::Store(format!("{record_type} read failed")));
        }
        Ok(RecordsPage {
            records: self.records.get(&record_type).cloned().unwrap_or_default(),
        })
    }
}

// === Adapter ===

/// Adapter with fixed per-kind responses. Ranges are recorded, not applied.
pub struct MockAdapter {
    permitted: bool,
    records: HashMap<RecordType, Vec<RawHealthRecord>>,
    failures: HashSet<RecordType>,
    requested: Mutex<Vec<(RecordType, TimeRange)>>,
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self {
            permitted: true,
            records: HashMap::new(),
            failures: HashSet::new(),
            requested: Mutex::new(Vec::new()),
        }
    }
}

impl MockAdapter {
    pub fn with_records(mut self, record_type: RecordType, records: Vec<Value>) -> Self {
        self.records
            .insert(record_type, records.into_iter().map(RawHealthRecord).collect());
        self
    }

    pub fn with_failure(mut self, record_type: RecordType) -> Self {
        self.failures.insert(record_type);
        self
    }

    /// Every read fails, as when the store is missing.
    pub fn failing() -> Self {
        Self {
            failures: RecordType::ALL.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn without_permissions(mut self) -> Self {
        self.permitted = false;
        self
    }

    pub fn requested_ranges(&self) -> Vec<(RecordType, TimeRange)> {
        lock(&self.requested).clone()
    }

    pub fn fetch_calls(&self) -> usize {
        lock(&self.requested).len()
    }
}

#[async_trait]
impl HealthAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        Platform::Android
    }

    async fn init(&self) -> bool {
        true
    }

    async fn request_all_permissions(&self) -> Option<PermissionGrant> {
        self.permitted.then(|| PermissionGrant {
            granted: crate::platform::required_permissions(),
        })
    }

    async fn check_all_permissions(&self) -> bool {
        self.permitted
    }

    async fn try_fetch_records(
        &self,
        record_type: RecordType,
        range: TimeRange,
    ) -> HealthResult<Vec<RawHealthRecord>> {
        lock(&self.requested).push((record_type, range));
        if self.failures.contains(&record_type) {
            return Err(HealthError::Unavailable);
        }
        Ok(self.records.get(&record_type).cloned().unwrap_or_default())
    }
}

// === Backend ===

/// Backend double. Graph reads succeed with an empty series and saves succeed
/// unless configured otherwise.
#[derive(Default)]
pub struct MockBackend {
    graph: Option<Vec<GraphPoint>>,
    graph_fails: bool,
    summary: Option<Value>,
    save_fails_remaining: Option<AtomicUsize>,
    save_always_fails: bool,
    graph_requests: Mutex<Vec<(String, GraphMode)>>,
    save_calls: AtomicUsize,
    saved: Mutex<Vec<HealthSavePayload>>,
}

impl MockBackend {
    pub fn with_graph(mut self, points: Vec<(&str, Option<f64>)>) -> Self {
        self.graph = Some(
            points
                .into_iter()
                .map(|(x, y)| GraphPoint { x: x.into(), y })
                .collect(),
        );
        self
    }

    pub fn with_summary(mut self, summary: Value) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn failing_graph(mut self) -> Self {
        self.graph_fails = true;
        self
    }

    /// Every save answers 500.
    pub fn failing_save(mut self) -> Self {
        self.save_always_fails = true;
        self
    }

    /// The first `n` saves answer 503.
    pub fn failing_save_times(mut self, n: usize) -> Self {
        self.save_fails_remaining = Some(AtomicUsize::new(n));
        self
    }

    pub fn graph_calls(&self) -> usize {
        lock(&self.graph_requests).len()
    }

    pub fn graph_requests(&self) -> Vec<(String, GraphMode)> {
        lock(&self.graph_requests).clone()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<HealthSavePayload> {
        lock(&self.saved).clone()
    }
}

#[async_trait]
impl WellnessBackend for MockBackend {
    async fn get_graph_data(
        &self,
        metric: &str,
        mode: GraphMode,
    ) -> Result<GraphDataResponse, BackendError> {
        lock(&self.graph_requests).push((metric.to_string(), mode));
        if self.graph_fails {
            return Err(BackendError::from_status(502, "bad gateway".into()));
        }
        Ok(GraphDataResponse {
            graph: self.graph.clone().unwrap_or_default(),
        })
    }

    async fn get_health_summary(
        &self,
        _metric: &str,
        _mode: GraphMode,
    ) -> Result<Value, BackendError> {
        match &self.summary {
            Some(summary) => Ok(summary.clone()),
            None => Err(BackendError::NotFound("summary".into())),
        }
    }

    async fn save_health_data(&self, payload: &HealthSavePayload) -> Result<Value, BackendError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.save_always_fails {
            return Err(BackendError::from_status(500, "boom".into()));
        }
        if let Some(remaining) = &self.save_fails_remaining {
            let failed = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(BackendError::from_status(503, "try later".into()));
            }
        }
        lock(&self.saved).push(payload.clone());
        Ok(json!({"saved": payload.len()}))
    }

    async fn start_conversation(&self, request: &ConversationRequest) -> Result<Value, BackendError> {
        Ok(json!({"conversationId": request.conversation_id.clone().unwrap_or_else(|| "c1".into())}))
    }

    async fn edit_conversation(&self, edit: &ConversationEdit) -> Result<Value, BackendError> {
        Ok(json!({"conversationId": edit.conversation_id}))
    }

    async fn get_journal_by_day(&self, date: NaiveDate) -> Result<Value, BackendError> {
        Ok(json!({"date": date.to_string(), "entries": []}))
    }

    async fn get_monthly_summary(&self) -> Result<Value, BackendError> {
        Ok(json!({"entries": 0}))
    }
}

// === Executor ===

/// Holds scheduled tasks until the test runs them.
#[derive(Default)]
pub struct RecordingExecutor {
    tasks: Mutex<Vec<(&'static str, BackgroundTask)>>,
}

impl RecordingExecutor {
    pub fn scheduled(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        lock(&self.tasks).iter().map(|(label, _)| *label).collect()
    }

    pub async fn run_all(&self) {
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for (_, task) in tasks {
            task.await;
        }
    }
}

impl BackgroundExecutor for RecordingExecutor {
    fn spawn(&self, label: &'static str, task: BackgroundTask) {
        lock(&self.tasks).push((label, task));
    }
}
