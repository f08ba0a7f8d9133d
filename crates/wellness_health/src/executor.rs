//! Fire-and-forget task scheduling.

use std::sync::Mutex;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;

pub type BackgroundTask = BoxFuture<'static, ()>;

/// Runs work the caller will not wait for. Implementations own the task's
/// failure: nothing it does may reach the caller that scheduled it.
pub trait BackgroundExecutor: Send + Sync + 'static {
    fn spawn(&self, label: &'static str, task: BackgroundTask);
}

/// Detached tokio tasks. Handles are kept so a short-lived process can wait
/// for in-flight work with [`TokioExecutor::drain`] before exiting.
#[derive(Debug, Default)]
pub struct TokioExecutor {
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
}

impl TokioExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for every task spawned so far. Panicked tasks are logged.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(|e| e.into_inner()));
        for (label, handle) in handles {
            if let Err(e) = handle.await {
                tracing::warn!(task = label, error = %e, "background task did not complete");
            }
        }
    }
}

impl BackgroundExecutor for TokioExecutor {
    fn spawn(&self, label: &'static str, task: BackgroundTask) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(task = label, error = %e, "no runtime; dropping background task");
                return;
            }
        };
        let handle = runtime.spawn(async move {
            task.await;
            tracing::debug!(task = label, "background task finished");
        });
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((label, handle));
    }
}
