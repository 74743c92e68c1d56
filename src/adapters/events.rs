//! Event sink adapters.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::models::EngineEvent;
use crate::domain::ports::EventSink;

/// Drops every event.
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn publish(&self, _event: EngineEvent) {}
}

/// Emits every event as a structured tracing record.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: EngineEvent) {
        match &event {
            EngineEvent::RunStarted { root_id, total_tasks } => {
                info!(%root_id, total_tasks, "run started");
            }
            EngineEvent::TaskStarted { task_id, title } => {
                info!(%task_id, title, "task started");
            }
            EngineEvent::TaskTransitioned { task_id, from, to } => {
                info!(%task_id, from = from.as_str(), to = to.as_str(), "task transitioned");
            }
            EngineEvent::FixAttempt { task_id, attempt, max_attempts, reason } => {
                info!(%task_id, attempt, max_attempts, reason, "fix attempt");
            }
            EngineEvent::TaskCompleted { task_id, files_changed } => {
                info!(%task_id, files_changed, "task completed");
            }
            EngineEvent::TaskFailed { task_id, error } => {
                info!(%task_id, error, "task failed");
            }
            EngineEvent::RunPaused { root_id, task_id } => {
                info!(%root_id, ?task_id, "run paused");
            }
            EngineEvent::RunCompleted { root_id, tasks_completed } => {
                info!(%root_id, tasks_completed, "run completed");
            }
            EngineEvent::RunFailed { root_id, error } => {
                info!(%root_id, error, "run failed");
            }
        }
    }
}

/// Records every event for test assertions.
#[derive(Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<EngineEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event published so far, in order.
    pub async fn events(&self) -> Vec<EngineEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, event: EngineEvent) {
        self.events.write().await.push(event);
    }
}
