//! Events emitted during a DAG run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::TaskStatus;

/// Notification published after engine state changes.
///
/// Publishing is fire-and-forget: a sink failure must never fail the
/// task that produced the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A DAG run started.
    RunStarted { root_id: Uuid, total_tasks: usize },
    /// A task was dispatched to the Task Executor.
    TaskStarted { task_id: Uuid, title: String },
    /// A task moved between lifecycle states.
    TaskTransitioned {
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// The fix loop is retrying after a failed attempt.
    FixAttempt {
        task_id: Uuid,
        attempt: u32,
        max_attempts: u32,
        reason: String,
    },
    /// A task completed with verified artifacts.
    TaskCompleted { task_id: Uuid, files_changed: u32 },
    /// A task failed terminally.
    TaskFailed { task_id: Uuid, error: String },
    /// The run suspended for review or an external pause.
    RunPaused { root_id: Uuid, task_id: Option<Uuid> },
    /// Every descendant completed and the root closed out.
    RunCompleted { root_id: Uuid, tasks_completed: usize },
    /// The run failed.
    RunFailed { root_id: Uuid, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = EngineEvent::TaskTransitioned {
            task_id: Uuid::new_v4(),
            from: TaskStatus::Pending,
            to: TaskStatus::Executing,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"task_transitioned\""));
        assert!(json.contains("\"executing\""));
    }
}
