//! Domain errors for the Foreman orchestration engine.

use thiserror::Error;
use uuid::Uuid;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[Uuid]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Format a list of task ids for deadlock reports.
fn format_id_list(ids: &[Uuid]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Engine-level errors.
///
/// Recoverable variants (reality check, quality gate, edit target, test
/// failure) are consumed inside the Task Executor's fix loop and never
/// escape a run; the rest terminate the run or reject invalid input.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<Uuid>),

    #[error("Task {0} cannot depend on itself")]
    SelfDependency(Uuid),

    #[error("Claimed artifacts not found on disk: {}", .missing.join(", "))]
    RealityCheckFailed { missing: Vec<String> },

    #[error("Quality gate rejected {path}: {reason}")]
    QualityGateRejected { path: String, reason: String },

    #[error("Edit target does not exist: {path}")]
    EditTargetNotFound { path: String },

    #[error("Edit anchor not found in {path}: original content has no match")]
    EditAnchorNotFound { path: String },

    #[error("Tests failed: `{command}` exited with code {exit_code}")]
    TestsFailed { command: String, exit_code: i32 },

    #[error("Run timed out after exceeding the {budget_secs}s wall-clock budget")]
    TimeoutExceeded { budget_secs: u64 },

    #[error("Deadlock: no task is ready and none is running; stuck tasks: {}", format_id_list(.stuck))]
    Deadlock { stuck: Vec<Uuid> },

    #[error("Path escapes the workspace root: {path}")]
    PathOutsideWorkspace { path: String },

    #[error("Invalid plan manifest: {0}")]
    ManifestInvalid(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::ManifestInvalid(err.to_string())
    }
}

impl EngineError {
    /// Whether this error is consumed by the fix loop rather than
    /// terminating the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RealityCheckFailed { .. }
                | Self::QualityGateRejected { .. }
                | Self::EditTargetNotFound { .. }
                | Self::EditAnchorNotFound { .. }
                | Self::TestsFailed { .. }
        )
    }
}
