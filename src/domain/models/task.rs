//! Task domain model.
//!
//! Tasks are discrete units of planned work executed by agents. The
//! parent/child links form a tree; dependency edges between tasks form
//! the execution DAG.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a task in the orchestration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Defined but not started; dependencies may be unmet
    Pending,
    /// Upstream planner is materializing subtasks
    Planning,
    /// Plan confidence was too low; awaiting human approval
    PlanReview,
    /// Coder agent is working on the current step
    Executing,
    /// QA agent is running the task's test commands
    Testing,
    /// Externally paused; resumable
    Paused,
    /// Low-confidence output quarantined for human review; resumable
    ReviewRequired,
    /// Every subtask completed; documentation agent is running
    Documenting,
    /// Finished with verified artifacts and passing tests
    Completed,
    /// Unrecoverable failure or exhausted fix attempts
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Planning => "planning",
            Self::PlanReview => "plan_review",
            Self::Executing => "executing",
            Self::Testing => "testing",
            Self::Paused => "paused",
            Self::ReviewRequired => "review_required",
            Self::Documenting => "documenting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "planning" => Some(Self::Planning),
            "plan_review" => Some(Self::PlanReview),
            "executing" => Some(Self::Executing),
            "testing" => Some(Self::Testing),
            "paused" => Some(Self::Paused),
            "review_required" => Some(Self::ReviewRequired),
            "documenting" => Some(Self::Documenting),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an externally-resumable suspension.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Paused | Self::ReviewRequired)
    }

    /// Check if this is an active (non-terminal) state.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Pending => vec![Self::Planning, Self::Executing, Self::Failed],
            Self::Planning => {
                vec![Self::Executing, Self::PlanReview, Self::ReviewRequired, Self::Failed]
            }
            Self::PlanReview => vec![Self::Executing, Self::Failed],
            Self::Executing => vec![
                Self::Testing,
                Self::Paused,
                Self::ReviewRequired,
                Self::Documenting,
                Self::Failed,
            ],
            Self::Testing => {
                vec![Self::Executing, Self::Completed, Self::ReviewRequired, Self::Failed]
            }
            Self::Paused => vec![Self::Executing, Self::Failed],
            Self::ReviewRequired => vec![Self::Pending, Self::Executing, Self::Failed],
            Self::Documenting => vec![Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// One step of a task's plan payload: a responsible agent persona and
/// the files it expects to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Agent persona responsible for the step (e.g. "coder", "qa")
    pub persona: String,
    /// What the step should accomplish
    pub description: String,
    /// Files the step expects to create or modify
    #[serde(default)]
    pub files: Vec<String>,
}

impl PlanStep {
    pub fn new(persona: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            description: description.into(),
            files: Vec::new(),
        }
    }

    /// Add an expected file path.
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.files.push(path.into());
        self
    }
}

/// A unit of planned work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Parent task (tree link; None for a root)
    pub parent_id: Option<Uuid>,
    /// Human-readable title
    pub title: String,
    /// Detailed description handed to agents
    pub description: String,
    /// Workspace directory the task mutates, relative to the engine root
    pub workspace: String,
    /// Ordered plan steps
    pub plan: Vec<PlanStep>,
    /// Index of the step currently being executed
    pub current_step: usize,
    /// Current status
    pub status: TaskStatus,
    /// Scheduler-level retry count (re-dispatches after suspension)
    pub retry_count: u32,
    /// Fix attempts consumed by the Code->Test->Fix loop
    pub fix_attempts: u32,
    /// Verified file mutations recorded for this task
    pub files_changed: u32,
    /// Why the task failed, if it did
    pub error_message: Option<String>,
    /// Last test command QA ran for this task
    pub tests_command: Option<String>,
    /// Exit code of the last QA run
    pub tests_exit_code: Option<i32>,
    /// Refreshed on every executor loop step
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
    /// When the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            title: title.into(),
            description: description.into(),
            workspace: ".".to_string(),
            plan: Vec::new(),
            current_step: 0,
            status: TaskStatus::default(),
            retry_count: 0,
            fix_attempts: 0,
            files_changed: 0,
            error_message: None,
            tests_command: None,
            tests_exit_code: None,
            last_heartbeat: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set parent task.
    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the workspace directory.
    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    /// Append a plan step.
    pub fn with_step(mut self, step: PlanStep) -> Self {
        self.plan.push(step);
        self
    }

    /// The step currently being executed, if the plan has one.
    pub fn active_step(&self) -> Option<&PlanStep> {
        self.plan.get(self.current_step)
    }

    /// Check if can transition to given status.
    pub fn can_transition_to(&self, new_status: TaskStatus) -> bool {
        self.status.can_transition_to(new_status)
    }

    /// Transition to a new status, updating timestamps.
    pub fn transition_to(&mut self, new_status: TaskStatus) -> Result<(), String> {
        if !self.can_transition_to(new_status) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.status.as_str(),
                new_status.as_str()
            ));
        }

        self.status = new_status;
        self.updated_at = Utc::now();

        if new_status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }

        Ok(())
    }

    /// Refresh the heartbeat timestamp.
    pub fn touch_heartbeat(&mut self) {
        self.last_heartbeat = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Check if task is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate task invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Task description cannot be empty".to_string());
        }
        if self.parent_id == Some(self.id) {
            return Err("Task cannot be its own parent".to_string());
        }
        Ok(())
    }
}
