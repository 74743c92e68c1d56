//! Agent contracts and run reports.
//!
//! The engine never sees agent internals; it consumes the
//! [`AgentReport`] contract (confidence score, claimed file touches,
//! pass/fail test signal) and produces an [`ExecutionResult`] for the
//! invoking worker process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::{PlanStep, Task};

/// Confidence below this threshold (strict `<`) quarantines the output
/// for human review. A score of exactly 0.7 proceeds.
pub const CONFIDENCE_REVIEW_THRESHOLD: f64 = 0.7;

/// Outcome of a QA agent's test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// The command QA executed
    pub command: String,
    /// Its exit code; zero means pass
    pub exit_code: i32,
    /// QA's suggested remediation when the run failed
    pub remediation: Option<String>,
}

impl TestReport {
    pub fn passed(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_code: 0,
            remediation: None,
        }
    }

    pub fn failed(command: impl Into<String>, exit_code: i32, remediation: Option<String>) -> Self {
        Self {
            command: command.into(),
            exit_code,
            remediation,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.exit_code == 0
    }
}

/// What an agent reports back after executing a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    /// 0-1 confidence the agent attaches to its own output
    pub confidence: f64,
    /// File paths the agent claims to have touched (workspace-relative)
    pub claimed_files: Vec<String>,
    /// Technical output / summary
    pub output: String,
    /// Test outcome, present on QA reports
    pub tests: Option<TestReport>,
}

impl AgentReport {
    /// A confident report claiming the given file touches.
    pub fn confident(claimed_files: Vec<String>) -> Self {
        Self {
            confidence: 1.0,
            claimed_files,
            output: String::new(),
            tests: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_tests(mut self, tests: TestReport) -> Self {
        self.tests = Some(tests);
        self
    }

    /// Whether the confidence score quarantines this output for review.
    pub fn needs_review(&self) -> bool {
        self.confidence < CONFIDENCE_REVIEW_THRESHOLD
    }
}

/// Diagnostic from a prior failed attempt, injected into the retry
/// invocation as the fix target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixDirective {
    /// Claimed artifacts the reality check could not find on disk
    MissingArtifacts { paths: Vec<String> },
    /// A QA run failed; remediation is QA's suggested fix
    FailingTests {
        command: String,
        exit_code: i32,
        remediation: Option<String>,
    },
    /// The quality gate rejected a write outright
    QualityRejection { path: String, reason: String },
}

/// Everything an agent gets for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvocation {
    /// Snapshot of the task being worked on
    pub task: Task,
    /// The plan step the agent is responsible for, when the plan has one
    pub step: Option<PlanStep>,
    /// Merged ancestor -> descendant context from the knowledge resolver
    pub context: BTreeMap<String, String>,
    /// Prior failure diagnostic, present on retries
    pub fix: Option<FixDirective>,
}

impl AgentInvocation {
    pub fn new(task: Task) -> Self {
        let step = task.active_step().cloned();
        Self {
            task,
            step,
            context: BTreeMap::new(),
            fix: None,
        }
    }

    pub fn with_context(mut self, context: BTreeMap<String, String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_fix(mut self, fix: FixDirective) -> Self {
        self.fix = Some(fix);
        self
    }
}

/// Outcome of one Task Executor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Verified, tested, and marked COMPLETED
    Completed,
    /// Low-confidence output; task suspended in REVIEW_REQUIRED
    ReviewRequired,
    /// Fix attempts exhausted; task marked FAILED
    Failed { error: String },
}

/// Transient report returned to the invoking worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the run ended without failure (pauses count as success)
    pub success: bool,
    /// Subtasks completed during this run
    pub tasks_completed: usize,
    /// True when the run suspended for human review or an external pause
    pub paused_for_review: bool,
    /// Failure reason when success is false
    pub error: Option<String>,
}

impl ExecutionResult {
    /// All descendants completed.
    pub fn completed(tasks_completed: usize) -> Self {
        Self {
            success: true,
            tasks_completed,
            paused_for_review: false,
            error: None,
        }
    }

    /// Suspended for human review or external pause.
    pub fn paused(tasks_completed: usize) -> Self {
        Self {
            success: true,
            tasks_completed,
            paused_for_review: true,
            error: None,
        }
    }

    /// The run failed.
    pub fn failed(tasks_completed: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            tasks_completed,
            paused_for_review: false,
            error: Some(error.into()),
        }
    }
}
