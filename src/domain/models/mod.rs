pub mod config;
pub mod dependency;
pub mod event;
pub mod plan;
pub mod report;
pub mod task;
pub mod verification;

pub use config::{Config, EngineConfig, LoggingConfig};
pub use dependency::DependencyEdge;
pub use event::EngineEvent;
pub use plan::{PlanManifest, RootSpec, TaskSpec};
pub use report::{
    AgentInvocation, AgentReport, ExecutionResult, FixDirective, TaskOutcome, TestReport,
    CONFIDENCE_REVIEW_THRESHOLD,
};
pub use task::{PlanStep, Task, TaskStatus};
pub use verification::{
    FileAction, FindingSeverity, QualityFinding, VerifiedFileAction, WriteAudit,
};
