//! Foreman - Dependency-Aware Task Orchestration Engine
//!
//! Foreman executes a tree of planned tasks over a blocker->blocked
//! dependency DAG. No task starts before its prerequisites finish,
//! every claimed file mutation is independently re-verified against the
//! real filesystem, and low-confidence or failing work is quarantined
//! for human review rather than silently accepted.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports, and the error taxonomy
//! - **Service Layer** (`services`): Scheduler, Reality Engine, and the
//!   Task/DAG executors
//! - **Adapters** (`adapters`): In-memory store, scripted agents, and
//!   event sinks implementing the ports
//! - **Infrastructure** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Plan manifest inspection commands
//!
//! # Example
//!
//! ```ignore
//! use foreman::services::{AgentRoster, DagExecutor, DagExecutorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire a store, a Reality Engine, and agents, then:
//!     // let result = executor.execute(root_id).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    AgentInvocation, AgentReport, Config, DependencyEdge, EngineConfig, EngineEvent,
    ExecutionResult, FixDirective, LoggingConfig, PlanManifest, PlanStep, Task, TaskOutcome,
    TaskStatus, TestReport,
};
pub use domain::ports::{Agent, ContextResolver, EventSink, TaskStore};
pub use domain::{EngineError, EngineResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentRoster, DagExecutor, DagExecutorConfig, GraphScheduler, PlanLoader, RealityEngine,
    TaskExecutor, TaskExecutorConfig,
};
