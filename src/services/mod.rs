pub mod dag_executor;
pub mod plan_loader;
pub mod quality;
pub mod reality;
pub mod scheduler;
pub mod task_executor;

pub use dag_executor::{AgentRoster, DagExecutor, DagExecutorConfig};
pub use plan_loader::PlanLoader;
pub use reality::RealityEngine;
pub use scheduler::{Bottleneck, GraphScheduler};
pub use task_executor::{TaskExecutor, TaskExecutorConfig};
