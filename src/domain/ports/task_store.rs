//! Task store port - the dependency graph store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::models::{DependencyEdge, Task, TaskStatus};

/// Repository port for the flat task table plus its two adjacency
/// structures (parent index and dependency-edge index).
///
/// The engine re-reads through this port on every scheduling decision;
/// implementations must serve fresh state, not a run-scoped cache.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task.
    async fn insert(&self, task: &Task) -> EngineResult<()>;

    /// Get a task by ID.
    async fn get(&self, id: Uuid) -> EngineResult<Option<Task>>;

    /// Update an existing task.
    async fn update(&self, task: &Task) -> EngineResult<()>;

    /// Update only a task's status, bumping its updated timestamp.
    async fn update_status(&self, id: Uuid, status: TaskStatus) -> EngineResult<()>;

    /// Direct children of a task (parent index).
    async fn children_of(&self, parent_id: Uuid) -> EngineResult<Vec<Task>>;

    /// Every task in the subtree below a root, excluding the root.
    async fn descendants_of(&self, root_id: Uuid) -> EngineResult<Vec<Task>>;

    /// Insert a dependency edge. Self-loops must be rejected.
    async fn insert_edge(&self, edge: &DependencyEdge) -> EngineResult<()>;

    /// Edges whose blocked side is the given task.
    async fn edges_blocking(&self, blocked_id: Uuid) -> EngineResult<Vec<DependencyEdge>>;

    /// Every edge whose blocked task lives in the subtree below a root.
    async fn edges_in_tree(&self, root_id: Uuid) -> EngineResult<Vec<DependencyEdge>>;
}
