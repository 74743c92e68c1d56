//! Dependency edge domain model.
//!
//! Edges point from a blocker to the task it blocks. The edge set,
//! restricted to non-completed blockers, must stay acyclic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed blocker -> blocked dependency between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The task that must complete first
    pub blocker_id: Uuid,
    /// The task that may not start until the blocker completes
    pub blocked_id: Uuid,
    /// Why the dependency exists
    pub reason: String,
}

impl DependencyEdge {
    /// Create a new dependency edge.
    pub fn new(blocker_id: Uuid, blocked_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            blocker_id,
            blocked_id,
            reason: reason.into(),
        }
    }

    /// Check the self-loop invariant.
    pub fn is_self_loop(&self) -> bool {
        self.blocker_id == self.blocked_id
    }
}
