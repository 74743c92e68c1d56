//! Context resolver port - knowledge inheritance for agent calls.

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::EngineResult;

/// Supplies the merged ancestor -> descendant key-value context for a
/// task. The engine passes the result through to agent invocations as
/// opaque input; resolution mechanics live outside the core.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    /// Resolve the merged context for a task.
    async fn resolve(&self, task_id: Uuid) -> EngineResult<BTreeMap<String, String>>;
}
