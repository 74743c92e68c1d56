//! Event sink port - fire-and-forget notifications.

use async_trait::async_trait;

use crate::domain::models::EngineEvent;

/// Receives status-change and progress notifications after each task
/// transition.
///
/// Publishing is fire-and-forget by contract: implementations swallow
/// their own delivery failures, and the engine never awaits delivery
/// guarantees. A broken sink must never fail a task.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: EngineEvent);
}
