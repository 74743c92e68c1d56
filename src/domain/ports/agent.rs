//! Agent port - interface for pluggable workers.

use async_trait::async_trait;

use crate::domain::errors::EngineResult;
use crate::domain::models::{AgentInvocation, AgentReport};

/// Trait for worker agent implementations.
///
/// An agent is an external collaborator (Coder, QA, Docs persona) that
/// performs the actual work of a step. The engine consumes only the
/// [`AgentReport`] contract: a confidence score, the claimed file
/// touches, and an optional test outcome. It never trusts the claims —
/// the Reality Engine re-verifies everything on disk.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The persona this agent fills (e.g. "coder", "qa", "docs").
    fn persona(&self) -> &str;

    /// Execute one invocation to completion and report back.
    async fn execute(&self, invocation: AgentInvocation) -> EngineResult<AgentReport>;
}
