//! Scripted agent for testing and demos.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::EngineResult;
use crate::domain::models::{AgentInvocation, AgentReport, TestReport};
use crate::domain::ports::Agent;

/// An agent that replays a queue of canned reports.
///
/// Each `execute` call records the invocation it received and pops the
/// next queued report, falling back to the default. Tests assert
/// against the recorded invocations to check what context and fix
/// directives the engine actually passed down.
pub struct ScriptedAgent {
    persona: String,
    queue: RwLock<VecDeque<AgentReport>>,
    default_report: AgentReport,
    invocations: RwLock<Vec<AgentInvocation>>,
}

impl ScriptedAgent {
    pub fn new(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        let default_report = if persona == "qa" {
            AgentReport::confident(vec![]).with_tests(TestReport::passed("true"))
        } else {
            AgentReport::confident(vec![])
        };
        Self {
            persona,
            queue: RwLock::new(VecDeque::new()),
            default_report,
            invocations: RwLock::new(Vec::new()),
        }
    }

    /// Replace the fallback report returned when the queue is empty.
    pub fn with_default(mut self, report: AgentReport) -> Self {
        self.default_report = report;
        self
    }

    /// Queue one report for a future invocation.
    pub async fn push_report(&self, report: AgentReport) {
        self.queue.write().await.push_back(report);
    }

    /// Every invocation this agent has received, in order.
    pub async fn invocations(&self) -> Vec<AgentInvocation> {
        self.invocations.read().await.clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn persona(&self) -> &str {
        &self.persona
    }

    async fn execute(&self, invocation: AgentInvocation) -> EngineResult<AgentReport> {
        self.invocations.write().await.push(invocation);
        let report = self
            .queue
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| self.default_report.clone());
        Ok(report)
    }
}
