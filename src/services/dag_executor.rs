//! DAG Executor: the top-level control loop for one task tree.
//!
//! Repeatedly re-reads the root for external signals, enforces the
//! run-level wall-clock budget, drains the scheduler's ready set
//! through the Task Executor, and terminates on completion, suspension,
//! timeout, failure, or deadlock. Signals are observed only at loop
//! boundaries: an in-flight task always runs to completion first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    AgentInvocation, EngineEvent, ExecutionResult, Task, TaskOutcome, TaskStatus,
};
use crate::domain::ports::{Agent, ContextResolver, EventSink, TaskStore};
use crate::services::reality::RealityEngine;
use crate::services::scheduler::GraphScheduler;
use crate::services::task_executor::{TaskExecutor, TaskExecutorConfig};

/// Configuration for the DAG executor.
#[derive(Debug, Clone)]
pub struct DagExecutorConfig {
    /// Wall-clock budget for the whole run. One slow subtask can
    /// exhaust the entire tree's allowance.
    pub run_timeout: Duration,
    /// Fix attempts per task before it is marked failed.
    pub max_fix_attempts: u32,
}

impl Default for DagExecutorConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(600),
            max_fix_attempts: 3,
        }
    }
}

impl From<&crate::domain::models::EngineConfig> for DagExecutorConfig {
    fn from(config: &crate::domain::models::EngineConfig) -> Self {
        Self {
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            max_fix_attempts: config.max_fix_attempts,
        }
    }
}

/// The agent personas a run needs.
#[derive(Clone)]
pub struct AgentRoster {
    pub coder: Arc<dyn Agent>,
    pub qa: Arc<dyn Agent>,
    pub docs: Arc<dyn Agent>,
}

/// Drives one task tree to termination.
pub struct DagExecutor<S: TaskStore> {
    store: Arc<S>,
    scheduler: GraphScheduler<S>,
    tasks: TaskExecutor<S>,
    docs: Arc<dyn Agent>,
    events: Arc<dyn EventSink>,
    config: DagExecutorConfig,
    started_at: Instant,
}

impl<S: TaskStore> DagExecutor<S> {
    pub fn new(
        store: Arc<S>,
        reality: Arc<RealityEngine>,
        roster: AgentRoster,
        resolver: Arc<dyn ContextResolver>,
        events: Arc<dyn EventSink>,
        config: DagExecutorConfig,
    ) -> Self {
        let tasks = TaskExecutor::new(
            store.clone(),
            reality,
            roster.coder,
            roster.qa,
            resolver,
            events.clone(),
            TaskExecutorConfig {
                max_fix_attempts: config.max_fix_attempts,
            },
        );
        Self {
            scheduler: GraphScheduler::new(store.clone()),
            store,
            tasks,
            docs: roster.docs,
            events,
            config,
            started_at: Instant::now(),
        }
    }

    /// Override the construction instant the wall-clock budget is
    /// measured from.
    pub fn with_started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Run the tree rooted at `root_id` to termination.
    #[instrument(skip(self), fields(root_id = %root_id))]
    pub async fn execute(&self, root_id: Uuid) -> EngineResult<ExecutionResult> {
        let root = self
            .store
            .get(root_id)
            .await?
            .ok_or(EngineError::TaskNotFound(root_id))?;

        let descendants = self.store.descendants_of(root_id).await?;
        self.events
            .publish(EngineEvent::RunStarted {
                root_id,
                total_tasks: descendants.len(),
            })
            .await;

        if root.status == TaskStatus::Pending {
            self.transition_root(root, TaskStatus::Executing).await?;
        }

        let mut completed = 0usize;
        loop {
            // 1. External signals, observed fresh from the store.
            let root = self
                .store
                .get(root_id)
                .await?
                .ok_or(EngineError::TaskNotFound(root_id))?;
            match root.status {
                TaskStatus::Paused => {
                    info!("run paused by external signal");
                    self.events
                        .publish(EngineEvent::RunPaused { root_id, task_id: None })
                        .await;
                    return Ok(ExecutionResult::paused(completed));
                }
                TaskStatus::Failed => {
                    let error = root
                        .error_message
                        .clone()
                        .unwrap_or_else(|| "root task failed".to_string());
                    return Ok(ExecutionResult::failed(completed, error));
                }
                TaskStatus::Completed => {
                    return Ok(ExecutionResult::completed(completed));
                }
                _ => {}
            }

            // 2. Wall-clock budget for the whole run.
            if self.started_at.elapsed() >= self.config.run_timeout {
                let error = EngineError::TimeoutExceeded {
                    budget_secs: self.config.run_timeout.as_secs(),
                }
                .to_string();
                self.fail_root(root, &error).await?;
                return Ok(ExecutionResult::failed(completed, error));
            }

            // 3. Drain the ready set.
            let ready = self.scheduler.ready_tasks(root_id).await?;
            if !ready.is_empty() {
                for task in ready {
                    match self.tasks.run(task.id).await? {
                        TaskOutcome::Completed => completed += 1,
                        TaskOutcome::ReviewRequired => {
                            self.events
                                .publish(EngineEvent::RunPaused {
                                    root_id,
                                    task_id: Some(task.id),
                                })
                                .await;
                            return Ok(ExecutionResult::paused(completed));
                        }
                        TaskOutcome::Failed { error } => {
                            let error =
                                format!("task '{}' failed: {error}", task.title);
                            let root = self
                                .store
                                .get(root_id)
                                .await?
                                .ok_or(EngineError::TaskNotFound(root_id))?;
                            self.fail_root(root, &error).await?;
                            return Ok(ExecutionResult::failed(completed, error));
                        }
                    }
                }
                continue;
            }

            // 4/5. Nothing ready: completion, suspension, or deadlock.
            let descendants = self.store.descendants_of(root_id).await?;
            if descendants
                .iter()
                .all(|t| t.status == TaskStatus::Completed)
            {
                return self.finish(root_id, completed, descendants.len()).await;
            }

            if let Some(suspended) =
                descendants.iter().find(|t| t.status.is_suspended())
            {
                info!(task_id = %suspended.id, "suspended task holds the tree");
                self.events
                    .publish(EngineEvent::RunPaused {
                        root_id,
                        task_id: Some(suspended.id),
                    })
                    .await;
                return Ok(ExecutionResult::paused(completed));
            }

            if let Some(failed) =
                descendants.iter().find(|t| t.status == TaskStatus::Failed)
            {
                let error = format!(
                    "task '{}' failed: {}",
                    failed.title,
                    failed.error_message.as_deref().unwrap_or("unknown error")
                );
                let root = self
                    .store
                    .get(root_id)
                    .await?
                    .ok_or(EngineError::TaskNotFound(root_id))?;
                self.fail_root(root, &error).await?;
                return Ok(ExecutionResult::failed(completed, error));
            }

            // No ready task, nothing suspended or failed, work remains,
            // and nothing is in flight: the graph cannot make progress.
            // A seeded cycle is reported as such; anything else (e.g. a
            // blocker outside the tree that never completes) is a
            // deadlock.
            let edges = self.store.edges_in_tree(root_id).await?;
            let stuck: Vec<Uuid> = descendants
                .iter()
                .filter(|t| !t.is_terminal())
                .map(|t| t.id)
                .collect();
            let error = match GraphScheduler::<S>::find_cycle(&descendants, &edges) {
                Some(cycle) => EngineError::DependencyCycle(cycle).to_string(),
                None => EngineError::Deadlock { stuck }.to_string(),
            };
            let root = self
                .store
                .get(root_id)
                .await?
                .ok_or(EngineError::TaskNotFound(root_id))?;
            self.fail_root(root, &error).await?;
            return Ok(ExecutionResult::failed(completed, error));
        }
    }

    /// Documentation phase, then close out the root.
    async fn finish(
        &self,
        root_id: Uuid,
        completed: usize,
        total: usize,
    ) -> EngineResult<ExecutionResult> {
        let root = self
            .store
            .get(root_id)
            .await?
            .ok_or(EngineError::TaskNotFound(root_id))?;
        let root = self.transition_root(root, TaskStatus::Documenting).await?;

        // Docs are not part of the integrity gate: every subtask has
        // already passed verification and QA, so a docs failure is
        // logged and the run still closes out.
        if let Err(err) = self.docs.execute(AgentInvocation::new(root.clone())).await {
            warn!("documentation agent failed: {err}");
        }

        self.transition_root(root, TaskStatus::Completed).await?;
        info!(tasks_completed = completed, total, "run completed");
        self.events
            .publish(EngineEvent::RunCompleted {
                root_id,
                tasks_completed: completed,
            })
            .await;
        Ok(ExecutionResult::completed(completed))
    }

    async fn fail_root(&self, mut root: Task, error: &str) -> EngineResult<()> {
        root.error_message = Some(error.to_string());
        if root.can_transition_to(TaskStatus::Failed) {
            let from = root.status;
            root.transition_to(TaskStatus::Failed)
                .map_err(|_| EngineError::InvalidTransition {
                    from: from.as_str().to_string(),
                    to: TaskStatus::Failed.as_str().to_string(),
                })?;
        }
        self.store.update(&root).await?;
        self.events
            .publish(EngineEvent::RunFailed {
                root_id: root.id,
                error: error.to_string(),
            })
            .await;
        Ok(())
    }

    async fn transition_root(&self, mut root: Task, to: TaskStatus) -> EngineResult<Task> {
        let from = root.status;
        root.transition_to(to)
            .map_err(|_| EngineError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })?;
        self.store.update(&root).await?;
        self.events
            .publish(EngineEvent::TaskTransitioned {
                task_id: root.id,
                from,
                to,
            })
            .await;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::agents::ScriptedAgent;
    use crate::adapters::context::StaticContext;
    use crate::adapters::events::NullEventSink;
    use crate::adapters::memory::InMemoryTaskStore;
    use crate::domain::models::{AgentReport, TestReport};
    use tempfile::TempDir;

    fn roster(coder: Arc<ScriptedAgent>, qa: Arc<ScriptedAgent>) -> AgentRoster {
        AgentRoster {
            coder,
            qa,
            docs: Arc::new(ScriptedAgent::new("docs")),
        }
    }

    #[tokio::test]
    async fn test_root_with_no_subtasks_completes_immediately() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryTaskStore::new());
        let root = Task::new("root", "empty tree");
        store.insert(&root).await.unwrap();

        let executor = DagExecutor::new(
            store,
            Arc::new(RealityEngine::new(dir.path())),
            roster(
                Arc::new(ScriptedAgent::new("coder")),
                Arc::new(ScriptedAgent::new("qa")),
            ),
            Arc::new(StaticContext::default()),
            Arc::new(NullEventSink),
            DagExecutorConfig::default(),
        );

        let result = executor.execute(root.id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.tasks_completed, 0);
        assert!(!result.paused_for_review);
    }

    #[tokio::test]
    async fn test_externally_paused_root_returns_without_work() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryTaskStore::new());
        let mut root = Task::new("root", "paused tree");
        root.status = TaskStatus::Paused;
        store.insert(&root).await.unwrap();
        let child = Task::new("child", "never runs").with_parent(root.id);
        store.insert(&child).await.unwrap();

        let coder = Arc::new(ScriptedAgent::new("coder"));
        let executor = DagExecutor::new(
            store.clone(),
            Arc::new(RealityEngine::new(dir.path())),
            roster(coder.clone(), Arc::new(ScriptedAgent::new("qa"))),
            Arc::new(StaticContext::default()),
            Arc::new(NullEventSink),
            DagExecutorConfig::default(),
        );

        let result = executor.execute(root.id).await.unwrap();
        assert!(result.success);
        assert!(result.paused_for_review);
        assert!(coder.invocations().await.is_empty());

        let stored = store.get(child.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_seeded_cycle_reported_as_cycle() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryTaskStore::new());
        let root = Task::new("root", "cyclic tree");
        store.insert(&root).await.unwrap();
        let a = Task::new("a", "first").with_parent(root.id);
        let b = Task::new("b", "second").with_parent(root.id);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        // Externally-seeded cycle: the engine must detect, not spin.
        store
            .insert_edge(&crate::domain::models::DependencyEdge::new(a.id, b.id, ""))
            .await
            .unwrap();
        store
            .insert_edge(&crate::domain::models::DependencyEdge::new(b.id, a.id, ""))
            .await
            .unwrap();

        let executor = DagExecutor::new(
            store.clone(),
            Arc::new(RealityEngine::new(dir.path())),
            roster(
                Arc::new(ScriptedAgent::new("coder")),
                Arc::new(ScriptedAgent::new("qa")),
            ),
            Arc::new(StaticContext::default()),
            Arc::new(NullEventSink),
            DagExecutorConfig::default(),
        );

        let result = executor.execute(root.id).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("cycle"));

        let stored = store.get(root.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_docs_agent_runs_before_completion() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryTaskStore::new());
        let root = Task::new("root", "tree");
        store.insert(&root).await.unwrap();
        let child = Task::new("child", "one unit").with_parent(root.id);
        store.insert(&child).await.unwrap();

        let coder = Arc::new(ScriptedAgent::new("coder"));
        let qa = Arc::new(ScriptedAgent::new("qa"));
        let docs = Arc::new(ScriptedAgent::new("docs"));
        coder.push_report(AgentReport::confident(vec![])).await;
        qa.push_report(
            AgentReport::confident(vec![]).with_tests(TestReport::passed("cargo test")),
        )
        .await;

        let executor = DagExecutor::new(
            store.clone(),
            Arc::new(RealityEngine::new(dir.path())),
            AgentRoster {
                coder,
                qa,
                docs: docs.clone(),
            },
            Arc::new(StaticContext::default()),
            Arc::new(NullEventSink),
            DagExecutorConfig::default(),
        );

        let result = executor.execute(root.id).await.unwrap();
        assert!(result.success);
        assert_eq!(result.tasks_completed, 1);
        assert_eq!(docs.invocations().await.len(), 1);

        let stored = store.get(root.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.completed_at.is_some());
    }
}
