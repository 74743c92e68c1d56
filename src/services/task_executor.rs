//! Task Executor: the per-task Code->Test->Fix loop.
//!
//! One invocation drives a single task from PENDING to a terminal or
//! suspended state: coder attempt, reality check over the claimed file
//! touches, QA run, and bounded fix retries. Recoverable failures
//! (missing artifacts, failing tests) are consumed here and never
//! escape as process errors; only the resulting [`TaskOutcome`] does.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    AgentInvocation, EngineEvent, FixDirective, Task, TaskOutcome, TaskStatus,
};
use crate::domain::ports::{Agent, ContextResolver, EventSink, TaskStore};
use crate::services::reality::RealityEngine;

/// Configuration for the Task Executor.
#[derive(Debug, Clone)]
pub struct TaskExecutorConfig {
    /// Fix attempts allowed before the task is marked failed.
    pub max_fix_attempts: u32,
}

impl Default for TaskExecutorConfig {
    fn default() -> Self {
        Self { max_fix_attempts: 3 }
    }
}

/// Runs one task's Code->Test->Fix cycle.
pub struct TaskExecutor<S: TaskStore> {
    store: Arc<S>,
    reality: Arc<RealityEngine>,
    coder: Arc<dyn Agent>,
    qa: Arc<dyn Agent>,
    resolver: Arc<dyn ContextResolver>,
    events: Arc<dyn EventSink>,
    config: TaskExecutorConfig,
}

impl<S: TaskStore> TaskExecutor<S> {
    pub fn new(
        store: Arc<S>,
        reality: Arc<RealityEngine>,
        coder: Arc<dyn Agent>,
        qa: Arc<dyn Agent>,
        resolver: Arc<dyn ContextResolver>,
        events: Arc<dyn EventSink>,
        config: TaskExecutorConfig,
    ) -> Self {
        Self {
            store,
            reality,
            coder,
            qa,
            resolver,
            events,
            config,
        }
    }

    /// Execute one task to a terminal or suspended state.
    #[instrument(skip(self), fields(task_id = %task_id))]
    pub async fn run(&self, task_id: Uuid) -> EngineResult<TaskOutcome> {
        let mut task = self
            .store
            .get(task_id)
            .await?
            .ok_or(EngineError::TaskNotFound(task_id))?;

        self.events
            .publish(EngineEvent::TaskStarted {
                task_id,
                title: task.title.clone(),
            })
            .await;

        // A task that has run before is being re-dispatched (e.g. after
        // a human released it from review).
        if task.last_heartbeat.is_some() {
            task.retry_count += 1;
        }

        self.transition(&mut task, TaskStatus::Executing).await?;
        let context = self.resolver.resolve(task_id).await?;

        let mut fix: Option<FixDirective> = None;
        loop {
            task.touch_heartbeat();
            self.store.update(&task).await?;

            let mut invocation =
                AgentInvocation::new(task.clone()).with_context(context.clone());
            if let Some(directive) = fix.take() {
                invocation = invocation.with_fix(directive);
            }

            let report = self.coder.execute(invocation).await?;
            if report.needs_review() {
                info!(confidence = report.confidence, "coder output below review threshold");
                self.transition(&mut task, TaskStatus::ReviewRequired).await?;
                return Ok(TaskOutcome::ReviewRequired);
            }

            // Trust-but-verify: the claim set is checked against disk,
            // never against the agent's word.
            let audit = self.reality.verify_all_writes(&report.claimed_files).await?;
            if !audit.all_present {
                let reason = EngineError::RealityCheckFailed {
                    missing: audit.missing.clone(),
                }
                .to_string();
                if self.consume_fix_attempt(&mut task, &reason).await? {
                    fix = Some(FixDirective::MissingArtifacts { paths: audit.missing });
                    continue;
                }
                return self.fail(&mut task, reason).await;
            }

            task.files_changed = self
                .reality
                .files_changed(task.id)
                .await
                .max(u32::try_from(report.claimed_files.len()).unwrap_or(u32::MAX));
            task.touch_heartbeat();
            self.transition(&mut task, TaskStatus::Testing).await?;

            let qa_invocation =
                AgentInvocation::new(task.clone()).with_context(context.clone());
            let qa_report = self.qa.execute(qa_invocation).await?;
            if qa_report.needs_review() {
                info!(confidence = qa_report.confidence, "qa output below review threshold");
                self.transition(&mut task, TaskStatus::ReviewRequired).await?;
                return Ok(TaskOutcome::ReviewRequired);
            }

            let Some(tests) = qa_report.tests else {
                // A QA report without a test outcome is not a pass.
                let reason = "qa returned no test report".to_string();
                if self.consume_fix_attempt(&mut task, &reason).await? {
                    self.transition(&mut task, TaskStatus::Executing).await?;
                    continue;
                }
                return self.fail(&mut task, reason).await;
            };

            task.tests_command = Some(tests.command.clone());
            task.tests_exit_code = Some(tests.exit_code);

            if tests.is_pass() {
                // Advance through the remaining plan steps before the
                // task as a whole can complete.
                if task.current_step + 1 < task.plan.len() {
                    task.current_step += 1;
                    self.transition(&mut task, TaskStatus::Executing).await?;
                    continue;
                }

                self.transition(&mut task, TaskStatus::Completed).await?;
                self.events
                    .publish(EngineEvent::TaskCompleted {
                        task_id,
                        files_changed: task.files_changed,
                    })
                    .await;
                return Ok(TaskOutcome::Completed);
            }

            let reason = EngineError::TestsFailed {
                command: tests.command.clone(),
                exit_code: tests.exit_code,
            }
            .to_string();
            if self.consume_fix_attempt(&mut task, &reason).await? {
                self.transition(&mut task, TaskStatus::Executing).await?;
                fix = Some(FixDirective::FailingTests {
                    command: tests.command,
                    exit_code: tests.exit_code,
                    remediation: tests.remediation,
                });
                continue;
            }
            return self.fail(&mut task, reason).await;
        }
    }

    /// Record a failed attempt. Returns true while attempts remain.
    async fn consume_fix_attempt(&self, task: &mut Task, reason: &str) -> EngineResult<bool> {
        task.fix_attempts += 1;
        task.touch_heartbeat();
        self.store.update(task).await?;

        let remaining = task.fix_attempts < self.config.max_fix_attempts;
        warn!(
            attempt = task.fix_attempts,
            max_attempts = self.config.max_fix_attempts,
            remaining,
            "fix attempt consumed: {reason}"
        );
        self.events
            .publish(EngineEvent::FixAttempt {
                task_id: task.id,
                attempt: task.fix_attempts,
                max_attempts: self.config.max_fix_attempts,
                reason: reason.to_string(),
            })
            .await;
        Ok(remaining)
    }

    async fn fail(&self, task: &mut Task, error: String) -> EngineResult<TaskOutcome> {
        task.error_message = Some(error.clone());
        self.transition(task, TaskStatus::Failed).await?;
        self.events
            .publish(EngineEvent::TaskFailed {
                task_id: task.id,
                error: error.clone(),
            })
            .await;
        Ok(TaskOutcome::Failed { error })
    }

    /// Apply a validated transition, persist it, and notify the sink.
    async fn transition(&self, task: &mut Task, to: TaskStatus) -> EngineResult<()> {
        let from = task.status;
        task.transition_to(to)
            .map_err(|_| EngineError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })?;
        self.store.update(task).await?;
        self.events
            .publish(EngineEvent::TaskTransitioned {
                task_id: task.id,
                from,
                to,
            })
            .await;
        Ok(())
    }
}
