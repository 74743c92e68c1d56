//! Plan manifest materialization.
//!
//! Turns a validated [`PlanManifest`] into a root task, its subtasks,
//! and their dependency edges in the store. The manifest is the YAML
//! handoff format from the upstream planner.

use std::collections::HashMap;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::models::{DependencyEdge, PlanManifest, Task};
use crate::domain::ports::TaskStore;

/// Service for loading plan manifests into a store.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanLoader;

impl PlanLoader {
    pub fn new() -> Self {
        Self
    }

    /// Materialize a manifest: insert the root, every subtask, and the
    /// declared dependency edges. Returns the root task id.
    #[instrument(skip(self, manifest, store), fields(root = %manifest.root.title))]
    pub async fn materialize(
        &self,
        manifest: &PlanManifest,
        store: &dyn TaskStore,
    ) -> EngineResult<Uuid> {
        manifest.validate()?;

        let description = if manifest.root.description.trim().is_empty() {
            manifest.root.title.clone()
        } else {
            manifest.root.description.clone()
        };
        let root = Task::new(&manifest.root.title, description)
            .with_workspace(&manifest.root.workspace);
        store.insert(&root).await?;

        let mut ids: HashMap<&str, Uuid> = HashMap::new();
        for spec in &manifest.tasks {
            let description = if spec.description.trim().is_empty() {
                spec.title.clone()
            } else {
                spec.description.clone()
            };
            let mut task = Task::new(&spec.title, description)
                .with_parent(root.id)
                .with_workspace(&manifest.root.workspace);
            task.plan = spec.steps.clone();
            store.insert(&task).await?;
            ids.insert(spec.key.as_str(), task.id);
        }

        for spec in &manifest.tasks {
            let blocked_id = ids[spec.key.as_str()];
            for dep in &spec.depends_on {
                let reason = spec
                    .dependency_reasons
                    .get(dep)
                    .cloned()
                    .unwrap_or_else(|| format!("'{dep}' must complete before '{}'", spec.key));
                let edge = DependencyEdge::new(ids[dep.as_str()], blocked_id, reason);
                store.insert_edge(&edge).await?;
            }
        }

        info!(tasks = manifest.tasks.len(), "plan materialized");
        Ok(root.id)
    }
}
