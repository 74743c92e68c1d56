//! In-memory task store adapter.
//!
//! Backs tests, the CLI, and embedding hosts that do not bring their
//! own persistence. The flat task table plus the parent and edge
//! indexes are held behind async locks; every read hands back fresh
//! clones, so the scheduler's no-cache contract holds trivially.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{DependencyEdge, Task, TaskStatus};
use crate::domain::ports::TaskStore;

/// A `TaskStore` over process memory.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
    edges: RwLock<Vec<DependencyEdge>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the ids of every task in the subtree below a root.
    async fn subtree_ids(&self, root_id: Uuid) -> Vec<Uuid> {
        let tasks = self.tasks.read().await;
        let mut children_index: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks.values() {
            if let Some(parent_id) = task.parent_id {
                children_index.entry(parent_id).or_default().push(task.id);
            }
        }

        let mut result = Vec::new();
        let mut frontier = vec![root_id];
        while let Some(current) = frontier.pop() {
            if let Some(children) = children_index.get(&current) {
                for &child in children {
                    result.push(child);
                    frontier.push(child);
                }
            }
        }
        result
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> EngineResult<()> {
        task.validate().map_err(EngineError::ValidationFailed)?;
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(EngineError::StoreError(format!(
                "task {} already exists",
                task.id
            )));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> EngineResult<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update(&self, task: &Task) -> EngineResult<()> {
        let mut tasks = self.tasks.write().await;
        if !tasks.contains_key(&task.id) {
            return Err(EngineError::TaskNotFound(task.id));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: TaskStatus) -> EngineResult<()> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(EngineError::TaskNotFound(id))?;
        task.status = status;
        task.updated_at = Utc::now();
        if status.is_terminal() {
            task.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn children_of(&self, parent_id: Uuid) -> EngineResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let mut children: Vec<Task> = tasks
            .values()
            .filter(|t| t.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn descendants_of(&self, root_id: Uuid) -> EngineResult<Vec<Task>> {
        let ids = self.subtree_ids(root_id).await;
        let tasks = self.tasks.read().await;
        let mut descendants: Vec<Task> =
            ids.iter().filter_map(|id| tasks.get(id).cloned()).collect();
        descendants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(descendants)
    }

    async fn insert_edge(&self, edge: &DependencyEdge) -> EngineResult<()> {
        if edge.is_self_loop() {
            return Err(EngineError::SelfDependency(edge.blocker_id));
        }
        {
            let tasks = self.tasks.read().await;
            for endpoint in [edge.blocker_id, edge.blocked_id] {
                if !tasks.contains_key(&endpoint) {
                    return Err(EngineError::TaskNotFound(endpoint));
                }
            }
        }
        self.edges.write().await.push(edge.clone());
        Ok(())
    }

    async fn edges_blocking(&self, blocked_id: Uuid) -> EngineResult<Vec<DependencyEdge>> {
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| e.blocked_id == blocked_id)
            .cloned()
            .collect())
    }

    async fn edges_in_tree(&self, root_id: Uuid) -> EngineResult<Vec<DependencyEdge>> {
        let ids: std::collections::HashSet<Uuid> =
            self.subtree_ids(root_id).await.into_iter().collect();
        Ok(self
            .edges
            .read()
            .await
            .iter()
            .filter(|e| ids.contains(&e.blocked_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        store.insert(&task).await.unwrap();

        let fetched = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "t");
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        store.insert(&task).await.unwrap();
        assert!(store.insert(&task).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_task_fails() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        assert!(matches!(
            store.update(&task).await,
            Err(EngineError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_status_bumps_timestamps() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        store.insert(&task).await.unwrap();

        store.update_status(task.id, TaskStatus::Failed).await.unwrap();
        let stored = store.get(task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
        assert!(stored.completed_at.is_some());
        assert!(stored.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn test_descendants_cover_nested_subtree() {
        let store = InMemoryTaskStore::new();
        let root = Task::new("root", "d");
        let child = Task::new("child", "d").with_parent(root.id);
        let grandchild = Task::new("grandchild", "d").with_parent(child.id);
        store.insert(&root).await.unwrap();
        store.insert(&child).await.unwrap();
        store.insert(&grandchild).await.unwrap();

        let descendants = store.descendants_of(root.id).await.unwrap();
        assert_eq!(descendants.len(), 2);

        let children = store.children_of(root.id).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
    }

    #[tokio::test]
    async fn test_self_loop_edge_rejected() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        store.insert(&task).await.unwrap();

        let edge = DependencyEdge::new(task.id, task.id, "loop");
        assert!(matches!(
            store.insert_edge(&edge).await,
            Err(EngineError::SelfDependency(_))
        ));
    }

    #[tokio::test]
    async fn test_edge_endpoints_must_exist() {
        let store = InMemoryTaskStore::new();
        let task = Task::new("t", "d");
        store.insert(&task).await.unwrap();

        let edge = DependencyEdge::new(task.id, Uuid::new_v4(), "");
        assert!(matches!(
            store.insert_edge(&edge).await,
            Err(EngineError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_edges_in_tree_scoped_to_subtree() {
        let store = InMemoryTaskStore::new();
        let root = Task::new("root", "d");
        let a = Task::new("a", "d").with_parent(root.id);
        let b = Task::new("b", "d").with_parent(root.id);
        let other_root = Task::new("other", "d");
        let outsider = Task::new("outsider", "d").with_parent(other_root.id);
        for t in [&root, &a, &b, &other_root, &outsider] {
            store.insert(t).await.unwrap();
        }
        store
            .insert_edge(&DependencyEdge::new(a.id, b.id, ""))
            .await
            .unwrap();
        store
            .insert_edge(&DependencyEdge::new(a.id, outsider.id, ""))
            .await
            .unwrap();

        let edges = store.edges_in_tree(root.id).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].blocked_id, b.id);
    }
}
