//! Graph Scheduler: the topological-front query over a task tree.
//!
//! Every call re-reads the store from scratch so externally-applied
//! status changes (human approval, concurrent completion) are always
//! honored. No graph state is cached across calls.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::models::{DependencyEdge, Task, TaskStatus};
use crate::domain::ports::TaskStore;

/// One incomplete blocker and how many tasks it currently holds up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottleneck {
    pub task_id: Uuid,
    pub title: String,
    pub blocked_count: usize,
}

/// Computes the ready set of a task tree from the store.
pub struct GraphScheduler<S: TaskStore> {
    store: Arc<S>,
}

impl<S: TaskStore> GraphScheduler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Every PENDING descendant of `root_id` whose blockers are all
    /// COMPLETED, ordered by creation time then id for reproducible
    /// dispatch.
    #[instrument(skip(self))]
    pub async fn ready_tasks(&self, root_id: Uuid) -> EngineResult<Vec<Task>> {
        let descendants = self.store.descendants_of(root_id).await?;
        let status_by_id: HashMap<Uuid, TaskStatus> =
            descendants.iter().map(|t| (t.id, t.status)).collect();

        let mut ready = Vec::new();
        for task in descendants {
            if task.status != TaskStatus::Pending {
                continue;
            }

            let mut blocked = false;
            for edge in self.store.edges_blocking(task.id).await? {
                let blocker_status = match status_by_id.get(&edge.blocker_id) {
                    Some(status) => *status,
                    // Blocker outside the subtree: re-read it directly.
                    None => match self.store.get(edge.blocker_id).await? {
                        Some(blocker) => blocker.status,
                        None => {
                            blocked = true;
                            break;
                        }
                    },
                };
                if blocker_status != TaskStatus::Completed {
                    blocked = true;
                    break;
                }
            }

            if !blocked {
                ready.push(task);
            }
        }

        ready.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(ready)
    }

    /// Diagnostic: for each incomplete blocker in the tree, the number
    /// of distinct tasks it currently blocks, descending. Not used for
    /// control flow.
    #[instrument(skip(self))]
    pub async fn bottlenecks(&self, root_id: Uuid) -> EngineResult<Vec<Bottleneck>> {
        let descendants = self.store.descendants_of(root_id).await?;
        let title_by_id: HashMap<Uuid, &str> =
            descendants.iter().map(|t| (t.id, t.title.as_str())).collect();
        let incomplete: HashSet<Uuid> = descendants
            .iter()
            .filter(|t| t.status != TaskStatus::Completed)
            .map(|t| t.id)
            .collect();

        let mut blocked_by: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for edge in self.store.edges_in_tree(root_id).await? {
            if incomplete.contains(&edge.blocker_id) {
                blocked_by
                    .entry(edge.blocker_id)
                    .or_default()
                    .insert(edge.blocked_id);
            }
        }

        let mut bottlenecks: Vec<Bottleneck> = blocked_by
            .into_iter()
            .map(|(task_id, blocked)| Bottleneck {
                task_id,
                title: title_by_id.get(&task_id).unwrap_or(&"").to_string(),
                blocked_count: blocked.len(),
            })
            .collect();

        bottlenecks.sort_by(|a, b| {
            b.blocked_count
                .cmp(&a.blocked_count)
                .then(a.task_id.cmp(&b.task_id))
        });
        Ok(bottlenecks)
    }

    /// DFS cycle detection over the edge set restricted to non-completed
    /// blockers. The engine never constructs cycles itself; this is the
    /// defense against a store seeded with one.
    pub fn find_cycle(tasks: &[Task], edges: &[DependencyEdge]) -> Option<Vec<Uuid>> {
        let completed: HashSet<Uuid> = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.id)
            .collect();

        let mut graph: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for task in tasks {
            graph.entry(task.id).or_default();
        }
        for edge in edges {
            if !completed.contains(&edge.blocker_id) {
                graph.entry(edge.blocked_id).or_default().push(edge.blocker_id);
            }
        }

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        let mut nodes: Vec<Uuid> = graph.keys().copied().collect();
        nodes.sort();
        for node in nodes {
            if !visited.contains(&node)
                && detect_cycle_util(node, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path);
            }
        }
        None
    }
}

// Standalone helper for cycle detection (no self needed)
fn detect_cycle_util(
    node: Uuid,
    graph: &HashMap<Uuid, Vec<Uuid>>,
    visited: &mut HashSet<Uuid>,
    rec_stack: &mut HashSet<Uuid>,
    path: &mut Vec<Uuid>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(&node) {
        for &neighbor in neighbors {
            if !visited.contains(&neighbor) {
                if detect_cycle_util(neighbor, graph, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(&neighbor) {
                if let Some(cycle_start) = path.iter().position(|&id| id == neighbor) {
                    path.drain(0..cycle_start);
                }
                return true;
            }
        }
    }

    rec_stack.remove(&node);
    path.pop();
    false
}
