//! Scheduler integration scenarios: the ready set follows completions
//! through a diamond-shaped dependency graph.

use std::sync::Arc;

use foreman::adapters::memory::InMemoryTaskStore;
use foreman::domain::models::{DependencyEdge, Task, TaskStatus};
use foreman::domain::ports::TaskStore;
use foreman::services::GraphScheduler;
use uuid::Uuid;

async fn complete(store: &InMemoryTaskStore, id: Uuid) {
    let mut task = store.get(id).await.unwrap().unwrap();
    task.status = TaskStatus::Completed;
    store.update(&task).await.unwrap();
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

/// A has no deps; B and C depend on A; D depends on B and C.
/// Ready sets in order: {A} -> {B, C} -> {C} -> {D}.
#[tokio::test]
async fn test_diamond_ready_set_progression() {
    let store = Arc::new(InMemoryTaskStore::new());
    let root = Task::new("root", "diamond");
    store.insert(&root).await.unwrap();

    let a = Task::new("A", "first").with_parent(root.id);
    let b = Task::new("B", "after A").with_parent(root.id);
    let c = Task::new("C", "after A").with_parent(root.id);
    let d = Task::new("D", "after B and C").with_parent(root.id);
    for task in [&a, &b, &c, &d] {
        store.insert(task).await.unwrap();
    }
    for (blocker, blocked) in [(&a, &b), (&a, &c), (&b, &d), (&c, &d)] {
        store
            .insert_edge(&DependencyEdge::new(blocker.id, blocked.id, ""))
            .await
            .unwrap();
    }

    let scheduler = GraphScheduler::new(store.clone());

    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["A"]);

    complete(&store, a.id).await;
    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["B", "C"]);

    complete(&store, b.id).await;
    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["C"]);

    complete(&store, c.id).await;
    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["D"]);

    complete(&store, d.id).await;
    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert!(ready.is_empty());
}

/// Tasks outside the root's subtree never appear in its ready set.
#[tokio::test]
async fn test_ready_set_scoped_to_subtree() {
    let store = Arc::new(InMemoryTaskStore::new());
    let root = Task::new("root", "tree one");
    let other_root = Task::new("other", "tree two");
    store.insert(&root).await.unwrap();
    store.insert(&other_root).await.unwrap();

    let mine = Task::new("mine", "d").with_parent(root.id);
    let theirs = Task::new("theirs", "d").with_parent(other_root.id);
    store.insert(&mine).await.unwrap();
    store.insert(&theirs).await.unwrap();

    let scheduler = GraphScheduler::new(store);
    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["mine"]);
}

/// External status changes are honored on the very next call: the
/// scheduler holds no cached graph state.
#[tokio::test]
async fn test_external_approval_is_seen_fresh() {
    let store = Arc::new(InMemoryTaskStore::new());
    let root = Task::new("root", "tree");
    store.insert(&root).await.unwrap();

    let mut reviewed = Task::new("reviewed", "d").with_parent(root.id);
    reviewed.status = TaskStatus::ReviewRequired;
    store.insert(&reviewed).await.unwrap();

    let scheduler = GraphScheduler::new(store.clone());
    assert!(scheduler.ready_tasks(root.id).await.unwrap().is_empty());

    // A human releases the task back to pending between calls.
    let mut approved = store.get(reviewed.id).await.unwrap().unwrap();
    approved.status = TaskStatus::Pending;
    store.update(&approved).await.unwrap();

    let ready = scheduler.ready_tasks(root.id).await.unwrap();
    assert_eq!(titles(&ready), vec!["reviewed"]);
}
