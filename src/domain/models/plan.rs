//! Plan manifests.
//!
//! A plan manifest is the YAML handoff format from the upstream planner:
//! a root task, its subtasks keyed by short names, per-subtask plan
//! steps, and blocker -> blocked dependency declarations. Validation
//! here is pure; materialization into a store lives in
//! `services::plan_loader`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::task::PlanStep;
use crate::domain::errors::{EngineError, EngineResult};

/// Root task declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootSpec {
    /// Root task title
    pub title: String,
    /// Root task description
    #[serde(default)]
    pub description: String,
    /// Workspace directory the run mutates
    #[serde(default = "default_workspace")]
    pub workspace: String,
}

fn default_workspace() -> String {
    ".".to_string()
}

/// One subtask declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Manifest-local key other tasks reference in `depends_on`
    pub key: String,
    /// Task title
    pub title: String,
    /// Task description
    #[serde(default)]
    pub description: String,
    /// Ordered plan steps
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    /// Keys of tasks that must complete first
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Why the dependencies exist; keyed by blocker key
    #[serde(default)]
    pub dependency_reasons: HashMap<String, String>,
}

/// A full plan manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanManifest {
    /// The root task
    pub root: RootSpec,
    /// Subtasks in declaration order
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl PlanManifest {
    /// Parse a manifest from YAML.
    pub fn from_yaml(yaml: &str) -> EngineResult<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate manifest invariants: unique keys, known dependency
    /// references, no self-dependencies, and an acyclic dependency set.
    pub fn validate(&self) -> EngineResult<()> {
        if self.root.title.trim().is_empty() {
            return Err(EngineError::ManifestInvalid("root title is empty".to_string()));
        }

        let mut keys = HashSet::new();
        for task in &self.tasks {
            if task.key.trim().is_empty() {
                return Err(EngineError::ManifestInvalid(format!(
                    "task '{}' has an empty key",
                    task.title
                )));
            }
            if !keys.insert(task.key.as_str()) {
                return Err(EngineError::ManifestInvalid(format!(
                    "duplicate task key '{}'",
                    task.key
                )));
            }
        }

        for task in &self.tasks {
            for dep in &task.depends_on {
                if dep == &task.key {
                    return Err(EngineError::ManifestInvalid(format!(
                        "task '{}' depends on itself",
                        task.key
                    )));
                }
                if !keys.contains(dep.as_str()) {
                    return Err(EngineError::ManifestInvalid(format!(
                        "task '{}' depends on unknown key '{}'",
                        task.key, dep
                    )));
                }
            }
        }

        if let Some(cycle) = self.find_key_cycle() {
            return Err(EngineError::ManifestInvalid(format!(
                "dependency cycle: {}",
                cycle.join(" -> ")
            )));
        }

        Ok(())
    }

    /// DFS cycle detection over manifest keys.
    fn find_key_cycle(&self) -> Option<Vec<String>> {
        let adjacency: HashMap<&str, &[String]> = self
            .tasks
            .iter()
            .map(|t| (t.key.as_str(), t.depends_on.as_slice()))
            .collect();

        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for task in &self.tasks {
            if !visited.contains(task.key.as_str())
                && visit(task.key.as_str(), &adjacency, &mut visited, &mut rec_stack, &mut path)
            {
                return Some(path.into_iter().map(String::from).collect());
            }
        }
        None
    }
}

fn visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, &'a [String]>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> bool {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(deps) = adjacency.get(node) {
        for dep in deps.iter() {
            if !visited.contains(dep.as_str()) {
                if visit(dep.as_str(), adjacency, visited, rec_stack, path) {
                    return true;
                }
            } else if rec_stack.contains(dep.as_str()) {
                if let Some(start) = path.iter().position(|&k| k == dep.as_str()) {
                    path.drain(0..start);
                }
                return true;
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
root:
  title: Build auth
  workspace: .
tasks:
  - key: schema
    title: Add user schema
    steps:
      - persona: coder
        description: write the migration
        files: [migrations/001_users.sql]
  - key: endpoint
    title: Add login endpoint
    depends_on: [schema]
    dependency_reasons:
      schema: endpoint reads the users table
"#;

    #[test]
    fn test_valid_manifest_parses() {
        let manifest = PlanManifest::from_yaml(VALID).unwrap();
        assert_eq!(manifest.tasks.len(), 2);
        assert_eq!(manifest.tasks[1].depends_on, vec!["schema"]);
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let yaml = r#"
root: { title: r }
tasks:
  - key: a
    title: A
    depends_on: [ghost]
"#;
        let err = PlanManifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown key 'ghost'"));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let yaml = r#"
root: { title: r }
tasks:
  - key: a
    title: A
    depends_on: [a]
"#;
        let err = PlanManifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("depends on itself"));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let yaml = r#"
root: { title: r }
tasks:
  - key: a
    title: A
  - key: a
    title: Again
"#;
        let err = PlanManifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate task key"));
    }

    #[test]
    fn test_cycle_rejected() {
        let yaml = r#"
root: { title: r }
tasks:
  - key: a
    title: A
    depends_on: [b]
  - key: b
    title: B
    depends_on: [a]
"#;
        let err = PlanManifest::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }
}
