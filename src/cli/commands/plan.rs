//! Plan manifest commands: validate, show, bottlenecks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::adapters::memory::InMemoryTaskStore;
use crate::cli::output::{format_bottleneck_table, format_task_table};
use crate::domain::models::PlanManifest;
use crate::domain::ports::TaskStore;
use crate::services::{GraphScheduler, PlanLoader};

/// Arguments for the `plan` command group.
#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub action: PlanAction,
}

/// Plan subcommands.
#[derive(Debug, Subcommand)]
pub enum PlanAction {
    /// Check a manifest for unknown references, self-loops, and cycles
    Validate {
        /// Path to the plan manifest YAML
        file: PathBuf,
    },
    /// List the tasks a manifest materializes, with their dependencies
    Show {
        /// Path to the plan manifest YAML
        file: PathBuf,
    },
    /// Rank incomplete blockers by how many tasks they hold up
    Bottlenecks {
        /// Path to the plan manifest YAML
        file: PathBuf,
    },
}

/// Handle the `plan` command group.
pub async fn execute(args: PlanArgs, json: bool) -> Result<()> {
    match args.action {
        PlanAction::Validate { file } => validate(&file, json),
        PlanAction::Show { file } => show(&file, json).await,
        PlanAction::Bottlenecks { file } => bottlenecks(&file, json).await,
    }
}

fn load_manifest(file: &Path) -> Result<PlanManifest> {
    let yaml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    PlanManifest::from_yaml(&yaml)
        .with_context(|| format!("Invalid plan manifest {}", file.display()))
}

fn validate(file: &Path, json: bool) -> Result<()> {
    let manifest = load_manifest(file)?;

    if json {
        let payload = serde_json::json!({
            "valid": true,
            "root": manifest.root.title,
            "tasks": manifest.tasks.len(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Plan is valid.");
        println!("  Root: {}", manifest.root.title);
        println!("  Tasks: {}", manifest.tasks.len());
    }
    Ok(())
}

async fn show(file: &Path, json: bool) -> Result<()> {
    let manifest = load_manifest(file)?;
    let store = Arc::new(InMemoryTaskStore::new());
    let root_id = PlanLoader::new()
        .materialize(&manifest, store.as_ref())
        .await
        .context("Failed to materialize plan")?;

    let tasks = store.descendants_of(root_id).await?;
    let mut blocker_titles: Vec<(uuid::Uuid, Vec<String>)> = Vec::new();
    for task in &tasks {
        let mut blockers = Vec::new();
        for edge in store.edges_blocking(task.id).await? {
            if let Some(blocker) = store.get(edge.blocker_id).await? {
                blockers.push(blocker.title);
            }
        }
        blocker_titles.push((task.id, blockers));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else {
        println!("Plan: {}", manifest.root.title);
        println!("{}", format_task_table(&tasks, &blocker_titles));
    }
    Ok(())
}

async fn bottlenecks(file: &Path, json: bool) -> Result<()> {
    let manifest = load_manifest(file)?;
    let store = Arc::new(InMemoryTaskStore::new());
    let root_id = PlanLoader::new()
        .materialize(&manifest, store.as_ref())
        .await
        .context("Failed to materialize plan")?;

    let scheduler = GraphScheduler::new(store);
    let bottlenecks = scheduler.bottlenecks(root_id).await?;

    if json {
        let payload: Vec<serde_json::Value> = bottlenecks
            .iter()
            .map(|b| {
                serde_json::json!({
                    "task_id": b.task_id,
                    "title": b.title,
                    "blocked_count": b.blocked_count,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if bottlenecks.is_empty() {
        println!("No blocking dependencies.");
    } else {
        println!("{}", format_bottleneck_table(&bottlenecks));
    }
    Ok(())
}
