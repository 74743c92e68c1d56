//! Reality Engine: verified filesystem mutation.
//!
//! The only component permitted to mutate the workspace on behalf of
//! the engine, and the sole source of truth for whether a claimed file
//! actually exists. Every write is re-read from disk before it is
//! trusted, and `verify_all_writes` re-checks caller-claimed paths
//! regardless of what the ledger says — the defense against an agent
//! that reports success without performing real I/O.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    FileAction, FindingSeverity, VerifiedFileAction, WriteAudit,
};
use crate::services::quality;

/// Write-then-verify layer over one workspace root.
pub struct RealityEngine {
    root: PathBuf,
    ledger: Arc<RwLock<HashMap<Uuid, Vec<VerifiedFileAction>>>>,
}

impl RealityEngine {
    /// Create an engine rooted at the given workspace directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ledger: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The workspace root all relative paths resolve under.
    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative path, rejecting absolute paths and
    /// parent-directory escapes.
    fn resolve(&self, relative_path: &str) -> EngineResult<PathBuf> {
        let candidate = Path::new(relative_path);
        if candidate.is_absolute() {
            return Err(EngineError::PathOutsideWorkspace {
                path: relative_path.to_string(),
            });
        }
        for component in candidate.components() {
            if matches!(component, Component::ParentDir) {
                return Err(EngineError::PathOutsideWorkspace {
                    path: relative_path.to_string(),
                });
            }
        }
        Ok(self.root.join(candidate))
    }

    /// Write a file and verify the result on disk.
    ///
    /// Creates missing parent directories, writes, then re-reads the
    /// byte size from disk. Empty writes and placeholder function
    /// bodies are rejected outright; warnings ride along on the
    /// returned action.
    #[instrument(skip(self, content), fields(task_id = %task_id, path = relative_path))]
    pub async fn write_file(
        &self,
        task_id: Uuid,
        relative_path: &str,
        content: &str,
    ) -> EngineResult<VerifiedFileAction> {
        let absolute = self.resolve(relative_path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let existed = fs::try_exists(&absolute).await?;
        fs::write(&absolute, content).await?;

        // Positive verification: never trust the in-memory buffer.
        let bytes = fs::metadata(&absolute).await?.len();
        if bytes == 0 {
            return Err(EngineError::QualityGateRejected {
                path: relative_path.to_string(),
                reason: "write produced an empty file".to_string(),
            });
        }

        let findings = quality::check_source(relative_path, content);
        if let Some(blocker) = findings
            .iter()
            .find(|f| f.severity == FindingSeverity::Blocker)
        {
            return Err(EngineError::QualityGateRejected {
                path: relative_path.to_string(),
                reason: format!("line {}: {}", blocker.line, blocker.message),
            });
        }
        for finding in &findings {
            warn!(path = relative_path, line = finding.line, "{}", finding.message);
        }

        let action = if existed { FileAction::Update } else { FileAction::Create };
        let verified = VerifiedFileAction::new(task_id, relative_path, action, bytes)
            .with_findings(findings);
        self.record(verified.clone()).await;
        debug!(bytes, action = action.as_str(), "verified write");
        Ok(verified)
    }

    /// Replace an exact substring of an existing file and re-verify.
    ///
    /// Edits never create: a missing target fails with
    /// [`EngineError::EditTargetNotFound`]. A stale anchor (zero
    /// matches of `original`) fails with the distinct
    /// [`EngineError::EditAnchorNotFound`], which is what catches an
    /// agent editing hallucinated context.
    #[instrument(skip(self, original, replacement), fields(task_id = %task_id, path = relative_path))]
    pub async fn edit_file(
        &self,
        task_id: Uuid,
        relative_path: &str,
        original: &str,
        replacement: &str,
    ) -> EngineResult<VerifiedFileAction> {
        let absolute = self.resolve(relative_path)?;
        if !fs::try_exists(&absolute).await? {
            return Err(EngineError::EditTargetNotFound {
                path: relative_path.to_string(),
            });
        }

        let body = fs::read_to_string(&absolute).await?;
        if !body.contains(original) {
            return Err(EngineError::EditAnchorNotFound {
                path: relative_path.to_string(),
            });
        }

        let updated = body.replacen(original, replacement, 1);
        fs::write(&absolute, &updated).await?;

        let bytes = fs::metadata(&absolute).await?.len();
        if bytes == 0 {
            return Err(EngineError::QualityGateRejected {
                path: relative_path.to_string(),
                reason: "edit produced an empty file".to_string(),
            });
        }

        let findings = quality::check_source(relative_path, &updated);
        if let Some(blocker) = findings
            .iter()
            .find(|f| f.severity == FindingSeverity::Blocker)
        {
            return Err(EngineError::QualityGateRejected {
                path: relative_path.to_string(),
                reason: format!("line {}: {}", blocker.line, blocker.message),
            });
        }

        let verified =
            VerifiedFileAction::new(task_id, relative_path, FileAction::Update, bytes)
                .with_findings(findings);
        self.record(verified.clone()).await;
        Ok(verified)
    }

    /// Delete a file and verify it is gone.
    #[instrument(skip(self), fields(task_id = %task_id, path = relative_path))]
    pub async fn delete_file(
        &self,
        task_id: Uuid,
        relative_path: &str,
    ) -> EngineResult<VerifiedFileAction> {
        let absolute = self.resolve(relative_path)?;
        if !fs::try_exists(&absolute).await? {
            return Err(EngineError::EditTargetNotFound {
                path: relative_path.to_string(),
            });
        }

        fs::remove_file(&absolute).await?;
        if fs::try_exists(&absolute).await? {
            return Err(EngineError::ValidationFailed(format!(
                "{relative_path} still present after delete"
            )));
        }

        let verified = VerifiedFileAction::new(task_id, relative_path, FileAction::Delete, 0);
        self.record(verified.clone()).await;
        Ok(verified)
    }

    /// Trust-but-verify sweep over a caller-supplied claim set.
    ///
    /// Re-checks existence on disk for every path, regardless of the
    /// ledger — claims may cover files touched through channels other
    /// than `write_file`/`edit_file`. Idempotent for identical
    /// filesystem state.
    #[instrument(skip(self, claimed_paths))]
    pub async fn verify_all_writes(&self, claimed_paths: &[String]) -> EngineResult<WriteAudit> {
        let mut missing = Vec::new();
        for path in claimed_paths {
            let present = match self.resolve(path) {
                Ok(absolute) => fs::try_exists(&absolute).await?,
                // A claim that escapes the workspace cannot be trusted.
                Err(_) => false,
            };
            if !present {
                missing.push(path.clone());
            }
        }

        if !missing.is_empty() {
            warn!(missing = missing.len(), "claimed artifacts absent from disk");
        }
        Ok(WriteAudit {
            all_present: missing.is_empty(),
            missing,
        })
    }

    /// Every verified action recorded for a task, in write order.
    pub async fn actions_for(&self, task_id: Uuid) -> Vec<VerifiedFileAction> {
        self.ledger
            .read()
            .await
            .get(&task_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Count of distinct paths a task has verifiably changed.
    pub async fn files_changed(&self, task_id: Uuid) -> u32 {
        let ledger = self.ledger.read().await;
        let Some(actions) = ledger.get(&task_id) else {
            return 0;
        };
        let distinct: std::collections::HashSet<&str> =
            actions.iter().map(|a| a.path.as_str()).collect();
        u32::try_from(distinct.len()).unwrap_or(u32::MAX)
    }

    async fn record(&self, action: VerifiedFileAction) {
        self.ledger
            .write()
            .await
            .entry(action.task_id)
            .or_default()
            .push(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine() -> (TempDir, RealityEngine) {
        let dir = TempDir::new().unwrap();
        let engine = RealityEngine::new(dir.path());
        (dir, engine)
    }

    #[tokio::test]
    async fn test_write_round_trip() {
        let (dir, engine) = engine();
        let task_id = Uuid::new_v4();

        let action = engine
            .write_file(task_id, "src/auth.rs", "pub fn token() -> u64 {\n    42\n}\n")
            .await
            .unwrap();
        assert_eq!(action.action, FileAction::Create);

        let read_back = std::fs::read_to_string(dir.path().join("src/auth.rs")).unwrap();
        assert_eq!(read_back, "pub fn token() -> u64 {\n    42\n}\n");
        assert_eq!(action.bytes, read_back.len() as u64);
    }

    #[tokio::test]
    async fn test_empty_write_rejected() {
        let (_dir, engine) = engine();
        let err = engine
            .write_file(Uuid::new_v4(), "empty.rs", "")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::QualityGateRejected { .. }));
    }

    #[tokio::test]
    async fn test_rewrite_is_update() {
        let (_dir, engine) = engine();
        let task_id = Uuid::new_v4();
        engine.write_file(task_id, "a.txt", "one").await.unwrap();
        let action = engine.write_file(task_id, "a.txt", "two").await.unwrap();
        assert_eq!(action.action, FileAction::Update);
    }

    #[tokio::test]
    async fn test_placeholder_body_is_hard_failure() {
        let (dir, engine) = engine();
        let err = engine
            .write_file(Uuid::new_v4(), "handler.py", "def handle(event):\n    pass\n")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::QualityGateRejected { .. }));
        // The rejected body still landed on disk; rejection gates
        // completion, not the raw write.
        assert!(dir.path().join("handler.py").exists());
    }

    #[tokio::test]
    async fn test_warnings_do_not_block() {
        let (_dir, engine) = engine();
        let action = engine
            .write_file(
                Uuid::new_v4(),
                "calc.py",
                "def area(width, height):\n    return width * height\n",
            )
            .await
            .unwrap();
        assert!(!action.findings.is_empty());
    }

    #[tokio::test]
    async fn test_edit_missing_file_fails_distinctly() {
        let (_dir, engine) = engine();
        let err = engine
            .edit_file(Uuid::new_v4(), "ghost.rs", "old", "new")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EditTargetNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_stale_anchor_fails_distinctly() {
        let (_dir, engine) = engine();
        let task_id = Uuid::new_v4();
        engine.write_file(task_id, "a.txt", "real content").await.unwrap();

        let err = engine
            .edit_file(task_id, "a.txt", "hallucinated content", "new")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EditAnchorNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_replaces_and_verifies() {
        let (dir, engine) = engine();
        let task_id = Uuid::new_v4();
        engine
            .write_file(task_id, "a.txt", "let limit = 10;")
            .await
            .unwrap();

        let action = engine
            .edit_file(task_id, "a.txt", "limit = 10", "limit = 20")
            .await
            .unwrap();
        assert_eq!(action.action, FileAction::Update);
        let body = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(body, "let limit = 20;");
    }

    #[tokio::test]
    async fn test_verify_all_writes_finds_missing() {
        let (_dir, engine) = engine();
        let task_id = Uuid::new_v4();
        engine.write_file(task_id, "present.txt", "x").await.unwrap();

        let audit = engine
            .verify_all_writes(&["present.txt".to_string(), "absent.txt".to_string()])
            .await
            .unwrap();
        assert!(!audit.all_present);
        assert_eq!(audit.missing, vec!["absent.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_verify_all_writes_is_idempotent() {
        let (_dir, engine) = engine();
        let claims = vec!["a.txt".to_string(), "b.txt".to_string()];
        let first = engine.verify_all_writes(&claims).await.unwrap();
        let second = engine.verify_all_writes(&claims).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_path_escape_rejected() {
        let (_dir, engine) = engine();
        let err = engine
            .write_file(Uuid::new_v4(), "../outside.txt", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PathOutsideWorkspace { .. }));

        let err = engine
            .write_file(Uuid::new_v4(), "/etc/passwd", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PathOutsideWorkspace { .. }));
    }

    #[tokio::test]
    async fn test_delete_and_ledger() {
        let (_dir, engine) = engine();
        let task_id = Uuid::new_v4();
        engine.write_file(task_id, "a.txt", "x").await.unwrap();
        engine.write_file(task_id, "b.txt", "y").await.unwrap();
        engine.delete_file(task_id, "a.txt").await.unwrap();

        let actions = engine.actions_for(task_id).await;
        assert_eq!(actions.len(), 3);
        assert_eq!(actions[2].action, FileAction::Delete);
        assert_eq!(engine.files_changed(task_id).await, 2);
    }
}
