//! Verified file mutation records.
//!
//! A `VerifiedFileAction` is created only by the Reality Engine at the
//! moment of a write, with the byte size re-read from disk rather than
//! trusted from the caller. Actions are immutable once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of filesystem mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Create,
    Update,
    Delete,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Severity of a static quality finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    /// Hard rejection; blocks the write entirely
    Blocker,
    /// Surfaced to the caller but does not block
    Warning,
}

/// One static quality-check finding against a written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFinding {
    pub severity: FindingSeverity,
    /// 1-based line the finding anchors to
    pub line: usize,
    pub message: String,
}

impl QualityFinding {
    pub fn blocker(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: FindingSeverity::Blocker,
            line,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: FindingSeverity::Warning,
            line,
            message: message.into(),
        }
    }
}

/// The result of one verified disk mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedFileAction {
    /// Task the mutation was performed for
    pub task_id: Uuid,
    /// Path relative to the workspace root
    pub path: String,
    /// Kind of mutation
    pub action: FileAction,
    /// Byte size re-read from disk after the write (0 for deletes)
    pub bytes: u64,
    /// Non-blocking quality findings attached at write time
    pub findings: Vec<QualityFinding>,
    /// When the mutation was verified
    pub verified_at: DateTime<Utc>,
}

impl VerifiedFileAction {
    pub fn new(task_id: Uuid, path: impl Into<String>, action: FileAction, bytes: u64) -> Self {
        Self {
            task_id,
            path: path.into(),
            action,
            bytes,
            findings: Vec::new(),
            verified_at: Utc::now(),
        }
    }

    /// Attach quality findings.
    pub fn with_findings(mut self, findings: Vec<QualityFinding>) -> Self {
        self.findings = findings;
        self
    }
}

/// Result of a trust-but-verify sweep over claimed paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteAudit {
    /// True when every claimed path exists on disk
    pub all_present: bool,
    /// Paths claimed but absent
    pub missing: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_record() {
        let action = VerifiedFileAction::new(Uuid::new_v4(), "src/auth.rs", FileAction::Create, 42)
            .with_findings(vec![QualityFinding::warning(3, "TODO with no implementation")]);
        assert_eq!(action.action, FileAction::Create);
        assert_eq!(action.bytes, 42);
        assert_eq!(action.findings.len(), 1);
    }

    #[test]
    fn test_finding_severity() {
        let blocker = QualityFinding::blocker(1, "placeholder body");
        let warning = QualityFinding::warning(1, "missing annotation");
        assert_eq!(blocker.severity, FindingSeverity::Blocker);
        assert_eq!(warning.severity, FindingSeverity::Warning);
    }
}
