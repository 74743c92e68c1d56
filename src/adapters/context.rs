//! Static context resolver adapter.

use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::ports::ContextResolver;

/// A resolver that hands every task the same fixed key-value context.
///
/// Stands in for the external knowledge-inheritance resolver in tests
/// and single-process demos.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    entries: BTreeMap<String, String>,
}

impl StaticContext {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Add one entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl ContextResolver for StaticContext {
    async fn resolve(&self, _task_id: Uuid) -> EngineResult<BTreeMap<String, String>> {
        Ok(self.entries.clone())
    }
}
