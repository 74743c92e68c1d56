//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the engine consumes:
//! - `TaskStore`: the dependency graph store (tasks + edges)
//! - `Agent`: the Coder/QA/Docs worker contract
//! - `ContextResolver`: merged ancestor context for a task
//! - `EventSink`: fire-and-forget status notifications
//!
//! These traits keep the engine independent of any specific persistence,
//! transport, or agent implementation.

pub mod agent;
pub mod context_resolver;
pub mod event_sink;
pub mod task_store;

pub use agent::Agent;
pub use context_resolver::ContextResolver;
pub use event_sink::EventSink;
pub use task_store::TaskStore;
