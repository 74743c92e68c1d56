//! Adapter implementations of the engine's ports.

pub mod agents;
pub mod context;
pub mod events;
pub mod memory;

pub use agents::ScriptedAgent;
pub use context::StaticContext;
pub use events::{NullEventSink, RecordingEventSink, TracingEventSink};
pub use memory::InMemoryTaskStore;
