//! Agent adapters.

pub mod scripted;

pub use scripted::ScriptedAgent;
