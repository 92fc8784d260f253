// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`request`] holds the request/result model shared by both runners.
//! - [`engine`] is the async engine: reader task per stream, timeout and
//!   cancellation race, tree-kill escalation, bounded drain.
//! - [`sync_runner`] is the fully-blocking legacy variant with output
//!   embedded in the result instead of streamed to sinks.
//! - [`quote`] composes (and re-tokenizes) display command lines.

pub mod engine;
pub mod quote;
pub mod request;
pub mod sync_runner;

pub use engine::{EngineConfig, ExecutionEngine, ExecutionSinks};
pub use request::{ExecutionRequest, ExecutionResult, UNKNOWN_EXIT_CODE};
pub use sync_runner::{SyncOutput, SyncRunner};
