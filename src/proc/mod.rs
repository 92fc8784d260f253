// src/proc/mod.rs

//! Process-tree discovery and termination.
//!
//! - [`tree`] enumerates a root pid plus all transitively spawned
//!   descendants from a fresh `ps` listing.
//! - [`kill`] escalates a tree kill: optional diagnostics, SIGABRT, then
//!   SIGKILL, tolerating pids that die in between.
//!
//! Everything here is blocking; the async engine calls in through
//! `spawn_blocking`.

pub mod kill;
pub mod tree;

#[cfg(unix)]
pub use kill::is_alive;
pub use kill::{KillOptions, kill_tree};
pub use tree::descendants;
