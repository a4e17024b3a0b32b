// src/engine/mod.rs

//! Orchestration engine for batchdag.
//!
//! This module ties together:
//! - the shared [`Job`] handle around the dependency scheduler
//! - a pure core state machine that turns completion events into
//!   dispatch commands
//! - the async runtime loop that feeds executor events into the core and
//!   hands runnable tasks to an executor backend
//!
//! The pure core lives in [`core`]; the async/IO shell is implemented in
//! [`runtime`].

use crate::dag::TaskId;
use crate::types::ExitStatus;

/// Events flowing into the runtime from executors and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished with a terminal status.
    TaskCompleted { task: TaskId, status: ExitStatus },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod job;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use job::Job;
pub use runtime::Runtime;
