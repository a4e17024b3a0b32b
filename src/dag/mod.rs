// src/dag/mod.rs

//! Task graph representation and dependency scheduling.
//!
//! - [`graph`] holds the tasks of one job and validates that it is acyclic.
//! - [`task`] defines task specs, nodes, states and the runnable view.
//! - [`exit`] contains exit policies and the exit-status resolver.
//! - [`scheduler`] is the per-job state machine that applies completions.
//! - [`state_manager`] propagates a resolved action to direct dependents.
//! - [`scheduler_step`] defines the result type of a completion report.
//! - [`counts`] aggregates task states.

pub mod counts;
pub mod exit;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;

pub use counts::TaskStateCounts;
pub use exit::{resolve, ExitCodeRange, ExitPolicy};
pub use graph::TaskGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{RunnableTask, TaskId, TaskIdRange, TaskNode, TaskSpec, TaskState};
