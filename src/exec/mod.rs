// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the commands of runnable tasks with `tokio::process::Command` and
//! reports their terminal status back to the runtime as `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `ShellExecutorBackend` used in production.
//! - [`executor_loop`] owns the background loop that starts task processes.
//! - [`task_runner`] runs one process and maps its exit to an `ExitStatus`.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, ShellExecutorBackend};
pub use executor_loop::spawn_executor;
