// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender,
//! so tests can swap in a fake executor.
//!
//! - `ShellExecutorBackend` is the default implementation. It wraps the
//!   executor loop from [`executor_loop`](super::executor_loop) and forwards
//!   runnable tasks over an mpsc channel.
//! - Tests provide their own `ExecutorBackend` that records which tasks were
//!   dispatched and emits `TaskCompleted` events directly.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::dag::RunnableTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};

use super::executor_loop::spawn_executor;

/// Trait abstracting how runnable tasks are executed.
///
/// Implementations must eventually report exactly one
/// `RuntimeEvent::TaskCompleted` per dispatched task.
pub trait ExecutorBackend: Send {
    fn spawn_runnable_tasks(
        &mut self,
        tasks: Vec<RunnableTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend that runs each task's command as a local shell process.
pub struct ShellExecutorBackend {
    tx: mpsc::Sender<RunnableTask>,
}

impl ShellExecutorBackend {
    /// Spawn the background executor loop, wired to the given runtime
    /// event sender.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for ShellExecutorBackend {
    fn spawn_runnable_tasks(
        &mut self,
        tasks: Vec<RunnableTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
