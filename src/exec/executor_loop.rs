// src/exec/executor_loop.rs

//! Background loop that starts one process per runnable task.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::{RunnableTask, TaskId};
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned sender is what [`ShellExecutorBackend`](super::ShellExecutorBackend)
/// forwards runnable tasks into. Each task runs in its own Tokio task, so
/// independent tasks execute in parallel. A task id that is still running
/// is never started a second time.
pub fn spawn_executor(runtime_tx: mpsc::Sender<RuntimeEvent>) -> mpsc::Sender<RunnableTask> {
    let (tx, mut rx) = mpsc::channel::<RunnableTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskId, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            if active.contains_key(&task.id) {
                warn!(task = %task.id, "task already running; ignoring duplicate dispatch");
                continue;
            }

            let id = task.id.clone();
            let rt_tx = runtime_tx.clone();
            let handle = tokio::spawn(async move {
                let spawn_id = task.id.clone();
                run_task(task, rt_tx).await;
                debug!(task = %spawn_id, "task runner future finished");
            });
            active.insert(id, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
