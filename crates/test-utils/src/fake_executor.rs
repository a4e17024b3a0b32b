use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use batchdag::dag::RunnableTask;
use batchdag::engine::RuntimeEvent;
use batchdag::errors::Result;
use batchdag::exec::ExecutorBackend;
use batchdag::types::ExitStatus;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports `TaskCompleted` for each task, with the scripted
///   status for that task or `Success` if none was scripted.
pub struct FakeExecutor {
    runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    statuses: HashMap<String, ExitStatus>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            statuses: HashMap::new(),
        }
    }

    /// Report `status` whenever `task` is dispatched.
    pub fn with_status(mut self, task: &str, status: ExitStatus) -> Self {
        self.statuses.insert(task.to_string(), status);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_runnable_tasks(
        &mut self,
        tasks: Vec<RunnableTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let statuses = self.statuses.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.id.clone());
                }

                let status = statuses.get(&t.id).copied().unwrap_or(ExitStatus::Success);
                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.id.clone(),
                    status,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
