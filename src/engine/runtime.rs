// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::RunnableTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives a job's scheduler in response to `RuntimeEvent`s and delegates
/// actual command execution to an `ExecutorBackend`.
///
/// This is a thin IO shell around `CoreRuntime`: it reads events from a
/// channel and dispatches tasks; every scheduling decision is made by the
/// core.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initial runnable set.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Returns once the job is settled, shutdown is requested or the
    ///   event channel closes.
    pub async fn run(mut self) -> Result<()> {
        info!(job = %self.core.job().settings().id, "batchdag runtime started");

        let step = self.core.start()?;
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command).await?;
        }

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                keep_running = false;
            }
        }

        let counts = self.core.job().counts();
        info!(
            succeeded = counts.succeeded,
            failed = counts.failed,
            blocked = counts.blocked,
            pending = counts.pending,
            "runtime exiting"
        );
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await,
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, tasks: Vec<RunnableTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        debug!(?names, "dispatching runnable tasks");

        self.executor.spawn_runnable_tasks(tasks).await
    }
}
