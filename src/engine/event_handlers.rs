// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::dag::{RunnableTask, TaskId};
use crate::engine::job::Job;
use crate::errors::Result;
use crate::types::ExitStatus;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<RunnableTask>),
    /// Nothing can make progress any more; the runtime should stop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn stop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Take the initial runnable set and dispatch it.
pub fn handle_start(job: &Job, in_flight: &mut HashSet<TaskId>) -> Result<CoreStep> {
    let roots = job.initial_runnable_set()?;
    let names: Vec<_> = roots.iter().map(|t| t.id.as_str()).collect();
    info!(job = %job.settings().id, ?names, "dispatching initial runnable set");

    let mut commands = Vec::new();
    let dispatched = mark_dispatched(job, in_flight, roots);
    if !dispatched.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatched));
    }

    Ok(finish_step(job, in_flight, commands))
}

/// Handle a task completion event.
///
/// Rejected reports (unknown task, double completion) are logged and
/// otherwise ignored; they indicate an executor bug and must not take the
/// rest of the job down.
pub fn handle_task_completion(
    job: &Job,
    in_flight: &mut HashSet<TaskId>,
    task: TaskId,
    status: ExitStatus,
) -> CoreStep {
    in_flight.remove(&task);

    match job.report_completion(&task, status) {
        Ok(step) => {
            if !step.newly_blocked.is_empty() {
                warn!(
                    task = %task,
                    blocked = ?step.newly_blocked,
                    "dependents blocked by exit status"
                );
            }
        }
        Err(e) => {
            warn!(task = %task, %status, error = %e, "completion report rejected");
        }
    }

    let mut commands = Vec::new();
    let ready = job.drain_runnable();
    let dispatched = mark_dispatched(job, in_flight, ready);
    if !dispatched.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatched));
    }

    finish_step(job, in_flight, commands)
}

/// Move tasks to `Running` and record them as in flight.
fn mark_dispatched(
    job: &Job,
    in_flight: &mut HashSet<TaskId>,
    tasks: Vec<RunnableTask>,
) -> Vec<RunnableTask> {
    tasks
        .into_iter()
        .filter(|t| match job.mark_running(&t.id) {
            Ok(()) => {
                in_flight.insert(t.id.clone());
                true
            }
            Err(e) => {
                warn!(task = %t.id, error = %e, "skipping dispatch");
                false
            }
        })
        .collect()
}

/// Append `RequestExit` once the job is settled and nothing is in flight.
fn finish_step(job: &Job, in_flight: &HashSet<TaskId>, mut commands: Vec<CoreCommand>) -> CoreStep {
    if in_flight.is_empty() && job.is_settled() {
        let counts = job.counts();
        debug!(?counts, "job settled");
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    CoreStep {
        commands,
        keep_running: true,
    }
}
