// src/engine/job.rs

//! Thread-safe handle around one job's scheduler.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::info;

use crate::config::JobSettings;
use crate::dag::{
    RunnableTask, Scheduler, SchedulerStep, TaskGraph, TaskId, TaskState, TaskStateCounts,
};
use crate::errors::Result;
use crate::types::ExitStatus;

/// Cloneable handle to a submitted job.
///
/// All scheduler state sits behind one per-job mutex, so concurrent
/// completion reporters never lose an update to a shared dependent and
/// readers always see whole transitions. No method holds the lock across an
/// `.await`.
#[derive(Debug, Clone)]
pub struct Job {
    inner: Arc<JobInner>,
}

#[derive(Debug)]
struct JobInner {
    settings: JobSettings,
    scheduler: Mutex<Scheduler>,
    /// Signalled after every state change.
    changed: Notify,
}

impl Job {
    /// Submit a graph: validates it and wraps it in a scheduler.
    pub fn new(settings: JobSettings, graph: TaskGraph) -> Result<Self> {
        let scheduler = Scheduler::new(graph)?;
        info!(
            job = %settings.id,
            pool = settings.pool_id.as_deref().unwrap_or("-"),
            tasks = scheduler.graph().len(),
            "job submitted"
        );

        Ok(Self {
            inner: Arc::new(JobInner {
                settings,
                scheduler: Mutex::new(scheduler),
                changed: Notify::new(),
            }),
        })
    }

    pub fn settings(&self) -> &JobSettings {
        &self.inner.settings
    }

    pub fn initial_runnable_set(&self) -> Result<Vec<RunnableTask>> {
        let runnable = self.lock().initial_runnable_set()?;
        self.inner.changed.notify_waiters();
        Ok(runnable)
    }

    pub fn report_completion(&self, task: &str, status: ExitStatus) -> Result<SchedulerStep> {
        let step = self.lock().report_completion(task, status)?;
        self.inner.changed.notify_waiters();
        Ok(step)
    }

    pub fn mark_running(&self, task: &str) -> Result<()> {
        self.lock().mark_running(task)?;
        self.inner.changed.notify_waiters();
        Ok(())
    }

    pub fn drain_runnable(&self) -> Vec<RunnableTask> {
        self.lock().drain_runnable()
    }

    pub fn runnable_tasks(&self) -> Vec<RunnableTask> {
        self.lock().runnable_tasks()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.lock().state_of(task)
    }

    pub fn states_of<S: AsRef<str>>(&self, tasks: &[S]) -> Result<Vec<TaskState>> {
        self.lock().states_of(tasks)
    }

    pub fn snapshot(&self) -> BTreeMap<TaskId, TaskState> {
        self.lock().snapshot()
    }

    pub fn counts(&self) -> TaskStateCounts {
        self.lock().counts()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.lock().graph().tasks().map(str::to_string).collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.lock().all_terminal()
    }

    pub fn is_settled(&self) -> bool {
        self.lock().is_settled()
    }

    pub(crate) fn changed(&self) -> &Notify {
        &self.inner.changed
    }

    // Scheduler methods never panic mid-transition; a poisoned lock still
    // guards consistent state.
    fn lock(&self) -> MutexGuard<'_, Scheduler> {
        self.inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::TaskSpec;
    use std::thread;

    #[test]
    fn sibling_completions_from_many_threads_do_not_lose_updates() {
        let width = 32;
        let mut graph = TaskGraph::new();
        let mut ids = Vec::new();
        for i in 0..width {
            let id = format!("p{i}");
            graph.add_task(TaskSpec::new(id.clone(), "true")).unwrap();
            ids.push(id);
        }
        graph
            .add_task(TaskSpec::new("join", "true").depends_on(ids.clone()))
            .unwrap();

        let job = Job::new(JobSettings::default(), graph).unwrap();
        assert_eq!(job.initial_runnable_set().unwrap().len(), width);

        let handles: Vec<_> = ids
            .into_iter()
            .map(|id| {
                let job = job.clone();
                thread::spawn(move || job.report_completion(&id, ExitStatus::Success).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(job.state_of("join"), Some(TaskState::Runnable));
        let drained = job.drain_runnable();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, "join");
    }
}
