// src/monitor/mod.rs

//! Completion monitoring: wait until a set of tasks reaches a target state,
//! or a timeout elapses.
//!
//! The monitor polls the job at a fixed interval. It also wakes early when
//! the job reports a state change, but correctness never depends on that
//! wake-up.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::dag::TaskState;
use crate::engine::Job;
use crate::errors::Result;

pub use crate::dag::TaskStateCounts;

/// Lower bound on the poll interval; a zero interval would busy-loop.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls a [`Job`] on behalf of callers that want to block until tasks
/// finish.
#[derive(Debug, Clone)]
pub struct CompletionMonitor {
    job: Job,
    poll_interval: Duration,
}

impl CompletionMonitor {
    /// Monitor using the job's configured poll interval.
    pub fn new(job: Job) -> Self {
        let poll_interval = job.settings().poll_interval.max(MIN_POLL_INTERVAL);
        Self { job, poll_interval }
    }

    /// Override the poll interval. Values below one millisecond are raised
    /// to one millisecond.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait until `target` holds for the state of every task in `tasks`.
    ///
    /// Returns `Ok(false)` once the predicate holds for every task, and
    /// `Ok(true)` when it did not hold in time. `Ok(true)` covers two cases:
    /// - the deadline passed, or
    /// - every watched task is terminal and the predicate still fails, so it
    ///   can never be satisfied. This returns before the deadline.
    ///
    /// Unknown task ids fail immediately with `UnknownTask`. Each check reads
    /// one consistent snapshot. The deadline is never overshot by more than
    /// one poll interval. A timeout too large to represent as an instant
    /// (e.g. `Duration::MAX`) means no deadline.
    pub async fn wait_for<S, P>(&self, tasks: &[S], target: P, timeout: Duration) -> Result<bool>
    where
        S: AsRef<str>,
        P: Fn(&TaskState) -> bool,
    {
        let deadline = Instant::now().checked_add(timeout);
        let mut polls: u64 = 0;

        loop {
            // Register for change notifications before reading, so a change
            // between the read and the sleep still wakes us.
            let changed = self.job.changed().notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            let states = self.job.states_of(tasks)?;
            polls += 1;

            if states.iter().all(&target) {
                debug!(tasks = tasks.len(), polls, "monitored tasks reached target state");
                return Ok(false);
            }

            if states.iter().all(TaskState::is_terminal) {
                info!(
                    tasks = tasks.len(),
                    "monitored tasks are terminal but not in the target state"
                );
                return Ok(true);
            }

            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        info!(tasks = tasks.len(), ?timeout, "timed out waiting for tasks");
                        return Ok(true);
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };

            tokio::select! {
                _ = sleep(nap) => {}
                _ = &mut changed => {}
            }
        }
    }

    /// Wait until every task in `tasks` is `Completed`.
    pub async fn wait_all_completed<S: AsRef<str>>(
        &self,
        tasks: &[S],
        timeout: Duration,
    ) -> Result<bool> {
        self.wait_for(tasks, TaskState::is_completed, timeout).await
    }

    /// Per-state task counts from one snapshot of the job.
    pub fn counts(&self) -> TaskStateCounts {
        self.job.counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobSettings;
    use crate::dag::{TaskGraph, TaskSpec};

    #[test]
    fn zero_poll_interval_is_raised_to_minimum() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        let settings = JobSettings {
            poll_interval: Duration::ZERO,
            ..JobSettings::default()
        };
        let job = Job::new(settings, graph).unwrap();

        let monitor = CompletionMonitor::new(job);
        assert_eq!(monitor.poll_interval(), MIN_POLL_INTERVAL);
        let monitor = monitor.with_poll_interval(Duration::ZERO);
        assert_eq!(monitor.poll_interval(), MIN_POLL_INTERVAL);
    }
}
