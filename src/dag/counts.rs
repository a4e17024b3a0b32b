// src/dag/counts.rs

use crate::dag::task::TaskState;

/// Number of tasks in each [`TaskState`], taken from one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStateCounts {
    pub pending: usize,
    pub runnable: usize,
    pub running: usize,
    /// Completed tasks whose exit status was `Success`.
    pub succeeded: usize,
    /// Completed tasks with any other exit status.
    pub failed: usize,
    pub blocked: usize,
}

impl TaskStateCounts {
    pub fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Pending => self.pending += 1,
            TaskState::Runnable => self.runnable += 1,
            TaskState::Running => self.running += 1,
            TaskState::Completed(status) if status.is_success() => self.succeeded += 1,
            TaskState::Completed(_) => self.failed += 1,
            TaskState::Blocked => self.blocked += 1,
        }
    }

    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn total(&self) -> usize {
        self.pending + self.runnable + self.running + self.completed() + self.blocked
    }
}

impl FromIterator<TaskState> for TaskStateCounts {
    fn from_iter<I: IntoIterator<Item = TaskState>>(iter: I) -> Self {
        let mut counts = Self::default();
        for state in iter {
            counts.record(state);
        }
        counts
    }
}
