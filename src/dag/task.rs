// src/dag/task.rs

//! Task specifications, per-task state and the runnable view handed to
//! executors.

use std::fmt;

use crate::dag::exit::{self, ExitPolicy};
use crate::types::{ExitAction, ExitStatus};

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Lifecycle state of a task inside one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Waiting on one or more predecessors.
    Pending,
    /// Every predecessor resolved to `Satisfy`; eligible for execution.
    Runnable,
    /// Handed to an executor.
    Running,
    /// Finished with a terminal exit status.
    Completed(ExitStatus),
    /// A direct predecessor resolved to `Block`; this task never runs.
    Blocked,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed(_) | TaskState::Blocked)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskState::Completed(_))
    }

    /// `Runnable` or `Running`: the task still has work in front of it.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskState::Runnable | TaskState::Running)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => f.write_str("pending"),
            TaskState::Runnable => f.write_str("runnable"),
            TaskState::Running => f.write_str("running"),
            TaskState::Completed(status) => write!(f, "completed ({status})"),
            TaskState::Blocked => f.write_str("blocked"),
        }
    }
}

/// Inclusive range of integer task ids, e.g. `1..=3` names tasks
/// `"1"`, `"2"` and `"3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskIdRange {
    pub start: u64,
    pub end: u64,
}

impl TaskIdRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> {
        (self.start..=self.end).map(|n| n.to_string())
    }
}

/// What a client submits for one task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    /// Opaque command payload; the scheduler never looks inside.
    pub command: String,
    pub depends_on: Vec<TaskId>,
    pub depends_on_ranges: Vec<TaskIdRange>,
    pub exit_policy: ExitPolicy,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskId>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            depends_on: Vec::new(),
            depends_on_ranges: Vec::new(),
            exit_policy: ExitPolicy::default(),
        }
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.depends_on.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn depends_on_range(mut self, start: u64, end: u64) -> Self {
        self.depends_on_ranges.push(TaskIdRange::new(start, end));
        self
    }

    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }
}

/// A task inside a [`TaskGraph`](crate::dag::TaskGraph).
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: TaskId,
    pub command: String,
    pub exit_policy: ExitPolicy,
    /// Direct predecessors, de-duplicated, in declaration order.
    pub deps: Vec<TaskId>,
    pub state: TaskState,
    /// Predecessors that have not yet resolved to `Satisfy`.
    pub(crate) unresolved_deps: usize,
}

impl TaskNode {
    pub(crate) fn new(spec: TaskSpec, deps: Vec<TaskId>) -> Self {
        let unresolved_deps = deps.len();
        Self {
            id: spec.id,
            command: spec.command,
            exit_policy: spec.exit_policy,
            deps,
            state: TaskState::Pending,
            unresolved_deps,
        }
    }

    /// Dependency action this node's exit policy assigns to `status`.
    pub fn resolve_exit(&self, status: ExitStatus) -> ExitAction {
        exit::resolve(&self.exit_policy, status)
    }
}

/// Description of a task that the scheduler wants an executor to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnableTask {
    pub id: TaskId,
    pub command: String,
}

impl RunnableTask {
    pub fn from_node(node: &TaskNode) -> Self {
        Self {
            id: node.id.clone(),
            command: node.command.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_range_expands_inclusively() {
        let ids: Vec<_> = TaskIdRange::new(1, 3).ids().collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Blocked.is_terminal());
        assert!(TaskState::Completed(ExitStatus::Failure(2)).is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
    }
}
