// src/dag/scheduler_step.rs

//! Result type for a single completion report.

use crate::dag::task::TaskId;
use crate::types::ExitAction;

/// What changed as a result of one `report_completion` call.
///
/// This is informational: the tasks in `newly_runnable` are also queued on
/// the scheduler's runnable sequence, which is what executors should drain.
#[derive(Debug, Clone)]
pub struct SchedulerStep {
    /// Action the finished task's exit policy resolved to.
    pub action: ExitAction,
    /// Dependents that became `Runnable` in this step.
    pub newly_runnable: Vec<TaskId>,
    /// Dependents that became `Blocked` in this step.
    pub newly_blocked: Vec<TaskId>,
    /// Whether every task in the graph is now terminal.
    pub all_terminal: bool,
}
