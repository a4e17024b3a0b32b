// src/dag/scheduler.rs

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info, warn};

use crate::dag::counts::TaskStateCounts;
use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task::{RunnableTask, TaskId, TaskState};
use crate::errors::{BatchdagError, Result};
use crate::types::ExitStatus;

/// Scheduler owns a validated [`TaskGraph`] and drives its state machine.
///
/// It is responsible for:
/// - handing out the initial runnable set
/// - recording terminal statuses reported by executors
/// - resolving each status to a dependency action and applying it to the
///   direct dependents
/// - exposing newly runnable tasks as a drainable sequence
///
/// The scheduler itself is not synchronised; share it through
/// [`Job`](crate::engine::Job), which wraps it in a per-graph lock.
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    /// Tasks that became runnable since the last drain, in transition order.
    ready: VecDeque<TaskId>,
}

impl Scheduler {
    /// Wrap a graph, validating it first if that has not happened yet.
    pub fn new(mut graph: TaskGraph) -> Result<Self> {
        if !graph.is_validated() {
            graph.validate()?;
        }

        Ok(Self {
            graph,
            ready: VecDeque::new(),
        })
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Tasks with no dependencies, transitioned to `Runnable`.
    ///
    /// These are returned directly and are not queued on the runnable
    /// sequence.
    pub fn initial_runnable_set(&mut self) -> Result<Vec<RunnableTask>> {
        self.graph.initial_runnable_set()
    }

    /// Record the terminal status of a task and propagate the resulting
    /// dependency action to its direct dependents.
    ///
    /// Rejected calls leave the scheduler unchanged.
    pub fn report_completion(&mut self, task: &str, status: ExitStatus) -> Result<SchedulerStep> {
        let node = self
            .graph
            .get_mut(task)
            .ok_or_else(|| BatchdagError::UnknownTask(task.to_string()))?;

        match node.state {
            TaskState::Completed(_) | TaskState::Blocked => {
                warn!(task = %task, state = %node.state, "completion reported for terminal task");
                return Err(BatchdagError::AlreadyTerminal(task.to_string()));
            }
            TaskState::Pending => {
                return Err(BatchdagError::NotRunnable {
                    task: task.to_string(),
                    state: node.state.to_string(),
                });
            }
            TaskState::Runnable | TaskState::Running => {}
        }

        node.state = TaskState::Completed(status);
        let action = node.resolve_exit(status);

        info!(task = %task, %status, %action, "task completed");

        let propagation = StateManager::new(&mut self.graph).apply(task, action);
        self.ready
            .extend(propagation.newly_runnable.iter().cloned());

        let all_terminal = self.all_terminal();
        if all_terminal {
            info!("all tasks terminal");
        }

        Ok(SchedulerStep {
            action,
            newly_runnable: propagation.newly_runnable,
            newly_blocked: propagation.newly_blocked,
            all_terminal,
        })
    }

    /// `Runnable -> Running`, called when a task is handed to an executor.
    pub fn mark_running(&mut self, task: &str) -> Result<()> {
        let node = self
            .graph
            .get_mut(task)
            .ok_or_else(|| BatchdagError::UnknownTask(task.to_string()))?;

        if node.state != TaskState::Runnable {
            return Err(BatchdagError::NotRunnable {
                task: task.to_string(),
                state: node.state.to_string(),
            });
        }

        node.state = TaskState::Running;
        debug!(task = %task, "task marked Running");
        Ok(())
    }

    /// Take every task that became runnable since the previous drain.
    ///
    /// Tasks that have since left the `Runnable` state are skipped.
    pub fn drain_runnable(&mut self) -> Vec<RunnableTask> {
        let mut out = Vec::with_capacity(self.ready.len());
        while let Some(id) = self.ready.pop_front() {
            match self.graph.get(&id) {
                Some(node) if node.state == TaskState::Runnable => {
                    out.push(RunnableTask::from_node(node));
                }
                _ => {}
            }
        }
        out
    }

    /// Every task currently in the `Runnable` state, regardless of whether it
    /// has already been drained.
    pub fn runnable_tasks(&self) -> Vec<RunnableTask> {
        self.graph
            .nodes()
            .filter(|n| n.state == TaskState::Runnable)
            .map(RunnableTask::from_node)
            .collect()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.graph.get(task).map(|n| n.state)
    }

    /// States of the given tasks, in the given order.
    pub fn states_of<S: AsRef<str>>(&self, tasks: &[S]) -> Result<Vec<TaskState>> {
        tasks
            .iter()
            .map(|t| {
                let t = t.as_ref();
                self.state_of(t)
                    .ok_or_else(|| BatchdagError::UnknownTask(t.to_string()))
            })
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<TaskId, TaskState> {
        self.graph
            .nodes()
            .map(|n| (n.id.clone(), n.state))
            .collect()
    }

    pub fn counts(&self) -> TaskStateCounts {
        self.graph.nodes().map(|n| n.state).collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.graph.nodes().all(|n| n.state.is_terminal())
    }

    /// No task is `Runnable` or `Running`, so nothing can change any more.
    ///
    /// Tasks still `Pending` in a settled job sit behind a blocked ancestor.
    pub fn is_settled(&self) -> bool {
        !self.graph.nodes().any(|n| n.state.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::exit::ExitPolicy;
    use crate::dag::task::TaskSpec;
    use crate::types::ExitAction;

    fn chain() -> Scheduler {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        graph.add_task(TaskSpec::new("B", "b").depends_on(["A"])).unwrap();
        graph.add_task(TaskSpec::new("C", "c").depends_on(["B"])).unwrap();
        Scheduler::new(graph).unwrap()
    }

    #[test]
    fn new_validates_graph() {
        let mut graph = TaskGraph::new();
        graph
            .add_tasks(vec![
                TaskSpec::new("A", "a").depends_on(["B"]),
                TaskSpec::new("B", "b").depends_on(["A"]),
            ])
            .unwrap();

        assert!(matches!(
            Scheduler::new(graph),
            Err(BatchdagError::CyclicDependency(_))
        ));
    }

    #[test]
    fn pending_task_cannot_complete() {
        let mut s = chain();
        s.initial_runnable_set().unwrap();

        let err = s.report_completion("B", ExitStatus::Success).unwrap_err();
        assert!(matches!(err, BatchdagError::NotRunnable { .. }));
        assert_eq!(s.state_of("B"), Some(TaskState::Pending));
    }

    #[test]
    fn unknown_task_is_rejected() {
        let mut s = chain();
        assert!(matches!(
            s.report_completion("nope", ExitStatus::Success),
            Err(BatchdagError::UnknownTask(_))
        ));
        assert!(matches!(s.mark_running("nope"), Err(BatchdagError::UnknownTask(_))));
    }

    #[test]
    fn mark_running_requires_runnable() {
        let mut s = chain();
        s.initial_runnable_set().unwrap();

        s.mark_running("A").unwrap();
        assert_eq!(s.state_of("A"), Some(TaskState::Running));
        assert!(matches!(
            s.mark_running("A"),
            Err(BatchdagError::NotRunnable { .. })
        ));
    }

    #[test]
    fn drain_is_not_replayable_but_runnable_tasks_is() {
        let mut s = chain();
        s.initial_runnable_set().unwrap();
        s.report_completion("A", ExitStatus::Success).unwrap();

        let drained = s.drain_runnable();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, "B");
        assert!(s.drain_runnable().is_empty());

        let current = s.runnable_tasks();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, "B");
    }

    #[test]
    fn blocking_is_one_hop() {
        let mut s = chain();
        s.initial_runnable_set().unwrap();

        let step = s.report_completion("A", ExitStatus::Failure(1)).unwrap();
        assert_eq!(step.action, ExitAction::Block);
        assert_eq!(step.newly_blocked, vec!["B".to_string()]);

        assert_eq!(s.state_of("B"), Some(TaskState::Blocked));
        assert_eq!(s.state_of("C"), Some(TaskState::Pending));
        assert!(s.is_settled());
        assert!(!s.all_terminal());
    }

    #[test]
    fn counts_reflect_snapshot() {
        let mut graph = TaskGraph::new();
        graph
            .add_task(
                TaskSpec::new("A", "a").with_exit_policy(ExitPolicy::with_default(ExitAction::Satisfy)),
            )
            .unwrap();
        graph.add_task(TaskSpec::new("B", "b")).unwrap();
        graph.add_task(TaskSpec::new("C", "c").depends_on(["A"])).unwrap();
        let mut s = Scheduler::new(graph).unwrap();
        s.initial_runnable_set().unwrap();
        s.mark_running("B").unwrap();
        s.report_completion("A", ExitStatus::Failure(7)).unwrap();

        let counts = s.counts();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.running, 1);
        assert_eq!(counts.runnable, 1);
        assert_eq!(counts.total(), 3);
    }
}
