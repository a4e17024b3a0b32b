// src/engine/core.rs

//! Core runtime state machine.
//!
//! `CoreRuntime` consumes [`RuntimeEvent`]s and produces [`CoreStep`]s
//! describing what the IO shell should do next. It has no channels and
//! spawns nothing, so it can be stepped by hand in tests.

use std::collections::HashSet;

use crate::dag::TaskId;
use crate::engine::event_handlers::{handle_start, handle_task_completion, CoreStep};
use crate::engine::job::Job;
use crate::engine::RuntimeEvent;
use crate::errors::Result;

#[derive(Debug)]
pub struct CoreRuntime {
    job: Job,
    /// Tasks dispatched to the executor that have not reported back yet.
    in_flight: HashSet<TaskId>,
}

impl CoreRuntime {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            in_flight: HashSet::new(),
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Dispatch the initial runnable set. Call once before stepping events.
    pub fn start(&mut self) -> Result<CoreStep> {
        handle_start(&self.job, &mut self.in_flight)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, status } => {
                handle_task_completion(&self.job, &mut self.in_flight, task, status)
            }
            RuntimeEvent::ShutdownRequested => CoreStep::stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JobSettings;
    use crate::dag::{TaskGraph, TaskSpec, TaskState};
    use crate::engine::CoreCommand;
    use crate::types::ExitStatus;

    fn dispatched(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks),
                CoreCommand::RequestExit => None,
            })
            .flatten()
            .map(|t| t.id.clone())
            .collect()
    }

    fn core_for(graph: TaskGraph) -> CoreRuntime {
        CoreRuntime::new(Job::new(JobSettings::default(), graph).unwrap())
    }

    #[test]
    fn steps_a_chain_to_completion() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        graph.add_task(TaskSpec::new("B", "b").depends_on(["A"])).unwrap();
        let mut core = core_for(graph);

        let step = core.start().unwrap();
        assert_eq!(dispatched(&step), vec!["A"]);
        assert!(step.keep_running);
        assert_eq!(core.job().state_of("A"), Some(TaskState::Running));

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "A".into(),
            status: ExitStatus::Success,
        });
        assert_eq!(dispatched(&step), vec!["B"]);
        assert!(step.keep_running);

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "B".into(),
            status: ExitStatus::Success,
        });
        assert!(!step.keep_running);
        assert!(matches!(step.commands.last(), Some(CoreCommand::RequestExit)));
        assert_eq!(core.in_flight(), 0);
    }

    #[test]
    fn stops_when_only_implicitly_blocked_tasks_remain() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        graph.add_task(TaskSpec::new("B", "b").depends_on(["A"])).unwrap();
        graph.add_task(TaskSpec::new("C", "c").depends_on(["B"])).unwrap();
        let mut core = core_for(graph);
        core.start().unwrap();

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "A".into(),
            status: ExitStatus::Failure(2),
        });
        assert!(!step.keep_running);
        assert_eq!(core.job().state_of("C"), Some(TaskState::Pending));
    }

    #[test]
    fn double_completion_is_ignored() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        graph.add_task(TaskSpec::new("B", "b")).unwrap();
        let mut core = core_for(graph);
        core.start().unwrap();

        let done = RuntimeEvent::TaskCompleted {
            task: "A".into(),
            status: ExitStatus::Success,
        };
        assert!(core.step(done.clone()).keep_running);
        let step = core.step(done);
        assert!(step.keep_running);
        assert!(dispatched(&step).is_empty());
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut graph = TaskGraph::new();
        graph.add_task(TaskSpec::new("A", "a")).unwrap();
        let mut core = core_for(graph);
        core.start().unwrap();

        assert!(!core.step(RuntimeEvent::ShutdownRequested).keep_running);
    }
}
