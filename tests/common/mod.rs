#![allow(dead_code)]

pub use batchdag_test_utils::{init_tracing, with_timeout};
pub use batchdag_test_utils::builders;

use batchdag::dag::{ExitPolicy, Scheduler, TaskGraph, TaskSpec};
use batchdag::types::ExitAction;

/// `Rain` and `Sun` with no dependencies, `Flowers` on both.
pub fn weather_graph() -> TaskGraph {
    let mut graph = TaskGraph::new();
    graph.add_task(TaskSpec::new("Rain", "echo Rain")).unwrap();
    graph.add_task(TaskSpec::new("Sun", "echo Sun")).unwrap();
    graph
        .add_task(TaskSpec::new("Flowers", "echo Flowers").depends_on(["Rain", "Sun"]))
        .unwrap();
    graph
}

/// `A` blocks on exit codes 10 and 20, satisfies otherwise; `B` depends on `A`.
pub fn blocking_pair() -> Scheduler {
    let policy = ExitPolicy::with_default(ExitAction::Satisfy)
        .on_exit_code(10, ExitAction::Block)
        .on_exit_code(20, ExitAction::Block);

    let mut graph = TaskGraph::new();
    graph
        .add_task(TaskSpec::new("A", "run-a").with_exit_policy(policy))
        .unwrap();
    graph
        .add_task(TaskSpec::new("B", "run-b").depends_on(["A"]))
        .unwrap();
    Scheduler::new(graph).unwrap()
}
