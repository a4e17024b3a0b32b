// tests/runtime_fake_executor.rs
mod common;
use crate::common::builders::{JobFileBuilder, TaskConfigBuilder};
use crate::common::{init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use batchdag::config::JobFile;
use batchdag::dag::TaskState;
use batchdag::engine::{CoreRuntime, Job, Runtime, RuntimeEvent};
use batchdag::monitor::CompletionMonitor;
use batchdag::types::{ExitAction, ExitStatus};
use batchdag_test_utils::fake_executor::FakeExecutor;

fn job_from(file: JobFile) -> Job {
    let (settings, graph) = file.into_parts();
    Job::new(settings, graph).unwrap()
}

fn diamond() -> JobFile {
    JobFileBuilder::new("diamond")
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .with_task("B", TaskConfigBuilder::new("echo B").depends_on("A").build())
        .with_task("C", TaskConfigBuilder::new("echo C").depends_on("A").build())
        .with_task(
            "D",
            TaskConfigBuilder::new("echo D")
                .depends_on("B")
                .depends_on("C")
                .build(),
        )
        .build()
}

#[tokio::test]
async fn runtime_runs_diamond_in_dependency_order() {
    with_timeout(async {
        init_tracing();

        let job = job_from(diamond());
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
        let executed = Arc::new(Mutex::new(Vec::new()));
        let executor = FakeExecutor::new(tx, Arc::clone(&executed));

        let runtime = Runtime::new(CoreRuntime::new(job.clone()), rx, executor);
        runtime.run().await.unwrap();

        let executed = executed.lock().unwrap().clone();
        assert_eq!(executed.len(), 4);
        assert_eq!(executed.first().map(String::as_str), Some("A"));
        assert_eq!(executed.last().map(String::as_str), Some("D"));

        assert!(job.all_terminal());
        assert_eq!(job.counts().succeeded, 4);
    })
    .await
}

#[tokio::test]
async fn runtime_stops_when_failure_blocks_the_rest() {
    with_timeout(async {
        init_tracing();

        let job = job_from(diamond());
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
        let executed = Arc::new(Mutex::new(Vec::new()));
        let executor = FakeExecutor::new(tx, Arc::clone(&executed))
            .with_status("A", ExitStatus::Failure(2));

        let runtime = Runtime::new(CoreRuntime::new(job.clone()), rx, executor);
        runtime.run().await.unwrap();

        assert_eq!(*executed.lock().unwrap(), vec!["A".to_string()]);
        assert_eq!(job.state_of("B"), Some(TaskState::Blocked));
        assert_eq!(job.state_of("C"), Some(TaskState::Blocked));
        assert_eq!(job.state_of("D"), Some(TaskState::Pending));
        assert!(job.is_settled());
    })
    .await
}

#[tokio::test]
async fn exit_policy_from_job_file_controls_dispatch() {
    with_timeout(async {
        init_tracing();

        let file = JobFileBuilder::new("policy")
            .with_task(
                "A",
                TaskConfigBuilder::new("run-a")
                    .on_exit_code(10, ExitAction::Block)
                    .on_exit_code(20, ExitAction::Block)
                    .on_default(ExitAction::Satisfy)
                    .build(),
            )
            .with_task("B", TaskConfigBuilder::new("run-b").depends_on("A").build())
            .build();
        let job = job_from(file);

        let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
        let executed = Arc::new(Mutex::new(Vec::new()));
        let executor = FakeExecutor::new(tx, Arc::clone(&executed))
            .with_status("A", ExitStatus::Failure(3));

        Runtime::new(CoreRuntime::new(job.clone()), rx, executor)
            .run()
            .await
            .unwrap();

        assert_eq!(
            *executed.lock().unwrap(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert_eq!(
            job.state_of("A"),
            Some(TaskState::Completed(ExitStatus::Failure(3)))
        );
    })
    .await
}

#[tokio::test]
async fn monitor_observes_runtime_progress() {
    with_timeout(async {
        init_tracing();

        let job = job_from(diamond());
        let ids = job.task_ids();
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
        let executed = Arc::new(Mutex::new(Vec::new()));
        let executor = FakeExecutor::new(tx, executed);

        let monitor =
            CompletionMonitor::new(job.clone()).with_poll_interval(Duration::from_millis(10));
        let runtime = tokio::spawn(Runtime::new(CoreRuntime::new(job), rx, executor).run());

        let timed_out = monitor
            .wait_all_completed(&ids, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!timed_out);
        runtime.await.unwrap().unwrap();
    })
    .await
}
