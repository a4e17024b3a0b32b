// src/exec/task_runner.rs

//! Individual task process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::RunnableTask;
use crate::engine::RuntimeEvent;
use crate::types::ExitStatus;

/// Run a single task's command and send exactly one `TaskCompleted` event.
///
/// - exit code 0 -> `Success`
/// - non-zero exit -> `Failure(code)`; a process killed by a signal has no
///   code and reports `Failure(-1)`
/// - the process cannot be started -> `PreProcessingError`
pub async fn run_task(task: RunnableTask, runtime_tx: mpsc::Sender<RuntimeEvent>) {
    let status = match spawn_process(&task) {
        Ok(child) => match wait_for_exit(&task, child).await {
            Ok(status) => status,
            Err(err) => {
                error!(task = %task.id, error = %err, "task execution error");
                ExitStatus::Failure(-1)
            }
        },
        Err(err) => {
            error!(task = %task.id, error = %err, "could not start task process");
            ExitStatus::PreProcessingError
        }
    };

    if let Err(e) = runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.id.clone(),
            status,
        })
        .await
    {
        warn!(task = %task.id, error = %e, "runtime gone; dropping completion");
    }
}

fn spawn_process(task: &RunnableTask) -> Result<Child> {
    info!(task = %task.id, cmd = %task.command, "starting task process");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&task.command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&task.command);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    cmd.spawn()
        .with_context(|| format!("spawning process for task '{}'", task.id))
}

async fn wait_for_exit(task: &RunnableTask, mut child: Child) -> Result<ExitStatus> {
    if let Some(stdout) = child.stdout.take() {
        let id = task.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(task = %id, "stdout: {}", line);
            }
        });
    }

    // Always consume stderr so buffers don't fill.
    if let Some(stderr) = child.stderr.take() {
        let id = task.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %id, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task.id))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task.id,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    Ok(if status.success() {
        ExitStatus::Success
    } else {
        ExitStatus::Failure(code)
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn run(cmd: &str) -> ExitStatus {
        let (tx, mut rx) = mpsc::channel(1);
        run_task(
            RunnableTask {
                id: "t".into(),
                command: cmd.into(),
            },
            tx,
        )
        .await;

        match rx.recv().await {
            Some(RuntimeEvent::TaskCompleted { status, .. }) => status,
            other => panic!("expected TaskCompleted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_exit_codes() {
        assert_eq!(run("exit 0").await, ExitStatus::Success);
        assert_eq!(run("exit 10").await, ExitStatus::Failure(10));
    }
}
