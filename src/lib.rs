// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod types;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::JobFile;
use crate::engine::{CoreRuntime, Job, Runtime, RuntimeEvent};
use crate::exec::ShellExecutorBackend;
use crate::monitor::CompletionMonitor;
use crate::types::parse_duration;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading and graph validation
/// - the shared job handle, core runtime and shell executor
/// - the completion monitor that waits for every task to complete
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let job_path = &args.job;
    let job_file = load_and_validate(&job_path)
        .with_context(|| format!("loading job file {}", job_path.display()))?;

    if args.dry_run {
        print_dry_run(&job_file);
        return Ok(());
    }

    let (mut settings, graph) = job_file.into_parts();
    if let Some(ref timeout) = args.timeout {
        settings.wait_timeout =
            parse_duration(timeout).map_err(|e| anyhow::anyhow!("--timeout: {e}"))?;
    }
    let wait_timeout = settings.wait_timeout;

    let job = Job::new(settings, graph)?;
    let task_ids = job.task_ids();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = ShellExecutorBackend::new(rt_tx.clone());

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Runtime::new(CoreRuntime::new(job.clone()), rt_rx, executor);
    let runtime_task = tokio::spawn(runtime.run());

    let monitor = CompletionMonitor::new(job.clone());
    info!(
        tasks = task_ids.len(),
        timeout = ?wait_timeout,
        "waiting for tasks to complete"
    );

    let waited = monitor.wait_all_completed(&task_ids, wait_timeout);
    tokio::pin!(waited);

    let timed_out = tokio::select! {
        res = &mut waited => res?,
        joined = runtime_task => {
            joined.context("runtime task panicked")??;
            // The runtime only stops once nothing else can change, so a
            // zero-timeout check gives the final answer.
            monitor.wait_all_completed(&task_ids, std::time::Duration::ZERO).await?
        }
    };

    print_summary(&job);

    if timed_out {
        warn!("not every task reached the completed state");
        bail!(
            "timed out waiting for tasks of job '{}' to complete",
            job.settings().id
        );
    }

    println!("All tasks completed.");
    Ok(())
}

fn print_summary(job: &Job) {
    let counts = job.counts();
    println!("job '{}':", job.settings().id);
    println!(
        "  succeeded={} failed={} blocked={} pending={} running={}",
        counts.succeeded,
        counts.failed,
        counts.blocked,
        counts.pending,
        counts.running + counts.runnable
    );
    for (id, state) in job.snapshot() {
        println!("  - {id}: {state}");
    }
}

/// Simple dry-run output: print settings, tasks, deps, commands and exit
/// policies.
fn print_dry_run(job: &JobFile) {
    let settings = job.settings();
    println!("batchdag dry-run");
    println!("  job.id = {}", settings.id);
    if let Some(ref pool) = settings.pool_id {
        println!("  job.pool_id = {pool}");
    }
    println!("  job.poll_interval = {:?}", settings.poll_interval);
    println!("  job.wait_timeout = {:?}", settings.wait_timeout);
    println!();

    let graph = job.graph();
    println!("tasks ({}):", graph.len());
    for node in graph.nodes() {
        println!("  - {}", node.id);
        println!("      cmd: {}", node.command);
        if !node.deps.is_empty() {
            println!("      depends_on: {:?}", node.deps);
        }
        let policy = &node.exit_policy;
        if !policy.is_empty() {
            for (code, action) in policy.codes() {
                println!("      exit {code}: {action}");
            }
            for range in policy.ranges() {
                println!("      exit {}..={}: {}", range.start, range.end, range.action);
            }
            if let Some(action) = policy.pre_processing_error() {
                println!("      pre-processing error: {action}");
            }
            if let Some(action) = policy.default_action() {
                println!("      default: {action}");
            }
        }
    }

    tracing::debug!("dry-run complete (no execution)");
}
