// src/config/validate.rs

use crate::config::model::{ExitConfig, JobFile, JobSection, JobSettings, RawJobFile, TaskConfig};
use crate::dag::{ExitPolicy, TaskGraph, TaskSpec};
use crate::errors::{BatchdagError, Result};
use crate::types::parse_duration;

impl TryFrom<RawJobFile> for JobFile {
    type Error = BatchdagError;

    fn try_from(raw: RawJobFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        let settings = job_settings(&raw.job)?;

        let specs = raw
            .task
            .iter()
            .map(|(id, task)| task_spec(id, task))
            .collect::<Result<Vec<_>>>()?;

        // Unknown references and cycles surface as the scheduler's own
        // error variants.
        let mut graph = TaskGraph::new();
        graph.add_tasks(specs)?;
        graph.validate()?;

        Ok(JobFile::new_unchecked(settings, graph))
    }
}

fn ensure_has_tasks(cfg: &RawJobFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BatchdagError::ConfigError(
            "job file must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn job_settings(job: &JobSection) -> Result<JobSettings> {
    if job.id.trim().is_empty() {
        return Err(BatchdagError::ConfigError(
            "[job].id must not be empty".to_string(),
        ));
    }

    let poll_interval = parse_duration(&job.poll_interval)
        .map_err(|e| BatchdagError::ConfigError(format!("[job].poll_interval: {e}")))?;
    if poll_interval.is_zero() {
        return Err(BatchdagError::ConfigError(
            "[job].poll_interval must be greater than zero".to_string(),
        ));
    }

    let wait_timeout = parse_duration(&job.wait_timeout)
        .map_err(|e| BatchdagError::ConfigError(format!("[job].wait_timeout: {e}")))?;

    Ok(JobSettings {
        id: job.id.clone(),
        pool_id: job.pool_id.clone(),
        poll_interval,
        wait_timeout,
    })
}

fn task_spec(id: &str, task: &TaskConfig) -> Result<TaskSpec> {
    let mut spec = TaskSpec::new(id, task.cmd.clone())
        .depends_on(task.depends_on.iter().cloned())
        .with_exit_policy(exit_policy(id, &task.exit)?);

    for range in &task.depends_on_range {
        spec = spec.depends_on_range(range.start, range.end);
    }

    Ok(spec)
}

fn exit_policy(task: &str, exit: &ExitConfig) -> Result<ExitPolicy> {
    let mut policy = ExitPolicy::new();

    for (code, action) in &exit.codes {
        let code: i32 = code.trim().parse().map_err(|_| {
            BatchdagError::ConfigError(format!(
                "task '{task}' has non-integer exit code '{code}' in `exit.codes`"
            ))
        })?;
        policy = policy.on_exit_code(code, *action);
    }

    for range in &exit.ranges {
        if range.start > range.end {
            return Err(BatchdagError::ConfigError(format!(
                "task '{task}' has exit code range {}..={} with start > end",
                range.start, range.end
            )));
        }
        policy = policy.on_exit_code_range(range.start, range.end, range.action);
    }

    if let Some(action) = exit.pre_processing_error {
        policy = policy.on_pre_processing_error(action);
    }
    if let Some(action) = exit.default {
        policy = policy.on_default(action);
    }

    Ok(policy)
}
