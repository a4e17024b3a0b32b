// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::TaskGraph;
use crate::types::ExitAction;

/// Job file as read from TOML, before validation.
///
/// ```toml
/// [job]
/// id = "TaskDependenciesSampleJob"
/// poll_interval = "5s"
/// wait_timeout = "30m"
///
/// [task.Rain]
/// cmd = "echo Rain"
///
/// [task.Flowers]
/// cmd = "echo Flowers"
/// depends_on = ["Rain", "Sun"]
/// ```
///
/// Use `JobFile::try_from` (or [`load_and_validate`](crate::config::load_and_validate))
/// to obtain a validated job.
#[derive(Debug, Clone, Deserialize)]
pub struct RawJobFile {
    /// Job-wide settings from `[job]`.
    #[serde(default)]
    pub job: JobSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[job]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    #[serde(default = "default_job_id")]
    pub id: String,

    /// Opaque pool identifier, passed through to logs only.
    #[serde(default)]
    pub pool_id: Option<String>,

    /// How often the completion monitor re-checks task states.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// How long to wait for every task to complete.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: String,
}

fn default_job_id() -> String {
    "job".to_string()
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_wait_timeout() -> String {
    "30m".to_string()
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            id: default_job_id(),
            pool_id: None,
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Command line handed to the executor.
    pub cmd: String,

    /// Ids of tasks that must complete before this one.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Inclusive integer id ranges, e.g. `[{ start = 1, end = 3 }]`.
    #[serde(default)]
    pub depends_on_range: Vec<IdRangeConfig>,

    /// Exit conditions from `[task.<id>.exit]`.
    #[serde(default)]
    pub exit: ExitConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdRangeConfig {
    pub start: u64,
    pub end: u64,
}

/// `[task.<id>.exit]` section.
///
/// TOML keys are strings, so exit codes in `codes` are parsed during
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExitConfig {
    #[serde(default)]
    pub default: Option<ExitAction>,

    #[serde(default)]
    pub pre_processing_error: Option<ExitAction>,

    #[serde(default)]
    pub codes: BTreeMap<String, ExitAction>,

    #[serde(default)]
    pub ranges: Vec<ExitRangeConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExitRangeConfig {
    pub start: i32,
    pub end: i32,
    pub action: ExitAction,
}

/// Explicit job configuration handed to constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub id: String,
    pub pool_id: Option<String>,
    pub poll_interval: Duration,
    pub wait_timeout: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            id: default_job_id(),
            pool_id: None,
            poll_interval: Duration::from_secs(5),
            wait_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// A validated job: settings plus an acyclic task graph.
///
/// Only constructible through validation (`TryFrom<RawJobFile>`).
#[derive(Debug, Clone)]
pub struct JobFile {
    settings: JobSettings,
    graph: TaskGraph,
}

impl JobFile {
    pub(crate) fn new_unchecked(settings: JobSettings, graph: TaskGraph) -> Self {
        Self { settings, graph }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn into_parts(self) -> (JobSettings, TaskGraph) {
        (self.settings, self.graph)
    }
}
