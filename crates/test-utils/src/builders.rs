#![allow(dead_code)]

use std::collections::BTreeMap;

use batchdag::config::{
    ExitConfig, ExitRangeConfig, IdRangeConfig, JobFile, JobSection, RawJobFile, TaskConfig,
};
use batchdag::types::ExitAction;

/// Builder for `JobFile` that goes through the same validation as a TOML
/// job file.
pub struct JobFileBuilder {
    raw: RawJobFile,
}

impl JobFileBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            raw: RawJobFile {
                job: JobSection {
                    id: id.to_string(),
                    ..JobSection::default()
                },
                task: BTreeMap::new(),
            },
        }
    }

    pub fn poll_interval(mut self, duration: &str) -> Self {
        self.raw.job.poll_interval = duration.to_string();
        self
    }

    pub fn wait_timeout(mut self, duration: &str) -> Self {
        self.raw.job.wait_timeout = duration.to_string();
        self
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(id.to_string(), task);
        self
    }

    pub fn raw(self) -> RawJobFile {
        self.raw
    }

    pub fn build(self) -> JobFile {
        JobFile::try_from(self.raw).expect("Failed to build valid job from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                depends_on: vec![],
                depends_on_range: vec![],
                exit: ExitConfig::default(),
            },
        }
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.task.depends_on.push(dep.to_string());
        self
    }

    pub fn depends_on_range(mut self, start: u64, end: u64) -> Self {
        self.task.depends_on_range.push(IdRangeConfig { start, end });
        self
    }

    pub fn on_exit_code(mut self, code: i32, action: ExitAction) -> Self {
        self.task.exit.codes.insert(code.to_string(), action);
        self
    }

    pub fn on_exit_range(mut self, start: i32, end: i32, action: ExitAction) -> Self {
        self.task
            .exit
            .ranges
            .push(ExitRangeConfig { start, end, action });
        self
    }

    pub fn on_pre_processing_error(mut self, action: ExitAction) -> Self {
        self.task.exit.pre_processing_error = Some(action);
        self
    }

    pub fn on_default(mut self, action: ExitAction) -> Self {
        self.task.exit.default = Some(action);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
