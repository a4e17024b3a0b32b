// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Every scheduler error is a caller-input error: it is reported to the
//! caller of the operation that caused it and never retried internally.

use thiserror::Error;

use crate::dag::TaskId;

#[derive(Error, Debug)]
pub enum BatchdagError {
    #[error("duplicate task id: '{0}'")]
    DuplicateTaskId(TaskId),

    #[error("task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("unknown task: '{0}'")]
    UnknownTask(TaskId),

    #[error("cyclic dependency detected in task graph involving task '{0}'")]
    CyclicDependency(TaskId),

    #[error("task '{0}' is already in a terminal state")]
    AlreadyTerminal(TaskId),

    #[error("task '{task}' is not runnable (current state: {state})")]
    NotRunnable { task: TaskId, state: String },

    #[error("task graph must be validated before execution starts")]
    NotValidated,

    #[error("task graph is sealed; execution has already started")]
    GraphSealed,

    #[error("invalid task id range {start}..={end} on task '{task}'")]
    InvalidRange { task: TaskId, start: u64, end: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BatchdagError>;
