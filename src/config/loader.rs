// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; it does **not** build or
/// validate the task graph. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let job: RawJobFile = toml::from_str(&contents)?;

    Ok(job)
}

/// Load a job file from path, build its task graph and validate it.
///
/// Fails on:
/// - malformed TOML or durations,
/// - duplicate or unknown task references,
/// - dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw = load_from_path(&path)?;
    let job = JobFile::try_from(raw)?;
    Ok(job)
}

/// Job file used when `--job` is not given.
pub fn default_job_path() -> PathBuf {
    PathBuf::from("Batchdag.toml")
}
