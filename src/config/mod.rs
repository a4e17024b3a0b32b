// src/config/mod.rs

//! Job file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a job file from disk (`loader.rs`).
//! - Turn it into validated settings plus a task graph (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_job_path, load_and_validate, load_from_path};
pub use model::{
    ExitConfig, ExitRangeConfig, IdRangeConfig, JobFile, JobSection, JobSettings, RawJobFile,
    TaskConfig,
};
