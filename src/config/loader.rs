// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawTaskFile, TaskFile};
use crate::errors::Result;

/// Read and deserialize a task file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawTaskFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawTaskFile> {
    let raw: RawTaskFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Read a task file and validate it.
///
/// This is the entry point the binary uses:
///
/// - Reads TOML.
/// - Applies defaults (`serde` + `Default` impls).
/// - Checks the batch size, `estimated_time` values, unknown
///   `depends_on` references and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<TaskFile> {
    let raw = load_from_path(path)?;
    TaskFile::try_from(raw)
}

/// `Batchflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Batchflow.toml")
}
