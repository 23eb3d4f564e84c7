// src/config/mod.rs

//! Task-file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate it into task records (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{RawTaskFile, TaskConfig, TaskFile};
pub use validate::validate_config;
