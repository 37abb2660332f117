// src/config/mod.rs

//! Everything that happens after resolution.
//!
//! Responsibilities:
//! - Load a config file from disk and resolve it (`loader.rs`).
//! - Merge command-line overrides (`overrides.rs`).
//! - Validate the resolved tree against a schema (`validate.rs`), with
//!   built-in schemas per run mode (`presets.rs`).
//! - Typed views for downstream consumers (`model.rs`).

pub mod loader;
pub mod model;
pub mod overrides;
pub mod presets;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, read_config};
pub use model::{
    DatasetConfig, ModelConfig, OptimizerConfig, SchedulerConfig, SplitConfig,
    StudentModelConfig, TestConfig, TrainConfig,
};
pub use presets::RunMode;
pub use validate::{Constraint, Kind, Problem, Rule, Schema, ValidationIssue, ValidationReport};
