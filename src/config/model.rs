// src/config/model.rs

//! Typed views over resolved sections.
//!
//! These are what the dataset loader, model builder and training loop
//! actually consume. They are read through [`ResolvedConfig::section`],
//! after validation, so they stay permissive: unknown keys are ignored and
//! free-form parts (`params`, `criterion`) remain JSON values.
//!
//! ```yaml
//! dataset:
//!   root: &root_dir !join ['./resource/dataset/', 'coco2017']
//!   num_workers: 4
//!   splits:
//!     train:
//!       images: !join [*root_dir, '/train2017']
//!       annotations: !join [*root_dir, '/annotations/instances_train2017.json']
//! ```
//!
//! [`ResolvedConfig::section`]: crate::resolve::ResolvedConfig::section

use indexmap::IndexMap;
use serde::Deserialize;

/// `dataset` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub root: String,
    pub num_workers: i64,
    #[serde(default)]
    pub aspect_ratio_group_factor: Option<i64>,
    /// Keyed by split name (`train`, `val`, `test`, ...), in document order.
    pub splits: IndexMap<String, SplitConfig>,
}

/// One entry of `dataset.splits`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SplitConfig {
    pub images: String,
    pub annotations: String,
    #[serde(default)]
    pub remove_non_annotated_imgs: bool,
    /// JPEG re-encoding quality; `None` keeps the original images.
    #[serde(default)]
    pub jpeg_quality: Option<i64>,
}

/// `model`, `teacher_model` or the shared part of `student_model`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Either a plain name (`resnet50`) or a mapping with backbone params.
    pub backbone: serde_json::Value,
    pub params: serde_json::Value,
    /// Experiment name, usually built with `!join`.
    pub experiment: String,
    /// Checkpoint file path.
    pub ckpt: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentModelConfig {
    #[serde(flatten)]
    pub model: ModelConfig,
    /// Module paths whose parameters are frozen during distillation.
    #[serde(default)]
    pub frozen_modules: Vec<String>,
    #[serde(default)]
    pub distill_backbone_only: bool,
}

/// `train` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainConfig {
    pub num_epochs: i64,
    pub batch_size: i64,
    #[serde(default = "default_log_freq")]
    pub log_freq: i64,
    pub optimizer: OptimizerConfig,
    pub criterion: serde_json::Value,
    pub scheduler: SchedulerConfig,
}

fn default_log_freq() -> i64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchedulerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// `test` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestConfig {
    pub batch_size: i64,
}
