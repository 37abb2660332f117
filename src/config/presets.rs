// src/config/presets.rs

//! Built-in schemas for the experiment runners.
//!
//! Each [`RunMode`] lists the sections a runner reads before it starts:
//! a plain training run needs `model` and `train`, a distillation run
//! needs `teacher_model`, `student_model` and `train`, and so on.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::config::validate::{Rule, Schema};

/// Optimizer names accepted in `train.optimizer.type`.
pub const OPTIMIZER_TYPES: &[&str] = &[
    "SGD",
    "Adam",
    "AdamW",
    "Adamax",
    "Adagrad",
    "Adadelta",
    "RMSprop",
    "Rprop",
    "ASGD",
    "SparseAdam",
    "LBFGS",
];

/// Learning-rate scheduler names accepted in `train.scheduler.type`.
pub const SCHEDULER_TYPES: &[&str] = &[
    "StepLR",
    "MultiStepLR",
    "ExponentialLR",
    "CosineAnnealingLR",
    "CosineAnnealingWarmRestarts",
    "ReduceLROnPlateau",
    "CyclicLR",
    "OneCycleLR",
    "LambdaLR",
];

/// Which runner the config is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Only the `dataset` section.
    Dataset,
    /// Train a single `model`.
    Train,
    /// Evaluate a single `model` on the test split.
    Test,
    /// Distill `teacher_model` into `student_model`.
    Distill,
}

impl RunMode {
    pub fn schema(self) -> Schema {
        match self {
            RunMode::Dataset => dataset_schema(&["train"]),
            RunMode::Train => dataset_schema(&["train", "val"])
                .extend(model_schema("model"))
                .extend(train_schema()),
            RunMode::Test => dataset_schema(&["test"])
                .extend(model_schema("model"))
                .extend(test_schema()),
            RunMode::Distill => dataset_schema(&["train", "val"])
                .extend(model_schema("teacher_model"))
                .extend(model_schema("student_model"))
                .extend(student_schema())
                .extend(train_schema()),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Dataset => "dataset",
            RunMode::Train => "train",
            RunMode::Test => "test",
            RunMode::Distill => "distill",
        };
        f.write_str(name)
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dataset" => Ok(RunMode::Dataset),
            "train" => Ok(RunMode::Train),
            "test" => Ok(RunMode::Test),
            "distill" => Ok(RunMode::Distill),
            other => Err(format!(
                "invalid run mode: {other} (expected \"dataset\", \"train\", \"test\" or \"distill\")"
            )),
        }
    }
}

/// `dataset` section, requiring the listed splits.
pub fn dataset_schema(required_splits: &[&str]) -> Schema {
    let mut schema = Schema::new()
        .rule(Rule::required("dataset").mapping())
        .rule(Rule::required("dataset.root").string().non_empty())
        .rule(Rule::required("dataset.num_workers").integer().non_negative())
        .rule(Rule::optional("dataset.aspect_ratio_group_factor").integer())
        .rule(Rule::required("dataset.splits").mapping().non_empty())
        .rule(Rule::required("dataset.splits.*").mapping());

    for split in required_splits {
        schema = schema.rule(Rule::required(format!("dataset.splits.{split}")).mapping());
    }

    schema
        .rule(Rule::required("dataset.splits.*.images").string().non_empty())
        .rule(Rule::required("dataset.splits.*.annotations").string().non_empty())
        .rule(Rule::optional("dataset.splits.*.remove_non_annotated_imgs").boolean())
        .rule(Rule::optional("dataset.splits.*.jpeg_quality").integer().range(1.0, 100.0))
}

/// A model section (`model`, `teacher_model` or `student_model`).
pub fn model_schema(section: &str) -> Schema {
    Schema::new()
        .rule(Rule::required(section).mapping())
        .rule(Rule::required(format!("{section}.name")).string().non_empty())
        .rule(Rule::required(format!("{section}.backbone")))
        .rule(Rule::required(format!("{section}.params")).mapping())
        .rule(Rule::required(format!("{section}.experiment")).string().non_empty())
        .rule(Rule::required(format!("{section}.ckpt")).string().non_empty())
}

fn student_schema() -> Schema {
    Schema::new()
        .rule(Rule::optional("student_model.frozen_modules").sequence())
        .rule(Rule::required("student_model.frozen_modules.*").string())
        .rule(Rule::optional("student_model.distill_backbone_only").boolean())
}

/// `train` section consumed by the training loop.
pub fn train_schema() -> Schema {
    Schema::new()
        .rule(Rule::required("train").mapping())
        .rule(Rule::required("train.num_epochs").integer().positive())
        .rule(Rule::required("train.batch_size").integer().positive())
        .rule(Rule::optional("train.log_freq").integer().positive())
        .rule(Rule::required("train.optimizer").mapping())
        .rule(Rule::required("train.optimizer.type").string().one_of(OPTIMIZER_TYPES))
        .rule(Rule::required("train.optimizer.params").mapping())
        .rule(Rule::optional("train.optimizer.params.lr").number().positive())
        .rule(Rule::required("train.criterion").mapping())
        .rule(Rule::required("train.scheduler").mapping())
        .rule(Rule::required("train.scheduler.type").string().one_of(SCHEDULER_TYPES))
        .rule(Rule::optional("train.scheduler.params").mapping())
}

/// `test` section.
pub fn test_schema() -> Schema {
    Schema::new()
        .rule(Rule::required("test").mapping())
        .rule(Rule::required("test.batch_size").integer().positive())
}
