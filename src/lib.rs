// src/lib.rs

//! Experiment configuration resolver.
//!
//! Reads YAML experiment descriptions that use anchors (`&name`), aliases
//! (`*name`), merge keys (`<<`) and the `!join` tag for string
//! concatenation, and turns them into a reference-free, read-only
//! [`ResolvedConfig`] that can be validated per run mode and handed to the
//! dataset loader, model builder and training loop.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod resolve;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

pub use crate::config::{RunMode, Rule, Schema, ValidationReport};
pub use crate::errors::ExpcfgError;
pub use crate::resolve::{ResolvedConfig, Value, resolve};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};

/// High-level entry point used by `main.rs`.
///
/// Loads, resolves, overrides and (optionally) validates the config, then
/// prints it to stdout.
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path, args.mode, args.json.as_deref())?;

    if args.summary {
        print_summary(&cfg);
        return Ok(());
    }

    let output = match args.get.as_deref() {
        Some(path) => cfg
            .get(path)
            .ok_or_else(|| anyhow!("no value at key path '{path}'"))?,
        None => cfg.root(),
    };
    let text = serde_json::to_string_pretty(output).context("serializing resolved config")?;
    println!("{text}");
    Ok(())
}

const MODEL_SECTIONS: &[&str] = &["model", "teacher_model", "student_model"];

/// Short overview: dataset splits, models and training hyperparameters.
fn print_summary(cfg: &ResolvedConfig) {
    println!("expcfg summary");

    let dataset = &cfg["dataset"];
    if !dataset.is_null() {
        println!("  dataset.root = {}", display(&dataset["root"]));
        println!("  dataset.num_workers = {}", display(&dataset["num_workers"]));
        if let Some(splits) = dataset["splits"].as_mapping() {
            println!();
            println!("splits ({}):", splits.len());
            for (name, split) in splits.iter() {
                println!("  - {name}");
                println!("      images: {}", display(&split["images"]));
                println!("      annotations: {}", display(&split["annotations"]));
            }
        }
    }

    let models: Vec<&str> = MODEL_SECTIONS
        .iter()
        .copied()
        .filter(|section| !cfg[*section].is_null())
        .collect();
    if !models.is_empty() {
        println!();
        println!("models ({}):", models.len());
        for section in models {
            let model = &cfg[section];
            println!("  - {section}: {}", display(&model["name"]));
            println!("      backbone: {}", display(&model["backbone"]));
            println!("      experiment: {}", display(&model["experiment"]));
            println!("      ckpt: {}", display(&model["ckpt"]));
            if let Some(frozen) = model["frozen_modules"].as_sequence().filter(|f| !f.is_empty()) {
                let names: Vec<String> = frozen.iter().map(display).collect();
                println!("      frozen_modules: {}", names.join(", "));
            }
        }
    }

    let train = &cfg["train"];
    if !train.is_null() {
        println!();
        println!("train:");
        println!("  num_epochs = {}", display(&train["num_epochs"]));
        println!("  batch_size = {}", display(&train["batch_size"]));
        println!("  optimizer = {}", display(&train["optimizer"]["type"]));
        println!("  scheduler = {}", display(&train["scheduler"]["type"]));
    }

    debug!("summary printed");
}

/// Scalars in their join form, collections as compact JSON.
fn display(value: &Value) -> String {
    value
        .to_join_string()
        .unwrap_or_else(|| value.to_json().to_string())
}
