// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure carries enough context (anchor name, key path, source
//! position) to find the offending spot in the YAML document. Resolution is
//! all-or-nothing: none of these errors ever comes with a partial config.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::validate::ValidationReport;
use crate::resolve::KeyPath;

#[derive(Error, Debug)]
pub enum ExpcfgError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error at line {line}, column {col}: {message}")]
    Syntax {
        message: String,
        line: usize,
        col: usize,
    },

    #[error("unknown anchor '{name}' referenced at line {line}, column {col}")]
    UnknownAnchor { name: String, line: usize, col: usize },

    #[error("cyclic anchor reference: {}", cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },

    #[error("!join operand #{index} at '{path}' resolves to a {found}, expected a scalar")]
    JoinType {
        path: KeyPath,
        index: usize,
        found: &'static str,
    },

    #[error("merge key '<<' at '{path}' refers to a {found}, expected a mapping")]
    MergeType { path: KeyPath, found: &'static str },

    #[error("configuration is invalid: {0}")]
    Validation(ValidationReport),

    #[error("invalid override: {0}")]
    Override(String),

    #[error("section '{section}' does not match its expected shape: {source}")]
    Model {
        section: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExpcfgError {
    pub(crate) fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        ExpcfgError::Syntax {
            message: message.into(),
            line,
            col,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpcfgError>;
