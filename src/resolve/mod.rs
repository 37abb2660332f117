// src/resolve/mod.rs

//! Configuration resolution.
//!
//! - [`parser`] turns YAML text into a raw [`ConfigNode`] tree, keeping
//!   anchors, aliases and `!join` expressions as explicit nodes.
//! - [`anchors`] records every anchor and the dependency graph between them,
//!   and rejects cycles.
//! - [`resolver`] substitutes aliases (memoized per anchor), evaluates joins
//!   and merge keys, and produces a [`ResolvedConfig`].
//! - [`value`] is the resolved, read-only tree.
//! - [`path`] holds [`KeyPath`], used in diagnostics.

pub mod anchors;
pub mod node;
pub mod parser;
pub mod path;
pub mod resolver;
pub mod value;

pub use anchors::{AnchorEntry, AnchorTable};
pub use node::{AnchorId, ConfigNode, Mark, NodeKind, Scalar};
pub use parser::{ParsedDocument, parse};
pub use path::{KeyPath, Segment};
pub use resolver::{resolve, resolve_document};
pub use value::{Mapping, ResolvedConfig, Value};
