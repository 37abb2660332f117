// src/resolve/node.rs

//! Raw, unresolved document tree.
//!
//! This is what the parser produces: plain YAML structure plus the three
//! constructs the resolver has to eliminate (anchor declarations, aliases
//! and `!join` expressions).

use std::fmt;

/// YAML 1.1 merge key.
pub const MERGE_KEY: &str = "<<";

/// Identifier the YAML parser assigns to each anchor declaration.
///
/// Ids are unique per declaration, so an anchor name that is declared twice
/// yields two distinct ids; aliases always point at the declaration that was
/// in scope where they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorId(pub usize);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a node in the source text (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mark {
    pub line: usize,
    pub col: usize,
}

/// A typed scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Float form used by `!join`.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { ".inf" } else { "-.inf" }.to_string()
    } else {
        // Debug keeps the decimal point (`1.0`) and uses the shortest
        // round-trip digits (`0.001`, `1e-5`).
        format!("{f:?}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Sequence(Vec<ConfigNode>),
    /// Entries in document order, keyed by the key's source text. A plain
    /// `<<` key is not an entry: its value is kept apart in `merge`.
    Mapping {
        entries: Vec<(String, ConfigNode)>,
        merge: Option<Box<ConfigNode>>,
    },
    Alias(AnchorId),
    Join(Vec<ConfigNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigNode {
    pub kind: NodeKind,
    /// Set when this node declares an anchor (`&name`).
    pub anchor: Option<AnchorId>,
    pub mark: Mark,
}

impl ConfigNode {
    pub fn new(kind: NodeKind, anchor: Option<AnchorId>, mark: Mark) -> Self {
        Self { kind, anchor, mark }
    }
}
