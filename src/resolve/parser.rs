// src/resolve/parser.rs

//! YAML text → [`ConfigNode`] tree.
//!
//! Built on the `yaml-rust2` event stream so that anchor declarations,
//! aliases and tags survive into the tree instead of being expanded by the
//! YAML library. The `!join` tag is recognised here and becomes a dedicated
//! [`NodeKind::Join`] node.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};
use yaml_rust2::ScanError;

use crate::errors::{ExpcfgError, Result};
use crate::resolve::node::{AnchorId, ConfigNode, MERGE_KEY, Mark, NodeKind, Scalar};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Output of [`parse`]: the raw tree plus anchor names recovered from the
/// source text (the YAML event stream only carries numeric ids).
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub root: ConfigNode,
    pub anchor_names: BTreeMap<AnchorId, String>,
}

impl ParsedDocument {
    /// Display name for an anchor id; falls back to the id itself.
    pub fn anchor_name(&self, id: AnchorId) -> String {
        self.anchor_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Parse the first YAML document in `text`.
///
/// An empty document (or one holding only comments) parses to a null
/// scalar.
pub fn parse(text: &str) -> Result<ParsedDocument> {
    let source = SourceText::new(text);
    let mut parser = Parser::new_from_str(text);
    let mut builder = TreeBuilder::new(&source);

    parser
        .load(&mut builder, false)
        .map_err(|err| scan_error(&source, &err))?;

    builder.finish()
}

fn scan_error(source: &SourceText<'_>, err: &ScanError) -> ExpcfgError {
    let marker = err.marker();
    let line = marker.line();
    let col = marker.col() + 1;
    let message = err.to_string();
    if message.contains("unknown anchor") {
        let name = source
            .alias_name_at(marker.index())
            .unwrap_or_else(|| "?".to_string());
        return ExpcfgError::UnknownAnchor { name, line, col };
    }
    ExpcfgError::syntax(message, line, col)
}

fn to_mark(marker: &Marker) -> Mark {
    Mark {
        line: marker.line(),
        col: marker.col() + 1,
    }
}

/// Collection being assembled while its events stream in.
enum Frame {
    Sequence {
        mark: Mark,
        anchor: Option<AnchorId>,
        join: bool,
        items: Vec<ConfigNode>,
    },
    Mapping {
        mark: Mark,
        anchor: Option<AnchorId>,
        entries: Vec<(String, ConfigNode)>,
        merge: Option<Box<ConfigNode>>,
        pending_key: Option<Key>,
    },
}

/// A mapping key waiting for its value.
enum Key {
    Plain(String),
    /// Unquoted, untagged `<<`.
    Merge,
}

struct TreeBuilder<'s> {
    source: &'s SourceText<'s>,
    stack: Vec<Frame>,
    root: Option<ConfigNode>,
    anchor_names: BTreeMap<AnchorId, String>,
    /// Char index of the previous event; lower bound when looking for the
    /// `&name` token of the next anchored node.
    last_index: usize,
    error: Option<ExpcfgError>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s SourceText<'s>) -> Self {
        Self {
            source,
            stack: Vec::new(),
            root: None,
            anchor_names: BTreeMap::new(),
            last_index: 0,
            error: None,
        }
    }

    fn finish(self) -> Result<ParsedDocument> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let root = self.root.unwrap_or_else(|| {
            ConfigNode::new(NodeKind::Scalar(Scalar::Null), None, Mark { line: 1, col: 1 })
        });
        Ok(ParsedDocument {
            root,
            anchor_names: self.anchor_names,
        })
    }

    fn handle(&mut self, ev: Event, marker: &Marker) -> Result<()> {
        let mark = to_mark(marker);
        match ev {
            Event::Scalar(value, style, anchor_id, tag) => {
                let anchor = self.declare_anchor(anchor_id, marker);
                let key = if style == TScalarStyle::Plain && tag.is_none() && value == MERGE_KEY {
                    Key::Merge
                } else {
                    Key::Plain(value.to_string())
                };
                let scalar = match tag {
                    Some(tag) => tagged_scalar(&value, style, &tag, mark)?,
                    // Keys keep their source text.
                    None if self.expects_key() => Scalar::String(value.to_string()),
                    None if style == TScalarStyle::Plain => infer_scalar(&value)
                        .map_err(|message| ExpcfgError::syntax(message, mark.line, mark.col))?,
                    None => Scalar::String(value.to_string()),
                };
                let node = ConfigNode::new(NodeKind::Scalar(scalar), anchor, mark);
                self.push_complete(node, Some(key))?;
            }

            Event::SequenceStart(anchor_id, tag) => {
                let anchor = self.declare_anchor(anchor_id, marker);
                let join = match tag {
                    None => false,
                    Some(ref tag) if is_join(tag) => true,
                    Some(ref tag) if is_core(tag, "seq") => false,
                    Some(ref tag) => return Err(unsupported_tag(tag, mark)),
                };
                self.stack.push(Frame::Sequence {
                    mark,
                    anchor,
                    join,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence {
                    mark,
                    anchor,
                    join,
                    items,
                }) => {
                    let kind = if join {
                        NodeKind::Join(items)
                    } else {
                        NodeKind::Sequence(items)
                    };
                    self.push_complete(ConfigNode::new(kind, anchor, mark), None)?;
                }
                _ => return Err(ExpcfgError::syntax("unbalanced sequence end", mark.line, mark.col)),
            },

            Event::MappingStart(anchor_id, tag) => {
                let anchor = self.declare_anchor(anchor_id, marker);
                match tag {
                    None => {}
                    Some(ref tag) if is_core(tag, "map") => {}
                    Some(ref tag) if is_join(tag) => {
                        return Err(ExpcfgError::syntax(
                            "!join must be applied to a sequence, found a mapping",
                            mark.line,
                            mark.col,
                        ));
                    }
                    Some(ref tag) => return Err(unsupported_tag(tag, mark)),
                }
                self.stack.push(Frame::Mapping {
                    mark,
                    anchor,
                    entries: Vec::new(),
                    merge: None,
                    pending_key: None,
                });
            }

            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    mark,
                    anchor,
                    entries,
                    merge,
                    pending_key: None,
                }) => {
                    let kind = NodeKind::Mapping { entries, merge };
                    self.push_complete(ConfigNode::new(kind, anchor, mark), None)?;
                }
                _ => return Err(ExpcfgError::syntax("unbalanced mapping end", mark.line, mark.col)),
            },

            Event::Alias(id) => {
                let id = AnchorId(id);
                if let Some(name) = self.source.alias_name_at(marker.index()) {
                    // The alias spelling is authoritative for the anchor it targets.
                    self.anchor_names.insert(id, name);
                }
                self.push_complete(ConfigNode::new(NodeKind::Alias(id), None, mark), None)?;
            }

            _ => {}
        }
        Ok(())
    }

    fn declare_anchor(&mut self, anchor_id: usize, marker: &Marker) -> Option<AnchorId> {
        if anchor_id == 0 {
            return None;
        }
        let id = AnchorId(anchor_id);
        if let Some(name) = self.source.anchor_name_before(self.last_index, marker.index()) {
            trace!(%id, %name, "anchor declared");
            self.anchor_names.insert(id, name);
        }
        Some(id)
    }

    fn expects_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame::Mapping {
                pending_key: None,
                ..
            })
        )
    }

    /// Attach a finished node to its parent. `key` is the scalar's source
    /// text, used when the node turns out to be a mapping key.
    fn push_complete(&mut self, node: ConfigNode, key: Option<Key>) -> Result<()> {
        let Some(frame) = self.stack.last_mut() else {
            if self.root.is_none() {
                self.root = Some(node);
            }
            return Ok(());
        };

        match frame {
            Frame::Sequence { items, .. } => items.push(node),
            Frame::Mapping {
                entries,
                merge,
                pending_key,
                ..
            } => match pending_key.take() {
                None => *pending_key = Some(mapping_key(&node, key)?),
                Some(Key::Merge) => {
                    if merge.is_some() {
                        return Err(ExpcfgError::syntax(
                            "duplicate merge key '<<'; list several sources in one sequence instead",
                            node.mark.line,
                            node.mark.col,
                        ));
                    }
                    *merge = Some(Box::new(node));
                }
                Some(Key::Plain(key)) => {
                    if let Some(existing) = entries.iter_mut().find(|(k, _)| *k == key) {
                        warn!(
                            key = %key,
                            line = node.mark.line,
                            "duplicate mapping key; the later value wins"
                        );
                        existing.1 = node;
                    } else {
                        entries.push((key, node));
                    }
                }
            },
        }
        Ok(())
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(ev, &marker) {
            self.error = Some(err);
        }
        self.last_index = marker.index();
    }
}

fn mapping_key(node: &ConfigNode, key: Option<Key>) -> Result<Key> {
    if node.anchor.is_some() {
        return Err(ExpcfgError::syntax(
            "anchors on mapping keys are not supported",
            node.mark.line,
            node.mark.col,
        ));
    }
    key.ok_or_else(|| {
        ExpcfgError::syntax(
            "mapping keys must be plain scalars",
            node.mark.line,
            node.mark.col,
        )
    })
}

fn is_join(tag: &Tag) -> bool {
    tag.suffix == "join" && (tag.handle == "!" || tag.handle.is_empty())
}

fn is_core(tag: &Tag, suffix: &str) -> bool {
    (tag.handle == CORE_TAG_PREFIX || tag.handle == "!!") && tag.suffix == suffix
}

fn unsupported_tag(tag: &Tag, mark: Mark) -> ExpcfgError {
    ExpcfgError::syntax(
        format!("unsupported tag '{}{}'", tag.handle, tag.suffix),
        mark.line,
        mark.col,
    )
}

fn tagged_scalar(value: &str, style: TScalarStyle, tag: &Tag, mark: Mark) -> Result<Scalar> {
    if is_join(tag) {
        return Err(ExpcfgError::syntax(
            "!join must be applied to a sequence, found a scalar",
            mark.line,
            mark.col,
        ));
    }
    if tag.handle != CORE_TAG_PREFIX && tag.handle != "!!" {
        return Err(unsupported_tag(tag, mark));
    }

    let invalid = |what: &str| {
        ExpcfgError::syntax(
            format!("'{value}' is not a valid {what}"),
            mark.line,
            mark.col,
        )
    };
    match tag.suffix.as_str() {
        "str" => Ok(Scalar::String(value.to_string())),
        "null" => match infer_scalar(value) {
            Ok(Scalar::Null) => Ok(Scalar::Null),
            _ => Err(invalid("null")),
        },
        "bool" => parse_bool(value).map(Scalar::Bool).ok_or_else(|| invalid("bool")),
        "int" => parse_int(value).map(Scalar::Int).ok_or_else(|| invalid("int")),
        "float" => parse_int(value)
            .map(|i| i as f64)
            .or_else(|| parse_float(value))
            .map(Scalar::Float)
            .ok_or_else(|| invalid("float")),
        _ if style != TScalarStyle::Plain => Ok(Scalar::String(value.to_string())),
        _ => Err(unsupported_tag(tag, mark)),
    }
}

static INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?[0-9][0-9_]*$").expect("valid int regex"));
static HEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]?)0x([0-9a-fA-F_]+)$").expect("valid hex regex"));
static OCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]?)0o([0-7_]+)$").expect("valid octal regex"));
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9][0-9_]*(\.[0-9_]*)?)([eE][-+]?[0-9]+)?$")
        .expect("valid float regex")
});
static INF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-+]?)\.(inf|Inf|INF)$").expect("valid inf regex"));
static NAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.(nan|NaN|NAN)$").expect("valid nan regex"));

/// Type a plain (unquoted, untagged) scalar.
///
/// Fails only for integers that do not fit in an `i64`.
fn infer_scalar(value: &str) -> std::result::Result<Scalar, String> {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return Ok(Scalar::Null),
        _ => {}
    }
    if let Some(b) = parse_bool(value) {
        return Ok(Scalar::Bool(b));
    }
    if let Some(i) = parse_int(value) {
        return Ok(Scalar::Int(i));
    }
    if looks_like_int(value) {
        return Err(format!("integer '{value}' does not fit in 64 bits"));
    }
    if let Some(f) = parse_float(value) {
        return Ok(Scalar::Float(f));
    }
    Ok(Scalar::String(value.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn parse_int(value: &str) -> Option<i64> {
    if INT_RE.is_match(value) {
        return value.replace('_', "").parse().ok();
    }
    let radix_int = |caps: regex::Captures<'_>, radix: u32| {
        let digits = caps[2].replace('_', "");
        let magnitude = i64::from_str_radix(&digits, radix).ok()?;
        Some(if &caps[1] == "-" { -magnitude } else { magnitude })
    };
    if let Some(caps) = HEX_RE.captures(value) {
        return radix_int(caps, 16);
    }
    if let Some(caps) = OCT_RE.captures(value) {
        return radix_int(caps, 8);
    }
    None
}

fn looks_like_int(value: &str) -> bool {
    INT_RE.is_match(value) || HEX_RE.is_match(value) || OCT_RE.is_match(value)
}

fn parse_float(value: &str) -> Option<f64> {
    if FLOAT_RE.is_match(value) {
        return value.replace('_', "").parse().ok();
    }
    if let Some(caps) = INF_RE.captures(value) {
        return Some(if &caps[1] == "-" {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    if NAN_RE.is_match(value) {
        return Some(f64::NAN);
    }
    None
}

/// Source text addressed by the char indices `yaml-rust2` markers use.
struct SourceText<'a> {
    text: &'a str,
    /// Byte offset of every char; `None` when the text is ASCII and char
    /// indices already are byte offsets.
    offsets: Option<Vec<usize>>,
}

impl<'a> SourceText<'a> {
    fn new(text: &'a str) -> Self {
        let offsets = if text.is_ascii() {
            None
        } else {
            Some(text.char_indices().map(|(offset, _)| offset).collect())
        };
        Self { text, offsets }
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        match &self.offsets {
            None => char_index.min(self.text.len()),
            Some(offsets) => offsets.get(char_index).copied().unwrap_or(self.text.len()),
        }
    }

    /// Name of the alias whose `*` sits at `char_index`.
    fn alias_name_at(&self, char_index: usize) -> Option<String> {
        let rest = &self.text[self.byte_offset(char_index)..];
        let name = rest.strip_prefix('*')?;
        let name: String = name.chars().take_while(|c| is_anchor_char(*c)).collect();
        (!name.is_empty()).then_some(name)
    }

    /// Find the `&name` token of a node whose content starts at `end`.
    ///
    /// Only node properties (a tag), whitespace and comments can sit between
    /// an anchor token and its node, so the anchor is the last `&name` token
    /// before `end` once comments are stripped.
    fn anchor_name_before(&self, start: usize, end: usize) -> Option<String> {
        let start = self.byte_offset(start.min(end));
        let end = self.byte_offset(end);
        let window = &self.text[start..end];
        window.lines().rev().find_map(|line| last_anchor_token(strip_comment(line)))
    }
}

fn is_anchor_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '{' | '}')
}

fn strip_comment(line: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev: Option<char> = None;
    for (offset, c) in line.char_indices() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single && prev != Some('\\') => in_double = !in_double,
            '#' if !in_single && !in_double && prev.is_none_or(char::is_whitespace) => {
                return &line[..offset];
            }
            _ => {}
        }
        prev = Some(c);
    }
    line
}

fn last_anchor_token(line: &str) -> Option<String> {
    let mut found = None;
    let mut prev: Option<char> = None;
    for (offset, c) in line.char_indices() {
        let at_token_start =
            prev.is_none_or(|p| p.is_whitespace() || matches!(p, '[' | '{' | ','));
        if c == '&' && at_token_start {
            let name: String = line[offset + 1..]
                .chars()
                .take_while(|c| is_anchor_char(*c))
                .collect();
            if !name.is_empty() {
                found = Some(name);
            }
        }
        prev = Some(c);
    }
    found
}
