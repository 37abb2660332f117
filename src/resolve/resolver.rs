// src/resolve/resolver.rs

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::errors::{ExpcfgError, Result};
use crate::resolve::anchors::AnchorTable;
use crate::resolve::node::{AnchorId, ConfigNode, MERGE_KEY, NodeKind};
use crate::resolve::parser::{self, ParsedDocument};
use crate::resolve::path::KeyPath;
use crate::resolve::value::{Mapping, ResolvedConfig, Value};

/// Parse and fully resolve a YAML document.
///
/// ```
/// let cfg = expcfg::resolve(
///     "name: &name coco2017\nroot: !join ['./resource/dataset/', *name]\n",
/// )
/// .unwrap();
/// assert_eq!(cfg["root"].as_str(), Some("./resource/dataset/coco2017"));
/// ```
pub fn resolve(text: &str) -> Result<ResolvedConfig> {
    let doc = parser::parse(text)?;
    resolve_document(&doc)
}

/// Resolve an already parsed document.
pub fn resolve_document(doc: &ParsedDocument) -> Result<ResolvedConfig> {
    let table = AnchorTable::build(doc);
    let mut resolver = Resolver::new(&table);
    resolver.resolve_anchors()?;
    let root = resolver.resolve_node(&doc.root, &mut KeyPath::root())?;
    Ok(ResolvedConfig::new(root))
}

/// Memoizing resolver over one document's anchor table.
///
/// Every anchor is resolved exactly once, in dependency order, before the
/// document root. Aliases then only ever read from the memo.
struct Resolver<'t, 'a> {
    table: &'t AnchorTable<'a>,
    memo: HashMap<AnchorId, Value>,
}

impl<'t, 'a> Resolver<'t, 'a> {
    fn new(table: &'t AnchorTable<'a>) -> Self {
        Self {
            table,
            memo: HashMap::with_capacity(table.len()),
        }
    }

    fn resolve_anchors(&mut self) -> Result<()> {
        let order = self.table.resolution_order()?;
        debug!(
            order = ?order.iter().map(|id| self.table.name_of(*id)).collect::<Vec<_>>(),
            "resolving anchors"
        );
        for id in order {
            let Some(entry) = self.table.get(id) else {
                continue;
            };
            let mut path = entry.path.clone();
            let value = self.resolve_kind(entry.node, &mut path)?;
            trace!(anchor = %entry.name, path = %entry.path, "anchor resolved");
            self.memo.insert(id, value);
        }
        Ok(())
    }

    fn resolve_node(&self, node: &ConfigNode, path: &mut KeyPath) -> Result<Value> {
        if let Some(id) = node.anchor {
            if let Some(value) = self.memo.get(&id) {
                return Ok(value.clone());
            }
        }
        self.resolve_kind(node, path)
    }

    fn resolve_kind(&self, node: &ConfigNode, path: &mut KeyPath) -> Result<Value> {
        match &node.kind {
            NodeKind::Scalar(scalar) => Ok(Value::from(scalar.clone())),
            NodeKind::Alias(id) => self.lookup(*id, node),
            NodeKind::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    out.push(self.resolve_node(item, path)?);
                    path.pop();
                }
                Ok(Value::Sequence(out))
            }
            NodeKind::Mapping { entries, merge } => {
                self.resolve_mapping(entries, merge.as_deref(), path)
            }
            NodeKind::Join(operands) => self.resolve_join(operands, path),
        }
    }

    fn lookup(&self, id: AnchorId, node: &ConfigNode) -> Result<Value> {
        self.memo
            .get(&id)
            .cloned()
            .ok_or_else(|| ExpcfgError::UnknownAnchor {
                name: self.table.name_of(id),
                line: node.mark.line,
                col: node.mark.col,
            })
    }

    /// Concatenate the string forms of all operands, in order.
    fn resolve_join(&self, operands: &[ConfigNode], path: &mut KeyPath) -> Result<Value> {
        let mut joined = String::new();
        for (index, operand) in operands.iter().enumerate() {
            path.push_index(index);
            let value = self.resolve_node(operand, path)?;
            path.pop();
            match value.to_join_string() {
                Some(s) => joined.push_str(&s),
                None => {
                    return Err(ExpcfgError::JoinType {
                        path: path.clone(),
                        index,
                        found: value.type_name(),
                    });
                }
            }
        }
        Ok(Value::String(joined))
    }

    /// Resolve a mapping, expanding its `<<` merge key.
    ///
    /// Merged entries come first; explicit keys override them in place. With
    /// several merge sources, the earlier source wins.
    fn resolve_mapping(
        &self,
        entries: &[(String, ConfigNode)],
        merge: Option<&ConfigNode>,
        path: &mut KeyPath,
    ) -> Result<Value> {
        let mut out = Mapping::new();

        if let Some(node) = merge {
            path.push_key(MERGE_KEY);
            let merged = self.resolve_node(node, path)?;
            path.pop();
            let sources: Vec<&Value> = match &merged {
                Value::Sequence(items) => items.iter().collect(),
                other => vec![other],
            };
            for source in sources {
                let Value::Mapping(map) = source else {
                    return Err(ExpcfgError::MergeType {
                        path: path.child(MERGE_KEY),
                        found: source.type_name(),
                    });
                };
                for (k, v) in map.iter() {
                    if !out.contains_key(k) {
                        out.insert(k, v.clone());
                    }
                }
            }
        }

        for (key, node) in entries {
            path.push_key(key.as_str());
            let value = self.resolve_node(node, path)?;
            path.pop();
            out.insert(key.as_str(), value);
        }

        Ok(Value::Mapping(out))
    }
}
