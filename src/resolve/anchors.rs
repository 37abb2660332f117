// src/resolve/anchors.rs

//! Anchor table and anchor dependency graph.
//!
//! Edge direction follows "must be resolved before": for
//!
//! ```yaml
//! root: &root !join ['./data/', *name]
//! ```
//!
//! we add `name -> root`, since `root` cannot be resolved until `name` is.
//! An anchor nested inside another anchor's subtree is an edge too
//! (`inner -> outer`), which is how YAML expresses self- and mutual
//! references: `&a {b: &b {back: *a}}` gives `a -> b -> a`.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{ExpcfgError, Result};
use crate::resolve::node::{AnchorId, ConfigNode, MERGE_KEY, NodeKind};
use crate::resolve::parser::ParsedDocument;
use crate::resolve::path::KeyPath;

/// One anchor declaration.
#[derive(Debug, Clone)]
pub struct AnchorEntry<'a> {
    pub id: AnchorId,
    pub name: String,
    /// Where the anchored node sits in the document.
    pub path: KeyPath,
    /// The unresolved subtree bound to the anchor.
    pub node: &'a ConfigNode,
}

/// Every anchor of a document, keyed by declaration id, plus the explicit
/// dependency graph between them.
#[derive(Debug)]
pub struct AnchorTable<'a> {
    entries: BTreeMap<AnchorId, AnchorEntry<'a>>,
    graph: DiGraphMap<AnchorId, ()>,
}

impl<'a> AnchorTable<'a> {
    /// Single document-order pass over the parsed tree.
    pub fn build(doc: &'a ParsedDocument) -> Self {
        let mut table = Self {
            entries: BTreeMap::new(),
            graph: DiGraphMap::new(),
        };
        let mut path = KeyPath::root();
        table.visit(doc, &doc.root, None, &mut path);
        debug!(
            anchors = table.entries.len(),
            edges = table.graph.edge_count(),
            "anchor table built"
        );
        table
    }

    fn visit(
        &mut self,
        doc: &ParsedDocument,
        node: &'a ConfigNode,
        owner: Option<AnchorId>,
        path: &mut KeyPath,
    ) {
        let mut owner = owner;
        if let Some(id) = node.anchor {
            self.graph.add_node(id);
            if let Some(outer) = owner {
                self.graph.add_edge(id, outer, ());
            }
            self.entries.insert(
                id,
                AnchorEntry {
                    id,
                    name: doc.anchor_name(id),
                    path: path.clone(),
                    node,
                },
            );
            owner = Some(id);
        }

        match &node.kind {
            NodeKind::Scalar(_) => {}
            NodeKind::Alias(target) => {
                if let Some(outer) = owner {
                    self.graph.add_edge(*target, outer, ());
                }
            }
            NodeKind::Sequence(items) | NodeKind::Join(items) => {
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    self.visit(doc, item, owner, path);
                    path.pop();
                }
            }
            NodeKind::Mapping { entries, merge } => {
                if let Some(merge) = merge {
                    path.push_key(MERGE_KEY);
                    self.visit(doc, merge, owner, path);
                    path.pop();
                }
                for (key, value) in entries {
                    path.push_key(key.as_str());
                    self.visit(doc, value, owner, path);
                    path.pop();
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: AnchorId) -> Option<&AnchorEntry<'a>> {
        self.entries.get(&id)
    }

    pub fn name_of(&self, id: AnchorId) -> String {
        self.entries
            .get(&id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = &AnchorEntry<'a>> {
        self.entries.values()
    }

    /// Anchors that `id` directly depends on.
    pub fn dependencies_of(&self, id: AnchorId) -> Vec<AnchorId> {
        self.graph
            .neighbors_directed(id, petgraph::Direction::Incoming)
            .collect()
    }

    /// Order in which anchors can be resolved so that every dependency is
    /// ready before its dependents.
    ///
    /// Fails with [`ExpcfgError::CyclicReference`] when the graph has a cycle.
    pub fn resolution_order(&self) -> Result<Vec<AnchorId>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order),
            Err(cycle) => {
                let cycle = self.describe_cycle(cycle.node_id());
                Err(ExpcfgError::CyclicReference { cycle })
            }
        }
    }

    /// Names along one cycle through `start`'s strongly connected component,
    /// in reference order (`a -> b -> a` reads "a refers to b refers to a").
    fn describe_cycle(&self, start: AnchorId) -> Vec<String> {
        let component: HashSet<AnchorId> = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start])
            .into_iter()
            .collect();

        // Search backwards along "is needed by" edges, which is forwards
        // along "refers to".
        let mut parent: HashMap<AnchorId, AnchorId> = HashMap::new();
        let mut stack = vec![start];
        let mut seen: HashSet<AnchorId> = HashSet::from([start]);
        let mut closing = None;
        'search: while let Some(current) = stack.pop() {
            let mut refs: Vec<AnchorId> = self
                .graph
                .neighbors_directed(current, petgraph::Direction::Incoming)
                .filter(|n| component.contains(n))
                .collect();
            refs.sort();
            for next in refs {
                if next == start {
                    closing = Some(current);
                    break 'search;
                }
                if seen.insert(next) {
                    parent.insert(next, current);
                    stack.push(next);
                }
            }
        }

        let mut ids = vec![start];
        if let Some(mut current) = closing {
            let mut tail = Vec::new();
            while current != start {
                tail.push(current);
                match parent.get(&current) {
                    Some(prev) => current = *prev,
                    None => break,
                }
            }
            tail.reverse();
            ids.extend(tail);
        }
        ids.push(start);
        ids.into_iter().map(|id| self.name_of(id)).collect()
    }
}
