#![allow(dead_code)]

//! Builders that emit YAML text for tests.

use std::fmt::Write as _;

use expcfg::ResolvedConfig;
use expcfg::errors::Result;
use tracing::debug;

/// Quote `s` as a single-quoted YAML scalar.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Builder for a `dataset` section with anchored `root_dir` and one
/// `!join` per split path.
///
/// ```text
/// dataset:
///   name: &dataset_name 'coco2017'
///   root: &root_dir !join ['./resource/dataset/', *dataset_name]
///   num_workers: 4
///   splits:
///     train:
///       images: !join [*root_dir, '/train2017']
///       annotations: !join [*root_dir, '/annotations/instances_train2017.json']
/// ```
pub struct DatasetDocBuilder {
    name: String,
    prefix: String,
    num_workers: i64,
    splits: Vec<SplitSpec>,
}

struct SplitSpec {
    name: String,
    images: Option<String>,
    annotations: Option<String>,
}

impl DatasetDocBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: "./resource/dataset/".to_string(),
            num_workers: 4,
            splits: Vec::new(),
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn num_workers(mut self, n: i64) -> Self {
        self.num_workers = n;
        self
    }

    /// Add a split with COCO-style `images` and `annotations` suffixes.
    pub fn split(mut self, name: &str, images: &str) -> Self {
        self.splits.push(SplitSpec {
            name: name.to_string(),
            images: Some(format!("/{images}")),
            annotations: Some(format!("/annotations/instances_{images}.json")),
        });
        self
    }

    /// Drop `images` from the split added last.
    pub fn without_images(mut self) -> Self {
        if let Some(split) = self.splits.last_mut() {
            split.images = None;
        }
        self
    }

    /// Drop `annotations` from the split added last.
    pub fn without_annotations(mut self) -> Self {
        if let Some(split) = self.splits.last_mut() {
            split.annotations = None;
        }
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "dataset:");
        let _ = writeln!(out, "  name: &dataset_name {}", quote(&self.name));
        let _ = writeln!(
            out,
            "  root: &root_dir !join [{}, *dataset_name]",
            quote(&self.prefix)
        );
        let _ = writeln!(out, "  num_workers: {}", self.num_workers);
        let _ = writeln!(out, "  splits:");
        for split in &self.splits {
            let _ = writeln!(out, "    {}:", split.name);
            if let Some(images) = &split.images {
                let _ = writeln!(out, "      images: !join [*root_dir, {}]", quote(images));
            }
            if let Some(annotations) = &split.annotations {
                let _ = writeln!(
                    out,
                    "      annotations: !join [*root_dir, {}]",
                    quote(annotations)
                );
            }
            let _ = writeln!(out, "      remove_non_annotated_imgs: false");
        }
        out
    }

    /// Build the document and resolve it.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let text = self.build();
        debug!(splits = self.splits.len(), "resolving generated dataset document");
        expcfg::resolve(&text)
    }
}

/// Builder for a document holding a single `!join` under `key`, with each
/// operand either a quoted literal or an alias to an anchored literal.
pub struct JoinDocBuilder {
    key: String,
    operands: Vec<Operand>,
}

enum Operand {
    Literal(String),
    Anchored(String),
}

impl JoinDocBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            operands: Vec::new(),
        }
    }

    pub fn literal(mut self, s: &str) -> Self {
        self.operands.push(Operand::Literal(s.to_string()));
        self
    }

    /// Declare `s` under an anchor in a `vars` section and reference it.
    pub fn anchored(mut self, s: &str) -> Self {
        self.operands.push(Operand::Anchored(s.to_string()));
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        let mut refs = Vec::with_capacity(self.operands.len());

        let anchored: Vec<(usize, &String)> = self
            .operands
            .iter()
            .enumerate()
            .filter_map(|(i, op)| match op {
                Operand::Anchored(s) => Some((i, s)),
                Operand::Literal(_) => None,
            })
            .collect();
        if !anchored.is_empty() {
            let _ = writeln!(out, "vars:");
            for (i, s) in &anchored {
                let _ = writeln!(out, "  v{i}: &v{i} {}", quote(s));
            }
        }

        for (i, op) in self.operands.iter().enumerate() {
            match op {
                Operand::Literal(s) => refs.push(quote(s)),
                Operand::Anchored(_) => refs.push(format!("*v{i}")),
            }
        }
        let _ = writeln!(out, "{}: !join [{}]", self.key, refs.join(", "));
        out
    }

    /// Build the document and resolve it.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let text = self.build();
        debug!(operands = self.operands.len(), "resolving generated join document");
        expcfg::resolve(&text)
    }

    /// Plain concatenation of the operands.
    pub fn expected(&self) -> String {
        self.operands
            .iter()
            .map(|op| match op {
                Operand::Literal(s) | Operand::Anchored(s) => s.as_str(),
            })
            .collect()
    }
}
