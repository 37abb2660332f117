// src/config/validate.rs

//! Post-resolution validation.
//!
//! A [`Schema`] is a list of [`Rule`]s, each addressing a dotted key path
//! (`*` matches every child of a mapping or sequence). Checking never stops
//! at the first problem: every issue is collected into one
//! [`ValidationReport`].

use std::fmt;

use crate::resolve::{KeyPath, Value};

/// Expected type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Any,
    String,
    Integer,
    /// Integer or float.
    Number,
    Bool,
    Mapping,
    Sequence,
}

impl Kind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Kind::Any => true,
            Kind::String => matches!(value, Value::String(_)),
            Kind::Integer => matches!(value, Value::Int(_)),
            Kind::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            Kind::Bool => matches!(value, Value::Bool(_)),
            Kind::Mapping => matches!(value, Value::Mapping(_)),
            Kind::Sequence => matches!(value, Value::Sequence(_)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Any => "any value",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Mapping => "mapping",
            Kind::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

/// Extra check applied once the type matched.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Number strictly greater than zero.
    Positive,
    /// Number greater than or equal to zero.
    NonNegative,
    /// Number within `min..=max`.
    Range { min: f64, max: f64 },
    /// Scalar whose string form is one of the listed values.
    OneOf(Vec<String>),
    /// String, sequence or mapping with at least one element.
    NonEmpty,
}

impl Constraint {
    fn check(&self, value: &Value) -> Option<Problem> {
        match self {
            Constraint::Positive => {
                let n = value.as_f64()?;
                (n <= 0.0 || n.is_nan()).then(|| Problem::OutOfRange {
                    value: n,
                    expected: "> 0".to_string(),
                })
            }
            Constraint::NonNegative => {
                let n = value.as_f64()?;
                (n < 0.0 || n.is_nan()).then(|| Problem::OutOfRange {
                    value: n,
                    expected: ">= 0".to_string(),
                })
            }
            Constraint::Range { min, max } => {
                let n = value.as_f64()?;
                (!(*min..=*max).contains(&n)).then(|| Problem::OutOfRange {
                    value: n,
                    expected: format!("in {min}..={max}"),
                })
            }
            Constraint::OneOf(allowed) => {
                let s = value.to_join_string()?;
                (!allowed.iter().any(|a| *a == s)).then(|| Problem::NotAllowed {
                    value: s,
                    allowed: allowed.clone(),
                })
            }
            Constraint::NonEmpty => {
                let empty = match value {
                    Value::String(s) => s.is_empty(),
                    Value::Sequence(items) => items.is_empty(),
                    Value::Mapping(map) => map.is_empty(),
                    _ => false,
                };
                empty.then_some(Problem::Empty)
            }
        }
    }
}

/// A single requirement on the resolved tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    path: String,
    required: bool,
    nullable: bool,
    kind: Kind,
    constraints: Vec<Constraint>,
}

impl Rule {
    /// The key must be present and non-null.
    pub fn required(path: impl Into<String>) -> Self {
        Self::new(path.into(), true)
    }

    /// The key may be absent or null; when present it is checked.
    pub fn optional(path: impl Into<String>) -> Self {
        Self::new(path.into(), false)
    }

    fn new(path: String, required: bool) -> Self {
        Self {
            path,
            required,
            nullable: false,
            kind: Kind::Any,
            constraints: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    pub fn string(self) -> Self {
        self.kind(Kind::String)
    }

    pub fn integer(self) -> Self {
        self.kind(Kind::Integer)
    }

    pub fn number(self) -> Self {
        self.kind(Kind::Number)
    }

    pub fn boolean(self) -> Self {
        self.kind(Kind::Bool)
    }

    pub fn mapping(self) -> Self {
        self.kind(Kind::Mapping)
    }

    pub fn sequence(self) -> Self {
        self.kind(Kind::Sequence)
    }

    /// Accept an explicit `null` even on a required key.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn positive(self) -> Self {
        self.constraint(Constraint::Positive)
    }

    pub fn non_negative(self) -> Self {
        self.constraint(Constraint::NonNegative)
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.constraint(Constraint::Range { min, max })
    }

    pub fn one_of<S: AsRef<str>>(self, allowed: &[S]) -> Self {
        let allowed = allowed.iter().map(|s| s.as_ref().to_string()).collect();
        self.constraint(Constraint::OneOf(allowed))
    }

    pub fn non_empty(self) -> Self {
        self.constraint(Constraint::NonEmpty)
    }

    fn check(&self, root: &Value, issues: &mut Vec<ValidationIssue>) {
        for site in expand(root, &self.path) {
            match site {
                Site::Missing(path) => {
                    if self.required {
                        issues.push(ValidationIssue::new(path, Problem::Missing));
                    }
                }
                Site::Present(path, Value::Null) => {
                    if self.required && !self.nullable {
                        issues.push(ValidationIssue::new(path, Problem::Missing));
                    }
                }
                Site::Present(path, value) => {
                    if !self.kind.accepts(value) {
                        issues.push(ValidationIssue::new(
                            path,
                            Problem::WrongType {
                                expected: self.kind,
                                found: value.type_name(),
                            },
                        ));
                        continue;
                    }
                    for constraint in &self.constraints {
                        if let Some(problem) = constraint.check(value) {
                            issues.push(ValidationIssue::new(path.clone(), problem));
                        }
                    }
                }
            }
        }
    }
}

enum Site<'v> {
    Present(KeyPath, &'v Value),
    /// Nothing at this path; the path is the first absent (or null) ancestor.
    Missing(KeyPath),
}

/// Every location `pattern` addresses in `root`.
fn expand<'v>(root: &'v Value, pattern: &str) -> Vec<Site<'v>> {
    let mut sites = vec![Site::Present(KeyPath::root(), root)];
    for segment in pattern.split('.').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        for site in sites {
            match site {
                // A wildcard over an absent collection matches nothing.
                Site::Missing(_) | Site::Present(_, Value::Null) if segment == "*" => {}
                Site::Missing(path) => next.push(Site::Missing(path)),
                Site::Present(path, Value::Null) => next.push(Site::Missing(path)),
                Site::Present(path, Value::Mapping(map)) => {
                    if segment == "*" {
                        for (key, child) in map.iter() {
                            next.push(Site::Present(path.child(key), child));
                        }
                    } else {
                        match map.get(segment) {
                            Some(child) => next.push(Site::Present(path.child(segment), child)),
                            None => next.push(Site::Missing(path.child(segment))),
                        }
                    }
                }
                Site::Present(path, Value::Sequence(items)) => {
                    if segment == "*" {
                        for (i, child) in items.iter().enumerate() {
                            next.push(Site::Present(path.index(i), child));
                        }
                    } else if let Ok(i) = segment.parse::<usize>() {
                        match items.get(i) {
                            Some(child) => next.push(Site::Present(path.index(i), child)),
                            None => next.push(Site::Missing(path.index(i))),
                        }
                    }
                }
                // Scalars have no children; the parent's own rule reports
                // the type mismatch.
                Site::Present(_, _) => {}
            }
        }
        sites = next;
    }
    sites
}

/// What is wrong at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Problem {
    Missing,
    WrongType { expected: Kind, found: &'static str },
    OutOfRange { value: f64, expected: String },
    NotAllowed { value: String, allowed: Vec<String> },
    Empty,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => write!(f, "required key is missing"),
            Problem::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Problem::OutOfRange { value, expected } => {
                write!(f, "value {value} is out of range (expected {expected})")
            }
            Problem::NotAllowed { value, allowed } => {
                write!(f, "'{value}' is not one of: {}", allowed.join(", "))
            }
            Problem::Empty => write!(f, "must not be empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: KeyPath,
    pub problem: Problem,
}

impl ValidationIssue {
    fn new(path: KeyPath, problem: Problem) -> Self {
        Self { path, problem }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// All issues found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any issue sits at the dotted `path`.
    pub fn mentions(&self, path: &str) -> bool {
        self.issues.iter().any(|i| i.path.to_string() == path)
    }

    fn push_unique(&mut self, issue: ValidationIssue) {
        if !self.issues.contains(&issue) {
            self.issues.push(issue);
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// A set of rules checked together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    rules: Vec<Rule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn extend(mut self, other: Schema) -> Self {
        self.rules.extend(other.rules);
        self
    }

    /// Check `root` against every rule.
    ///
    /// Issues are reported in rule order; an absent section that several
    /// rules depend on is reported once.
    pub fn check(&self, root: &Value) -> std::result::Result<(), ValidationReport> {
        let mut report = ValidationReport::default();
        let mut issues = Vec::new();
        for rule in &self.rules {
            rule.check(root, &mut issues);
        }
        for issue in issues {
            report.push_unique(issue);
        }
        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }
}
