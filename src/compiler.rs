//! Schema compiler
//!
//! Walks a decoded [`Document`] depth-first and produces a [`RuleTree`]:
//!
//! - string leaves are kept verbatim as rule strings, but must start with a
//!   base type tag (`string`, `number` or `boolean`)
//! - tables become nested rule trees
//! - arrays of tables collapse to the rule tree of their first element; rule
//!   trees describe per-element shape, never repetition
//!
//! Everything else is rejected with the offending field's dotted path.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::document::Document;
use crate::error::{Result, SchemaError};

/// Base types a leaf rule string may start with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    String,
    Number,
    Boolean,
}

impl BaseType {
    pub const ALL: [BaseType; 3] = [BaseType::String, BaseType::Number, BaseType::Boolean];

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(BaseType::String),
            "number" => Some(BaseType::Number),
            "boolean" => Some(BaseType::Boolean),
            _ => None,
        }
    }

    /// Base type named by the first comma-delimited token of a rule string
    pub fn of_rule(rule: &str) -> Option<Self> {
        rule.split(',').next().and_then(Self::parse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BaseType::String => "string",
            BaseType::Number => "number",
            BaseType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled field: either a leaf rule string or a nested tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleNode {
    Leaf(String),
    Tree(RuleTree),
}

impl RuleNode {
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            RuleNode::Leaf(rule) => Some(rule),
            RuleNode::Tree(_) => None,
        }
    }

    pub fn as_tree(&self) -> Option<&RuleTree> {
        match self {
            RuleNode::Tree(tree) => Some(tree),
            RuleNode::Leaf(_) => None,
        }
    }
}

/// Compiled schema: field name to leaf rule or nested rule tree
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RuleTree {
    fields: BTreeMap<String, RuleNode>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, node: RuleNode) -> Option<RuleNode> {
        self.fields.insert(field.into(), node)
    }

    pub fn get(&self, field: &str) -> Option<&RuleNode> {
        self.fields.get(field)
    }

    /// Look up a node by dotted path, e.g. `ships.data.id`
    pub fn lookup(&self, path: &str) -> Option<&RuleNode> {
        let mut segments = path.split('.');
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = node.as_tree()?.get(segment)?;
        }
        Some(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuleNode)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of leaf rules across the whole tree
    pub fn leaf_count(&self) -> usize {
        self.fields
            .values()
            .map(|node| match node {
                RuleNode::Leaf(_) => 1,
                RuleNode::Tree(tree) => tree.leaf_count(),
            })
            .sum()
    }
}

impl FromIterator<(String, RuleNode)> for RuleTree {
    fn from_iter<I: IntoIterator<Item = (String, RuleNode)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Schema compiler options
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    /// Reject example lists whose later elements differ in shape from the first
    strict_lists: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_lists(mut self, strict: bool) -> Self {
        self.strict_lists = strict;
        self
    }

    /// Compile a decoded document into a rule tree
    pub fn compile(&self, document: &Document) -> Result<RuleTree> {
        match document {
            Document::Object(fields) => {
                // an untyped leaf anywhere outranks shape errors
                if let Some(error) = find_untyped_leaf(fields, "") {
                    return Err(error);
                }
                self.compile_object(fields, "")
            }
            other => Err(SchemaError::SchemaParse {
                field: "<root>".to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn compile_object(&self, fields: &BTreeMap<String, Document>, prefix: &str) -> Result<RuleTree> {
        let mut tree = RuleTree::new();

        for (key, value) in fields {
            let path = join_path(prefix, key);
            let node = match value {
                Document::String(rule) => {
                    if BaseType::of_rule(rule).is_none() {
                        return Err(SchemaError::SchemaType {
                            field: path,
                            rule: rule.clone(),
                        });
                    }
                    RuleNode::Leaf(rule.clone())
                }
                Document::Object(nested) => RuleNode::Tree(self.compile_object(nested, &path)?),
                Document::List(items) => match items.first() {
                    Some(Document::Object(first))
                        if items.iter().all(|item| matches!(item, Document::Object(_))) =>
                    {
                        self.check_list_shape(items, &path)?;
                        RuleNode::Tree(self.compile_object(first, &path)?)
                    }
                    _ => {
                        return Err(SchemaError::SchemaParse {
                            field: path,
                            value: value.to_string(),
                        });
                    }
                },
                other => {
                    return Err(SchemaError::SchemaParse {
                        field: path,
                        value: other.to_string(),
                    });
                }
            };
            tree.insert(key.clone(), node);
        }

        Ok(tree)
    }

    fn check_list_shape(&self, items: &[Document], path: &str) -> Result<()> {
        let Some(first) = items.first() else {
            return Ok(());
        };

        for (index, item) in items.iter().enumerate().skip(1) {
            if same_shape(first, item) {
                continue;
            }
            if self.strict_lists {
                return Err(SchemaError::HeterogeneousList {
                    field: path.to_string(),
                    index,
                });
            }
            warn!(
                field = path,
                index, "list element differs from the first element; only the first is compiled"
            );
        }

        Ok(())
    }
}

/// First leaf, in compile order, whose rule string lacks a base type
fn find_untyped_leaf(fields: &BTreeMap<String, Document>, prefix: &str) -> Option<SchemaError> {
    fields.iter().find_map(|(key, value)| {
        let path = join_path(prefix, key);
        match value {
            Document::String(rule) if BaseType::of_rule(rule).is_none() => {
                Some(SchemaError::SchemaType {
                    field: path,
                    rule: rule.clone(),
                })
            }
            Document::Object(nested) => find_untyped_leaf(nested, &path),
            Document::List(items) => match items.first() {
                Some(Document::Object(first)) => find_untyped_leaf(first, &path),
                _ => None,
            },
            _ => None,
        }
    })
}

/// Compile with default options
pub fn compile(document: &Document) -> Result<RuleTree> {
    Compiler::default().compile(document)
}

pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn same_shape(a: &Document, b: &Document) -> bool {
    match (a, b) {
        (Document::Object(left), Document::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, value)| {
                    right
                        .get(key)
                        .is_some_and(|other| same_shape(value, other))
                })
        }
        (Document::List(left), Document::List(right)) => match (left.first(), right.first()) {
            (Some(l), Some(r)) => same_shape(l, r),
            (None, None) => true,
            _ => false,
        },
        _ => a.kind() == b.kind(),
    }
}
