//! Rule evaluation
//!
//! [`RuleEvaluator`] is the seam between compiled schemas and the code that
//! actually checks values. [`BuiltinEvaluator`] walks a normalized [`Record`]
//! alongside a [`RuleTree`] and collects [`Violations`] keyed by field path
//! (`name`, `location.address1`, `ships[0].id`).

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::compiler::{RuleNode, RuleTree, join_path};
use crate::normalizer::{Field, Record};
use crate::rules::{LeafRule, json_kind};

/// Field path to failure messages; empty means the data is valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations {
    entries: BTreeMap<String, Vec<String>>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(path.into())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, path: &str, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.entries
            .entry(path.to_string())
            .or_default()
            .extend(messages);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failing field paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of messages across all paths
    pub fn message_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.entries
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, messages)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}", path, messages.join("; "))?;
        }
        Ok(())
    }
}

/// Checks a normalized record against a compiled rule tree
///
/// Implementations report data mismatches through the returned
/// [`Violations`]; they never fail.
pub trait RuleEvaluator: Send + Sync {
    fn evaluate(&self, data: &Record, rules: &RuleTree) -> Violations;
}

/// Default evaluator understanding the go-validator style modifiers in
/// [`crate::rules`]
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinEvaluator;

impl BuiltinEvaluator {
    fn evaluate_record(&self, data: &Record, rules: &RuleTree, prefix: &str, out: &mut Violations) {
        for (name, node) in rules.iter() {
            let path = join_path(prefix, name);
            let field = data.get(name);

            match node {
                RuleNode::Leaf(rule) => {
                    let rule = LeafRule::parse(rule);
                    let messages = match field {
                        None => rule.evaluate(None),
                        Some(Field::Value(value)) => rule.evaluate(Some(value)),
                        Some(Field::Record(_)) => vec![rule.type_mismatch("object")],
                        Some(Field::List(_)) => vec![rule.type_mismatch("array")],
                    };
                    out.extend(&path, messages);
                }
                RuleNode::Tree(tree) => match field {
                    // array-level presence is not constrained
                    None | Some(Field::Value(serde_json::Value::Null)) => {}
                    Some(Field::Record(record)) => self.evaluate_record(record, tree, &path, out),
                    Some(Field::List(items)) => {
                        for (index, item) in items.iter().enumerate() {
                            let item_path = format!("{}[{}]", path, index);
                            match item {
                                Field::Record(record) => {
                                    self.evaluate_record(record, tree, &item_path, out)
                                }
                                Field::Value(value) => out.add(
                                    item_path,
                                    format!("expected an object, got {}", json_kind(value)),
                                ),
                                Field::List(_) => {
                                    out.add(item_path, "expected an object, got array")
                                }
                            }
                        }
                    }
                    Some(Field::Value(value)) => {
                        out.add(path, format!("expected an object, got {}", json_kind(value)))
                    }
                },
            }
        }
    }
}

impl RuleEvaluator for BuiltinEvaluator {
    fn evaluate(&self, data: &Record, rules: &RuleTree) -> Violations {
        let mut violations = Violations::new();
        self.evaluate_record(data, rules, "", &mut violations);
        violations
    }
}
