//! Named store of compiled rule trees
//!
//! The registry is owned by the caller and can be shared across threads: the
//! write lock covers inserting a schema, the read lock covers a lookup. Lookups
//! hand out an `Arc<RuleTree>`, so evaluation never holds the lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compiler::{Compiler, RuleTree};
use crate::document::{Document, DocumentDecoder, TomlDecoder};
use crate::error::{Result, SchemaError};

/// What to do when a schema name is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last write wins
    #[default]
    Overwrite,
    /// Keep the existing schema and fail the registration
    Reject,
}

pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<RuleTree>>>,
    compiler: Compiler,
    policy: DuplicatePolicy,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::with_options(Compiler::default(), DuplicatePolicy::default())
    }

    pub fn with_options(compiler: Compiler, policy: DuplicatePolicy) -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            compiler,
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Decode TOML schema text, compile it and store it under `name`
    pub fn register(&self, name: &str, schema_text: &str) -> Result<()> {
        self.register_with(name, schema_text, &TomlDecoder)
    }

    /// Same as [`register`](Self::register) with an explicit decoder
    pub fn register_with(
        &self,
        name: &str,
        schema_text: &str,
        decoder: &dyn DocumentDecoder,
    ) -> Result<()> {
        let document = decoder.decode(schema_text)?;
        self.register_document(name, &document)
    }

    /// Compile an already decoded document and store it under `name`
    ///
    /// Nothing is stored if compilation fails.
    pub fn register_document(&self, name: &str, document: &Document) -> Result<()> {
        let tree = self.compiler.compile(document)?;
        self.insert(name, tree)
    }

    /// Store a compiled tree under `name`, honoring the duplicate policy
    pub fn insert(&self, name: &str, tree: RuleTree) -> Result<()> {
        let leaves = tree.leaf_count();
        let mut schemas = self.schemas.write().map_err(|e| SchemaError::Concurrency {
            details: format!("Schema registry lock poisoned: {}", e),
        })?;

        if self.policy == DuplicatePolicy::Reject && schemas.contains_key(name) {
            return Err(SchemaError::DuplicateSchema {
                name: name.to_string(),
            });
        }

        let replaced = schemas.insert(name.to_string(), Arc::new(tree)).is_some();
        debug!(schema = name, leaves, replaced, "registered schema");
        Ok(())
    }

    /// Look up a compiled schema
    pub fn get(&self, name: &str) -> Result<Arc<RuleTree>> {
        let schemas = self.schemas.read().map_err(|e| SchemaError::Concurrency {
            details: format!("Schema registry lock poisoned: {}", e),
        })?;

        schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::SchemaNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas
            .read()
            .map(|schemas| schemas.contains_key(name))
            .unwrap_or(false)
    }

    /// Registered schema names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schemas
            .read()
            .map(|schemas| schemas.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.read().map(|schemas| schemas.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleNode;
    use crate::document::JsonDecoder;

    #[test]
    fn test_register_and_get() {
        let registry = SchemaRegistry::new();
        registry
            .register("basic", "name = \"string,required\"")
            .unwrap();

        let tree = registry.get("basic").unwrap();
        assert_eq!(tree.get("name"), Some(&RuleNode::Leaf("string,required".into())));
        assert!(registry.contains("basic"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_schema() {
        let registry = SchemaRegistry::new();
        match registry.get("missing") {
            Err(SchemaError::SchemaNotFound { name }) => assert_eq!(name, "missing"),
            other => panic!("Expected SchemaNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_last_write_wins() {
        let registry = SchemaRegistry::new();
        registry.register("s", "a = \"string\"").unwrap();
        registry.register("s", "b = \"number\"").unwrap();

        let tree = registry.get("s").unwrap();
        assert!(tree.get("a").is_none());
        assert!(tree.get("b").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reject_policy() {
        let registry = SchemaRegistry::with_options(Compiler::default(), DuplicatePolicy::Reject);
        registry.register("s", "a = \"string\"").unwrap();

        let result = registry.register("s", "b = \"number\"");
        assert!(matches!(result, Err(SchemaError::DuplicateSchema { .. })));
        assert!(registry.get("s").unwrap().get("a").is_some());
    }

    #[test]
    fn test_failed_compile_leaves_registry_unchanged() {
        let registry = SchemaRegistry::new();
        registry.register("s", "a = \"string\"").unwrap();

        let result = registry.register("s", "a = \"required\"");
        assert!(matches!(result, Err(SchemaError::SchemaType { .. })));
        assert!(registry.get("s").unwrap().get("a").is_some());

        let result = registry.register("t", "a =");
        assert!(matches!(result, Err(SchemaError::DocumentDecode { .. })));
        assert!(!registry.contains("t"));
    }

    #[test]
    fn test_register_with_json_decoder() {
        let registry = SchemaRegistry::new();
        registry
            .register_with("j", r#"{"ships": [{"id": "string,uuid"}]}"#, &JsonDecoder)
            .unwrap();
        assert!(registry.get("j").unwrap().lookup("ships.id").is_some());
    }

    #[test]
    fn test_names_sorted() {
        let registry = SchemaRegistry::new();
        registry.register("zeta", "a = \"string\"").unwrap();
        registry.register("alpha", "a = \"string\"").unwrap();
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_concurrent_register_and_get() {
        let registry = Arc::new(SchemaRegistry::new());
        registry.register("shared", "a = \"string\"").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let name = format!("schema{}", i);
                    registry.register(&name, "a = \"number\"").unwrap();
                    registry.get("shared").unwrap();
                    registry.get(&name).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 9);
    }
}
