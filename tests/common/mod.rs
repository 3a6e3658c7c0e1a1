#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{Map, Value};

/// Paths into tests/fixtures
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        Self {
            fixtures_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("tests")
                .join("fixtures"),
        }
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.fixtures_dir.join("schemas")
    }

    pub fn schema(&self, name: &str) -> PathBuf {
        self.schemas_dir().join(format!("{}.toml", name))
    }

    pub fn data_dir(&self, schema: &str) -> PathBuf {
        self.fixtures_dir.join("data").join(schema)
    }

    pub fn data(&self, schema: &str, file: &str) -> PathBuf {
        self.data_dir(schema).join(file)
    }

    pub fn read_schema(&self, name: &str) -> String {
        std::fs::read_to_string(self.schema(name)).expect("fixture schema should be readable")
    }

    pub fn read_data(&self, schema: &str, file: &str) -> Value {
        let text = std::fs::read_to_string(self.data(schema, file))
            .expect("fixture data should be readable");
        serde_json::from_str(&text).expect("fixture data should be valid JSON")
    }
}

/// Schema used by the end-to-end examples
pub const PILOT_SCHEMA: &str = r#"
name = "string,required,min=1,max=128"
age = "number,required,min=1,max=1500"

[[ships]]
id = "string,required,uuid"
"#;

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected JSON object, got {}", other),
    }
}
