//! Shape normalizer
//!
//! The evaluator walks data one record at a time: a field is either a plain
//! value, a nested record, or a list whose record elements are checked one by
//! one against the same nested rules. Raw JSON does not make that distinction,
//! so [`normalize`] rewrites it into [`Record`]s before evaluation.
//!
//! The rewrite is purely structural. It does not look at the rule tree, never
//! fails, never drops a field and never changes the length of a list.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Normalized data field
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Scalar (or null) passed through unchanged
    Value(Value),
    /// Nested mapping
    Record(Record),
    /// List with every mapping element normalized into a record
    List(Vec<Field>),
}

impl Field {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Field::Record(normalize(map)),
            Value::Array(items) => Field::List(items.into_iter().map(Field::from_value).collect()),
            scalar => Field::Value(scalar),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Field::Value(value) => value,
            Field::Record(record) => Value::Object(record.into_map()),
            Field::List(items) => Value::Array(items.into_iter().map(Field::into_value).collect()),
        }
    }

    /// Scalar value, if this field holds one
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Field::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Value(Value::Null))
    }
}

/// A normalized mapping from field name to [`Field`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
            .into_iter()
            .map(|(name, field)| (name, field.into_value()))
            .collect()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.into_map())
    }
}

/// Rewrite a data mapping into a [`Record`], recursing into nested mappings and
/// into every mapping element of every list
pub fn normalize(data: Map<String, Value>) -> Record {
    Record {
        fields: data
            .into_iter()
            .map(|(name, value)| (name, Field::from_value(value)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected JSON object"),
        }
    }

    #[test]
    fn test_scalars_pass_through() {
        let record = normalize(object(json!({"name": "Leia", "age": 30, "alive": true, "ship": null})));

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("name"), Some(&Field::Value(json!("Leia"))));
        assert_eq!(record.get("age"), Some(&Field::Value(json!(30))));
        assert_eq!(record.get("alive"), Some(&Field::Value(json!(true))));
        assert!(record.get("ship").unwrap().is_null());
    }

    #[test]
    fn test_every_list_element_is_normalized() {
        let record = normalize(object(json!({
            "ships": [
                {"id": "a", "data": {"id": "b"}},
                {"id": "c", "data": {"id": "d"}}
            ]
        })));

        let Field::List(items) = record.get("ships").unwrap() else {
            panic!("Expected list");
        };
        assert_eq!(items.len(), 2);
        for item in items {
            let ship = item.as_record().unwrap();
            assert!(ship.get("data").unwrap().as_record().is_some());
        }
    }

    #[test]
    fn test_mixed_list_keeps_cardinality() {
        let record = normalize(object(json!({"items": [1, {"a": 2}, "x", [3]]})));

        let Field::List(items) = record.get("items").unwrap() else {
            panic!("Expected list");
        };
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], Field::Value(json!(1)));
        assert!(items[1].as_record().is_some());
        assert_eq!(items[2], Field::Value(json!("x")));
        assert!(matches!(items[3], Field::List(_)));
    }

    #[test]
    fn test_round_trip_preserves_data() {
        let data = json!({
            "name": "Leia",
            "location": {"address1": "Alderaan", "address2": "Palace"},
            "ships": [{"id": "x"}, {"id": "y", "data": {"data": {"id": "z"}}}],
            "tags": ["a", "b"],
            "empty": []
        });

        let record = normalize(object(data.clone()));
        assert_eq!(record.into_value(), data);
    }

    #[test]
    fn test_idempotent() {
        let data = object(json!({"a": [{"b": [{"c": 1}]}], "d": {"e": [1, 2]}}));

        let once = normalize(data);
        let twice = normalize(once.clone().into_map());
        assert_eq!(once, twice);
    }
}
