mod common;

use common::TestFixtures;
use serde_json::json;
use validate_schema::{
    Compiler, Document, DocumentDecoder, JsonDecoder, SchemaError, TomlDecoder, compile,
};

fn compile_toml(text: &str) -> validate_schema::Result<validate_schema::RuleTree> {
    compile(&TomlDecoder.decode(text)?)
}

#[test]
fn test_character_schema_compiles_to_control_map() {
    let fixtures = TestFixtures::new();
    let tree = compile_toml(&fixtures.read_schema("character")).unwrap();

    let control = json!({
        "age": "number,required,min=1,max=1500",
        "credits": "number,required,min=0,max=150000",
        "force_sensitive": "boolean,required",
        "location": {
            "address1": "string,required",
            "address2": "string,required"
        },
        "name": "string,required,min=1,max=128",
        "ships": {
            "id": "string,required,uuid",
            "make": "string,oneof=x-wing y-wing a-wing millenium falcon tie-fighter",
            "data": {
                "id": "string,required,uuid",
                "data": {
                    "id": "string,required,uuid"
                }
            }
        }
    });

    assert_eq!(serde_json::to_value(&tree).unwrap(), control);
    assert_eq!(tree.leaf_count(), 10);
    assert_eq!(
        tree.lookup("ships.data.data.id").and_then(|node| node.as_leaf()),
        Some("string,required,uuid")
    );
}

#[test]
fn test_json_schema_compiles_like_toml() {
    let toml_tree = compile_toml(common::PILOT_SCHEMA).unwrap();
    let json_tree = compile(
        &JsonDecoder
            .decode(
                r#"{
                    "name": "string,required,min=1,max=128",
                    "age": "number,required,min=1,max=1500",
                    "ships": [{"id": "string,required,uuid"}]
                }"#,
            )
            .unwrap(),
    )
    .unwrap();

    assert_eq!(toml_tree, json_tree);
}

#[test]
fn test_bad_schema_is_rejected() {
    let result = compile_toml("test =");
    assert!(matches!(result, Err(SchemaError::DocumentDecode { .. })));
}

#[test]
fn test_missing_base_type_is_rejected() {
    match compile_toml(r#"test = "required,min=1""#) {
        Err(SchemaError::SchemaType { field, rule }) => {
            assert_eq!(field, "test");
            assert_eq!(rule, "required,min=1");
        }
        other => panic!("Expected SchemaType error, got {:?}", other),
    }
}

#[test]
fn test_missing_base_type_reports_nested_path() {
    let result = compile_toml(
        r#"
[[ships]]
id = "uuid,required"
"#,
    );

    match result {
        Err(SchemaError::SchemaType { field, .. }) => assert_eq!(field, "ships.id"),
        other => panic!("Expected SchemaType error, got {:?}", other),
    }
}

#[test]
fn test_non_rule_values_are_rejected() {
    for text in ["count = 3", "flag = true", "tags = [\"a\", \"b\"]"] {
        let result = compile_toml(text);
        assert!(
            matches!(result, Err(SchemaError::SchemaParse { .. })),
            "{} should not compile, got {:?}",
            text,
            result
        );
    }
}

#[test]
fn test_heterogeneous_list_is_strict_only_when_asked() {
    let document = JsonDecoder
        .decode(
            r#"{"ships": [
                {"id": "string,required,uuid"},
                {"id": "string,required,uuid", "make": "string"}
            ]}"#,
        )
        .unwrap();

    let lenient = Compiler::new().compile(&document).unwrap();
    assert_eq!(
        serde_json::to_value(&lenient).unwrap(),
        json!({"ships": {"id": "string,required,uuid"}})
    );

    let strict = Compiler::new().with_strict_lists(true).compile(&document);
    match strict {
        Err(SchemaError::HeterogeneousList { field, index }) => {
            assert_eq!(field, "ships");
            assert_eq!(index, 1);
        }
        other => panic!("Expected HeterogeneousList error, got {:?}", other),
    }
}

#[test]
fn test_root_must_be_a_table() {
    let document = Document::String("string,required".to_string());
    assert!(matches!(
        compile(&document),
        Err(SchemaError::SchemaParse { .. })
    ));
}

#[test]
fn test_mixed_list_schema_is_not_registered() {
    let validator = validate_schema::Validator::new();

    let result = validator.register_schema("fleet", r#"ships = [{ id = "string,uuid" }, 5]"#);

    assert!(matches!(result, Err(SchemaError::SchemaParse { .. })));
    assert!(!validator.contains("fleet"));
}
