use divan::Bencher;
use serde_json::{Value, json};
use validate_schema::{DocumentDecoder, TomlDecoder, Validator, compile};

fn main() {
    divan::main();
}

const CHARACTER_SCHEMA: &str = r#"
name = "string,required,min=1,max=128"
age = "number,required,min=1,max=1500"
credits = "number,required,min=0,max=150000"
force_sensitive = "boolean,required"

[location]
address1 = "string,required"
address2 = "string,required"

[[ships]]
id = "string,required,uuid"
make = "string,oneof=x-wing y-wing a-wing millenium falcon tie-fighter"

[ships.data]
id = "string,required,uuid"
"#;

fn character(ships: usize) -> Value {
    let ships: Vec<Value> = (0..ships)
        .map(|i| {
            json!({
                "id": if i % 2 == 0 { "3f2b8c1e-9d4a-4e7b-8a61-2c5d9e0f1a7b" } else { "not-a-uuid" },
                "make": "x-wing",
                "data": {"id": "0b6e4a2d-71c3-4f58-9e12-d4a8b3c6f901"}
            })
        })
        .collect();

    json!({
        "name": "Leia Organa",
        "age": 60,
        "credits": 1200,
        "force_sensitive": true,
        "location": {"address1": "Royal Palace", "address2": "Aldera"},
        "ships": ships
    })
}

#[divan::bench]
fn compile_schema(bencher: Bencher) {
    bencher.bench_local(|| {
        let document = TomlDecoder
            .decode(divan::black_box(CHARACTER_SCHEMA))
            .expect("Failed to decode schema");
        compile(&document).expect("Failed to compile schema")
    });
}

#[divan::bench(args = [1, 16, 256])]
fn validate_record(bencher: Bencher, ships: usize) {
    let validator = Validator::new();
    validator
        .register_schema("character", CHARACTER_SCHEMA)
        .expect("Failed to register schema");
    let data = character(ships);

    bencher.bench_local(move || {
        validator
            .validate_value("character", divan::black_box(&data))
            .expect("Validation failed")
    });
}

#[divan::bench(args = [64, 1024])]
fn validate_batch(bencher: Bencher, records: usize) {
    let validator = Validator::new();
    validator
        .register_schema("character", CHARACTER_SCHEMA)
        .expect("Failed to register schema");
    let data: Vec<Value> = (0..records).map(|i| character(i % 8)).collect();

    bencher.bench_local(move || {
        validator
            .validate_batch("character", divan::black_box(&data))
            .expect("Validation failed")
    });
}
