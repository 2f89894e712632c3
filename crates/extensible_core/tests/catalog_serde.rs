use extensible_core::{
    coerce_value, ExtensionRegistry, Implementation, OptionError, OptionSpec, OptionType,
    OptionValue, RawOptions,
};
use serde_json::json;

#[derive(Debug)]
struct Store {
    url: String,
    pool_size: i64,
    read_only: bool,
}

fn store_registry() -> ExtensionRegistry {
    let mut registry = ExtensionRegistry::new();
    let sql = Implementation::<Store>::new("sql", |options| {
        Ok(Box::new(Store {
            url: options.string("url")?,
            pool_size: options.int("pool_size")?,
            read_only: options.bool("read_only")?,
        }))
    })
    .with_description("SQL backed store.")
    .with_option(OptionSpec::string("url").with_label("Database URL"))
    .with_option(OptionSpec::int("pool_size").with_default(5))
    .with_option(OptionSpec::bool("read_only").with_default(false));
    registry.register("store", sql).expect("sql registration");
    registry
}

#[test]
fn raw_options_deserialize_from_json_table() {
    let raw: RawOptions = serde_json::from_value(json!({
        "url": "sqlite::memory:",
        "pool_size": 2,
        "read_only": true,
        "ratio": 0.5
    }))
    .expect("raw options should deserialize");

    assert_eq!(raw["url"], OptionValue::Str("sqlite::memory:".to_string()));
    assert_eq!(raw["pool_size"], OptionValue::Int(2));
    assert_eq!(raw["read_only"], OptionValue::Bool(true));
    assert_eq!(raw["ratio"], OptionValue::Float(0.5));
}

#[test]
fn json_integer_beyond_i64_becomes_float() {
    let raw: RawOptions = serde_json::from_value(json!({ "size": 18446744073709551615u64 }))
        .expect("raw options should deserialize");
    assert!(matches!(raw["size"], OptionValue::Float(_)));

    let err = coerce_value(&OptionSpec::int("size"), &raw["size"])
        .expect_err("out of range integer must fail");
    match err {
        OptionError::TypeCoercion {
            option,
            expected,
            value,
        } => {
            assert_eq!(option, "size");
            assert_eq!(expected, OptionType::Int);
            assert!(matches!(value, OptionValue::Float(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn json_sourced_options_build_instance() {
    let registry = store_registry();
    let raw: RawOptions = serde_json::from_value(json!({
        "url": "postgres://localhost/app",
        "pool_size": "12",
        "read_only": "on"
    }))
    .expect("raw options should deserialize");

    let store = registry
        .create::<Store>("store", "sql", &raw)
        .expect("store should build");
    assert_eq!(store.url, "postgres://localhost/app");
    assert_eq!(store.pool_size, 12);
    assert!(store.read_only);
}

#[test]
fn description_serializes_with_stable_field_names() {
    let registry = store_registry();
    let description = registry.describe("store", "sql").expect("describe");
    let value = serde_json::to_value(&description).expect("description should serialize");

    assert_eq!(value["type"], "store");
    assert_eq!(value["name"], "sql");
    assert_eq!(value["label"], "sql");
    assert_eq!(value["doc"], "SQL backed store.");
    assert_eq!(
        value["options"][0],
        json!({
            "name": "url",
            "label": "Database URL",
            "type": "string",
            "default": null,
            "required": true,
            "description": null
        })
    );
    assert_eq!(value["options"][1]["default"], 5);
    assert_eq!(value["options"][2]["type"], "bool");
}
