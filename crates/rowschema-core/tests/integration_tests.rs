//! Integration tests for schema building, projection and reconstruction

use pretty_assertions::assert_eq;
use rowschema_core::technical::TECHNICAL_FIELD_NAMES;
use rowschema_core::{
    decode_name, encode_name, parse, DataType, DeletionPolicy, Duration, Field, ForeignKey,
    KeySchema, PrimitiveType, Record, RootSchema, SchemaError, SchemaTree, Sensitivity, TimeUnit,
    ToWireSchema, ValueSchema,
};
use serde_json::json;

/// Schema written by an external producer, without the metadata keys
const COMMIT_VALUE_SCHEMA: &str = r#"
{
    "name": "commit",
    "type": "record",
    "pks": ["commit_id", "producer_name"],
    "fields": [
        {"name": "commit_id", "type": "string"},
        {"name": "producer_name", "type": "string", "default": ""},
        {"name": "commit_epoch_ns", "type": "long"},
        {"name": "record_count", "type": "int", "default": 0},
        {
            "name": "topics",
            "type": [
                "null",
                {
                    "type": "map",
                    "values": {
                        "name": "topic_offsets",
                        "type": "record",
                        "fields": [
                            {"name": "topic_name", "type": "string"},
                            {"name": "schema_names", "type": {"type": "array", "items": "string"}},
                            {
                                "name": "offsets",
                                "type": [
                                    {
                                        "type": "map",
                                        "values": {
                                            "name": "min_max_offsets",
                                            "type": "record",
                                            "fields": [
                                                {"name": "min_offset", "type": "long"},
                                                {"name": "max_offset", "type": "long"},
                                                {"name": "partition", "type": "int"}
                                            ]
                                        }
                                    }
                                ]
                            }
                        ]
                    }
                }
            ]
        }
    ]
}
"#;

fn customer_schema() -> ValueSchema {
    let mut value = ValueSchema::new("CUSTOMER").with_doc("Customer master data");
    value
        .add_field(
            Field::new("CUSTOMER_ID", PrimitiveType::Int)
                .not_null()
                .with_source_data_type("NUMBER(10)"),
        )
        .unwrap();
    value
        .add_field(Field::new("COMPANY_NAME", PrimitiveType::nvarchar(30).unwrap()))
        .unwrap();
    value
        .add_field(Field::new("ADDRESS_ID", PrimitiveType::Int))
        .unwrap();
    value
        .add_field(
            Field::new("REVENUE$", PrimitiveType::decimal(12, 0).unwrap())
                .with_sensitivity(Sensitivity::Sensitive),
        )
        .unwrap();
    value
        .add_field(
            Field::new("ORDERS", DataType::array(
                Record::new("order line")
                    .with_field(Field::new("line no", PrimitiveType::Short).not_null().with_default(1))
                    .unwrap()
                    .with_field(Field::new("amount", PrimitiveType::decimal(10, 2).unwrap()))
                    .unwrap(),
            )),
        )
        .unwrap();
    value
        .add_field(Field::new("ATTRIBUTES", DataType::map(PrimitiveType::AnyPrimitive)))
        .unwrap();

    value
        .with_pks(["CUSTOMER_ID"])
        .with_fk(
            ForeignKey::new("ADDRESS")
                .with_name("Customer to Address")
                .add_condition("ADDRESS_ID", "ADDRESS_ID"),
        )
        .with_data_product_owner_email("owner@company.com")
        .with_retention_period(Duration::new(6, TimeUnit::Years))
        .with_deletion_policy(DeletionPolicy::new(10, TimeUnit::Years).with_description("legal hold"))
        .with_data_classification("GDPR")
        .with_data_classification("EAR")
        .with_repo_url("https://git.example.com/customer")
}

#[test]
fn name_codec_roundtrip() {
    for s in ["", "plain", "a_xb", "100% free $ign", "unicode-äöü"] {
        assert_eq!(decode_name(&encode_name(s)), s);
    }
}

#[test]
fn literal_escape_tokens_stay_literal() {
    for s in ["_x0041", "prefix_x00e4suffix", "_x005f_x0078", "a__x1234_"] {
        let encoded = encode_name(s);
        assert_eq!(decode_name(&encoded), s, "encoded as {encoded}");
        assert_ne!(decode_name(s), s, "{s} contains a token, decoding must change it");
    }
}

#[test]
fn nullable_encoding() {
    let wire = Field::new("x", PrimitiveType::Double).to_wire_schema();
    assert_eq!(wire["type"], json!(["null", {"type": "double", "logicalType": "DOUBLE"}]));
    assert_eq!(wire["default"], json!(null));

    let wire = Field::new("x", PrimitiveType::Double)
        .not_null()
        .with_default(1.5)
        .to_wire_schema();
    assert_eq!(wire["type"], json!({"type": "double", "logicalType": "DOUBLE"}));
    assert_eq!(wire["default"], json!(1.5));
}

#[test]
fn decimal_wire_and_validation() {
    assert_eq!(
        PrimitiveType::decimal(12, 2).unwrap().to_wire_schema(),
        json!({"type": "bytes", "logicalType": "decimal", "precision": 12, "scale": 2})
    );
    assert!(matches!(
        PrimitiveType::decimal(-1, 0),
        Err(SchemaError::InvalidParameter { .. })
    ));
}

#[test]
fn auto_populated_value_fields() {
    let value = ValueSchema::new("X");
    assert_eq!(
        value.record().field_names(),
        vec![
            "__audit",
            "__change_type",
            "__change_time",
            "__source_rowid",
            "__source_transaction",
            "__source_system",
            "__truncate",
            "__extension",
        ]
    );
    assert_eq!(value.record().field_names(), TECHNICAL_FIELD_NAMES.to_vec());
}

#[test]
fn key_derivation_from_primary_key() {
    let mut value = ValueSchema::new("ORDERS");
    value
        .add_field(Field::new("id", PrimitiveType::Int).not_null())
        .unwrap();
    let value = value.with_pks(["id"]);

    let key = KeySchema::derive(&value).unwrap();
    assert_eq!(key.record().len(), 1);
    let id = &key.record().fields()[0];
    assert_eq!(id.name(), "id");
    assert_eq!(id.data_type(), &DataType::Primitive(PrimitiveType::Int));
    assert!(!id.is_nullable());
}

#[test]
fn key_derivation_without_primary_key_uses_timestamp() {
    let key = KeySchema::derive(&ValueSchema::new("EVENTS")).unwrap();
    assert!(key.is_synthetic());
    assert_eq!(key.record().field_names(), vec!["__key_time"]);
    assert_eq!(
        key.to_wire_schema()["fields"][0]["type"],
        json!({"type": "long", "logicalType": "timestamp-micros"})
    );
}

#[test]
fn key_carries_field_governance() {
    let key = KeySchema::derive(&customer_schema()).unwrap();
    let id = key.record().field("CUSTOMER_ID").unwrap();
    assert_eq!(id.source_data_type(), Some("NUMBER(10)"));
    assert_eq!(key.record().namespace(), None);
    assert_eq!(key.record().doc(), Some("Customer master data"));
}

#[test]
fn value_schema_roundtrip() {
    let value = customer_schema();
    let json = value.to_json();
    let parsed = ValueSchema::from_json(&json).unwrap();

    assert_eq!(parsed, value);
    assert_eq!(parsed.fingerprint(), value.fingerprint());
}

#[test]
fn root_schema_roundtrip() {
    let root = RootSchema::new("lookup key")
        .with_namespace("crm")
        .with_field(Field::new("code", PrimitiveType::varchar(8).unwrap()).not_null())
        .unwrap();

    let wire = root.to_wire_schema();
    assert_eq!(wire["name"], json!("lookup_x0020key"));
    assert_eq!(RootSchema::from_wire(&wire).unwrap(), root);
}

#[test]
fn field_roundtrip_for_all_shapes() {
    let nested = Record::new("point")
        .with_field(Field::new("x", PrimitiveType::Double).not_null())
        .unwrap()
        .with_field(Field::new("y", PrimitiveType::Double).not_null())
        .unwrap();

    let shapes: Vec<DataType> = vec![
        PrimitiveType::Boolean.into(),
        PrimitiveType::LocalTimestampMicros.into(),
        PrimitiveType::StGeometry.into(),
        PrimitiveType::Uuid.into(),
        PrimitiveType::AnyPrimitive.into(),
        PrimitiveType::fixed(20, "sha1").unwrap().into(),
        DataType::array(nested.clone()),
        DataType::map(DataType::map(PrimitiveType::Long)),
        DataType::Record(nested.clone()),
        DataType::union(vec![PrimitiveType::Date.into(), nested.into()]).unwrap(),
        DataType::union(
            PrimitiveType::any_primitive_members()
                .into_iter()
                .map(DataType::Primitive)
                .collect(),
        )
        .unwrap(),
    ];

    for shape in shapes {
        for nullable in [true, false] {
            let field = Field::new("f", shape.clone()).with_nullable(nullable);
            let (parsed, parsed_nullable) = parse(&field.to_wire_schema()).unwrap();
            assert_eq!(parsed, shape);
            assert_eq!(parsed_nullable, nullable);
        }
    }
}

#[test]
fn repeated_uuid_columns_define_the_type_once() {
    let mut value = ValueSchema::new("LINKS").with_namespace("graph");
    value
        .add_field(Field::new("SOURCE_ID", PrimitiveType::Uuid).not_null())
        .unwrap();
    value
        .add_field(Field::new("TARGET_ID", PrimitiveType::Uuid).not_null())
        .unwrap();
    let value = value.with_pks(["SOURCE_ID", "TARGET_ID"]);

    let json = value.to_json();
    assert_eq!(json.matches("\"size\":16").count(), 1);
    assert_eq!(ValueSchema::from_json(&json).unwrap(), value);

    let key = KeySchema::derive(&value).unwrap();
    let wire = key.to_wire_schema();
    assert_eq!(wire["fields"][1]["type"], json!("graph.uuid"));
    assert_eq!(RootSchema::from_wire(&wire).unwrap().record(), key.record());
}

#[test]
fn external_schema_and_key() {
    let value = ValueSchema::from_json(COMMIT_VALUE_SCHEMA).unwrap();
    assert_eq!(value.primary_keys(), ["commit_id".to_string(), "producer_name".to_string()]);

    let producer = value.record().field("producer_name").unwrap();
    assert!(!producer.is_nullable());
    assert_eq!(producer.default_value(), Some(&json!("")));

    let topics = value.record().field("topics").unwrap();
    assert!(topics.is_nullable());
    let DataType::Map(values) = topics.data_type() else {
        panic!("topics should be a map, got {:?}", topics.data_type());
    };
    let offsets = values.as_record().unwrap().field("offsets").unwrap();
    assert!(!offsets.is_nullable());
    assert!(matches!(offsets.data_type(), DataType::Map(_)));

    let key = KeySchema::derive(&value).unwrap();
    assert_eq!(key.name(), "commit_key");
    assert_eq!(key.record().field_names(), vec!["commit_id", "producer_name"]);
}

#[test]
fn unrecognized_schema_fails_closed() {
    let err = ValueSchema::from_wire(&json!({
        "name": "bad",
        "type": "record",
        "fields": [{"name": "g", "type": {"type": "geography", "logicalType": "GEOGRAPHY"}}]
    }))
    .unwrap_err();
    assert!(matches!(err, SchemaError::UnrecognizedSchema { .. }));
}
