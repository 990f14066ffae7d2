//! Model to wire schema projection
//!
//! Records, fixed, enum and UUID types are Avro named types and may be
//! defined only once per document. The first occurrence is written in full;
//! a later identical occurrence is written as its full name.

use super::{
    full_name, PROP_INTERNAL, PROP_ORIGINAL_NAME, PROP_SENSITIVITY, PROP_SOURCE_DATA_TYPE,
    PROP_TECHNICAL,
};
use crate::field::Field;
use crate::naming::encode_name;
use crate::record::Record;
use crate::types::{DataType, PrimitiveType, UnionType};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Size of the fixed type backing a UUID
pub const UUID_SIZE: u32 = 16;

/// Avro name of the fixed type backing a UUID
pub const UUID_NAME: &str = "uuid";

/// Projection of a model node into its wire form
pub trait ToWireSchema {
    fn to_wire_schema(&self) -> Value;
}

/// Named types already defined in the document being written
#[derive(Debug, Default)]
struct NamedTypes {
    defined: HashMap<String, DataType>,
    /// Namespace of the innermost enclosing record
    namespace: Option<String>,
}

impl NamedTypes {
    fn full_name(&self, name: &str, namespace: Option<&str>) -> String {
        full_name(name, namespace.or(self.namespace.as_deref()))
    }

    /// Full name reference for a repeated definition
    ///
    /// The first definition is registered and `None` returned. A different
    /// type under a taken name is written in full again.
    fn reference(&mut self, full_name: String, data_type: &DataType) -> Option<Value> {
        match self.defined.get(&full_name) {
            Some(existing) if existing == data_type => Some(Value::String(full_name)),
            Some(_) => None,
            None => {
                self.defined.insert(full_name, data_type.clone());
                None
            }
        }
    }
}

/// Wire name of named primitive types
fn named_type_name(primitive: &PrimitiveType) -> Option<String> {
    match primitive {
        PrimitiveType::Fixed { name, .. } | PrimitiveType::Enum { name, .. } => {
            Some(encode_name(name))
        }
        PrimitiveType::Uuid => Some(UUID_NAME.to_string()),
        _ => None,
    }
}

fn primitive_wire(primitive: &PrimitiveType, names: &mut NamedTypes) -> Value {
    let Some(descriptor) = primitive.kind().wire_descriptor() else {
        // AnyPrimitive is a plain union of its members
        return Value::Array(
            PrimitiveType::any_primitive_members()
                .iter()
                .map(|member| primitive_wire(member, names))
                .collect(),
        );
    };

    if let Some(name) = named_type_name(primitive) {
        let full = names.full_name(&name, None);
        if let Some(reference) = names.reference(full, &DataType::Primitive(primitive.clone())) {
            return reference;
        }
    }

    let mut node = Map::new();
    node.insert("type".into(), descriptor.avro_type.into());
    node.insert("logicalType".into(), descriptor.logical_type.into());

    match primitive {
        PrimitiveType::Varchar { length } | PrimitiveType::NVarchar { length } => {
            node.insert("length".into(), (*length).into());
        }
        PrimitiveType::Decimal { precision, scale } => {
            node.insert("precision".into(), (*precision).into());
            node.insert("scale".into(), (*scale).into());
        }
        PrimitiveType::Fixed { size, name } => {
            node.insert("name".into(), encode_name(name).into());
            node.insert(PROP_ORIGINAL_NAME.into(), name.as_str().into());
            node.insert("size".into(), (*size).into());
        }
        PrimitiveType::Enum { name, symbols } => {
            node.insert("name".into(), encode_name(name).into());
            node.insert(PROP_ORIGINAL_NAME.into(), name.as_str().into());
            node.insert("symbols".into(), symbols.clone().into());
        }
        PrimitiveType::Uuid => {
            node.insert("name".into(), UUID_NAME.into());
            node.insert("size".into(), UUID_SIZE.into());
        }
        _ => {}
    }

    Value::Object(node)
}

fn union_wire(union: &UnionType, names: &mut NamedTypes) -> Value {
    Value::Array(
        union
            .member_types()
            .map(|member| data_type_wire(member, names))
            .collect(),
    )
}

fn data_type_wire(data_type: &DataType, names: &mut NamedTypes) -> Value {
    match data_type {
        DataType::Primitive(p) => primitive_wire(p, names),
        DataType::Union(u) => union_wire(u, names),
        DataType::Array(items) => {
            let mut node = Map::new();
            node.insert("type".into(), "array".into());
            node.insert("items".into(), data_type_wire(items, names));
            Value::Object(node)
        }
        DataType::Map(values) => {
            let mut node = Map::new();
            node.insert("type".into(), "map".into());
            node.insert("logicalType".into(), "MAP".into());
            node.insert("values".into(), data_type_wire(values, names));
            Value::Object(node)
        }
        DataType::Record(r) => record_wire(r, names),
    }
}

/// Wire type of a field: nullable fields get a leading `"null"` branch
///
/// Avro does not allow nested unions, so a nullable union is flattened into
/// `["null", m1, m2, ...]`.
fn field_type(data_type: &DataType, nullable: bool, names: &mut NamedTypes) -> Value {
    let wire = data_type_wire(data_type, names);
    if !nullable {
        return wire;
    }

    let mut members = vec![Value::from("null")];
    match wire {
        Value::Array(branches) => members.extend(branches),
        other => members.push(other),
    }
    Value::Array(members)
}

fn field_wire(field: &Field, names: &mut NamedTypes) -> Value {
    let mut node = Map::new();
    node.insert("name".into(), field.wire_name().into());
    node.insert(PROP_ORIGINAL_NAME.into(), field.name().into());
    node.insert(
        "type".into(),
        field_type(field.data_type(), field.is_nullable(), names),
    );

    if field.is_nullable() {
        node.insert("default".into(), Value::Null);
    } else if let Some(default) = field.default_value() {
        node.insert("default".into(), default.clone());
    }

    if let Some(doc) = field.doc() {
        node.insert("doc".into(), doc.into());
    }

    // Always present so that reconstruction can tell absent from empty
    node.insert(PROP_SENSITIVITY.into(), field.sensitivity().as_str().into());
    node.insert(PROP_INTERNAL.into(), field.is_internal().into());
    node.insert(PROP_TECHNICAL.into(), field.is_technical().into());
    node.insert(
        PROP_SOURCE_DATA_TYPE.into(),
        field.source_data_type().map_or(Value::Null, Value::from),
    );

    Value::Object(node)
}

fn record_wire(record: &Record, names: &mut NamedTypes) -> Value {
    let full = names.full_name(&encode_name(record.name()), record.namespace());
    match names.reference(full, &DataType::Record(record.clone())) {
        Some(reference) => reference,
        None => Value::Object(record_map(record, names)),
    }
}

/// Record definition; `doc` and `namespace` are always present
fn record_map(record: &Record, names: &mut NamedTypes) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("name".into(), encode_name(record.name()).into());
    node.insert(PROP_ORIGINAL_NAME.into(), record.name().into());
    node.insert("doc".into(), record.doc().map_or(Value::Null, Value::from));
    node.insert("type".into(), "record".into());
    node.insert(
        "namespace".into(),
        record.namespace().map_or(Value::Null, Value::from),
    );

    let enclosing = names.namespace.clone();
    if let Some(namespace) = record.namespace() {
        names.namespace = Some(namespace.to_string());
    }
    let fields = record.iter().map(|f| field_wire(f, names)).collect();
    names.namespace = enclosing;

    node.insert("fields".into(), Value::Array(fields));
    node
}

impl ToWireSchema for PrimitiveType {
    fn to_wire_schema(&self) -> Value {
        primitive_wire(self, &mut NamedTypes::default())
    }
}

impl ToWireSchema for UnionType {
    fn to_wire_schema(&self) -> Value {
        union_wire(self, &mut NamedTypes::default())
    }
}

impl ToWireSchema for DataType {
    fn to_wire_schema(&self) -> Value {
        data_type_wire(self, &mut NamedTypes::default())
    }
}

impl ToWireSchema for Field {
    fn to_wire_schema(&self) -> Value {
        field_wire(self, &mut NamedTypes::default())
    }
}

impl ToWireSchema for Record {
    fn to_wire_schema(&self) -> Value {
        Value::Object(record_node(self))
    }
}

/// Top-level record node as a map, so schema trees can add their own keys
pub(crate) fn record_node(record: &Record) -> Map<String, Value> {
    let mut names = NamedTypes::default();
    let full = names.full_name(&encode_name(record.name()), record.namespace());
    names.reference(full, &DataType::Record(record.clone()));
    record_map(record, &mut names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::Sensitivity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decimal_projection() {
        assert_eq!(
            PrimitiveType::decimal(12, 2).unwrap().to_wire_schema(),
            json!({"type": "bytes", "logicalType": "decimal", "precision": 12, "scale": 2})
        );
    }

    #[test]
    fn primitive_projections() {
        assert_eq!(
            PrimitiveType::Date.to_wire_schema(),
            json!({"type": "int", "logicalType": "date"})
        );
        assert_eq!(
            PrimitiveType::Byte.to_wire_schema(),
            json!({"type": "int", "logicalType": "BYTE"})
        );
        assert_eq!(
            PrimitiveType::TimeMicros.to_wire_schema(),
            json!({"type": "long", "logicalType": "time-micros"})
        );
        assert_eq!(
            PrimitiveType::nvarchar(30).unwrap().to_wire_schema(),
            json!({"type": "string", "logicalType": "NVARCHAR", "length": 30})
        );
        assert_eq!(
            PrimitiveType::Uuid.to_wire_schema(),
            json!({"type": "fixed", "logicalType": "uuid", "name": "uuid", "size": 16})
        );
        assert_eq!(
            PrimitiveType::enumeration("level", ["LOW", "HIGH"]).unwrap().to_wire_schema(),
            json!({
                "type": "enum",
                "logicalType": "ENUM",
                "name": "level",
                "__originalname": "level",
                "symbols": ["LOW", "HIGH"]
            })
        );
    }

    #[test]
    fn any_primitive_is_a_seven_member_union() {
        let wire = PrimitiveType::AnyPrimitive.to_wire_schema();
        let members = wire.as_array().unwrap();
        assert_eq!(members.len(), 7);
        assert_eq!(members[0], json!({"type": "boolean", "logicalType": "BOOLEAN"}));
        assert_eq!(members[6], json!({"type": "string", "logicalType": "STRING"}));
    }

    #[test]
    fn composite_projections() {
        assert_eq!(
            DataType::array(PrimitiveType::String).to_wire_schema(),
            json!({"type": "array", "items": {"type": "string", "logicalType": "STRING"}})
        );
        assert_eq!(
            DataType::map(PrimitiveType::Int).to_wire_schema(),
            json!({"type": "map", "logicalType": "MAP", "values": {"type": "int", "logicalType": "INT"}})
        );
        let union = DataType::union(vec![PrimitiveType::Int.into(), PrimitiveType::Long.into()]).unwrap();
        assert_eq!(
            union.to_wire_schema(),
            json!([{"type": "int", "logicalType": "INT"}, {"type": "long", "logicalType": "LONG"}])
        );
    }

    #[test]
    fn nullable_field_projection() {
        let field = Field::new("col", PrimitiveType::Int);
        assert_eq!(
            field.to_wire_schema(),
            json!({
                "name": "col",
                "__originalname": "col",
                "type": ["null", {"type": "int", "logicalType": "INT"}],
                "default": null,
                "__sensitivity": "INTERNAL",
                "__internal": false,
                "__technical": false,
                "__source_data_type": null
            })
        );
    }

    #[test]
    fn non_nullable_field_projection() {
        let field = Field::new("count", PrimitiveType::Int)
            .not_null()
            .with_default(0)
            .with_doc("Row count")
            .with_sensitivity(Sensitivity::Public)
            .with_source_data_type("INTEGER");

        let wire = field.to_wire_schema();
        assert_eq!(wire["type"], json!({"type": "int", "logicalType": "INT"}));
        assert_eq!(wire["default"], json!(0));
        assert_eq!(wire["doc"], json!("Row count"));
        assert_eq!(wire["__sensitivity"], json!("PUBLIC"));
        assert_eq!(wire["__source_data_type"], json!("INTEGER"));

        let without_default = Field::new("count", PrimitiveType::Int).not_null().to_wire_schema();
        assert!(without_default.get("default").is_none());
    }

    #[test]
    fn nullable_default_is_always_null() {
        let wire = Field::new("flag", PrimitiveType::Boolean)
            .with_default(true)
            .to_wire_schema();
        assert_eq!(wire["default"], Value::Null);
    }

    #[test]
    fn nullable_union_is_flattened() {
        let union = DataType::union(vec![PrimitiveType::Int.into(), PrimitiveType::String.into()]).unwrap();
        let wire = Field::new("u", union).to_wire_schema();
        assert_eq!(
            wire["type"],
            json!([
                "null",
                {"type": "int", "logicalType": "INT"},
                {"type": "string", "logicalType": "STRING"}
            ])
        );
    }

    #[test]
    fn record_projection_escapes_names() {
        let record = Record::new("Sales Order")
            .with_namespace("erp")
            .with_field(Field::new("amount €", PrimitiveType::Double))
            .unwrap();

        let wire = record.to_wire_schema();
        assert_eq!(wire["name"], json!("Sales_x0020Order"));
        assert_eq!(wire["__originalname"], json!("Sales Order"));
        assert_eq!(wire["type"], json!("record"));
        assert_eq!(wire["namespace"], json!("erp"));
        assert_eq!(wire["fields"][0]["name"], json!("amount_x0020_x20ac"));
        assert_eq!(wire["fields"][0]["__originalname"], json!("amount €"));
        assert_eq!(wire["doc"], Value::Null);
    }

    #[test]
    fn record_always_has_doc_and_namespace() {
        let wire = Record::new("plain").to_wire_schema();
        let node = wire.as_object().unwrap();
        assert_eq!(node.get("doc"), Some(&Value::Null));
        assert_eq!(node.get("namespace"), Some(&Value::Null));

        let wire = Record::new("plain").with_doc("text").to_wire_schema();
        assert_eq!(wire["doc"], json!("text"));
    }

    #[test]
    fn repeated_named_types_are_referenced() {
        let point = Record::new("point")
            .with_field(Field::new("x", PrimitiveType::Double).not_null())
            .unwrap();
        let record = Record::new("shape")
            .with_namespace("geo")
            .with_field(Field::new("id", PrimitiveType::Uuid).not_null())
            .unwrap()
            .with_field(Field::new("parent", PrimitiveType::Uuid))
            .unwrap()
            .with_field(Field::new("from", point.clone()).not_null())
            .unwrap()
            .with_field(Field::new("to", point))
            .unwrap();

        let wire = record.to_wire_schema();
        let fields = &wire["fields"];
        assert_eq!(fields[0]["type"]["type"], json!("fixed"));
        assert_eq!(fields[1]["type"], json!(["null", "geo.uuid"]));
        assert_eq!(fields[2]["type"]["type"], json!("record"));
        assert_eq!(fields[3]["type"], json!(["null", "geo.point"]));
    }

    #[test]
    fn different_types_under_one_name_are_written_in_full() {
        let record = Record::new("r")
            .with_field(Field::new("a", PrimitiveType::fixed(4, "code").unwrap()).not_null())
            .unwrap()
            .with_field(Field::new("b", PrimitiveType::fixed(8, "code").unwrap()).not_null())
            .unwrap();

        let wire = record.to_wire_schema();
        assert_eq!(wire["fields"][1]["type"]["size"], json!(8));
    }
}
