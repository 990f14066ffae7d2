//! Wire schema to model reconstruction
//!
//! The inverse of [`super::projection`]. Several domain types share the same
//! Avro primitive (Byte, Short, Int and Date are all `int`), so the
//! `logicalType` tag is resolved first and the bare Avro type is only a
//! fallback. Reconstruction is therefore faithful for schemas produced by the
//! projection, not for arbitrary Avro schemas.
//!
//! Named types (records, fixed, enum, UUID) are registered by full name as
//! they are parsed, so later references by name resolve to the definition.

use super::{
    full_name, PROP_INTERNAL, PROP_ORIGINAL_NAME, PROP_SENSITIVITY, PROP_SOURCE_DATA_TYPE,
    PROP_TECHNICAL,
};
use crate::config::Config;
use crate::error::SchemaError;
use crate::field::Field;
use crate::governance::Sensitivity;
use crate::naming::decode_name;
use crate::record::Record;
use crate::types::{DataType, PrimitiveType, TypeKind};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parse a wire node into its type and nullability with default settings
pub fn parse(node: &Value) -> Result<(DataType, bool), SchemaError> {
    WireParser::default().parse(node)
}

/// Recursive wire schema parser
#[derive(Debug, Clone)]
pub struct WireParser {
    max_depth: usize,
}

impl Default for WireParser {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl WireParser {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_nesting_depth)
    }

    /// Parse a field, record or type node into `(type, nullable)`
    pub fn parse(&self, node: &Value) -> Result<(DataType, bool), SchemaError> {
        Walk::new(self).parse_node(node, 0)
    }

    /// Parse wire JSON text
    pub fn parse_json(&self, json: &str) -> Result<(DataType, bool), SchemaError> {
        let node: Value = serde_json::from_str(json)?;
        self.parse(&node)
    }

    /// Parse a node that must be a record
    pub fn parse_record(&self, node: &Value) -> Result<Record, SchemaError> {
        let map = node
            .as_object()
            .ok_or_else(|| SchemaError::unrecognized("a record schema must be an object"))?;
        match map.get("type").and_then(Value::as_str) {
            Some("record") => Walk::new(self).record(map, 0),
            other => Err(SchemaError::unrecognized(format!(
                "expected a record schema, found type {:?}",
                other
            ))),
        }
    }

    /// Parse a field node
    pub fn parse_field(&self, node: &Value) -> Result<Field, SchemaError> {
        Walk::new(self).field(node, 0)
    }
}

/// State of one parse: named types seen so far and the enclosing namespace
struct Walk<'p> {
    parser: &'p WireParser,
    named: HashMap<String, DataType>,
    namespace: Option<String>,
}

impl<'p> Walk<'p> {
    fn new(parser: &'p WireParser) -> Self {
        Self {
            parser,
            named: HashMap::new(),
            namespace: None,
        }
    }

    fn guard(&self, depth: usize) -> Result<(), SchemaError> {
        if depth > self.parser.max_depth {
            return Err(SchemaError::NestingTooDeep {
                limit: self.parser.max_depth,
            });
        }
        Ok(())
    }

    fn parse_node(&mut self, node: &Value, depth: usize) -> Result<(DataType, bool), SchemaError> {
        self.guard(depth)?;
        match node {
            Value::String(tag) => Ok((self.scalar(&Map::new(), tag, depth)?, false)),
            Value::Array(members) => self.union(members, depth),
            Value::Object(map) => self.object(map, depth),
            other => Err(SchemaError::unrecognized(format!(
                "unexpected schema node {}",
                other
            ))),
        }
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) -> Result<(DataType, bool), SchemaError> {
        match map.get("type") {
            None => Err(SchemaError::unrecognized("schema node without 'type'")),
            Some(Value::Array(members)) => self.union(members, depth + 1),
            // A field node wrapping a complex type
            Some(inner @ Value::Object(_)) => self.parse_node(inner, depth + 1),
            Some(Value::String(tag)) => {
                let data_type = match tag.as_str() {
                    "record" => DataType::Record(self.record(map, depth)?),
                    "array" => {
                        let items = map
                            .get("items")
                            .ok_or_else(|| SchemaError::unrecognized("array without 'items'"))?;
                        DataType::Array(Box::new(self.nested(items, depth)?))
                    }
                    _ => self.scalar(map, tag, depth)?,
                };
                Ok((data_type, false))
            }
            Some(other) => Err(SchemaError::unrecognized(format!(
                "unexpected 'type' value {}",
                other
            ))),
        }
    }

    /// Element, value or member types carry no nullability of their own
    fn nested(&mut self, node: &Value, depth: usize) -> Result<DataType, SchemaError> {
        self.parse_node(node, depth + 1).map(|(data_type, _)| data_type)
    }

    /// `["null", T]` is a nullable T; any other list is a union
    fn union(&mut self, members: &[Value], depth: usize) -> Result<(DataType, bool), SchemaError> {
        self.guard(depth)?;
        let nullable = members.iter().any(is_null_branch);
        let branches: Vec<&Value> = members.iter().filter(|m| !is_null_branch(m)).collect();

        match branches.as_slice() {
            [] => Err(SchemaError::unrecognized("union without a non-null member")),
            [single] => {
                let (data_type, inner_nullable) = self.parse_node(single, depth + 1)?;
                Ok((data_type, nullable || inner_nullable))
            }
            _ => {
                let types = branches
                    .iter()
                    .map(|b| self.nested(b, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                // The exact AnyPrimitive member list comes back as AnyPrimitive
                Ok((DataType::union(types)?, nullable))
            }
        }
    }

    fn record(&mut self, map: &Map<String, Value>, depth: usize) -> Result<Record, SchemaError> {
        self.guard(depth)?;
        let name = original_name(map)?;
        let mut record = Record::new(name);
        record.set_namespace(optional_str(map, "namespace"));
        record.set_doc(optional_str(map, "doc"));

        let fields = map
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                SchemaError::unrecognized(format!("record '{}' without a 'fields' list", record.name()))
            })?;

        let enclosing = self.namespace.clone();
        if let Some(namespace) = record.namespace() {
            self.namespace = Some(namespace.to_string());
        }
        let parsed = fields
            .iter()
            .try_for_each(|field| record.add_field(self.field(field, depth + 1)?));
        self.namespace = enclosing;
        parsed?;

        self.register(map, record.namespace(), DataType::Record(record.clone()));
        tracing::debug!(record = record.name(), fields = record.len(), "reconstructed record");
        Ok(record)
    }

    fn field(&mut self, node: &Value, depth: usize) -> Result<Field, SchemaError> {
        self.guard(depth)?;
        let map = node
            .as_object()
            .ok_or_else(|| SchemaError::unrecognized("a field must be an object"))?;
        let name = original_name(map)?;
        let (data_type, nullable) = self.object(map, depth)?;

        let mut field = Field::new(name, data_type)
            .with_nullable(nullable)
            .with_doc_opt(optional_str(map, "doc"))
            .with_flags(flag(map, PROP_INTERNAL), flag(map, PROP_TECHNICAL))
            .with_source_data_type_opt(optional_str(map, PROP_SOURCE_DATA_TYPE));

        if !nullable {
            if let Some(default) = map.get("default") {
                field = field.with_default(default.clone());
            }
        }

        if let Some(value) = map.get(PROP_SENSITIVITY).and_then(Value::as_str) {
            match Sensitivity::from_name(value) {
                Some(sensitivity) => field = field.with_sensitivity(sensitivity),
                None => tracing::warn!(
                    field = field.name(),
                    sensitivity = value,
                    "unknown sensitivity, using the default"
                ),
            }
        }

        tracing::trace!(field = field.name(), nullable, "reconstructed field");
        Ok(field)
    }

    /// Resolve by `logicalType` first, then by the bare Avro type, then by
    /// the name of an earlier named type
    fn scalar(&mut self, map: &Map<String, Value>, tag: &str, depth: usize) -> Result<DataType, SchemaError> {
        if let Some(logical) = map.get("logicalType").and_then(Value::as_str) {
            if logical == "MAP" {
                return self.map_type(map, depth);
            }
            if let Some(kind) = TypeKind::from_logical_type(logical) {
                return self.named_primitive(kind, map);
            }
        }

        if tag == "map" {
            return self.map_type(map, depth);
        }

        if let Some(kind) = TypeKind::from_avro_type(tag) {
            return self.named_primitive(kind, map);
        }

        self.lookup(tag).ok_or_else(|| {
            SchemaError::unrecognized(format!(
                "unknown type '{}' with logicalType {:?}",
                tag,
                map.get("logicalType")
            ))
        })
    }

    /// Build a primitive, registering fixed, enum and UUID types by name
    fn named_primitive(&mut self, kind: TypeKind, map: &Map<String, Value>) -> Result<DataType, SchemaError> {
        let data_type = DataType::Primitive(primitive(kind, map)?);
        if matches!(kind, TypeKind::Fixed | TypeKind::Enum | TypeKind::Uuid) {
            self.register(map, None, data_type.clone());
        }
        Ok(data_type)
    }

    fn map_type(&mut self, map: &Map<String, Value>, depth: usize) -> Result<DataType, SchemaError> {
        let values = map
            .get("values")
            .ok_or_else(|| SchemaError::unrecognized("map without 'values'"))?;
        Ok(DataType::Map(Box::new(self.nested(values, depth)?)))
    }

    /// Register a named type under its full wire name
    fn register(&mut self, map: &Map<String, Value>, namespace: Option<&str>, data_type: DataType) {
        if let Some(name) = map.get("name").and_then(Value::as_str) {
            let full = full_name(name, namespace.or(self.namespace.as_deref()));
            self.named.entry(full).or_insert(data_type);
        }
    }

    /// Resolve a full name, or a short name in the enclosing namespace
    fn lookup(&self, name: &str) -> Option<DataType> {
        let qualified = full_name(name, self.namespace.as_deref());
        self.named
            .get(&qualified)
            .or_else(|| self.named.get(name))
            .cloned()
    }
}

fn is_null_branch(node: &Value) -> bool {
    node.as_str() == Some("null")
}

fn primitive(kind: TypeKind, map: &Map<String, Value>) -> Result<PrimitiveType, SchemaError> {
    if let Some(p) = PrimitiveType::from_kind(kind) {
        return Ok(p);
    }

    match kind {
        TypeKind::Varchar => PrimitiveType::varchar(integer(map, "length")?),
        TypeKind::NVarchar => PrimitiveType::nvarchar(integer(map, "length")?),
        TypeKind::Decimal => {
            let scale = match map.get("scale") {
                Some(_) => integer(map, "scale")?,
                None => 0,
            };
            PrimitiveType::decimal(integer(map, "precision")?, scale)
        }
        TypeKind::Fixed => PrimitiveType::fixed(integer(map, "size")?, original_name(map)?),
        TypeKind::Enum => {
            let symbols = map
                .get("symbols")
                .and_then(Value::as_array)
                .ok_or_else(|| SchemaError::unrecognized("enum without 'symbols'"))?
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| SchemaError::unrecognized("enum symbols must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            PrimitiveType::enumeration(original_name(map)?, symbols)
        }
        other => Err(SchemaError::unrecognized(format!(
            "no constructor for {}",
            other.name()
        ))),
    }
}

fn integer(map: &Map<String, Value>, key: &str) -> Result<i64, SchemaError> {
    map.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| SchemaError::unrecognized(format!("missing integer '{}'", key)))
}

/// `__originalname` if present, else the decoded wire name
fn original_name(map: &Map<String, Value>) -> Result<String, SchemaError> {
    if let Some(original) = map.get(PROP_ORIGINAL_NAME).and_then(Value::as_str) {
        return Ok(original.to_string());
    }
    map.get("name")
        .and_then(Value::as_str)
        .map(decode_name)
        .ok_or_else(|| SchemaError::unrecognized("named schema node without 'name'"))
}

fn optional_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn flag(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_bool).unwrap_or(false)
}
