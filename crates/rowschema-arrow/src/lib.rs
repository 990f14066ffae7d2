//! RowSchema Arrow export
//!
//! One-directional mapping of rowschema types onto the Apache Arrow type
//! system. The mapping is a stateless table; no arrays are built here.

use arrow_schema::{
    DataType as ArrowType, Field as ArrowField, Fields, Schema, TimeUnit, UnionFields, UnionMode,
};
use rowschema_core::types::{MAX_DECIMAL_PRECISION, MAX_FIXED_SIZE};
use rowschema_core::{DataType, Field, PrimitiveType, Record, SchemaTree};
use std::collections::HashMap;
use std::sync::Arc;

/// Field metadata key naming an Arrow extension type
pub const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

/// Canonical extension name for UUIDs stored as 16 byte fixed binary
pub const UUID_EXTENSION_NAME: &str = "arrow.uuid";

/// Timezone of all exported timestamps, local timestamps included
pub const TIMESTAMP_TIMEZONE: &str = "UTC";

const DECIMAL64_MAX_PRECISION: u32 = 18;
const DECIMAL128_MAX_PRECISION: u32 = 38;

/// Columnar type of a rowschema type
pub trait ToArrow {
    fn to_arrow(&self) -> ArrowType;
}

impl ToArrow for PrimitiveType {
    fn to_arrow(&self) -> ArrowType {
        match self {
            Self::Null => ArrowType::Null,
            Self::Boolean => ArrowType::Boolean,
            Self::Byte => ArrowType::Int8,
            Self::Short => ArrowType::Int16,
            Self::Int => ArrowType::Int32,
            Self::Long => ArrowType::Int64,
            Self::Float => ArrowType::Float32,
            Self::Double => ArrowType::Float64,
            Self::Bytes => ArrowType::LargeBinary,
            Self::String
            | Self::Varchar { .. }
            | Self::NVarchar { .. }
            | Self::Clob
            | Self::NClob
            | Self::Uri
            | Self::StGeometry
            | Self::StPoint
            | Self::Enum { .. } => ArrowType::Utf8,
            Self::Date => ArrowType::Date32,
            Self::TimeMillis => ArrowType::Time32(TimeUnit::Millisecond),
            Self::TimeMicros => ArrowType::Time64(TimeUnit::Microsecond),
            Self::TimestampMillis | Self::LocalTimestampMillis => {
                ArrowType::Timestamp(TimeUnit::Millisecond, Some(TIMESTAMP_TIMEZONE.into()))
            }
            Self::TimestampMicros | Self::LocalTimestampMicros => {
                ArrowType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TIMEZONE.into()))
            }
            Self::Decimal { precision, scale, .. } => decimal(*precision, *scale),
            Self::Fixed { size, .. } => ArrowType::FixedSizeBinary(
                i32::try_from(*size).expect("fixed size is at most i32::MAX"),
            ),
            Self::Uuid => ArrowType::FixedSizeBinary(16),
            Self::AnyPrimitive => {
                let members: Vec<DataType> = PrimitiveType::any_primitive_members()
                    .into_iter()
                    .map(DataType::Primitive)
                    .collect();
                dense_union(members.iter().map(|m| (m.type_name(), m)))
            }
        }
    }
}

impl ToArrow for DataType {
    fn to_arrow(&self) -> ArrowType {
        match self {
            Self::Primitive(p) => p.to_arrow(),
            Self::Union(u) => dense_union(
                u.members()
                    .iter()
                    .map(|m| (m.tag.as_str(), &m.data_type)),
            ),
            Self::Array(items) => ArrowType::List(Arc::new(child_field("item", items, true))),
            Self::Map(values) => {
                let entries = Fields::from(vec![
                    ArrowField::new("key", ArrowType::Utf8, false),
                    child_field("value", values, true),
                ]);
                ArrowType::Map(
                    Arc::new(ArrowField::new("entries", ArrowType::Struct(entries), false)),
                    false,
                )
            }
            Self::Record(r) => ArrowType::Struct(record_fields(r)),
        }
    }
}

// Constructors validate against these bounds, so the narrowing below is exact
const _: () = assert!(MAX_DECIMAL_PRECISION <= i8::MAX as i64);
const _: () = assert!(MAX_FIXED_SIZE <= i32::MAX as i64);

/// Decimal64 up to 18 digits, wider types above
fn decimal(precision: u32, scale: u32) -> ArrowType {
    let p = u8::try_from(precision).expect("decimal precision is at most 76");
    let s = i8::try_from(scale).expect("decimal scale is at most its precision");
    if precision <= DECIMAL64_MAX_PRECISION {
        ArrowType::Decimal64(p, s)
    } else if precision <= DECIMAL128_MAX_PRECISION {
        ArrowType::Decimal128(p, s)
    } else {
        ArrowType::Decimal256(p, s)
    }
}

/// Dense union with one child per member, named by the member's tag
fn dense_union<'a>(members: impl Iterator<Item = (&'a str, &'a DataType)>) -> ArrowType {
    let fields: UnionFields = members
        .enumerate()
        .map(|(i, (tag, data_type))| (i as i8, Arc::new(child_field(tag, data_type, true))))
        .collect();
    ArrowType::Union(fields, UnionMode::Dense)
}

fn is_uuid(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Primitive(PrimitiveType::Uuid))
}

/// Arrow field for a nested type, tagging UUIDs with their extension name
fn child_field(name: &str, data_type: &DataType, nullable: bool) -> ArrowField {
    let field = ArrowField::new(name, data_type.to_arrow(), nullable);
    if is_uuid(data_type) {
        field.with_metadata(HashMap::from([(
            EXTENSION_NAME_KEY.to_string(),
            UUID_EXTENSION_NAME.to_string(),
        )]))
    } else {
        field
    }
}

fn record_fields(record: &Record) -> Fields {
    record.iter().map(ToArrowField::to_arrow_field).collect()
}

/// Arrow field of a record field, named by its logical name
pub trait ToArrowField {
    fn to_arrow_field(&self) -> ArrowField;
}

impl ToArrowField for Field {
    fn to_arrow_field(&self) -> ArrowField {
        child_field(self.name(), self.data_type(), self.is_nullable())
    }
}

/// Arrow schema with one top-level column per record field
pub fn record_schema(record: &Record) -> Schema {
    Schema::new(record_fields(record))
}

/// Arrow schema of a whole schema tree
pub trait ToArrowSchema {
    fn to_arrow_schema(&self) -> Schema;
}

impl<T: SchemaTree> ToArrowSchema for T {
    fn to_arrow_schema(&self) -> Schema {
        record_schema(self.record())
    }
}
