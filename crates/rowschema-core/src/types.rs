//! Closed type catalog and composite type nodes
//!
//! Primitive types are one tagged enum plus a per-kind descriptor table
//! (Avro type tag and logical type tag). Composite nodes (union, array, map,
//! record) nest over the catalog and over each other.

use crate::error::SchemaError;
use crate::record::Record;

/// Largest decimal precision the columnar export can represent
pub const MAX_DECIMAL_PRECISION: i64 = 76;

/// Largest fixed size, the bound of Avro and Arrow sizes
pub const MAX_FIXED_SIZE: i64 = i32::MAX as i64;

/// Parameterless discriminant of [`PrimitiveType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Null,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Varchar,
    NVarchar,
    Clob,
    NClob,
    Uri,
    StGeometry,
    StPoint,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    LocalTimestampMillis,
    LocalTimestampMicros,
    Decimal,
    Fixed,
    Enum,
    Uuid,
    AnyPrimitive,
}

/// How a primitive kind appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireDescriptor {
    /// Avro primitive or named type (`int`, `string`, `fixed`, ...)
    pub avro_type: &'static str,

    /// Value of the `logicalType` key
    pub logical_type: &'static str,
}

const fn wire(avro_type: &'static str, logical_type: &'static str) -> Option<WireDescriptor> {
    Some(WireDescriptor {
        avro_type,
        logical_type,
    })
}

impl TypeKind {
    pub const ALL: [TypeKind; 29] = [
        Self::Null,
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::Bytes,
        Self::String,
        Self::Varchar,
        Self::NVarchar,
        Self::Clob,
        Self::NClob,
        Self::Uri,
        Self::StGeometry,
        Self::StPoint,
        Self::Date,
        Self::TimeMillis,
        Self::TimeMicros,
        Self::TimestampMillis,
        Self::TimestampMicros,
        Self::LocalTimestampMillis,
        Self::LocalTimestampMicros,
        Self::Decimal,
        Self::Fixed,
        Self::Enum,
        Self::Uuid,
        Self::AnyPrimitive,
    ];

    /// Type name, also used as the union branch tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Bytes => "Bytes",
            Self::String => "String",
            Self::Varchar => "Varchar",
            Self::NVarchar => "NVarchar",
            Self::Clob => "CLOB",
            Self::NClob => "NCLOB",
            Self::Uri => "URI",
            Self::StGeometry => "Geometry",
            Self::StPoint => "Point",
            Self::Date => "Date",
            Self::TimeMillis => "Time",
            Self::TimeMicros => "TimeMicros",
            Self::TimestampMillis => "Timestamp",
            Self::TimestampMicros => "TimestampMicros",
            Self::LocalTimestampMillis => "LocalTimestamp",
            Self::LocalTimestampMicros => "LocalTimestampMicros",
            Self::Decimal => "Decimal",
            Self::Fixed => "Fixed",
            Self::Enum => "Enum",
            Self::Uuid => "UUID",
            Self::AnyPrimitive => "AnyPrimitive",
        }
    }

    /// Wire descriptor; `None` for AnyPrimitive, which projects as a union
    pub fn wire_descriptor(&self) -> Option<WireDescriptor> {
        match self {
            Self::Null => wire("null", "NULL"),
            Self::Boolean => wire("boolean", "BOOLEAN"),
            Self::Byte => wire("int", "BYTE"),
            Self::Short => wire("int", "SHORT"),
            Self::Int => wire("int", "INT"),
            Self::Long => wire("long", "LONG"),
            Self::Float => wire("float", "FLOAT"),
            Self::Double => wire("double", "DOUBLE"),
            Self::Bytes => wire("bytes", "BYTES"),
            Self::String => wire("string", "STRING"),
            Self::Varchar => wire("string", "VARCHAR"),
            Self::NVarchar => wire("string", "NVARCHAR"),
            Self::Clob => wire("string", "CLOB"),
            Self::NClob => wire("string", "NCLOB"),
            Self::Uri => wire("string", "URI"),
            Self::StGeometry => wire("string", "ST_GEOMETRY"),
            Self::StPoint => wire("string", "ST_POINT"),
            Self::Date => wire("int", "date"),
            Self::TimeMillis => wire("int", "time-millis"),
            Self::TimeMicros => wire("long", "time-micros"),
            Self::TimestampMillis => wire("long", "timestamp-millis"),
            Self::TimestampMicros => wire("long", "timestamp-micros"),
            Self::LocalTimestampMillis => wire("long", "local-timestamp-millis"),
            Self::LocalTimestampMicros => wire("long", "local-timestamp-micros"),
            Self::Decimal => wire("bytes", "decimal"),
            Self::Fixed => wire("fixed", "FIXED"),
            Self::Enum => wire("enum", "ENUM"),
            Self::Uuid => wire("fixed", "uuid"),
            Self::AnyPrimitive => None,
        }
    }

    /// Resolve a `logicalType` tag
    pub fn from_logical_type(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.wire_descriptor().is_some_and(|d| d.logical_type == tag))
    }

    /// Resolve a bare Avro type tag when no logical type is present
    pub fn from_avro_type(tag: &str) -> Option<Self> {
        match tag {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "bytes" => Some(Self::Bytes),
            "string" => Some(Self::String),
            "enum" => Some(Self::Enum),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// A scalar or logical type from the closed catalog
///
/// Parameterised variants can only be built through the validating
/// constructors ([`PrimitiveType::varchar`], [`PrimitiveType::decimal`], ...);
/// outside this crate they are matched with `..`.
///
/// ```compile_fail
/// let _ = rowschema_core::PrimitiveType::Decimal { precision: 0, scale: 5 };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Null,
    Boolean,
    /// 8 bit signed integer
    Byte,
    /// 16 bit signed integer
    Short,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    /// ASCII text up to `length` chars
    #[non_exhaustive]
    Varchar { length: u32 },
    /// Unicode text up to `length` chars
    #[non_exhaustive]
    NVarchar { length: u32 },
    Clob,
    NClob,
    Uri,
    /// Spatial data in WKT representation
    StGeometry,
    StPoint,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    LocalTimestampMillis,
    LocalTimestampMicros,
    #[non_exhaustive]
    Decimal { precision: u32, scale: u32 },
    #[non_exhaustive]
    Fixed { size: u32, name: String },
    #[non_exhaustive]
    Enum { name: String, symbols: Vec<String> },
    Uuid,
    /// Untyped value escape hatch, see [`PrimitiveType::any_primitive_members`]
    AnyPrimitive,
}

fn positive(type_name: &'static str, what: &str, value: i64) -> Result<u32, SchemaError> {
    if value <= 0 {
        return Err(SchemaError::invalid(
            type_name,
            format!("{what} must be a positive integer, got {value}"),
        ));
    }
    u32::try_from(value)
        .map_err(|_| SchemaError::invalid(type_name, format!("{what} {value} is out of range")))
}

fn required_name(type_name: &'static str, name: String) -> Result<String, SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::invalid(type_name, "a name is required"));
    }
    Ok(name)
}

impl PrimitiveType {
    /// VARCHAR with a positive length
    pub fn varchar(length: i64) -> Result<Self, SchemaError> {
        Ok(Self::Varchar {
            length: positive("Varchar", "length", length)?,
        })
    }

    /// NVARCHAR with a positive length
    pub fn nvarchar(length: i64) -> Result<Self, SchemaError> {
        Ok(Self::NVarchar {
            length: positive("NVarchar", "length", length)?,
        })
    }

    /// Decimal with `1 <= precision <= 76` and `0 <= scale <= precision`
    pub fn decimal(precision: i64, scale: i64) -> Result<Self, SchemaError> {
        let precision_value = positive("Decimal", "precision", precision)?;
        if precision > MAX_DECIMAL_PRECISION {
            return Err(SchemaError::invalid(
                "Decimal",
                format!("precision {precision} exceeds {MAX_DECIMAL_PRECISION}"),
            ));
        }
        if scale < 0 || scale > precision {
            return Err(SchemaError::invalid(
                "Decimal",
                format!("scale must be between 0 and {precision}, got {scale}"),
            ));
        }
        Ok(Self::Decimal {
            precision: precision_value,
            scale: scale as u32,
        })
    }

    /// Fixed size binary, Avro requires a name
    pub fn fixed(size: i64, name: impl Into<String>) -> Result<Self, SchemaError> {
        if size > MAX_FIXED_SIZE {
            return Err(SchemaError::invalid(
                "Fixed",
                format!("size {size} exceeds {MAX_FIXED_SIZE}"),
            ));
        }
        Ok(Self::Fixed {
            size: positive("Fixed", "size", size)?,
            name: required_name("Fixed", name.into())?,
        })
    }

    /// Enumeration with a non-empty list of distinct symbols
    pub fn enumeration<I, S>(name: impl Into<String>, symbols: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = required_name("Enum", name.into())?;
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(SchemaError::invalid("Enum", "at least one symbol is required"));
        }
        for (i, symbol) in symbols.iter().enumerate() {
            if symbol.is_empty() {
                return Err(SchemaError::invalid("Enum", "symbols must not be empty"));
            }
            if symbols[..i].contains(symbol) {
                return Err(SchemaError::invalid("Enum", format!("duplicate symbol '{symbol}'")));
            }
        }
        Ok(Self::Enum { name, symbols })
    }

    /// Member types of [`PrimitiveType::AnyPrimitive`], in union order
    pub fn any_primitive_members() -> [PrimitiveType; 7] {
        [
            Self::Boolean,
            Self::Bytes,
            Self::Double,
            Self::Float,
            Self::Int,
            Self::Long,
            Self::String,
        ]
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Null => TypeKind::Null,
            Self::Boolean => TypeKind::Boolean,
            Self::Byte => TypeKind::Byte,
            Self::Short => TypeKind::Short,
            Self::Int => TypeKind::Int,
            Self::Long => TypeKind::Long,
            Self::Float => TypeKind::Float,
            Self::Double => TypeKind::Double,
            Self::Bytes => TypeKind::Bytes,
            Self::String => TypeKind::String,
            Self::Varchar { .. } => TypeKind::Varchar,
            Self::NVarchar { .. } => TypeKind::NVarchar,
            Self::Clob => TypeKind::Clob,
            Self::NClob => TypeKind::NClob,
            Self::Uri => TypeKind::Uri,
            Self::StGeometry => TypeKind::StGeometry,
            Self::StPoint => TypeKind::StPoint,
            Self::Date => TypeKind::Date,
            Self::TimeMillis => TypeKind::TimeMillis,
            Self::TimeMicros => TypeKind::TimeMicros,
            Self::TimestampMillis => TypeKind::TimestampMillis,
            Self::TimestampMicros => TypeKind::TimestampMicros,
            Self::LocalTimestampMillis => TypeKind::LocalTimestampMillis,
            Self::LocalTimestampMicros => TypeKind::LocalTimestampMicros,
            Self::Decimal { .. } => TypeKind::Decimal,
            Self::Fixed { .. } => TypeKind::Fixed,
            Self::Enum { .. } => TypeKind::Enum,
            Self::Uuid => TypeKind::Uuid,
            Self::AnyPrimitive => TypeKind::AnyPrimitive,
        }
    }

    /// Create a parameterless kind; `None` for kinds that need parameters
    pub fn from_kind(kind: TypeKind) -> Option<Self> {
        let primitive = match kind {
            TypeKind::Null => Self::Null,
            TypeKind::Boolean => Self::Boolean,
            TypeKind::Byte => Self::Byte,
            TypeKind::Short => Self::Short,
            TypeKind::Int => Self::Int,
            TypeKind::Long => Self::Long,
            TypeKind::Float => Self::Float,
            TypeKind::Double => Self::Double,
            TypeKind::Bytes => Self::Bytes,
            TypeKind::String => Self::String,
            TypeKind::Clob => Self::Clob,
            TypeKind::NClob => Self::NClob,
            TypeKind::Uri => Self::Uri,
            TypeKind::StGeometry => Self::StGeometry,
            TypeKind::StPoint => Self::StPoint,
            TypeKind::Date => Self::Date,
            TypeKind::TimeMillis => Self::TimeMillis,
            TypeKind::TimeMicros => Self::TimeMicros,
            TypeKind::TimestampMillis => Self::TimestampMillis,
            TypeKind::TimestampMicros => Self::TimestampMicros,
            TypeKind::LocalTimestampMillis => Self::LocalTimestampMillis,
            TypeKind::LocalTimestampMicros => Self::LocalTimestampMicros,
            TypeKind::Uuid => Self::Uuid,
            TypeKind::AnyPrimitive => Self::AnyPrimitive,
            TypeKind::Varchar
            | TypeKind::NVarchar
            | TypeKind::Decimal
            | TypeKind::Fixed
            | TypeKind::Enum => return None,
        };
        Some(primitive)
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Whether the columnar export maps this type to a UTF-8 string
    pub fn is_text(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::String
                | TypeKind::Varchar
                | TypeKind::NVarchar
                | TypeKind::Clob
                | TypeKind::NClob
                | TypeKind::Uri
                | TypeKind::StGeometry
                | TypeKind::StPoint
                | TypeKind::Enum
        )
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Varchar { length } => write!(f, "VARCHAR({})", length),
            Self::NVarchar { length } => write!(f, "NVARCHAR({})", length),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({}, {})", precision, scale),
            Self::Fixed { size, name } => write!(f, "FIXED({}, {})", size, name),
            Self::Enum { name, .. } => write!(f, "ENUM({})", name),
            other => write!(f, "{}", other.name().to_uppercase()),
        }
    }
}

/// True for exactly the AnyPrimitive members, in their union order
pub(crate) fn is_any_primitive_list(types: &[DataType]) -> bool {
    let any = PrimitiveType::any_primitive_members();
    types.len() == any.len()
        && types
            .iter()
            .zip(any.iter())
            .all(|(t, p)| matches!(t, DataType::Primitive(tp) if tp == p))
}

/// A union member together with its branch tag
#[derive(Debug, Clone, PartialEq)]
pub struct UnionMember {
    /// Branch tag, resolved once when the union is built
    pub tag: String,

    pub data_type: DataType,
}

/// Ordered union of member types
///
/// Nullability is a property of the field, so the null branch never appears
/// here. Member order is significant.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    members: Vec<UnionMember>,
}

impl UnionType {
    /// Build a union of at least two members; unions cannot nest
    ///
    /// The exact [`PrimitiveType::any_primitive_members`] list is
    /// AnyPrimitive and is rejected here; [`DataType::union`] maps it to
    /// `Primitive(AnyPrimitive)` instead.
    pub fn new(members: Vec<DataType>) -> Result<Self, SchemaError> {
        if members.len() < 2 {
            return Err(SchemaError::invalid(
                "Union",
                format!("at least two members are required, got {}", members.len()),
            ));
        }
        if members.iter().any(DataType::is_union) {
            return Err(SchemaError::invalid("Union", "a union cannot contain another union"));
        }
        if is_any_primitive_list(&members) {
            return Err(SchemaError::invalid(
                "Union",
                "the AnyPrimitive member list must be built as PrimitiveType::AnyPrimitive",
            ));
        }

        let members = members
            .into_iter()
            .map(|data_type| UnionMember {
                tag: data_type.type_name().to_string(),
                data_type,
            })
            .collect();

        Ok(Self { members })
    }

    pub fn members(&self) -> &[UnionMember] {
        &self.members
    }

    /// Member types in union order
    pub fn member_types(&self) -> impl Iterator<Item = &DataType> {
        self.members.iter().map(|m| &m.data_type)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Any type a field can hold
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Primitive(PrimitiveType),
    Union(UnionType),
    /// Array of one element type
    Array(Box<DataType>),
    /// Map from string keys to one value type
    Map(Box<DataType>),
    Record(Record),
}

impl DataType {
    pub fn array(element: impl Into<DataType>) -> Self {
        Self::Array(Box::new(element.into()))
    }

    pub fn map(values: impl Into<DataType>) -> Self {
        Self::Map(Box::new(values.into()))
    }

    /// Union of the members, or AnyPrimitive for its exact member list
    pub fn union(members: Vec<DataType>) -> Result<Self, SchemaError> {
        if is_any_primitive_list(&members) {
            return Ok(Self::Primitive(PrimitiveType::AnyPrimitive));
        }
        UnionType::new(members).map(Self::Union)
    }

    /// Name used as union branch tag: the catalog name, or the record name
    pub fn type_name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.name(),
            Self::Union(_) => "Union",
            Self::Array(_) => "Array",
            Self::Map(_) => "Map",
            Self::Record(r) => r.name(),
        }
    }

    /// True for unions, including the AnyPrimitive union
    pub fn is_union(&self) -> bool {
        matches!(
            self,
            Self::Union(_) | Self::Primitive(PrimitiveType::AnyPrimitive)
        )
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<PrimitiveType> for DataType {
    fn from(p: PrimitiveType) -> Self {
        Self::Primitive(p)
    }
}

impl From<Record> for DataType {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<UnionType> for DataType {
    fn from(u: UnionType) -> Self {
        Self::Union(u)
    }
}
