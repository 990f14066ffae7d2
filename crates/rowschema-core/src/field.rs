//! Named, documented, nullable slot holding a type

use crate::governance::Sensitivity;
use crate::naming::encode_name;
use crate::types::DataType;
use serde_json::Value;

/// A field of a record
///
/// The name is the logical, human readable name. It may contain characters
/// that are illegal in Avro; the wire name is its escaped form.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
    doc: Option<String>,
    default: Option<Value>,
    internal: bool,
    technical: bool,
    source_data_type: Option<String>,
    sensitivity: Sensitivity,
}

impl Field {
    /// Create a nullable field with default metadata
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            doc: None,
            default: None,
            internal: false,
            technical: false,
            source_data_type: None,
            sensitivity: Sensitivity::default(),
        }
    }

    /// Mark the field as mandatory
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Default value, only emitted for non-nullable fields
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as internal, i.e. not part of the official payload
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Mark as technical; values are set by the pipeline, not by mappings
    pub fn technical(mut self) -> Self {
        self.technical = true;
        self
    }

    /// Free-form data type of the source system, informational only
    pub fn with_source_data_type(mut self, source_data_type: impl Into<String>) -> Self {
        self.source_data_type = Some(source_data_type.into());
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub(crate) fn with_flags(mut self, internal: bool, technical: bool) -> Self {
        self.internal = internal;
        self.technical = technical;
        self
    }

    pub(crate) fn with_source_data_type_opt(mut self, source_data_type: Option<String>) -> Self {
        self.source_data_type = source_data_type;
        self
    }

    pub(crate) fn with_doc_opt(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Escaped name as written to the wire schema
    pub fn wire_name(&self) -> String {
        encode_name(&self.name)
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Explicit default; ignored on the wire when the field is nullable
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    pub fn is_technical(&self) -> bool {
        self.technical
    }

    pub fn source_data_type(&self) -> Option<&str> {
        self.source_data_type.as_deref()
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }
}
