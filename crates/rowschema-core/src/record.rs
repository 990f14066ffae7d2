//! Record type: ordered fields plus a name index

use crate::error::SchemaError;
use crate::field::Field;
use std::collections::HashMap;

/// A named record owning an ordered list of fields
///
/// Field order is declaration order and is preserved on the wire. The index
/// maps logical field names to positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    namespace: Option<String>,
    doc: Option<String>,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Record {
    /// Create an empty record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub(crate) fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    pub(crate) fn set_doc(&mut self, doc: Option<String>) {
        self.doc = doc;
    }

    /// Append a field
    ///
    /// Fails with `DuplicateKey` if a field with the same logical name exists;
    /// the record is left unchanged in that case.
    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        if self.index.contains_key(field.name()) {
            return Err(SchemaError::DuplicateKey {
                collection: "field",
                key: field.name().to_string(),
            });
        }
        self.index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
        Ok(())
    }

    /// Build from fields whose names are known to be distinct
    pub(crate) fn with_known_fields(mut self, fields: Vec<Field>) -> Self {
        for field in fields {
            debug_assert!(!self.index.contains_key(field.name()));
            self.index.insert(field.name().to_string(), self.fields.len());
            self.fields.push(field);
        }
        self
    }

    /// Consuming variant of [`Record::add_field`]
    pub fn with_field(mut self, field: Field) -> Result<Self, SchemaError> {
        self.add_field(field)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by logical name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Logical field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
