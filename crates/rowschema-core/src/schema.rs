//! Schema trees: root, value and key schemas
//!
//! A value schema is the Kafka payload schema. It always starts with the
//! technical fields and carries the governance metadata. The key schema is
//! derived from a value schema and never built by hand.

use crate::config::Config;
use crate::error::SchemaError;
use crate::field::Field;
use crate::governance::{DeletionPolicy, Duration, ForeignKey};
use crate::record::Record;
use crate::technical::{key_time_field, technical_fields, TECHNICAL_FIELD_NAMES};
use crate::wire::projection::record_node;
use crate::wire::{
    ToWireSchema, WireParser, PROP_DATA_CLASSIFICATIONS, PROP_DATA_PRODUCT_OWNER,
    PROP_DELETION_POLICY, PROP_FKS, PROP_PKS, PROP_REPO_URL, PROP_RETENTION_PERIOD,
    PROP_TICKETS_URL,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Common behavior of all schema trees
pub trait SchemaTree {
    /// The underlying record
    fn record(&self) -> &Record;

    fn name(&self) -> &str {
        self.record().name()
    }

    /// Wire schema of the whole tree
    fn to_wire_schema(&self) -> Value {
        self.record().to_wire_schema()
    }

    fn to_json(&self) -> String {
        self.to_wire_schema().to_string()
    }

    fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(&self.to_wire_schema())?)
    }

    /// Lowercase hex SHA-256 of the compact wire JSON
    ///
    /// Object keys are sorted, so equal trees have equal fingerprints.
    fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.to_json().as_bytes()))
    }
}

/// A bare named record, the shape of Kafka keys
#[derive(Debug, Clone, PartialEq)]
pub struct RootSchema {
    record: Record,
}

impl RootSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: Record::new(name),
        }
    }

    /// Create a schema in the configured default namespace
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        let mut schema = Self::new(name);
        schema.record.set_namespace(config.default_namespace.clone());
        schema
    }

    pub fn from_record(record: Record) -> Self {
        Self { record }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.record.set_namespace(Some(namespace.into()));
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.record.set_doc(Some(doc.into()));
        self
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        self.record.add_field(field)
    }

    pub fn with_field(mut self, field: Field) -> Result<Self, SchemaError> {
        self.add_field(field)?;
        Ok(self)
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// Reconstruct from a wire schema produced by this crate
    pub fn from_wire(node: &Value) -> Result<Self, SchemaError> {
        WireParser::default().parse_record(node).map(Self::from_record)
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::from_wire(&serde_json::from_str(json)?)
    }
}

impl SchemaTree for RootSchema {
    fn record(&self) -> &Record {
        &self.record
    }
}

/// Governance metadata of a value schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GovernanceMetadata {
    /// Primary key field names, insertion ordered without duplicates
    pub primary_keys: Vec<String>,

    pub foreign_keys: Vec<ForeignKey>,

    pub data_product_owner_email: Option<String>,

    pub retention_period: Option<Duration>,

    pub deletion_policy: Option<DeletionPolicy>,

    /// Free-form classifications like GDPR or EAR
    pub data_classifications: BTreeSet<String>,

    pub tickets_url: Option<String>,

    pub repo_url: Option<String>,
}

/// The payload schema with technical fields and governance metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSchema {
    record: Record,
    metadata: GovernanceMetadata,
}

impl ValueSchema {
    /// Create a value schema holding only the technical fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            record: Record::new(name).with_known_fields(technical_fields()),
            metadata: GovernanceMetadata::default(),
        }
    }

    /// Create a value schema in the configured default namespace
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        let mut schema = Self::new(name);
        schema.record.set_namespace(config.default_namespace.clone());
        schema
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.record.set_namespace(Some(namespace.into()));
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.record.set_doc(Some(doc.into()));
        self
    }

    pub fn with_metadata(mut self, metadata: GovernanceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        self.record.add_field(field)
    }

    pub fn with_field(mut self, field: Field) -> Result<Self, SchemaError> {
        self.add_field(field)?;
        Ok(self)
    }

    pub fn metadata(&self) -> &GovernanceMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut GovernanceMetadata {
        &mut self.metadata
    }

    /// Fields added by the caller, i.e. without the technical fields
    pub fn payload_fields(&self) -> impl Iterator<Item = &Field> {
        self.record
            .iter()
            .filter(|f| !TECHNICAL_FIELD_NAMES.contains(&f.name()))
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.metadata.primary_keys
    }

    /// Replace the primary key set
    pub fn with_pks<I, S>(mut self, pks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.primary_keys.clear();
        for pk in pks {
            self.add_pk(pk);
        }
        self
    }

    pub fn add_pk(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.metadata.primary_keys.contains(&column) {
            self.metadata.primary_keys.push(column);
        }
    }

    pub fn remove_pk(&mut self, column: &str) {
        self.metadata.primary_keys.retain(|pk| pk != column);
    }

    pub fn add_fk(&mut self, fk: ForeignKey) {
        self.metadata.foreign_keys.push(fk);
    }

    pub fn with_fk(mut self, fk: ForeignKey) -> Self {
        self.add_fk(fk);
        self
    }

    /// Replace all foreign keys
    pub fn with_fks(mut self, fks: impl IntoIterator<Item = ForeignKey>) -> Self {
        self.metadata.foreign_keys = fks.into_iter().collect();
        self
    }

    pub fn with_data_product_owner_email(mut self, email: impl Into<String>) -> Self {
        self.metadata.data_product_owner_email = Some(email.into());
        self
    }

    pub fn with_retention_period(mut self, period: Duration) -> Self {
        self.metadata.retention_period = Some(period);
        self
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.metadata.deletion_policy = Some(policy);
        self
    }

    pub fn add_data_classification(&mut self, classification: impl Into<String>) {
        self.metadata.data_classifications.insert(classification.into());
    }

    pub fn remove_data_classification(&mut self, classification: &str) {
        self.metadata.data_classifications.remove(classification);
    }

    pub fn with_data_classification(mut self, classification: impl Into<String>) -> Self {
        self.add_data_classification(classification);
        self
    }

    pub fn with_tickets_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.tickets_url = Some(url.into());
        self
    }

    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.repo_url = Some(url.into());
        self
    }

    /// Finalization check: at least one primary key, each naming a field
    pub fn check_primary_keys(&self) -> Result<(), SchemaError> {
        if self.metadata.primary_keys.is_empty() {
            return Err(SchemaError::MissingPrimaryKey {
                schema: self.name().to_string(),
            });
        }
        self.primary_key_fields().map(|_| ())
    }

    /// Fields named by the primary keys, in primary key order
    pub fn primary_key_fields(&self) -> Result<Vec<&Field>, SchemaError> {
        self.metadata
            .primary_keys
            .iter()
            .map(|pk| {
                self.record.field(pk).ok_or_else(|| SchemaError::UnknownField {
                    schema: self.name().to_string(),
                    field: pk.clone(),
                })
            })
            .collect()
    }

    /// Reconstruct from a wire schema produced by this crate
    ///
    /// Fields are taken from the wire as they are; the technical fields are
    /// not added a second time.
    pub fn from_wire(node: &Value) -> Result<Self, SchemaError> {
        Self::from_wire_with(node, &WireParser::default())
    }

    pub fn from_wire_with(node: &Value, parser: &WireParser) -> Result<Self, SchemaError> {
        let record = parser.parse_record(node)?;
        let map = node
            .as_object()
            .ok_or_else(|| SchemaError::unrecognized("a value schema must be an object"))?;

        let metadata = GovernanceMetadata {
            primary_keys: string_list(map, PROP_PKS)?,
            foreign_keys: optional(map, PROP_FKS)?.unwrap_or_default(),
            data_product_owner_email: optional(map, PROP_DATA_PRODUCT_OWNER)?,
            retention_period: optional(map, PROP_RETENTION_PERIOD)?,
            deletion_policy: optional(map, PROP_DELETION_POLICY)?,
            data_classifications: string_list(map, PROP_DATA_CLASSIFICATIONS)?
                .into_iter()
                .collect(),
            tickets_url: optional(map, PROP_TICKETS_URL)?,
            repo_url: optional(map, PROP_REPO_URL)?,
        };

        Ok(Self { record, metadata })
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::from_wire(&serde_json::from_str(json)?)
    }
}

impl SchemaTree for ValueSchema {
    fn record(&self) -> &Record {
        &self.record
    }

    fn to_wire_schema(&self) -> Value {
        let meta = &self.metadata;
        let mut node = record_node(&self.record);
        node.insert(PROP_PKS.into(), meta.primary_keys.clone().into());
        node.insert(PROP_FKS.into(), plain_value(&meta.foreign_keys));
        node.insert(
            PROP_DATA_PRODUCT_OWNER.into(),
            plain_value(&meta.data_product_owner_email),
        );
        node.insert(PROP_RETENTION_PERIOD.into(), plain_value(&meta.retention_period));
        node.insert(PROP_DELETION_POLICY.into(), plain_value(&meta.deletion_policy));
        node.insert(
            PROP_DATA_CLASSIFICATIONS.into(),
            plain_value(&meta.data_classifications),
        );
        node.insert(PROP_TICKETS_URL.into(), plain_value(&meta.tickets_url));
        node.insert(PROP_REPO_URL.into(), plain_value(&meta.repo_url));
        Value::Object(node)
    }
}

/// Key schema derived from a value schema
///
/// Holds the primary key fields of the value schema, forced to non-nullable.
/// A value schema without primary keys yields a key with the single
/// synthetic timestamp field [`crate::technical::KEY_TIME_FIELD`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeySchema {
    record: Record,
    synthetic: bool,
}

impl KeySchema {
    pub fn derive(value: &ValueSchema) -> Result<Self, SchemaError> {
        Self::derive_with(value, &Config::default())
    }

    pub fn derive_with(value: &ValueSchema, config: &Config) -> Result<Self, SchemaError> {
        let source = value.record();
        let mut record = Record::new(format!("{}{}", source.name(), config.key_suffix));
        record.set_namespace(source.namespace().map(str::to_string));
        record.set_doc(source.doc().map(str::to_string));

        let synthetic = value.primary_keys().is_empty();
        if synthetic {
            record.add_field(key_time_field())?;
        } else {
            for field in value.primary_key_fields()? {
                record.add_field(field.clone().not_null())?;
            }
        }

        tracing::debug!(
            value = source.name(),
            key = record.name(),
            fields = record.len(),
            synthetic,
            "derived key schema"
        );
        Ok(Self { record, synthetic })
    }

    /// True when the key is the timestamp fallback rather than primary keys
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn into_root(self) -> RootSchema {
        RootSchema::from_record(self.record)
    }
}

impl SchemaTree for KeySchema {
    fn record(&self) -> &Record {
        &self.record
    }
}

/// Governance metadata as JSON
///
/// Only called with the derived `Serialize` impls of the governance types,
/// strings and string sets; those have string keys and no fallible fields.
fn plain_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("governance metadata serializes to JSON")
}

fn optional<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Result<Option<T>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

fn string_list(map: &Map<String, Value>, key: &str) -> Result<Vec<String>, SchemaError> {
    Ok(optional::<Vec<String>>(map, key)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::TimeUnit;
    use crate::types::PrimitiveType;
    use pretty_assertions::assert_eq;

    fn customer() -> ValueSchema {
        let mut value = ValueSchema::new("CUSTOMER");
        value
            .add_field(Field::new("CUSTOMER_ID", PrimitiveType::Int).not_null())
            .unwrap();
        value
            .add_field(Field::new("COMPANY_NAME", PrimitiveType::nvarchar(30).unwrap()))
            .unwrap();
        value
    }

    #[test]
    fn new_value_schema_has_technical_fields() {
        let value = ValueSchema::new("X");
        assert_eq!(value.record().field_names(), TECHNICAL_FIELD_NAMES.to_vec());
        assert_eq!(value.payload_fields().count(), 0);
    }

    #[test]
    fn caller_fields_follow_technical_fields() {
        let value = customer();
        assert_eq!(value.record().len(), 10);
        assert_eq!(value.record().fields()[8].name(), "CUSTOMER_ID");
        let payload: Vec<&str> = value.payload_fields().map(|f| f.name()).collect();
        assert_eq!(payload, vec!["CUSTOMER_ID", "COMPANY_NAME"]);
    }

    #[test]
    fn technical_field_names_are_reserved() {
        let mut value = ValueSchema::new("X");
        let err = value
            .add_field(Field::new("__change_type", PrimitiveType::String))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateKey { .. }));
    }

    #[test]
    fn primary_key_set_semantics() {
        let mut value = customer().with_pks(["CUSTOMER_ID", "CUSTOMER_ID"]);
        assert_eq!(value.primary_keys(), ["CUSTOMER_ID".to_string()]);

        value.add_pk("COMPANY_NAME");
        value.remove_pk("CUSTOMER_ID");
        assert_eq!(value.primary_keys(), ["COMPANY_NAME".to_string()]);
    }

    #[test]
    fn finalization_check() {
        let value = customer();
        assert!(matches!(
            value.check_primary_keys(),
            Err(SchemaError::MissingPrimaryKey { .. })
        ));

        let value = value.with_pks(["NOPE"]);
        assert!(matches!(
            value.check_primary_keys(),
            Err(SchemaError::UnknownField { .. })
        ));

        assert!(customer().with_pks(["CUSTOMER_ID"]).check_primary_keys().is_ok());
    }

    #[test]
    fn set_metadata_is_never_written_as_null() {
        let value = customer()
            .with_pks(["CUSTOMER_ID"])
            .with_fk(ForeignKey::new("ADDRESS").with_name("Customer to Address"))
            .with_data_product_owner_email("owner@company.com")
            .with_retention_period(Duration::new(6, TimeUnit::Years))
            .with_deletion_policy(DeletionPolicy::new(10, TimeUnit::Months).with_description("legal"))
            .with_data_classification("GDPR")
            .with_tickets_url("https://issues.example.com")
            .with_repo_url("https://git.example.com");

        let wire = value.to_wire_schema();
        for key in [
            PROP_PKS,
            PROP_FKS,
            PROP_DATA_PRODUCT_OWNER,
            PROP_RETENTION_PERIOD,
            PROP_DELETION_POLICY,
            PROP_DATA_CLASSIFICATIONS,
            PROP_TICKETS_URL,
            PROP_REPO_URL,
        ] {
            assert!(!wire[key].is_null(), "{key} must be written");
        }
        assert_eq!(
            wire[PROP_DELETION_POLICY],
            serde_json::json!({"value": 10, "unit": "MONTHS", "description": "legal"})
        );
    }

    #[test]
    fn value_metadata_on_the_wire() {
        let mut value = customer()
            .with_pks(["CUSTOMER_ID"])
            .with_fk(ForeignKey::new("ADDRESS").add_condition("ADDRESS_ID", "ADDRESS_ID"))
            .with_data_product_owner_email("owner@company.com")
            .with_retention_period(Duration::new(6, TimeUnit::Years))
            .with_data_classification("GDPR")
            .with_data_classification("EAR");
        value.remove_data_classification("GDPR");

        let wire = value.to_wire_schema();
        assert_eq!(wire["pks"], serde_json::json!(["CUSTOMER_ID"]));
        assert_eq!(wire["fks"][0]["fk_schema_fqn"], "ADDRESS");
        assert_eq!(wire["data_product_owner_email"], "owner@company.com");
        assert_eq!(wire["retention_period"], serde_json::json!({"value": 6, "unit": "YEARS"}));
        assert_eq!(wire["deletion_policy"], Value::Null);
        assert_eq!(wire["data_classifications"], serde_json::json!(["EAR"]));
        assert_eq!(wire["tickets_url"], Value::Null);

        let value = value.with_fks([ForeignKey::new("REGION"), ForeignKey::new("COUNTRY")]);
        let fks: Vec<&str> = value
            .metadata()
            .foreign_keys
            .iter()
            .map(|fk| fk.fk_schema_fqn.as_str())
            .collect();
        assert_eq!(fks, vec!["REGION", "COUNTRY"]);
    }

    #[test]
    fn key_from_primary_keys() {
        let value = customer().with_pks(["CUSTOMER_ID"]);
        let key = KeySchema::derive(&value).unwrap();
        assert_eq!(key.name(), "CUSTOMER_key");
        assert_eq!(key.record().field_names(), vec!["CUSTOMER_ID"]);
        assert!(!key.is_synthetic());
    }

    #[test]
    fn key_forces_non_nullable() {
        let value = customer().with_pks(["COMPANY_NAME"]);
        let key = KeySchema::derive(&value).unwrap();
        let field = key.record().field("COMPANY_NAME").unwrap();
        assert!(!field.is_nullable());
        assert_eq!(
            field.data_type(),
            value.record().field("COMPANY_NAME").unwrap().data_type()
        );
    }

    #[test]
    fn key_fallback_without_primary_keys() {
        let key = KeySchema::derive(&customer()).unwrap();
        assert!(key.is_synthetic());
        assert_eq!(key.record().field_names(), vec!["__key_time"]);
        let field = &key.record().fields()[0];
        assert!(!field.is_nullable());
        assert_eq!(
            field.data_type(),
            &crate::types::DataType::Primitive(PrimitiveType::TimestampMicros)
        );
    }

    #[test]
    fn key_with_unknown_primary_key_fails() {
        let value = customer().with_pks(["MISSING"]);
        assert!(matches!(
            KeySchema::derive(&value),
            Err(SchemaError::UnknownField { .. })
        ));
    }

    #[test]
    fn config_is_applied() {
        let config = Config {
            key_suffix: "Key".to_string(),
            default_namespace: Some("sales".to_string()),
            ..Config::default()
        };
        let value = ValueSchema::with_config("order", &config);
        assert_eq!(value.record().namespace(), Some("sales"));

        let key = KeySchema::derive_with(&value, &config).unwrap();
        assert_eq!(key.name(), "orderKey");
        assert_eq!(key.record().namespace(), Some("sales"));

        let root = RootSchema::with_config("lookup", &config);
        assert_eq!(root.record().namespace(), Some("sales"));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = customer().with_pks(["CUSTOMER_ID"]);
        let b = customer().with_pks(["CUSTOMER_ID"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let c = customer().with_pks(["COMPANY_NAME"]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
