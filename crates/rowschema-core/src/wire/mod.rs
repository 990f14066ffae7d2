//! Wire schema: Avro schema syntax as `serde_json::Value`, extended with
//! metadata keys on record and field nodes.
//!
//! [`projection`] turns the model into wire form, [`reconstruction`] turns
//! wire form produced by the projection back into the model.

pub mod projection;
pub mod reconstruction;

pub use projection::ToWireSchema;
pub use reconstruction::{parse, WireParser};

/// Pre-escape identifier of a record, field or named type
pub const PROP_ORIGINAL_NAME: &str = "__originalname";

/// Field sensitivity, see [`crate::Sensitivity`]
pub const PROP_SENSITIVITY: &str = "__sensitivity";

/// Field is not part of the official payload
pub const PROP_INTERNAL: &str = "__internal";

/// Field values are set by the pipeline
pub const PROP_TECHNICAL: &str = "__technical";

/// Source system data type of a field, informational
pub const PROP_SOURCE_DATA_TYPE: &str = "__source_data_type";

// Value schema metadata
pub const PROP_PKS: &str = "pks";
pub const PROP_FKS: &str = "fks";
pub const PROP_DATA_PRODUCT_OWNER: &str = "data_product_owner_email";
pub const PROP_RETENTION_PERIOD: &str = "retention_period";
pub const PROP_DELETION_POLICY: &str = "deletion_policy";
pub const PROP_DATA_CLASSIFICATIONS: &str = "data_classifications";
pub const PROP_TICKETS_URL: &str = "tickets_url";
pub const PROP_REPO_URL: &str = "repo_url";

/// Avro full name of a named type: `namespace.name`, or `name` without namespace
pub(crate) fn full_name(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}
