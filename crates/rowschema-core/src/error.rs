//! Error taxonomy for schema construction and reconstruction
//!
//! All failures are local and synchronous. Every operation is a pure tree
//! walk, so retrying with the same input fails the same way.

/// Errors raised while building, projecting or reconstructing schemas
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Bad constructor arguments (negative length, empty enum symbols, ...)
    #[error("Invalid parameter for {type_name}: {reason}")]
    InvalidParameter {
        type_name: &'static str,
        reason: String,
    },

    /// Two entities with the same name added to a keyed collection
    #[error("Duplicate {collection} '{key}'")]
    DuplicateKey {
        collection: &'static str,
        key: String,
    },

    /// A value schema was finalized without any primary key
    #[error("Value schema '{schema}' has no primary key defined")]
    MissingPrimaryKey { schema: String },

    /// A primary key refers to a field the schema does not contain
    #[error("Schema '{schema}' has no field '{field}'")]
    UnknownField { schema: String, field: String },

    /// Wire shape with neither a known logicalType nor a known bare type
    #[error("Unrecognized schema: {reason}")]
    UnrecognizedSchema { reason: String },

    /// Reconstruction exceeded the nesting guard
    #[error("Schema nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn invalid(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            type_name,
            reason: reason.into(),
        }
    }

    pub(crate) fn unrecognized(reason: impl Into<String>) -> Self {
        Self::UnrecognizedSchema {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = SchemaError::invalid("Decimal", "precision must be positive, got -1");
        assert_eq!(
            err.to_string(),
            "Invalid parameter for Decimal: precision must be positive, got -1"
        );

        let err = SchemaError::DuplicateKey {
            collection: "field",
            key: "id".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate field 'id'");
    }
}
