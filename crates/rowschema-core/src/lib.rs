//! RowSchema Core
//!
//! Typed model of record-oriented Avro schemas and its wire form.
//! Wire metadata keys and logical type tags are part of the public contract;
//! never rename them.

pub mod config;
pub mod error;
pub mod field;
pub mod governance;
pub mod naming;
pub mod record;
pub mod row_type;
pub mod schema;
pub mod technical;
pub mod types;
pub mod wire;

pub use config::{Config, ConfigError};
pub use error::SchemaError;
pub use field::Field;
pub use governance::{DeletionPolicy, Duration, ForeignKey, JoinCondition, Sensitivity, TimeUnit};
pub use naming::{decode_name, encode_name};
pub use record::Record;
pub use row_type::RowType;
pub use schema::{GovernanceMetadata, KeySchema, RootSchema, SchemaTree, ValueSchema};
pub use types::{DataType, PrimitiveType, TypeKind, UnionMember, UnionType};
pub use wire::{parse, ToWireSchema, WireParser};
