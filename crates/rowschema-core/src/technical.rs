//! Technical fields every value schema carries

use crate::field::Field;
use crate::record::Record;
use crate::types::{DataType, PrimitiveType};

/// Audit information of all applied transformations
pub const AUDIT_FIELD: &str = "__audit";
/// Row change-type code, see [`crate::RowType`]
pub const ROW_TYPE_FIELD: &str = "__change_type";
pub const CHANGE_TIME_FIELD: &str = "__change_time";
pub const SOURCE_ROWID_FIELD: &str = "__source_rowid";
pub const SOURCE_TRANSACTION_FIELD: &str = "__source_transaction";
pub const SOURCE_SYSTEM_FIELD: &str = "__source_system";
/// Predicate map for truncate rows
pub const TRUNCATE_FIELD: &str = "__truncate";
/// Schema-less add-on columns
pub const EXTENSION_FIELD: &str = "__extension";

/// Synthetic key field used when a value schema declares no primary key
pub const KEY_TIME_FIELD: &str = "__key_time";

/// Names of the technical fields, in the order they are added
pub const TECHNICAL_FIELD_NAMES: [&str; 8] = [
    AUDIT_FIELD,
    ROW_TYPE_FIELD,
    CHANGE_TIME_FIELD,
    SOURCE_ROWID_FIELD,
    SOURCE_TRANSACTION_FIELD,
    SOURCE_SYSTEM_FIELD,
    TRUNCATE_FIELD,
    EXTENSION_FIELD,
];

const VARCHAR_1: PrimitiveType = PrimitiveType::Varchar { length: 1 };
const VARCHAR_4: PrimitiveType = PrimitiveType::Varchar { length: 4 };
const VARCHAR_30: PrimitiveType = PrimitiveType::Varchar { length: 30 };
const NVARCHAR_1024: PrimitiveType = PrimitiveType::NVarchar { length: 1024 };

fn audit_record() -> Record {
    let details = Record::new("__audit_details").with_known_fields(vec![
        Field::new("__transformationname", NVARCHAR_1024)
            .with_doc("A name identifying the applied transformation"),
        Field::new("__transformresult", VARCHAR_4)
            .with_doc("Is the record PASS, FAIL or WARN?"),
        Field::new("__transformresult_text", NVARCHAR_1024)
            .with_doc("Transforms can optionally describe what they did"),
        Field::new("__transformresult_quality", PrimitiveType::Byte)
            .with_doc("Transforms can optionally return a percent value from 0 (FAIL) to 100 (PASS)"),
    ]);

    Record::new(AUDIT_FIELD).with_known_fields(vec![
        Field::new("__transformresult", VARCHAR_4)
            .with_doc("Is the record PASS, FAIL or WARN?"),
        Field::new("__details", DataType::array(details))
            .with_doc("Details of all transformations"),
    ])
}

fn extension_record() -> Record {
    Record::new(EXTENSION_FIELD)
        .with_doc("Extension point to add custom values to each record")
        .with_known_fields(vec![
            Field::new("__path", PrimitiveType::String)
                .not_null()
                .with_doc("An unique identifier, e.g. \"street\".\"house number component\""),
            Field::new("__value", PrimitiveType::String)
                .not_null()
                .with_doc("The value of any primitive datatype of Avro"),
        ])
}

/// The technical fields in [`TECHNICAL_FIELD_NAMES`] order
pub fn technical_fields() -> Vec<Field> {
    vec![
        Field::new(AUDIT_FIELD, audit_record()),
        Field::new(ROW_TYPE_FIELD, VARCHAR_1)
            .internal()
            .technical()
            .with_doc("Indicates how the row is to be processed: Insert, Update, Delete, upsert/Autocorrect, eXterminate, Truncate,..."),
        Field::new(CHANGE_TIME_FIELD, PrimitiveType::TimestampMillis)
            .internal()
            .technical()
            .with_doc("Timestamp of the transaction. All rows of the transaction have the same value."),
        Field::new(SOURCE_ROWID_FIELD, VARCHAR_30)
            .internal()
            .technical()
            .with_doc("Optional unique and static pointer to the row, e.g. Oracle rowid"),
        Field::new(SOURCE_TRANSACTION_FIELD, VARCHAR_30)
            .internal()
            .technical()
            .with_doc("Optional source transaction information for auditing"),
        Field::new(SOURCE_SYSTEM_FIELD, VARCHAR_30)
            .internal()
            .technical()
            .with_doc("Optional source system information for auditing"),
        Field::new(TRUNCATE_FIELD, DataType::map(PrimitiveType::String))
            .with_doc("In case of a change type of TRUNCATE, this map contains the fields to identify the set of rows to be deleted"),
        Field::new(EXTENSION_FIELD, extension_record())
            .internal()
            .with_doc("Add more columns beyond the official logical data model"),
    ]
}

/// Key field used when no primary key is declared
pub fn key_time_field() -> Field {
    Field::new(KEY_TIME_FIELD, PrimitiveType::TimestampMicros)
        .not_null()
        .internal()
        .technical()
        .with_doc("Synthetic key, the value schema declares no primary key")
}
