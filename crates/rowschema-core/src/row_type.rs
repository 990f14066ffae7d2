//! Row change-type codes stored in the `__change_type` field
//!
//! These codes are a contract with downstream CDC processing. Never change
//! the character of an existing code.

use serde::{Deserialize, Serialize};

/// How a row changed in the source system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowType {
    /// A brand new record; no record with this primary key existed before
    #[serde(rename = "I")]
    Insert,

    /// An existing record was updated
    #[serde(rename = "U")]
    Update,

    /// Before image of an update, needed when the primary key changed
    #[serde(rename = "B")]
    Before,

    /// Record deleted, payload holds the complete latest version
    #[serde(rename = "D")]
    Delete,

    /// Insert or overwrite ("autocorrect")
    #[serde(rename = "A")]
    Upsert,

    /// Delete where only the primary key is known
    #[serde(rename = "X")]
    Exterminate,

    /// Delete a set of rows matching the non-null payload fields
    #[serde(rename = "T")]
    Truncate,

    /// Rows re-inserted after a truncate
    #[serde(rename = "R")]
    Replace,

    /// Deleted in the source but should be kept as archived in the target
    #[serde(rename = "P")]
    Archive,
}

impl RowType {
    pub const ALL: [RowType; 9] = [
        Self::Insert,
        Self::Update,
        Self::Before,
        Self::Delete,
        Self::Upsert,
        Self::Exterminate,
        Self::Truncate,
        Self::Replace,
        Self::Archive,
    ];

    /// Single character code
    pub fn code(&self) -> char {
        match self {
            Self::Insert => 'I',
            Self::Update => 'U',
            Self::Before => 'B',
            Self::Delete => 'D',
            Self::Upsert => 'A',
            Self::Exterminate => 'X',
            Self::Truncate => 'T',
            Self::Replace => 'R',
            Self::Archive => 'P',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Before => "before image of an update",
            Self::Delete => "delete with full payload",
            Self::Upsert => "upsert",
            Self::Exterminate => "delete by primary key",
            Self::Truncate => "bulk delete by non-key predicate",
            Self::Replace => "truncate and reinsert",
            Self::Archive => "archive",
        }
    }

    /// Whether the `__truncate` map carries the delete predicate
    pub fn uses_truncate_map(&self) -> bool {
        matches!(self, Self::Truncate)
    }
}

impl std::fmt::Display for RowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
