//! Data governance value types attached to fields and value schemas

use serde::{Deserialize, Serialize};

/// Sensitivity classification of a field's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sensitivity {
    /// Company internal data
    #[default]
    Internal,

    /// Can be shown to everybody logged in
    Public,

    /// Harmless alone, but personal information may be derived in combination
    Sensitive,

    /// Personal information by itself (SSN, credit card, address)
    Private,

    /// Falls under regulations like EAR or dual use
    Regulated,

    /// Personally identifiable information
    Pii,

    /// Protected health information
    Phi,

    GbuOnly,

    Itar,

    DualUse,
}

impl Sensitivity {
    /// All classifications in declaration order
    pub const ALL: [Sensitivity; 10] = [
        Self::Internal,
        Self::Public,
        Self::Sensitive,
        Self::Private,
        Self::Regulated,
        Self::Pii,
        Self::Phi,
        Self::GbuOnly,
        Self::Itar,
        Self::DualUse,
    ];

    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "INTERNAL",
            Self::Public => "PUBLIC",
            Self::Sensitive => "SENSITIVE",
            Self::Private => "PRIVATE",
            Self::Regulated => "REGULATED",
            Self::Pii => "PII",
            Self::Phi => "PHI",
            Self::GbuOnly => "GBU_ONLY",
            Self::Itar => "ITAR",
            Self::DualUse => "DUAL_USE",
        }
    }

    /// Look up a classification by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unit for retention and deletion periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Hours,
    Weeks,
    Months,
    Quarters,
    #[default]
    Years,
}

/// A retention period
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Duration {
    pub value: Option<u32>,
    #[serde(default)]
    pub unit: TimeUnit,
}

impl Duration {
    pub fn new(value: u32, unit: TimeUnit) -> Self {
        Self {
            value: Some(value),
            unit,
        }
    }
}

/// When and how data has to be deleted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeletionPolicy {
    pub value: Option<u32>,
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default)]
    pub description: Option<String>,
}

impl DeletionPolicy {
    pub fn new(value: u32, unit: TimeUnit) -> Self {
        Self {
            value: Some(value),
            unit,
            description: None,
        }
    }

    /// Set the free-form description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A single join predicate of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCondition {
    pub left_field_name: String,
    pub right_field_name: String,
    pub condition: String,
}

impl JoinCondition {
    /// Create an equality predicate
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left_field_name: left.into(),
            right_field_name: right.into(),
            condition: "=".to_string(),
        }
    }

    /// Use a different comparison operator
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.condition = operator.into();
        self
    }
}

/// Foreign key relationship to another schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Fully qualified identifier of the referenced schema
    pub fk_schema_fqn: String,

    /// Optional name of the relationship
    #[serde(default)]
    pub fk_name: Option<String>,

    /// Join predicates, at least one once the key is complete
    #[serde(default)]
    pub conditions: Vec<JoinCondition>,
}

impl ForeignKey {
    /// Create a foreign key to the given schema without any predicate yet
    pub fn new(fk_schema_fqn: impl Into<String>) -> Self {
        Self {
            fk_schema_fqn: fk_schema_fqn.into(),
            fk_name: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.fk_name = Some(name.into());
        self
    }

    /// Add an equality predicate
    pub fn add_condition(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.add_join(JoinCondition::new(left, right))
    }

    /// Add an arbitrary predicate
    pub fn add_join(mut self, condition: JoinCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}
