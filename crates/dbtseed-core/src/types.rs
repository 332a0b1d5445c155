use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical column data type as declared in the schema.
///
/// Parsing is case-insensitive. Names outside the known set are kept as
/// [`DataType::Other`] so a `data_type_mapping` entry can still give them a
/// value kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Date,
    Varchar,
    Integer,
    Boolean,
    Timestamp,
    Other(String),
}

impl DataType {
    /// Canonical upper-case name, used as the key of type mappings.
    pub fn name(&self) -> String {
        match self {
            DataType::Date => "DATE".to_string(),
            DataType::Varchar => "VARCHAR".to_string(),
            DataType::Integer => "INTEGER".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
            DataType::Timestamp => "TIMESTAMP".to_string(),
            DataType::Other(name) => name.to_uppercase(),
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "date" => DataType::Date,
            "varchar" => DataType::Varchar,
            "integer" => DataType::Integer,
            "boolean" => DataType::Boolean,
            "timestamp" => DataType::Timestamp,
            _ => DataType::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        match value {
            DataType::Other(name) => name,
            known => known.name().to_lowercase(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A `meta` entry value: dbt allows either booleans or strings here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Text(String),
}

impl MetaValue {
    /// Truthiness following dbt conventions (`true`, `"true"`, `"yes"`).
    pub fn is_truthy(&self) -> bool {
        match self {
            MetaValue::Bool(value) => *value,
            MetaValue::Text(value) => {
                matches!(value.trim().to_lowercase().as_str(), "true" | "yes" | "1")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_parse_is_case_insensitive() {
        assert_eq!(DataType::parse("VARCHAR"), DataType::Varchar);
        assert_eq!(DataType::parse("date"), DataType::Date);
        assert_eq!(DataType::parse(" Integer "), DataType::Integer);
        assert_eq!(
            DataType::parse("numeric"),
            DataType::Other("numeric".to_string())
        );
        assert_eq!(DataType::parse("numeric").name(), "NUMERIC");
    }

    #[test]
    fn meta_truthiness() {
        assert!(MetaValue::Bool(true).is_truthy());
        assert!(MetaValue::Text("True".to_string()).is_truthy());
        assert!(!MetaValue::Text("no".to_string()).is_truthy());
        assert!(!MetaValue::Bool(false).is_truthy());
    }
}
