use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Generated value for a column.
///
/// Values are hashable so unique pools can deduplicate on insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GeneratedValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl GeneratedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, GeneratedValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Cell text for delimited output; nulls become empty cells.
    pub fn to_csv(&self) -> String {
        match self {
            GeneratedValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for GeneratedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratedValue::Null => f.write_str("NULL"),
            GeneratedValue::Bool(value) => write!(f, "{value}"),
            GeneratedValue::Int(value) => write!(f, "{value}"),
            GeneratedValue::Text(value) => f.write_str(value),
            GeneratedValue::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            GeneratedValue::Timestamp(value) => {
                write!(f, "{}", value.format("%Y-%m-%dT%H:%M:%S"))
            }
        }
    }
}
