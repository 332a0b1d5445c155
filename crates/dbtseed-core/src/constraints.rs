use std::fmt;

use serde::{Deserialize, Serialize};

/// Data test tag requiring all values of a column to be distinct.
pub const UNIQUE_TEST: &str = "unique";
/// Data test tag forbidding nulls in a column.
pub const NOT_NULL_TEST: &str = "not_null";

/// `meta` key flagging the identity column of a table.
pub const PRIMARY_KEY_META: &str = "primary_key";
/// `meta` key holding a `"<table>.<column>"` reference.
pub const FOREIGN_KEY_META: &str = "foreign_key";

/// Parsed `"<table>.<column>"` foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Parse a reference string; both parts must be non-empty.
    pub fn parse(reference: &str) -> Option<Self> {
        let (table, column) = reference.trim().split_once('.')?;
        if table.is_empty() || column.is_empty() || column.contains('.') {
            return None;
        }
        Some(Self::new(table, column))
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
