use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{FOREIGN_KEY_META, NOT_NULL_TEST, PRIMARY_KEY_META, UNIQUE_TEST};
use crate::error::{Error, Result};
use crate::types::{DataType, MetaValue};

/// Top-level dbt schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    /// Tables in declaration order. dbt files list them under `models` or `seeds`.
    #[serde(alias = "seeds")]
    pub models: Vec<Table>,
}

/// A dbt model or seed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

/// Column definition with its data tests and `meta` flags.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    #[schemars(with = "String")]
    pub data_type: DataType,
    #[serde(default)]
    pub data_tests: Vec<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, MetaValue>,
}

impl Schema {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).map_err(|err| Error::Parse(err.to_string()))
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|err| Error::Parse(err.to_string()))
    }

    /// Load a schema file, choosing the decoder from the extension.
    ///
    /// Anything that is not `.json` is read as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.models.iter().find(|table| table.name == name)
    }
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|column| column.is_primary_key())
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            data_tests: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_test(mut self, test: impl Into<String>) -> Self {
        self.data_tests.push(test.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: MetaValue) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn primary_key(self) -> Self {
        self.with_meta(PRIMARY_KEY_META, MetaValue::Bool(true))
    }

    pub fn references(self, reference: impl Into<String>) -> Self {
        self.with_meta(FOREIGN_KEY_META, MetaValue::Text(reference.into()))
    }

    pub fn has_test(&self, test: &str) -> bool {
        self.data_tests.iter().any(|tag| tag == test)
    }

    pub fn is_unique(&self) -> bool {
        self.has_test(UNIQUE_TEST)
    }

    pub fn is_not_null(&self) -> bool {
        self.has_test(NOT_NULL_TEST)
    }

    pub fn is_primary_key(&self) -> bool {
        self.meta
            .get(PRIMARY_KEY_META)
            .map(MetaValue::is_truthy)
            .unwrap_or(false)
    }

    /// Raw `foreign_key` reference, if the column declares one.
    ///
    /// A boolean `true` is surfaced as `"true"` so callers report it as a
    /// malformed reference instead of silently ignoring it.
    pub fn foreign_key(&self) -> Option<&str> {
        match self.meta.get(FOREIGN_KEY_META)? {
            MetaValue::Text(reference) => Some(reference.as_str()),
            MetaValue::Bool(true) => Some("true"),
            MetaValue::Bool(false) => None,
        }
    }
}
