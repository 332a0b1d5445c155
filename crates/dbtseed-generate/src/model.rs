use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
use crate::faker_rs::LocaleKey;
use crate::provider::{KindResolver, KindSpec, check_probability};
use crate::value::GeneratedValue;

/// Options for the generation engine.
///
/// Every field has a default, so a TOML config only needs the keys it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Lower bound for per-table row counts (inclusive).
    pub min_rows: usize,
    /// Upper bound for per-table row counts (inclusive).
    pub max_rows: usize,
    /// Locale handed to the value provider.
    pub locale: String,
    /// Seed for reproducible runs; unseeded runs differ every time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Null probability for regular columns without a `not_null` test.
    pub default_null_probability: f64,
    /// Candidates requested per unique-search round, as a multiple of the
    /// target count.
    pub oversample_factor: usize,
    /// Consecutive non-productive rounds before a value space counts as
    /// exhausted.
    pub max_stall_rounds: u32,
    /// Maximum materialization attempts for one table, degradations included.
    pub max_table_attempts: u32,
    /// Data type name to value kind overrides.
    pub data_type_mapping: BTreeMap<String, KindSpec>,
    /// Column name to value kind overrides; these win over the type mapping.
    pub field_aliases: BTreeMap<String, KindSpec>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            min_rows: 10,
            max_rows: 100,
            locale: LocaleKey::EnUs.as_str().to_string(),
            seed: None,
            default_null_probability: 0.1,
            oversample_factor: 2,
            max_stall_rounds: 3,
            max_table_attempts: 16,
            data_type_mapping: BTreeMap::new(),
            field_aliases: BTreeMap::new(),
        }
    }
}

impl GenerateOptions {
    pub fn from_toml_str(input: &str) -> Result<Self, GenerationError> {
        Ok(toml::from_str(input)?)
    }

    pub fn to_toml_string(&self) -> Result<String, GenerationError> {
        toml::to_string_pretty(self)
            .map_err(|err| GenerationError::Configuration(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        validate_row_bounds(self.min_rows, self.max_rows)?;
        check_probability("default_null_probability", self.default_null_probability)?;
        if self.oversample_factor == 0 {
            return Err(GenerationError::Configuration(
                "oversample_factor must be >= 1".to_string(),
            ));
        }
        if self.max_stall_rounds == 0 {
            return Err(GenerationError::Configuration(
                "max_stall_rounds must be >= 1".to_string(),
            ));
        }
        if self.max_table_attempts == 0 {
            return Err(GenerationError::Configuration(
                "max_table_attempts must be >= 1".to_string(),
            ));
        }
        LocaleKey::resolve(&self.locale)?;
        KindResolver::new(&self.data_type_mapping, &self.field_aliases)?;
        Ok(())
    }
}

pub fn validate_row_bounds(min_rows: usize, max_rows: usize) -> Result<(), GenerationError> {
    if min_rows > max_rows {
        return Err(GenerationError::Configuration(format!(
            "min_rows ({min_rows}) must be <= max_rows ({max_rows})"
        )));
    }
    Ok(())
}

/// Load options from a TOML file.
pub fn load_options(path: &Path) -> Result<GenerateOptions, GenerationError> {
    let contents = std::fs::read_to_string(path)?;
    GenerateOptions::from_toml_str(&contents)
}

/// One generated column.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedColumn {
    pub name: String,
    pub values: Vec<GeneratedValue>,
}

/// Row-oriented result for one table; all columns share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTable {
    pub name: String,
    pub columns: Vec<GeneratedColumn>,
    pub row_count: usize,
}

impl GeneratedTable {
    pub fn column(&self, name: &str) -> Option<&[GeneratedValue]> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&GeneratedValue>> {
        if index >= self.row_count {
            return None;
        }
        self.columns
            .iter()
            .map(|column| column.values.get(index))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&GeneratedValue>> {
        (0..self.row_count).filter_map(|index| self.row(index))
    }
}

/// Tables of one `generate` call in schema order, plus its report.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub tables: Vec<GeneratedTable>,
    pub report: GenerationReport,
}

impl GenerationOutput {
    pub fn table(&self, name: &str) -> Option<&GeneratedTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn into_map(self) -> BTreeMap<String, GeneratedTable> {
        self.tables
            .into_iter()
            .map(|table| (table.name.clone(), table))
            .collect()
    }
}

/// Summary of a generated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub rows_planned: usize,
    pub rows_generated: usize,
    pub attempts: u32,
}

/// A table shrunk because a column ran out of unique values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DegradationNotice {
    pub table: String,
    pub column: String,
    pub requested: usize,
    pub achieved: usize,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub tables: Vec<TableReport>,
    pub pools_generated: usize,
    pub degradations: Vec<DegradationNotice>,
}

impl GenerationReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            tables: Vec::new(),
            pools_generated: 0,
            degradations: Vec::new(),
        }
    }

    pub fn record_table(&mut self, table: TableReport) {
        self.tables.push(table);
    }

    pub fn record_degradation(&mut self, notice: DegradationNotice) {
        self.degradations.push(notice);
    }

    pub fn rows_total(&self) -> usize {
        self.tables.iter().map(|table| table.rows_generated).sum()
    }
}
