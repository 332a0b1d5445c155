use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Unknown kind descriptor, unmapped data type, unknown locale or
    /// out-of-range option.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A foreign key that cannot be resolved to a value pool.
    #[error("schema consistency error: {0}")]
    SchemaConsistency(String),
    #[error("value provider error: {0}")]
    Provider(String),
    #[error("table '{table}' could not be materialized within {attempts} attempts")]
    DegradationLimit { table: String, attempts: u32 },
    #[error("schema error: {0}")]
    Schema(#[from] dbtseed_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}
