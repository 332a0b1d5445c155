//! Constrained test data generation for dbt-style schemas.
//!
//! Row counts are planned once per engine, primary key pools are generated
//! once and shared with the foreign keys that reference them, and tables
//! whose unique columns run out of values are restarted with fewer rows.

pub mod engine;
pub mod errors;
pub mod faker_rs;
mod materialize;
pub mod model;
pub mod output;
pub mod planner;
pub mod pool;
pub mod provider;
pub mod value;

pub use engine::GenerationEngine;
pub use errors::GenerationError;
pub use faker_rs::{FakeValueProvider, LocaleKey};
pub use model::{
    DegradationNotice, GenerateOptions, GeneratedColumn, GeneratedTable, GenerationOutput,
    GenerationReport, TableReport, load_options,
};
pub use output::{WrittenOutput, write_output};
pub use planner::RowCountPlan;
pub use pool::{PoolKey, PoolStatus, PoolStore, UniqueOutcome, UniquePolicy, generate_unique};
pub use provider::{KIND_DESCRIPTORS, KindResolver, KindSpec, ValueKind, ValueProvider};
pub use value::GeneratedValue;
