//! Core contracts and helpers for dbtseed.
//!
//! This crate defines the dbt-style schema model consumed by the generation
//! engine, loaders for YAML/JSON schema documents, and the consistency checks
//! that run before generation.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{ForeignKeyRef, NOT_NULL_TEST, UNIQUE_TEST};
pub use error::{Error, Result};
pub use graph::{FkGraphReport, FkGraphSummary, build_fk_graph_report};
pub use schema::{Column, Schema, Table};
pub use types::{DataType, MetaValue};
pub use validation::validate_schema;
