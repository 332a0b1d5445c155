use std::collections::{BTreeMap, BTreeSet};

use crate::constraints::ForeignKeyRef;
use crate::error::{Error, Result};
use crate::graph::build_fk_graph_report;
use crate::schema::Schema;

/// Validate internal consistency of a schema.
///
/// This checks:
/// - duplicate tables/columns
/// - at most one primary key column per table
/// - no column is both primary key and foreign key
/// - foreign key references are well formed and resolve
/// - no circular foreign key dependencies between tables
pub fn validate_schema(schema: &Schema) -> Result<()> {
    let mut catalog: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for table in &schema.models {
        if catalog.contains_key(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }

        let mut columns = BTreeSet::new();
        for column in &table.columns {
            if !columns.insert(column.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column name: {}.{}",
                    table.name, column.name
                )));
            }
        }

        catalog.insert(table.name.as_str(), columns);
    }

    for table in &schema.models {
        let primary_keys: Vec<&str> = table
            .primary_key_columns()
            .map(|column| column.name.as_str())
            .collect();
        if primary_keys.len() > 1 {
            return Err(Error::InvalidSchema(format!(
                "table {} declares more than one primary key: {}",
                table.name,
                primary_keys.join(", ")
            )));
        }

        for column in &table.columns {
            let Some(reference) = column.foreign_key() else {
                continue;
            };
            if column.is_primary_key() {
                return Err(Error::InvalidSchema(format!(
                    "column {}.{} is both primary key and foreign key",
                    table.name, column.name
                )));
            }

            let fk = ForeignKeyRef::parse(reference).ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "malformed foreign key '{}' on {}.{}",
                    reference, table.name, column.name
                ))
            })?;

            let ref_columns = catalog.get(fk.table.as_str()).ok_or_else(|| {
                Error::InvalidSchema(format!("referenced table not found: {}", fk.table))
            })?;
            if !ref_columns.contains(fk.column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "referenced column not found: {fk}"
                )));
            }
        }
    }

    let report = build_fk_graph_report(schema);
    if let Some(cycle) = report.cycle {
        return Err(Error::InvalidSchema(format!(
            "circular foreign key dependency between: {}",
            cycle.join(", ")
        )));
    }

    Ok(())
}
