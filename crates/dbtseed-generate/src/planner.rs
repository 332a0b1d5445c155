use std::collections::BTreeMap;

use rand::Rng;

use dbtseed_core::Schema;

use crate::errors::GenerationError;
use crate::model::validate_row_bounds;

/// Target row count per table for one engine instance.
///
/// Counts are drawn once; afterwards the only mutation is [`shrink`], used
/// when a table runs out of unique values.
///
/// [`shrink`]: RowCountPlan::shrink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCountPlan {
    counts: BTreeMap<String, usize>,
}

impl RowCountPlan {
    /// Draw one count per table, uniformly from `[min_rows, max_rows]`.
    pub fn draw<R: Rng + ?Sized>(
        schema: &Schema,
        min_rows: usize,
        max_rows: usize,
        rng: &mut R,
    ) -> Result<Self, GenerationError> {
        validate_row_bounds(min_rows, max_rows)?;
        let counts = schema
            .models
            .iter()
            .map(|table| (table.name.clone(), rng.random_range(min_rows..=max_rows)))
            .collect();
        Ok(Self { counts })
    }

    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            counts: counts
                .into_iter()
                .map(|(table, rows)| (table.into(), rows))
                .collect(),
        }
    }

    pub fn rows_for(&self, table: &str) -> Option<usize> {
        self.counts.get(table).copied()
    }

    /// Lower a table's count. Counts never grow.
    pub fn shrink(&mut self, table: &str, rows: usize) {
        if let Some(current) = self.counts.get_mut(table) {
            *current = (*current).min(rows);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(table, rows)| (table.as_str(), *rows))
    }
}
