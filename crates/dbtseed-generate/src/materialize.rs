use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use dbtseed_core::{Column, ForeignKeyRef, Schema, Table};

use crate::errors::GenerationError;
use crate::model::{
    DegradationNotice, GenerateOptions, GeneratedColumn, GeneratedTable, GenerationReport,
    TableReport,
};
use crate::planner::RowCountPlan;
use crate::pool::{PoolKey, PoolStatus, PoolStore, UniqueOutcome, UniquePolicy, generate_unique};
use crate::provider::{KindResolver, ValueProvider};
use crate::value::GeneratedValue;

/// How a column gets its values, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ColumnStrategy {
    ForeignKey(ForeignKeyRef),
    PrimaryKey,
    Unique,
    Regular { null_probability: f64 },
}

impl ColumnStrategy {
    pub(crate) fn for_column(
        table: &str,
        column: &Column,
        options: &GenerateOptions,
    ) -> Result<Self, GenerationError> {
        if let Some(raw) = column.foreign_key() {
            let reference = ForeignKeyRef::parse(raw).ok_or_else(|| {
                GenerationError::SchemaConsistency(format!(
                    "malformed foreign key '{raw}' on {table}.{}",
                    column.name
                ))
            })?;
            return Ok(ColumnStrategy::ForeignKey(reference));
        }
        if column.is_primary_key() {
            return Ok(ColumnStrategy::PrimaryKey);
        }
        if column.is_unique() {
            return Ok(ColumnStrategy::Unique);
        }
        let null_probability = if column.is_not_null() {
            0.0
        } else {
            options.default_null_probability
        };
        Ok(ColumnStrategy::Regular { null_probability })
    }
}

/// Mutable per-run state borrowed from the engine for one `generate` call.
pub(crate) struct RunState<'a> {
    pub(crate) plan: &'a mut RowCountPlan,
    pub(crate) pools: &'a mut PoolStore,
    pub(crate) rng: &'a mut ChaCha8Rng,
    pub(crate) report: &'a mut GenerationReport,
}

enum ColumnOutcome {
    Ready(Vec<GeneratedValue>),
    Short { achieved: usize },
}

enum AttemptOutcome {
    Complete(Vec<GeneratedColumn>),
    Degraded { column: String, achieved: usize },
}

/// Builds every table of a schema, referenced tables first.
pub(crate) struct Materializer<'a, P: ValueProvider + ?Sized> {
    schema: &'a Schema,
    options: &'a GenerateOptions,
    resolver: &'a KindResolver,
    provider: &'a mut P,
    state: RunState<'a>,
    policy: UniquePolicy,
    completed: HashMap<String, GeneratedTable>,
    derived: HashMap<PoolKey, Vec<GeneratedValue>>,
    in_progress: Vec<String>,
}

impl<'a, P: ValueProvider + ?Sized> Materializer<'a, P> {
    pub(crate) fn new(
        schema: &'a Schema,
        options: &'a GenerateOptions,
        resolver: &'a KindResolver,
        provider: &'a mut P,
        state: RunState<'a>,
    ) -> Self {
        Self {
            schema,
            options,
            resolver,
            provider,
            state,
            policy: UniquePolicy::from(options),
            completed: HashMap::new(),
            derived: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Materialize all tables and return them in schema order.
    pub(crate) fn run(mut self) -> Result<Vec<GeneratedTable>, GenerationError> {
        let schema = self.schema;
        for table in &schema.models {
            self.ensure_table(&table.name)?;
        }

        let mut tables = Vec::with_capacity(schema.models.len());
        for table in &schema.models {
            if let Some(generated) = self.completed.remove(&table.name) {
                tables.push(generated);
            }
        }
        Ok(tables)
    }

    fn ensure_table(&mut self, name: &str) -> Result<(), GenerationError> {
        if self.completed.contains_key(name) {
            return Ok(());
        }
        if self.in_progress.iter().any(|pending| pending == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(GenerationError::SchemaConsistency(format!(
                "circular foreign key dependency: {}",
                chain.join(" -> ")
            )));
        }

        let schema = self.schema;
        let table = schema.table(name).ok_or_else(|| {
            GenerationError::SchemaConsistency(format!("table '{name}' not found in schema"))
        })?;

        self.in_progress.push(name.to_string());
        let result = self.materialize_table(table);
        self.in_progress.pop();

        self.completed.insert(name.to_string(), result?);
        Ok(())
    }

    fn materialize_table(&mut self, table: &'a Table) -> Result<GeneratedTable, GenerationError> {
        let strategies = table
            .columns
            .iter()
            .map(|column| ColumnStrategy::for_column(&table.name, column, self.options))
            .collect::<Result<Vec<_>, _>>()?;

        let rows_planned = self.state.plan.rows_for(&table.name).ok_or_else(|| {
            GenerationError::SchemaConsistency(format!(
                "table '{}' has no planned row count",
                table.name
            ))
        })?;
        let mut target = rows_planned;
        let max_attempts = self.options.max_table_attempts;

        for attempt in 1..=max_attempts {
            match self.attempt(table, &strategies, target)? {
                AttemptOutcome::Complete(columns) => {
                    info!(
                        table = %table.name,
                        rows_planned,
                        rows = target,
                        attempts = attempt,
                        "table generated"
                    );
                    self.state.report.record_table(TableReport {
                        table: table.name.clone(),
                        rows_planned,
                        rows_generated: target,
                        attempts: attempt,
                    });
                    return Ok(GeneratedTable {
                        name: table.name.clone(),
                        columns,
                        row_count: target,
                    });
                }
                AttemptOutcome::Degraded { column, achieved } => {
                    info!(
                        table = %table.name,
                        column = %column,
                        requested = target,
                        achieved,
                        attempt,
                        "unique values exhausted, restarting table with fewer rows"
                    );
                    self.state.report.record_degradation(DegradationNotice {
                        table: table.name.clone(),
                        column,
                        requested: target,
                        achieved,
                    });
                    self.state.plan.shrink(&table.name, achieved);
                    target = achieved;
                }
            }
        }

        Err(GenerationError::DegradationLimit {
            table: table.name.clone(),
            attempts: max_attempts,
        })
    }

    fn attempt(
        &mut self,
        table: &'a Table,
        strategies: &[ColumnStrategy],
        target: usize,
    ) -> Result<AttemptOutcome, GenerationError> {
        let mut values: Vec<Option<Vec<GeneratedValue>>> = vec![None; table.columns.len()];
        let is_key = |index: &usize| strategies[*index] == ColumnStrategy::PrimaryKey;
        let keys_first = (0..strategies.len())
            .filter(is_key)
            .chain((0..strategies.len()).filter(|index| !is_key(index)));

        for index in keys_first {
            let column = &table.columns[index];
            let outcome = match &strategies[index] {
                ColumnStrategy::PrimaryKey => self.primary_key_values(table, column, target)?,
                ColumnStrategy::ForeignKey(reference) => {
                    self.foreign_key_values(table, column, reference, target)?
                }
                ColumnStrategy::Unique => self.unique_values(column, target)?,
                ColumnStrategy::Regular { null_probability } => {
                    ColumnOutcome::Ready(self.regular_values(column, target, *null_probability)?)
                }
            };
            match outcome {
                ColumnOutcome::Ready(column_values) => values[index] = Some(column_values),
                ColumnOutcome::Short { achieved } => {
                    return Ok(AttemptOutcome::Degraded {
                        column: column.name.clone(),
                        achieved,
                    });
                }
            }
        }

        let columns = table
            .columns
            .iter()
            .zip(values)
            .map(|(column, values)| GeneratedColumn {
                name: column.name.clone(),
                values: values.unwrap_or_default(),
            })
            .collect();
        Ok(AttemptOutcome::Complete(columns))
    }

    fn primary_key_values(
        &mut self,
        table: &Table,
        column: &Column,
        target: usize,
    ) -> Result<ColumnOutcome, GenerationError> {
        let key = PoolKey::for_column(&table.name, &column.name);
        if !self.state.pools.contains(&key) {
            let kind = self.resolver.resolve(column)?;
            let status = self.state.pools.get_or_generate(
                &key,
                &mut *self.provider,
                &kind,
                target,
                self.policy,
            )?;
            if let PoolStatus::Exhausted { achieved } = status {
                return Ok(ColumnOutcome::Short { achieved });
            }
        }

        let available = self.state.pools.get(&key).map_or(0, <[_]>::len);
        if available < target {
            return Ok(ColumnOutcome::Short {
                achieved: available,
            });
        }
        if available > target {
            // The owning table shrank; nothing has read the tail yet.
            self.state.pools.truncate(&key, target);
        }
        let values = self
            .state
            .pools
            .get(&key)
            .map(<[_]>::to_vec)
            .unwrap_or_default();
        Ok(ColumnOutcome::Ready(values))
    }

    fn foreign_key_values(
        &mut self,
        table: &Table,
        column: &Column,
        reference: &ForeignKeyRef,
        target: usize,
    ) -> Result<ColumnOutcome, GenerationError> {
        let key = PoolKey::from(reference);
        let schema = self.schema;

        if reference.table == table.name {
            if !self.state.pools.contains(&key) {
                return Err(GenerationError::SchemaConsistency(format!(
                    "self-referencing foreign key {}.{} must target the primary key of '{}'",
                    table.name, column.name, table.name
                )));
            }
        } else if let Some(referenced) = schema.table(&reference.table) {
            if referenced.column(&reference.column).is_none() {
                return Err(GenerationError::SchemaConsistency(format!(
                    "foreign key {}.{} references missing column '{reference}'",
                    table.name, column.name
                )));
            }
            if !self.completed.contains_key(&reference.table) {
                debug!(
                    table = %reference.table,
                    dependent = %table.name,
                    "materializing referenced table first"
                );
            }
            self.ensure_table(&reference.table)?;
            if !self.state.pools.contains(&key) && !self.derived.contains_key(&key) {
                let pool = self.distinct_column_values(reference);
                debug!(pool = %key, size = pool.len(), "pool derived from referenced column");
                self.derived.insert(key.clone(), pool);
            }
        } else if !self.state.pools.contains(&key) {
            return Err(GenerationError::SchemaConsistency(format!(
                "foreign key {}.{} references unknown table '{}'",
                table.name, column.name, reference.table
            )));
        }

        let pool = match self.state.pools.get(&key) {
            Some(pool) => pool,
            None => self.derived.get(&key).map_or(&[][..], Vec::as_slice),
        };
        if pool.is_empty() && target > 0 {
            return Ok(ColumnOutcome::Short { achieved: 0 });
        }
        Ok(ColumnOutcome::Ready(sample_with_replacement(
            pool,
            target,
            &mut *self.state.rng,
        )))
    }

    fn distinct_column_values(&self, reference: &ForeignKeyRef) -> Vec<GeneratedValue> {
        let Some(values) = self
            .completed
            .get(&reference.table)
            .and_then(|table| table.column(&reference.column))
        else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        values
            .iter()
            .filter(|value| !value.is_null() && seen.insert(*value))
            .cloned()
            .collect()
    }

    fn unique_values(
        &mut self,
        column: &Column,
        target: usize,
    ) -> Result<ColumnOutcome, GenerationError> {
        let kind = self.resolver.resolve(column)?;
        match generate_unique(&mut *self.provider, &kind, target, self.policy)? {
            UniqueOutcome::Complete(values) => Ok(ColumnOutcome::Ready(values)),
            UniqueOutcome::Exhausted { values, .. } => Ok(ColumnOutcome::Short {
                achieved: values.len(),
            }),
        }
    }

    fn regular_values(
        &mut self,
        column: &Column,
        target: usize,
        null_probability: f64,
    ) -> Result<Vec<GeneratedValue>, GenerationError> {
        let kind = self.resolver.resolve(column)?;
        let values = self.provider.produce(&kind, target, Some(null_probability))?;
        if values.len() != target {
            return Err(GenerationError::Provider(format!(
                "requested {target} values for column '{}', got {}",
                column.name,
                values.len()
            )));
        }
        Ok(values)
    }
}

fn sample_with_replacement<R: Rng + ?Sized>(
    pool: &[GeneratedValue],
    count: usize,
    rng: &mut R,
) -> Vec<GeneratedValue> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| pool[rng.random_range(0..pool.len())].clone())
        .collect()
}
