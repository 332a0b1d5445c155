use std::collections::HashSet;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use dbtseed_core::Schema;

use crate::errors::GenerationError;
use crate::faker_rs::FakeValueProvider;
use crate::materialize::{Materializer, RunState};
use crate::model::{GenerateOptions, GenerationOutput, GenerationReport, validate_row_bounds};
use crate::planner::RowCountPlan;
use crate::pool::{PoolKey, PoolStore};
use crate::provider::{KindResolver, ValueProvider};
use crate::value::GeneratedValue;

/// Entry point for generating tables from a schema.
///
/// An engine instance owns the row count plan, the memoized key pools and
/// the random state. Repeated [`generate`](Self::generate) calls reuse the
/// plan and the pools, so keys stay stable across calls.
#[derive(Debug)]
pub struct GenerationEngine<P = FakeValueProvider> {
    schema: Schema,
    options: GenerateOptions,
    resolver: KindResolver,
    provider: P,
    plan: Option<RowCountPlan>,
    pools: PoolStore,
    rng: ChaCha8Rng,
}

impl GenerationEngine<FakeValueProvider> {
    /// Build an engine backed by [`FakeValueProvider`].
    pub fn new(schema: Schema, options: GenerateOptions) -> Result<Self, GenerationError> {
        options.validate()?;
        let provider = FakeValueProvider::new(
            &options.locale,
            options.seed.map(|seed| hash_seed(seed, "values")),
        )?;
        Self::with_provider(schema, options, provider)
    }
}

impl<P: ValueProvider> GenerationEngine<P> {
    pub fn with_provider(
        schema: Schema,
        options: GenerateOptions,
        provider: P,
    ) -> Result<Self, GenerationError> {
        options.validate()?;
        let resolver = KindResolver::new(&options.data_type_mapping, &options.field_aliases)?;
        let seed = match options.seed {
            Some(seed) => hash_seed(seed, "engine"),
            None => rand::rng().random(),
        };
        Ok(Self {
            schema,
            options,
            resolver,
            provider,
            plan: None,
            pools: PoolStore::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Generate every table of the schema.
    ///
    /// The row count plan is drawn from `[min_rows, max_rows]` on the first
    /// call only; later calls keep it until [`reset_plan`](Self::reset_plan).
    pub fn generate(
        &mut self,
        min_rows: usize,
        max_rows: usize,
    ) -> Result<GenerationOutput, GenerationError> {
        validate_row_bounds(min_rows, max_rows)?;
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => {
                let plan = RowCountPlan::draw(&self.schema, min_rows, max_rows, &mut self.rng)?;
                info!(
                    tables = self.schema.models.len(),
                    min_rows, max_rows, "row counts planned"
                );
                plan
            }
        };
        let plan = self.plan.insert(plan);

        info!(
            run_id = %run_id,
            tables = self.schema.models.len(),
            seed = ?self.options.seed,
            "generation started"
        );

        let mut report = GenerationReport::new(run_id.clone());
        let pools_before = self.pools.generated_count();
        let state = RunState {
            plan,
            pools: &mut self.pools,
            rng: &mut self.rng,
            report: &mut report,
        };
        let materializer = Materializer::new(
            &self.schema,
            &self.options,
            &self.resolver,
            &mut self.provider,
            state,
        );
        let tables = match materializer.run() {
            Ok(tables) => tables,
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "generation failed");
                return Err(err);
            }
        };
        report.pools_generated = self.pools.generated_count() - pools_before;

        info!(
            run_id = %run_id,
            tables = tables.len(),
            rows = report.rows_total(),
            pools_generated = report.pools_generated,
            degradations = report.degradations.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );
        Ok(GenerationOutput { tables, report })
    }

    /// [`generate`](Self::generate) with the bounds from the options.
    pub fn run(&mut self) -> Result<GenerationOutput, GenerationError> {
        self.generate(self.options.min_rows, self.options.max_rows)
    }

    /// Seed a key pool from outside the schema, e.g. keys of a table that
    /// already exists. Returns `false` when the key already has a pool.
    pub fn preload_pool(
        &mut self,
        key: PoolKey,
        values: Vec<GeneratedValue>,
    ) -> Result<bool, GenerationError> {
        let mut seen = HashSet::with_capacity(values.len());
        if values
            .iter()
            .any(|value| value.is_null() || !seen.insert(value))
        {
            return Err(GenerationError::Configuration(format!(
                "preloaded pool '{key}' must hold distinct non-null values"
            )));
        }
        Ok(self.pools.insert(key, values))
    }

    /// Drop the row count plan; the next call draws a new one.
    pub fn reset_plan(&mut self) {
        self.plan = None;
    }

    /// Drop the plan and every memoized pool.
    pub fn reset(&mut self) {
        self.plan = None;
        self.pools = PoolStore::new();
    }

    pub fn plan(&self) -> Option<&RowCountPlan> {
        self.plan.as_ref()
    }

    pub fn pools(&self) -> &PoolStore {
        &self.pools
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
