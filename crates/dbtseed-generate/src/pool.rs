use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use dbtseed_core::ForeignKeyRef;

use crate::errors::GenerationError;
use crate::model::GenerateOptions;
use crate::provider::{ValueKind, ValueProvider};
use crate::value::GeneratedValue;

/// Pool identifier, `"<table>.<column>"`.
///
/// A primary key pool and a foreign key reference to it share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolKey(String);

impl PoolKey {
    pub fn for_column(table: &str, column: &str) -> Self {
        Self(format!("{table}.{column}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ForeignKeyRef> for PoolKey {
    fn from(reference: &ForeignKeyRef) -> Self {
        Self::for_column(&reference.table, &reference.column)
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Knobs of the bounded unique-value search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniquePolicy {
    pub oversample_factor: usize,
    pub max_stall_rounds: u32,
}

impl Default for UniquePolicy {
    fn default() -> Self {
        Self {
            oversample_factor: 2,
            max_stall_rounds: 3,
        }
    }
}

impl From<&GenerateOptions> for UniquePolicy {
    fn from(options: &GenerateOptions) -> Self {
        Self {
            oversample_factor: options.oversample_factor,
            max_stall_rounds: options.max_stall_rounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniqueOutcome {
    /// Exactly the requested number of distinct values.
    Complete(Vec<GeneratedValue>),
    /// The value space ran dry; every distinct value found so far.
    Exhausted {
        values: Vec<GeneratedValue>,
        requested: usize,
    },
}

impl UniqueOutcome {
    pub fn values(&self) -> &[GeneratedValue] {
        match self {
            UniqueOutcome::Complete(values) | UniqueOutcome::Exhausted { values, .. } => values,
        }
    }

    pub fn into_values(self) -> Vec<GeneratedValue> {
        match self {
            UniqueOutcome::Complete(values) | UniqueOutcome::Exhausted { values, .. } => values,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, UniqueOutcome::Exhausted { .. })
    }
}

/// Collect `target` mutually distinct values from `provider`.
///
/// Each round asks for `oversample_factor * target` candidates. A round that
/// adds nothing new counts as a stall; `max_stall_rounds` consecutive stalls
/// end the search as exhausted. Nulls are never admitted.
pub fn generate_unique<P: ValueProvider + ?Sized>(
    provider: &mut P,
    kind: &ValueKind,
    target: usize,
    policy: UniquePolicy,
) -> Result<UniqueOutcome, GenerationError> {
    if target == 0 {
        return Ok(UniqueOutcome::Complete(Vec::new()));
    }

    let batch = target.saturating_mul(policy.oversample_factor.max(1));
    let mut seen: HashSet<GeneratedValue> = HashSet::with_capacity(target);
    let mut ordered: Vec<GeneratedValue> = Vec::with_capacity(target);
    let mut stalls = 0_u32;
    let mut rounds = 0_u32;

    loop {
        rounds += 1;
        let before = ordered.len();
        for value in provider.produce(kind, batch, None)? {
            if value.is_null() || seen.contains(&value) {
                continue;
            }
            seen.insert(value.clone());
            ordered.push(value);
        }

        if ordered.len() >= target {
            ordered.truncate(target);
            debug!(?kind, target, rounds, "unique values complete");
            return Ok(UniqueOutcome::Complete(ordered));
        }

        if ordered.len() > before {
            stalls = 0;
        } else {
            stalls += 1;
            if stalls >= policy.max_stall_rounds {
                debug!(
                    ?kind,
                    target,
                    achieved = ordered.len(),
                    rounds,
                    "unique value space exhausted"
                );
                return Ok(UniqueOutcome::Exhausted {
                    values: ordered,
                    requested: target,
                });
            }
        }
    }
}

/// Result of [`PoolStore::get_or_generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// The pool already existed; the provider was not called.
    Cached,
    Generated,
    /// A new pool was stored with fewer values than requested.
    Exhausted { achieved: usize },
}

/// Memoized unique value pools for one engine instance.
///
/// A key is written once. After that the only mutation is truncation to a
/// prefix.
#[derive(Debug, Clone, Default)]
pub struct PoolStore {
    pools: HashMap<PoolKey, Vec<GeneratedValue>>,
    generated: usize,
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PoolKey) -> Option<&[GeneratedValue]> {
        self.pools.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &PoolKey) -> bool {
        self.pools.contains_key(key)
    }

    /// Store a pool unless the key is already taken. Returns whether the
    /// values were stored.
    pub fn insert(&mut self, key: PoolKey, values: Vec<GeneratedValue>) -> bool {
        if self.pools.contains_key(&key) {
            return false;
        }
        self.pools.insert(key, values);
        true
    }

    pub fn truncate(&mut self, key: &PoolKey, len: usize) {
        if let Some(values) = self.pools.get_mut(key) {
            if values.len() > len {
                debug!(pool = %key, from = values.len(), to = len, "pool truncated");
                values.truncate(len);
            }
        }
    }

    /// Return the cached pool for `key`, or search for `target` unique
    /// values and store whatever was found.
    pub fn get_or_generate<P: ValueProvider + ?Sized>(
        &mut self,
        key: &PoolKey,
        provider: &mut P,
        kind: &ValueKind,
        target: usize,
        policy: UniquePolicy,
    ) -> Result<PoolStatus, GenerationError> {
        if let Some(values) = self.pools.get(key) {
            debug!(pool = %key, size = values.len(), "pool cache hit");
            return Ok(PoolStatus::Cached);
        }

        let outcome = generate_unique(provider, kind, target, policy)?;
        let status = match &outcome {
            UniqueOutcome::Complete(_) => PoolStatus::Generated,
            UniqueOutcome::Exhausted { values, .. } => PoolStatus::Exhausted {
                achieved: values.len(),
            },
        };
        let values = outcome.into_values();
        debug!(pool = %key, size = values.len(), target, "pool generated");
        self.pools.insert(key.clone(), values);
        self.generated += 1;
        Ok(status)
    }

    /// Number of pools produced through [`get_or_generate`](Self::get_or_generate).
    pub fn generated_count(&self) -> usize {
        self.generated
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PoolKey> {
        self.pools.keys()
    }
}
