//! Query Cache: a byte-budgeted LRU keyed by operation fingerprint, holding
//! previously computed aggregates so repeat queries skip recomputation
//! (§4.6). Modeled after the teacher's `GraphIndexCache`
//! (`storage/index/cache.rs`): a `get_or_compute` entry point wrapping an
//! `lru::LruCache`, with hit/miss counters.

use crate::value::Value;
use lru::LruCache;
use std::rc::Rc;
use tracing::trace;

/// The operation kind half of a [`Fingerprint`]. Extensible by host code
/// via the `Other` variant without needing a crate release for every new
/// analysis the caller builds on top of Graph Algorithms.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    RectSum,
    ExpDecaySum,
    EdgeCount,
    NodeCount,
    PowerIteration,
    Bfs,
    Other(&'static str),
}

/// `(op_kind, ts_min, ts_max, params)` — the tuple that keys the Query
/// Cache (§4.6, §9: uniform across Vector and Graph results). Float
/// parameters are keyed by bit pattern so the fingerprint can derive `Eq`
/// and `Hash` without a partial-order wrapper type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    op_kind: OpKind,
    ts_min: i64,
    ts_max: i64,
    params: Vec<u64>,
}

impl Fingerprint {
    pub fn new(
        op_kind: OpKind,
        ts_min: i64,
        ts_max: i64,
        params: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            op_kind,
            ts_min,
            ts_max,
            params: params.into_iter().map(f64::to_bits).collect(),
        }
    }
}

/// Hit/miss counters, mirroring the teacher's `GraphIndexCacheStats`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueryCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Bounded-by-bytes LRU from [`Fingerprint`] to a previously computed
/// [`Value`] (§4.6). The cached value is returned by `Rc` and is immutable
/// from the cache's perspective; a caller that mutates the pointee leaves
/// the cache holding the mutated value, which is the caller's
/// responsibility per §4.6.
pub struct QueryCache {
    resident: LruCache<Fingerprint, Rc<Value>>,
    budget_bytes: usize,
    stats: QueryCacheStats,
}

impl QueryCache {
    /// Creates a cache with the given byte budget.
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            resident: LruCache::unbounded(),
            budget_bytes,
            stats: QueryCacheStats::default(),
        }
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.total_bytes()
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Snapshots and resets the hit/miss counters.
    pub fn take_stats(&mut self) -> QueryCacheStats {
        std::mem::take(&mut self.stats)
    }

    fn total_bytes(&self) -> usize {
        self.resident.iter().map(|(_, v)| v.memory_bytes()).sum()
    }

    /// Returns the cached result for `fingerprint`, computing and storing
    /// it via `compute` on a miss. On insert, evicts least-recently-used
    /// entries until the byte budget is met.
    pub fn get_or_compute(
        &mut self,
        fingerprint: Fingerprint,
        compute: impl FnOnce() -> Value,
    ) -> Rc<Value> {
        if let Some(hit) = self.resident.get(&fingerprint) {
            self.stats.hits += 1;
            return hit.clone();
        }
        self.stats.misses += 1;
        let value = Rc::new(compute());
        self.resident.put(fingerprint, value.clone());
        self.evict_to_budget();
        value
    }

    /// Drops every cached entry without affecting the hit/miss counters.
    pub fn clear(&mut self) {
        self.resident.clear();
    }

    fn evict_to_budget(&mut self) {
        while self.total_bytes() > self.budget_bytes {
            match self.resident.pop_lru() {
                Some((fp, _)) => trace!(op = ?fp, "evicting query cache entry"),
                None => break,
            }
        }
    }
}
