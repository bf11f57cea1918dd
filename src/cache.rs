//! Graph Cache: a byte-budgeted LRU of resident graphs (§4.3).
//!
//! Modeled after the teacher's page cache (`lru::LruCache` keyed by page
//! id): here the key is a graph's [`OrderKey`] and the budget is measured in
//! approximate edge-storage bytes rather than fixed-size pages, since edge
//! counts vary per graph.

use crate::tvg::{GraphHandle, OrderKey};
use lru::LruCache;
use std::rc::Rc;
use tracing::{debug, trace};

/// Rough per-edge storage cost used for budget accounting: two `u64` node
/// indices plus an `f32` weight.
const BYTES_PER_EDGE: usize = 2 * std::mem::size_of::<u64>() + std::mem::size_of::<f32>();
/// Flat per-graph overhead added to the edge count when sizing the budget.
const GRAPH_OVERHEAD_BYTES: usize = 64;

/// Internal reference holders of a resident graph handle: the TVG's
/// ordering map, plus this cache's own resident entry.
const INTERNAL_REFS_WHEN_RESIDENT: usize = 2;

pub struct GraphCache {
    resident: LruCache<OrderKey, GraphHandle>,
    budget_bytes: usize,
}

impl GraphCache {
    /// Creates a cache with the given byte budget. A budget of `0` keeps
    /// nothing resident beyond what callers pin.
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            resident: LruCache::unbounded(),
            budget_bytes,
        }
    }

    fn graph_bytes(handle: &GraphHandle) -> usize {
        GRAPH_OVERHEAD_BYTES + handle.borrow().num_edges() * BYTES_PER_EDGE
    }

    fn total_bytes(&self) -> usize {
        self.resident
            .iter()
            .map(|(_, h)| Self::graph_bytes(h))
            .sum()
    }

    /// True if `handle` is pinned: held by someone beyond this cache's own
    /// bookkeeping and the TVG's ordering entry (§5).
    fn is_pinned(handle: &GraphHandle) -> bool {
        Rc::strong_count(handle) > INTERNAL_REFS_WHEN_RESIDENT
    }

    /// Marks `key` as just-accessed, admitting `handle` into the resident
    /// set if it wasn't already, then evicts least-recently-used unpinned
    /// entries until the budget is satisfied.
    pub fn touch(&mut self, key: OrderKey, handle: GraphHandle) {
        self.resident.put(key, handle);
        self.evict_to_budget();
    }

    /// Drops `key` from the resident set without evicting its edges
    /// (used when a graph is unlinked from its TVG entirely).
    pub fn forget(&mut self, key: &OrderKey) {
        self.resident.pop(key);
    }

    fn evict_to_budget(&mut self) {
        while self.total_bytes() > self.budget_bytes {
            let victim = self
                .resident
                .iter()
                .rev()
                .find(|(_, h)| !Self::is_pinned(h))
                .map(|(k, _)| *k);
            match victim {
                Some(key) => {
                    if let Some(handle) = self.resident.pop(&key) {
                        trace!(edges = handle.borrow().num_edges(), "evicting graph");
                        handle.borrow_mut().evict();
                    }
                }
                None => {
                    debug!(
                        bytes = self.total_bytes(),
                        budget = self.budget_bytes,
                        "cache over budget but every resident graph is pinned"
                    );
                    break;
                }
            }
        }
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.total_bytes()
    }
}
