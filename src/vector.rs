//! Sparse vector: index → weight, with revision tracking and a zero/positive
//! entry policy (§3, §4.1).

use crate::bucket_store::BucketStore;
use crate::error::{Result, TvgError};
use crate::flags::Flags;
use std::cell::Cell;

/// Default epsilon below which a weight is treated as zero under `NONZERO`.
pub const DEFAULT_EPS: f32 = 1e-6;

/// A sparse mapping from `u64` index to `f32` weight.
///
/// Absent entries read as zero. See [`Flags`] for the `nonzero`/`positive`
/// policy enforced after every mutation, and module docs for the revision
/// counter used to invalidate derived caches.
#[derive(Clone, Debug)]
pub struct SparseVector {
    store: BucketStore<u64>,
    flags: Flags,
    eps: f32,
    revision: u64,
    cached_norm: Cell<Option<(u64, f64)>>,
}

impl SparseVector {
    /// Creates an empty vector with the given policy flags.
    pub fn new(flags: Flags) -> Self {
        Self {
            store: BucketStore::new(),
            flags,
            eps: DEFAULT_EPS,
            revision: 0,
            cached_norm: Cell::new(None),
        }
    }

    /// The policy flags this vector enforces.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The current epsilon used by the `nonzero` policy.
    pub fn eps(&self) -> f32 {
        self.eps
    }

    /// Sets the epsilon used by the `nonzero` policy. Does not retroactively
    /// re-check existing entries (matching the C `libtvg` behavior this
    /// engine is modeled on: `eps` governs future mutations).
    pub fn set_eps(&mut self, eps: f32) {
        self.eps = eps;
    }

    /// The monotonic revision counter, bumped by every mutating call.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of stored entries (not the mathematical dimension).
    pub fn num_entries(&self) -> usize {
        self.store.len()
    }

    /// True if there are no stored entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
        self.cached_norm.set(None);
    }

    /// Reads the weight at `index`, or `0.0` if absent.
    pub fn get(&self, index: u64) -> f32 {
        self.store.get(&index).unwrap_or(0.0)
    }

    /// True if `index` has a stored entry (distinguishes "present with value
    /// zero" from "absent" when `nonzero` is not set).
    pub fn has(&self, index: u64) -> bool {
        self.store.contains(&index)
    }

    /// Overwrites the weight at `index`, applying the zero/positive policy.
    pub fn set(&mut self, index: u64, weight: f32) {
        self.apply(index, weight);
        self.bump_revision();
    }

    /// Adds `delta` to the current weight at `index` (0 if absent).
    pub fn add(&mut self, index: u64, delta: f32) {
        let new_weight = self.get(index) + delta;
        self.apply(index, new_weight);
        self.bump_revision();
    }

    /// Subtracts `delta` from the current weight at `index`.
    pub fn sub(&mut self, index: u64, delta: f32) {
        self.add(index, -delta);
    }

    /// Removes the entry at `index`, if present.
    pub fn del(&mut self, index: u64) {
        self.store.remove(&index);
        self.bump_revision();
    }

    fn apply(&mut self, index: u64, weight: f32) {
        match self.flags.keep(weight, self.eps) {
            Some(w) => {
                self.store.put(index, w);
            }
            None => {
                self.store.remove(&index);
            }
        }
    }

    fn check_parallel_lens(indices: &[u64], weights: &[f32]) -> Result<()> {
        if indices.len() != weights.len() {
            return Err(TvgError::InvalidArgument(format!(
                "parallel arrays have different lengths: {} indices vs {} weights",
                indices.len(),
                weights.len()
            )));
        }
        Ok(())
    }

    /// Bulk overwrite. `weights` defaults to all-`1.0` when `None`.
    pub fn set_many(&mut self, indices: &[u64], weights: Option<&[f32]>) -> Result<()> {
        self.bulk(indices, weights, |v, i, w| v.set(i, w))
    }

    /// Bulk add. `weights` defaults to all-`1.0` when `None`.
    pub fn add_many(&mut self, indices: &[u64], weights: Option<&[f32]>) -> Result<()> {
        self.bulk(indices, weights, |v, i, w| v.add(i, w))
    }

    /// Bulk subtract. `weights` defaults to all-`1.0` when `None`.
    pub fn sub_many(&mut self, indices: &[u64], weights: Option<&[f32]>) -> Result<()> {
        self.bulk(indices, weights, |v, i, w| v.sub(i, w))
    }

    /// Bulk delete; `indices` need not have matching weights.
    pub fn del_many(&mut self, indices: &[u64]) {
        for &i in indices {
            self.del(i);
        }
    }

    fn bulk(
        &mut self,
        indices: &[u64],
        weights: Option<&[f32]>,
        op: impl Fn(&mut Self, u64, f32),
    ) -> Result<()> {
        if let Some(ws) = weights {
            Self::check_parallel_lens(indices, ws)?;
            for (&i, &w) in indices.iter().zip(ws.iter()) {
                op(self, i, w);
            }
        } else {
            for &i in indices {
                op(self, i, 1.0);
            }
        }
        Ok(())
    }

    /// Scales every entry by `c` in place; entries that fall below `eps` or
    /// become negative under the active policy are removed atomically as
    /// part of the scale.
    pub fn mul_const(&mut self, c: f32) {
        let entries: Vec<(u64, f32)> = self.store.iter_sorted().collect();
        for (k, w) in entries {
            self.apply(k, w * c);
        }
        self.bump_revision();
    }

    /// Entries in ascending index order.
    pub fn entries(&self) -> impl Iterator<Item = (u64, f32)> + '_ {
        self.store.iter_sorted()
    }

    /// Euclidean norm, memoised per-revision.
    pub fn norm(&self) -> f64 {
        if let Some((rev, n)) = self.cached_norm.get() {
            if rev == self.revision {
                return n;
            }
        }
        let sum_sq: f64 = self
            .store
            .iter_sorted()
            .map(|(_, w)| (w as f64) * (w as f64))
            .sum();
        let n = sum_sq.sqrt();
        self.cached_norm.set(Some((self.revision, n)));
        n
    }

    /// Dot product with `other`, using a 64-bit accumulator over the sparse
    /// intersection of both vectors' entries.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.num_entries() <= other.num_entries() {
            (self, other)
        } else {
            (other, self)
        };
        let mut acc = 0.0f64;
        for (k, w) in small.entries() {
            let ow = large.get(k);
            if ow != 0.0 {
                acc += (w as f64) * (ow as f64);
            }
        }
        acc
    }

    /// `‖self − other‖₂` without materialising the difference vector.
    pub fn sub_norm(&self, other: &SparseVector) -> f64 {
        let mut seen = std::collections::HashSet::new();
        let mut sum_sq = 0.0f64;
        for (k, w) in self.entries() {
            seen.insert(k);
            let diff = (w as f64) - (other.get(k) as f64);
            sum_sq += diff * diff;
        }
        for (k, w) in other.entries() {
            if seen.contains(&k) {
                continue;
            }
            let diff = w as f64;
            sum_sq += diff * diff;
        }
        sum_sq.sqrt()
    }
}
