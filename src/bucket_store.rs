//! Generic hash-bucketed sparse key→weight store shared by [`crate::vector::SparseVector`]
//! and [`crate::graph::SparseGraph`].
//!
//! Keys are distributed across a power-of-two number of buckets by a fast
//! non-cryptographic hash (`rustc-hash`); within a bucket, entries are kept
//! sorted by key so that [`BucketStore::iter_sorted`] can merge the buckets
//! without a full re-sort, and so that a single-bucket scan can use binary
//! search. Growth is geometric: the bucket count doubles once the average
//! bucket length exceeds [`LOAD_FACTOR`], and every surviving entry is
//! reinserted in sorted order.

use std::hash::{Hash, Hasher};
use std::collections::BinaryHeap;
use std::cmp::Reverse;

use rustc_hash::FxHasher;

const INITIAL_BUCKETS: usize = 8;
const LOAD_FACTOR: usize = 8;

fn hash_key<K: Hash>(key: &K) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[derive(Clone, Debug)]
pub(crate) struct BucketStore<K> {
    buckets: Vec<Vec<(K, f32)>>,
    len: usize,
}

impl<K: Ord + Copy + Hash> Default for BucketStore<K> {
    fn default() -> Self {
        Self {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }
}

impl<K: Ord + Copy + Hash> BucketStore<K> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_index(&self, key: &K) -> usize {
        (hash_key(key) as usize) & (self.buckets.len() - 1)
    }

    pub(crate) fn get(&self, key: &K) -> Option<f32> {
        let bucket = &self.buckets[self.bucket_index(key)];
        bucket
            .binary_search_by_key(key, |(k, _)| *k)
            .ok()
            .map(|idx| bucket[idx].1)
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        let bucket = &self.buckets[self.bucket_index(key)];
        bucket.binary_search_by_key(key, |(k, _)| *k).is_ok()
    }

    /// Inserts or overwrites `key` with `weight`, returning the previous weight if present.
    pub(crate) fn put(&mut self, key: K, weight: f32) -> Option<f32> {
        let idx = self.bucket_index(&key);
        let bucket = &mut self.buckets[idx];
        match bucket.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(pos) => {
                let prev = bucket[pos].1;
                bucket[pos].1 = weight;
                Some(prev)
            }
            Err(pos) => {
                bucket.insert(pos, (key, weight));
                self.len += 1;
                self.maybe_grow();
                None
            }
        }
    }

    /// Removes `key`, returning its weight if it was present.
    pub(crate) fn remove(&mut self, key: &K) -> Option<f32> {
        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        match bucket.binary_search_by_key(key, |(k, _)| *k) {
            Ok(pos) => {
                let (_, w) = bucket.remove(pos);
                self.len -= 1;
                Some(w)
            }
            Err(_) => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    fn maybe_grow(&mut self) {
        if self.len <= self.buckets.len() * LOAD_FACTOR {
            return;
        }
        let new_count = self.buckets.len() * 2;
        let mut new_buckets: Vec<Vec<(K, f32)>> = (0..new_count).map(|_| Vec::new()).collect();
        for bucket in self.buckets.drain(..) {
            for (k, w) in bucket {
                let idx = (hash_key(&k) as usize) & (new_count - 1);
                let dst = &mut new_buckets[idx];
                let pos = dst.partition_point(|(existing, _)| *existing < k);
                dst.insert(pos, (k, w));
            }
        }
        self.buckets = new_buckets;
    }

    /// Enumerates all entries in ascending key order via a k-way merge of the
    /// (already sorted) buckets — no full re-sort of the whole store.
    pub(crate) fn iter_sorted(&self) -> impl Iterator<Item = (K, f32)> + '_ {
        let mut heap: BinaryHeap<Reverse<(K, usize, usize)>> = BinaryHeap::new();
        for (bi, bucket) in self.buckets.iter().enumerate() {
            if !bucket.is_empty() {
                heap.push(Reverse((bucket[0].0, bi, 0)));
            }
        }
        MergeIter {
            buckets: &self.buckets,
            heap,
        }
    }
}

struct MergeIter<'a, K> {
    buckets: &'a [Vec<(K, f32)>],
    heap: BinaryHeap<Reverse<(K, usize, usize)>>,
}

impl<'a, K: Ord + Copy> Iterator for MergeIter<'a, K> {
    type Item = (K, f32);

    fn next(&mut self) -> Option<Self::Item> {
        let Reverse((key, bucket_idx, pos)) = self.heap.pop()?;
        let bucket = &self.buckets[bucket_idx];
        let weight = bucket[pos].1;
        if pos + 1 < bucket.len() {
            self.heap
                .push(Reverse((bucket[pos + 1].0, bucket_idx, pos + 1)));
        }
        Some((key, weight))
    }
}
