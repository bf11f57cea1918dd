//! Sparse graph: `(src, dst) → weight`, with the same revision/eps/positive
//! policy as [`crate::vector::SparseVector`], plus a `directed` flag that
//! governs whether `(a,b)` and `(b,a)` are distinct edges (§3, §4.2).

pub mod bfs;
pub mod power_iteration;

use crate::bucket_store::BucketStore;
use crate::error::{Result, TvgError};
use crate::flags::Flags;
use crate::object_id::ObjectId;
use crate::vector::{SparseVector, DEFAULT_EPS};
use std::cell::Cell;
use std::collections::HashSet;

pub use bfs::{bfs_hops, bfs_weighted, BfsControl, BfsVisit};
pub use power_iteration::{power_iteration, PowerIterationResult};

/// A sparse mapping from `(src, dst)` node-index pairs to `f32` weight.
///
/// `ts`/`objectid`/`seq` are populated once a graph is linked into a
/// [`crate::tvg::Tvg`] (§3); `evicted`/`load_next`/`load_prev` are
/// [`crate::cache::GraphCache`] bookkeeping and are meaningless on a graph
/// that was never linked.
#[derive(Clone, Debug)]
pub struct SparseGraph {
    store: BucketStore<(u64, u64)>,
    flags: Flags,
    eps: f32,
    revision: u64,
    cached_norm: Cell<Option<(u64, f64)>>,
    #[cfg(feature = "degree-cache")]
    cached_total_degree: std::cell::RefCell<Option<(u64, SparseVector)>>,
    pub(crate) ts: Option<i64>,
    pub(crate) objectid: ObjectId,
    pub(crate) seq: u64,
    pub(crate) evicted: bool,
    pub(crate) load_next: bool,
    pub(crate) load_prev: bool,
}

/// Normalizes an edge key so that undirected storage coalesces `(a,b)` and
/// `(b,a)` into the same bucket entry.
fn edge_key(directed: bool, a: u64, b: u64) -> (u64, u64) {
    if directed || a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SparseGraph {
    /// Creates an empty graph with the given policy flags (include
    /// [`Flags::DIRECTED`] for a directed graph).
    pub fn new(flags: Flags) -> Self {
        Self {
            store: BucketStore::new(),
            flags,
            eps: DEFAULT_EPS,
            revision: 0,
            cached_norm: Cell::new(None),
            #[cfg(feature = "degree-cache")]
            cached_total_degree: std::cell::RefCell::new(None),
            ts: None,
            objectid: ObjectId::None,
            seq: 0,
            evicted: false,
            load_next: false,
            load_prev: false,
        }
    }

    /// The timestamp this graph was linked at, if linked into a TVG.
    pub fn ts(&self) -> Option<i64> {
        self.ts
    }

    /// The document-store object id, if this graph was loaded from one.
    pub fn object_id(&self) -> ObjectId {
        self.objectid
    }

    /// True once `ts`/`objectid`/`seq` have been assigned by a TVG link.
    pub fn is_linked(&self) -> bool {
        self.ts.is_some()
    }

    /// True if this graph's edges were dropped by the Graph Cache and have
    /// not yet been re-materialised (§4.3). The header (`ts`, `objectid`,
    /// flags, revision) stays intact across eviction.
    pub fn is_evicted(&self) -> bool {
        self.evicted
    }

    /// True if chronologically later neighbors of this graph are not yet
    /// known to have been exhausted by a document-source fetch — crossing
    /// this boundary during iteration should trigger another batch fetch
    /// (§4.3).
    pub fn load_next(&self) -> bool {
        self.load_next
    }

    /// Symmetric to [`SparseGraph::load_next`], for the chronologically
    /// earlier direction.
    pub fn load_prev(&self) -> bool {
        self.load_prev
    }

    pub(crate) fn set_load_next(&mut self, v: bool) {
        self.load_next = v;
    }

    pub(crate) fn set_load_prev(&mut self, v: bool) {
        self.load_prev = v;
    }

    pub(crate) fn set_link(&mut self, ts: i64, objectid: ObjectId, seq: u64) {
        self.ts = Some(ts);
        self.objectid = objectid;
        self.seq = seq;
    }

    pub(crate) fn unlink(&mut self) {
        self.ts = None;
        self.objectid = ObjectId::None;
        self.seq = 0;
        self.load_next = false;
        self.load_prev = false;
    }

    /// Drops the edge map, keeping the header. Does not bump `revision`:
    /// eviction is cache bookkeeping, invisible to the Vector/Graph mutation
    /// contract, not an observable change to the graph's value.
    pub(crate) fn evict(&mut self) {
        self.store.clear();
        self.cached_norm.set(None);
        self.evicted = true;
    }

    /// Replaces the edge map with freshly fetched content and clears the
    /// evicted flag. Does not bump `revision` for the same reason as
    /// [`SparseGraph::evict`].
    pub(crate) fn rematerialize(&mut self, edges: BucketStore<(u64, u64)>) {
        self.store = edges;
        self.cached_norm.set(None);
        self.evicted = false;
    }

    pub(crate) fn bucket_store(&self) -> &BucketStore<(u64, u64)> {
        &self.store
    }

    /// True if `(a,b)` and `(b,a)` are distinct edges.
    pub fn is_directed(&self) -> bool {
        self.flags.contains(Flags::DIRECTED)
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub fn set_eps(&mut self, eps: f32) {
        self.eps = eps;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn num_edges(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
        self.cached_norm.set(None);
    }

    fn key(&self, src: u64, dst: u64) -> (u64, u64) {
        edge_key(self.is_directed(), src, dst)
    }

    /// Reads the weight of edge `(src, dst)`, or `0.0` if absent.
    pub fn get(&self, src: u64, dst: u64) -> f32 {
        self.store.get(&self.key(src, dst)).unwrap_or(0.0)
    }

    /// True if edge `(src, dst)` has a stored entry.
    pub fn has_edge(&self, src: u64, dst: u64) -> bool {
        self.store.contains(&self.key(src, dst))
    }

    fn apply(&mut self, key: (u64, u64), weight: f32) {
        match self.flags.keep(weight, self.eps) {
            Some(w) => {
                self.store.put(key, w);
            }
            None => {
                self.store.remove(&key);
            }
        }
    }

    /// Overwrites the weight of edge `(src, dst)`.
    pub fn set(&mut self, src: u64, dst: u64, weight: f32) {
        let key = self.key(src, dst);
        self.apply(key, weight);
        self.bump_revision();
    }

    /// Adds `delta` to the current weight of edge `(src, dst)`.
    pub fn add(&mut self, src: u64, dst: u64, delta: f32) {
        let new_weight = self.get(src, dst) + delta;
        self.set(src, dst, new_weight);
    }

    /// Subtracts `delta` from the current weight of edge `(src, dst)`.
    pub fn sub(&mut self, src: u64, dst: u64, delta: f32) {
        self.add(src, dst, -delta);
    }

    /// Removes edge `(src, dst)`, if present.
    pub fn del_edge(&mut self, src: u64, dst: u64) {
        let key = self.key(src, dst);
        self.store.remove(&key);
        self.bump_revision();
    }

    /// Removes every edge touching `node`, either as source or destination.
    pub fn del_node(&mut self, node: u64) {
        let doomed: Vec<(u64, u64)> = self
            .store
            .iter_sorted()
            .map(|(k, _)| k)
            .filter(|(a, b)| *a == node || *b == node)
            .collect();
        for k in doomed {
            self.store.remove(&k);
        }
        self.bump_revision();
    }

    /// Edges in ascending `(src, dst)` key order. For an undirected graph
    /// each stored entry is yielded once, with `src <= dst`.
    pub fn edges(&self) -> impl Iterator<Item = (u64, u64, f32)> + '_ {
        self.store.iter_sorted().map(|((a, b), w)| (a, b, w))
    }

    /// Edges touching `node`. For a directed graph this yields only
    /// out-edges (`src == node`); use [`SparseGraph::adjacent_edges`] for
    /// the undirected case, where every edge touches `node` either way.
    pub fn out_edges(&self, node: u64) -> impl Iterator<Item = (u64, f32)> + '_ {
        self.edges()
            .filter(move |(a, _, _)| *a == node)
            .map(|(_, b, w)| (b, w))
    }

    /// Edges touching `node` in the sense a traversal should expand through:
    /// for a directed graph, out-edges only (`src == node`); for an
    /// undirected graph, every edge touching `node` either way, since
    /// undirected storage already coalesces `(a,b)`/`(b,a)` into one entry.
    pub fn adjacent_edges(&self, node: u64) -> Vec<(u64, f32)> {
        if self.is_directed() {
            self.out_edges(node).collect()
        } else {
            self.edges()
                .filter(|(a, b, _)| *a == node || *b == node)
                .map(|(a, b, w)| if a == node { (b, w) } else { (a, w) })
                .collect()
        }
    }

    /// Distinct node indices touched by at least one edge, ascending.
    pub fn nodes(&self) -> Vec<u64> {
        let mut set = HashSet::new();
        for (a, b, _) in self.edges() {
            set.insert(a);
            set.insert(b);
        }
        let mut out: Vec<u64> = set.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Weighted out-degree (row sum) as a dense-keyed sparse vector.
    pub fn out_weight(&self) -> SparseVector {
        let mut v = SparseVector::new(Flags::empty());
        for (a, _, w) in self.edges() {
            v.add(a, w);
        }
        if !self.is_directed() {
            // Undirected storage keeps a<=b once; attribute the same weight
            // to the other endpoint too, except self-loops.
            for (a, b, w) in self.edges() {
                if a != b {
                    v.add(b, w);
                }
            }
        }
        v
    }

    /// Weighted in-degree (column sum). Equal to [`SparseGraph::out_weight`]
    /// for an undirected graph.
    pub fn in_weight(&self) -> SparseVector {
        if !self.is_directed() {
            return self.out_weight();
        }
        let mut v = SparseVector::new(Flags::empty());
        for (_, b, w) in self.edges() {
            v.add(b, w);
        }
        v
    }

    /// Unweighted out-degree (edge count per source node).
    pub fn out_degree(&self) -> SparseVector {
        let mut v = SparseVector::new(Flags::empty());
        for (a, _, _) in self.edges() {
            v.add(a, 1.0);
        }
        if !self.is_directed() {
            for (a, b, _) in self.edges() {
                if a != b {
                    v.add(b, 1.0);
                }
            }
        }
        v
    }

    /// Unweighted in-degree. Equal to [`SparseGraph::out_degree`] for an
    /// undirected graph.
    pub fn in_degree(&self) -> SparseVector {
        if !self.is_directed() {
            return self.out_degree();
        }
        let mut v = SparseVector::new(Flags::empty());
        for (_, b, _) in self.edges() {
            v.add(b, 1.0);
        }
        v
    }

    /// Returns a new graph containing exactly the edges with at least one
    /// endpoint satisfying `keep`.
    pub fn filter_nodes(&self, mut keep: impl FnMut(u64) -> bool) -> SparseGraph {
        let mut out = SparseGraph::new(self.flags);
        out.eps = self.eps;
        for (a, b, w) in self.edges() {
            if keep(a) || keep(b) {
                out.set(a, b, w);
            }
        }
        out
    }

    /// Matrix-vector product `self * x`, treating absent entries as zero.
    /// Row `i` of the product sums `weight(i, j) * x[j]` over stored edges.
    pub fn mul_vector(&self, x: &SparseVector) -> SparseVector {
        let mut out = SparseVector::new(Flags::empty());
        for (a, b, w) in self.edges() {
            let xb = x.get(b);
            if xb != 0.0 {
                out.add(a, w * xb);
            }
            if !self.is_directed() && a != b {
                let xa = x.get(a);
                if xa != 0.0 {
                    out.add(b, w * xa);
                }
            }
        }
        out
    }

    /// In-place scaled accumulation: `self += scale * other`. Fails if the
    /// two graphs don't share directedness.
    pub fn add_graph(&mut self, other: &SparseGraph, scale: f32) -> Result<()> {
        if self.is_directed() != other.is_directed() {
            return Err(TvgError::InvalidArgument(
                "cannot combine graphs with different directedness".into(),
            ));
        }
        for (a, b, w) in other.edges() {
            self.add(a, b, w * scale);
        }
        Ok(())
    }

    /// In-place scaled subtraction: `self -= scale * other`. Fails if the
    /// two graphs don't share directedness.
    pub fn sub_graph(&mut self, other: &SparseGraph, scale: f32) -> Result<()> {
        self.add_graph(other, -scale)
    }

    /// Scales every edge weight by `c` in place.
    pub fn mul_const(&mut self, c: f32) {
        let edges: Vec<((u64, u64), f32)> = self.store.iter_sorted().collect();
        for (k, w) in edges {
            self.apply(k, w * c);
        }
        self.bump_revision();
    }

    /// Frobenius norm of the edge-weight matrix.
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

    /// Per-node anomaly: for each node `i`, the signed difference between
    /// its own value (from `values`) and the mean of its adjacent nodes'
    /// values, divided by the standard deviation of those neighbor values.
    /// Zero-variance (or neighborless) nodes yield `0.0`.
    fn neighbor_zscore(&self, values: &SparseVector) -> SparseVector {
        let mut out = SparseVector::new(Flags::empty());
        for node in self.nodes() {
            let neighbor_values: Vec<f64> = self
                .adjacent_edges(node)
                .into_iter()
                .map(|(n, _)| values.get(n) as f64)
                .collect();
            if neighbor_values.is_empty() {
                continue;
            }
            let mean = neighbor_values.iter().sum::<f64>() / neighbor_values.len() as f64;
            let variance = neighbor_values
                .iter()
                .map(|v| {
                    let d = v - mean;
                    d * d
                })
                .sum::<f64>()
                / neighbor_values.len() as f64;
            let std = variance.sqrt();
            if std == 0.0 {
                continue;
            }
            let z = ((values.get(node) as f64 - mean) / std) as f32;
            out.set(node, z);
        }
        out
    }

    /// Total (in + out) unweighted degree as a Vector.
    ///
    /// With the `degree-cache` feature enabled, memoises the result per
    /// `revision` rather than rescanning every edge on each call — matching
    /// the teacher's optional precomputed degree structure
    /// (`storage/graph/mod.rs`'s `degree_cache_enabled` table), gated the
    /// same way so a caller who never enables it pays nothing for it.
    pub fn total_degree(&self) -> SparseVector {
        #[cfg(feature = "degree-cache")]
        {
            if let Some((rev, v)) = self.cached_total_degree.borrow().as_ref() {
                if *rev == self.revision {
                    return v.clone();
                }
            }
        }
        let v = self.compute_total_degree();
        #[cfg(feature = "degree-cache")]
        {
            *self.cached_total_degree.borrow_mut() = Some((self.revision, v.clone()));
        }
        v
    }

    fn compute_total_degree(&self) -> SparseVector {
        if !self.is_directed() {
            return self.out_degree();
        }
        let mut v = self.out_degree();
        for (n, w) in self.in_degree().entries() {
            v.add(n, w);
        }
        v
    }

    /// Total (in + out) weighted degree as a Vector.
    pub fn total_weight(&self) -> SparseVector {
        if !self.is_directed() {
            return self.out_weight();
        }
        let mut v = self.out_weight();
        for (n, w) in self.in_weight().entries() {
            v.add(n, w);
        }
        v
    }

    /// Per-node degree anomaly against the node's neighbors (§4.1).
    pub fn degree_anomaly(&self) -> SparseVector {
        self.neighbor_zscore(&self.total_degree())
    }

    /// Per-node weight anomaly against the node's neighbors (§4.1).
    pub fn weight_anomaly(&self) -> SparseVector {
        self.neighbor_zscore(&self.total_weight())
    }
}
