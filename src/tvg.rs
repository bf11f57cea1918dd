//! TVG Store: an ordered collection of timestamped, linked [`SparseGraph`]
//! values with forward/backward lookup, compression, and primary-key
//! resolution (§4.2).

use crate::error::{Result, TvgError};
use crate::flags::Flags;
use crate::graph::SparseGraph;
use crate::node_attrs::NodeAttrStore;
use crate::object_id::ObjectId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Shared, mutable handle to a linked graph. Cloned by the TVG ordering,
/// the Graph Cache, any attached Window/Metric, and external callers —
/// all referencing the same underlying graph (§5).
pub type GraphHandle = Rc<RefCell<SparseGraph>>;

/// Ordering key for the TVG index: `(ts, objectid)` per §3's invariant,
/// with a monotonic `seq` as the final tiebreak for equal-`ts`/no-`objectid`
/// graphs (§9 Open Questions).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey {
    pub ts: i64,
    pub objectid: ObjectId,
    pub seq: u64,
}

/// Reconstructs a linked graph's [`OrderKey`] from its header; `None` if the
/// graph is not linked. Shared with [`crate::window::Window`], which needs
/// to diff two source sets by ordering key without borrowing the `Tvg`.
pub(crate) fn order_key_of(handle: &GraphHandle) -> Option<OrderKey> {
    let g = handle.borrow();
    g.ts().map(|ts| OrderKey {
        ts,
        objectid: g.object_id(),
        seq: g.seq,
    })
}

/// The time-varying graph store.
///
/// Ordering is kept in a `BTreeMap<OrderKey, GraphHandle>` rather than an
/// intrusive doubly-linked list threaded through each graph header: this
/// trades the spec's informal "O(1) forward/backward iteration" for
/// `O(log n)` per step, in exchange for never needing `Rc` cycles between
/// neighboring graphs (see DESIGN.md).
pub struct Tvg {
    flags: Flags,
    eps: f32,
    order: BTreeMap<OrderKey, GraphHandle>,
    next_seq: u64,
    attrs: NodeAttrStore,
}

impl Tvg {
    /// Creates an empty TVG imposing `flags`/`eps` on every graph it links.
    pub fn new(flags: Flags, eps: f32, primary_key: Vec<String>) -> Self {
        Self {
            flags,
            eps,
            order: BTreeMap::new(),
            next_seq: 0,
            attrs: NodeAttrStore::new(primary_key),
        }
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn eps(&self) -> f32 {
        self.eps
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn node_attrs(&self) -> &NodeAttrStore {
        &self.attrs
    }

    pub fn node_attrs_mut(&mut self) -> &mut NodeAttrStore {
        &mut self.attrs
    }

    /// Links a standalone graph into this TVG at timestamp `ts`, optionally
    /// tagging it with a document-store `objectid`. Fails if the graph's
    /// flags are incompatible with the TVG's, or if it is already linked
    /// (into this TVG or another).
    pub fn link(&mut self, graph: SparseGraph, ts: i64, objectid: ObjectId) -> Result<GraphHandle> {
        if graph.is_linked() {
            return Err(TvgError::InvalidArgument(
                "graph is already linked into a TVG".into(),
            ));
        }
        if graph.flags() != self.flags {
            return Err(TvgError::InvalidArgument(
                "graph flags are incompatible with this TVG's flags".into(),
            ));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let mut graph = graph;
        graph.set_link(ts, objectid, seq);
        let key = OrderKey { ts, objectid, seq };
        let handle: GraphHandle = Rc::new(RefCell::new(graph));
        self.order.insert(key, handle.clone());
        Ok(handle)
    }

    /// Unlinks `handle` from the ordering. The graph remains usable by any
    /// caller still holding it, but is no longer reachable via lookup.
    pub fn unlink(&mut self, handle: &GraphHandle) -> Result<()> {
        let key = order_key_of(handle)
            .ok_or_else(|| TvgError::InvalidArgument("graph is not linked".into()))?;
        self.order
            .remove(&key)
            .ok_or_else(|| TvgError::NotFound("graph not found in this TVG".into()))?;
        handle.borrow_mut().unlink();
        Ok(())
    }

    /// Linked graphs with `lo <= ts <= hi`, in ascending order. Empty when
    /// `lo > hi` (guards against a saturated-offset inversion in
    /// [`crate::window::Window`] rather than panicking on an invalid
    /// `BTreeMap` range).
    pub fn range_ts(&self, lo: i64, hi: i64) -> Vec<GraphHandle> {
        if lo > hi {
            return Vec::new();
        }
        let start = OrderKey {
            ts: lo,
            objectid: ObjectId::None,
            seq: 0,
        };
        let end = OrderKey {
            ts: hi,
            objectid: ObjectId::Oid([0xff; 12]),
            seq: u64::MAX,
        };
        self.order.range(start..=end).map(|(_, h)| h.clone()).collect()
    }

    /// Smallest-keyed linked graph with `ts >= ts`.
    pub fn lookup_ge(&self, ts: i64) -> Option<GraphHandle> {
        let start = OrderKey {
            ts,
            objectid: ObjectId::None,
            seq: 0,
        };
        self.order.range(start..).next().map(|(_, h)| h.clone())
    }

    /// Largest-keyed linked graph with `ts <= ts`.
    pub fn lookup_le(&self, ts: i64) -> Option<GraphHandle> {
        let end = OrderKey {
            ts,
            objectid: ObjectId::Oid([0xff; 12]),
            seq: u64::MAX,
        };
        self.order.range(..=end).next_back().map(|(_, h)| h.clone())
    }

    /// The linked graph whose `ts` is closest to `ts` (ties favor the
    /// earlier graph).
    pub fn lookup_near(&self, ts: i64) -> Option<GraphHandle> {
        let ge = self.lookup_ge(ts);
        let le = self.lookup_le(ts);
        match (ge, le) {
            (Some(g), Some(l)) => {
                let gd = (g.borrow().ts().unwrap() - ts).abs();
                let ld = (ts - l.borrow().ts().unwrap()).abs();
                Some(if ld <= gd { l } else { g })
            }
            (Some(g), None) => Some(g),
            (None, Some(l)) => Some(l),
            (None, None) => None,
        }
    }

    /// The linked graph immediately after `handle` in the ordering, if any.
    pub fn next(&self, handle: &GraphHandle) -> Option<GraphHandle> {
        let key = order_key_of(handle)?;
        self.order.range((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded))
            .next()
            .map(|(_, h)| h.clone())
    }

    /// The linked graph immediately before `handle` in the ordering, if any.
    pub fn prev(&self, handle: &GraphHandle) -> Option<GraphHandle> {
        let key = order_key_of(handle)?;
        self.order
            .range((std::ops::Bound::Unbounded, std::ops::Bound::Excluded(key)))
            .next_back()
            .map(|(_, h)| h.clone())
    }

    /// All linked graphs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = GraphHandle> + '_ {
        self.order.values().cloned()
    }

    /// Partitions the time axis into half-open buckets `[offset + k*step,
    /// offset + (k+1)*step)` (`step == 0` means "everything into one
    /// bucket") and replaces every set of graphs landing in the same bucket
    /// with their edge-wise sum, timestamped at the bucket's lower bound.
    /// Total edge weight is preserved (§8).
    pub fn compress(&mut self, step: i64, offset: i64) -> Result<()> {
        if step < 0 {
            return Err(TvgError::InvalidArgument("compress step must be >= 0".into()));
        }
        let mut buckets: BTreeMap<i64, SparseGraph> = BTreeMap::new();
        for handle in self.iter() {
            let g = handle.borrow();
            let ts = g.ts().expect("linked graph always has ts");
            let bucket_ts = if step == 0 {
                offset
            } else {
                let delta = ts - offset;
                let k = delta.div_euclid(step);
                offset + k * step
            };
            let entry = buckets
                .entry(bucket_ts)
                .or_insert_with(|| SparseGraph::new(self.flags));
            entry.add_graph(&g, 1.0)?;
        }
        let old_keys: Vec<OrderKey> = self.order.keys().copied().collect();
        for key in old_keys {
            if let Some(handle) = self.order.remove(&key) {
                handle.borrow_mut().unlink();
            }
        }
        for (ts, graph) in buckets {
            self.link(graph, ts, ObjectId::None)?;
        }
        Ok(())
    }
}
