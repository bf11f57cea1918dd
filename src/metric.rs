//! Window-bound incremental aggregators (§4.4).
//!
//! A Metric attaches to a [`crate::window::Window`] and is notified as the
//! window's source-graph set changes; it folds each delta into its own
//! aggregate rather than recomputing from scratch.

use crate::error::{Result, TvgError};
use crate::flags::Flags;
use crate::graph::SparseGraph;
use crate::value::Value;
use crate::vector::{SparseVector, DEFAULT_EPS};
use std::collections::HashMap;

/// Receives window source-set deltas and maintains an incrementally folded
/// aggregate.
pub trait Metric {
    /// Called once for every graph entering the window's source set. Fails
    /// only if `graph`'s directedness is incompatible with the metric's.
    fn on_add(&mut self, graph: &SparseGraph, window_ts: i64) -> Result<()>;

    /// Called once for every graph leaving the window's source set. Fails
    /// only if `graph`'s directedness is incompatible with the metric's.
    fn on_evict(&mut self, graph: &SparseGraph, window_ts: i64) -> Result<()>;

    /// Called once per `update`, before any add/evict, to let the metric
    /// rescale its existing state to the new anchor (a no-op for metrics
    /// without a time-decaying kernel).
    fn on_rescale(&mut self, new_ts: i64, old_ts: i64);

    /// Called instead of `on_rescale`/per-source `on_add` when the window
    /// was reset and is rebuilding from scratch at `ts`.
    fn on_window_reset(&mut self, ts: i64);

    /// Discards all accumulated state.
    fn reset(&mut self);

    /// The current aggregate value.
    fn aggregate(&self) -> &Value;
}

/// `state = Σ_{g in sources} g`.
pub struct RectSum {
    flags: Flags,
    value: Value,
}

impl RectSum {
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            value: Value::Graph(SparseGraph::new(flags)),
        }
    }

    fn graph_mut(&mut self) -> &mut SparseGraph {
        match &mut self.value {
            Value::Graph(g) => g,
            Value::Vector(_) => unreachable!("RectSum always holds a Graph"),
        }
    }
}

impl Metric for RectSum {
    fn on_add(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        self.graph_mut().add_graph(graph, 1.0)
    }

    fn on_evict(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        self.graph_mut().sub_graph(graph, 1.0)
    }

    fn on_rescale(&mut self, _new_ts: i64, _old_ts: i64) {}

    fn on_window_reset(&mut self, _ts: i64) {
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn reset(&mut self) {
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn aggregate(&self) -> &Value {
        &self.value
    }
}

/// `state(t) = Σ_{g in sources} weight · β^(t − g.ts) · g`, `β = exp(log_beta)`.
///
/// `β^Δt` ranges from vanishingly small to astronomically large as `Δt`
/// grows, well outside `f32`'s range (`0.3^100 ≈ 5e-53`, smaller than the
/// smallest `f32` subnormal). `on_rescale` re-multiplies the whole aggregate
/// by one such factor per update (§4.4), so keeping the running aggregate in
/// `f32` would underflow it to `0.0` and then the reciprocal rescale back
/// would turn `0.0 * inf` into `NaN` instead of recovering the original
/// value. `raw` accumulates in `f64` instead, which comfortably spans any
/// `Δt` this engine's `i64` timestamps can express; only the publicly
/// exposed `Value::Graph` is rounded down to `f32`.
pub struct ExpDecaySum {
    flags: Flags,
    weight: f32,
    log_beta: f64,
    raw: HashMap<(u64, u64), f64>,
    value: Value,
}

impl ExpDecaySum {
    /// `weight >= 0`, `log_beta <= 0`.
    pub fn new(flags: Flags, weight: f32, log_beta: f64) -> Result<Self> {
        if weight < 0.0 {
            return Err(TvgError::InvalidArgument("weight must be >= 0".into()));
        }
        if log_beta > 0.0 {
            return Err(TvgError::InvalidArgument("log_beta must be <= 0".into()));
        }
        Ok(Self {
            flags,
            weight,
            log_beta,
            raw: HashMap::new(),
            value: Value::Graph(SparseGraph::new(flags)),
        })
    }

    /// The "normalised" smoothing variant: `weight = 1 - β` so that a
    /// constant input sequence converges to the input value.
    pub fn normalized(flags: Flags, log_beta: f64) -> Result<Self> {
        let beta = log_beta.exp();
        Self::new(flags, (1.0 - beta) as f32, log_beta)
    }

    fn decay_factor(&self, ts: i64, g_ts: i64) -> f64 {
        self.weight as f64 * (self.log_beta * (ts - g_ts) as f64).exp()
    }

    /// Normalizes an edge key the same way undirected `SparseGraph` storage
    /// coalesces `(a,b)`/`(b,a)`.
    fn edge_key(&self, a: u64, b: u64) -> (u64, u64) {
        if self.flags.contains(Flags::DIRECTED) || a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Applies the nonzero/positive removal policy to a freshly accumulated
    /// raw entry, at full `f64` precision.
    fn apply_raw(&mut self, key: (u64, u64), new_val: f64) {
        let drop = (self.flags.contains(Flags::NONZERO) && new_val.abs() < DEFAULT_EPS as f64)
            || (self.flags.contains(Flags::POSITIVE) && new_val < 0.0);
        if drop {
            self.raw.remove(&key);
        } else {
            self.raw.insert(key, new_val);
        }
    }

    fn fold_graph(&mut self, graph: &SparseGraph, factor: f64, sign: f64) -> Result<()> {
        if graph.is_directed() != self.flags.contains(Flags::DIRECTED) {
            return Err(TvgError::InvalidArgument(
                "cannot combine graphs with different directedness".into(),
            ));
        }
        for (a, b, w) in graph.edges() {
            let key = self.edge_key(a, b);
            let current = self.raw.get(&key).copied().unwrap_or(0.0);
            self.apply_raw(key, current + sign * w as f64 * factor);
        }
        self.rebuild_value();
        Ok(())
    }

    /// Re-projects the `f64` `raw` accumulator into the exposed `f32` graph.
    fn rebuild_value(&mut self) {
        let mut g = SparseGraph::new(self.flags);
        for (&(a, b), &w) in &self.raw {
            g.set(a, b, w as f32);
        }
        self.value = Value::Graph(g);
    }
}

impl Metric for ExpDecaySum {
    fn on_add(&mut self, graph: &SparseGraph, window_ts: i64) -> Result<()> {
        let g_ts = graph.ts().unwrap_or(window_ts);
        let factor = self.decay_factor(window_ts, g_ts);
        self.fold_graph(graph, factor, 1.0)
    }

    fn on_evict(&mut self, graph: &SparseGraph, window_ts: i64) -> Result<()> {
        let g_ts = graph.ts().unwrap_or(window_ts);
        let factor = self.decay_factor(window_ts, g_ts);
        self.fold_graph(graph, factor, -1.0)
    }

    fn on_rescale(&mut self, new_ts: i64, old_ts: i64) {
        let factor = (self.log_beta * (new_ts - old_ts) as f64).exp();
        let keys: Vec<(u64, u64)> = self.raw.keys().copied().collect();
        for key in keys {
            let scaled = self.raw[&key] * factor;
            self.apply_raw(key, scaled);
        }
        self.rebuild_value();
    }

    fn on_window_reset(&mut self, _ts: i64) {
        self.raw.clear();
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn reset(&mut self) {
        self.raw.clear();
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn aggregate(&self) -> &Value {
        &self.value
    }
}

/// Every contributing edge counts as `1`, regardless of its own weight.
pub struct EdgeCount {
    flags: Flags,
    value: Value,
}

impl EdgeCount {
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            value: Value::Graph(SparseGraph::new(flags)),
        }
    }

    fn graph_mut(&mut self) -> &mut SparseGraph {
        match &mut self.value {
            Value::Graph(g) => g,
            Value::Vector(_) => unreachable!("EdgeCount always holds a Graph"),
        }
    }
}

impl Metric for EdgeCount {
    fn on_add(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        for (a, b, _) in graph.edges() {
            self.graph_mut().add(a, b, 1.0);
        }
        Ok(())
    }

    fn on_evict(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        for (a, b, _) in graph.edges() {
            self.graph_mut().sub(a, b, 1.0);
        }
        Ok(())
    }

    fn on_rescale(&mut self, _new_ts: i64, _old_ts: i64) {}

    fn on_window_reset(&mut self, _ts: i64) {
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn reset(&mut self) {
        self.value = Value::Graph(SparseGraph::new(self.flags));
    }

    fn aggregate(&self) -> &Value {
        &self.value
    }
}

/// Each source contributes the characteristic vector of its node set.
pub struct NodeCount {
    value: Value,
}

impl NodeCount {
    pub fn new() -> Self {
        Self {
            value: Value::Vector(SparseVector::new(Flags::empty())),
        }
    }

    fn vector_mut(&mut self) -> &mut SparseVector {
        match &mut self.value {
            Value::Vector(v) => v,
            Value::Graph(_) => unreachable!("NodeCount always holds a Vector"),
        }
    }
}

impl Default for NodeCount {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for NodeCount {
    fn on_add(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        for node in graph.nodes() {
            self.vector_mut().add(node, 1.0);
        }
        Ok(())
    }

    fn on_evict(&mut self, graph: &SparseGraph, _window_ts: i64) -> Result<()> {
        for node in graph.nodes() {
            self.vector_mut().sub(node, 1.0);
        }
        Ok(())
    }

    fn on_rescale(&mut self, _new_ts: i64, _old_ts: i64) {}

    fn on_window_reset(&mut self, _ts: i64) {
        self.value = Value::Vector(SparseVector::new(Flags::empty()));
    }

    fn reset(&mut self) {
        self.value = Value::Vector(SparseVector::new(Flags::empty()));
    }

    fn aggregate(&self) -> &Value {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_graph(a: u64, b: u64, w: f32, ts: i64) -> SparseGraph {
        let mut g = SparseGraph::new(Flags::empty());
        g.set(a, b, w);
        g.set_link(ts, crate::object_id::ObjectId::None, 0);
        g
    }

    #[test]
    fn rect_sum_add_then_evict_returns_to_empty() {
        let mut m = RectSum::new(Flags::empty());
        let g = edge_graph(0, 1, 2.0, 100);
        m.on_add(&g, 100).unwrap();
        assert_eq!(m.aggregate().as_graph().unwrap().get(0, 1), 2.0);
        m.on_evict(&g, 100).unwrap();
        assert!(m.aggregate().as_graph().unwrap().is_empty());
    }

    #[test]
    fn exp_decay_rescale_then_query_matches_formula() {
        let mut m = ExpDecaySum::new(Flags::empty(), 1.0, (0.3f64).ln()).unwrap();
        let g = edge_graph(0, 0, 1.0, 0);
        m.on_add(&g, 0).unwrap();
        assert!((m.aggregate().as_graph().unwrap().get(0, 0) - 1.0).abs() < 1e-9);
        m.on_rescale(100, 0);
        let expected = 0.3f64.powi(100);
        assert!((m.aggregate().as_graph().unwrap().get(0, 0) as f64 - expected).abs() < 1e-9);
    }

    #[test]
    fn exp_decay_survives_underflow_and_recovers_on_return() {
        // Regression: the aggregate must ride out a decay factor far below
        // f32's smallest subnormal (0.3^100 ~ 5e-53) and recover ~1.0 when
        // rescaled back, rather than underflowing to 0 and then NaN-ing out
        // on the reciprocal rescale.
        let mut m = ExpDecaySum::new(Flags::empty(), 1.0, (0.3f64).ln()).unwrap();
        let g = edge_graph(0, 0, 1.0, 0);
        m.on_add(&g, 0).unwrap();
        m.on_rescale(100, 0);
        m.on_rescale(0, 100);
        let recovered = m.aggregate().as_graph().unwrap().get(0, 0) as f64;
        assert!((recovered - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edge_count_counts_edges_not_weight() {
        let mut m = EdgeCount::new(Flags::empty());
        let g = edge_graph(0, 1, 50.0, 0);
        m.on_add(&g, 0).unwrap();
        assert_eq!(m.aggregate().as_graph().unwrap().get(0, 1), 1.0);
    }

    #[test]
    fn node_count_tracks_characteristic_vector() {
        let mut m = NodeCount::new();
        let mut g = SparseGraph::new(Flags::DIRECTED);
        g.set(1, 2, 1.0);
        g.set(2, 3, 1.0);
        m.on_add(&g, 0).unwrap();
        let v = m.aggregate().as_vector().unwrap();
        assert_eq!(v.get(1), 1.0);
        assert_eq!(v.get(2), 1.0);
        assert_eq!(v.get(3), 1.0);
    }

    #[test]
    fn exp_decay_rejects_invalid_parameters() {
        assert!(ExpDecaySum::new(Flags::empty(), -1.0, 0.0).is_err());
        assert!(ExpDecaySum::new(Flags::empty(), 1.0, 0.1).is_err());
    }

    #[test]
    fn exp_decay_rejects_directedness_mismatch() {
        let mut m = ExpDecaySum::new(Flags::DIRECTED, 1.0, (0.3f64).ln()).unwrap();
        let g = edge_graph(0, 1, 1.0, 0);
        assert!(m.on_add(&g, 0).is_err());
    }
}
