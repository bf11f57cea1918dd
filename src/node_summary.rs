//! Node Summary: per-node stability/entropy/trend metrics derived from a
//! trailing sequence of [`crate::metric::Metric`] snapshots (SPEC_FULL §4.5,
//! supplement grounded in `original_source/libtvg/pytvg.py`'s `metric`
//! helpers). Introduces no new storage; it only samples a Metric's
//! aggregate at caller-chosen anchor times and derives read-side summaries.

use crate::error::Result;
use crate::metric::Metric;
use crate::tvg::Tvg;
use crate::value::Value;
use crate::vector::DEFAULT_EPS;
use crate::window::Window;

/// A per-node time series captured by sampling a window+metric pair at a
/// caller-chosen sequence of anchor timestamps.
pub struct NodeSummary {
    samples: Vec<(i64, Value)>,
}

fn node_weight(value: &Value, node: u64) -> f64 {
    match value {
        Value::Graph(g) => g.out_weight().get(node) as f64,
        Value::Vector(v) => v.get(node) as f64,
    }
}

impl NodeSummary {
    /// Drives `window` through `times` in order, snapshotting `metric`'s
    /// aggregate after each `update`. `metric` must be the same instance
    /// attached to `window` (or an independent metric fed the same sources)
    /// — this module does not itself attach metrics to windows.
    pub fn sample(window: &mut Window, tvg: &Tvg, metric_index: usize, times: &[i64]) -> Result<Self> {
        let mut samples = Vec::with_capacity(times.len());
        for &t in times {
            window.update(tvg, t)?;
            samples.push((t, window.metric(metric_index).aggregate().clone()));
        }
        Ok(Self { samples })
    }

    /// Builds a summary directly from already-computed snapshots, e.g. when
    /// the caller drives the window/metric loop itself.
    pub fn from_samples(samples: Vec<(i64, Value)>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn series(&self, node: u64) -> Vec<f64> {
        self.samples
            .iter()
            .map(|(_, v)| node_weight(v, node))
            .collect()
    }

    /// Mean weight of `node` across the trailing samples; `0.0` for a node
    /// absent throughout.
    pub fn value(&self, node: u64) -> f64 {
        let series = self.series(node);
        if series.is_empty() {
            return 0.0;
        }
        series.iter().sum::<f64>() / series.len() as f64
    }

    /// `1 - stddev/mean(|series|)`, clamped to `[0, 1]`; `1.0` for a node
    /// that stayed at (near-)zero throughout.
    pub fn stability(&self, node: u64) -> f64 {
        let series = self.series(node);
        if series.is_empty() {
            return 1.0;
        }
        let n = series.len() as f64;
        let mean_abs = series.iter().map(|x| x.abs()).sum::<f64>() / n;
        if mean_abs <= DEFAULT_EPS as f64 {
            return 1.0;
        }
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        (1.0 - variance.sqrt() / mean_abs).clamp(0.0, 1.0)
    }

    /// Shannon entropy (base 2) of `node`'s normalized out-edge-weight
    /// distribution at the most recent sample. `0.0` for a node with at
    /// most one outgoing edge, or when the latest sample is a Vector (no
    /// edges to distribute over).
    pub fn entropy(&self, node: u64) -> f64 {
        let Some((_, last)) = self.samples.last() else {
            return 0.0;
        };
        let Some(graph) = last.as_graph() else {
            return 0.0;
        };
        let weights: Vec<f64> = graph
            .out_edges(node)
            .map(|(_, w)| w as f64)
            .filter(|w| *w > 0.0)
            .collect();
        if weights.len() <= 1 {
            return 0.0;
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        -weights
            .iter()
            .map(|w| {
                let p = w / total;
                p * p.log2()
            })
            .sum::<f64>()
    }

    /// Slope of the ordinary-least-squares fit of `node`'s weight against
    /// sample index. `0.0` for fewer than two samples.
    pub fn trend(&self, node: u64) -> f64 {
        let series = self.series(node);
        let n = series.len();
        if n < 2 {
            return 0.0;
        }
        let x_mean = (n as f64 - 1.0) / 2.0;
        let y_mean = series.iter().sum::<f64>() / n as f64;
        let mut num = 0.0;
        let mut den = 0.0;
        for (i, y) in series.iter().enumerate() {
            let dx = i as f64 - x_mean;
            num += dx * (y - y_mean);
            den += dx * dx;
        }
        if den == 0.0 {
            return 0.0;
        }
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::graph::SparseGraph;

    fn graph_value(edges: &[(u64, u64, f32)]) -> Value {
        let mut g = SparseGraph::new(Flags::DIRECTED);
        for &(a, b, w) in edges {
            g.set(a, b, w);
        }
        Value::Graph(g)
    }

    #[test]
    fn constant_series_is_fully_stable_with_zero_trend() {
        let samples = vec![
            (0, graph_value(&[(1, 2, 5.0)])),
            (1, graph_value(&[(1, 2, 5.0)])),
            (2, graph_value(&[(1, 2, 5.0)])),
        ];
        let summary = NodeSummary::from_samples(samples);
        assert!((summary.stability(1) - 1.0).abs() < 1e-9);
        assert!(summary.trend(1).abs() < 1e-9);
    }

    #[test]
    fn absent_node_has_stability_one_and_value_zero() {
        let samples = vec![(0, graph_value(&[])), (1, graph_value(&[]))];
        let summary = NodeSummary::from_samples(samples);
        assert_eq!(summary.value(42), 0.0);
        assert_eq!(summary.stability(42), 1.0);
    }

    #[test]
    fn increasing_series_has_positive_trend() {
        let samples = vec![
            (0, graph_value(&[(1, 2, 1.0)])),
            (1, graph_value(&[(1, 2, 2.0)])),
            (2, graph_value(&[(1, 2, 3.0)])),
        ];
        let summary = NodeSummary::from_samples(samples);
        assert!((summary.trend(1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_is_zero_for_single_out_edge() {
        let samples = vec![(0, graph_value(&[(1, 2, 5.0)]))];
        let summary = NodeSummary::from_samples(samples);
        assert_eq!(summary.entropy(1), 0.0);
    }

    #[test]
    fn entropy_is_positive_for_multiple_out_edges() {
        let samples = vec![(0, graph_value(&[(1, 2, 1.0), (1, 3, 1.0), (1, 4, 1.0)]))];
        let summary = NodeSummary::from_samples(samples);
        // Uniform distribution over 3 outcomes: log2(3).
        assert!((summary.entropy(1) - 3.0f64.log2()).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_two_samples_has_zero_trend() {
        let samples = vec![(0, graph_value(&[(1, 2, 1.0)]))];
        let summary = NodeSummary::from_samples(samples);
        assert_eq!(summary.trend(1), 0.0);
    }
}
