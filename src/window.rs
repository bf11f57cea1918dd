//! Window: a timestamped sliding interval over a [`crate::tvg::Tvg`], driving
//! one or more attached [`crate::metric::Metric`]s via incremental
//! add/evict notifications (§4.4).

use crate::error::{Result, TvgError};
use crate::metric::Metric;
use crate::tvg::{order_key_of, GraphHandle, OrderKey, Tvg};
use std::collections::BTreeMap;

/// Sentinel offsets for an unbounded window edge (§3's "infinities permitted").
pub const NEG_INFINITY: i64 = i64::MIN;
pub const POS_INFINITY: i64 = i64::MAX;

fn bound_add(ts: i64, offset: i64) -> i64 {
    if offset == NEG_INFINITY || offset == POS_INFINITY {
        offset
    } else {
        ts.saturating_add(offset)
    }
}

/// A half-open-by-convention interval `[ts + window_l, ts + window_r]`
/// anchored at a mutable `ts`, plus the set of TVG graphs currently falling
/// inside it and the metrics that fold that set into an aggregate.
pub struct Window {
    window_l: i64,
    window_r: i64,
    ts: i64,
    valid: bool,
    sources: BTreeMap<OrderKey, GraphHandle>,
    metrics: Vec<Box<dyn Metric>>,
}

impl Window {
    /// Creates a window with the given offsets, anchored initially at `ts`
    /// but not yet populated (the first [`Window::update`] rebuilds from
    /// scratch). Rejects `window_r < window_l` and zero-width windows (§3).
    pub fn new(window_l: i64, window_r: i64, ts: i64) -> Result<Self> {
        if window_r < window_l {
            return Err(TvgError::InvalidArgument(
                "window_r must be >= window_l".into(),
            ));
        }
        if window_l == window_r {
            return Err(TvgError::InvalidArgument(
                "window width must be nonzero".into(),
            ));
        }
        Ok(Self {
            window_l,
            window_r,
            ts,
            valid: false,
            sources: BTreeMap::new(),
            metrics: Vec::new(),
        })
    }

    pub fn window_l(&self) -> i64 {
        self.window_l
    }

    pub fn window_r(&self) -> i64 {
        self.window_r
    }

    /// Current anchor timestamp (only meaningful once [`Window::update`] has
    /// been called at least once since construction or the last `reset`).
    pub fn ts(&self) -> i64 {
        self.ts
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Attaches a metric; metrics are notified in attachment order on every
    /// `update` (§4.4's "Composition on a shared Window").
    pub fn attach(&mut self, metric: Box<dyn Metric>) -> usize {
        self.metrics.push(metric);
        self.metrics.len() - 1
    }

    pub fn metric(&self, index: usize) -> &dyn Metric {
        self.metrics[index].as_ref()
    }

    fn interval_at(&self, ts: i64) -> (i64, i64) {
        (bound_add(ts, self.window_l), bound_add(ts, self.window_r))
    }

    /// Advances the window's anchor to `new_ts`, computing the symmetric
    /// difference between the old and new source-graph sets and notifying
    /// every attached metric of the deltas (§4.4). If the window was reset
    /// since the last update, rebuilds the source set from scratch instead.
    pub fn update(&mut self, tvg: &Tvg, new_ts: i64) -> Result<()> {
        let (lo, hi) = self.interval_at(new_ts);
        let mut new_sources: BTreeMap<OrderKey, GraphHandle> = BTreeMap::new();
        for handle in tvg.range_ts(lo, hi) {
            if let Some(key) = order_key_of(&handle) {
                new_sources.insert(key, handle);
            }
        }

        if !self.valid {
            for metric in &mut self.metrics {
                metric.on_window_reset(new_ts);
            }
            for handle in new_sources.values() {
                for metric in &mut self.metrics {
                    metric.on_add(&handle.borrow(), new_ts)?;
                }
            }
            self.sources = new_sources;
            self.ts = new_ts;
            self.valid = true;
            return Ok(());
        }

        let old_ts = self.ts;
        for metric in &mut self.metrics {
            metric.on_rescale(new_ts, old_ts);
        }
        for (key, handle) in &self.sources {
            if !new_sources.contains_key(key) {
                for metric in &mut self.metrics {
                    metric.on_evict(&handle.borrow(), new_ts)?;
                }
            }
        }
        for (key, handle) in &new_sources {
            if !self.sources.contains_key(key) {
                for metric in &mut self.metrics {
                    metric.on_add(&handle.borrow(), new_ts)?;
                }
            }
        }

        self.sources = new_sources;
        self.ts = new_ts;
        Ok(())
    }

    /// Invalidates the current source set; the next `update` rebuilds it
    /// from scratch rather than diffing against stale state (§4.4).
    pub fn reset(&mut self) {
        self.valid = false;
        self.sources.clear();
        for metric in &mut self.metrics {
            metric.reset();
        }
    }
}
