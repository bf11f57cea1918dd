//! # tvg — a time-varying graph analytics engine
//!
//! `tvg` ingests a chronologically ordered stream of sparse weighted graphs,
//! keeps them resident in memory under bounded caches, and computes
//! analytical summaries over arbitrary time intervals: rectangular and
//! exponential-decay sums, edge/node counts, spectral centralities, and
//! breadth-first traversals.
//!
//! ## Layers
//!
//! - [`vector`] / [`graph`]: the sparse key→weight stores revision-tracked
//!   mutation policies build on.
//! - [`tvg`]: the ordered collection of timestamped, linked graphs.
//! - [`cache`] / [`sync`]: the byte-budgeted LRU of resident graphs, and the
//!   on-demand batch-fetch orchestration sitting over a [`source`]-backed
//!   document store.
//! - [`window`] / [`metric`]: the sliding-interval engine that folds TVG
//!   graphs into an incrementally maintained aggregate.
//! - [`node_summary`]: stability/entropy/trend derived from a trailing
//!   sequence of metric snapshots.
//! - [`query_cache`]: memoizes aggregate computations by fingerprint.
//! - [`loader`]: the in-memory graph and node-attribute line formats.
//!
//! ## Quick start
//!
//! ```
//! use tvg::flags::Flags;
//! use tvg::graph::SparseGraph;
//! use tvg::metric::{Metric, RectSum};
//! use tvg::object_id::ObjectId;
//! use tvg::tvg::Tvg;
//! use tvg::window::Window;
//!
//! let mut store = Tvg::new(Flags::empty(), 1e-6, vec![]);
//! let mut g = SparseGraph::new(Flags::empty());
//! g.set(0, 1, 2.0);
//! store.link(g, 100, ObjectId::None).unwrap();
//!
//! let mut window = Window::new(-50, 50, 0).unwrap();
//! window.attach(Box::new(RectSum::new(Flags::empty())));
//! window.update(&store, 100).unwrap();
//!
//! assert_eq!(window.metric(0).aggregate().as_graph().unwrap().get(0, 1), 2.0);
//! ```

mod bucket_store;
mod util;

pub mod cache;
pub mod error;
pub mod flags;
pub mod graph;
pub mod loader;
pub mod metric;
pub mod node_attrs;
pub mod node_summary;
pub mod object_id;
pub mod query_cache;
pub mod source;
pub mod sync;
pub mod tvg;
pub mod value;
pub mod vector;
pub mod window;

pub use crate::error::{Result, TvgError};
pub use crate::flags::Flags;
pub use crate::graph::SparseGraph;
pub use crate::object_id::ObjectId;
pub use crate::value::Value;
pub use crate::vector::SparseVector;
