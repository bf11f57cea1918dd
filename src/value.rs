//! A tagged union of the two kinds of result this engine produces: a
//! [`SparseGraph`] or a [`SparseVector`]. Used anywhere a Metric's
//! aggregate or a Query Cache entry needs to be handled uniformly across
//! both kinds (§4.4, §4.6, §9 Open Questions).

use crate::graph::SparseGraph;
use crate::vector::SparseVector;

/// Per-edge/per-entry storage cost used for approximate memory accounting.
const BYTES_PER_VECTOR_ENTRY: usize = std::mem::size_of::<u64>() + std::mem::size_of::<f32>();
const BYTES_PER_GRAPH_EDGE: usize = 2 * std::mem::size_of::<u64>() + std::mem::size_of::<f32>();

/// Either of the two result kinds this engine computes.
#[derive(Clone, Debug)]
pub enum Value {
    Graph(SparseGraph),
    Vector(SparseVector),
}

impl Value {
    pub fn as_graph(&self) -> Option<&SparseGraph> {
        match self {
            Value::Graph(g) => Some(g),
            Value::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&SparseVector> {
        match self {
            Value::Vector(v) => Some(v),
            Value::Graph(_) => None,
        }
    }

    /// Approximate resident memory usage, used by budget-bounded caches.
    pub fn memory_bytes(&self) -> usize {
        match self {
            Value::Graph(g) => g.num_edges() * BYTES_PER_GRAPH_EDGE,
            Value::Vector(v) => v.num_entries() * BYTES_PER_VECTOR_ENTRY,
        }
    }
}

impl From<SparseGraph> for Value {
    fn from(g: SparseGraph) -> Self {
        Value::Graph(g)
    }
}

impl From<SparseVector> for Value {
    fn from(v: SparseVector) -> Self {
        Value::Vector(v)
    }
}
