//! Spectral centrality via power iteration (§4.4).
//!
//! Repeatedly applies the graph as a linear operator to a candidate
//! eigenvector, renormalising after each step, until the vector stabilises
//! (by Euclidean distance between successive iterates) or an iteration cap
//! is hit. Non-convergence is reported as a flag on the result, never as an
//! error: a capped-out iteration still returns its best estimate.

use super::SparseGraph;
use crate::flags::Flags;
use crate::vector::SparseVector;

/// Default iteration cap used when the caller doesn't override it.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
/// Default convergence tolerance on `‖x_{k+1} - x_k‖`.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Outcome of a power-iteration run.
#[derive(Debug, Clone)]
pub struct PowerIterationResult {
    /// The (L2-normalised) eigenvector estimate.
    pub vector: SparseVector,
    /// Rayleigh-quotient estimate of the dominant eigenvalue, computed from
    /// one extra matrix-vector product after the eigenvector estimate
    /// settles (never the raw `‖Ax‖` renormalisation norm, which only
    /// agrees with the Rayleigh quotient for a symmetric operator).
    pub eigenvalue: f64,
    /// Number of iterations actually performed.
    pub iterations: usize,
    /// `false` if the iteration cap was hit before reaching `tolerance`.
    pub converged: bool,
}

/// Runs power iteration on `graph`, starting from a uniform vector over
/// `graph.nodes()` when `seed` is `None`.
///
/// `max_iterations == 0` means "iterate until `tolerance` is met" (no cap),
/// mirroring `tolerance == 0` meaning "iterate until the cap is hit".
///
/// Returns `Ok` with `converged: false` on a capped-out run; never returns
/// `Err` for numerical non-convergence.
pub fn power_iteration(
    graph: &SparseGraph,
    seed: Option<&SparseVector>,
    max_iterations: usize,
    tolerance: f64,
) -> PowerIterationResult {
    let nodes = graph.nodes();
    let mut x = match seed {
        Some(v) => v.clone(),
        None => {
            let mut v = SparseVector::new(Flags::empty());
            if !nodes.is_empty() {
                let w = 1.0 / (nodes.len() as f64).sqrt();
                for &n in &nodes {
                    v.set(n, w as f32);
                }
            }
            v
        }
    };

    if nodes.is_empty() || x.is_empty() {
        return PowerIterationResult {
            vector: x,
            eigenvalue: 0.0,
            iterations: 0,
            converged: true,
        };
    }

    let start_norm = x.norm();
    if start_norm > 0.0 {
        x.mul_const((1.0 / start_norm) as f32);
    }

    let mut converged = false;
    let mut iterations = 0;
    // `max_iterations == 0` means "no cap"; iterate until `tolerance` is met.
    let cap = if max_iterations == 0 { usize::MAX } else { max_iterations };

    for i in 0..cap {
        iterations = i + 1;
        let mut y = graph.mul_vector(&x);
        let norm = y.norm();
        if norm == 0.0 {
            // x is in the kernel of graph; nothing further to do.
            x = y;
            converged = true;
            break;
        }
        y.mul_const((1.0 / norm) as f32);
        let delta = y.sub_norm(&x);
        x = y;
        if delta < tolerance {
            converged = true;
            break;
        }
    }

    // One further matrix-vector product after the eigenvector estimate has
    // settled, per the Rayleigh-quotient contract.
    let ax = graph.mul_vector(&x);
    let eigenvalue = x.dot(&ax);

    PowerIterationResult {
        vector: x,
        eigenvalue,
        iterations,
        converged,
    }
}
