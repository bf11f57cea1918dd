//! Crate-wide error type.
//!
//! Mirrors the error taxonomy of the engine spec: invalid arguments fail
//! fast with no side effects, not-found is distinguished from I/O failure,
//! and resource exhaustion is a propagated (not panicking) failure.
//! Numerical non-convergence is intentionally *not* a variant here: power
//! iteration reports it as a `converged: false` flag on its success value
//! (see [`crate::graph::power_iteration`]), never as an `Err`.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TvgError>;

/// Errors produced by the time-varying graph engine.
#[derive(Debug, Error)]
pub enum TvgError {
    /// A file or document-source read failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A caller-supplied argument was malformed: mismatched parallel-array
    /// lengths, an incompatible flag combination on link, a zero-width
    /// window, and similar fail-fast conditions.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A lookup had no answer (node index, primary key, or time range).
    #[error("{0} not found")]
    NotFound(String),

    /// The document source, or a record it returned, could not be used.
    #[error("document source error: {0}")]
    Source(String),

    /// An allocation or capacity budget could not be satisfied.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}
