//! Shared zero/positive/directed flag bitset used by both
//! [`crate::vector::SparseVector`] and [`crate::graph::SparseGraph`].

use bitflags::bitflags;

bitflags! {
    /// Policy flags enforced on every mutation.
    ///
    /// `NONZERO`: no stored entry may have `|w| < eps`.
    /// `POSITIVE`: no stored entry may be negative (implies entries `>= eps` when combined with `NONZERO`).
    /// `DIRECTED`: graph-only; when unset, `(a,b)` and `(b,a)` are the same edge.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Entries with `|w| < eps` are removed on mutation.
        const NONZERO = 0b001;
        /// Entries with `w < 0` are removed on mutation.
        const POSITIVE = 0b010;
        /// Graph only: `(a,b)` and `(b,a)` are distinct edges.
        const DIRECTED = 0b100;
    }
}

impl Flags {
    /// Applies the nonzero/positive removal policy to a freshly computed
    /// weight, returning `Some(weight)` if the entry should be kept.
    pub(crate) fn keep(self, weight: f32, eps: f32) -> Option<f32> {
        if self.contains(Flags::NONZERO) && weight.abs() < eps {
            return None;
        }
        if self.contains(Flags::POSITIVE) && weight < 0.0 {
            return None;
        }
        Some(weight)
    }
}
