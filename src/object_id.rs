//! Tagged object identifier mirroring the shape of a document-store primary
//! key (`{none, int, oid}`), without depending on any particular document
//! database's driver crate (§6).

use std::cmp::Ordering;
use std::fmt;

/// A 12-byte identifier, structurally compatible with a MongoDB-style
/// ObjectId but defined independently of any driver crate.
pub type Oid = [u8; 12];

/// A tagged identifier: absent, a small integer, or a 12-byte oid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectId {
    None,
    Int(u64),
    Oid(Oid),
}

impl ObjectId {
    pub fn is_none(&self) -> bool {
        matches!(self, ObjectId::None)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::None
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::None => write!(f, "none"),
            ObjectId::Int(n) => write!(f, "{n}"),
            ObjectId::Oid(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Ordering used for TVG tiebreaking: `None` sorts before any concrete id;
/// `Int` and `Oid` are compared within their own tag only by construction
/// (a TVG's graphs use one or the other consistently), but a cross-tag
/// comparison still needs a total order, so `Int < Oid` is used as the
/// tag-level tiebreak.
impl PartialOrd for ObjectId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectId {
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(id: &ObjectId) -> u8 {
            match id {
                ObjectId::None => 0,
                ObjectId::Int(_) => 1,
                ObjectId::Oid(_) => 2,
            }
        }
        match (self, other) {
            (ObjectId::None, ObjectId::None) => Ordering::Equal,
            (ObjectId::Int(a), ObjectId::Int(b)) => a.cmp(b),
            (ObjectId::Oid(a), ObjectId::Oid(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_sorts_before_any_concrete_id() {
        assert!(ObjectId::None < ObjectId::Int(0));
        assert!(ObjectId::None < ObjectId::Oid([0; 12]));
    }

    #[test]
    fn ints_compare_numerically() {
        assert!(ObjectId::Int(1) < ObjectId::Int(2));
    }

    #[test]
    fn oids_compare_byte_lexicographically() {
        assert!(ObjectId::Oid([0; 12]) < ObjectId::Oid([1; 12]));
    }
}
