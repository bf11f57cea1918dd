//! Node Attributes: node index → named string attributes, with an ordered
//! primary-key subset that uniquely identifies a linked node (§3, §4.2).

use crate::error::{Result, TvgError};
use std::collections::BTreeMap;

/// Stores per-node attributes and resolves/creates nodes by primary key.
pub struct NodeAttrStore {
    primary_key: Vec<String>,
    attrs: BTreeMap<u64, BTreeMap<String, String>>,
    pk_index: BTreeMap<Vec<String>, u64>,
    next_index: u64,
}

impl NodeAttrStore {
    /// Creates a store whose primary key is the ordered list of attribute
    /// names in `primary_key`.
    pub fn new(primary_key: Vec<String>) -> Self {
        Self {
            primary_key,
            attrs: BTreeMap::new(),
            pk_index: BTreeMap::new(),
            next_index: 0,
        }
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Resolves `values` (in primary-key order) to a linked node, creating
    /// one if no node with that primary key exists yet. Returns the
    /// existing node if the primary key already collides with a linked one
    /// (§4.2).
    pub fn link_node(&mut self, values: &[String]) -> Result<u64> {
        if values.len() != self.primary_key.len() {
            return Err(TvgError::InvalidArgument(format!(
                "expected {} primary key values, got {}",
                self.primary_key.len(),
                values.len()
            )));
        }
        if let Some(&existing) = self.pk_index.get(values) {
            return Ok(existing);
        }
        let index = self.next_index;
        self.next_index += 1;
        let mut row = BTreeMap::new();
        for (name, value) in self.primary_key.iter().zip(values.iter()) {
            row.insert(name.clone(), value.clone());
        }
        self.attrs.insert(index, row);
        self.pk_index.insert(values.to_vec(), index);
        Ok(index)
    }

    /// Resolves `values` to an existing linked node's index, or `NotFound`.
    pub fn resolve(&self, values: &[String]) -> Result<u64> {
        self.pk_index
            .get(values)
            .copied()
            .ok_or_else(|| TvgError::NotFound(format!("no node with primary key {values:?}")))
    }

    /// Sets a non-primary-key attribute on `node`. Rejects attempts to
    /// overwrite a primary-key attribute on an already-linked node (§3: the
    /// primary key is immutable once linked).
    pub fn set_attribute(&mut self, node: u64, name: &str, value: String) -> Result<()> {
        if self.primary_key.iter().any(|k| k == name) && self.pk_index.values().any(|&n| n == node)
        {
            return Err(TvgError::InvalidArgument(
                "primary key attribute is immutable once linked".into(),
            ));
        }
        self.attrs
            .entry(node)
            .or_default()
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Reads attribute `name` on `node`, if present.
    pub fn get_attribute(&self, node: u64, name: &str) -> Option<&str> {
        self.attrs.get(&node)?.get(name).map(String::as_str)
    }

    /// All attributes on `node`, if the node has any recorded.
    pub fn attributes(&self, node: u64) -> Option<&BTreeMap<String, String>> {
        self.attrs.get(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_node_creates_then_deduplicates() {
        let mut store = NodeAttrStore::new(vec!["name".into()]);
        let a = store.link_node(&["alice".into()]).unwrap();
        let a_again = store.link_node(&["alice".into()]).unwrap();
        assert_eq!(a, a_again);
        let b = store.link_node(&["bob".into()]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_unknown_primary_key_fails() {
        let store = NodeAttrStore::new(vec!["name".into()]);
        assert!(store.resolve(&["ghost".into()]).is_err());
    }

    #[test]
    fn primary_key_attribute_is_immutable_once_linked() {
        let mut store = NodeAttrStore::new(vec!["name".into()]);
        let a = store.link_node(&["alice".into()]).unwrap();
        assert!(store.set_attribute(a, "name", "eve".into()).is_err());
        assert!(store.set_attribute(a, "age", "30".into()).is_ok());
        assert_eq!(store.get_attribute(a, "age"), Some("30"));
    }

    #[test]
    fn wrong_arity_primary_key_is_invalid_argument() {
        let mut store = NodeAttrStore::new(vec!["a".into(), "b".into()]);
        assert!(store.link_node(&["only-one".into()]).is_err());
    }
}
