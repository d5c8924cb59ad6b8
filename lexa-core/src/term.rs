//! Term ↔ ID mapping
//!
//! Dense integer identifiers are handed out on first encounter and never
//! reused, so an ID stays valid for the whole run even if the cells that
//! referenced it are cleared.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense term identifier
pub type TermId = u32;

/// Bidirectional term ↔ ID map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermIndex {
    /// id → term (the id is the position)
    terms: Vec<String>,
    /// term → id
    ids: HashMap<String, TermId>,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a term, assigning the next ID if it was never seen
    pub fn get_or_assign_id(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.to_string());
        self.ids.insert(term.to_string(), id);
        id
    }

    /// ID of a known term
    pub fn id_of(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    /// Term behind an ID
    pub fn term_of(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All terms in ID order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut index = TermIndex::new();
        assert_eq!(index.get_or_assign_id("猫"), 0);
        assert_eq!(index.get_or_assign_id("犬"), 1);
        assert_eq!(index.get_or_assign_id("猫"), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_both_directions_agree() {
        let mut index = TermIndex::new();
        for term in ["a", "b", "c"] {
            index.get_or_assign_id(term);
        }
        for term in ["a", "b", "c"] {
            let id = index.id_of(term).unwrap();
            assert_eq!(index.term_of(id), Some(term));
        }
        assert_eq!(index.id_of("zzz"), None);
        assert_eq!(index.term_of(99), None);
    }
}
