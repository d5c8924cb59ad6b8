//! # Sparse Association Matrix
//!
//! Symmetric, term-indexed storage of pairwise co-occurrence counts.
//!
//! Every unordered pair `(a, b)` is stored once under the canonical key
//! `(min(id_a, id_b), max(id_a, id_b))`, so the upper triangle is all we
//! keep. Zero counts are never stored.
//!
//! ## Iteration order
//!
//! Rows come out in the order they were first inserted, columns within a row
//! in the order they were first inserted. The order is stable for the whole
//! run but is not part of any persisted contract.

use std::collections::HashMap;

use crate::term::{TermId, TermIndex};

/// One row of the upper triangle
#[derive(Debug, Clone, Default)]
struct Row {
    counts: HashMap<TermId, u64>,
    /// Column insertion order
    order: Vec<TermId>,
}

/// Sparse symmetric co-occurrence counts
#[derive(Debug, Clone, Default)]
pub struct SparseAssociationMatrix {
    index: TermIndex,
    rows: HashMap<TermId, Row>,
    /// Row insertion order
    row_order: Vec<TermId>,
    /// column id → rows holding it (row != column), for lower-triangle lookups
    column_rows: HashMap<TermId, Vec<TermId>>,
    /// Number of stored non-zero cells
    size: usize,
}

#[inline]
fn canonical(a: TermId, b: TermId) -> (TermId, TermId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SparseAssociationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID of a term, assigned on first encounter
    pub fn get_or_assign_id(&mut self, term: &str) -> TermId {
        self.index.get_or_assign_id(term)
    }

    /// Term ↔ ID map backing this matrix
    pub fn terms(&self) -> &TermIndex {
        &self.index
    }

    /// Store `count` for the unordered pair. A zero count removes the cell.
    pub fn set(&mut self, term_a: &str, term_b: &str, count: u64) {
        let a = self.index.get_or_assign_id(term_a);
        let b = self.index.get_or_assign_id(term_b);
        self.set_ids(a, b, count);
    }

    /// Add `delta` to the pair and return the new count
    pub fn increment(&mut self, term_a: &str, term_b: &str, delta: u64) -> u64 {
        let a = self.index.get_or_assign_id(term_a);
        let b = self.index.get_or_assign_id(term_b);
        let count = self.get_ids(a, b).saturating_add(delta);
        self.set_ids(a, b, count);
        count
    }

    /// Count for the unordered pair; 0 for unknown terms or absent cells
    pub fn get(&self, term_a: &str, term_b: &str) -> u64 {
        match (self.index.id_of(term_a), self.index.id_of(term_b)) {
            (Some(a), Some(b)) => self.get_ids(a, b),
            _ => 0,
        }
    }

    /// Count for an ID pair; 0 when absent
    pub fn get_ids(&self, a: TermId, b: TermId) -> u64 {
        let (row, col) = canonical(a, b);
        self.rows
            .get(&row)
            .and_then(|r| r.counts.get(&col))
            .copied()
            .unwrap_or(0)
    }

    fn set_ids(&mut self, a: TermId, b: TermId, count: u64) {
        let (row_id, col_id) = canonical(a, b);

        if count == 0 {
            self.remove_cell(row_id, col_id);
            return;
        }

        if !self.rows.contains_key(&row_id) {
            self.row_order.push(row_id);
        }
        let row = self.rows.entry(row_id).or_default();
        if row.counts.insert(col_id, count).is_none() {
            row.order.push(col_id);
            self.size += 1;
            if row_id != col_id {
                self.column_rows.entry(col_id).or_default().push(row_id);
            }
        }
    }

    fn remove_cell(&mut self, row_id: TermId, col_id: TermId) {
        let Some(row) = self.rows.get_mut(&row_id) else {
            return;
        };
        if row.counts.remove(&col_id).is_none() {
            return;
        }
        row.order.retain(|c| *c != col_id);
        self.size -= 1;

        if row.counts.is_empty() {
            self.rows.remove(&row_id);
            self.row_order.retain(|r| *r != row_id);
        }
        if row_id != col_id {
            if let Some(rows) = self.column_rows.get_mut(&col_id) {
                rows.retain(|r| *r != row_id);
                if rows.is_empty() {
                    self.column_rows.remove(&col_id);
                }
            }
        }
    }

    /// Lazy sequence of `(neighbor term, count)` for an ID
    pub fn neighbors(&self, id: TermId) -> impl Iterator<Item = (&str, u64)> + '_ {
        let upper = self.rows.get(&id).into_iter().flat_map(|row| {
            row.order
                .iter()
                .map(move |col| (*col, row.counts.get(col).copied().unwrap_or(0)))
        });
        let lower = self
            .column_rows
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |row_id| (*row_id, self.get_ids(*row_id, id)));

        upper
            .chain(lower)
            .filter_map(move |(other, count)| self.index.term_of(other).map(|t| (t, count)))
    }

    /// Neighbors of a term; empty for unknown terms
    pub fn neighbors_of<'a>(&'a self, term: &str) -> Box<dyn Iterator<Item = (&'a str, u64)> + 'a> {
        match self.index.id_of(term) {
            Some(id) => Box::new(self.neighbors(id)),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Number of distinct neighbors of a term
    pub fn neighbor_count(&self, term: &str) -> usize {
        self.neighbors_of(term).count()
    }

    /// Lazy sequence of every stored `(term_a, term_b, count)`, term_a's ID ≤ term_b's
    pub fn all(&self) -> impl Iterator<Item = (&str, &str, u64)> + '_ {
        self.row_order.iter().flat_map(move |row_id| {
            let row = &self.rows[row_id];
            row.order.iter().filter_map(move |col_id| {
                let a = self.index.term_of(*row_id)?;
                let b = self.index.term_of(*col_id)?;
                Some((a, b, row.counts.get(col_id).copied().unwrap_or(0)))
            })
        })
    }

    /// Drop every cell. Term IDs survive so they are never reused.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.row_order.clear();
        self.column_rows.clear();
        self.size = 0;
    }

    /// Number of stored non-zero cells
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of terms ever seen
    pub fn term_count(&self) -> usize {
        self.index.len()
    }

    /// Sum of all stored counts
    pub fn total_count(&self) -> u64 {
        self.rows
            .values()
            .flat_map(|r| r.counts.values())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_get() {
        let mut m = SparseAssociationMatrix::new();
        m.set("猫", "犬", 5);
        assert_eq!(m.get("猫", "犬"), 5);
        assert_eq!(m.get("犬", "猫"), 5);
    }

    #[test]
    fn test_unknown_term_is_zero() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "b", 2);
        assert_eq!(m.get("a", "zzz"), 0);
        assert_eq!(m.get("x", "y"), 0);
        // Lookups never assign IDs
        assert_eq!(m.term_count(), 2);
    }

    #[test]
    fn test_size_counts_distinct_cells() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "b", 1);
        m.set("a", "c", 1);
        m.set("b", "c", 1);
        assert_eq!(m.size(), 3);

        // Overwrite in either order doesn't grow
        m.set("b", "a", 7);
        assert_eq!(m.size(), 3);
        assert_eq!(m.get("a", "b"), 7);
    }

    #[test]
    fn test_zero_removes_cell() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "b", 4);
        m.set("a", "b", 0);
        assert_eq!(m.size(), 0);
        assert_eq!(m.get("a", "b"), 0);
        assert_eq!(m.neighbor_count("a"), 0);
    }

    #[test]
    fn test_increment() {
        let mut m = SparseAssociationMatrix::new();
        assert_eq!(m.increment("x", "y", 2), 2);
        assert_eq!(m.increment("y", "x", 3), 5);
        assert_eq!(m.size(), 1);
    }

    #[test]
    fn test_neighbors_cover_both_triangles() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "b", 1); // a=0, b=1
        m.set("c", "b", 2); // c=2, stored under (1, 2)
        m.set("b", "b", 3);

        let id_b = m.terms().id_of("b").unwrap();
        let mut neighbors: Vec<(String, u64)> = m
            .neighbors(id_b)
            .map(|(t, c)| (t.to_string(), c))
            .collect();
        neighbors.sort();
        assert_eq!(
            neighbors,
            vec![("a".to_string(), 1), ("b".to_string(), 3), ("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_all_follows_insertion_order() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "c", 1);
        m.set("a", "b", 2);
        m.set("b", "c", 3);

        // IDs: a=0, c=1, b=2, so (b, c) is stored as (c, b)
        let cells: Vec<_> = m.all().collect();
        assert_eq!(cells, vec![("a", "c", 1), ("a", "b", 2), ("c", "b", 3)]);
        assert_eq!(m.total_count(), 6);
    }

    #[test]
    fn test_clear_keeps_ids() {
        let mut m = SparseAssociationMatrix::new();
        m.set("a", "b", 1);
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.get("a", "b"), 0);
        assert_eq!(m.get_or_assign_id("c"), 2);
    }
}
