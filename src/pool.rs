//! Content-hashed interning pool for lookahead constraints.
//!
//! Grounded on the original's `newConstraint`/`storeConstraint` pattern in
//! `LALRParser.h`: equal constraints should share one allocation so identity
//! comparison after interning is just an index comparison. Generalizes that
//! one-off `unordered_set<Constraint*>` into a reusable arena keyed by the
//! crate's own `BitSet` (already `Hash`/`Eq` by content, see `bitset.rs`).

use std::collections::HashMap;

use crate::bitset::BitSet;
use crate::index::{ConstraintId, ConstraintVec, SymbolId};

#[derive(Clone, Debug, Default)]
pub struct ConstraintPool {
    items: ConstraintVec<BitSet<SymbolId>>,
    index: HashMap<BitSet<SymbolId>, ConstraintId>,
}

impl ConstraintPool {
    pub fn new() -> Self {
        Self {
            items: ConstraintVec::new(),
            index: HashMap::new(),
        }
    }

    /// Interns `constraint`, returning the canonical id for its content.
    /// Duplicates are dropped; only the first occurrence of a given bitset
    /// content is ever stored.
    pub fn intern(&mut self, constraint: BitSet<SymbolId>) -> ConstraintId {
        if let Some(&id) = self.index.get(&constraint) {
            return id;
        }
        let id = self.items.push(constraint.clone());
        self.index.insert(constraint, id);
        id
    }

    pub fn get(&self, id: ConstraintId) -> &BitSet<SymbolId> {
        &self.items[id]
    }

    /// Unions `extra` into the constraint stored at `id` and re-interns the
    /// result, returning its (possibly new) canonical id plus whether the
    /// content actually changed. Used by the LALR builder's merge step.
    pub fn union(&mut self, id: ConstraintId, extra: &BitSet<SymbolId>) -> (ConstraintId, bool) {
        let mut merged = self.items[id].clone();
        let changed = merged.union_with(extra);
        if !changed {
            return (id, false);
        }
        (self.intern(merged), true)
    }
}
