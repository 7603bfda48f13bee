//! Fixed-universe bitset used for lookahead constraints and state closures.
//!
//! Grounded on the original `util::BitSet<T>` (`automata/PushDownAutomaton.h`
//! aliases `Constraint = BitSet<ActionID>` and `Closure = BitSet<StateID>`);
//! the original's own comment on `Closure` ("BitSet: ~1.4s, HashSet: Result
//! is incorrect") is why this crate represents both as a packed bitset rather
//! than a `HashSet` of indices. This is intentionally a minimal, crate-local
//! container, not a published general-purpose abstraction.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

const BITS: usize = 64;

#[derive(Clone, Debug, Default)]
pub struct BitSet<Idx> {
    words: Vec<u64>,
    universe: usize,
    _marker: PhantomData<Idx>,
}

impl<Idx: Into<usize> + From<usize> + Copy> BitSet<Idx> {
    pub fn new(universe: usize) -> Self {
        BitSet {
            words: vec![0u64; universe.div_ceil(BITS)],
            universe,
            _marker: PhantomData,
        }
    }

    pub fn universe(&self) -> usize {
        self.universe
    }

    pub fn insert(&mut self, idx: Idx) -> bool {
        let i: usize = idx.into();
        debug_assert!(i < self.universe);
        let word = i / BITS;
        let bit = 1u64 << (i % BITS);
        let changed = self.words[word] & bit == 0;
        self.words[word] |= bit;
        changed
    }

    pub fn contains(&self, idx: Idx) -> bool {
        let i: usize = idx.into();
        if i >= self.universe {
            return false;
        }
        self.words[i / BITS] & (1u64 << (i % BITS)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Unions `other` into `self`, returning whether anything changed.
    /// Used directly by the LALR merge-detection step to decide whether a
    /// state needs re-enqueueing.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let mut changed = false;
        for (a, b) in self.words.iter_mut().zip(other.words.iter()) {
            let before = *a;
            *a |= b;
            if *a != before {
                changed = true;
            }
        }
        changed
    }

    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// Ascending index order, needed for deterministic terminal enumeration
    /// in the table assembler and byte-identical emitted output.
    pub fn iter(&self) -> impl Iterator<Item = Idx> + '_ {
        (0..self.universe).filter_map(move |i| {
            if self.words[i / BITS] & (1u64 << (i % BITS)) != 0 {
                Some(Idx::from(i))
            } else {
                None
            }
        })
    }
}

impl<Idx> PartialEq for BitSet<Idx> {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}
impl<Idx> Eq for BitSet<Idx> {}

impl<Idx> Hash for BitSet<Idx> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words.hash(state);
    }
}
