//! Per-variant lookahead-constraint policy.
//!
//! The original repository expresses LR(0)/SLR(1)/LR(1)/LALR(1) as
//! subclasses overriding a handful of virtual methods
//! (`LRParser::resolveLocalConstraints`, see `LR0Parser.h`/`SLRParser.h`/
//! `LR1Parser.h`/`LALRParser.h`). This crate replaces that subclass
//! hierarchy with the `Variant` sum type (`config.rs`) plus this one trait,
//! matched on directly rather than dispatched virtually.

use crate::bitset::BitSet;
use crate::config::Variant;
use crate::grammar::Grammar;
use crate::index::{ProductionId, SymbolId};

/// Resolves the lookahead constraint attached to a new seed created while
/// closing over `production`'s body at `rhs_index` (the position of the
/// nonterminal that seeds the dependency), given the parent item's own
/// constraint `parent`.
///
/// LALR(1) is a special case: NFA construction always uses the LR(0) policy
/// as a placeholder (`Variant::Lr0`'s branch below), since the LALR builder
/// (`lalr.rs`) recomputes real constraints itself once it has the shared
/// LR(0) item graph in hand.
pub fn resolve_local_constraints(
    grammar: &Grammar,
    variant: Variant,
    parent: &BitSet<SymbolId>,
    all_terminals: &BitSet<SymbolId>,
    production: ProductionId,
    rhs_index: usize,
) -> BitSet<SymbolId> {
    match variant {
        Variant::Lr0 | Variant::Lalr => all_terminals.clone(),
        Variant::Slr => {
            let symbol = grammar.production(production).rhs[rhs_index];
            let mut c = BitSet::new(all_terminals.universe());
            for t in &grammar.symbol(symbol).follow {
                c.insert(*t);
            }
            c
        }
        Variant::Lr1 => lr1_local_constraint(grammar, parent, all_terminals.universe(), production, rhs_index),
    }
}

/// The LR(1)/LALR(1) formula, shared between the NFA builder (LR(1) variant)
/// and the LALR kernel-merge builder (§4.5 of the spec), since both need
/// exactly the same "FIRST of what follows, plus the parent constraint if
/// that suffix is all-nullable" computation.
pub fn lr1_local_constraint(
    grammar: &Grammar,
    parent: &BitSet<SymbolId>,
    universe: usize,
    production: ProductionId,
    rhs_index: usize,
) -> BitSet<SymbolId> {
    let rhs = &grammar.production(production).rhs;
    let suffix = &rhs[rhs_index + 1..];
    let (first_set, all_nullable) = crate::attrs::first_of_sequence(grammar, suffix);
    let mut c = BitSet::new(universe);
    for t in first_set {
        c.insert(t);
    }
    if all_nullable {
        c.union_with(parent);
    }
    c
}

/// Whether this variant's NFA seed canonicalization distinguishes seeds by
/// their lookahead constraint (LR(1)) or collapses on symbol alone
/// (LR(0)/SLR(1)/LALR(1), which resolve the real lookahead later or never).
pub fn seed_distinguishes_constraint(variant: Variant) -> bool {
    matches!(variant, Variant::Lr1)
}
