//! Item automaton builder (NFA).
//!
//! Grounded on `LRParser::buildNFA` in the original `LRParser.cpp`: one
//! state per (production, dot) pair under a seed's lookahead constraint,
//! linked by rhs symbols, with epsilon edges added only after every seed in
//! the work stack has been drained (a seed's full set of start-dot states is
//! not complete until then).

use std::collections::HashMap;

use crate::bitset::BitSet;
use crate::config::Variant;
use crate::grammar::Grammar;
use crate::index::{ConstraintId, StateId, StateVec, SymbolId};
use crate::items::Item;
use crate::pool::ConstraintPool;
use crate::trace::StepTracer;
use crate::variant;

#[derive(Clone, Copy, Debug)]
pub struct NfaState {
    pub item: Item,
    pub constraint: ConstraintId,
}

/// Nondeterministic item automaton. `out[s]` holds `s`'s outgoing
/// transitions sorted by action id (epsilon's action id equals the
/// epsilon symbol's id), so per-action lookups are a binary search away.
#[derive(Clone, Debug)]
pub struct Nfa {
    pub states: StateVec<NfaState>,
    pub out: StateVec<Vec<(SymbolId, StateId)>>,
    pub start: StateId,
    pub accept: StateId,
}

impl Nfa {
    pub fn epsilon_action(&self, grammar: &Grammar) -> SymbolId {
        grammar.epsilon()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum SeedKey {
    BySymbol(SymbolId),
    BySymbolConstraint(SymbolId, ConstraintId),
}

fn seed_key(variant: Variant, symbol: SymbolId, constraint: ConstraintId) -> SeedKey {
    if variant::seed_distinguishes_constraint(variant) {
        SeedKey::BySymbolConstraint(symbol, constraint)
    } else {
        SeedKey::BySymbol(symbol)
    }
}

pub fn all_terminals_constraint(grammar: &Grammar) -> BitSet<SymbolId> {
    let universe = grammar.symbols().len();
    let epsilon = grammar.epsilon();
    let mut c = BitSet::new(universe);
    for sym in grammar.symbols().iter() {
        if sym.is_terminal() && sym.id != epsilon {
            c.insert(sym.id);
        }
    }
    c
}

pub fn build_nfa(
    grammar: &Grammar,
    variant: Variant,
    pool: &mut ConstraintPool,
    tracer: &mut dyn StepTracer,
) -> Nfa {
    let universe = grammar.symbols().len();
    let all_terminals = all_terminals_constraint(grammar);
    let all_terminals_id = pool.intern(all_terminals.clone());

    let mut states: StateVec<NfaState> = StateVec::new();
    let mut out: StateVec<Vec<(SymbolId, StateId)>> = StateVec::new();

    macro_rules! push_state {
        ($item:expr, $constraint:expr) => {{
            let id = states.push(NfaState {
                item: $item,
                constraint: $constraint,
            });
            out.push(Vec::new());
            id
        }};
    }

    let aug_prod = grammar
        .augmented_production()
        .expect("grammar must be finalized before building the NFA");
    let start_symbol = grammar.start().expect("grammar must have a start symbol");
    let eoi = grammar.end_of_input();

    let mut eoi_constraint = BitSet::new(universe);
    eoi_constraint.insert(eoi);
    let eoi_constraint_id = pool.intern(eoi_constraint);

    let q0 = push_state!(Item::start(aug_prod), eoi_constraint_id);
    let q_accept = push_state!(Item { production: aug_prod, dot: 1 }, eoi_constraint_id);
    out[q0].push((start_symbol, q_accept));

    let mut seed_states: HashMap<SeedKey, Vec<StateId>> = HashMap::new();
    let mut seed_constraints: HashMap<SeedKey, ConstraintId> = HashMap::new();
    let mut epsilon_links: HashMap<StateId, SeedKey> = HashMap::new();
    let mut stack: Vec<SeedKey> = Vec::new();

    let mut enqueue = |seed_states: &mut HashMap<SeedKey, Vec<StateId>>,
                        seed_constraints: &mut HashMap<SeedKey, ConstraintId>,
                        stack: &mut Vec<SeedKey>,
                        epsilon_links: &mut HashMap<StateId, SeedKey>,
                        from: StateId,
                        symbol: SymbolId,
                        constraint: ConstraintId| {
        let key = seed_key(variant, symbol, constraint);
        if !seed_states.contains_key(&key) {
            seed_states.insert(key, Vec::new());
            seed_constraints.insert(key, constraint);
            stack.push(key);
        }
        epsilon_links.insert(from, key);
    };

    // The augmented production's own body (S' -> S) seeds the start symbol,
    // under the constraint the active variant's policy assigns to it.
    let start_seed_constraint = pool.get(eoi_constraint_id).clone();
    let start_local = variant::resolve_local_constraints(
        grammar,
        variant,
        &start_seed_constraint,
        &all_terminals,
        aug_prod,
        0,
    );
    let start_local_id = pool.intern(start_local);
    enqueue(
        &mut seed_states,
        &mut seed_constraints,
        &mut stack,
        &mut epsilon_links,
        q0,
        start_symbol,
        start_local_id,
    );

    while let Some(key) = stack.pop() {
        let constraint_id = seed_constraints[&key];
        let symbol = match key {
            SeedKey::BySymbol(s) => s,
            SeedKey::BySymbolConstraint(s, _) => s,
        };

        let production_ids = grammar.symbol(symbol).productions.clone();
        for pid in production_ids {
            let rhs_len = grammar.production(pid).rhs.len();
            let first_state = states.len();
            for i in 0..=rhs_len {
                let _ = push_state!(Item { production: pid, dot: i }, constraint_id);
            }
            let first_state_id = StateId(first_state);
            for i in 0..rhs_len {
                let s1 = StateId(first_state + i);
                let s2 = StateId(first_state + i + 1);
                let sym = grammar.production(pid).rhs[i];
                out[s1].push((sym, s2));
                if grammar.symbol(sym).is_nonterminal() {
                    let parent = pool.get(constraint_id).clone();
                    let local = variant::resolve_local_constraints(
                        grammar,
                        variant,
                        &parent,
                        &all_terminals,
                        pid,
                        i,
                    );
                    let local_id = pool.intern(local);
                    enqueue(
                        &mut seed_states,
                        &mut seed_constraints,
                        &mut stack,
                        &mut epsilon_links,
                        s1,
                        sym,
                        local_id,
                    );
                }
            }
            seed_states.get_mut(&key).unwrap().push(first_state_id);
        }
    }

    for (&from, key) in epsilon_links.iter() {
        for &to in &seed_states[key] {
            out[from].push((grammar.epsilon(), to));
        }
    }

    for transitions in out.iter_mut() {
        transitions.sort_by_key(|(action, _)| action.0);
    }

    let _ = all_terminals_id;

    tracer.section("NFA");
    let labels = grammar.kernel_labels();
    for id in states.indices() {
        let item = states[id].item;
        tracer.add_state(id.0, &labels[item.production][item.dot]);
    }
    for from in out.indices() {
        for &(action, to) in &out[from] {
            tracer.add_edge(from.0, to.0, &grammar.symbol(action).name);
        }
    }
    tracer.set_start(q0.0);
    tracer.set_final(q_accept.0);

    Nfa {
        states,
        out,
        start: q0,
        accept: q_accept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::compute_attributes;

    fn arith_grammar() -> Grammar {
        let mut g = Grammar::new();
        g.set_start("E", 1).unwrap();
        let e = g.symbol_id("E").unwrap();
        let plus = g.put_symbol("+", true);
        let t = g.put_symbol("T", false);
        g.add_production(e, vec![e, plus, t]);
        g.add_production(e, vec![t]);
        let id = g.put_symbol("id", true);
        g.add_production(t, vec![id]);
        g.finalize(false).unwrap();
        compute_attributes(&mut g, &mut crate::trace::NullTracer);
        g
    }

    #[test]
    fn start_state_has_transition_to_accept() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut crate::trace::NullTracer);
        assert_eq!(nfa.states[nfa.start].item.dot, 0);
        assert!(nfa.out[nfa.start].iter().any(|(_, to)| *to == nfa.accept));
    }

    #[test]
    fn every_state_for_a_production_is_created() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Lr0, &mut pool, &mut crate::trace::NullTracer);
        // E -> E + T has 4 items (dot at 0..=3); E -> T has 2; T -> id has 2;
        // plus the 2 augmented-production states.
        assert_eq!(nfa.states.len(), 4 + 2 + 2 + 2);
    }
}
