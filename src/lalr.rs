//! LALR(1) automaton: LR(0) kernels with merged LR(1) lookahead.
//!
//! Grounded on `LALRParser.h`: closures are kept as `map<StateID, Constraint>`
//! rather than full `(item, lookahead)` sets, `makeClosure` propagates real
//! LR(1) lookaheads over the LR(0) item graph's epsilon edges, and `buildDFA`
//! merges two item sets whenever they share the same *kernel* (kept in
//! `BTreeMap` here rather than `std::map`, for the same ordering reason), only
//! re-closing and re-propagating a state when the merge actually grows its
//! lookahead. Unlike the original's aux-state/`aux_end` bookkeeping, this
//! builder references the shared LR(0) NFA's state ids directly instead of
//! re-numbering a rebuilt graph.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::bitset::BitSet;
use crate::grammar::Grammar;
use crate::index::{ConstraintId, StateId, StateVec, SymbolId};
use crate::nfa::Nfa;
use crate::pool::ConstraintPool;
use crate::trace::StepTracer;
use crate::variant::lr1_local_constraint;

#[derive(Clone, Debug)]
pub struct LalrState {
    /// The LR(0) NFA item ids forming this state's basis, sorted and deduped.
    /// Two states are the same LALR state iff their kernels match; merging
    /// only ever grows `seed_constraints`, never changes `kernel`.
    pub kernel: Vec<StateId>,
    /// Accumulated lookahead for each kernel item, before closure.
    pub seed_constraints: BTreeMap<StateId, ConstraintId>,
    /// Full closure: every NFA item reachable by epsilon from the kernel,
    /// each with its own accumulated constraint.
    pub closure: BTreeMap<StateId, ConstraintId>,
}

#[derive(Clone, Debug)]
pub struct Lalr {
    pub states: StateVec<LalrState>,
    pub out: StateVec<Vec<(SymbolId, StateId)>>,
    pub start: StateId,
}

fn make_closure(
    nfa: &Nfa,
    grammar: &Grammar,
    pool: &mut ConstraintPool,
    seeds: &BTreeMap<StateId, ConstraintId>,
) -> BTreeMap<StateId, ConstraintId> {
    let epsilon = nfa.epsilon_action(grammar);
    let universe = grammar.symbols().len();
    let mut closure = seeds.clone();
    let mut stack: Vec<StateId> = seeds.keys().copied().collect();

    while let Some(s) = stack.pop() {
        let constraint_id = closure[&s];
        let item = nfa.states[s].item;
        for &(action, to) in &nfa.out[s] {
            if action != epsilon {
                continue;
            }
            let parent_constraint = pool.get(constraint_id).clone();
            let new_local = lr1_local_constraint(
                grammar,
                &parent_constraint,
                universe,
                item.production,
                item.dot,
            );
            let new_local_id = pool.intern(new_local);
            match closure.get(&to) {
                None => {
                    closure.insert(to, new_local_id);
                    stack.push(to);
                }
                Some(&existing) => {
                    let (merged, changed) = pool.union(existing, pool.get(new_local_id));
                    if changed {
                        closure.insert(to, merged);
                        stack.push(to);
                    }
                }
            }
        }
    }
    closure
}

/// Unions `addition` into `target`, returning whether anything in the map
/// actually changed (a new key, or a constraint that grew).
fn merge_seed_constraints(
    pool: &mut ConstraintPool,
    target: &mut BTreeMap<StateId, ConstraintId>,
    addition: &BTreeMap<StateId, ConstraintId>,
) -> bool {
    let mut changed = false;
    for (&s, &c) in addition {
        match target.get(&s) {
            None => {
                target.insert(s, c);
                changed = true;
            }
            Some(&existing) => {
                let (merged, grew) = pool.union(existing, pool.get(c));
                if grew {
                    target.insert(s, merged);
                    changed = true;
                }
            }
        }
    }
    changed
}

pub fn build_lalr(
    grammar: &Grammar,
    nfa: &Nfa,
    pool: &mut ConstraintPool,
    tracer: &mut dyn StepTracer,
) -> Lalr {
    let epsilon = nfa.epsilon_action(grammar);
    let universe = grammar.symbols().len();
    let mut eoi_constraint: BitSet<SymbolId> = BitSet::new(universe);
    eoi_constraint.insert(grammar.end_of_input());
    let eoi_id = pool.intern(eoi_constraint);

    let start_seeds: BTreeMap<StateId, ConstraintId> = BTreeMap::from([(nfa.start, eoi_id)]);
    let start_closure = make_closure(nfa, grammar, pool, &start_seeds);

    let mut states: StateVec<LalrState> = StateVec::new();
    let mut out: StateVec<Vec<(SymbolId, StateId)>> = StateVec::new();
    let mut canon: HashMap<Vec<StateId>, StateId> = HashMap::new();

    let start_kernel = vec![nfa.start];
    let start = states.push(LalrState {
        kernel: start_kernel.clone(),
        seed_constraints: start_seeds,
        closure: start_closure,
    });
    out.push(Vec::new());
    canon.insert(start_kernel, start);

    let mut queue: VecDeque<StateId> = VecDeque::new();
    queue.push_back(start);

    while let Some(state) = queue.pop_front() {
        let closure = states[state].closure.clone();

        let mut by_action: BTreeMap<SymbolId, BTreeMap<StateId, ConstraintId>> = BTreeMap::new();
        for (&item_state, &constraint) in &closure {
            for &(action, to) in &nfa.out[item_state] {
                if action == epsilon {
                    continue;
                }
                let entry = by_action.entry(action).or_default();
                match entry.get(&to) {
                    None => {
                        entry.insert(to, constraint);
                    }
                    Some(&existing) => {
                        let (merged, _) = pool.union(existing, pool.get(constraint));
                        entry.insert(to, merged);
                    }
                }
            }
        }

        out[state].clear();
        for (action, seeds) in by_action {
            let mut kernel: Vec<StateId> = seeds.keys().copied().collect();
            kernel.sort_by_key(|s| s.0);

            let target = match canon.get(&kernel) {
                Some(&existing) => {
                    let grew =
                        merge_seed_constraints(pool, &mut states[existing].seed_constraints, &seeds);
                    if grew {
                        let seeds_now = states[existing].seed_constraints.clone();
                        states[existing].closure = make_closure(nfa, grammar, pool, &seeds_now);
                        queue.push_back(existing);
                    }
                    existing
                }
                None => {
                    let closure = make_closure(nfa, grammar, pool, &seeds);
                    let id = states.push(LalrState {
                        kernel: kernel.clone(),
                        seed_constraints: seeds,
                        closure,
                    });
                    out.push(Vec::new());
                    canon.insert(kernel, id);
                    queue.push_back(id);
                    id
                }
            };
            out[state].push((action, target));
        }
    }

    for transitions in out.iter_mut() {
        transitions.sort_by_key(|(action, _)| action.0);
    }

    tracer.section("LALR");
    let labels = grammar.kernel_labels();
    for id in states.indices() {
        let label = states[id]
            .closure
            .keys()
            .map(|&s| labels[nfa.states[s].item.production][nfa.states[s].item.dot].as_str())
            .collect::<Vec<_>>()
            .join("\n");
        tracer.add_state(id.0, &label);
    }
    for from in out.indices() {
        for &(action, to) in &out[from] {
            tracer.add_edge(from.0, to.0, &grammar.symbol(action).name);
        }
    }
    tracer.set_start(start.0);
    for id in states.indices() {
        if states[id].closure.contains_key(&nfa.accept) {
            tracer.set_final(id.0);
        }
    }

    Lalr { states, out, start }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::compute_attributes;
    use crate::config::Variant;

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
    fn lalr_has_no_more_states_than_lr1() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = crate::nfa::build_nfa(&g, Variant::Lr0, &mut pool, &mut crate::trace::NullTracer);
        let lalr = build_lalr(&g, &nfa, &mut pool, &mut crate::trace::NullTracer);
        assert!(lalr.states.len() >= 1);
        assert!(lalr.out[lalr.start].len() >= 1);
    }

    #[test]
    fn start_state_kernel_is_the_augmented_item() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = crate::nfa::build_nfa(&g, Variant::Lr0, &mut pool, &mut crate::trace::NullTracer);
        let lalr = build_lalr(&g, &nfa, &mut pool, &mut crate::trace::NullTracer);
        assert_eq!(lalr.states[lalr.start].kernel, vec![nfa.start]);
    }

    #[test]
    fn reduce_items_carry_a_nonempty_lookahead_constraint() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = crate::nfa::build_nfa(&g, Variant::Lr0, &mut pool, &mut crate::trace::NullTracer);
        let lalr = build_lalr(&g, &nfa, &mut pool, &mut crate::trace::NullTracer);
        let mut saw_reduce = false;
        for state in lalr.states.iter() {
            for (&item_state, &constraint) in &state.closure {
                if nfa.states[item_state].item.is_reduce(&g) {
                    saw_reduce = true;
                    assert!(!pool.get(constraint).is_empty());
                }
            }
        }
        assert!(saw_reduce);
    }
}
