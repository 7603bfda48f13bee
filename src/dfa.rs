//! Subset construction: turns the item NFA into a deterministic automaton.
//!
//! Grounded on `PushDownAutomaton::toDFA`/`makeClosure`/`transit`
//! (`automata/PushDownAutomaton.cpp`): epsilon-close a state set, then for
//! every action with at least one receiver in the closure, transit and
//! re-close, canonicalizing each resulting closure by content in an
//! `IndexMap<Closure, StateID>` so the BFS terminates.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::bitset::BitSet;
use crate::grammar::Grammar;
use crate::index::{StateId, StateVec, SymbolId};
use crate::nfa::Nfa;
use crate::trace::StepTracer;

#[derive(Clone, Debug)]
pub struct DfaState {
    /// The NFA states this DFA state represents, as an epsilon-closed set.
    pub closure: BitSet<StateId>,
}

#[derive(Clone, Debug)]
pub struct Dfa {
    pub states: StateVec<DfaState>,
    pub out: StateVec<Vec<(SymbolId, StateId)>>,
    pub start: StateId,
}

fn epsilon_closure(nfa: &Nfa, grammar: &Grammar, seed: &[StateId]) -> BitSet<StateId> {
    let universe = nfa.states.len();
    let mut closure: BitSet<StateId> = BitSet::new(universe);
    let mut stack: Vec<StateId> = Vec::new();
    let epsilon = nfa.epsilon_action(grammar);
    for &s in seed {
        if closure.insert(s) {
            stack.push(s);
        }
    }
    while let Some(s) = stack.pop() {
        for &(action, to) in &nfa.out[s] {
            if action == epsilon && closure.insert(to) {
                stack.push(to);
            }
        }
    }
    closure
}

/// All actions (non-epsilon) with at least one receiver in `closure`, sorted
/// and deduplicated so the DFA's outgoing transitions end up action-ordered.
fn receivers(nfa: &Nfa, grammar: &Grammar, closure: &BitSet<StateId>) -> Vec<SymbolId> {
    let epsilon = nfa.epsilon_action(grammar);
    let mut actions: Vec<SymbolId> = Vec::new();
    for s in closure.iter() {
        for &(action, _) in &nfa.out[s] {
            if action != epsilon {
                actions.push(action);
            }
        }
    }
    actions.sort_by_key(|a| a.0);
    actions.dedup();
    actions
}

fn transit(nfa: &Nfa, grammar: &Grammar, closure: &BitSet<StateId>, action: SymbolId) -> BitSet<StateId> {
    let mut seed = Vec::new();
    for s in closure.iter() {
        for &(a, to) in &nfa.out[s] {
            if a == action {
                seed.push(to);
            }
        }
    }
    epsilon_closure(nfa, grammar, &seed)
}

pub fn build_dfa(grammar: &Grammar, nfa: &Nfa, tracer: &mut dyn StepTracer) -> Dfa {
    let start_closure = epsilon_closure(nfa, grammar, &[nfa.start]);

    let mut states: StateVec<DfaState> = StateVec::new();
    let mut out: StateVec<Vec<(SymbolId, StateId)>> = StateVec::new();
    let mut canon: IndexMap<BitSet<StateId>, StateId> = IndexMap::new();

    let start = states.push(DfaState { closure: start_closure.clone() });
    out.push(Vec::new());
    canon.insert(start_closure, start);

    let mut queue: VecDeque<StateId> = VecDeque::new();
    queue.push_back(start);

    while let Some(state) = queue.pop_front() {
        let closure = states[state].closure.clone();
        for action in receivers(nfa, grammar, &closure) {
            let target_closure = transit(nfa, grammar, &closure, action);
            if target_closure.is_empty() {
                continue;
            }
            let target = match canon.get(&target_closure) {
                Some(&id) => id,
                None => {
                    let id = states.push(DfaState { closure: target_closure.clone() });
                    out.push(Vec::new());
                    canon.insert(target_closure, id);
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

    tracer.section("DFA");
    let labels = grammar.kernel_labels();
    for id in states.indices() {
        let label = states[id]
            .closure
            .iter()
            .map(|s| labels[nfa.states[s].item.production][nfa.states[s].item.dot].as_str())
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
        if states[id].closure.contains(nfa.accept) {
            tracer.set_final(id.0);
        }
    }

    Dfa { states, out, start }
}
