//! Parse-table assembler: turns a finished automaton into SHIFT/REDUCE/GOTO/
//! ACCEPT entries, recording conflicts instead of silently picking a winner.
//!
//! Grounded on `LRParser::buildParseTable`/`singleParseTableEntry`/
//! `addParseTableEntry` in `LRParser.cpp`: terminal actions render as `sN`
//! (shift to state N), `rN` (reduce by production N) or `acc`; nonterminal
//! transitions render as a bare state number. The original builds one table
//! per concrete parser subclass by walking that subclass's own state graph;
//! `AutomatonForTable` is the generalization that lets LR(0)/SLR(1)/LR(1)
//! (over the subset-construction `Dfa`) and LALR(1) (over the merged `Lalr`)
//! share this one assembly routine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::dfa::Dfa;
use crate::grammar::Grammar;
use crate::index::{ProductionId, StateId, StateVec, SymbolId};
use crate::lalr::Lalr;
use crate::nfa::Nfa;
use crate::pool::ConstraintPool;
use crate::trace::StepTracer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseAction {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

impl fmt::Display for ParseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAction::Shift(s) => write!(f, "s{}", s.0),
            ParseAction::Reduce(p) => write!(f, "r{}", p.0),
            ParseAction::Accept => write!(f, "acc"),
        }
    }
}

/// A cell that ended up holding more than one distinct action, recorded by
/// coordinates per §4.6 ("insertion of a second distinct action records
/// `(s, x)` in the conflict list"); `actions` is the full set so a caller
/// can report what the choices actually were.
#[derive(Clone, Debug)]
pub struct Conflict {
    pub state: StateId,
    pub symbol: SymbolId,
    pub actions: Vec<ParseAction>,
}

/// Cells hold a *set* of actions (§3's data model), not a single winner: a
/// conflicted cell keeps every competing action so the recognizer can still
/// report which actions were available, matching the original's
/// `std::set<ParseAction>` table cell and its runtime `tableEntry.size()`
/// check rather than resolving the conflict at build time.
#[derive(Clone, Debug)]
pub struct ParseTable {
    pub action: StateVec<BTreeMap<SymbolId, BTreeSet<ParseAction>>>,
    pub goto: StateVec<BTreeMap<SymbolId, StateId>>,
    pub conflicts: Vec<Conflict>,
    pub start: StateId,
}

impl ParseTable {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Abstracts over the two automaton shapes (`Dfa` and `Lalr`) that can back a
/// parse table, so `assemble_table` is written once.
pub trait AutomatonForTable {
    fn state_count(&self) -> usize;
    fn start(&self) -> StateId;
    fn transitions(&self, state: StateId) -> Vec<(SymbolId, StateId)>;
    /// Every reduce item live in `state`, including the augmented
    /// production's; `assemble_table` filters the augmented one out since
    /// it is handled through `is_accept` instead.
    fn reduce_items(&self, state: StateId, grammar: &Grammar) -> Vec<(ProductionId, BitSetRef)>;
    fn is_accept(&self, state: StateId) -> bool;
}

/// A reduce item's lookahead, already resolved to a concrete terminal set by
/// the automaton (the NFA's own per-item constraint for LR(0)/SLR(1)/LR(1),
/// the merged closure constraint for LALR(1)).
pub type BitSetRef = crate::index::ConstraintId;

pub struct GenericAutomaton<'a> {
    pub dfa: &'a Dfa,
    pub nfa: &'a Nfa,
}

impl<'a> AutomatonForTable for GenericAutomaton<'a> {
    fn state_count(&self) -> usize {
        self.dfa.states.len()
    }

    fn start(&self) -> StateId {
        self.dfa.start
    }

    fn transitions(&self, state: StateId) -> Vec<(SymbolId, StateId)> {
        self.dfa.out[state].clone()
    }

    fn reduce_items(&self, state: StateId, grammar: &Grammar) -> Vec<(ProductionId, BitSetRef)> {
        let mut out = Vec::new();
        for s in self.dfa.states[state].closure.iter() {
            let item = self.nfa.states[s].item;
            if item.is_reduce(grammar) {
                out.push((item.production, self.nfa.states[s].constraint));
            }
        }
        out
    }

    fn is_accept(&self, state: StateId) -> bool {
        self.dfa.states[state].closure.contains(self.nfa.accept)
    }
}

pub struct LalrAutomaton<'a> {
    pub lalr: &'a Lalr,
    pub nfa: &'a Nfa,
}

impl<'a> AutomatonForTable for LalrAutomaton<'a> {
    fn state_count(&self) -> usize {
        self.lalr.states.len()
    }

    fn start(&self) -> StateId {
        self.lalr.start
    }

    fn transitions(&self, state: StateId) -> Vec<(SymbolId, StateId)> {
        self.lalr.out[state].clone()
    }

    fn reduce_items(&self, state: StateId, grammar: &Grammar) -> Vec<(ProductionId, BitSetRef)> {
        let mut out = Vec::new();
        for (&s, &constraint) in &self.lalr.states[state].closure {
            let item = self.nfa.states[s].item;
            if item.is_reduce(grammar) {
                out.push((item.production, constraint));
            }
        }
        out
    }

    fn is_accept(&self, state: StateId) -> bool {
        self.lalr.states[state].closure.contains_key(&self.nfa.accept)
    }
}

fn insert_action(action: &mut BTreeMap<SymbolId, BTreeSet<ParseAction>>, symbol: SymbolId, incoming: ParseAction) {
    action.entry(symbol).or_default().insert(incoming);
}

pub fn assemble_table<A: AutomatonForTable>(
    grammar: &Grammar,
    pool: &ConstraintPool,
    automaton: &A,
    tracer: &mut dyn StepTracer,
) -> ParseTable {
    tracer.section("Parse table");
    let augmented = grammar.augmented_production();
    let n = automaton.state_count();
    let mut action: StateVec<BTreeMap<SymbolId, BTreeSet<ParseAction>>> = StateVec::with_capacity(n);
    let mut goto: StateVec<BTreeMap<SymbolId, StateId>> = StateVec::with_capacity(n);
    for _ in 0..n {
        action.push(BTreeMap::new());
        goto.push(BTreeMap::new());
    }

    for i in 0..n {
        let state = StateId(i);
        for (symbol, target) in automaton.transitions(state) {
            if grammar.symbol(symbol).is_terminal() {
                insert_action(&mut action[state], symbol, ParseAction::Shift(target));
                tracer.add_table_entry(state.0, &grammar.symbol(symbol).name, &ParseAction::Shift(target).to_string());
            } else {
                goto[state].insert(symbol, target);
                tracer.add_table_entry(state.0, &grammar.symbol(symbol).name, &target.0.to_string());
            }
        }

        if automaton.is_accept(state) {
            insert_action(&mut action[state], grammar.end_of_input(), ParseAction::Accept);
            tracer.add_table_entry(state.0, &grammar.symbol(grammar.end_of_input()).name, "acc");
        }

        for (production, constraint) in automaton.reduce_items(state, grammar) {
            if Some(production) == augmented {
                continue;
            }
            for terminal in pool.get(constraint).iter() {
                insert_action(&mut action[state], terminal, ParseAction::Reduce(production));
                tracer.add_table_entry(
                    state.0,
                    &grammar.symbol(terminal).name,
                    &ParseAction::Reduce(production).to_string(),
                );
            }
        }
    }

    let mut conflicts = Vec::new();
    for i in 0..n {
        let state = StateId(i);
        for (&symbol, actions) in &action[state] {
            if actions.len() > 1 {
                conflicts.push(Conflict {
                    state,
                    symbol,
                    actions: actions.iter().copied().collect(),
                });
            }
        }
    }

    ParseTable {
        action,
        goto,
        conflicts,
        start: automaton.start(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::compute_attributes;
    use crate::config::Variant;
    use crate::dfa::build_dfa;
    use crate::lalr::build_lalr;
    use crate::nfa::build_nfa;
    use crate::pool::ConstraintPool;

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
    fn slr_table_for_arithmetic_grammar_has_no_conflicts() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut crate::trace::NullTracer);
        let dfa = build_dfa(&g, &nfa, &mut crate::trace::NullTracer);
        let automaton = GenericAutomaton { dfa: &dfa, nfa: &nfa };
        let table = assemble_table(&g, &pool, &automaton, &mut crate::trace::NullTracer);
        assert!(table.is_clean(), "conflicts: {:?}", table.conflicts);
    }

    #[test]
    fn slr_table_has_an_accept_action_somewhere() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut crate::trace::NullTracer);
        let dfa = build_dfa(&g, &nfa, &mut crate::trace::NullTracer);
        let automaton = GenericAutomaton { dfa: &dfa, nfa: &nfa };
        let table = assemble_table(&g, &pool, &automaton, &mut crate::trace::NullTracer);
        let eoi = g.end_of_input();
        assert!(table
            .action
            .iter()
            .any(|row| row.get(&eoi).is_some_and(|set| set.contains(&ParseAction::Accept))));
    }

    #[test]
    fn lalr_table_for_arithmetic_grammar_has_no_conflicts() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Lr0, &mut pool, &mut crate::trace::NullTracer);
        let lalr = build_lalr(&g, &nfa, &mut pool, &mut crate::trace::NullTracer);
        let automaton = LalrAutomaton { lalr: &lalr, nfa: &nfa };
        let table = assemble_table(&g, &pool, &automaton, &mut crate::trace::NullTracer);
        assert!(table.is_clean(), "conflicts: {:?}", table.conflicts);
    }

    #[test]
    fn dangling_grammar_reports_a_shift_reduce_conflict_under_slr() {
        // S -> if E then S | if E then S else S | other
        let mut g = Grammar::new();
        g.set_start("S", 1).unwrap();
        let s = g.symbol_id("S").unwrap();
        let if_ = g.put_symbol("if", true);
        let e = g.put_symbol("E", false);
        let then = g.put_symbol("then", true);
        let else_ = g.put_symbol("else", true);
        let other = g.put_symbol("other", true);
        g.add_production(s, vec![if_, e, then, s]);
        g.add_production(s, vec![if_, e, then, s, else_, s]);
        g.add_production(s, vec![other]);
        let expr = g.put_symbol("expr", true);
        g.add_production(e, vec![expr]);
        g.finalize(false).unwrap();
        compute_attributes(&mut g, &mut crate::trace::NullTracer);

        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut crate::trace::NullTracer);
        let dfa = build_dfa(&g, &nfa, &mut crate::trace::NullTracer);
        let automaton = GenericAutomaton { dfa: &dfa, nfa: &nfa };
        let table = assemble_table(&g, &pool, &automaton, &mut crate::trace::NullTracer);
        assert!(!table.is_clean());
    }
}
