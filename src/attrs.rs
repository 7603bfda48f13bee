//! Fixed-point attribute solver: nullable, FIRST, FOLLOW.
//!
//! Grounded on `Grammar::calNullable`/`calFirst`/`calFollow` in the original
//! `Grammar.cpp` (Dragon-book style worklist-free fixed point, re-scanning
//! every production each pass until nothing changes).

use std::collections::HashSet;

use crate::grammar::Grammar;
use crate::index::SymbolId;
use crate::trace::StepTracer;

/// Runs nullable, then FIRST, then FOLLOW to a fixed point. Idempotent: a
/// second call on an already-solved grammar changes nothing (Testable
/// Property 6).
pub fn compute_attributes(grammar: &mut Grammar, tracer: &mut dyn StepTracer) {
    tracer.section("Attributes");
    compute_nullable(grammar, tracer);
    compute_first(grammar, tracer);
    compute_follow(grammar, tracer);
}

fn compute_nullable(grammar: &mut Grammar, tracer: &mut dyn StepTracer) {
    let epsilon = grammar.epsilon();
    for sym in grammar.symbols().indices() {
        grammar.symbol_mut(sym).nullable = sym == epsilon;
    }

    let mut changed = true;
    while changed {
        changed = false;
        for pid in grammar.productions().indices() {
            let production = grammar.production(pid);
            let all_nullable = production
                .rhs
                .iter()
                .all(|s| grammar.symbol(*s).nullable);
            let left = production.left;
            if all_nullable && !grammar.symbol(left).nullable {
                grammar.symbol_mut(left).nullable = true;
                changed = true;
                tracer.nullable(&grammar.symbol(left).name.clone(), true);
            }
        }
    }
}

/// FIRST of a symbol sequence, per the standard rule: union FIRST of each
/// symbol (minus epsilon) until a non-nullable symbol is hit; if every
/// symbol in the sequence is nullable, the sequence itself is nullable and
/// epsilon belongs in the result.
pub fn first_of_sequence(grammar: &Grammar, seq: &[SymbolId]) -> (HashSet<SymbolId>, bool) {
    let epsilon = grammar.epsilon();
    let mut result = HashSet::new();
    for &sym in seq {
        let sym_first = &grammar.symbol(sym).first;
        for &t in sym_first {
            if t != epsilon {
                result.insert(t);
            }
        }
        if !grammar.symbol(sym).nullable {
            return (result, false);
        }
    }
    (result, true)
}

fn compute_first(grammar: &mut Grammar, tracer: &mut dyn StepTracer) {
    let epsilon = grammar.epsilon();
    for sym in grammar.symbols().indices() {
        if grammar.symbol(sym).is_terminal() {
            grammar.symbol_mut(sym).first.insert(sym);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for pid in grammar.productions().indices() {
            let production = grammar.production(pid).clone();
            let left = production.left;
            let left_name = grammar.symbol(left).name.clone();
            if production.rhs.is_empty() {
                if grammar.symbol_mut(left).first.insert(epsilon) {
                    changed = true;
                    tracer.add_first(&left_name, crate::grammar::EPSILON_NAME);
                }
                continue;
            }
            let (new_first, _) = first_of_sequence(grammar, &production.rhs);
            let all_nullable = production.rhs.iter().all(|s| grammar.symbol(*s).nullable);
            let rhs_head_name = grammar.symbol(production.rhs[0]).name.clone();
            let left_set = &mut grammar.symbol_mut(left).first;
            let mut grew = false;
            for t in new_first {
                if left_set.insert(t) {
                    grew = true;
                }
            }
            if grew {
                changed = true;
                tracer.merge_first(&left_name, &rhs_head_name);
            }
            if all_nullable && left_set.insert(epsilon) {
                changed = true;
                tracer.add_first(&left_name, crate::grammar::EPSILON_NAME);
            }
        }
    }
}

fn compute_follow(grammar: &mut Grammar, tracer: &mut dyn StepTracer) {
    let epsilon = grammar.epsilon();
    let eoi = grammar.end_of_input();
    let start = grammar.start().expect("grammar must be finalized");
    grammar.symbol_mut(start).follow.insert(eoi);
    let start_name = grammar.symbol(start).name.clone();
    tracer.add_follow(&start_name, crate::grammar::END_OF_INPUT_NAME);

    let mut changed = true;
    while changed {
        changed = false;
        for pid in grammar.productions().indices() {
            let production = grammar.production(pid).clone();
            let left = production.left;
            let left_name = grammar.symbol(left).name.clone();
            let rhs = &production.rhs;
            // Walk right to left: FOLLOW(rhs[i]) gets FIRST(rhs[i+1..]) and,
            // if that suffix is entirely nullable, FOLLOW(left) too. The
            // early stop as soon as a non-nullable suffix symbol is found is
            // load-bearing: it is what makes this right-to-left walk
            // equivalent to tracking "is everything after i nullable".
            let mut suffix_nullable = true;
            for i in (0..rhs.len()).rev() {
                let sym = rhs[i];
                if !grammar.symbol(sym).is_nonterminal() {
                    suffix_nullable = suffix_nullable && grammar.symbol(sym).nullable;
                    continue;
                }
                let sym_name = grammar.symbol(sym).name.clone();
                let (suffix_first, _) = first_of_sequence(grammar, &rhs[i + 1..]);
                let follow_set = &mut grammar.symbol_mut(sym).follow;
                let mut grew = false;
                for t in &suffix_first {
                    if follow_set.insert(*t) {
                        grew = true;
                    }
                }
                if grew {
                    changed = true;
                    tracer.merge_follow_from_first(&sym_name, &left_name);
                }
                if suffix_nullable {
                    let left_follow: Vec<SymbolId> =
                        grammar.symbol(left).follow.iter().copied().collect();
                    let follow_set = &mut grammar.symbol_mut(sym).follow;
                    let mut grew_from_left = false;
                    for t in left_follow {
                        if follow_set.insert(t) {
                            grew_from_left = true;
                        }
                    }
                    if grew_from_left {
                        changed = true;
                        tracer.merge_follow(&sym_name, &left_name);
                    }
                }
                suffix_nullable = suffix_nullable && grammar.symbol(sym).nullable;
            }
        }
    }

    for sym in grammar.symbols().indices() {
        grammar.symbol_mut(sym).follow.remove(&epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;
    use crate::trace::NullTracer;

    fn arith_grammar() -> Grammar {
        let mut g = Grammar::new();
        g.set_start("E", 1).unwrap();
        let e = g.symbol_id("E").unwrap();
        let plus = g.put_symbol("+", true);
        let t = g.put_symbol("T", false);
        g.add_production(e, vec![e, plus, t]);
        g.add_production(e, vec![t]);
        let star = g.put_symbol("*", true);
        let f = g.put_symbol("F", false);
        g.add_production(t, vec![t, star, f]);
        g.add_production(t, vec![f]);
        let lparen = g.put_symbol("(", true);
        let rparen = g.put_symbol(")", true);
        let id = g.put_symbol("id", true);
        g.add_production(f, vec![lparen, e, rparen]);
        g.add_production(f, vec![id]);
        g.finalize(false).unwrap();
        g
    }

    #[test]
    fn first_of_terminal_is_itself() {
        let mut g = arith_grammar();
        compute_attributes(&mut g, &mut NullTracer);
        let id = g.symbol_id("id").unwrap();
        assert_eq!(g.symbol(id).first, HashSet::from([id]));
    }

    #[test]
    fn first_of_nonterminals() {
        let mut g = arith_grammar();
        compute_attributes(&mut g, &mut NullTracer);
        let expected: HashSet<SymbolId> =
            [g.symbol_id("(").unwrap(), g.symbol_id("id").unwrap()]
                .into_iter()
                .collect();
        assert_eq!(g.symbol(g.symbol_id("E").unwrap()).first, expected);
        assert_eq!(g.symbol(g.symbol_id("T").unwrap()).first, expected);
        assert_eq!(g.symbol(g.symbol_id("F").unwrap()).first, expected);
    }

    #[test]
    fn follow_of_start_contains_end_of_input() {
        let mut g = arith_grammar();
        compute_attributes(&mut g, &mut NullTracer);
        let start = g.start().unwrap();
        assert!(g.symbol(start).follow.contains(&g.end_of_input()));
    }

    #[test]
    fn follow_never_contains_epsilon() {
        let mut g = arith_grammar();
        compute_attributes(&mut g, &mut NullTracer);
        for sym in g.symbols().iter() {
            assert!(!sym.follow.contains(&g.epsilon()));
        }
    }

    #[test]
    fn nullable_epsilon_grammar() {
        let mut g = Grammar::new();
        g.set_start("S", 1).unwrap();
        let s = g.symbol_id("S").unwrap();
        let a = g.put_symbol("A", false);
        g.add_production(s, vec![a]);
        g.add_production(a, vec![]);
        g.finalize(false).unwrap();
        compute_attributes(&mut g, &mut NullTracer);
        assert!(g.symbol(s).nullable);
        assert!(g.symbol(a).nullable);
        assert!(g.symbol(s).first.contains(&g.epsilon()));
    }

    #[test]
    fn attribute_solver_is_idempotent() {
        let mut g = arith_grammar();
        compute_attributes(&mut g, &mut NullTracer);
        let before: Vec<_> = g.symbols().iter().map(|s| (s.nullable, s.first.clone(), s.follow.clone())).collect();
        compute_attributes(&mut g, &mut NullTracer);
        let after: Vec<_> = g.symbols().iter().map(|s| (s.nullable, s.first.clone(), s.follow.clone())).collect();
        assert_eq!(before, after);
    }
}
