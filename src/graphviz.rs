//! Graphviz digraph emitters for the NFA and the DFA/LALR automaton.
//!
//! Grounded on `PushDownAutomaton::dump` (`automata/PushDownAutomaton.cpp`):
//! one `digraph` per automaton, a `start` pseudo-node pointing at the start
//! state, `node[shape=box style=rounded]` with full item labels or
//! `node[shape=circle]` with bare ids under `--no-label`, and `peripheries=2`
//! on the state(s) that contain the accept item.

use crate::dfa::Dfa;
use crate::grammar::Grammar;
use crate::lalr::Lalr;
use crate::nfa::Nfa;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn header(emit_labels: bool, rankdir_lr: bool) -> String {
    let mut s = String::new();
    s.push_str("digraph g {\n");
    s.push_str("  charset=utf8;\n");
    s.push_str("  splines=true;\n");
    s.push_str("  graph[center=true];\n");
    s.push_str("  edge[arrowsize=0.8 arrowhead=vee constraint=true];\n");
    if emit_labels {
        s.push_str("  node [shape=box style=rounded];\n");
    } else {
        s.push_str("  node [shape=circle];\n");
    }
    if rankdir_lr {
        s.push_str("  rankdir=LR;\n");
    }
    s
}

/// Emits `NFA.gv`: one node per NFA state, epsilon edges included (labeled
/// with the epsilon symbol's own name, since action id == symbol id for
/// epsilon too).
pub fn dump_nfa(grammar: &Grammar, nfa: &Nfa, emit_labels: bool) -> String {
    let labels = grammar.kernel_labels();
    let mut s = header(emit_labels, true);
    s.push_str("  start [label=Start shape=plain];\n");
    s.push_str(&format!("  start -> {};\n", nfa.start.0));

    for id in nfa.states.indices() {
        let item = nfa.states[id].item;
        let final_flag = id == nfa.accept;
        if emit_labels {
            let label = &labels[item.production][item.dot];
            s.push_str(&format!("  {} [label=\"{}: {}\"", id.0, id.0, escape(label)));
        } else {
            s.push_str(&format!("  {} [", id.0));
        }
        if final_flag {
            s.push_str(" peripheries=2");
        }
        s.push_str("];\n");
    }
    for from in nfa.out.indices() {
        for &(action, to) in &nfa.out[from] {
            s.push_str(&format!(
                "  {} -> {} [label=\"{}\"",
                from.0,
                to.0,
                escape(&grammar.symbol(action).name)
            ));
            if action == grammar.epsilon() {
                s.push_str(" constraint=false");
            }
            s.push_str("];\n");
        }
    }
    s.push('}');
    s
}

fn closure_label(grammar: &Grammar, items: &[(crate::index::ProductionId, usize)]) -> String {
    let labels = grammar.kernel_labels();
    items
        .iter()
        .map(|&(p, d)| labels[p][d].as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emits `DFA.gv` for the subset-construction automaton.
pub fn dump_dfa(grammar: &Grammar, nfa: &Nfa, dfa: &Dfa, emit_labels: bool) -> String {
    let mut s = header(emit_labels, false);
    s.push_str("  start [label=Start shape=plain];\n");
    s.push_str(&format!("  start -> {};\n", dfa.start.0));

    for id in dfa.states.indices() {
        let items: Vec<_> = dfa.states[id]
            .closure
            .iter()
            .map(|s| {
                let item = nfa.states[s].item;
                (item.production, item.dot)
            })
            .collect();
        let is_final = dfa.states[id].closure.contains(nfa.accept);
        if emit_labels {
            let label = closure_label(grammar, &items);
            s.push_str(&format!("  {} [label=\"{}: {}\"", id.0, id.0, escape(&label)));
        } else {
            s.push_str(&format!("  {} [", id.0));
        }
        if is_final {
            s.push_str(" peripheries=2");
        }
        s.push_str("];\n");
    }
    for from in dfa.out.indices() {
        for &(action, to) in &dfa.out[from] {
            s.push_str(&format!(
                "  {} -> {} [label=\"{}\"];\n",
                from.0,
                to.0,
                escape(&grammar.symbol(action).name)
            ));
        }
    }
    s.push('}');
    s
}

/// Emits `DFA.gv` for the LALR kernel-merge automaton (same file name; the
/// CLI picks whichever automaton the run's variant actually built).
pub fn dump_lalr(grammar: &Grammar, nfa: &Nfa, lalr: &Lalr, emit_labels: bool) -> String {
    let mut s = header(emit_labels, false);
    s.push_str("  start [label=Start shape=plain];\n");
    s.push_str(&format!("  start -> {};\n", lalr.start.0));

    for id in lalr.states.indices() {
        let items: Vec<_> = lalr.states[id]
            .closure
            .keys()
            .map(|&s| {
                let item = nfa.states[s].item;
                (item.production, item.dot)
            })
            .collect();
        let is_final = lalr.states[id].closure.contains_key(&nfa.accept);
        if emit_labels {
            let label = closure_label(grammar, &items);
            s.push_str(&format!("  {} [label=\"{}: {}\"", id.0, id.0, escape(&label)));
        } else {
            s.push_str(&format!("  {} [", id.0));
        }
        if is_final {
            s.push_str(" peripheries=2");
        }
        s.push_str("];\n");
    }
    for from in lalr.out.indices() {
        for &(action, to) in &lalr.out[from] {
            s.push_str(&format!(
                "  {} -> {} [label=\"{}\"];\n",
                from.0,
                to.0,
                escape(&grammar.symbol(action).name)
            ));
        }
    }
    s.push('}');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::compute_attributes;
    use crate::config::Variant;
    use crate::dfa::build_dfa;
    use crate::grammar::Grammar;
    use crate::nfa::build_nfa;
    use crate::pool::ConstraintPool;
    use crate::trace::NullTracer;

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
        compute_attributes(&mut g, &mut NullTracer);
        g
    }

    #[test]
    fn nfa_dump_is_a_digraph_with_a_start_node() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut NullTracer);
        let dot = dump_nfa(&g, &nfa, true);
        assert!(dot.starts_with("digraph g {"));
        assert!(dot.contains("start [label=Start shape=plain];"));
        assert!(dot.ends_with('}'));
    }

    #[test]
    fn dfa_dump_marks_the_accept_state_with_double_peripheries() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut NullTracer);
        let dfa = build_dfa(&g, &nfa, &mut NullTracer);
        let dot = dump_dfa(&g, &nfa, &dfa, true);
        assert!(dot.contains("peripheries=2"));
    }

    #[test]
    fn no_label_mode_omits_item_text() {
        let g = arith_grammar();
        let mut pool = ConstraintPool::new();
        let nfa = build_nfa(&g, Variant::Slr, &mut pool, &mut NullTracer);
        let dot = dump_nfa(&g, &nfa, false);
        assert!(!dot.contains("label=\"0:"));
        assert!(dot.contains("node [shape=circle];"));
    }
}
