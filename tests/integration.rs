//! Black-box coverage over the public API: a grammar source string goes in,
//! a parse table and a working recognizer come out.

use lr_parser_gen::config::{Config, Variant};
use lr_parser_gen::error::GrammarError;
use lr_parser_gen::grammar_reader::read_grammar;
use lr_parser_gen::recognizer::{Recognizer, VecTokenSource};
use lr_parser_gen::table::ParseAction;
use lr_parser_gen::trace::{FileTracer, NullTracer, StepTracer};
use lr_parser_gen::{build, Automaton};

fn config(variant: Variant) -> Config {
    Config {
        variant,
        ..Config::default()
    }
}

fn run_to_completion(built: &lr_parser_gen::Built, input: &[&str]) -> bool {
    let mut source = VecTokenSource::new(input.iter().map(|s| s.to_string()).collect());
    let mut recognizer = Recognizer::new(&built.grammar, &built.table);
    recognizer.run(&mut source, &mut NullTracer).is_ok()
}

// S1: SLR arithmetic grammar accepts a valid sentence and rejects a broken one.
#[test]
fn slr_arithmetic_grammar_accepts_and_rejects() {
    let src = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id\n";
    let cfg = config(Variant::Slr);
    let built = build(src, &cfg, &mut NullTracer).unwrap();
    assert!(built.table.is_clean());

    assert!(run_to_completion(&built, &["id", "+", "id", "*", "id", "$"]));
    assert!(run_to_completion(&built, &["(", "id", "+", "id", ")", "$"]));
    assert!(!run_to_completion(&built, &["id", "+", "+", "$"]));
    assert!(!run_to_completion(&built, &["(", "id", "$"]));
}

// S2: LR(1) builds strictly more states than LALR(1) merges down to, on a
// grammar famous for needing genuine lookahead splitting.
#[test]
fn lr1_has_at_least_as_many_states_as_lalr_on_the_same_grammar() {
    let src = "S -> C C\nC -> c C | d\n";

    let lr1_cfg = config(Variant::Lr1);
    let lr1 = build(src, &lr1_cfg, &mut NullTracer).unwrap();
    let lr1_states = match &lr1.automaton {
        Automaton::Subset(dfa) => dfa.states.len(),
        Automaton::Lalr(_) => unreachable!(),
    };

    let lalr_cfg = config(Variant::Lalr);
    let lalr = build(src, &lalr_cfg, &mut NullTracer).unwrap();
    let lalr_states = match &lalr.automaton {
        Automaton::Lalr(l) => l.states.len(),
        Automaton::Subset(_) => unreachable!(),
    };

    assert!(lr1_states >= lalr_states);
    assert!(lr1.table.is_clean());
    assert!(lalr.table.is_clean());

    assert!(run_to_completion(&lr1, &["c", "d", "d", "$"]));
    assert!(run_to_completion(&lalr, &["c", "d", "d", "$"]));
}

// S3: dangling-else grammar under SLR reports exactly one shift/reduce
// conflict, at the state reached after `if E then S` on lookahead `else`.
#[test]
fn dangling_else_grammar_reports_one_shift_reduce_conflict_under_slr() {
    let src = "S -> if E then S | if E then S else S | a\nE -> b\n";
    let cfg = config(Variant::Slr);
    let built = build(src, &cfg, &mut NullTracer).unwrap();

    assert!(!built.table.is_clean());
    assert_eq!(built.table.conflicts.len(), 1);

    let conflict = &built.table.conflicts[0];
    assert_eq!(built.grammar.symbol(conflict.symbol).name, "else");
    assert_eq!(conflict.actions.len(), 2);
    assert!(conflict.actions.iter().any(|a| matches!(a, ParseAction::Shift(_))));
    assert!(conflict.actions.iter().any(|a| matches!(a, ParseAction::Reduce(_))));
}

// S4: a nullable grammar accepts the empty input under LR(0).
#[test]
fn nullable_grammar_accepts_empty_input_under_lr0() {
    let src = "S -> A\nA -> epsilon\n";
    let cfg = config(Variant::Lr0);
    let built = build(src, &cfg, &mut NullTracer).unwrap();

    let start = built.grammar.start().unwrap();
    assert!(built.grammar.symbol(start).nullable);

    assert!(run_to_completion(&built, &["$"]));
}

// S5: the classic ambiguous `E -> E + E | id` grammar reports a shift/reduce
// conflict under SLR but the generator still completes successfully.
#[test]
fn ambiguous_expression_grammar_reports_a_conflict_under_slr() {
    let src = "E -> E + E | id\n";
    let cfg = config(Variant::Slr);
    let built = build(src, &cfg, &mut NullTracer).unwrap();

    assert!(!built.table.is_clean());
    assert!(built.table.conflicts.iter().any(|c| built.grammar.symbol(c.symbol).name == "+"));
}

// S6: under `--strict`, terminals must be spelled as quoted literals; a bare
// identifier `X` that is never a rule head has no declared kind and is
// rejected with its first-seen line rather than silently treated as an
// implicit terminal.
#[test]
fn undeclared_body_symbol_is_an_unresolved_symbol_error_in_strict_mode() {
    let mut cfg = config(Variant::Slr);
    cfg.strict = true;
    let src = "S -> 'a' X\n";
    let err = read_grammar(src, &cfg).unwrap_err();
    match err {
        GrammarError::UnresolvedSymbol { name, line } => {
            assert_eq!(name, "X");
            assert_eq!(line, 1);
        }
        other => panic!("expected UnresolvedSymbol, got {other:?}"),
    }
}

// A start symbol declared but never given a production is unresolved
// regardless of strict mode, since no usage can ever make it a terminal.
#[test]
fn start_symbol_with_no_production_is_an_unresolved_symbol_error() {
    let mut g = lr_parser_gen::grammar::Grammar::new();
    g.set_start("S", 7).unwrap();
    let err = g.finalize(false).unwrap_err();
    match err {
        GrammarError::UnresolvedSymbol { name, line } => {
            assert_eq!(name, "S");
            assert_eq!(line, 7);
        }
        other => panic!("expected UnresolvedSymbol, got {other:?}"),
    }
}

#[test]
fn lalr_merges_lr0_states_sharing_a_core() {
    let src = "S -> C C\nC -> c C | d\n";
    let cfg = config(Variant::Lalr);
    let built = build(src, &cfg, &mut NullTracer).unwrap();
    assert!(built.table.is_clean());
    assert!(run_to_completion(&built, &["d", "d", "$"]));
    assert!(!run_to_completion(&built, &["d", "$"]));
}

// A build run driven through a real `FileTracer` (the path the `lrgen`
// binary actually uses) produces a non-empty, well-formed steps.py.
#[test]
fn file_tracer_run_produces_a_populated_step_trace() {
    let dir = tempfile::tempdir().unwrap();
    let steps_path = dir.path().join("steps.py");
    let src = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id\n";
    let cfg = config(Variant::Slr);

    {
        let mut tracer = FileTracer::create(&steps_path).unwrap();
        build(src, &cfg, &mut tracer as &mut dyn StepTracer).unwrap();
        tracer.into_result().unwrap();
    }

    let contents = std::fs::read_to_string(&steps_path).unwrap();
    assert!(!contents.is_empty());
    assert!(contents.contains("addState("));
    assert!(contents.contains("addTableEntry("));
}
