//! Core of an LR-family parser-table generator: grammar model, attribute
//! solver, item automaton builder, subset construction, LALR kernel merge,
//! parse-table assembler, and a shift/reduce recognizer driver.
//!
//! The grammar-file tokenizer, CLI surface, graphviz/step-trace emitters and
//! bitset container are grounded on the same original (`namelew/Trabalho-
//! Final-Compiladores`'s `table_generator`) but are external collaborators
//! around this core, not the core itself.

pub mod attrs;
pub mod bitset;
pub mod config;
pub mod dfa;
pub mod error;
pub mod grammar;
pub mod grammar_reader;
pub mod graphviz;
pub mod index;
pub mod items;
pub mod lalr;
pub mod nfa;
pub mod pool;
pub mod recognizer;
pub mod table;
pub mod trace;
pub mod variant;

use config::{Config, Variant};
use error::GrammarError;
use pool::ConstraintPool;
use trace::StepTracer;

/// Whichever of the two automaton shapes §4.4/§4.5 produced, kept around so
/// callers (the `lrgen` binary's graphviz emitter, tests) can inspect the
/// actual state graph instead of only the assembled table.
pub enum Automaton {
    Subset(dfa::Dfa),
    Lalr(lalr::Lalr),
}

/// One full run of the pipeline: read the grammar, solve attributes, build
/// the item automaton for `config.variant`, and assemble its parse table.
/// Mirrors `main.cpp`'s `lrMain` body minus CLI/file-I/O concerns, which
/// live in the `lrgen` binary.
pub struct Built {
    pub grammar: grammar::Grammar,
    pub pool: ConstraintPool,
    pub nfa: nfa::Nfa,
    pub automaton: Automaton,
    pub table: table::ParseTable,
}

pub fn build(source: &str, config: &Config, tracer: &mut dyn StepTracer) -> Result<Built, GrammarError> {
    let mut grammar = grammar_reader::read_grammar(source, config)?;
    attrs::compute_attributes(&mut grammar, tracer);

    let mut pool = ConstraintPool::new();
    let nfa_variant = if config.variant == Variant::Lalr {
        Variant::Lr0
    } else {
        config.variant
    };
    let built_nfa = nfa::build_nfa(&grammar, nfa_variant, &mut pool, tracer);

    let (automaton, parse_table) = match config.variant {
        Variant::Lalr => {
            let lalr = lalr::build_lalr(&grammar, &built_nfa, &mut pool, tracer);
            let parse_table = {
                let view = table::LalrAutomaton {
                    lalr: &lalr,
                    nfa: &built_nfa,
                };
                table::assemble_table(&grammar, &pool, &view, tracer)
            };
            (Automaton::Lalr(lalr), parse_table)
        }
        _ => {
            let dfa = dfa::build_dfa(&grammar, &built_nfa, tracer);
            let parse_table = {
                let view = table::GenericAutomaton {
                    dfa: &dfa,
                    nfa: &built_nfa,
                };
                table::assemble_table(&grammar, &pool, &view, tracer)
            };
            (Automaton::Subset(dfa), parse_table)
        }
    };

    Ok(Built {
        grammar,
        pool,
        nfa: built_nfa,
        automaton,
        table: parse_table,
    })
}
