//! Error-kind hierarchy, one `thiserror`-derived enum per layer.
//!
//! Grounded on the original's exception story (`Grammar::UnsolvedSymbolError`,
//! the `std::runtime_error`s thrown by `GrammarReader` and `PushDownAutomaton`)
//! but expressed as typed, non-panicking `Result`s per §7 of the spec.

use crate::index::{ProductionId, StateId, SymbolId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("symbol '{name}' was used but never declared as terminal or nonterminal (first seen at line {line})")]
    UnresolvedSymbol { name: String, line: u32 },

    #[error("epsilon cannot be mixed with other symbols in the same rule body (line {line})")]
    EpsilonMixedWithSymbols { line: u32 },

    #[error("end-of-input symbol '$' may not appear in a rule body (line {line})")]
    EndOfInputInBody { line: u32 },

    #[error("the start symbol was already set")]
    DuplicateStart,
}

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("no viable action for state {state} on symbol {symbol}")]
    NoAction { state: StateId, symbol: SymbolId },

    #[error("conflicting actions for state {state} on symbol {symbol}")]
    Conflict { state: StateId, symbol: SymbolId },

    #[error("stack prefix does not match the right-hand side of production {production}")]
    StackMismatch { production: ProductionId },

    #[error("no GOTO entry for state {state} on symbol {symbol} after reduction")]
    MissingGoto { state: StateId, symbol: SymbolId },

    #[error("ambiguous GOTO entries for state {state} on symbol {symbol} after reduction")]
    AmbiguousGoto { state: StateId, symbol: SymbolId },

    #[error("unknown input symbol '{name}'")]
    UnknownSymbol { name: String },

    #[error("'{name}' is not a legal input symbol (epsilon and nonterminals are disallowed)")]
    DisallowedInput { name: String },

    #[error("no more input available")]
    InputExhausted,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),
}
