//! Grammar model: symbol table, production table, augmented start rule.
//!
//! Grounded on the original `Grammar`/`Grammar.h`: idempotent symbol
//! insertion keyed by name, a type lattice (`Unchecked -> Terminal` or
//! `NonTerminal`, and `Terminal -> NonTerminal`, never the reverse), aliases,
//! and a `setStart`/`checkViolations` pair that defers resolution until the
//! whole grammar file has been read.

use std::collections::{HashMap, HashSet};

use crate::error::GrammarError;
use crate::index::{ProductionId, ProductionVec, SymbolId, SymbolVec};

pub const EPSILON_NAME: &str = "\u{03b5}";
pub const END_OF_INPUT_NAME: &str = "$";
const DOT_GLYPH: &str = "\u{2022}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    Unchecked,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub productions: Vec<ProductionId>,
    pub nullable: bool,
    pub first: HashSet<SymbolId>,
    pub follow: HashSet<SymbolId>,
}

impl Symbol {
    fn new(id: SymbolId, name: String, kind: SymbolKind) -> Self {
        Symbol {
            id,
            name,
            kind,
            productions: Vec::new(),
            nullable: false,
            first: HashSet::new(),
            follow: HashSet::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SymbolKind::Terminal)
    }

    pub fn is_nonterminal(&self) -> bool {
        matches!(self.kind, SymbolKind::NonTerminal)
    }
}

#[derive(Clone, Debug)]
pub struct Production {
    pub left: SymbolId,
    pub rhs: Vec<SymbolId>,
}

/// Grammar under construction, then finalized (augmented + attributes
/// computed) and handed to the builders.
#[derive(Clone, Debug)]
pub struct Grammar {
    symbols: SymbolVec<Symbol>,
    name_to_id: HashMap<String, SymbolId>,
    first_seen_line: HashMap<SymbolId, u32>,
    productions: ProductionVec<Production>,
    epsilon: SymbolId,
    end_of_input: SymbolId,
    start: Option<SymbolId>,
    augmented: Option<ProductionId>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub fn new() -> Self {
        let mut g = Grammar {
            symbols: SymbolVec::new(),
            name_to_id: HashMap::new(),
            first_seen_line: HashMap::new(),
            productions: ProductionVec::new(),
            epsilon: SymbolId(0),
            end_of_input: SymbolId(0),
            start: None,
            augmented: None,
        };
        g.epsilon = g.put_symbol(EPSILON_NAME, true);
        g.add_alias(g.epsilon, "epsilon");
        g.symbols[g.epsilon].nullable = true;
        g.symbols[g.epsilon].first.insert(g.epsilon);
        g.end_of_input = g.put_symbol(END_OF_INPUT_NAME, true);
        g
    }

    pub fn epsilon(&self) -> SymbolId {
        self.epsilon
    }

    pub fn end_of_input(&self) -> SymbolId {
        self.end_of_input
    }

    pub fn start(&self) -> Option<SymbolId> {
        self.start
    }

    pub fn augmented_production(&self) -> Option<ProductionId> {
        self.augmented
    }

    pub fn symbols(&self) -> &SymbolVec<Symbol> {
        &self.symbols
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    pub fn productions(&self) -> &ProductionVec<Production> {
        &self.productions
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id]
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.symbols[id].is_terminal()
    }

    /// Inserts (or looks up) a symbol by name. The first insertion fixes the
    /// id; re-insertion may upgrade `Unchecked -> {Terminal,NonTerminal}` or
    /// `Terminal -> NonTerminal`, never the reverse.
    pub fn put_symbol(&mut self, name: &str, is_terminal: bool) -> SymbolId {
        let kind = if is_terminal {
            SymbolKind::Terminal
        } else {
            SymbolKind::NonTerminal
        };
        self.put_symbol_kind(name, kind, None)
    }

    /// Inserts a symbol whose kind is not yet known; used while parsing the
    /// grammar file, before every name has shown up as a head or a body
    /// terminal. `line` records the first-seen source position for error
    /// reporting.
    pub fn put_symbol_unchecked(&mut self, name: &str, line: u32) -> SymbolId {
        self.put_symbol_kind(name, SymbolKind::Unchecked, Some(line))
    }

    fn put_symbol_kind(&mut self, name: &str, kind: SymbolKind, line: Option<u32>) -> SymbolId {
        if let Some(&id) = self.name_to_id.get(name) {
            let existing = &mut self.symbols[id];
            match (existing.kind, kind) {
                (SymbolKind::Unchecked, k) if k != SymbolKind::Unchecked => {
                    existing.kind = k;
                }
                (SymbolKind::Terminal, SymbolKind::NonTerminal) => {
                    existing.kind = SymbolKind::NonTerminal;
                }
                _ => {}
            }
            return id;
        }
        let id = self.symbols.push(Symbol::new(SymbolId(0), name.to_string(), kind));
        self.symbols[id].id = id;
        self.name_to_id.insert(name.to_string(), id);
        if let Some(line) = line {
            self.first_seen_line.entry(id).or_insert(line);
        }
        id
    }

    pub fn add_alias(&mut self, id: SymbolId, alias: &str) {
        self.name_to_id.insert(alias.to_string(), id);
    }

    pub fn add_production(&mut self, left: SymbolId, rhs: Vec<SymbolId>) -> ProductionId {
        let id = self.productions.push(Production { left, rhs });
        self.symbols[left].productions.push(id);
        id
    }

    /// May be called at most once. `name` may still be `Unchecked` at this
    /// point; resolution is verified by `finalize`.
    pub fn set_start(&mut self, name: &str, line: u32) -> Result<(), GrammarError> {
        if self.start.is_some() {
            return Err(GrammarError::DuplicateStart);
        }
        let id = self.put_symbol_unchecked(name, line);
        self.start = Some(id);
        Ok(())
    }

    /// Verifies every symbol resolved, then appends the synthetic augmented
    /// production `S' -> S` (production id == the number of user
    /// productions) and its left symbol `S'`.
    ///
    /// `strict` mirrors `Config::strict`/`--strict`, which "enforce[s]
    /// C-style identifiers in grammar and input, with quoted literals": in
    /// strict mode a terminal must be spelled as a quoted literal (which
    /// calls `put_symbol` directly, never leaving `Unchecked`), so a bare
    /// identifier that never becomes a head has no declared kind at all and
    /// is rejected rather than silently promoted to a terminal. Outside
    /// strict mode, bare body identifiers are the format's ordinary way of
    /// writing an implicit terminal and resolve by usage as before.
    pub fn finalize(&mut self, strict: bool) -> Result<(), GrammarError> {
        // A symbol whose kind is still `Unchecked` once the whole grammar has
        // been read is resolved by usage: having at least one production
        // makes it a nonterminal, otherwise it only ever appeared in rule
        // bodies. Outside strict mode that makes it an implicit terminal;
        // in strict mode (and always for the start symbol) a symbol with no
        // productions and no explicit terminal declaration is unresolved.
        for id in self.symbols.indices() {
            if !matches!(self.symbols[id].kind, SymbolKind::Unchecked) {
                continue;
            }
            let is_start = Some(id) == self.start;
            let headless = self.symbols[id].productions.is_empty();
            if headless && (is_start || strict) {
                let line = self.first_seen_line.get(&id).copied().unwrap_or(0);
                return Err(GrammarError::UnresolvedSymbol {
                    name: self.symbols[id].name.clone(),
                    line,
                });
            }
            self.symbols[id].kind = if headless {
                SymbolKind::Terminal
            } else {
                SymbolKind::NonTerminal
            };
        }
        let start = self.start.expect("set_start must be called before finalize");
        let mut aug_name = format!("{}'", self.symbols[start].name);
        while self.name_to_id.contains_key(&aug_name) {
            aug_name.push('\'');
        }
        let aug_symbol = self.put_symbol(&aug_name, false);
        let aug_prod = self.add_production(aug_symbol, vec![start]);
        self.augmented = Some(aug_prod);
        Ok(())
    }

    /// Builds the stable `A -> α • β` display labels for every
    /// (production, dot) pair, including the augmented production's two
    /// items. Indexed `[production][dot]`.
    pub fn kernel_labels(&self) -> ProductionVec<Vec<String>> {
        let mut out: ProductionVec<Vec<String>> = ProductionVec::with_capacity(self.productions.len());
        for production in self.productions.iter() {
            let rhs = &production.rhs;
            let mut labels = Vec::with_capacity(rhs.len() + 1);
            for dot in 0..=rhs.len() {
                let mut s = self.symbols[production.left].name.clone();
                s.push_str(" ->");
                for sym in &rhs[..dot] {
                    s.push(' ');
                    s.push_str(&self.symbols[*sym].name);
                }
                s.push(' ');
                s.push_str(DOT_GLYPH);
                for sym in &rhs[dot..] {
                    s.push(' ');
                    s.push_str(&self.symbols[*sym].name);
                }
                labels.push(s);
            }
            out.push(labels);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_grammar() -> Grammar {
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
        g
    }

    #[test]
    fn builtin_symbols_are_preregistered() {
        let g = Grammar::new();
        assert_eq!(g.symbol(g.epsilon()).name, EPSILON_NAME);
        assert!(g.symbol_id("epsilon").is_some());
        assert_eq!(g.symbol(g.end_of_input()).name, END_OF_INPUT_NAME);
    }

    #[test]
    fn symbol_insertion_is_idempotent_and_upgrades() {
        let mut g = Grammar::new();
        let a1 = g.put_symbol_unchecked("A", 3);
        let a2 = g.put_symbol("A", false);
        assert_eq!(a1, a2);
        assert!(g.symbol(a1).is_nonterminal());
    }

    #[test]
    fn finalize_adds_augmented_production() {
        let g = simple_grammar();
        let aug = g.augmented_production().unwrap();
        let prod = g.production(aug);
        assert_eq!(g.symbol(prod.left).name, "E'");
        assert_eq!(prod.rhs, vec![g.symbol_id("E").unwrap()]);
    }

    #[test]
    fn finalize_rejects_unresolved_symbol() {
        let mut g = Grammar::new();
        g.set_start("S", 1).unwrap();
        g.put_symbol_unchecked("X", 5);
        let err = g.finalize(false).unwrap_err();
        match err {
            GrammarError::UnresolvedSymbol { name, line } => {
                assert_eq!(name, "S");
                assert_eq!(line, 1);
            }
            _ => panic!("expected UnresolvedSymbol"),
        }
    }

    #[test]
    fn strict_finalize_rejects_a_body_only_symbol_with_no_explicit_kind() {
        let mut g = Grammar::new();
        g.set_start("S", 1).unwrap();
        let s = g.symbol_id("S").unwrap();
        let a = g.put_symbol("a", true);
        g.add_production(s, vec![a]);
        g.put_symbol_unchecked("X", 3);
        let err = g.finalize(true).unwrap_err();
        match err {
            GrammarError::UnresolvedSymbol { name, line } => {
                assert_eq!(name, "X");
                assert_eq!(line, 3);
            }
            other => panic!("expected UnresolvedSymbol, got {other:?}"),
        }
    }

    #[test]
    fn non_strict_finalize_still_resolves_body_only_symbols_as_terminals() {
        let mut g = Grammar::new();
        g.set_start("S", 1).unwrap();
        let s = g.symbol_id("S").unwrap();
        g.put_symbol_unchecked("a", 1);
        let a = g.symbol_id("a").unwrap();
        g.add_production(s, vec![a]);
        g.finalize(false).unwrap();
        assert!(g.symbol(a).is_terminal());
    }

    #[test]
    fn kernel_labels_use_dot_glyph() {
        let g = simple_grammar();
        let t_prod = g
            .productions()
            .iter()
            .enumerate()
            .find(|(_, p)| g.symbol(p.left).name == "T")
            .unwrap();
        let labels = g.kernel_labels();
        let (idx, _) = t_prod;
        assert_eq!(labels[crate::index::ProductionId(idx)][0], "T -> \u{2022} id");
    }
}
