//! Shift/reduce recognizer driver (§4.7): stack-based, fed by an external
//! token source.
//!
//! Grounded on `LRParser::test`/`LRParser::reduce` in the original
//! `LRParser.cpp`: a state stack (bottom = start state), a symbol stack that
//! parallels it minus one entry, and a FIFO input queue. Errors are caught
//! here and returned as `Result`, never unwound past this module, matching
//! §7's "recognizer errors are caught inside the recognizer and returned as
//! a boolean result" (a `bool` in the original, a typed error here).

use crate::error::RecognizerError;
use crate::grammar::Grammar;
use crate::index::{ProductionId, StateId, SymbolId};
use crate::table::{ParseAction, ParseTable};
use crate::trace::StepTracer;

/// A source of input symbols by name, decoupled from how those names were
/// read (stdin, a test fixture, `--step` incremental mode). Mirrors the
/// original's `util::TokenReader` collaborator.
pub trait TokenSource {
    /// Returns the next symbol name, or `None` at end of stream. A `None`
    /// is treated exactly like seeing an explicit `$`.
    fn next_token(&mut self) -> Option<String>;
}

/// A `TokenSource` over an in-memory list, handy for tests and for
/// `--no-test` exhaustive mode where the whole input is read up front.
pub struct VecTokenSource {
    tokens: std::vec::IntoIter<String>,
}

impl VecTokenSource {
    pub fn new(tokens: Vec<String>) -> Self {
        VecTokenSource {
            tokens: tokens.into_iter(),
        }
    }
}

impl TokenSource for VecTokenSource {
    fn next_token(&mut self) -> Option<String> {
        self.tokens.next()
    }
}

/// One step's outcome, useful for a caller (e.g. `--step` mode) that wants
/// to render parser state between steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Shifted,
    Reduced(ProductionId),
    Accepted,
}

/// Parser state: the two parallel stacks plus a pending input queue and an
/// auxiliary AST node id stack for external tracing (§4.7's "auxiliary
/// parse-tree node id stack"). Node ids are assigned but never interpreted
/// here; a caller that wants an actual tree hangs it off `ast_add_node`/
/// `ast_set_parent` trace events.
pub struct Recognizer<'a> {
    grammar: &'a Grammar,
    table: &'a ParseTable,
    state_stack: Vec<StateId>,
    symbol_stack: Vec<SymbolId>,
    ast_stack: Vec<usize>,
    input: std::collections::VecDeque<SymbolId>,
    next_ast_id: usize,
    exhausted: bool,
}

impl<'a> Recognizer<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a ParseTable) -> Self {
        Recognizer {
            grammar,
            table,
            state_stack: vec![table.start],
            symbol_stack: Vec::new(),
            ast_stack: Vec::new(),
            input: std::collections::VecDeque::new(),
            next_ast_id: 0,
            exhausted: false,
        }
    }

    /// Reads one symbol name from `source`, validates it (not a nonterminal,
    /// not epsilon), and enqueues it. A name that does not resolve at all is
    /// an `UnknownSymbol` error; the stream running dry is treated as an
    /// explicit end-of-input symbol (§4.7: "unknown symbol names and use of
    /// epsilon or nonterminals as input are errors").
    pub fn read_symbol(&mut self, source: &mut dyn TokenSource) -> Result<(), RecognizerError> {
        match source.next_token() {
            Some(name) => {
                let id = self
                    .grammar
                    .symbol_id(&name)
                    .ok_or_else(|| RecognizerError::UnknownSymbol { name: name.clone() })?;
                let symbol = self.grammar.symbol(id);
                if symbol.is_nonterminal() || id == self.grammar.epsilon() {
                    return Err(RecognizerError::DisallowedInput { name });
                }
                if id == self.grammar.end_of_input() {
                    self.exhausted = true;
                }
                self.input.push_back(id);
                Ok(())
            }
            None => {
                self.exhausted = true;
                self.input.push_back(self.grammar.end_of_input());
                Ok(())
            }
        }
    }

    /// Reads the rest of `source` to end-of-stream up front (`--no-test`'s
    /// complement, the default "exhaust input" mode of §6's CLI surface).
    pub fn exhaust(&mut self, source: &mut dyn TokenSource) -> Result<(), RecognizerError> {
        while !self.exhausted {
            self.read_symbol(source)?;
        }
        Ok(())
    }

    pub fn state_stack(&self) -> &[StateId] {
        &self.state_stack
    }

    pub fn symbol_stack(&self) -> &[SymbolId] {
        &self.symbol_stack
    }

    /// One shift/reduce/accept step. Pulls a fresh token from `source` if
    /// the input queue is empty and the stream is not yet exhausted
    /// (`--step` incremental mode pulls one symbol at a time this way).
    pub fn step(
        &mut self,
        source: &mut dyn TokenSource,
        tracer: &mut dyn StepTracer,
    ) -> Result<StepOutcome, RecognizerError> {
        if self.input.is_empty() && !self.exhausted {
            self.read_symbol(source)?;
        }
        let lookahead = *self.input.front().ok_or(RecognizerError::InputExhausted)?;

        let state = *self.state_stack.last().expect("state stack is never empty");
        let actions = &self.table.action[state];
        let action = match actions.get(&lookahead) {
            None => {
                tracer.show("Error: No viable actions for this input.");
                return Err(RecognizerError::NoAction {
                    state,
                    symbol: lookahead,
                });
            }
            Some(set) if set.len() > 1 => {
                tracer.show("Error: conflicting actions for this input.");
                return Err(RecognizerError::Conflict {
                    state,
                    symbol: lookahead,
                });
            }
            Some(set) => *set.iter().next().expect("non-empty action set"),
        };

        match action {
            ParseAction::Shift(next) => {
                self.state_stack.push(next);
                tracer.show("Apply shift rule.");
                let symbol = self.input.pop_front().unwrap();
                self.symbol_stack.push(symbol);
                tracer.ast_add_node(self.next_ast_id, &self.grammar.symbol(symbol).name.clone());
                self.ast_stack.push(self.next_ast_id);
                self.next_ast_id += 1;
                Ok(StepOutcome::Shifted)
            }
            ParseAction::Reduce(production) => {
                self.reduce(production, tracer)?;
                Ok(StepOutcome::Reduced(production))
            }
            ParseAction::Accept => {
                tracer.show("Success.");
                Ok(StepOutcome::Accepted)
            }
        }
    }

    /// Runs `step` to completion: either `Ok(())` on `ACCEPT` or the first
    /// error encountered. Matches the original's `test()` loop shape, with
    /// the error caught and returned rather than only logged.
    pub fn run(&mut self, source: &mut dyn TokenSource, tracer: &mut dyn StepTracer) -> Result<(), RecognizerError> {
        loop {
            match self.step(source, tracer)? {
                StepOutcome::Accepted => return Ok(()),
                StepOutcome::Shifted | StepOutcome::Reduced(_) => continue,
            }
        }
    }

    fn reduce(&mut self, production: ProductionId, tracer: &mut dyn StepTracer) -> Result<(), RecognizerError> {
        let prod = self.grammar.production(production);
        let body_len = prod.rhs.len();

        if self.symbol_stack.len() < body_len || self.state_stack.len() <= body_len {
            return Err(RecognizerError::StackMismatch { production });
        }
        let offset = self.symbol_stack.len() - body_len;
        if self.symbol_stack[offset..] != prod.rhs[..] {
            return Err(RecognizerError::StackMismatch { production });
        }

        let head = prod.left;
        let ast_id = self.next_ast_id;
        self.next_ast_id += 1;
        tracer.ast_add_node(ast_id, &self.grammar.symbol(head).name.clone());
        for &child in &self.ast_stack[self.ast_stack.len() - body_len..] {
            tracer.ast_set_parent(child, ast_id);
        }

        self.symbol_stack.truncate(offset);
        self.state_stack.truncate(self.state_stack.len() - body_len);
        self.ast_stack.truncate(self.ast_stack.len() - body_len);

        self.symbol_stack.push(head);

        let top = *self.state_stack.last().expect("state stack is never empty");
        let goto_row = &self.table.goto[top];
        let next = goto_row.get(&head).copied().ok_or(RecognizerError::MissingGoto {
            state: top,
            symbol: head,
        })?;
        self.state_stack.push(next);
        self.ast_stack.push(ast_id);

        tracer.show(&format!("Apply reduce rule: production {}.", production.0));
        Ok(())
    }
}
