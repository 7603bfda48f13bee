//! Grammar-file tokenizer and reader.
//!
//! Grounded on `GrammarReader.cpp`/`.h`: `%` starts a line comment, a
//! configurable separator token (`->` by default) divides a rule's head from
//! its body, `|` starts another alternative for the same head, quoted
//! literals force a symbol to be a terminal, and strict mode additionally
//! restricts bare (unquoted) symbol names to C-identifier syntax. This crate
//! simplifies one piece of the original: rather than using blank-line
//! position to decide where a rule body ends, a body simply runs until the
//! next `|` or the next head (the token after a completed body that is not
//! `|` always starts the next rule) — blank lines and comments are pure
//! whitespace here, recorded as a deliberate simplification in DESIGN.md.
//!
//! Strict mode's "with quoted literals" clause is enforced at `finalize`
//! time, not here: a bare identifier that is never a rule head has no
//! explicit kind unless strict mode lets it resolve as an implicit
//! terminal, so strict grammars must spell terminals as quoted literals.

use crate::config::Config;
use crate::error::GrammarError;
use crate::grammar::Grammar;

#[derive(Clone, Debug, PartialEq, Eq)]
enum TokenKind {
    Identifier,
    QuotedLiteral,
    Separator,
    Pipe,
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    text: String,
    line: u32,
    column: u32,
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    strict: bool,
    separator: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(input: &str, strict: bool, separator: &'a str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            strict,
            separator,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('%') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn starts_with_separator(&self) -> bool {
        let sep: Vec<char> = self.separator.chars().collect();
        if self.pos + sep.len() > self.chars.len() {
            return false;
        }
        self.chars[self.pos..self.pos + sep.len()] == sep[..]
    }

    fn is_word_char(&self, c: char) -> bool {
        !c.is_whitespace() && c != '|' && c != '\'' && c != '"'
    }

    fn read_quoted(&mut self, quote: char) -> Result<Token, GrammarError> {
        let line = self.line;
        let column = self.column;
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some(c) => text.push(c),
                None => {
                    return Err(GrammarError::Syntax {
                        line,
                        column,
                        message: "unterminated quoted literal".to_string(),
                    })
                }
            }
        }
        Ok(Token {
            kind: TokenKind::QuotedLiteral,
            text,
            line,
            column,
        })
    }

    fn next_token(&mut self) -> Result<Option<Token>, GrammarError> {
        self.skip_trivia();
        let line = self.line;
        let column = self.column;

        if self.peek().is_none() {
            return Ok(None);
        }
        if self.starts_with_separator() {
            for _ in 0..self.separator.chars().count() {
                self.advance();
            }
            return Ok(Some(Token {
                kind: TokenKind::Separator,
                text: self.separator.to_string(),
                line,
                column,
            }));
        }
        match self.peek().unwrap() {
            '|' => {
                self.advance();
                Ok(Some(Token {
                    kind: TokenKind::Pipe,
                    text: "|".to_string(),
                    line,
                    column,
                }))
            }
            q @ ('\'' | '"') => Ok(Some(self.read_quoted(q)?)),
            c => {
                if self.strict && !(c.is_alphabetic() || c == '_' || c == '$') {
                    return Err(GrammarError::Syntax {
                        line,
                        column,
                        message: format!("unexpected character '{c}' in strict mode"),
                    });
                }
                let mut text = String::new();
                while let Some(c) = self.peek() {
                    if !self.is_word_char(c) || self.starts_with_separator() {
                        break;
                    }
                    if self.strict && !(c.is_alphanumeric() || c == '_' || c == '$') {
                        break;
                    }
                    text.push(c);
                    self.advance();
                }
                Ok(Some(Token {
                    kind: TokenKind::Identifier,
                    text,
                    line,
                    column,
                }))
            }
        }
    }
}

const EPSILON_KEYWORDS: [&str; 2] = ["epsilon", "\u{03b5}"];

/// Reads a complete grammar description and returns a finalized, attribute-
/// solved-free `Grammar` (callers run `attrs::compute_attributes` next).
pub fn read_grammar(input: &str, config: &Config) -> Result<Grammar, GrammarError> {
    let mut lexer = Lexer::new(input, config.strict, &config.separator);
    let mut grammar = Grammar::new();

    let mut pending: Option<Token> = lexer.next_token()?;
    let mut start_found = false;

    while let Some(head_tok) = pending.take() {
        if head_tok.kind != TokenKind::Identifier {
            return Err(GrammarError::Syntax {
                line: head_tok.line,
                column: head_tok.column,
                message: format!("expected a rule head, found '{}'", head_tok.text),
            });
        }
        if head_tok.text == crate::grammar::END_OF_INPUT_NAME {
            return Err(GrammarError::EndOfInputInBody { line: head_tok.line });
        }
        let head = grammar.put_symbol_unchecked(&head_tok.text, head_tok.line);
        if !start_found {
            grammar.set_start(&head_tok.text, head_tok.line)?;
            start_found = true;
        }

        let sep = lexer.next_token()?.ok_or_else(|| GrammarError::Syntax {
            line: head_tok.line,
            column: head_tok.column,
            message: format!("expected '{}' after rule head '{}'", config.separator, head_tok.text),
        })?;
        if sep.kind != TokenKind::Separator {
            return Err(GrammarError::Syntax {
                line: sep.line,
                column: sep.column,
                message: format!("expected '{}', found '{}'", config.separator, sep.text),
            });
        }

        loop {
            let (body, next) = read_body(&mut lexer, &mut grammar, head_tok.line)?;
            grammar.add_production(head, body);
            match next {
                Some(tok) if tok.kind == TokenKind::Pipe => continue,
                other => {
                    pending = other;
                    break;
                }
            }
        }
    }

    if !start_found {
        return Err(GrammarError::Syntax {
            line: 1,
            column: 1,
            message: "expected at least one rule".to_string(),
        });
    }

    grammar.finalize(config.strict)?;
    Ok(grammar)
}

/// Reads one production body (up to, but not consuming, the `|` or next
/// head token that ends it) and returns it together with that terminating
/// token so the caller can decide whether to loop or move on.
fn read_body(
    lexer: &mut Lexer,
    grammar: &mut Grammar,
    rule_line: u32,
) -> Result<(Vec<crate::index::SymbolId>, Option<Token>), GrammarError> {
    let mut body = Vec::new();
    let mut saw_epsilon = false;

    loop {
        let Some(tok) = lexer.next_token()? else {
            return Ok((body, None));
        };
        match tok.kind {
            TokenKind::Pipe => return Ok((body, Some(tok))),
            TokenKind::Separator => {
                return Err(GrammarError::Syntax {
                    line: tok.line,
                    column: tok.column,
                    message: "unexpected rule separator inside a production body".to_string(),
                })
            }
            TokenKind::QuotedLiteral => {
                if tok.text == crate::grammar::END_OF_INPUT_NAME {
                    return Err(GrammarError::EndOfInputInBody { line: tok.line });
                }
                body.push(grammar.put_symbol(&tok.text, true));
            }
            TokenKind::Identifier => {
                if tok.text == crate::grammar::END_OF_INPUT_NAME {
                    return Err(GrammarError::EndOfInputInBody { line: tok.line });
                }
                if EPSILON_KEYWORDS.contains(&tok.text.as_str()) {
                    saw_epsilon = true;
                    if !body.is_empty() {
                        return Err(GrammarError::EpsilonMixedWithSymbols { line: tok.line });
                    }
                    // Peek ahead: if more body symbols follow before the next
                    // `|`/head, epsilon was mixed in after all.
                    continue;
                }
                if saw_epsilon {
                    return Err(GrammarError::EpsilonMixedWithSymbols { line: tok.line });
                }
                // A head always starts a fresh rule group; but inside a body
                // we cannot yet tell an upcoming head from another body
                // symbol without look-ahead, so the next token decides.
                // If it turns out to be a separator, this identifier was
                // really the start of the next rule and we hand it back.
                if is_next_head(lexer)? {
                    return Ok((body, Some(tok)));
                }
                body.push(grammar.put_symbol_unchecked(&tok.text, tok.line));
            }
        }
    }
    // unreachable: every branch above returns or continues
    #[allow(unreachable_code)]
    {
        let _ = rule_line;
        unreachable!()
    }
}

/// Looks ahead (without consuming) to see whether `lexer`'s next token is a
/// rule separator, which would mean the identifier just read was actually
/// the head of the next rule rather than a body symbol.
fn is_next_head(lexer: &mut Lexer) -> Result<bool, GrammarError> {
    let checkpoint = (lexer.pos, lexer.line, lexer.column);
    let next = lexer.next_token()?;
    let is_sep = matches!(&next, Some(t) if t.kind == TokenKind::Separator);
    lexer.pos = checkpoint.0;
    lexer.line = checkpoint.1;
    lexer.column = checkpoint.2;
    Ok(is_sep)
}
