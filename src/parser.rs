//! Parser for terms and equations.
//!
//! Syntax:
//! - `$x` - variable; names are local to one term or equation
//! - `a`, `e`, `0` - constant
//! - `(f x y ...)` - application; `(f)` is the constant `f`
//! - `lhs = rhs` - equation
//! - `lhs -> rhs` - equation written as a rule (same meaning to the parser)
//! - `# ...` - comment to end of line
//!
//! Symbol names may contain letters, digits, `_` and the operator characters
//! `* + / ^ ~ ' . ! ? < & |`.

use crate::equation::Equation;
use crate::symbol::SymbolStore;
use crate::term::{TermId, TermStore};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// A parsed term with the names of its variables.
#[derive(Clone, Debug)]
pub struct ParsedTerm {
    pub term_id: TermId,
    /// `var_names[i]` is the source name of variable `i`.
    pub var_names: Vec<String>,
}

/// A parsed equation; both sides share one variable scope.
#[derive(Clone, Debug)]
pub struct ParsedEquation {
    pub equation: Equation,
    pub var_names: Vec<String>,
}

/// Parse error with a byte offset into the input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn at(position: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parser writing into shared symbol and term stores.
pub struct Parser {
    symbols: Arc<SymbolStore>,
    terms: Arc<TermStore>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_stores(Arc::new(SymbolStore::new()), Arc::new(TermStore::new()))
    }

    pub fn with_stores(symbols: Arc<SymbolStore>, terms: Arc<TermStore>) -> Self {
        Self { symbols, terms }
    }

    pub fn symbols(&self) -> &Arc<SymbolStore> {
        &self.symbols
    }

    pub fn terms(&self) -> &Arc<TermStore> {
        &self.terms
    }

    /// Parse a single term.
    pub fn parse_term(&self, input: &str) -> Result<ParsedTerm, ParseError> {
        let mut cursor = Cursor::new(input);
        let mut scope = VarScope::default();
        let term_id = self.term(&mut cursor, &mut scope)?;
        cursor.expect_end("term")?;
        Ok(ParsedTerm {
            term_id,
            var_names: scope.names,
        })
    }

    /// Parse `lhs = rhs` or `lhs -> rhs`.
    pub fn parse_equation(&self, input: &str) -> Result<ParsedEquation, ParseError> {
        let mut cursor = Cursor::new(input);
        let mut scope = VarScope::default();
        let lhs = self.term(&mut cursor, &mut scope)?;
        cursor.skip_blank();
        if !cursor.eat("->") && !cursor.eat("=") {
            return Err(ParseError::at(cursor.pos, "Expected '=' or '->'"));
        }
        let rhs = self.term(&mut cursor, &mut scope)?;
        cursor.expect_end("equation")?;
        Ok(ParsedEquation {
            equation: Equation::new(lhs, rhs),
            var_names: scope.names,
        })
    }

    /// Parse one equation per line, skipping blank lines and comments.
    /// Reported positions are offsets into the whole input.
    pub fn parse_equations(&self, input: &str) -> Result<Vec<Equation>, ParseError> {
        let mut out = Vec::new();
        let mut offset = 0;
        for line in input.split_inclusive('\n') {
            let body = line.split('#').next().unwrap_or("");
            if !body.trim().is_empty() {
                let parsed = self
                    .parse_equation(body)
                    .map_err(|e| ParseError::at(offset + e.position, e.message))?;
                out.push(parsed.equation);
            }
            offset += line.len();
        }
        Ok(out)
    }

    fn term(&self, cursor: &mut Cursor<'_>, scope: &mut VarScope) -> Result<TermId, ParseError> {
        cursor.skip_blank();
        match cursor.peek() {
            None => Err(ParseError::at(cursor.pos, "Unexpected end of input")),
            Some(b'$') => {
                cursor.pos += 1;
                let name = cursor.identifier()?;
                Ok(self.terms.var(scope.index_of(name)))
            }
            Some(b'(') => {
                let open = cursor.pos;
                cursor.pos += 1;
                cursor.skip_blank();
                let functor = cursor.identifier()?;
                let sym = self.symbols.intern(functor);
                let mut args: SmallVec<[TermId; 4]> = SmallVec::new();
                loop {
                    cursor.skip_blank();
                    match cursor.peek() {
                        None => return Err(ParseError::at(open, "Unclosed parenthesis")),
                        Some(b')') => {
                            cursor.pos += 1;
                            break;
                        }
                        Some(_) => args.push(self.term(cursor, scope)?),
                    }
                }
                Ok(self.terms.app(sym, args))
            }
            Some(ch) if is_symbol_byte(ch) => {
                let name = cursor.identifier()?;
                Ok(self.terms.app0(self.symbols.intern(name)))
            }
            Some(ch) => Err(ParseError::at(
                cursor.pos,
                format!("Unexpected character: '{}'", ch as char),
            )),
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Variable names seen so far, numbered by first occurrence.
#[derive(Default)]
struct VarScope {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl VarScope {
    fn index_of(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Skip whitespace and `#` comments.
    fn skip_blank(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() {
                self.pos += 1;
            } else if ch == b'#' {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        while self.peek().is_some_and(is_symbol_byte) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ParseError::at(start, "Expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn expect_end(&mut self, what: &str) -> Result<(), ParseError> {
        self.skip_blank();
        if self.pos < self.input.len() {
            return Err(ParseError::at(
                self.pos,
                format!("Unexpected characters after {}", what),
            ));
        }
        Ok(())
    }
}

fn is_symbol_byte(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            b'_' | b'*' | b'+' | b'/' | b'^' | b'~' | b'\'' | b'.' | b'!' | b'?' | b'<' | b'&' | b'|'
        )
}

#[cfg(test)]
#[path = "tests/parser.rs"]
mod tests;
