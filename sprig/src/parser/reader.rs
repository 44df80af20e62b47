//! Token stream to s-expressions

use crate::ast::{Span, Spanned};
use crate::error::{CompileError, Result};
use crate::lexer::Token;

/// Deepest list nesting the reader accepts
pub const MAX_NESTING: usize = 1000;

/// Raw s-expression, before special forms are recognised
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Int(i64),
    Str(String),
    Bool(bool),
    Symbol(String),
    List(Vec<Spanned<Sexp>>),
}

impl Sexp {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexp::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Sexp::Int(_) => "integer",
            Sexp::Str(_) => "string",
            Sexp::Bool(_) => "boolean",
            Sexp::Symbol(_) => "symbol",
            Sexp::List(_) => "list",
        }
    }
}

/// Recursive-descent reader over a token vector
pub struct Reader {
    tokens: std::vec::IntoIter<(Token, Span)>,
    end: usize,
    depth: usize,
}

impl Reader {
    pub fn new(tokens: Vec<(Token, Span)>, source_len: usize) -> Self {
        Reader {
            tokens: tokens.into_iter(),
            end: source_len,
            depth: 0,
        }
    }

    /// Read every datum until the tokens run out
    pub fn read_all(mut self) -> Result<Vec<Spanned<Sexp>>> {
        let mut data = Vec::new();
        while let Some((token, span)) = self.tokens.next() {
            data.push(self.read_datum(token, span)?);
        }
        Ok(data)
    }

    fn read_datum(&mut self, token: Token, span: Span) -> Result<Spanned<Sexp>> {
        let datum = match token {
            Token::IntLit(n) => Sexp::Int(n),
            Token::StringLit(s) => Sexp::Str(s),
            Token::BoolLit(b) => Sexp::Bool(b),
            Token::Symbol(name) => Sexp::Symbol(name),
            Token::LParen => return self.read_list(span),
            Token::RParen => {
                return Err(CompileError::parser("unexpected `)`", span));
            }
        };
        Ok(Spanned::new(datum, span))
    }

    fn read_list(&mut self, open: Span) -> Result<Spanned<Sexp>> {
        if self.depth == MAX_NESTING {
            return Err(CompileError::parser(
                format!("nesting exceeds {MAX_NESTING} levels"),
                open,
            ));
        }
        self.depth += 1;
        let list = self.read_items(open);
        self.depth -= 1;
        list
    }

    fn read_items(&mut self, open: Span) -> Result<Spanned<Sexp>> {
        let mut items = Vec::new();
        loop {
            match self.tokens.next() {
                Some((Token::RParen, close)) => {
                    return Ok(Spanned::new(Sexp::List(items), open.merge(close)));
                }
                Some((token, span)) => items.push(self.read_datum(token, span)?),
                None => {
                    return Err(CompileError::unexpected_eof(
                        "unclosed `(`",
                        Span::new(open.start, self.end),
                    ));
                }
            }
        }
    }
}
