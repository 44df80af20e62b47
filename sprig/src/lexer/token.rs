//! Token definitions

use logos::Logos;
use std::fmt;

/// Sprig token
///
/// The surface syntax is plain s-expressions, so the token set is small:
/// delimiters, three literal kinds and symbols. Special forms such as
/// `define` or `set!` are ordinary symbols at this level.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r";[^\n]*")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[token("#t", |_| true)]
    #[token("#true", |_| true)]
    #[token("#f", |_| false)]
    #[token("#false", |_| false)]
    BoolLit(bool),

    // Takes the whole delimiter-free run, so out-of-range literals and runs
    // like `1abc` fail the callback and surface as lexer errors.
    #[regex(r#"-?[0-9][^\s()";]*"#, |lex| lex.slice().parse::<i64>().ok(), priority = 3)]
    IntLit(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    StringLit(String),

    #[regex(r##"[^\s()";#'0-9][^\s()";]*"##, |lex| lex.slice().to_string(), priority = 1)]
    Symbol(String),
}

/// Strip the quotes of a string literal and resolve its escapes
fn unescape(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('0') => result.push('\0'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::BoolLit(true) => write!(f, "#t"),
            Token::BoolLit(false) => write!(f, "#f"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::StringLit(s) => write!(f, "{s:?}"),
            Token::Symbol(s) => write!(f, "{s}"),
        }
    }
}
