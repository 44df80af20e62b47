//! Parser: tokens to s-expressions, s-expressions to `Expr`

mod lower;
mod reader;


pub use reader::Sexp;

use crate::ast::{Program, Span};
use crate::error::Result;
use crate::lexer::Token;
use reader::Reader;

/// Parse tokens into a program
///
/// `source` is only used for its length, so an unclosed list can be reported
/// as running to the end of the input.
pub fn parse(filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let data = Reader::new(tokens, source.len()).read_all()?;
    let forms = data.iter().map(lower::lower).collect::<Result<Vec<_>>>()?;
    tracing::debug!(filename, forms = forms.len(), "parsed program");
    Ok(Program::new(forms))
}

/// Tokenize and parse in one step
pub fn parse_source(filename: &str, source: &str) -> Result<Program> {
    let tokens = crate::lexer::tokenize(source)?;
    parse(filename, source, tokens)
}
