//! Abstract Syntax Tree definitions

mod expr;
mod span;

pub use expr::*;
pub use span::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of top-level forms, evaluated in order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub forms: Vec<Spanned<Expr>>,
}

impl Program {
    pub fn new(forms: Vec<Spanned<Expr>>) -> Self {
        Self { forms }
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
