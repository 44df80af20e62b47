//! Expression AST nodes

use super::Spanned;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Expression
///
/// One variant per evaluation rule. The reader lowers every special form into
/// its own variant, so the evaluator never inspects symbols to decide what a
/// list means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    IntLit(i64),
    /// String literal
    StrLit(String),
    /// Boolean literal (`#t` / `#f`)
    BoolLit(bool),

    /// Variable reference
    Var(String),

    /// `(define name value)`
    Define {
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },

    /// `(let ((name init) ...) body ...)`
    Let {
        bindings: Vec<LetBinding>,
        body: Vec<Spanned<Expr>>,
    },

    /// `(lambda (param ...) body ...)`
    ///
    /// The body is reference counted so every closure built from this node
    /// shares it instead of cloning the tree.
    Lambda {
        params: Vec<Spanned<String>>,
        body: Rc<[Spanned<Expr>]>,
    },

    /// `(set! name value)`
    Set {
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },

    /// `(if cond then else?)`
    If {
        cond: Box<Spanned<Expr>>,
        then_branch: Box<Spanned<Expr>>,
        else_branch: Option<Box<Spanned<Expr>>>,
    },

    /// Procedure application: `(callee arg ...)`
    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },

    /// `(cond (test expr ...) ... (else expr ...)?)`
    Cond { clauses: Vec<CondClause> },

    /// `(begin expr ...)`
    Begin(Vec<Spanned<Expr>>),
}

/// One `(name init)` pair of a `let` form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: Spanned<String>,
    pub init: Spanned<Expr>,
}

/// One clause of a `cond` form
///
/// `test` is `None` for a trailing `else` clause. A clause with a test and no
/// body yields the test value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondClause {
    pub test: Option<Spanned<Expr>>,
    pub body: Vec<Spanned<Expr>>,
}

impl Expr {
    /// Short name of the form, used in trace output
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntLit(_) | Expr::StrLit(_) | Expr::BoolLit(_) => "literal",
            Expr::Var(_) => "variable",
            Expr::Define { .. } => "define",
            Expr::Let { .. } => "let",
            Expr::Lambda { .. } => "lambda",
            Expr::Set { .. } => "set!",
            Expr::If { .. } => "if",
            Expr::Cond { .. } => "cond",
            Expr::Call { .. } => "application",
            Expr::Begin(_) => "begin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn sp<T>(node: T) -> Spanned<T> {
        Spanned::new(node, Span::new(0, 0))
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Expr::IntLit(1).kind_name(), "literal");
        assert_eq!(Expr::Var("x".to_string()).kind_name(), "variable");
        assert_eq!(Expr::Begin(vec![]).kind_name(), "begin");
        assert_eq!(Expr::Cond { clauses: vec![] }.kind_name(), "cond");
        let set = Expr::Set {
            name: sp("n".to_string()),
            value: Box::new(sp(Expr::IntLit(0))),
        };
        assert_eq!(set.kind_name(), "set!");
    }

    #[test]
    fn test_lambda_body_is_shared_on_clone() {
        let lambda = Expr::Lambda {
            params: vec![],
            body: Rc::from(vec![sp(Expr::IntLit(1))]),
        };
        let copy = lambda.clone();
        match (&lambda, &copy) {
            (Expr::Lambda { body: a, .. }, Expr::Lambda { body: b, .. }) => {
                assert!(Rc::ptr_eq(a, b));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_serializes_to_json() {
        let expr = Expr::Call {
            callee: Box::new(sp(Expr::Var("display".to_string()))),
            args: vec![sp(Expr::StrLit("hi".to_string()))],
        };
        let json = serde_json::to_string(&expr).unwrap();
        assert!(json.contains("\"Call\""));
        assert!(json.contains("\"display\""));
    }
}
