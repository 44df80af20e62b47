//! S-expressions to the closed `Expr` tree
//!
//! Special forms are recognised by their head symbol. Anything else with a
//! list shape becomes an application.

use super::reader::Sexp;
use crate::ast::{CondClause, Expr, LetBinding, Span, Spanned};
use crate::error::{CompileError, Result};
use crate::interp::{STACK_GROW_SIZE, STACK_RED_ZONE};
use std::collections::HashSet;
use std::rc::Rc;

/// Lower one datum into an expression
pub fn lower(datum: &Spanned<Sexp>) -> Result<Spanned<Expr>> {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || lower_datum(datum))
}

fn lower_datum(datum: &Spanned<Sexp>) -> Result<Spanned<Expr>> {
    let span = datum.span;
    let expr = match &datum.node {
        Sexp::Int(n) => Expr::IntLit(*n),
        Sexp::Str(s) => Expr::StrLit(s.clone()),
        Sexp::Bool(b) => Expr::BoolLit(*b),
        Sexp::Symbol(name) => Expr::Var(name.clone()),
        Sexp::List(items) => return lower_list(items, span),
    };
    Ok(Spanned::new(expr, span))
}

fn lower_list(items: &[Spanned<Sexp>], span: Span) -> Result<Spanned<Expr>> {
    let Some((head, rest)) = items.split_first() else {
        return Err(CompileError::parser("empty application `()`", span));
    };

    let expr = match head.node.as_symbol() {
        Some("define") => lower_define(rest, span)?,
        Some("let") => lower_let(rest, span)?,
        Some("lambda") => lower_lambda(rest, span)?,
        Some("set!") => lower_set(rest, span)?,
        Some("if") => lower_if(rest, span)?,
        Some("cond") => lower_cond(rest)?,
        Some("begin") => Expr::Begin(lower_seq(rest)?),
        _ => Expr::Call {
            callee: Box::new(lower(head)?),
            args: lower_seq(rest)?,
        },
    };
    Ok(Spanned::new(expr, span))
}

fn lower_seq(items: &[Spanned<Sexp>]) -> Result<Vec<Spanned<Expr>>> {
    items.iter().map(lower).collect()
}

/// A non-empty body sequence
fn lower_body(form: &str, items: &[Spanned<Sexp>], span: Span) -> Result<Vec<Spanned<Expr>>> {
    if items.is_empty() {
        return Err(CompileError::parser(format!("{form}: empty body"), span));
    }
    lower_seq(items)
}

fn symbol(form: &str, datum: &Spanned<Sexp>) -> Result<Spanned<String>> {
    match &datum.node {
        Sexp::Symbol(name) => Ok(Spanned::new(name.clone(), datum.span)),
        other => Err(CompileError::parser(
            format!("{form}: expected a symbol, found {}", other.describe()),
            datum.span,
        )),
    }
}

/// Parameter list: distinct symbols
fn params(form: &str, datum: &[Spanned<Sexp>]) -> Result<Vec<Spanned<String>>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(datum.len());
    for item in datum {
        let name = symbol(form, item)?;
        if !seen.insert(name.node.clone()) {
            return Err(CompileError::parser(
                format!("{form}: duplicate parameter `{}`", name.node),
                name.span,
            ));
        }
        out.push(name);
    }
    Ok(out)
}

fn lambda(params: Vec<Spanned<String>>, body: Vec<Spanned<Expr>>) -> Expr {
    Expr::Lambda {
        params,
        body: Rc::from(body),
    }
}

// (define name value) | (define (name param ...) body ...)
fn lower_define(rest: &[Spanned<Sexp>], span: Span) -> Result<Expr> {
    match rest {
        [target, value] if target.node.as_symbol().is_some() => Ok(Expr::Define {
            name: symbol("define", target)?,
            value: Box::new(lower(value)?),
        }),
        [target, body @ ..] => match &target.node {
            Sexp::List(signature) if !signature.is_empty() => {
                let name = symbol("define", &signature[0])?;
                let params = params("define", &signature[1..])?;
                let body = lower_body("define", body, span)?;
                Ok(Expr::Define {
                    name,
                    value: Box::new(Spanned::new(lambda(params, body), span)),
                })
            }
            Sexp::Symbol(_) => Err(CompileError::parser(
                "define: expected exactly one value expression",
                span,
            )),
            _ => Err(CompileError::parser(
                "define: expected a symbol or `(name param ...)`",
                target.span,
            )),
        },
        [] => Err(CompileError::parser("define: missing name", span)),
    }
}

// (let ((name init) ...) body ...)
fn lower_let(rest: &[Spanned<Sexp>], span: Span) -> Result<Expr> {
    let Some((bindings, body)) = rest.split_first() else {
        return Err(CompileError::parser("let: missing binding list", span));
    };
    let Sexp::List(pairs) = &bindings.node else {
        return Err(CompileError::parser("let: expected a binding list", bindings.span));
    };

    let mut seen = HashSet::new();
    let mut lowered = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let Sexp::List(parts) = &pair.node else {
            return Err(CompileError::parser("let: expected `(name init)`", pair.span));
        };
        let [name, init] = parts.as_slice() else {
            return Err(CompileError::parser("let: expected `(name init)`", pair.span));
        };
        let name = symbol("let", name)?;
        if !seen.insert(name.node.clone()) {
            return Err(CompileError::parser(
                format!("let: duplicate binding `{}`", name.node),
                name.span,
            ));
        }
        lowered.push(LetBinding {
            name,
            init: lower(init)?,
        });
    }

    Ok(Expr::Let {
        bindings: lowered,
        body: lower_body("let", body, span)?,
    })
}

// (lambda (param ...) body ...)
fn lower_lambda(rest: &[Spanned<Sexp>], span: Span) -> Result<Expr> {
    let Some((formals, body)) = rest.split_first() else {
        return Err(CompileError::parser("lambda: missing parameter list", span));
    };
    let Sexp::List(formals) = &formals.node else {
        return Err(CompileError::parser(
            "lambda: expected a parameter list",
            formals.span,
        ));
    };
    Ok(lambda(params("lambda", formals)?, lower_body("lambda", body, span)?))
}

// (set! name value)
fn lower_set(rest: &[Spanned<Sexp>], span: Span) -> Result<Expr> {
    let [name, value] = rest else {
        return Err(CompileError::parser("set!: expected `(set! name value)`", span));
    };
    Ok(Expr::Set {
        name: symbol("set!", name)?,
        value: Box::new(lower(value)?),
    })
}

// (if cond then else?)
fn lower_if(rest: &[Spanned<Sexp>], span: Span) -> Result<Expr> {
    let (cond, then_branch, else_branch) = match rest {
        [cond, then_branch] => (cond, then_branch, None),
        [cond, then_branch, else_branch] => (cond, then_branch, Some(else_branch)),
        _ => {
            return Err(CompileError::parser(
                "if: expected `(if cond then else?)`",
                span,
            ));
        }
    };
    Ok(Expr::If {
        cond: Box::new(lower(cond)?),
        then_branch: Box::new(lower(then_branch)?),
        else_branch: else_branch.map(lower).transpose()?.map(Box::new),
    })
}

// (cond (test expr ...) ... (else expr ...)?)
fn lower_cond(rest: &[Spanned<Sexp>]) -> Result<Expr> {
    let mut clauses = Vec::with_capacity(rest.len());
    for (i, clause) in rest.iter().enumerate() {
        let parts = match &clause.node {
            Sexp::List(parts) if !parts.is_empty() => parts,
            _ => {
                return Err(CompileError::parser(
                    "cond: expected `(test expr ...)`",
                    clause.span,
                ));
            }
        };
        let (test, body) = (&parts[0], &parts[1..]);
        let test = if test.node.as_symbol() == Some("else") {
            if i + 1 != rest.len() {
                return Err(CompileError::parser(
                    "cond: `else` must be the last clause",
                    clause.span,
                ));
            }
            None
        } else {
            Some(lower(test)?)
        };
        let body = match test {
            None => lower_body("cond", body, clause.span)?,
            Some(_) => lower_seq(body)?,
        };
        clauses.push(CondClause { test, body });
    }
    Ok(Expr::Cond { clauses })
}
