//! Runtime values for the interpreter

use super::builtins::Primitive;
use super::env::EnvRef;
use crate::ast::{Expr, Spanned};
use std::cell::OnceCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

/// Runtime value
///
/// Values are never mutated in place. `set!` swaps the value held by a
/// binding slot; see `env::Binding`.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit integer
    Int(i64),
    /// Immutable text
    Str(Rc<str>),
    /// Boolean
    Bool(bool),
    /// Result of forms evaluated only for effect (`define`, `set!`, ...)
    Unspecified,
    /// User procedure
    Closure(Rc<Closure>),
    /// Native procedure from the primitive table
    Primitive(&'static Primitive),
}

/// A procedure value together with the frame it was created in
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<[Spanned<Expr>]>,
    /// Captured by reference; calls extend this frame, not the caller's
    pub env: EnvRef,
    /// Set by the first `define` that binds this closure
    name: OnceCell<String>,
}

impl Closure {
    pub fn new(params: Vec<String>, body: Rc<[Spanned<Expr>]>, env: EnvRef) -> Self {
        Closure {
            params,
            body,
            env,
            name: OnceCell::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Record a name for diagnostics; later names are ignored
    pub fn name_if_anonymous(&self, name: &str) {
        let _ = self.name.set(name.to_string());
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

// The captured frame can contain this closure, so it is left out.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Value {
    pub fn string(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }

    /// Only `#f` is false
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Primitive(_))
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Unspecified => "unspecified",
            Value::Closure(_) | Value::Primitive(_) => "procedure",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Written form: like `Display` but strings are quoted
    pub fn written(&self) -> Written<'_> {
        Written(self)
    }
}

/// Display form, as produced by `display`
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Unspecified => Ok(()),
            Value::Closure(closure) => match closure.name() {
                Some(name) => write!(f, "#<procedure {name}>"),
                None => write!(f, "#<procedure>"),
            },
            Value::Primitive(prim) => write!(f, "#<primitive {}>", prim.name),
        }
    }
}

/// See `Value::written`
pub struct Written<'a>(&'a Value);

impl fmt::Display for Written<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Str(s) => write_quoted(f, s),
            other => write!(f, "{other}"),
        }
    }
}

/// Quote `s` using only the escapes the lexer understands
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Procedures compare by identity, everything else by content
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unspecified, Value::Unspecified) => true,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Primitive(a), Value::Primitive(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}
