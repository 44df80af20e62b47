//! Runtime errors for the interpreter

use crate::ast::Span;
use thiserror::Error;

/// Runtime error during interpretation
#[derive(Debug, Clone, Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Innermost expression that failed, filled in by the evaluator
    pub span: Option<Span>,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reference to or assignment of a name bound nowhere in the chain
    UnboundVariable,
    /// Procedure applied to the wrong number of arguments
    ArityError,
    /// Primitive applied to an operand of the wrong kind
    TypeError,
    /// Operator position is not a procedure
    NotCallable,
    /// Integer division by zero
    DivisionByZero,
    /// Checked integer arithmetic overflowed
    IntegerOverflow,
    /// Call depth exceeded the configured limit
    StackOverflow,
    /// Writing to the output channel failed
    IoError,
}

impl RuntimeError {
    fn new(kind: ErrorKind, message: String) -> Self {
        RuntimeError {
            kind,
            message,
            span: None,
        }
    }

    pub fn unbound_variable(name: &str) -> Self {
        Self::new(ErrorKind::UnboundVariable, format!("unbound variable: {name}"))
    }

    pub fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityError,
            format!("procedure {name} expects {expected} argument(s), got {got}"),
        )
    }

    pub fn arity_at_least(name: &str, min: usize, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityError,
            format!("procedure {name} expects at least {min} argument(s), got {got}"),
        )
    }

    pub fn type_error(context: &str, expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeError,
            format!("type error in {context}: expected {expected}, got {got}"),
        )
    }

    pub fn not_callable(value: &str) -> Self {
        Self::new(ErrorKind::NotCallable, format!("not a procedure: {value}"))
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero".to_string())
    }

    pub fn integer_overflow(context: &str) -> Self {
        Self::new(ErrorKind::IntegerOverflow, format!("integer overflow in {context}"))
    }

    pub fn stack_overflow(limit: usize) -> Self {
        Self::new(
            ErrorKind::StackOverflow,
            format!("stack overflow: call depth exceeded {limit}"),
        )
    }

    pub fn io_error(msg: &str) -> Self {
        Self::new(ErrorKind::IoError, format!("IO error: {msg}"))
    }

    /// Attach `span` unless a more precise one is already set
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_variable_message() {
        let err = RuntimeError::unbound_variable("counter");
        assert_eq!(err.kind, ErrorKind::UnboundVariable);
        assert_eq!(err.message, "unbound variable: counter");
        assert_eq!(err.to_string(), "Runtime error: unbound variable: counter");
    }

    #[test]
    fn test_arity_messages() {
        let err = RuntimeError::arity_mismatch("c", 0, 2);
        assert_eq!(err.kind, ErrorKind::ArityError);
        assert_eq!(err.message, "procedure c expects 0 argument(s), got 2");

        let err = RuntimeError::arity_at_least("-", 1, 0);
        assert_eq!(err.kind, ErrorKind::ArityError);
        assert!(err.message.contains("at least 1"));
    }

    #[test]
    fn test_type_error_message() {
        let err = RuntimeError::type_error("+", "integer", "string");
        assert_eq!(err.message, "type error in +: expected integer, got string");
    }

    #[test]
    fn test_with_span_keeps_innermost() {
        let err = RuntimeError::division_by_zero()
            .with_span(Span::new(4, 5))
            .with_span(Span::new(0, 10));
        assert_eq!(err.span, Some(Span::new(4, 5)));
    }

    #[test]
    fn test_error_is_std_error() {
        let err = RuntimeError::not_callable("5");
        let std_err: &dyn std::error::Error = &err;
        assert!(std_err.source().is_none());
        assert_eq!(err.kind, ErrorKind::NotCallable);
    }
}
