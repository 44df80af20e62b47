//! Tree-walking interpreter
//!
//! Evaluates `ast::Expr` trees against chained environment frames. Closures
//! capture their defining frame by reference, and `set!` writes through
//! shared binding slots, so state captured by several closures stays shared.

mod builtins;
mod env;
mod error;
mod eval;
mod output;
mod value;

pub use builtins::{primitive, register_builtins, Arity, BuiltinFn, Primitive, PRIMITIVES};
pub use env::{child_env, extend, Binding, EnvRef, Environment};
pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{Config, Interpreter, DEFAULT_MAX_DEPTH};
pub(crate) use eval::{STACK_GROW_SIZE, STACK_RED_ZONE};
pub use output::SharedOutput;
pub use value::{Closure, Value, Written};
