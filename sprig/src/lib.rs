//! Sprig: a small lexically scoped Lisp
//!
//! Source text goes through `lexer::tokenize` and `parser::parse` into an
//! `ast::Program`, which `interp::Interpreter` evaluates.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::{CompileError, Result};
pub use interp::{Config, Interpreter, RuntimeError, Value};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`
///
/// Does nothing unless `RUST_LOG` is set, so program output is never mixed
/// with log lines by default. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(filter)
                .init();
        }
    });
}
