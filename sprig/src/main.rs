//! Sprig CLI

use clap::{Parser, Subcommand};
use sprig::error::{report_error, report_runtime_error};
use sprig::interp::{Config, Interpreter, DEFAULT_MAX_DEPTH};
use sprig::repl::Repl;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sprig", version, about = "Sprig - a small lexically scoped Lisp")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a Sprig source file
    Run {
        /// Source file to run
        file: PathBuf,
        /// Maximum nesting of procedure calls
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Start the interactive REPL
    Repl {
        /// Maximum nesting of procedure calls
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

/// A diagnostic was already rendered; only the exit status is left to set
#[derive(Debug, thiserror::Error)]
#[error("aborting due to previous error")]
struct Reported;

fn main() {
    sprig::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Run { file, max_depth }) => run_file(&file, Config { max_depth }),
        Some(Command::Repl { max_depth }) => start_repl(Config { max_depth }),
        None => start_repl(Config::default()),
        Some(Command::Parse { file }) => parse_file(&file),
        Some(Command::Tokens { file }) => tokenize_file(&file),
    };

    if let Err(e) = result {
        if !e.is::<Reported>() {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn read_source(path: &Path) -> Result<(String, String), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();
    tracing::info!(file = %filename, bytes = source.len(), "loaded source");
    Ok((source, filename))
}

fn run_file(path: &Path, config: Config) -> CliResult {
    let (source, filename) = read_source(path)?;

    let program = match sprig::parser::parse_source(&filename, &source) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err)?;
            return Err(Reported.into());
        }
    };

    let mut interpreter = Interpreter::new();
    interpreter.set_config(config);
    if let Err(err) = interpreter.run(&program) {
        report_runtime_error(&filename, &source, &err)?;
        return Err(Reported.into());
    }
    Ok(())
}

fn start_repl(config: Config) -> CliResult {
    let mut repl = Repl::new(config)?;
    repl.run()?;
    Ok(())
}

fn parse_file(path: &Path) -> CliResult {
    let (source, filename) = read_source(path)?;

    let program = match sprig::parser::parse_source(&filename, &source) {
        Ok(program) => program,
        Err(err) => {
            report_error(&filename, &source, &err)?;
            return Err(Reported.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn tokenize_file(path: &Path) -> CliResult {
    let (source, filename) = read_source(path)?;

    let tokens = match sprig::lexer::tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            report_error(&filename, &source, &err)?;
            return Err(Reported.into());
        }
    };
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}
