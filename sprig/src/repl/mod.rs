//! REPL (Read-Eval-Print Loop) for Sprig

use crate::error::{report_error, report_runtime_error, CompileError};
use crate::interp::{Config, Interpreter, RuntimeError, Value};
use crate::parser::parse_source;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const CONTINUATION_PROMPT: &str = "... ";
const HISTORY_FILE: &str = ".sprig_history";
const REPL_FILENAME: &str = "<repl>";

/// Result of feeding one line of input to a `Session`
#[derive(Debug)]
pub enum Outcome {
    /// The input so far ends inside an open list; more lines are needed
    Incomplete,
    /// Every form evaluated; holds the value of the last one
    Evaluated(Value),
    /// The accumulated input did not parse
    CompileFailed { source: String, error: CompileError },
    /// A form failed at runtime. Forms before it keep their effects.
    RuntimeFailed { source: String, error: RuntimeError },
}

/// Interpreter state plus any partially entered input
///
/// Kept apart from the line editor so it can be driven without a terminal.
pub struct Session {
    interpreter: Interpreter,
    pending: String,
}

impl Session {
    pub fn new(interpreter: Interpreter) -> Self {
        Session {
            interpreter,
            pending: String::new(),
        }
    }

    /// Prompt to show for the next line
    pub fn prompt(&self) -> &'static str {
        if self.pending.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        }
    }

    pub fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop partially entered input
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Append a line and evaluate once the input forms complete expressions
    pub fn feed(&mut self, line: &str) -> Outcome {
        if !self.pending.is_empty() {
            self.pending.push('\n');
        }
        self.pending.push_str(line);

        let program = match parse_source(REPL_FILENAME, &self.pending) {
            Err(error) if error.is_incomplete() => return Outcome::Incomplete,
            Err(error) => {
                let source = std::mem::take(&mut self.pending);
                return Outcome::CompileFailed { source, error };
            }
            Ok(program) => program,
        };

        let source = std::mem::take(&mut self.pending);
        match self.interpreter.run(&program) {
            Ok(value) => Outcome::Evaluated(value),
            Err(error) => Outcome::RuntimeFailed { source, error },
        }
    }

    /// User bindings of the root frame as `name = value` lines. Primitives
    /// are left out.
    pub fn env_listing(&self) -> Vec<String> {
        let env = self.interpreter.global_env().borrow();
        env.local_names()
            .into_iter()
            .filter_map(|name| match env.get(name) {
                Some(Value::Primitive(_)) | None => None,
                Some(value) => Some(format!("{name} = {}", value.written())),
            })
            .collect()
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}

/// REPL commands, entered as `:name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Clear,
    Env,
    Unknown,
}

impl Command {
    fn parse(input: &str) -> Self {
        match input {
            ":quit" | ":q" | ":exit" => Command::Quit,
            ":help" | ":h" | ":?" => Command::Help,
            ":clear" => Command::Clear,
            ":env" => Command::Env,
            _ => Command::Unknown,
        }
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let mut interpreter = Interpreter::new();
        interpreter.set_config(config);

        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session: Session::new(interpreter),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Sprig REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(self.session.prompt()) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() && !self.session.is_continuing() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(trimmed);

                    if !self.session.is_continuing() && trimmed.starts_with(':') {
                        if self.handle_command(trimmed) {
                            break;
                        }
                        continue;
                    }

                    let outcome = self.session.feed(&line);
                    print_outcome(&outcome);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.session.discard_pending();
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :). Returns true to exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match Command::parse(cmd) {
            Command::Quit => {
                println!("Goodbye!");
                return true;
            }
            Command::Help => print_help(),
            Command::Clear => print!("\x1B[2J\x1B[1;1H"),
            Command::Env => {
                for line in self.session.env_listing() {
                    println!("{line}");
                }
            }
            Command::Unknown => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
            }
        }
        false
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Incomplete => {}
        Outcome::Evaluated(Value::Unspecified) => {}
        Outcome::Evaluated(value) => println!("{}", value.written()),
        Outcome::CompileFailed { source, error } => {
            if report_error(REPL_FILENAME, source, error).is_err() {
                eprintln!("{error}");
            }
        }
        Outcome::RuntimeFailed { source, error } => {
            if report_runtime_error(REPL_FILENAME, source, error).is_err() {
                eprintln!("{error}");
            }
        }
    }
}

fn print_help() {
    println!("Sprig REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :clear          Clear the screen");
    println!("  :env            List top-level definitions");
    println!();
    println!("Special forms:");
    println!("  (define name expr)   (define (name params...) body...)");
    println!("  (let ((name init) ...) body...)");
    println!("  (lambda (params...) body...)");
    println!("  (set! name expr)   (if cond then else)   (begin expr...)");
    println!("  (cond (test expr...) ... (else expr...))");
    println!();
    println!("Primitives:");
    println!("  + - * /   = < > <= >=   eq? not");
    println!("  number? string? procedure?   display newline");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
