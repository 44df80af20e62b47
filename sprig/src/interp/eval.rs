//! Expression evaluator

use super::builtins::register_builtins;
use super::env::{extend, EnvRef, Environment};
use super::error::{InterpResult, RuntimeError};
use super::value::{Closure, Value};
use crate::ast::{CondClause, Expr, LetBinding, Program, Spanned};
use std::io::{self, Write};
use std::rc::Rc;

/// Default limit on nested closure applications
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Stack growth parameters for deep recursion
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Interpreter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Closure applications allowed to be in progress at once
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The interpreter
///
/// Owns the root frame, so definitions persist across `run` and `eval_expr`
/// calls on the same instance.
pub struct Interpreter {
    /// Root environment holding the primitives and top-level definitions
    global_env: EnvRef,
    /// Where `display` and `newline` write
    output: Box<dyn Write>,
    /// Closure applications currently in progress
    depth: usize,
    config: Config,
}

impl Interpreter {
    /// Create an interpreter writing to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Create an interpreter writing to `output`
    pub fn with_output(output: impl Write + 'static) -> Self {
        let mut root = Environment::new();
        register_builtins(&mut root);
        Interpreter {
            global_env: root.into_ref(),
            output: Box::new(output),
            depth: 0,
            config: Config::default(),
        }
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn global_env(&self) -> &EnvRef {
        &self.global_env
    }

    /// Evaluate every top-level form in order, stopping at the first failure.
    /// Returns the value of the last form.
    pub fn run(&mut self, program: &Program) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        let mut last = Value::Unspecified;
        for form in &program.forms {
            tracing::trace!(form = form.node.kind_name(), span = %form.span, "top-level form");
            last = self.eval(form, &env)?;
        }
        Ok(last)
    }

    /// Evaluate a single form in the root environment (for REPL)
    pub fn eval_expr(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        let env = Rc::clone(&self.global_env);
        self.eval(expr, &env)
    }

    /// Apply a procedure value to already-evaluated arguments
    pub fn apply(&mut self, callee: &Value, args: Vec<Value>) -> InterpResult<Value> {
        match callee {
            Value::Primitive(prim) => prim.call(&args, &mut *self.output),
            Value::Closure(closure) => self.call_closure(closure, args),
            other => Err(RuntimeError::not_callable(&other.written().to_string())),
        }
    }

    /// Evaluate an expression with automatic stack growth for deep recursion
    fn eval(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
            .map_err(|e| e.with_span(expr.span))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> InterpResult<Value> {
        match &expr.node {
            Expr::IntLit(n) => Ok(Value::Int(*n)),
            Expr::StrLit(s) => Ok(Value::string(s)),
            Expr::BoolLit(b) => Ok(Value::Bool(*b)),

            Expr::Var(name) => env
                .borrow()
                .get(name)
                .ok_or_else(|| RuntimeError::unbound_variable(name)),

            Expr::Define { name, value } => {
                let value = self.eval(value, env)?;
                if let Value::Closure(closure) = &value {
                    closure.name_if_anonymous(&name.node);
                }
                tracing::debug!(name = %name.node, kind = value.type_name(), "define");
                env.borrow_mut().define(name.node.clone(), value);
                Ok(Value::Unspecified)
            }

            // Initializers all see the enclosing frame; the new frame exists
            // only once every one of them has succeeded.
            Expr::Let { bindings, body } => {
                let mut values = Vec::with_capacity(bindings.len());
                for LetBinding { name, init } in bindings {
                    values.push((name.node.clone(), self.eval(init, env)?));
                }
                let frame = extend(env, values);
                self.eval_body(body, &frame)
            }

            Expr::Lambda { params, body } => {
                let params = params.iter().map(|p| p.node.clone()).collect();
                let closure = Closure::new(params, Rc::clone(body), Rc::clone(env));
                Ok(Value::Closure(Rc::new(closure)))
            }

            Expr::Set { name, value } => {
                let value = self.eval(value, env)?;
                tracing::debug!(name = %name.node, "assign");
                env.borrow().assign(&name.node, value)?;
                Ok(Value::Unspecified)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, env)?.is_truthy() {
                    self.eval(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.eval(else_branch, env)
                } else {
                    Ok(Value::Unspecified)
                }
            }

            Expr::Call { callee, args } => {
                let callee = self.eval(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, env)?);
                }
                self.apply(&callee, values)
            }

            Expr::Cond { clauses } => {
                for CondClause { test, body } in clauses {
                    let Some(test) = test else {
                        return self.eval_body(body, env);
                    };
                    let value = self.eval(test, env)?;
                    if value.is_truthy() {
                        return if body.is_empty() {
                            Ok(value)
                        } else {
                            self.eval_body(body, env)
                        };
                    }
                }
                Ok(Value::Unspecified)
            }

            Expr::Begin(body) => self.eval_body(body, env),
        }
    }

    /// Evaluate a sequence, keeping the last value. Empty yields Unspecified.
    fn eval_body(&mut self, body: &[Spanned<Expr>], env: &EnvRef) -> InterpResult<Value> {
        let mut result = Value::Unspecified;
        for expr in body {
            result = self.eval(expr, env)?;
        }
        Ok(result)
    }

    /// Arity and depth are checked before the call frame is created, so a
    /// rejected call has no effects.
    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> InterpResult<Value> {
        if closure.arity() != args.len() {
            return Err(RuntimeError::arity_mismatch(
                closure.name().unwrap_or("#<procedure>"),
                closure.arity(),
                args.len(),
            ));
        }

        if self.depth >= self.config.max_depth {
            return Err(RuntimeError::stack_overflow(self.config.max_depth));
        }
        self.depth += 1;
        tracing::trace!(
            name = closure.name().unwrap_or("#<procedure>"),
            arity = closure.arity(),
            depth = self.depth,
            "apply closure"
        );

        // Extend the captured frame, not the caller's
        let frame = extend(&closure.env, closure.params.iter().cloned().zip(args));
        let result = self.eval_body(&closure.body, &frame);
        self.depth -= 1;
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::interp::{ErrorKind, SharedOutput};
    use crate::parser::parse_source;

    fn spanned<T>(node: T) -> Spanned<T> {
        Spanned {
            node,
            span: Span { start: 0, end: 0 },
        }
    }

    fn interp() -> (Interpreter, SharedOutput) {
        let out = SharedOutput::new();
        (Interpreter::with_output(out.clone()), out)
    }

    fn run_src(interp: &mut Interpreter, source: &str) -> InterpResult<Value> {
        let program = parse_source("<test>", source).unwrap();
        interp.run(&program)
    }

    const COUNTER: &str = "(define c (let ((n 0)) (lambda () (set! n (+ n 1)) n)))";

    #[test]
    fn test_eval_literals() {
        let (mut interp, _) = interp();
        assert_eq!(interp.eval_expr(&spanned(Expr::IntLit(42))).unwrap(), Value::Int(42));
        assert_eq!(
            interp.eval_expr(&spanned(Expr::BoolLit(true))).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            interp.eval_expr(&spanned(Expr::StrLit("hi".to_string()))).unwrap(),
            Value::string("hi")
        );
    }

    #[test]
    fn test_eval_call_tree() {
        let (mut interp, _) = interp();
        let call = Expr::Call {
            callee: Box::new(spanned(Expr::Var("+".to_string()))),
            args: vec![spanned(Expr::IntLit(2)), spanned(Expr::IntLit(3))],
        };
        assert_eq!(interp.eval_expr(&spanned(call)).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_unbound_variable() {
        let (mut interp, _) = interp();
        let err = interp
            .eval_expr(&spanned(Expr::Var("nope".to_string())))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnboundVariable);
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_define_then_lookup() {
        let (mut interp, _) = interp();
        let result = run_src(&mut interp, "(define x 1) (define x 2) x").unwrap();
        assert_eq!(result, Value::Int(2));
        assert_eq!(run_src(&mut interp, "(define y 3)").unwrap(), Value::Unspecified);
    }

    #[test]
    fn test_counter_counts_up() {
        let (mut interp, _) = interp();
        run_src(&mut interp, COUNTER).unwrap();
        assert_eq!(run_src(&mut interp, "(c)").unwrap(), Value::Int(1));
        assert_eq!(run_src(&mut interp, "(c)").unwrap(), Value::Int(2));
        assert_eq!(run_src(&mut interp, "(c)").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_counter_display() {
        let (mut interp, out) = interp();
        run_src(
            &mut interp,
            &format!("{COUNTER} (display (c)) (display (c)) (display (c))"),
        )
        .unwrap();
        assert_eq!(out.contents(), "123");
    }

    #[test]
    fn test_closures_share_captured_binding() {
        let (mut interp, _) = interp();
        run_src(
            &mut interp,
            "(define pair
               (let ((n 0))
                 (lambda (op)
                   (if (= op 0)
                       (lambda () (set! n (+ n 1)) n)
                       (lambda () n)))))
             (define inc (pair 0))
             (define peek (pair 1))",
        )
        .unwrap();
        assert_eq!(run_src(&mut interp, "(inc) (inc) (peek)").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_separate_counters_are_independent() {
        let (mut interp, _) = interp();
        run_src(
            &mut interp,
            "(define (make) (let ((n 0)) (lambda () (set! n (+ n 1)) n)))
             (define a (make))
             (define b (make))
             (a) (a)",
        )
        .unwrap();
        assert_eq!(run_src(&mut interp, "(b)").unwrap(), Value::Int(1));
        assert_eq!(run_src(&mut interp, "(a)").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_let_initializers_see_outer_scope() {
        let (mut interp, _) = interp();
        let result = run_src(&mut interp, "(define x 1) (let ((x 10) (y x)) y)").unwrap();
        assert_eq!(result, Value::Int(1));
        assert!(!interp.global_env().borrow().contains("y"));
    }

    #[test]
    fn test_closure_extends_captured_env_not_caller() {
        let (mut interp, _) = interp();
        let result = run_src(
            &mut interp,
            "(define x 1)
             (define (get) x)
             (define (shadow x) (get))
             (shadow 99)",
        )
        .unwrap();
        assert_eq!(result, Value::Int(1));
    }

    #[test]
    fn test_set_unbound_does_not_define() {
        let (mut interp, _) = interp();
        let err = run_src(&mut interp, "(set! ghost 1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnboundVariable);
        assert!(!interp.global_env().borrow().contains("ghost"));
    }

    #[test]
    fn test_set_returns_unspecified() {
        let (mut interp, _) = interp();
        assert_eq!(
            run_src(&mut interp, "(define x 1) (set! x 2)").unwrap(),
            Value::Unspecified
        );
        assert_eq!(run_src(&mut interp, "x").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_arity_error_has_no_side_effects() {
        let (mut interp, out) = interp();
        run_src(&mut interp, "(define (f a) (display a) a)").unwrap();
        let err = run_src(&mut interp, "(f 1 2)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityError);
        assert!(err.message.contains("procedure f expects 1 argument(s), got 2"));
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_not_callable() {
        let (mut interp, _) = interp();
        let err = run_src(&mut interp, "(5 1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotCallable);
        let err = run_src(&mut interp, "(\"f\")").unwrap_err();
        assert!(err.message.contains("\"f\""));
    }

    #[test]
    fn test_operands_evaluate_left_to_right() {
        let (mut interp, out) = interp();
        run_src(
            &mut interp,
            "(define (say x) (display x) x) (+ (say 1) (say 2) (say 3))",
        )
        .unwrap();
        assert_eq!(out.contents(), "123");
    }

    #[test]
    fn test_failed_form_keeps_earlier_defines() {
        let (mut interp, _) = interp();
        let err = run_src(&mut interp, "(define a 1) (define b (+ a \"x\")) (define c 3)")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        let env = interp.global_env().borrow();
        assert!(env.contains("a"));
        assert!(!env.contains("b"));
        assert!(!env.contains("c"));
    }

    #[test]
    fn test_redefine_does_not_affect_captured_closures() {
        let (mut interp, _) = interp();
        run_src(&mut interp, COUNTER).unwrap();
        run_src(&mut interp, "(define old c) (c)").unwrap();
        run_src(&mut interp, COUNTER).unwrap();
        assert_eq!(run_src(&mut interp, "(old)").unwrap(), Value::Int(2));
        assert_eq!(run_src(&mut interp, "(c)").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_if_and_begin() {
        let (mut interp, _) = interp();
        assert_eq!(run_src(&mut interp, "(if #f 1 2)").unwrap(), Value::Int(2));
        assert_eq!(run_src(&mut interp, "(if 0 1 2)").unwrap(), Value::Int(1));
        assert_eq!(run_src(&mut interp, "(if #f 1)").unwrap(), Value::Unspecified);
        assert_eq!(run_src(&mut interp, "(begin)").unwrap(), Value::Unspecified);
        assert_eq!(run_src(&mut interp, "(begin 1 2 3)").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_cond_picks_first_true_clause() {
        let (mut interp, out) = interp();
        assert_eq!(run_src(&mut interp, "(cond (#t 0) (#f 1))").unwrap(), Value::Int(0));
        assert_eq!(run_src(&mut interp, "(cond (#f 0) (#t 1))").unwrap(), Value::Int(1));
        assert_eq!(run_src(&mut interp, "(cond (#f 0) (else 2))").unwrap(), Value::Int(2));
        assert_eq!(run_src(&mut interp, "(cond (#f 0))").unwrap(), Value::Unspecified);
        assert_eq!(run_src(&mut interp, "(cond)").unwrap(), Value::Unspecified);
        assert_eq!(run_src(&mut interp, "(cond (7))").unwrap(), Value::Int(7));

        run_src(
            &mut interp,
            "(cond ((display \"a\") (display \"b\") 1) (#t (display \"c\")))",
        )
        .unwrap();
        assert_eq!(out.contents(), "ab");
    }

    #[test]
    fn test_recursion() {
        let (mut interp, _) = interp();
        let result = run_src(
            &mut interp,
            "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 10)",
        )
        .unwrap();
        assert_eq!(result, Value::Int(3_628_800));
    }

    #[test]
    fn test_depth_limit() {
        let (mut interp, _) = interp();
        interp.set_config(Config { max_depth: 50 });
        run_src(&mut interp, "(define (down n) (if (= n 0) 0 (down (- n 1))))").unwrap();
        assert_eq!(run_src(&mut interp, "(down 40)").unwrap(), Value::Int(0));

        let err = run_src(&mut interp, "(down 100)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
        // depth is unwound after the failure
        assert_eq!(run_src(&mut interp, "(down 40)").unwrap(), Value::Int(0));
    }

    #[test]
    fn test_error_span_is_innermost() {
        let (mut interp, _) = interp();
        let err = run_src(&mut interp, "(+ 1 (+ 2 \"x\"))").unwrap_err();
        assert_eq!(err.span, Some(Span::new(5, 14)));
        let err = run_src(&mut interp, "(display missing)").unwrap_err();
        assert_eq!(err.span, Some(Span::new(9, 16)));
    }

    #[test]
    fn test_define_names_closure() {
        let (mut interp, _) = interp();
        run_src(&mut interp, "(define (f) 1) (define g f)").unwrap();
        let g = run_src(&mut interp, "g").unwrap();
        assert_eq!(g.to_string(), "#<procedure f>");
        assert_eq!(run_src(&mut interp, "+").unwrap().to_string(), "#<primitive +>");
    }

    #[test]
    fn test_apply_from_host() {
        let (mut interp, _) = interp();
        run_src(&mut interp, "(define (add3 a b c) (+ a b c))").unwrap();
        let add3 = interp.global_env().borrow().get("add3").unwrap();
        let result = interp
            .apply(&add3, vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .unwrap();
        assert_eq!(result, Value::Int(6));
        let err = interp.apply(&Value::Int(1), vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotCallable);
    }
}
