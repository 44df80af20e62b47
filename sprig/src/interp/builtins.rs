//! Primitive procedures registered in the root environment

use super::env::Environment;
use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use std::fmt;
use std::io::Write;

/// Native implementation of a primitive. Arity is checked before the call.
pub type BuiltinFn = fn(&[Value], &mut dyn Write) -> InterpResult<Value>;

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn check(self, name: &str, got: usize) -> InterpResult<()> {
        match self {
            Arity::Exact(n) if got != n => Err(RuntimeError::arity_mismatch(name, n, got)),
            Arity::AtLeast(n) if got < n => Err(RuntimeError::arity_at_least(name, n, got)),
            _ => Ok(()),
        }
    }
}

/// A native procedure. Values refer to entries of `PRIMITIVES` by address.
pub struct Primitive {
    pub name: &'static str,
    pub arity: Arity,
    func: BuiltinFn,
}

impl Primitive {
    pub fn call(&self, args: &[Value], out: &mut dyn Write) -> InterpResult<Value> {
        self.arity.check(self.name, args.len())?;
        (self.func)(args, out)
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({})", self.name)
    }
}

const fn prim(name: &'static str, arity: Arity, func: BuiltinFn) -> Primitive {
    Primitive { name, arity, func }
}

/// The primitive table
pub static PRIMITIVES: &[Primitive] = &[
    prim("+", Arity::AtLeast(0), builtin_add),
    prim("-", Arity::AtLeast(1), builtin_sub),
    prim("*", Arity::AtLeast(0), builtin_mul),
    prim("/", Arity::Exact(2), builtin_div),
    prim("=", Arity::Exact(2), builtin_num_eq),
    prim("<", Arity::Exact(2), builtin_lt),
    prim(">", Arity::Exact(2), builtin_gt),
    prim("<=", Arity::Exact(2), builtin_le),
    prim(">=", Arity::Exact(2), builtin_ge),
    prim("eq?", Arity::Exact(2), builtin_eq),
    prim("not", Arity::Exact(1), builtin_not),
    prim("number?", Arity::Exact(1), builtin_is_number),
    prim("string?", Arity::Exact(1), builtin_is_string),
    prim("procedure?", Arity::Exact(1), builtin_is_procedure),
    prim("display", Arity::Exact(1), builtin_display),
    prim("newline", Arity::Exact(0), builtin_newline),
];

/// Bind every primitive in `env`
pub fn register_builtins(env: &mut Environment) {
    for prim in PRIMITIVES {
        env.define(prim.name.to_string(), Value::Primitive(prim));
    }
}

/// Look up a primitive by name
pub fn primitive(name: &str) -> Option<&'static Primitive> {
    PRIMITIVES.iter().find(|prim| prim.name == name)
}

fn int_arg(context: &str, value: &Value) -> InterpResult<i64> {
    value
        .as_int()
        .ok_or_else(|| RuntimeError::type_error(context, "integer", value.type_name()))
}

fn fold_ints(
    context: &str,
    init: i64,
    args: &[Value],
    op: fn(i64, i64) -> Option<i64>,
) -> InterpResult<i64> {
    args.iter().try_fold(init, |acc, arg| {
        op(acc, int_arg(context, arg)?).ok_or_else(|| RuntimeError::integer_overflow(context))
    })
}

fn builtin_add(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    fold_ints("+", 0, args, i64::checked_add).map(Value::Int)
}

fn builtin_mul(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    fold_ints("*", 1, args, i64::checked_mul).map(Value::Int)
}

/// `(- x)` negates, `(- x y ...)` subtracts left to right
fn builtin_sub(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    let first = int_arg("-", &args[0])?;
    if args.len() == 1 {
        return first
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::integer_overflow("-"));
    }
    fold_ints("-", first, &args[1..], i64::checked_sub).map(Value::Int)
}

/// Truncating integer division
fn builtin_div(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    let a = int_arg("/", &args[0])?;
    let b = int_arg("/", &args[1])?;
    if b == 0 {
        return Err(RuntimeError::division_by_zero());
    }
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| RuntimeError::integer_overflow("/"))
}

fn compare(context: &str, args: &[Value], f: fn(i64, i64) -> bool) -> InterpResult<Value> {
    let a = int_arg(context, &args[0])?;
    let b = int_arg(context, &args[1])?;
    Ok(Value::Bool(f(a, b)))
}

fn builtin_num_eq(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    compare("=", args, |a, b| a == b)
}

fn builtin_lt(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    compare("<", args, |a, b| a < b)
}

fn builtin_gt(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    compare(">", args, |a, b| a > b)
}

fn builtin_le(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    compare("<=", args, |a, b| a <= b)
}

fn builtin_ge(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    compare(">=", args, |a, b| a >= b)
}

fn builtin_eq(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    Ok(Value::Bool(args[0] == args[1]))
}

fn builtin_not(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn builtin_is_number(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_))))
}

fn builtin_is_string(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

fn builtin_is_procedure(args: &[Value], _: &mut dyn Write) -> InterpResult<Value> {
    Ok(Value::Bool(args[0].is_procedure()))
}

/// Write the display form with no trailing separator
fn builtin_display(args: &[Value], out: &mut dyn Write) -> InterpResult<Value> {
    write!(out, "{}", args[0]).map_err(|e| RuntimeError::io_error(&e.to_string()))?;
    out.flush().map_err(|e| RuntimeError::io_error(&e.to_string()))?;
    Ok(Value::Unspecified)
}

fn builtin_newline(_: &[Value], out: &mut dyn Write) -> InterpResult<Value> {
    writeln!(out).map_err(|e| RuntimeError::io_error(&e.to_string()))?;
    out.flush().map_err(|e| RuntimeError::io_error(&e.to_string()))?;
    Ok(Value::Unspecified)
}
