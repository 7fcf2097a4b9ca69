//! Evaluation of [`Expr`] and [`Stmt`] against an [`Environment`].
//!
//! Integer arithmetic is checked: overflow is an [`EvalError::Overflow`], not
//! a wrap. `/` always produces a float, while `//` and `%` floor toward
//! negative infinity so that `a == (a // b) * b + a % b` holds for every sign
//! combination.

use std::cmp::Ordering;

use crate::env::Environment;
use crate::error::EvalError;
use crate::expr::{BinaryOp, CompareOp, Expr, LogicOp, Stmt, UnaryOp};
use crate::value::Value;

/// Executes a statement, updating bindings and output in `env`.
pub fn exec_stmt(stmt: &Stmt, env: &mut Environment) -> Result<(), EvalError> {
    match stmt {
        Stmt::Assign { target, value } => {
            let value = eval_expr(value, env)?;
            env.bind(target.clone(), value);
        }
        Stmt::AugAssign { target, op, value } => {
            let current = env
                .get(target)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedName {
                    name: target.clone(),
                })?;
            let rhs = eval_expr(value, env)?;
            let updated = eval_binary(*op, current, rhs)?;
            env.bind(target.clone(), updated);
        }
        Stmt::Expr(expr) => {
            eval_expr(expr, env)?;
        }
    }
    Ok(())
}

/// Evaluates an expression. Only `print` writes to `env`.
pub fn eval_expr(expr: &Expr, env: &mut Environment) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedName { name: name.clone() }),
        Expr::List(items) => items
            .iter()
            .map(|item| eval_expr(item, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, env)?;
            eval_unary(*op, value)
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            eval_binary(*op, lhs, rhs)
        }
        Expr::Compare { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            eval_compare(*op, &lhs, &rhs).map(Value::Bool)
        }
        Expr::Logic { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, env)?;
            match (op, lhs.is_truthy()) {
                (LogicOp::And, false) | (LogicOp::Or, true) => Ok(lhs),
                _ => eval_expr(rhs, env),
            }
        }
        Expr::Call { function, args } => {
            if env.get(function).is_some() {
                return Err(EvalError::NotCallable {
                    name: function.clone(),
                });
            }
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(function, args, env)
        }
        Expr::Index { target, index } => {
            let target = eval_expr(target, env)?;
            let index = eval_expr(index, env)?;
            eval_index(target, &index)
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// A value viewed as a number. `bool` counts as an integer.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Num> {
        match value {
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn unsupported(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::UnsupportedOperands {
        op: op.symbol().to_string(),
        left: lhs.type_name().to_string(),
        right: rhs.type_name().to_string(),
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    let bad = |symbol: &str, value: &Value| EvalError::BadOperand {
        op: symbol.to_string(),
        operand: value.type_name().to_string(),
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match Num::of(&value) {
            Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Some(Num::Float(f)) => Ok(Value::Float(-f)),
            None => Err(bad("-", &value)),
        },
        UnaryOp::Pos => match Num::of(&value) {
            Some(Num::Int(i)) => Ok(Value::Int(i)),
            Some(Num::Float(f)) => Ok(Value::Float(f)),
            None => Err(bad("+", &value)),
        },
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            check_len(a.len() as u128 + b.len() as u128)?;
            return Ok(Value::Str(format!("{a}{b}")));
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            check_len(a.len() as u128 + b.len() as u128)?;
            return Ok(Value::List(a.iter().chain(b).cloned().collect()));
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            let count = repeat_count(s.len(), *n)?;
            return Ok(Value::Str(s.repeat(count)));
        }
        (BinaryOp::Mul, Value::List(items), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::List(items)) => {
            let count = repeat_count(items.len(), *n)?;
            let mut out = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            return Ok(Value::List(out));
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (Num::of(&lhs), Num::of(&rhs)) else {
        return Err(unsupported(op, &lhs, &rhs));
    };

    match (a, b) {
        (Num::Int(a), Num::Int(b)) => int_arith(op, a, b),
        (a, b) => float_arith(op, a.as_f64(), b.as_f64()),
    }
}

/// Longest string (in bytes) or list a single operation may build.
pub const MAX_SEQUENCE_LEN: usize = 1 << 24;

fn check_len(len: u128) -> Result<(), EvalError> {
    if len > MAX_SEQUENCE_LEN as u128 {
        return Err(EvalError::SizeLimit {
            len,
            limit: MAX_SEQUENCE_LEN,
        });
    }
    Ok(())
}

/// Repetition count for a sequence of `len` items; negative counts give an
/// empty result.
fn repeat_count(len: usize, n: i64) -> Result<usize, EvalError> {
    let count = usize::try_from(n).unwrap_or(0);
    check_len(len as u128 * count as u128)?;
    Ok(count)
}

fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let checked = |v: Option<i64>| v.map(Value::Int).ok_or(EvalError::Overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => float_arith(op, a as f64, b as f64),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or(EvalError::Overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                Ok(Value::Int(q - 1))
            } else {
                Ok(Value::Int(q))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            // i64::MIN % -1 overflows in Rust but is 0 mathematically.
            let r = a.checked_rem(b).unwrap_or(0);
            if r != 0 && ((r < 0) != (b < 0)) {
                Ok(Value::Int(r + b))
            } else {
                Ok(Value::Int(r))
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exp = u32::try_from(b).map_err(|_| EvalError::Overflow)?;
            checked(a.checked_pow(exp))
        }
    }
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(value))
}

fn eval_compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    let ordered = |symbol: &str, accept: fn(Ordering) -> bool| -> Result<bool, EvalError> {
        Ok(compare_values(symbol, lhs, rhs)?.is_some_and(accept))
    };
    match op {
        CompareOp::Eq => Ok(values_equal(lhs, rhs)),
        CompareOp::Ne => Ok(!values_equal(lhs, rhs)),
        CompareOp::Lt => ordered("<", Ordering::is_lt),
        CompareOp::Le => ordered("<=", Ordering::is_le),
        CompareOp::Gt => ordered(">", Ordering::is_gt),
        CompareOp::Ge => ordered(">=", Ordering::is_ge),
        CompareOp::In => contains(rhs, lhs),
        CompareOp::NotIn => contains(rhs, lhs).map(|found| !found),
    }
}

/// Structural equality with numeric cross-type comparison (`1 == 1.0 == True`).
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => match (Num::of(lhs), Num::of(rhs)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
            _ => lhs == rhs,
        },
    }
}

/// Ordering between two values. `Ok(None)` means unordered (NaN involved).
fn compare_values(symbol: &str, lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, EvalError> {
    match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y) {
                    return compare_values(symbol, x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match (Num::of(lhs), Num::of(rhs)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
            _ => Err(EvalError::Unorderable {
                op: symbol.to_string(),
                left: lhs.type_name().to_string(),
                right: rhs.type_name().to_string(),
            }),
        },
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::InvalidValue {
                message: format!(
                    "'in <string>' requires string as left operand, not {}",
                    other.type_name()
                ),
            }),
        },
        Value::List(items) => Ok(items.iter().any(|x| values_equal(x, item))),
        Value::Range { start, stop, step } => {
            let target = match Num::of(item) {
                Some(Num::Int(i)) => i,
                Some(Num::Float(f)) if f.fract() == 0.0 && f.is_finite() => f as i64,
                _ => return Ok(false),
            };
            let in_bounds = if *step > 0 {
                *start <= target && target < *stop
            } else {
                *stop < target && target <= *start
            };
            Ok(in_bounds && (i128::from(target) - i128::from(*start)) % i128::from(*step) == 0)
        }
        other => Err(EvalError::NotIterable {
            type_name: other.type_name().to_string(),
        }),
    }
}

fn eval_index(target: Value, index: &Value) -> Result<Value, EvalError> {
    let len = match &target {
        Value::List(_) | Value::Str(_) | Value::Range { .. } => target.len().unwrap_or(0),
        other => {
            return Err(EvalError::NotSubscriptable {
                type_name: other.type_name().to_string(),
            })
        }
    };
    let raw = match index {
        Value::Bool(b) => i64::from(*b),
        Value::Int(i) => *i,
        other => {
            return Err(EvalError::InvalidValue {
                message: format!(
                    "{} indices must be integers, not {}",
                    target.type_name(),
                    other.type_name()
                ),
            })
        }
    };
    let out_of_range = || EvalError::IndexOutOfRange { index: raw, len };
    let position = if raw < 0 {
        i64::try_from(len).ok().and_then(|n| n.checked_add(raw))
    } else {
        Some(raw)
    };
    let position = position
        .and_then(|p| usize::try_from(p).ok())
        .filter(|&p| p < len)
        .ok_or_else(out_of_range)?;

    match target {
        Value::List(mut items) => Ok(items.swap_remove(position)),
        Value::Str(s) => s
            .chars()
            .nth(position)
            .map(|c| Value::Str(c.to_string()))
            .ok_or_else(out_of_range),
        Value::Range { start, step, .. } => i64::try_from(position)
            .ok()
            .and_then(|p| p.checked_mul(step))
            .and_then(|offset| start.checked_add(offset))
            .map(Value::Int)
            .ok_or(EvalError::Overflow),
        _ => Err(out_of_range()),
    }
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

fn arity(function: &str, expected: &str, got: usize) -> EvalError {
    EvalError::Arity {
        function: function.to_string(),
        expected: expected.to_string(),
        got,
    }
}

fn invalid(message: impl Into<String>) -> EvalError {
    EvalError::InvalidValue {
        message: message.into(),
    }
}

fn call_builtin(function: &str, args: Vec<Value>, env: &mut Environment) -> Result<Value, EvalError> {
    match function {
        "print" => {
            let line: Vec<String> = args.iter().map(Value::to_string).collect();
            env.emit(line.join(" "));
            Ok(Value::None)
        }
        "range" => builtin_range(&args),
        "len" => {
            let [value] = args.as_slice() else {
                return Err(arity(function, "exactly one", args.len()));
            };
            value
                .len()
                .and_then(|n| i64::try_from(n).ok())
                .map(Value::Int)
                .ok_or_else(|| invalid(format!("object of type '{}' has no len()", value.type_name())))
        }
        "str" => match args.as_slice() {
            [] => Ok(Value::Str(String::new())),
            [value] => Ok(Value::Str(value.to_string())),
            _ => Err(arity(function, "at most one", args.len())),
        },
        "int" => match args.as_slice() {
            [] => Ok(Value::Int(0)),
            [value] => to_int(value).map(Value::Int),
            _ => Err(arity(function, "at most one", args.len())),
        },
        "float" => match args.as_slice() {
            [] => Ok(Value::Float(0.0)),
            [value] => to_float(value).map(Value::Float),
            _ => Err(arity(function, "at most one", args.len())),
        },
        "abs" => {
            let [value] = args.as_slice() else {
                return Err(arity(function, "exactly one", args.len()));
            };
            match Num::of(value) {
                Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
                Some(Num::Float(f)) => Ok(Value::Float(f.abs())),
                None => Err(EvalError::BadOperand {
                    op: "abs()".to_string(),
                    operand: value.type_name().to_string(),
                }),
            }
        }
        "min" => extremum(function, args, Ordering::Less),
        "max" => extremum(function, args, Ordering::Greater),
        _ => Err(EvalError::UndefinedName {
            name: function.to_string(),
        }),
    }
}

fn integer_arg(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Int(i) => Ok(*i),
        other => Err(invalid(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

fn builtin_range(args: &[Value]) -> Result<Value, EvalError> {
    let (start, stop, step) = match args {
        [stop] => (0, integer_arg(stop)?, 1),
        [start, stop] => (integer_arg(start)?, integer_arg(stop)?, 1),
        [start, stop, step] => (integer_arg(start)?, integer_arg(stop)?, integer_arg(step)?),
        _ => return Err(arity("range", "1 to 3", args.len())),
    };
    if step == 0 {
        return Err(invalid("range() arg 3 must not be zero"));
    }
    Ok(Value::Range { start, stop, step })
}

fn to_int(value: &Value) -> Result<i64, EvalError> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Int(i) => Ok(*i),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(invalid(format!("cannot convert float {} to integer", value)));
            }
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(EvalError::Overflow);
            }
            Ok(truncated as i64)
        }
        Value::Str(s) => s
            .trim()
            .replace('_', "")
            .parse::<i64>()
            .map_err(|_| invalid(format!("invalid literal for int() with base 10: {}", value.repr()))),
        other => Err(invalid(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> Result<f64, EvalError> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(format!("could not convert string to float: {}", value.repr()))),
        other => Num::of(other).map(Num::as_f64).ok_or_else(|| {
            invalid(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

/// `min`/`max`: either one iterable argument or two or more values. Ties keep
/// the first candidate.
fn extremum(function: &str, mut args: Vec<Value>, wanted: Ordering) -> Result<Value, EvalError> {
    let candidates = match args.len() {
        0 => return Err(arity(function, "at least one", 0)),
        1 => match args.remove(0) {
            Value::Range { start, stop, step } => {
                return range_extremum(start, stop, step, wanted)
                    .map(Value::Int)
                    .ok_or_else(|| invalid(format!("{function}() arg is an empty sequence")))
            }
            iterable => iterable.into_values()?,
        },
        _ => Value::List(args).into_values()?,
    };
    let symbol = if wanted == Ordering::Less { "<" } else { ">" };
    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = Some(match best {
            None => candidate,
            Some(current) => {
                if compare_values(symbol, &candidate, &current)? == Some(wanted) {
                    candidate
                } else {
                    current
                }
            }
        });
    }
    best.ok_or_else(|| invalid(format!("{function}() arg is an empty sequence")))
}

/// Smallest or largest element of a range without walking it.
fn range_extremum(start: i64, stop: i64, step: i64, wanted: Ordering) -> Option<i64> {
    let len = Value::Range { start, stop, step }.len()?;
    if len == 0 {
        return None;
    }
    let last = i64::try_from(i128::from(start) + (len as i128 - 1) * i128::from(step)).ok()?;
    let ascending = step > 0;
    Some(if ascending == (wanted == Ordering::Greater) { last } else { start })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{parse_expr, parse_stmt};

    fn eval(src: &str) -> Result<Value, EvalError> {
        let mut env = Environment::new();
        eval_expr(&parse_expr(src).unwrap(), &mut env)
    }

    fn run(lines: &[&str]) -> Environment {
        let mut env = Environment::new();
        for line in lines {
            exec_stmt(&parse_stmt(line).unwrap(), &mut env).unwrap();
        }
        env
    }

    #[test]
    fn arithmetic_follows_source_language_rules() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("4 / 2").unwrap(), Value::Float(2.0));
        assert_eq!(eval("-7 // 2").unwrap(), Value::Int(-4));
        assert_eq!(eval("7 // -2").unwrap(), Value::Int(-4));
        assert_eq!(eval("-7 % 3").unwrap(), Value::Int(2));
        assert_eq!(eval("7 % -3").unwrap(), Value::Int(-2));
        assert_eq!(eval("2 ** 10").unwrap(), Value::Int(1024));
        assert_eq!(eval("-2 ** 2").unwrap(), Value::Int(-4));
        assert_eq!(eval("2 ** -1").unwrap(), Value::Float(0.5));
        assert_eq!(eval("1 + 0.5").unwrap(), Value::Float(1.5));
        assert_eq!(eval("True + 1").unwrap(), Value::Int(2));
    }

    #[test]
    fn overflow_and_division_errors() {
        assert_eq!(eval("9223372036854775807 + 1"), Err(EvalError::Overflow));
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 // 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0.0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn strings_and_lists() {
        assert_eq!(eval("'ab' + 'c'").unwrap(), Value::Str("abc".into()));
        assert_eq!(eval("'ab' * 2").unwrap(), Value::Str("abab".into()));
        assert_eq!(
            eval("[1] + [2] * 2").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(2)])
        );
        assert_eq!(eval("[1, 2, 3][-1]").unwrap(), Value::Int(3));
        assert_eq!(eval("'hey'[1]").unwrap(), Value::Str("e".into()));
        assert_eq!(eval("range(0, 10, 3)[2]").unwrap(), Value::Int(6));
        assert!(matches!(eval("[1][3]"), Err(EvalError::IndexOutOfRange { index: 3, len: 1 })));
        assert!(matches!(eval("5[0]"), Err(EvalError::NotSubscriptable { .. })));
    }

    #[test]
    fn oversized_sequences_fail_without_allocating() {
        assert!(matches!(
            eval("'ab' * 9223372036854775807"),
            Err(EvalError::SizeLimit { .. })
        ));
        assert!(matches!(eval("[0] * 10 ** 11"), Err(EvalError::SizeLimit { .. })));
        assert!(matches!(eval("10 ** 11 * [0, 1]"), Err(EvalError::SizeLimit { .. })));
        assert_eq!(eval("'ab' * -3").unwrap(), Value::Str(String::new()));
        assert_eq!(eval("[] * 9223372036854775807").unwrap(), Value::List(vec![]));

        let mut env = Environment::new();
        env.bind("s", Value::Str("x".repeat(MAX_SEQUENCE_LEN)));
        let err = eval_expr(&parse_expr("s + s").unwrap(), &mut env).unwrap_err();
        assert_eq!(
            err,
            EvalError::SizeLimit {
                len: 2 * MAX_SEQUENCE_LEN as u128,
                limit: MAX_SEQUENCE_LEN
            }
        );
    }

    #[test]
    fn min_and_max_of_huge_ranges_are_closed_form() {
        assert_eq!(eval("max(range(10 ** 15))").unwrap(), Value::Int(10i64.pow(15) - 1));
        assert_eq!(eval("min(range(10 ** 15))").unwrap(), Value::Int(0));
        assert_eq!(eval("min(range(5, 0, -1))").unwrap(), Value::Int(1));
        assert_eq!(eval("max(range(5, 0, -2))").unwrap(), Value::Int(5));
        assert_eq!(eval("max(range(1, 10, 4))").unwrap(), Value::Int(9));
        assert_eq!(
            eval("max(range(-9223372036854775807 - 1, 9223372036854775807))").unwrap(),
            Value::Int(i64::MAX - 1)
        );
        assert_eq!(
            eval("min(range(3, 3))").unwrap_err().to_string(),
            "min() arg is an empty sequence"
        );
    }

    #[test]
    fn comparisons_and_membership() {
        assert_eq!(eval("1 == 1.0").unwrap(), Value::Bool(true));
        assert_eq!(eval("2 > 2").unwrap(), Value::Bool(false));
        assert_eq!(eval("'a' < 'b'").unwrap(), Value::Bool(true));
        assert_eq!(eval("[1, 2] < [1, 3]").unwrap(), Value::Bool(true));
        assert_eq!(eval("3 in range(0, 10, 3)").unwrap(), Value::Bool(true));
        assert_eq!(eval("4 in range(0, 10, 3)").unwrap(), Value::Bool(false));
        assert_eq!(eval("'el' in 'hello'").unwrap(), Value::Bool(true));
        assert_eq!(eval("5 not in [1, 2]").unwrap(), Value::Bool(true));
        assert_eq!(
            eval("1 < 'a'").unwrap_err().to_string(),
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn logic_short_circuits() {
        assert_eq!(eval("0 and undefined").unwrap(), Value::Int(0));
        assert_eq!(eval("'x' or undefined").unwrap(), Value::Str("x".into()));
        assert_eq!(eval("not []").unwrap(), Value::Bool(true));
    }

    #[test]
    fn builtins() {
        assert_eq!(eval("len([1, 2, 3])").unwrap(), Value::Int(3));
        assert_eq!(eval("len(range(5))").unwrap(), Value::Int(5));
        assert_eq!(eval("str(2.0)").unwrap(), Value::Str("2.0".into()));
        assert_eq!(eval("int('42')").unwrap(), Value::Int(42));
        assert_eq!(eval("int(-2.7)").unwrap(), Value::Int(-2));
        assert_eq!(eval("float('1.5')").unwrap(), Value::Float(1.5));
        assert_eq!(eval("abs(-3)").unwrap(), Value::Int(3));
        assert_eq!(eval("min(3, 1, 2)").unwrap(), Value::Int(1));
        assert_eq!(eval("max([3, 7, 2])").unwrap(), Value::Int(7));
        assert_eq!(eval("max(range(4))").unwrap(), Value::Int(3));
        assert!(eval("min([])").is_err());
        assert!(matches!(eval("max(5)"), Err(EvalError::NotIterable { .. })));
        assert!(eval("range(1, 5, 0)").is_err());
        assert!(matches!(eval("len(1, 2)"), Err(EvalError::Arity { got: 2, .. })));
        assert!(matches!(eval("int('abc')"), Err(EvalError::InvalidValue { .. })));
        assert!(matches!(eval("nope(1)"), Err(EvalError::UndefinedName { .. })));
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        let env = run(&["print('a', 1, [2], None)", "print()"]);
        assert_eq!(env.output(), ["a 1 [2] None", ""]);
    }

    #[test]
    fn assignment_and_augmented_assignment() {
        let env = run(&["x = 5", "x += 2", "x *= 3", "name = 'phi'", "name += 'xeo'"]);
        assert_eq!(env.get("x"), Some(&Value::Int(21)));
        assert_eq!(env.get("name"), Some(&Value::Str("phixeo".into())));
    }

    #[test]
    fn augmented_assignment_needs_an_existing_binding() {
        let mut env = Environment::new();
        let err = exec_stmt(&parse_stmt("y += 1").unwrap(), &mut env).unwrap_err();
        assert_eq!(err.to_string(), "name 'y' is not defined");
    }

    #[test]
    fn bound_names_shadow_builtins() {
        let mut env = run(&["len = 3"]);
        let err = eval_expr(&parse_expr("len([1])").unwrap(), &mut env).unwrap_err();
        assert!(matches!(err, EvalError::NotCallable { .. }));
    }
}
