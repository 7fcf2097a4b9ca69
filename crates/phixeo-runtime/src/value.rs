//! Runtime value representation.
//!
//! [`Value`] covers what the expression language can produce: scalars,
//! strings, lists and lazy integer ranges. Rendering follows the source
//! language: [`Value::to_string`] is `str(v)` and [`Value::repr`] is
//! `repr(v)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// `range(start, stop, step)`; `step` is never zero.
    Range { start: i64, stop: i64, step: i64 },
}

impl Value {
    /// Name of the value's type, as shown in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Range { .. } => "range",
        }
    }

    /// Truthiness: zero, empty and `None` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Range { .. } => self.len().unwrap_or(0) > 0,
        }
    }

    /// Length of a sized value, or `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Range { start, stop, step } => Some(range_len(*start, *stop, *step)),
            _ => None,
        }
    }

    /// `repr(v)`: strings are quoted, everything else renders as `str(v)`.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }

    /// Consumes the value and returns an iterator over its elements.
    pub fn into_values(self) -> Result<ValueIter, EvalError> {
        match self {
            Value::List(items) => Ok(ValueIter::List(items.into_iter())),
            Value::Str(s) => Ok(ValueIter::Chars(s.chars().collect::<Vec<_>>().into_iter())),
            Value::Range { start, stop, step } => Ok(ValueIter::Range {
                next: start,
                stop,
                step,
            }),
            other => Err(EvalError::NotIterable {
                type_name: other.type_name().to_string(),
            }),
        }
    }
}

fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let (start, stop, step) = (start as i128, stop as i128, step as i128);
    let span = if step > 0 { stop - start } else { start - stop };
    if span <= 0 || step == 0 {
        return 0;
    }
    let step = step.abs();
    ((span + step - 1) / step) as usize
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{sign}inf")
    } else if f != 0.0 && (f.abs() >= 1e16 || f.abs() < 1e-4) {
        scientific(f)
    } else if f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Shortest round-trip digits in `1.5e+16` / `1e-05` form.
fn scientific(f: f64) -> String {
    let shortest = format!("{f:e}");
    let (mantissa, exponent) = shortest.split_once('e').unwrap_or((shortest.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Range { start, stop, step } if *step == 1 => {
                write!(f, "range({start}, {stop})")
            }
            Value::Range { start, stop, step } => write!(f, "range({start}, {stop}, {step})"),
        }
    }
}

/// Owning iterator over the elements of an iterable [`Value`].
#[derive(Debug)]
pub enum ValueIter {
    List(std::vec::IntoIter<Value>),
    Chars(std::vec::IntoIter<char>),
    Range { next: i64, stop: i64, step: i64 },
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::List(items) => items.next(),
            ValueIter::Chars(chars) => chars.next().map(|c| Value::Str(c.to_string())),
            ValueIter::Range { next, stop, step } => {
                let more = if *step > 0 { *next < *stop } else { *next > *stop };
                if !more {
                    return None;
                }
                let current = *next;
                match next.checked_add(*step) {
                    Some(n) => *next = n,
                    // Saturate so the following call ends the iteration.
                    None => *next = *stop,
                }
                Some(Value::Int(current))
            }
        }
    }
}
