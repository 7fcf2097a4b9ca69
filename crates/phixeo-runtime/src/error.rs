//! Runtime error types.
//!
//! Errors come in two tiers. [`EvalError`] and [`NodeError`] are contained at
//! the node that raised them: they become an `Error: ...` line in the output
//! and the run goes on. [`RunError`] is the only error that reaches the caller
//! of a run, and it is raised before any node executes.

use phixeo_core::CoreError;
use serde::{Deserialize, Serialize};

/// Failure while evaluating one expression or statement.
///
/// Messages follow the wording users of the source language expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum EvalError {
    #[error("invalid syntax at column {column}: {message}")]
    Syntax { column: usize, message: String },

    #[error("name '{name}' is not defined")]
    UndefinedName { name: String },

    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: String,
        left: String,
        right: String,
    },

    #[error("'{op}' not supported between instances of '{left}' and '{right}'")]
    Unorderable {
        op: String,
        left: String,
        right: String,
    },

    #[error("bad operand type for unary {op}: '{operand}'")]
    BadOperand { op: String, operand: String },

    #[error("'{type_name}' object is not iterable")]
    NotIterable { type_name: String },

    #[error("'{type_name}' object is not subscriptable")]
    NotSubscriptable { type_name: String },

    #[error("'{name}' is not callable")]
    NotCallable { name: String },

    #[error("{function}() takes {expected} argument(s) ({got} given)")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    #[error("{message}")]
    InvalidValue { message: String },

    #[error("index out of range: {index} (length {len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    Overflow,

    /// A repetition or concatenation would exceed [`MAX_SEQUENCE_LEN`].
    ///
    /// [`MAX_SEQUENCE_LEN`]: crate::eval::MAX_SEQUENCE_LEN
    #[error("cannot build a sequence of {len} items (limit {limit})")]
    SizeLimit { len: u128, limit: usize },
}

/// Failure contained at a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum NodeError {
    /// The node's own expression or statement failed.
    #[error(transparent)]
    Evaluation(#[from] EvalError),

    /// A loop header that does not read `for <var> in <iterable>:`.
    #[error("malformed loop header '{text}': expected 'for <var> in <iterable>:'")]
    LoopSpec { text: String },

    /// A conditional header that does not read `if <expr>:`.
    #[error("malformed conditional header '{text}': expected 'if <expr>:'")]
    ConditionSpec { text: String },
}

/// Failure that aborts a run before it starts.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The forest violates a structural invariant (cycle, dangling link, ...).
    #[error("structural error: {0}")]
    Structural(#[from] CoreError),

    /// The runtime configuration cannot be used.
    #[error("invalid runtime configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A worker thread panicked.
    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_the_source_language() {
        let err = EvalError::UndefinedName { name: "i".into() };
        assert_eq!(err.to_string(), "name 'i' is not defined");

        let err = EvalError::UnsupportedOperands {
            op: "+".into(),
            left: "int".into(),
            right: "str".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
    }

    #[test]
    fn node_error_is_transparent_over_eval_error() {
        let err = NodeError::from(EvalError::DivisionByZero);
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn loop_spec_names_the_header() {
        let err = NodeError::LoopSpec {
            text: "for x range(3):".into(),
        };
        assert!(err.to_string().contains("'for x range(3):'"));
    }
}
