//! The restricted expression language evaluated by node text.
//!
//! Node text is never executed by a host interpreter. Instead it is parsed
//! into the small AST below (arithmetic, comparisons, boolean logic, lists,
//! indexing and calls to a fixed builtin set) and evaluated by
//! [`crate::eval`].

pub mod lexer;
pub mod parser;

pub use parser::{parse_expr, parse_stmt, MAX_NESTING};

use crate::value::Value;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// Comparison operators, including membership tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Short-circuiting `and` / `or`.
    Logic {
        op: LogicOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A call to a builtin by name.
    Call {
        function: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
}

/// A statement: the text of a `Statement` node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `name = value`
    Assign { target: String, value: Expr },
    /// `name op= value`
    AugAssign {
        target: String,
        op: BinaryOp,
        value: Expr,
    },
    /// A bare expression, evaluated for its side effects.
    Expr(Expr),
}
