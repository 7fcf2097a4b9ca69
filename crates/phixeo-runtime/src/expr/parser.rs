//! Pratt parser from tokens to [`Expr`] / [`Stmt`].
//!
//! Binding powers, loosest first: `or`, `and`, `not`, comparisons (including
//! `in` / `not in`), `+ -`, `* / // %`, unary `- +`, `**` (right
//! associative), then calls and indexing.

use crate::error::EvalError;
use crate::value::Value;

use super::lexer::{tokenize, Spanned, Token};
use super::{BinaryOp, CompareOp, Expr, LogicOp, Stmt, UnaryOp};

const KEYWORDS: &[&str] = &["and", "or", "not", "in", "True", "False", "None"];

const BP_OR: u8 = 1;
const BP_AND: u8 = 2;
const BP_NOT: u8 = 3;
const BP_COMPARE: u8 = 4;
const BP_SUM: u8 = 5;
const BP_PRODUCT: u8 = 6;
const BP_UNARY: u8 = 7;
const BP_POWER: u8 = 8;

/// Deepest nesting one line may use: brackets, parentheses and operator
/// chains all count. Evaluation recurses over the same tree.
pub const MAX_NESTING: usize = 200;

/// Parses a complete expression.
pub fn parse_expr(src: &str) -> Result<Expr, EvalError> {
    let mut parser = Parser::new(src)?;
    let expr = parser.expression(0)?;
    parser.finish()?;
    Ok(expr)
}

/// Parses a complete statement: an assignment or a bare expression.
pub fn parse_stmt(src: &str) -> Result<Stmt, EvalError> {
    let mut parser = Parser::new(src)?;
    let stmt = parser.statement()?;
    parser.finish()?;
    Ok(stmt)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

/// What an infix token does once its binding power allows it.
enum Infix {
    Logic(LogicOp),
    Compare(CompareOp),
    Binary(BinaryOp),
}

impl Parser {
    fn new(src: &str) -> Result<Self, EvalError> {
        Ok(Parser {
            tokens: tokenize(src)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn column(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.column)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Syntax {
            column: self.column(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), EvalError> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn finish(&self) -> Result<(), EvalError> {
        match self.peek() {
            Token::Eof => Ok(()),
            other => Err(self.error(format!("unexpected {other:?}"))),
        }
    }

    fn too_deep(&self) -> EvalError {
        self.error("expression nested too deeply")
    }

    /// Height of a node whose tallest child has height `child`.
    fn grow(&self, child: usize) -> Result<usize, EvalError> {
        if child >= MAX_NESTING {
            return Err(self.too_deep());
        }
        Ok(child + 1)
    }

    fn is_keyword(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.peek_at(offset), Token::Name(n) if n == keyword)
    }

    // -----------------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, EvalError> {
        if let Token::Name(name) = self.peek().clone() {
            let op = match self.peek_at(1) {
                Token::Assign => Some(None),
                Token::AugAssign(op) => Some(Some(*op)),
                _ => None,
            };
            if let Some(op) = op {
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(self.error(format!("cannot assign to {name}")));
                }
                self.advance();
                self.advance();
                let value = self.expression(0)?;
                return Ok(match op {
                    None => Stmt::Assign {
                        target: name,
                        value,
                    },
                    Some(op) => Stmt::AugAssign {
                        target: name,
                        op,
                        value,
                    },
                });
            }
        }
        Ok(Stmt::Expr(self.expression(0)?))
    }

    // -----------------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------------

    fn expression(&mut self, min_bp: u8) -> Result<Expr, EvalError> {
        self.nested(min_bp).map(|(expr, _)| expr)
    }

    /// Parses an expression along with the height of its tree.
    fn nested(&mut self, min_bp: u8) -> Result<(Expr, usize), EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let parsed = self.operators(min_bp);
        self.depth -= 1;
        parsed
    }

    fn operators(&mut self, min_bp: u8) -> Result<(Expr, usize), EvalError> {
        let (mut lhs, mut height) = self.prefix()?;

        loop {
            let Some((bp, infix, width)) = self.infix() else {
                break;
            };
            if bp < min_bp {
                break;
            }
            for _ in 0..width {
                self.advance();
            }
            // `**` is right associative; everything else is left associative.
            let rhs_bp = if bp == BP_POWER { bp } else { bp + 1 };
            let (rhs, rhs_height) = self.nested(rhs_bp)?;
            height = self.grow(height.max(rhs_height))?;
            let rhs = Box::new(rhs);
            let lhs_box = Box::new(lhs);
            lhs = match infix {
                Infix::Logic(op) => Expr::Logic {
                    op,
                    lhs: lhs_box,
                    rhs,
                },
                Infix::Compare(op) => Expr::Compare {
                    op,
                    lhs: lhs_box,
                    rhs,
                },
                Infix::Binary(op) => Expr::Binary {
                    op,
                    lhs: lhs_box,
                    rhs,
                },
            };
        }
        Ok((lhs, height))
    }

    /// Classifies the upcoming infix operator as (binding power, meaning,
    /// token count).
    fn infix(&self) -> Option<(u8, Infix, usize)> {
        let found = match self.peek() {
            Token::Name(n) if n == "or" => (BP_OR, Infix::Logic(LogicOp::Or), 1),
            Token::Name(n) if n == "and" => (BP_AND, Infix::Logic(LogicOp::And), 1),
            Token::Name(n) if n == "in" => (BP_COMPARE, Infix::Compare(CompareOp::In), 1),
            Token::Name(n) if n == "not" && self.is_keyword(1, "in") => {
                (BP_COMPARE, Infix::Compare(CompareOp::NotIn), 2)
            }
            Token::EqEq => (BP_COMPARE, Infix::Compare(CompareOp::Eq), 1),
            Token::NotEq => (BP_COMPARE, Infix::Compare(CompareOp::Ne), 1),
            Token::Lt => (BP_COMPARE, Infix::Compare(CompareOp::Lt), 1),
            Token::Le => (BP_COMPARE, Infix::Compare(CompareOp::Le), 1),
            Token::Gt => (BP_COMPARE, Infix::Compare(CompareOp::Gt), 1),
            Token::Ge => (BP_COMPARE, Infix::Compare(CompareOp::Ge), 1),
            Token::Plus => (BP_SUM, Infix::Binary(BinaryOp::Add), 1),
            Token::Minus => (BP_SUM, Infix::Binary(BinaryOp::Sub), 1),
            Token::Star => (BP_PRODUCT, Infix::Binary(BinaryOp::Mul), 1),
            Token::Slash => (BP_PRODUCT, Infix::Binary(BinaryOp::Div), 1),
            Token::SlashSlash => (BP_PRODUCT, Infix::Binary(BinaryOp::FloorDiv), 1),
            Token::Percent => (BP_PRODUCT, Infix::Binary(BinaryOp::Mod), 1),
            Token::StarStar => (BP_POWER, Infix::Binary(BinaryOp::Pow), 1),
            _ => return None,
        };
        Some(found)
    }

    fn prefix(&mut self) -> Result<(Expr, usize), EvalError> {
        let op = match self.peek() {
            Token::Minus => Some((UnaryOp::Neg, BP_UNARY)),
            Token::Plus => Some((UnaryOp::Pos, BP_UNARY)),
            Token::Name(n) if n == "not" => Some((UnaryOp::Not, BP_NOT)),
            _ => None,
        };
        if let Some((op, bp)) = op {
            self.advance();
            let (operand, operand_height) = self.nested(bp)?;
            let height = self.grow(operand_height)?;
            let operand = Box::new(operand);
            return Ok((Expr::Unary { op, operand }, height));
        }

        let (atom, height) = self.atom()?;
        self.postfix(atom, height)
    }

    fn atom(&mut self) -> Result<(Expr, usize), EvalError> {
        let column = self.column();
        let leaf = |expr: Expr| -> Result<(Expr, usize), EvalError> { Ok((expr, 0)) };
        match self.advance() {
            Token::Int(i) => leaf(Expr::Literal(Value::Int(i))),
            Token::Float(f) => leaf(Expr::Literal(Value::Float(f))),
            Token::Str(s) => leaf(Expr::Literal(Value::Str(s))),
            Token::Name(n) => match n.as_str() {
                "True" => leaf(Expr::Literal(Value::Bool(true))),
                "False" => leaf(Expr::Literal(Value::Bool(false))),
                "None" => leaf(Expr::Literal(Value::None)),
                "and" | "or" | "in" | "not" => Err(EvalError::Syntax {
                    column,
                    message: format!("unexpected keyword '{n}'"),
                }),
                _ => leaf(Expr::Name(n)),
            },
            Token::LParen => {
                let inner = self.nested(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => {
                let (items, items_height) = self.sequence(Token::RBracket, "']'")?;
                Ok((Expr::List(items), self.grow(items_height)?))
            }
            Token::Eof => Err(EvalError::Syntax {
                column,
                message: "unexpected end of input".into(),
            }),
            other => Err(EvalError::Syntax {
                column,
                message: format!("unexpected {other:?}"),
            }),
        }
    }

    fn postfix(&mut self, mut expr: Expr, mut height: usize) -> Result<(Expr, usize), EvalError> {
        loop {
            match self.peek() {
                Token::LParen => {
                    let Expr::Name(function) = expr else {
                        return Err(self.error("only named builtins can be called"));
                    };
                    self.advance();
                    let (args, args_height) = self.sequence(Token::RParen, "')'")?;
                    height = self.grow(height.max(args_height))?;
                    expr = Expr::Call { function, args };
                }
                Token::LBracket => {
                    self.advance();
                    let (index, index_height) = self.nested(0)?;
                    self.expect(Token::RBracket, "']'")?;
                    height = self.grow(height.max(index_height))?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok((expr, height)),
            }
        }
    }

    /// Comma-separated expressions up to `close`, with the tallest item's
    /// height; a trailing comma is allowed.
    fn sequence(&mut self, close: Token, what: &str) -> Result<(Vec<Expr>, usize), EvalError> {
        let mut items = Vec::new();
        let mut height = 0;
        while *self.peek() != close {
            let (item, item_height) = self.nested(0)?;
            height = height.max(item_height);
            items.push(item);
            if *self.peek() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(close, what)?;
        Ok((items, height))
    }
}
