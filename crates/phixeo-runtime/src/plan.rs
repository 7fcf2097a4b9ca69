//! Per-node execution plans.
//!
//! Every node's text is parsed exactly once, before the worker pool starts.
//! A parse failure is kept in the plan rather than raised: it surfaces as
//! that node's `Error: ...` line when the node runs, like any other per-node
//! failure.

use phixeo_core::{Node, NodeKind};

use crate::error::{EvalError, NodeError};
use crate::expr::{parse_expr, parse_stmt, Expr, Stmt};

/// A parsed `for <var> in <iterable>:` header.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopHeader {
    pub var: String,
    pub iterable: Expr,
}

/// What running a node means.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Statement(Result<Stmt, EvalError>),
    Loop(Result<LoopHeader, NodeError>),
    Conditional(Result<Expr, NodeError>),
    /// Emit the header, then run the body once.
    Function,
    /// Run the subnodes in order; no output of its own.
    Aggregate,
}

/// Compiles one node into its plan.
pub fn compile(node: &Node) -> Plan {
    if node.is_aggregate() {
        return Plan::Aggregate;
    }
    match node.kind {
        NodeKind::Statement => Plan::Statement(parse_stmt(node.text.trim())),
        NodeKind::Loop => Plan::Loop(parse_loop_header(&node.text)),
        NodeKind::Conditional => Plan::Conditional(parse_condition(&node.text)),
        NodeKind::Function => Plan::Function,
    }
}

fn strip_block_colon(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix(':').unwrap_or(text).trim_end()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses `for <var> in <iterable>:`.
///
/// # Errors
///
/// [`NodeError::LoopSpec`] when the header lacks `" in "` or the loop
/// variable is not a plain identifier; [`NodeError::Evaluation`] when the
/// iterable expression does not parse.
pub fn parse_loop_header(text: &str) -> Result<LoopHeader, NodeError> {
    let spec_error = || NodeError::LoopSpec {
        text: text.trim().to_string(),
    };
    let body = strip_block_colon(text);
    let body = body.strip_prefix("for ").unwrap_or(body);
    let (var, iterable) = body.split_once(" in ").ok_or_else(spec_error)?;
    let var = var.trim();
    if !is_identifier(var) {
        return Err(spec_error());
    }
    Ok(LoopHeader {
        var: var.to_string(),
        iterable: parse_expr(iterable)?,
    })
}

/// Parses `if <expr>:` into the condition expression.
pub fn parse_condition(text: &str) -> Result<Expr, NodeError> {
    let condition = strip_block_colon(text)
        .strip_prefix("if ")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| NodeError::ConditionSpec {
            text: text.trim().to_string(),
        })?;
    Ok(parse_expr(condition)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phixeo_core::{NodeId, Point};

    #[test]
    fn loop_header_splits_var_and_iterable() {
        let header = parse_loop_header("for i in range(3):").unwrap();
        assert_eq!(header.var, "i");
        assert_eq!(header.iterable, parse_expr("range(3)").unwrap());
    }

    #[test]
    fn loop_header_without_in_is_a_spec_error() {
        assert_eq!(
            parse_loop_header("for x range(3):"),
            Err(NodeError::LoopSpec {
                text: "for x range(3):".into()
            })
        );
    }

    #[test]
    fn loop_variable_must_be_an_identifier() {
        assert!(matches!(
            parse_loop_header("for a, b in pairs:"),
            Err(NodeError::LoopSpec { .. })
        ));
    }

    #[test]
    fn bad_iterable_is_an_evaluation_error() {
        assert!(matches!(
            parse_loop_header("for i in range(:"),
            Err(NodeError::Evaluation(EvalError::Syntax { .. }))
        ));
    }

    #[test]
    fn condition_strips_keyword_and_colon() {
        assert_eq!(parse_condition("if i > 2:").unwrap(), parse_expr("i > 2").unwrap());
        assert!(matches!(parse_condition("if :"), Err(NodeError::ConditionSpec { .. })));
    }

    #[test]
    fn aggregates_compile_to_aggregate_plans() {
        let mut node = Node::new(NodeId(3), NodeKind::Function, "group_statement", Point::new(0.0, 0.0));
        assert_eq!(compile(&node), Plan::Function);
        node.subnodes.push(NodeId(0));
        assert_eq!(compile(&node), Plan::Aggregate);
    }

    #[test]
    fn statements_keep_their_parse_errors() {
        let node = Node::new(NodeId(0), NodeKind::Statement, "x = = 1", Point::new(0.0, 0.0));
        assert!(matches!(compile(&node), Plan::Statement(Err(EvalError::Syntax { .. }))));
    }
}
