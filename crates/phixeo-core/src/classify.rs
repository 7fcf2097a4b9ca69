//! Line classification.
//!
//! The rules are substring checks tried in a fixed order: `for `, `if `,
//! `def `, then the generic statement rule. A `for`/`if` header often
//! contains `=` as well, so the block rules must win.

use crate::node::NodeKind;

/// Classifies one trimmed source line, or returns `None` if the line does not
/// produce a node.
pub fn classify(line: &str) -> Option<NodeKind> {
    if line.is_empty() {
        None
    } else if line.contains("for ") {
        Some(NodeKind::Loop)
    } else if line.contains("if ") {
        Some(NodeKind::Conditional)
    } else if line.contains("def ") {
        Some(NodeKind::Function)
    } else if line.contains("print") || line.contains('=') {
        Some(NodeKind::Statement)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_kind() {
        assert_eq!(classify("print('Start')"), Some(NodeKind::Statement));
        assert_eq!(classify("x = 5"), Some(NodeKind::Statement));
        assert_eq!(classify("for i in range(3):"), Some(NodeKind::Loop));
        assert_eq!(classify("if i > 2:"), Some(NodeKind::Conditional));
        assert_eq!(classify("def my_func():"), Some(NodeKind::Function));
    }

    #[test]
    fn block_rules_win_over_statement_rule() {
        assert_eq!(classify("for x in [a == b]:"), Some(NodeKind::Loop));
        assert_eq!(classify("if x == 1:"), Some(NodeKind::Conditional));
        assert_eq!(classify("def f(x=1):"), Some(NodeKind::Function));
    }

    #[test]
    fn loop_rule_is_checked_before_conditional_rule() {
        assert_eq!(classify("for i in xs if ok:"), Some(NodeKind::Loop));
    }

    #[test]
    fn unrecognized_lines_are_skipped() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("return x"), None);
        assert_eq!(classify("else:"), None);
        assert_eq!(classify("# a comment"), None);
    }

    #[test]
    fn keyword_needs_trailing_space() {
        assert_eq!(classify("format()"), None);
        assert_eq!(classify("define"), None);
    }
}
