//! Graph builder: indented source text to [`Forest`].
//!
//! Each non-skipped line becomes one node placed at the spiral position of
//! its *line index* (skipped lines still advance the spiral). The parent is
//! the nearest previously created node with strictly smaller indentation,
//! found with a monotonic stack of open nodes.

use crate::classify::classify;
use crate::graph::Forest;
use crate::id::NodeId;
use crate::layout::spiral_position;
use crate::node::{Node, NodeKind};

/// Builds a forest from source text.
pub fn build(source: &str) -> Forest {
    let mut builder = GraphBuilder::new();
    for line in source.lines() {
        builder.push_line(line);
    }
    builder.finish()
}

/// Incremental line-by-line forest builder.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    forest: Forest,
    /// Open nodes with strictly increasing indentation, innermost last.
    open: Vec<(usize, NodeId)>,
    /// Index of the next line, which is also its spiral index.
    line: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder::default()
    }

    /// Consumes one raw source line. Returns the id of the created node, or
    /// `None` if the line was skipped.
    pub fn push_line(&mut self, raw: &str) -> Option<NodeId> {
        let n = self.line;
        self.line += 1;

        let text = raw.trim();
        let kind = classify(text)?;
        let indent = raw.chars().take_while(|c| c.is_whitespace()).count();

        while self.open.last().is_some_and(|&(depth, _)| depth >= indent) {
            self.open.pop();
        }
        let parent = self.open.last().and_then(|&(_, id)| self.body_owner(id));

        let mut node = Node::new(self.forest.next_id(), kind, text, spiral_position(n));
        node.indent = indent;
        node.line = Some(n);
        node.parent = parent;
        let id = self.forest.insert(node);
        self.open.push((indent, id));

        tracing::debug!(
            node = %id,
            line = n,
            kind = ?kind,
            parent = ?parent,
            "created node"
        );
        Some(id)
    }

    /// Returns the forest built so far.
    pub fn finish(self) -> Forest {
        self.forest
    }

    /// The node that owns a body line nested under `candidate`.
    ///
    /// Statements cannot own a body, so a line indented under a statement
    /// joins the statement's own enclosing block.
    fn body_owner(&self, candidate: NodeId) -> Option<NodeId> {
        let node = self.forest.node(candidate)?;
        if node.kind == NodeKind::Statement {
            node.parent
        } else {
            Some(candidate)
        }
    }
}
