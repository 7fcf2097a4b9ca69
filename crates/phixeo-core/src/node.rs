//! Node types of the Phixeo graph.
//!
//! A [`Node`] is one recognized source line (or a fractal aggregate of
//! several). Its `parent`/`children` links encode block nesting; `subnodes`
//! and `group` encode fractal aggregation. The two relations are kept in
//! separate fields and never share one list.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::NodeId;
use crate::layout::{Point, PHI};

/// Ordered body of a block node. Most bodies are short.
pub type ChildList = SmallVec<[NodeId; 4]>;

/// The syntactic role of a node.
///
/// The editor's file format historically used geometric names for the kinds;
/// those are accepted as aliases when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// `print(...)` or `<name> = ...`.
    #[serde(alias = "Tetrahedral")]
    Statement,
    /// `for <var> in <iterable>:`.
    #[serde(alias = "Hexagonal")]
    Loop,
    /// `if <expr>:`.
    #[serde(alias = "Pentagonal")]
    Conditional,
    /// `def <name>(...):`, and every fractal aggregate.
    #[serde(alias = "Fractal")]
    Function,
}

impl NodeKind {
    /// Rendering size of this kind. Execution never reads it.
    pub fn size(self) -> f64 {
        let sqrt5 = 5f64.sqrt();
        match self {
            NodeKind::Statement => (PI * PI + PHI * sqrt5) / 2.0,
            NodeKind::Loop => PI + (2.0 * 3f64.sqrt()) / PHI,
            NodeKind::Conditional => (PI + PHI + sqrt5) / 3.0,
            NodeKind::Function => PI * PHI * PHI + 2f64.sqrt(),
        }
    }

    /// The geometric name the editor draws this kind as.
    pub fn shape_name(self) -> &'static str {
        match self {
            NodeKind::Statement => "Tetrahedral",
            NodeKind::Loop => "Hexagonal",
            NodeKind::Conditional => "Pentagonal",
            NodeKind::Function => "Fractal",
        }
    }

    /// Lower-case kind name, used for aggregate labels.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Statement => "statement",
            NodeKind::Loop => "loop",
            NodeKind::Conditional => "conditional",
            NodeKind::Function => "function",
        }
    }

    /// Returns `true` for kinds that own a body.
    pub fn is_block(self) -> bool {
        !matches!(self, NodeKind::Statement)
    }
}

/// A node of the forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Creation-order id; also the node's arena index.
    pub id: NodeId,
    pub kind: NodeKind,
    /// The trimmed source line, or a synthetic label for aggregates.
    pub text: String,
    /// Canvas position, fixed at creation.
    pub position: Point,
    /// Rendering size, see [`NodeKind::size`].
    pub size: f64,
    /// Leading-whitespace count of the source line.
    pub indent: usize,
    /// Source line index, when the node came from source text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Nearest enclosing block.
    pub parent: Option<NodeId>,
    /// Body statements, in source order.
    pub children: ChildList,
    /// Folded originals; non-empty only for aggregates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnodes: Vec<NodeId>,
    /// The aggregate this node was folded into, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeId>,
}

impl Node {
    /// Creates a node with no links.
    pub fn new(id: NodeId, kind: NodeKind, text: impl Into<String>, position: Point) -> Self {
        Node {
            id,
            kind,
            text: text.into(),
            position,
            size: kind.size(),
            indent: 0,
            line: None,
            parent: None,
            children: ChildList::new(),
            subnodes: Vec::new(),
            group: None,
        }
    }

    /// Returns `true` if this node was produced by the fractal optimizer.
    pub fn is_aggregate(&self) -> bool {
        !self.subnodes.is_empty()
    }

    /// First whitespace-delimited token of the text.
    pub fn leading_token(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }
}
