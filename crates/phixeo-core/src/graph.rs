//! Forest: the container for a parsed Phixeo program.
//!
//! [`Forest`] owns every node in an arena indexed by [`NodeId`] plus the
//! ordered list of roots. Nodes folded into a fractal aggregate stay in the
//! arena (they are the aggregate's `subnodes`) but leave their sibling list.
//!
//! The arena is private. Builders in this crate grow it through crate-level
//! methods; everything else reads it through the accessors below, so a forest
//! is effectively immutable once it leaves the builder or optimizer.

use std::collections::HashSet;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::{Node, NodeKind};

/// Indentation step used when regenerating source text.
pub const INDENT_STEP: usize = 4;

/// A forest of nodes with explicit parent/children links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forest {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new() -> Self {
        Forest::default()
    }

    /// Constructs a forest from raw parts without checking any invariant.
    ///
    /// Call [`Forest::validate`] before trusting the result.
    pub fn from_parts(nodes: Vec<Node>, roots: Vec<NodeId>) -> Self {
        Forest { nodes, roots }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// All nodes, including folded originals, in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Top-level nodes in program order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The id the next created node will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u32)
    }

    /// Children of `id`, or an empty slice for unknown ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Iterates the enclosing blocks of `id`, nearest first.
    ///
    /// Stops early if the chain exceeds the forest size, so a malformed
    /// forest cannot make this loop forever.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let limit = self.nodes.len();
        std::iter::successors(self.node(id).and_then(|n| n.parent), move |p| {
            self.node(*p).and_then(|n| n.parent)
        })
        .take(limit)
    }

    /// Nesting depth of `id` (roots are at depth 0).
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Counts every original node reachable from the roots, looking through
    /// aggregates at their subnodes.
    pub fn leaf_count(&self) -> usize {
        self.roots.iter().map(|&r| self.count_leaves(r)).sum()
    }

    /// Counts `id` and its body, expanding aggregates into their subnodes.
    pub fn count_leaves(&self, id: NodeId) -> usize {
        let Some(node) = self.node(id) else {
            return 0;
        };
        if node.is_aggregate() {
            return node.subnodes.iter().map(|&s| self.count_leaves(s)).sum();
        }
        1 + node
            .children
            .iter()
            .map(|&c| self.count_leaves(c))
            .sum::<usize>()
    }

    // -----------------------------------------------------------------------
    // Crate-level mutation (builder, optimizer, persistence)
    // -----------------------------------------------------------------------

    /// Appends `node` to the arena and links it under its parent (or as a
    /// root). The node's id is overwritten with the next free id.
    pub(crate) fn insert(&mut self, mut node: Node) -> NodeId {
        let id = self.next_id();
        node.id = id;
        match node.parent.and_then(|p| self.nodes.get_mut(p.index())) {
            Some(parent) => parent.children.push(id),
            None => {
                node.parent = None;
                self.roots.push(id);
            }
        }
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Pushes an already-linked node without touching any sibling list.
    pub(crate) fn push_detached(&mut self, node: Node) -> NodeId {
        let id = self.next_id();
        let mut node = node;
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.roots
    }

    // -----------------------------------------------------------------------
    // Structural validation
    // -----------------------------------------------------------------------

    /// Checks every structural invariant of the forest.
    ///
    /// - ids match arena positions and every reference resolves;
    /// - each node appears in at most one sibling list (roots, a `children`
    ///   list, or a `subnodes` list);
    /// - `child.parent == self` for every child, subnodes point back through
    ///   `group`, and roots have no parent;
    /// - statements have no body and aggregates never nest;
    /// - the parent relation is acyclic and every node is reachable.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.index() != index {
                return Err(CoreError::MisplacedNode { index, id: node.id });
            }
        }

        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut claim = |id: NodeId| -> Result<(), CoreError> {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateReference { node: id });
            }
            Ok(())
        };

        for &root in &self.roots {
            let node = self.resolve(root)?;
            claim(root)?;
            if let Some(parent) = node.parent {
                return Err(CoreError::ParentMismatch { parent, child: root });
            }
        }

        for node in &self.nodes {
            if node.kind == NodeKind::Statement && !node.children.is_empty() {
                return Err(CoreError::StatementWithChildren { node: node.id });
            }
            if let Some(parent) = node.parent {
                self.resolve(parent)?;
            }
            for &child in &node.children {
                let child_node = self.resolve(child)?;
                claim(child)?;
                if child_node.parent != Some(node.id) {
                    return Err(CoreError::ParentMismatch {
                        parent: node.id,
                        child,
                    });
                }
            }
            for &sub in &node.subnodes {
                let sub_node = self.resolve(sub)?;
                claim(sub)?;
                if sub_node.is_aggregate() {
                    return Err(CoreError::NestedAggregate {
                        node: sub,
                        group: node.id,
                    });
                }
                if sub_node.group != Some(node.id) {
                    return Err(CoreError::GroupMismatch {
                        node: sub,
                        group: node.id,
                    });
                }
            }
        }

        if is_cyclic_directed(&self.link_graph()) {
            return Err(CoreError::Cycle);
        }

        // Acyclic and each node claimed at most once: anything unclaimed is
        // unreachable from the roots.
        if let Some(orphan) = self.nodes.iter().find(|n| !seen.contains(&n.id)) {
            return Err(CoreError::Unreachable { node: orphan.id });
        }

        Ok(())
    }

    fn resolve(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.node(id).ok_or(CoreError::NodeNotFound { id })
    }

    /// Directed graph of every containment link (parent→child and
    /// aggregate→subnode).
    fn link_graph(&self) -> DiGraph<(), (), u32> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        for _ in &self.nodes {
            graph.add_node(());
        }
        for node in &self.nodes {
            let from = NodeIndex::<u32>::from(node.id);
            for &to in node.children.iter().chain(node.subnodes.iter()) {
                graph.add_edge(from, NodeIndex::from(to), ());
            }
        }
        graph
    }

    // -----------------------------------------------------------------------
    // Source export
    // -----------------------------------------------------------------------

    /// Regenerates indented source text from the forest.
    ///
    /// Bodies are indented by [`INDENT_STEP`] spaces per level; aggregates are
    /// expanded in place into their subnodes.
    pub fn to_source(&self) -> String {
        let mut lines = Vec::new();
        for &root in &self.roots {
            self.write_source(root, 0, &mut lines);
        }
        lines.join("\n")
    }

    fn write_source(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.is_aggregate() {
            for &sub in &node.subnodes {
                self.write_source(sub, depth, lines);
            }
            return;
        }
        lines.push(format!("{}{}", " ".repeat(depth * INDENT_STEP), node.text));
        for &child in &node.children {
            self.write_source(child, depth + 1, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::layout::Point;

    fn leaf(id: u32, kind: NodeKind, text: &str, parent: Option<u32>) -> Node {
        let mut node = Node::new(NodeId(id), kind, text, Point::default());
        node.parent = parent.map(NodeId);
        node
    }

    #[test]
    fn empty_forest_is_valid() {
        let forest = Forest::new();
        assert!(forest.is_empty());
        assert!(forest.validate().is_ok());
        assert_eq!(forest.leaf_count(), 0);
        assert_eq!(forest.to_source(), "");
    }

    #[test]
    fn ancestors_and_depth() {
        let forest = build("for i in range(2):\n    if i > 0:\n        print(i)");
        let print = NodeId(2);
        let chain: Vec<NodeId> = forest.ancestors(print).collect();
        assert_eq!(chain, vec![NodeId(1), NodeId(0)]);
        assert_eq!(forest.depth(print), 2);
        assert_eq!(forest.depth(NodeId(0)), 0);
    }

    #[test]
    fn validate_detects_cycle() {
        let mut a = leaf(0, NodeKind::Loop, "for a in x:", Some(1));
        let mut b = leaf(1, NodeKind::Loop, "for b in x:", Some(0));
        a.children.push(NodeId(1));
        b.children.push(NodeId(0));
        let forest = Forest::from_parts(vec![a, b], vec![]);
        assert!(matches!(forest.validate(), Err(CoreError::Cycle)));
    }

    #[test]
    fn validate_detects_dangling_child() {
        let mut a = leaf(0, NodeKind::Loop, "for a in x:", None);
        a.children.push(NodeId(9));
        let forest = Forest::from_parts(vec![a], vec![NodeId(0)]);
        assert!(matches!(
            forest.validate(),
            Err(CoreError::NodeNotFound { id }) if id == NodeId(9)
        ));
    }

    #[test]
    fn validate_detects_broken_back_link() {
        let mut a = leaf(0, NodeKind::Loop, "for a in x:", None);
        let b = leaf(1, NodeKind::Statement, "print(a)", None);
        a.children.push(NodeId(1));
        let forest = Forest::from_parts(vec![a, b], vec![NodeId(0)]);
        assert!(matches!(
            forest.validate(),
            Err(CoreError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn validate_detects_statement_body() {
        let mut a = leaf(0, NodeKind::Statement, "x = 1", None);
        let b = leaf(1, NodeKind::Statement, "print(x)", Some(0));
        a.children.push(NodeId(1));
        let forest = Forest::from_parts(vec![a, b], vec![NodeId(0)]);
        assert!(matches!(
            forest.validate(),
            Err(CoreError::StatementWithChildren { .. })
        ));
    }

    #[test]
    fn validate_detects_unreachable_node() {
        let a = leaf(0, NodeKind::Statement, "x = 1", None);
        let b = leaf(1, NodeKind::Statement, "y = 2", None);
        let forest = Forest::from_parts(vec![a, b], vec![NodeId(0)]);
        assert!(matches!(
            forest.validate(),
            Err(CoreError::Unreachable { node }) if node == NodeId(1)
        ));
    }

    #[test]
    fn to_source_reindents_bodies() {
        let forest = build("def f():\n  x = 1\n  for i in range(2):\n      print(i)");
        assert_eq!(
            forest.to_source(),
            "def f():\n    x = 1\n    for i in range(2):\n        print(i)"
        );
    }
}
