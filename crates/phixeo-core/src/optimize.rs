//! Fractal optimizer: folds runs of similar siblings into aggregates.
//!
//! Two adjacent siblings are similar when they share a kind and the first
//! whitespace-delimited token of their text. Every maximal run of two or more
//! similar siblings is replaced, in place, by one `Function`-kind aggregate
//! that holds the run as its `subnodes`. Nothing is discarded, so the leaf
//! count of the forest is unchanged.

use serde::Serialize;

use crate::graph::Forest;
use crate::id::NodeId;
use crate::layout::Point;
use crate::node::{Node, NodeKind};

/// Summary of one optimizer pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    /// Aggregates created.
    pub groups: usize,
    /// Original nodes folded into those aggregates.
    pub folded: usize,
}

/// Folds similar sibling runs across the whole forest.
///
/// The root list and every child list are scanned. Subnodes of an existing
/// aggregate are never revisited, so aggregates do not nest.
pub fn optimize(forest: &mut Forest) -> OptimizeReport {
    let mut report = OptimizeReport::default();
    let roots = forest.roots().to_vec();
    let folded = fold_siblings(forest, &roots, None, &mut report);
    *forest.roots_mut() = folded;
    report
}

fn fold_siblings(
    forest: &mut Forest,
    siblings: &[NodeId],
    parent: Option<NodeId>,
    report: &mut OptimizeReport,
) -> Vec<NodeId> {
    for &id in siblings {
        let children = forest.children_of(id).to_vec();
        if children.is_empty() {
            continue;
        }
        let folded = fold_siblings(forest, &children, Some(id), report);
        if let Some(node) = forest.node_mut(id) {
            node.children = folded.into_iter().collect();
        }
    }

    let mut out = Vec::with_capacity(siblings.len());
    let mut start = 0;
    while start < siblings.len() {
        let mut end = start + 1;
        while end < siblings.len() && similar(forest, siblings[end - 1], siblings[end]) {
            end += 1;
        }
        let run = &siblings[start..end];
        if run.len() > 1 {
            out.push(aggregate(forest, run, parent));
            report.groups += 1;
            report.folded += run.len();
        } else {
            out.push(run[0]);
        }
        start = end;
    }
    out
}

fn similar(forest: &Forest, a: NodeId, b: NodeId) -> bool {
    match (forest.node(a), forest.node(b)) {
        (Some(a), Some(b)) => {
            !a.is_aggregate()
                && !b.is_aggregate()
                && a.kind == b.kind
                && a.leading_token() == b.leading_token()
        }
        _ => false,
    }
}

/// Creates the aggregate for `run` and links the run's nodes to it.
fn aggregate(forest: &mut Forest, run: &[NodeId], parent: Option<NodeId>) -> NodeId {
    let members: Vec<&Node> = run.iter().filter_map(|&id| forest.node(id)).collect();
    let kind = members.first().map(|n| n.kind).unwrap_or(NodeKind::Statement);
    let indent = members.first().map(|n| n.indent).unwrap_or(0);
    let position = Point::centroid(members.iter().map(|n| n.position)).unwrap_or_default();

    let mut node = Node::new(
        forest.next_id(),
        NodeKind::Function,
        format!("group_{}", kind.label()),
        position,
    );
    node.indent = indent;
    node.parent = parent;
    node.subnodes = run.to_vec();
    let id = forest.push_detached(node);

    for &member in run {
        if let Some(node) = forest.node_mut(member) {
            node.group = Some(id);
        }
    }
    tracing::debug!(aggregate = %id, members = run.len(), kind = ?kind, "folded sibling run");
    id
}
