//! Stable node identifier.
//!
//! Ids are handed out in creation order and double as the node's index in the
//! forest arena.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Stable node identifier. Maps to a petgraph `NodeIndex<u32>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between NodeId and petgraph's NodeIndex<u32>.

impl From<NodeIndex<u32>> for NodeId {
    fn from(idx: NodeIndex<u32>) -> Self {
        NodeId(idx.index() as u32)
    }
}

impl From<NodeId> for NodeIndex<u32> {
    fn from(id: NodeId) -> Self {
        NodeIndex::new(id.index())
    }
}
