//! Core error types for phixeo-core.
//!
//! Every variant describes a structural problem with a forest: a reference
//! that does not resolve, a broken back-link, or a cycle. The runtime refuses
//! to execute a forest that produces any of these.

use crate::id::NodeId;
use thiserror::Error;

/// Errors produced while validating or loading a forest.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the forest.
    #[error("node not found: NodeId({id})")]
    NodeNotFound { id: NodeId },

    /// A node's id does not match its position in the arena.
    #[error("node at index {index} carries id {id}")]
    MisplacedNode { index: usize, id: NodeId },

    /// A node names a parent that does not list it as a child.
    #[error("node {child} names {parent} as parent, but {parent} does not list it")]
    ParentMismatch { parent: NodeId, child: NodeId },

    /// A node is listed as a child (or root) more than once.
    #[error("node {node} is referenced more than once")]
    DuplicateReference { node: NodeId },

    /// A statement node was given a body.
    #[error("statement node {node} cannot have children")]
    StatementWithChildren { node: NodeId },

    /// An aggregate node was folded into another aggregate.
    #[error("aggregate node {node} is nested inside aggregate {group}")]
    NestedAggregate { node: NodeId, group: NodeId },

    /// A subnode does not point back at the aggregate holding it.
    #[error("subnode {node} of aggregate {group} has a mismatched group link")]
    GroupMismatch { node: NodeId, group: NodeId },

    /// The parent relation contains a cycle.
    #[error("cycle detected in parent/children links")]
    Cycle,

    /// A node is not reachable from any root.
    #[error("node {node} is not reachable from any root")]
    Unreachable { node: NodeId },

    /// A persisted record references an index outside the record array.
    #[error("record {record} references index {index}, but only {len} records exist")]
    InvalidRecordIndex {
        record: usize,
        index: usize,
        len: usize,
    },

    /// The persisted JSON could not be read or written.
    #[error("persistence format error: {0}")]
    Format(#[from] serde_json::Error),
}
