//! Execution trace recording.
//!
//! When [`RuntimeConfig::trace_enabled`](crate::state::RuntimeConfig) is set,
//! the executor records one [`TraceEntry`] per evaluation step: each
//! statement, each loop iteration, each condition test and each function or
//! aggregate entry. Each step is appended after it releases the environment,
//! so steps of one subtree keep their execution order while steps of
//! concurrent subtrees may interleave differently from the output buffer.

use std::fmt;

use phixeo_core::{NodeId, NodeKind};

use crate::error::NodeError;
use crate::value::Value;

/// A single entry in the execution trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// The node that was evaluated.
    pub node_id: NodeId,
    pub kind: NodeKind,
    /// Index of the worker thread that ran the step.
    pub worker: usize,
    /// Loop value bound for this iteration, or the condition's value.
    pub value: Option<Value>,
    /// Set when the step failed.
    pub error: Option<NodeError>,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[worker {}] node {} ({})", self.worker, self.node_id, self.kind.label())?;
        if let Some(value) = &self.value {
            write!(f, " = {}", value.repr())?;
        }
        if let Some(error) = &self.error {
            write!(f, " failed: {error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_value_and_error() {
        let entry = TraceEntry {
            node_id: NodeId(2),
            kind: NodeKind::Loop,
            worker: 1,
            value: Some(Value::Int(7)),
            error: None,
        };
        let text = entry.to_string();
        assert!(text.starts_with("[worker 1] "));
        assert!(text.ends_with(" = 7"));

        let failed = TraceEntry {
            error: Some(NodeError::LoopSpec { text: "for x y:".into() }),
            value: None,
            ..entry
        };
        assert!(failed.to_string().contains("failed: malformed loop header"));
    }
}
