//! The editor's file format: a flat JSON array of node records.
//!
//! Each record is `{kind, x, y, text, children: [index, ...]}`, where indices
//! point into the same array. Aggregates additionally carry
//! `subnodes: [index, ...]`. Records are written in pre-order (a node, then its
//! subnodes, then its body), so the roots are exactly the records nobody
//! references, in record order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::{Forest, INDENT_STEP};
use crate::id::NodeId;
use crate::layout::Point;
use crate::node::{Node, NodeKind};

/// One node as stored on disk.
///
/// Files written by the graphical editor name the fields `type`, `value` and
/// `connections`; those names are accepted on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(alias = "type")]
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    #[serde(alias = "value")]
    pub text: String,
    #[serde(default, alias = "connections")]
    pub children: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnodes: Vec<usize>,
}

/// Flattens a forest into records.
pub fn to_records(forest: &Forest) -> Vec<NodeRecord> {
    let mut order = Vec::with_capacity(forest.len());
    for &root in forest.roots() {
        collect_preorder(forest, root, &mut order);
    }
    let index: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let lookup = |ids: &[NodeId]| -> Vec<usize> {
        ids.iter().filter_map(|id| index.get(id).copied()).collect()
    };

    order
        .iter()
        .filter_map(|&id| forest.node(id))
        .map(|node| NodeRecord {
            kind: node.kind,
            x: node.position.x,
            y: node.position.y,
            text: node.text.clone(),
            children: lookup(&node.children),
            subnodes: lookup(&node.subnodes),
        })
        .collect()
}

fn collect_preorder(forest: &Forest, id: NodeId, order: &mut Vec<NodeId>) {
    let Some(node) = forest.node(id) else {
        return;
    };
    order.push(id);
    for &sub in &node.subnodes {
        collect_preorder(forest, sub, order);
    }
    for &child in &node.children {
        collect_preorder(forest, child, order);
    }
}

/// Rebuilds a forest from records, re-resolving indices to node ids.
///
/// Node ids follow record order. Indentation is reconstructed as
/// [`INDENT_STEP`] spaces per nesting level.
///
/// # Errors
///
/// Returns [`CoreError`] for out-of-range indices, records referenced more
/// than once, and anything [`Forest::validate`] rejects.
pub fn from_records(records: &[NodeRecord]) -> Result<Forest, CoreError> {
    let len = records.len();
    let mut referenced = vec![false; len];

    for (record, rec) in records.iter().enumerate() {
        for &index in rec.children.iter().chain(rec.subnodes.iter()) {
            if index >= len {
                return Err(CoreError::InvalidRecordIndex { record, index, len });
            }
            if std::mem::replace(&mut referenced[index], true) {
                return Err(CoreError::DuplicateReference {
                    node: NodeId(index as u32),
                });
            }
        }
    }

    let mut nodes: Vec<Node> = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let mut node = Node::new(
                NodeId(i as u32),
                rec.kind,
                rec.text.clone(),
                Point::new(rec.x, rec.y),
            );
            node.children = rec.children.iter().map(|&c| NodeId(c as u32)).collect();
            node.subnodes = rec.subnodes.iter().map(|&s| NodeId(s as u32)).collect();
            node
        })
        .collect();

    for (i, rec) in records.iter().enumerate() {
        for &child in &rec.children {
            nodes[child].parent = Some(NodeId(i as u32));
        }
    }
    for (i, rec) in records.iter().enumerate() {
        let parent = nodes[i].parent;
        for &sub in &rec.subnodes {
            nodes[sub].group = Some(NodeId(i as u32));
            nodes[sub].parent = parent;
        }
    }

    let roots: Vec<NodeId> = (0..len)
        .filter(|&i| !referenced[i])
        .map(|i| NodeId(i as u32))
        .collect();

    let mut forest = Forest::from_parts(nodes, roots);
    forest.validate()?;

    for i in 0..len {
        let id = NodeId(i as u32);
        let depth = forest.depth(id);
        if let Some(node) = forest.node_mut(id) {
            node.indent = depth * INDENT_STEP;
        }
    }
    Ok(forest)
}

/// Serializes a forest to pretty-printed JSON.
pub fn to_json(forest: &Forest) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(&to_records(forest))?)
}

/// Parses a forest from JSON produced by [`to_json`] or by the editor.
pub fn from_json(json: &str) -> Result<Forest, CoreError> {
    let records: Vec<NodeRecord> = serde_json::from_str(json)?;
    from_records(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::optimize::optimize;

    fn topology(forest: &Forest) -> Vec<(NodeKind, String, Vec<usize>)> {
        to_records(forest)
            .into_iter()
            .map(|r| (r.kind, r.text, r.children))
            .collect()
    }

    #[test]
    fn records_reference_children_by_index() {
        let forest = build("print('Start')\nfor i in range(3):\n    print(i)");
        let records = to_records(&forest);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].kind, NodeKind::Loop);
        assert_eq!(records[1].children, vec![2]);
        assert!(records[0].children.is_empty());
        assert_eq!(records[2].x, forest.node(NodeId(2)).unwrap().position.x);
    }

    #[test]
    fn json_round_trip_keeps_topology_and_positions() {
        let forest = build("def f():\n    for i in range(2):\n        print(i)\nprint('done')");
        let json = to_json(&forest).unwrap();
        let loaded = from_json(&json).unwrap();

        assert_eq!(topology(&loaded), topology(&forest));
        assert_eq!(loaded.roots(), forest.roots());
        for (a, b) in loaded.nodes().iter().zip(forest.nodes()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.parent, b.parent);
        }
        assert_eq!(loaded.node(NodeId(2)).unwrap().indent, 8);
    }

    #[test]
    fn round_trip_preserves_aggregates() {
        let mut forest = build("x = 1\nx = 2\nprint(x)");
        optimize(&mut forest);
        let loaded = from_json(&to_json(&forest).unwrap()).unwrap();

        assert_eq!(loaded.roots().len(), 2);
        let group = loaded.node(loaded.roots()[0]).unwrap();
        assert_eq!(group.text, "group_statement");
        assert_eq!(group.subnodes.len(), 2);
        assert_eq!(loaded.leaf_count(), 3);
        assert_eq!(loaded.to_source(), forest.to_source());
    }

    #[test]
    fn subnodes_are_omitted_when_empty() {
        let json = to_json(&build("x = 1")).unwrap();
        assert!(!json.contains("subnodes"));
    }

    #[test]
    fn loads_legacy_kind_names() {
        let json = r#"[
            {"kind": "Hexagonal", "x": 0.0, "y": 0.0, "text": "for i in range(2):", "children": [1]},
            {"kind": "Tetrahedral", "x": 1.0, "y": 1.0, "text": "print(i)", "children": []}
        ]"#;
        let forest = from_json(json).unwrap();
        assert_eq!(forest.node(NodeId(0)).unwrap().kind, NodeKind::Loop);
        assert_eq!(forest.children_of(NodeId(0)), &[NodeId(1)]);
    }

    #[test]
    fn loads_editor_field_names() {
        let json = r#"[
            {"type": "Hexagonal", "x": 0.0, "y": 0.0, "value": "for i in range(2):", "connections": [1]},
            {"type": "Tetrahedral", "x": 40.0, "y": 12.5, "value": "print(i)", "connections": []}
        ]"#;
        let forest = from_json(json).unwrap();
        let header = forest.node(NodeId(0)).unwrap();
        assert_eq!(header.kind, NodeKind::Loop);
        assert_eq!(header.text, "for i in range(2):");
        assert_eq!(forest.children_of(NodeId(0)), &[NodeId(1)]);
        assert_eq!(forest.node(NodeId(1)).unwrap().text, "print(i)");

        // Saving writes the native field names.
        let saved = to_json(&forest).unwrap();
        assert!(saved.contains("\"kind\""));
        assert!(!saved.contains("\"connections\""));
        assert_eq!(from_json(&saved).unwrap().len(), 2);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let json = r#"[{"kind": "Loop", "x": 0.0, "y": 0.0, "text": "for i in x:", "children": [4]}]"#;
        assert!(matches!(
            from_json(json),
            Err(CoreError::InvalidRecordIndex { record: 0, index: 4, len: 1 })
        ));
    }

    #[test]
    fn rejects_shared_child() {
        let json = r#"[
            {"kind": "Loop", "x": 0.0, "y": 0.0, "text": "for i in x:", "children": [2]},
            {"kind": "Loop", "x": 0.0, "y": 0.0, "text": "for j in x:", "children": [2]},
            {"kind": "Statement", "x": 0.0, "y": 0.0, "text": "print(i)", "children": []}
        ]"#;
        assert!(matches!(
            from_json(json),
            Err(CoreError::DuplicateReference { .. })
        ));
    }

    #[test]
    fn rejects_cycle() {
        let json = r#"[
            {"kind": "Loop", "x": 0.0, "y": 0.0, "text": "for i in x:", "children": [1]},
            {"kind": "Loop", "x": 0.0, "y": 0.0, "text": "for j in x:", "children": [0]}
        ]"#;
        assert!(from_json(json).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(from_json("{not json"), Err(CoreError::Format(_))));
    }
}
