// SPDX-License-Identifier: MIT OR Apache-2.0
//! Renderable flow view: positioned nodes and directed edges.
//!
//! The flow view is always derived from the canonical graph (see
//! [`crate::forward`]) or turned back into it (see [`crate::reverse`]).
//! It is never stored on its own.

use crate::node::{Branch, GraphNode, NodeId, NodeKind, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A positioned node in the flow view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderNode {
    /// Same id as the wrapped graph node
    pub id: NodeId,
    /// Node type, for picking a renderer
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Current canvas position
    pub position: Position,
    /// The complete graph node
    pub data: GraphNode,
}

impl RenderNode {
    /// Wrap a graph node
    pub fn from_graph_node(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind(),
            position: node.node_info.position,
            data: node.clone(),
        }
    }

    /// Move the node on the canvas
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Position::new(x, y);
    }
}

/// Output handle on a condition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceHandle {
    /// False branch
    Left,
    /// True branch
    Right,
}

impl SourceHandle {
    /// Handle used for a condition branch
    pub fn for_branch(branch: Branch) -> Self {
        match branch {
            Branch::False => Self::Left,
            Branch::True => Self::Right,
        }
    }

    /// Branch a handle stands for
    pub fn branch(&self) -> Branch {
        match self {
            Self::Left => Branch::False,
            Self::Right => Branch::True,
        }
    }
}

/// Question choice data carried on an edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceEdge {
    /// Proposed choice index. Validated by the allocator on the way back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    /// Opaque text modifiers of the choice
    #[serde(default)]
    pub text_modifier: Vec<Value>,
    /// Edge color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Edge payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EdgeData {
    /// Plain `next_node` edge (statement or event)
    #[default]
    Flow,
    /// Question choice edge
    Choice(ChoiceEdge),
    /// Condition branch edge
    Branch {
        /// Which pointer the edge came from
        source: Branch,
    },
}

/// A directed edge in the flow view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderEdge {
    /// Edge id, derived from source and target
    pub id: String,
    /// Source node id
    pub source: NodeId,
    /// Target node id. May be empty or dangling.
    pub target: NodeId,
    /// Output handle (condition nodes only)
    #[serde(rename = "sourceHandle", default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<SourceHandle>,
    /// Label (question choices only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Payload
    #[serde(default)]
    pub data: EdgeData,
}

impl RenderEdge {
    /// Create a plain edge, as drawn by hand in the editor
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            label: None,
            data: EdgeData::Flow,
        }
    }

    /// Set the source handle
    pub fn with_handle(mut self, handle: SourceHandle) -> Self {
        self.source_handle = Some(handle);
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the payload
    pub fn with_data(mut self, data: EdgeData) -> Self {
        self.data = data;
        self
    }

    /// Proposed choice index, if the payload carries one
    pub fn proposed_index(&self) -> Option<i64> {
        match &self.data {
            EdgeData::Choice(choice) => choice.index,
            EdgeData::Flow | EdgeData::Branch { .. } => None,
        }
    }

    /// Condition branch this edge feeds: the handle first, then the payload tag
    pub fn branch(&self) -> Option<Branch> {
        match (self.source_handle, &self.data) {
            (Some(handle), _) => Some(handle.branch()),
            (None, EdgeData::Branch { source }) => Some(*source),
            (None, _) => None,
        }
    }
}

/// A complete flow view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Positioned nodes
    pub nodes: Vec<RenderNode>,
    /// Directed edges
    pub edges: Vec<RenderEdge>,
}

impl Flow {
    /// Find a node by id
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut RenderNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// Remove an edge by id
    pub fn remove_edge(&mut self, edge_id: &str) -> Option<RenderEdge> {
        let index = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_branch_mapping() {
        assert_eq!(SourceHandle::Left.branch(), Branch::False);
        assert_eq!(SourceHandle::Right.branch(), Branch::True);
        assert_eq!(SourceHandle::for_branch(Branch::True), SourceHandle::Right);
    }

    #[test]
    fn test_edge_branch_prefers_handle() {
        let edge = RenderEdge::new("e", "c", "x")
            .with_handle(SourceHandle::Left)
            .with_data(EdgeData::Branch { source: Branch::True });
        assert_eq!(edge.branch(), Some(Branch::False));

        let edge = RenderEdge::new("e", "c", "x").with_data(EdgeData::Branch { source: Branch::True });
        assert_eq!(edge.branch(), Some(Branch::True));

        assert_eq!(RenderEdge::new("e", "c", "x").branch(), None);
    }

    #[test]
    fn test_edge_json_shape() {
        let edge = RenderEdge::new("e1", "c", "x").with_handle(SourceHandle::Right);
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["sourceHandle"], "right");
        assert_eq!(value["data"]["kind"], "flow");
        assert!(value.get("label").is_none());
    }
}
