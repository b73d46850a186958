// SPDX-License-Identifier: MIT OR Apache-2.0
//! Traversal log entries and the highlight projection.

use dialogue_graph::{Branch, DialogueChoice, GraphNode, NodeBody, NodeId, NodeKind};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

/// A decision recorded on a question or condition entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Question choice, by index
    Choice(u32),
    /// Condition branch picked by the operator
    Branch(Branch),
}

/// One visited node, with what was shown and what was decided
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogEntry {
    /// A spoken line
    Statement {
        /// Visited node
        node_id: NodeId,
        /// Speaking character
        speaker: String,
        /// Character mood
        mood: String,
        /// Spoken line
        text: String,
    },
    /// A spoken line with choices
    Question {
        /// Visited node
        node_id: NodeId,
        /// Speaking character
        speaker: String,
        /// Character mood
        mood: String,
        /// Spoken line
        text: String,
        /// Choices, sorted by index
        choices: Vec<DialogueChoice>,
        /// Picked choice index
        selected_index: Option<u32>,
    },
    /// A comparison waiting for the operator to pick a side
    Condition {
        /// Visited node
        node_id: NodeId,
        /// Variable being tested
        var_name: String,
        /// Comparison operator
        operator: String,
        /// Comparison operand
        value: Value,
        /// Picked branch
        selected_branch: Option<Branch>,
    },
    /// A raised game event
    Event {
        /// Visited node
        node_id: NodeId,
        /// Event name
        event_name: String,
        /// Event arguments
        parameters: IndexMap<String, Value>,
    },
}

impl LogEntry {
    /// Build the entry shown for a node. Comments are never shown.
    pub fn from_node(node: &GraphNode) -> Option<Self> {
        let node_id = node.id.clone();
        let entry = match &node.body {
            NodeBody::Statement(s) => Self::Statement {
                node_id,
                speaker: s.speaker.clone(),
                mood: s.mood.clone(),
                text: s.text.clone(),
            },
            NodeBody::Question(q) => Self::Question {
                node_id,
                speaker: q.speaker.clone(),
                mood: q.mood.clone(),
                text: q.text.clone(),
                choices: q.sorted_choices().into_iter().cloned().collect(),
                selected_index: None,
            },
            NodeBody::Condition(c) => Self::Condition {
                node_id,
                var_name: c.var_name.clone(),
                operator: c.operator.clone(),
                value: c.value.clone(),
                selected_branch: None,
            },
            NodeBody::Event(e) => Self::Event {
                node_id,
                event_name: e.event_name.clone(),
                parameters: e.parameters.clone(),
            },
            NodeBody::Comment(_) => return None,
        };
        Some(entry)
    }

    /// Id of the visited node
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Statement { node_id, .. }
            | Self::Question { node_id, .. }
            | Self::Condition { node_id, .. }
            | Self::Event { node_id, .. } => node_id,
        }
    }

    /// Kind of the visited node
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Statement { .. } => NodeKind::Statement,
            Self::Question { .. } => NodeKind::Question,
            Self::Condition { .. } => NodeKind::Condition,
            Self::Event { .. } => NodeKind::Event,
        }
    }

    /// Whether the entry takes a decision
    pub fn is_decision_point(&self) -> bool {
        matches!(self, Self::Question { .. } | Self::Condition { .. })
    }

    /// The recorded decision, if any
    pub fn decision(&self) -> Option<Decision> {
        match self {
            Self::Question { selected_index, .. } => selected_index.map(Decision::Choice),
            Self::Condition { selected_branch, .. } => selected_branch.map(Decision::Branch),
            Self::Statement { .. } | Self::Event { .. } => None,
        }
    }

    /// Whether `decision` is the right shape for this entry
    pub fn accepts(&self, decision: Decision) -> bool {
        matches!(
            (self, decision),
            (Self::Question { .. }, Decision::Choice(_)) | (Self::Condition { .. }, Decision::Branch(_))
        )
    }

    /// Record a decision. Returns `false` if the shape does not fit.
    pub fn record(&mut self, decision: Decision) -> bool {
        match (self, decision) {
            (Self::Question { selected_index, .. }, Decision::Choice(index)) => {
                *selected_index = Some(index);
                true
            }
            (Self::Condition { selected_branch, .. }, Decision::Branch(branch)) => {
                *selected_branch = Some(branch);
                true
            }
            _ => false,
        }
    }
}

/// Visited/current node ids for highlighting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Highlight {
    /// Ids of every entry but the last
    pub visited: IndexSet<NodeId>,
    /// Id of the last entry
    pub current: Option<NodeId>,
}

impl Highlight {
    /// Project a log
    pub fn from_log(log: &[LogEntry]) -> Self {
        match log.split_last() {
            Some((last, earlier)) => Self {
                visited: earlier.iter().map(|e| e.node_id().clone()).collect(),
                current: Some(last.node_id().clone()),
            },
            None => Self::default(),
        }
    }

    /// Whether a node should be drawn as visited
    pub fn is_visited(&self, id: &NodeId) -> bool {
        self.visited.contains(id)
    }

    /// Whether a node should be drawn as current
    pub fn is_current(&self, id: &NodeId) -> bool {
        self.current.as_ref() == Some(id)
    }
}
