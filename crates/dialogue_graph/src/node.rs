// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dialogue node definitions.
//!
//! A [`GraphNode`] is a closed sum over the five node types. The common
//! fields (`id`, `node_info`) live on the node itself and the type-specific
//! payload lives in [`NodeBody`], which is tagged by the `type` key when
//! serialized.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node.
///
/// The same type is used for pointer fields, where an empty id means
/// "no successor".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create an id from an existing string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random node ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The empty pointer value
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Whether this is the empty pointer value
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Position on the editor canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Presentation data. Never consulted by traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Canvas position
    #[serde(default)]
    pub position: Position,
    /// Title shown in the node header
    #[serde(default)]
    pub title: String,
    /// Shape hint for the renderer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Custom color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A line spoken by a character
    Statement,
    /// A line followed by player choices
    Question,
    /// A branch on a game variable
    Condition,
    /// A game-side event trigger
    Event,
    /// An authoring note, never traversed
    Comment,
}

impl NodeKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Statement => "Statement",
            Self::Question => "Question",
            Self::Condition => "Condition",
            Self::Event => "Event",
            Self::Comment => "Comment",
        }
    }
}

/// Which side of a condition a pointer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    /// `next_node_true`
    True,
    /// `next_node_false`
    False,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
        }
    }
}

/// One outgoing pointer slot of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outlet {
    /// `next_node` of a statement or event
    Next,
    /// One side of a condition
    Branch(Branch),
    /// A question choice, by index
    Choice(u32),
}

impl fmt::Display for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next => f.write_str("next_node"),
            Self::Branch(branch) => write!(f, "next_node_{branch}"),
            Self::Choice(index) => write!(f, "choices[{index}]"),
        }
    }
}

/// One labeled branch of a question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueChoice {
    /// Stable display/selection order
    pub index: u32,
    /// Choice label
    #[serde(default)]
    pub text: String,
    /// Successor when picked
    #[serde(default)]
    pub next_node: NodeId,
    /// Opaque text modifiers, passed through untouched
    #[serde(default)]
    pub text_modifier: Vec<Value>,
    /// Edge color in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Statement payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Speaking character
    #[serde(default)]
    pub speaker: String,
    /// Character mood
    #[serde(default)]
    pub mood: String,
    /// Spoken line
    pub text: String,
    /// Successor
    #[serde(default)]
    pub next_node: NodeId,
}

/// Question payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Speaking character
    #[serde(default)]
    pub speaker: String,
    /// Character mood
    #[serde(default)]
    pub mood: String,
    /// Spoken line
    pub text: String,
    /// Player choices
    #[serde(default)]
    pub choices: Vec<DialogueChoice>,
}

impl Question {
    /// Choices sorted by index
    pub fn sorted_choices(&self) -> Vec<&DialogueChoice> {
        let mut choices: Vec<&DialogueChoice> = self.choices.iter().collect();
        choices.sort_by_key(|c| c.index);
        choices
    }

    /// Look up a choice by its index
    pub fn choice(&self, index: u32) -> Option<&DialogueChoice> {
        self.choices.iter().find(|c| c.index == index)
    }
}

/// Condition payload. The comparison is displayed, never evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Variable being tested
    pub var_name: String,
    /// Comparison operator, as authored
    pub operator: String,
    /// Comparison operand
    #[serde(default)]
    pub value: Value,
    /// Successor when the comparison holds
    #[serde(default)]
    pub next_node_true: NodeId,
    /// Successor otherwise
    #[serde(default)]
    pub next_node_false: NodeId,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            var_name: String::new(),
            operator: "==".to_string(),
            value: Value::String(String::new()),
            next_node_true: NodeId::none(),
            next_node_false: NodeId::none(),
        }
    }
}

impl Condition {
    /// Pointer for one side of the condition
    pub fn branch(&self, branch: Branch) -> &NodeId {
        match branch {
            Branch::True => &self.next_node_true,
            Branch::False => &self.next_node_false,
        }
    }

    /// Mutable pointer for one side of the condition
    pub fn branch_mut(&mut self, branch: Branch) -> &mut NodeId {
        match branch {
            Branch::True => &mut self.next_node_true,
            Branch::False => &mut self.next_node_false,
        }
    }
}

/// Event payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the game event to raise
    pub event_name: String,
    /// Event arguments
    #[serde(default)]
    pub parameters: IndexMap<String, Value>,
    /// Successor
    #[serde(default)]
    pub next_node: NodeId,
}

/// Comment payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Note text
    #[serde(default)]
    pub text: String,
}

/// Type-specific node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeBody {
    /// See [`Statement`]
    Statement(Statement),
    /// See [`Question`]
    Question(Question),
    /// See [`Condition`]
    Condition(Condition),
    /// See [`Event`]
    Event(Event),
    /// See [`Comment`]
    Comment(Comment),
}

impl NodeBody {
    /// Default payload for a node kind
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Statement => Self::Statement(Statement::default()),
            NodeKind::Question => Self::Question(Question::default()),
            NodeKind::Condition => Self::Condition(Condition::default()),
            NodeKind::Event => Self::Event(Event::default()),
            NodeKind::Comment => Self::Comment(Comment::default()),
        }
    }

    /// The discriminant of this payload
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Statement(_) => NodeKind::Statement,
            Self::Question(_) => NodeKind::Question,
            Self::Condition(_) => NodeKind::Condition,
            Self::Event(_) => NodeKind::Event,
            Self::Comment(_) => NodeKind::Comment,
        }
    }
}

/// A node of the canonical dialogue graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique, stable id
    pub id: NodeId,
    /// Presentation data
    #[serde(default)]
    pub node_info: NodeInfo,
    /// Type-specific payload
    #[serde(flatten)]
    pub body: NodeBody,
}

impl GraphNode {
    /// Create a node of the given kind with a fresh id and default payload
    pub fn new(kind: NodeKind, position: Position) -> Self {
        Self {
            id: NodeId::generate(),
            node_info: NodeInfo {
                position,
                title: kind.name().to_string(),
                shape: None,
                color: None,
            },
            body: NodeBody::default_for(kind),
        }
    }

    /// Create a node from an explicit id and payload
    pub fn with_body(id: impl Into<NodeId>, body: NodeBody) -> Self {
        let title = body.kind().name().to_string();
        Self {
            id: id.into(),
            node_info: NodeInfo {
                title,
                ..NodeInfo::default()
            },
            body,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.node_info.position = Position::new(x, y);
        self
    }

    /// Get the node kind
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Whether this node is an authoring comment
    pub fn is_comment(&self) -> bool {
        matches!(self.body, NodeBody::Comment(_))
    }

    /// All outgoing pointers, in handle order. Empty pointers are included.
    pub fn outlets(&self) -> Vec<(Outlet, &NodeId)> {
        match &self.body {
            NodeBody::Statement(s) => vec![(Outlet::Next, &s.next_node)],
            NodeBody::Event(e) => vec![(Outlet::Next, &e.next_node)],
            NodeBody::Question(q) => q
                .choices
                .iter()
                .map(|c| (Outlet::Choice(c.index), &c.next_node))
                .collect(),
            NodeBody::Condition(c) => vec![
                (Outlet::Branch(Branch::False), &c.next_node_false),
                (Outlet::Branch(Branch::True), &c.next_node_true),
            ],
            NodeBody::Comment(_) => Vec::new(),
        }
    }

    /// Clear every outgoing pointer
    pub fn reset_pointers(&mut self) {
        match &mut self.body {
            NodeBody::Statement(s) => s.next_node = NodeId::none(),
            NodeBody::Event(e) => e.next_node = NodeId::none(),
            NodeBody::Question(q) => q.choices.clear(),
            NodeBody::Condition(c) => {
                c.next_node_true = NodeId::none();
                c.next_node_false = NodeId::none();
            }
            NodeBody::Comment(_) => {}
        }
    }
}
