// SPDX-License-Identifier: MIT OR Apache-2.0
//! Non-fatal diagnostics for authored graphs.
//!
//! Nothing reported here stops a playthrough. Dangling pointers and comment
//! targets simply end the conversation; the report tells the author where.

use crate::allocator::is_compact;
use crate::graph::DialogueGraph;
use crate::node::{NodeBody, NodeId, Outlet};
use std::fmt;

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Pointer to an id that is not in the graph
    DanglingPointer {
        /// Node holding the pointer
        node: NodeId,
        /// Pointer slot
        outlet: Outlet,
        /// Missing id
        target: NodeId,
    },
    /// Pointer to a comment node
    CommentTarget {
        /// Node holding the pointer
        node: NodeId,
        /// Pointer slot
        outlet: Outlet,
        /// Comment id
        target: NodeId,
    },
    /// Question whose choice indices are not `0..n-1` ascending
    UnorderedChoices {
        /// Question id
        node: NodeId,
        /// Indices as stored
        indices: Vec<u32>,
    },
    /// Question without choices
    NoChoices {
        /// Question id
        node: NodeId,
    },
    /// Non-comment node the root never reaches
    Unreachable {
        /// Node id
        node: NodeId,
    },
    /// Every non-comment node is referenced by another node
    NoRoot,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingPointer { node, outlet, target } => {
                write!(f, "{node}: {outlet} points to missing node '{target}'")
            }
            Self::CommentTarget { node, outlet, target } => {
                write!(f, "{node}: {outlet} points to comment '{target}'")
            }
            Self::UnorderedChoices { node, indices } => {
                write!(f, "{node}: choice indices {indices:?} are not contiguous from 0")
            }
            Self::NoChoices { node } => write!(f, "{node}: question has no choices"),
            Self::Unreachable { node } => write!(f, "{node}: unreachable from the root"),
            Self::NoRoot => f.write_str("no root: every node is the target of another node"),
        }
    }
}

/// All findings for a graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Findings, in node order
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Whether nothing was found
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of findings
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// Check a graph for authoring mistakes
pub fn validate(graph: &DialogueGraph) -> ValidationReport {
    let mut diagnostics = Vec::new();

    for node in graph.nodes() {
        for (outlet, target) in node.outlets() {
            if target.is_none() {
                continue;
            }
            match graph.node(target) {
                None => diagnostics.push(Diagnostic::DanglingPointer {
                    node: node.id.clone(),
                    outlet,
                    target: target.clone(),
                }),
                Some(found) if found.is_comment() => diagnostics.push(Diagnostic::CommentTarget {
                    node: node.id.clone(),
                    outlet,
                    target: target.clone(),
                }),
                Some(_) => {}
            }
        }

        if let NodeBody::Question(question) = &node.body {
            if question.choices.is_empty() {
                diagnostics.push(Diagnostic::NoChoices { node: node.id.clone() });
            } else if !is_compact(&question.choices) {
                diagnostics.push(Diagnostic::UnorderedChoices {
                    node: node.id.clone(),
                    indices: question.choices.iter().map(|c| c.index).collect(),
                });
            }
        }
    }

    match graph.find_root() {
        Some(root) => {
            let reachable = graph.reachable_from(&root.id);
            for node in graph.nodes() {
                if !node.is_comment() && !reachable.contains(&node.id) {
                    diagnostics.push(Diagnostic::Unreachable { node: node.id.clone() });
                }
            }
        }
        None if graph.nodes().any(|n| !n.is_comment()) => diagnostics.push(Diagnostic::NoRoot),
        None => {}
    }

    ValidationReport { diagnostics }
}
