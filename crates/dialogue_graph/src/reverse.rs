// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow to graph reconstruction.
//!
//! The canonical graph is rebuilt from scratch on every call: pointers are
//! cleared first and then reassigned from the edge set, so a stale pointer
//! can never survive an edit.

use crate::allocator::{compact_choices, ChoiceIndexAllocator};
use crate::flow::{EdgeData, RenderEdge, RenderNode};
use crate::node::{DialogueChoice, GraphNode, NodeBody, NodeId, Outlet};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Result of a reconstruction, with the edges that did not make it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Rebuilt canonical nodes, in render node order
    pub nodes: Vec<GraphNode>,
    /// Edges that could not be applied (unknown source, comment source,
    /// condition edge without a branch)
    pub discarded_edges: Vec<String>,
    /// Edges replaced by a later edge on the same single-pointer handle
    pub overwritten_edges: Vec<String>,
}

impl Reconstruction {
    /// Whether every edge ended up as a pointer
    pub fn is_lossless(&self) -> bool {
        self.discarded_edges.is_empty() && self.overwritten_edges.is_empty()
    }
}

/// Rebuild the canonical graph from a flow view
pub fn to_graph(render_nodes: &[RenderNode], render_edges: &[RenderEdge]) -> Vec<GraphNode> {
    to_graph_detailed(render_nodes, render_edges).nodes
}

/// Rebuild the canonical graph and report edges that were dropped.
///
/// When several edges share a single-pointer handle (statement/event
/// `next_node`, or one side of a condition) the last one wins and the
/// earlier ones are reported as overwritten.
pub fn to_graph_detailed(render_nodes: &[RenderNode], render_edges: &[RenderEdge]) -> Reconstruction {
    let mut index: IndexMap<NodeId, GraphNode> = IndexMap::with_capacity(render_nodes.len());
    for render in render_nodes {
        if index.contains_key(&render.id) {
            tracing::warn!(id = %render.id, "Duplicate render node ignored");
            continue;
        }
        let mut node = render.data.clone();
        node.id = render.id.clone();
        node.node_info.position = render.position;
        node.reset_pointers();
        index.insert(node.id.clone(), node);
    }

    let mut allocator = ChoiceIndexAllocator::new();
    let mut assigned: HashMap<(NodeId, Outlet), String> = HashMap::new();
    let mut discarded_edges = Vec::new();
    let mut overwritten_edges = Vec::new();

    for edge in render_edges {
        let Some(node) = index.get_mut(&edge.source) else {
            tracing::debug!(edge = %edge.id, source = %edge.source, "Edge source not found");
            discarded_edges.push(edge.id.clone());
            continue;
        };

        let outlet = match &mut node.body {
            NodeBody::Statement(statement) => {
                statement.next_node = edge.target.clone();
                Outlet::Next
            }
            NodeBody::Event(event) => {
                event.next_node = edge.target.clone();
                Outlet::Next
            }
            NodeBody::Condition(condition) => {
                let Some(branch) = edge.branch() else {
                    tracing::debug!(edge = %edge.id, "Condition edge without a branch handle");
                    discarded_edges.push(edge.id.clone());
                    continue;
                };
                *condition.branch_mut(branch) = edge.target.clone();
                Outlet::Branch(branch)
            }
            NodeBody::Question(question) => {
                let choice_index = allocator.allocate(&edge.source, edge.proposed_index());
                question.choices.push(choice_from_edge(edge, choice_index));
                continue;
            }
            NodeBody::Comment(_) => {
                tracing::debug!(edge = %edge.id, "Edge from a comment node ignored");
                discarded_edges.push(edge.id.clone());
                continue;
            }
        };

        if let Some(previous) = assigned.insert((edge.source.clone(), outlet), edge.id.clone()) {
            tracing::warn!(
                source = %edge.source,
                outlet = %outlet,
                replaced = %previous,
                by = %edge.id,
                "Single-pointer handle has more than one edge, keeping the last"
            );
            overwritten_edges.push(previous);
        }
    }

    for node in index.values_mut() {
        if let NodeBody::Question(question) = &mut node.body {
            compact_choices(&mut question.choices);
        }
    }

    Reconstruction {
        nodes: index.into_values().collect(),
        discarded_edges,
        overwritten_edges,
    }
}

fn choice_from_edge(edge: &RenderEdge, index: u32) -> DialogueChoice {
    let (text_modifier, color) = match &edge.data {
        EdgeData::Choice(choice) => (choice.text_modifier.clone(), choice.color.clone()),
        EdgeData::Flow | EdgeData::Branch { .. } => (Vec::new(), None),
    };

    DialogueChoice {
        index,
        text: edge.label.clone().unwrap_or_default(),
        next_node: edge.target.clone(),
        text_modifier,
        color,
    }
}
