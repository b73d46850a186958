// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only index over a canonical dialogue graph.

use crate::flow::Flow;
use crate::node::{GraphNode, NodeId, Outlet};
use crate::{forward, reverse};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashSet, VecDeque};

/// A canonical dialogue graph, keyed by node id in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueGraph {
    nodes: IndexMap<NodeId, GraphNode>,
}

impl DialogueGraph {
    /// Build the index. If an id repeats, the first node with it is kept.
    pub fn from_nodes(nodes: impl IntoIterator<Item = GraphNode>) -> Self {
        let mut index = IndexMap::new();
        for node in nodes {
            if index.contains_key(&node.id) {
                tracing::warn!(id = %node.id, "Duplicate node id, keeping the first occurrence");
                continue;
            }
            index.insert(node.id.clone(), node);
        }
        Self { nodes: index }
    }

    /// Rebuild the graph from an edited flow view
    pub fn from_flow(flow: &Flow) -> Self {
        Self::from_nodes(reverse::to_graph(&flow.nodes, &flow.edges))
    }

    /// Derive the flow view
    pub fn to_flow(&self) -> Flow {
        forward::to_renderable(&self.to_nodes())
    }

    /// Get a node by ID
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Get all nodes, in input order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy the nodes out, in input order
    pub fn to_nodes(&self) -> Vec<GraphNode> {
        self.nodes.values().cloned().collect()
    }

    /// Follow a pointer.
    ///
    /// Returns `None` for the empty pointer, for an id with no node, and for
    /// comment nodes; all three mean "no successor".
    pub fn resolve(&self, id: &NodeId) -> Option<&GraphNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id).filter(|node| !node.is_comment())
    }

    /// Ids referenced by a pointer of some other node. Self-loops do not count.
    pub fn referenced_ids(&self) -> HashSet<&NodeId> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.outlets()
                    .into_iter()
                    .map(|(_, target)| target)
                    .filter(move |target| !target.is_none() && *target != &node.id)
            })
            .collect()
    }

    /// First non-comment node, in input order, that no pointer targets
    pub fn find_root(&self) -> Option<&GraphNode> {
        let referenced = self.referenced_ids();
        self.nodes
            .values()
            .find(|node| !node.is_comment() && !referenced.contains(&node.id))
    }

    /// Starting node of a playthrough.
    ///
    /// An explicit start id wins when it names a non-comment node;
    /// otherwise the root is discovered.
    pub fn start_node(&self, explicit: Option<&NodeId>) -> Option<&GraphNode> {
        explicit
            .and_then(|id| self.resolve(id))
            .or_else(|| self.find_root())
    }

    /// Outgoing pointers of a node
    pub fn successors(&self, id: &NodeId) -> Vec<(Outlet, &NodeId)> {
        self.nodes.get(id).map(GraphNode::outlets).unwrap_or_default()
    }

    /// Ids reachable from `start` by following resolvable pointers,
    /// in breadth-first order. Comments are never reached.
    pub fn reachable_from(&self, start: &NodeId) -> IndexSet<NodeId> {
        let mut seen = IndexSet::new();
        let mut queue = VecDeque::new();

        if self.resolve(start).is_some() {
            seen.insert(start.clone());
            queue.push_back(start.clone());
        }

        while let Some(id) = queue.pop_front() {
            for (_, target) in self.successors(&id) {
                if self.resolve(target).is_some() && seen.insert(target.clone()) {
                    queue.push_back(target.clone());
                }
            }
        }

        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Comment, NodeBody, Statement};

    fn statement(id: &str, next: &str) -> GraphNode {
        GraphNode::with_body(
            id,
            NodeBody::Statement(Statement {
                text: id.to_string(),
                next_node: next.into(),
                ..Statement::default()
            }),
        )
    }

    fn comment(id: &str) -> GraphNode {
        GraphNode::with_body(id, NodeBody::Comment(Comment::default()))
    }

    #[test]
    fn test_root_skips_comments() {
        let graph = DialogueGraph::from_nodes(vec![
            comment("d"),
            statement("b", "c"),
            statement("a", "b"),
            statement("c", ""),
        ]);
        assert_eq!(graph.find_root().map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_self_loop_does_not_hide_root() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "a"), statement("b", "")]);
        assert!(!graph.referenced_ids().contains(&NodeId::new("a")));
        assert_eq!(graph.find_root().map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_no_eligible_root() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "b"), statement("b", "a"), comment("c")]);
        assert!(graph.find_root().is_none());
        assert!(graph.start_node(None).is_none());
    }

    #[test]
    fn test_explicit_start_overrides() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "b"), statement("b", ""), comment("n")]);
        assert_eq!(graph.start_node(Some(&"b".into())).map(|n| n.id.as_str()), Some("b"));
        // Comments and unknown ids fall back to discovery
        assert_eq!(graph.start_node(Some(&"n".into())).map(|n| n.id.as_str()), Some("a"));
        assert_eq!(graph.start_node(Some(&"zz".into())).map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_resolve_rules() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "n"), comment("n")]);
        assert!(graph.resolve(&NodeId::none()).is_none());
        assert!(graph.resolve(&"missing".into()).is_none());
        assert!(graph.resolve(&"n".into()).is_none());
        assert!(graph.resolve(&"a".into()).is_some());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "x"), statement("a", "y")]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.successors(&"a".into())[0].1.as_str(), "x");
    }

    #[test]
    fn test_reachable_from() {
        let graph = DialogueGraph::from_nodes(vec![
            statement("a", "b"),
            statement("b", "a"),
            statement("lonely", ""),
        ]);
        let reachable = graph.reachable_from(&"a".into());
        assert_eq!(reachable.len(), 2);
        assert!(!reachable.contains(&NodeId::from("lonely")));
    }

    #[test]
    fn test_flow_round_trip() {
        let graph = DialogueGraph::from_nodes(vec![statement("a", "b"), statement("b", "")]);
        let rebuilt = DialogueGraph::from_flow(&graph.to_flow());
        assert_eq!(rebuilt, graph);
    }
}
