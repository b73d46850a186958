// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph to flow conversion.

use crate::flow::{ChoiceEdge, EdgeData, Flow, RenderEdge, RenderNode, SourceHandle};
use crate::node::{Branch, GraphNode, NodeBody, NodeId};

/// Build the flow view of a canonical graph.
///
/// Every node becomes one [`RenderNode`]. Edges are derived from the
/// pointer fields; statement and event nodes always get their edge, even
/// when `next_node` is empty, and comment nodes get none.
pub fn to_renderable(nodes: &[GraphNode]) -> Flow {
    let mut flow = Flow {
        nodes: Vec::with_capacity(nodes.len()),
        edges: Vec::new(),
    };

    for node in nodes {
        flow.nodes.push(RenderNode::from_graph_node(node));
        flow.edges.extend(edges_for(node));
    }

    flow
}

/// Edges leaving a single node
pub fn edges_for(node: &GraphNode) -> Vec<RenderEdge> {
    let id = &node.id;
    match &node.body {
        NodeBody::Statement(statement) => vec![RenderEdge::new(
            format!("statement-{id}-{}", statement.next_node),
            id.clone(),
            statement.next_node.clone(),
        )],
        NodeBody::Event(event) => vec![RenderEdge::new(
            format!("event-{id}-{}", event.next_node),
            id.clone(),
            event.next_node.clone(),
        )],
        NodeBody::Question(question) => question
            .choices
            .iter()
            .map(|choice| {
                RenderEdge::new(
                    format!("{id}-{}-{}", choice.index, choice.next_node),
                    id.clone(),
                    choice.next_node.clone(),
                )
                .with_label(choice.text.clone())
                .with_data(EdgeData::Choice(ChoiceEdge {
                    index: Some(i64::from(choice.index)),
                    text_modifier: choice.text_modifier.clone(),
                    color: choice.color.clone(),
                }))
            })
            .collect(),
        NodeBody::Condition(condition) => [Branch::False, Branch::True]
            .into_iter()
            .map(|branch| branch_edge(id, branch, condition.branch(branch)))
            .collect(),
        NodeBody::Comment(_) => Vec::new(),
    }
}

fn branch_edge(id: &NodeId, branch: Branch, target: &NodeId) -> RenderEdge {
    RenderEdge::new(format!("condition-{id}-{branch}-{target}"), id.clone(), target.clone())
        .with_handle(SourceHandle::for_branch(branch))
        .with_data(EdgeData::Branch { source: branch })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Comment, Condition, DialogueChoice, Question, Statement};

    fn statement(id: &str, next: &str) -> GraphNode {
        GraphNode::with_body(
            id,
            NodeBody::Statement(Statement {
                text: format!("line {id}"),
                next_node: next.into(),
                ..Statement::default()
            }),
        )
    }

    #[test]
    fn test_statement_edge_even_when_empty() {
        let flow = to_renderable(&[statement("a", "")]);
        assert_eq!(flow.nodes.len(), 1);
        assert_eq!(flow.edges.len(), 1);
        assert_eq!(flow.edges[0].id, "statement-a-");
        assert!(flow.edges[0].target.is_none());
    }

    #[test]
    fn test_question_edges_carry_choice() {
        let question = GraphNode::with_body(
            "q",
            NodeBody::Question(Question {
                text: "Pick".to_string(),
                choices: vec![
                    DialogueChoice {
                        index: 0,
                        text: "Left".to_string(),
                        next_node: "b".into(),
                        text_modifier: vec![serde_json::json!({"bold": true})],
                        color: Some("#ff0000".to_string()),
                    },
                    DialogueChoice {
                        index: 1,
                        text: "Right".to_string(),
                        next_node: "c".into(),
                        ..DialogueChoice::default()
                    },
                ],
                ..Question::default()
            }),
        );

        let flow = to_renderable(&[question]);
        assert_eq!(flow.edges.len(), 2);
        assert_eq!(flow.edges[0].label.as_deref(), Some("Left"));
        assert_eq!(flow.edges[0].proposed_index(), Some(0));
        match &flow.edges[0].data {
            EdgeData::Choice(choice) => {
                assert_eq!(choice.text_modifier.len(), 1);
                assert_eq!(choice.color.as_deref(), Some("#ff0000"));
            }
            other => panic!("expected choice data, got {other:?}"),
        }
        assert_eq!(flow.edges[1].target, NodeId::from("c"));
    }

    #[test]
    fn test_condition_has_two_handles() {
        let condition = GraphNode::with_body(
            "c",
            NodeBody::Condition(Condition {
                var_name: "gold".to_string(),
                next_node_true: "yes".into(),
                next_node_false: "no".into(),
                ..Condition::default()
            }),
        );

        let flow = to_renderable(&[condition]);
        assert_eq!(flow.edges.len(), 2);
        let left = &flow.edges[0];
        assert_eq!(left.source_handle, Some(SourceHandle::Left));
        assert_eq!(left.target, NodeId::from("no"));
        assert_eq!(left.data, EdgeData::Branch { source: Branch::False });
        let right = &flow.edges[1];
        assert_eq!(right.source_handle, Some(SourceHandle::Right));
        assert_eq!(right.target, NodeId::from("yes"));
    }

    #[test]
    fn test_comment_has_no_edges() {
        let comment = GraphNode::with_body("n", NodeBody::Comment(Comment::default()));
        let flow = to_renderable(&[comment]);
        assert_eq!(flow.nodes.len(), 1);
        assert!(flow.edges.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let nodes = vec![statement("a", "b"), statement("b", "")];
        assert_eq!(to_renderable(&nodes), to_renderable(&nodes));
    }
}
