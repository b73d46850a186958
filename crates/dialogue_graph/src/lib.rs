// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dialogue graph model for the dialogue editor.
//!
//! This crate provides the canonical graph that both the editor and the
//! conversation preview read:
//! - Typed dialogue nodes (statement, question, condition, event, comment)
//! - The renderable flow view and the adapters between the two forms
//! - Stable choice index allocation for question branches
//! - Graph indexing, root discovery and validation
//! - JSON document import/export
//!
//! ## Architecture
//!
//! The canonical graph (`Vec<GraphNode>` with explicit pointers) is the only
//! source of truth. The flow view is recomputed from it with
//! [`to_renderable`] and folded back with [`to_graph`] after every edit.

pub mod node;
pub mod flow;
pub mod forward;
pub mod allocator;
pub mod reverse;
pub mod graph;
pub mod validation;
pub mod document;

pub use node::{
    Branch, Comment, Condition, DialogueChoice, Event, GraphNode, NodeBody, NodeId, NodeInfo,
    NodeKind, Outlet, Position, Question, Statement,
};
pub use flow::{ChoiceEdge, EdgeData, Flow, RenderEdge, RenderNode, SourceHandle};
pub use forward::to_renderable;
pub use allocator::{compact_choices, ChoiceIndexAllocator};
pub use reverse::{to_graph, to_graph_detailed, Reconstruction};
pub use graph::DialogueGraph;
pub use validation::{validate, Diagnostic, ValidationReport};
pub use document::{DialogueDocument, DocumentError, DocumentInfo};
