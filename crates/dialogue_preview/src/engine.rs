// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversation traversal engine.
//!
//! The engine walks a canonical graph one node at a time and keeps a log of
//! everything shown and decided. It handles:
//! - Root discovery or an explicit start node
//! - Per-type advancement (continue, choice, branch, timed event)
//! - Rewinding a past decision and replaying from there
//! - The visited/current projection used for highlighting
//!
//! Graph anomalies never raise errors: an empty, dangling or comment
//! successor ends the conversation. [`PreviewError`] is only returned for
//! input that does not fit the current state.

use crate::log::{Decision, Highlight, LogEntry};
use crate::schedule::{AdvanceScheduler, AdvanceTicket, ScheduledAdvance, DEFAULT_AUTO_ADVANCE};
use crate::settings::PreviewSettings;
use dialogue_graph::{Branch, DialogueGraph, GraphNode, NodeBody, NodeId, NodeKind};
use std::time::Duration;
use thiserror::Error;

/// Preview errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// The engine has not been started
    #[error("Preview has not been started")]
    NotStarted,

    /// The conversation is over
    #[error("Conversation has finished")]
    Finished,

    /// The current node takes a different kind of input
    #[error("Node {node} is a {kind:?} node and cannot {input}")]
    UnexpectedInput {
        /// Current node
        node: NodeId,
        /// Its kind
        kind: NodeKind,
        /// What was attempted
        input: &'static str,
    },

    /// No choice with that index
    #[error("Question {node} has no choice with index {index}")]
    UnknownChoice {
        /// Question node
        node: NodeId,
        /// Requested index
        index: u32,
    },

    /// Log position past the end
    #[error("Log entry {index} does not exist (log has {len} entries)")]
    EntryOutOfRange {
        /// Requested position
        index: usize,
        /// Log length
        len: usize,
    },

    /// Log entry is not a question or condition, or the decision has the
    /// wrong shape for it
    #[error("Log entry {0} does not take that decision")]
    NotADecisionPoint(usize),
}

/// Result type for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;

/// Traversal state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    /// Not started, or closed
    #[default]
    Idle,
    /// A node is shown and waits for its input
    Presenting(NodeId),
    /// The conversation is over
    Finished,
}

impl PreviewState {
    /// Check if the conversation is over
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// State machine over a canonical dialogue graph
#[derive(Debug)]
pub struct TraversalEngine {
    graph: DialogueGraph,
    start_node: Option<NodeId>,
    auto_advance_delay: Duration,
    state: PreviewState,
    log: Vec<LogEntry>,
    highlight: Highlight,
    scheduler: AdvanceScheduler,
    revision: u64,
}

impl TraversalEngine {
    /// Create an idle engine over a graph
    pub fn new(graph: DialogueGraph) -> Self {
        Self {
            graph,
            start_node: None,
            auto_advance_delay: DEFAULT_AUTO_ADVANCE,
            state: PreviewState::Idle,
            log: Vec::new(),
            highlight: Highlight::default(),
            scheduler: AdvanceScheduler::new(),
            revision: 0,
        }
    }

    /// Create an idle engine configured from settings
    pub fn with_settings(graph: DialogueGraph, settings: &PreviewSettings) -> Self {
        let mut engine = Self::new(graph).with_auto_advance_delay(settings.auto_advance_delay());
        engine.start_node = settings.start_node.clone();
        engine
    }

    /// Start from an explicit node instead of the discovered root
    pub fn with_start_node(mut self, id: impl Into<NodeId>) -> Self {
        self.start_node = Some(id.into());
        self
    }

    /// Set the event auto-advance delay
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    /// The graph being played
    pub fn graph(&self) -> &DialogueGraph {
        &self.graph
    }

    /// Current state
    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// The traversal log
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Last log entry
    pub fn current_entry(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    /// Visited/current projection of the log
    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    /// Pending event auto-advance
    pub fn pending_advance(&self) -> Option<&ScheduledAdvance> {
        self.scheduler.pending()
    }

    /// Counter bumped by every log mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Begin (or restart) the conversation.
    ///
    /// Starts in [`PreviewState::Finished`] with an empty log when the graph
    /// has no eligible start node.
    pub fn start(&mut self) -> &PreviewState {
        self.scheduler.cancel();
        self.log.clear();

        let start = self
            .graph
            .start_node(self.start_node.as_ref())
            .map(|node| node.id.clone());

        match start {
            Some(id) => {
                tracing::info!(start = %id, "Conversation preview started");
                self.present(&id);
            }
            None => {
                tracing::info!("No eligible start node, conversation preview is empty");
                self.state = PreviewState::Finished;
                self.touch();
            }
        }
        &self.state
    }

    /// Tear the preview down, dropping the log and any pending advance
    pub fn close(&mut self) {
        self.scheduler.cancel();
        self.log.clear();
        self.state = PreviewState::Idle;
        self.touch();
        tracing::info!("Conversation preview closed");
    }

    /// Continue past the current statement
    pub fn advance(&mut self) -> Result<&PreviewState> {
        let node = self.current_node()?;
        let next = match &node.body {
            NodeBody::Statement(statement) => statement.next_node.clone(),
            _ => return Err(unexpected(node, "continue")),
        };
        self.go_to(&next);
        Ok(&self.state)
    }

    /// Pick a choice on the current question
    pub fn select_choice(&mut self, index: u32) -> Result<&PreviewState> {
        let node = self.current_node()?;
        if node.kind() != NodeKind::Question {
            return Err(unexpected(node, "pick a choice"));
        }
        self.decide(self.log.len() - 1, Decision::Choice(index))
    }

    /// Pick a branch on the current condition
    pub fn select_branch(&mut self, branch: Branch) -> Result<&PreviewState> {
        let node = self.current_node()?;
        if node.kind() != NodeKind::Condition {
            return Err(unexpected(node, "pick a branch"));
        }
        self.decide(self.log.len() - 1, Decision::Branch(branch))
    }

    /// Replace the decision of an earlier question or condition entry.
    ///
    /// The log is cut back to that entry, the new decision is recorded and
    /// traversal continues from its successor. Picking the decision that is
    /// already recorded changes nothing.
    pub fn rewind(&mut self, entry: usize, decision: Decision) -> Result<&PreviewState> {
        if self.state == PreviewState::Idle {
            return Err(PreviewError::NotStarted);
        }
        let len = self.log.len();
        let Some(logged) = self.log.get(entry) else {
            return Err(PreviewError::EntryOutOfRange { index: entry, len });
        };
        if !logged.accepts(decision) {
            return Err(PreviewError::NotADecisionPoint(entry));
        }
        if logged.decision() == Some(decision) {
            return Ok(&self.state);
        }
        self.decide(entry, decision)
    }

    /// Fire a scheduled auto-advance.
    ///
    /// Returns `false` and leaves the log alone when the ticket is stale,
    /// that is when the log changed after it was scheduled.
    pub fn fire(&mut self, ticket: AdvanceTicket) -> bool {
        let Some(advance) = self.scheduler.take_if_current(ticket) else {
            tracing::debug!(ticket = ticket.value(), "Ignored stale auto-advance");
            return false;
        };

        let next = match self.graph.node(&advance.node_id).map(|node| &node.body) {
            Some(NodeBody::Event(event)) => event.next_node.clone(),
            _ => NodeId::none(),
        };
        tracing::debug!(node = %advance.node_id, next = %next, "Auto-advancing event");
        self.go_to(&next);
        true
    }

    /// Advance frame time. Fires the pending auto-advance once it is due.
    pub fn update(&mut self, delta: Duration) -> bool {
        match self.scheduler.tick(delta) {
            Some(ticket) => self.fire(ticket),
            None => false,
        }
    }

    fn current_node(&self) -> Result<&GraphNode> {
        let id = match &self.state {
            PreviewState::Presenting(id) => id,
            PreviewState::Idle => return Err(PreviewError::NotStarted),
            PreviewState::Finished => return Err(PreviewError::Finished),
        };
        self.graph.node(id).ok_or(PreviewError::Finished)
    }

    /// Record `decision` on log entry `entry` and continue from its successor
    fn decide(&mut self, entry: usize, decision: Decision) -> Result<&PreviewState> {
        let node_id = self.log[entry].node_id().clone();
        let next = self.successor(entry, &node_id, decision)?;

        let rewound = entry + 1 < self.log.len() || self.log[entry].decision().is_some();
        if rewound {
            tracing::info!(entry, node = %node_id, ?decision, "Rewound conversation");
        }

        self.scheduler.cancel();
        self.log.truncate(entry + 1);
        self.log[entry].record(decision);
        self.state = PreviewState::Presenting(node_id);
        self.touch();

        self.go_to(&next);
        Ok(&self.state)
    }

    fn successor(&self, entry: usize, node_id: &NodeId, decision: Decision) -> Result<NodeId> {
        let node = self.graph.node(node_id);
        match (node.map(|n| &n.body), decision) {
            (Some(NodeBody::Question(question)), Decision::Choice(index)) => question
                .choice(index)
                .map(|choice| choice.next_node.clone())
                .ok_or_else(|| PreviewError::UnknownChoice {
                    node: node_id.clone(),
                    index,
                }),
            (Some(NodeBody::Condition(condition)), Decision::Branch(branch)) => {
                Ok(condition.branch(branch).clone())
            }
            _ => Err(PreviewError::NotADecisionPoint(entry)),
        }
    }

    /// Follow a pointer, finishing when it does not resolve
    fn go_to(&mut self, target: &NodeId) {
        match self.graph.resolve(target).map(|node| node.id.clone()) {
            Some(id) => self.present(&id),
            None => self.finish(target),
        }
    }

    fn finish(&mut self, target: &NodeId) {
        self.scheduler.cancel();
        self.state = PreviewState::Finished;
        self.touch();
        if target.is_none() {
            tracing::info!(entries = self.log.len(), "Conversation finished");
        } else {
            tracing::info!(
                entries = self.log.len(),
                target = %target,
                "Conversation finished at an unresolved successor"
            );
        }
    }

    /// Show a node that is known to resolve
    fn present(&mut self, id: &NodeId) {
        self.scheduler.cancel();

        // A node without a usable successor ends the conversation once shown.
        let prepared = self.graph.node(id).and_then(|node| {
            let entry = LogEntry::from_node(node)?;
            let waiting = match &node.body {
                NodeBody::Statement(statement) => self.graph.resolve(&statement.next_node).is_some(),
                NodeBody::Event(event) => self.graph.resolve(&event.next_node).is_some(),
                NodeBody::Question(question) => !question.choices.is_empty(),
                NodeBody::Condition(_) => true,
                NodeBody::Comment(_) => false,
            };
            Some((entry, waiting))
        });
        let Some((entry, waiting)) = prepared else {
            self.finish(id);
            return;
        };

        let kind = entry.kind();
        tracing::debug!(node = %id, ?kind, "Presenting node");
        self.log.push(entry);

        if waiting {
            self.state = PreviewState::Presenting(id.clone());
            if kind == NodeKind::Event {
                self.scheduler.schedule(id.clone(), self.auto_advance_delay);
            }
        } else {
            self.state = PreviewState::Finished;
            tracing::info!(entries = self.log.len(), "Conversation finished");
        }
        self.touch();
    }

    /// Recompute derived state after a log mutation
    fn touch(&mut self) {
        self.revision += 1;
        self.highlight = Highlight::from_log(&self.log);
    }
}

fn unexpected(node: &GraphNode, input: &'static str) -> PreviewError {
    PreviewError::UnexpectedInput {
        node: node.id.clone(),
        kind: node.kind(),
        input,
    }
}
