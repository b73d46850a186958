// SPDX-License-Identifier: MIT OR Apache-2.0
//! Preview session driven by the tokio runtime.
//!
//! The session owns a [`TraversalEngine`] and the single timer task that
//! auto-advances event nodes. Every call that mutates the log aborts the
//! running timer task and arms a new one when the engine has a pending
//! advance. The task itself only presents its ticket, which the engine
//! refuses once stale.
//!
//! All methods must be called from within a tokio runtime.

use crate::engine::{PreviewState, Result, TraversalEngine};
use crate::log::{Decision, Highlight, LogEntry};
use crate::schedule::AdvanceTicket;
use dialogue_graph::Branch;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a session publishes after every change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewSnapshot {
    /// Engine state
    pub state: PreviewState,
    /// Visited/current projection
    pub highlight: Highlight,
    /// Number of log entries
    pub log_len: usize,
    /// Engine revision the snapshot was taken at
    pub revision: u64,
}

impl PreviewSnapshot {
    fn capture(engine: &TraversalEngine) -> Self {
        Self {
            state: engine.state().clone(),
            highlight: engine.highlight().clone(),
            log_len: engine.log().len(),
            revision: engine.revision(),
        }
    }
}

struct Shared {
    engine: Mutex<TraversalEngine>,
    timer: Mutex<Option<(AdvanceTicket, JoinHandle<()>)>>,
    updates: watch::Sender<PreviewSnapshot>,
}

impl Shared {
    /// Publish the engine state and re-arm the timer.
    ///
    /// Runs under the engine lock so concurrent calls publish in revision
    /// order and arm the timer for the advance that is pending right now.
    /// Lock order is engine, then timer.
    fn sync(self: &Arc<Self>) {
        let engine = self.engine.lock();
        let mut timer = self.timer.lock();
        self.updates.send_replace(PreviewSnapshot::capture(&engine));

        let pending = engine.pending_advance().map(|p| (p.ticket, p.remaining()));
        let armed = timer.as_ref().map(|(ticket, _)| *ticket);
        if armed.is_some() && armed == pending.map(|(ticket, _)| ticket) {
            return;
        }
        if let Some((_, handle)) = timer.take() {
            handle.abort();
        }

        if let Some((ticket, delay)) = pending {
            let shared = Arc::clone(self);
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                shared.release_timer(ticket);
                let fired = shared.engine.lock().fire(ticket);
                if fired {
                    shared.sync();
                }
            });
            *timer = Some((ticket, handle));
        }
    }

    /// Forget the stored handle of the task holding `ticket`, without aborting it
    fn release_timer(&self, ticket: AdvanceTicket) {
        let mut timer = self.timer.lock();
        if timer.as_ref().is_some_and(|(armed, _)| *armed == ticket) {
            timer.take();
        }
    }
}

/// A running conversation preview
pub struct PreviewSession {
    shared: Arc<Shared>,
}

impl PreviewSession {
    /// Wrap an engine. The engine is not started.
    pub fn new(engine: TraversalEngine) -> Self {
        let (updates, _) = watch::channel(PreviewSnapshot::capture(&engine));
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                timer: Mutex::new(None),
                updates,
            }),
        }
    }

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<PreviewSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> PreviewSnapshot {
        self.shared.updates.borrow().clone()
    }

    /// Copy of the log
    pub fn log(&self) -> Vec<LogEntry> {
        self.shared.engine.lock().log().to_vec()
    }

    /// Whether an auto-advance task is armed
    pub fn has_timer(&self) -> bool {
        self.shared.timer.lock().is_some()
    }

    /// Start or restart the conversation
    pub fn start(&self) -> PreviewState {
        let state = self.shared.engine.lock().start().clone();
        self.shared.sync();
        state
    }

    /// Continue past the current statement
    pub fn advance(&self) -> Result<PreviewState> {
        self.mutate(TraversalEngine::advance)
    }

    /// Pick a choice on the current question
    pub fn select_choice(&self, index: u32) -> Result<PreviewState> {
        self.mutate(|engine| engine.select_choice(index))
    }

    /// Pick a branch on the current condition
    pub fn select_branch(&self, branch: Branch) -> Result<PreviewState> {
        self.mutate(|engine| engine.select_branch(branch))
    }

    /// Replace an earlier decision and replay from it
    pub fn rewind(&self, entry: usize, decision: Decision) -> Result<PreviewState> {
        self.mutate(|engine| engine.rewind(entry, decision))
    }

    /// Stop the preview and cancel any pending advance
    pub fn close(&self) {
        self.shared.engine.lock().close();
        self.shared.sync();
    }

    fn mutate(
        &self,
        f: impl FnOnce(&mut TraversalEngine) -> Result<&PreviewState>,
    ) -> Result<PreviewState> {
        let state = {
            let mut engine = self.shared.engine.lock();
            f(&mut *engine)?.clone()
        };
        self.shared.sync();
        Ok(state)
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.shared.timer.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogue_graph::{
        Condition, DialogueChoice, DialogueGraph, Event, GraphNode, NodeBody, Question, Statement,
    };
    use std::time::Duration;

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

    fn event(id: &str, next: &str) -> GraphNode {
        GraphNode::with_body(
            id,
            NodeBody::Event(Event {
                event_name: format!("{id}_fired"),
                next_node: next.into(),
                ..Event::default()
            }),
        )
    }

    fn question(id: &str, targets: &[&str]) -> GraphNode {
        GraphNode::with_body(
            id,
            NodeBody::Question(Question {
                text: "?".to_string(),
                choices: targets
                    .iter()
                    .enumerate()
                    .map(|(i, target)| DialogueChoice {
                        index: i as u32,
                        next_node: (*target).into(),
                        ..DialogueChoice::default()
                    })
                    .collect(),
                ..Question::default()
            }),
        )
    }

    fn session(nodes: Vec<GraphNode>) -> PreviewSession {
        PreviewSession::new(TraversalEngine::new(DialogueGraph::from_nodes(nodes)))
    }

    fn ids(session: &PreviewSession) -> Vec<String> {
        session.log().iter().map(|e| e.node_id().to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_auto_advances_after_delay() {
        let session = session(vec![event("e", "s"), statement("s", "")]);
        session.start();
        assert!(session.has_timer());

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(ids(&session), vec!["e"]);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(ids(&session), vec!["e", "s"]);
        assert!(session.snapshot().state.is_finished());
        assert!(!session.has_timer());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chained_events() {
        let session = session(vec![event("e1", "e2"), event("e2", "s"), statement("s", "")]);
        session.start();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(ids(&session), vec!["e1", "e2", "s"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewind_cancels_pending_advance() {
        let session = session(vec![
            question("q", &["e", "s2"]),
            event("e", "s1"),
            statement("s1", ""),
            statement("s2", ""),
        ]);
        session.start();
        session.select_choice(0).unwrap();
        assert_eq!(ids(&session), vec!["q", "e"]);
        assert!(session.has_timer());

        tokio::time::sleep(Duration::from_millis(500)).await;
        session.rewind(0, Decision::Choice(1)).unwrap();
        assert_eq!(ids(&session), vec!["q", "s2"]);
        assert!(!session.has_timer());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(ids(&session), vec!["q", "s2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_keeps_armed_timer() {
        let session = session(vec![event("e", "s"), statement("s", "")]);
        session.start();

        tokio::time::sleep(Duration::from_millis(600)).await;
        session.shared.sync();
        assert!(session.has_timer());

        tokio::time::sleep(Duration::from_millis(401)).await;
        assert_eq!(ids(&session), vec!["e", "s"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rewinds_publish_latest() {
        let gate = GraphNode::with_body(
            "c",
            NodeBody::Condition(Condition {
                var_name: "open".to_string(),
                next_node_true: "e".into(),
                next_node_false: "s2".into(),
                ..Condition::default()
            }),
        );
        let session = Arc::new(session(vec![
            gate,
            event("e", "s1"),
            statement("s1", ""),
            statement("s2", ""),
        ]));
        session.start();
        session.select_branch(Branch::True).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    for i in 0..200 {
                        let branch = if (i + worker) % 2 == 0 { Branch::True } else { Branch::False };
                        session.rewind(0, Decision::Branch(branch)).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.await.unwrap();
        }

        let engine = session.shared.engine.lock();
        assert_eq!(session.snapshot().revision, engine.revision());
        let armed = session.shared.timer.lock().as_ref().map(|(ticket, _)| *ticket);
        assert_eq!(armed, engine.pending_advance().map(|p| p.ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_advance() {
        let session = session(vec![event("e", "s"), statement("s", "")]);
        session.start();
        session.close();
        assert!(!session.has_timer());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(session.log().is_empty());
        assert_eq!(session.snapshot().state, PreviewState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_highlight() {
        let session = session(vec![statement("a", "b"), statement("b", "")]);
        let mut updates = session.subscribe();

        session.start();
        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert!(snapshot.highlight.is_current(&"a".into()));

        session.advance().unwrap();
        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        assert!(snapshot.highlight.is_visited(&"a".into()));
        assert!(snapshot.highlight.is_current(&"b".into()));
        assert_eq!(snapshot.log_len, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_leave_session_alone() {
        let session = session(vec![question("q", &["a"]), statement("a", "")]);
        session.start();
        let before = session.snapshot();
        assert!(session.advance().is_err());
        assert_eq!(session.snapshot(), before);
    }
}
