// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conversation preview for the dialogue editor.
//!
//! This crate simulates a playthrough of a dialogue graph:
//! - Root discovery and explicit start nodes
//! - Statements, questions, hand-picked condition branches
//! - Event nodes that advance on their own after a delay
//! - Rewinding a past decision to explore another branch
//! - Visited/current highlight sets for the graph view
//!
//! ## Architecture
//!
//! [`TraversalEngine`] is a synchronous state machine that never mutates the
//! graph it plays. The event auto-advance is an explicit schedule/cancel
//! pair ([`AdvanceScheduler`]) that can be driven by frame updates or by
//! [`PreviewSession`], which runs it as a cancellable tokio task.

pub mod log;
pub mod schedule;
pub mod settings;
pub mod engine;
pub mod session;

pub use log::{Decision, Highlight, LogEntry};
pub use schedule::{AdvanceScheduler, AdvanceTicket, ScheduledAdvance, DEFAULT_AUTO_ADVANCE};
pub use settings::{PreviewSettings, SettingsError};
pub use engine::{PreviewError, PreviewState, TraversalEngine};
pub use session::{PreviewSession, PreviewSnapshot};
