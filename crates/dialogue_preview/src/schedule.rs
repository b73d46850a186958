// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cancellable auto-advance for event nodes.
//!
//! At most one advance is pending. Scheduling a new one or cancelling
//! retires the old ticket, and a retired ticket never fires.

use dialogue_graph::NodeId;
use std::time::Duration;

/// Default delay before an event node advances on its own
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_millis(1000);

/// Identifies one scheduled advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdvanceTicket(u64);

impl AdvanceTicket {
    /// Get the raw ticket value
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// A pending auto-advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAdvance {
    /// Ticket to present when firing
    pub ticket: AdvanceTicket,
    /// Event node the advance leaves
    pub node_id: NodeId,
    /// Delay from scheduling to firing
    pub delay: Duration,
    /// Time accumulated by frame updates
    elapsed: Duration,
}

impl ScheduledAdvance {
    /// Time left before the advance is due
    pub fn remaining(&self) -> Duration {
        self.delay.saturating_sub(self.elapsed)
    }

    /// Whether the delay has passed
    pub fn is_due(&self) -> bool {
        self.elapsed >= self.delay
    }
}

/// Owner of the single pending advance
#[derive(Debug, Default)]
pub struct AdvanceScheduler {
    next_ticket: u64,
    pending: Option<ScheduledAdvance>,
}

impl AdvanceScheduler {
    /// Create a scheduler with nothing pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an advance, replacing any pending one
    pub fn schedule(&mut self, node_id: NodeId, delay: Duration) -> &ScheduledAdvance {
        if let Some(old) = self.pending.take() {
            tracing::debug!(ticket = old.ticket.value(), "Replaced pending auto-advance");
        }
        self.next_ticket += 1;
        self.pending.insert(ScheduledAdvance {
            ticket: AdvanceTicket(self.next_ticket),
            node_id,
            delay,
            elapsed: Duration::ZERO,
        })
    }

    /// Cancel the pending advance
    pub fn cancel(&mut self) -> Option<ScheduledAdvance> {
        let cancelled = self.pending.take();
        if let Some(advance) = &cancelled {
            tracing::debug!(
                ticket = advance.ticket.value(),
                node = %advance.node_id,
                "Cancelled auto-advance"
            );
        }
        cancelled
    }

    /// The pending advance
    pub fn pending(&self) -> Option<&ScheduledAdvance> {
        self.pending.as_ref()
    }

    /// Whether `ticket` is the pending one
    pub fn is_current(&self, ticket: AdvanceTicket) -> bool {
        self.pending.as_ref().is_some_and(|p| p.ticket == ticket)
    }

    /// Remove and return the pending advance if `ticket` matches it
    pub fn take_if_current(&mut self, ticket: AdvanceTicket) -> Option<ScheduledAdvance> {
        if self.is_current(ticket) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Accumulate frame time. Returns the ticket once it is due.
    pub fn tick(&mut self, delta: Duration) -> Option<AdvanceTicket> {
        let pending = self.pending.as_mut()?;
        pending.elapsed = pending.elapsed.saturating_add(delta);
        pending.is_due().then_some(pending.ticket)
    }
}
