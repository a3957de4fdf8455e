//! Coordinator mailbox monitoring.
//!
//! Depth covers both queues: the unbounded engine callback queue and the
//! bounded command mailbox. It is the first sign of a stalled UI consumer or
//! an engine flooding callbacks.
//!
//! | Level    | Depth     |
//! |----------|-----------|
//! | Normal   | <= 100    |
//! | Warning  | 101-400   |
//! | Critical | > 400     |
//!
//! Depth is counted by the senders (`record_enqueue`) and the run loop
//! (`record_dequeue`), so it reflects messages actually waiting.

use crate::observability::metrics;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Depth up to which the mailbox is considered healthy.
pub const COORDINATOR_MAILBOX_NORMAL: usize = 100;

/// Depth above which the mailbox is critical.
pub const COORDINATOR_MAILBOX_WARNING: usize = 400;

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    Normal,
    Warning,
    Critical,
}

/// Tracks queue depth for one coordinator and emits metrics.
#[derive(Debug)]
pub struct MailboxMonitor {
    /// Meeting the coordinator serves, for log fields.
    meeting_id: String,
    depth: AtomicUsize,
    /// Peak mailbox depth since last reset.
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
    /// Commands refused because the mailbox was full.
    messages_rejected: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
            messages_rejected: AtomicU64::new(0),
        }
    }

    /// Record a message being added to the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        self.peak_depth.fetch_max(new_depth, Ordering::Relaxed);
        metrics::set_mailbox_depth(new_depth);

        match Self::level_for_depth(new_depth) {
            MailboxLevel::Critical => {
                warn!(
                    target: "session.actor.mailbox",
                    meeting_id = %self.meeting_id,
                    depth = new_depth,
                    threshold = COORDINATOR_MAILBOX_WARNING,
                    "Mailbox depth critical"
                );
            }
            MailboxLevel::Warning if new_depth == COORDINATOR_MAILBOX_NORMAL + 1 => {
                // Log once when crossing into the warning band
                debug!(
                    target: "session.actor.mailbox",
                    meeting_id = %self.meeting_id,
                    depth = new_depth,
                    "Mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    /// Record a message being removed from the mailbox (processed).
    pub fn record_dequeue(&self) {
        let previous = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| {
                Some(d.saturating_sub(1))
            })
            .unwrap_or(0);
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        metrics::set_mailbox_depth(previous.saturating_sub(1));
    }

    /// Undo an enqueue whose send did not go through.
    pub fn record_send_failed(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| {
                Some(d.saturating_sub(1))
            });
    }

    /// Record a command refused due to backpressure.
    pub fn record_rejected(&self) {
        let rejected = self.messages_rejected.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_command_rejected();
        warn!(
            target: "session.actor.mailbox",
            meeting_id = %self.meeting_id,
            rejected,
            "Command rejected, mailbox full"
        );
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_rejected(&self) -> u64 {
        self.messages_rejected.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        Self::level_for_depth(self.current_depth())
    }

    /// Reset peak depth counter.
    pub fn reset_peak(&self) {
        self.peak_depth
            .store(self.current_depth(), Ordering::Relaxed);
    }

    fn level_for_depth(depth: usize) -> MailboxLevel {
        if depth > COORDINATOR_MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth > COORDINATOR_MAILBOX_NORMAL {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_monitor_enqueue_dequeue() {
        let monitor = MailboxMonitor::new("meeting-123");

        assert_eq!(monitor.current_depth(), 0);

        monitor.record_enqueue();
        monitor.record_enqueue();
        monitor.record_enqueue();
        assert_eq!(monitor.current_depth(), 3);
        assert_eq!(monitor.peak_depth(), 3);

        monitor.record_dequeue();
        assert_eq!(monitor.current_depth(), 2);
        assert_eq!(monitor.peak_depth(), 3); // Peak stays at 3
        assert_eq!(monitor.messages_processed(), 1);
    }

    #[test]
    fn test_dequeue_never_underflows() {
        let monitor = MailboxMonitor::new("meeting-123");
        monitor.record_dequeue();
        monitor.record_send_failed();
        assert_eq!(monitor.current_depth(), 0);
    }

    #[test]
    fn test_mailbox_monitor_levels() {
        let monitor = MailboxMonitor::new("meeting-123");
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        for _ in 0..150 {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        for _ in 0..300 {
            monitor.record_enqueue();
        }
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_mailbox_monitor_rejected() {
        let monitor = MailboxMonitor::new("meeting-123");

        monitor.record_rejected();
        monitor.record_rejected();
        assert_eq!(monitor.messages_rejected(), 2);
    }

    #[test]
    fn test_mailbox_monitor_reset_peak() {
        let monitor = MailboxMonitor::new("meeting-123");

        for _ in 0..10 {
            monitor.record_enqueue();
        }
        for _ in 0..5 {
            monitor.record_dequeue();
        }
        assert_eq!(monitor.peak_depth(), 10);

        monitor.reset_peak();
        assert_eq!(monitor.peak_depth(), 5);
    }
}
