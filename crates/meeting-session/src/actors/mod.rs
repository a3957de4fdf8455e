//! Actor model implementation for the session coordinator.
//!
//! ```text
//! MediaEngine callbacks ──┐
//!                         ├──► mailbox ──► SessionCoordinator ──► ViewUpdate channel ──► UI
//! UI commands ────────────┘                 └── owns SessionState
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single writer**: all session state lives inside one actor task
//! - **One mailbox**: callbacks and commands are admitted in arrival order
//! - **CancellationToken**: cancelling tears the session down before exit
//! - **Mailbox monitoring**: depth thresholds with metrics (100/400)
//!
//! # Modules
//!
//! - [`coordinator`] - `SessionCoordinator` actor and its handle
//! - [`messages`] - Engine events and command messages
//! - [`metrics`] - Mailbox monitoring
//! - [`state`] - Synchronous session state the actor owns

pub mod coordinator;
pub mod messages;
pub mod metrics;
pub mod state;

// Re-export primary types
pub use coordinator::{CoordinatorOptions, SessionCoordinator, SessionCoordinatorHandle};
pub use messages::*;
pub use metrics::{MailboxLevel, MailboxMonitor};
pub use state::SessionState;
