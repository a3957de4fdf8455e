//! Observability for the meeting session.
//!
//! Tracing targets:
//!
//! | Target | Emitted by |
//! |--------|------------|
//! | `session.actor.coordinator` | coordinator run loop and mutations |
//! | `session.actor.mailbox` | mailbox depth monitoring |
//! | `session.capture` | capture pipeline selection |
//! | `session.tiles` | tile registry |
//! | `session.api` | join/leave HTTP client |
//! | `session.context` | join/leave orchestration |
//!
//! Attendee names and join tokens are never logged; spans use
//! `#[instrument(skip_all)]` with explicit fields.

pub mod metrics;

pub use metrics::{
    init_metrics_recorder, record_api_request, record_capture_rejection, record_command,
    record_command_rejected, record_event, record_view_update, set_mailbox_depth,
    set_visible_tiles,
};
