//! Meeting session error types.
//!
//! Capability conflicts and engine failures are recovered locally and shown as
//! notices; only mailbox and HTTP failures reach callers as `Err`. Internal
//! details are logged but never put into user-facing text.

use crate::capture::CaptureConflict;

use thiserror::Error;

/// Meeting session error type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The coordinator task is gone.
    #[error("Session coordinator is not running")]
    ChannelClosed,

    /// The command mailbox is full; the command was not queued.
    #[error("Session coordinator mailbox is full")]
    MailboxFull,

    /// A capture request conflicted with the current pipeline.
    #[error("Capture conflict: {0}")]
    CaptureConflict(#[from] CaptureConflict),

    /// The session already left the meeting.
    #[error("Session already left the meeting")]
    AlreadyLeft,

    /// Join/leave HTTP exchange failed.
    #[error("Meeting API error: {0}")]
    Api(#[from] ApiError),

    /// The media engine refused to start the session.
    #[error("Media engine failed to start")]
    EngineStartFailed,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from the join/leave HTTP service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or TLS failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Any non-200 response.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not the expected JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl SessionError {
    /// Whether the session cannot continue after this error.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            SessionError::ChannelClosed
            | SessionError::AlreadyLeft
            | SessionError::Api(_)
            | SessionError::EngineStartFailed
            | SessionError::Config(_) => true,
            SessionError::MailboxFull
            | SessionError::CaptureConflict(_)
            | SessionError::Internal(_) => false,
        }
    }

    /// Returns a user-safe message (no internal details).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SessionError::ChannelClosed | SessionError::Internal(_) | SessionError::Config(_) => {
                "An internal error occurred".to_string()
            }
            SessionError::MailboxFull => "The meeting is busy, please try again".to_string(),
            SessionError::CaptureConflict(conflict) => conflict.to_string(),
            SessionError::AlreadyLeft => "You have left the meeting".to_string(),
            SessionError::Api(_) | SessionError::EngineStartFailed => {
                "There was an error starting the meeting".to_string()
            }
        }
    }
}
