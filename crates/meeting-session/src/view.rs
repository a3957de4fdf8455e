//! What the UI consumer sees.
//!
//! Each coordinator mutation ends in one [`ViewUpdate`]: the full
//! [`ViewModel`], the diff from the previous page to the current one, and any
//! notices raised along the way.

use crate::capture::CapturePipelineMode;
use crate::engine::{MediaDevice, SessionStatusCode};
use crate::layout::{DiffKey, DiffOp};
use crate::tiles::{Tile, TileId};

/// Per-stream lifecycle mirrored from engine callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Connected with a degraded network.
    Poor,
    Stopped,
}

impl StreamState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StreamState::Idle => "idle",
            StreamState::Connecting => "connecting",
            StreamState::Connected => "connected",
            StreamState::Poor => "poor",
            StreamState::Stopped => "stopped",
        }
    }
}

/// A tile with its resolved display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleTile {
    pub tile: Tile,
    /// Empty when the roster has no entry for the attendee.
    pub display_name: String,
}

impl DiffKey for VisibleTile {
    type Key = TileId;

    fn diff_key(&self) -> TileId {
        self.tile.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Why the session asks the UI to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    UserRequested,
    /// The engine stopped a stream; non-OK codes are failures.
    SessionStopped(SessionStatusCode),
}

/// Snapshot of everything the meeting screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewModel {
    /// Current page, local tile first when on page 0.
    pub visible: Vec<VisibleTile>,
    /// Content share tiles, outside pagination.
    pub content: Vec<VisibleTile>,
    pub page_index: usize,
    pub can_go_prev: bool,
    pub can_go_next: bool,
    pub is_muted: bool,
    pub is_camera_on: bool,
    pub capture_mode: CapturePipelineMode,
    pub flashlight_on: bool,
    pub content_visible: bool,
    pub audio_state: StreamState,
    pub video_state: StreamState,
    pub audio_devices: Vec<MediaDevice>,
    pub active_audio_device: Option<MediaDevice>,
}

impl ViewModel {
    /// Tile ids on the current page, in display order.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<TileId> {
        self.visible.iter().map(|t| t.tile.id).collect()
    }
}

/// One emission to the UI consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    /// Strictly increasing per session.
    pub sequence: u64,
    pub model: ViewModel,
    /// Transforms the previous update's `visible` into this one's.
    pub diff: Vec<DiffOp<VisibleTile>>,
    pub notices: Vec<Notice>,
    /// Set when the UI must leave the meeting screen.
    pub leave: Option<LeaveReason>,
}
