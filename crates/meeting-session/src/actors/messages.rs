//! Message types for the session coordinator.
//!
//! Engine callbacks and user commands share one mailbox so they are admitted
//! in arrival order. Commands carry a `oneshot` reply channel.

use crate::capture::CapturePipelineMode;
use crate::engine::{MediaDevice, SessionStatusCode};
use crate::errors::SessionError;
use crate::tiles::{RosterEntry, TileId, TileState};
use crate::view::ViewModel;

use tokio::sync::oneshot;

/// Engine callback, one variant per observer method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TileAdded(TileState),
    TileRemoved(TileState),
    TilePaused(TileState),
    TileResumed(TileState),
    TileSizeChanged(TileState),

    /// Attendee ids currently talking, refreshed on a fixed interval.
    ActiveSpeakersDetected(Vec<String>),

    /// Attendees joined or changed their names.
    RosterChanged(Vec<RosterEntry>),

    AudioDeviceChanged(Vec<MediaDevice>),

    AudioSessionStartedConnecting { reconnecting: bool },
    AudioSessionStarted { reconnecting: bool },
    AudioSessionDropped,
    AudioSessionCancelledReconnect,
    AudioSessionStopped(SessionStatusCode),
    ConnectionBecamePoor,
    ConnectionRecovered,

    VideoSessionStartedConnecting,
    VideoSessionStarted(SessionStatusCode),
    VideoSessionStopped(SessionStatusCode),
}

impl SessionEvent {
    /// Event name for log fields and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::TileAdded(_) => "tile_added",
            SessionEvent::TileRemoved(_) => "tile_removed",
            SessionEvent::TilePaused(_) => "tile_paused",
            SessionEvent::TileResumed(_) => "tile_resumed",
            SessionEvent::TileSizeChanged(_) => "tile_size_changed",
            SessionEvent::ActiveSpeakersDetected(_) => "active_speakers_detected",
            SessionEvent::RosterChanged(_) => "roster_changed",
            SessionEvent::AudioDeviceChanged(_) => "audio_device_changed",
            SessionEvent::AudioSessionStartedConnecting { .. } => "audio_session_started_connecting",
            SessionEvent::AudioSessionStarted { .. } => "audio_session_started",
            SessionEvent::AudioSessionDropped => "audio_session_dropped",
            SessionEvent::AudioSessionCancelledReconnect => "audio_session_cancelled_reconnect",
            SessionEvent::AudioSessionStopped(_) => "audio_session_stopped",
            SessionEvent::ConnectionBecamePoor => "connection_became_poor",
            SessionEvent::ConnectionRecovered => "connection_recovered",
            SessionEvent::VideoSessionStartedConnecting => "video_session_started_connecting",
            SessionEvent::VideoSessionStarted(_) => "video_session_started",
            SessionEvent::VideoSessionStopped(_) => "video_session_stopped",
        }
    }
}

/// Commands sent to `SessionCoordinator`.
///
/// Engine callbacks travel on a separate channel as plain [`SessionEvent`]s.
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// Flip the local microphone. Replies with the new muted flag.
    ToggleMute {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// Flip local video. Replies with the new camera flag.
    ToggleCamera {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// Replies with whether the page index moved.
    NextPage {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// Replies with whether the page index moved.
    PrevPage {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    SelectCaptureMode {
        mode: CapturePipelineMode,
        respond_to: oneshot::Sender<Result<CapturePipelineMode, SessionError>>,
    },

    /// Replies with the torch state after the attempt.
    ToggleFlashlight {
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// Replies with whether the tile is known.
    PauseRemoteTile {
        tile_id: TileId,
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// Replies with whether the tile was user-paused.
    ResumeRemoteTile {
        tile_id: TileId,
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    SetContentVisible {
        visible: bool,
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Replies with whether the engine accepted the device.
    ChooseAudioDevice {
        device: MediaDevice,
        respond_to: oneshot::Sender<Result<bool, SessionError>>,
    },

    /// App moved to the background.
    EnterBackground {
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// App returned to the foreground.
    EnterForeground {
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },

    /// Snapshot of the current view model. Answered even after leaving.
    GetViewModel {
        respond_to: oneshot::Sender<ViewModel>,
    },

    /// Tear down the session. Idempotent.
    Leave {
        respond_to: oneshot::Sender<Result<(), SessionError>>,
    },
}

impl CoordinatorMessage {
    /// Command name for log fields and metric labels.
    #[must_use]
    pub const fn command_name(&self) -> &'static str {
        match self {
            CoordinatorMessage::ToggleMute { .. } => "toggle_mute",
            CoordinatorMessage::ToggleCamera { .. } => "toggle_camera",
            CoordinatorMessage::NextPage { .. } => "next_page",
            CoordinatorMessage::PrevPage { .. } => "prev_page",
            CoordinatorMessage::SelectCaptureMode { .. } => "select_capture_mode",
            CoordinatorMessage::ToggleFlashlight { .. } => "toggle_flashlight",
            CoordinatorMessage::PauseRemoteTile { .. } => "pause_remote_tile",
            CoordinatorMessage::ResumeRemoteTile { .. } => "resume_remote_tile",
            CoordinatorMessage::SetContentVisible { .. } => "set_content_visible",
            CoordinatorMessage::ChooseAudioDevice { .. } => "choose_audio_device",
            CoordinatorMessage::EnterBackground { .. } => "enter_background",
            CoordinatorMessage::EnterForeground { .. } => "enter_foreground",
            CoordinatorMessage::GetViewModel { .. } => "get_view_model",
            CoordinatorMessage::Leave { .. } => "leave",
        }
    }
}
