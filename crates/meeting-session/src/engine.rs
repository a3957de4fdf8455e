//! Media engine collaborator interfaces.
//!
//! The engine (codec, transport, rendering) is opaque to this crate. The
//! coordinator drives it through [`MediaEngine`] and, when the app owns the
//! camera, through [`CameraCapture`]. Every call is non-blocking; failures come
//! back as `false` and are surfaced as notices, never as panics.
//!
//! Callbacks flow the other way: the engine receives a
//! [`SessionCoordinatorHandle`] on start and posts a
//! [`SessionEvent`](crate::actors::SessionEvent) for each observer callback.

use crate::actors::SessionCoordinatorHandle;
use crate::api::MeetingSessionConfiguration;
use crate::tiles::TileId;

use std::fmt;

/// Frame filter stage between the camera and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFilter {
    Cpu,
    Gpu,
}

/// What feeds the engine's local video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalVideoSource {
    /// The engine opens the camera itself.
    EngineCamera,
    /// Frames come straight from the app-owned camera.
    CustomCamera,
    /// Frames come from the app-owned camera through a filter.
    Filtered(VideoFilter),
}

/// Audio/video device classes reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaDeviceKind {
    AudioBluetooth,
    AudioWiredHeadset,
    AudioBuiltinSpeaker,
    AudioHandset,
    VideoFrontCamera,
    VideoBackCamera,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDevice {
    pub label: String,
    pub kind: MediaDeviceKind,
}

/// Status carried by session start/stop callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatusCode {
    Ok,
    Left,
    AudioJoinedFromAnotherDevice,
    AudioDisconnectAudio,
    AudioAuthenticationRejected,
    AudioCallAtCapacity,
    AudioCallEnded,
    AudioInternalServerError,
    AudioServiceUnavailable,
    AudioDisconnected,
    VideoAtCapacityViewOnly,
    VideoServiceFailed,
    Unknown(u32),
}

impl SessionStatusCode {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, SessionStatusCode::Ok)
    }
}

impl fmt::Display for SessionStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatusCode::Ok => write!(f, "OK"),
            SessionStatusCode::Left => write!(f, "Left"),
            SessionStatusCode::AudioJoinedFromAnotherDevice => {
                write!(f, "AudioJoinedFromAnotherDevice")
            }
            SessionStatusCode::AudioDisconnectAudio => write!(f, "AudioDisconnectAudio"),
            SessionStatusCode::AudioAuthenticationRejected => {
                write!(f, "AudioAuthenticationRejected")
            }
            SessionStatusCode::AudioCallAtCapacity => write!(f, "AudioCallAtCapacity"),
            SessionStatusCode::AudioCallEnded => write!(f, "AudioCallEnded"),
            SessionStatusCode::AudioInternalServerError => write!(f, "AudioInternalServerError"),
            SessionStatusCode::AudioServiceUnavailable => write!(f, "AudioServiceUnavailable"),
            SessionStatusCode::AudioDisconnected => write!(f, "AudioDisconnected"),
            SessionStatusCode::VideoAtCapacityViewOnly => write!(f, "VideoAtCapacityViewOnly"),
            SessionStatusCode::VideoServiceFailed => write!(f, "VideoServiceFailed"),
            SessionStatusCode::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Audio/video facade of the media engine.
pub trait MediaEngine: Send + Sync {
    /// Start audio and signaling for the joined meeting. Callbacks are posted
    /// to `events` from then on.
    fn start(
        &self,
        configuration: &MeetingSessionConfiguration,
        events: SessionCoordinatorHandle,
    ) -> bool;

    /// Stop the whole session.
    fn stop(&self);

    fn start_remote_video(&self);

    fn stop_remote_video(&self);

    fn start_local_video(&self, source: LocalVideoSource) -> bool;

    fn stop_local_video(&self);

    fn pause_remote_video_tile(&self, tile_id: TileId);

    fn resume_remote_video_tile(&self, tile_id: TileId);

    /// Release the rendering surface bound to a tile.
    fn unbind_video_view(&self, tile_id: TileId);

    fn realtime_local_mute(&self) -> bool;

    fn realtime_local_unmute(&self) -> bool;

    fn set_voice_focus_enabled(&self, enabled: bool) -> bool;

    fn choose_audio_device(&self, device: &MediaDevice) -> bool;
}

/// App-owned camera capture source.
pub trait CameraCapture: Send + Sync {
    fn start(&self);

    fn stop(&self);

    /// Route camera frames through a filter stage.
    fn add_filter_sink(&self, filter: VideoFilter);

    fn remove_filter_sink(&self, filter: VideoFilter);

    fn torch_enabled(&self) -> bool;

    fn set_torch_enabled(&self, enabled: bool);
}
