//! Aggregate session state.
//!
//! `SessionState` is plain synchronous data owned by exactly one
//! `SessionCoordinator`; the actor's mailbox is the only way in, which is what
//! serializes engine callbacks and user commands. Every handler leaves pending
//! notices behind and [`SessionState::take_update`] turns the result into one
//! [`ViewUpdate`].
//!
//! # Off-screen pausing
//!
//! After any change that can move the page window, remote tiles are told to
//! pause or resume:
//!
//! | tile position | user-paused | engine pause state | action |
//! |---------------|-------------|--------------------|--------|
//! | in window     | no          | not `Playing`      | resume |
//! | off window    | no          | `Playing`          | pause  |
//! | any           | yes         | any                | none   |
//!
//! Pause state itself only changes when the engine reports it back. Until it
//! does, the request is remembered and not sent again; a tile crossing the
//! window edge drops the stale request.

use crate::capture::{CaptureConflict, CapturePipelineMode, CapturePipelineSelector, CaptureTransition};
use crate::engine::{CameraCapture, MediaDevice, MediaDeviceKind, MediaEngine, SessionStatusCode};
use crate::errors::SessionError;
use crate::layout::{self, Pagination};
use crate::observability::metrics;
use crate::tiles::{PauseState, RosterEntry, Tile, TileId, TileKind, TileRegistry, TileState};
use crate::view::{LeaveReason, Notice, StreamState, ViewModel, ViewUpdate, VisibleTile};

use super::messages::SessionEvent;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A pause or resume sent to the engine and not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    Pause,
    Resume,
}

/// Everything the coordinator serializes.
pub struct SessionState {
    engine: Arc<dyn MediaEngine>,
    /// Present only when the app owns the camera.
    camera: Option<Arc<dyn CameraCapture>>,

    registry: TileRegistry,
    pagination: Pagination,
    /// Attendee id to display name. Entries are never removed.
    roster: HashMap<String, String>,
    active_speakers: HashSet<String>,
    user_paused: HashSet<TileId>,
    pending_requests: HashMap<TileId, PendingRequest>,

    audio_state: StreamState,
    video_state: StreamState,
    muted: bool,
    camera_on: bool,
    /// Local video was running when the app went to the background.
    was_camera_on: bool,
    capture: CapturePipelineSelector,
    flashlight_on: bool,
    content_visible: bool,

    audio_devices: Vec<MediaDevice>,
    active_audio_device: Option<MediaDevice>,
    /// Device picked before joining, applied once audio starts.
    preferred_audio_device: Option<MediaDevice>,
    voice_focus_applied: bool,

    last_model: ViewModel,
    sequence: u64,
    pending_notices: Vec<Notice>,
    pending_leave: Option<LeaveReason>,
    has_left: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        camera: Option<Arc<dyn CameraCapture>>,
        preferred_audio_device: Option<MediaDevice>,
    ) -> Self {
        let capture = CapturePipelineSelector::new(camera.is_some());
        let mut state = Self {
            engine,
            camera,
            registry: TileRegistry::new(),
            pagination: Pagination::new(),
            roster: HashMap::new(),
            active_speakers: HashSet::new(),
            user_paused: HashSet::new(),
            pending_requests: HashMap::new(),
            audio_state: StreamState::Idle,
            video_state: StreamState::Idle,
            muted: false,
            camera_on: false,
            was_camera_on: false,
            capture,
            flashlight_on: false,
            content_visible: false,
            audio_devices: Vec::new(),
            active_audio_device: None,
            preferred_audio_device,
            voice_focus_applied: false,
            last_model: ViewModel::default(),
            sequence: 0,
            pending_notices: Vec::new(),
            pending_leave: None,
            has_left: false,
        };
        state.last_model = state.view_model();
        state
    }

    #[must_use]
    pub fn has_left(&self) -> bool {
        self.has_left
    }

    #[must_use]
    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.has_left {
            Err(SessionError::AlreadyLeft)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------------
    // Engine callbacks
    // ------------------------------------------------------------------------

    /// Apply one engine callback. Events after leaving are ignored.
    pub fn apply_event(&mut self, event: SessionEvent) {
        if self.has_left {
            debug!(
                target: "session.actor.coordinator",
                event = event.as_str(),
                "Ignoring event after leave"
            );
            return;
        }

        match event {
            SessionEvent::TileAdded(state) => self.on_tile_added(&state),
            SessionEvent::TileRemoved(state) => self.on_tile_removed(state.tile_id),
            SessionEvent::TilePaused(state) => {
                let pause_state = match state.pause_state {
                    PauseState::Playing => PauseState::PausedByUser,
                    other => other,
                };
                self.set_pause_state(state.tile_id, pause_state);
            }
            SessionEvent::TileResumed(state) => {
                self.set_pause_state(state.tile_id, PauseState::Playing);
            }
            SessionEvent::TileSizeChanged(state) => {
                if self.registry.set_content_size(
                    state.tile_id,
                    state.content_width,
                    state.content_height,
                ) {
                    debug!(
                        target: "session.actor.coordinator",
                        tile_id = state.tile_id,
                        width = state.content_width,
                        height = state.content_height,
                        "Tile content size changed"
                    );
                }
            }
            SessionEvent::ActiveSpeakersDetected(attendee_ids) => {
                self.active_speakers = attendee_ids.into_iter().collect();
                self.registry.reorder_remote(&self.active_speakers);
                self.refresh_page();
            }
            SessionEvent::RosterChanged(entries) => self.on_roster_changed(entries),
            SessionEvent::AudioDeviceChanged(devices) => {
                self.audio_devices = devices
                    .into_iter()
                    .filter(|d| d.kind != MediaDeviceKind::Other)
                    .collect();
            }
            SessionEvent::AudioSessionStartedConnecting { reconnecting } => {
                self.audio_state = StreamState::Connecting;
                if reconnecting {
                    self.pending_notices.push(Notice::info("Reconnecting audio"));
                }
            }
            SessionEvent::AudioSessionStarted { reconnecting } => {
                self.on_audio_started(reconnecting);
            }
            SessionEvent::AudioSessionDropped => {
                self.audio_state = StreamState::Connecting;
                self.pending_notices
                    .push(Notice::warning("Audio connection dropped, reconnecting"));
            }
            SessionEvent::AudioSessionCancelledReconnect => {
                self.pending_notices
                    .push(Notice::info("Audio reconnect cancelled"));
            }
            SessionEvent::AudioSessionStopped(status) => self.on_audio_stopped(status),
            SessionEvent::ConnectionBecamePoor => {
                if self.audio_state == StreamState::Connected {
                    self.audio_state = StreamState::Poor;
                    self.pending_notices.push(Notice::warning("Poor connection"));
                }
            }
            SessionEvent::ConnectionRecovered => {
                if self.audio_state == StreamState::Poor {
                    self.audio_state = StreamState::Connected;
                    self.pending_notices.push(Notice::info("Connection recovered"));
                }
            }
            SessionEvent::VideoSessionStartedConnecting => {
                self.video_state = StreamState::Connecting;
            }
            SessionEvent::VideoSessionStarted(status) => {
                self.video_state = StreamState::Connected;
                if status == SessionStatusCode::VideoAtCapacityViewOnly {
                    self.pending_notices.push(Notice::warning(
                        "The meeting is at video capacity; you can view but not share video",
                    ));
                }
            }
            SessionEvent::VideoSessionStopped(status) => {
                self.video_state = StreamState::Stopped;
                if !status.is_ok() {
                    warn!(
                        target: "session.actor.coordinator",
                        status = %status,
                        "Video session stopped with error"
                    );
                    self.pending_notices
                        .push(Notice::warning(format!("Video session stopped: {status}")));
                    self.leave(LeaveReason::SessionStopped(status));
                }
            }
        }
    }

    fn on_tile_added(&mut self, state: &TileState) {
        let tile = Tile::from(state);
        let tile_id = tile.id;
        let kind = tile.kind;

        if !self.registry.add(tile) {
            debug!(
                target: "session.actor.coordinator",
                tile_id,
                kind = kind.as_str(),
                "Duplicate tile add ignored"
            );
            return;
        }

        debug!(
            target: "session.actor.coordinator",
            tile_id,
            kind = kind.as_str(),
            "Tile added"
        );

        match kind {
            TileKind::Remote if !self.active_speakers.is_empty() => {
                self.registry.reorder_remote(&self.active_speakers);
            }
            TileKind::Content if !self.content_visible => {
                self.engine.pause_remote_video_tile(tile_id);
            }
            _ => {}
        }

        self.refresh_page();
    }

    fn on_tile_removed(&mut self, tile_id: TileId) {
        let Some(tile) = self.registry.remove(tile_id) else {
            debug!(
                target: "session.actor.coordinator",
                tile_id,
                "Remove for unknown tile ignored"
            );
            return;
        };

        debug!(
            target: "session.actor.coordinator",
            tile_id,
            kind = tile.kind.as_str(),
            "Tile removed"
        );

        self.user_paused.remove(&tile_id);
        self.pending_requests.remove(&tile_id);
        self.engine.unbind_video_view(tile_id);
        self.refresh_page();
    }

    fn set_pause_state(&mut self, tile_id: TileId, pause_state: PauseState) {
        self.pending_requests.remove(&tile_id);
        if !self.registry.set_pause_state(tile_id, pause_state) {
            debug!(
                target: "session.actor.coordinator",
                tile_id,
                "Pause state for unknown tile ignored"
            );
        }
    }

    fn on_roster_changed(&mut self, entries: Vec<RosterEntry>) {
        for entry in entries {
            self.roster.insert(entry.attendee_id, entry.display_name);
        }
    }

    fn on_audio_started(&mut self, reconnecting: bool) {
        self.audio_state = StreamState::Connected;
        if reconnecting {
            self.pending_notices.push(Notice::info("Audio reconnected"));
        }

        if self.voice_focus_applied {
            return;
        }
        self.voice_focus_applied = true;

        if self.engine.set_voice_focus_enabled(true) {
            self.pending_notices.push(Notice::info("Voice Focus enabled"));
        } else {
            self.pending_notices
                .push(Notice::warning("Failed to enable Voice Focus"));
        }

        if let Some(device) = self.preferred_audio_device.take() {
            self.apply_audio_device(device);
        }
    }

    fn on_audio_stopped(&mut self, status: SessionStatusCode) {
        self.audio_state = StreamState::Stopped;
        if status.is_ok() {
            info!(
                target: "session.actor.coordinator",
                "Audio session stopped"
            );
            self.pending_leave = Some(LeaveReason::SessionStopped(status));
        } else {
            warn!(
                target: "session.actor.coordinator",
                status = %status,
                "Audio session stopped with error"
            );
            self.pending_notices
                .push(Notice::warning(format!("Audio session stopped: {status}")));
            self.leave(LeaveReason::SessionStopped(status));
        }
    }

    // ------------------------------------------------------------------------
    // User commands
    // ------------------------------------------------------------------------

    /// Flip the microphone. The flag only changes when the engine agrees.
    pub fn toggle_mute(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;

        let target = !self.muted;
        let accepted = if target {
            self.engine.realtime_local_mute()
        } else {
            self.engine.realtime_local_unmute()
        };

        if accepted {
            self.muted = target;
        } else {
            self.pending_notices.push(Notice::warning(if target {
                "Failed to mute"
            } else {
                "Failed to unmute"
            }));
        }
        Ok(self.muted)
    }

    pub fn toggle_camera(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;

        if self.camera_on {
            self.stop_local_capture(self.capture.mode());
            self.camera_on = false;
        } else if self.start_local_capture() {
            self.camera_on = true;
        } else {
            self.pending_notices
                .push(Notice::warning("Failed to start local video"));
        }
        Ok(self.camera_on)
    }

    pub fn next_page(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let moved = self
            .pagination
            .next_page(self.registry.remote_count(), self.registry.has_local());
        if moved {
            self.refresh_page();
        }
        Ok(moved)
    }

    pub fn prev_page(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        let moved = self.pagination.prev_page();
        if moved {
            self.refresh_page();
        }
        Ok(moved)
    }

    /// Switch the capture pipeline, restarting local video through the new
    /// sink when it is running.
    pub fn select_capture_mode(
        &mut self,
        mode: CapturePipelineMode,
    ) -> Result<CapturePipelineMode, SessionError> {
        self.ensure_active()?;

        match self.capture.select(mode) {
            Err(conflict) => {
                metrics::record_capture_rejection(mode.as_str());
                self.pending_notices.push(Notice::warning(conflict.to_string()));
                Err(conflict.into())
            }
            Ok(CaptureTransition::Unchanged) => Ok(mode),
            Ok(CaptureTransition::Switched { from, to }) => {
                if self.camera_on {
                    self.stop_local_capture(from);
                    if !self.start_local_capture() {
                        self.camera_on = false;
                        self.pending_notices
                            .push(Notice::warning("Failed to restart local video"));
                    }
                }
                info!(
                    target: "session.actor.coordinator",
                    from = from.as_str(),
                    to = to.as_str(),
                    restarted = self.camera_on,
                    "Capture pipeline switched"
                );
                Ok(to)
            }
        }
    }

    pub fn toggle_flashlight(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;

        let Some(camera) = self.camera.clone() else {
            let conflict = CaptureConflict::CustomSourceRequired;
            self.pending_notices.push(Notice::warning(conflict.to_string()));
            return Err(conflict.into());
        };

        let desired = !camera.torch_enabled();
        camera.set_torch_enabled(desired);
        let actual = camera.torch_enabled();
        if actual != desired {
            self.pending_notices.push(Notice::warning(if desired {
                "Failed to turn on the flashlight"
            } else {
                "Failed to turn off the flashlight"
            }));
        }
        self.flashlight_on = actual;
        Ok(actual)
    }

    /// Pause a remote or content tile on the user's request. Pagination
    /// never resumes it until [`Self::resume_remote_tile`].
    pub fn pause_remote_tile(&mut self, tile_id: TileId) -> Result<bool, SessionError> {
        self.ensure_active()?;
        match self.registry.get(tile_id).map(|t| t.kind) {
            Some(TileKind::Remote | TileKind::Content) => {
                self.user_paused.insert(tile_id);
                self.pending_requests.remove(&tile_id);
                self.engine.pause_remote_video_tile(tile_id);
                Ok(true)
            }
            Some(TileKind::Local) | None => Ok(false),
        }
    }

    pub fn resume_remote_tile(&mut self, tile_id: TileId) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if !self.user_paused.remove(&tile_id) {
            return Ok(false);
        }
        if self.is_on_screen(tile_id) {
            self.engine.resume_remote_video_tile(tile_id);
            self.pending_requests.insert(tile_id, PendingRequest::Resume);
        }
        Ok(true)
    }

    pub fn set_content_visible(&mut self, visible: bool) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.content_visible = visible;
        for tile in self.registry.content() {
            if self.user_paused.contains(&tile.id) {
                continue;
            }
            if visible {
                self.engine.resume_remote_video_tile(tile.id);
            } else {
                self.engine.pause_remote_video_tile(tile.id);
            }
        }
        Ok(())
    }

    pub fn choose_audio_device(&mut self, device: MediaDevice) -> Result<bool, SessionError> {
        self.ensure_active()?;
        Ok(self.apply_audio_device(device))
    }

    pub fn enter_background(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.camera_on {
            self.was_camera_on = true;
            self.stop_local_capture(self.capture.mode());
            self.camera_on = false;
        }
        self.engine.stop_remote_video();
        Ok(())
    }

    pub fn enter_foreground(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if self.was_camera_on {
            self.was_camera_on = false;
            if self.start_local_capture() {
                self.camera_on = true;
            } else {
                self.pending_notices
                    .push(Notice::warning("Failed to restart local video"));
            }
        }
        self.engine.start_remote_video();
        Ok(())
    }

    /// Tear the session down: unbind every tile, stop local capture, stop
    /// remote video, stop the session. Runs once.
    pub fn leave(&mut self, reason: LeaveReason) {
        if self.has_left {
            return;
        }

        for tile_id in self.registry.tile_ids() {
            self.engine.unbind_video_view(tile_id);
        }
        self.stop_local_capture(self.capture.mode());
        self.engine.stop_remote_video();
        self.engine.stop();

        info!(
            target: "session.actor.coordinator",
            reason = ?reason,
            tiles = self.registry.len(),
            "Session torn down"
        );

        self.has_left = true;
        self.camera_on = false;
        self.was_camera_on = false;
        self.registry.clear();
        self.pagination.reset();
        self.user_paused.clear();
        self.pending_requests.clear();
        self.pending_leave = Some(reason);
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn apply_audio_device(&mut self, device: MediaDevice) -> bool {
        if self.engine.choose_audio_device(&device) {
            debug!(
                target: "session.actor.coordinator",
                kind = ?device.kind,
                "Audio device selected"
            );
            self.active_audio_device = Some(device);
            true
        } else {
            self.pending_notices.push(Notice::warning(format!(
                "Failed to switch audio to {}",
                device.label
            )));
            false
        }
    }

    /// Start the camera (when owned) and local video in the current mode.
    fn start_local_capture(&self) -> bool {
        let filter = self.capture.mode().filter();
        if let Some(camera) = &self.camera {
            camera.start();
            if let Some(filter) = filter {
                camera.add_filter_sink(filter);
            }
        }

        if self.engine.start_local_video(self.capture.local_video_source()) {
            return true;
        }

        warn!(
            target: "session.actor.coordinator",
            mode = self.capture.mode().as_str(),
            "Engine refused to start local video"
        );
        if let Some(camera) = &self.camera {
            if let Some(filter) = filter {
                camera.remove_filter_sink(filter);
            }
            camera.stop();
        }
        false
    }

    /// Stop local video and the camera feeding it through `mode`'s sink.
    fn stop_local_capture(&mut self, mode: CapturePipelineMode) {
        self.engine.stop_local_video();
        if let Some(camera) = &self.camera {
            if let Some(filter) = mode.filter() {
                camera.remove_filter_sink(filter);
            }
            camera.stop();
            self.flashlight_on = camera.torch_enabled();
        }
    }

    fn is_on_screen(&self, tile_id: TileId) -> bool {
        match self.registry.get(tile_id).map(|t| t.kind) {
            Some(TileKind::Remote) => {
                let window = self
                    .pagination
                    .remote_window(self.registry.remote_count(), self.registry.has_local());
                self.registry
                    .remote()
                    .iter()
                    .position(|t| t.id == tile_id)
                    .is_some_and(|index| window.contains(&index))
            }
            Some(TileKind::Content) => self.content_visible,
            Some(TileKind::Local) | None => false,
        }
    }

    /// Revalidate the page index and pause or resume tiles around the window.
    fn refresh_page(&mut self) {
        let remote_count = self.registry.remote_count();
        let local_present = self.registry.has_local();

        let steps = self.pagination.revalidate(remote_count, local_present);
        if steps > 0 {
            debug!(
                target: "session.actor.coordinator",
                steps,
                page_index = self.pagination.page_index(),
                "Page index moved back to a non-empty page"
            );
        }

        let window = self.pagination.remote_window(remote_count, local_present);
        for (index, tile) in self.registry.remote().iter().enumerate() {
            if self.user_paused.contains(&tile.id) {
                continue;
            }
            let (wanted, needed) = if window.contains(&index) {
                (PendingRequest::Resume, tile.pause_state != PauseState::Playing)
            } else {
                (PendingRequest::Pause, tile.pause_state == PauseState::Playing)
            };

            match self.pending_requests.get(&tile.id).copied() {
                Some(pending) if pending == wanted => continue,
                Some(_) => {
                    self.pending_requests.remove(&tile.id);
                }
                None => {}
            }
            if !needed {
                continue;
            }

            match wanted {
                PendingRequest::Resume => self.engine.resume_remote_video_tile(tile.id),
                PendingRequest::Pause => self.engine.pause_remote_video_tile(tile.id),
            }
            self.pending_requests.insert(tile.id, wanted);
        }
    }

    fn visible_tile(&self, tile: Tile) -> VisibleTile {
        let display_name = self
            .roster
            .get(&tile.attendee_id)
            .cloned()
            .unwrap_or_default();
        VisibleTile { tile, display_name }
    }

    /// Materialize the current model. Never patched, always rebuilt.
    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        let remote_count = self.registry.remote_count();
        let local_present = self.registry.has_local();

        ViewModel {
            visible: self
                .pagination
                .visible_tiles(&self.registry)
                .into_iter()
                .map(|tile| self.visible_tile(tile))
                .collect(),
            content: self
                .registry
                .content()
                .iter()
                .cloned()
                .map(|tile| self.visible_tile(tile))
                .collect(),
            page_index: self.pagination.page_index(),
            can_go_prev: self.pagination.can_go_prev(),
            can_go_next: self.pagination.can_go_next(remote_count, local_present),
            is_muted: self.muted,
            is_camera_on: self.camera_on,
            capture_mode: self.capture.mode(),
            flashlight_on: self.flashlight_on,
            content_visible: self.content_visible,
            audio_state: self.audio_state,
            video_state: self.video_state,
            audio_devices: self.audio_devices.clone(),
            active_audio_device: self.active_audio_device.clone(),
        }
    }

    /// Build the next emission, or `None` when nothing observable changed.
    pub fn take_update(&mut self) -> Option<ViewUpdate> {
        let model = self.view_model();
        if model == self.last_model
            && self.pending_notices.is_empty()
            && self.pending_leave.is_none()
        {
            return None;
        }

        let diff = layout::diff(&self.last_model.visible, &model.visible);
        self.sequence += 1;
        self.last_model = model.clone();

        Some(ViewUpdate {
            sequence: self.sequence,
            model,
            diff,
            notices: std::mem::take(&mut self.pending_notices),
            leave: self.pending_leave.take(),
        })
    }
}
