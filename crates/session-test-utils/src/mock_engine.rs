//! Mock media engine and camera for coordinator testing.
//!
//! Both mocks record every call in order so tests can assert on side effects,
//! including the teardown sequence.
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::{EngineCall, MockMediaEngine};
//!
//! let engine = MockMediaEngine::builder().fail_unmute().build();
//!
//! // ... drive a coordinator ...
//!
//! assert!(engine.calls().contains(&EngineCall::Stop));
//! ```

use std::sync::{Arc, Mutex};

use meeting_session::actors::{SessionCoordinatorHandle, SessionEvent};
use meeting_session::api::MeetingSessionConfiguration;
use meeting_session::engine::{
    CameraCapture, LocalVideoSource, MediaDevice, MediaEngine, VideoFilter,
};
use meeting_session::errors::SessionError;
use meeting_session::tiles::TileId;

/// One call made on [`MockMediaEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Start { meeting_id: String },
    Stop,
    StartRemoteVideo,
    StopRemoteVideo,
    StartLocalVideo(LocalVideoSource),
    StopLocalVideo,
    PauseRemoteVideoTile(TileId),
    ResumeRemoteVideoTile(TileId),
    UnbindVideoView(TileId),
    RealtimeLocalMute,
    RealtimeLocalUnmute,
    SetVoiceFocusEnabled(bool),
    ChooseAudioDevice(MediaDevice),
}

/// Mock media engine.
///
/// Every call is recorded; boolean calls succeed unless configured otherwise.
/// The coordinator handle passed to `start` is kept so tests can post events
/// the way engine threads would.
#[derive(Debug, Default)]
pub struct MockMediaEngine {
    calls: Mutex<Vec<EngineCall>>,
    handle: Mutex<Option<SessionCoordinatorHandle>>,
    fail_start: bool,
    fail_local_video: bool,
    fail_mute: bool,
    fail_unmute: bool,
    fail_voice_focus: bool,
    fail_audio_device: bool,
}

impl MockMediaEngine {
    /// Create a new `MockMediaEngine` builder.
    #[must_use]
    pub fn builder() -> MockMediaEngineBuilder {
        MockMediaEngineBuilder::default()
    }

    /// Create an engine that accepts every call.
    #[must_use]
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All calls so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Return and forget all calls so far.
    pub fn take_calls(&self) -> Vec<EngineCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Calls that tear the session down, in order.
    #[must_use]
    pub fn teardown_calls(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    EngineCall::UnbindVideoView(_)
                        | EngineCall::StopLocalVideo
                        | EngineCall::StopRemoteVideo
                        | EngineCall::Stop
                )
            })
            .collect()
    }

    /// Handle received in `start`, if the engine was started.
    #[must_use]
    pub fn handle(&self) -> Option<SessionCoordinatorHandle> {
        self.handle.lock().unwrap().clone()
    }

    /// Post an event through the handle received in `start`.
    ///
    /// # Panics
    ///
    /// Panics if the engine was never started.
    pub fn emit(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.handle()
            .expect("engine was not started")
            .post_event(event)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaEngine for MockMediaEngine {
    fn start(
        &self,
        configuration: &MeetingSessionConfiguration,
        events: SessionCoordinatorHandle,
    ) -> bool {
        self.record(EngineCall::Start {
            meeting_id: configuration.meeting_id.clone(),
        });
        *self.handle.lock().unwrap() = Some(events);
        !self.fail_start
    }

    fn stop(&self) {
        self.record(EngineCall::Stop);
    }

    fn start_remote_video(&self) {
        self.record(EngineCall::StartRemoteVideo);
    }

    fn stop_remote_video(&self) {
        self.record(EngineCall::StopRemoteVideo);
    }

    fn start_local_video(&self, source: LocalVideoSource) -> bool {
        self.record(EngineCall::StartLocalVideo(source));
        !self.fail_local_video
    }

    fn stop_local_video(&self) {
        self.record(EngineCall::StopLocalVideo);
    }

    fn pause_remote_video_tile(&self, tile_id: TileId) {
        self.record(EngineCall::PauseRemoteVideoTile(tile_id));
    }

    fn resume_remote_video_tile(&self, tile_id: TileId) {
        self.record(EngineCall::ResumeRemoteVideoTile(tile_id));
    }

    fn unbind_video_view(&self, tile_id: TileId) {
        self.record(EngineCall::UnbindVideoView(tile_id));
    }

    fn realtime_local_mute(&self) -> bool {
        self.record(EngineCall::RealtimeLocalMute);
        !self.fail_mute
    }

    fn realtime_local_unmute(&self) -> bool {
        self.record(EngineCall::RealtimeLocalUnmute);
        !self.fail_unmute
    }

    fn set_voice_focus_enabled(&self, enabled: bool) -> bool {
        self.record(EngineCall::SetVoiceFocusEnabled(enabled));
        !self.fail_voice_focus
    }

    fn choose_audio_device(&self, device: &MediaDevice) -> bool {
        self.record(EngineCall::ChooseAudioDevice(device.clone()));
        !self.fail_audio_device
    }
}

/// Builder for `MockMediaEngine` configuration.
#[derive(Debug, Default)]
pub struct MockMediaEngineBuilder {
    engine: MockMediaEngine,
}

impl MockMediaEngineBuilder {
    /// `start` returns false.
    #[must_use]
    pub fn fail_start(mut self) -> Self {
        self.engine.fail_start = true;
        self
    }

    /// `start_local_video` returns false.
    #[must_use]
    pub fn fail_local_video(mut self) -> Self {
        self.engine.fail_local_video = true;
        self
    }

    /// `realtime_local_mute` returns false.
    #[must_use]
    pub fn fail_mute(mut self) -> Self {
        self.engine.fail_mute = true;
        self
    }

    /// `realtime_local_unmute` returns false.
    #[must_use]
    pub fn fail_unmute(mut self) -> Self {
        self.engine.fail_unmute = true;
        self
    }

    /// `set_voice_focus_enabled` returns false.
    #[must_use]
    pub fn fail_voice_focus(mut self) -> Self {
        self.engine.fail_voice_focus = true;
        self
    }

    /// `choose_audio_device` returns false.
    #[must_use]
    pub fn fail_audio_device(mut self) -> Self {
        self.engine.fail_audio_device = true;
        self
    }

    /// Build the engine.
    #[must_use]
    pub fn build(self) -> Arc<MockMediaEngine> {
        Arc::new(self.engine)
    }
}

/// One call made on [`MockCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraCall {
    Start,
    Stop,
    AddFilterSink(VideoFilter),
    RemoveFilterSink(VideoFilter),
    SetTorchEnabled(bool),
}

/// Mock app-owned camera.
///
/// The torch follows `set_torch_enabled` unless the camera has no torch.
#[derive(Debug, Default)]
pub struct MockCamera {
    calls: Mutex<Vec<CameraCall>>,
    torch: Mutex<bool>,
    no_torch: bool,
}

impl MockCamera {
    /// Camera with a working torch.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Camera whose torch never turns on.
    #[must_use]
    pub fn without_torch() -> Arc<Self> {
        Arc::new(Self {
            no_torch: true,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn calls(&self) -> Vec<CameraCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CameraCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CameraCapture for MockCamera {
    fn start(&self) {
        self.record(CameraCall::Start);
    }

    fn stop(&self) {
        self.record(CameraCall::Stop);
    }

    fn add_filter_sink(&self, filter: VideoFilter) {
        self.record(CameraCall::AddFilterSink(filter));
    }

    fn remove_filter_sink(&self, filter: VideoFilter) {
        self.record(CameraCall::RemoveFilterSink(filter));
    }

    fn torch_enabled(&self) -> bool {
        *self.torch.lock().unwrap()
    }

    fn set_torch_enabled(&self, enabled: bool) {
        self.record(CameraCall::SetTorchEnabled(enabled));
        if !self.no_torch {
            *self.torch.lock().unwrap() = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_engine_builder() {
        let engine = MockMediaEngine::builder().fail_mute().build();
        assert!(!engine.realtime_local_mute());
        assert!(engine.realtime_local_unmute());
        assert_eq!(
            engine.calls(),
            vec![EngineCall::RealtimeLocalMute, EngineCall::RealtimeLocalUnmute]
        );
    }

    #[test]
    fn test_teardown_calls_filtered() {
        let engine = MockMediaEngine::accepting();
        engine.pause_remote_video_tile(1);
        engine.unbind_video_view(1);
        engine.stop();
        assert_eq!(
            engine.teardown_calls(),
            vec![EngineCall::UnbindVideoView(1), EngineCall::Stop]
        );
        assert_eq!(engine.take_calls().len(), 3);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_mock_camera_torch() {
        let camera = MockCamera::new();
        camera.set_torch_enabled(true);
        assert!(camera.torch_enabled());

        let camera = MockCamera::without_torch();
        camera.set_torch_enabled(true);
        assert!(!camera.torch_enabled());
        assert_eq!(camera.calls(), vec![CameraCall::SetTorchEnabled(true)]);
    }
}
