//! End-to-end tests for the session coordinator actor.
//!
//! Drives a real `SessionCoordinator` with the recording engine from
//! `session-test-utils` and checks what the UI consumer receives:
//! - Pagination and diffs across page changes
//! - Off-screen pausing and user pause overrides
//! - Teardown order
//! - Capture and flashlight rejections surfaced as notices

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use meeting_session::actors::{
    CoordinatorOptions, SessionCoordinator, SessionCoordinatorHandle, SessionEvent,
};
use meeting_session::capture::{CaptureConflict, CapturePipelineMode};
use meeting_session::engine::{
    CameraCapture, LocalVideoSource, MediaDeviceKind, SessionStatusCode, VideoFilter,
};
use meeting_session::errors::SessionError;
use meeting_session::layout::apply_diff;
use meeting_session::tiles::{PauseState, TileId};
use meeting_session::view::{LeaveReason, NoticeLevel, StreamState, ViewModel, ViewUpdate};
use session_test_utils::{
    audio_device, roster_for, CameraCall, EngineCall, MockCamera, MockMediaEngine, TestTile,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

struct Harness {
    handle: SessionCoordinatorHandle,
    views: mpsc::Receiver<ViewUpdate>,
    engine: Arc<MockMediaEngine>,
    task: JoinHandle<()>,
    /// Last model the consumer has seen.
    model: ViewModel,
}

impl Harness {
    fn new(camera: Option<Arc<MockCamera>>) -> Self {
        Self::with_engine(MockMediaEngine::accepting(), camera, CoordinatorOptions::default())
    }

    fn with_engine(
        engine: Arc<MockMediaEngine>,
        camera: Option<Arc<MockCamera>>,
        options: CoordinatorOptions,
    ) -> Self {
        let camera = camera.map(|c| c as Arc<dyn CameraCapture>);
        let (handle, views, task) = SessionCoordinator::spawn(
            engine.clone(),
            camera,
            options,
            CancellationToken::new(),
        );
        Self {
            handle,
            views,
            engine,
            task,
            model: ViewModel::default(),
        }
    }

    fn post(&self, event: SessionEvent) {
        self.handle.post_event(event).unwrap();
    }

    /// Wait until everything admitted so far has been emitted, then return
    /// the updates, checking that each diff turns the previous page into the
    /// next one.
    async fn settle(&mut self) -> Vec<ViewUpdate> {
        self.handle.view_model().await.unwrap();

        let mut updates = Vec::new();
        while let Ok(update) = self.views.try_recv() {
            let patched = apply_diff(&self.model.visible, &update.diff).unwrap();
            assert_eq!(patched, update.model.visible, "diff does not reproduce page");
            self.model = update.model.clone();
            updates.push(update);
        }
        updates
    }

    async fn add_local_and_remotes(&mut self, remotes: std::ops::RangeInclusive<TileId>) {
        self.post(TestTile::local(0).added());
        for id in remotes {
            self.post(TestTile::remote(id).added());
        }
        self.settle().await;
    }
}

fn notices(updates: &[ViewUpdate]) -> Vec<(NoticeLevel, String)> {
    updates
        .iter()
        .flat_map(|u| u.notices.iter().map(|n| (n.level, n.message.clone())))
        .collect()
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_local_and_seven_remote_tiles_paginate() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=7).await;

    assert_eq!(h.model.visible_ids(), vec![0, 1, 2, 3]);
    assert!(!h.model.can_go_prev);
    assert!(h.model.can_go_next);

    assert!(h.handle.next_page().await.unwrap());
    h.settle().await;
    assert_eq!(h.model.visible_ids(), vec![4, 5, 6]);
    assert!(h.model.can_go_prev);
    assert!(h.model.can_go_next);

    assert!(h.handle.next_page().await.unwrap());
    h.settle().await;
    assert_eq!(h.model.visible_ids(), vec![7]);
    assert!(!h.model.can_go_next);

    assert!(!h.handle.next_page().await.unwrap());
    assert!(h.settle().await.is_empty());

    assert!(h.handle.prev_page().await.unwrap());
    h.settle().await;
    assert_eq!(h.model.page_index, 1);
}

#[tokio::test]
async fn test_removing_last_tile_on_page_moves_back() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=4).await;

    h.handle.next_page().await.unwrap();
    h.settle().await;
    assert_eq!(h.model.visible_ids(), vec![4]);

    h.post(TestTile::remote(4).removed());
    let updates = h.settle().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(h.model.page_index, 0);
    assert_eq!(h.model.visible_ids(), vec![0, 1, 2, 3]);
    assert!(!h.model.can_go_next);
    assert!(h.engine.calls().contains(&EngineCall::UnbindVideoView(4)));
}

#[tokio::test]
async fn test_unknown_remove_and_duplicate_add_emit_nothing() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=2).await;

    h.post(TestTile::remote(99).removed());
    h.post(TestTile::remote(1).added());
    assert!(h.settle().await.is_empty());
    assert_eq!(h.model.visible_ids(), vec![0, 1, 2]);
}

#[tokio::test]
async fn test_active_speaker_moves_onto_first_page() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=7).await;

    h.post(SessionEvent::ActiveSpeakersDetected(vec![
        "attendee-6".to_string(),
    ]));
    h.settle().await;
    assert_eq!(h.model.visible_ids(), vec![0, 6, 1, 2]);

    // A tile pushed off the page is paused
    assert!(h.engine.calls().contains(&EngineCall::PauseRemoteVideoTile(3)));
}

#[tokio::test]
async fn test_roster_names_resolved_on_visible_tiles() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=2).await;

    h.post(SessionEvent::RosterChanged(roster_for(&[1])));
    h.settle().await;

    let names: Vec<_> = h
        .model
        .visible
        .iter()
        .map(|t| t.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["", "Attendee 1", ""]);
}

// ============================================================================
// Pausing
// ============================================================================

#[tokio::test]
async fn test_page_change_pauses_and_resumes_tiles() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=6).await;
    h.engine.take_calls();

    h.handle.next_page().await.unwrap();
    h.settle().await;
    let calls = h.engine.take_calls();
    for id in 1..=3 {
        assert!(calls.contains(&EngineCall::PauseRemoteVideoTile(id)));
    }

    // Engine confirms the pause for tile 1
    h.post(SessionEvent::TilePaused(
        TestTile::remote(1)
            .with_pause_state(PauseState::PausedByUser)
            .build(),
    ));
    h.handle.prev_page().await.unwrap();
    h.settle().await;

    let calls = h.engine.take_calls();
    assert!(calls.contains(&EngineCall::ResumeRemoteVideoTile(1)));
    assert!(!calls.contains(&EngineCall::ResumeRemoteVideoTile(2)));
}

#[tokio::test]
async fn test_user_paused_tile_not_resumed_by_pagination() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=6).await;

    assert!(h.handle.pause_remote_tile(2).await.unwrap());
    h.post(SessionEvent::TilePaused(
        TestTile::remote(2)
            .with_pause_state(PauseState::PausedByUser)
            .build(),
    ));
    h.handle.next_page().await.unwrap();
    h.handle.prev_page().await.unwrap();
    h.settle().await;
    assert!(!h
        .engine
        .calls()
        .contains(&EngineCall::ResumeRemoteVideoTile(2)));

    h.engine.take_calls();
    assert!(h.handle.resume_remote_tile(2).await.unwrap());
    assert_eq!(
        h.engine.take_calls(),
        vec![EngineCall::ResumeRemoteVideoTile(2)]
    );
    assert!(!h.handle.resume_remote_tile(2).await.unwrap());
}

#[tokio::test]
async fn test_content_tile_paused_until_shown() {
    let mut h = Harness::new(None);
    h.post(TestTile::content(50).added());
    h.settle().await;

    assert_eq!(h.model.content.len(), 1);
    assert!(h.model.visible.is_empty());
    assert!(h.engine.calls().contains(&EngineCall::PauseRemoteVideoTile(50)));

    h.handle.set_content_visible(true).await.unwrap();
    h.settle().await;
    assert!(h.model.content_visible);
    assert!(h
        .engine
        .calls()
        .contains(&EngineCall::ResumeRemoteVideoTile(50)));
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_leave_tears_down_in_order() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=2).await;
    assert!(h.handle.toggle_camera().await.unwrap());

    h.handle.leave_meeting().await.unwrap();
    let updates = h.settle().await;

    let teardown = h.engine.teardown_calls();
    assert_eq!(teardown.len(), 6);
    let unbound: Vec<_> = teardown[..3].to_vec();
    for id in 0..=2 {
        assert!(unbound.contains(&EngineCall::UnbindVideoView(id)));
    }
    assert_eq!(
        teardown[3..].to_vec(),
        vec![
            EngineCall::StopLocalVideo,
            EngineCall::StopRemoteVideo,
            EngineCall::Stop
        ]
    );

    let last = updates.last().unwrap();
    assert_eq!(last.leave, Some(LeaveReason::UserRequested));
    assert!(last.model.visible.is_empty());

    // Second leave does nothing
    h.handle.leave_meeting().await.unwrap();
    assert_eq!(h.engine.teardown_calls().len(), 6);
    assert!(h.settle().await.is_empty());
}

#[tokio::test]
async fn test_audio_stopped_with_error_leaves_meeting() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=1).await;

    h.post(SessionEvent::AudioSessionStopped(
        SessionStatusCode::AudioCallEnded,
    ));
    let updates = h.settle().await;

    let last = updates.last().unwrap();
    assert_eq!(
        last.leave,
        Some(LeaveReason::SessionStopped(
            SessionStatusCode::AudioCallEnded
        ))
    );
    assert_eq!(notices(&updates)[0].0, NoticeLevel::Warning);
    assert_eq!(h.engine.teardown_calls().last(), Some(&EngineCall::Stop));

    // Late callbacks are ignored and commands refused
    h.post(TestTile::remote(5).added());
    assert!(h.settle().await.is_empty());
    assert!(matches!(
        h.handle.toggle_mute().await,
        Err(SessionError::AlreadyLeft)
    ));
}

#[tokio::test]
async fn test_audio_stopped_ok_notifies_leave_without_error() {
    let mut h = Harness::new(None);
    h.post(SessionEvent::AudioSessionStopped(SessionStatusCode::Ok));
    let updates = h.settle().await;

    assert_eq!(
        updates.last().unwrap().leave,
        Some(LeaveReason::SessionStopped(SessionStatusCode::Ok))
    );
    assert!(notices(&updates).is_empty());
    assert_eq!(h.model.audio_state, StreamState::Stopped);
}

#[tokio::test]
async fn test_cancel_tears_down_before_exit() {
    let mut h = Harness::new(None);
    h.add_local_and_remotes(1..=1).await;

    h.handle.cancel();
    (&mut h.task).await.unwrap();

    assert_eq!(
        h.engine.teardown_calls(),
        vec![
            EngineCall::UnbindVideoView(0),
            EngineCall::UnbindVideoView(1),
            EngineCall::StopLocalVideo,
            EngineCall::StopRemoteVideo,
            EngineCall::Stop
        ]
    );
    let update = h.views.recv().await.unwrap();
    assert_eq!(update.leave, Some(LeaveReason::UserRequested));
}

// ============================================================================
// Capture and commands
// ============================================================================

#[tokio::test]
async fn test_conflicting_filter_rejected_with_notice() {
    let camera = MockCamera::new();
    let mut h = Harness::new(Some(camera.clone()));

    assert_eq!(
        h.handle
            .select_capture_mode(CapturePipelineMode::CpuFilter)
            .await
            .unwrap(),
        CapturePipelineMode::CpuFilter
    );
    h.settle().await;

    let result = h
        .handle
        .select_capture_mode(CapturePipelineMode::GpuFilter)
        .await;
    assert!(matches!(
        result,
        Err(SessionError::CaptureConflict(
            CaptureConflict::FilterAlreadyActive { .. }
        ))
    ));
    let updates = h.settle().await;
    assert_eq!(notices(&updates).len(), 1);
    assert_eq!(h.model.capture_mode, CapturePipelineMode::CpuFilter);

    // Raw camera is always allowed
    h.handle
        .select_capture_mode(CapturePipelineMode::RawCamera)
        .await
        .unwrap();
    h.settle().await;
    assert_eq!(h.model.capture_mode, CapturePipelineMode::RawCamera);
}

#[tokio::test]
async fn test_capture_switch_restarts_running_camera() {
    let camera = MockCamera::new();
    let h = Harness::new(Some(camera.clone()));

    assert!(h.handle.toggle_camera().await.unwrap());
    h.engine.take_calls();

    h.handle
        .select_capture_mode(CapturePipelineMode::GpuFilter)
        .await
        .unwrap();

    assert_eq!(
        h.engine.take_calls(),
        vec![
            EngineCall::StopLocalVideo,
            EngineCall::StartLocalVideo(LocalVideoSource::Filtered(VideoFilter::Gpu))
        ]
    );
    assert_eq!(
        camera.calls(),
        vec![
            CameraCall::Start,
            CameraCall::Stop,
            CameraCall::Start,
            CameraCall::AddFilterSink(VideoFilter::Gpu)
        ]
    );
}

#[tokio::test]
async fn test_flashlight_requires_custom_source() {
    let mut h = Harness::new(None);

    let result = h.handle.toggle_flashlight().await;
    assert!(matches!(
        result,
        Err(SessionError::CaptureConflict(
            CaptureConflict::CustomSourceRequired
        ))
    ));
    assert_eq!(notices(&h.settle().await).len(), 1);
    assert!(!h.model.flashlight_on);
}

#[tokio::test]
async fn test_flashlight_toggles_torch() {
    let mut h = Harness::new(Some(MockCamera::new()));
    assert!(h.handle.toggle_flashlight().await.unwrap());
    h.settle().await;
    assert!(h.model.flashlight_on);

    let mut h = Harness::new(Some(MockCamera::without_torch()));
    assert!(!h.handle.toggle_flashlight().await.unwrap());
    assert_eq!(notices(&h.settle().await).len(), 1);
}

#[tokio::test]
async fn test_mute_follows_engine_result() {
    let engine = MockMediaEngine::builder().fail_unmute().build();
    let mut h = Harness::with_engine(engine, None, CoordinatorOptions::default());

    assert!(h.handle.toggle_mute().await.unwrap());
    assert!(h.handle.toggle_mute().await.unwrap());
    let updates = h.settle().await;
    assert!(h.model.is_muted);
    assert_eq!(
        notices(&updates),
        vec![(NoticeLevel::Warning, "Failed to unmute".to_string())]
    );
}

#[tokio::test]
async fn test_background_stops_and_foreground_restarts_video() {
    let h = Harness::new(None);
    h.handle.toggle_camera().await.unwrap();
    h.engine.take_calls();

    h.handle.enter_background().await.unwrap();
    assert!(!h.handle.view_model().await.unwrap().is_camera_on);
    h.handle.enter_foreground().await.unwrap();

    assert_eq!(
        h.engine.take_calls(),
        vec![
            EngineCall::StopLocalVideo,
            EngineCall::StopRemoteVideo,
            EngineCall::StartLocalVideo(LocalVideoSource::EngineCamera),
            EngineCall::StartRemoteVideo
        ]
    );
    assert!(h.handle.view_model().await.unwrap().is_camera_on);
}

#[tokio::test]
async fn test_audio_start_applies_voice_focus_and_preferred_device() {
    let preferred = audio_device("Headset", MediaDeviceKind::AudioWiredHeadset);
    let options = CoordinatorOptions {
        preferred_audio_device: Some(preferred.clone()),
        ..CoordinatorOptions::default()
    };
    let mut h = Harness::with_engine(MockMediaEngine::accepting(), None, options);

    h.post(SessionEvent::AudioSessionStarted {
        reconnecting: false,
    });
    h.post(SessionEvent::AudioSessionStarted { reconnecting: true });
    h.settle().await;

    let calls = h.engine.calls();
    assert_eq!(
        calls,
        vec![
            EngineCall::SetVoiceFocusEnabled(true),
            EngineCall::ChooseAudioDevice(preferred.clone())
        ]
    );
    assert_eq!(h.model.active_audio_device, Some(preferred));
    assert_eq!(h.model.audio_state, StreamState::Connected);
}

#[tokio::test]
async fn test_device_list_drops_other_devices() {
    let mut h = Harness::new(None);
    h.post(SessionEvent::AudioDeviceChanged(vec![
        audio_device("Speaker", MediaDeviceKind::AudioBuiltinSpeaker),
        audio_device("Virtual", MediaDeviceKind::Other),
    ]));
    h.settle().await;
    assert_eq!(h.model.audio_devices.len(), 1);
    assert_eq!(h.model.audio_devices[0].label, "Speaker");
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_callbacks_from_engine_threads_keep_per_thread_order() {
    let mut h = Harness::new(None);

    let mut threads = Vec::new();
    for base in [0u32, 100] {
        let handle = h.handle.clone();
        threads.push(std::thread::spawn(move || {
            for offset in 1..=10 {
                handle
                    .post_event(TestTile::remote(base + offset).added())
                    .unwrap();
            }
        }));
    }
    for thread in threads {
        thread.join().unwrap();
    }

    let updates = h.settle().await;
    assert!(!updates.is_empty());
    assert!(updates.windows(2).all(|w| w[0].sequence < w[1].sequence));

    // Walk every page and check each thread's tiles kept their relative order
    let mut seen = h.model.visible_ids();
    while h.handle.next_page().await.unwrap() {
        h.settle().await;
        seen.extend(h.model.visible_ids());
    }
    assert_eq!(seen.len(), 20);
    for base in [0u32, 100] {
        let mine: Vec<_> = seen
            .iter()
            .copied()
            .filter(|id| *id > base && *id <= base + 10)
            .collect();
        assert_eq!(mine, (base + 1..=base + 10).collect::<Vec<_>>());
    }
}
