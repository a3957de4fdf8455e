//! `SessionCoordinator` - the single writer for one meeting session.
//!
//! Engine callbacks enter an unbounded queue and are never dropped; the
//! engine cannot retry a lost callback. User commands enter a bounded mailbox
//! and are refused with `MailboxFull` when it is full. Callbacks already
//! queued are applied before the next command, so a command always sees the
//! latest engine state. Each message runs to completion, so no two mutations
//! ever interleave. After every message the coordinator emits at most one
//! [`ViewUpdate`] on the view channel, which has exactly one consumer.
//!
//! The view channel is bounded. A consumer that stops draining it while
//! awaiting a command reply will stall the coordinator.

use crate::capture::CapturePipelineMode;
use crate::config::{Config, DEFAULT_MAILBOX_CAPACITY, DEFAULT_VIEW_CHANNEL_CAPACITY};
use crate::engine::{CameraCapture, MediaDevice, MediaEngine};
use crate::errors::SessionError;
use crate::observability::metrics;
use crate::tiles::TileId;
use crate::view::{LeaveReason, ViewModel, ViewUpdate};

use super::messages::{CoordinatorMessage, SessionEvent};
use super::metrics::MailboxMonitor;
use super::state::SessionState;

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Coordinator construction parameters.
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Meeting id, for log fields only.
    pub meeting_id: String,
    /// Command mailbox capacity. Engine callbacks are not bounded by it.
    pub mailbox_capacity: usize,
    pub view_channel_capacity: usize,
    /// Audio device picked before joining; applied when audio starts.
    pub preferred_audio_device: Option<MediaDevice>,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            meeting_id: String::new(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            view_channel_capacity: DEFAULT_VIEW_CHANNEL_CAPACITY,
            preferred_audio_device: None,
        }
    }
}

impl CoordinatorOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            meeting_id: config.meeting_id.clone(),
            mailbox_capacity: config.mailbox_capacity,
            view_channel_capacity: config.view_channel_capacity,
            preferred_audio_device: None,
        }
    }
}

/// Handle to a `SessionCoordinator`.
///
/// Cheap to clone. The media engine holds one to post callbacks; the UI holds
/// one to issue commands.
#[derive(Clone, Debug)]
pub struct SessionCoordinatorHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    commands: mpsc::Sender<CoordinatorMessage>,
    cancel_token: CancellationToken,
    mailbox: Arc<MailboxMonitor>,
}

impl SessionCoordinatorHandle {
    /// Post an engine callback without waiting.
    ///
    /// Safe to call from engine-owned threads outside any runtime. Never
    /// blocks and never drops the event.
    ///
    /// # Errors
    ///
    /// `ChannelClosed` if the coordinator is gone.
    pub fn post_event(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.mailbox.record_enqueue();
        self.events.send(event).map_err(|_| {
            self.mailbox.record_send_failed();
            SessionError::ChannelClosed
        })
    }

    /// Async form of [`post_event`](Self::post_event).
    pub async fn send_event(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.post_event(event)
    }

    pub async fn toggle_mute(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::ToggleMute { respond_to })
            .await?
    }

    pub async fn toggle_camera(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::ToggleCamera { respond_to })
            .await?
    }

    /// Returns whether the page moved.
    pub async fn next_page(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::NextPage { respond_to })
            .await?
    }

    /// Returns whether the page moved.
    pub async fn prev_page(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::PrevPage { respond_to })
            .await?
    }

    /// Select a capture pipeline mode.
    ///
    /// # Errors
    ///
    /// `SessionError::CaptureConflict` when the transition is refused; the
    /// same conflict is also emitted as a notice.
    pub async fn select_capture_mode(
        &self,
        mode: CapturePipelineMode,
    ) -> Result<CapturePipelineMode, SessionError> {
        self.request(|respond_to| CoordinatorMessage::SelectCaptureMode { mode, respond_to })
            .await?
    }

    /// Returns the torch state after the attempt.
    pub async fn toggle_flashlight(&self) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::ToggleFlashlight { respond_to })
            .await?
    }

    pub async fn pause_remote_tile(&self, tile_id: TileId) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::PauseRemoteTile {
            tile_id,
            respond_to,
        })
        .await?
    }

    pub async fn resume_remote_tile(&self, tile_id: TileId) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::ResumeRemoteTile {
            tile_id,
            respond_to,
        })
        .await?
    }

    pub async fn set_content_visible(&self, visible: bool) -> Result<(), SessionError> {
        self.request(|respond_to| CoordinatorMessage::SetContentVisible {
            visible,
            respond_to,
        })
        .await?
    }

    pub async fn choose_audio_device(&self, device: MediaDevice) -> Result<bool, SessionError> {
        self.request(|respond_to| CoordinatorMessage::ChooseAudioDevice { device, respond_to })
            .await?
    }

    pub async fn enter_background(&self) -> Result<(), SessionError> {
        self.request(|respond_to| CoordinatorMessage::EnterBackground { respond_to })
            .await?
    }

    pub async fn enter_foreground(&self) -> Result<(), SessionError> {
        self.request(|respond_to| CoordinatorMessage::EnterForeground { respond_to })
            .await?
    }

    pub async fn view_model(&self) -> Result<ViewModel, SessionError> {
        self.request(|respond_to| CoordinatorMessage::GetViewModel { respond_to })
            .await
    }

    /// Tear the session down. Calling it again is a no-op.
    pub async fn leave_meeting(&self) -> Result<(), SessionError> {
        self.request(|respond_to| CoordinatorMessage::Leave { respond_to })
            .await?
    }

    /// Cancel the coordinator. It tears down before exiting.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Messages currently waiting in the mailbox.
    #[must_use]
    pub fn mailbox_depth(&self) -> usize {
        self.mailbox.current_depth()
    }

    fn send(&self, message: CoordinatorMessage) -> Result<(), SessionError> {
        self.mailbox.record_enqueue();
        match self.commands.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.mailbox.record_send_failed();
                self.mailbox.record_rejected();
                Err(SessionError::MailboxFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.mailbox.record_send_failed();
                Err(SessionError::ChannelClosed)
            }
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMessage,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx))?;
        rx.await.map_err(|_| SessionError::ChannelClosed)
    }
}

/// The coordinator actor.
pub struct SessionCoordinator {
    meeting_id: String,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    commands: mpsc::Receiver<CoordinatorMessage>,
    cancel_token: CancellationToken,
    state: SessionState,
    view_tx: mpsc::Sender<ViewUpdate>,
    mailbox: Arc<MailboxMonitor>,
}

impl SessionCoordinator {
    /// Spawn a coordinator.
    ///
    /// Returns the handle, the receiving end of the view channel, and the
    /// task join handle.
    pub fn spawn(
        engine: Arc<dyn MediaEngine>,
        camera: Option<Arc<dyn CameraCapture>>,
        options: CoordinatorOptions,
        cancel_token: CancellationToken,
    ) -> (
        SessionCoordinatorHandle,
        mpsc::Receiver<ViewUpdate>,
        JoinHandle<()>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::channel(options.mailbox_capacity.max(1));
        let (view_tx, view_rx) = mpsc::channel(options.view_channel_capacity.max(1));
        let mailbox = Arc::new(MailboxMonitor::new(options.meeting_id.clone()));

        let actor = Self {
            meeting_id: options.meeting_id,
            events: events_rx,
            commands: commands_rx,
            cancel_token: cancel_token.clone(),
            state: SessionState::new(engine, camera, options.preferred_audio_device),
            view_tx,
            mailbox: Arc::clone(&mailbox),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SessionCoordinatorHandle {
            events: events_tx,
            commands: commands_tx,
            cancel_token,
            mailbox,
        };

        (handle, view_rx, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "session.actor.coordinator", fields(meeting_id = %self.meeting_id))]
    async fn run(mut self) {
        info!(
            target: "session.actor.coordinator",
            meeting_id = %self.meeting_id,
            "SessionCoordinator started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "session.actor.coordinator",
                        meeting_id = %self.meeting_id,
                        "SessionCoordinator received cancellation signal"
                    );
                    self.state.leave(LeaveReason::UserRequested);
                    self.emit().await;
                    break;
                }

                event = self.events.recv() => {
                    let Some(event) = event else {
                        self.on_channel_closed().await;
                        break;
                    };
                    self.mailbox.record_dequeue();
                    self.handle_event(event);
                    self.emit().await;
                }

                message = self.commands.recv() => {
                    let Some(message) = message else {
                        self.on_channel_closed().await;
                        break;
                    };
                    self.mailbox.record_dequeue();
                    self.handle_message(message);
                    self.emit().await;
                }
            }
        }

        info!(
            target: "session.actor.coordinator",
            meeting_id = %self.meeting_id,
            messages_processed = self.mailbox.messages_processed(),
            messages_rejected = self.mailbox.messages_rejected(),
            "SessionCoordinator stopped"
        );
    }

    /// Every handle is gone; leave as if the user asked.
    async fn on_channel_closed(&mut self) {
        info!(
            target: "session.actor.coordinator",
            meeting_id = %self.meeting_id,
            "SessionCoordinator channel closed, exiting"
        );
        self.state.leave(LeaveReason::UserRequested);
        self.emit().await;
    }

    fn handle_event(&mut self, event: SessionEvent) {
        let name = event.as_str();
        let started = Instant::now();
        self.state.apply_event(event);
        metrics::record_event(name, started.elapsed());
    }

    /// Handle a single command to completion.
    fn handle_message(&mut self, message: CoordinatorMessage) {
        let command = message.command_name();
        metrics::record_command(command);
        debug!(
            target: "session.actor.coordinator",
            command,
            "Handling command"
        );

        match message {
            CoordinatorMessage::ToggleMute { respond_to } => {
                let _ = respond_to.send(self.state.toggle_mute());
            }

            CoordinatorMessage::ToggleCamera { respond_to } => {
                let _ = respond_to.send(self.state.toggle_camera());
            }

            CoordinatorMessage::NextPage { respond_to } => {
                let _ = respond_to.send(self.state.next_page());
            }

            CoordinatorMessage::PrevPage { respond_to } => {
                let _ = respond_to.send(self.state.prev_page());
            }

            CoordinatorMessage::SelectCaptureMode { mode, respond_to } => {
                let _ = respond_to.send(self.state.select_capture_mode(mode));
            }

            CoordinatorMessage::ToggleFlashlight { respond_to } => {
                let _ = respond_to.send(self.state.toggle_flashlight());
            }

            CoordinatorMessage::PauseRemoteTile {
                tile_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.state.pause_remote_tile(tile_id));
            }

            CoordinatorMessage::ResumeRemoteTile {
                tile_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.state.resume_remote_tile(tile_id));
            }

            CoordinatorMessage::SetContentVisible {
                visible,
                respond_to,
            } => {
                let _ = respond_to.send(self.state.set_content_visible(visible));
            }

            CoordinatorMessage::ChooseAudioDevice { device, respond_to } => {
                let _ = respond_to.send(self.state.choose_audio_device(device));
            }

            CoordinatorMessage::EnterBackground { respond_to } => {
                let _ = respond_to.send(self.state.enter_background());
            }

            CoordinatorMessage::EnterForeground { respond_to } => {
                let _ = respond_to.send(self.state.enter_foreground());
            }

            CoordinatorMessage::GetViewModel { respond_to } => {
                let _ = respond_to.send(self.state.view_model());
            }

            CoordinatorMessage::Leave { respond_to } => {
                self.state.leave(LeaveReason::UserRequested);
                let _ = respond_to.send(Ok(()));
            }
        }
    }

    /// Send the pending view update, if any, to the UI consumer.
    async fn emit(&mut self) {
        let Some(update) = self.state.take_update() else {
            return;
        };

        metrics::record_view_update();
        metrics::set_visible_tiles(update.model.visible.len());
        debug!(
            target: "session.actor.coordinator",
            sequence = update.sequence,
            visible = update.model.visible.len(),
            ops = update.diff.len(),
            notices = update.notices.len(),
            leave = update.leave.is_some(),
            "Emitting view update"
        );

        if self.view_tx.send(update).await.is_err() {
            debug!(
                target: "session.actor.coordinator",
                meeting_id = %self.meeting_id,
                "View consumer gone, update discarded"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::MeetingSessionConfiguration;
    use crate::engine::LocalVideoSource;
    use crate::tiles::{PauseState, TileState};

    struct NoopEngine;

    impl MediaEngine for NoopEngine {
        fn start(&self, _: &MeetingSessionConfiguration, _: SessionCoordinatorHandle) -> bool {
            true
        }
        fn stop(&self) {}
        fn start_remote_video(&self) {}
        fn stop_remote_video(&self) {}
        fn start_local_video(&self, _: LocalVideoSource) -> bool {
            true
        }
        fn stop_local_video(&self) {}
        fn pause_remote_video_tile(&self, _: TileId) {}
        fn resume_remote_video_tile(&self, _: TileId) {}
        fn unbind_video_view(&self, _: TileId) {}
        fn realtime_local_mute(&self) -> bool {
            true
        }
        fn realtime_local_unmute(&self) -> bool {
            true
        }
        fn set_voice_focus_enabled(&self, _: bool) -> bool {
            true
        }
        fn choose_audio_device(&self, _: &MediaDevice) -> bool {
            true
        }
    }

    fn remote(id: TileId) -> SessionEvent {
        SessionEvent::TileAdded(TileState {
            tile_id: id,
            attendee_id: format!("attendee-{id}"),
            is_local_tile: false,
            is_content: false,
            pause_state: PauseState::Playing,
            content_width: 0,
            content_height: 0,
        })
    }

    fn spawn() -> (
        SessionCoordinatorHandle,
        mpsc::Receiver<ViewUpdate>,
        JoinHandle<()>,
    ) {
        SessionCoordinator::spawn(
            Arc::new(NoopEngine),
            None,
            CoordinatorOptions::default(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_events_and_commands_processed_in_arrival_order() {
        let (handle, mut views, _task) = spawn();

        for id in 1..=5 {
            handle.post_event(remote(id)).unwrap();
        }
        // Admitted after all five adds, so page 1 exists when it runs
        assert!(handle.next_page().await.unwrap());
        // Round trip so the page change has been emitted
        let model = handle.view_model().await.unwrap();
        assert_eq!(model.page_index, 1);

        let mut last = None;
        while let Ok(update) = views.try_recv() {
            last = Some(update);
        }
        let last = last.unwrap();
        assert_eq!(last.model.page_index, 1);
        assert_eq!(last.model.visible_ids(), vec![5]);
    }

    #[tokio::test]
    async fn test_sequence_strictly_increases() {
        let (handle, mut views, _task) = spawn();
        for id in 1..=3 {
            handle.send_event(remote(id)).await.unwrap();
        }
        handle.toggle_mute().await.unwrap();

        let mut previous = 0;
        for _ in 0..4 {
            let update = views.recv().await.unwrap();
            assert!(update.sequence > previous);
            previous = update.sequence;
        }
    }

    #[tokio::test]
    async fn test_leave_then_commands_rejected() {
        let (handle, mut views, _task) = spawn();
        handle.leave_meeting().await.unwrap();
        handle.leave_meeting().await.unwrap();

        let update = views.recv().await.unwrap();
        assert_eq!(update.leave, Some(LeaveReason::UserRequested));
        assert!(matches!(
            handle.toggle_camera().await,
            Err(SessionError::AlreadyLeft)
        ));
        // Queries still answer
        assert!(handle.view_model().await.unwrap().visible.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_tears_down_and_closes() {
        let (handle, mut views, task) = spawn();
        handle.cancel();
        task.await.unwrap();

        let update = views.recv().await.unwrap();
        assert_eq!(update.leave, Some(LeaveReason::UserRequested));
        assert!(matches!(
            handle.toggle_mute().await,
            Err(SessionError::ChannelClosed)
        ));
        assert!(matches!(
            handle.post_event(remote(1)),
            Err(SessionError::ChannelClosed)
        ));
    }

    #[tokio::test]
    async fn test_command_refused_when_mailbox_full() {
        let (events, _events_rx) = mpsc::unbounded_channel();
        let (commands, _commands_rx) = mpsc::channel(1);
        let handle = SessionCoordinatorHandle {
            events,
            commands,
            cancel_token: CancellationToken::new(),
            mailbox: Arc::new(MailboxMonitor::new("meeting-1")),
        };

        // Occupies the only slot; nothing drains the mailbox
        let (respond_to, _reply) = oneshot::channel();
        handle
            .send(CoordinatorMessage::ToggleMute { respond_to })
            .unwrap();

        assert!(matches!(
            handle.toggle_camera().await,
            Err(SessionError::MailboxFull)
        ));
        assert_eq!(handle.mailbox.messages_rejected(), 1);
        assert_eq!(handle.mailbox_depth(), 1);

        // Engine callbacks are still accepted
        for id in 1..=10 {
            handle.post_event(remote(id)).unwrap();
        }
        assert_eq!(handle.mailbox_depth(), 11);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_events_beyond_mailbox_capacity_all_applied() {
        let (handle, _views, _task) = SessionCoordinator::spawn(
            Arc::new(NoopEngine),
            None,
            CoordinatorOptions {
                mailbox_capacity: 4,
                ..CoordinatorOptions::default()
            },
            CancellationToken::new(),
        );

        // Nothing runs between these posts on a current-thread runtime
        for id in 1..=4 {
            handle.post_event(remote(id)).unwrap();
        }
        handle
            .post_event(SessionEvent::TileRemoved(TileState {
                tile_id: 1,
                attendee_id: "attendee-1".to_string(),
                is_local_tile: false,
                is_content: false,
                pause_state: PauseState::Playing,
                content_width: 0,
                content_height: 0,
            }))
            .unwrap();

        let model = handle.view_model().await.unwrap();
        assert_eq!(model.visible_ids(), vec![2, 3, 4]);
    }
}
