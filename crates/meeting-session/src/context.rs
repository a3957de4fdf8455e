//! Session context: the owner of one joined meeting.
//!
//! Whatever controls the process lifecycle holds the `SessionContext` and
//! passes its coordinator handle around explicitly. The HTTP join/leave calls
//! happen here, outside the coordinator, and only their parsed results reach
//! it.

use crate::actors::{CoordinatorOptions, SessionCoordinator, SessionCoordinatorHandle};
use crate::api::{MeetingApi, MeetingSessionConfiguration};
use crate::config::Config;
use crate::engine::{CameraCapture, MediaEngine};
use crate::errors::SessionError;
use crate::observability::metrics;
use crate::view::ViewUpdate;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// A joined meeting session.
pub struct SessionContext {
    /// Meeting title used for the join/leave calls.
    title: String,
    configuration: MeetingSessionConfiguration,
    coordinator: SessionCoordinatorHandle,
    task: JoinHandle<()>,
    api: Arc<dyn MeetingApi>,
    joined_at: DateTime<Utc>,
}

impl SessionContext {
    /// Join the configured meeting with default coordinator options.
    ///
    /// # Errors
    ///
    /// See [`SessionContext::join_with_options`].
    pub async fn join(
        config: &Config,
        api: Arc<dyn MeetingApi>,
        engine: Arc<dyn MediaEngine>,
        camera: Option<Arc<dyn CameraCapture>>,
    ) -> Result<(Self, mpsc::Receiver<ViewUpdate>), SessionError> {
        Self::join_with_options(config, CoordinatorOptions::from_config(config), api, engine, camera)
            .await
    }

    /// Join the meeting, spawn the coordinator and start the media engine.
    ///
    /// `camera` is ignored unless `config.use_custom_camera_source` is set.
    ///
    /// # Errors
    ///
    /// - `SessionError::Api` - the join call failed or returned garbage
    /// - `SessionError::EngineStartFailed` - the engine refused to start; the
    ///   coordinator has already been torn down
    #[instrument(skip_all, name = "session.context.join", fields(meeting_id = %config.meeting_id))]
    pub async fn join_with_options(
        config: &Config,
        options: CoordinatorOptions,
        api: Arc<dyn MeetingApi>,
        engine: Arc<dyn MediaEngine>,
        camera: Option<Arc<dyn CameraCapture>>,
    ) -> Result<(Self, mpsc::Receiver<ViewUpdate>), SessionError> {
        debug!(
            target: "session.context",
            attendee_name = %config.attendee_name,
            "Joining meeting"
        );

        let started = Instant::now();
        let response = api.join(&config.meeting_id, &config.attendee_name).await;
        metrics::record_api_request(
            "join",
            if response.is_ok() { "success" } else { "error" },
            started.elapsed(),
        );
        let response = response.map_err(|e| {
            warn!(target: "session.context", error = %e, "Join request failed");
            SessionError::Api(e)
        })?;

        let configuration = MeetingSessionConfiguration::from_join_response(
            response,
            config.active_speaker_interval(),
        );

        let camera = if config.use_custom_camera_source {
            camera
        } else {
            None
        };

        let (coordinator, views, task) = SessionCoordinator::spawn(
            Arc::clone(&engine),
            camera,
            options,
            CancellationToken::new(),
        );

        if !engine.start(&configuration, coordinator.clone()) {
            error!(
                target: "session.context",
                meeting_id = %configuration.meeting_id,
                "Media engine failed to start"
            );
            drop(views);
            coordinator.cancel();
            if let Err(e) = task.await {
                warn!(target: "session.context", error = %e, "Coordinator task failed");
            }
            return Err(SessionError::EngineStartFailed);
        }
        engine.start_remote_video();

        info!(
            target: "session.context",
            meeting_id = %configuration.meeting_id,
            attendee_id = %configuration.attendee_id,
            "Joined meeting"
        );

        Ok((
            Self {
                title: config.meeting_id.clone(),
                configuration,
                coordinator,
                task,
                api,
                joined_at: Utc::now(),
            },
            views,
        ))
    }

    #[must_use]
    pub fn coordinator(&self) -> &SessionCoordinatorHandle {
        &self.coordinator
    }

    #[must_use]
    pub fn configuration(&self) -> &MeetingSessionConfiguration {
        &self.configuration
    }

    #[must_use]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Leave the meeting.
    ///
    /// Local teardown runs first and always completes; the HTTP leave is best
    /// effort and only logged on failure.
    #[instrument(skip_all, name = "session.context.leave", fields(meeting_id = %self.title))]
    pub async fn leave(self) {
        if let Err(e) = self.coordinator.leave_meeting().await {
            debug!(target: "session.context", error = %e, "Coordinator already stopped");
        }
        self.coordinator.cancel();
        if let Err(e) = self.task.await {
            warn!(target: "session.context", error = %e, "Coordinator task failed");
        }

        let started = Instant::now();
        let result = self.api.leave(&self.title).await;
        metrics::record_api_request(
            "leave",
            if result.is_ok() { "success" } else { "error" },
            started.elapsed(),
        );
        if let Err(e) = result {
            warn!(target: "session.context", error = %e, "Leave request failed");
        }

        info!(
            target: "session.context",
            duration_seconds = (Utc::now() - self.joined_at).num_seconds(),
            "Left meeting"
        );
    }
}
