//! Meeting Session
//!
//! Headless driver for the session coordinator: joins a meeting, logs every
//! view update and leaves cleanly on Ctrl+C or when the session ends.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder (when configured)
//! 3. Build the join/leave HTTP client
//! 4. Join through `SessionContext` (spawns the coordinator, starts the engine)
//! 5. Log view updates until shutdown or a leave event
//! 6. Leave: local teardown first, then the HTTP leave

#![warn(clippy::pedantic)]

use std::sync::Arc;

use meeting_session::actors::{SessionCoordinatorHandle, SessionEvent};
use meeting_session::api::{MeetingApiClient, MeetingSessionConfiguration};
use meeting_session::config::Config;
use meeting_session::engine::{LocalVideoSource, MediaDevice, MediaEngine, SessionStatusCode};
use meeting_session::observability::init_metrics_recorder;
use meeting_session::tiles::TileId;
use meeting_session::SessionContext;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeting_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Meeting Session");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        meeting_url = %config.meeting_url,
        meeting_id = %config.meeting_id,
        http_timeout_seconds = config.http_timeout_seconds,
        active_speaker_interval_ms = config.active_speaker_interval_ms,
        use_custom_camera_source = config.use_custom_camera_source,
        "Configuration loaded successfully"
    );

    if let Some(bind_address) = &config.metrics_bind_address {
        info!(addr = %bind_address, "Initializing Prometheus metrics recorder...");
        init_metrics_recorder(bind_address).map_err(|e| {
            error!(error = %e, "Failed to install Prometheus metrics recorder");
            e
        })?;
    }

    let api = Arc::new(
        MeetingApiClient::new(&config.meeting_url, config.http_timeout()).map_err(|e| {
            error!(error = %e, "Failed to build meeting API client");
            e
        })?,
    );

    let engine = Arc::new(LoggingMediaEngine);
    let (session, mut views) = SessionContext::join(&config, api, engine, None)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to join meeting");
            e
        })?;

    info!("Meeting Session running - press Ctrl+C to leave");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown signal received, leaving meeting...");
                break;
            }
            update = views.recv() => {
                let Some(update) = update else {
                    warn!("View channel closed");
                    break;
                };

                info!(
                    sequence = update.sequence,
                    visible = ?update.model.visible_ids(),
                    page_index = update.model.page_index,
                    can_go_prev = update.model.can_go_prev,
                    can_go_next = update.model.can_go_next,
                    muted = update.model.is_muted,
                    camera_on = update.model.is_camera_on,
                    capture_mode = %update.model.capture_mode,
                    audio = update.model.audio_state.as_str(),
                    video = update.model.video_state.as_str(),
                    "View update"
                );
                for notice in &update.notices {
                    info!(level = ?notice.level, message = %notice.message, "Notice");
                }
                if let Some(reason) = update.leave {
                    info!(reason = ?reason, "Session ended");
                    break;
                }
            }
        }
    }

    drop(views);
    session.leave().await;

    info!("Meeting Session shutdown complete");
    Ok(())
}

/// Media engine stand-in that logs every call.
///
/// Reports audio and video as started as soon as the session starts.
struct LoggingMediaEngine;

impl MediaEngine for LoggingMediaEngine {
    fn start(
        &self,
        configuration: &MeetingSessionConfiguration,
        events: SessionCoordinatorHandle,
    ) -> bool {
        info!(configuration = ?configuration, "engine: start");
        for event in [
            SessionEvent::AudioSessionStartedConnecting {
                reconnecting: false,
            },
            SessionEvent::AudioSessionStarted {
                reconnecting: false,
            },
            SessionEvent::VideoSessionStartedConnecting,
            SessionEvent::VideoSessionStarted(SessionStatusCode::Ok),
        ] {
            if let Err(e) = events.post_event(event) {
                warn!(error = %e, "engine: failed to post event");
            }
        }
        true
    }

    fn stop(&self) {
        info!("engine: stop");
    }

    fn start_remote_video(&self) {
        info!("engine: start_remote_video");
    }

    fn stop_remote_video(&self) {
        info!("engine: stop_remote_video");
    }

    fn start_local_video(&self, source: LocalVideoSource) -> bool {
        info!(source = ?source, "engine: start_local_video");
        true
    }

    fn stop_local_video(&self) {
        info!("engine: stop_local_video");
    }

    fn pause_remote_video_tile(&self, tile_id: TileId) {
        debug!(tile_id, "engine: pause_remote_video_tile");
    }

    fn resume_remote_video_tile(&self, tile_id: TileId) {
        debug!(tile_id, "engine: resume_remote_video_tile");
    }

    fn unbind_video_view(&self, tile_id: TileId) {
        debug!(tile_id, "engine: unbind_video_view");
    }

    fn realtime_local_mute(&self) -> bool {
        info!("engine: realtime_local_mute");
        true
    }

    fn realtime_local_unmute(&self) -> bool {
        info!("engine: realtime_local_unmute");
        true
    }

    fn set_voice_focus_enabled(&self, enabled: bool) -> bool {
        info!(enabled, "engine: set_voice_focus_enabled");
        true
    }

    fn choose_audio_device(&self, device: &MediaDevice) -> bool {
        info!(label = %device.label, "engine: choose_audio_device");
        true
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable because
/// without signal handlers, we cannot leave the meeting cleanly.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
