//! Pre-configured test data fixtures for session testing.
//!
//! Provides builders and test data for:
//! - Engine tile states (local, remote, content share)
//! - Roster entries
//! - Join service responses, as models and as raw JSON

use meeting_session::actors::SessionEvent;
use meeting_session::api::{
    AttendeeInfo, AttendeeResponse, JoinInfo, JoinMeetingResponse, MediaPlacement, MeetingInfo,
    MeetingResponse,
};
use meeting_session::engine::{MediaDevice, MediaDeviceKind};
use meeting_session::tiles::{PauseState, RosterEntry, TileId, TileState};

/// Tile state builder.
#[derive(Debug, Clone)]
pub struct TestTile {
    state: TileState,
}

impl TestTile {
    /// Remote camera tile owned by `attendee-{id}`.
    #[must_use]
    pub fn remote(tile_id: TileId) -> Self {
        Self {
            state: TileState {
                tile_id,
                attendee_id: format!("attendee-{tile_id}"),
                is_local_tile: false,
                is_content: false,
                pause_state: PauseState::Playing,
                content_width: 640,
                content_height: 480,
            },
        }
    }

    /// Local camera tile.
    #[must_use]
    pub fn local(tile_id: TileId) -> Self {
        let mut tile = Self::remote(tile_id);
        tile.state.attendee_id = "attendee-self".to_string();
        tile.state.is_local_tile = true;
        tile
    }

    /// Content share tile.
    #[must_use]
    pub fn content(tile_id: TileId) -> Self {
        let mut tile = Self::remote(tile_id);
        tile.state.is_content = true;
        tile.state.content_width = 1920;
        tile.state.content_height = 1080;
        tile
    }

    #[must_use]
    pub fn with_attendee(mut self, attendee_id: impl Into<String>) -> Self {
        self.state.attendee_id = attendee_id.into();
        self
    }

    #[must_use]
    pub fn with_pause_state(mut self, pause_state: PauseState) -> Self {
        self.state.pause_state = pause_state;
        self
    }

    #[must_use]
    pub fn build(self) -> TileState {
        self.state
    }

    /// `TileAdded` event for this tile.
    #[must_use]
    pub fn added(self) -> SessionEvent {
        SessionEvent::TileAdded(self.state)
    }

    /// `TileRemoved` event for this tile.
    #[must_use]
    pub fn removed(self) -> SessionEvent {
        SessionEvent::TileRemoved(self.state)
    }
}

/// Roster entry for `attendee_id`.
#[must_use]
pub fn roster_entry(attendee_id: impl Into<String>, display_name: impl Into<String>) -> RosterEntry {
    RosterEntry {
        attendee_id: attendee_id.into(),
        display_name: display_name.into(),
    }
}

/// Named roster entries for `attendee-{id}` of each id.
#[must_use]
pub fn roster_for(tile_ids: &[TileId]) -> Vec<RosterEntry> {
    tile_ids
        .iter()
        .map(|id| roster_entry(format!("attendee-{id}"), format!("Attendee {id}")))
        .collect()
}

/// Audio device with the given label.
#[must_use]
pub fn audio_device(label: impl Into<String>, kind: MediaDeviceKind) -> MediaDevice {
    MediaDevice {
        label: label.into(),
        kind,
    }
}

/// Parsed join response for `meeting_id` and `attendee_id`.
#[must_use]
pub fn sample_join_response(meeting_id: &str, attendee_id: &str) -> JoinMeetingResponse {
    JoinMeetingResponse {
        join_info: JoinInfo {
            meeting_response: MeetingResponse {
                meeting: MeetingInfo {
                    meeting_id: meeting_id.to_string(),
                    external_meeting_id: Some("standup".to_string()),
                    media_region: Some("us-east-1".to_string()),
                    media_placement: MediaPlacement {
                        audio_host_url: "audio.example.com:3478".to_string(),
                        audio_fallback_url: Some(format!(
                            "wss://audio.example.com:443/calls/{meeting_id}"
                        )),
                        signaling_url: format!("wss://signal.example.com/control/{meeting_id}"),
                        turn_control_url: "https://turn.example.com/v2/turn_sessions".to_string(),
                    },
                },
            },
            attendee_response: AttendeeResponse {
                attendee: AttendeeInfo {
                    attendee_id: attendee_id.to_string(),
                    external_user_id: Some("alice".to_string()),
                    join_token: "join-token".to_string(),
                },
            },
        },
    }
}

/// Raw join response body, as the service sends it.
#[must_use]
pub fn sample_join_body(meeting_id: &str, attendee_id: &str) -> serde_json::Value {
    serde_json::json!({
        "JoinInfo": {
            "Title": "standup",
            "Meeting": {
                "Meeting": {
                    "MeetingId": meeting_id,
                    "ExternalMeetingId": "standup",
                    "MediaRegion": "us-east-1",
                    "MediaPlacement": {
                        "AudioHostUrl": "audio.example.com:3478",
                        "AudioFallbackUrl": format!("wss://audio.example.com:443/calls/{meeting_id}"),
                        "SignalingUrl": format!("wss://signal.example.com/control/{meeting_id}"),
                        "TurnControlUrl": "https://turn.example.com/v2/turn_sessions"
                    }
                }
            },
            "Attendee": {
                "Attendee": {
                    "ExternalUserId": "alice",
                    "AttendeeId": attendee_id,
                    "JoinToken": "join-token"
                }
            }
        }
    })
}
