//! Join/leave service.
//!
//! The meeting service is a plain HTTP endpoint pair:
//!
//! - `POST {base}/join` with `{"title": <meeting id>, "name": <attendee name>}`
//! - `POST {base}/leave` with `{"title": <meeting id>}`
//!
//! Only a 200 counts as success. These calls never run on the coordinator;
//! their results are handed to it already parsed.

pub mod client;

pub use client::MeetingApiClient;

use crate::errors::ApiError;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Join request body.
#[derive(Debug, Clone, Serialize)]
pub struct JoinRequest<'a> {
    pub title: &'a str,
    pub name: &'a str,
}

/// Leave request body.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveRequest<'a> {
    pub title: &'a str,
}

/// Join response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinMeetingResponse {
    #[serde(rename = "JoinInfo")]
    pub join_info: JoinInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinInfo {
    #[serde(rename = "Meeting")]
    pub meeting_response: MeetingResponse,

    #[serde(rename = "Attendee")]
    pub attendee_response: AttendeeResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MeetingResponse {
    #[serde(rename = "Meeting")]
    pub meeting: MeetingInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttendeeResponse {
    #[serde(rename = "Attendee")]
    pub attendee: AttendeeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeetingInfo {
    pub meeting_id: String,

    #[serde(default)]
    pub external_meeting_id: Option<String>,

    #[serde(default)]
    pub media_region: Option<String>,

    pub media_placement: MediaPlacement,
}

/// Media endpoints assigned to the meeting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaPlacement {
    pub audio_host_url: String,

    #[serde(default)]
    pub audio_fallback_url: Option<String>,

    pub signaling_url: String,

    pub turn_control_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendeeInfo {
    pub attendee_id: String,

    #[serde(default)]
    pub external_user_id: Option<String>,

    pub join_token: String,
}

/// Everything the media engine needs to start a joined meeting.
#[derive(Clone, PartialEq, Eq)]
pub struct MeetingSessionConfiguration {
    pub meeting_id: String,
    pub external_meeting_id: Option<String>,
    pub attendee_id: String,
    pub external_user_id: Option<String>,
    pub join_token: String,
    pub audio_host_url: String,
    pub audio_fallback_url: Option<String>,
    pub signaling_url: String,
    pub turn_control_url: String,
    pub active_speaker_interval: Duration,
}

impl std::fmt::Debug for MeetingSessionConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeetingSessionConfiguration")
            .field("meeting_id", &self.meeting_id)
            .field("attendee_id", &self.attendee_id)
            .field("join_token", &"[REDACTED]")
            .field("audio_host_url", &self.audio_host_url)
            .field("signaling_url", &self.signaling_url)
            .field("turn_control_url", &self.turn_control_url)
            .field("active_speaker_interval", &self.active_speaker_interval)
            .finish_non_exhaustive()
    }
}

impl MeetingSessionConfiguration {
    #[must_use]
    pub fn from_join_response(
        response: JoinMeetingResponse,
        active_speaker_interval: Duration,
    ) -> Self {
        let meeting = response.join_info.meeting_response.meeting;
        let attendee = response.join_info.attendee_response.attendee;
        Self {
            meeting_id: meeting.meeting_id,
            external_meeting_id: meeting.external_meeting_id,
            attendee_id: attendee.attendee_id,
            external_user_id: attendee.external_user_id,
            join_token: attendee.join_token,
            audio_host_url: meeting.media_placement.audio_host_url,
            audio_fallback_url: meeting.media_placement.audio_fallback_url,
            signaling_url: meeting.media_placement.signaling_url,
            turn_control_url: meeting.media_placement.turn_control_url,
            active_speaker_interval,
        }
    }
}

/// Join/leave operations (enables mocking).
#[async_trait::async_trait]
pub trait MeetingApi: Send + Sync {
    /// Join `meeting_id` as `attendee_name`.
    async fn join(
        &self,
        meeting_id: &str,
        attendee_name: &str,
    ) -> Result<JoinMeetingResponse, ApiError>;

    /// Leave `meeting_id`.
    async fn leave(&self, meeting_id: &str) -> Result<(), ApiError>;
}
