//! HTTP client for the join/leave service.

use super::{JoinMeetingResponse, JoinRequest, LeaveRequest, MeetingApi};
use crate::errors::ApiError;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Default connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP client for the meeting join/leave endpoints.
#[derive(Clone)]
pub struct MeetingApiClient {
    client: Client,

    /// Base URL, always ending in `/`.
    base_url: String,
}

impl MeetingApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "session.api", error = %e, "Failed to build HTTP client");
                ApiError::Transport(e.to_string())
            })?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "session.api", error = %e, path, "Meeting service request failed");
                ApiError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(response)
        } else {
            warn!(target: "session.api", status = %status, path, "Unexpected meeting service response");
            Err(ApiError::Status(status.as_u16()))
        }
    }
}

#[async_trait::async_trait]
impl MeetingApi for MeetingApiClient {
    #[instrument(skip_all, fields(meeting_id = %meeting_id))]
    async fn join(
        &self,
        meeting_id: &str,
        attendee_name: &str,
    ) -> Result<JoinMeetingResponse, ApiError> {
        let response = self
            .post(
                "join",
                &JoinRequest {
                    title: meeting_id,
                    name: attendee_name,
                },
            )
            .await?;

        let body = response.text().await.map_err(|e| {
            warn!(target: "session.api", error = %e, "Failed to read join response");
            ApiError::Transport(e.to_string())
        })?;

        if body.trim().is_empty() {
            return Err(ApiError::MalformedResponse("empty body".to_string()));
        }

        let parsed = serde_json::from_str(&body).map_err(|e| {
            error!(target: "session.api", error = %e, "Failed to parse join response");
            ApiError::MalformedResponse(e.to_string())
        })?;

        debug!(target: "session.api", "Joined meeting");
        Ok(parsed)
    }

    #[instrument(skip_all, fields(meeting_id = %meeting_id))]
    async fn leave(&self, meeting_id: &str) -> Result<(), ApiError> {
        self.post("leave", &LeaveRequest { title: meeting_id })
            .await?;
        debug!(target: "session.api", "Left meeting");
        Ok(())
    }
}

fn normalize_base_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}
