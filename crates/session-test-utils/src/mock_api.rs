//! Mock join/leave service.
//!
//! # Example
//!
//! ```rust,ignore
//! use session_test_utils::{sample_join_response, MockMeetingApi};
//!
//! let api = MockMeetingApi::builder()
//!     .join_response(sample_join_response("m-1", "a-1"))
//!     .fail_leave(500)
//!     .build();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use meeting_session::api::{JoinMeetingResponse, MeetingApi};
use meeting_session::errors::ApiError;

use crate::fixtures::sample_join_response;

/// Mock `MeetingApi` with canned responses and call counters.
#[derive(Debug)]
pub struct MockMeetingApi {
    join_result: Result<JoinMeetingResponse, u16>,
    leave_status: Option<u16>,
    join_calls: AtomicUsize,
    leave_calls: AtomicUsize,
    /// `(meeting_id, attendee_name)` of each join, in order.
    joined: Mutex<Vec<(String, String)>>,
    /// Meeting id of each leave, in order.
    left: Mutex<Vec<String>>,
}

impl MockMeetingApi {
    /// Create a new `MockMeetingApi` builder.
    #[must_use]
    pub fn builder() -> MockMeetingApiBuilder {
        MockMeetingApiBuilder::default()
    }

    /// Accepts join and leave with a sample response.
    #[must_use]
    pub fn accepting() -> Arc<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn join_calls(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn leave_calls(&self) -> usize {
        self.leave_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn joined(&self) -> Vec<(String, String)> {
        self.joined.lock().unwrap().clone()
    }

    #[must_use]
    pub fn left(&self) -> Vec<String> {
        self.left.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MeetingApi for MockMeetingApi {
    async fn join(
        &self,
        meeting_id: &str,
        attendee_name: &str,
    ) -> Result<JoinMeetingResponse, ApiError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        self.joined
            .lock()
            .unwrap()
            .push((meeting_id.to_string(), attendee_name.to_string()));
        self.join_result.clone().map_err(ApiError::Status)
    }

    async fn leave(&self, meeting_id: &str) -> Result<(), ApiError> {
        self.leave_calls.fetch_add(1, Ordering::SeqCst);
        self.left.lock().unwrap().push(meeting_id.to_string());
        match self.leave_status {
            Some(status) => Err(ApiError::Status(status)),
            None => Ok(()),
        }
    }
}

/// Builder for `MockMeetingApi` configuration.
#[derive(Debug)]
pub struct MockMeetingApiBuilder {
    join_result: Result<JoinMeetingResponse, u16>,
    leave_status: Option<u16>,
}

impl Default for MockMeetingApiBuilder {
    fn default() -> Self {
        Self {
            join_result: Ok(sample_join_response("meeting-123", "attendee-456")),
            leave_status: None,
        }
    }
}

impl MockMeetingApiBuilder {
    /// Respond to join with `response`.
    #[must_use]
    pub fn join_response(mut self, response: JoinMeetingResponse) -> Self {
        self.join_result = Ok(response);
        self
    }

    /// Fail join with an HTTP status.
    #[must_use]
    pub fn fail_join(mut self, status: u16) -> Self {
        self.join_result = Err(status);
        self
    }

    /// Fail leave with an HTTP status.
    #[must_use]
    pub fn fail_leave(mut self, status: u16) -> Self {
        self.leave_status = Some(status);
        self
    }

    /// Build the mock.
    #[must_use]
    pub fn build(self) -> Arc<MockMeetingApi> {
        Arc::new(MockMeetingApi {
            join_result: self.join_result,
            leave_status: self.leave_status,
            join_calls: AtomicUsize::new(0),
            leave_calls: AtomicUsize::new(0),
            joined: Mutex::new(Vec::new()),
            left: Mutex::new(Vec::new()),
        })
    }
}
