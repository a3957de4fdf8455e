//! Meeting session configuration.
//!
//! Configuration is loaded from environment variables. The attendee name is
//! redacted in Debug output.

use rand::Rng;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default meeting title used when none is given.
pub const DEFAULT_MEETING_ID: &str = "testId";

/// Default timeout for join/leave requests.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Default engine active-speaker detection interval.
pub const DEFAULT_ACTIVE_SPEAKER_INTERVAL_MS: u64 = 1000;

/// Default coordinator mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 500;

/// Default capacity of the view update channel.
pub const DEFAULT_VIEW_CHANNEL_CAPACITY: usize = 64;

/// Alphabet for generated attendee names.
const ATTENDEE_NAME_ALPHABET: &[u8] = b"0123456789qwertyuiopasdfghjklzxcvbnm";

/// Length of generated attendee names.
const ATTENDEE_NAME_LENGTH: usize = 8;

/// Meeting session configuration.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the join/leave service.
    pub meeting_url: String,

    /// Meeting title sent to the join/leave service.
    pub meeting_id: String,

    /// Display name for the local attendee.
    pub attendee_name: String,

    /// Timeout for join/leave requests.
    pub http_timeout_seconds: u64,

    /// Engine active-speaker detection interval (must be > 0).
    pub active_speaker_interval_ms: u64,

    /// Whether the app owns the camera (required for filters and flashlight).
    pub use_custom_camera_source: bool,

    pub mailbox_capacity: usize,

    pub view_channel_capacity: usize,

    /// Prometheus listener address. Metrics export is off when unset.
    pub metrics_bind_address: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("meeting_url", &self.meeting_url)
            .field("meeting_id", &self.meeting_id)
            .field("attendee_name", &"[REDACTED]")
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field(
                "active_speaker_interval_ms",
                &self.active_speaker_interval_ms,
            )
            .field("use_custom_camera_source", &self.use_custom_camera_source)
            .field("mailbox_capacity", &self.mailbox_capacity)
            .field("view_channel_capacity", &self.view_channel_capacity)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let meeting_url = vars
            .get("MEETING_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("MEETING_URL".to_string()))?
            .clone();

        let meeting_id = vars
            .get("MEETING_ID")
            .filter(|id| !id.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_MEETING_ID.to_string());

        let attendee_name = vars
            .get("MEETING_ATTENDEE_NAME")
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(random_attendee_name);

        let http_timeout_seconds = vars
            .get("MEETING_HTTP_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

        let active_speaker_interval_ms = match vars.get("MEETING_ACTIVE_SPEAKER_INTERVAL_MS") {
            Some(raw) => {
                let value: u64 = raw.parse().map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "MEETING_ACTIVE_SPEAKER_INTERVAL_MS must be an integer: {e}"
                    ))
                })?;
                if value == 0 {
                    return Err(ConfigError::InvalidValue(
                        "MEETING_ACTIVE_SPEAKER_INTERVAL_MS must be greater than 0".to_string(),
                    ));
                }
                value
            }
            None => DEFAULT_ACTIVE_SPEAKER_INTERVAL_MS,
        };

        let use_custom_camera_source = match vars.get("MEETING_USE_CUSTOM_CAMERA_SOURCE") {
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "MEETING_USE_CUSTOM_CAMERA_SOURCE must be true or false, got {raw}"
                ))
            })?,
            None => true,
        };

        let mailbox_capacity = vars
            .get("MEETING_MAILBOX_CAPACITY")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAILBOX_CAPACITY);

        let view_channel_capacity = vars
            .get("MEETING_VIEW_CHANNEL_CAPACITY")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_VIEW_CHANNEL_CAPACITY);

        let metrics_bind_address = vars
            .get("MEETING_METRICS_BIND_ADDRESS")
            .filter(|addr| !addr.is_empty())
            .cloned();

        Ok(Config {
            meeting_url,
            meeting_id,
            attendee_name,
            http_timeout_seconds,
            active_speaker_interval_ms,
            use_custom_camera_source,
            mailbox_capacity,
            view_channel_capacity,
            metrics_bind_address,
        })
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    #[must_use]
    pub fn active_speaker_interval(&self) -> Duration {
        Duration::from_millis(self.active_speaker_interval_ms)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Generate an attendee name for users who did not pick one.
#[must_use]
pub fn random_attendee_name() -> String {
    let mut rng = rand::thread_rng();
    (0..ATTENDEE_NAME_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..ATTENDEE_NAME_ALPHABET.len());
            ATTENDEE_NAME_ALPHABET.get(idx).copied().map_or('0', char::from)
        })
        .collect()
}
