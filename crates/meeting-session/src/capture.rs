//! Local capture pipeline selection.
//!
//! Exactly one mode is active at a time. The two filter modes exclude each
//! other: asking for one while the other runs is rejected, not overridden.
//!
//! | requested \ current | RawCamera | CpuFilter | GpuFilter |
//! |---------------------|-----------|-----------|-----------|
//! | RawCamera           | no-op     | switch    | switch    |
//! | CpuFilter           | switch    | no-op     | reject    |
//! | GpuFilter           | switch    | reject    | no-op     |
//!
//! Filters also need the app-owned camera; without it any filter request is
//! rejected with [`CaptureConflict::CustomSourceRequired`].

use crate::engine::{LocalVideoSource, VideoFilter};

use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Local video processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePipelineMode {
    #[default]
    RawCamera,
    CpuFilter,
    GpuFilter,
}

impl CapturePipelineMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CapturePipelineMode::RawCamera => "raw_camera",
            CapturePipelineMode::CpuFilter => "cpu_filter",
            CapturePipelineMode::GpuFilter => "gpu_filter",
        }
    }

    #[must_use]
    pub const fn filter(&self) -> Option<VideoFilter> {
        match self {
            CapturePipelineMode::RawCamera => None,
            CapturePipelineMode::CpuFilter => Some(VideoFilter::Cpu),
            CapturePipelineMode::GpuFilter => Some(VideoFilter::Gpu),
        }
    }
}

impl fmt::Display for CapturePipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePipelineMode::RawCamera => write!(f, "raw camera"),
            CapturePipelineMode::CpuFilter => write!(f, "CPU filter"),
            CapturePipelineMode::GpuFilter => write!(f, "GPU filter"),
        }
    }
}

/// Why a capture request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaptureConflict {
    #[error("Cannot enable the {requested} while the {active} is enabled")]
    FilterAlreadyActive {
        active: CapturePipelineMode,
        requested: CapturePipelineMode,
    },

    #[error("This action requires the custom camera capture source")]
    CustomSourceRequired,
}

/// Result of an accepted selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTransition {
    /// Requested mode was already active.
    Unchanged,
    Switched {
        from: CapturePipelineMode,
        to: CapturePipelineMode,
    },
}

/// Holds the active capture mode and enforces legal transitions.
#[derive(Debug, Clone)]
pub struct CapturePipelineSelector {
    mode: CapturePipelineMode,
    custom_source: bool,
}

impl CapturePipelineSelector {
    #[must_use]
    pub fn new(custom_source: bool) -> Self {
        Self {
            mode: CapturePipelineMode::RawCamera,
            custom_source,
        }
    }

    #[must_use]
    pub fn mode(&self) -> CapturePipelineMode {
        self.mode
    }

    #[must_use]
    pub fn uses_custom_source(&self) -> bool {
        self.custom_source
    }

    /// Request a new mode.
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureConflict`] and leaves the mode unchanged when the
    /// other filter is active or no custom camera source is in use.
    pub fn select(
        &mut self,
        requested: CapturePipelineMode,
    ) -> Result<CaptureTransition, CaptureConflict> {
        if requested == self.mode {
            return Ok(CaptureTransition::Unchanged);
        }

        if requested.filter().is_some() && !self.custom_source {
            warn!(
                target: "session.capture",
                requested = requested.as_str(),
                "Cannot select filter without custom camera capture source"
            );
            return Err(CaptureConflict::CustomSourceRequired);
        }

        match (self.mode, requested) {
            (CapturePipelineMode::CpuFilter, CapturePipelineMode::GpuFilter)
            | (CapturePipelineMode::GpuFilter, CapturePipelineMode::CpuFilter) => {
                warn!(
                    target: "session.capture",
                    active = self.mode.as_str(),
                    requested = requested.as_str(),
                    "Cannot select filter when other filter is enabled"
                );
                Err(CaptureConflict::FilterAlreadyActive {
                    active: self.mode,
                    requested,
                })
            }
            (from, to) => {
                debug!(
                    target: "session.capture",
                    from = from.as_str(),
                    to = to.as_str(),
                    "Capture pipeline mode switched"
                );
                self.mode = to;
                Ok(CaptureTransition::Switched { from, to })
            }
        }
    }

    /// What to hand the engine when local video starts in the current mode.
    #[must_use]
    pub fn local_video_source(&self) -> LocalVideoSource {
        if !self.custom_source {
            return LocalVideoSource::EngineCamera;
        }
        match self.mode.filter() {
            Some(filter) => LocalVideoSource::Filtered(filter),
            None => LocalVideoSource::CustomCamera,
        }
    }
}
