//! Meeting Session Library
//!
//! State coordinator for one client-side video meeting session. It sits
//! between a media engine that reports tile, speaker and stream lifecycle
//! callbacks from its own threads, and a UI that issues commands and renders
//! a paginated grid of video tiles.
//!
//! # Architecture
//!
//! ```text
//! SessionContext (owned by the process lifecycle)
//! ├── MeetingApi (HTTP join/leave, outside the coordinator)
//! └── SessionCoordinator (one actor per session)
//!     └── SessionState
//!         ├── TileRegistry
//!         ├── Pagination + active-speaker reorder + diff
//!         └── CapturePipelineSelector
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single writer**: one actor mailbox serializes callbacks and commands
//! - **One emission per message**: each processed message yields at most one
//!   `ViewUpdate`, carrying the new page and the diff from the previous one
//! - **Ordered teardown**: unbind tiles, stop local capture, stop remote video,
//!   stop the session
//!
//! # Modules
//!
//! - [`actors`] - Coordinator actor, messages and mailbox monitoring
//! - [`api`] - Join/leave HTTP client and response models
//! - [`capture`] - Capture pipeline mode selection
//! - [`config`] - Configuration from environment
//! - [`context`] - `SessionContext`, the owner of a joined session
//! - [`engine`] - Media engine and camera seams
//! - [`errors`] - Error types
//! - [`layout`] - Reordering, pagination and diffing
//! - [`observability`] - Metrics
//! - [`tiles`] - Tile model and registry
//! - [`view`] - View model handed to the UI

pub mod actors;
pub mod api;
pub mod capture;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod layout;
pub mod observability;
pub mod tiles;
pub mod view;

pub use actors::{CoordinatorOptions, SessionCoordinator, SessionCoordinatorHandle, SessionEvent};
pub use context::SessionContext;
pub use errors::{ApiError, SessionError};
pub use view::{ViewModel, ViewUpdate};
