//! Video tile model.
//!
//! A tile is one rendering slot bound to a participant stream. Tiles are
//! created on the engine's tile-added callback and destroyed on tile-removed;
//! their identity is the engine-assigned tile id.
//!
//! # Modules
//!
//! - [`registry`] - `TileRegistry`, the owner of every known tile

pub mod registry;

pub use registry::TileRegistry;

/// Engine-assigned tile identifier.
pub type TileId = u32;

/// Which stream a tile renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// The local camera preview (at most one).
    Local,
    /// A remote participant's camera.
    Remote,
    /// Screen or content share.
    Content,
}

impl TileKind {
    /// Returns the kind as a string for log fields and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TileKind::Local => "local",
            TileKind::Remote => "remote",
            TileKind::Content => "content",
        }
    }
}

/// Pause state as reported by the media engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseState {
    /// Frames are flowing.
    #[default]
    Playing,
    /// Paused on request from this client.
    PausedByUser,
    /// Paused by the engine because the downlink is poor.
    PausedByPoorConnection,
}

/// Tile state carried by the engine's tile callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileState {
    pub tile_id: TileId,
    pub attendee_id: String,
    pub is_local_tile: bool,
    pub is_content: bool,
    pub pause_state: PauseState,
    pub content_width: u32,
    pub content_height: u32,
}

impl TileState {
    /// Classify the tile. Content share wins over the local flag.
    #[must_use]
    pub fn kind(&self) -> TileKind {
        if self.is_content {
            TileKind::Content
        } else if self.is_local_tile {
            TileKind::Local
        } else {
            TileKind::Remote
        }
    }
}

/// A tile tracked by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    pub attendee_id: String,
    pub kind: TileKind,
    pub pause_state: PauseState,
    pub content_width: u32,
    pub content_height: u32,
}

impl From<&TileState> for Tile {
    fn from(state: &TileState) -> Self {
        Self {
            id: state.tile_id,
            attendee_id: state.attendee_id.clone(),
            kind: state.kind(),
            pause_state: state.pause_state,
            content_width: state.content_width,
            content_height: state.content_height,
        }
    }
}

/// Roster entry mapping an attendee to a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub attendee_id: String,
    pub display_name: String,
}
