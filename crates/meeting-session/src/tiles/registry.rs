//! `TileRegistry` - owns every tile the session knows about.
//!
//! The registry keeps three slots:
//! - one optional local tile (adding a new local tile replaces the old one)
//! - an ordered list of remote tiles (order is the pagination order)
//! - an ordered list of content-share tiles
//!
//! Tile ids are unique across all three slots. Adding a tile whose id is
//! already present, under any kind, is a no-op, so duplicate add
//! notifications from the engine are harmless. Removing an
//! unknown id is also a no-op; callbacks routinely race user teardown.

use super::{PauseState, Tile, TileId, TileKind};

use std::collections::HashSet;
use tracing::debug;

/// Owner of the local, remote and content tiles.
#[derive(Debug, Default, Clone)]
pub struct TileRegistry {
    local: Option<Tile>,
    remote: Vec<Tile>,
    content: Vec<Tile>,
}

impl TileRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tile to the slot matching its kind.
    ///
    /// Returns `true` if the registry changed.
    pub fn add(&mut self, tile: Tile) -> bool {
        match tile.kind {
            TileKind::Local => self.add_local(tile),
            TileKind::Remote => self.add_remote(tile),
            TileKind::Content => self.add_content(tile),
        }
    }

    /// Install the local tile, replacing any previous one.
    pub fn add_local(&mut self, mut tile: Tile) -> bool {
        tile.kind = TileKind::Local;
        if self.rejects_duplicate(&tile) {
            return false;
        }
        if let Some(previous) = self.local.replace(tile) {
            debug!(
                target: "session.tiles",
                previous_tile_id = previous.id,
                "Local tile replaced"
            );
        }
        true
    }

    /// Append a remote tile unless one with the same id exists.
    pub fn add_remote(&mut self, mut tile: Tile) -> bool {
        tile.kind = TileKind::Remote;
        if self.rejects_duplicate(&tile) {
            return false;
        }
        self.remote.push(tile);
        true
    }

    /// Append a content-share tile unless one with the same id exists.
    pub fn add_content(&mut self, mut tile: Tile) -> bool {
        tile.kind = TileKind::Content;
        if self.rejects_duplicate(&tile) {
            return false;
        }
        self.content.push(tile);
        true
    }

    fn rejects_duplicate(&self, tile: &Tile) -> bool {
        let Some(existing) = self.get(tile.id) else {
            return false;
        };
        if existing.kind != tile.kind {
            debug!(
                target: "session.tiles",
                tile_id = tile.id,
                existing_kind = existing.kind.as_str(),
                requested_kind = tile.kind.as_str(),
                "Tile id already registered under another kind"
            );
        }
        true
    }

    #[must_use]
    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    /// Remove the tile with the given id, whatever its kind.
    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        if self.local.as_ref().is_some_and(|t| t.id == id) {
            return self.local.take();
        }
        if let Some(pos) = self.remote.iter().position(|t| t.id == id) {
            return Some(self.remote.remove(pos));
        }
        if let Some(pos) = self.content.iter().position(|t| t.id == id) {
            return Some(self.content.remove(pos));
        }
        None
    }

    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.local
            .iter()
            .chain(self.remote.iter())
            .chain(self.content.iter())
            .find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.local
            .iter_mut()
            .chain(self.remote.iter_mut())
            .chain(self.content.iter_mut())
            .find(|t| t.id == id)
    }

    /// Record an engine pause/resume. Returns `false` for unknown ids.
    pub fn set_pause_state(&mut self, id: TileId, pause_state: PauseState) -> bool {
        match self.get_mut(id) {
            Some(tile) => {
                tile.pause_state = pause_state;
                true
            }
            None => false,
        }
    }

    /// Record a change of the stream's content size. Returns `false` for unknown ids.
    pub fn set_content_size(&mut self, id: TileId, width: u32, height: u32) -> bool {
        match self.get_mut(id) {
            Some(tile) => {
                tile.content_width = width;
                tile.content_height = height;
                true
            }
            None => false,
        }
    }

    /// Reorder remote tiles so active speakers come first.
    pub fn reorder_remote(&mut self, active_attendees: &HashSet<String>) {
        crate::layout::reorder::partition_by_active_speakers(&mut self.remote, active_attendees);
    }

    #[must_use]
    pub fn local(&self) -> Option<&Tile> {
        self.local.as_ref()
    }

    #[must_use]
    pub fn has_local(&self) -> bool {
        self.local.is_some()
    }

    #[must_use]
    pub fn remote(&self) -> &[Tile] {
        &self.remote
    }

    #[must_use]
    pub fn remote_count(&self) -> usize {
        self.remote.len()
    }

    #[must_use]
    pub fn content(&self) -> &[Tile] {
        &self.content
    }

    /// Ids of every tracked tile: local first, then remote, then content.
    #[must_use]
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.local
            .iter()
            .chain(self.remote.iter())
            .chain(self.content.iter())
            .map(|t| t.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.local.is_some()) + self.remote.len() + self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every tile (session teardown).
    pub fn clear(&mut self) {
        self.local = None;
        self.remote.clear();
        self.content.clear();
    }
}
