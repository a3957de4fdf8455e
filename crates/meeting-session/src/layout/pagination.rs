//! Page window over the remote tiles.
//!
//! A page has [`PAGE_SIZE`] slots. When a local tile exists it takes slot 0 of
//! page 0 and every page holds `PAGE_SIZE - 1` remote tiles; otherwise every
//! page holds `PAGE_SIZE` remote tiles.
//!
//! | local tile | remote capacity per page |
//! |------------|--------------------------|
//! | present    | 3                        |
//! | absent     | 4                        |

use crate::tiles::{Tile, TileRegistry};

use std::ops::Range;

/// Slots per page, local tile included.
pub const PAGE_SIZE: usize = 4;

/// Current page index plus the boundary rules around it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    page_index: usize,
}

impl Pagination {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Remote slots per page.
    #[must_use]
    pub const fn remote_capacity(local_present: bool) -> usize {
        if local_present {
            PAGE_SIZE - 1
        } else {
            PAGE_SIZE
        }
    }

    /// Number of pages needed for `remote_count` remote tiles (0 when there are none).
    #[must_use]
    pub fn page_count(remote_count: usize, local_present: bool) -> usize {
        remote_count.div_ceil(Self::remote_capacity(local_present))
    }

    #[must_use]
    pub fn can_go_prev(&self) -> bool {
        self.page_index > 0
    }

    #[must_use]
    pub fn can_go_next(&self, remote_count: usize, local_present: bool) -> bool {
        match Self::page_count(remote_count, local_present).checked_sub(1) {
            Some(last_page) => self.page_index < last_page,
            None => false,
        }
    }

    /// Indices into the remote tile list visible on the current page.
    ///
    /// Empty when the page lies beyond the last remote tile.
    #[must_use]
    pub fn remote_window(&self, remote_count: usize, local_present: bool) -> Range<usize> {
        let capacity = Self::remote_capacity(local_present);
        let start = self.page_index.saturating_mul(capacity).min(remote_count);
        let end = start.saturating_add(capacity).min(remote_count);
        start..end
    }

    #[must_use]
    pub fn current_page_remote_count(&self, remote_count: usize, local_present: bool) -> usize {
        self.remote_window(remote_count, local_present).len()
    }

    /// Advance one page if possible. Returns whether the index moved.
    pub fn next_page(&mut self, remote_count: usize, local_present: bool) -> bool {
        if self.can_go_next(remote_count, local_present) {
            self.page_index += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page if possible. Returns whether the index moved.
    pub fn prev_page(&mut self) -> bool {
        if self.can_go_prev() {
            self.page_index -= 1;
            true
        } else {
            false
        }
    }

    /// Step back while the current page is empty and an earlier page exists.
    ///
    /// Runs at most `page_index` iterations. Returns how many pages it stepped.
    pub fn revalidate(&mut self, remote_count: usize, local_present: bool) -> usize {
        let mut steps = 0;
        while self.can_go_prev() && self.current_page_remote_count(remote_count, local_present) == 0
        {
            self.page_index -= 1;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.page_index = 0;
    }

    /// Materialize the tiles on the current page: local tile first (page 0 only),
    /// then the remote window.
    #[must_use]
    pub fn visible_tiles(&self, registry: &TileRegistry) -> Vec<Tile> {
        let local_present = registry.has_local();
        let window = self.remote_window(registry.remote_count(), local_present);

        let local = registry.local().filter(|_| self.page_index == 0);
        local
            .into_iter()
            .chain(
                registry
                    .remote()
                    .iter()
                    .skip(window.start)
                    .take(window.len()),
            )
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::tiles::{PauseState, TileKind};

    fn tile(id: u32, kind: TileKind) -> Tile {
        Tile {
            id,
            attendee_id: format!("attendee-{id}"),
            kind,
            pause_state: PauseState::Playing,
            content_width: 0,
            content_height: 0,
        }
    }

    fn registry(local: bool, remote_ids: impl IntoIterator<Item = u32>) -> TileRegistry {
        let mut registry = TileRegistry::new();
        if local {
            registry.add_local(tile(0, TileKind::Local));
        }
        for id in remote_ids {
            registry.add_remote(tile(id, TileKind::Remote));
        }
        registry
    }

    fn visible_ids(pagination: &Pagination, registry: &TileRegistry) -> Vec<u32> {
        pagination
            .visible_tiles(registry)
            .iter()
            .map(|t| t.id)
            .collect()
    }

    #[test]
    fn test_remote_capacity_depends_on_local_tile() {
        assert_eq!(Pagination::remote_capacity(true), 3);
        assert_eq!(Pagination::remote_capacity(false), 4);
    }

    #[test]
    fn test_local_plus_five_remote_scenario() {
        let registry = registry(true, 1..=5);
        let mut pagination = Pagination::new();

        assert_eq!(visible_ids(&pagination, &registry), vec![0, 1, 2, 3]);
        assert!(pagination.can_go_next(5, true));
        assert!(!pagination.can_go_prev());

        assert!(pagination.next_page(5, true));
        assert_eq!(visible_ids(&pagination, &registry), vec![4, 5]);
        assert!(!pagination.can_go_next(5, true));
        assert!(pagination.can_go_prev());
    }

    #[test]
    fn test_local_plus_seven_remote_uses_three_per_page() {
        let registry = registry(true, 1..=7);
        let mut pagination = Pagination::new();

        assert_eq!(visible_ids(&pagination, &registry), vec![0, 1, 2, 3]);
        pagination.next_page(7, true);
        assert_eq!(visible_ids(&pagination, &registry), vec![4, 5, 6]);
        pagination.next_page(7, true);
        assert_eq!(visible_ids(&pagination, &registry), vec![7]);
        assert!(!pagination.can_go_next(7, true));
    }

    #[test]
    fn test_without_local_tile_four_per_page() {
        let registry = registry(false, 1..=5);
        let mut pagination = Pagination::new();

        assert_eq!(visible_ids(&pagination, &registry), vec![1, 2, 3, 4]);
        pagination.next_page(5, false);
        assert_eq!(visible_ids(&pagination, &registry), vec![5]);
    }

    #[test]
    fn test_exact_multiple_of_capacity_has_no_trailing_empty_page() {
        // 6 remote tiles with a local tile: exactly two full pages.
        let mut pagination = Pagination::new();
        assert!(pagination.can_go_next(6, true));
        pagination.next_page(6, true);
        assert_eq!(pagination.page_index(), 1);
        assert!(!pagination.can_go_next(6, true));
        assert!(!pagination.next_page(6, true));

        // 8 remote tiles without one: exactly two full pages.
        let mut pagination = Pagination::new();
        pagination.next_page(8, false);
        assert!(!pagination.can_go_next(8, false));
    }

    #[test]
    fn test_can_go_next_matches_last_page_for_all_small_states() {
        for local_present in [false, true] {
            for remote_count in 0..20usize {
                let pages = Pagination::page_count(remote_count, local_present);
                let mut pagination = Pagination::new();
                for page in 0..pages.max(1) {
                    let expected = remote_count > 0 && page != pages - 1;
                    assert_eq!(
                        pagination.can_go_next(remote_count, local_present),
                        expected,
                        "remote_count={remote_count} local={local_present} page={page}"
                    );
                    pagination.next_page(remote_count, local_present);
                }
            }
        }
    }

    #[test]
    fn test_no_remote_tiles_cannot_navigate() {
        let mut pagination = Pagination::new();
        assert!(!pagination.can_go_next(0, true));
        assert!(!pagination.can_go_next(0, false));
        assert!(!pagination.next_page(0, false));
        assert!(!pagination.prev_page());
    }

    #[test]
    fn test_local_only_page() {
        let registry = registry(true, []);
        let pagination = Pagination::new();
        assert_eq!(visible_ids(&pagination, &registry), vec![0]);
    }

    #[test]
    fn test_revalidate_after_all_remote_removed() {
        let mut pagination = Pagination::new();
        pagination.next_page(12, false);
        pagination.next_page(12, false);
        assert_eq!(pagination.page_index(), 2);

        let steps = pagination.revalidate(0, false);
        assert_eq!(pagination.page_index(), 0);
        assert_eq!(steps, 2);
    }

    #[test]
    fn test_revalidate_stops_at_last_non_empty_page() {
        let mut pagination = Pagination::new();
        for _ in 0..3 {
            pagination.next_page(16, false);
        }
        assert_eq!(pagination.page_index(), 3);

        // Down to 5 remote tiles: pages 0 and 1 remain.
        let steps = pagination.revalidate(5, false);
        assert_eq!(pagination.page_index(), 1);
        assert_eq!(steps, 2);
        assert_eq!(pagination.current_page_remote_count(5, false), 1);
    }

    #[test]
    fn test_revalidate_is_bounded_by_page_index() {
        for start_page in 0..10usize {
            for remote_count in 0..30usize {
                let mut pagination = Pagination { page_index: start_page };
                let steps = pagination.revalidate(remote_count, true);
                assert!(steps <= start_page);
                if remote_count == 0 {
                    assert_eq!(pagination.page_index(), 0);
                } else if pagination.page_index() > 0 {
                    assert!(pagination.current_page_remote_count(remote_count, true) > 0);
                }
            }
        }
    }

    #[test]
    fn test_revalidate_noop_on_non_empty_page() {
        let mut pagination = Pagination::new();
        pagination.next_page(8, false);
        assert_eq!(pagination.revalidate(8, false), 0);
        assert_eq!(pagination.page_index(), 1);
    }

    #[test]
    fn test_window_beyond_end_is_empty() {
        let pagination = Pagination { page_index: 5 };
        assert!(pagination.remote_window(3, true).is_empty());
    }
}
