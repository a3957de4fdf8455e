//! Active-speaker ordering of remote tiles.
//!
//! Tiles whose attendee is currently speaking move ahead of everyone else.
//! This is a stable partition, not a sort: relative order inside each group
//! is preserved so tiles do not jitter between detector ticks.

use crate::tiles::Tile;

use std::collections::HashSet;

/// Move tiles of active speakers to the front, keeping relative order.
pub fn partition_by_active_speakers(tiles: &mut Vec<Tile>, active_attendees: &HashSet<String>) {
    if active_attendees.is_empty() {
        return;
    }
    let (mut speaking, silent): (Vec<Tile>, Vec<Tile>) = tiles
        .drain(..)
        .partition(|t| active_attendees.contains(&t.attendee_id));
    speaking.extend(silent);
    *tiles = speaking;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{PauseState, TileKind};

    fn remote(id: u32, attendee: &str) -> Tile {
        Tile {
            id,
            attendee_id: attendee.to_string(),
            kind: TileKind::Remote,
            pause_state: PauseState::Playing,
            content_width: 0,
            content_height: 0,
        }
    }

    fn ids(tiles: &[Tile]) -> Vec<u32> {
        tiles.iter().map(|t| t.id).collect()
    }

    fn active(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    fn abcd() -> Vec<Tile> {
        vec![remote(1, "A"), remote(2, "B"), remote(3, "C"), remote(4, "D")]
    }

    #[test]
    fn test_single_speaker_moves_to_front_others_keep_order() {
        let mut tiles = abcd();
        partition_by_active_speakers(&mut tiles, &active(&["C"]));
        assert_eq!(ids(&tiles), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_multiple_speakers_keep_their_relative_order() {
        let mut tiles = abcd();
        partition_by_active_speakers(&mut tiles, &active(&["D", "B"]));
        assert_eq!(ids(&tiles), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_empty_active_set_leaves_order_untouched() {
        let mut tiles = abcd();
        partition_by_active_speakers(&mut tiles, &HashSet::new());
        assert_eq!(ids(&tiles), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_speakers_do_not_reorder() {
        let mut tiles = abcd();
        partition_by_active_speakers(&mut tiles, &active(&["Z"]));
        assert_eq!(ids(&tiles), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_repeated_ticks_are_stable() {
        let mut tiles = abcd();
        let speakers = active(&["C"]);
        partition_by_active_speakers(&mut tiles, &speakers);
        partition_by_active_speakers(&mut tiles, &speakers);
        assert_eq!(ids(&tiles), vec![3, 1, 2, 4]);

        // Speaker changes: previous speaker stays where the last tick left it.
        partition_by_active_speakers(&mut tiles, &active(&["D"]));
        assert_eq!(ids(&tiles), vec![4, 3, 1, 2]);
    }
}
