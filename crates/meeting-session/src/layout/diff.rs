//! Page diffing for incremental UI refresh.
//!
//! [`diff`] turns the previous page into the next one with, in order:
//!
//! 1. `Remove` for every item that left (back to front)
//! 2. `Move` for items that stayed but changed relative order; items on the
//!    longest already-ordered run stay put, so the move count is minimal
//! 3. `Insert` for every item that arrived (front to back)
//! 4. `Update` for items that stayed but whose content changed
//!
//! Operations are meant to be applied sequentially; every position refers to
//! the list as it stands after the previous operation. [`apply_diff`] does
//! exactly that and is what UI adapters can mirror.

use crate::tiles::{Tile, TileId};

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use thiserror::Error;

/// Identity used to match items between two lists.
pub trait DiffKey {
    type Key: Eq + Hash + Clone;

    fn diff_key(&self) -> Self::Key;
}

impl DiffKey for Tile {
    type Key = TileId;

    fn diff_key(&self) -> TileId {
        self.id
    }
}

/// One step of a page transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp<T> {
    Remove { position: usize },
    Insert { position: usize, item: T },
    Move { from: usize, to: usize },
    /// Same identity, new content (e.g. a pause-state flip).
    Update { position: usize, item: T },
}

/// A diff did not fit the list it was applied to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("position {position} out of range for list of length {len}")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Compute the operations that transform `old` into `new`.
pub fn diff<T>(old: &[T], new: &[T]) -> Vec<DiffOp<T>>
where
    T: DiffKey + Clone + PartialEq,
{
    let old_keys: HashSet<T::Key> = old.iter().map(DiffKey::diff_key).collect();
    let new_keys: HashSet<T::Key> = new.iter().map(DiffKey::diff_key).collect();
    let mut ops = Vec::new();

    for (position, item) in old.iter().enumerate().rev() {
        if !new_keys.contains(&item.diff_key()) {
            ops.push(DiffOp::Remove { position });
        }
    }

    let mut work: Vec<T::Key> = old
        .iter()
        .map(DiffKey::diff_key)
        .filter(|k| new_keys.contains(k))
        .collect();
    let target: Vec<T::Key> = new
        .iter()
        .map(DiffKey::diff_key)
        .filter(|k| old_keys.contains(k))
        .collect();
    push_moves(&mut work, &target, &mut ops);

    for (position, item) in new.iter().enumerate() {
        if !old_keys.contains(&item.diff_key()) {
            ops.push(DiffOp::Insert {
                position,
                item: item.clone(),
            });
        }
    }

    let old_by_key: HashMap<T::Key, &T> = old.iter().map(|item| (item.diff_key(), item)).collect();
    for (position, item) in new.iter().enumerate() {
        if let Some(previous) = old_by_key.get(&item.diff_key()) {
            if *previous != item {
                ops.push(DiffOp::Update {
                    position,
                    item: item.clone(),
                });
            }
        }
    }

    ops
}

/// Reorder `work` into `target` (same key set), recording the moves.
fn push_moves<K, T>(work: &mut Vec<K>, target: &[K], ops: &mut Vec<DiffOp<T>>)
where
    K: Eq + Hash + Clone,
{
    let target_rank: HashMap<&K, usize> = target.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let ranks: Vec<usize> = work
        .iter()
        .filter_map(|k| target_rank.get(k).copied())
        .collect();
    let stable = longest_increasing_run(&ranks);

    let mut placed: HashSet<K> = target
        .iter()
        .enumerate()
        .filter(|(rank, _)| stable.contains(rank))
        .map(|(_, k)| k.clone())
        .collect();

    for (rank, key) in target.iter().enumerate() {
        if stable.contains(&rank) {
            continue;
        }
        let Some(from) = work.iter().position(|k| k == key) else {
            continue;
        };
        let moving = work.remove(from);

        // Land right after the nearest already-placed predecessor in target order.
        let to = target
            .iter()
            .take(rank)
            .rev()
            .find(|k| placed.contains(*k))
            .and_then(|anchor| work.iter().position(|k| k == anchor))
            .map_or(0, |i| i + 1);
        work.insert(to, moving);
        placed.insert(key.clone());

        if from != to {
            ops.push(DiffOp::Move { from, to });
        }
    }
}

/// Values of one longest strictly increasing subsequence of `seq`.
fn longest_increasing_run(seq: &[usize]) -> HashSet<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessor: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq.get(t).is_some_and(|tv| tv < value));
        if let (Some(slot), Some(prev_pos)) = (predecessor.get_mut(i), pos.checked_sub(1)) {
            *slot = tails.get(prev_pos).copied();
        }
        match tails.get_mut(pos) {
            Some(tail) => *tail = i,
            None => tails.push(i),
        }
    }

    let mut run = HashSet::new();
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        if let Some(value) = seq.get(i) {
            run.insert(*value);
        }
        cursor = predecessor.get(i).copied().flatten();
    }
    run
}

/// Apply `ops` to a copy of `old`.
pub fn apply_diff<T: Clone>(old: &[T], ops: &[DiffOp<T>]) -> Result<Vec<T>, DiffError> {
    let mut items = old.to_vec();
    for op in ops {
        match op {
            DiffOp::Remove { position } => {
                check_position(*position, items.len(), false)?;
                items.remove(*position);
            }
            DiffOp::Insert { position, item } => {
                check_position(*position, items.len(), true)?;
                items.insert(*position, item.clone());
            }
            DiffOp::Move { from, to } => {
                check_position(*from, items.len(), false)?;
                let moving = items.remove(*from);
                check_position(*to, items.len(), true)?;
                items.insert(*to, moving);
            }
            DiffOp::Update { position, item } => {
                let len = items.len();
                let slot = items
                    .get_mut(*position)
                    .ok_or(DiffError::PositionOutOfRange {
                        position: *position,
                        len,
                    })?;
                *slot = item.clone();
            }
        }
    }
    Ok(items)
}

fn check_position(position: usize, len: usize, inclusive: bool) -> Result<(), DiffError> {
    let ok = if inclusive { position <= len } else { position < len };
    if ok {
        Ok(())
    } else {
        Err(DiffError::PositionOutOfRange { position, len })
    }
}
