//! Video layout: which tiles are on screen, in what order.
//!
//! ```text
//! remote tiles ──► reorder (active speakers first) ──► pagination window ──► diff vs. previous page
//! ```
//!
//! Everything here is pure data-in/data-out; the coordinator decides when to
//! run it and what to do with the result.
//!
//! # Modules
//!
//! - [`reorder`] - stable active-speaker partition of the remote tiles
//! - [`pagination`] - page window, boundary flags and page-index revalidation
//! - [`diff`] - insert/remove/move/update operations between two pages

pub mod diff;
pub mod pagination;
pub mod reorder;

pub use diff::{apply_diff, diff, DiffError, DiffKey, DiffOp};
pub use pagination::{Pagination, PAGE_SIZE};
pub use reorder::partition_by_active_speakers;
