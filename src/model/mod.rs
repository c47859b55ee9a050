//! Data models for the grooming pipeline.
//!
//! This module defines the core data structures:
//!
//! - [`RawRecord`]: A ticket as it arrives from an export file
//! - [`RawItem`]: A normalized, immutable ticket
//! - [`Epic`]: A named partition of raw items
//! - [`ProcessedItem`]: A rewritten, scored backlog entry
//! - [`ItemType`], [`Priority`], [`Risk`]: Classification enums
//! - [`Issue`]: A per-item problem recorded during a run

mod issue;
mod item;
mod raw;
mod types;

pub(crate) use item::push_unique;
pub use issue::{Issue, IssueKind};
pub use item::ProcessedItem;
pub use raw::{Epic, RawItem, RawRecord};
pub use types::{ItemType, Priority, Risk};
