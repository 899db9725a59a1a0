//! Index Module
//!
//! Fixed-width, memory-mapped table translating a relative offset to the
//! byte position of its record in the store.
//!
//! ## Responsibilities
//! - Pre-allocate the file to its maximum size and map it once
//! - O(1) lookups by entry index (no scanning)
//! - Bounds-check every read against the bytes actually written
//! - Shrink the file back to its used size on close
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Entry 0  │ Offset (4, BE) │ Pos (8, BE)  │
//! │ Entry 1  │ Offset (4, BE) │ Pos (8, BE)  │
//! │ ...                                      │
//! ├──────────────────────────────────────────┤ ← size
//! │ Unused pre-allocated space               │
//! │ (truncated away on close)                │
//! └──────────────────────────────────────────┘ ← max_index_bytes
//! ```

mod entry;
mod mmap;

pub use entry::{IndexEntry, Selector, ENTRY_WIDTH, OFFSET_WIDTH, POSITION_WIDTH};
pub use mmap::Index;
