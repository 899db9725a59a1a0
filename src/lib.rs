//! # seglog
//!
//! Storage core of a segment-structured commit log:
//! - A length-prefixed, append-only record store (buffered writes)
//! - A fixed-width, memory-mapped offset index (O(1) lookups)
//! - Explicit durability at flush/close, never per write
//! - A segment pairing the two under one base offset
//!
//! ## Architecture Overview
//!
//! ```text
//!                 append(payload)            read(offset)
//!                       │                          │
//! ┌─────────────────────▼──────────────────────────▼────────────┐
//! │                        Segment                               │
//! │            (base_offset, next_offset, limits)                │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ 1. append → position              │ 1. read(rel) → position
//!            │ 2. write(rel, position)           │ 2. read(position) → payload
//!            ▼                                   ▼
//!   ┌─────────────────┐                 ┌─────────────────┐
//!   │      Store      │                 │      Index      │
//!   │ [len][payload]… │                 │ [off][pos]…     │
//!   │  (BufWriter)    │                 │  (MmapMut)      │
//!   └─────────────────┘                 └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod file;

pub mod store;
pub mod index;
pub mod segment;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LogError, Result};
pub use config::{Config, SegmentConfig};
pub use file::open_file;
pub use store::Store;
pub use index::{Index, IndexEntry, Selector};
pub use segment::Segment;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of seglog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
