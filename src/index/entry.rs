//! Index entry definitions
//!
//! Defines the 12-byte entry layout and how reads select an entry.

use bytes::{Buf, BufMut};

/// Width of the relative offset field
pub const OFFSET_WIDTH: u64 = 4;

/// Width of the store position field
pub const POSITION_WIDTH: u64 = 8;

/// Width of one entry; entry `k` lives at byte `k * ENTRY_WIDTH`
pub const ENTRY_WIDTH: u64 = OFFSET_WIDTH + POSITION_WIDTH;

/// A single entry in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Offset relative to the segment's base offset
    pub offset: u32,

    /// Byte position of the record in the store
    pub position: u64,
}

impl IndexEntry {
    pub fn new(offset: u32, position: u64) -> Self {
        Self { offset, position }
    }

    /// Write the entry into a slot of exactly `ENTRY_WIDTH` bytes
    pub(crate) fn encode_into(&self, mut slot: &mut [u8]) {
        slot.put_u32(self.offset);
        slot.put_u64(self.position);
    }

    /// Read an entry from a slot of exactly `ENTRY_WIDTH` bytes
    pub(crate) fn decode(mut slot: &[u8]) -> Self {
        let offset = slot.get_u32();
        let position = slot.get_u64();
        Self { offset, position }
    }
}

/// Which entry an index read targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The entry at this zero-based index
    ByIndex(u64),

    /// The most recently written entry
    Latest,
}

impl Selector {
    /// Turn the selector into a concrete entry index given how many entries
    /// exist. `None` means there is nothing to select.
    pub(crate) fn resolve(self, entries: u64) -> Option<u64> {
        match self {
            Selector::ByIndex(n) => Some(n),
            Selector::Latest => entries.checked_sub(1),
        }
    }
}

impl From<u64> for Selector {
    fn from(n: u64) -> Self {
        Selector::ByIndex(n)
    }
}

impl From<u32> for Selector {
    fn from(n: u32) -> Self {
        Selector::ByIndex(u64::from(n))
    }
}
