//! Memory-mapped index
//!
//! The file is grown to `max_index_bytes` once at open and mapped in full,
//! so writes never remap. `size` tracks the bytes holding real entries;
//! everything past it is allocated but unused and is truncated on close.

use std::fs::File;

use memmap2::MmapMut;

use crate::error::{LogError, Result};

use super::{IndexEntry, Selector, ENTRY_WIDTH};

/// Fixed-capacity offset index over a pre-allocated, mapped file
///
/// ## Concurrency:
/// Reads take `&self` and writes take `&mut self`; the mapped bytes carry no
/// synchronization of their own. Callers sharing an index across threads
/// must serialize access with the same lock that guards the paired store.
pub struct Index {
    /// Backing file, kept open for sync and truncate on close
    file: File,
    /// Shared read/write mapping over the full pre-allocated region
    mmap: MmapMut,
    /// Bytes of the region holding real entries (multiple of ENTRY_WIDTH)
    size: u64,
    /// Pre-allocated size of the file and mapping
    capacity: u64,
}

impl Index {
    /// Wrap an already-open file, pre-allocating it to `max_index_bytes`
    ///
    /// On open:
    /// 1. Take the used size from the file's current length
    /// 2. Grow the file to `max_index_bytes`
    /// 3. Map the whole region read/write
    /// 4. If the file was already at full capacity (never shrunk by a
    ///    close), recover the used size by scanning the slots
    pub fn new(file: File, max_index_bytes: u64) -> Result<Self> {
        if max_index_bytes < ENTRY_WIDTH {
            return Err(LogError::Config(format!(
                "max_index_bytes must be at least {} (got {})",
                ENTRY_WIDTH, max_index_bytes
            )));
        }

        if usize::try_from(max_index_bytes).is_err() {
            return Err(LogError::Config(format!(
                "max_index_bytes {} does not fit in this platform's address space",
                max_index_bytes
            )));
        }

        let mut size = file.metadata()?.len();
        if size > max_index_bytes {
            return Err(LogError::Corruption(format!(
                "index file holds {} bytes, more than max_index_bytes {}",
                size, max_index_bytes
            )));
        }
        // A file left at full capacity was never closed; its true size has to
        // be recovered from the slots themselves.
        let unclean = size == max_index_bytes;
        if size % ENTRY_WIDTH != 0 && !unclean {
            return Err(LogError::Corruption(format!(
                "index file length {} is not a multiple of {}",
                size, ENTRY_WIDTH
            )));
        }

        file.set_len(max_index_bytes)?;

        // SAFETY: The file was just sized to `max_index_bytes` and this index
        // owns the handle exclusively until close. The length is never
        // reduced while the map is alive; close drops the map first.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        if unclean {
            let used = Self::scan_used(&mmap, max_index_bytes);
            if used != size {
                tracing::warn!(
                    entries = used / ENTRY_WIDTH,
                    capacity = max_index_bytes,
                    "index was not closed cleanly, recovered used size"
                );
                size = used;
            }
        }

        tracing::debug!(size, capacity = max_index_bytes, "index opened");

        Ok(Self {
            file,
            mmap,
            size,
            capacity: max_index_bytes,
        })
    }

    /// Append an entry mapping relative `offset` to store `position`
    ///
    /// Fails with `CapacityExceeded` when the region is full (the signal to
    /// roll to a new segment) and with `OutOfOrder` when `offset` is not the
    /// next entry index. `size` is unchanged on failure.
    pub fn write(&mut self, offset: u32, position: u64) -> Result<()> {
        if self.size + ENTRY_WIDTH > self.capacity {
            return Err(LogError::CapacityExceeded {
                size: self.size,
                capacity: self.capacity,
            });
        }

        let expected = self.entries();
        if u64::from(offset) != expected {
            return Err(LogError::OutOfOrder {
                expected,
                actual: offset,
            });
        }

        let start = self.size as usize;
        let end = start + ENTRY_WIDTH as usize;
        IndexEntry::new(offset, position).encode_into(&mut self.mmap[start..end]);
        self.size += ENTRY_WIDTH;

        Ok(())
    }

    /// Read the entry picked by `selector`
    ///
    /// Returns `EndOfData` for an empty index or an entry at or beyond the
    /// written size; unused pre-allocated space is never decoded.
    pub fn read(&self, selector: Selector) -> Result<IndexEntry> {
        if self.size == 0 {
            return Err(LogError::EndOfData);
        }

        let entry_index = selector
            .resolve(self.entries())
            .ok_or(LogError::EndOfData)?;

        // Bounds check against used size, not mapped capacity
        let start = entry_index
            .checked_mul(ENTRY_WIDTH)
            .ok_or(LogError::EndOfData)?;
        if start + ENTRY_WIDTH > self.size {
            return Err(LogError::EndOfData);
        }

        let start = start as usize;
        let end = start + ENTRY_WIDTH as usize;
        Ok(IndexEntry::decode(&self.mmap[start..end]))
    }

    /// Drop every entry from `entries` onward
    ///
    /// Used when reopening after a crash to discard entries whose records
    /// never reached the store. The freed slots are zeroed so a later
    /// recovery scan cannot resurrect them. Never grows the index.
    pub fn truncate_entries(&mut self, entries: u64) {
        if entries >= self.entries() {
            return;
        }

        let start = (entries * ENTRY_WIDTH) as usize;
        let end = self.size as usize;
        self.mmap[start..end].fill(0);
        self.size = entries * ENTRY_WIDTH;
    }

    /// Bytes holding real entries
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Pre-allocated size in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of entries written
    pub fn entries(&self) -> u64 {
        self.size / ENTRY_WIDTH
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// True when another write would exceed capacity
    pub fn is_full(&self) -> bool {
        self.size + ENTRY_WIDTH > self.capacity
    }

    /// Sync the mapping and file, shrink the file to `size`, close it
    ///
    /// The async map sync and the blocking file sync both complete before
    /// the truncate, so no dirty page is discarded.
    pub fn close(self) -> Result<()> {
        let Index {
            file,
            mmap,
            size,
            capacity,
        } = self;

        mmap.flush_async()?;
        file.sync_all()?;
        drop(mmap);

        file.set_len(size)?;

        tracing::debug!(size, capacity, "index closed");
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Count the leading slots that hold entry `k` at slot `k`
    ///
    /// Zeroed pre-allocated space fails the check at every slot past the
    /// first, so the scan stops at the first never-written slot. A zeroed
    /// slot 0 is indistinguishable from a real `(0, 0)` entry and is kept;
    /// the caller checks it against the store.
    fn scan_used(mmap: &MmapMut, capacity: u64) -> u64 {
        let slots = capacity / ENTRY_WIDTH;
        let mut used = 0;
        while used < slots {
            let start = (used * ENTRY_WIDTH) as usize;
            let end = start + ENTRY_WIDTH as usize;
            let entry = IndexEntry::decode(&mmap[start..end]);
            if u64::from(entry.offset) != used {
                break;
            }
            used += 1;
        }
        used * ENTRY_WIDTH
    }
}
