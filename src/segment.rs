//! Segment Module
//!
//! Pairs one store with one index sharing a base offset.
//!
//! ## Responsibilities
//! - Open/create `{base}.store` and `{base}.index` in a directory
//! - Assign absolute offsets to appended records
//! - Translate an absolute offset to its record via the index
//! - Report when either file is full
//!
//! Rotation across segments is left to the caller: when `append` returns
//! `CapacityExceeded`, close this segment and open the next one at
//! `next_offset()`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SegmentConfig;
use crate::error::{LogError, Result};
use crate::file::open_file;
use crate::index::{Index, IndexEntry, Selector};
use crate::store::Store;

/// One store/index pair covering offsets `[base_offset, next_offset)`
///
/// ## Concurrency:
/// `append` takes `&mut self`, so the store append and the index write run
/// under whatever single lock guards the segment.
pub struct Segment {
    store: Store,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    config: SegmentConfig,
    store_path: PathBuf,
    index_path: PathBuf,
}

impl Segment {
    // =========================================================================
    // File Name Constants
    // =========================================================================
    const STORE_EXT: &'static str = "store";
    const INDEX_EXT: &'static str = "index";

    /// Open or create the segment starting at `base_offset` in `dir`
    ///
    /// The next offset is recovered from the index, so a segment reopens
    /// ready to append. After a crash, trailing index entries whose records
    /// never reached the store are dropped first.
    pub fn open(dir: &Path, base_offset: u64, config: &SegmentConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(dir)?;

        let store_path = Self::file_path(dir, base_offset, Self::STORE_EXT);
        let index_path = Self::file_path(dir, base_offset, Self::INDEX_EXT);

        let (store_file, _) = open_file(&store_path)?;
        let store = Store::new(store_file)?;

        let (index_file, _) = open_file(&index_path)?;
        let mut index = Index::new(index_file, config.max_index_bytes)?;

        Self::drop_dangling_entries(&mut index, &store)?;
        let next_offset = base_offset + index.entries();

        tracing::info!(
            base_offset,
            next_offset,
            store_size = store.size(),
            "segment opened"
        );

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            config: config.clone(),
            store_path,
            index_path,
        })
    }

    /// Append a record, returning its absolute offset
    ///
    /// A full segment is rejected before either file is touched.
    pub fn append(&mut self, payload: &[u8]) -> Result<u64> {
        if self.store.size() >= self.config.max_store_bytes {
            return Err(LogError::CapacityExceeded {
                size: self.store.size(),
                capacity: self.config.max_store_bytes,
            });
        }
        if self.index.is_full() {
            return Err(LogError::CapacityExceeded {
                size: self.index.size(),
                capacity: self.index.capacity(),
            });
        }

        let relative = u32::try_from(self.next_offset - self.base_offset).map_err(|_| {
            LogError::CapacityExceeded {
                size: self.index.size(),
                capacity: self.index.capacity(),
            }
        })?;

        let (_, position) = self.store.append(payload)?;
        self.index.write(relative, position)?;

        let offset = self.next_offset;
        self.next_offset += 1;

        if self.is_maxed() {
            tracing::debug!(
                base_offset = self.base_offset,
                next_offset = self.next_offset,
                "segment full"
            );
        }

        Ok(offset)
    }

    /// Read the record at absolute `offset`
    pub fn read(&self, offset: u64) -> Result<Vec<u8>> {
        let entry = self.entry(offset)?;
        self.store.read(entry.position)
    }

    /// Index entry for absolute `offset`
    pub fn entry(&self, offset: u64) -> Result<IndexEntry> {
        if offset < self.base_offset || offset >= self.next_offset {
            return Err(LogError::EndOfData);
        }
        self.index.read(Selector::ByIndex(offset - self.base_offset))
    }

    /// Raw store bytes at a byte position, unframed
    pub fn read_at(&self, buf: &mut [u8], position: u64) -> Result<usize> {
        self.store.read_at(buf, position)
    }

    /// True when the store reached its limit or the index has no free slot
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.config.max_store_bytes || self.index.is_full()
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Offset the next append will receive
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    pub fn index_size(&self) -> u64 {
        self.index.size()
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Close the index, then the store
    pub fn close(self) -> Result<()> {
        let base_offset = self.base_offset;
        let next_offset = self.next_offset;

        self.index.close()?;
        self.store.close()?;

        tracing::info!(base_offset, next_offset, "segment closed");
        Ok(())
    }

    /// Close the segment and delete both files
    pub fn remove(self) -> Result<()> {
        let store_path = self.store_path.clone();
        let index_path = self.index_path.clone();
        let base_offset = self.base_offset;

        self.close()?;
        fs::remove_file(&index_path)?;
        fs::remove_file(&store_path)?;

        tracing::info!(base_offset, "segment removed");
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Trim index entries from the end until the last one names a complete
    /// record in the store
    ///
    /// Index slots live in a shared mapping and survive a crash, while the
    /// store's buffered tail does not, so the index can run ahead of it.
    fn drop_dangling_entries(index: &mut Index, store: &Store) -> Result<()> {
        let written = index.entries();
        let mut keep = written;

        while keep > 0 {
            let entry = index.read(Selector::ByIndex(keep - 1))?;
            match store.read(entry.position) {
                Ok(_) => break,
                Err(LogError::EndOfData) | Err(LogError::TornRecord { .. }) => keep -= 1,
                Err(e) => return Err(e),
            }
        }

        if keep < written {
            tracing::warn!(
                kept = keep,
                dropped = written - keep,
                "dropped index entries with no record in the store"
            );
            index.truncate_entries(keep);
        }
        Ok(())
    }

    /// "{dir}/00000000000000000042.store"
    fn file_path(dir: &Path, base_offset: u64, ext: &str) -> PathBuf {
        dir.join(format!("{:020}.{}", base_offset, ext))
    }
}
