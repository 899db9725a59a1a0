//! Tests for Segment
//!
//! These tests verify:
//! - Offset assignment from the base offset
//! - Reads by absolute offset
//! - Full detection for store and index limits
//! - Reopen recovers the next offset, also after an unclean shutdown
//! - Remove deletes both files

use seglog::index::ENTRY_WIDTH;
use seglog::store::LEN_WIDTH;
use seglog::{Config, LogError, Segment, SegmentConfig};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const WRITE: &[u8] = b"hello world";

fn config(max_store_bytes: u64, max_index_bytes: u64) -> SegmentConfig {
    Config::builder()
        .max_store_bytes(max_store_bytes)
        .max_index_bytes(max_index_bytes)
        .build()
        .segment
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_assigns_offsets_from_base() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 16, &config(1024, 1024)).unwrap();

    assert_eq!(segment.base_offset(), 16);
    assert_eq!(segment.next_offset(), 16);

    for expected in 16..19 {
        assert_eq!(segment.append(WRITE).unwrap(), expected);
    }
    assert_eq!(segment.next_offset(), 19);

    for offset in 16..19 {
        assert_eq!(segment.read(offset).unwrap(), WRITE);
    }
}

#[test]
fn test_entry_maps_offset_to_store_position() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 0, &config(1024, 1024)).unwrap();

    segment.append(WRITE).unwrap();
    segment.append(WRITE).unwrap();

    let entry = segment.entry(1).unwrap();
    assert_eq!(entry.offset, 1);
    assert_eq!(entry.position, LEN_WIDTH + WRITE.len() as u64);

    let mut raw = vec![0u8; WRITE.len()];
    segment.read_at(&mut raw, entry.position + LEN_WIDTH).unwrap();
    assert_eq!(raw, WRITE);
}

#[test]
fn test_read_outside_range_is_end_of_data() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 10, &config(1024, 1024)).unwrap();
    segment.append(WRITE).unwrap();

    assert!(matches!(segment.read(9), Err(LogError::EndOfData)));
    assert!(matches!(segment.read(11), Err(LogError::EndOfData)));
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_maxed_by_index() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 0, &config(1024, ENTRY_WIDTH * 3)).unwrap();

    for _ in 0..3 {
        assert!(!segment.is_maxed());
        segment.append(WRITE).unwrap();
    }
    assert!(segment.is_maxed());

    let store_size = segment.store_size();
    let err = segment.append(WRITE).unwrap_err();
    assert!(err.is_capacity_exceeded());

    // Rejected before the store was touched
    assert_eq!(segment.store_size(), store_size);
    assert_eq!(segment.next_offset(), 3);
}

#[test]
fn test_maxed_by_store() {
    let temp = TempDir::new().unwrap();
    let record = LEN_WIDTH + WRITE.len() as u64;
    let mut segment = Segment::open(temp.path(), 0, &config(record * 2, 1024)).unwrap();

    segment.append(WRITE).unwrap();
    assert!(!segment.is_maxed());
    segment.append(WRITE).unwrap();
    assert!(segment.is_maxed());

    assert!(matches!(
        segment.append(WRITE),
        Err(LogError::CapacityExceeded { .. })
    ));
    assert_eq!(segment.index_size(), 2 * ENTRY_WIDTH);
}

#[test]
fn test_open_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let result = Segment::open(temp.path(), 0, &config(1024, 4));
    assert!(matches!(result, Err(LogError::Config(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_reopen_recovers_next_offset() {
    let temp = TempDir::new().unwrap();
    let cfg = config(1024, 1024);

    let mut segment = Segment::open(temp.path(), 100, &cfg).unwrap();
    segment.append(b"a").unwrap();
    segment.append(b"b").unwrap();
    segment.close().unwrap();

    let mut segment = Segment::open(temp.path(), 100, &cfg).unwrap();
    assert_eq!(segment.next_offset(), 102);
    assert_eq!(segment.read(100).unwrap(), b"a");
    assert_eq!(segment.read(101).unwrap(), b"b");

    assert_eq!(segment.append(b"c").unwrap(), 102);
    assert_eq!(segment.read(102).unwrap(), b"c");
}

#[test]
fn test_close_shrinks_index_file() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 0, &config(1024, 1024)).unwrap();
    segment.append(WRITE).unwrap();

    let index_path = segment.index_path().to_path_buf();
    assert_eq!(std::fs::metadata(&index_path).unwrap().len(), 1024);

    segment.close().unwrap();
    assert_eq!(std::fs::metadata(&index_path).unwrap().len(), ENTRY_WIDTH);
}

#[test]
fn test_file_names_use_base_offset() {
    let temp = TempDir::new().unwrap();
    let segment = Segment::open(temp.path(), 42, &config(1024, 1024)).unwrap();

    assert_eq!(
        segment.store_path(),
        temp.path().join("00000000000000000042.store")
    );
    assert_eq!(
        segment.index_path(),
        temp.path().join("00000000000000000042.index")
    );
}

#[test]
fn test_remove_deletes_files() {
    let temp = TempDir::new().unwrap();
    let mut segment = Segment::open(temp.path(), 0, &config(1024, 1024)).unwrap();
    segment.append(WRITE).unwrap();

    let store_path = segment.store_path().to_path_buf();
    let index_path = segment.index_path().to_path_buf();
    segment.remove().unwrap();

    assert!(!store_path.exists());
    assert!(!index_path.exists());
}

// =============================================================================
// Unclean Shutdown Tests
// =============================================================================

#[test]
fn test_reopen_after_drop_without_close() {
    let temp = TempDir::new().unwrap();
    let cfg = config(1024, 120);

    let mut segment = Segment::open(temp.path(), 0, &cfg).unwrap();
    segment.append(b"a").unwrap();
    segment.append(b"b").unwrap();
    drop(segment);

    let mut segment = Segment::open(temp.path(), 0, &cfg).unwrap();
    assert_eq!(segment.next_offset(), 2);
    assert_eq!(segment.index_size(), 2 * ENTRY_WIDTH);
    assert!(!segment.is_maxed());
    assert_eq!(segment.read(0).unwrap(), b"a");
    assert_eq!(segment.read(1).unwrap(), b"b");

    assert_eq!(segment.append(b"c").unwrap(), 2);
    assert_eq!(segment.read(2).unwrap(), b"c");
}

#[test]
fn test_reopen_drops_entries_missing_from_store() {
    let temp = TempDir::new().unwrap();
    let cfg = config(1024, 120);

    let mut segment = Segment::open(temp.path(), 5, &cfg).unwrap();
    segment.append(b"a").unwrap();
    segment.append(b"b").unwrap();
    let store_path = segment.store_path().to_path_buf();
    drop(segment);

    // The second record never made it to disk
    let file = std::fs::OpenOptions::new().write(true).open(&store_path).unwrap();
    file.set_len(LEN_WIDTH + 1).unwrap();
    drop(file);

    let mut segment = Segment::open(temp.path(), 5, &cfg).unwrap();
    assert_eq!(segment.next_offset(), 6);
    assert_eq!(segment.read(5).unwrap(), b"a");
    assert!(segment.read(6).unwrap_err().is_end_of_data());

    assert_eq!(segment.append(b"c").unwrap(), 6);
    assert_eq!(segment.read(6).unwrap(), b"c");
}

#[test]
fn test_reopen_empty_segment_after_drop_without_close() {
    let temp = TempDir::new().unwrap();
    let cfg = config(1024, 120);

    let segment = Segment::open(temp.path(), 0, &cfg).unwrap();
    drop(segment);

    let mut segment = Segment::open(temp.path(), 0, &cfg).unwrap();
    assert_eq!(segment.next_offset(), 0);
    assert_eq!(segment.index_size(), 0);
    assert!(segment.read(0).unwrap_err().is_end_of_data());

    assert_eq!(segment.append(b"first").unwrap(), 0);
    assert_eq!(segment.read(0).unwrap(), b"first");
}
