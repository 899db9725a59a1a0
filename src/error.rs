//! Error types for seglog
//!
//! Provides a unified error type for store, index, and segment operations.

use thiserror::Error;

/// Result type alias using LogError
pub type Result<T> = std::result::Result<T, LogError>;

/// Unified error type for seglog operations
#[derive(Debug, Error)]
pub enum LogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// stat, truncate, map, sync, read, write or close failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Read Errors
    // -------------------------------------------------------------------------
    /// Nothing has been written at the requested location
    #[error("end of data")]
    EndOfData,

    /// A record header declared more bytes than the store holds
    #[error("torn record at position {position}: expected {expected} bytes, {available} available")]
    TornRecord {
        position: u64,
        expected: u64,
        available: u64,
    },

    // -------------------------------------------------------------------------
    // Write Errors
    // -------------------------------------------------------------------------
    /// The index (or segment) cannot take another entry
    #[error("capacity exceeded: {size} of {capacity} bytes used")]
    CapacityExceeded { size: u64, capacity: u64 },

    /// Index entries must be written with relative offsets 0, 1, 2, ...
    #[error("out of order index write: expected offset {expected}, got {actual}")]
    OutOfOrder { expected: u64, actual: u32 },

    /// A failed append could not be rolled back; the store refuses writes
    #[error("Store poisoned: {0}")]
    Poisoned(String),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogError {
    /// True when the caller hit the end of written data rather than a failure
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, LogError::EndOfData)
    }

    /// True when the caller should roll to a new segment
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, LogError::CapacityExceeded { .. })
    }
}
