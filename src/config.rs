//! Configuration for seglog
//!
//! Centralized configuration with sensible defaults. Loading it from a file
//! or the environment is left to the embedding application; the types derive
//! serde so any format works.

use serde::{Deserialize, Serialize};

use crate::error::{LogError, Result};
use crate::index::ENTRY_WIDTH;

/// Main configuration for a seglog instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-segment limits
    pub segment: SegmentConfig,
}

/// Limits applied to a single segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Store size (in bytes) at which the segment reports itself full.
    /// Not enforced by the store itself.
    pub max_store_bytes: u64,

    /// Size the index file is pre-allocated to (in bytes)
    pub max_index_bytes: u64,

    /// Base offset of the first segment
    pub initial_offset: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: 64 * 1024 * 1024,          // 64 MB
            max_index_bytes: 1024 * 1024 * ENTRY_WIDTH, // 1M entries
            initial_offset: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the limits are usable
    pub fn validate(&self) -> Result<()> {
        self.segment.validate()
    }
}

impl SegmentConfig {
    /// An index must hold at least one entry and a store at least one header
    pub fn validate(&self) -> Result<()> {
        if self.max_index_bytes < ENTRY_WIDTH {
            return Err(LogError::Config(format!(
                "max_index_bytes must be at least {} (got {})",
                ENTRY_WIDTH, self.max_index_bytes
            )));
        }
        if self.max_store_bytes == 0 {
            return Err(LogError::Config(
                "max_store_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store size at which a segment is full (in bytes)
    pub fn max_store_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_store_bytes = bytes;
        self
    }

    /// Set the index pre-allocation size (in bytes)
    pub fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.config.segment.max_index_bytes = bytes;
        self
    }

    /// Set the base offset of the first segment
    pub fn initial_offset(mut self, offset: u64) -> Self {
        self.config.segment.initial_offset = offset;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
