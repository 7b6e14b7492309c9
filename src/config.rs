//! Configuration for heapfile
//!
//! Centralized block geometry with sensible defaults.

use crate::record::RECORD_SIZE;

/// Default number of records packed into one block
pub const DEFAULT_RECORDS_PER_BLOCK: usize = 1_000;

/// Block geometry used when building heap files
///
/// Readers never consult this: a file's header carries its own block size
/// and is authoritative for that file.
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Block Geometry
    // -------------------------------------------------------------------------
    /// Records packed into one block; block size is derived from this
    pub records_per_block: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            records_per_block: DEFAULT_RECORDS_PER_BLOCK,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Block size in bytes implied by this geometry
    pub fn block_size(&self) -> usize {
        self.records_per_block * RECORD_SIZE
    }

    /// Reject geometries that cannot hold a single record
    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.records_per_block == 0 {
            return Err(crate::HeapError::Config(
                "records_per_block must be at least 1".to_string(),
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
    /// Set the number of records per block
    pub fn records_per_block(mut self, count: usize) -> Self {
        self.config.records_per_block = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
