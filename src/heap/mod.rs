//! Heap File Module
//!
//! A heap file is a header plus a run of fixed-size blocks, each packing
//! records at a fixed stride. Append-only, unordered, no index.
//!
//! ## File Format (little-endian)
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Header (8 bytes)                            │
//! │   NumberOfBlocks: u32 (4) | BlockSize: u32  │
//! ├─────────────────────────────────────────────┤
//! │ Block 0 (BlockSize bytes)                   │
//! │   [Record][Record]... at RECORD_SIZE stride │
//! ├─────────────────────────────────────────────┤
//! │ ...                                         │
//! ├─────────────────────────────────────────────┤
//! │ Block N-1 (may be short)                    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The final block may hold fewer than a full block's worth of records; the
//! bytes actually present determine how many. A file never mixes block sizes:
//! the header's BlockSize governs the whole file.

mod writer;
mod reader;

pub use reader::{HeapReader, RecordScan};
pub use writer::{HeapWriter, WriteStats};

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use bytes::{BufMut, BytesMut};

use crate::config::Config;
use crate::error::{HeapError, Result};
use crate::record::{Record, RECORD_SIZE};

// =============================================================================
// Shared Constants (used by builders, writer, reader)
// =============================================================================

/// Header size: NumberOfBlocks (4) + BlockSize (4) = 8 bytes
pub const HEADER_SIZE: usize = 8;

/// Batch size used by `generate` so huge files never materialize in memory
const GENERATE_BATCH: usize = 10_000;

// =============================================================================
// Header
// =============================================================================

/// Heap file header, consumed by the Reader at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of blocks in the file body (the last may be short)
    pub number_of_blocks: u32,
    /// Block size in bytes; authoritative for the whole file
    pub block_size: u32,
}

impl Header {
    /// Append the 8 header bytes to `buf`
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.number_of_blocks);
        buf.put_u32_le(self.block_size);
    }

    /// Decode and validate a header from exactly [`HEADER_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HEADER_SIZE {
            return Err(HeapError::Format(format!(
                "header is {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let number_of_blocks = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let block_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());

        if (block_size as usize) < RECORD_SIZE {
            return Err(HeapError::Format(format!(
                "implausible block size {} (one record needs {} bytes)",
                block_size, RECORD_SIZE
            )));
        }

        Ok(Self {
            number_of_blocks,
            block_size,
        })
    }

    /// Header for `total_records` laid out with `config`'s geometry
    fn for_record_count(total_records: usize, config: &Config) -> Self {
        let rpb = config.records_per_block;
        Self {
            number_of_blocks: total_records.div_ceil(rpb) as u32,
            block_size: config.block_size() as u32,
        }
    }
}

// =============================================================================
// File Builders
// =============================================================================

/// Write a complete heap file (header + blocks) from the given records
///
/// Returns the header that was written. The record count must be known up
/// front because the header carries the block count; for bulk seeding with
/// synthesized records use [`generate`] instead.
pub fn create(path: impl AsRef<Path>, records: &[Record], config: &Config) -> Result<Header> {
    config.validate()?;
    let header = Header::for_record_count(records.len(), config);

    let mut file = open_for_create(path.as_ref())?;
    write_header(&mut file, &header)?;

    let mut writer = HeapWriter::from_file(file, config)?;
    writer.write(records, false)?;
    writer.finish()?;

    Ok(header)
}

/// Seed a heap file with `total_records` synthesized numbered records
///
/// Thin orchestration over [`create`]'s machinery: writes the header, then
/// streams [`Record::with_sequence`] records through a [`HeapWriter`] in
/// batches.
pub fn generate(
    path: impl AsRef<Path>,
    total_records: usize,
    config: &Config,
) -> Result<Header> {
    config.validate()?;
    let header = Header::for_record_count(total_records, config);

    tracing::debug!(
        total_records,
        number_of_blocks = header.number_of_blocks,
        block_size = header.block_size,
        "generating heap file"
    );

    let mut file = open_for_create(path.as_ref())?;
    write_header(&mut file, &header)?;

    let mut writer = HeapWriter::from_file(file, config)?;
    let mut next = 0;
    while next < total_records {
        let batch: Vec<Record> = (next..total_records.min(next + GENERATE_BATCH))
            .map(Record::with_sequence)
            .collect();
        next += batch.len();
        writer.write(&batch, false)?;
    }
    let stats = writer.finish()?;

    tracing::debug!(
        records = stats.records_written,
        blocks = stats.blocks_written,
        "heap file generated"
    );

    Ok(header)
}

fn open_for_create(path: &Path) -> Result<std::fs::File> {
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?)
}

fn write_header(file: &mut std::fs::File, header: &Header) -> Result<()> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE);
    header.encode(&mut buf);
    file.write_all(&buf)?;
    Ok(())
}
