//! Heap Writer
//!
//! Block-buffered sequential writer. Records accumulate in an in-memory
//! block-sized buffer; the buffer is written to the file as one completed
//! block whenever the next record would overflow it, and any trailing
//! partial block is written on `finish` (or on drop, best effort).
//!
//! Buffer state persists across `write` calls, so batches may be fed
//! cumulatively. The writer never touches the file header; the builders in
//! [`crate::heap`] emit it before handing the file over.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use bytes::BytesMut;

use crate::config::Config;
use crate::error::Result;
use crate::record::{Record, RECORD_SIZE};

/// Per-writer counters, returned by [`HeapWriter::finish`]
///
/// Diagnostics only; none of this is part of the durable format.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteStats {
    /// Records accepted across all `write` calls
    pub records_written: u64,
    /// Completed or partial blocks written to the file
    pub blocks_written: u64,
    /// Largest payload byte length seen
    pub largest_payload: usize,
}

/// Writes records to a heap file body, one block at a time
#[derive(Debug)]
pub struct HeapWriter {
    file: File,
    /// In-memory staging for the current block; len() is the valid byte range
    block: BytesMut,
    block_size: usize,
    records_in_block: usize,
    stats: WriteStats,
    finished: bool,
}

impl HeapWriter {
    /// Open `path` for exclusive sequential writing, discarding any existing
    /// content
    ///
    /// No header is written; the resulting file is a bare block stream.
    pub fn create(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::from_file(file, config)
    }

    /// Wrap an already-opened file positioned where the block stream starts
    ///
    /// This is how the file builders write a header first and then reuse the
    /// writer for the body.
    pub fn from_file(file: File, config: &Config) -> Result<Self> {
        config.validate()?;
        let block_size = config.block_size();
        Ok(Self {
            file,
            block: BytesMut::with_capacity(block_size),
            block_size,
            records_in_block: 0,
            stats: WriteStats::default(),
            finished: false,
        })
    }

    /// Append a batch of records, buffering into the current block
    ///
    /// With `flush = true` the buffered-but-incomplete block is also written
    /// out immediately (only the valid byte range, no padding) and the buffer
    /// resets, so later writes start a new block.
    ///
    /// An oversize record fails the call with
    /// [`crate::HeapError::RecordOverflow`]; records before it in the batch
    /// stay buffered, nothing is written for the rejected one.
    pub fn write(&mut self, records: &[Record], flush: bool) -> Result<()> {
        for record in records {
            if self.block.len() + RECORD_SIZE > self.block_size {
                self.write_block()?;
            }
            record.encode(&mut self.block)?;
            self.records_in_block += 1;
            self.stats.records_written += 1;
            self.stats.largest_payload = self.stats.largest_payload.max(record.data.len());
        }

        if flush {
            self.write_block()?;
        }

        Ok(())
    }

    /// Counters so far
    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Flush any trailing partial block, sync, and release the file
    ///
    /// A flush failure here propagates without retry; the drop path must
    /// not attempt the same block again.
    pub fn finish(mut self) -> Result<WriteStats> {
        self.finished = true;
        self.write_block()?;
        self.file.sync_all()?;
        Ok(self.stats)
    }

    /// Write the buffered valid byte range as one block and reset
    fn write_block(&mut self) -> Result<()> {
        if self.block.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            bytes = self.block.len(),
            records = self.records_in_block,
            "writing block"
        );

        self.file.write_all(&self.block)?;
        self.stats.blocks_written += 1;
        self.records_in_block = 0;
        self.block.clear();

        Ok(())
    }
}

impl Drop for HeapWriter {
    /// Best-effort flush on early exit paths; `finish` is the checked variant
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.write_block() {
            tracing::warn!("failed to flush trailing block on drop: {}", e);
        }
    }
}
