//! Heap Reader
//!
//! Sequential scan over a heap file with optional double-buffered
//! read-ahead.
//!
//! ## Loading model
//!
//! A dedicated loader thread owns the file handle, which keeps every
//! physical read serialized and in file order without a lock. Block buffers
//! circulate between the scan and the loader over two bounded channels:
//!
//! ```text
//!            empty buffers
//!      ┌──────────────────────┐
//!      ▼                      │
//! ┌─────────┐  filled blocks  ┌──┴───────┐
//! │ loader  │────────────────▶│ RecordScan│
//! │ thread  │                 │ (decode)  │
//! └─────────┘                 └──────────┘
//! ```
//!
//! With two buffers in circulation the loader refills one while the scan
//! decodes the other, hiding disk latency for block k+1 behind decode time
//! for block k. With a single buffer the next load cannot start until the
//! current block is fully consumed, so I/O and decode are strictly
//! serialized. Overlap comes from issuing the next read early, never from
//! two reads at once.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::thread::JoinHandle;

use bytes::BytesMut;
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::error::{HeapError, Result};
use crate::record::{Record, RECORD_SIZE};

use super::{Header, HEADER_SIZE};

// =============================================================================
// Block Fetcher (loader thread + buffer circulation)
// =============================================================================

/// Owns the loader thread and the channels buffers circulate through
#[derive(Debug)]
struct BlockFetcher {
    /// Returning a buffer here asks the loader to refill it; dropping the
    /// sender is the shutdown signal
    empty_tx: Option<Sender<BytesMut>>,
    filled_rx: Receiver<Result<BytesMut>>,
    loader: Option<JoinHandle<()>>,
}

impl BlockFetcher {
    /// Spawn the loader over `file` (positioned at the first block) and put
    /// `slots` buffers into circulation
    ///
    /// Channel capacity equals the buffer count, so the loader can never
    /// block on send; teardown only has to close the request channel and
    /// join.
    fn spawn(file: File, block_size: usize, slots: usize) -> Result<Self> {
        let (empty_tx, empty_rx) = bounded::<BytesMut>(slots);
        let (filled_tx, filled_rx) = bounded::<Result<BytesMut>>(slots);

        let loader = std::thread::Builder::new()
            .name("heapfile-loader".to_string())
            .spawn(move || run_loader(file, block_size, empty_rx, filled_tx))?;

        for _ in 0..slots {
            empty_tx
                .send(BytesMut::with_capacity(block_size))
                .expect("loader alive at construction");
        }

        Ok(Self {
            empty_tx: Some(empty_tx),
            filled_rx,
            loader: Some(loader),
        })
    }

    /// Wait for the next load, in file order
    fn recv(&self) -> Result<BytesMut> {
        self.filled_rx.recv().unwrap_or_else(|_| {
            Err(HeapError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "block loader terminated",
            )))
        })
    }

    /// Hand a consumed buffer back for refilling
    fn recycle(&self, buf: BytesMut) {
        if let Some(tx) = &self.empty_tx {
            // Fails only if the loader already stopped after an I/O error;
            // the scan sees that error through the filled channel.
            let _ = tx.send(buf);
        }
    }
}

impl Drop for BlockFetcher {
    fn drop(&mut self) {
        // Closing the request channel stops the loader; join so no load
        // outlives the buffers.
        self.empty_tx.take();
        if let Some(handle) = self.loader.take() {
            let _ = handle.join();
        }
    }
}

/// Loader thread body: refill buffers with sequential block reads
fn run_loader(
    mut file: File,
    block_size: usize,
    empty_rx: Receiver<BytesMut>,
    filled_tx: Sender<Result<BytesMut>>,
) {
    for mut buf in empty_rx.iter() {
        buf.clear();
        buf.resize(block_size, 0);

        match read_block(&mut file, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                tracing::trace!(bytes = n, "loaded block");
                if filled_tx.send(Ok(buf)).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("block load failed: {}", e);
                let _ = filled_tx.send(Err(e.into()));
                return;
            }
        }
    }
}

/// Read up to `buf.len()` bytes; short only at end of file
fn read_block(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// =============================================================================
// Heap Reader
// =============================================================================

/// Opens a heap file for a single sequential scan
///
/// Construction parses the header, puts one buffer (single mode) or two
/// buffers (dual mode) into circulation, and blocks until every buffer's
/// initial load has completed. The buffering mode is fixed for the reader's
/// lifetime.
#[derive(Debug)]
pub struct HeapReader {
    header: Header,
    fetcher: BlockFetcher,
    /// Initial loads completed during construction, still in file order
    primed: VecDeque<Result<BytesMut>>,
}

impl HeapReader {
    /// Open `path` and prime the block buffers
    ///
    /// Fails with [`HeapError::Format`] if the file is shorter than the
    /// header or carries an implausible block size.
    pub fn open(path: impl AsRef<Path>, dual_buffering: bool) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                HeapError::Format("file too short to hold a heap file header".to_string())
            } else {
                HeapError::Io(e)
            }
        })?;
        let header = Header::decode(&header_bytes)?;

        tracing::debug!(
            number_of_blocks = header.number_of_blocks,
            block_size = header.block_size,
            dual_buffering,
            "header processed"
        );

        let slots = if dual_buffering { 2 } else { 1 };
        let fetcher = BlockFetcher::spawn(file, header.block_size as usize, slots)?;

        let mut primed = VecDeque::with_capacity(slots);
        for _ in 0..slots {
            primed.push_back(fetcher.recv());
        }

        Ok(Self {
            header,
            fetcher,
            primed,
        })
    }

    /// The header this file was opened with
    pub fn header(&self) -> Header {
        self.header
    }

    /// Consume the reader into a lazy scan over every record, in file order
    ///
    /// The scan is finite and not restartable; open a fresh reader to
    /// re-scan. Dropping it mid-way releases the file handle and joins any
    /// in-flight load.
    pub fn read_all(self) -> RecordScan {
        RecordScan {
            fetcher: self.fetcher,
            primed: self.primed,
            current: None,
            pos: 0,
            done: false,
        }
    }
}

// =============================================================================
// Record Scan
// =============================================================================

/// Lazy iterator over a heap file's records
///
/// Yields records in strict file order (block 0, block 1, ...; offset order
/// within a block). Ends at the first zero-byte load; a mid-stream error is
/// yielded once, after which the scan is fused.
#[derive(Debug)]
pub struct RecordScan {
    fetcher: BlockFetcher,
    primed: VecDeque<Result<BytesMut>>,
    /// Active block being decoded; len() is the valid byte range
    current: Option<BytesMut>,
    pos: usize,
    done: bool,
}

impl Iterator for RecordScan {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(block) = self.current.take() {
                if self.pos + RECORD_SIZE <= block.len() {
                    let record = Record::decode(&block[self.pos..self.pos + RECORD_SIZE]);
                    self.pos += RECORD_SIZE;
                    match record {
                        Ok(r) => {
                            self.current = Some(block);
                            return Some(Ok(r));
                        }
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                    }
                }

                // Block exhausted. A remainder shorter than one record is
                // not a record; hand the buffer back so the loader can
                // refill it while we move on.
                self.fetcher.recycle(block);
                self.pos = 0;
            }

            let next = match self.primed.pop_front() {
                Some(result) => result,
                None => self.fetcher.recv(),
            };

            match next {
                Ok(block) => {
                    if block.is_empty() {
                        // Zero-byte load: end of stream.
                        self.done = true;
                        return None;
                    }
                    tracing::trace!(bytes = block.len(), "processing block");
                    self.current = Some(block);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
