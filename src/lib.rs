//! # heapfile
//!
//! A flat-file heap storage layer: fixed-size records packed into fixed-size
//! blocks, with:
//! - A block-buffered sequential Writer
//! - A Reader with optional double-buffered read-ahead (disk latency for
//!   block k+1 hidden behind decode time for block k)
//! - A compact fixed-width record codec
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   encode    ┌──────────────┐   full block   ┌──────────┐
//! │   Records    │────────────▶│  HeapWriter  │───────────────▶│   File   │
//! └──────────────┘             │ (block buf)  │                │ (header  │
//!                              └──────────────┘                │ + blocks)│
//!                                                              └────┬─────┘
//!                              ┌──────────────┐   block loads       │
//! ┌──────────────┐   decode    │  HeapReader  │◀────────────────────┘
//! │   Records    │◀────────────│ (1-2 buffers │   (loader thread,
//! └──────────────┘             │  circulating)│    one read in flight)
//!                              └──────────────┘
//! ```
//!
//! Non-goals: no indexing, no deletes or in-place updates, no crash
//! recovery, no concurrent writers.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod heap;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HeapError, Result};
pub use config::Config;
pub use record::{Record, MAX_DATA_LEN, RECORD_SIZE};
pub use heap::{Header, HeapReader, HeapWriter, RecordScan, WriteStats, HEADER_SIZE};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of heapfile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
