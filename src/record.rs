//! Record type and fixed-width codec
//!
//! Every record serializes to exactly [`RECORD_SIZE`] bytes, so blocks can
//! pack records at a fixed stride with no per-record framing.
//!
//! ## Wire Format (little-endian)
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ Id: 16 bytes | PayloadLen: u32 (4) | Payload: 16      │
//! │              (payload zero-padded to MAX_DATA_LEN)    │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! Decoding uses the stored payload length, never a terminator scan: the
//! payload may legitimately contain 0x00 bytes (embedded NUL is valid UTF-8).

use std::fmt;

use bytes::{BufMut, BytesMut};
use uuid::Uuid;

use crate::error::{HeapError, Result};

/// Maximum UTF-8 byte length of a record payload
pub const MAX_DATA_LEN: usize = 16;

/// Serialized record size: Id (16) + PayloadLen (4) + Payload (16) = 36 bytes
pub const RECORD_SIZE: usize = 16 + 4 + MAX_DATA_LEN;

/// One fixed-size logical entry in a heap file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Opaque 128-bit identity; no ordering semantics
    pub id: Uuid,
    /// Short text payload, at most MAX_DATA_LEN bytes of UTF-8
    pub data: String,
}

impl Record {
    /// Create a record from its parts
    ///
    /// The payload is not validated here; oversize payloads are rejected at
    /// encode time with [`HeapError::RecordOverflow`].
    pub fn new(id: Uuid, data: impl Into<String>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// Synthesize a numbered record with a fresh random id
    ///
    /// Used by the bulk generator and tests.
    pub fn with_sequence(n: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            data: format!("Record {}", n),
        }
    }

    /// Append exactly [`RECORD_SIZE`] bytes to `buf`
    ///
    /// Rejects payloads longer than [`MAX_DATA_LEN`] rather than truncating;
    /// nothing is written on failure.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<()> {
        let len = self.data.len();
        if len > MAX_DATA_LEN {
            return Err(HeapError::RecordOverflow {
                len,
                max: MAX_DATA_LEN,
            });
        }

        buf.put_slice(self.id.as_bytes());
        buf.put_u32_le(len as u32);
        buf.put_slice(self.data.as_bytes());
        buf.put_bytes(0, MAX_DATA_LEN - len);

        Ok(())
    }

    /// Decode a record from exactly [`RECORD_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECORD_SIZE {
            return Err(HeapError::Format(format!(
                "record slice is {} bytes, expected {}",
                bytes.len(),
                RECORD_SIZE
            )));
        }

        let id = Uuid::from_bytes(bytes[0..16].try_into().unwrap());

        let len = u32::from_le_bytes(bytes[16..20].try_into().unwrap()) as usize;
        if len > MAX_DATA_LEN {
            return Err(HeapError::Format(format!(
                "stored payload length {} exceeds capacity of {}",
                len, MAX_DATA_LEN
            )));
        }

        // Only the first `len` payload bytes are data; the rest is padding.
        let data = std::str::from_utf8(&bytes[20..20 + len])
            .map_err(|e| HeapError::Format(format!("payload is not valid UTF-8: {}", e)))?
            .to_string();

        Ok(Self { id, data })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.data)
    }
}
