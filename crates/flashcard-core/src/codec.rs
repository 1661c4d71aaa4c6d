//! Fixed-width binary encoding of card scheduling state.
//!
//! ## Record layout
//!
//! | Offset | Size | Content |
//! |---|---|---|
//! | 0 | 1 | Leitner box (0 = New, 1 = Ok, 2 = Good) |
//! | 1 | 4 | `due_at`, unsigned, little-endian |
//!
//! A deck snapshot is the concatenation of its records in deck order. Blobs
//! whose length is not a multiple of [`RECORD_WIDTH`] are rejected whole.

use alloc::vec::Vec;

use crate::config::RECORD_WIDTH;
use crate::scheduler::{CardState, LeitnerBox};

/// Persisted state failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionError {
    /// Blob length does not match the expected record count
    BadLength {
        /// Bytes found
        len: usize,
        /// Bytes expected, when the record count is known
        expected: Option<usize>,
    },
    /// A record holds a box value above `Good`
    InvalidBox {
        /// Record position within the blob
        record: usize,
        /// Raw box byte
        value: u8,
    },
}

impl core::fmt::Display for CorruptionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CorruptionError::BadLength {
                len,
                expected: Some(expected),
            } => write!(f, "Corrupted state: {len} bytes, expected {expected}"),
            CorruptionError::BadLength {
                len,
                expected: None,
            } => write!(
                f,
                "Corrupted state: {len} bytes is not a multiple of {RECORD_WIDTH}"
            ),
            CorruptionError::InvalidBox { record, value } => {
                write!(f, "Corrupted state: record {record} has box {value}")
            }
        }
    }
}

impl core::error::Error for CorruptionError {}

/// Encode one card state into its 5-byte record
pub fn encode(leitner_box: LeitnerBox, due_at: u32) -> [u8; RECORD_WIDTH] {
    let mut record = [0u8; RECORD_WIDTH];
    record[0] = leitner_box as u8;
    record[1..].copy_from_slice(&due_at.to_le_bytes());
    record
}

fn decode_record(record: usize, bytes: &[u8]) -> Result<CardState, CorruptionError> {
    let leitner_box = LeitnerBox::from_u8(bytes[0]).ok_or(CorruptionError::InvalidBox {
        record,
        value: bytes[0],
    })?;
    let due_at = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    Ok(CardState::new(leitner_box, due_at))
}

/// Decode a blob holding exactly one record.
///
/// # Errors
///
/// [`CorruptionError::BadLength`] unless the blob is exactly one record long,
/// [`CorruptionError::InvalidBox`] if the box byte is out of range.
pub fn decode(bytes: &[u8]) -> Result<(LeitnerBox, u32), CorruptionError> {
    if bytes.len() % RECORD_WIDTH != 0 {
        return Err(CorruptionError::BadLength {
            len: bytes.len(),
            expected: None,
        });
    }
    if bytes.len() != RECORD_WIDTH {
        return Err(CorruptionError::BadLength {
            len: bytes.len(),
            expected: Some(RECORD_WIDTH),
        });
    }
    let state = decode_record(0, bytes)?;
    Ok((state.leitner_box, state.due_at))
}

/// Encode a whole deck's states, in order
pub fn encode_records(states: impl IntoIterator<Item = CardState>) -> Vec<u8> {
    let states = states.into_iter();
    let mut blob = Vec::with_capacity(states.size_hint().0 * RECORD_WIDTH);
    for state in states {
        blob.extend_from_slice(&encode(state.leitner_box, state.due_at));
    }
    blob
}

/// Decode a whole deck snapshot. Nothing is returned unless every record is valid.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<CardState>, CorruptionError> {
    if bytes.len() % RECORD_WIDTH != 0 {
        return Err(CorruptionError::BadLength {
            len: bytes.len(),
            expected: None,
        });
    }
    bytes
        .chunks_exact(RECORD_WIDTH)
        .enumerate()
        .map(|(record, chunk)| decode_record(record, chunk))
        .collect()
}
