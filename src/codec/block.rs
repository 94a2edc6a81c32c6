//! Length-prefixed, checksummed 4 KiB configuration block.
//!
//! ```text
//! [L: u16 big-endian][payload: L bytes][checksum(header ++ payload)][0xFF ...]
//! ```
//!
//! The block is always exactly one flash sector long.

use tracing::debug;

use super::checksum;
use super::layout::FILL;
use crate::error::{DecodeError, EncodingError};

/// Size of one block, one flash sector.
pub const BLOCK_SIZE: usize = 0x1000;

const HEADER_LEN: usize = 2;

/// Largest payload that still leaves room for header and checksum.
pub const MAX_PAYLOAD: usize = BLOCK_SIZE - HEADER_LEN - 1;

/// Frame `payload` into a full block.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let len = u16::try_from(payload.len())
        .ok()
        .filter(|&l| usize::from(l) <= MAX_PAYLOAD)
        .ok_or(EncodingError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        })?;

    let mut out = Vec::with_capacity(BLOCK_SIZE);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    let sum = checksum::compute(&out);
    out.push(sum);
    out.resize(BLOCK_SIZE, FILL);

    debug!(payload_len = payload.len(), checksum = sum, "Encoded block");
    Ok(out)
}

/// Verify a block and return its payload.
pub fn decode(block: &[u8]) -> Result<&[u8], DecodeError> {
    if block.len() < HEADER_LEN + 1 {
        return Err(DecodeError::InvalidSize {
            expected: HEADER_LEN + 1,
            actual: block.len(),
        });
    }

    let len = usize::from(u16::from_be_bytes([block[0], block[1]]));
    let sum_at = HEADER_LEN + len;
    if sum_at >= block.len() {
        return Err(DecodeError::Malformed(format!(
            "payload length {len} runs past the end of a {}-byte block",
            block.len()
        )));
    }

    let stored = block[sum_at];
    let computed = checksum::compute(&block[..sum_at]);
    if stored != computed {
        return Err(DecodeError::ChecksumMismatch {
            field: "payload",
            stored,
            computed,
        });
    }

    Ok(&block[HEADER_LEN..sum_at])
}
