//! Additive checksum used by every blob format.
//!
//! Firmware calls this a "CRC8", but it is a plain byte sum truncated to
//! eight bits.

/// Sum of all bytes modulo 256. The empty sequence sums to 0.
pub fn compute(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
