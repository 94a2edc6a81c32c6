//! Fixed-offset field regions inside a blob.
//!
//! A [`Region`] names a byte range of a fixed-size buffer. Every write goes
//! through [`BlobWriter::put_field`], which refuses anything that would spill
//! into the neighbouring region, so a long value fails instead of silently
//! clobbering a checksum.

use tracing::trace;

use super::checksum;
use crate::error::{DecodeError, EncodingError};

/// Filler for unused bytes. Matches erased flash.
pub const FILL: u8 = 0xFF;

/// A named byte range `[offset, offset + len)` inside a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub const fn new(name: &'static str, offset: usize, len: usize) -> Self {
        Self { name, offset, len }
    }

    /// One past the last byte of the region.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Largest value a length-prefixed, checksummed field can hold here.
    pub const fn field_capacity(&self) -> usize {
        self.len.saturating_sub(2)
    }
}

/// Builds a `N`-byte blob from length-prefixed fields.
///
/// Field layout within a region: `[len][value bytes][checksum(value)]`.
#[derive(Debug, Clone)]
pub struct BlobWriter<const N: usize> {
    buf: [u8; N],
}

impl<const N: usize> Default for BlobWriter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BlobWriter<N> {
    /// A blob filled with [`FILL`].
    pub const fn new() -> Self {
        Self { buf: [FILL; N] }
    }

    /// Write a length-prefixed, checksummed field at the start of `region`.
    pub fn put_field(&mut self, region: Region, value: &[u8]) -> Result<(), EncodingError> {
        debug_assert!(region.end() <= N, "region {} outside blob", region.name);

        let max = region.field_capacity().min(usize::from(u8::MAX));
        if value.len() > max {
            return Err(EncodingError::FieldTooLong {
                field: region.name,
                len: value.len(),
                max,
            });
        }

        let start = region.offset;
        let sum = checksum::compute(value);
        #[allow(clippy::cast_possible_truncation)] // bounded by `max` above
        let len_byte = value.len() as u8;

        self.buf[start] = len_byte;
        self.buf[start + 1..start + 1 + value.len()].copy_from_slice(value);
        self.buf[start + 1 + value.len()] = sum;

        trace!(
            field = region.name,
            offset = start,
            len = value.len(),
            checksum = sum,
            "Wrote field"
        );
        Ok(())
    }

    pub fn finish(self) -> [u8; N] {
        self.buf
    }
}

/// Reads length-prefixed fields back out of a blob.
#[derive(Debug, Clone, Copy)]
pub struct BlobReader<'a> {
    buf: &'a [u8],
}

impl<'a> BlobReader<'a> {
    /// Wrap `buf`, which must hold at least `size` bytes.
    pub fn new(buf: &'a [u8], size: usize) -> Result<Self, DecodeError> {
        if buf.len() < size {
            return Err(DecodeError::InvalidSize {
                expected: size,
                actual: buf.len(),
            });
        }
        Ok(Self { buf: &buf[..size] })
    }

    /// Read and verify the field stored at the start of `region`.
    pub fn field(&self, region: Region) -> Result<&'a [u8], DecodeError> {
        let start = region.offset;
        let len = usize::from(self.buf[start]);
        if len > region.field_capacity() {
            return Err(DecodeError::Malformed(format!(
                "{} length {len} overruns its {}-byte region",
                region.name, region.len
            )));
        }

        let value = &self.buf[start + 1..start + 1 + len];
        let stored = self.buf[start + 1 + len];
        let computed = checksum::compute(value);
        if stored != computed {
            return Err(DecodeError::ChecksumMismatch {
                field: region.name,
                stored,
                computed,
            });
        }
        Ok(value)
    }
}
