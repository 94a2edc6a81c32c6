//! Splice a generated NVS image into a full firmware image.

use tracing::debug;

use super::NVS_PARTITION_SIZE;
use crate::error::{DecodeError, EncodingError, Result};

/// Flash offset of the NVS partition inside a firmware image.
pub const NVS_OFFSET: usize = 0x9000;

/// `firmware[..0x9000] ++ nvs ++ firmware[0x9000 + 0x6000..]`.
pub fn mixin(firmware: &[u8], nvs: &[u8]) -> Result<Vec<u8>> {
    let size = NVS_PARTITION_SIZE as usize;
    let tail = NVS_OFFSET + size;

    if firmware.len() < tail {
        return Err(DecodeError::InvalidSize {
            expected: tail,
            actual: firmware.len(),
        }
        .into());
    }
    if nvs.len() != size {
        return Err(EncodingError::ImageSizeMismatch {
            expected: size,
            actual: nvs.len(),
        }
        .into());
    }

    let mut out = Vec::with_capacity(firmware.len());
    out.extend_from_slice(&firmware[..NVS_OFFSET]);
    out.extend_from_slice(nvs);
    out.extend_from_slice(&firmware[tail..]);

    debug!(firmware_len = firmware.len(), "Mixed NVS image into firmware");
    Ok(out)
}
