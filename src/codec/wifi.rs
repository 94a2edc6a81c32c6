//! Fixed 100-byte WiFi credential blob.
//!
//! ```text
//! offset 0   ssid_len
//!        1   ssid bytes
//!        1+n ssid checksum
//!        ..  0xFF up to 50
//! offset 50  pwd_len
//!        51  password bytes
//!        51+m password checksum
//!        ..  0xFF up to 100
//! ```
//!
//! Checksums cover the credential bytes only, never the length byte.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::{BlobReader, BlobWriter, Region};
use crate::error::{DecodeError, EncodingError};

/// Total blob size in bytes.
pub const WIFI_BLOB_SIZE: usize = 100;

/// SSID region. Holds at most 48 bytes of SSID.
pub const SSID_REGION: Region = Region::new("ssid", 0, 50);

/// Password region. Holds at most 47 bytes; the final blob byte stays 0xFF.
pub const PASSWORD_REGION: Region = Region::new("password", 50, 49);

pub const MAX_SSID_LEN: usize = SSID_REGION.field_capacity();
pub const MAX_PASSWORD_LEN: usize = PASSWORD_REGION.field_capacity();

pub type WifiBlob = [u8; WIFI_BLOB_SIZE];

/// Decoded WiFi credentials.
///
/// Serializes with the UIFlow option names, `wifi_ssid` and `wifi_password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    #[serde(rename = "wifi_ssid")]
    pub ssid: String,
    #[serde(rename = "wifi_password")]
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

/// Build the blob. Both fields are checked before anything is returned.
pub fn encode(ssid: &str, password: &str) -> Result<WifiBlob, EncodingError> {
    let mut writer = BlobWriter::<WIFI_BLOB_SIZE>::new();
    writer.put_field(SSID_REGION, ssid.as_bytes())?;
    writer.put_field(PASSWORD_REGION, password.as_bytes())?;

    debug!(
        ssid_len = ssid.len(),
        password_len = password.len(),
        "Encoded WiFi blob"
    );
    Ok(writer.finish())
}

/// Parse and verify a blob. Bytes past the first 100 are ignored.
pub fn decode(blob: &[u8]) -> Result<WifiCredentials, DecodeError> {
    let reader = BlobReader::new(blob, WIFI_BLOB_SIZE)?;

    let ssid = utf8(SSID_REGION, reader.field(SSID_REGION)?)?;
    let password = utf8(PASSWORD_REGION, reader.field(PASSWORD_REGION)?)?;

    debug!(ssid_len = ssid.len(), "Decoded WiFi blob");
    Ok(WifiCredentials { ssid, password })
}

fn utf8(region: Region, bytes: &[u8]) -> Result<String, DecodeError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| DecodeError::Malformed(format!("{} is not valid UTF-8: {e}", region.name)))
}
