//! TimerCam configuration: per-mode schema on top of the 4 KiB JSON block.
//!
//! Encoding runs in a fixed order so that the caller always gets the most
//! useful error first:
//!
//! 1. resolve the `mode` selector
//! 2. range-check the resolution field, if present
//! 3. collect every missing required field
//! 4. project the input down to exactly the required fields
//! 5. frame the compact JSON payload into a [`block`](super::block)

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use super::{block, resolution};
use crate::error::{DecodeError, EncodingError, Result, ValidationError};

/// Operating mode of the camera firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Periodic wake-up and capture.
    Basic,
    /// Upload captures to an SMB share.
    Smb,
    /// Upload captures to an S3 bucket.
    S3,
    /// Serve an RTSP stream.
    Rtsp,
    /// Upload captures to Aliyun OSS.
    Aliyun,
}

impl Mode {
    pub const ALL: [Self; 5] = [Self::Basic, Self::Smb, Self::S3, Self::Rtsp, Self::Aliyun];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Smb => "smb",
            Self::S3 => "s3",
            Self::Rtsp => "rtsp",
            Self::Aliyun => "aliyun",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }

    /// Fields the firmware reads in this mode, in payload order.
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["ssid", "pwd", "wake_time", "image_size"],
            Self::Smb => &[
                "wifi_ssid",
                "wifi_pwd",
                "smb_host",
                "smb_user",
                "smb_pwd",
                "smb_path",
                "pic_name",
                "size",
                "interval",
            ],
            Self::S3 => &[
                "wifi_ssid",
                "wifi_pwd",
                "amazon_s3_host",
                "access_key",
                "secret_access_key",
                "pic_path",
                "pic_name",
                "size",
                "interval",
            ],
            Self::Rtsp => &["wifi_ssid", "wifi_pwd"],
            Self::Aliyun => &[
                "ssid",
                "pwd",
                "wake_time",
                "image_size",
                "access_key",
                "access_key_secret",
                "server_url",
                "bucket_name",
            ],
        }
    }

    /// Resolution field name and the indices it may take.
    pub const fn resolution_rule(self) -> Option<(&'static str, &'static [u8])> {
        match self {
            Self::Basic | Self::Aliyun => Some(("image_size", resolution::BASIC)),
            Self::Smb | Self::S3 => Some(("size", resolution::SMB_S3)),
            Self::Rtsp => None,
        }
    }

    /// Default output file name for a generated blob.
    pub fn file_name(self) -> String {
        format!("timercam-{}.cfg", self.as_str())
    }

    /// Read the `mode` selector out of a raw option map.
    pub fn from_options(options: &Map<String, Value>) -> std::result::Result<Self, ValidationError> {
        match options.get("mode") {
            None | Some(Value::Null) => Err(ValidationError::MissingMode),
            Some(Value::String(s)) => s.parse(),
            Some(other) => Err(ValidationError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownMode { mode: s.to_string() })
    }
}

/// A validated TimerCam configuration holding exactly its mode's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerCamConfig {
    mode: Mode,
    fields: Map<String, Value>,
}

impl TimerCamConfig {
    /// Validate raw options, taking the mode from their `mode` key.
    pub fn from_options(options: &Map<String, Value>) -> std::result::Result<Self, ValidationError> {
        let mode = Mode::from_options(options)?;
        Self::with_mode(mode, options)
    }

    /// Validate raw options against an explicit mode.
    pub fn with_mode(
        mode: Mode,
        options: &Map<String, Value>,
    ) -> std::result::Result<Self, ValidationError> {
        check_resolution(mode, options)?;

        let missing: Vec<String> = mode
            .required_fields()
            .iter()
            .filter(|f| !options.contains_key(**f))
            .map(|f| (*f).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                context: format!("{mode} mode"),
                fields: missing,
            });
        }

        let fields = mode
            .required_fields()
            .iter()
            .filter_map(|f| options.get(*f).map(|v| ((*f).to_string(), v.clone())))
            .collect();

        Ok(Self { mode, fields })
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Compact JSON, keys in schema order.
    pub fn payload(&self) -> Vec<u8> {
        Value::Object(self.fields.clone()).to_string().into_bytes()
    }

    /// Serialize into a full 4096-byte block.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, EncodingError> {
        let payload = self.payload();
        debug!(
            mode = %self.mode,
            payload_len = payload.len(),
            "Encoding TimerCam config"
        );
        block::encode(&payload)
    }
}

fn check_resolution(
    mode: Mode,
    options: &Map<String, Value>,
) -> std::result::Result<(), ValidationError> {
    let Some((field, allowed)) = mode.resolution_rule() else {
        return Ok(());
    };
    let Some(value) = options.get(field) else {
        return Ok(());
    };

    let in_range = value
        .as_u64()
        .and_then(|v| u8::try_from(v).ok())
        .is_some_and(|v| allowed.contains(&v));
    if in_range {
        Ok(())
    } else {
        Err(ValidationError::InvalidResolution {
            mode,
            field,
            allowed,
        })
    }
}

/// Validate `options` (mode taken from its `mode` key) and build the block.
pub fn encode(options: &Map<String, Value>) -> Result<Vec<u8>> {
    let config = TimerCamConfig::from_options(options)?;
    Ok(config.encode()?)
}

/// Verify a block and parse its JSON object.
pub fn decode(data: &[u8]) -> std::result::Result<Map<String, Value>, DecodeError> {
    let payload = block::decode(data)?;
    match serde_json::from_slice(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DecodeError::Malformed(format!(
            "payload is JSON but not an object: {other}"
        ))),
        Err(e) => Err(DecodeError::Malformed(format!("payload is not JSON: {e}"))),
    }
}
