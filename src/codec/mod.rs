//! Binary codecs for firmware configuration blobs.
//!
//! - `checksum`: single-byte additive checksum shared by every format
//! - `layout`: bounds-checked writer/reader for fixed-offset regions
//! - `wifi`: the 100-byte WiFi credential blob
//! - `block`: the 4096-byte length-prefixed, checksummed JSON block
//! - `timercam`: per-mode TimerCam schema validation on top of `block`
//! - `resolution`: camera resolution index table

pub mod block;
pub mod checksum;
pub mod layout;
pub mod resolution;
pub mod timercam;
pub mod wifi;

/// Flash offset where firmware expects the WiFi and TimerCam blobs.
pub const CONFIG_BLOB_ADDRESS: &str = "0x3ff000";

/// Flash offset of the NVS partition.
pub const NVS_PARTITION_ADDRESS: &str = "0x9000";
