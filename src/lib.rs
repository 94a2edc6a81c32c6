//! m5cfg library - host-side codecs for M5Stack firmware configuration blobs.
//!
//! This library exposes the core functionality of the `m5cfg` CLI for use in
//! tests and other tools.
//!
//! # Modules
//!
//! - `codec`: checksum, WiFi blob, 4 KiB JSON block and TimerCam schemas
//! - `nvs`: NVS CSV tables and the partition generator seam
//! - `packer`: validate, encode and write blobs into an output directory
//! - `config`: optional TOML settings
//! - `error`: error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod nvs;
pub mod packer;
