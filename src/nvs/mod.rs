//! NVS partition images built from a CSV key/value table.
//!
//! The image itself is produced by an external generator (ESP-IDF's
//! `nvs_partition_gen.py`); this module owns the CSV contract handed to it
//! and the [`NvsImageGenerator`] seam that lets tests swap the tool out.

mod generator;
mod mixin;
pub mod mock;
mod profile;
mod table;

pub use generator::{ExternalGenerator, NvsImageGenerator};
pub use mixin::{mixin, NVS_OFFSET};
pub use profile::{
    OpenAiConfig, StampPlcConfig, Uiflow2Config, WifiNetwork, MAX_WIFI_NETWORKS, OPENAI_NAMESPACE,
};
pub use table::{Encoding, NvsEntry, NvsTable};

/// Size of the NVS partition passed to the generator.
pub const NVS_PARTITION_SIZE: u32 = 0x6000;

/// Namespace the UIFlow-based firmwares read their settings from.
pub const NAMESPACE: &str = "uiflow";
