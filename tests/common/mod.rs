//! Common test utilities for the m5cfg CLI.
//!
//! - `cli`: CLI runner with output verification and fluent assertions
//! - fixture helpers for input JSON, settings files and firmware images


use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Write `value` as JSON to `dir/name` and return the path.
pub fn write_input(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

/// Shell script standing in for the partition tool.
///
/// Invoked as `sh -c <script> generate <csv> <out> <size>`, so `$2` is the
/// output path. Writes 0x6000 bytes of 0xFF.
pub const FAKE_NVS_TOOL: &str =
    r#"test "$0" = generate && head -c 24576 /dev/zero | tr '\000' '\377' > "$2""#;

/// Write a settings file sending output to `dir/out` and using `script` as
/// the partition tool.
pub fn write_settings(dir: &Path, script: &str, timeout_secs: u64) -> PathBuf {
    let path = dir.join("config.toml");
    let text = format!(
        "output_dir = \"out\"\n\n[nvs]\nprogram = \"sh\"\nargs = [\"-c\", {}]\ntimeout_secs = {timeout_secs}\n",
        toml_string(script)
    );
    fs::write(&path, text).unwrap();
    path
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

/// A firmware image large enough to hold the NVS partition, filled with a
/// recognizable byte.
pub fn write_firmware(dir: &Path, len: usize) -> PathBuf {
    let path = dir.join("firmware.bin");
    fs::write(&path, vec![0xA5u8; len]).unwrap();
    path
}
