//! Tool settings loaded from an optional TOML file.
//!
//! ```toml
//! output_dir = "~/m5cfg/out"
//!
//! [nvs]
//! program = "python3"
//! args = ["/opt/esp-idf/components/nvs_flash/nvs_partition_generator/nvs_partition_gen.py"]
//! timeout_secs = 60
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::path::{default_settings_path, resolve_path};
use crate::error::{CfgError, Result};
use crate::nvs::ExternalGenerator;

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where generated blobs and intermediate CSV files go.
    pub output_dir: PathBuf,
    pub nvs: NvsToolSettings,
    /// File these settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("tmp"),
            nvs: NvsToolSettings::default(),
            source: None,
        }
    }
}

/// How to invoke the NVS partition generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NvsToolSettings {
    pub program: String,
    /// Arguments placed before `generate <csv> <output> <size>`.
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for NvsToolSettings {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["nvs_partition_gen.py".to_string()],
            timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the per-user settings file
    /// is read when present and built-in defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CfgError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
            return Self::from_file(path);
        }

        match default_settings_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML settings file; relative paths resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut settings: Self = toml::from_str(&text)
            .map_err(|e| CfgError::ConfigParse(format!("{}: {e}", path.display())))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.output_dir = resolve_path(&settings.output_dir, base)?;
        settings.source = Some(path.to_path_buf());

        info!(
            path = %path.display(),
            output_dir = %settings.output_dir.display(),
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Create the output directory if needed. Safe to call repeatedly.
    pub fn ensure_output_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(&self.output_dir)
    }

    /// The external NVS generator described by these settings.
    pub fn generator(&self) -> ExternalGenerator {
        ExternalGenerator::new(
            self.nvs.program.clone(),
            self.nvs.args.clone(),
            Duration::from_secs(self.nvs.timeout_secs),
        )
    }
}
