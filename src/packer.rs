//! Turns option maps into blob files and back.
//!
//! Every `pack_*` method validates and encodes completely before touching the
//! filesystem, so a failed call never leaves a partial blob behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::codec::block;
use crate::codec::timercam::{self, TimerCamConfig};
use crate::codec::wifi::{self, WifiCredentials};
use crate::codec::{CONFIG_BLOB_ADDRESS, NVS_PARTITION_ADDRESS};
use crate::config::Settings;
use crate::error::{DecodeError, Result, ResultExt};
use crate::input::{optional_string, require_fields, string_field};
use crate::nvs::{
    self, NvsImageGenerator, NvsTable, OpenAiConfig, StampPlcConfig, Uiflow2Config,
};

/// Flash address of a merged firmware image.
///
/// The image starts at offset 0, so that is where it is written. Older tools
/// reported `0x9000` here, the offset of the NVS partition inside it.
pub const FIRMWARE_ADDRESS: &str = "0x0";

/// A written blob and where firmware expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackOutput {
    pub address: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A decoded blob and the JSON file it was written to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnpackOutput {
    pub path: PathBuf,
    pub config: Value,
}

/// Writes blobs into an output directory.
pub struct Packer {
    out_dir: PathBuf,
    generator: Box<dyn NvsImageGenerator>,
}

impl std::fmt::Debug for Packer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packer")
            .field("out_dir", &self.out_dir)
            .field("generator", &self.generator.name())
            .finish()
    }
}

impl Packer {
    /// Create a packer, creating `out_dir` if it does not exist.
    pub fn new(out_dir: impl Into<PathBuf>, generator: Box<dyn NvsImageGenerator>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        debug!(out_dir = %out_dir.display(), generator = generator.name(), "Created packer");
        Ok(Self { out_dir, generator })
    }

    /// Packer using the settings' output directory and external generator.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let out_dir = settings.ensure_output_dir()?.to_path_buf();
        Self::new(out_dir, Box::new(settings.generator()))
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn target(&self, output: Option<&Path>, default_name: &str) -> PathBuf {
        output.map_or_else(|| self.out_dir.join(default_name), Path::to_path_buf)
    }

    // === WiFi blob ===

    /// UIFlow WiFi blob from `{wifi_ssid, wifi_password}`.
    pub fn pack_uiflow(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
    ) -> Result<PackOutput> {
        require_fields(options, &["wifi_ssid", "wifi_password"], "UIFlow config")?;
        let ssid = string_field(options, "wifi_ssid")?;
        let password = string_field(options, "wifi_password")?;

        let blob = wifi::encode(ssid, password)?;
        write_blob(&self.target(output, "wifi.bin"), CONFIG_BLOB_ADDRESS, &blob)
    }

    /// WiFi blob from `{ssid, password, address?}`.
    pub fn pack_wifi(&self, options: &Map<String, Value>, output: Option<&Path>) -> Result<PackOutput> {
        require_fields(options, &["ssid", "password"], "WiFi config")?;
        let ssid = string_field(options, "ssid")?;
        let password = string_field(options, "password")?;
        let address = optional_string(options, "address")?.unwrap_or(CONFIG_BLOB_ADDRESS);

        let blob = wifi::encode(ssid, password)?;
        write_blob(&self.target(output, "wifi.bin"), address, &blob)
    }

    /// Decode a WiFi blob file.
    pub fn read_uiflow(&self, input: &Path) -> Result<WifiCredentials> {
        let data = read_input(input)?;
        let credentials = wifi::decode(&data)?;
        info!(input = %input.display(), "Decoded UIFlow config");
        Ok(credentials)
    }

    /// Decode a WiFi blob file and save it as `{wifi_ssid, wifi_password}` JSON.
    pub fn unpack_uiflow(&self, input: &Path, output: Option<&Path>) -> Result<UnpackOutput> {
        let credentials = self.read_uiflow(input)?;
        write_json(
            self.target(output, "uiflow.json"),
            serde_json::to_value(&credentials)?,
        )
    }

    // === UIFlow config block ===

    /// Frame an arbitrary option object into a 4 KiB config block.
    ///
    /// Keys keep their input order. The block sits right after the firmware
    /// image, so with `firmware` the address is that image's size; otherwise
    /// the usual config address is reported.
    pub fn pack_uiflow_block(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
        firmware: Option<&Path>,
    ) -> Result<PackOutput> {
        let address = match firmware {
            Some(path) => {
                let len = fs::metadata(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?
                    .len();
                format!("{len:#x}")
            }
            None => CONFIG_BLOB_ADDRESS.to_string(),
        };

        let payload = Value::Object(options.clone()).to_string();
        let framed = block::encode(payload.as_bytes())?;
        write_blob(&self.target(output, "uiflow.cfg"), &address, &framed)
    }

    // === TimerCam block ===

    /// TimerCam block; the mode comes from the options' `mode` key.
    pub fn pack_timercam(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
    ) -> Result<PackOutput> {
        let config = TimerCamConfig::from_options(options)?;
        let block = config.encode()?;
        let name = config.mode().file_name();
        write_blob(&self.target(output, &name), CONFIG_BLOB_ADDRESS, &block)
    }

    /// Decode a TimerCam block file and save its JSON payload.
    pub fn unpack_timercam(&self, input: &Path, output: Option<&Path>) -> Result<UnpackOutput> {
        let data = read_input(input)?;
        let fields = timercam::decode(&data)?;
        info!(input = %input.display(), fields = fields.len(), "Decoded TimerCam config");
        write_json(self.target(output, "timercam.json"), Value::Object(fields))
    }

    // === NVS images ===

    /// UIFlow2 NVS image, optionally merged into a firmware image.
    ///
    /// A bare image is reported at `0x9000`. A merged image is reported at
    /// [`FIRMWARE_ADDRESS`] (`0x0`), not the legacy `0x9000`.
    pub fn pack_uiflow2_nvs(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
        firmware: Option<&Path>,
    ) -> Result<PackOutput> {
        let table = Uiflow2Config::from_options(options)?.to_table()?;
        self.pack_nvs(&table, "uiflow2", output, firmware)
    }

    /// StampPLC NVS image, optionally merged into a firmware image.
    ///
    /// Addresses as for [`Self::pack_uiflow2_nvs`]: a merged image is
    /// reported at `0x0`.
    pub fn pack_stamplc_nvs(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
        firmware: Option<&Path>,
    ) -> Result<PackOutput> {
        let table = StampPlcConfig::from_options(options)?.to_table();
        self.pack_nvs(&table, "stamplc", output, firmware)
    }

    /// OpenAI demo NVS image (`config` namespace), optionally merged into a
    /// firmware image. A merged image is reported at `0x0`.
    pub fn pack_openai_nvs(
        &self,
        options: &Map<String, Value>,
        output: Option<&Path>,
        firmware: Option<&Path>,
    ) -> Result<PackOutput> {
        let table = OpenAiConfig::from_options(options)?.to_table();
        self.pack_nvs(&table, "openai", output, firmware)
    }

    fn pack_nvs(
        &self,
        table: &NvsTable,
        stem: &str,
        output: Option<&Path>,
        firmware: Option<&Path>,
    ) -> Result<PackOutput> {
        let firmware = firmware.map(read_input).transpose()?;
        if let Some(raw) = &firmware {
            // Must hold the whole partition before the generator runs.
            let needed = nvs::NVS_OFFSET + nvs::NVS_PARTITION_SIZE as usize;
            if raw.len() < needed {
                return Err(DecodeError::InvalidSize {
                    expected: needed,
                    actual: raw.len(),
                }
                .into());
            }
        }

        let csv_path = self.out_dir.join(format!("{stem}.csv"));
        fs::write(&csv_path, table.to_csv())?;
        debug!(csv = %csv_path.display(), rows = table.entries().len(), "Wrote NVS CSV");

        // The tool writes to a scratch file; only a finished image is moved
        // to a path the caller sees.
        let cfg_name = format!("{stem}-cfg.bin");
        let partial = self.out_dir.join(format!(".{cfg_name}.partial"));
        discard(&partial);
        if let Err(e) = self
            .generator
            .generate(&csv_path, &partial, nvs::NVS_PARTITION_SIZE)
        {
            discard(&partial);
            return Err(e.into());
        }

        let Some(raw) = firmware else {
            let image_path = self.target(output, &cfg_name);
            let size = fs::metadata(&partial)?.len();
            persist(&partial, &image_path)?;
            return Ok(report(NVS_PARTITION_ADDRESS, image_path, size));
        };

        let image_path = self.out_dir.join(&cfg_name);
        persist(&partial, &image_path)?;
        let image = fs::read(&image_path)?;
        let merged = nvs::mixin(&raw, &image)?;
        write_blob(
            &self.target(output, &format!("{stem}-mixin.bin")),
            FIRMWARE_ADDRESS,
            &merged,
        )
    }
}

/// Move a finished file into place, copying when the rename crosses filesystems.
fn persist(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial image"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove partial image"),
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_blob(path: &Path, address: &str, bytes: &[u8]) -> Result<PackOutput> {
    fs::write(path, bytes)?;
    Ok(report(address, path.to_path_buf(), bytes.len() as u64))
}

fn report(address: &str, path: PathBuf, size: u64) -> PackOutput {
    info!(path = %path.display(), address, size, "Wrote blob");
    PackOutput {
        address: address.to_string(),
        path,
        size,
    }
}

fn write_json(path: PathBuf, config: Value) -> Result<UnpackOutput> {
    fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    info!(path = %path.display(), "Wrote decoded config");
    Ok(UnpackOutput { path, config })
}
