//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::codec::timercam::Mode;

/// m5cfg - Generate and read M5Stack firmware configuration blobs.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "m5cfg", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "M5CFG_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (defaults to the per-user m5cfg/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a configuration blob from JSON, or decode one back to JSON
    Pack(PackArgs),

    /// Show effective settings
    Config(ConfigArgs),

    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for blob generation and decoding.
///
/// # Examples
///
/// ```bash
/// # TimerCam RTSP config
/// m5cfg pack --config-type timercam_rtsp --input cam.json --output cam.cfg
///
/// # Decode a UIFlow WiFi blob read back from flash
/// m5cfg pack --config-type uiflow_read --input wifi.bin --output wifi.json
///
/// # UIFlow2 NVS image merged into a firmware image
/// m5cfg pack --config-type uiflow2_nvs --input nvs.json --firmware uiflow2.bin
/// ```
#[derive(Parser, Debug)]
pub struct PackArgs {
    /// Type of configuration operation
    #[arg(long, value_name = "TYPE")]
    pub config_type: ConfigType,

    /// Input file (JSON for generation, binary for the *_read types)
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,

    /// Output file (defaults to a per-type name in the output directory)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Firmware image: NVS types merge into it, uiflow_config places the
    /// block right after it
    #[arg(long, value_name = "FILE")]
    pub firmware: Option<PathBuf>,
}

/// Configuration operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigType {
    /// UIFlow WiFi blob from {wifi_ssid, wifi_password}
    #[value(name = "uiflow")]
    Uiflow,
    /// Decode a UIFlow WiFi blob to JSON
    #[value(name = "uiflow_read")]
    UiflowRead,
    /// WiFi blob from {ssid, password, address?}
    #[value(name = "wifi")]
    Wifi,
    /// UIFlow2 NVS partition image
    #[value(name = "uiflow2_nvs")]
    Uiflow2Nvs,
    /// StampPLC NVS partition image
    #[value(name = "stamplc_nvs")]
    StamplcNvs,
    /// OpenAI demo NVS partition image
    #[value(name = "openai_nvs")]
    OpenaiNvs,
    /// UIFlow 4 KiB config block from any JSON object
    #[value(name = "uiflow_config")]
    UiflowConfig,
    /// TimerCam basic mode
    #[value(name = "timercam")]
    Timercam,
    /// TimerCam SMB upload mode
    #[value(name = "timercam_smb")]
    TimercamSmb,
    /// TimerCam S3 upload mode
    #[value(name = "timercam_s3")]
    TimercamS3,
    /// TimerCam RTSP mode
    #[value(name = "timercam_rtsp")]
    TimercamRtsp,
    /// TimerCam Aliyun OSS mode
    #[value(name = "timercam_aliyun")]
    TimercamAliyun,
    /// Decode a TimerCam block to JSON
    #[value(name = "timercam_read")]
    TimercamRead,
}

impl ConfigType {
    /// TimerCam mode selected by this type, if it generates a TimerCam blob.
    pub const fn timercam_mode(self) -> Option<Mode> {
        match self {
            Self::Timercam => Some(Mode::Basic),
            Self::TimercamSmb => Some(Mode::Smb),
            Self::TimercamS3 => Some(Mode::S3),
            Self::TimercamRtsp => Some(Mode::Rtsp),
            Self::TimercamAliyun => Some(Mode::Aliyun),
            _ => None,
        }
    }

    /// Name as typed on the command line.
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    /// True for types that produce an NVS image.
    pub const fn is_nvs(self) -> bool {
        matches!(self, Self::Uiflow2Nvs | Self::StamplcNvs | Self::OpenaiNvs)
    }

    /// True for types that take `--firmware`.
    pub const fn accepts_firmware(self) -> bool {
        self.is_nvs() || matches!(self, Self::UiflowConfig)
    }
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Only print the settings file path
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
