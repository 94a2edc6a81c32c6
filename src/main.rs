//! m5cfg - Generate and read M5Stack firmware configuration blobs.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io::{self, IsTerminal};

use clap::Parser;
use console::style;
use serde::Serialize;
use serde_json::Value;

use m5cfg::cli::{self, Cli, Commands, ConfigType};
use m5cfg::config::{default_settings_path, Settings};
use m5cfg::error::{CfgError, Result, ValidationError};
use m5cfg::input;
use m5cfg::logging;
use m5cfg::packer::{PackOutput, Packer, UnpackOutput};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> &'static str {
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
    }

    pub fn git_dirty() -> &'static str {
        option_env!("VERGEN_GIT_DIRTY").unwrap_or("false")
    }

    pub fn build_timestamp() -> &'static str {
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    }

    pub fn rustc_semver() -> &'static str {
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown")
    }

    pub fn target() -> &'static str {
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown")
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color || !io::stdout().is_terminal() {
        console::set_colors_enabled(false);
    }
    if cli.no_color || !io::stderr().is_terminal() {
        console::set_colors_enabled_stderr(false);
    }

    logging::init_logging(cli.use_json(), cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        output_error(&cli, &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Pack(args) => cmd_pack(cli, args),
        Commands::Config(args) => cmd_config(cli, args),
        Commands::Version => cmd_version(cli),
        Commands::Completions(args) => cmd_completions(cli, args),
    }
}

// === Command Implementations ===

/// Outcome of a `pack` invocation.
#[derive(Serialize)]
#[serde(untagged)]
enum PackReport {
    Generated(PackOutput),
    Decoded(UnpackOutput),
}

fn cmd_pack(cli: &Cli, args: &cli::PackArgs) -> Result<()> {
    if args.firmware.is_some() && !args.config_type.accepts_firmware() {
        return Err(ValidationError::InvalidField {
            field: "--firmware".to_string(),
            reason: "only applies to NVS config types and uiflow_config".to_string(),
        }
        .into());
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let packer = Packer::from_settings(&settings)?;
    let output = args.output.as_deref();
    let firmware = args.firmware.as_deref();

    let report = match args.config_type {
        ConfigType::UiflowRead => PackReport::Decoded(packer.unpack_uiflow(&args.input, output)?),
        ConfigType::TimercamRead => {
            PackReport::Decoded(packer.unpack_timercam(&args.input, output)?)
        }
        ConfigType::Uiflow => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_uiflow(&options, output)?)
        }
        ConfigType::Wifi => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_wifi(&options, output)?)
        }
        ConfigType::Uiflow2Nvs => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_uiflow2_nvs(&options, output, firmware)?)
        }
        ConfigType::StamplcNvs => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_stamplc_nvs(&options, output, firmware)?)
        }
        ConfigType::OpenaiNvs => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_openai_nvs(&options, output, firmware)?)
        }
        ConfigType::UiflowConfig => {
            let options = input::read_json_object(&args.input)?;
            PackReport::Generated(packer.pack_uiflow_block(&options, output, firmware)?)
        }
        ConfigType::Timercam
        | ConfigType::TimercamSmb
        | ConfigType::TimercamS3
        | ConfigType::TimercamRtsp
        | ConfigType::TimercamAliyun => {
            let mut options = input::read_json_object(&args.input)?;
            if let Some(mode) = args.config_type.timercam_mode() {
                options.insert("mode".to_string(), Value::String(mode.as_str().to_string()));
            }
            PackReport::Generated(packer.pack_timercam(&options, output)?)
        }
    };

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "ok": true,
                "config_type": args.config_type.name(),
                "result": report,
            }),
        );
    } else if !cli.quiet {
        match &report {
            PackReport::Generated(out) => println!(
                "{} {} (address: {}, {} bytes)",
                style("Created").green().bold(),
                out.path.display(),
                style(&out.address).cyan(),
                out.size
            ),
            PackReport::Decoded(out) => println!(
                "{} {}",
                style("Decoded config saved to").green().bold(),
                out.path.display()
            ),
        }
    }
    Ok(())
}

fn cmd_config(cli: &Cli, args: &cli::ConfigArgs) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let source = settings.source.clone().or_else(default_settings_path);

    if args.path {
        match &source {
            Some(path) => println!("{}", path.display()),
            None => println!("(no settings path on this platform)"),
        }
        return Ok(());
    }

    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "source": settings.source.as_ref().map(|p| p.display().to_string()),
                "settings": settings,
            }),
        );
    } else {
        let text = toml::to_string_pretty(&settings)
            .map_err(|e| CfgError::ConfigParse(e.to_string()))?;
        match &settings.source {
            Some(path) => println!("{} {}", style("# loaded from").dim(), path.display()),
            None => println!("{}", style("# built-in defaults").dim()),
        }
        print!("{text}");
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(cli: &Cli) -> Result<()> {
    if cli.use_json() {
        output_json(
            cli,
            &serde_json::json!({
                "version": build_info::VERSION,
                "git_sha": build_info::git_sha(),
                "git_dirty": build_info::git_dirty() == "true",
                "build_timestamp": build_info::build_timestamp(),
                "rustc_version": build_info::rustc_semver(),
                "target": build_info::target(),
            }),
        );
    } else {
        println!("m5cfg {}", build_info::VERSION);
        println!(
            "git: {}{}",
            build_info::git_sha(),
            if build_info::git_dirty() == "true" {
                " (dirty)"
            } else {
                ""
            }
        );
        println!("built: {}", build_info::build_timestamp());
        println!("rustc: {}", build_info::rustc_semver());
        println!("target: {}", build_info::target());
    }
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(_cli: &Cli, args: &cli::CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "m5cfg", &mut io::stdout());
    Ok(())
}

// === Utility Functions ===

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn output_error(cli: &Cli, error: &CfgError) {
    if cli.use_json() {
        let json = serde_json::json!({
            "error": true,
            "kind": error.kind(),
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| error.to_string())
        );
    } else {
        eprintln!("{}: {}", style("Error").red().bold(), error);
        if let Some(suggestion) = error.suggestion() {
            eprintln!("{}: {}", style("Hint").yellow(), suggestion);
        }
    }
}
