use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sceneconfig::{AntialiasSetting, InputSetting};

#[derive(Parser, Debug)]
#[command(
    name = "cubesearch",
    author,
    version,
    about = "Shadertoy cube with a search box",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Shadertoy id or URL to show instead of the configured list.
    #[arg(value_name = "SHADER")]
    pub shader: Option<String>,

    /// Read configuration from this file instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Shadertoy API key; can also be supplied via the `SHADERTOY_API_KEY` env var.
    #[arg(long, env = "SHADERTOY_API_KEY", hide_env_values = true)]
    pub shadertoy_api_key: Option<String>,

    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Open the window borderless fullscreen.
    #[arg(long)]
    pub fullscreen: bool,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<AntialiasSetting>,

    /// How keys reach the search box: `field` or `window`.
    #[arg(long, value_name = "MODE", value_parser = parse_input)]
    pub input: Option<InputSetting>,

    /// Seed for the initial shader pick.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration directory and file.
    Where,
    /// Print the effective configuration as TOML, API key masked.
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32), String> {
    let (width, height) = spec
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_antialias(value: &str) -> Result<AntialiasSetting, String> {
    if value.trim().is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }
    value
        .parse::<AntialiasSetting>()
        .map_err(|err| format!("{err}; use auto/off or 2/4/8/16"))
}

pub fn parse_input(value: &str) -> Result<InputSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "field" => Ok(InputSetting::Field),
        "window" | "global" => Ok(InputSetting::Window),
        other => Err(format!("unknown input mode '{other}'; expected field or window")),
    }
}
