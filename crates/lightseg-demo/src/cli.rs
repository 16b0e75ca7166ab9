#![forbid(unsafe_code)]

//! Command-line argument parsing for the segmenter.
//!
//! Parses args manually. Supports environment variable overrides via the
//! `LIGHTSEG_*` prefix.

use std::env;
use std::fmt;
use std::path::PathBuf;

use lightseg::{Palette, Point, SessionConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
lightseg - mark which lights on a strip belong to a segment

USAGE:
    lightseg --min=N --max=N [OPTIONS]

OPTIONS:
    --min=N              Lowest light number (required)
    --max=N              Highest light number (required)
    --seed=PATH          Load the initial lit set from the last line of PATH
    --save=PATH          Append saved states to PATH (truncated on start)
    --on-color=RRGGBB    Colour for lit lights (default: 00ff00)
    --off-color=RRGGBB   Colour for unlit lights (default: ff0000)
    --blink-color=RRGGBB Colour for the cursor (default: 0000ff)
    --chase-color=RRGGBB Colour for the find-mode chaser (default: 00ff00)
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    Right / Left         Move the cursor up / down one light
    Shift+Arrow, PgUp/Dn Move ten lights
    Home / End           Jump to the first / last light
    g, digits, Enter     Jump to a light number (Esc cancels)
    Space                Cycle mode: NAV, ON, OFF, FIND
    s / Enter            Save
    q / Esc / Ctrl+C     Quit

    In ON and OFF mode, the light being left is switched on or off.

ENVIRONMENT VARIABLES:
    LIGHTSEG_MIN         Override --min
    LIGHTSEG_MAX         Override --max
    LIGHTSEG_SEED        Override --seed
    LIGHTSEG_SAVE        Override --save
    LIGHTSEG_LOG         Log filter (default: warn), written to stderr";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Opts {
    /// Lowest light number.
    pub min_point: Option<Point>,
    /// Highest light number.
    pub max_point: Option<Point>,
    /// Seed file to start from.
    pub seed_path: Option<PathBuf>,
    /// Save file; saves are only logged when unset.
    pub save_path: Option<PathBuf>,
    pub palette: Palette,
}

impl Opts {
    /// The validated light range.
    pub fn session_config(&self) -> Result<SessionConfig, CliError> {
        let min = self.min_point.ok_or(CliError::Missing("--min"))?;
        let max = self.max_point.ok_or(CliError::Missing("--max"))?;
        Ok(SessionConfig::new(min, max))
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// Argument errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// A required option was not given.
    Missing(&'static str),
    /// An option value did not parse.
    Invalid { flag: &'static str, value: String },
    /// Unrecognized argument.
    Unknown(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Missing(flag) => write!(f, "{flag} is required"),
            CliError::Invalid { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            CliError::Unknown(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Parse a colour as `RRGGBB`, `#RRGGBB`, or `0xRRGGBB`.
pub fn parse_color(value: &str) -> Option<u32> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix('#'))
        .unwrap_or(value);
    if hex.is_empty() || hex.len() > 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn parse_point(flag: &'static str, value: &str) -> Result<Point, CliError> {
    value.parse().map_err(|_| CliError::Invalid {
        flag,
        value: value.to_string(),
    })
}

fn parse_color_flag(flag: &'static str, value: &str) -> Result<u32, CliError> {
    parse_color(value).ok_or_else(|| CliError::Invalid {
        flag,
        value: value.to_string(),
    })
}

/// Parse `args` (without the program name) on top of environment values
/// looked up through `var`.
///
/// Environment variables take precedence over defaults but are overridden by
/// explicit command-line flags.
pub fn parse_from<I, S>(args: I, var: impl Fn(&str) -> Option<String>) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut opts = Opts::default();

    // Apply environment variable defaults first
    if let Some(val) = var("LIGHTSEG_MIN") {
        opts.min_point = Some(parse_point("LIGHTSEG_MIN", &val)?);
    }
    if let Some(val) = var("LIGHTSEG_MAX") {
        opts.max_point = Some(parse_point("LIGHTSEG_MAX", &val)?);
    }
    if let Some(val) = var("LIGHTSEG_SEED").filter(|v| !v.is_empty()) {
        opts.seed_path = Some(val.into());
    }
    if let Some(val) = var("LIGHTSEG_SAVE").filter(|v| !v.is_empty()) {
        opts.save_path = Some(val.into());
    }

    // Parse command-line args (override env vars)
    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            other => {
                if let Some(val) = other.strip_prefix("--min=") {
                    opts.min_point = Some(parse_point("--min", val)?);
                } else if let Some(val) = other.strip_prefix("--max=") {
                    opts.max_point = Some(parse_point("--max", val)?);
                } else if let Some(val) = other.strip_prefix("--seed=") {
                    opts.seed_path = Some(val.into());
                } else if let Some(val) = other.strip_prefix("--save=") {
                    opts.save_path = Some(val.into());
                } else if let Some(val) = other.strip_prefix("--on-color=") {
                    opts.palette.on = parse_color_flag("--on-color", val)?;
                } else if let Some(val) = other.strip_prefix("--off-color=") {
                    opts.palette.off = parse_color_flag("--off-color", val)?;
                } else if let Some(val) = other.strip_prefix("--blink-color=") {
                    opts.palette.blink = parse_color_flag("--blink-color", val)?;
                } else if let Some(val) = other.strip_prefix("--chase-color=") {
                    opts.palette.chase = parse_color_flag("--chase-color", val)?;
                } else {
                    return Err(CliError::Unknown(other.to_string()));
                }
            }
        }
    }

    opts.session_config()?;
    Ok(Command::Run(opts))
}

/// Parse the process arguments and environment.
pub fn parse() -> Result<Command, CliError> {
    parse_from(env::args().skip(1), |key| env::var(key).ok())
}

/// `lightseg <version>`.
#[must_use]
pub fn version_line() -> String {
    format!("lightseg {VERSION}")
}
