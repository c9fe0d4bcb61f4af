// SPDX-License-Identifier: MPL-2.0
//! Command line parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::{ColourMode, DenoiseStrength, RestoreConfig, Scale};
use crate::error::{Error, Result};

pub const HELP: &str = "\
Restore a directory of old photographs.

USAGE:
  photo-restore --in <DIR> --out <DIR> [OPTIONS]

OPTIONS:
  --in <DIR>            Directory with the JPEG/PNG photos to restore
  --out <DIR>           Directory for restored images (created if missing)
  --scale <2|4>         Upscale factor [default: 2]
  --denoise <N>         Denoise strength, 0 disables, 0-20 recommended [default: 8]
  --colour <yes|no>     Gentle colour-cast correction [default: yes]
  --weights-dir <DIR>   Where model weights are cached [default: ./weights]
  --config <FILE>       Settings file [default: <config dir>/photo_restore/settings.toml]
  -v, --verbose         Debug logging (RUST_LOG overrides)
  -h, --help            Print this help

ENVIRONMENT:
  PHOTO_RESTORE_WEIGHTS_DIR   Weights directory when --weights-dir is not given
";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub restore: RestoreConfig,
    pub weights_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(Args),
    Help,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns [`Error::Config`] for missing, malformed or unknown arguments.
pub fn from_env() -> Result<Command> {
    parse(pico_args::Arguments::from_env())
}

/// Parses an explicit argument list, without the program name.
///
/// # Errors
///
/// Returns [`Error::Config`] for missing, malformed or unknown arguments.
pub fn from_vec(args: Vec<OsString>) -> Result<Command> {
    parse(pico_args::Arguments::from_vec(args))
}

fn parse(mut args: pico_args::Arguments) -> Result<Command> {
    if args.contains(["-h", "--help"]) {
        return Ok(Command::Help);
    }

    let verbose = args.contains(["-v", "--verbose"]);
    let input_dir: PathBuf = args.value_from_os_str("--in", to_path).map_err(arg_error)?;
    let output_dir: PathBuf = args.value_from_os_str("--out", to_path).map_err(arg_error)?;
    let scale = args
        .opt_value_from_fn("--scale", parse_scale)
        .map_err(arg_error)?
        .unwrap_or_default();
    let denoise = args
        .opt_value_from_str::<_, DenoiseStrength>("--denoise")
        .map_err(arg_error)?
        .unwrap_or_default();
    let colour = args
        .opt_value_from_str::<_, ColourMode>("--colour")
        .map_err(arg_error)?
        .unwrap_or_default();
    let weights_dir = args
        .opt_value_from_os_str("--weights-dir", to_path)
        .map_err(arg_error)?;
    let config_path = args
        .opt_value_from_os_str("--config", to_path)
        .map_err(arg_error)?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        let listed: Vec<String> = remaining
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        return Err(Error::Config(format!(
            "unexpected arguments: {}",
            listed.join(" ")
        )));
    }

    Ok(Command::Run(Args {
        restore: RestoreConfig {
            input_dir,
            output_dir,
            scale,
            denoise,
            colour,
        },
        weights_dir,
        config_path,
        verbose,
    }))
}

fn to_path(value: &std::ffi::OsStr) -> std::result::Result<PathBuf, Error> {
    Ok(PathBuf::from(value))
}

fn parse_scale(value: &str) -> Result<Scale> {
    let factor = value
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::Config(format!("invalid scale '{value}': expected 2 or 4")))?;
    Scale::try_from(factor)
}

fn arg_error(err: pico_args::Error) -> Error {
    Error::Config(err.to_string())
}
