// SPDX-License-Identifier: MPL-2.0
//! Run configuration and the optional `settings.toml` file.
//!
//! # Run Configuration
//!
//! [`RestoreConfig`] holds the options recognised for a single batch run. It is
//! built once from the command line and never changes during the run.
//!
//! # Settings File
//!
//! The settings file only covers where model weights live and where they are
//! fetched from:
//! - `[weights]` - weights directory
//! - `[models]` - download URLs for each model
//!
//! Every field is optional; missing fields fall back to [`defaults`].
//!
//! # Examples
//!
//! ```no_run
//! use photo_restore::config;
//! use std::path::Path;
//!
//! let settings = config::load_from_path(Path::new("settings.toml")).unwrap_or_default();
//! println!("face restorer from {}", settings.models.face_restorer_url());
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILE: &str = "settings.toml";
const APP_DIR: &str = "photo_restore";

// =============================================================================
// Restoration Options
// =============================================================================

/// Output scale factor. Only 2x and 4x are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    X2,
    X4,
}

impl Scale {
    /// Returns the linear multiplier.
    #[must_use]
    pub fn factor(self) -> u32 {
        match self {
            Scale::X2 => 2,
            Scale::X4 => 4,
        }
    }
}

impl TryFrom<u32> for Scale {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            2 => Ok(Scale::X2),
            4 => Ok(Scale::X4),
            other => Err(Error::Config(format!(
                "invalid scale {other}: expected 2 or 4"
            ))),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor())
    }
}

/// Non-local means strength. Zero disables the denoise step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenoiseStrength(u32);

impl DenoiseStrength {
    /// Denoising disabled.
    pub const OFF: Self = Self(0);

    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns `true` when the denoise step should run.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` when the strength is within the recommended range.
    #[must_use]
    pub fn is_recommended(self) -> bool {
        self.0 <= RECOMMENDED_MAX_DENOISE_STRENGTH
    }
}

impl Default for DenoiseStrength {
    fn default() -> Self {
        Self(DEFAULT_DENOISE_STRENGTH)
    }
}

impl FromStr for DenoiseStrength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| Error::Config(format!("invalid denoise strength '{s}': expected an integer >= 0")))
    }
}

/// Whether the colour-cast correction step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourMode {
    #[default]
    Yes,
    No,
}

impl ColourMode {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == ColourMode::Yes
    }
}

impl FromStr for ColourMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yes" => Ok(ColourMode::Yes),
            "no" => Ok(ColourMode::No),
            other => Err(Error::Config(format!(
                "invalid colour mode '{other}': expected 'yes' or 'no'"
            ))),
        }
    }
}

/// Options for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scale: Scale,
    pub denoise: DenoiseStrength,
    pub colour: ColourMode,
}

impl RestoreConfig {
    /// Creates a configuration with default processing options.
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            scale: Scale::default(),
            denoise: DenoiseStrength::default(),
            colour: ColourMode::default(),
        }
    }

    /// Output file name for an input stem, e.g. `portrait_restored_x2.jpg`.
    #[must_use]
    pub fn output_file_name(&self, stem: &str) -> String {
        format!("{stem}_restored_x{}.{OUTPUT_EXTENSION}", self.scale)
    }
}

// =============================================================================
// Settings File
// =============================================================================

/// Weights storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeightsConfig {
    /// Directory holding the cached model files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Model source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_restorer_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upscaler_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_detector_url: Option<String>,
}

impl ModelsConfig {
    #[must_use]
    pub fn face_restorer_url(&self) -> &str {
        self.face_restorer_url
            .as_deref()
            .unwrap_or(DEFAULT_FACE_RESTORER_URL)
    }

    #[must_use]
    pub fn upscaler_url(&self) -> &str {
        self.upscaler_url.as_deref().unwrap_or(DEFAULT_UPSCALER_URL)
    }

    #[must_use]
    pub fn face_detector_url(&self) -> &str {
        self.face_detector_url
            .as_deref()
            .unwrap_or(DEFAULT_FACE_DETECTOR_URL)
    }
}

/// Face restoration settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaceConfig {
    /// Restore only the face nearest the frame centre.
    #[serde(default)]
    pub only_center_face: bool,

    /// Inputs are already aligned 512x512 face crops; skip detection.
    #[serde(default)]
    pub aligned: bool,
}

/// Contents of `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub weights: WeightsConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub face: FaceConfig,
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads settings from the platform config directory.
///
/// Returns defaults when no settings file exists there.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load() -> Result<Settings> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Settings::default())
}

/// Loads settings from an explicit path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_from_path(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
