// SPDX-License-Identifier: MPL-2.0
//! Weights directory resolution.
//!
//! # Path Resolution Order
//!
//! 1. **CLI argument** (`--weights-dir`)
//! 2. **Environment variable** (`PHOTO_RESTORE_WEIGHTS_DIR`, ignored when empty)
//! 3. **Settings file** (`[weights].dir`)
//! 4. **Default** - `weights/` in the working directory
//!
//! Resolution is a pure function of its inputs; nothing is cached in
//! process-wide state.

use crate::config::{Settings, DEFAULT_WEIGHTS_DIR};
use std::path::PathBuf;

/// Environment variable to override the weights directory.
pub const ENV_WEIGHTS_DIR: &str = "PHOTO_RESTORE_WEIGHTS_DIR";

/// Returns the weights directory for this run.
#[must_use]
pub fn resolve_weights_dir(cli_override: Option<PathBuf>, settings: &Settings) -> PathBuf {
    resolve_weights_dir_with_env(cli_override, std::env::var(ENV_WEIGHTS_DIR).ok(), settings)
}

/// Same as [`resolve_weights_dir`] with the environment value passed in.
#[must_use]
pub fn resolve_weights_dir_with_env(
    cli_override: Option<PathBuf>,
    env_value: Option<String>,
    settings: &Settings,
) -> PathBuf {
    if let Some(path) = cli_override {
        return path;
    }

    if let Some(env_path) = env_value.filter(|v| !v.is_empty()) {
        return PathBuf::from(env_path);
    }

    settings
        .weights
        .dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WEIGHTS_DIR))
}
