//! Configuration file loading with precedence handling.

use super::LayoutConstants;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A resolved value breaks a layout invariant.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field name.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/gridscale/config.toml`.
///
/// ```toml
/// log_file_path = "/tmp/gridscale.log"
///
/// [layout]
/// max_zoom = 4.0
/// zoom_in_factor = 1.25
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Layout constant overrides.
    #[serde(default)]
    pub layout: Option<LayoutSection>,
}

/// `[layout]` section: optional overrides for [`LayoutConstants`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSection {
    /// Legend column unit width.
    #[serde(default)]
    pub side_column_width: Option<f64>,
    /// Microbeat column unit width.
    #[serde(default)]
    pub beat_column_width: Option<f64>,
    /// Cell height in pixels at zoom 1.0.
    #[serde(default)]
    pub base_abstract_unit: Option<f64>,
    /// Cell width / cell height.
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    /// Static lower zoom bound.
    #[serde(default)]
    pub min_zoom: Option<f64>,
    /// Upper zoom bound.
    #[serde(default)]
    pub max_zoom: Option<f64>,
    /// Zoom-in multiplier.
    #[serde(default)]
    pub zoom_in_factor: Option<f64>,
    /// Zoom-out multiplier.
    #[serde(default)]
    pub zoom_out_factor: Option<f64>,
    /// Startup scroll position.
    #[serde(default)]
    pub default_scroll_position: Option<f64>,
    /// Minimum drum row height.
    #[serde(default)]
    pub base_drum_row_height: Option<f64>,
    /// Drum row height relative to cell height.
    #[serde(default)]
    pub drum_height_scale_factor: Option<f64>,
    /// Number of drum rows.
    #[serde(default)]
    pub drum_row_count: Option<usize>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Layout constants handed to the engine.
    pub layout: LayoutConstants,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConstants::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/gridscale/gridscale.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("gridscale").join("gridscale.log")
    } else {
        PathBuf::from("gridscale.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
/// Returns `Err` if file exists but cannot be read or parsed.
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/gridscale/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gridscale").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `GRIDSCALE_CONFIG` environment variable
/// 3. Default path `~/.config/gridscale/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("GRIDSCALE_CONFIG") {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    let d = defaults.layout;
    let layout = match config.layout {
        Some(s) => LayoutConstants {
            side_column_width: s.side_column_width.unwrap_or(d.side_column_width),
            beat_column_width: s.beat_column_width.unwrap_or(d.beat_column_width),
            base_abstract_unit: s.base_abstract_unit.unwrap_or(d.base_abstract_unit),
            aspect_ratio: s.aspect_ratio.unwrap_or(d.aspect_ratio),
            min_zoom: s.min_zoom.unwrap_or(d.min_zoom),
            max_zoom: s.max_zoom.unwrap_or(d.max_zoom),
            zoom_in_factor: s.zoom_in_factor.unwrap_or(d.zoom_in_factor),
            zoom_out_factor: s.zoom_out_factor.unwrap_or(d.zoom_out_factor),
            default_scroll_position: s
                .default_scroll_position
                .unwrap_or(d.default_scroll_position),
            base_drum_row_height: s.base_drum_row_height.unwrap_or(d.base_drum_row_height),
            drum_height_scale_factor: s
                .drum_height_scale_factor
                .unwrap_or(d.drum_height_scale_factor),
            drum_row_count: s.drum_row_count.unwrap_or(d.drum_row_count),
        },
        None => d,
    };

    ResolvedConfig {
        layout,
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `GRIDSCALE_MAX_ZOOM`: Override the upper zoom bound (ignored with a warning if unparsable)
/// - `GRIDSCALE_LOG`: Override the log file path
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(raw) = std::env::var("GRIDSCALE_MAX_ZOOM") {
        match raw.trim().parse::<f64>() {
            Ok(max_zoom) => config.layout.max_zoom = max_zoom,
            Err(_) => warn!(value = %raw, "Ignoring unparsable GRIDSCALE_MAX_ZOOM"),
        }
    }

    if let Ok(path) = std::env::var("GRIDSCALE_LOG") {
        config.log_file_path = PathBuf::from(path);
    }

    config
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    max_zoom_override: Option<f64>,
    log_file_override: Option<PathBuf>,
) -> ResolvedConfig {
    if let Some(max_zoom) = max_zoom_override {
        config.layout.max_zoom = max_zoom;
    }

    if let Some(path) = log_file_override {
        config.log_file_path = path;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

#[cfg(test)]
mod log_path_tests {
    use super::*;

    #[test]
    fn default_log_path_ends_with_gridscale_log() {
        let path = default_log_path();
        assert!(
            path.to_string_lossy().ends_with("gridscale.log"),
            "Default log path should end with 'gridscale.log', got: {:?}",
            path
        );
    }

    #[test]
    fn resolved_config_default_includes_log_path() {
        let config = ResolvedConfig::default();
        assert!(
            !config.log_file_path.as_os_str().is_empty(),
            "Default config should have non-empty log_file_path"
        );
    }

    #[test]
    fn config_file_log_path_overrides_default() {
        let custom_path = PathBuf::from("/custom/path/to/app.log");
        let config_file = ConfigFile {
            log_file_path: Some(custom_path.clone()),
            layout: None,
        };

        let resolved = merge_config(Some(config_file));
        assert_eq!(
            resolved.log_file_path, custom_path,
            "Config file log_file_path should override default"
        );
    }

    #[test]
    fn missing_config_file_log_path_uses_default() {
        let resolved = merge_config(Some(ConfigFile::default()));
        assert_eq!(
            resolved.log_file_path,
            default_log_path(),
            "Missing log_file_path in config should use default"
        );
    }
}
