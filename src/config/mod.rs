//! Configuration module.
//!
//! [`LayoutConstants`] holds every tunable number the engine uses. The
//! defaults match the editor's built-in grid; a TOML file, environment
//! variables and CLI flags may override them (see [`loader`]).

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, ConfigError, ConfigFile,
    LayoutSection, ResolvedConfig,
};

/// Unit width of each of the two legend columns on either side of the grid.
pub const SIDE_COLUMN_WIDTH: f64 = 0.25;

/// Unit width of one microbeat column.
pub const BEAT_COLUMN_WIDTH: f64 = 1.0;

/// Cell height in pixels at zoom 1.0.
pub const BASE_ABSTRACT_UNIT: f64 = 30.0;

/// Cell width as a fraction of cell height.
pub const FIXED_ASPECT_RATIO: f64 = 0.5;

/// Lowest zoom ever allowed, before the dynamic floor is applied.
pub const MIN_ZOOM_LEVEL: f64 = 0.25;

/// Highest zoom allowed.
pub const MAX_ZOOM_LEVEL: f64 = 3.0;

/// Zoom multiplier for one zoom-in step.
pub const ZOOM_IN_FACTOR: f64 = 1.2;

/// Zoom multiplier for one zoom-out step.
pub const ZOOM_OUT_FACTOR: f64 = 0.8;

/// Initial normalized scroll position (0 = top, 1 = bottom).
pub const DEFAULT_SCROLL_POSITION: f64 = 0.5;

/// Minimum height of one drum row in pixels.
pub const BASE_DRUM_ROW_HEIGHT: f64 = 30.0;

/// Drum row height as a multiple of the pitch cell height.
pub const DRUM_HEIGHT_SCALE_FACTOR: f64 = 1.5;

/// Number of drum rows.
pub const DRUM_ROW_COUNT: usize = 3;

/// Numeric layout constants, resolved from defaults and overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstants {
    /// Unit width of a legend column.
    pub side_column_width: f64,
    /// Unit width of a microbeat column.
    pub beat_column_width: f64,
    /// Cell height in pixels at zoom 1.0.
    pub base_abstract_unit: f64,
    /// Cell width divided by cell height.
    pub aspect_ratio: f64,
    /// Static lower zoom bound.
    pub min_zoom: f64,
    /// Upper zoom bound.
    pub max_zoom: f64,
    /// Multiplier applied by zoom-in.
    pub zoom_in_factor: f64,
    /// Multiplier applied by zoom-out.
    pub zoom_out_factor: f64,
    /// Scroll position used at startup.
    pub default_scroll_position: f64,
    /// Minimum drum row height in pixels.
    pub base_drum_row_height: f64,
    /// Drum row height relative to cell height.
    pub drum_height_scale_factor: f64,
    /// Number of drum rows.
    pub drum_row_count: usize,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            side_column_width: SIDE_COLUMN_WIDTH,
            beat_column_width: BEAT_COLUMN_WIDTH,
            base_abstract_unit: BASE_ABSTRACT_UNIT,
            aspect_ratio: FIXED_ASPECT_RATIO,
            min_zoom: MIN_ZOOM_LEVEL,
            max_zoom: MAX_ZOOM_LEVEL,
            zoom_in_factor: ZOOM_IN_FACTOR,
            zoom_out_factor: ZOOM_OUT_FACTOR,
            default_scroll_position: DEFAULT_SCROLL_POSITION,
            base_drum_row_height: BASE_DRUM_ROW_HEIGHT,
            drum_height_scale_factor: DRUM_HEIGHT_SCALE_FACTOR,
            drum_row_count: DRUM_ROW_COUNT,
        }
    }
}

impl LayoutConstants {
    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("side_column_width", self.side_column_width),
            ("beat_column_width", self.beat_column_width),
            ("base_abstract_unit", self.base_abstract_unit),
            ("aspect_ratio", self.aspect_ratio),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("zoom_in_factor", self.zoom_in_factor),
            ("zoom_out_factor", self.zoom_out_factor),
            ("base_drum_row_height", self.base_drum_row_height),
            ("drum_height_scale_factor", self.drum_height_scale_factor),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be a positive number, got {}", value),
                });
            }
        }

        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::InvalidValue {
                field: "min_zoom".to_string(),
                reason: format!(
                    "must not exceed max_zoom ({} > {})",
                    self.min_zoom, self.max_zoom
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.default_scroll_position) {
            return Err(ConfigError::InvalidValue {
                field: "default_scroll_position".to_string(),
                reason: format!("must be within [0, 1], got {}", self.default_scroll_position),
            });
        }

        Ok(())
    }

    /// Cell height in pixels at `zoom`.
    pub fn cell_height(&self, zoom: f64) -> f64 {
        self.base_abstract_unit * zoom
    }

    /// Cell width in pixels at `zoom`.
    pub fn cell_width(&self, zoom: f64) -> f64 {
        self.cell_height(zoom) * self.aspect_ratio
    }
}
