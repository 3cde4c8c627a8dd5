//! gridscale - Entry Point

use clap::Parser;
use gridscale::layout::viewport::ZOOM_SETTLE_FRAMES;
use gridscale::layout::{FixedMetrics, FrameTime, LayoutEngine};
use gridscale::model::AppError;
use gridscale::report::{LayoutReport, Probes};
use std::path::PathBuf;
use tracing::info;

/// Milliseconds between simulated animation frames.
const FRAME_INTERVAL_MS: f64 = 16.0;

/// gridscale - lay out a score snapshot headlessly and print the result
#[derive(Parser, Debug)]
#[command(name = "gridscale")]
#[command(version)]
#[command(about = "Compute grid columns, modulation segments and canvas sizes for a score snapshot")]
pub struct Args {
    /// Path to score JSON (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Zoom level to apply after the first layout (clamped to the valid range)
    #[arg(short, long)]
    pub zoom: Option<f64>,

    /// Normalized scroll position, 0 = top, 1 = bottom
    #[arg(short, long, value_parser = parse_unit_interval)]
    pub scroll: Option<f64>,

    /// Scroll so this rank is at the top of the viewport
    #[arg(long)]
    pub start_row: Option<usize>,

    /// Height of the pitch grid container in pixels
    #[arg(long, default_value = "600", value_parser = parse_non_negative)]
    pub container_height: f64,

    /// Device pixel ratio
    #[arg(long, default_value = "1")]
    pub pixel_ratio: f64,

    /// Column index to convert to pixel x (repeatable)
    #[arg(short, long = "column")]
    pub columns: Vec<f64>,

    /// Pixel x to convert to a column index (repeatable)
    #[arg(short = 'x', long = "x")]
    pub xs: Vec<f64>,

    /// Override the maximum zoom level
    #[arg(long)]
    pub max_zoom: Option<f64>,

    /// Path to log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_unit_interval(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not within [0, 1]", value))
    }
}

fn parse_non_negative(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{} is not a non-negative number", value))
    }
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = gridscale::config::load_config_with_precedence(args.config.clone())?;
        let merged = gridscale::config::merge_config(config_file);
        let with_env = gridscale::config::apply_env_overrides(merged);
        gridscale::config::apply_cli_overrides(with_env, args.max_zoom, args.log_file.clone())
    };
    config.layout.validate()?;

    gridscale::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let source = gridscale::source::detect_score_source(args.file.clone())?;
    let score = source.load()?;

    let metrics = FixedMetrics::new(args.container_height).with_pixel_ratio(args.pixel_ratio);
    let mut engine = LayoutEngine::init(config.layout, score, metrics)?;

    let mut now = FrameTime::default();
    let mut next_frame = |engine: &mut LayoutEngine<FixedMetrics>| {
        now = FrameTime::from_millis(now.as_millis() + FRAME_INTERVAL_MS);
        engine.on_animation_frame(now)
    };
    next_frame(&mut engine);

    if let Some(zoom) = args.zoom {
        engine.set_zoom_level(zoom);
    }
    if let Some(position) = args.scroll {
        engine.set_scroll_position(position);
    }
    if let Some(row) = args.start_row {
        engine.set_pending_start_row(row);
    }
    for _ in 0..ZOOM_SETTLE_FRAMES {
        next_frame(&mut engine);
    }

    let probes = Probes {
        columns: args.columns,
        xs: args.xs,
    };
    print!("{}", LayoutReport::new(&engine, &probes));

    engine.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        let result = Args::try_parse_from(["gridscale", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["gridscale", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_no_args_defaults() {
        let args = Args::parse_from(["gridscale"]);
        assert_eq!(args.file, None);
        assert_eq!(args.zoom, None);
        assert_eq!(args.scroll, None);
        assert_eq!(args.start_row, None);
        assert_eq!(args.container_height, 600.0);
        assert_eq!(args.pixel_ratio, 1.0);
        assert!(args.columns.is_empty());
        assert!(args.xs.is_empty());
        assert_eq!(args.max_zoom, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_file_path_populates_file_field() {
        let args = Args::parse_from(["gridscale", "score.json"]);
        assert_eq!(args.file, Some(PathBuf::from("score.json")));
    }

    #[test]
    fn test_zoom_short_and_long() {
        assert_eq!(Args::parse_from(["gridscale", "-z", "1.5"]).zoom, Some(1.5));
        assert_eq!(Args::parse_from(["gridscale", "--zoom", "0.8"]).zoom, Some(0.8));
    }

    #[test]
    fn test_scroll_accepts_unit_interval() {
        let args = Args::parse_from(["gridscale", "--scroll", "0.25"]);
        assert_eq!(args.scroll, Some(0.25));
    }

    #[test]
    fn test_scroll_rejects_out_of_range() {
        let result = Args::try_parse_from(["gridscale", "--scroll", "1.5"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_container_height_rejects_negative() {
        let result = Args::try_parse_from(["gridscale", "--container-height=-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_probes_are_repeatable() {
        let args = Args::parse_from(["gridscale", "-c", "2", "--column", "4.5", "-x", "30", "--x", "60"]);
        assert_eq!(args.columns, vec![2.0, 4.5]);
        assert_eq!(args.xs, vec![30.0, 60.0]);
    }

    #[test]
    fn test_start_row_rejects_negative() {
        let result = Args::try_parse_from(["gridscale", "--start-row", "-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_combined_flags() {
        let args = Args::parse_from([
            "gridscale",
            "score.json",
            "-z",
            "2",
            "-s",
            "0",
            "--container-height",
            "480",
            "--pixel-ratio",
            "2",
            "--max-zoom",
            "4",
            "--log-file",
            "/tmp/gridscale.log",
        ]);
        assert_eq!(args.file, Some(PathBuf::from("score.json")));
        assert_eq!(args.zoom, Some(2.0));
        assert_eq!(args.scroll, Some(0.0));
        assert_eq!(args.container_height, 480.0);
        assert_eq!(args.pixel_ratio, 2.0);
        assert_eq!(args.max_zoom, Some(4.0));
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/gridscale.log")));
    }

    #[test]
    fn test_max_zoom_flows_through_config_precedence_chain() {
        use gridscale::config::{
            apply_cli_overrides, apply_env_overrides, merge_config, ConfigFile, LayoutSection,
        };

        let config_file = ConfigFile {
            log_file_path: None,
            layout: Some(LayoutSection {
                max_zoom: Some(2.5),
                ..LayoutSection::default()
            }),
        };

        let merged = merge_config(Some(config_file));
        assert_eq!(merged.layout.max_zoom, 2.5, "Config file should override default max zoom");

        let with_env = apply_env_overrides(merged);
        let with_cli = apply_cli_overrides(with_env, Some(4.0), None);
        assert_eq!(
            with_cli.layout.max_zoom, 4.0,
            "CLI max zoom should override all other sources"
        );
    }
}
