//! Plain-text layout report printed by the CLI.
//!
//! The report is a snapshot of one settled [`LayoutEngine`]: the column
//! layout, the modulation segments, the visible window, the canvas
//! dimensions and any coordinate probes the user asked for.

use crate::layout::columns::LEGEND_COLUMNS_PER_SIDE;
use crate::layout::{ContainerMetrics, LayoutEngine};
use std::fmt;

/// Coordinate queries to include in a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Probes {
    /// Fractional column indices to convert to pixel x.
    pub columns: Vec<f64>,
    /// Pixel x positions to convert to fractional columns.
    pub xs: Vec<f64>,
}

impl Probes {
    /// True when no probe was requested.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.xs.is_empty()
    }
}

/// Displayable report over an engine.
pub struct LayoutReport<'a, M: ContainerMetrics> {
    engine: &'a LayoutEngine<M>,
    probes: &'a Probes,
}

impl<'a, M: ContainerMetrics> LayoutReport<'a, M> {
    /// Create a report. Nothing is computed until it is formatted.
    pub fn new(engine: &'a LayoutEngine<M>, probes: &'a Probes) -> Self {
        Self { engine, probes }
    }

    fn write_columns(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns = self.engine.column_widths();
        let legend = (2 * LEGEND_COLUMNS_PER_SIDE).min(columns.len());
        writeln!(
            f,
            "Columns: {} ({} legend, {} musical), {:.3} units",
            columns.len(),
            legend,
            columns.len() - legend,
            columns.total_units()
        )?;
        let widths: Vec<String> = columns.widths().iter().map(|w| w.to_string()).collect();
        writeln!(f, "  widths: {}", widths.join(" "))?;

        writeln!(f, "Macrobeats:")?;
        for mb in columns.macrobeats() {
            writeln!(
                f,
                "  {}: columns {}..={}, {} microbeats",
                mb.index, mb.start_column, mb.end_column, mb.grouping
            )?;
        }

        if columns.tonic_slots().is_empty() {
            writeln!(f, "Tonic slots: none")?;
        } else {
            writeln!(f, "Tonic slots:")?;
            for slot in columns.tonic_slots() {
                writeln!(
                    f,
                    "  {}: columns {}..={}, after macrobeat {}",
                    slot.uuid.as_str(),
                    slot.start_column,
                    slot.start_column + 1,
                    slot.pre_macrobeat_index
                )?;
            }
        }
        Ok(())
    }

    fn write_segments(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mapping = self.engine.mapping();
        writeln!(f, "Segments:")?;
        for (i, segment) in mapping.segments().iter().enumerate() {
            write!(
                f,
                "  {}: x {:.3}..{:.3}, scale {:.3}, {:.3} px/unit",
                i, segment.start_x, segment.end_x, segment.scale, segment.spacing_px
            )?;
            if let (Some(id), Some(ratio)) = (&segment.marker, segment.ratio) {
                write!(f, ", after {} ({})", id.as_str(), ratio.display_text())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }

    fn write_viewport(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let viewport = self.engine.viewport();
        let info = self.engine.viewport_info();
        writeln!(f, "Viewport:")?;
        writeln!(
            f,
            "  zoom {:.3} (min {:.3}, max {:.3})",
            info.zoom_level,
            viewport.dynamic_min_zoom(),
            viewport.constants().max_zoom
        )?;
        writeln!(
            f,
            "  cell {:.3} x {:.3} px, rank {:.3} px",
            viewport.cell_width(),
            info.cell_height,
            info.half_unit
        )?;
        writeln!(
            f,
            "  ranks {}..{} of {}, scroll {:.3} ({:.3} px)",
            info.start_rank,
            info.end_rank,
            viewport.total_ranks(),
            viewport.scroll_position(),
            info.scroll_offset
        )
    }

    fn write_dimensions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(d) = self.engine.dimensions() else {
            return writeln!(f, "Dimensions: not measured (container has no height)");
        };
        writeln!(f, "Dimensions:")?;
        writeln!(
            f,
            "  musical {:.3} px, legend {:.3} px, total {} px",
            d.musical_width, d.legend_width, d.total_canvas_width
        )?;
        writeln!(
            f,
            "  drum {} x {:.3} px = {:.3} px",
            self.engine.constants().drum_row_count,
            d.drum_row_height,
            d.drum_canvas_height
        )
    }

    fn write_probes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.probes.is_empty() {
            return Ok(());
        }
        writeln!(f, "Probes:")?;
        for &column in &self.probes.columns {
            writeln!(
                f,
                "  column {:.3} -> x {:.3}",
                column,
                self.engine.column_to_x(column)
            )?;
        }
        for &x in &self.probes.xs {
            writeln!(f, "  x {:.3} -> column {:.3}", x, self.engine.x_to_column(x))?;
        }
        Ok(())
    }
}

impl<M: ContainerMetrics> fmt::Display for LayoutReport<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_columns(f)?;
        self.write_segments(f)?;
        self.write_viewport(f)?;
        self.write_dimensions(f)?;
        self.write_probes(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConstants;
    use crate::layout::{FixedMetrics, FrameTime};
    use crate::model::{Anchor, MarkerId, ModulationMarker, ModulationRatio, Rhythm, ScoreSnapshot};

    fn settled(score: ScoreSnapshot) -> LayoutEngine<FixedMetrics> {
        let mut engine =
            LayoutEngine::init(LayoutConstants::default(), score, FixedMetrics::new(600.0)).unwrap();
        engine.on_animation_frame(FrameTime::from_millis(16.0));
        engine
    }

    #[test]
    fn report_lists_marker_segments() {
        let mut score = ScoreSnapshot::new(Rhythm::new(vec![2, 2]), 88);
        score.modulation_markers.push(ModulationMarker::new(
            MarkerId::new("m1").unwrap(),
            ModulationRatio::Compress,
            Anchor::Measure(1),
        ));
        let engine = settled(score);
        let text = LayoutReport::new(&engine, &Probes::default()).to_string();

        assert!(text.contains("after m1 (2:3)"), "report was:\n{}", text);
        assert!(!text.contains("Probes:"));
    }

    #[test]
    fn unmeasured_engine_says_so() {
        let score = ScoreSnapshot::new(Rhythm::new(vec![3]), 10);
        let mut engine =
            LayoutEngine::init(LayoutConstants::default(), score, FixedMetrics::new(0.0)).unwrap();
        engine.on_animation_frame(FrameTime::from_millis(16.0));
        let text = LayoutReport::new(&engine, &Probes::default()).to_string();
        assert!(text.contains("Dimensions: not measured"));
    }

    #[test]
    fn probes_are_rendered_in_order() {
        let engine = settled(ScoreSnapshot::new(Rhythm::new(vec![2, 2]), 88));
        let probes = Probes {
            columns: vec![2.0],
            xs: vec![52.5],
        };
        let text = LayoutReport::new(&engine, &probes).to_string();
        assert!(text.contains("  column 2.000 -> x 7.500\n  x 52.500 -> column 5.000\n"));
    }
}
