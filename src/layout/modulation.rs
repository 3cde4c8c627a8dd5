//! Piecewise-linear pixel mapping for tempo modulation.
//!
//! A [`CoordinateMapping`] splits the x axis into contiguous [`Segment`]s.
//! Inside each segment one microbeat unit spans `spacing_px` pixels; every
//! active marker multiplies the spacing of everything after it by its
//! ratio. The mapping is immutable: when markers or the base spacing
//! change, build a new one.
//!
//! Anchors live in unmodulated pixel space. Segment 0 always has the base
//! spacing, so positions before the first anchor map exactly as they
//! would without modulation.

use super::columns::ColumnWidths;
use crate::model::{Anchor, MarkerId, ModulationMarker, ModulationRatio};
use tracing::{trace, warn};

/// Minimum width assumed for the open-ended last segment when laying out
/// ghost grid lines.
pub const GHOST_GRID_MIN_WIDTH: f64 = 800.0;

/// Column-based fallback step for measure anchors that cannot be resolved.
pub const MEASURE_FALLBACK_COLUMNS: f64 = 4.0;

/// A contiguous pixel range with constant spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Inclusive start in pixels.
    pub start_x: f64,
    /// Exclusive end in pixels; `f64::INFINITY` for the last segment.
    pub end_x: f64,
    /// Product of all marker ratios up to and including this segment's marker.
    pub scale: f64,
    /// Pixels per microbeat unit inside the segment.
    pub spacing_px: f64,
    /// Marker that opened the segment (`None` for segment 0).
    pub marker: Option<MarkerId>,
    /// Ratio of that marker.
    pub ratio: Option<ModulationRatio>,
}

impl Segment {
    /// True for the open-ended last segment.
    pub fn is_unbounded(&self) -> bool {
        self.end_x.is_infinite()
    }

    /// Pixel width (infinite for the last segment).
    pub fn width(&self) -> f64 {
        self.end_x - self.start_x
    }

    /// Whether `x` lies in `[start_x, end_x)`.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.start_x && x < self.end_x
    }
}

/// What the mapper needs to turn an [`Anchor`] into a pixel position.
#[derive(Debug, Clone, Copy)]
pub struct AnchorContext<'a> {
    /// Current column layout.
    pub columns: &'a ColumnWidths,
    /// Unmodulated pixels per unit.
    pub cell_width: f64,
}

impl<'a> AnchorContext<'a> {
    /// Create a context.
    pub fn new(columns: &'a ColumnWidths, cell_width: f64) -> Self {
        Self {
            columns,
            cell_width,
        }
    }

    /// Resolve an anchor to an unmodulated pixel x.
    ///
    /// Measures that do not map to a known macrobeat fall back to
    /// `measure × cell_width × 4` and log a warning.
    pub fn resolve(&self, anchor: Anchor) -> f64 {
        match anchor {
            Anchor::Pixel(x) => x,
            Anchor::Column(index) => self.columns.column_to_x(index as f64, self.cell_width),
            Anchor::Measure(measure) => match self.columns.measure_boundary_column(measure) {
                Some(column) => self.columns.column_to_x(column as f64, self.cell_width),
                None => {
                    let x = measure as f64 * self.cell_width * MEASURE_FALLBACK_COLUMNS;
                    warn!(measure, x, "Measure anchor outside the rhythm, using proportional fallback");
                    x
                }
            },
        }
    }
}

/// Immutable forward/inverse mapping between units and modulated pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapping {
    segments: Vec<Segment>,
    base_px_per_unit: f64,
}

impl CoordinateMapping {
    /// Trivial mapping: one segment, scale 1.
    pub fn identity(base_px_per_unit: f64) -> Self {
        Self {
            segments: vec![Segment {
                start_x: 0.0,
                end_x: f64::INFINITY,
                scale: 1.0,
                spacing_px: base_px_per_unit,
                marker: None,
                ratio: None,
            }],
            base_px_per_unit,
        }
    }

    /// Build the mapping for `markers` at `base_px_per_unit`.
    ///
    /// Inactive markers are skipped. Active markers are ordered by their
    /// resolved anchor; markers at the same x keep their input order and
    /// produce zero-width segments.
    pub fn new(markers: &[ModulationMarker], base_px_per_unit: f64, ctx: &AnchorContext<'_>) -> Self {
        let mut anchored: Vec<(f64, &ModulationMarker)> = markers
            .iter()
            .filter(|m| m.active)
            .map(|m| (ctx.resolve(m.anchor), m))
            .collect();

        if anchored.is_empty() {
            return Self::identity(base_px_per_unit);
        }

        // sort_by is stable: ties keep insertion order.
        anchored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut segments = Vec::with_capacity(anchored.len() + 1);
        let mut cumulative = 1.0;
        let mut start = 0.0_f64;
        let mut opener: Option<&ModulationMarker> = None;

        for (anchor_x, marker) in anchored {
            let boundary = if anchor_x.is_finite() { anchor_x.max(start) } else { start };
            segments.push(Segment {
                start_x: start,
                end_x: boundary,
                scale: cumulative,
                spacing_px: base_px_per_unit * cumulative,
                marker: opener.map(|m| m.id.clone()),
                ratio: opener.map(|m| m.ratio),
            });
            cumulative *= marker.ratio.value();
            start = boundary;
            opener = Some(marker);
        }

        segments.push(Segment {
            start_x: start,
            end_x: f64::INFINITY,
            scale: cumulative,
            spacing_px: base_px_per_unit * cumulative,
            marker: opener.map(|m| m.id.clone()),
            ratio: opener.map(|m| m.ratio),
        });

        trace!(segments = segments.len(), base_px_per_unit, "Built coordinate mapping");

        Self {
            segments,
            base_px_per_unit,
        }
    }

    /// Segments in ascending x order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Unmodulated pixels per unit this mapping was built for.
    pub fn base_px_per_unit(&self) -> f64 {
        self.base_px_per_unit
    }

    /// True when the mapping is the single unscaled segment.
    pub fn is_identity(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].scale == 1.0
    }

    fn degenerate(&self) -> bool {
        !(self.base_px_per_unit.is_finite() && self.base_px_per_unit > 0.0)
    }

    /// Modulated pixel x of a unit offset.
    pub fn unit_to_x(&self, units: f64) -> f64 {
        if self.degenerate() || !units.is_finite() {
            return 0.0;
        }
        let last = self.segments.len() - 1;
        let mut remaining = units;
        for (i, seg) in self.segments.iter().enumerate() {
            if i == last {
                return seg.start_x + remaining * seg.spacing_px;
            }
            let seg_units = seg.width() / seg.spacing_px;
            if remaining <= seg_units {
                return seg.start_x + remaining * seg.spacing_px;
            }
            remaining -= seg_units;
        }
        0.0
    }

    /// Unit offset of a modulated pixel x. Inverse of [`Self::unit_to_x`].
    pub fn x_to_unit(&self, x: f64) -> f64 {
        if self.degenerate() || !x.is_finite() {
            return 0.0;
        }
        let last = self.segments.len() - 1;
        let mut accumulated = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            if i == last || x < seg.end_x {
                return accumulated + (x - seg.start_x) / seg.spacing_px;
            }
            accumulated += seg.width() / seg.spacing_px;
        }
        accumulated
    }

    /// Playback time at a modulated pixel x.
    ///
    /// One unit in a segment lasts `base_unit_duration / scale` seconds.
    pub fn x_to_seconds(&self, x: f64, base_unit_duration: f64) -> f64 {
        if self.degenerate() || !x.is_finite() {
            return 0.0;
        }
        let last = self.segments.len() - 1;
        let mut seconds = 0.0;
        for (i, seg) in self.segments.iter().enumerate() {
            let unit_duration = base_unit_duration / seg.scale;
            if i == last || x < seg.end_x {
                return seconds + (x - seg.start_x) / seg.spacing_px * unit_duration;
            }
            seconds += seg.width() / seg.spacing_px * unit_duration;
        }
        seconds
    }

    /// Modulated pixel x reached after `seconds` of playback.
    pub fn seconds_to_x(&self, seconds: f64, base_unit_duration: f64) -> f64 {
        if self.degenerate() || !seconds.is_finite() || base_unit_duration <= 0.0 {
            return 0.0;
        }
        let last = self.segments.len() - 1;
        let mut remaining = seconds;
        for (i, seg) in self.segments.iter().enumerate() {
            let unit_duration = base_unit_duration / seg.scale;
            let seg_seconds = seg.width() / seg.spacing_px * unit_duration;
            if i == last || remaining <= seg_seconds {
                return seg.start_x + remaining / unit_duration * seg.spacing_px;
            }
            remaining -= seg_seconds;
        }
        0.0
    }

    /// The segment containing `x`. Negative x belongs to segment 0.
    pub fn segment_at_x(&self, x: f64) -> &Segment {
        let last = self.segments.len() - 1;
        self.segments
            .iter()
            .find(|seg| x < seg.end_x && seg.width() > 0.0)
            .unwrap_or(&self.segments[last])
    }

    /// Modulated width of a canvas that is `unmodulated_width` pixels wide.
    pub fn modulated_width(&self, unmodulated_width: f64) -> f64 {
        if self.degenerate() {
            return unmodulated_width;
        }
        self.unit_to_x(unmodulated_width / self.base_px_per_unit)
    }

    /// Positions the unmodulated grid lines would take if stretched across
    /// `segment` by `1 / scale`.
    ///
    /// Renderers draw these faintly to show the original grid beneath a
    /// modulated region. The open-ended segment is treated as
    /// `max(total grid width, start + 800)` wide.
    pub fn ghost_grid_positions(
        &self,
        segment: &Segment,
        columns: &ColumnWidths,
        cell_width: f64,
    ) -> Vec<f64> {
        if segment.marker.is_none() || columns.is_empty() || cell_width == 0.0 || segment.scale <= 0.0 {
            return Vec::new();
        }

        let effective_width = if segment.is_unbounded() {
            let grid_width = columns.canvas_width(cell_width);
            grid_width.max(segment.start_x + GHOST_GRID_MIN_WIDTH) - segment.start_x
        } else {
            segment.width()
        };
        if effective_width <= 0.0 {
            return Vec::new();
        }

        let mut positions = Vec::new();
        let mut line_x = 0.0;
        for width in columns.widths() {
            if line_x >= segment.start_x && line_x < segment.end_x {
                let relative = (line_x - segment.start_x) / effective_width;
                let ghost = segment.start_x + relative * (effective_width / segment.scale);
                if ghost.is_finite() {
                    positions.push(ghost);
                }
            }
            line_x += width * cell_width;
            if !segment.is_unbounded() && line_x > segment.end_x {
                break;
            }
        }
        positions
    }
}

#[cfg(test)]
#[path = "modulation_tests.rs"]
mod tests;
