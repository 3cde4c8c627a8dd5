//! Zoom, scroll and vertical virtualization.
//!
//! [`ViewportManager`] is the only long-lived mutable layout state. It owns
//! the zoom level and normalized scroll position, derives cell sizes from
//! them, and tracks two small state machines that replace boolean
//! re-entrancy guards:
//!
//! - [`ZoomPhase`]: a zoom is in flight until the engine settles it two
//!   frames later. Further zoom requests are rejected meanwhile, except
//!   snap-to-range, which is parked and replayed once.
//! - [`RecomputePhase`]: recompute triggers are coalesced while one is
//!   scheduled and ignored while one is running.

use crate::config::LayoutConstants;
use tracing::debug;

/// Frames between a zoom request and the recompute that applies it.
pub const ZOOM_SETTLE_FRAMES: u32 = 2;

/// Wheel delta divisor used by [`ViewportManager::scroll`].
pub const WHEEL_DAMPING: f64 = 4.0;

/// Window of visible ranks plus the pixel sizes used to draw them.
///
/// # Invariants
/// - `0 <= start_rank <= end_rank <= total_ranks`
/// - `half_unit == cell_height / 2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportInfo {
    /// Zoom level the window was computed at.
    pub zoom_level: f64,
    /// Height of the scroll container in pixels.
    pub container_height: f64,
    /// Pixel height of one cell.
    pub cell_height: f64,
    /// Pixel height of one rank (half a cell).
    pub half_unit: f64,
    /// First visible rank (inclusive).
    pub start_rank: usize,
    /// One past the last visible rank.
    pub end_rank: usize,
    /// Pixel scroll offset into the full pitch range.
    pub scroll_offset: f64,
}

impl ViewportInfo {
    /// Number of visible ranks.
    pub fn visible_ranks(&self) -> usize {
        self.end_rank - self.start_rank
    }

    /// Whether `rank` is inside the window.
    pub fn contains(&self, rank: usize) -> bool {
        rank >= self.start_rank && rank < self.end_rank
    }
}

/// Zoom state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomPhase {
    /// No zoom in flight.
    #[default]
    Idle,
    /// A zoom was applied and waits for its settle frame.
    Zooming,
    /// Like `Zooming`, with a snap-to-range queued for when it settles.
    ZoomPending,
}

/// Recompute state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputePhase {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// A recompute will run on a coming frame.
    Scheduled,
    /// A recompute is running.
    Recomputing,
}

/// Zoom operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomRequest {
    /// Multiply by the zoom-in factor.
    In,
    /// Multiply by the zoom-out factor.
    Out,
    /// Back to 1.0.
    Reset,
    /// Explicit level.
    Set(f64),
    /// Zoom so the full pitch range fits the container.
    SnapToRange,
}

/// Result of [`ViewportManager::request_zoom`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// Zoom applied; the caller must schedule the settle frame.
    Started {
        /// New clamped zoom level.
        zoom_level: f64,
    },
    /// Snap parked until the in-flight zoom settles.
    Queued,
    /// Dropped because a zoom is in flight.
    Rejected,
}

/// Owner of zoom and scroll state.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    constants: LayoutConstants,
    zoom_level: f64,
    scroll_position: f64,
    container_height: f64,
    viewport_height: f64,
    total_ranks: usize,
    zoom_phase: ZoomPhase,
    recompute_phase: RecomputePhase,
    pending_start_row: Option<usize>,
}

impl ViewportManager {
    /// Create a manager at zoom 1.0 and the configured default scroll.
    pub fn new(constants: LayoutConstants) -> Self {
        Self {
            zoom_level: 1.0,
            scroll_position: constants.default_scroll_position.clamp(0.0, 1.0),
            container_height: 0.0,
            viewport_height: 0.0,
            total_ranks: 0,
            zoom_phase: ZoomPhase::Idle,
            recompute_phase: RecomputePhase::Idle,
            pending_start_row: None,
            constants,
        }
    }

    /// Layout constants in use.
    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    /// Current zoom level.
    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    /// Normalized scroll position in `[0, 1]`.
    pub fn scroll_position(&self) -> f64 {
        self.scroll_position
    }

    /// Container height in pixels.
    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    /// Number of pitch ranks.
    pub fn total_ranks(&self) -> usize {
        self.total_ranks
    }

    /// Pixel height of a cell at the current zoom.
    pub fn cell_height(&self) -> f64 {
        self.constants.cell_height(self.zoom_level)
    }

    /// Pixel width of a cell at the current zoom.
    pub fn cell_width(&self) -> f64 {
        self.constants.cell_width(self.zoom_level)
    }

    /// Pixel height of one rank.
    pub fn half_unit(&self) -> f64 {
        self.cell_height() / 2.0
    }

    /// Current zoom phase.
    pub fn zoom_phase(&self) -> ZoomPhase {
        self.zoom_phase
    }

    /// Current recompute phase.
    pub fn recompute_phase(&self) -> RecomputePhase {
        self.recompute_phase
    }

    /// Row waiting to be scrolled to the top on the next recompute.
    pub fn pending_start_row(&self) -> Option<usize> {
        self.pending_start_row
    }

    /// Update the measured container height. Non-finite or negative
    /// values are stored as 0.
    pub fn set_container_height(&mut self, height: f64) {
        self.container_height = sanitize_length(height);
    }

    /// Update the visible viewport height used by wheel scrolling.
    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = sanitize_length(height);
    }

    /// Update the number of pitch ranks.
    pub fn set_total_ranks(&mut self, ranks: usize) {
        self.total_ranks = ranks;
    }

    // ===== Zoom =====

    /// Lowest zoom at which the pitch range still fills the container.
    ///
    /// `max(min_zoom, 2 × container_height / (total_ranks × base_unit))`,
    /// capped at `max_zoom`. Falls back to `min_zoom` when ranks or
    /// height are zero.
    pub fn dynamic_min_zoom(&self) -> f64 {
        let c = &self.constants;
        if self.total_ranks == 0 || self.container_height <= 0.0 {
            return c.min_zoom.min(c.max_zoom);
        }
        let fit = 2.0 * self.container_height / (self.total_ranks as f64 * c.base_abstract_unit);
        c.min_zoom.max(fit).min(c.max_zoom)
    }

    /// Clamp `zoom` into `[dynamic_min_zoom, max_zoom]`. NaN keeps the
    /// current level.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom_level;
        }
        zoom.clamp(self.dynamic_min_zoom(), self.constants.max_zoom)
    }

    /// Re-clamp the current zoom after the container or rank count
    /// changed. Returns whether the level moved.
    pub fn clamp_zoom_to_range(&mut self) -> bool {
        let clamped = self.clamp_zoom(self.zoom_level);
        let changed = clamped != self.zoom_level;
        if changed {
            debug!(from = self.zoom_level, to = clamped, "Clamped zoom to dynamic range");
            self.zoom_level = clamped;
        }
        changed
    }

    /// Apply a zoom request if no zoom is in flight.
    ///
    /// A `SnapToRange` arriving mid-zoom is parked and replayed by
    /// [`ViewportManager::settle_zoom`]; any other request mid-zoom is
    /// rejected.
    pub fn request_zoom(&mut self, request: ZoomRequest) -> ZoomOutcome {
        match (self.zoom_phase, request) {
            (ZoomPhase::Idle, _) => {
                let target = match request {
                    ZoomRequest::In => self.zoom_level * self.constants.zoom_in_factor,
                    ZoomRequest::Out => self.zoom_level * self.constants.zoom_out_factor,
                    ZoomRequest::Reset => 1.0,
                    ZoomRequest::Set(level) => level,
                    ZoomRequest::SnapToRange => self.dynamic_min_zoom(),
                };
                self.zoom_level = self.clamp_zoom(target);
                self.zoom_phase = ZoomPhase::Zooming;
                debug!(?request, zoom_level = self.zoom_level, "Zoom started");
                ZoomOutcome::Started {
                    zoom_level: self.zoom_level,
                }
            }
            (_, ZoomRequest::SnapToRange) => {
                self.zoom_phase = ZoomPhase::ZoomPending;
                debug!("Snap to range queued behind in-flight zoom");
                ZoomOutcome::Queued
            }
            _ => {
                debug!(?request, "Zoom rejected, another zoom in flight");
                ZoomOutcome::Rejected
            }
        }
    }

    /// End the in-flight zoom. Returns `true` when a snap-to-range was
    /// queued and should be requested now.
    pub fn settle_zoom(&mut self) -> bool {
        let pending = self.zoom_phase == ZoomPhase::ZoomPending;
        self.zoom_phase = ZoomPhase::Idle;
        pending
    }

    // ===== Recompute phase =====

    /// Ask for a recompute. Returns `true` if this call moved the phase to
    /// `Scheduled` (the caller should queue a frame task).
    pub fn request_recompute(&mut self) -> bool {
        match self.recompute_phase {
            RecomputePhase::Idle => {
                self.recompute_phase = RecomputePhase::Scheduled;
                true
            }
            RecomputePhase::Scheduled | RecomputePhase::Recomputing => false,
        }
    }

    /// Enter `Recomputing`. Returns `false` if a recompute is already
    /// running.
    pub fn begin_recompute(&mut self) -> bool {
        if self.recompute_phase == RecomputePhase::Recomputing {
            return false;
        }
        self.recompute_phase = RecomputePhase::Recomputing;
        true
    }

    /// Leave `Recomputing` but stay scheduled for the next frame.
    pub fn defer_recompute(&mut self) {
        self.recompute_phase = RecomputePhase::Scheduled;
    }

    /// Leave `Recomputing`.
    pub fn finish_recompute(&mut self) {
        self.recompute_phase = RecomputePhase::Idle;
    }

    // ===== Scroll =====

    /// Pixels the content can scroll at the current zoom.
    pub fn scrollable_distance(&self) -> f64 {
        (self.total_ranks as f64 * self.half_unit() - self.container_height).max(0.0)
    }

    /// Set the normalized scroll position, clamped to `[0, 1]`. Returns
    /// whether it changed.
    pub fn set_scroll_position(&mut self, position: f64) -> bool {
        if position.is_nan() {
            return false;
        }
        let clamped = position.clamp(0.0, 1.0);
        let changed = clamped != self.scroll_position;
        self.scroll_position = clamped;
        changed
    }

    /// Wheel scroll: moves by `(delta_y / viewport_height) / 4`.
    pub fn scroll(&mut self, delta_y: f64) -> bool {
        if self.viewport_height <= 0.0 {
            return false;
        }
        let delta = (delta_y / self.viewport_height) / WHEEL_DAMPING;
        self.set_scroll_position(self.scroll_position + delta)
    }

    /// Scroll by an exact pixel amount.
    pub fn scroll_by_pixels(&mut self, delta_y: f64) -> bool {
        let scrollable = self.scrollable_distance();
        if scrollable <= 0.0 {
            return false;
        }
        self.set_scroll_position(self.scroll_position + delta_y / scrollable)
    }

    /// Bring `row` to the top of the viewport on the next recompute.
    pub fn set_pending_start_row(&mut self, row: usize) {
        self.pending_start_row = Some(row);
    }

    /// Consume the pending start row, if any. Returns whether the scroll
    /// position was updated.
    pub fn apply_pending_start_row(&mut self) -> bool {
        let Some(row) = self.pending_start_row.take() else {
            return false;
        };
        let scrollable = self.scrollable_distance();
        let position = if scrollable > 0.0 {
            row as f64 * self.half_unit() / scrollable
        } else {
            0.0
        };
        debug!(row, position, "Applied pending start row");
        self.set_scroll_position(position);
        true
    }

    // ===== Viewport =====

    /// Visible rank window at the current zoom and scroll.
    pub fn viewport_info(&self) -> ViewportInfo {
        let cell_height = self.cell_height();
        let half_unit = cell_height / 2.0;
        let scroll_offset = self.scrollable_distance() * self.scroll_position;

        let (start_rank, end_rank) = if half_unit > 0.0 {
            let start = ((scroll_offset / half_unit).floor().max(0.0) as usize).min(self.total_ranks);
            let visible = self.container_height / half_unit;
            let end = ((start as f64 + visible).ceil() as usize).min(self.total_ranks);
            (start, end.max(start))
        } else {
            (0, 0)
        };

        ViewportInfo {
            zoom_level: self.zoom_level,
            container_height: self.container_height,
            cell_height,
            half_unit,
            start_rank,
            end_rank,
            scroll_offset,
        }
    }
}

fn sanitize_length(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
