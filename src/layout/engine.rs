//! The layout engine: owned lifecycle object that ties the pieces together.
//!
//! One [`LayoutEngine`] per editor view. The host creates it with
//! [`LayoutEngine::init`], calls [`LayoutEngine::on_animation_frame`] once
//! per frame, forwards zoom/scroll input, and hands renderers a shared
//! reference for coordinate queries.

use super::canvas::{resize_for_pixel_ratio, DrawingSurface, SurfaceRole};
use super::columns::{ColumnWidths, LEGEND_COLUMNS_PER_SIDE};
use super::events::{EventBus, LayoutEvent, SubscriptionId};
use super::frame::{FrameScheduler, FrameTask};
use super::modulation::CoordinateMapping;
use super::transform::CoordinateTransform;
use super::types::{FrameTime, LogicalSize};
use super::viewport::{ViewportInfo, ViewportManager, ZoomOutcome, ZoomRequest, ZOOM_SETTLE_FRAMES};
use crate::config::{ConfigError, LayoutConstants};
use crate::model::{ModulationMarker, Rhythm, ScoreSnapshot, TonicSignPlacement};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Measurements the engine reads from the host on every recompute.
pub trait ContainerMetrics {
    /// Height of the pitch grid container in pixels. 0 while the
    /// container is not laid out yet.
    fn container_height(&self) -> f64;

    /// Height of the visible scroll viewport, used for wheel scrolling.
    fn viewport_height(&self) -> f64 {
        self.container_height()
    }

    /// Device pixel ratio of the display.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }
}

/// Metrics with fixed values, for headless runs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedMetrics {
    /// Container height in pixels.
    pub container_height: f64,
    /// Viewport height in pixels.
    pub viewport_height: f64,
    /// Device pixel ratio.
    pub device_pixel_ratio: f64,
}

impl FixedMetrics {
    /// Metrics with the viewport equal to the container and ratio 1.
    pub fn new(container_height: f64) -> Self {
        Self {
            container_height,
            viewport_height: container_height,
            device_pixel_ratio: 1.0,
        }
    }

    /// Builder-style setter for the pixel ratio.
    pub fn with_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }
}

impl ContainerMetrics for FixedMetrics {
    fn container_height(&self) -> f64 {
        self.container_height
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}

/// Logical canvas sizes produced by a recompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// Zoom level after clamping.
    pub zoom_level: f64,
    /// Cell width in pixels.
    pub cell_width: f64,
    /// Cell height in pixels.
    pub cell_height: f64,
    /// Rank height in pixels.
    pub half_unit: f64,
    /// Container height in pixels.
    pub container_height: f64,
    /// Width of the musical area (modulated when markers are active).
    pub musical_width: f64,
    /// Width of one legend canvas.
    pub legend_width: f64,
    /// `round(musical_width + 2 × legend_width)`.
    pub total_canvas_width: f64,
    /// Height of one drum row.
    pub drum_row_height: f64,
    /// Height of the drum canvas.
    pub drum_canvas_height: f64,
}

/// Result of [`LayoutEngine::recompute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecomputeOutcome {
    /// New dimensions were applied.
    Applied(Dimensions),
    /// The container is not measurable yet; retried next frame.
    Deferred,
    /// Nothing ran (already recomputing or disposed).
    Skipped,
}

/// Owner of all layout state for one editor view.
pub struct LayoutEngine<M: ContainerMetrics> {
    constants: LayoutConstants,
    rhythm: Rhythm,
    tonic_signs: Vec<TonicSignPlacement>,
    columns_dirty: bool,
    viewport: ViewportManager,
    transform: CoordinateTransform,
    scheduler: FrameScheduler,
    events: EventBus,
    metrics: M,
    surfaces: BTreeMap<SurfaceRole, Box<dyn DrawingSurface>>,
    dimensions: Option<Dimensions>,
    frame_time: FrameTime,
    unmeasured_warned: bool,
    disposed: bool,
}

impl<M: ContainerMetrics> LayoutEngine<M> {
    /// Build an engine for `score` and schedule the first recompute.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `constants` break a layout
    /// invariant.
    pub fn init(constants: LayoutConstants, score: ScoreSnapshot, metrics: M) -> Result<Self, ConfigError> {
        constants.validate()?;

        let ScoreSnapshot {
            rhythm,
            tonic_signs,
            modulation_markers,
            total_ranks,
        } = score;

        let mut viewport = ViewportManager::new(constants);
        viewport.set_total_ranks(total_ranks);

        let columns = ColumnWidths::build(&rhythm.groupings, &tonic_signs, &constants);
        let mut transform = CoordinateTransform::new(columns, viewport.cell_width());
        transform.set_markers(modulation_markers);

        let mut engine = Self {
            constants,
            rhythm,
            tonic_signs,
            columns_dirty: false,
            viewport,
            transform,
            scheduler: FrameScheduler::new(),
            events: EventBus::new(),
            metrics,
            surfaces: BTreeMap::new(),
            dimensions: None,
            frame_time: FrameTime::default(),
            unmeasured_warned: false,
            disposed: false,
        };
        engine.request_recompute();

        info!(
            macrobeats = engine.rhythm.len(),
            ranks = total_ranks,
            "Layout engine initialized"
        );
        Ok(engine)
    }

    // ===== Lifecycle =====

    /// Advance one animation frame and run the tasks that are due.
    ///
    /// Returns the outcome of the last recompute that ran this frame.
    pub fn on_animation_frame(&mut self, timestamp: FrameTime) -> Option<RecomputeOutcome> {
        if self.disposed {
            return None;
        }
        self.frame_time = timestamp;

        let mut last = None;
        for task in self.scheduler.tick() {
            match task {
                FrameTask::Recompute => {
                    last = Some(self.recompute());
                }
                FrameTask::SettleZoom => {
                    last = Some(self.recompute());
                    if self.viewport.settle_zoom() {
                        debug!("Replaying queued snap to range");
                        self.zoom(ZoomRequest::SnapToRange);
                    }
                }
            }
        }
        last
    }

    /// Ask for a recompute on the next frame. Coalesced with any pending
    /// request.
    pub fn request_recompute(&mut self) {
        if self.disposed {
            return;
        }
        if self.viewport.request_recompute() {
            self.scheduler.schedule(FrameTask::Recompute, 1);
        }
    }

    /// Recompute cell sizes, canvas dimensions and surface sizes now.
    pub fn recompute(&mut self) -> RecomputeOutcome {
        if self.disposed || !self.viewport.begin_recompute() {
            return RecomputeOutcome::Skipped;
        }

        self.viewport.set_container_height(self.metrics.container_height());
        self.viewport.set_viewport_height(self.metrics.viewport_height());

        if self.viewport.container_height() <= 0.0 {
            if !self.unmeasured_warned {
                warn!("Pitch grid container has no height yet, retrying on next frame");
                self.unmeasured_warned = true;
            }
            self.viewport.defer_recompute();
            self.scheduler.schedule(FrameTask::Recompute, 1);
            return RecomputeOutcome::Deferred;
        }
        self.unmeasured_warned = false;

        let zoom_changed = self.viewport.clamp_zoom_to_range();
        let cell_width = self.viewport.cell_width();
        let cell_height = self.viewport.cell_height();

        if self.columns_dirty {
            let columns = ColumnWidths::build(&self.rhythm.groupings, &self.tonic_signs, &self.constants);
            self.transform.set_columns(columns);
            self.columns_dirty = false;
        }
        self.transform.set_cell_width(cell_width);

        let dimensions = self.measure(cell_width, cell_height);

        let scrolled = self.viewport.apply_pending_start_row();
        self.resize_surfaces(&dimensions);

        self.transform.invalidate_viewport();
        self.dimensions = Some(dimensions);
        self.viewport.finish_recompute();
        self.scheduler.cancel(FrameTask::Recompute);

        debug!(
            zoom = dimensions.zoom_level,
            cell_width,
            total_width = dimensions.total_canvas_width,
            "Layout recomputed"
        );

        if zoom_changed {
            self.events.emit(LayoutEvent::ZoomChanged);
        }
        if scrolled {
            self.events.emit(LayoutEvent::ScrollChanged);
        }
        self.events.emit(LayoutEvent::LayoutConfigChanged);

        RecomputeOutcome::Applied(dimensions)
    }

    fn measure(&self, cell_width: f64, cell_height: f64) -> Dimensions {
        let columns = self.transform.columns();
        let n = columns.len();
        let musical_width = if n >= 2 * LEGEND_COLUMNS_PER_SIDE {
            let first = LEGEND_COLUMNS_PER_SIDE as f64;
            let last = (n - LEGEND_COLUMNS_PER_SIDE) as f64;
            self.transform.column_to_x(last) - self.transform.column_to_x(first)
        } else {
            0.0
        };
        let legend_width = columns.legend_width(cell_width);
        let drum_row_height = self
            .constants
            .base_drum_row_height
            .max(self.constants.drum_height_scale_factor * cell_height);

        Dimensions {
            zoom_level: self.viewport.zoom_level(),
            cell_width,
            cell_height,
            half_unit: cell_height / 2.0,
            container_height: self.viewport.container_height(),
            musical_width,
            legend_width,
            total_canvas_width: (musical_width + 2.0 * legend_width).round(),
            drum_row_height,
            drum_canvas_height: self.constants.drum_row_count as f64 * drum_row_height,
        }
    }

    fn resize_surfaces(&mut self, d: &Dimensions) {
        let ratio = self.metrics.device_pixel_ratio();
        for (role, surface) in &mut self.surfaces {
            let logical = match role {
                SurfaceRole::PitchGrid => LogicalSize::new(d.musical_width, d.container_height),
                SurfaceRole::DrumGrid => LogicalSize::new(d.musical_width, d.drum_canvas_height),
                SurfaceRole::LegendLeft | SurfaceRole::LegendRight => {
                    LogicalSize::new(d.legend_width, d.container_height)
                }
            };
            resize_for_pixel_ratio(surface.as_mut(), logical, ratio);
        }
    }

    /// Drop listeners, pending frame tasks and surfaces. The engine ignores
    /// all further frames and requests.
    pub fn dispose(&mut self) {
        self.events.clear();
        self.scheduler.clear();
        self.surfaces.clear();
        self.disposed = true;
        debug!("Layout engine disposed");
    }

    /// Whether [`LayoutEngine::dispose`] was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether a recompute has succeeded at least once.
    pub fn is_initial_layout_ready(&self) -> bool {
        self.dimensions.is_some()
    }

    // ===== Inputs =====

    /// Replace all score inputs.
    pub fn set_score(&mut self, score: ScoreSnapshot) {
        let ScoreSnapshot {
            rhythm,
            tonic_signs,
            modulation_markers,
            total_ranks,
        } = score;

        self.rhythm = rhythm;
        self.tonic_signs = tonic_signs;
        self.columns_dirty = true;
        self.viewport.set_total_ranks(total_ranks);

        if modulation_markers.as_slice() != self.transform.markers() {
            self.transform.set_markers(modulation_markers);
            self.events.emit(LayoutEvent::ModulationMarkersChanged);
        }
        self.request_recompute();
    }

    /// Replace the modulation markers.
    pub fn set_modulation_markers(&mut self, markers: Vec<ModulationMarker>) {
        self.transform.set_markers(markers);
        self.events.emit(LayoutEvent::ModulationMarkersChanged);
        self.request_recompute();
    }

    /// Replace the tonic placements.
    pub fn set_tonic_signs(&mut self, tonic_signs: Vec<TonicSignPlacement>) {
        self.tonic_signs = tonic_signs;
        self.columns_dirty = true;
        self.request_recompute();
    }

    /// Register the surface backing `role`, replacing any previous one.
    pub fn register_surface(
        &mut self,
        role: SurfaceRole,
        surface: Box<dyn DrawingSurface>,
    ) -> Option<Box<dyn DrawingSurface>> {
        let previous = self.surfaces.insert(role, surface);
        self.request_recompute();
        previous
    }

    /// Metrics source.
    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Mutable metrics source. Call [`LayoutEngine::request_recompute`]
    /// after changing what it reports.
    pub fn metrics_mut(&mut self) -> &mut M {
        &mut self.metrics
    }

    // ===== Zoom =====

    fn zoom(&mut self, request: ZoomRequest) -> ZoomOutcome {
        if self.disposed {
            return ZoomOutcome::Rejected;
        }
        let before = self.viewport.zoom_level();
        let outcome = self.viewport.request_zoom(request);
        if let ZoomOutcome::Started { zoom_level } = outcome {
            self.scheduler.schedule(FrameTask::SettleZoom, ZOOM_SETTLE_FRAMES);
            if zoom_level != before {
                self.transform.invalidate_viewport();
                self.events.emit(LayoutEvent::ZoomChanged);
            }
        }
        outcome
    }

    /// Zoom in one step.
    pub fn zoom_in(&mut self) -> ZoomOutcome {
        self.zoom(ZoomRequest::In)
    }

    /// Zoom out one step.
    pub fn zoom_out(&mut self) -> ZoomOutcome {
        self.zoom(ZoomRequest::Out)
    }

    /// Zoom back to 1.0 (clamped).
    pub fn reset_zoom(&mut self) -> ZoomOutcome {
        self.zoom(ZoomRequest::Reset)
    }

    /// Zoom to an explicit level (clamped).
    pub fn set_zoom_level(&mut self, level: f64) -> ZoomOutcome {
        self.zoom(ZoomRequest::Set(level))
    }

    /// Zoom so the whole pitch range fits. Queued if a zoom is in flight.
    pub fn snap_zoom_to_range(&mut self) -> ZoomOutcome {
        self.zoom(ZoomRequest::SnapToRange)
    }

    // ===== Scroll =====

    fn after_scroll(&mut self, changed: bool) -> bool {
        if changed {
            self.transform.invalidate_viewport();
            self.events.emit(LayoutEvent::LayoutConfigChanged);
            self.events.emit(LayoutEvent::ScrollChanged);
        }
        changed
    }

    /// Wheel scroll. Returns whether the position moved.
    pub fn scroll(&mut self, delta_y: f64) -> bool {
        let changed = self.viewport.scroll(delta_y);
        self.after_scroll(changed)
    }

    /// Scroll by exact pixels. Returns whether the position moved.
    pub fn scroll_by_pixels(&mut self, delta_y: f64) -> bool {
        let changed = self.viewport.scroll_by_pixels(delta_y);
        self.after_scroll(changed)
    }

    /// Set the normalized scroll position. Returns whether it moved.
    pub fn set_scroll_position(&mut self, position: f64) -> bool {
        let changed = self.viewport.set_scroll_position(position);
        self.after_scroll(changed)
    }

    /// Scroll `row` to the top on the next recompute.
    pub fn set_pending_start_row(&mut self, row: usize) {
        self.viewport.set_pending_start_row(row);
        self.request_recompute();
    }

    // ===== Events =====

    /// Listen to layout events.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&LayoutEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ===== Queries =====

    /// Layout constants in use.
    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    /// Current rhythm.
    pub fn rhythm(&self) -> &Rhythm {
        &self.rhythm
    }

    /// Zoom and scroll state.
    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    /// Coordinate transforms.
    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    /// Dimensions from the last applied recompute.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Timestamp of the current frame.
    pub fn frame_time(&self) -> FrameTime {
        self.frame_time
    }

    /// Column widths of the current layout.
    pub fn column_widths(&self) -> &Arc<ColumnWidths> {
        self.transform.columns()
    }

    /// Current modulation mapping.
    pub fn mapping(&self) -> Arc<CoordinateMapping> {
        self.transform.mapping()
    }

    /// Visible rank window, cached within the current frame.
    pub fn viewport_info(&self) -> ViewportInfo {
        self.transform
            .cached_viewport(self.frame_time, || self.viewport.viewport_info())
    }

    /// Pixel x of a column.
    pub fn column_to_x(&self, index: f64) -> f64 {
        self.transform.column_to_x(index)
    }

    /// Column at pixel x.
    pub fn x_to_column(&self, x: f64) -> f64 {
        self.transform.x_to_column(x)
    }

    /// Pixel y of a rank in the current viewport.
    pub fn rank_to_y(&self, rank: f64) -> f64 {
        self.transform.rank_to_y(rank, &self.viewport_info())
    }

    /// Rank at pixel y in the current viewport.
    pub fn y_to_rank(&self, y: f64) -> f64 {
        self.transform.y_to_rank(y, &self.viewport_info())
    }
}

impl<M: ContainerMetrics + std::fmt::Debug> std::fmt::Debug for LayoutEngine<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("viewport", &self.viewport)
            .field("dimensions", &self.dimensions)
            .field("metrics", &self.metrics)
            .field("surfaces", &self.surfaces.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
