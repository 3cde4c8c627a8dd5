//! Logical ↔ pixel coordinate transforms.
//!
//! [`CoordinateTransform`] combines the column layout, the modulation
//! mapping and the viewport window. It is queried thousands of times per
//! frame, so both derived inputs are memoized:
//!
//! - the [`CoordinateMapping`] is keyed by `(markers_version,
//!   base_px_per_unit)` and shared as an `Arc`; a cache hit returns the
//!   same allocation.
//! - the [`ViewportInfo`] is reused within one frame (samples less than
//!   1 ms apart) and dropped on scroll or zoom.

use super::columns::ColumnWidths;
use super::modulation::{AnchorContext, CoordinateMapping};
use super::types::FrameTime;
use super::viewport::ViewportInfo;
use crate::model::ModulationMarker;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use tracing::trace;

/// Samples closer than this share one viewport computation.
pub const VIEWPORT_CACHE_WINDOW_MS: f64 = 1.0;

#[derive(Debug)]
struct MappingCache {
    markers_version: u64,
    base_px_per_unit: f64,
    mapping: Arc<CoordinateMapping>,
}

#[derive(Debug, Clone, Copy)]
struct ViewportSample {
    at: FrameTime,
    info: ViewportInfo,
}

/// Column/rank to pixel transforms with cached derived state.
#[derive(Debug)]
pub struct CoordinateTransform {
    columns: Arc<ColumnWidths>,
    markers: Vec<ModulationMarker>,
    has_active_markers: bool,
    markers_version: u64,
    cell_width: f64,
    mapping_cache: RefCell<Option<MappingCache>>,
    viewport_cache: Cell<Option<ViewportSample>>,
}

impl CoordinateTransform {
    /// Create a transform over `columns` at `cell_width` pixels per unit.
    pub fn new(columns: ColumnWidths, cell_width: f64) -> Self {
        Self {
            columns: Arc::new(columns),
            markers: Vec::new(),
            has_active_markers: false,
            markers_version: 0,
            cell_width,
            mapping_cache: RefCell::new(None),
            viewport_cache: Cell::new(None),
        }
    }

    /// Current column layout.
    pub fn columns(&self) -> &Arc<ColumnWidths> {
        &self.columns
    }

    /// Replace the column layout. Marker anchors may resolve differently,
    /// so the mapping is invalidated.
    pub fn set_columns(&mut self, columns: ColumnWidths) {
        self.columns = Arc::new(columns);
        self.invalidate_mapping();
    }

    /// Current modulation markers.
    pub fn markers(&self) -> &[ModulationMarker] {
        &self.markers
    }

    /// Replace the modulation markers and invalidate the mapping.
    pub fn set_markers(&mut self, markers: Vec<ModulationMarker>) {
        self.has_active_markers = markers.iter().any(|m| m.active);
        self.markers = markers;
        self.invalidate_mapping();
    }

    /// Whether any marker is active.
    pub fn has_active_markers(&self) -> bool {
        self.has_active_markers
    }

    /// Version bumped on every marker or layout change.
    pub fn markers_version(&self) -> u64 {
        self.markers_version
    }

    /// Unmodulated pixels per unit.
    pub fn cell_width(&self) -> f64 {
        self.cell_width
    }

    /// Update pixels per unit (after a zoom). The mapping cache notices the
    /// new base on its own.
    pub fn set_cell_width(&mut self, cell_width: f64) {
        self.cell_width = cell_width;
    }

    /// Mark the cached mapping stale.
    pub fn invalidate_mapping(&mut self) {
        self.markers_version = self.markers_version.wrapping_add(1);
    }

    /// The modulation mapping for the current markers and cell width.
    pub fn mapping(&self) -> Arc<CoordinateMapping> {
        let mut cache = self.mapping_cache.borrow_mut();
        if let Some(hit) = cache.as_ref() {
            if hit.markers_version == self.markers_version && hit.base_px_per_unit == self.cell_width {
                return Arc::clone(&hit.mapping);
            }
        }

        let ctx = AnchorContext::new(&self.columns, self.cell_width);
        let mapping = Arc::new(CoordinateMapping::new(&self.markers, self.cell_width, &ctx));
        trace!(
            version = self.markers_version,
            base_px_per_unit = self.cell_width,
            "Rebuilt coordinate mapping"
        );
        *cache = Some(MappingCache {
            markers_version: self.markers_version,
            base_px_per_unit: self.cell_width,
            mapping: Arc::clone(&mapping),
        });
        mapping
    }

    fn degenerate(&self) -> bool {
        !(self.cell_width.is_finite() && self.cell_width > 0.0)
    }

    /// Pixel x of a (fractional) column index.
    pub fn column_to_x(&self, index: f64) -> f64 {
        if self.degenerate() {
            return 0.0;
        }
        let x = self.columns.column_to_x(index, self.cell_width);
        if !self.has_active_markers {
            return x;
        }
        self.mapping().unit_to_x(x / self.cell_width)
    }

    /// Fractional column index at pixel x. Inverse of
    /// [`CoordinateTransform::column_to_x`].
    pub fn x_to_column(&self, x: f64) -> f64 {
        if self.degenerate() {
            return 0.0;
        }
        let units = if self.has_active_markers {
            self.mapping().x_to_unit(x)
        } else {
            x / self.cell_width
        };
        self.columns.unit_to_column(units)
    }

    /// Pixel width of column `index` at its position.
    pub fn column_width_px(&self, index: usize) -> f64 {
        self.column_to_x(index as f64 + 1.0) - self.column_to_x(index as f64)
    }

    /// Total grid width in pixels, modulation included.
    pub fn canvas_width(&self) -> f64 {
        self.column_to_x(self.columns.len() as f64)
    }

    /// Pixel y of a rank relative to the top of the viewport.
    pub fn rank_to_y(&self, rank: f64, viewport: &ViewportInfo) -> f64 {
        if viewport.half_unit <= 0.0 {
            return 0.0;
        }
        (rank - viewport.start_rank as f64) * viewport.half_unit
    }

    /// Fractional rank at pixel y. Inverse of
    /// [`CoordinateTransform::rank_to_y`].
    pub fn y_to_rank(&self, y: f64, viewport: &ViewportInfo) -> f64 {
        if viewport.half_unit <= 0.0 {
            return 0.0;
        }
        y / viewport.half_unit + viewport.start_rank as f64
    }

    /// Viewport info for frame `now`, computing it with `compute` unless a
    /// sample less than 1 ms old is cached.
    pub fn cached_viewport<F>(&self, now: FrameTime, compute: F) -> ViewportInfo
    where
        F: FnOnce() -> ViewportInfo,
    {
        if let Some(sample) = self.viewport_cache.get() {
            let age = now.since(sample.at);
            if (0.0..=VIEWPORT_CACHE_WINDOW_MS).contains(&age) {
                return sample.info;
            }
        }
        let info = compute();
        self.viewport_cache.set(Some(ViewportSample { at: now, info }));
        info
    }

    /// Drop the cached viewport (scroll or zoom changed).
    pub fn invalidate_viewport(&self) {
        self.viewport_cache.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConstants;
    use crate::model::{Anchor, MarkerId, ModulationRatio};

    fn transform(groupings: &[u8], cell_width: f64) -> CoordinateTransform {
        let columns = ColumnWidths::build(groupings, &[], &LayoutConstants::default());
        CoordinateTransform::new(columns, cell_width)
    }

    fn compress_at(x: f64) -> ModulationMarker {
        ModulationMarker::new(
            MarkerId::new("m1").unwrap(),
            ModulationRatio::Compress,
            Anchor::Pixel(x),
        )
    }

    fn info(start_rank: usize, half_unit: f64) -> ViewportInfo {
        ViewportInfo {
            zoom_level: 1.0,
            container_height: 300.0,
            cell_height: half_unit * 2.0,
            half_unit,
            start_rank,
            end_rank: start_rank + 20,
            scroll_offset: start_rank as f64 * half_unit,
        }
    }

    mod columns {
        use super::*;

        #[test]
        fn unmodulated_column_to_x() {
            let t = transform(&[2, 2], 20.0);
            assert_eq!(t.column_to_x(0.0), 0.0);
            assert_eq!(t.column_to_x(2.0), 10.0);
            assert_eq!(t.column_to_x(3.5), 40.0);
            assert_eq!(t.x_to_column(40.0), 3.5);
        }

        #[test]
        fn modulated_columns_shrink_after_marker() {
            let mut t = transform(&[2, 2, 2], 30.0);
            let before = t.column_width_px(6);
            t.set_markers(vec![compress_at(t.column_to_x(4.0))]);
            assert_eq!(t.column_width_px(3), 30.0);
            assert!((t.column_width_px(6) - before * 2.0 / 3.0).abs() < 1e-9);
        }

        #[test]
        fn modulated_round_trip() {
            let mut t = transform(&[3, 2, 3, 2], 15.0);
            t.set_markers(vec![compress_at(70.0)]);
            for i in 0..=t.columns().len() {
                let x = t.column_to_x(i as f64);
                assert!((t.x_to_column(x) - i as f64).abs() < 1e-6, "column {}", i);
            }
        }

        #[test]
        fn zero_cell_width_returns_zero() {
            let t = transform(&[2], 0.0);
            assert_eq!(t.column_to_x(3.0), 0.0);
            assert_eq!(t.x_to_column(3.0), 0.0);
        }

        #[test]
        fn inactive_markers_take_unmodulated_path() {
            let mut t = transform(&[2, 2], 20.0);
            t.set_markers(vec![compress_at(20.0).with_active(false)]);
            assert!(!t.has_active_markers());
            assert_eq!(t.column_to_x(4.0), 50.0);
        }
    }

    mod ranks {
        use super::*;

        #[test]
        fn rank_to_y_is_relative_to_window() {
            let t = transform(&[2], 10.0);
            let vp = info(10, 15.0);
            assert_eq!(t.rank_to_y(10.0, &vp), 0.0);
            assert_eq!(t.rank_to_y(12.0, &vp), 30.0);
            assert_eq!(t.y_to_rank(30.0, &vp), 12.0);
        }

        #[test]
        fn zero_half_unit_returns_zero() {
            let t = transform(&[2], 10.0);
            let vp = info(4, 0.0);
            assert_eq!(t.rank_to_y(7.0, &vp), 0.0);
            assert_eq!(t.y_to_rank(7.0, &vp), 0.0);
        }
    }

    mod caching {
        use super::*;

        #[test]
        fn unchanged_inputs_reuse_mapping() {
            let mut t = transform(&[2, 2], 20.0);
            t.set_markers(vec![compress_at(40.0)]);
            let a = t.mapping();
            let b = t.mapping();
            assert!(Arc::ptr_eq(&a, &b));
        }

        #[test]
        fn invalidation_rebuilds_mapping() {
            let mut t = transform(&[2, 2], 20.0);
            t.set_markers(vec![compress_at(40.0)]);
            let a = t.mapping();
            t.invalidate_mapping();
            let b = t.mapping();
            assert!(!Arc::ptr_eq(&a, &b));
            assert_eq!(*a, *b);
        }

        #[test]
        fn cell_width_change_rebuilds_mapping() {
            let mut t = transform(&[2, 2], 20.0);
            t.set_markers(vec![compress_at(40.0)]);
            let a = t.mapping();
            t.set_cell_width(24.0);
            let b = t.mapping();
            assert!(!Arc::ptr_eq(&a, &b));
            assert_eq!(b.base_px_per_unit(), 24.0);
        }

        #[test]
        fn viewport_reused_within_one_millisecond() {
            let t = transform(&[2], 10.0);
            let calls = Cell::new(0);
            let compute = || {
                calls.set(calls.get() + 1);
                info(calls.get(), 15.0)
            };

            let first = t.cached_viewport(FrameTime::from_millis(100.0), compute);
            let second = t.cached_viewport(FrameTime::from_millis(100.5), compute);
            assert_eq!(first, second);
            assert_eq!(calls.get(), 1);

            t.cached_viewport(FrameTime::from_millis(102.0), compute);
            assert_eq!(calls.get(), 2);
        }

        #[test]
        fn viewport_invalidation_forces_recompute() {
            let t = transform(&[2], 10.0);
            let calls = Cell::new(0);
            let compute = || {
                calls.set(calls.get() + 1);
                info(0, 15.0)
            };
            t.cached_viewport(FrameTime::from_millis(5.0), compute);
            t.invalidate_viewport();
            t.cached_viewport(FrameTime::from_millis(5.0), compute);
            assert_eq!(calls.get(), 2);
        }
    }
}
