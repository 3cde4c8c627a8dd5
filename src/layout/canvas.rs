//! HiDPI canvas sizing.
//!
//! Renderers draw in logical pixels. The backing store is scaled by the
//! device pixel ratio so lines stay sharp; the scale transform is applied
//! once per real resize.

use super::types::{BackingSize, LogicalSize, PixelRatio};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// A canvas the engine can size. Implemented by the host's rendering
/// backend.
pub trait DrawingSurface {
    /// Current backing-store size.
    fn backing_size(&self) -> BackingSize;

    /// Resize the backing store. Clears the surface on most backends.
    fn set_backing_size(&mut self, size: BackingSize);

    /// Set the on-screen (CSS) size.
    fn set_logical_size(&mut self, size: LogicalSize);

    /// Reset the drawing transform to a uniform scale of `ratio`.
    fn set_pixel_scale(&mut self, ratio: PixelRatio);
}

/// Shared surfaces: the engine sizes it while a renderer keeps a handle.
impl<S: DrawingSurface + ?Sized> DrawingSurface for Rc<RefCell<S>> {
    fn backing_size(&self) -> BackingSize {
        self.borrow().backing_size()
    }

    fn set_backing_size(&mut self, size: BackingSize) {
        self.borrow_mut().set_backing_size(size);
    }

    fn set_logical_size(&mut self, size: LogicalSize) {
        self.borrow_mut().set_logical_size(size);
    }

    fn set_pixel_scale(&mut self, ratio: PixelRatio) {
        self.borrow_mut().set_pixel_scale(ratio);
    }
}

/// Which canvas a surface backs. Determines the logical size it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceRole {
    /// Main pitch grid.
    PitchGrid,
    /// Drum grid below the pitch grid.
    DrumGrid,
    /// Left legend.
    LegendLeft,
    /// Right legend.
    LegendRight,
}

/// Size `surface` for `logical` at `pixel_ratio`.
///
/// The backing store becomes `round(logical × ratio)` (at least 1) on each
/// axis; an axis is left alone when it is already within half a pixel of
/// the target. The logical size is always reapplied. Invalid ratios are
/// treated as 1. Returns whether the backing store changed.
pub fn resize_for_pixel_ratio<S>(surface: &mut S, logical: LogicalSize, pixel_ratio: f64) -> bool
where
    S: DrawingSurface + ?Sized,
{
    let ratio = PixelRatio::normalized(pixel_ratio);
    let current = surface.backing_size();
    let target = BackingSize::new(
        backing_extent(logical.width, ratio),
        backing_extent(logical.height, ratio),
    );

    let mut next = current;
    let mut resized = false;
    if (current.width as f64 - target.width as f64).abs() > 0.5 {
        next.width = target.width;
        resized = true;
    }
    if (current.height as f64 - target.height as f64).abs() > 0.5 {
        next.height = target.height;
        resized = true;
    }

    if resized {
        surface.set_backing_size(next);
    }
    surface.set_logical_size(logical);
    if resized {
        surface.set_pixel_scale(ratio);
        trace!(
            width = next.width,
            height = next.height,
            ratio = ratio.get(),
            "Resized canvas backing store"
        );
    }
    resized
}

fn backing_extent(logical: f64, ratio: PixelRatio) -> u32 {
    let scaled = (logical * ratio.get()).round();
    if scaled.is_finite() && scaled >= 1.0 {
        // Saturating float-to-int cast.
        scaled as u32
    } else {
        1
    }
}

/// In-memory surface. Used for headless runs and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessSurface {
    /// Backing-store size.
    pub backing: BackingSize,
    /// Last logical size applied.
    pub logical: LogicalSize,
    /// Last transform scale applied.
    pub scale: Option<PixelRatio>,
    /// How many times the backing store was resized.
    pub resize_count: usize,
}

impl HeadlessSurface {
    /// Create a zero-sized surface.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingSurface for HeadlessSurface {
    fn backing_size(&self) -> BackingSize {
        self.backing
    }

    fn set_backing_size(&mut self, size: BackingSize) {
        self.backing = size;
        self.resize_count += 1;
    }

    fn set_logical_size(&mut self, size: LogicalSize) {
        self.logical = size;
    }

    fn set_pixel_scale(&mut self, ratio: PixelRatio) {
        self.scale = Some(ratio);
    }
}
