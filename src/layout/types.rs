//! Core layout newtypes

/// Device pixel ratio. Always finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PixelRatio(f64);

/// Error returned when constructing a PixelRatio from a non-positive or
/// non-finite value via the smart constructor.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("PixelRatio must be finite and > 0 (got {0})")]
pub struct InvalidPixelRatio(pub f64);

impl PixelRatio {
    /// Standard-density display.
    pub const ONE: Self = Self(1.0);

    /// Smart constructor that validates the ratio.
    pub fn new(ratio: f64) -> Result<Self, InvalidPixelRatio> {
        if ratio.is_finite() && ratio > 0.0 {
            Ok(Self(ratio))
        } else {
            Err(InvalidPixelRatio(ratio))
        }
    }

    /// Like [`PixelRatio::new`] but falls back to 1.0 for invalid input.
    ///
    /// Browsers occasionally report 0 or NaN while a window is moving
    /// between displays.
    pub fn normalized(ratio: f64) -> Self {
        Self::new(ratio).unwrap_or(Self::ONE)
    }

    /// Get the raw f64 value.
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for PixelRatio {
    fn default() -> Self {
        Self::ONE
    }
}

/// Animation-frame timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FrameTime(f64);

impl FrameTime {
    /// Create a timestamp from milliseconds.
    pub fn from_millis(ms: f64) -> Self {
        Self(ms)
    }

    /// Milliseconds value.
    pub fn as_millis(&self) -> f64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier` (negative if `earlier` is later).
    pub fn since(&self, earlier: FrameTime) -> f64 {
        self.0 - earlier.0
    }
}

/// Logical (CSS pixel) size of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalSize {
    /// Width in logical pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
}

impl LogicalSize {
    /// Create a logical size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Backing-store size of a canvas in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackingSize {
    /// Width in device pixels.
    pub width: u32,
    /// Height in device pixels.
    pub height: u32,
}

impl BackingSize {
    /// Create a backing-store size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
