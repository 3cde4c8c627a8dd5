//! Coordinate and layout engine.
//!
//! Leaves first:
//!
//! - [`columns`]: musical structure → column unit widths
//! - [`modulation`]: markers → piecewise-linear pixel mapping
//! - [`viewport`]: zoom, scroll and the visible rank window
//! - [`transform`]: column/rank ↔ pixel queries with caching
//! - [`engine`]: the owned object that schedules recomputes and sizes
//!   canvases

pub mod canvas;
pub mod columns;
pub mod engine;
pub mod events;
pub mod frame;
pub mod modulation;
pub mod transform;
pub mod types;
pub mod viewport;

pub use canvas::{resize_for_pixel_ratio, DrawingSurface, HeadlessSurface, SurfaceRole};
pub use columns::{ColumnWidths, MacrobeatInfo, TonicSlot};
pub use engine::{ContainerMetrics, Dimensions, FixedMetrics, LayoutEngine, RecomputeOutcome};
pub use events::{EventBus, LayoutEvent, SubscriptionId};
pub use frame::{FrameScheduler, FrameTask};
pub use modulation::{AnchorContext, CoordinateMapping, Segment};
pub use transform::CoordinateTransform;
pub use types::{BackingSize, FrameTime, InvalidPixelRatio, LogicalSize, PixelRatio};
pub use viewport::{
    RecomputePhase, ViewportInfo, ViewportManager, ZoomOutcome, ZoomPhase, ZoomRequest,
};
