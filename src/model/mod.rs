//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors. They
//! mirror the collections the score store owns; the layout engine only
//! reads them.

pub mod error;
pub mod identifiers;
pub mod modulation;
pub mod rhythm;
pub mod score;

// Re-export for convenience
pub use error::{AppError, InputError};
pub use identifiers::{InvalidMarkerId, InvalidTonicUuid, MarkerId, TonicUuid};
pub use modulation::{Anchor, InvalidMarker, InvalidRatio, ModulationMarker, ModulationRatio};
pub use rhythm::{BoundaryStyle, Rhythm, TonicSignPlacement};
pub use score::ScoreSnapshot;
