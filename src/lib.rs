//! gridscale
//!
//! Coordinate and layout engine for a music-notation grid. Columns are
//! derived from the rhythm (macrobeat groupings and tonic signs), scaled
//! by zoom, optionally warped by tempo-modulation markers, and mapped to
//! pixels for the pitch, drum and legend canvases.
//!
//! The library is headless: a host supplies container measurements and
//! drawing surfaces through the traits in [`layout`], and drives the
//! engine once per animation frame.

pub mod config;
pub mod layout;
pub mod logging;
pub mod model;
pub mod report;
pub mod source;
