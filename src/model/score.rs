//! Snapshot of the score inputs the layout engine reads.

use super::modulation::ModulationMarker;
use super::rhythm::{Rhythm, TonicSignPlacement};
use serde::{Deserialize, Serialize};

/// Read-only view of the score store's layout-relevant collections.
///
/// The engine never mutates the score; callers hand it a fresh snapshot
/// (or individual collections) after each mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    /// Macrobeat groupings and boundary styles.
    #[serde(flatten)]
    pub rhythm: Rhythm,
    /// Placed tonic signs.
    #[serde(default, alias = "tonicSignPlacements")]
    pub tonic_signs: Vec<TonicSignPlacement>,
    /// Modulation markers, active or not.
    #[serde(default)]
    pub modulation_markers: Vec<ModulationMarker>,
    /// Number of pitch ranks (`fullRowData.length`).
    pub total_ranks: usize,
}

impl ScoreSnapshot {
    /// Create a snapshot without tonic signs or markers.
    pub fn new(rhythm: Rhythm, total_ranks: usize) -> Self {
        Self {
            rhythm,
            tonic_signs: Vec::new(),
            modulation_markers: Vec::new(),
            total_ranks,
        }
    }

    /// True when at least one marker is active.
    pub fn has_active_modulation(&self) -> bool {
        self.modulation_markers.iter().any(|m| m.active)
    }
}
