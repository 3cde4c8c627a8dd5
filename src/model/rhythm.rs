//! Rhythm structure consumed by the column layout builder.

use super::identifiers::TonicUuid;
use serde::{Deserialize, Serialize};

/// Visual style of the boundary between two macrobeats.
///
/// Affects how grid lines are drawn, never the column math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryStyle {
    /// Solid bar line.
    #[default]
    Solid,
    /// Dashed beat line.
    Dashed,
    /// Pickup boundary before the first full measure.
    Anacrusis,
}

/// Beat groupings plus the boundary style after each group.
///
/// `groupings[i]` is the number of microbeat columns spanned by macrobeat
/// `i` (2 or 3 in practice). `boundary_styles[i]` styles the gap after it;
/// missing styles default to [`BoundaryStyle::Solid`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rhythm {
    /// Microbeats per macrobeat, in order.
    #[serde(alias = "macrobeatGroupings")]
    pub groupings: Vec<u8>,
    /// Style of the boundary after each macrobeat.
    #[serde(default, alias = "macrobeatBoundaryStyles")]
    pub boundary_styles: Vec<BoundaryStyle>,
}

impl Rhythm {
    /// Create a rhythm with solid boundaries everywhere.
    pub fn new(groupings: Vec<u8>) -> Self {
        let boundary_styles = vec![BoundaryStyle::Solid; groupings.len()];
        Self {
            groupings,
            boundary_styles,
        }
    }

    /// Number of macrobeats.
    pub fn len(&self) -> usize {
        self.groupings.len()
    }

    /// True when there are no macrobeats.
    pub fn is_empty(&self) -> bool {
        self.groupings.is_empty()
    }

    /// Total microbeat count across all macrobeats.
    pub fn total_microbeats(&self) -> usize {
        self.groupings.iter().map(|&g| g as usize).sum()
    }

    /// Boundary style after macrobeat `index`.
    pub fn boundary_style(&self, index: usize) -> BoundaryStyle {
        self.boundary_styles.get(index).copied().unwrap_or_default()
    }
}

/// One placement of a tonic sign on the grid.
///
/// Several placements may share a `uuid` when the same tonic event is
/// drawn on multiple octave rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TonicSignPlacement {
    /// Logical tonic event this placement belongs to.
    pub uuid: TonicUuid,
    /// Pitch row the glyph is drawn on.
    #[serde(default)]
    pub row: u32,
    /// Column the glyph occupies.
    #[serde(default)]
    pub column_index: u32,
    /// Macrobeat after which the tonic is inserted; `-1` means before the
    /// first macrobeat.
    pub pre_macrobeat_index: i32,
    /// Scale degree displayed inside the sign.
    #[serde(default = "default_tonic_number")]
    pub tonic_number: u8,
}

fn default_tonic_number() -> u8 {
    1
}

impl TonicSignPlacement {
    /// Create a placement; `row` and `column_index` only matter to renderers.
    pub fn new(uuid: TonicUuid, pre_macrobeat_index: i32) -> Self {
        Self {
            uuid,
            row: 0,
            column_index: 0,
            pre_macrobeat_index,
            tonic_number: default_tonic_number(),
        }
    }

    /// Builder-style setter for the pitch row.
    pub fn with_row(mut self, row: u32) -> Self {
        self.row = row;
        self
    }
}
