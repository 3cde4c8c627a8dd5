//! Modulation markers: points where the microbeat spacing changes.

use super::identifiers::MarkerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance used when matching a raw float against a known ratio.
const RATIO_TOLERANCE: f64 = 0.001;

/// Spacing change applied after a modulation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum ModulationRatio {
    /// 2:3, microbeats get narrower.
    Compress,
    /// 3:2, microbeats get wider.
    Expand,
}

/// Error returned for a ratio that is neither 2/3 nor 3/2.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Unsupported modulation ratio {0} (expected 2/3 or 3/2)")]
pub struct InvalidRatio(pub f64);

impl ModulationRatio {
    /// Numeric scale factor.
    pub fn value(self) -> f64 {
        match self {
            Self::Compress => 2.0 / 3.0,
            Self::Expand => 3.0 / 2.0,
        }
    }

    /// Label shown on the marker ("2:3" or "3:2").
    pub fn display_text(self) -> &'static str {
        match self {
            Self::Compress => "2:3",
            Self::Expand => "3:2",
        }
    }

    /// The other ratio. Clicking a marker label flips between the two.
    pub fn toggled(self) -> Self {
        match self {
            Self::Compress => Self::Expand,
            Self::Expand => Self::Compress,
        }
    }

    /// Match a raw float against the supported ratios.
    pub fn try_from_f64(value: f64) -> Result<Self, InvalidRatio> {
        if (value - Self::Compress.value()).abs() < RATIO_TOLERANCE {
            Ok(Self::Compress)
        } else if (value - Self::Expand.value()).abs() < RATIO_TOLERANCE {
            Ok(Self::Expand)
        } else {
            Err(InvalidRatio(value))
        }
    }
}

impl TryFrom<f64> for ModulationRatio {
    type Error = InvalidRatio;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_from_f64(value)
    }
}

impl From<ModulationRatio> for f64 {
    fn from(value: ModulationRatio) -> Self {
        value.value()
    }
}

/// Where a marker sits on the grid.
///
/// Variants are listed in resolution priority order: a stored pixel
/// position is the most specific, a measure index the least.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Stored canvas x position in pixels.
    Pixel(f64),
    /// Column index into the column layout.
    Column(usize),
    /// Measure boundary: `0` is the first beat, `k` is the end of
    /// macrobeat `k - 1`.
    Measure(usize),
}

impl Anchor {
    /// Pick the most specific anchor from the optional fields the score
    /// store keeps on each marker.
    ///
    /// A stale less-specific field never overrides a more specific one.
    pub fn from_fields(
        x_position: Option<f64>,
        column_index: Option<usize>,
        measure_index: Option<usize>,
    ) -> Option<Self> {
        if let Some(x) = x_position.filter(|x| x.is_finite()) {
            return Some(Self::Pixel(x));
        }
        if let Some(column) = column_index {
            return Some(Self::Column(column));
        }
        measure_index.map(Self::Measure)
    }
}

/// A tempo-change point on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarkerRecord", into = "MarkerRecord")]
pub struct ModulationMarker {
    /// Stable id, also the tie-breaker for markers at the same anchor.
    pub id: MarkerId,
    /// Spacing ratio applied after the marker.
    pub ratio: ModulationRatio,
    /// Inactive markers are ignored by the mapper.
    pub active: bool,
    /// Resolved anchor.
    pub anchor: Anchor,
}

impl ModulationMarker {
    /// Create an active marker.
    pub fn new(id: MarkerId, ratio: ModulationRatio, anchor: Anchor) -> Self {
        Self {
            id,
            ratio,
            active: true,
            anchor,
        }
    }

    /// Builder-style setter for the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// Error returned when a stored marker record cannot become a marker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidMarker {
    /// Empty id.
    #[error("Marker id must not be empty")]
    EmptyId,
    /// Ratio other than 2/3 or 3/2.
    #[error(transparent)]
    Ratio(#[from] InvalidRatio),
    /// None of the anchor fields were present.
    #[error("Marker {0} has no xPosition, columnIndex, measureIndex or macrobeatIndex")]
    NoAnchor(String),
}

/// Marker as persisted by the score store: every anchor field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkerRecord {
    id: String,
    ratio: f64,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    measure_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    macrobeat_index: Option<usize>,
}

fn default_active() -> bool {
    true
}

impl TryFrom<MarkerRecord> for ModulationMarker {
    type Error = InvalidMarker;

    fn try_from(record: MarkerRecord) -> Result<Self, Self::Error> {
        let id = MarkerId::new(record.id.clone()).map_err(|_| InvalidMarker::EmptyId)?;
        let ratio = ModulationRatio::try_from_f64(record.ratio)?;
        // A macrobeat index names the boundary after that macrobeat.
        let measure = record
            .measure_index
            .or(record.macrobeat_index.map(|mb| mb + 1));
        let anchor = Anchor::from_fields(record.x_position, record.column_index, measure)
            .ok_or(InvalidMarker::NoAnchor(record.id))?;
        Ok(Self {
            id,
            ratio,
            active: record.active,
            anchor,
        })
    }
}

impl From<ModulationMarker> for MarkerRecord {
    fn from(marker: ModulationMarker) -> Self {
        let (x_position, column_index, measure_index) = match marker.anchor {
            Anchor::Pixel(x) => (Some(x), None, None),
            Anchor::Column(c) => (None, Some(c), None),
            Anchor::Measure(m) => (None, None, Some(m)),
        };
        Self {
            id: marker.id.into(),
            ratio: marker.ratio.value(),
            active: marker.active,
            x_position,
            column_index,
            measure_index,
            macrobeat_index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ratio {
        use super::*;

        #[test]
        fn accepts_values_within_tolerance() {
            assert_eq!(
                ModulationRatio::try_from_f64(0.6667),
                Ok(ModulationRatio::Compress)
            );
            assert_eq!(ModulationRatio::try_from_f64(1.5), Ok(ModulationRatio::Expand));
        }

        #[test]
        fn rejects_other_values() {
            assert_eq!(ModulationRatio::try_from_f64(2.0), Err(InvalidRatio(2.0)));
        }

        #[test]
        fn toggled_flips_between_ratios() {
            assert_eq!(ModulationRatio::Compress.toggled(), ModulationRatio::Expand);
            assert_eq!(ModulationRatio::Expand.toggled(), ModulationRatio::Compress);
        }

        #[test]
        fn display_text_matches_ratio() {
            assert_eq!(ModulationRatio::Compress.display_text(), "2:3");
            assert_eq!(ModulationRatio::Expand.display_text(), "3:2");
        }
    }

    mod anchor {
        use super::*;

        #[test]
        fn pixel_wins_over_everything() {
            assert_eq!(
                Anchor::from_fields(Some(120.0), Some(4), Some(2)),
                Some(Anchor::Pixel(120.0))
            );
        }

        #[test]
        fn column_wins_over_measure() {
            assert_eq!(
                Anchor::from_fields(None, Some(4), Some(2)),
                Some(Anchor::Column(4))
            );
        }

        #[test]
        fn non_finite_pixel_falls_through() {
            assert_eq!(
                Anchor::from_fields(Some(f64::NAN), None, Some(1)),
                Some(Anchor::Measure(1))
            );
        }

        #[test]
        fn no_fields_is_none() {
            assert_eq!(Anchor::from_fields(None, None, None), None);
        }
    }

    mod serde_record {
        use super::*;

        #[test]
        fn deserializes_store_record_with_stored_position() {
            let json = r#"{"id":"mod_1","measureIndex":2,"ratio":0.6666666667,"active":true,"xPosition":200.0,"columnIndex":null}"#;
            let marker: ModulationMarker = serde_json::from_str(json).unwrap();
            assert_eq!(marker.ratio, ModulationRatio::Compress);
            assert_eq!(marker.anchor, Anchor::Pixel(200.0));
            assert!(marker.active);
        }

        #[test]
        fn macrobeat_index_becomes_following_measure() {
            let json = r#"{"id":"mod_2","ratio":1.5,"macrobeatIndex":3}"#;
            let marker: ModulationMarker = serde_json::from_str(json).unwrap();
            assert_eq!(marker.anchor, Anchor::Measure(4));
        }

        #[test]
        fn record_without_anchor_is_rejected() {
            let json = r#"{"id":"mod_3","ratio":1.5}"#;
            let result: Result<ModulationMarker, _> = serde_json::from_str(json);
            assert!(result.is_err());
        }

        #[test]
        fn record_with_bad_ratio_is_rejected() {
            let json = r#"{"id":"mod_4","ratio":2.0,"columnIndex":3}"#;
            let result: Result<ModulationMarker, _> = serde_json::from_str(json);
            assert!(result.is_err());
        }
    }
}
