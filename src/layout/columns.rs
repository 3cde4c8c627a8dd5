//! Column layout: musical structure → ordered column widths.
//!
//! The grid is a row of columns with irregular unit widths: two narrow
//! legend columns on each side, one column per microbeat, and two extra
//! microbeat-wide columns for every tonic sign inserted between
//! macrobeats. Pixel positions are `units × cell_width`.
//!
//! # Complexity
//!
//! - `build`: O(n + t log t) for n columns and t tonic placements
//! - `column_start_units`: O(1)
//! - `unit_to_column`: O(log n)

use crate::config::LayoutConstants;
use crate::model::{TonicSignPlacement, TonicUuid};
use tracing::debug;

/// Number of legend columns on each side of the grid.
pub const LEGEND_COLUMNS_PER_SIDE: usize = 2;

/// Columns consumed by one tonic event.
pub const TONIC_COLUMN_SPAN: usize = 2;

/// Column span of one macrobeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacrobeatInfo {
    /// Macrobeat index.
    pub index: usize,
    /// Microbeats in the group.
    pub grouping: u8,
    /// First column of the macrobeat.
    pub start_column: usize,
    /// Last column of the macrobeat (inclusive).
    pub end_column: usize,
}

/// Columns reserved for one tonic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonicSlot {
    /// Tonic event the slot belongs to.
    pub uuid: TonicUuid,
    /// First of the two reserved columns.
    pub start_column: usize,
    /// Macrobeat the tonic follows (`-1` before the first).
    pub pre_macrobeat_index: i32,
}

/// Ordered column unit widths with a prefix-sum table.
///
/// # Invariants
/// - First two and last two widths are the side column width
/// - `prefix.len() == widths.len() + 1`, `prefix[0] == 0`
/// - `prefix[i + 1] == prefix[i] + widths[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWidths {
    widths: Vec<f64>,
    prefix: Vec<f64>,
    macrobeats: Vec<MacrobeatInfo>,
    tonic_slots: Vec<TonicSlot>,
}

impl ColumnWidths {
    /// Build the column widths for a rhythm and its tonic placements.
    ///
    /// Placements sharing a `uuid` at the same insertion point reserve a
    /// single two-column slot. Never fails; empty input yields the four
    /// legend columns.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gridscale::config::LayoutConstants;
    /// # use gridscale::layout::columns::ColumnWidths;
    /// let columns = ColumnWidths::build(&[2, 2, 2], &[], &LayoutConstants::default());
    /// assert_eq!(columns.len(), 10);
    /// ```
    pub fn build(
        groupings: &[u8],
        placements: &[TonicSignPlacement],
        constants: &LayoutConstants,
    ) -> Self {
        let side = constants.side_column_width;
        let beat = constants.beat_column_width;

        let mut sorted: Vec<&TonicSignPlacement> = placements.iter().collect();
        sorted.sort_by(|a, b| {
            a.pre_macrobeat_index
                .cmp(&b.pre_macrobeat_index)
                .then_with(|| a.uuid.cmp(&b.uuid))
        });

        let microbeats: usize = groupings.iter().map(|&g| g as usize).sum();
        let mut builder = Builder {
            widths: Vec::with_capacity(2 * LEGEND_COLUMNS_PER_SIDE + microbeats),
            tonic_slots: Vec::new(),
            sorted,
            cursor: 0,
            beat,
        };

        builder.widths.extend([side; LEGEND_COLUMNS_PER_SIDE]);
        builder.flush_tonics(-1);

        let mut macrobeats = Vec::with_capacity(groupings.len());
        for (index, &grouping) in groupings.iter().enumerate() {
            let start_column = builder.widths.len();
            builder
                .widths
                .extend(std::iter::repeat(beat).take(grouping as usize));
            macrobeats.push(MacrobeatInfo {
                index,
                grouping,
                start_column,
                end_column: (start_column + grouping as usize).saturating_sub(1),
            });
            builder.flush_tonics(index as i32);
        }

        builder.widths.extend([side; LEGEND_COLUMNS_PER_SIDE]);

        let Builder {
            widths,
            tonic_slots,
            ..
        } = builder;

        debug!(
            columns = widths.len(),
            macrobeats = macrobeats.len(),
            tonic_slots = tonic_slots.len(),
            "Built column widths"
        );

        Self::from_parts(widths, macrobeats, tonic_slots)
    }

    /// Wrap an explicit width list (no macrobeat or tonic metadata).
    pub fn from_widths(widths: Vec<f64>) -> Self {
        Self::from_parts(widths, Vec::new(), Vec::new())
    }

    fn from_parts(widths: Vec<f64>, macrobeats: Vec<MacrobeatInfo>, tonic_slots: Vec<TonicSlot>) -> Self {
        let mut prefix = Vec::with_capacity(widths.len() + 1);
        let mut acc = 0.0;
        prefix.push(acc);
        for w in &widths {
            acc += w;
            prefix.push(acc);
        }
        Self {
            widths,
            prefix,
            macrobeats,
            tonic_slots,
        }
    }

    /// Column unit widths.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// True when there are no columns at all.
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Sum of all unit widths.
    pub fn total_units(&self) -> f64 {
        self.prefix.last().copied().unwrap_or(0.0)
    }

    /// Unit offset of a (fractional) column index.
    ///
    /// Whole columns before `floor(index)` are summed; the fractional part
    /// is weighted by the width of column `floor(index)`. Indices outside
    /// the grid extrapolate with the first or last width.
    pub fn column_start_units(&self, index: f64) -> f64 {
        let n = self.widths.len();
        if n == 0 || !index.is_finite() {
            return 0.0;
        }
        if index < 0.0 {
            return index * self.widths[0];
        }
        let whole = index.floor();
        let i = whole as usize;
        if i >= n {
            return self.prefix[n] + (index - n as f64) * self.widths[n - 1];
        }
        self.prefix[i] + (index - whole) * self.widths[i]
    }

    /// Fractional column index at a unit offset. Inverse of
    /// [`ColumnWidths::column_start_units`].
    pub fn unit_to_column(&self, units: f64) -> f64 {
        let n = self.widths.len();
        if n == 0 || !units.is_finite() {
            return 0.0;
        }
        if units < 0.0 {
            return safe_div(units, self.widths[0]);
        }
        let total = self.prefix[n];
        if units >= total {
            return n as f64 + safe_div(units - total, self.widths[n - 1]);
        }
        // Largest i with prefix[i] <= units; i < n because units < total.
        let i = self.prefix.partition_point(|&p| p <= units) - 1;
        let i = i.min(n - 1);
        i as f64 + safe_div(units - self.prefix[i], self.widths[i])
    }

    /// Unmodulated pixel x of a column at `cell_width`.
    pub fn column_to_x(&self, index: f64, cell_width: f64) -> f64 {
        self.column_start_units(index) * cell_width
    }

    /// Total unmodulated grid width in pixels, legends included.
    pub fn canvas_width(&self, cell_width: f64) -> f64 {
        self.total_units() * cell_width
    }

    /// Pixel width of the legend on one side.
    pub fn legend_width(&self, cell_width: f64) -> f64 {
        let n = self.widths.len().min(LEGEND_COLUMNS_PER_SIDE);
        self.widths[..n].iter().sum::<f64>() * cell_width
    }

    /// Column span of macrobeat `index`, or `None` if out of range.
    pub fn macrobeat_info(&self, index: usize) -> Option<MacrobeatInfo> {
        self.macrobeats.get(index).copied()
    }

    /// All macrobeat spans in order.
    pub fn macrobeats(&self) -> &[MacrobeatInfo] {
        &self.macrobeats
    }

    /// Reserved tonic slots in column order.
    pub fn tonic_slots(&self) -> &[TonicSlot] {
        &self.tonic_slots
    }

    /// Column at which measure boundary `measure` sits.
    ///
    /// Measure 0 is the start of the musical area; measure `k` is the
    /// column right after macrobeat `k - 1`. Returns `None` when the
    /// macrobeat does not exist.
    pub fn measure_boundary_column(&self, measure: usize) -> Option<usize> {
        if measure == 0 {
            return (self.widths.len() >= LEGEND_COLUMNS_PER_SIDE).then_some(LEGEND_COLUMNS_PER_SIDE);
        }
        self.macrobeat_info(measure - 1).map(|mb| mb.end_column + 1)
    }
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self::from_widths(Vec::new())
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

struct Builder<'a> {
    widths: Vec<f64>,
    tonic_slots: Vec<TonicSlot>,
    sorted: Vec<&'a TonicSignPlacement>,
    cursor: usize,
    beat: f64,
}

impl Builder<'_> {
    /// Emit two columns per distinct tonic uuid placed at `mb_index`.
    fn flush_tonics(&mut self, mb_index: i32) {
        // Placements pointing before this index were never reachable
        // (stale or below -1); skip them so they cannot stall the cursor.
        while let Some(p) = self.sorted.get(self.cursor) {
            if p.pre_macrobeat_index >= mb_index {
                break;
            }
            debug!(uuid = %p.uuid, index = p.pre_macrobeat_index, "Skipping unreachable tonic placement");
            self.cursor += 1;
        }

        while let Some(p) = self.sorted.get(self.cursor) {
            if p.pre_macrobeat_index != mb_index {
                break;
            }
            let uuid = p.uuid.clone();
            self.tonic_slots.push(TonicSlot {
                uuid: uuid.clone(),
                start_column: self.widths.len(),
                pre_macrobeat_index: mb_index,
            });
            self.widths
                .extend(std::iter::repeat(self.beat).take(TONIC_COLUMN_SPAN));
            while self
                .sorted
                .get(self.cursor)
                .is_some_and(|q| q.pre_macrobeat_index == mb_index && q.uuid == uuid)
            {
                self.cursor += 1;
            }
        }
    }
}
