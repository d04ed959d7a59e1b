// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashMap;
use studyline_model::{GroupId, PhaseId};

use crate::Zoom;

/// The X position of one phase.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhaseColumn {
    /// Phase of this column.
    pub phase: PhaseId,
    /// Center line of the column.
    pub x: f64,
    /// Empty phases reuse a neighbor's X and take no space.
    pub empty: bool,
}

/// Identifies a row: a subgroup of a group.
///
/// When subgroups are collapsed every group has a single row with subgroup 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowKey {
    /// Group of the row.
    pub group: GroupId,
    /// Subgroup index of the row.
    pub subgroup: u32,
}

/// The vertical placement of one row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Row {
    /// Which subgroup this row shows.
    pub key: RowKey,
    /// Top edge of the row band.
    pub top: f64,
    /// Timeline center line.
    pub y: f64,
    /// Baseline of sampling names below the timeline.
    pub sampling_y: f64,
    /// Height of the row band.
    pub height: f64,
}

impl Row {
    /// Bottom edge of the row band.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Returns `true` if `y` falls inside the row band.
    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.top && y < self.bottom()
    }
}

/// Coordinate tables produced by [`compute_positions`](crate::compute_positions).
///
/// Tables are keyed by entity id. Two results computed from the same inputs
/// compare equal.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    /// Zoom step actually used, after clamping or auto-fit.
    pub zoom: Zoom,
    /// Width of a non-empty phase column.
    pub column_width: f64,
    /// Width of the group label area.
    pub left_margin: f64,
    /// Top of the legend band.
    pub legend_y: f64,
    /// Bottom of the rotated phase headers; rows start here.
    pub offset_y: f64,
    /// Total width.
    pub max_x: f64,
    /// Total height.
    pub max_y: f64,
    /// Whether subgroups share one row per group.
    pub collapsed: bool,
    pub(crate) columns: Vec<PhaseColumn>,
    pub(crate) rows: Vec<Row>,
    pub(crate) column_index: HashMap<PhaseId, usize>,
    pub(crate) row_index: HashMap<RowKey, usize>,
}

impl LayoutResult {
    /// Columns in chronological order.
    pub fn columns(&self) -> &[PhaseColumn] {
        &self.columns
    }

    /// Rows in hierarchical order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The column of `phase`.
    pub fn column(&self, phase: PhaseId) -> Option<&PhaseColumn> {
        self.column_index.get(&phase).map(|&i| &self.columns[i])
    }

    /// X of `phase`.
    pub fn x(&self, phase: PhaseId) -> Option<f64> {
        self.column(phase).map(|c| c.x)
    }

    /// The row showing `subgroup` of `group`.
    ///
    /// When subgroups are collapsed every subgroup maps to the group's single row.
    pub fn row(&self, group: GroupId, subgroup: u32) -> Option<&Row> {
        let subgroup = if self.collapsed { 0 } else { subgroup };
        self.row_index
            .get(&RowKey { group, subgroup })
            .map(|&i| &self.rows[i])
    }

    /// Timeline Y of `subgroup` of `group`.
    pub fn y(&self, group: GroupId, subgroup: u32) -> Option<f64> {
        self.row(group, subgroup).map(|r| r.y)
    }

    /// Rows of one group, top to bottom.
    pub fn group_rows(&self, group: GroupId) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().filter(move |r| r.key.group == group)
    }

    /// Vertical extent `(top, bottom)` of all rows of `group`.
    pub fn group_span(&self, group: GroupId) -> Option<(f64, f64)> {
        let mut rows = self.group_rows(group);
        let first = rows.next()?;
        let last = rows.last().unwrap_or(first);
        Some((first.top, last.bottom()))
    }

    /// The first non-empty column strictly right of `x`, if any.
    pub fn next_column_x(&self, x: f64) -> Option<f64> {
        self.columns
            .iter()
            .filter(|c| !c.empty && c.x > x)
            .map(|c| c.x)
            .next()
    }

    /// Returns `true` if there is nothing to lay out.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}
