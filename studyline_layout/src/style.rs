// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};

/// Geometric constants of a depiction, in layout units.
///
/// Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    /// Size of group labels and phase names.
    pub font_size: f64,
    /// Size of action glyphs, labels, counts, and dates.
    pub small_font_size: f64,
    /// Space above everything else.
    pub top_margin: f64,
    /// Whether to reserve space for and draw the legend.
    pub show_legend: bool,
    /// Height of the legend band.
    pub legend_height: f64,
    /// Lower bound of the left margin.
    pub min_left_margin: f64,
    /// Space added after the widest group label.
    pub margin_padding: f64,
    /// Growth of the column width per zoom step.
    pub zoom_base: f64,
    /// Total width auto-fit aims for.
    pub autofit_target_width: f64,
    /// Height of one subgroup row.
    pub row_height: f64,
    /// Extra height of rows carrying a secondary sampling.
    pub sampling_extra_height: f64,
    /// Space after the last subgroup of a group.
    pub group_gap: f64,
    /// Space between the rotated phase headers and the first row.
    pub header_padding: f64,
    /// Space right of the last column and below the last row.
    pub trailing_margin: f64,
    /// Horizontal half-width of a phase's hit window.
    pub hit_half_width: f64,
    /// Space between the left margin and the first column.
    pub column_padding: f64,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            small_font_size: 9.0,
            top_margin: 4.0,
            show_legend: true,
            legend_height: 16.0,
            min_left_margin: 60.0,
            margin_padding: 15.0,
            zoom_base: 1.3,
            autofit_target_width: 800.0,
            row_height: 22.0,
            sampling_extra_height: 10.0,
            group_gap: 6.0,
            header_padding: 12.0,
            trailing_margin: 40.0,
            hit_half_width: 11.0,
            column_padding: 10.0,
        }
    }
}

impl LayoutStyle {
    /// Column width at zoom 0, derived from the default text size.
    pub fn base_column_width(&self) -> f64 {
        4.0 * self.font_size + 6.0
    }

    /// Height reserved for the legend, zero when it is hidden.
    pub fn legend_space(&self) -> f64 {
        if self.show_legend {
            self.legend_height
        } else {
            0.0
        }
    }
}
