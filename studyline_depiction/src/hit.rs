// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inverse mapping from pointer coordinates to study entities.

use studyline_layout::{LayoutResult, LayoutStyle};
use studyline_model::{DepictionContext, Selection, Study};

/// Maps a point in layout coordinates to the [`Selection`] under it.
///
/// Rows are matched by their band; left of the margin yields a group-only
/// selection; otherwise the first non-empty phase whose window of
/// `±hit_half_width` contains `x` wins. Returns `None` when nothing matches,
/// when the viewer lacks expert rights, and when the layout refers to
/// entities the study no longer contains (input from before a study swap).
pub fn locate(
    x: f64,
    y: f64,
    layout: &LayoutResult,
    study: &Study,
    ctx: &DepictionContext,
    style: &LayoutStyle,
) -> Option<Selection> {
    if !ctx.expert || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let row = layout.rows().iter().find(|row| row.contains_y(y))?;
    let group = study.group(row.key.group)?;
    if row.key.subgroup >= group.subgroups {
        return None;
    }
    if x < layout.left_margin {
        return Some(Selection::group_only(group.id, row.key.subgroup));
    }
    let half = style.hit_half_width;
    let column = layout
        .columns()
        .iter()
        .filter(|c| !c.empty)
        .find(|c| (x - c.x).abs() <= half)?;
    study.phase(column.phase)?;
    Some(Selection::cell(group.id, column.phase, row.key.subgroup))
}
