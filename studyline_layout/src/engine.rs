// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::HashMap;
use studyline_model::{DepictionContext, Phase, Study, VisibilityLevel};
use tracing::{debug, trace};

use crate::{
    FontMetrics, LayoutResult, LayoutStyle, PhaseColumn, Row, RowKey, Zoom, ZoomRequest,
};

/// The text of one rotated phase header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseHeader {
    /// Short name, e.g. `d7`.
    pub name: String,
    /// Free-text label, if non-blank.
    pub label: Option<String>,
    /// `dd.mm.yyyy Ddd`, if the phase is dated.
    pub date: Option<String>,
}

impl PhaseHeader {
    /// Collects the header text of `phase`.
    pub fn of(study: &Study, phase: &Phase) -> Self {
        Self {
            name: study.phase_name(phase),
            label: phase
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_owned),
            date: phase.date.map(|d| d.format("%d.%m.%Y %a").to_string()),
        }
    }

    /// Gap between the parts of a header.
    pub fn gap(style: &LayoutStyle) -> f64 {
        style.small_font_size * 0.5
    }

    /// Length of the rotated header, i.e. the height it occupies.
    pub fn extent<M: FontMetrics + ?Sized>(&self, metrics: &M, style: &LayoutStyle) -> f64 {
        let gap = Self::gap(style);
        let small = |text: &Option<String>| {
            text.as_deref()
                .map_or(0.0, |t| gap + metrics.text_width(t, style.small_font_size))
        };
        metrics.text_width(&self.name, style.font_size) + small(&self.label) + small(&self.date)
    }
}

/// Width of the group label area.
///
/// At least `min_left_margin`, and wide enough for every group label plus padding.
pub fn left_margin<M: FontMetrics + ?Sized>(
    study: &Study,
    metrics: &M,
    level: VisibilityLevel,
    style: &LayoutStyle,
) -> f64 {
    study
        .groups()
        .iter()
        .enumerate()
        .map(|(i, g)| {
            metrics.text_width(&level.group_label(g, i + 1), style.font_size) + style.margin_padding
        })
        .fold(style.min_left_margin, f64::max)
}

#[allow(
    clippy::cast_precision_loss,
    reason = "column counts stay far below 2^52"
)]
fn total_width(spaced: usize, zoom: Zoom, left_margin: f64, style: &LayoutStyle) -> f64 {
    let column_width = style.base_column_width() * zoom.factor(style.zoom_base);
    left_margin + style.column_padding + spaced as f64 * column_width + style.trailing_margin
}

/// The zoom step whose total width is closest to the auto-fit target.
///
/// Ties go to the smaller step. With no spaced columns the default step is used.
pub fn autofit_zoom(spaced: usize, left_margin: f64, style: &LayoutStyle) -> Zoom {
    if spaced == 0 {
        return Zoom::default();
    }
    let target = style.autofit_target_width;
    let zoom = Zoom::all()
        .min_by(|a, b| {
            let da = (total_width(spaced, *a, left_margin, style) - target).abs();
            let db = (total_width(spaced, *b, left_margin, style) - target).abs();
            da.total_cmp(&db)
        })
        .unwrap_or_default();
    trace!(spaced, target, zoom = zoom.get(), "auto-fit zoom");
    zoom
}

/// Computes the coordinate tables of a depiction.
///
/// This is a pure function of its inputs: calling it twice with the same
/// arguments returns equal results.
pub fn compute_positions<M: FontMetrics + ?Sized>(
    study: &Study,
    zoom: ZoomRequest,
    metrics: &M,
    ctx: &DepictionContext,
    style: &LayoutStyle,
) -> LayoutResult {
    let left_margin = left_margin(study, metrics, ctx.level, style);

    let keep_empty = ctx.keeps_empty_phases();
    let empty: Vec<bool> = study
        .phases()
        .iter()
        .map(|p| !keep_empty && !study.phase_has_data(p.id))
        .collect();
    let spaced = empty.iter().filter(|e| !**e).count();

    let zoom = match zoom {
        ZoomRequest::Fixed(zoom) => zoom,
        ZoomRequest::AutoFit => autofit_zoom(spaced, left_margin, style),
    };
    let column_width = style.base_column_width() * zoom.factor(style.zoom_base);

    // Columns.
    let mut columns = Vec::with_capacity(empty.len());
    let mut column_index = HashMap::with_capacity(empty.len());
    let mut cursor_x = left_margin + style.column_padding;
    let mut previous_x: Option<f64> = None;
    for (phase, &empty) in study.phases().iter().zip(&empty) {
        let x = if empty {
            previous_x.unwrap_or(cursor_x)
        } else {
            let x = cursor_x;
            cursor_x += column_width;
            x
        };
        previous_x = Some(x);
        column_index.insert(phase.id, columns.len());
        columns.push(PhaseColumn {
            phase: phase.id,
            x,
            empty,
        });
    }

    // Header.
    let header_extent = study
        .phases()
        .iter()
        .zip(&empty)
        .filter(|(_, empty)| !**empty)
        .map(|(p, _)| PhaseHeader::of(study, p).extent(metrics, style))
        .fold(0.0, f64::max);
    let legend_y = style.top_margin;
    let offset_y = legend_y + style.legend_space() + header_extent + style.header_padding;

    // Rows.
    let collapsed = ctx.level.collapses_subgroups();
    let mut rows = Vec::new();
    let mut row_index = HashMap::new();
    let mut cursor_y = offset_y;
    let mut push_row = |key: RowKey, top: f64, height: f64| {
        let y = top + style.row_height * 0.5;
        row_index.insert(key, rows.len());
        rows.push(Row {
            key,
            top,
            y,
            sampling_y: y + style.small_font_size + 3.0,
            height,
        });
    };
    for group in study.groups() {
        if collapsed {
            push_row(
                RowKey {
                    group: group.id,
                    subgroup: 0,
                },
                cursor_y,
                style.row_height,
            );
            cursor_y += style.row_height;
            continue;
        }
        for subgroup in 0..group.subgroups {
            let secondary = study
                .row_actions(group.id, subgroup)
                .any(|(_, a)| a.secondary_sampling.is_some());
            let height = if secondary {
                style.row_height + style.sampling_extra_height
            } else {
                style.row_height
            };
            push_row(
                RowKey {
                    group: group.id,
                    subgroup,
                },
                cursor_y,
                height,
            );
            cursor_y += height;
        }
        cursor_y += style.group_gap;
    }

    let max_x = cursor_x + style.trailing_margin;
    let max_y = cursor_y + style.trailing_margin;

    debug!(
        zoom = zoom.get(),
        column_width,
        left_margin,
        offset_y,
        columns = columns.len(),
        rows = rows.len(),
        collapsed,
        "computed study layout"
    );

    LayoutResult {
        zoom,
        column_width,
        left_margin,
        legend_y,
        offset_y,
        max_x,
        max_y,
        collapsed,
        columns,
        rows,
        column_index,
        row_index,
    }
}
