// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render passes.
//!
//! Passes run in a fixed order over an [`ImagingBackend`], each consulting the
//! [`VisibilityLevel`](studyline_model::VisibilityLevel) for what it may show:
//!
//! 1. legend,
//! 2. group bands and labels,
//! 3. phase headers, guides, and the "today" column,
//! 4. group timelines and fork connectors,
//! 5. subgroup counts and ordinals,
//! 6. hazard halos,
//! 7. action glyphs,
//! 8. the stopped-study cross.
//!
//! Pass 9, the hover and selection highlight, lives in [`paint_overlay`] and
//! is drawn live on top of the cached output.
//!
//! Every pass returns `Result`; [`render_study`] stops at the first fault and
//! draws its message instead.

use core::f64::consts::FRAC_PI_2;
use core::fmt;
use core::ops::Range;

use chrono::{Datelike, Weekday};
use kurbo::{BezPath, Point, Rect, Size, Stroke};
use peniko::{
    Brush, Color, ColorStop, Extend, Gradient, GradientKind, LinearGradientPosition,
    RadialGradientPosition,
};
use studyline_imaging::{
    Affine, Circle, DrawOp, ImagingBackend, Line, StateOp, TextAnchor, TextRun,
};
use studyline_layout::{FontMetrics, LayoutResult, LayoutStyle, PhaseHeader, Row};
use studyline_model::{
    DepictionContext, Group, GroupId, Phase, PhaseId, Rgb, SampleStatus, Selection, Study,
    StudyAction,
};
use tracing::warn;

use crate::config::{color, with_alpha};
use crate::{DepictionConfig, Palette, RenderError};

/// Everything the render passes read.
#[derive(Clone, Copy)]
pub struct RenderInput<'a> {
    /// The study.
    pub study: &'a Study,
    /// Its layout.
    pub layout: &'a LayoutResult,
    /// Viewer context.
    pub ctx: &'a DepictionContext,
    /// Style and colors.
    pub config: &'a DepictionConfig,
    /// Text measurement, the same the layout was computed with.
    pub metrics: &'a dyn FontMetrics,
    /// Size of the target in layout units; the background covers at least this.
    pub canvas: Size,
}

impl fmt::Debug for RenderInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderInput")
            .field("study", &self.study.identifier())
            .field("ctx", self.ctx)
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

impl RenderInput<'_> {
    fn style(&self) -> &LayoutStyle {
        &self.config.style
    }

    fn palette(&self) -> &Palette {
        &self.config.palette
    }
}

/// Thin drawing helper over a backend with a base transform.
struct Painter<'a> {
    backend: &'a mut dyn ImagingBackend,
    base: Affine,
}

impl Painter<'_> {
    fn transform(&mut self, local: Affine) {
        self.backend.state(StateOp::SetTransform(self.base * local));
    }

    fn reset_transform(&mut self) {
        self.transform(Affine::IDENTITY);
    }

    fn paint(&mut self, brush: impl Into<Brush>) {
        self.backend.state(StateOp::SetPaint(brush.into()));
    }

    fn fill_rect(&mut self, rect: Rect, brush: impl Into<Brush>) {
        self.paint(brush);
        self.backend.draw(DrawOp::FillRect(rect));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, stroke: Stroke) {
        self.paint(color);
        self.backend.state(StateOp::SetStroke(stroke));
        self.backend.draw(DrawOp::StrokeRect(rect));
    }

    fn line(&mut self, p0: impl Into<Point>, p1: impl Into<Point>, color: Color, width: f64) {
        self.paint(color);
        self.backend.state(StateOp::SetStroke(Stroke::new(width)));
        self.backend.draw(DrawOp::StrokeLine(Line::new(p0, p1)));
    }

    fn fill_path(&mut self, path: BezPath, color: Color) {
        self.paint(color);
        self.backend.draw(DrawOp::FillPath(path));
    }

    fn stroke_path(&mut self, path: BezPath, color: Color, width: f64) {
        self.paint(color);
        self.backend.state(StateOp::SetStroke(Stroke::new(width)));
        self.backend.draw(DrawOp::StrokePath(path));
    }

    fn text(&mut self, run: TextRun, color: Color) {
        self.paint(color);
        self.backend.draw(DrawOp::DrawText(run));
    }

    /// Runs `f` with drawing clipped to `rect`; the clip is popped whatever `f` returns.
    fn clipped<R>(&mut self, rect: Rect, f: impl FnOnce(&mut Self) -> R) -> R {
        self.backend.clip_to_rect(rect);
        let out = f(self);
        self.backend.layer_pop();
        out
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "font sizes are small and fit in f32"
)]
fn font(size: f64) -> f32 {
    size as f32
}

fn column_x(layout: &LayoutResult, phase: PhaseId) -> Result<f64, RenderError> {
    layout.x(phase).ok_or(RenderError::MissingColumn(phase))
}

fn row_of(layout: &LayoutResult, group: GroupId, subgroup: u32) -> Result<&Row, RenderError> {
    layout
        .row(group, subgroup)
        .ok_or(RenderError::MissingRow { group, subgroup })
}

/// Right edge of the drawn area: the last non-empty column plus half a column.
fn content_right(layout: &LayoutResult) -> f64 {
    layout
        .columns()
        .iter()
        .filter(|c| !c.empty)
        .map(|c| c.x)
        .fold(layout.left_margin, f64::max)
        + layout.column_width * 0.5
}

fn lines_height(lines: usize, line_height: f64) -> f64 {
    f64::from(u32::try_from(lines).unwrap_or(u32::MAX)) * line_height
}

/// Clip for `lines` lines of text whose first baseline is `baseline`.
///
/// Only the horizontal span is a constraint; the vertical extent always
/// covers the glyphs, so text is never cut off above or below.
fn text_clip(span: Range<f64>, baseline: f64, lines: usize, line_height: f64) -> Rect {
    let last = baseline + lines_height(lines.saturating_sub(1), line_height);
    Rect::new(span.start, baseline - line_height, span.end, last + line_height)
}

/// Subgroups a row stands for.
fn row_subgroups(layout: &LayoutResult, group: &Group, row: &Row) -> Range<u32> {
    if layout.collapsed {
        0..group.subgroups
    } else {
        row.key.subgroup..row.key.subgroup + 1
    }
}

/// First and last phase of a row's timeline.
struct RowExtent {
    start_x: f64,
    end: PhaseId,
    end_x: f64,
}

fn row_extent(
    input: &RenderInput<'_>,
    group: &Group,
    row: &Row,
) -> Result<Option<RowExtent>, RenderError> {
    let study = input.study;
    let subgroups = row_subgroups(input.layout, group, row);
    let mut first = None;
    let mut last = None;
    for phase in study.phases() {
        let has_data = subgroups.clone().any(|s| {
            study
                .action(group.id, s, phase.id)
                .is_some_and(StudyAction::has_data)
        });
        if has_data {
            first.get_or_insert(phase.id);
            last = Some(phase.id);
        }
    }
    let Some(start) = group.from_phase.or(first) else {
        return Ok(None);
    };
    let end = match last {
        Some(last) if study.phase_position(last) > study.phase_position(start) => last,
        _ => start,
    };
    Ok(Some(RowExtent {
        start_x: column_x(input.layout, start)?,
        end,
        end_x: column_x(input.layout, end)?,
    }))
}

/// Runs passes 1 through 8 into `backend`.
pub fn render_passes(
    backend: &mut dyn ImagingBackend,
    input: &RenderInput<'_>,
    base: Affine,
) -> Result<(), RenderError> {
    let mut p = Painter { backend, base };
    p.reset_transform();
    let extent = Rect::new(
        0.0,
        0.0,
        input.layout.max_x.max(input.canvas.width),
        input.layout.max_y.max(input.canvas.height),
    );
    p.fill_rect(extent, color(input.palette().background));

    legend(&mut p, input);
    bands(&mut p, input)?;
    headers(&mut p, input)?;
    timelines(&mut p, input)?;
    counts(&mut p, input)?;
    hazards(&mut p, input)?;
    actions(&mut p, input)?;
    stopped(&mut p, input);
    Ok(())
}

/// Runs the passes, catching any fault.
///
/// On a fault the message is drawn in red at the top left and the error is
/// returned so the caller can keep its cache empty.
pub fn render_study(
    backend: &mut dyn ImagingBackend,
    input: &RenderInput<'_>,
    base: Affine,
) -> Result<(), RenderError> {
    let result = render_passes(backend, input, base);
    if let Err(err) = &result {
        warn!(error = %err, study = input.study.identifier(), "render fault caught");
        draw_fault(backend, err, input.config, base);
    }
    result
}

/// Draws the inline message for a render fault.
pub fn draw_fault(
    backend: &mut dyn ImagingBackend,
    err: &RenderError,
    config: &DepictionConfig,
    base: Affine,
) {
    let mut p = Painter { backend, base };
    p.reset_transform();
    let style = &config.style;
    p.text(
        TextRun::new(
            format!("Render error: {err}"),
            (4.0, style.top_margin + style.font_size),
            font(style.font_size),
        )
        .bold(),
        color(config.palette.error),
    );
}

// Pass 1.
fn legend(p: &mut Painter<'_>, input: &RenderInput<'_>) {
    let style = input.style();
    if !style.show_legend || input.study.identifier().is_empty() {
        return;
    }
    let text = match input.study.secondary_id() {
        Some(secondary) if !secondary.is_empty() => {
            format!("{} / {}", input.study.identifier(), secondary)
        }
        _ => input.study.identifier().to_owned(),
    };
    let baseline = input.layout.legend_y + style.font_size;
    p.text(
        TextRun::new(text, (4.0, baseline), font(style.font_size)).bold(),
        color(input.palette().text),
    );
}

fn band_color(group: &Group, input: &RenderInput<'_>) -> Rgb {
    match group.color {
        Some(rgb) if input.ctx.level.shows_identity() => rgb,
        _ => input.palette().neutral_group,
    }
}

// Pass 2.
fn bands(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    let layout = input.layout;
    let style = input.style();
    let right = content_right(layout);
    for (i, group) in input.study.groups().iter().enumerate() {
        let (top, bottom) = layout.group_span(group.id).ok_or(RenderError::MissingRow {
            group: group.id,
            subgroup: 0,
        })?;
        let rgb = band_color(group, input);
        let stops = [
            ColorStop::from((0.0, with_alpha(rgb, 150))),
            ColorStop::from((1.0, color(input.palette().background))),
        ];
        let gradient = Gradient {
            kind: GradientKind::Linear(LinearGradientPosition::new((0.0, top), (right, top))),
            extend: Extend::Pad,
            stops: stops.as_slice().into(),
            ..Gradient::default()
        };
        p.fill_rect(Rect::new(0.0, top, right, bottom), Brush::Gradient(gradient));

        // Diagonal "continues" tab past the right edge.
        let tab = (bottom - top).min(style.row_height) * 0.5;
        let mut wedge = BezPath::new();
        wedge.move_to((right, top));
        wedge.line_to((right + tab, top));
        wedge.line_to((right, top + tab * 2.0));
        wedge.close_path();
        p.fill_path(wedge, with_alpha(rgb, 90));

        let first = row_of(layout, group.id, 0)?;
        p.text(
            TextRun::new(
                input.ctx.level.group_label(group, i + 1),
                (4.0, first.y + style.font_size * 0.35),
                font(style.font_size),
            ),
            color(input.palette().text),
        );
    }
    Ok(())
}

// Pass 3.
fn headers(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    let layout = input.layout;
    let style = input.style();
    let palette = input.palette();
    let header_top = layout.legend_y + style.legend_space();
    let guide_top = layout.offset_y - style.header_padding * 0.5;
    let bottom = layout.max_y - style.trailing_margin;

    for phase in input.study.phases() {
        let column = layout
            .column(phase.id)
            .ok_or(RenderError::MissingColumn(phase.id))?;
        if column.empty {
            continue;
        }
        let x = column.x;
        if input.ctx.today.is_some() && phase.date == input.ctx.today {
            let half = layout.column_width * 0.5;
            p.fill_rect(
                Rect::new(x - half, header_top, x + half, bottom),
                color(palette.today),
            );
        }
        p.line((x, guide_top), (x, bottom), color(palette.guide), 1.0);
        header_text(p, input, phase, x, guide_top);
    }
    Ok(())
}

fn header_text(p: &mut Painter<'_>, input: &RenderInput<'_>, phase: &Phase, x: f64, baseline: f64) {
    let style = input.style();
    let palette = input.palette();
    let metrics = input.metrics;
    let header = PhaseHeader::of(input.study, phase);
    let gap = PhaseHeader::gap(style);

    // Reads bottom to top, starting just above the guide line.
    p.transform(
        Affine::translate((x + style.font_size * 0.35, baseline)) * Affine::rotate(-FRAC_PI_2),
    );
    let mut cursor = metrics.text_width(&header.name, style.font_size) + gap;
    p.text(
        TextRun::new(header.name, (0.0, 0.0), font(style.font_size)).bold(),
        color(palette.text),
    );
    if let Some(label) = header.label {
        let width = metrics.text_width(&label, style.small_font_size);
        p.text(
            TextRun::new(label, (cursor, 0.0), font(style.small_font_size)),
            color(palette.text),
        );
        cursor += width + gap;
    }
    if let Some(date) = header.date {
        let weekend = phase
            .date
            .is_some_and(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun));
        let date_color = if weekend {
            palette.muted_text
        } else {
            palette.text
        };
        p.text(
            TextRun::new(date, (cursor, 0.0), font(style.small_font_size)),
            color(date_color),
        );
    }
    p.reset_transform();
}

/// The X closing a timeline that ends in a necropsy.
fn necropsy_cross(center: Point) -> BezPath {
    let mut cross = BezPath::new();
    cross.move_to((center.x - 4.0, center.y - 4.0));
    cross.line_to((center.x + 4.0, center.y + 4.0));
    cross.move_to((center.x - 4.0, center.y + 4.0));
    cross.line_to((center.x + 4.0, center.y - 4.0));
    cross
}

/// Two slanted strokes just right of `end`, where a row splits into child groups.
fn cut_marks(end: Point) -> BezPath {
    let mut cut = BezPath::new();
    for dx in [2.0, 6.0] {
        cut.move_to((end.x + dx, end.y + 5.0));
        cut.line_to((end.x + dx + 4.0, end.y - 5.0));
    }
    cut
}

fn arrow_head(tip: Point, dx: f64, dy: f64) -> BezPath {
    // `dx`/`dy` point from the tip back along the shaft.
    let mut head = BezPath::new();
    head.move_to(tip);
    head.line_to((tip.x + dx - dy * 0.6, tip.y + dy + dx * 0.6));
    head.line_to((tip.x + dx + dy * 0.6, tip.y + dy - dx * 0.6));
    head.close_path();
    head
}

// Pass 4.
fn timelines(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    let study = input.study;
    let layout = input.layout;
    let palette = input.palette();
    let level = input.ctx.level;
    let study_end = content_right(layout);

    for group in study.groups() {
        let line_rgb = if group.dividing_sampling.is_some() && level.shows_action_glyphs() {
            palette.dividing
        } else {
            palette.timeline
        };
        let line_color = color(line_rgb);
        let fork = match (group.from_group, group.from_phase) {
            (Some(parent), Some(phase)) => Some((parent, column_x(layout, phase)?)),
            _ => None,
        };

        for row in layout.group_rows(group.id) {
            let y = row.y;
            if let Some((parent, fork_x)) = fork {
                let parent_y = layout
                    .group_rows(parent)
                    .last()
                    .map(|r| r.y)
                    .ok_or(RenderError::MissingRow {
                        group: parent,
                        subgroup: 0,
                    })?;
                p.line((fork_x, parent_y), (fork_x, y), color(palette.connector), 1.0);
                p.paint(color(band_color(group, input)));
                p.backend
                    .draw(DrawOp::FillCircle(Circle::new((fork_x, y), 3.0)));
            }

            let Some(extent) = row_extent(input, group, row)? else {
                continue;
            };
            p.line(
                (layout.left_margin, y),
                (extent.start_x, y),
                color(palette.connector),
                1.0,
            );

            // Under BlindAll a necropsy cross would reveal the sampling plan.
            let subgroups = if level.shows_action_glyphs() {
                row_subgroups(layout, group, row)
            } else {
                0..0
            };
            let mut necropsy = false;
            for s in subgroups {
                let Some(action) = study.action(group.id, s, extent.end) else {
                    continue;
                };
                for sid in action.samplings() {
                    let sampling = study.sampling(sid).ok_or(RenderError::UnknownSampling {
                        group: group.id,
                        phase: extent.end,
                        sampling: sid,
                    })?;
                    necropsy |= sampling.necropsy;
                }
            }
            let splits = study
                .children_of(group.id)
                .any(|child| child.from_phase == Some(extent.end));

            let x = extent.end_x;
            if necropsy {
                p.line((extent.start_x, y), (x, y), line_color, 2.0);
                p.stroke_path(necropsy_cross(Point::new(x, y)), line_color, 2.0);
            } else if splits {
                p.line((extent.start_x, y), (x, y), line_color, 2.0);
                p.stroke_path(cut_marks(Point::new(x, y)), line_color, 1.5);
            } else {
                p.line((extent.start_x, y), (study_end, y), line_color, 2.0);
                p.fill_path(arrow_head(Point::new(study_end, y), -7.0, 0.0), line_color);
            }
        }
    }
    Ok(())
}

// Pass 5.
fn counts(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    let level = input.ctx.level;
    if !level.shows_annotations() {
        return Ok(());
    }
    let study = input.study;
    let layout = input.layout;
    let style = input.style();
    let muted = color(input.palette().muted_text);
    let size = font(style.small_font_size);

    for group in study.groups() {
        for row in layout.group_rows(group.id) {
            let subgroup = row.key.subgroup;
            if let Some(extent) = row_extent(input, group, row)? {
                let count = group
                    .subgroup_size(subgroup)
                    .filter(|n| *n > 0)
                    .map_or_else(|| study.samples_in(group.id, Some(subgroup)).count(), |n| {
                        usize::try_from(n).unwrap_or(usize::MAX)
                    });
                if count > 0 {
                    p.text(
                        TextRun::new(
                            count.to_string(),
                            (extent.start_x - 3.0, row.y - 3.0),
                            size,
                        )
                        .anchored(TextAnchor::End),
                        muted,
                    );
                }
            }
            if group.subgroups > 1 && !layout.collapsed {
                p.text(
                    TextRun::new(
                        format!("'{}", subgroup + 1),
                        (layout.left_margin - 3.0, row.y + style.small_font_size * 0.35),
                        size,
                    )
                    .anchored(TextAnchor::End),
                    muted,
                );
            }
        }
    }
    Ok(())
}

// Pass 6.
fn hazards(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    if !input.ctx.level.shows_hazards() {
        return Ok(());
    }
    let layout = input.layout;
    let hazard = input.palette().hazard;
    let radius = input.style().row_height * 0.45;
    for sample in input.study.samples() {
        if sample.status != SampleStatus::Unavailable {
            continue;
        }
        let (Some(group), Some(phase)) = (sample.group, sample.status_phase) else {
            continue;
        };
        let center = Point::new(
            column_x(layout, phase)?,
            row_of(layout, group, sample.subgroup)?.y,
        );
        let stops = [
            ColorStop::from((0.0, with_alpha(hazard, 220))),
            ColorStop::from((1.0, with_alpha(hazard, 0))),
        ];
        #[allow(
            clippy::cast_possible_truncation,
            reason = "halo radius is a few layout units"
        )]
        let gradient = Gradient {
            kind: GradientKind::Radial(RadialGradientPosition::new(center, radius as f32)),
            extend: Extend::Pad,
            stops: stops.as_slice().into(),
            ..Gradient::default()
        };
        p.paint(Brush::Gradient(gradient));
        p.backend
            .draw(DrawOp::FillCircle(Circle::new(center, radius)));
    }
    Ok(())
}

// Pass 7.
fn actions(p: &mut Painter<'_>, input: &RenderInput<'_>) -> Result<(), RenderError> {
    let level = input.ctx.level;
    if !level.shows_action_glyphs() {
        return Ok(());
    }
    let study = input.study;
    let layout = input.layout;
    let style = input.style();
    let palette = input.palette();
    let small = font(style.small_font_size);
    let line_height = input.metrics.line_height(style.small_font_size);
    let arrow = style.row_height * 0.4;
    let right = content_right(layout);

    for group in study.groups() {
        for row in layout.group_rows(group.id) {
            let cells: Vec<(&Phase, &StudyAction)> = study
                .row_actions(group.id, row.key.subgroup)
                .filter(|(_, a)| a.has_data())
                .collect();
            let mut previous_treatment = None;
            for (i, (phase, action)) in cells.iter().enumerate() {
                let x = column_x(layout, phase.id)?;
                let y = row.y;
                let later = &cells[i + 1..];

                if !action.measurements.is_empty() {
                    let mut abbreviations = Vec::with_capacity(action.measurements.len());
                    for &mid in &action.measurements {
                        let m = study.measurement(mid).ok_or(RenderError::UnknownMeasurement {
                            group: group.id,
                            phase: phase.id,
                            measurement: mid,
                        })?;
                        abbreviations.push(m.abbreviation.as_str());
                    }
                    p.transform(Affine::translate((x - 3.0, y - 3.0)) * Affine::rotate(-FRAC_PI_2));
                    p.text(
                        TextRun::new(abbreviations.join(" "), (0.0, 0.0), small),
                        color(palette.muted_text),
                    );
                    p.reset_transform();
                }

                if let Some(tid) = action.treatment {
                    let treatment = study.treatment(tid).ok_or(RenderError::UnknownTreatment {
                        group: group.id,
                        phase: phase.id,
                        treatment: tid,
                    })?;
                    let arrow_color = if level.shows_identity() {
                        color(treatment.color.unwrap_or(palette.treatment))
                    } else {
                        color(palette.blinded_arrow)
                    };
                    let tip = Point::new(x, y - arrow);
                    p.line((x, y), tip, arrow_color, 1.5);
                    p.fill_path(arrow_head(tip, 0.0, 4.0), arrow_color);

                    if level.shows_action_names() && previous_treatment != Some(tid) {
                        let until = later
                            .iter()
                            .find(|(_, a)| a.treatment.is_some_and(|t| t != tid))
                            .and_then(|(ph, _)| layout.x(ph.id))
                            .unwrap_or(right);
                        let baseline = y - 4.0;
                        p.clipped(text_clip(x..until, baseline, 1, line_height), |p| {
                            p.text(
                                TextRun::new(treatment.name.clone(), (x + 3.0, baseline), small),
                                arrow_color,
                            );
                        });
                    }
                    previous_treatment = Some(tid);
                }

                let samplings = action.samplings();
                if !samplings.is_empty() {
                    let sampling_color = color(palette.sampling);
                    let tip = Point::new(x, y + arrow);
                    p.line((x, y), tip, sampling_color, 1.5);
                    p.fill_path(arrow_head(tip, 0.0, -4.0), sampling_color);

                    let mut names = Vec::with_capacity(samplings.len());
                    for &sid in &samplings {
                        let sampling = study.sampling(sid).ok_or(RenderError::UnknownSampling {
                            group: group.id,
                            phase: phase.id,
                            sampling: sid,
                        })?;
                        names.push(sampling.name.as_str());
                    }
                    if level.shows_action_names() {
                        let until = later
                            .iter()
                            .find(|(_, a)| a.sampling.is_some())
                            .and_then(|(ph, _)| layout.x(ph.id))
                            .unwrap_or(right);
                        let clip = text_clip(x..until, row.sampling_y, names.len(), line_height);
                        p.clipped(clip, |p| {
                            let mut baseline = row.sampling_y;
                            for name in &names {
                                p.text(
                                    TextRun::new(*name, (x + 3.0, baseline), small),
                                    sampling_color,
                                );
                                baseline += line_height;
                            }
                        });
                    }
                }

                if let Some(label) = action.label.as_deref().map(str::trim)
                    && !label.is_empty()
                    && level.shows_annotations()
                {
                    let until = layout.next_column_x(x).unwrap_or(right);
                    let above = if level.shows_action_names() {
                        samplings.len()
                    } else {
                        0
                    };
                    let baseline = row.sampling_y + lines_height(above, line_height);
                    p.clipped(text_clip(x..until, baseline, 1, line_height), |p| {
                        p.text(
                            TextRun::new(label, (x + 3.0, baseline), small),
                            color(palette.text),
                        );
                    });
                }
            }
        }
    }
    Ok(())
}

// Pass 8.
fn stopped(p: &mut Painter<'_>, input: &RenderInput<'_>) {
    if !input.study.is_stopped() {
        return;
    }
    let layout = input.layout;
    let (w, h) = (layout.max_x, layout.max_y);
    let stopped = color(input.palette().stopped);
    p.line((0.0, 0.0), (w, h), stopped, 3.0);
    p.line((0.0, h), (w, 0.0), stopped, 3.0);
}

/// How a selection is highlighted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Highlight {
    /// The cell under the pointer: dashed outline.
    Hover,
    /// The clicked cell: translucent fill and solid outline.
    Selected,
}

/// The rectangle highlighting `selection`, if it is still in the layout.
pub fn highlight_rect(
    layout: &LayoutResult,
    style: &LayoutStyle,
    selection: &Selection,
) -> Option<Rect> {
    let row = layout.row(selection.group?, selection.subgroup)?;
    match selection.phase {
        None => Some(Rect::new(0.0, row.top, layout.max_x, row.bottom())),
        Some(phase) => {
            let x = layout.x(phase)?;
            let half = style.hit_half_width;
            Some(Rect::new(x - half, row.top, x + half, row.bottom()))
        }
    }
}

/// Pass 9: draws a hover or selection highlight.
///
/// This is never part of the cached output.
pub fn paint_overlay(
    backend: &mut dyn ImagingBackend,
    layout: &LayoutResult,
    selection: &Selection,
    highlight: Highlight,
    config: &DepictionConfig,
    base: Affine,
) {
    let Some(rect) = highlight_rect(layout, &config.style, selection) else {
        return;
    };
    let mut p = Painter { backend, base };
    p.reset_transform();
    match highlight {
        Highlight::Hover => {
            let mut stroke = Stroke::new(1.0);
            stroke.dash_pattern.push(3.0);
            stroke.dash_pattern.push(2.0);
            p.stroke_rect(rect, color(config.palette.hover), stroke);
        }
        Highlight::Selected => {
            p.fill_rect(rect, with_alpha(config.palette.selection, 60));
            p.stroke_rect(rect, color(config.palette.selection), Stroke::new(1.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyline_imaging_ref::RefBackend;
    use studyline_layout::{FixedAdvanceMetrics, ZoomRequest, compute_positions};
    use studyline_imaging::{ClipShape, LayerOp};
    use studyline_model::{
        Sample, Sampling, SamplingId, StudySnapshot, Treatment, TreatmentId, VisibilityLevel,
    };

    fn study() -> Study {
        Study::new(StudySnapshot {
            identifier: "TOX-9".into(),
            secondary_id: Some("SP-1".into()),
            phases: vec![Phase::new(PhaseId(1), 0), Phase::new(PhaseId(2), 3)],
            groups: vec![Group::new(GroupId(1), "1", "Control").with_subgroups(2)],
            actions: vec![
                StudyAction::new(GroupId(1), 0, PhaseId(1)).with_label("start"),
                StudyAction::new(GroupId(1), 1, PhaseId(2)).with_label("end"),
            ],
            samples: vec![
                Sample::new("S1", GroupId(1), 1)
                    .with_status(SampleStatus::Unavailable, Some(PhaseId(2))),
            ],
            ..StudySnapshot::default()
        })
        .unwrap()
    }

    fn run(study: &Study, ctx: DepictionContext) -> RefBackend {
        let config = DepictionConfig::default();
        let metrics = FixedAdvanceMetrics::default();
        let layout = compute_positions(study, ZoomRequest::default(), &metrics, &ctx, &config.style);
        let input = RenderInput {
            study,
            layout: &layout,
            ctx: &ctx,
            config: &config,
            metrics: &metrics,
            canvas: Size::new(10.0, 10.0),
        };
        let mut backend = RefBackend::default();
        render_passes(&mut backend, &input, Affine::IDENTITY).unwrap();
        backend
    }

    #[test]
    fn background_comes_first_and_clips_balance() {
        let backend = run(&study(), DepictionContext::default());
        let (first, state) = backend.draws().next().unwrap();
        assert!(matches!(first, DrawOp::FillRect(r) if r.x0 == 0.0 && r.y0 == 0.0));
        assert_eq!(state.paint, Some(Brush::Solid(Color::from_rgba8(255, 255, 255, 255))));
        assert!(backend.is_balanced());
    }

    #[test]
    fn legend_joins_identifiers() {
        let backend = run(&study(), DepictionContext::default());
        let (legend, _) = backend
            .text_runs()
            .find(|(run, _)| run.text == "TOX-9 / SP-1")
            .unwrap();
        assert!(legend.bold);
    }

    #[test]
    fn hazards_only_without_blinding() {
        let count_circles = |level| {
            run(&study(), DepictionContext::default().with_level(level))
                .draws()
                .filter(|(op, state)| {
                    matches!(op, DrawOp::FillCircle(_))
                        && matches!(state.paint, Some(Brush::Gradient(_)))
                })
                .count()
        };
        assert_eq!(count_circles(VisibilityLevel::Full), 1);
        assert_eq!(count_circles(VisibilityLevel::BlindNames), 0);
        assert_eq!(count_circles(VisibilityLevel::BlindAll), 0);
    }

    #[test]
    fn subgroup_ordinals_follow_collapsing() {
        let texts = |level| {
            run(&study(), DepictionContext::default().with_level(level))
                .text_runs()
                .map(|(run, _)| run.text.clone())
                .collect::<Vec<_>>()
        };
        let full = texts(VisibilityLevel::Full);
        assert!(full.contains(&"'1".to_owned()) && full.contains(&"'2".to_owned()));
        assert!(!texts(VisibilityLevel::BlindAll).contains(&"'2".to_owned()));
    }

    #[test]
    fn fault_message_is_red_and_bold() {
        let mut backend = RefBackend::default();
        let err = RenderError::MissingColumn(PhaseId(4));
        draw_fault(&mut backend, &err, &DepictionConfig::default(), Affine::IDENTITY);
        let (run, state) = backend.text_runs().next().unwrap();
        assert_eq!(run.text, format!("Render error: {err}"));
        assert!(run.bold);
        assert_eq!(state.paint, Some(Brush::Solid(Color::from_rgba8(255, 0, 0, 255))));
    }

    #[test]
    fn annotation_glyphs_lie_inside_their_clips() {
        let sampling = |id, name: &str| Sampling {
            id: SamplingId(id),
            name: name.into(),
            necropsy: false,
        };
        let study = Study::new(StudySnapshot {
            phases: vec![Phase::new(PhaseId(1), 0), Phase::new(PhaseId(2), 1)],
            groups: vec![Group::new(GroupId(1), "1", "Control")],
            treatments: vec![Treatment {
                id: TreatmentId(1),
                name: "Compound X".into(),
                color: None,
            }],
            samplings: vec![sampling(1, "Blood"), sampling(2, "Urine")],
            actions: vec![
                StudyAction::new(GroupId(1), 0, PhaseId(1))
                    .with_treatment(TreatmentId(1))
                    .with_sampling(SamplingId(1))
                    .with_sampling(SamplingId(2))
                    .with_label("fasted"),
                StudyAction::new(GroupId(1), 0, PhaseId(2)).with_label("weigh"),
            ],
            ..StudySnapshot::default()
        })
        .unwrap();
        let backend = run(&study, DepictionContext::default());

        let mut checked = Vec::new();
        for (run, state) in backend.text_runs() {
            if !["Compound X", "Blood", "Urine", "fasted"].contains(&run.text.as_str()) {
                continue;
            }
            let Some(LayerOp {
                clip: Some(ClipShape::Rect(clip)),
                ..
            }) = &state.layer_top
            else {
                panic!("{:?} is drawn unclipped", run.text);
            };
            let size = f64::from(run.size);
            let (top, bottom) = (run.origin.y - size, run.origin.y + size * 0.25);
            assert!(
                clip.y0 <= top && bottom <= clip.y1,
                "{:?} spans {top}..{bottom}, clip is {}..{}",
                run.text,
                clip.y0,
                clip.y1
            );
            assert!(clip.x0 <= run.origin.x && run.origin.x < clip.x1);
            checked.push(run.text.clone());
        }
        assert_eq!(checked, ["Compound X", "Blood", "Urine", "fasted"]);
    }
}
