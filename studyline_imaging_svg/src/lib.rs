// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! SVG export backend for the Studyline imaging IR.
//!
//! This crate provides a small implementation of [`ImagingBackend`] that
//! records imaging ops and can export them as an SVG document. Depictions
//! use it to embed a study diagram in reports or to print it.
//!
//! This is intended for embedding and inspection, not pixel-perfect rendering:
//! - Solid colors and linear/radial gradients are supported; sweep gradients
//!   and image brushes fall back to their first color or black.
//! - Layer opacity is expressed using SVG `<g opacity=..>`.
//! - Text is emitted as `<text>` elements; shaping is left to the viewer.

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;
use kurbo::{BezPath, Cap, Join, PathEl};
use peniko::color::Srgb;
use peniko::{Brush, Color, Gradient, GradientKind};
use studyline_imaging::{
    Affine, ClipShape, DrawOp, ImagingBackend, ImagingOp, RecordedOps, StateOp, StrokeStyle,
    TextAnchor, TextRun,
};

#[derive(Clone, Debug)]
struct SvgState {
    transform: Affine,
    paint: Option<Brush>,
    stroke: Option<StrokeStyle>,
}

impl Default for SvgState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            paint: None,
            stroke: None,
        }
    }
}

/// A recording SVG backend.
#[derive(Default, Debug)]
pub struct SvgBackend {
    ops: Vec<ImagingOp>,
    recording_start: Option<usize>,
}

impl SvgBackend {
    /// Clears the recorded ops.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
        self.recording_start = None;
    }

    /// Returns the recorded imaging ops.
    pub fn ops(&self) -> &[ImagingOp] {
        &self.ops
    }

    /// Export the currently recorded ops as an SVG document.
    ///
    /// `width`/`height` are used both as the SVG `width`/`height` attributes and to set
    /// `viewBox="0 0 width height"`.
    pub fn to_svg(&self, width: u32, height: u32) -> String {
        render_svg_document(width, height, &self.ops)
    }
}

impl ImagingBackend for SvgBackend {
    fn state(&mut self, op: StateOp) {
        self.ops.push(ImagingOp::State(op));
    }

    fn draw(&mut self, op: DrawOp) {
        self.ops.push(ImagingOp::Draw(op));
    }

    fn begin_record(&mut self) {
        self.recording_start = Some(self.ops.len());
    }

    fn end_record(&mut self) -> RecordedOps {
        let start = self.recording_start.take().unwrap_or(self.ops.len());
        RecordedOps::from_ops(self.ops[start..].to_vec())
    }
}

/// Export an existing recording as an SVG document without going through a backend.
pub fn recording_to_svg(recording: &RecordedOps, width: u32, height: u32) -> String {
    render_svg_document(width, height, &recording.ops)
}

#[derive(Default)]
struct DefCounters {
    clip: u64,
    gradient: u64,
}

fn render_svg_document(width: u32, height: u32, ops: &[ImagingOp]) -> String {
    let mut defs = String::new();
    let mut body = String::new();

    let mut layer_stack: Vec<bool> = Vec::new();
    let mut counters = DefCounters::default();
    let mut state = SvgState::default();

    for op in ops {
        match op {
            ImagingOp::State(state_op) => match state_op {
                StateOp::SetTransform(xf) => state.transform = *xf,
                StateOp::SetPaint(brush) => state.paint = Some(brush.clone()),
                StateOp::SetStroke(style) => state.stroke = Some(style.clone()),
                StateOp::PushLayer(layer) => {
                    let mut opened = false;
                    if !layer.is_noop() {
                        let mut attrs = String::new();
                        if let Some(clip) = &layer.clip {
                            counters.clip += 1;
                            let clip_id = format!("clip{}", counters.clip);
                            write_clip_def(&mut defs, &clip_id, clip, state.transform);
                            let _ = write!(attrs, " clip-path=\"url(#{clip_id})\"");
                        }
                        if let Some(opacity) = layer.opacity {
                            let opacity = opacity.clamp(0.0, 1.0);
                            if opacity < 1.0 {
                                let _ = write!(attrs, " opacity=\"{}\"", fmt_f32(opacity));
                            }
                        }
                        let _ = write!(body, "<g{attrs}>");
                        opened = true;
                    }
                    layer_stack.push(opened);
                }
                StateOp::PopLayer => {
                    // Unbalanced pops are ignored; the document stays well-formed.
                    if let Some(true) = layer_stack.pop() {
                        body.push_str("</g>");
                    }
                }
            },
            ImagingOp::Draw(draw_op) => {
                write_draw_op(&mut defs, &mut counters, &mut body, draw_op, &state);
            }
        }
    }

    while let Some(opened) = layer_stack.pop() {
        if opened {
            body.push_str("</g>");
        }
    }

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    if !defs.is_empty() {
        svg.push_str("<defs>");
        svg.push_str(&defs);
        svg.push_str("</defs>");
    }
    svg.push_str(&body);
    svg.push_str("</svg>");
    svg
}

fn write_clip_def(defs: &mut String, id: &str, clip: &ClipShape, transform: Affine) {
    let _ = write!(
        defs,
        "<clipPath id=\"{id}\" clipPathUnits=\"userSpaceOnUse\">"
    );
    let attrs = svg_transform_attr(transform);
    match clip {
        ClipShape::Rect(rect) => {
            let _ = write!(
                defs,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{attrs}/>",
                fmt_f64(rect.x0),
                fmt_f64(rect.y0),
                fmt_f64(rect.width()),
                fmt_f64(rect.height()),
            );
        }
        ClipShape::Path(path) => {
            let _ = write!(defs, "<path d=\"{}\"{attrs}/>", bez_path_to_svg_d(path));
        }
    }
    defs.push_str("</clipPath>");
}

fn svg_transform_attr(transform: Affine) -> String {
    if transform == Affine::IDENTITY {
        String::new()
    } else {
        format!(" transform=\"{}\"", affine_to_svg_matrix(transform))
    }
}

fn bez_path_to_svg_d(path: &BezPath) -> String {
    let mut d = String::new();
    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                let _ = write!(d, "M{} {}", fmt_f64(p.x), fmt_f64(p.y));
            }
            PathEl::LineTo(p) => {
                let _ = write!(d, "L{} {}", fmt_f64(p.x), fmt_f64(p.y));
            }
            PathEl::QuadTo(p1, p2) => {
                let _ = write!(
                    d,
                    "Q{} {} {} {}",
                    fmt_f64(p1.x),
                    fmt_f64(p1.y),
                    fmt_f64(p2.x),
                    fmt_f64(p2.y)
                );
            }
            PathEl::CurveTo(p1, p2, p3) => {
                let _ = write!(
                    d,
                    "C{} {} {} {} {} {}",
                    fmt_f64(p1.x),
                    fmt_f64(p1.y),
                    fmt_f64(p2.x),
                    fmt_f64(p2.y),
                    fmt_f64(p3.x),
                    fmt_f64(p3.y)
                );
            }
            PathEl::ClosePath => d.push('Z'),
        }
    }
    d
}

#[derive(Copy, Clone)]
enum PaintKind {
    Fill,
    Stroke,
}

fn write_draw_op(
    defs: &mut String,
    counters: &mut DefCounters,
    out: &mut String,
    op: &DrawOp,
    state: &SvgState,
) {
    let attrs = svg_transform_attr(state.transform);
    match op {
        DrawOp::FillRect(rect) | DrawOp::StrokeRect(rect) => {
            let kind = if matches!(op, DrawOp::FillRect(_)) {
                PaintKind::Fill
            } else {
                PaintKind::Stroke
            };
            let style = style_for_paint(defs, counters, state, kind);
            let _ = write!(
                out,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{attrs}{style}/>",
                fmt_f64(rect.x0),
                fmt_f64(rect.y0),
                fmt_f64(rect.width()),
                fmt_f64(rect.height()),
            );
        }
        DrawOp::StrokeLine(line) => {
            let style = style_for_paint(defs, counters, state, PaintKind::Stroke);
            let _ = write!(
                out,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"{attrs}{style}/>",
                fmt_f64(line.p0.x),
                fmt_f64(line.p0.y),
                fmt_f64(line.p1.x),
                fmt_f64(line.p1.y),
            );
        }
        DrawOp::FillPath(path) => {
            let style = style_for_paint(defs, counters, state, PaintKind::Fill);
            let _ = write!(out, "<path d=\"{}\"{attrs}{style}/>", bez_path_to_svg_d(path));
        }
        DrawOp::StrokePath(path) => {
            let style = style_for_paint(defs, counters, state, PaintKind::Stroke);
            let _ = write!(out, "<path d=\"{}\"{attrs}{style}/>", bez_path_to_svg_d(path));
        }
        DrawOp::FillCircle(circle) => {
            let style = style_for_paint(defs, counters, state, PaintKind::Fill);
            let _ = write!(
                out,
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{attrs}{style}/>",
                fmt_f64(circle.center.x),
                fmt_f64(circle.center.y),
                fmt_f64(circle.radius),
            );
        }
        DrawOp::DrawText(run) => write_text(defs, counters, out, run, state, &attrs),
    }
}

fn write_text(
    defs: &mut String,
    counters: &mut DefCounters,
    out: &mut String,
    run: &TextRun,
    state: &SvgState,
    attrs: &str,
) {
    let style = style_for_paint(defs, counters, state, PaintKind::Fill);
    let anchor = match run.anchor {
        TextAnchor::Start => "",
        TextAnchor::Middle => " text-anchor=\"middle\"",
        TextAnchor::End => " text-anchor=\"end\"",
    };
    let weight = if run.bold { " font-weight=\"bold\"" } else { "" };
    let _ = write!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"{}\"{anchor}{weight}{attrs}{style}>{}</text>",
        fmt_f64(run.origin.x),
        fmt_f64(run.origin.y),
        fmt_f32(run.size),
        escape_xml(&run.text),
    );
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn style_for_paint(
    defs: &mut String,
    counters: &mut DefCounters,
    state: &SvgState,
    kind: PaintKind,
) -> String {
    let mut out = String::new();

    let (rgb, alpha) = match &state.paint {
        Some(Brush::Solid(color)) => color_to_svg(*color),
        Some(Brush::Gradient(gradient)) => {
            counters.gradient += 1;
            let id = format!("grad{}", counters.gradient);
            if write_gradient_def(defs, &id, gradient, state.transform) {
                (format!("url(#{id})"), 1.0)
            } else {
                first_stop_color(gradient)
            }
        }
        // Image brushes and an unset paint keep the default.
        _ => (String::from("#000000"), 1.0),
    };

    match kind {
        PaintKind::Fill => {
            let _ = write!(out, " fill=\"{rgb}\" stroke=\"none\"");
            if alpha < 1.0 {
                let _ = write!(out, " fill-opacity=\"{}\"", fmt_f32(alpha));
            }
        }
        PaintKind::Stroke => {
            let _ = write!(out, " fill=\"none\" stroke=\"{rgb}\"");
            if alpha < 1.0 {
                let _ = write!(out, " stroke-opacity=\"{}\"", fmt_f32(alpha));
            }
            if let Some(stroke) = state.stroke.as_ref() {
                write_stroke_attrs(&mut out, stroke);
            }
        }
    }
    out
}

fn write_stroke_attrs(out: &mut String, stroke: &StrokeStyle) {
    let _ = write!(out, " stroke-width=\"{}\"", fmt_f64(stroke.width));
    // SVG has a single linecap; use the start cap when they differ.
    let _ = write!(
        out,
        " stroke-linecap=\"{}\"",
        stroke_cap_svg(stroke.start_cap)
    );
    let _ = write!(out, " stroke-linejoin=\"{}\"", stroke_join_svg(stroke.join));
    if !stroke.dash_pattern.is_empty() {
        out.push_str(" stroke-dasharray=\"");
        for (i, v) in stroke.dash_pattern.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&fmt_f64(*v));
        }
        out.push('"');
    }
    if stroke.dash_offset != 0.0 {
        let _ = write!(out, " stroke-dashoffset=\"{}\"", fmt_f64(stroke.dash_offset));
    }
}

/// Writes a gradient definition; returns `false` for gradient kinds SVG can't express.
fn write_gradient_def(defs: &mut String, id: &str, gradient: &Gradient, transform: Affine) -> bool {
    let units = " gradientUnits=\"userSpaceOnUse\"";
    let xf = if transform == Affine::IDENTITY {
        String::new()
    } else {
        format!(" gradientTransform=\"{}\"", affine_to_svg_matrix(transform))
    };
    match &gradient.kind {
        GradientKind::Linear(pos) => {
            let _ = write!(
                defs,
                "<linearGradient id=\"{id}\"{units}{xf} x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                fmt_f64(pos.start.x),
                fmt_f64(pos.start.y),
                fmt_f64(pos.end.x),
                fmt_f64(pos.end.y),
            );
            write_stops(defs, gradient);
            defs.push_str("</linearGradient>");
            true
        }
        GradientKind::Radial(pos) => {
            let _ = write!(
                defs,
                "<radialGradient id=\"{id}\"{units}{xf} cx=\"{}\" cy=\"{}\" r=\"{}\">",
                fmt_f64(pos.end_center.x),
                fmt_f64(pos.end_center.y),
                fmt_f32(pos.end_radius),
            );
            write_stops(defs, gradient);
            defs.push_str("</radialGradient>");
            true
        }
        _ => false,
    }
}

fn write_stops(defs: &mut String, gradient: &Gradient) {
    for stop in gradient.stops.iter() {
        let (rgb, alpha) = color_to_svg(stop.color.to_alpha_color::<Srgb>());
        let _ = write!(
            defs,
            "<stop offset=\"{}\" stop-color=\"{rgb}\"",
            fmt_f32(stop.offset)
        );
        if alpha < 1.0 {
            let _ = write!(defs, " stop-opacity=\"{}\"", fmt_f32(alpha));
        }
        defs.push_str("/>");
    }
}

fn first_stop_color(gradient: &Gradient) -> (String, f32) {
    gradient
        .stops
        .first()
        .map(|stop| color_to_svg(stop.color.to_alpha_color::<Srgb>()))
        .unwrap_or_else(|| (String::from("#000000"), 1.0))
}

fn stroke_cap_svg(cap: Cap) -> &'static str {
    match cap {
        Cap::Butt => "butt",
        Cap::Round => "round",
        Cap::Square => "square",
    }
}

fn stroke_join_svg(join: Join) -> &'static str {
    match join {
        Join::Miter => "miter",
        Join::Round => "round",
        Join::Bevel => "bevel",
    }
}

fn color_to_svg(color: Color) -> (String, f32) {
    let rgba = color.to_rgba8();
    let a = f32::from(rgba.a) / 255.0;
    (format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b), a)
}

fn affine_to_svg_matrix(xf: Affine) -> String {
    // kurbo::Affine stores [a, b, c, d, e, f] corresponding to:
    // [ a c e ]
    // [ b d f ]
    // [ 0 0 1 ]
    let c = xf.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        fmt_f64(c[0]),
        fmt_f64(c[1]),
        fmt_f64(c[2]),
        fmt_f64(c[3]),
        fmt_f64(c[4]),
        fmt_f64(c[5]),
    )
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "SVG uses f32-like scalar formatting"
)]
fn fmt_f64(v: f64) -> String {
    fmt_f32(v as f32)
}

fn fmt_f32(v: f32) -> String {
    // Keep output readable and stable enough for diffing.
    if v.is_finite() {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "best-effort pretty formatting"
        )]
        let i = v as i32;
        let diff = (i as f32) - v;
        if diff > -1e-6 && diff < 1e-6 {
            return format!("{i}");
        }
    } else {
        return format!("{v}");
    }

    let mut s = format!("{:.3}", v);
    while s.contains('.') && s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}
