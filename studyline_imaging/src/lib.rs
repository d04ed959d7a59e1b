// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Studyline Imaging: backend-agnostic imaging IR and backend traits.
//!
//! This crate defines a small, plain‑old‑data (POD) friendly imaging
//! intermediate representation for study depictions and the trait that
//! backends implement to consume it. It sits between the depiction layer
//! (layout, render passes, hit testing) and concrete consumers such as a
//! recording backend, an SVG exporter, or a toolkit canvas.
//!
//! # Position in the stack
//!
//! - **Depiction**: layout tables, render passes, interaction. This lives in
//!   `studyline_layout` and `studyline_depiction`.
//! - **Imaging IR (this crate)**: state + draw operations over rectangles,
//!   lines, paths, circles, and text runs.
//! - **Backends**: anything implementing [`ImagingBackend`].
//!
//! # Core concepts
//!
//! - **Imaging operations**: [`StateOp`] (mutate state) and [`DrawOp`]
//!   (produce pixels), combined into [`ImagingOp`] for recording.
//! - **Brushes** are carried inline as [`peniko::Brush`] values rather than
//!   as resource handles, so a recording is self-contained and can be
//!   replayed into any backend.
//! - **Recordings**: [`record_ops`] captures a sequence of operations into
//!   [`RecordedOps`], which [`RecordedOps::replay`] feeds into another backend.
//!
//! # Example
//!
//! ```ignore
//! # use studyline_imaging::*;
//! # use peniko::{Brush, Color};
//! # struct MyBackend { /* implements ImagingBackend */ }
//! let mut backend = MyBackend { /* ... */ };
//!
//! backend.state(StateOp::SetPaint(Brush::Solid(Color::WHITE)));
//! backend.draw(DrawOp::FillRect(kurbo::Rect::new(0.0, 0.0, 10.0, 10.0)));
//!
//! let recording = record_ops(&mut backend, |b| {
//!     b.draw(DrawOp::StrokeLine(kurbo::Line::new((0.0, 0.0), (10.0, 10.0))));
//! });
//! assert!(recording.len() > 0);
//! ```

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

pub use kurbo::{Affine, BezPath, Circle, Line, Point, Rect};
pub use peniko::{Brush, Color};

/// Stroke style used by [`StateOp::SetStroke`].
///
/// This is a re-export of [`kurbo::Stroke`], which captures width, joins,
/// caps, and dashes.
pub type StrokeStyle = kurbo::Stroke;

/// Clip shape used by [`LayerOp`].
#[derive(Clone, Debug, PartialEq)]
pub enum ClipShape {
    /// Clip to an axis-aligned rectangle in local coordinates.
    Rect(Rect),
    /// Clip to the interior of a path (non-zero fill rule).
    Path(BezPath),
}

/// Parameters for a pushed layer.
///
/// Layers are the scoping mechanism for clipping and group opacity.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LayerOp {
    /// Optional clip applied to this layer's contents.
    pub clip: Option<ClipShape>,
    /// Optional opacity (0–1) applied when compositing this layer into its parent.
    pub opacity: Option<f32>,
}

impl LayerOp {
    /// Returns true if this layer has no effect at all.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.clip.is_none() && self.opacity.is_none()
    }
}

/// Horizontal alignment of a [`TextRun`] relative to its origin.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextAnchor {
    /// The origin is the left end of the baseline.
    #[default]
    Start,
    /// The origin is the center of the baseline.
    Middle,
    /// The origin is the right end of the baseline.
    End,
}

/// A single line of text positioned in local coordinates.
///
/// Text is shaped by the backend; the depiction layer only relies on the
/// injected font metrics to reserve space for it. Rotated text is expressed
/// through the current transform.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// The text to draw.
    pub text: String,
    /// Baseline anchor point.
    pub origin: Point,
    /// Font size in local units.
    pub size: f32,
    /// Alignment of the run relative to `origin`.
    pub anchor: TextAnchor,
    /// Whether the run uses a bold face.
    pub bold: bool,
}

impl TextRun {
    /// Creates a regular-weight, start-anchored run.
    pub fn new(text: impl Into<String>, origin: impl Into<Point>, size: f32) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
            size,
            anchor: TextAnchor::Start,
            bold: false,
        }
    }

    /// Sets the anchor of this run.
    #[must_use]
    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Marks this run as bold.
    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// State operations that mutate the current imaging state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateOp {
    /// Set the current transform matrix.
    SetTransform(Affine),
    /// Push a new layer onto the layer stack.
    ///
    /// Layers must be well-nested: every `PushLayer` must eventually be
    /// matched by a [`StateOp::PopLayer`].
    PushLayer(LayerOp),
    /// Pop the most recently pushed layer.
    PopLayer,
    /// Set the current paint.
    SetPaint(Brush),
    /// Set the current stroke style.
    SetStroke(StrokeStyle),
}

/// Draw operations that produce pixels given the current state.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fill an axis-aligned rectangle with the current paint.
    FillRect(Rect),
    /// Stroke an axis-aligned rectangle with the current stroke and paint.
    StrokeRect(Rect),
    /// Stroke a straight line segment.
    StrokeLine(Line),
    /// Fill a path with the current paint (non-zero fill rule).
    FillPath(BezPath),
    /// Stroke a path with the current stroke and paint.
    StrokePath(BezPath),
    /// Fill a circle with the current paint.
    FillCircle(Circle),
    /// Draw a line of text with the current paint.
    DrawText(TextRun),
}

/// Unified imaging operation used by recordings.
#[derive(Clone, Debug, PartialEq)]
pub enum ImagingOp {
    /// State-changing operation.
    State(StateOp),
    /// Drawing operation.
    Draw(DrawOp),
}

/// Recorded imaging operations.
///
/// Recordings are self-contained: brushes are stored inline, so a recording
/// can be replayed into any backend. Cloning is cheap since the operations
/// are shared.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RecordedOps {
    /// Plain‑old‑data imaging operations in the order they were issued.
    pub ops: Arc<[ImagingOp]>,
}

impl RecordedOps {
    /// Wraps an owned list of operations.
    pub fn from_ops(ops: Vec<ImagingOp>) -> Self {
        Self { ops: ops.into() }
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns `true` if both recordings share the same underlying storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ops, &other.ops)
    }

    /// Iterates over the draw operations of this recording, skipping state.
    pub fn draws(&self) -> impl Iterator<Item = &DrawOp> + '_ {
        self.ops.iter().filter_map(|op| match op {
            ImagingOp::Draw(draw) => Some(draw),
            ImagingOp::State(_) => None,
        })
    }

    /// Iterates over the text of every [`DrawOp::DrawText`] in this recording.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.draws().filter_map(|op| match op {
            DrawOp::DrawText(run) => Some(run.text.as_str()),
            _ => None,
        })
    }

    /// Re-issues every recorded operation into `backend`, in order.
    pub fn replay<B: ImagingBackend + ?Sized>(&self, backend: &mut B) {
        for op in self.ops.iter() {
            match op {
                ImagingOp::State(state) => backend.state(state.clone()),
                ImagingOp::Draw(draw) => backend.draw(draw.clone()),
            }
        }
    }
}

/// Minimal imaging backend trait.
pub trait ImagingBackend {
    /// Apply a state operation.
    ///
    /// When called inside an active recording, the operation must both be
    /// applied to the backend and appended to the recording.
    fn state(&mut self, op: StateOp);

    /// Apply a draw operation.
    fn draw(&mut self, op: DrawOp);

    /// Begin capturing subsequent imaging operations into a recording.
    ///
    /// Callers should assume at most a single active recording.
    fn begin_record(&mut self);

    /// End the current recording and return the captured operations.
    fn end_record(&mut self) -> RecordedOps;

    /// Push a new layer onto the layer stack.
    ///
    /// This is equivalent to `self.state(StateOp::PushLayer(op))`.
    #[inline]
    fn layer_push(&mut self, op: LayerOp) {
        self.state(StateOp::PushLayer(op));
    }

    /// Pop the most recently pushed layer.
    #[inline]
    fn layer_pop(&mut self) {
        self.state(StateOp::PopLayer);
    }

    /// Push a rectangular clip layer.
    ///
    /// The clip scope ends when you call [`ImagingBackend::layer_pop`].
    #[inline]
    fn clip_to_rect(&mut self, rect: Rect) {
        self.layer_push(LayerOp {
            clip: Some(ClipShape::Rect(rect)),
            opacity: None,
        });
    }
}

/// Record a sequence of imaging operations into a [`RecordedOps`].
///
/// This helper wraps [`ImagingBackend::begin_record`] / `end_record` and
/// ensures that any state or draw operations issued by `f` are captured
/// in a single recording while still being applied to `backend`.
pub fn record_ops<B, F>(backend: &mut B, f: F) -> RecordedOps
where
    B: ImagingBackend + ?Sized,
    F: FnOnce(&mut B),
{
    backend.begin_record();
    f(backend);
    backend.end_record()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Trivial in-memory backend that records operations for testing.
    #[derive(Default)]
    struct RecordingBackend {
        ops: Vec<ImagingOp>,
        recording_start: Option<usize>,
    }

    impl ImagingBackend for RecordingBackend {
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
            RecordedOps {
                ops: Arc::from(&self.ops[start..]),
            }
        }
    }

    #[test]
    fn record_segment_of_ops() {
        let mut backend = RecordingBackend::default();

        // First op outside the recording.
        backend.state(StateOp::SetPaint(Brush::Solid(Color::WHITE)));

        let recorded = record_ops(&mut backend, |b| {
            b.draw(DrawOp::FillRect(Rect::new(0.0, 0.0, 4.0, 4.0)));
            b.draw(DrawOp::DrawText(TextRun::new("d1", (2.0, 2.0), 11.0)));
        });

        assert_eq!(backend.ops.len(), 3);
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded.texts().collect::<Vec<_>>(), ["d1"]);
    }

    #[test]
    fn replay_reissues_ops_in_order() {
        let mut source = RecordingBackend::default();
        let recorded = record_ops(&mut source, |b| {
            b.clip_to_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
            b.draw(DrawOp::StrokeLine(Line::new((0.0, 0.0), (10.0, 10.0))));
            b.layer_pop();
        });

        let mut target = RecordingBackend::default();
        recorded.replay(&mut target);

        assert_eq!(target.ops.as_slice(), &*recorded.ops);
        assert!(matches!(
            target.ops.first(),
            Some(ImagingOp::State(StateOp::PushLayer(LayerOp {
                clip: Some(ClipShape::Rect(_)),
                opacity: None,
            })))
        ));
        assert!(matches!(
            target.ops.last(),
            Some(ImagingOp::State(StateOp::PopLayer))
        ));
    }

    #[test]
    fn clones_share_storage() {
        let recorded = RecordedOps::from_ops(alloc::vec![ImagingOp::State(StateOp::PopLayer)]);
        let copy = recorded.clone();
        assert!(recorded.ptr_eq(&copy));
        assert!(!recorded.ptr_eq(&RecordedOps::default()));
    }

    #[test]
    fn text_run_builders() {
        let run = TextRun::new("G1", (1.0, 2.0), 9.0)
            .anchored(TextAnchor::End)
            .bold();
        assert_eq!(run.anchor, TextAnchor::End);
        assert!(run.bold);
        assert_eq!(run.origin, Point::new(1.0, 2.0));
    }
}
