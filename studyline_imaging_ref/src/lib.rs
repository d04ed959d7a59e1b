// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Studyline Imaging Reference Backend.
//!
//! This crate provides a small, stateful implementation of
//! [`ImagingBackend`] for **IR recording and state tracing**.
//!
//! It is intentionally *not* a renderer:
//! - It does **not** rasterize to pixels.
//! - It records every operation together with the imaging state at the time
//!   it was applied, so callers can assert on paints, transforms, and clips.
//!
//! The depiction engine uses it as the offscreen target its buffer cache
//! records into; tests use it to inspect what the render passes emitted.

#![no_std]

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use peniko::Brush;
use studyline_imaging::{
    Affine, DrawOp, ImagingBackend, ImagingOp, LayerOp, RecordedOps, StateOp, StrokeStyle,
    TextRun,
};

/// Snapshot of the current imaging state inside the backend.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    /// Current transform.
    pub transform: Affine,
    /// Number of active layers on the layer stack.
    pub layer_stack_depth: u32,
    /// The most recently pushed layer op, if any.
    pub layer_top: Option<LayerOp>,
    /// Current paint, if set.
    pub paint: Option<Brush>,
    /// Current stroke style, if set.
    pub stroke: Option<StrokeStyle>,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            layer_stack_depth: 0,
            layer_top: None,
            paint: None,
            stroke: None,
        }
    }
}

/// Event recorded by the reference backend.
#[derive(Clone, Debug)]
pub enum Event {
    /// State operation and the resulting state snapshot.
    State {
        /// State operation that was applied.
        op: StateOp,
        /// Snapshot after applying the state operation.
        state: StateSnapshot,
    },
    /// Draw operation and the state snapshot used for drawing.
    Draw {
        /// Draw operation that was applied.
        op: DrawOp,
        /// Snapshot at the time of drawing.
        state: StateSnapshot,
    },
}

/// Simple reference implementation of the imaging backend.
///
/// This backend:
/// - Tracks current imaging state,
/// - Records high-level [`Event`]s as state and draw operations are applied,
/// - Supports recordings via `begin_record`/`end_record`.
#[derive(Default, Debug)]
pub struct RefBackend {
    /// Log of events in the order they were applied.
    events: Vec<Event>,
    /// Underlying imaging ops, used to form `RecordedOps`.
    ops: Vec<ImagingOp>,
    /// Start index of the current recording, if any.
    recording_start: Option<usize>,
    /// Current imaging state.
    state: StateSnapshot,
    layer_stack: Vec<LayerOp>,
    /// Set once a `PopLayer` arrives with an empty layer stack.
    underflowed: bool,
}

impl RefBackend {
    /// Returns a slice of recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns a slice of raw imaging operations.
    pub fn ops(&self) -> &[ImagingOp] {
        &self.ops
    }

    /// Returns the current imaging state.
    pub fn current_state(&self) -> &StateSnapshot {
        &self.state
    }

    /// Iterates over draw operations with the state they were drawn under.
    pub fn draws(&self) -> impl Iterator<Item = (&DrawOp, &StateSnapshot)> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::Draw { op, state } => Some((op, state)),
            Event::State { .. } => None,
        })
    }

    /// Iterates over every text run drawn so far.
    pub fn text_runs(&self) -> impl Iterator<Item = (&TextRun, &StateSnapshot)> + '_ {
        self.draws().filter_map(|(op, state)| match op {
            DrawOp::DrawText(run) => Some((run, state)),
            _ => None,
        })
    }

    /// Returns `true` if every pushed layer has been popped and no pop
    /// arrived on an empty stack.
    pub fn is_balanced(&self) -> bool {
        self.layer_stack.is_empty() && !self.underflowed
    }

    /// Clears all recorded events and ops and resets the imaging state.
    pub fn clear_events(&mut self) {
        self.events.clear();
        self.ops.clear();
        self.recording_start = None;
        self.state = StateSnapshot::default();
        self.layer_stack.clear();
        self.underflowed = false;
    }

    /// Converts everything recorded so far into a [`RecordedOps`].
    pub fn into_recording(self) -> RecordedOps {
        RecordedOps::from_ops(self.ops)
    }

    fn sync_layer_state(&mut self) {
        self.state.layer_stack_depth = u32::try_from(self.layer_stack.len()).unwrap_or(u32::MAX);
        self.state.layer_top = self.layer_stack.last().cloned();
    }
}

impl ImagingBackend for RefBackend {
    fn state(&mut self, op: StateOp) {
        match &op {
            StateOp::SetTransform(tx) => self.state.transform = *tx,
            StateOp::PushLayer(layer) => {
                self.layer_stack.push(layer.clone());
                self.sync_layer_state();
            }
            StateOp::PopLayer => {
                if self.layer_stack.pop().is_none() {
                    self.underflowed = true;
                }
                self.sync_layer_state();
            }
            StateOp::SetPaint(brush) => self.state.paint = Some(brush.clone()),
            StateOp::SetStroke(style) => self.state.stroke = Some(style.clone()),
        }

        self.ops.push(ImagingOp::State(op.clone()));
        self.events.push(Event::State {
            op,
            state: self.state.clone(),
        });
    }

    fn draw(&mut self, op: DrawOp) {
        self.ops.push(ImagingOp::Draw(op.clone()));
        self.events.push(Event::Draw {
            op,
            state: self.state.clone(),
        });
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
