// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-shot renders at an arbitrary size, for embedding and printing.
//!
//! Exports build their own layout and offscreen target, so they never touch
//! a [`StudyView`](crate::StudyView)'s cache and can run on another thread.

use kurbo::Size;
use studyline_imaging::Affine;
use studyline_imaging_ref::RefBackend;
use studyline_imaging_svg::recording_to_svg;
use studyline_layout::{FontMetrics, ZoomRequest, compute_positions};
use studyline_model::{DepictionContext, Study};
use tracing::debug;

use crate::{DepictionConfig, Raster, RenderInput, render_study};

/// Renders `study` to fit within `max_width` x `max_height`.
///
/// The layout is auto-fitted and then scaled uniformly, so the aspect ratio
/// is kept. The returned raster is sized to the scaled drawing. With no
/// study, or a bound that is not positive, nothing is drawn.
pub fn export<M: FontMetrics + ?Sized>(
    study: Option<&Study>,
    ctx: &DepictionContext,
    config: &DepictionConfig,
    metrics: &M,
    max_width: f64,
    max_height: f64,
) -> Raster {
    let bounds = Size::new(max_width, max_height);
    let Some(study) = study else {
        return Raster::empty(bounds);
    };
    if !(max_width > 0.0 && max_height > 0.0) {
        return Raster::empty(bounds);
    }

    let layout = compute_positions(study, ZoomRequest::AutoFit, metrics, ctx, &config.style);
    let natural = Size::new(layout.max_x, layout.max_y);
    let scale = if natural.width > 0.0 && natural.height > 0.0 {
        (max_width / natural.width).min(max_height / natural.height)
    } else {
        1.0
    };
    let size = Size::new(natural.width * scale, natural.height * scale);
    debug!(
        study = study.identifier(),
        zoom = layout.zoom.get(),
        scale,
        width = size.width,
        height = size.height,
        "exporting study"
    );

    // Unsized metrics reach the passes through the `&T` impl.
    let metrics = &metrics;
    let input = RenderInput {
        study,
        layout: &layout,
        ctx,
        config,
        metrics,
        canvas: natural,
    };
    let mut backend = RefBackend::default();
    let fault = render_study(&mut backend, &input, Affine::scale(scale)).err();
    Raster {
        size,
        picture: backend.into_recording(),
        fault,
    }
}

/// Like [`export`], serialized as an SVG document.
pub fn export_svg<M: FontMetrics + ?Sized>(
    study: Option<&Study>,
    ctx: &DepictionContext,
    config: &DepictionConfig,
    metrics: &M,
    max_width: f64,
    max_height: f64,
) -> String {
    let raster = export(study, ctx, config, metrics, max_width, max_height);
    recording_to_svg(
        &raster.picture,
        pixel_extent(raster.size.width),
        pixel_extent(raster.size.height),
    )
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "document extents are clamped to the u32 range first"
)]
fn pixel_extent(v: f64) -> u32 {
    v.ceil().clamp(0.0, f64::from(u32::MAX)) as u32
}
