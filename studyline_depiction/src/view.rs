// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interactive view: layout, cache, and pointer state for one study.

use std::sync::Arc;

use kurbo::Size;
use studyline_imaging::{Affine, ImagingBackend};
use studyline_layout::{FontMetrics, LayoutResult, Zoom, ZoomRequest, compute_positions};
use studyline_model::{DepictionContext, Selection, Study};
use tracing::trace;

use crate::{
    BufferCache, CacheState, DepictionConfig, Highlight, InvalidationReason, Raster, RenderInput,
    format_tooltip, hit, paint_overlay, render_study,
};

/// One on-screen depiction of a study.
///
/// The view owns its layout, its raster cache, and the hover and click
/// selections. It is driven from a single thread: the host calls
/// [`render`](Self::render) or [`paint_into`](Self::paint_into) on paint and
/// the `pointer_*` methods on input.
///
/// ```
/// use std::sync::Arc;
/// use kurbo::Size;
/// use studyline_depiction::{DepictionConfig, StudyView};
/// use studyline_layout::FixedAdvanceMetrics;
/// use studyline_model::{Study, StudySnapshot};
///
/// let study = Arc::new(Study::new(StudySnapshot::default()).unwrap());
/// let mut view = StudyView::new(FixedAdvanceMetrics::default(), DepictionConfig::default());
/// let size = Size::new(640.0, 480.0);
/// let first = view.render(Some(study.clone()), 0, size);
/// let second = view.render(Some(study), 0, size);
/// assert!(first.ptr_eq(&second));
/// assert_eq!(view.render_count(), 1);
/// ```
#[derive(Debug)]
pub struct StudyView<M> {
    study: Option<Arc<Study>>,
    zoom: ZoomRequest,
    size: Size,
    ctx: DepictionContext,
    config: DepictionConfig,
    metrics: M,
    layout: Option<LayoutResult>,
    cache: BufferCache,
    hover: Option<Selection>,
    selection: Option<Selection>,
}

impl<M: FontMetrics> StudyView<M> {
    /// Creates a view with no study.
    pub fn new(metrics: M, config: DepictionConfig) -> Self {
        Self {
            study: None,
            zoom: ZoomRequest::default(),
            size: Size::ZERO,
            ctx: DepictionContext::default(),
            config,
            metrics,
            layout: None,
            cache: BufferCache::new(),
            hover: None,
            selection: None,
        }
    }

    /// The study currently shown.
    pub fn study(&self) -> Option<&Arc<Study>> {
        self.study.as_ref()
    }

    /// Swaps the study. Setting the same snapshot again is a no-op.
    ///
    /// A swap drops the layout, the raster, and both selections.
    pub fn set_study(&mut self, study: Option<Arc<Study>>) {
        let same = match (&self.study, &study) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        self.study = study;
        self.layout = None;
        self.hover = None;
        self.selection = None;
        self.cache.invalidate(InvalidationReason::Study);
    }

    /// The requested zoom.
    pub fn zoom(&self) -> ZoomRequest {
        self.zoom
    }

    /// The zoom step the current layout was computed with.
    ///
    /// Differs from [`zoom`](Self::zoom) for auto-fit requests.
    pub fn effective_zoom(&self) -> Option<Zoom> {
        self.layout.as_ref().map(|layout| layout.zoom)
    }

    /// Requests a zoom step; out-of-range steps are clamped.
    pub fn set_zoom(&mut self, zoom: impl Into<ZoomRequest>) {
        let zoom = zoom.into();
        if zoom == self.zoom {
            return;
        }
        self.zoom = zoom;
        self.layout = None;
        self.cache.invalidate(InvalidationReason::Zoom);
    }

    /// Viewport size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Resizes the viewport.
    pub fn resize(&mut self, size: Size) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.cache.invalidate(InvalidationReason::Size);
    }

    /// Viewer context.
    pub fn context(&self) -> &DepictionContext {
        &self.ctx
    }

    /// Changes the viewer context. The hover is dropped; the click
    /// selection survives and is revalidated on the next paint.
    pub fn set_context(&mut self, ctx: DepictionContext) {
        if ctx == self.ctx {
            return;
        }
        self.ctx = ctx;
        self.layout = None;
        self.hover = None;
        self.cache.invalidate(InvalidationReason::Context);
    }

    /// Style and colors.
    pub fn config(&self) -> &DepictionConfig {
        &self.config
    }

    /// Forces the next paint to run the render passes.
    pub fn invalidate(&mut self) {
        self.cache.invalidate(InvalidationReason::Forced);
    }

    /// The current layout, if one has been computed.
    pub fn layout(&self) -> Option<&LayoutResult> {
        self.layout.as_ref()
    }

    /// Cache state.
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// How many times the render passes have run for this view.
    pub fn render_count(&self) -> u64 {
        self.cache.render_count()
    }

    /// The cell under the pointer.
    pub fn hover(&self) -> Option<Selection> {
        self.hover
    }

    /// The clicked cell.
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn ensure_layout(&mut self) {
        if self.layout.is_some() {
            return;
        }
        if let Some(study) = &self.study {
            self.layout = Some(compute_positions(
                study,
                self.zoom,
                &self.metrics,
                &self.ctx,
                &self.config.style,
            ));
        }
    }

    fn current_raster(&mut self) -> Raster {
        self.ensure_layout();
        let (Some(study), Some(layout)) = (self.study.as_deref(), self.layout.as_ref()) else {
            return Raster::empty(self.size);
        };
        let input = RenderInput {
            study,
            layout,
            ctx: &self.ctx,
            config: &self.config,
            metrics: &self.metrics,
            canvas: self.size,
        };
        self.cache.get_or_render(self.size, |backend| {
            render_study(backend, &input, Affine::IDENTITY)
        })
    }

    /// Sets study, zoom, and viewport, and returns the raster for them.
    ///
    /// The raster is reused while none of the three change. With no study
    /// the result is empty and nothing runs.
    pub fn render(
        &mut self,
        study: Option<Arc<Study>>,
        zoom: impl Into<ZoomRequest>,
        size: Size,
    ) -> Raster {
        self.set_study(study);
        self.set_zoom(zoom);
        self.resize(size);
        self.current_raster()
    }

    /// Blits the cached raster into `target` and draws the live highlights.
    pub fn paint_into(&mut self, target: &mut dyn ImagingBackend) {
        let raster = self.current_raster();
        raster.blit(target);
        let Some(layout) = &self.layout else {
            return;
        };
        if let Some(hover) = &self.hover
            && self.selection.as_ref() != Some(hover)
        {
            paint_overlay(
                target,
                layout,
                hover,
                Highlight::Hover,
                &self.config,
                Affine::IDENTITY,
            );
        }
        if let Some(selection) = &self.selection {
            paint_overlay(
                target,
                layout,
                selection,
                Highlight::Selected,
                &self.config,
                Affine::IDENTITY,
            );
        }
    }

    /// Maps a viewport point to the selection under it.
    pub fn locate(&mut self, x: f64, y: f64) -> Option<Selection> {
        self.ensure_layout();
        let (Some(study), Some(layout)) = (self.study.as_deref(), self.layout.as_ref()) else {
            return None;
        };
        hit::locate(x, y, layout, study, &self.ctx, &self.config.style)
    }

    /// Updates the hover from a pointer move and returns it.
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> Option<Selection> {
        self.hover = self.locate(x, y);
        self.hover
    }

    /// Clears the hover when the pointer leaves the view.
    pub fn pointer_left(&mut self) {
        self.hover = None;
    }

    /// Updates the click selection and returns it. Clicking empty space
    /// clears it.
    pub fn pointer_clicked(&mut self, x: f64, y: f64) -> Option<Selection> {
        self.selection = self.locate(x, y);
        trace!(selection = ?self.selection, "selection changed");
        self.selection
    }

    /// Plain-text tooltip for `selection` under the current visibility.
    pub fn tooltip(&self, selection: &Selection) -> Option<String> {
        let study = self.study.as_deref()?;
        format_tooltip(selection, study, self.ctx.level).map(|tip| tip.to_plain_text())
    }
}
