// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Size;
use studyline_imaging::{ImagingBackend, RecordedOps};
use studyline_imaging_ref::RefBackend;
use tracing::{debug, trace};

use crate::RenderError;

/// The output of one run of the render passes, sized to its target.
///
/// The picture is a recorded display list; cloning a raster shares it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Raster {
    /// Size of the target in layout units.
    pub size: Size,
    /// Recorded draw operations.
    pub picture: RecordedOps,
    /// The fault that interrupted the passes, if any.
    pub fault: Option<RenderError>,
}

impl Raster {
    /// A raster with nothing drawn.
    pub fn empty(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Returns `true` if nothing was drawn.
    pub fn is_blank(&self) -> bool {
        self.picture.is_empty()
    }

    /// Returns `true` if both rasters share the same recording.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.picture.ptr_eq(&other.picture)
    }

    /// Replays the picture into `target`.
    pub fn blit(&self, target: &mut dyn ImagingBackend) {
        self.picture.replay(target);
    }
}

/// Whether the cache holds a raster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing cached; the next paint runs the passes.
    Empty,
    /// The cached raster matches the current study, zoom, size, and context.
    Valid,
}

/// Why the cache was invalidated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InvalidationReason {
    /// A different study was set.
    Study,
    /// The zoom request changed.
    Zoom,
    /// The viewport was resized.
    Size,
    /// The viewer context changed.
    Context,
    /// The host asked for a redraw.
    Forced,
}

impl InvalidationReason {
    /// Lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Zoom => "zoom",
            Self::Size => "size",
            Self::Context => "context",
            Self::Forced => "forced",
        }
    }
}

/// Holds the last successful raster until something invalidates it.
#[derive(Debug, Default)]
pub struct BufferCache {
    raster: Option<Raster>,
    render_count: u64,
}

impl BufferCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> CacheState {
        if self.raster.is_some() {
            CacheState::Valid
        } else {
            CacheState::Empty
        }
    }

    /// How many times the render passes have run through this cache.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Drops the cached raster.
    pub fn invalidate(&mut self, reason: InvalidationReason) {
        let was_valid = self.raster.take().is_some();
        trace!(reason = reason.as_str(), was_valid, "raster cache invalidated");
    }

    /// Returns the cached raster, or runs `render` into a fresh offscreen target.
    ///
    /// A failed run is returned but not cached, so the next call retries.
    pub fn get_or_render(
        &mut self,
        size: Size,
        render: impl FnOnce(&mut dyn ImagingBackend) -> Result<(), RenderError>,
    ) -> Raster {
        if let Some(raster) = &self.raster {
            if raster.size == size {
                trace!("raster cache hit");
                return raster.clone();
            }
            self.invalidate(InvalidationReason::Size);
        }
        trace!("raster cache miss");

        self.render_count += 1;
        debug!(
            width = size.width,
            height = size.height,
            run = self.render_count,
            "running render passes"
        );
        let mut backend = RefBackend::default();
        let result = render(&mut backend);
        let raster = Raster {
            size,
            picture: backend.into_recording(),
            fault: result.err(),
        };
        if raster.fault.is_none() {
            self.raster = Some(raster.clone());
        }
        raster
    }
}
