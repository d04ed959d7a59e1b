// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Studyline Depiction: interactive and exported study timelines.
//!
//! This crate turns a [`Study`](studyline_model::Study) and its
//! [`LayoutResult`](studyline_layout::LayoutResult) into drawing:
//!
//! - [`render_passes`] / [`render_study`]: the ordered render passes over any
//!   [`ImagingBackend`](studyline_imaging::ImagingBackend).
//! - [`BufferCache`]: keeps the last [`Raster`] until study, zoom, size, or
//!   context change.
//! - [`locate`]: pointer coordinates to a [`Selection`](studyline_model::Selection).
//! - [`format_tooltip`]: the descriptive text for a selection.
//! - [`StudyView`]: ties the above together for one interactive view.
//! - [`export`] / [`export_svg`]: one-shot renders at an arbitrary size.
//!
//! Visibility is decided once per render from the
//! [`DepictionContext`](studyline_model::DepictionContext); every pass asks
//! its [`VisibilityLevel`](studyline_model::VisibilityLevel) what it may show.
//!
//! ## Faults
//!
//! Render faults such as an action naming an unknown treatment never escape
//! [`StudyView::render`] or [`export`]. The passes stop, the message is drawn
//! in red, and the returned [`Raster`] carries the [`RenderError`] in its
//! `fault` field.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kurbo::Size;
//! use studyline_depiction::{DepictionConfig, StudyView};
//! use studyline_layout::FixedAdvanceMetrics;
//! use studyline_model::{Group, GroupId, Phase, PhaseId, Study, StudyAction, StudySnapshot};
//!
//! let study = Arc::new(
//!     Study::new(StudySnapshot {
//!         phases: vec![Phase::new(PhaseId(1), 0)],
//!         groups: vec![Group::new(GroupId(1), "1", "Control")],
//!         actions: vec![StudyAction::new(GroupId(1), 0, PhaseId(1)).with_label("dose")],
//!         ..StudySnapshot::default()
//!     })
//!     .unwrap(),
//! );
//!
//! let mut view = StudyView::new(FixedAdvanceMetrics::default(), DepictionConfig::default());
//! let raster = view.render(Some(study), 0, Size::new(400.0, 200.0));
//! assert!(raster.fault.is_none());
//! assert!(raster.picture.texts().any(|t| t == "dose"));
//! ```

mod cache;
mod config;
mod error;
mod export;
mod hit;
mod render;
mod tooltip;
mod view;

pub use cache::{BufferCache, CacheState, InvalidationReason, Raster};
pub use config::{DepictionConfig, Palette};
pub use error::{ConfigError, RenderError};
pub use export::{export, export_svg};
pub use hit::locate;
pub use render::{
    Highlight, RenderInput, draw_fault, highlight_rect, paint_overlay, render_passes,
    render_study,
};
pub use tooltip::{MAX_LISTED_SAMPLES, Tooltip, TooltipLine, format_tooltip};
pub use view::StudyView;
