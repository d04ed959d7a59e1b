// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Studyline Layout: coordinate tables for study depictions.
//!
//! [`compute_positions`] maps a [`Study`](studyline_model::Study), a zoom
//! request, injected [`FontMetrics`], and a
//! [`DepictionContext`](studyline_model::DepictionContext) to a
//! [`LayoutResult`]: one X per phase, one row per visible subgroup, the left
//! margin, the header height, and the canvas extents. It draws nothing and
//! knows nothing about backends; render passes and hit testing both read the
//! same tables.
//!
//! ## Columns
//!
//! Phases are visited in chronological order. A non-empty phase takes the
//! current cursor and advances it by the column width,
//! `base * zoom_base^zoom`. A phase without data (outside design mode) takes
//! no space and reuses the previous phase's X, so X is non-decreasing and
//! strictly increasing between non-empty phases.
//!
//! ## Rows
//!
//! Groups are visited in hierarchical order. Each subgroup gets its own row,
//! taller when one of its actions carries a second sampling, and the last
//! subgroup of a group is followed by a gap. When the blinding level
//! collapses subgroups, each group gets exactly one row.
//!
//! ## Example
//!
//! ```rust
//! use studyline_layout::{compute_positions, FixedAdvanceMetrics, LayoutStyle, ZoomRequest};
//! use studyline_model::{DepictionContext, Study, StudySnapshot};
//!
//! let study = Study::new(StudySnapshot::default()).unwrap();
//! let layout = compute_positions(
//!     &study,
//!     ZoomRequest::from(10),
//!     &FixedAdvanceMetrics::default(),
//!     &DepictionContext::default(),
//!     &LayoutStyle::default(),
//! );
//! assert_eq!(layout.zoom.get(), 3);
//! assert!(layout.is_empty());
//! ```

mod engine;
mod metrics;
mod result;
mod style;
mod zoom;

pub use engine::{PhaseHeader, autofit_zoom, compute_positions, left_margin};
pub use metrics::{FixedAdvanceMetrics, FontMetrics};
pub use result::{LayoutResult, PhaseColumn, Row, RowKey};
pub use style::LayoutStyle;
pub use zoom::{Zoom, ZoomRequest};
