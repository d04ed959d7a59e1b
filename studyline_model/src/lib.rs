// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Studyline Model: the read-only study snapshot a depiction is drawn from.
//!
//! A study is a grid. Phases run left to right in chronological order and
//! groups (with their numbered subgroups) run top to bottom in hierarchical
//! order, with forked groups directly below the group they split from. Each
//! `(group, subgroup, phase)` cell holds at most one [`StudyAction`]: the
//! measurements, treatment, and samplings planned or recorded there.
//!
//! The crate is deliberately passive:
//! - [`StudySnapshot`] is the plain, `serde`-friendly input supplied by the
//!   persistence layer.
//! - [`Study`] is the validated, indexed form. Building one checks the
//!   structural invariants (unique ids, at most one action per cell, no fork
//!   cycles, references that resolve) and never changes afterwards.
//! - [`VisibilityPolicy`] turns a [`Viewer`] into a [`VisibilityLevel`]; the
//!   rest of the engine receives the level and never looks at permissions.
//! - [`Selection`] is the immutable value produced by hit testing.
//!
//! ## Minimal example
//!
//! ```rust
//! use studyline_model::{Group, GroupId, Phase, PhaseId, Rgb, Study, StudySnapshot};
//!
//! let snapshot = StudySnapshot {
//!     identifier: "S-001".into(),
//!     phases: vec![Phase::new(PhaseId(1), 0), Phase::new(PhaseId(2), 7)],
//!     groups: vec![
//!         Group::new(GroupId(1), "1A", "Vehicle")
//!             .with_color(Rgb::new(0, 255, 255))
//!             .with_subgroups(2),
//!     ],
//!     ..StudySnapshot::default()
//! };
//! let study = Study::new(snapshot).unwrap();
//! assert_eq!(study.phases().len(), 2);
//! assert_eq!(study.groups()[0].subgroups, 2);
//! ```

mod action;
mod error;
mod group;
mod ids;
mod phase;
mod sample;
mod selection;
mod study;
mod visibility;

pub use action::{Measurement, Sampling, StudyAction, Treatment};
pub use error::ModelError;
pub use group::{Group, Rgb};
pub use ids::{GroupId, MeasurementId, PhaseId, SamplingId, TreatmentId};
pub use phase::{Phase, PhaseFormat};
pub use sample::{Sample, SampleStatus};
pub use selection::Selection;
pub use study::{Study, StudyAccess, StudySnapshot, StudyState};
pub use visibility::{
    DepictionContext, DepictionMode, Permissions, Viewer, VisibilityLevel, VisibilityPolicy,
};
