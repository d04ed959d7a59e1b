// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use studyline_model::{GroupId, MeasurementId, PhaseId, SamplingId, TreatmentId};
use thiserror::Error;

/// A fault raised inside the render passes.
///
/// These never reach callers of [`StudyView::render`](crate::StudyView::render)
/// or [`export`](crate::export): the pipeline stops, draws the message inline,
/// and leaves the cache empty so the next paint retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An action names a treatment the study does not define.
    #[error("group {group} at phase {phase} references unknown treatment {treatment}")]
    UnknownTreatment {
        /// Group of the action.
        group: GroupId,
        /// Phase of the action.
        phase: PhaseId,
        /// The missing treatment.
        treatment: TreatmentId,
    },
    /// An action names a sampling the study does not define.
    #[error("group {group} at phase {phase} references unknown sampling {sampling}")]
    UnknownSampling {
        /// Group of the action.
        group: GroupId,
        /// Phase of the action.
        phase: PhaseId,
        /// The missing sampling.
        sampling: SamplingId,
    },
    /// An action names a measurement the study does not define.
    #[error("group {group} at phase {phase} references unknown measurement {measurement}")]
    UnknownMeasurement {
        /// Group of the action.
        group: GroupId,
        /// Phase of the action.
        phase: PhaseId,
        /// The missing measurement.
        measurement: MeasurementId,
    },
    /// The layout has no column for a phase of the study.
    #[error("layout has no column for phase {0}")]
    MissingColumn(PhaseId),
    /// The layout has no row for a subgroup of the study.
    #[error("layout has no row for group {group}, subgroup {subgroup}")]
    MissingRow {
        /// Group of the missing row.
        group: GroupId,
        /// Subgroup of the missing row.
        subgroup: u32,
    },
}

/// Failure to load a [`DepictionConfig`](crate::DepictionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON could not be parsed.
    #[error("invalid depiction config: {0}")]
    Json(#[from] serde_json::Error),
}
