// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GroupId, MeasurementId, PhaseId, Rgb, SamplingId, TreatmentId};

/// A compound or procedure administered to a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    /// Stable identifier.
    pub id: TreatmentId,
    /// Display name.
    pub name: String,
    /// Arrow color; falls back to the palette when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
}

/// A sample collection performed on a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampling {
    /// Stable identifier.
    pub id: SamplingId,
    /// Display name.
    pub name: String,
    /// Terminal sampling: the animals do not continue past it.
    #[serde(default)]
    pub necropsy: bool,
}

/// A measurement type such as body weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Stable identifier.
    pub id: MeasurementId,
    /// Display name.
    pub name: String,
    /// Abbreviation drawn in the timeline, e.g. `BW`.
    pub abbreviation: String,
}

/// Everything planned or recorded at one `(group, subgroup, phase)` cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAction {
    /// Group of the cell.
    pub group: GroupId,
    /// Subgroup index of the cell.
    #[serde(default)]
    pub subgroup: u32,
    /// Phase of the cell.
    pub phase: PhaseId,
    /// Measurements taken.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<MeasurementId>,
    /// Treatment administered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<TreatmentId>,
    /// First sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingId>,
    /// Second sampling; rows carrying one are drawn taller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_sampling: Option<SamplingId>,
    /// Free-text label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl StudyAction {
    /// Creates an empty action at a cell.
    pub fn new(group: GroupId, subgroup: u32, phase: PhaseId) -> Self {
        Self {
            group,
            subgroup,
            phase,
            measurements: Vec::new(),
            treatment: None,
            sampling: None,
            secondary_sampling: None,
            label: None,
        }
    }

    /// Sets the treatment.
    #[must_use]
    pub fn with_treatment(mut self, treatment: TreatmentId) -> Self {
        self.treatment = Some(treatment);
        self
    }

    /// Sets the first sampling, or the second if the first is taken.
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingId) -> Self {
        if self.sampling.is_none() {
            self.sampling = Some(sampling);
        } else {
            self.secondary_sampling = Some(sampling);
        }
        self
    }

    /// Adds a measurement.
    #[must_use]
    pub fn with_measurement(mut self, measurement: MeasurementId) -> Self {
        self.measurements.push(measurement);
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The samplings of this cell, first one first.
    pub fn samplings(&self) -> SmallVec<[SamplingId; 2]> {
        self.sampling
            .into_iter()
            .chain(self.secondary_sampling)
            .collect()
    }

    /// Returns `true` if the cell carries anything worth drawing.
    pub fn has_data(&self) -> bool {
        !self.measurements.is_empty()
            || self.treatment.is_some()
            || self.sampling.is_some()
            || self.secondary_sampling.is_some()
            || self.label.as_deref().is_some_and(|l| !l.trim().is_empty())
    }
}
