// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{GroupId, PhaseId};

/// Latest recorded status of a sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// Alive and in use.
    #[default]
    Available,
    /// Temporarily or permanently withdrawn; flagged with a hazard halo.
    Unavailable,
    /// Found dead.
    Dead,
    /// Killed at a necropsy.
    Necropsied,
    /// Consumed by an analysis.
    Used,
}

impl SampleStatus {
    /// Human-readable status name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Dead => "dead",
            Self::Necropsied => "necropsied",
            Self::Used => "used",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn yes() -> bool {
    true
}

/// A sample (typically an animal) attached to the study.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample identity, e.g. the animal id.
    pub id: String,
    /// Group the sample is assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    /// Subgroup index within the group.
    #[serde(default)]
    pub subgroup: u32,
    /// `false` for derived samples (organs, aliquots) of a top-level sample.
    #[serde(default = "yes")]
    pub top_level: bool,
    /// Latest recorded status.
    #[serde(default)]
    pub status: SampleStatus,
    /// Phase at which the latest status was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_phase: Option<PhaseId>,
}

impl Sample {
    /// Creates an available top-level sample assigned to `group`.
    pub fn new(id: impl Into<String>, group: GroupId, subgroup: u32) -> Self {
        Self {
            id: id.into(),
            group: Some(group),
            subgroup,
            top_level: true,
            status: SampleStatus::Available,
            status_phase: None,
        }
    }

    /// Sets the latest status and where it was recorded.
    #[must_use]
    pub fn with_status(mut self, status: SampleStatus, phase: Option<PhaseId>) -> Self {
        self.status = status;
        self.status_phase = phase;
        self
    }
}
