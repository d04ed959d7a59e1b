// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PhaseId;

/// How phase short names are formed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseFormat {
    /// `d{day}`, with `_{hour}h{minute}` appended when the phase is not at midnight.
    #[default]
    DayTime,
    /// The bare day value, used by studies that number their phases.
    Numeric,
}

/// A point in study time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// Stable identifier.
    pub id: PhaseId,
    /// Study day (or ordinal for numeric studies); may be negative for pre-study phases.
    #[serde(default)]
    pub day: i32,
    /// Hour of the day.
    #[serde(default)]
    pub hour: u8,
    /// Minute of the hour.
    #[serde(default)]
    pub minute: u8,
    /// Optional free-text label drawn after the short name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional absolute calendar date, serialized as ISO `yyyy-mm-dd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Phase {
    /// Creates a phase at midnight of `day`.
    pub fn new(id: PhaseId, day: i32) -> Self {
        Self {
            id,
            day,
            hour: 0,
            minute: 0,
            label: None,
            date: None,
        }
    }

    /// Sets the time of day.
    #[must_use]
    pub fn at(mut self, hour: u8, minute: u8) -> Self {
        self.hour = hour;
        self.minute = minute;
        self
    }

    /// Sets the free-text label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the calendar date.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Total ordering key: day, then time, then id as a tiebreaker.
    pub fn sort_key(&self) -> (i32, u8, u8, PhaseId) {
        (self.day, self.hour, self.minute, self.id)
    }

    /// Short display name under the given format.
    pub fn short_name(&self, format: PhaseFormat) -> String {
        match format {
            PhaseFormat::Numeric => self.day.to_string(),
            PhaseFormat::DayTime if self.hour == 0 && self.minute == 0 => {
                format!("d{}", self.day)
            }
            PhaseFormat::DayTime => {
                format!("d{}_{}h{:02}", self.day, self.hour, self.minute)
            }
        }
    }
}
