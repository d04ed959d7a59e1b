// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GroupId, ModelError, PhaseId, SamplingId};

/// An opaque 8-bit sRGB color, serialized as `#rrggbb`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Creates a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidColor(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

fn one() -> u32 {
    1
}

/// A cohort of the study.
///
/// A group either starts with the study or forks from a parent group at a
/// given phase (`from_group` + `from_phase`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Stable identifier.
    pub id: GroupId,
    /// Short name, e.g. `1A`.
    #[serde(default)]
    pub short_name: String,
    /// Display name, e.g. `Vehicle`.
    #[serde(default)]
    pub name: String,
    /// Group color; uncolored groups use the palette's neutral color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgb>,
    /// Number of subgroups, at least 1.
    #[serde(default = "one")]
    pub subgroups: u32,
    /// Planned animal count per subgroup, when known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subgroup_sizes: Vec<u32>,
    /// Parent group this group was split from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_group: Option<GroupId>,
    /// Phase at which this group was split from its parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_phase: Option<PhaseId>,
    /// Sampling that divides the group's animals, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividing_sampling: Option<SamplingId>,
}

impl Group {
    /// Creates an uncolored root group with one subgroup.
    pub fn new(id: GroupId, short_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            short_name: short_name.into(),
            name: name.into(),
            color: None,
            subgroups: 1,
            subgroup_sizes: Vec::new(),
            from_group: None,
            from_phase: None,
            dividing_sampling: None,
        }
    }

    /// Sets the color.
    #[must_use]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the subgroup count.
    #[must_use]
    pub fn with_subgroups(mut self, subgroups: u32) -> Self {
        self.subgroups = subgroups;
        self
    }

    /// Sets the planned animal count per subgroup.
    #[must_use]
    pub fn with_subgroup_sizes(mut self, sizes: impl Into<Vec<u32>>) -> Self {
        self.subgroup_sizes = sizes.into();
        self
    }

    /// Marks this group as forked from `parent` at `phase`.
    #[must_use]
    pub fn forked_from(mut self, parent: GroupId, phase: PhaseId) -> Self {
        self.from_group = Some(parent);
        self.from_phase = Some(phase);
        self
    }

    /// Sets the dividing sampling.
    #[must_use]
    pub fn with_dividing_sampling(mut self, sampling: SamplingId) -> Self {
        self.dividing_sampling = Some(sampling);
        self
    }

    /// `"{short_name} {name}"`, omitting whichever part is empty.
    pub fn display_name(&self) -> String {
        match (self.short_name.is_empty(), self.name.is_empty()) {
            (false, false) => format!("{} {}", self.short_name, self.name),
            (false, true) => self.short_name.clone(),
            _ => self.name.clone(),
        }
    }

    /// Planned size of `subgroup`, if declared.
    pub fn subgroup_size(&self, subgroup: u32) -> Option<u32> {
        usize::try_from(subgroup)
            .ok()
            .and_then(|i| self.subgroup_sizes.get(i))
            .copied()
    }
}
