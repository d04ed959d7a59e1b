// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blinding levels and the depiction context threaded through layout and render.
//!
//! Permissions are resolved exactly once, by [`VisibilityPolicy::resolve`].
//! Everything downstream receives a [`VisibilityLevel`] and asks it what may
//! be shown, so the rules live in one place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Group, Study};

/// How much of the study design a viewer may see.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityLevel {
    /// Everything.
    #[default]
    Full,
    /// Group and treatment identity hidden; ordinals and structure still shown.
    BlindNames,
    /// No group, treatment, or sampling content; only raw sample identity.
    BlindAll,
}

impl VisibilityLevel {
    /// Returns `true` under any blinding.
    pub const fn is_blinded(self) -> bool {
        !matches!(self, Self::Full)
    }

    /// Subgroups share one row per group.
    pub const fn collapses_subgroups(self) -> bool {
        matches!(self, Self::BlindAll)
    }

    /// Group names, colors, and treatment colors may be shown.
    pub const fn shows_identity(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Treatment and sampling names may be shown.
    pub const fn shows_action_names(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Measurement, treatment, and sampling glyphs may be drawn.
    pub const fn shows_action_glyphs(self) -> bool {
        !matches!(self, Self::BlindAll)
    }

    /// Free-text labels, counts, and subgroup ordinals may be drawn.
    pub const fn shows_annotations(self) -> bool {
        !matches!(self, Self::BlindAll)
    }

    /// Hazard halos may be drawn.
    pub const fn shows_hazards(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Row label for `group`, which sits at `ordinal` (one-based) in hierarchical order.
    pub fn group_label(self, group: &Group, ordinal: usize) -> String {
        match self {
            Self::Full => group.display_name(),
            Self::BlindNames if !group.short_name.is_empty() => group.short_name.clone(),
            Self::BlindNames | Self::BlindAll => format!("Group {ordinal}"),
        }
    }
}

/// Whether the depiction is used for viewing or for editing the design.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepictionMode {
    /// Phases without data collapse onto their predecessor.
    #[default]
    View,
    /// Every phase gets its own column.
    Design,
}

/// The person looking at the depiction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Login name.
    pub user: String,
    /// Administrators bypass blinding.
    #[serde(default)]
    pub admin: bool,
}

impl Viewer {
    /// Creates a non-admin viewer.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            admin: false,
        }
    }

    /// Creates an administrator.
    pub fn admin(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            admin: true,
        }
    }
}

/// Outcome of resolving a viewer against a study.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Permissions {
    /// Blinding level.
    pub level: VisibilityLevel,
    /// Whether the viewer may interact (hover, select, tooltips).
    pub expert: bool,
}

/// Maps viewers to [`Permissions`] using a study's [`StudyAccess`](crate::StudyAccess) lists.
#[derive(Copy, Clone, Debug, Default)]
pub struct VisibilityPolicy;

impl VisibilityPolicy {
    /// Resolves the permissions of `viewer` on `study`.
    ///
    /// Administrators see everything. Otherwise blind-all membership wins
    /// over blind-names membership, and expert rights come from the expert list.
    pub fn resolve(study: &Study, viewer: &Viewer) -> Permissions {
        if viewer.admin {
            return Permissions {
                level: VisibilityLevel::Full,
                expert: true,
            };
        }
        let access = study.access();
        let listed = |users: &[String]| users.iter().any(|u| *u == viewer.user);
        let level = if listed(&access.blind_all_users) {
            VisibilityLevel::BlindAll
        } else if listed(&access.blind_names_users) {
            VisibilityLevel::BlindNames
        } else {
            VisibilityLevel::Full
        };
        Permissions {
            level,
            expert: listed(&access.expert_users),
        }
    }
}

/// Everything besides the study that changes what a depiction looks like.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DepictionContext {
    /// Blinding level.
    pub level: VisibilityLevel,
    /// View or design mode.
    pub mode: DepictionMode,
    /// Whether pointer interaction is enabled.
    pub expert: bool,
    /// Reference date for the "today" column, read by the caller.
    pub today: Option<NaiveDate>,
}

impl Default for DepictionContext {
    fn default() -> Self {
        Self {
            level: VisibilityLevel::Full,
            mode: DepictionMode::View,
            expert: true,
            today: None,
        }
    }
}

impl DepictionContext {
    /// Builds a context from resolved permissions.
    pub fn from_permissions(permissions: Permissions) -> Self {
        Self {
            level: permissions.level,
            expert: permissions.expert,
            ..Self::default()
        }
    }

    /// Sets the blinding level.
    #[must_use]
    pub fn with_level(mut self, level: VisibilityLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DepictionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets interaction rights.
    #[must_use]
    pub fn with_expert(mut self, expert: bool) -> Self {
        self.expert = expert;
        self
    }

    /// Sets the reference date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Returns `true` if phases without data keep their own column.
    pub fn keeps_empty_phases(&self) -> bool {
        self.mode == DepictionMode::Design
    }
}
