// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{GroupId, PhaseId};

/// What a pointer coordinate refers to.
///
/// Selections are plain values: two selections are equal iff group, phase,
/// and subgroup all match, with `None` equal only to `None`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    /// Selected group.
    pub group: Option<GroupId>,
    /// Selected phase; `None` when the pointer is over the group labels.
    pub phase: Option<PhaseId>,
    /// Subgroup index within `group`.
    pub subgroup: u32,
}

impl Selection {
    /// A selection of one cell.
    pub const fn cell(group: GroupId, phase: PhaseId, subgroup: u32) -> Self {
        Self {
            group: Some(group),
            phase: Some(phase),
            subgroup,
        }
    }

    /// A selection of a whole group row.
    pub const fn group_only(group: GroupId, subgroup: u32) -> Self {
        Self {
            group: Some(group),
            phase: None,
            subgroup,
        }
    }

    /// Returns `true` if a group is selected without a phase.
    pub const fn is_group_only(&self) -> bool {
        self.group.is_some() && self.phase.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_field_wise_and_null_safe() {
        let a = Selection::cell(GroupId(1), PhaseId(2), 0);
        assert_eq!(a, Selection::cell(GroupId(1), PhaseId(2), 0));
        assert_ne!(a, Selection::cell(GroupId(1), PhaseId(2), 1));
        assert_ne!(a, Selection::group_only(GroupId(1), 0));
        assert_eq!(Selection::default(), Selection::default());
        assert!(Selection::group_only(GroupId(1), 0).is_group_only());
        assert!(!Selection::default().is_group_only());
    }
}
