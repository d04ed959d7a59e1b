// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

use crate::{GroupId, PhaseId};

/// Structural problems found while validating a [`StudySnapshot`](crate::StudySnapshot).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Two phases share an id.
    #[error("duplicate phase id {0}")]
    DuplicatePhase(PhaseId),
    /// Two groups share an id.
    #[error("duplicate group id {0}")]
    DuplicateGroup(GroupId),
    /// Two treatments, samplings, or measurements share an id.
    #[error("duplicate {kind} id {id}")]
    DuplicateDefinition {
        /// Which table the duplicate was found in.
        kind: &'static str,
        /// The repeated raw id.
        id: u32,
    },
    /// More than one action targets the same cell.
    #[error("more than one action at group {group}, subgroup {subgroup}, phase {phase}")]
    DuplicateCell {
        /// Group of the cell.
        group: GroupId,
        /// Subgroup index of the cell.
        subgroup: u32,
        /// Phase of the cell.
        phase: PhaseId,
    },
    /// A group declares zero subgroups.
    #[error("group {0} has no subgroups")]
    ZeroSubgroups(GroupId),
    /// A reference names a group the study does not contain.
    #[error("{referenced_by} references unknown group {group}")]
    UnknownGroup {
        /// What holds the dangling reference.
        referenced_by: &'static str,
        /// The missing group.
        group: GroupId,
    },
    /// A reference names a phase the study does not contain.
    #[error("{referenced_by} references unknown phase {phase}")]
    UnknownPhase {
        /// What holds the dangling reference.
        referenced_by: &'static str,
        /// The missing phase.
        phase: PhaseId,
    },
    /// A subgroup index is not below the group's subgroup count.
    #[error("subgroup {subgroup} out of range for group {group} with {count} subgroups")]
    SubgroupOutOfRange {
        /// Group referenced.
        group: GroupId,
        /// Offending subgroup index.
        subgroup: u32,
        /// Number of subgroups the group declares.
        count: u32,
    },
    /// Following `from_group` links from this group never reaches a root.
    #[error("group {0} is part of a fork cycle")]
    ForkCycle(GroupId),
    /// A color string is not of the form `#rrggbb`.
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}
