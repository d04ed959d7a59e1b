// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Descriptive text for a [`Selection`].

use studyline_model::{Group, Rgb, Sample, SampleStatus, Selection, Study, VisibilityLevel};

/// At most this many samples are listed; beyond it only the count is shown.
pub const MAX_LISTED_SAMPLES: usize = 10;

/// One line of a tooltip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TooltipLine {
    /// Group (and phase) heading.
    Header(String),
    /// The cell is where the group was formed.
    GroupAssignment(Option<String>),
    /// A measurement name.
    Measurement(String),
    /// A treatment, with its color when identity is visible.
    Treatment {
        /// Treatment name.
        name: String,
        /// Treatment color.
        color: Option<Rgb>,
    },
    /// A sampling name.
    Sampling(String),
    /// The action's free-text label.
    Label(String),
    /// An attached sample.
    Sample {
        /// Sample identity.
        id: String,
        /// Latest status.
        status: SampleStatus,
    },
    /// Number of attached samples when there are too many to list.
    SampleCount(usize),
}

impl TooltipLine {
    fn plain(&self) -> String {
        match self {
            Self::Header(text) | Self::Measurement(text) | Self::Sampling(text) | Self::Label(text) => {
                text.clone()
            }
            Self::GroupAssignment(None) => "Group assignment".to_owned(),
            Self::GroupAssignment(Some(from)) => format!("Group assignment (from {from})"),
            Self::Treatment { name, .. } => name.clone(),
            Self::Sample { id, status } => format!("{id} ({status})"),
            Self::SampleCount(n) => format!("{n} samples"),
        }
    }
}

/// A structured tooltip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tooltip {
    /// Lines, top to bottom.
    pub lines: Vec<TooltipLine>,
}

impl Tooltip {
    /// Renders the tooltip as newline-separated text.
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(TooltipLine::plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn push_samples<'a>(lines: &mut Vec<TooltipLine>, samples: impl Iterator<Item = &'a Sample>) {
    let samples: Vec<&Sample> = samples.collect();
    if samples.len() > MAX_LISTED_SAMPLES {
        lines.push(TooltipLine::SampleCount(samples.len()));
        return;
    }
    lines.extend(samples.into_iter().map(|s| TooltipLine::Sample {
        id: s.id.clone(),
        status: s.status,
    }));
}

fn group_heading(study: &Study, group: &Group, subgroup: u32, level: VisibilityLevel) -> String {
    let ordinal = study.group_ordinal(group.id).unwrap_or(0);
    let label = level.group_label(group, ordinal);
    if group.subgroups > 1 && !level.collapses_subgroups() {
        format!("{label} '{}", subgroup + 1)
    } else {
        label
    }
}

/// Builds the tooltip for `selection`.
///
/// Returns `None` when the selection is stale, when it points at a cell
/// without an action that is not the group's fork point, and for any cell
/// under [`VisibilityLevel::BlindAll`].
pub fn format_tooltip(
    selection: &Selection,
    study: &Study,
    level: VisibilityLevel,
) -> Option<Tooltip> {
    let group = study.group(selection.group?)?;
    let subgroup = selection.subgroup;
    let mut lines = Vec::new();

    let Some(phase_id) = selection.phase else {
        lines.push(TooltipLine::Header(group_heading(study, group, subgroup, level)));
        push_samples(&mut lines, study.samples_in(group.id, None));
        return Some(Tooltip { lines });
    };

    if level == VisibilityLevel::BlindAll {
        return None;
    }
    let phase = study.phase(phase_id)?;
    let action = study
        .action(group.id, subgroup, phase_id)
        .filter(|a| a.has_data());
    let fork_point = group.from_phase == Some(phase_id);
    if action.is_none() && !fork_point {
        return None;
    }

    lines.push(TooltipLine::Header(format!(
        "{} - {}",
        group_heading(study, group, subgroup, level),
        study.phase_name(phase)
    )));
    if fork_point {
        let from = group
            .from_group
            .and_then(|id| Some((study.group(id)?, study.group_ordinal(id)?)))
            .map(|(parent, ordinal)| level.group_label(parent, ordinal));
        lines.push(TooltipLine::GroupAssignment(from));
    }

    if let Some(action) = action {
        lines.extend(
            action
                .measurements
                .iter()
                .filter_map(|&m| study.measurement(m))
                .map(|m| TooltipLine::Measurement(m.name.clone())),
        );
        if level.shows_action_names() {
            if let Some(treatment) = action.treatment.and_then(|t| study.treatment(t)) {
                lines.push(TooltipLine::Treatment {
                    name: treatment.name.clone(),
                    color: treatment.color,
                });
            }
            lines.extend(
                action
                    .samplings()
                    .into_iter()
                    .filter_map(|s| study.sampling(s))
                    .map(|s| TooltipLine::Sampling(s.name.clone())),
            );
        }
        if let Some(label) = action.label.as_deref().map(str::trim)
            && !label.is_empty()
        {
            lines.push(TooltipLine::Label(label.to_owned()));
        }
    }

    push_samples(&mut lines, study.samples_in(group.id, Some(subgroup)));
    Some(Tooltip { lines })
}
