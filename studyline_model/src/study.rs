// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::{
    Group, GroupId, Measurement, MeasurementId, ModelError, Phase, PhaseFormat, PhaseId, Sample,
    Sampling, SamplingId, StudyAction, Treatment, TreatmentId,
};

/// Lifecycle state of a study.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyState {
    /// Running or planned.
    #[default]
    Active,
    /// Stopped before completion; depictions carry a cross overlay.
    Stopped,
    /// Completed and closed.
    Closed,
}

/// Per-study access lists, consulted by [`VisibilityPolicy`](crate::VisibilityPolicy).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyAccess {
    /// Users who see no group, treatment, or sampling content.
    pub blind_all_users: Vec<String>,
    /// Users who see ordinals instead of group and treatment names.
    pub blind_names_users: Vec<String>,
    /// Users allowed to interact with the depiction.
    pub expert_users: Vec<String>,
}

/// Unvalidated study input, as supplied by the persistence layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudySnapshot {
    /// Study identifier shown in the legend.
    pub identifier: String,
    /// Secondary (sponsor) identifier shown in the legend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_id: Option<String>,
    /// Lifecycle state.
    pub state: StudyState,
    /// Phase naming mode.
    pub phase_format: PhaseFormat,
    /// Phases, in any order.
    pub phases: Vec<Phase>,
    /// Groups, in display order among siblings.
    pub groups: Vec<Group>,
    /// Treatment definitions.
    pub treatments: Vec<Treatment>,
    /// Sampling definitions.
    pub samplings: Vec<Sampling>,
    /// Measurement definitions.
    pub measurements: Vec<Measurement>,
    /// Per-cell actions.
    pub actions: Vec<StudyAction>,
    /// Attached samples and their latest status.
    pub samples: Vec<Sample>,
    /// Access lists.
    pub access: StudyAccess,
}

type CellKey = (GroupId, u32, PhaseId);

/// A validated, indexed study.
///
/// Phases are stored in chronological order and groups in hierarchical
/// order: root groups in input order, each followed depth-first by the
/// groups forked from it. A `Study` never changes after construction.
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "StudySnapshot")]
pub struct Study {
    identifier: String,
    secondary_id: Option<String>,
    state: StudyState,
    phase_format: PhaseFormat,
    access: StudyAccess,
    phases: Vec<Phase>,
    groups: Vec<Group>,
    actions: Vec<StudyAction>,
    samples: Vec<Sample>,
    phase_index: HashMap<PhaseId, usize>,
    group_index: HashMap<GroupId, usize>,
    cell_index: HashMap<CellKey, usize>,
    children: HashMap<GroupId, Vec<usize>>,
    phases_with_data: HashSet<PhaseId>,
    treatments: HashMap<TreatmentId, Treatment>,
    samplings: HashMap<SamplingId, Sampling>,
    measurements: HashMap<MeasurementId, Measurement>,
}

impl TryFrom<StudySnapshot> for Study {
    type Error = ModelError;

    fn try_from(snapshot: StudySnapshot) -> Result<Self, Self::Error> {
        Self::new(snapshot)
    }
}

fn index_definitions<K, V>(
    items: Vec<V>,
    kind: &'static str,
    key: impl Fn(&V) -> K,
    raw: impl Fn(&K) -> u32,
) -> Result<HashMap<K, V>, ModelError>
where
    K: Eq + core::hash::Hash,
{
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let k = key(&item);
        if map.contains_key(&k) {
            return Err(ModelError::DuplicateDefinition { kind, id: raw(&k) });
        }
        map.insert(k, item);
    }
    Ok(map)
}

impl Study {
    /// Validates a snapshot and builds its indexes.
    pub fn new(snapshot: StudySnapshot) -> Result<Self, ModelError> {
        let StudySnapshot {
            identifier,
            secondary_id,
            state,
            phase_format,
            mut phases,
            groups,
            treatments,
            samplings,
            measurements,
            actions,
            samples,
            access,
        } = snapshot;

        phases.sort_by_key(Phase::sort_key);
        let mut phase_index = HashMap::with_capacity(phases.len());
        for (i, phase) in phases.iter().enumerate() {
            if phase_index.insert(phase.id, i).is_some() {
                return Err(ModelError::DuplicatePhase(phase.id));
            }
        }

        let groups = order_groups(groups, &phase_index)?;
        let mut group_index = HashMap::with_capacity(groups.len());
        let mut children: HashMap<GroupId, Vec<usize>> = HashMap::new();
        for (i, group) in groups.iter().enumerate() {
            group_index.insert(group.id, i);
            if let Some(parent) = group.from_group {
                children.entry(parent).or_default().push(i);
            }
        }

        let mut cell_index = HashMap::with_capacity(actions.len());
        let mut phases_with_data = HashSet::new();
        for (i, action) in actions.iter().enumerate() {
            let group = group_index
                .get(&action.group)
                .map(|&g| &groups[g])
                .ok_or(ModelError::UnknownGroup {
                    referenced_by: "action",
                    group: action.group,
                })?;
            if !phase_index.contains_key(&action.phase) {
                return Err(ModelError::UnknownPhase {
                    referenced_by: "action",
                    phase: action.phase,
                });
            }
            if action.subgroup >= group.subgroups {
                return Err(ModelError::SubgroupOutOfRange {
                    group: group.id,
                    subgroup: action.subgroup,
                    count: group.subgroups,
                });
            }
            let key = (action.group, action.subgroup, action.phase);
            if cell_index.insert(key, i).is_some() {
                return Err(ModelError::DuplicateCell {
                    group: action.group,
                    subgroup: action.subgroup,
                    phase: action.phase,
                });
            }
            if action.has_data() {
                phases_with_data.insert(action.phase);
            }
        }
        // Fork points carry data: the child group starts there.
        phases_with_data.extend(groups.iter().filter_map(|g| g.from_phase));

        for sample in &samples {
            if let Some(id) = sample.group {
                let group = group_index
                    .get(&id)
                    .map(|&g| &groups[g])
                    .ok_or(ModelError::UnknownGroup {
                        referenced_by: "sample",
                        group: id,
                    })?;
                if sample.subgroup >= group.subgroups {
                    return Err(ModelError::SubgroupOutOfRange {
                        group: id,
                        subgroup: sample.subgroup,
                        count: group.subgroups,
                    });
                }
            }
            if let Some(phase) = sample.status_phase
                && !phase_index.contains_key(&phase)
            {
                return Err(ModelError::UnknownPhase {
                    referenced_by: "sample",
                    phase,
                });
            }
        }

        Ok(Self {
            identifier,
            secondary_id,
            state,
            phase_format,
            access,
            phases,
            groups,
            actions,
            samples,
            phase_index,
            group_index,
            cell_index,
            children,
            phases_with_data,
            treatments: index_definitions(treatments, "treatment", |t| t.id, |k| k.get())?,
            samplings: index_definitions(samplings, "sampling", |s| s.id, |k| k.get())?,
            measurements: index_definitions(measurements, "measurement", |m| m.id, |k| k.get())?,
        })
    }

    /// Study identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Secondary identifier, if any.
    pub fn secondary_id(&self) -> Option<&str> {
        self.secondary_id.as_deref()
    }

    /// Lifecycle state.
    pub fn state(&self) -> StudyState {
        self.state
    }

    /// Returns `true` if the study was stopped.
    pub fn is_stopped(&self) -> bool {
        self.state == StudyState::Stopped
    }

    /// Phase naming mode.
    pub fn phase_format(&self) -> PhaseFormat {
        self.phase_format
    }

    /// Access lists.
    pub fn access(&self) -> &StudyAccess {
        &self.access
    }

    /// Phases in chronological order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Looks up a phase.
    pub fn phase(&self, id: PhaseId) -> Option<&Phase> {
        self.phase_index.get(&id).map(|&i| &self.phases[i])
    }

    /// Chronological position of a phase.
    pub fn phase_position(&self, id: PhaseId) -> Option<usize> {
        self.phase_index.get(&id).copied()
    }

    /// Short display name of a phase, under the study's phase format.
    pub fn phase_name(&self, phase: &Phase) -> String {
        phase.short_name(self.phase_format)
    }

    /// Returns `true` if any action at `phase` carries data, or a group forks there.
    pub fn phase_has_data(&self, phase: PhaseId) -> bool {
        self.phases_with_data.contains(&phase)
    }

    /// Groups in hierarchical order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Looks up a group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.group_index.get(&id).map(|&i| &self.groups[i])
    }

    /// One-based position of a group in hierarchical order.
    pub fn group_ordinal(&self, id: GroupId) -> Option<usize> {
        self.group_index.get(&id).map(|&i| i + 1)
    }

    /// Groups forked directly from `id`.
    pub fn children_of(&self, id: GroupId) -> impl Iterator<Item = &Group> + '_ {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.groups[i])
    }

    /// All actions, in input order.
    pub fn actions(&self) -> &[StudyAction] {
        &self.actions
    }

    /// The action at a cell, if any.
    pub fn action(&self, group: GroupId, subgroup: u32, phase: PhaseId) -> Option<&StudyAction> {
        self.cell_index
            .get(&(group, subgroup, phase))
            .map(|&i| &self.actions[i])
    }

    /// Actions of one subgroup row, in chronological order.
    pub fn row_actions(
        &self,
        group: GroupId,
        subgroup: u32,
    ) -> impl Iterator<Item = (&Phase, &StudyAction)> + '_ {
        self.phases
            .iter()
            .filter_map(move |p| self.action(group, subgroup, p.id).map(|a| (p, a)))
    }

    /// Looks up a treatment.
    pub fn treatment(&self, id: TreatmentId) -> Option<&Treatment> {
        self.treatments.get(&id)
    }

    /// Looks up a sampling.
    pub fn sampling(&self, id: SamplingId) -> Option<&Sampling> {
        self.samplings.get(&id)
    }

    /// Looks up a measurement.
    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.measurements.get(&id)
    }

    /// All attached samples.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Top-level samples of a group, optionally restricted to one subgroup.
    pub fn samples_in(
        &self,
        group: GroupId,
        subgroup: Option<u32>,
    ) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter().filter(move |s| {
            s.top_level && s.group == Some(group) && subgroup.is_none_or(|sg| s.subgroup == sg)
        })
    }
}

/// Orders groups roots-first, each root followed depth-first by its forks.
fn order_groups(
    groups: Vec<Group>,
    phase_index: &HashMap<PhaseId, usize>,
) -> Result<Vec<Group>, ModelError> {
    let mut by_id: HashMap<GroupId, usize> = HashMap::with_capacity(groups.len());
    for (i, group) in groups.iter().enumerate() {
        if by_id.insert(group.id, i).is_some() {
            return Err(ModelError::DuplicateGroup(group.id));
        }
        if group.subgroups == 0 {
            return Err(ModelError::ZeroSubgroups(group.id));
        }
        if let Some(phase) = group.from_phase
            && !phase_index.contains_key(&phase)
        {
            return Err(ModelError::UnknownPhase {
                referenced_by: "group fork",
                phase,
            });
        }
    }

    let mut kids: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
    let mut roots = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        match group.from_group {
            None => roots.push(i),
            Some(parent) => {
                let &p = by_id.get(&parent).ok_or(ModelError::UnknownGroup {
                    referenced_by: "group fork",
                    group: parent,
                })?;
                kids[p].push(i);
            }
        }
    }

    let mut order = Vec::with_capacity(groups.len());
    let mut visited = vec![false; groups.len()];
    let mut stack: Vec<usize> = roots.into_iter().rev().collect();
    while let Some(i) = stack.pop() {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        order.push(i);
        stack.extend(kids[i].iter().rev().copied());
    }

    if let Some(stuck) = visited.iter().position(|v| !v) {
        return Err(ModelError::ForkCycle(groups[stuck].id));
    }

    let mut slots: Vec<Option<Group>> = groups.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}
