// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for loading studies from JSON snapshots.
//!
//! These exercise the `serde` surface of the model: defaults for omitted
//! fields, string-encoded dates and colors, and validation on deserialize.

use chrono::{Datelike, NaiveDate, Weekday};
use studyline_model::{
    GroupId, Phase, PhaseFormat, PhaseId, Rgb, SampleStatus, Study, StudyState,
};

const STUDY: &str = r##"{
    "identifier": "TOX-0042",
    "secondary_id": "SP-7",
    "state": "stopped",
    "phase_format": "day_time",
    "phases": [
        {"id": 2, "day": 1, "date": "2024-03-05", "label": "dosing"},
        {"id": 1, "day": 0, "date": "2024-03-04"},
        {"id": 3, "day": 1, "hour": 6, "minute": 30}
    ],
    "groups": [
        {"id": 10, "short_name": "1", "name": "Vehicle", "color": "#00ffff", "subgroups": 2},
        {"id": 11, "short_name": "1b", "name": "Recovery", "from_group": 10, "from_phase": 2}
    ],
    "treatments": [{"id": 1, "name": "Compound X", "color": "#ff0000"}],
    "samplings": [{"id": 1, "name": "Blood", "necropsy": false}],
    "actions": [
        {"group": 10, "subgroup": 1, "phase": 2, "treatment": 1, "sampling": 1}
    ],
    "samples": [
        {"id": "A-001", "group": 10, "status": "unavailable", "status_phase": 3},
        {"id": "A-002", "group": 10, "subgroup": 1}
    ]
}"##;

#[test]
fn loads_full_snapshot() {
    let study: Study = serde_json::from_str(STUDY).unwrap();

    assert_eq!(study.identifier(), "TOX-0042");
    assert_eq!(study.secondary_id(), Some("SP-7"));
    assert_eq!(study.state(), StudyState::Stopped);
    assert!(study.is_stopped());
    assert_eq!(study.phase_format(), PhaseFormat::DayTime);

    let names: Vec<_> = study
        .phases()
        .iter()
        .map(|p| study.phase_name(p))
        .collect();
    assert_eq!(names, ["d0", "d1", "d1_6h30"]);

    let d1 = study.phase(PhaseId(2)).unwrap();
    assert_eq!(d1.date, NaiveDate::from_ymd_opt(2024, 3, 5));
    assert_eq!(d1.date.map(|d| d.weekday()), Some(Weekday::Tue));
    assert_eq!(d1.label.as_deref(), Some("dosing"));

    let vehicle = study.group(GroupId(10)).unwrap();
    assert_eq!(vehicle.color, Some(Rgb::new(0, 255, 255)));
    assert_eq!(vehicle.subgroups, 2);
    assert_eq!(study.group(GroupId(11)).unwrap().subgroups, 1);

    assert!(study.action(GroupId(10), 1, PhaseId(2)).is_some());
    assert!(study.phase_has_data(PhaseId(2)));
    assert!(!study.phase_has_data(PhaseId(3)));

    let samples: Vec<_> = study.samples_in(GroupId(10), Some(0)).collect();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].status, SampleStatus::Unavailable);
    assert_eq!(study.samples_in(GroupId(10), None).count(), 2);
}

#[test]
fn invalid_snapshots_fail_to_deserialize() {
    let dup = r#"{"phases": [{"id": 1}, {"id": 1, "day": 3}]}"#;
    let err = serde_json::from_str::<Study>(dup).unwrap_err();
    assert!(err.to_string().contains("duplicate phase id 1"));

    let bad_date = r#"{"phases": [{"id": 1, "date": "2024-02-30"}]}"#;
    assert!(serde_json::from_str::<Study>(bad_date).is_err());

    let bad_color = r#"{"groups": [{"id": 1, "color": "teal"}]}"#;
    assert!(serde_json::from_str::<Study>(bad_color).is_err());

    let dangling = r#"{"groups": [{"id": 1, "from_group": 5}]}"#;
    let err = serde_json::from_str::<Study>(dangling).unwrap_err();
    assert!(err.to_string().contains("unknown group 5"));
}

#[test]
fn empty_snapshot_is_a_valid_study() {
    let study: Study = serde_json::from_str("{}").unwrap();
    assert!(study.phases().is_empty());
    assert!(study.groups().is_empty());
    assert_eq!(study.state(), StudyState::Active);
}

#[test]
fn phase_dates_round_trip_as_iso_strings() {
    for (year, month, day) in [(2024, 2, 29), (1, 1, 1), (-1, 12, 31), (12345, 6, 7)] {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let phase = Phase::new(PhaseId(1), 0).with_date(date);
        let json = serde_json::to_string(&phase).unwrap();
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back.date, Some(date), "{json}");
    }

    let json = serde_json::to_string(&Phase::new(PhaseId(1), 0).with_date(
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
    ))
    .unwrap();
    assert!(json.contains(r#""date":"2024-03-05""#), "{json}");
}
