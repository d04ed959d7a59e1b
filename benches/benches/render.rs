// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for the render passes, the raster cache, and exports.

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Size;
use studyline_depiction::{DepictionConfig, StudyView, export, export_svg};
use studyline_imaging_ref::RefBackend;
use studyline_layout::FixedAdvanceMetrics;
use studyline_model::{
    DepictionContext, Group, GroupId, Phase, PhaseId, Sampling, SamplingId, Study, StudyAction,
    StudySnapshot, Treatment, TreatmentId,
};

fn build_study(phases: u32, groups: u32) -> Arc<Study> {
    let mut actions = Vec::new();
    for g in 1..=groups {
        for s in 0..2 {
            for p in 1..=phases {
                let action = match p % 4 {
                    0 => StudyAction::new(GroupId(g), s, PhaseId(p)).with_treatment(TreatmentId(1)),
                    1 => StudyAction::new(GroupId(g), s, PhaseId(p)).with_sampling(SamplingId(1)),
                    2 => StudyAction::new(GroupId(g), s, PhaseId(p)).with_label("weigh"),
                    _ => continue,
                };
                actions.push(action);
            }
        }
    }
    let study = Study::new(StudySnapshot {
        identifier: "BENCH-1".into(),
        phases: (1..=phases)
            .map(|p| Phase::new(PhaseId(p), i32::try_from(p).unwrap_or(i32::MAX)))
            .collect(),
        groups: (1..=groups)
            .map(|g| Group::new(GroupId(g), g.to_string(), "Cohort").with_subgroups(2))
            .collect(),
        treatments: vec![Treatment {
            id: TreatmentId(1),
            name: "Vehicle".into(),
            color: None,
        }],
        samplings: vec![Sampling {
            id: SamplingId(1),
            name: "Plasma".into(),
            necropsy: false,
        }],
        actions,
        ..StudySnapshot::default()
    })
    .expect("generated study is valid");
    Arc::new(study)
}

fn bench_view(c: &mut Criterion) {
    let study = build_study(80, 16);
    let size = Size::new(1600.0, 900.0);
    let mut group = c.benchmark_group("view");

    group.bench_function("render/cold", |b| {
        b.iter_batched(
            || StudyView::new(FixedAdvanceMetrics::default(), DepictionConfig::default()),
            |mut view| black_box(view.render(Some(study.clone()), 0, size)),
            BatchSize::SmallInput,
        );
    });

    let mut view = StudyView::new(FixedAdvanceMetrics::default(), DepictionConfig::default());
    view.render(Some(study.clone()), 0, size);
    group.bench_function("render/cached", |b| {
        b.iter(|| black_box(view.render(Some(study.clone()), 0, size)));
    });

    group.bench_function("paint_into", |b| {
        b.iter_batched(
            RefBackend::default,
            |mut target| {
                view.paint_into(&mut target);
                target
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let study = build_study(80, 16);
    let ctx = DepictionContext::default();
    let config = DepictionConfig::default();
    let metrics = FixedAdvanceMetrics::default();
    let mut group = c.benchmark_group("export");
    group.bench_function("display_list", |b| {
        b.iter(|| black_box(export(Some(&*study), &ctx, &config, &metrics, 1200.0, 800.0)));
    });
    group.bench_function("svg", |b| {
        b.iter(|| black_box(export_svg(Some(&*study), &ctx, &config, &metrics, 1200.0, 800.0)));
    });
    group.finish();
}

criterion_group!(benches, bench_view, bench_export);
criterion_main!(benches);
