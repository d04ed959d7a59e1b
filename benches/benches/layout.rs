// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `compute_positions` and hit testing.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use studyline_depiction::locate;
use studyline_layout::{FixedAdvanceMetrics, LayoutStyle, ZoomRequest, compute_positions};
use studyline_model::{
    DepictionContext, Group, GroupId, Phase, PhaseId, Study, StudyAction, StudySnapshot,
    VisibilityLevel,
};

/// A study with `phases` phases, `groups` groups of three subgroups, and an
/// action on every third cell.
fn build_study(phases: u32, groups: u32) -> Study {
    let mut actions = Vec::new();
    for g in 1..=groups {
        for s in 0..3 {
            for p in (1..=phases).filter(|p| (p + g + s) % 3 == 0) {
                actions.push(StudyAction::new(GroupId(g), s, PhaseId(p)).with_label("obs"));
            }
        }
    }
    Study::new(StudySnapshot {
        phases: (1..=phases)
            .map(|p| Phase::new(PhaseId(p), i32::try_from(p).unwrap_or(i32::MAX)))
            .collect(),
        groups: (1..=groups)
            .map(|g| Group::new(GroupId(g), g.to_string(), "Cohort").with_subgroups(3))
            .collect(),
        actions,
        ..StudySnapshot::default()
    })
    .expect("generated study is valid")
}

fn bench_layout(c: &mut Criterion) {
    let metrics = FixedAdvanceMetrics::default();
    let style = LayoutStyle::default();
    let mut group = c.benchmark_group("compute_positions");
    for &(phases, groups) in &[(10_u32, 4_u32), (60, 12), (200, 40)] {
        let study = build_study(phases, groups);
        for level in [VisibilityLevel::Full, VisibilityLevel::BlindAll] {
            let ctx = DepictionContext::default().with_level(level);
            let id = BenchmarkId::new(format!("{level:?}"), format!("{phases}x{groups}"));
            group.bench_function(id, |b| {
                b.iter(|| {
                    black_box(compute_positions(
                        black_box(&study),
                        ZoomRequest::default(),
                        &metrics,
                        &ctx,
                        &style,
                    ))
                });
            });
        }
        group.bench_function(BenchmarkId::new("autofit", format!("{phases}x{groups}")), |b| {
            let ctx = DepictionContext::default();
            b.iter(|| {
                black_box(compute_positions(
                    black_box(&study),
                    ZoomRequest::AutoFit,
                    &metrics,
                    &ctx,
                    &style,
                ))
            });
        });
    }
    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let metrics = FixedAdvanceMetrics::default();
    let style = LayoutStyle::default();
    let ctx = DepictionContext::default();
    let study = build_study(200, 40);
    let layout = compute_positions(&study, ZoomRequest::default(), &metrics, &ctx, &style);
    let points: Vec<(f64, f64)> = layout
        .rows()
        .iter()
        .step_by(7)
        .flat_map(|row| layout.columns().iter().step_by(13).map(move |c| (c.x, row.y)))
        .collect();

    c.bench_function("locate/200x40", |b| {
        b.iter(|| {
            for &(x, y) in &points {
                black_box(locate(x, y, &layout, &study, &ctx, &style));
            }
        });
    });
}

criterion_group!(benches, bench_layout, bench_locate);
criterion_main!(benches);
