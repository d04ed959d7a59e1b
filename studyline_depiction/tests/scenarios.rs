// Copyright 2025 the Studyline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the depiction on small studies.

use std::sync::Arc;

use chrono::NaiveDate;
use kurbo::{Point, Rect, Shape, Size};
use peniko::{Brush, Color};
use studyline_depiction::{
    CacheState, DepictionConfig, Palette, RenderError, StudyView, format_tooltip,
};
use studyline_imaging::{ClipShape, DrawOp, LayerOp, Line};
use studyline_imaging_ref::{RefBackend, StateSnapshot};
use studyline_layout::{FixedAdvanceMetrics, LayoutResult};
use studyline_model::{
    DepictionContext, Group, GroupId, Measurement, MeasurementId, Phase, PhaseId, Rgb, Sampling,
    SamplingId, Selection, Study, StudyAction, StudySnapshot, StudyState, Treatment, TreatmentId,
    VisibilityLevel,
};

const D0: PhaseId = PhaseId(1);
const D1: PhaseId = PhaseId(2);
const D7: PhaseId = PhaseId(3);
const G1: GroupId = GroupId(1);
const G2: GroupId = GroupId(2);

fn snapshot() -> StudySnapshot {
    StudySnapshot {
        identifier: "TOX-042".into(),
        phases: vec![Phase::new(D7, 7), Phase::new(D0, 0), Phase::new(D1, 1)],
        groups: vec![
            Group::new(G1, "1", "Vehicle")
                .with_color(Rgb::new(0, 255, 255))
                .with_subgroups(2),
            Group::new(G2, "1r", "Recovery")
                .with_color(Rgb::new(255, 192, 203))
                .forked_from(G1, D1),
        ],
        treatments: vec![Treatment {
            id: TreatmentId(1),
            name: "Compound X".into(),
            color: Some(Rgb::new(0, 0, 200)),
        }],
        samplings: vec![Sampling {
            id: SamplingId(1),
            name: "Terminal bleed".into(),
            necropsy: true,
        }],
        measurements: vec![Measurement {
            id: MeasurementId(1),
            name: "Body weight".into(),
            abbreviation: "BW".into(),
        }],
        actions: vec![
            StudyAction::new(G1, 0, D0).with_treatment(TreatmentId(1)),
            StudyAction::new(G1, 1, D0).with_treatment(TreatmentId(1)),
            StudyAction::new(G1, 0, D1)
                .with_treatment(TreatmentId(1))
                .with_measurement(MeasurementId(1)),
            StudyAction::new(G1, 0, D7).with_sampling(SamplingId(1)),
            StudyAction::new(G2, 0, D7).with_label("recovery check"),
        ],
        ..StudySnapshot::default()
    }
}

fn study() -> Arc<Study> {
    Arc::new(Study::new(snapshot()).unwrap())
}

fn view() -> StudyView<FixedAdvanceMetrics> {
    StudyView::new(FixedAdvanceMetrics::default(), DepictionConfig::default())
}

const VIEWPORT: Size = Size::new(800.0, 400.0);

#[test]
fn forked_groups_get_their_own_rows_and_columns_stay_ordered() {
    let mut view = view();
    let raster = view.render(Some(study()), 0, VIEWPORT);
    assert!(raster.fault.is_none(), "unexpected fault: {:?}", raster.fault);

    let layout = view.layout().unwrap();
    let (x0, x1, x7) = (
        layout.x(D0).unwrap(),
        layout.x(D1).unwrap(),
        layout.x(D7).unwrap(),
    );
    assert!(x0 < x1 && x1 < x7, "columns out of order: {x0} {x1} {x7}");

    let (y10, y11, y20) = (
        layout.y(G1, 0).unwrap(),
        layout.y(G1, 1).unwrap(),
        layout.y(G2, 0).unwrap(),
    );
    assert_ne!(y10, y11);
    assert_ne!(y20, y10);
    assert_ne!(y20, y11);

    assert_eq!(view.locate(x1, y10), Some(Selection::cell(G1, D1, 0)));
}

#[test]
fn blind_all_hides_cell_tooltips() {
    let study = study();
    let selection = Selection::cell(G1, D1, 0);
    assert!(format_tooltip(&selection, &study, VisibilityLevel::Full).is_some());
    assert_eq!(
        format_tooltip(&selection, &study, VisibilityLevel::BlindAll),
        None
    );

    let mut view = view();
    view.set_context(DepictionContext::default().with_level(VisibilityLevel::BlindAll));
    view.render(Some(study), 0, VIEWPORT);
    assert_eq!(view.tooltip(&selection), None);
}

#[test]
fn unchanged_inputs_reuse_the_cached_raster() {
    let study = study();
    let mut view = view();
    let first = view.render(Some(study.clone()), 0, VIEWPORT);
    let second = view.render(Some(study.clone()), 0, VIEWPORT);
    assert_eq!(view.render_count(), 1);
    assert!(first.ptr_eq(&second));
    assert_eq!(view.cache_state(), CacheState::Valid);

    view.invalidate();
    assert_eq!(view.cache_state(), CacheState::Empty);
    let third = view.render(Some(study), 0, VIEWPORT);
    assert_eq!(view.render_count(), 2);
    assert!(!first.ptr_eq(&third));
}

#[test]
fn each_input_change_rerenders_once() {
    let study = study();
    let mut view = view();
    view.render(Some(study.clone()), 0, VIEWPORT);
    view.render(Some(study.clone()), 1, VIEWPORT);
    assert_eq!(view.render_count(), 2);
    view.render(Some(study.clone()), 1, Size::new(900.0, 400.0));
    assert_eq!(view.render_count(), 3);
    let copy = Arc::new(Study::new(snapshot()).unwrap());
    view.render(Some(copy.clone()), 1, Size::new(900.0, 400.0));
    view.render(Some(copy), 1, Size::new(900.0, 400.0));
    assert_eq!(view.render_count(), 4);
}

fn has_cross(study: &Study, ctx: DepictionContext) -> bool {
    let mut view = view();
    view.set_context(ctx);
    let raster = view.render(Some(Arc::new(study.clone())), 0, VIEWPORT);
    let layout = view.layout().unwrap();
    let (w, h) = (layout.max_x, layout.max_y);
    let diagonal = Line::new(Point::ZERO, (w, h));
    let anti = Line::new((0.0, h), (w, 0.0));
    let lines: Vec<&Line> = raster
        .picture
        .draws()
        .filter_map(|op| match op {
            DrawOp::StrokeLine(line) => Some(line),
            _ => None,
        })
        .collect();
    lines.contains(&&diagonal) && lines.contains(&&anti)
}

#[test]
fn stopped_studies_are_crossed_out() {
    let running = Study::new(snapshot()).unwrap();
    assert!(!has_cross(&running, DepictionContext::default()));

    let stopped = Study::new(StudySnapshot {
        state: StudyState::Stopped,
        ..snapshot()
    })
    .unwrap();
    for level in [
        VisibilityLevel::Full,
        VisibilityLevel::BlindNames,
        VisibilityLevel::BlindAll,
    ] {
        assert!(
            has_cross(&stopped, DepictionContext::default().with_level(level)),
            "no cross at {level:?}"
        );
    }

    let empty = Study::new(StudySnapshot {
        state: StudyState::Stopped,
        ..StudySnapshot::default()
    })
    .unwrap();
    assert!(has_cross(&empty, DepictionContext::default()));
}

#[test]
fn render_faults_are_drawn_and_retried() {
    let mut snapshot = snapshot();
    snapshot
        .actions
        .push(StudyAction::new(G1, 1, D7).with_treatment(TreatmentId(9)));
    let study = Arc::new(Study::new(snapshot).unwrap());

    let mut view = view();
    let raster = view.render(Some(study.clone()), 0, VIEWPORT);
    assert_eq!(
        raster.fault,
        Some(RenderError::UnknownTreatment {
            group: G1,
            phase: D7,
            treatment: TreatmentId(9),
        })
    );
    assert!(
        raster
            .picture
            .texts()
            .any(|t| t.starts_with("Render error: ")),
        "fault message not drawn"
    );
    assert_eq!(view.cache_state(), CacheState::Empty);

    view.render(Some(study), 0, VIEWPORT);
    assert_eq!(view.render_count(), 2);
}

#[test]
fn blinding_removes_identities_from_the_drawing() {
    let texts = |level| {
        let mut view = view();
        view.set_context(DepictionContext::default().with_level(level));
        let raster = view.render(Some(study()), 0, VIEWPORT);
        raster
            .picture
            .texts()
            .map(str::to_owned)
            .collect::<Vec<_>>()
    };

    let full = texts(VisibilityLevel::Full);
    assert!(full.iter().any(|t| t == "1 Vehicle"));
    assert!(full.iter().any(|t| t == "Compound X"));
    assert!(full.iter().any(|t| t == "Terminal bleed"));

    let names = texts(VisibilityLevel::BlindNames);
    assert!(!names.iter().any(|t| t.contains("Vehicle")));
    assert!(!names.iter().any(|t| t == "Compound X"));
    assert!(names.iter().any(|t| t == "recovery check"));

    let all = texts(VisibilityLevel::BlindAll);
    assert!(all.iter().any(|t| t == "Group 1"));
    assert!(!all.iter().any(|t| t == "recovery check" || t == "BW"));
}

fn drawing(snapshot: StudySnapshot, ctx: DepictionContext) -> (LayoutResult, RefBackend) {
    let mut view = view();
    view.set_context(ctx);
    let raster = view.render(Some(Arc::new(Study::new(snapshot).unwrap())), 0, VIEWPORT);
    assert!(raster.fault.is_none(), "unexpected fault: {:?}", raster.fault);
    let mut target = RefBackend::default();
    raster.blit(&mut target);
    (view.layout().unwrap().clone(), target)
}

fn solid(rgb: Rgb) -> Option<Brush> {
    Some(Brush::Solid(Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255)))
}

fn palette() -> Palette {
    DepictionConfig::default().palette
}

fn study_end(layout: &LayoutResult) -> f64 {
    layout.x(D7).unwrap() + layout.column_width * 0.5
}

fn stroked_lines(target: &RefBackend) -> Vec<(Line, &StateSnapshot)> {
    target
        .draws()
        .filter_map(|(op, state)| match op {
            DrawOp::StrokeLine(line) => Some((*line, state)),
            _ => None,
        })
        .collect()
}

fn path_bounds(target: &RefBackend, stroked: bool) -> Vec<Rect> {
    target
        .draws()
        .filter_map(|(op, _)| match op {
            DrawOp::StrokePath(path) if stroked => Some(path.bounding_box()),
            DrawOp::FillPath(path) if !stroked => Some(path.bounding_box()),
            _ => None,
        })
        .collect()
}

fn close(a: Rect, b: Rect) -> bool {
    [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)]
        .iter()
        .all(|(u, v)| (u - v).abs() < 1e-9)
}

#[test]
fn necropsies_end_in_a_cross_and_open_rows_in_an_arrow() {
    let (layout, target) = drawing(snapshot(), DepictionContext::default());
    let (x0, x7) = (layout.x(D0).unwrap(), layout.x(D7).unwrap());
    let (y10, y11) = (layout.y(G1, 0).unwrap(), layout.y(G1, 1).unwrap());
    let lines = stroked_lines(&target);

    // Subgroup 0 is sampled terminally at d7: its line stops there under an X.
    assert!(lines.iter().any(|(l, _)| *l == Line::new((x0, y10), (x7, y10))));
    let crosses = path_bounds(&target, true);
    assert!(
        crosses
            .iter()
            .any(|b| close(*b, Rect::new(x7 - 4.0, y10 - 4.0, x7 + 4.0, y10 + 4.0))),
        "no necropsy cross at d7: {crosses:?}"
    );

    // Subgroup 1 carries on to the end of the study.
    let end = study_end(&layout);
    assert!(lines.iter().any(|(l, _)| *l == Line::new((x0, y11), (end, y11))));
    assert!(
        path_bounds(&target, false)
            .iter()
            .any(|b| (b.x1 - end).abs() < 1e-9 && (b.center().y - y11).abs() < 1e-9),
        "no arrowhead at the end of subgroup 1"
    );
}

#[test]
fn rows_that_split_end_in_an_open_cut() {
    let mut split = snapshot();
    split
        .actions
        .retain(|a| !(a.group == G1 && a.phase == D7));
    let (layout, target) = drawing(split, DepictionContext::default());
    let (x0, x1) = (layout.x(D0).unwrap(), layout.x(D1).unwrap());
    let y10 = layout.y(G1, 0).unwrap();

    let lines = stroked_lines(&target);
    assert!(lines.iter().any(|(l, _)| *l == Line::new((x0, y10), (x1, y10))));
    assert!(
        !lines
            .iter()
            .any(|(l, _)| l.p0.y == y10 && l.p1.y == y10 && l.p1.x > x1),
        "split row continues past its fork point"
    );
    let cuts = path_bounds(&target, true);
    assert_eq!(cuts.len(), 1, "expected one cut: {cuts:?}");
    assert!(close(cuts[0], Rect::new(x1 + 2.0, y10 - 5.0, x1 + 10.0, y10 + 5.0)));
}

#[test]
fn forks_are_connected_to_their_parent() {
    let (layout, target) = drawing(snapshot(), DepictionContext::default());
    let x1 = layout.x(D1).unwrap();
    let (parent_y, y20) = (layout.y(G1, 1).unwrap(), layout.y(G2, 0).unwrap());
    let palette = palette();

    assert!(
        stroked_lines(&target).iter().any(|(l, state)| {
            *l == Line::new((x1, parent_y), (x1, y20)) && state.paint == solid(palette.connector)
        }),
        "no connector from the parent's last row"
    );
    let (_, dot) = target
        .draws()
        .find(|(op, _)| {
            matches!(op, DrawOp::FillCircle(c) if c.center == Point::new(x1, y20) && c.radius == 3.0)
        })
        .expect("fork marker");
    assert_eq!(dot.paint, solid(Rgb::new(255, 192, 203)));
}

#[test]
fn today_column_is_highlighted() {
    let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let mut dated = snapshot();
    for phase in &mut dated.phases {
        if phase.id == D1 {
            phase.date = Some(today);
        }
    }
    let highlight = solid(palette().today);

    let (layout, target) = drawing(dated.clone(), DepictionContext::default().with_today(today));
    let x1 = layout.x(D1).unwrap();
    let half = layout.column_width * 0.5;
    let column = target
        .draws()
        .find_map(|(op, state)| match op {
            DrawOp::FillRect(r) if state.paint == highlight => Some(*r),
            _ => None,
        })
        .expect("today column");
    assert_eq!((column.x0, column.x1), (x1 - half, x1 + half));
    assert!(column.y0 < layout.offset_y && column.y1 > layout.y(G2, 0).unwrap());
    assert!(target.text_runs().any(|(run, _)| run.text == "05.03.2024 Tue"));

    let tomorrow = today.succ_opt().unwrap();
    let (_, target) = drawing(dated, DepictionContext::default().with_today(tomorrow));
    assert!(!target.draws().any(|(_, state)| state.paint == highlight));
}

#[test]
fn dividing_samplings_turn_the_timeline_red() {
    let mut dividing = snapshot();
    dividing.groups[0] = dividing.groups[0]
        .clone()
        .with_dividing_sampling(SamplingId(1));
    let palette = palette();
    let timeline_paint = |snapshot: StudySnapshot, level| {
        let (layout, target) = drawing(snapshot, DepictionContext::default().with_level(level));
        let (x0, y) = (layout.x(D0).unwrap(), layout.y(G1, 0).unwrap());
        stroked_lines(&target)
            .into_iter()
            .find(|(l, _)| l.p0 == Point::new(x0, y) && l.p1.y == y)
            .and_then(|(_, state)| state.paint.clone())
    };

    assert_eq!(
        timeline_paint(dividing.clone(), VisibilityLevel::Full),
        solid(palette.dividing)
    );
    assert_eq!(
        timeline_paint(snapshot(), VisibilityLevel::Full),
        solid(palette.timeline)
    );
    assert_eq!(
        timeline_paint(dividing, VisibilityLevel::BlindAll),
        solid(palette.timeline)
    );
}

#[test]
fn treatment_names_are_clipped_at_the_next_change() {
    let mut changed = snapshot();
    changed.treatments.push(Treatment {
        id: TreatmentId(2),
        name: "Compound Y".into(),
        color: None,
    });
    for action in &mut changed.actions {
        if action.group == G1 && action.subgroup == 0 && action.phase == D7 {
            action.treatment = Some(TreatmentId(2));
        }
    }
    let (layout, target) = drawing(changed, DepictionContext::default());
    let (x0, x7) = (layout.x(D0).unwrap(), layout.x(D7).unwrap());
    let y10 = layout.y(G1, 0).unwrap();

    let clip_of = |name: &str| -> Vec<Rect> {
        target
            .text_runs()
            .filter(|(run, _)| run.text == name && run.origin.y < y10)
            .filter(|(run, _)| run.origin.y > y10 - layout.rows()[0].height)
            .filter_map(|(_, state)| match &state.layer_top {
                Some(LayerOp {
                    clip: Some(ClipShape::Rect(clip)),
                    ..
                }) => Some(*clip),
                _ => None,
            })
            .collect()
    };

    // Drawn once at d0 although d1 repeats it, and cut off where Y starts.
    let x_spans: Vec<_> = clip_of("Compound X").iter().map(|c| (c.x0, c.x1)).collect();
    assert_eq!(x_spans, [(x0, x7)]);
    let y_spans: Vec<_> = clip_of("Compound Y").iter().map(|c| (c.x0, c.x1)).collect();
    assert_eq!(y_spans, [(x7, study_end(&layout))]);
}

#[test]
fn blind_all_timelines_do_not_reveal_necropsies() {
    let (layout, target) = drawing(
        snapshot(),
        DepictionContext::default().with_level(VisibilityLevel::BlindAll),
    );
    assert!(path_bounds(&target, true).is_empty(), "timeline end marks leak");
    let y = layout.y(G1, 0).unwrap();
    let end = study_end(&layout);
    assert!(
        stroked_lines(&target)
            .iter()
            .any(|(l, _)| l.p0.y == y && l.p1 == Point::new(end, y)),
        "collapsed row does not run to the end of the study"
    );
}
