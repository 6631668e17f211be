use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use gantt_timeline::graph::DependencyGraph;
use gantt_timeline::io::{import_csv_str, ChartFile};
use gantt_timeline::layout::bar::progress_from_width;
use gantt_timeline::model::Project;
use gantt_timeline::render::RenderCall;
use gantt_timeline::{
    DateMath, DragMode, FixedDateMath, Gantt, GanttEvent, GanttOptions, HitRegion, MilestoneInput,
    Point, RecordingRenderer, TaskInput, ViewMode,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(h, 0, 0))
        .unwrap()
}

fn dm() -> FixedDateMath {
    FixedDateMath::new(at(2024, 1, 2, 9))
}

fn chain(b_start: &str, b_end: &str) -> Gantt<FixedDateMath> {
    Gantt::with_date_math(
        vec![
            TaskInput::new("a", "2024-01-01", "2024-01-03"),
            TaskInput::new("b", b_start, b_end).with_dependencies("a"),
        ],
        vec![MilestoneInput::new("launch", "2024-01-12")],
        GanttOptions::default(),
        dm(),
    )
    .unwrap()
}

#[test]
fn day_view_geometry() {
    let g = chain("2024-01-05", "2024-01-06");
    // chart starts 15 days before the first task
    assert_eq!(g.scale().gantt_start, at(2023, 12, 17, 0));
    let a = g.bar("a").unwrap();
    assert_eq!(a.x(), 570.0);
    assert_eq!(a.width(), 114.0);
    assert_eq!(a.rect.y, 68.0);
    let b = g.bar("b").unwrap();
    assert_eq!(b.x(), 722.0);
    assert_eq!(b.width(), 76.0);
    assert_eq!(b.rect.y, 106.0);
    assert_eq!(g.arrows().len(), 1);
    assert_eq!(g.flags().len(), 1);
}

#[test]
fn dragging_a_dependency_carries_its_dependents() {
    let mut g = chain("2024-01-05", "2024-01-06");
    let a = g.bar("a").unwrap().clone();
    let y = a.rect.center_y();
    assert!(g.pointer_down(Point::new(a.x() + 40.0, y)));
    assert_eq!(g.drag_mode(), DragMode::Dragging);

    // 80px snaps to two columns
    let outcome = g.pointer_move(Point::new(a.x() + 120.0, y));
    assert_eq!(outcome.bars, vec![0, 1]);
    assert_eq!(outcome.arrows, vec![0]);

    let events = g.pointer_up();
    assert_eq!(g.drag_mode(), DragMode::Idle);
    assert_eq!(
        events,
        vec![
            GanttEvent::DateChange {
                task_id: "a".into(),
                start: at(2024, 1, 3, 0),
                end: dm().parse("2024-01-05 23:59:59").unwrap(),
            },
            GanttEvent::DateChange {
                task_id: "b".into(),
                start: at(2024, 1, 7, 0),
                end: dm().parse("2024-01-08 23:59:59").unwrap(),
            },
        ]
    );
    assert_eq!(g.task("b").unwrap().end, at(2024, 1, 8, 0));
    assert_eq!(g.bar("b").unwrap().x(), 798.0);
}

#[test]
fn resize_left_cannot_cross_the_dependency_end() {
    // b starts exactly where a ends
    let mut g = chain("2024-01-04", "2024-01-06");
    let floor = g.bar("a").unwrap().end_x();
    let b = g.bar("b").unwrap().clone();
    assert_eq!(b.x(), floor);

    let grab = Point::new(b.x() + 3.0, b.rect.y + 2.0);
    assert_eq!(g.hit_test(grab), Some((1, HitRegion::LeftHandle)));
    assert!(g.pointer_down(grab));
    assert_eq!(g.drag_mode(), DragMode::ResizingLeft);

    let outcome = g.pointer_move(Point::new(grab.x - 38.0, grab.y));
    assert!(outcome.bars.is_empty());
    assert_eq!(g.bar("b").unwrap().rect, b.rect);

    // the gesture still commits b, with its dates unchanged
    assert_eq!(
        g.pointer_up(),
        vec![GanttEvent::DateChange {
            task_id: "b".into(),
            start: at(2024, 1, 4, 0),
            end: dm().parse("2024-01-06 23:59:59").unwrap(),
        }]
    );
    assert_eq!(g.task("b").unwrap().start, at(2024, 1, 4, 0));
    assert_eq!(g.task("b").unwrap().end, at(2024, 1, 6, 0));
    assert_eq!(g.bar("b").unwrap().rect, b.rect);
}

#[test]
fn resize_left_inward_shortens_the_bar() {
    let mut g = chain("2024-01-04", "2024-01-06");
    let b = g.bar("b").unwrap().clone();
    let grab = Point::new(b.x() + 3.0, b.rect.y + 2.0);
    assert!(g.pointer_down(grab));
    g.pointer_move(Point::new(grab.x + 38.0, grab.y));
    let events = g.pointer_up();
    assert_eq!(
        events,
        vec![GanttEvent::DateChange {
            task_id: "b".into(),
            start: at(2024, 1, 5, 0),
            end: dm().parse("2024-01-06 23:59:59").unwrap(),
        }]
    );
    assert_eq!(g.bar("b").unwrap().width(), 76.0);
}

#[test]
fn progress_is_truncated_not_rounded() {
    assert_eq!(progress_from_width(33.0, 100.0), 33.0);
    assert_eq!(progress_from_width(33.99, 100.0), 33.0);
    assert_eq!(progress_from_width(0.0, 0.0), 0.0);
}

#[test]
fn switching_day_to_week_leaves_tasks_alone() {
    let mut g = chain("2024-01-05", "2024-01-06");
    let tasks = g.tasks().to_vec();
    let mut renderer = RecordingRenderer::default();

    let event = g.change_view_mode(ViewMode::Week).unwrap();
    assert_eq!(event, GanttEvent::ViewChange(ViewMode::Week));
    assert_eq!(g.tasks(), tasks.as_slice());

    assert_eq!(g.scale().column_width, 140.0);
    assert_eq!(g.scale().gantt_start, at(2023, 12, 1, 0));
    let a = g.bar("a").unwrap();
    // 31 days in, three days wide
    assert_relative_eq!(a.x(), 620.0, epsilon = 1e-9);
    assert_relative_eq!(a.width(), 60.0, epsilon = 1e-9);

    g.render(&mut renderer);
    assert!(matches!(renderer.calls[0], RenderCall::Grid { .. }));
    assert_eq!(renderer.calls.len(), 1 + 2 + 1 + 1);
}

#[test]
fn diamond_dependents_are_reported_once() {
    let project = Project::ingest(
        vec![
            TaskInput::new("A", "2024-01-01", "2024-01-02"),
            TaskInput::new("B", "2024-01-03", "2024-01-04").with_dependencies("A"),
            TaskInput::new("C", "2024-01-03", "2024-01-04").with_dependencies("A"),
            TaskInput::new("D", "2024-01-05", "2024-01-06").with_dependencies("B, C"),
        ],
        Vec::new(),
        &dm(),
    );
    let graph = DependencyGraph::build(&project.tasks);
    let mut dependents = graph.all_transitive_dependents("A");
    dependents.sort();
    assert_eq!(dependents, vec!["B", "C", "D"]);
    assert_eq!(graph.all_transitive_dependents("A").len(), 3);
    assert!(graph.all_transitive_dependents("D").is_empty());
}

#[test]
fn csv_import_drives_the_engine() {
    let csv = "ID;Task Name;Start;End;Depends On;Progress\n\
               d;Design;2024-01-01;2024-01-03;;25\n\
               b;Build;2024-01-04;2024-01-09;d;0\n\
               s;Ship;;2024-01-12;b;\n";
    let import = import_csv_str(csv).unwrap();
    let g = ChartFile::from(import).into_gantt(dm()).unwrap();
    assert_eq!(g.tasks().len(), 3);
    assert_eq!(g.arrows().len(), 2);
    assert_eq!(g.task("d").unwrap().progress, 25.0);
    // only the end was given
    let ship = g.task("s").unwrap();
    assert_eq!(ship.start, at(2024, 1, 10, 0));
    assert!(ship.invalid);
}

#[test]
fn chart_json_round_trips_into_a_gantt() {
    let json = r#"{
        "tasks": [
            {"id": "a", "name": "Wire up", "start": "2024-01-01 08:00", "end": "2024-01-01 12:00"},
            {"id": "b", "name": "Test", "start": "2024-01-01 13:00", "end": "2024-01-01 15:00",
             "dependencies": ["a"], "progress": 50}
        ],
        "options": {"view_mode": "Hour"}
    }"#;
    let g = ChartFile::from_json(json).unwrap().into_gantt(dm()).unwrap();
    assert_eq!(g.view_mode(), ViewMode::Hour);
    let a = g.bar("a").unwrap();
    assert_eq!(a.x(), 24.0 * 38.0);
    assert_eq!(a.width(), 4.0 * 38.0);
    let b = g.bar("b").unwrap();
    assert_eq!(b.progress_width, b.width() / 2.0);
    assert_eq!(g.arrows().len(), 1);
}

#[test]
fn pointer_down_on_empty_space_does_nothing() {
    let mut g = chain("2024-01-05", "2024-01-06");
    assert!(!g.pointer_down(Point::new(5.0, 5.0)));
    assert_eq!(g.drag_mode(), DragMode::Idle);
    assert!(g.pointer_move(Point::new(50.0, 5.0)).is_empty());
    assert!(g.pointer_up().is_empty());
}

struct Committed {
    gantt: Gantt<FixedDateMath>,
    live_x: f64,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Drags the single task `a` by `dx` pixels under `mode` and commits the gesture.
fn drag_and_commit(mode: ViewMode, start: &str, end: &str, dx: f64) -> Committed {
    let mut g = Gantt::with_date_math(
        vec![TaskInput::new("a", start, end)],
        Vec::new(),
        GanttOptions::default().with_view_mode(mode),
        dm(),
    )
    .unwrap();
    let bar = g.bar("a").unwrap().clone();
    let grab = Point::new(bar.x() + bar.width() / 2.0, bar.rect.center_y());
    assert!(g.pointer_down(grab));
    g.pointer_move(Point::new(grab.x + dx, grab.y));
    let live_x = g.bar("a").unwrap().x();
    let events = g.pointer_up();
    let [GanttEvent::DateChange { start, end, .. }] = events.as_slice() else {
        panic!("expected one date change in {mode}, got {events:?}");
    };
    Committed {
        live_x,
        start: *start,
        end: *end,
        gantt: g,
    }
}

fn assert_stays_put(c: &Committed) {
    assert_relative_eq!(c.gantt.bar("a").unwrap().x(), c.live_x, epsilon = 1e-6);
}

#[test]
fn hour_view_commit_keeps_the_hour() {
    let c = drag_and_commit(ViewMode::Hour, "2024-01-01 08:00", "2024-01-01 12:00", 38.0);
    assert_eq!(c.live_x, 25.0 * 38.0);
    assert_eq!(c.start, at(2024, 1, 1, 9));
    assert_eq!(c.end, dm().parse("2024-01-01 12:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!((task.start, task.end), (at(2024, 1, 1, 9), at(2024, 1, 1, 13)));
    assert_stays_put(&c);
}

#[test]
fn quarter_day_commit_moves_by_six_hours() {
    let c = drag_and_commit(ViewMode::QuarterDay, "2024-01-01", "2024-01-03", 38.0);
    assert_eq!(c.live_x, 190.0);
    assert_eq!(c.start, at(2024, 1, 1, 6));
    assert_eq!(c.end, dm().parse("2024-01-04 05:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!(task.start, c.start);
    assert_eq!(task.end, at(2024, 1, 3, 6));
    assert_stays_put(&c);
    assert_eq!(c.gantt.bar("a").unwrap().width(), 456.0);
}

#[test]
fn half_day_commit_moves_by_twelve_hours() {
    let c = drag_and_commit(ViewMode::HalfDay, "2024-01-01", "2024-01-03", 38.0);
    assert_eq!(c.live_x, 114.0);
    assert_eq!(c.start, at(2024, 1, 1, 12));
    assert_eq!(c.end, dm().parse("2024-01-04 11:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!((task.start, task.end), (at(2024, 1, 1, 12), at(2024, 1, 3, 12)));
    assert_stays_put(&c);
}

#[test]
fn week_commit_snaps_to_days() {
    // 40px is two of the 20px day steps
    let c = drag_and_commit(ViewMode::Week, "2024-01-01", "2024-01-03", 41.0);
    assert_relative_eq!(c.live_x, 660.0, epsilon = 1e-6);
    assert_eq!(c.start, at(2024, 1, 3, 0));
    assert_eq!(c.end, dm().parse("2024-01-05 23:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!((task.start, task.end), (at(2024, 1, 3, 0), at(2024, 1, 5, 0)));
    assert_stays_put(&c);
}

#[test]
fn month_commit_snaps_to_days() {
    let c = drag_and_commit(ViewMode::Month, "2024-01-01", "2024-01-03", 8.0);
    assert_relative_eq!(c.live_x, 398.0 * 4.0, epsilon = 1e-6);
    assert_eq!(c.start, at(2024, 1, 3, 0));
    assert_eq!(c.end, dm().parse("2024-01-05 23:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!((task.start, task.end), (at(2024, 1, 3, 0), at(2024, 1, 5, 0)));
    assert_stays_put(&c);
}

#[test]
fn max_commit_snaps_to_days() {
    // two-day span over 1000px of usable width: 15000px columns, 500px days
    let c = drag_and_commit(ViewMode::Max, "2024-01-01", "2024-01-03", 500.0);
    assert_eq!(c.gantt.scale().column_width, 15000.0);
    assert_relative_eq!(c.live_x, 397.0 * 500.0, epsilon = 1e-6);
    assert_eq!(c.start, at(2024, 1, 2, 0));
    assert_eq!(c.end, dm().parse("2024-01-04 23:59:59").unwrap());
    let task = c.gantt.task("a").unwrap();
    assert_eq!((task.start, task.end), (at(2024, 1, 2, 0), at(2024, 1, 4, 0)));
    assert_stays_put(&c);
}
