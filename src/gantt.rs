//! The engine: owns the task set, the derived layout and the active gesture.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::date_math::{DateMath, DateUnit, SystemDateMath};
use crate::error::{GanttError, GanttResult};
use crate::graph::DependencyGraph;
use crate::interaction::{DragController, DragMode, HitRegion, MoveOutcome};
use crate::layout::bar::{progress_from_width, RecoveredDates, ACTION_COMPLETED_SECS};
use crate::layout::{Arrow, ArrowRouter, Bar, BarArena, Flag, Grid, LayoutContext, TimeScale};
use crate::model::{GanttOptions, Milestone, MilestoneInput, Project, Task, TaskId, TaskInput, ViewMode};
use crate::render::{Point, Renderer};

/// Notifications for the host, returned by the call that caused them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GanttEvent {
    DateChange {
        task_id: TaskId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    ProgressChange {
        task_id: TaskId,
        progress: f64,
    },
    ViewChange(ViewMode),
}

/// Layout and interaction engine for one chart.
#[derive(Debug, Clone)]
pub struct Gantt<D: DateMath = SystemDateMath> {
    options: GanttOptions,
    project: Project,
    graph: DependencyGraph,
    ctx: LayoutContext,
    grid: Grid,
    bars: BarArena,
    arrows: Vec<Arrow>,
    flags: Vec<Flag>,
    router: ArrowRouter,
    drag: DragController,
    dates: D,
}

impl Gantt<SystemDateMath> {
    pub fn new(
        tasks: Vec<TaskInput>,
        milestones: Vec<MilestoneInput>,
        options: GanttOptions,
    ) -> GanttResult<Self> {
        Self::with_date_math(tasks, milestones, options, SystemDateMath)
    }
}

impl<D: DateMath> Gantt<D> {
    pub fn with_date_math(
        tasks: Vec<TaskInput>,
        milestones: Vec<MilestoneInput>,
        options: GanttOptions,
        dates: D,
    ) -> GanttResult<Self> {
        options.validate()?;
        if tasks.is_empty() {
            return Err(GanttError::EmptyTaskSet);
        }
        let project = Project::ingest(tasks, milestones, &dates);
        let graph = DependencyGraph::build(&project.tasks);
        let (ctx, grid, bars, arrows, flags) = layout_all(&options, &project, &dates)?;
        info!(
            tasks = project.tasks.len(),
            milestones = project.milestones.len(),
            view_mode = %options.view_mode,
            "gantt created"
        );
        Ok(Self {
            router: ArrowRouter::new(options.padding),
            options,
            project,
            graph,
            ctx,
            grid,
            bars,
            arrows,
            flags,
            drag: DragController::new(),
            dates,
        })
    }

    /// Replaces the task set, keeping milestones and options, and lays everything out again.
    pub fn refresh(&mut self, tasks: Vec<TaskInput>) -> GanttResult<()> {
        if tasks.is_empty() {
            return Err(GanttError::EmptyTaskSet);
        }
        let mut project = Project::ingest(tasks, Vec::new(), &self.dates);
        project.milestones = self.project.milestones.clone();
        let graph = DependencyGraph::build(&project.tasks);
        let (ctx, grid, bars, arrows, flags) = layout_all(&self.options, &project, &self.dates)?;
        self.project = project;
        self.graph = graph;
        self.install(ctx, grid, bars, arrows, flags);
        debug!(tasks = self.project.tasks.len(), "task set refreshed");
        Ok(())
    }

    /// Recomputes the scale and every geometry under `mode`. Task data is untouched.
    pub fn change_view_mode(&mut self, mode: ViewMode) -> GanttResult<GanttEvent> {
        let options = self.options.clone().with_view_mode(mode);
        let (ctx, grid, bars, arrows, flags) = layout_all(&options, &self.project, &self.dates)?;
        self.options = options;
        self.install(ctx, grid, bars, arrows, flags);
        debug!(%mode, column_width = self.ctx.scale.column_width, "view mode changed");
        Ok(GanttEvent::ViewChange(mode))
    }

    /// Updates the viewport the Max view and filler rows are sized against.
    /// An active gesture is cancelled first, since the bars it holds are rebuilt.
    pub fn set_viewport(&mut self, width: f64, height: f64) -> GanttResult<()> {
        let options = self.options.clone().with_viewport(width, height);
        options.validate()?;
        if !self.drag.is_idle() {
            debug!(width, height, "viewport changed mid-gesture, cancelling it");
            self.cancel();
        }
        let (ctx, grid, bars, arrows, flags) = layout_all(&options, &self.project, &self.dates)?;
        self.options = options;
        self.install(ctx, grid, bars, arrows, flags);
        Ok(())
    }

    fn install(
        &mut self,
        ctx: LayoutContext,
        grid: Grid,
        bars: BarArena,
        arrows: Vec<Arrow>,
        flags: Vec<Flag>,
    ) {
        self.drag = DragController::new();
        self.ctx = ctx;
        self.grid = grid;
        self.bars = bars;
        self.arrows = arrows;
        self.flags = flags;
        self.router = ArrowRouter::new(self.options.padding);
    }

    /// Draws the grid, then bars, arrows and milestone flags.
    pub fn render<R: Renderer>(&self, renderer: &mut R) {
        renderer.draw_grid(&self.grid);
        for (bar, task) in self.bars.iter().zip(&self.project.tasks) {
            renderer.draw_bar(bar, task);
        }
        for arrow in &self.arrows {
            renderer.draw_arrow(arrow);
        }
        for (flag, milestone) in self.flags.iter().zip(&self.project.milestones) {
            renderer.draw_flag(flag, milestone);
        }
    }

    /// Pushes the bars and arrows a move touched to a retained renderer.
    pub fn repaint<R: Renderer>(&self, outcome: &MoveOutcome, renderer: &mut R) {
        for &i in &outcome.bars {
            if let (Some(bar), Some(task)) = (self.bars.get(i), self.project.tasks.get(i)) {
                renderer.update_bar(bar, task);
            }
        }
        for &i in &outcome.arrows {
            if let Some(arrow) = self.arrows.get(i) {
                renderer.update_arrow(arrow);
            }
        }
    }

    /// The bar and region under `point`, topmost bar first. Invalid bars only report their body.
    pub fn hit_test(&self, point: Point) -> Option<(usize, HitRegion)> {
        self.bars
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, bar)| hit_bar(bar, point).map(|region| (i, region)))
    }

    /// Starts a gesture on whatever is under `point`.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        match self.hit_test(point) {
            Some((index, region)) => self.pointer_down_on(index, region, point.x),
            None => false,
        }
    }

    /// Starts a gesture for hosts that hit-test themselves.
    pub fn pointer_down_on(&mut self, index: usize, region: HitRegion, pointer_x: f64) -> bool {
        self.drag
            .begin(region, index, pointer_x, &self.bars, &self.project, &self.graph)
    }

    pub fn pointer_move(&mut self, point: Point) -> MoveOutcome {
        let bars = self.drag.update(point.x, &mut self.bars, &self.ctx);
        let arrows = self.router.reroute(&mut self.arrows, &self.bars, &bars);
        MoveOutcome { bars, arrows }
    }

    /// Commits the gesture: writes dates or progress back into the tasks and returns one event per affected task.
    pub fn pointer_up(&mut self) -> Vec<GanttEvent> {
        let Some(finished) = self.drag.finish() else {
            return Vec::new();
        };
        let until = self
            .dates
            .add(self.dates.now(), ACTION_COMPLETED_SECS, DateUnit::Second);
        let mut events = Vec::with_capacity(finished.affected.len());

        for &i in &finished.affected {
            let Some(bar) = self.bars.get(i) else {
                continue;
            };
            let Some(task) = self.project.tasks.get_mut(i) else {
                continue;
            };
            if finished.mode == DragMode::ResizingProgress {
                let progress = progress_from_width(bar.progress_width, bar.width());
                task.progress = progress;
                self.bars.set_progress(i, progress);
                events.push(GanttEvent::ProgressChange {
                    task_id: task.id.clone(),
                    progress,
                });
            } else {
                let recovered = RecoveredDates::from_rect(&bar.rect, &self.ctx.scale, &self.dates);
                let (start, end) = recovered.task_span(&self.ctx.scale, &self.dates);
                task.start = start;
                task.end = end;
                events.push(GanttEvent::DateChange {
                    task_id: task.id.clone(),
                    start: recovered.start,
                    end: recovered.end,
                });
                let deps = self.project.resolved_dependencies(&self.project.tasks[i]);
                let relaid = Bar::layout(&self.project.tasks[i], deps, &self.ctx, &self.dates);
                self.bars.replace(i, relaid);
            }
            self.bars.mark_action_completed(i, until);
        }
        self.router
            .reroute(&mut self.arrows, &self.bars, &finished.affected);
        debug!(events = events.len(), "gesture written back");
        events
    }

    /// Abandons the active gesture, restoring the geometry it started from.
    pub fn cancel(&mut self) -> MoveOutcome {
        let bars = self.drag.cancel(&mut self.bars, &self.ctx);
        let arrows = self.router.reroute(&mut self.arrows, &self.bars, &bars);
        MoveOutcome { bars, arrows }
    }

    /// Whether bar `index` finished a gesture less than a second ago.
    pub fn is_action_completed(&self, index: usize) -> bool {
        self.bars
            .get(index)
            .is_some_and(|bar| bar.action_completed(self.dates.now()))
    }

    /// Horizontal scroll offset that brings the oldest task into view.
    pub fn scroll_position(&self) -> f64 {
        self.ctx.scale.scroll_position(&self.project.tasks, &self.dates)
    }

    pub fn drag_mode(&self) -> DragMode {
        self.drag.mode()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.options.view_mode
    }

    pub fn options(&self) -> &GanttOptions {
        &self.options
    }

    pub fn tasks(&self) -> &[Task] {
        &self.project.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.project.task(id)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.project.milestones
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn scale(&self) -> &TimeScale {
        &self.ctx.scale
    }

    pub fn layout(&self) -> &LayoutContext {
        &self.ctx
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn bars(&self) -> &BarArena {
        &self.bars
    }

    pub fn bar(&self, id: &str) -> Option<&Bar> {
        self.project.task_index(id).and_then(|i| self.bars.get(i))
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn date_math(&self) -> &D {
        &self.dates
    }

    pub fn date_math_mut(&mut self) -> &mut D {
        &mut self.dates
    }
}

type Layout = (LayoutContext, Grid, BarArena, Vec<Arrow>, Vec<Flag>);

fn layout_all(options: &GanttOptions, project: &Project, dates: &impl DateMath) -> GanttResult<Layout> {
    let scale = TimeScale::compute(
        options.view_mode,
        &project.tasks,
        options.viewport_width,
        dates,
    )?;
    let ctx = LayoutContext::new(options, scale, project.tasks.len(), dates);
    let grid = Grid::layout(&ctx, dates);
    let bars = BarArena::new(
        project
            .tasks
            .iter()
            .map(|task| Bar::layout(task, project.resolved_dependencies(task), &ctx, dates))
            .collect(),
    );
    let arrows = ArrowRouter::new(options.padding).route_all(&bars);
    let flags = project
        .milestones
        .iter()
        .enumerate()
        .map(|(i, m)| Flag::layout(m, i, &ctx, dates))
        .collect();
    Ok((ctx, grid, bars, arrows, flags))
}

fn hit_bar(bar: &Bar, point: Point) -> Option<HitRegion> {
    if !bar.rect.contains(point) && !bar.progress_handle_rect().contains(point) {
        return None;
    }
    if bar.invalid {
        return bar.rect.contains(point).then_some(HitRegion::Body);
    }
    if bar.progress_handle_rect().contains(point) {
        Some(HitRegion::ProgressHandle)
    } else if bar.left_handle().contains(point) {
        Some(HitRegion::LeftHandle)
    } else if bar.right_handle().contains(point) {
        Some(HitRegion::RightHandle)
    } else {
        Some(HitRegion::Body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::FixedDateMath;
    use crate::render::{RecordingRenderer, RenderCall};

    fn dm() -> FixedDateMath {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        FixedDateMath::new(now)
    }

    fn gantt() -> Gantt<FixedDateMath> {
        Gantt::with_date_math(
            vec![
                TaskInput::new("a", "2024-01-01", "2024-01-03").with_progress(20.0),
                TaskInput::new("b", "2024-01-05", "2024-01-06").with_dependencies("a"),
            ],
            vec![MilestoneInput::new("launch", "2024-01-10")],
            GanttOptions::default(),
            dm(),
        )
        .unwrap()
    }

    #[test]
    fn empty_task_set_is_fatal() {
        let err = Gantt::with_date_math(Vec::new(), Vec::new(), GanttOptions::default(), dm());
        assert!(matches!(err, Err(GanttError::EmptyTaskSet)));
    }

    #[test]
    fn render_draws_everything_once() {
        let g = gantt();
        let mut r = RecordingRenderer::default();
        g.render(&mut r);
        assert!(matches!(r.calls[0], RenderCall::Grid { rows: 2, .. }));
        let bars = r.calls.iter().filter(|c| matches!(c, RenderCall::Bar { .. })).count();
        assert_eq!(bars, 2);
        assert!(r.calls.contains(&RenderCall::Arrow { from: 0, to: 1 }));
        assert!(matches!(r.calls.last(), Some(RenderCall::Flag { .. })));
    }

    #[test]
    fn hit_test_finds_handles_and_body() {
        let g = gantt();
        let bar = g.bar("b").unwrap().clone();
        let y = bar.rect.center_y();
        assert_eq!(g.hit_test(Point::new(bar.x() + 3.0, y)), Some((1, HitRegion::LeftHandle)));
        assert_eq!(g.hit_test(Point::new(bar.end_x() - 3.0, y)), Some((1, HitRegion::RightHandle)));
        assert_eq!(g.hit_test(Point::new(bar.x() + 30.0, y)), Some((1, HitRegion::Body)));
        assert_eq!(g.hit_test(Point::new(bar.x() - 30.0, y)), None);

        let a = g.bar("a").unwrap();
        let tip = a.progress_handle()[2];
        assert_eq!(g.hit_test(Point::new(tip.x, tip.y + 2.0)), Some((0, HitRegion::ProgressHandle)));
    }

    #[test]
    fn drag_commit_writes_back_and_emits() {
        let mut g = gantt();
        let bar = g.bar("b").unwrap().clone();
        let y = bar.rect.center_y();
        assert!(g.pointer_down(Point::new(bar.x() + 30.0, y)));
        assert_eq!(g.drag_mode(), DragMode::Dragging);
        let outcome = g.pointer_move(Point::new(bar.x() + 30.0 + 38.0, y));
        assert_eq!(outcome.bars, vec![1]);
        assert_eq!(outcome.arrows, vec![0]);

        let events = g.pointer_up();
        let start = dm().parse("2024-01-06").unwrap();
        let end = dm().parse("2024-01-07 23:59:59").unwrap();
        assert_eq!(
            events,
            vec![GanttEvent::DateChange {
                task_id: "b".into(),
                start,
                end,
            }]
        );
        let task = g.task("b").unwrap();
        assert_eq!(task.start, start);
        assert_eq!(task.end, dm().parse("2024-01-07").unwrap());
        assert_eq!(g.bar("b").unwrap().x(), bar.x() + 38.0);
        assert!(g.is_action_completed(1));
        assert!(!g.is_action_completed(0));

        g.date_math_mut().set_now(dm().now() + chrono::Duration::seconds(2));
        assert!(!g.is_action_completed(1));
    }

    #[test]
    fn progress_commit_truncates() {
        let mut g = gantt();
        let a = g.bar("a").unwrap().clone();
        let tip = a.progress_handle()[2];
        assert!(g.pointer_down(Point::new(tip.x, tip.y + 2.0)));
        g.pointer_move(Point::new(tip.x + 20.0, tip.y + 2.0));
        let events = g.pointer_up();
        // 22.8 + 20 over 114
        assert_eq!(
            events,
            vec![GanttEvent::ProgressChange {
                task_id: "a".into(),
                progress: 37.0,
            }]
        );
        assert_eq!(g.task("a").unwrap().progress, 37.0);
    }

    #[test]
    fn view_change_keeps_tasks() {
        let mut g = gantt();
        let before = g.tasks().to_vec();
        let event = g.change_view_mode(ViewMode::Week).unwrap();
        assert_eq!(event, GanttEvent::ViewChange(ViewMode::Week));
        assert_eq!(g.scale().column_width, 140.0);
        assert_eq!(g.tasks(), before.as_slice());
    }

    #[test]
    fn narrow_viewport_rejects_max_view_and_keeps_state() {
        let mut g = gantt();
        g.set_viewport(150.0, 0.0).unwrap();
        assert!(matches!(
            g.change_view_mode(ViewMode::Max),
            Err(GanttError::ViewportTooNarrow { .. })
        ));
        assert_eq!(g.view_mode(), ViewMode::Day);
    }

    #[test]
    fn cancel_returns_to_idle_without_events() {
        let mut g = gantt();
        let bar = g.bar("a").unwrap().clone();
        g.pointer_down(Point::new(bar.x() + 30.0, bar.rect.center_y()));
        g.pointer_move(Point::new(bar.x() + 30.0 + 76.0, bar.rect.center_y()));
        let outcome = g.cancel();
        assert_eq!(outcome.bars, vec![0, 1]);
        assert_eq!(g.drag_mode(), DragMode::Idle);
        assert!(g.pointer_up().is_empty());
        assert_eq!(g.bar("a").unwrap().rect, bar.rect);
    }

    #[test]
    fn resizing_the_viewport_mid_gesture_cancels_it() {
        let mut g = gantt();
        let before = g.tasks().to_vec();
        let bar = g.bar("a").unwrap().clone();
        g.pointer_down(Point::new(bar.x() + 30.0, bar.rect.center_y()));
        g.pointer_move(Point::new(bar.x() + 30.0 + 76.0, bar.rect.center_y()));
        g.set_viewport(1600.0, 400.0).unwrap();
        assert_eq!(g.drag_mode(), DragMode::Idle);
        assert!(g.pointer_up().is_empty());
        assert_eq!(g.tasks(), before.as_slice());
        assert_eq!(g.bar("a").unwrap().x(), bar.x());
    }
}
