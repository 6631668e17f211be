use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::trace;

use crate::date_math::{DateMath, DateUnit};
use crate::model::{OverdueFlags, Task, TaskKind, ViewMode};
use crate::render::{Point, Rect};

use super::timeline::TimeScale;
use super::LayoutContext;

pub const HANDLE_WIDTH: f64 = 8.0;
/// Labels wider than the bar minus this margin are drawn beside it.
const LABEL_MARGIN: f64 = 16.0;
/// The trailing overdue bar starts this far inside the task bar.
const OVERDUE_OVERLAP: f64 = 3.0;
const PROGRESS_HANDLE_HALF_WIDTH: f64 = 5.0;
const PROGRESS_HANDLE_HEIGHT: f64 = 8.66;
/// How long a finished gesture keeps `action_completed` set.
pub const ACTION_COMPLETED_SECS: i64 = 1;

/// Lateness of a delay indicator relative to the task bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DelayTag {
    /// Nothing to draw.
    #[default]
    NoDelay,
    InTime,
    Late,
}

impl DelayTag {
    fn from_overshoot(overshoot: f64) -> Self {
        if overshoot > 0.0 {
            DelayTag::Late
        } else {
            DelayTag::InTime
        }
    }
}

/// Which task edge the overdue window hangs off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OverdueAnchor {
    #[default]
    None,
    TaskStart,
    TaskEnd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BarTags {
    pub delay_start_cursor: DelayTag,
    pub delay_end_cursor: DelayTag,
    pub delay_bar: DelayTag,
    pub overdue: bool,
}

/// Where to put a bar label once the renderer has measured it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f64,
    pub y: f64,
    /// The label does not fit and sits outside the bar.
    pub outside: bool,
}

/// Pixel geometry of one task under the current scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub task_index: usize,
    pub rect: Rect,
    pub corner_radius: f64,
    pub progress_width: f64,
    pub completion_width: f64,
    pub delay_start_x: Option<f64>,
    pub delay_end_x: Option<f64>,
    pub delay_width: f64,
    pub overdue_x: Option<f64>,
    pub overdue_width: f64,
    pub overdue_anchor: OverdueAnchor,
    pub tags: BarTags,
    pub kind: TaskKind,
    pub invalid: bool,
    /// Row indices of direct dependencies that resolved to bars.
    pub dependencies: Vec<usize>,
    progress: f64,
    completion: f64,
    has_overdue: OverdueFlags,
    action_completed_until: Option<NaiveDateTime>,
}

impl Bar {
    /// Projects `task` onto the grid described by `ctx`.
    pub fn layout(
        task: &Task,
        dependencies: Vec<usize>,
        ctx: &LayoutContext,
        dm: &impl DateMath,
    ) -> Self {
        let scale = &ctx.scale;
        let cw = scale.column_width;
        let norm = |d: NaiveDateTime| scale.normalize(d, dm);
        let allowance = end_allowance_hours(scale.view_mode);

        let start = norm(task.start);
        let end = norm(task.end);
        let x = scale.date_to_x(start, dm);
        let duration = (dm.diff(end, start, DateUnit::Hour) as f64 + allowance) / scale.step_hours;
        let width = cw * duration;

        let delay_start = task.delay.start.map(norm);
        let delay_end = task.delay.end.map(norm);
        let delay_start_x = delay_start.map(|d| scale.date_to_x(d, dm));
        let delay_end_x = delay_end.map(|d| {
            if scale.view_mode.is_monthly() {
                (dm.diff(d, scale.gantt_start, DateUnit::Day) as f64 + 1.0) * cw / 30.0
            } else {
                scale.hours_to_px(dm.diff(d, scale.gantt_start, DateUnit::Hour) as f64 + 24.0)
            }
        });
        let delay_width = match (delay_start, delay_end) {
            (Some(s), Some(e)) => {
                cw * ((dm.diff(e, s, DateUnit::Hour) as f64 + allowance) / scale.step_hours).abs()
            }
            _ => 0.0,
        };

        let overdue_start = task.overdue.start.map(norm);
        let overdue_end = task.overdue.end.map(norm);
        let overdue_x = overdue_start.map(|d| scale.date_to_x(d, dm));
        let overdue_width = match (overdue_start, overdue_end) {
            (Some(s), Some(e)) => {
                let wip_allowance = if allowance > 0.0 && task.has_overdue.wip { 24.0 } else { 0.0 };
                cw * ((dm.diff(e, s, DateUnit::Hour) as f64 + wip_allowance) / scale.step_hours)
                    .abs()
            }
            _ => 0.0,
        };

        let overdue_anchor = match overdue_start {
            Some(os) if dm.diff(os, end, DateUnit::Hour) == 0 => OverdueAnchor::TaskEnd,
            Some(os) if dm.diff(os, start, DateUnit::Hour) == 0 => OverdueAnchor::TaskStart,
            _ => OverdueAnchor::None,
        };
        let overdue = match overdue_anchor {
            OverdueAnchor::TaskEnd => dm.diff(end, ctx.today, DateUnit::Day) < 0,
            OverdueAnchor::TaskStart => dm.diff(start, ctx.today, DateUnit::Day) < 0,
            OverdueAnchor::None => false,
        };

        let mut bar = Self {
            task_index: task.row_index,
            rect: Rect::new(x, ctx.row_y(task.row_index), width, ctx.bar_height),
            corner_radius: ctx.corner_radius,
            progress_width: width * task.progress / 100.0,
            completion_width: width * task.completion / 100.0,
            delay_start_x,
            delay_end_x,
            delay_width,
            overdue_x,
            overdue_width,
            overdue_anchor,
            tags: BarTags {
                overdue,
                ..BarTags::default()
            },
            kind: task.kind.clone(),
            invalid: task.invalid,
            dependencies,
            progress: task.progress,
            completion: task.completion,
            has_overdue: task.has_overdue,
            action_completed_until: None,
        };
        bar.classify_delay();
        bar
    }

    pub fn x(&self) -> f64 {
        self.rect.x
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn end_x(&self) -> f64 {
        self.rect.end_x()
    }

    /// Percent complete as last committed.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn has_delay_bar(&self) -> bool {
        !self.invalid && self.delay_start_x.is_some() && self.delay_width > 0.0
    }

    pub fn has_overdue_bar(&self) -> bool {
        !self.invalid && self.overdue_x.is_some() && self.overdue_width > 0.0
    }

    pub fn overdue_rect(&self) -> Option<Rect> {
        let x = self.overdue_x.filter(|_| self.has_overdue_bar())?;
        Some(Rect::new(x, self.rect.y, self.overdue_width, self.rect.height))
    }

    /// Delay bars are two thirds of the bar height.
    pub fn delay_rect(&self) -> Option<Rect> {
        let x = self.delay_start_x.filter(|_| self.has_delay_bar())?;
        Some(Rect::new(
            x,
            self.rect.y,
            self.delay_width,
            self.rect.height * 2.0 / 3.0,
        ))
    }

    pub fn progress_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y, self.progress_width, self.rect.height)
    }

    pub fn completion_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y, self.completion_width, self.rect.height)
    }

    pub fn left_handle(&self) -> Rect {
        Rect::new(
            self.rect.x + 1.0,
            self.rect.y + 1.0,
            HANDLE_WIDTH,
            self.rect.height - 2.0,
        )
    }

    pub fn right_handle(&self) -> Rect {
        Rect::new(
            self.rect.end_x() - HANDLE_WIDTH - 1.0,
            self.rect.y + 1.0,
            HANDLE_WIDTH,
            self.rect.height - 2.0,
        )
    }

    /// Triangle sitting under the end of the progress bar.
    pub fn progress_handle(&self) -> [Point; 3] {
        let end = self.rect.x + self.progress_width;
        let bottom = self.rect.bottom();
        [
            Point::new(end - PROGRESS_HANDLE_HALF_WIDTH, bottom),
            Point::new(end + PROGRESS_HANDLE_HALF_WIDTH, bottom),
            Point::new(end, bottom - PROGRESS_HANDLE_HEIGHT),
        ]
    }

    /// Bounding box of [`Bar::progress_handle`].
    pub fn progress_handle_rect(&self) -> Rect {
        let end = self.rect.x + self.progress_width;
        Rect::new(
            end - PROGRESS_HANDLE_HALF_WIDTH,
            self.rect.bottom() - PROGRESS_HANDLE_HEIGHT,
            PROGRESS_HANDLE_HALF_WIDTH * 2.0,
            PROGRESS_HANDLE_HEIGHT,
        )
    }

    /// Start and end markers hanging under activity bars.
    pub fn activity_cursors(&self) -> Option<[Vec<Point>; 2]> {
        if self.invalid || !self.kind.has_activity_cursors() {
            return None;
        }
        Some([
            self.activity_cursor(self.rect.x),
            self.activity_cursor(self.rect.end_x()),
        ])
    }

    fn activity_cursor(&self, x: f64) -> Vec<Point> {
        let bottom = self.rect.bottom();
        let dir = if x > self.rect.x { -4.0 } else { 4.0 };
        vec![
            Point::new(x, bottom - 5.0),
            Point::new(x, bottom + 8.0),
            Point::new(x + dir, bottom + 8.0),
            Point::new(x + dir, bottom - 5.0),
        ]
    }

    /// A thin post with a pointer under the bar, marking a delay date.
    pub fn delay_cursor(&self, x: f64) -> Vec<Point> {
        let top = self.rect.y;
        let bottom = self.rect.bottom();
        vec![
            Point::new(x, bottom),
            Point::new(x - 2.0, bottom),
            Point::new(x - 2.0, top),
            Point::new(x, top),
            Point::new(x, bottom),
            Point::new(x - 1.0, bottom),
            Point::new(x - 4.75, bottom + 6.5),
            Point::new(x + 2.75, bottom + 6.5),
            Point::new(x - 1.0, bottom),
        ]
    }

    pub fn label_anchor(&self, label_width: f64) -> LabelAnchor {
        let outside = label_width > self.rect.width - LABEL_MARGIN;
        LabelAnchor {
            x: if outside {
                self.rect.end_x() + 5.0
            } else {
                self.rect.x + self.rect.width / 2.0
            },
            y: self.rect.center_y(),
            outside,
        }
    }

    /// Status text sits above the bar's left edge.
    pub fn status_anchor(&self, status_width: f64) -> LabelAnchor {
        let outside = status_width > self.rect.width - LABEL_MARGIN;
        LabelAnchor {
            x: if outside { self.rect.x } else { self.rect.x + 5.0 },
            y: self.rect.y - self.rect.height / 4.0,
            outside,
        }
    }

    pub fn action_completed(&self, now: NaiveDateTime) -> bool {
        self.action_completed_until.is_some_and(|until| now < until)
    }

    fn classify_delay(&mut self) {
        let x = self.rect.x;
        let end = self.rect.end_x();
        let has_bar = self.delay_start_x.is_some() && self.delay_width > 0.0;

        self.tags.delay_start_cursor = match self.delay_start_x {
            Some(ds) if !has_bar => DelayTag::from_overshoot(ds - x),
            _ => DelayTag::NoDelay,
        };
        self.tags.delay_end_cursor = match self.delay_end_x {
            Some(de) if !has_bar => DelayTag::from_overshoot(de - end),
            _ => DelayTag::NoDelay,
        };
        self.tags.delay_bar = match self.delay_start_x {
            Some(ds) if has_bar => DelayTag::from_overshoot(ds + self.delay_width - end),
            _ => DelayTag::NoDelay,
        };
    }

    /// Re-derives everything hanging off `x`/`width` after a live move.
    fn refresh_after_move(&mut self, ctx: &LayoutContext) {
        self.progress_width = self.rect.width * self.progress / 100.0;
        self.completion_width = self.rect.width * self.completion / 100.0;
        self.classify_delay();

        if self.has_overdue_bar() {
            if self.has_overdue.to_start {
                self.overdue_x = Some(self.rect.x);
                self.overdue_width = (ctx.today_x - self.rect.x).max(0.0);
            } else {
                let today_end = ctx.today_x + ctx.scale.hours_to_px(24.0);
                self.overdue_x = Some(self.rect.end_x() - OVERDUE_OVERLAP);
                self.overdue_width = (today_end - self.rect.end_x() + OVERDUE_OVERLAP).max(0.0);
            }
        }
        self.tags.overdue = match self.overdue_anchor {
            OverdueAnchor::TaskEnd => self.rect.end_x() - ctx.today_x < 0.0,
            OverdueAnchor::TaskStart => self.rect.x - ctx.today_x < 0.0,
            OverdueAnchor::None => false,
        };
    }
}

/// Extra hours added to a span so non-hour views draw the end day inclusively.
pub fn end_allowance_hours(mode: ViewMode) -> f64 {
    if mode == ViewMode::Hour {
        0.0
    } else {
        24.0
    }
}

/// Dates read back from a bar's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoveredDates {
    pub start: NaiveDateTime,
    /// One second before the exclusive end, so a two-day bar ends on day one at 23:59:59.
    pub end: NaiveDateTime,
}

impl RecoveredDates {
    /// Inverse of the layout transform.
    pub fn from_rect(rect: &Rect, scale: &TimeScale, dm: &impl DateMath) -> Self {
        let start = dm.add_hours(scale.gantt_start, scale.px_to_hours(rect.x));
        let end = dm.add_hours(start, scale.px_to_hours(rect.width));
        Self {
            start,
            end: dm.add(end, -1, DateUnit::Second),
        }
    }

    /// The start/end a task stores so that laying it out again reproduces the bar.
    /// The stored end drops the inclusive end-day allowance the layout adds back.
    pub fn task_span(&self, scale: &TimeScale, dm: &impl DateMath) -> (NaiveDateTime, NaiveDateTime) {
        let start = scale.normalize(self.start, dm);
        let exclusive_end = dm.add(self.end, 1, DateUnit::Second);
        let end = dm.add_hours(exclusive_end, -end_allowance_hours(scale.view_mode));
        (start, scale.normalize(end, dm))
    }
}

/// A requested change to a bar's position or size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BarUpdate {
    pub x: Option<f64>,
    pub width: Option<f64>,
}

impl BarUpdate {
    pub fn x(x: f64) -> Self {
        Self {
            x: Some(x),
            width: None,
        }
    }

    pub fn width(width: f64) -> Self {
        Self {
            x: None,
            width: Some(width),
        }
    }

    pub fn x_and_width(x: f64, width: f64) -> Self {
        Self {
            x: Some(x),
            width: Some(width),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateResult {
    Applied,
    /// The new `x` would start before a dependency ends.
    BeforeDependency { floor: f64 },
    /// The new width is under one grid column.
    TooNarrow,
    UnknownBar,
}

impl UpdateResult {
    pub fn is_applied(self) -> bool {
        self == UpdateResult::Applied
    }
}

/// Bars indexed by task row; the only place live geometry is mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarArena {
    bars: Vec<Bar>,
}

impl BarArena {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// Rightmost end of the bar's direct dependencies.
    pub fn dependency_floor(&self, index: usize) -> Option<f64> {
        self.bars
            .get(index)?
            .dependencies
            .iter()
            .filter_map(|&dep| self.bars.get(dep))
            .map(Bar::end_x)
            .reduce(f64::max)
    }

    /// Applies `update` unless it breaks the dependency floor or minimum width.
    pub fn update_position(
        &mut self,
        index: usize,
        update: BarUpdate,
        ctx: &LayoutContext,
    ) -> UpdateResult {
        if index >= self.bars.len() {
            return UpdateResult::UnknownBar;
        }
        if let Some(x) = update.x {
            if let Some(floor) = self.dependency_floor(index) {
                if x < floor {
                    trace!(index, x, floor, "rejecting move before dependency end");
                    return UpdateResult::BeforeDependency { floor };
                }
            }
        }
        if let Some(width) = update.width {
            if width < ctx.column_width() {
                trace!(index, width, "rejecting resize below one column");
                return UpdateResult::TooNarrow;
            }
        }

        let bar = &mut self.bars[index];
        if let Some(x) = update.x {
            bar.rect.x = x;
        }
        if let Some(width) = update.width {
            bar.rect.width = width;
        }
        bar.refresh_after_move(ctx);
        UpdateResult::Applied
    }

    /// Puts a bar back to a snapshot taken before a gesture.
    pub fn restore(&mut self, index: usize, rect: Rect, progress_width: f64, ctx: &LayoutContext) {
        if let Some(bar) = self.bars.get_mut(index) {
            bar.rect = rect;
            bar.refresh_after_move(ctx);
            bar.progress_width = progress_width;
        }
    }

    /// Sets the live progress width, clamped to the bar; returns the applied width.
    pub fn set_progress_width(&mut self, index: usize, width: f64) -> Option<f64> {
        let bar = self.bars.get_mut(index)?;
        bar.progress_width = width.clamp(0.0, bar.rect.width);
        Some(bar.progress_width)
    }

    /// Commits a new progress percentage into the bar.
    pub fn set_progress(&mut self, index: usize, progress: f64) {
        if let Some(bar) = self.bars.get_mut(index) {
            bar.progress = progress;
            bar.progress_width = bar.rect.width * progress / 100.0;
        }
    }

    /// Swaps in a freshly laid out bar after its task was written back.
    pub fn replace(&mut self, index: usize, bar: Bar) {
        if let Some(slot) = self.bars.get_mut(index) {
            *slot = bar;
        }
    }

    pub fn mark_action_completed(&mut self, index: usize, until: NaiveDateTime) {
        if let Some(bar) = self.bars.get_mut(index) {
            bar.action_completed_until = Some(until);
        }
    }
}

/// `floor(progress_width / width * 100)`.
pub fn progress_from_width(progress_width: f64, bar_width: f64) -> f64 {
    if bar_width <= 0.0 {
        return 0.0;
    }
    (progress_width / bar_width * 100.0).floor()
}
