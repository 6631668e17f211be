use chrono::NaiveDateTime;
use tracing::debug;

use crate::date_math::{DateMath, DateUnit};
use crate::error::{GanttError, GanttResult};
use crate::model::{Task, ViewMode};

/// Fixed column width for every view except Max.
const SUB_DAY_COLUMN_WIDTH: f64 = 38.0;
const WEEK_COLUMN_WIDTH: f64 = 140.0;
const MONTH_COLUMN_WIDTH: f64 = 120.0;
/// Horizontal space the Max view leaves around the chart.
const MAX_VIEW_GUTTER: f64 = 200.0;

/// Grid scale derived from the view mode and the task set.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeScale {
    pub view_mode: ViewMode,
    /// Hours covered by one grid column.
    pub step_hours: f64,
    /// Pixels per grid column.
    pub column_width: f64,
    pub gantt_start: NaiveDateTime,
    pub gantt_end: NaiveDateTime,
    /// Column boundaries from `gantt_start` up to the first one at or past `gantt_end`.
    pub dates: Vec<NaiveDateTime>,
}

impl TimeScale {
    pub fn compute(
        view_mode: ViewMode,
        tasks: &[Task],
        viewport_width: f64,
        dm: &impl DateMath,
    ) -> GanttResult<Self> {
        let granularity = calendar_granularity(view_mode);
        let earliest = tasks
            .iter()
            .map(|t| dm.start_of(t.start, granularity))
            .min()
            .ok_or(GanttError::EmptyTaskSet)?;
        let latest = tasks
            .iter()
            .map(|t| {
                if view_mode.is_sub_day() && granularity == DateUnit::Day {
                    // bars keep the hour here, so an end inside a day draws into the next one
                    ceil_to_day(dm.start_of(t.end, DateUnit::Hour), dm)
                } else {
                    dm.start_of(t.end, granularity)
                }
            })
            .max()
            .ok_or(GanttError::EmptyTaskSet)?;

        let (step_hours, column_width) = match view_mode {
            ViewMode::Hour => (1.0, SUB_DAY_COLUMN_WIDTH),
            ViewMode::QuarterDay => (6.0, SUB_DAY_COLUMN_WIDTH),
            ViewMode::HalfDay => (12.0, SUB_DAY_COLUMN_WIDTH),
            ViewMode::Day => (24.0, SUB_DAY_COLUMN_WIDTH),
            ViewMode::Week => (24.0 * 7.0, WEEK_COLUMN_WIDTH),
            ViewMode::Month => (24.0 * 30.0, MONTH_COLUMN_WIDTH),
            ViewMode::Max => {
                if viewport_width <= MAX_VIEW_GUTTER {
                    return Err(GanttError::ViewportTooNarrow {
                        width: viewport_width,
                    });
                }
                let span_days = dm.diff(latest, earliest, DateUnit::Day).max(1) as f64;
                (
                    24.0 * 30.0,
                    (viewport_width - MAX_VIEW_GUTTER).floor() * 30.0 / span_days,
                )
            }
        };

        let (gantt_start, gantt_end) = match view_mode {
            ViewMode::Hour | ViewMode::QuarterDay | ViewMode::HalfDay => (
                dm.add(earliest, -1, DateUnit::Day),
                dm.add(latest, 1, DateUnit::Day),
            ),
            ViewMode::Day => (
                dm.add(earliest, -15, DateUnit::Day),
                dm.add(latest, 15, DateUnit::Day),
            ),
            ViewMode::Week => (
                dm.add(earliest, -1, DateUnit::Month),
                dm.add(latest, 1, DateUnit::Month),
            ),
            ViewMode::Month | ViewMode::Max => (
                dm.add(earliest, -13, DateUnit::Month),
                dm.add(latest, 10, DateUnit::Month),
            ),
        };

        let mut dates = vec![gantt_start];
        let mut current = gantt_start;
        while current < gantt_end {
            current = if view_mode.is_monthly() {
                dm.add(current, 1, DateUnit::Month)
            } else {
                dm.add_hours(current, step_hours)
            };
            dates.push(current);
        }

        debug!(
            %view_mode,
            step_hours,
            column_width,
            %gantt_start,
            %gantt_end,
            columns = dates.len(),
            "computed time scale"
        );

        Ok(Self {
            view_mode,
            step_hours,
            column_width,
            gantt_start,
            gantt_end,
            dates,
        })
    }

    /// Unit task dates are truncated to before layout and write-back.
    /// Columns shorter than a day keep the hour so a snapped move survives a re-layout.
    pub fn granularity(&self) -> DateUnit {
        if self.view_mode.is_sub_day() {
            DateUnit::Hour
        } else {
            DateUnit::Day
        }
    }

    /// Unit the chart bounds and milestone flags are truncated to.
    pub fn calendar_granularity(&self) -> DateUnit {
        calendar_granularity(self.view_mode)
    }

    pub fn normalize(&self, date: NaiveDateTime, dm: &impl DateMath) -> NaiveDateTime {
        dm.start_of(date, self.granularity())
    }

    /// Pixel offset of `date` from the chart start.
    pub fn date_to_x(&self, date: NaiveDateTime, dm: &impl DateMath) -> f64 {
        if self.view_mode.is_monthly() {
            dm.diff(date, self.gantt_start, DateUnit::Day) as f64 * self.column_width / 30.0
        } else {
            self.hours_to_px(dm.diff(date, self.gantt_start, DateUnit::Hour) as f64)
        }
    }

    pub fn hours_to_px(&self, hours: f64) -> f64 {
        hours / self.step_hours * self.column_width
    }

    pub fn px_to_hours(&self, px: f64) -> f64 {
        px / self.column_width * self.step_hours
    }

    /// Total grid width.
    pub fn width(&self) -> f64 {
        self.dates.len() as f64 * self.column_width
    }

    /// Pixel offset of today's column, measured in hours like the bars.
    pub fn today_x(&self, dm: &impl DateMath) -> f64 {
        self.hours_to_px(dm.diff(dm.today(), self.gantt_start, DateUnit::Hour) as f64)
    }

    /// Where a host should scroll to: one column before the oldest task.
    pub fn scroll_position(&self, tasks: &[Task], dm: &impl DateMath) -> f64 {
        let Some(oldest) = tasks.iter().map(|t| self.normalize(t.start, dm)).min() else {
            return 0.0;
        };
        let hours = dm.diff(oldest, self.gantt_start, DateUnit::Hour) as f64;
        self.hours_to_px(hours) - self.column_width
    }
}

fn ceil_to_day(date: NaiveDateTime, dm: &impl DateMath) -> NaiveDateTime {
    let day = dm.start_of(date, DateUnit::Day);
    if day == date {
        day
    } else {
        dm.add(day, 1, DateUnit::Day)
    }
}

fn calendar_granularity(mode: ViewMode) -> DateUnit {
    if mode == ViewMode::Hour {
        DateUnit::Hour
    } else {
        DateUnit::Day
    }
}
