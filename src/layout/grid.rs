//! Background grid, column ticks, header labels and today's highlight.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::date_math::{DateMath, DateUnit};
use crate::model::ViewMode;
use crate::render::{Point, Rect};

use super::LayoutContext;

/// Distance between the lower and upper header label baselines.
const UPPER_LABEL_RISE: f64 = 25.0;
const HEADER_EXTRA_HEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tick {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    /// Month, first week or quarter boundary depending on the view.
    pub thick: bool,
}

/// One row slot; `line_y` is the separator under it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridRow {
    pub rect: Rect,
    pub line_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderText {
    pub text: String,
    pub anchor: Point,
}

/// Header text for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateLabel {
    pub date: NaiveDateTime,
    /// Empty when the column repeats the previous column's unit.
    pub lower: HeaderText,
    pub upper: Option<HeaderText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub background: Rect,
    pub header: Rect,
    pub rows: Vec<GridRow>,
    pub ticks: Vec<Tick>,
    pub today_highlight: Option<Rect>,
    pub labels: Vec<DateLabel>,
}

impl Grid {
    pub fn layout(ctx: &LayoutContext, dm: &impl DateMath) -> Self {
        let scale = &ctx.scale;
        let width = scale.width();
        let row_height = ctx.row_height();
        let top = ctx.header_height + ctx.padding / 2.0;

        let rows = (0..ctx.rows_drawn)
            .map(|i| {
                let y = top + i as f64 * row_height;
                GridRow {
                    rect: Rect::new(0.0, y, width, row_height),
                    line_y: y + row_height,
                }
            })
            .collect();

        let tick_height = row_height * ctx.rows_drawn as f64;
        let mut tick_x = 0.0;
        let mut ticks = Vec::with_capacity(scale.dates.len());
        for date in &scale.dates {
            ticks.push(Tick {
                x: tick_x,
                y: top,
                height: tick_height,
                thick: is_thick(scale.view_mode, *date),
            });
            tick_x += if scale.view_mode.is_monthly() {
                dm.days_in_month(*date) as f64 * scale.column_width / 30.0
            } else {
                scale.column_width
            };
        }

        Self {
            background: Rect::new(0.0, 0.0, width, ctx.grid_height()),
            header: Rect::new(0.0, 0.0, width, ctx.header_height + HEADER_EXTRA_HEIGHT),
            rows,
            ticks,
            today_highlight: today_highlight(ctx, dm),
            labels: date_labels(ctx, dm),
        }
    }

    pub fn width(&self) -> f64 {
        self.background.width
    }
}

fn is_thick(mode: ViewMode, date: NaiveDateTime) -> bool {
    match mode {
        ViewMode::Day => date.day() == 1,
        ViewMode::Week => date.day() < 8,
        ViewMode::Month | ViewMode::Max => date.month() % 3 == 0,
        _ => false,
    }
}

fn today_highlight(ctx: &LayoutContext, dm: &impl DateMath) -> Option<Rect> {
    let scale = &ctx.scale;
    let cw = scale.column_width;
    let (anchor, width) = match scale.view_mode {
        ViewMode::Hour => (dm.start_of(dm.now(), DateUnit::Hour), cw),
        ViewMode::Day => (ctx.today, cw),
        ViewMode::Week => (ctx.today, cw / 7.0),
        ViewMode::Month | ViewMode::Max => (ctx.today, cw / dm.days_in_month(ctx.today) as f64),
        ViewMode::QuarterDay | ViewMode::HalfDay => return None,
    };
    let x = scale.hours_to_px(dm.diff(anchor, scale.gantt_start, DateUnit::Hour) as f64);
    let height = ctx.row_height() * ctx.rows_drawn as f64 + ctx.header_height + ctx.padding / 2.0;
    Some(Rect::new(x, 0.0, width, height))
}

fn date_labels(ctx: &LayoutContext, dm: &impl DateMath) -> Vec<DateLabel> {
    let scale = &ctx.scale;
    let cw = scale.column_width;
    let mode = scale.view_mode;
    let (lower_dx, upper_dx) = match mode {
        ViewMode::Hour => (cw / 4.0, 0.0),
        ViewMode::QuarterDay => (cw * 2.0, 0.0),
        ViewMode::HalfDay => (cw, 0.0),
        ViewMode::Day => (cw / 4.0, cw * 15.0),
        ViewMode::Week => (0.0, cw * 2.0),
        ViewMode::Month | ViewMode::Max => (cw / 3.0, cw * 6.0),
    };
    let lower_y = ctx.header_height;
    let upper_y = ctx.header_height - UPPER_LABEL_RISE;

    let mut labels = Vec::with_capacity(scale.dates.len());
    let mut previous: Option<NaiveDateTime> = None;
    for (i, &date) in scale.dates.iter().enumerate() {
        let (lower, upper) = label_texts(mode, date, previous, dm);
        let x = i as f64 * cw;
        labels.push(DateLabel {
            date,
            lower: HeaderText {
                text: lower,
                anchor: Point::new(x + lower_dx, lower_y),
            },
            upper: upper.filter(|t| !t.is_empty()).map(|text| HeaderText {
                text,
                anchor: Point::new(x + upper_dx, upper_y),
            }),
        });
        previous = Some(date);
    }
    labels
}

fn label_texts(
    mode: ViewMode,
    date: NaiveDateTime,
    previous: Option<NaiveDateTime>,
    dm: &impl DateMath,
) -> (String, Option<String>) {
    // the first column has no predecessor and shows every unit
    let new_day = previous.map_or(true, |p| p.day() != date.day());
    let new_month = previous.map_or(true, |p| p.month() != date.month());
    let new_year = previous.map_or(true, |p| p.year() != date.year());
    let fmt = |pattern: &str| dm.format(date, pattern);
    let day_or_day_month = || {
        if new_month {
            fmt("%-d %b")
        } else {
            fmt("%-d")
        }
    };

    match mode {
        ViewMode::Hour | ViewMode::HalfDay => (fmt("%H"), new_day.then(day_or_day_month)),
        ViewMode::QuarterDay => (fmt("%H"), new_day.then(|| fmt("%-d %b"))),
        ViewMode::Day => (
            if new_day { fmt("%-d") } else { String::new() },
            new_month.then(|| fmt("%B")),
        ),
        ViewMode::Week => (day_or_day_month(), new_month.then(|| fmt("%B"))),
        ViewMode::Month => (fmt("%B"), new_year.then(|| fmt("%Y"))),
        ViewMode::Max => (
            if date.month() % 3 == 0 {
                fmt("%m")
            } else {
                String::new()
            },
            new_year.then(|| fmt("%Y")),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::FixedDateMath;
    use crate::layout::TimeScale;
    use crate::model::{GanttOptions, Project, TaskInput};

    fn dm() -> FixedDateMath {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        FixedDateMath::new(now)
    }

    fn grid(mode: ViewMode, viewport_height: f64) -> (Grid, LayoutContext) {
        let project = Project::ingest(
            vec![
                TaskInput::new("a", "2024-01-01", "2024-01-03"),
                TaskInput::new("b", "2024-01-05", "2024-01-09"),
            ],
            Vec::new(),
            &dm(),
        );
        let options = GanttOptions::default()
            .with_view_mode(mode)
            .with_viewport(1200.0, viewport_height);
        let scale = TimeScale::compute(mode, &project.tasks, 1200.0, &dm()).unwrap();
        let ctx = LayoutContext::new(&options, scale, project.tasks.len(), &dm());
        (Grid::layout(&ctx, &dm()), ctx)
    }

    #[test]
    fn one_row_per_task_without_viewport_height() {
        let (grid, ctx) = grid(ViewMode::Day, 0.0);
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].rect.y, 59.0);
        assert_eq!(grid.rows[1].rect.y, 59.0 + 38.0);
        assert_eq!(grid.background.height, ctx.grid_height());
        assert_eq!(grid.header.height, 60.0);
    }

    #[test]
    fn filler_rows_cover_the_viewport() {
        let (grid, _) = grid(ViewMode::Day, 400.0);
        assert_eq!(grid.rows.len(), 11);
        assert_eq!(grid.ticks[0].height, 11.0 * 38.0);
    }

    #[test]
    fn day_ticks_are_thick_on_the_first() {
        let (grid, ctx) = grid(ViewMode::Day, 0.0);
        assert_eq!(grid.ticks.len(), ctx.scale.dates.len());
        let first_of_month = ctx
            .scale
            .dates
            .iter()
            .position(|d| d.day() == 1)
            .unwrap();
        assert!(grid.ticks[first_of_month].thick);
        assert!(!grid.ticks[first_of_month + 1].thick);
        assert_eq!(grid.ticks[3].x, 3.0 * 38.0);
    }

    #[test]
    fn month_ticks_follow_month_lengths() {
        let (grid, _) = grid(ViewMode::Month, 0.0);
        // starts 2022-12-01: December has 31 days
        assert_eq!(grid.ticks[1].x, 31.0 * 120.0 / 30.0);
        assert!(grid.ticks[0].thick);
        assert!(!grid.ticks[1].thick);
    }

    #[test]
    fn today_highlight_width_depends_on_view() {
        let (day, ctx) = grid(ViewMode::Day, 0.0);
        let rect = day.today_highlight.unwrap();
        assert_eq!(rect.width, 38.0);
        assert_eq!(rect.x, ctx.today_x);
        let (week, _) = grid(ViewMode::Week, 0.0);
        assert_eq!(week.today_highlight.unwrap().width, 20.0);
        let (month, _) = grid(ViewMode::Month, 0.0);
        assert_eq!(month.today_highlight.unwrap().width, 120.0 / 31.0);
        let (quarter, _) = grid(ViewMode::QuarterDay, 0.0);
        assert!(quarter.today_highlight.is_none());
    }

    #[test]
    fn hour_highlight_follows_the_clock() {
        let (hour, ctx) = grid(ViewMode::Hour, 0.0);
        let rect = hour.today_highlight.unwrap();
        assert_eq!(rect.x, ctx.today_x + 9.0 * 38.0);
    }

    #[test]
    fn day_labels_mark_month_changes() {
        let (grid, _) = grid(ViewMode::Day, 0.0);
        // 2023-12-17 first column
        let first = &grid.labels[0];
        assert_eq!(first.lower.text, "17");
        assert_eq!(first.upper.as_ref().unwrap().text, "December");
        assert!(grid.labels[1].upper.is_none());
        let jan = grid
            .labels
            .iter()
            .find(|l| l.date.day() == 1)
            .unwrap();
        assert_eq!(jan.upper.as_ref().unwrap().text, "January");
        assert_eq!(first.lower.anchor, Point::new(38.0 / 4.0, 50.0));
        assert_eq!(first.upper.as_ref().unwrap().anchor, Point::new(38.0 * 15.0, 25.0));
    }

    #[test]
    fn hour_labels_show_hours() {
        let (grid, _) = grid(ViewMode::Hour, 0.0);
        assert_eq!(grid.labels[0].lower.text, "00");
        assert_eq!(grid.labels[0].upper.as_ref().unwrap().text, "31 Dec");
        assert_eq!(grid.labels[1].lower.text, "01");
        assert!(grid.labels[1].upper.is_none());
        assert_eq!(grid.labels[24].upper.as_ref().unwrap().text, "1 Jan");
    }
}
