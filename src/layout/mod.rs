//! Pixel layout: everything here is a pure projection of the task set under
//! one [`TimeScale`], recomputed on every render pass.

pub mod arrow;
pub mod bar;
pub mod flag;
pub mod grid;
pub mod timeline;

use chrono::NaiveDateTime;

use crate::date_math::DateMath;
use crate::model::GanttOptions;

pub use arrow::{Arrow, ArrowPath, ArrowRouter, PathCommand};
pub use bar::{Bar, BarArena, BarTags, BarUpdate, DelayTag, LabelAnchor, OverdueAnchor, UpdateResult};
pub use flag::Flag;
pub use grid::{DateLabel, Grid, Tick};
pub use timeline::TimeScale;

/// Values shared by every layout step of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutContext {
    pub scale: TimeScale,
    pub header_height: f64,
    pub bar_height: f64,
    pub padding: f64,
    pub corner_radius: f64,
    /// Grid rows drawn: one per task, plus filler rows up to the viewport height.
    pub rows_drawn: usize,
    pub today: NaiveDateTime,
    pub today_x: f64,
}

impl LayoutContext {
    pub fn new(
        options: &GanttOptions,
        scale: TimeScale,
        task_count: usize,
        dm: &impl DateMath,
    ) -> Self {
        let row_height = options.row_height();
        let filler_rows = if row_height > 0.0 {
            (options.viewport_height / row_height).ceil() as usize
        } else {
            0
        };
        let today_x = scale.today_x(dm);
        Self {
            scale,
            header_height: options.header_height,
            bar_height: options.bar_height,
            padding: options.padding,
            corner_radius: options.bar_corner_radius,
            rows_drawn: task_count.max(filler_rows),
            today: dm.today(),
            today_x,
        }
    }

    pub fn row_height(&self) -> f64 {
        self.bar_height + self.padding
    }

    /// Top edge of the bar in `row`.
    pub fn row_y(&self, row: usize) -> f64 {
        self.header_height + self.padding + row as f64 * self.row_height()
    }

    /// Bottom of the last drawn row.
    pub fn grid_height(&self) -> f64 {
        self.header_height + self.padding + self.row_height() * self.rows_drawn as f64
    }

    pub fn column_width(&self) -> f64 {
        self.scale.column_width
    }
}
