//! Contract between the engine and whatever draws pixels.

use serde::{Deserialize, Serialize};

use crate::layout::{Arrow, Bar, Flag, Grid};
use crate::model::{Milestone, Task};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in chart coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn end_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.end_x() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Draws engine output. Retained-mode renderers override the `update_*`
/// methods to reposition existing elements; the defaults redraw.
pub trait Renderer {
    fn draw_grid(&mut self, grid: &Grid);
    fn draw_bar(&mut self, bar: &Bar, task: &Task);
    fn draw_arrow(&mut self, arrow: &Arrow);
    fn draw_flag(&mut self, flag: &Flag, milestone: &Milestone);

    fn update_bar(&mut self, bar: &Bar, task: &Task) {
        self.draw_bar(bar, task);
    }

    fn update_arrow(&mut self, arrow: &Arrow) {
        self.draw_arrow(arrow);
    }
}

/// Renderer call captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Grid { rows: usize, ticks: usize },
    Bar { task_id: String, rect: Rect },
    UpdateBar { task_id: String, rect: Rect },
    Arrow { from: usize, to: usize },
    UpdateArrow { from: usize, to: usize },
    Flag { milestone_id: String, x: f64 },
}

/// Records calls instead of drawing; used by tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

impl RecordingRenderer {
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn draw_grid(&mut self, grid: &Grid) {
        self.calls.push(RenderCall::Grid {
            rows: grid.rows.len(),
            ticks: grid.ticks.len(),
        });
    }

    fn draw_bar(&mut self, bar: &Bar, task: &Task) {
        self.calls.push(RenderCall::Bar {
            task_id: task.id.clone(),
            rect: bar.rect,
        });
    }

    fn draw_arrow(&mut self, arrow: &Arrow) {
        self.calls.push(RenderCall::Arrow {
            from: arrow.from,
            to: arrow.to,
        });
    }

    fn draw_flag(&mut self, flag: &Flag, milestone: &Milestone) {
        self.calls.push(RenderCall::Flag {
            milestone_id: milestone.id.clone(),
            x: flag.line.x,
        });
    }

    fn update_bar(&mut self, bar: &Bar, task: &Task) {
        self.calls.push(RenderCall::UpdateBar {
            task_id: task.id.clone(),
            rect: bar.rect,
        });
    }

    fn update_arrow(&mut self, arrow: &Arrow) {
        self.calls.push(RenderCall::UpdateArrow {
            from: arrow.from,
            to: arrow.to,
        });
    }
}
