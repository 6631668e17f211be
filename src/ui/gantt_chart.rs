use egui::{Align2, Color32, CursorIcon, Pos2, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use gantt_timeline::date_math::DateMath;
use gantt_timeline::layout::{Arrow, Bar, DelayTag, Flag, Grid};
use gantt_timeline::model::{Milestone, Task, TaskKind};
use gantt_timeline::{DragMode, Gantt, GanttEvent, HitRegion, Point, Rect, Renderer};

use crate::ui::theme;

/// Result details from interactions in the Gantt chart.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    pub events: Vec<GanttEvent>,
    pub cancelled: bool,
}

/// Paints engine output straight into an egui painter, offset by the canvas origin.
struct PainterRenderer<'a> {
    painter: &'a egui::Painter,
    origin: Pos2,
}

impl PainterRenderer<'_> {
    fn pos(&self, p: Point) -> Pos2 {
        Pos2::new(self.origin.x + p.x as f32, self.origin.y + p.y as f32)
    }

    fn rect(&self, r: Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.pos(Point::new(r.x, r.y)),
            Vec2::new(r.width.max(0.0) as f32, r.height.max(0.0) as f32),
        )
    }

    fn polyline(&self, points: &[Point], stroke: Stroke) {
        let points: Vec<Pos2> = points.iter().map(|&p| self.pos(p)).collect();
        self.painter.add(Shape::line(points, stroke));
    }

    fn polygon(&self, points: &[Point], fill: Color32) {
        let points: Vec<Pos2> = points.iter().map(|&p| self.pos(p)).collect();
        self.painter
            .add(Shape::convex_polygon(points, fill, Stroke::NONE));
    }
}

fn bar_color(bar: &Bar) -> Color32 {
    if bar.invalid {
        return theme::BAR_INVALID;
    }
    match bar.kind {
        TaskKind::Activity => theme::BAR_ACTIVITY,
        TaskKind::ActivityOverdue => theme::BAR_ACTIVITY_OVERDUE,
        TaskKind::Standard | TaskKind::Custom(_) => theme::BAR,
    }
}

fn delay_color(tag: DelayTag) -> Color32 {
    match tag {
        DelayTag::Late => theme::LATE,
        DelayTag::InTime | DelayTag::NoDelay => theme::IN_TIME,
    }
}

impl Renderer for PainterRenderer<'_> {
    fn draw_grid(&mut self, grid: &Grid) {
        self.painter
            .rect_filled(self.rect(grid.background), 0.0, theme::BG_DARK);

        for (i, row) in grid.rows.iter().enumerate() {
            if i % 2 == 1 {
                self.painter
                    .rect_filled(self.rect(row.rect), 0.0, theme::BG_ROW_ODD);
            }
            self.painter.line_segment(
                [
                    self.pos(Point::new(row.rect.x, row.line_y)),
                    self.pos(Point::new(row.rect.end_x(), row.line_y)),
                ],
                Stroke::new(theme::THIN_STROKE, theme::BORDER_SUBTLE),
            );
        }

        if let Some(today) = grid.today_highlight {
            self.painter
                .rect_filled(self.rect(today), 0.0, theme::BG_TODAY);
        }

        for tick in &grid.ticks {
            let (width, color) = if tick.thick {
                (theme::THICK_STROKE, theme::GRID_LINE_THICK)
            } else {
                (theme::THIN_STROKE, theme::GRID_LINE)
            };
            self.painter.line_segment(
                [
                    self.pos(Point::new(tick.x, tick.y)),
                    self.pos(Point::new(tick.x, tick.y + tick.height)),
                ],
                Stroke::new(width, color),
            );
        }

        self.painter
            .rect_filled(self.rect(grid.header), 0.0, theme::BG_HEADER);
        for label in &grid.labels {
            self.painter.text(
                self.pos(label.lower.anchor),
                Align2::CENTER_CENTER,
                &label.lower.text,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
            if let Some(upper) = &label.upper {
                self.painter.text(
                    self.pos(upper.anchor),
                    Align2::LEFT_CENTER,
                    &upper.text,
                    theme::font_header(),
                    theme::TEXT_PRIMARY,
                );
            }
        }
    }

    fn draw_bar(&mut self, bar: &Bar, task: &Task) {
        let rounding = Rounding::same(bar.corner_radius as f32);
        let body = self.rect(bar.rect);

        if let Some(overdue) = bar.overdue_rect() {
            self.painter
                .rect_filled(self.rect(overdue), rounding, theme::OVERDUE);
        }

        // Soft shadow
        self.painter.rect_filled(
            body.translate(Vec2::new(1.0, 2.0)),
            rounding,
            Color32::from_black_alpha(35),
        );
        self.painter.rect_filled(body, rounding, bar_color(bar));

        if bar.completion_width > 0.0 {
            self.painter.rect_filled(
                self.rect(bar.completion_rect()),
                rounding,
                theme::COMPLETION_OVERLAY,
            );
        }
        if bar.progress_width > 0.0 {
            self.painter.rect_filled(
                self.rect(bar.progress_rect()),
                rounding,
                theme::PROGRESS_OVERLAY,
            );
        }

        if let Some(delay) = bar.delay_rect() {
            self.painter.rect_filled(
                self.rect(delay),
                rounding,
                delay_color(bar.tags.delay_bar),
            );
        }
        if let Some(x) = bar.delay_start_x {
            self.polygon(&bar.delay_cursor(x), delay_color(bar.tags.delay_start_cursor));
        }
        if let Some(x) = bar.delay_end_x {
            self.polygon(&bar.delay_cursor(x), delay_color(bar.tags.delay_end_cursor));
        }

        if let Some(cursors) = bar.activity_cursors() {
            for cursor in &cursors {
                self.polyline(cursor, Stroke::new(1.5, theme::TEXT_SECONDARY));
            }
        }

        if !bar.invalid {
            self.polygon(&bar.progress_handle(), theme::HANDLE_COLOR);
        }

        let galley = self
            .painter
            .layout_no_wrap(task.name.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
        let anchor = bar.label_anchor(galley.size().x as f64);
        let (align, color) = if anchor.outside {
            (Align2::LEFT_CENTER, theme::TEXT_SECONDARY)
        } else {
            (Align2::CENTER_CENTER, theme::TEXT_ON_BAR)
        };
        self.painter.text(
            self.pos(Point::new(anchor.x, anchor.y)),
            align,
            &task.name,
            theme::font_bar(),
            color,
        );

        if let Some(status) = &task.status {
            let galley =
                self.painter
                    .layout_no_wrap(status.clone(), theme::font_small(), theme::TEXT_DIM);
            let anchor = bar.status_anchor(galley.size().x as f64);
            self.painter.text(
                self.pos(Point::new(anchor.x, anchor.y)),
                Align2::LEFT_BOTTOM,
                status,
                theme::font_small(),
                theme::TEXT_DIM,
            );
        }
    }

    fn draw_arrow(&mut self, arrow: &Arrow) {
        for segment in arrow.path.segments() {
            self.polyline(&segment, Stroke::new(1.4, theme::ARROW));
        }
    }

    fn draw_flag(&mut self, flag: &Flag, milestone: &Milestone) {
        let color = if flag.invalid {
            theme::BAR_INVALID
        } else {
            theme::FLAG
        };
        self.painter.rect_filled(self.rect(flag.line), 0.0, color);
        if !flag.pennant.is_empty() {
            self.polygon(&flag.pennant, color);
        }
        self.painter.text(
            self.pos(flag.label_anchor),
            Align2::LEFT_BOTTOM,
            &milestone.name,
            theme::font_small(),
            theme::TEXT_SECONDARY,
        );
    }
}

fn to_chart(pos: Pos2, origin: Pos2) -> Point {
    Point::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
}

fn cursor_for(region: HitRegion) -> CursorIcon {
    match region {
        HitRegion::Body => CursorIcon::Grab,
        HitRegion::LeftHandle | HitRegion::RightHandle | HitRegion::ProgressHandle => {
            CursorIcon::ResizeHorizontal
        }
    }
}

/// Render the chart and forward pointer gestures to the engine.
pub fn show_gantt_chart<D: DateMath>(
    gantt: &mut Gantt<D>,
    scroll_to: Option<f32>,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let grid = gantt.grid();
    let size = Vec2::new(
        grid.background.width as f32,
        grid.background.height as f32,
    );

    let mut area = egui::ScrollArea::both().auto_shrink([false, false]);
    if let Some(x) = scroll_to {
        area = area.scroll_offset(Vec2::new(x, 0.0));
    }
    area.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        let origin = response.rect.min;

        if response.drag_started() {
            let press = ui.input(|i| i.pointer.press_origin());
            if let Some(press) = press {
                gantt.pointer_down(to_chart(press, origin));
            }
        }
        if response.dragged() && gantt.drag_mode() != DragMode::Idle {
            if let Some(pos) = response.interact_pointer_pos() {
                gantt.pointer_move(to_chart(pos, origin));
            }
        }
        if response.drag_stopped() {
            interaction.events = gantt.pointer_up();
        }

        let escape = ui.input(|i| i.key_pressed(egui::Key::Escape));
        let released = !ui.input(|i| i.pointer.primary_down());
        if gantt.drag_mode() != DragMode::Idle && (escape || released) {
            gantt.cancel();
            interaction.cancelled = true;
        }

        match gantt.drag_mode() {
            DragMode::Idle => {}
            DragMode::Dragging => ui.ctx().set_cursor_icon(CursorIcon::Grabbing),
            _ => ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal),
        }

        let mut renderer = PainterRenderer {
            painter: &painter,
            origin,
        };
        gantt.render(&mut renderer);

        if gantt.drag_mode() != DragMode::Idle {
            return;
        }
        let Some(hover) = response.hover_pos() else {
            return;
        };
        let Some((index, region)) = gantt.hit_test(to_chart(hover, origin)) else {
            return;
        };
        let Some(task) = gantt.tasks().get(index) else {
            return;
        };
        ui.ctx().set_cursor_icon(cursor_for(region));
        let dates = gantt.date_math();
        let pattern = gantt.options().date_pattern();
        egui::show_tooltip_at_pointer(
            ui.ctx(),
            ui.layer_id(),
            egui::Id::new(("task-tip", index)),
            |ui| {
                ui.strong(&task.name);
                ui.label(format!(
                    "{} → {}",
                    dates.format(task.start, &pattern),
                    dates.format(task.end, &pattern),
                ));
                ui.label(format!("Progress: {:.0}%", task.progress));
                if let Some(info) = &task.info {
                    ui.label(info);
                }
                if task.invalid {
                    ui.colored_label(theme::LATE, "Missing or invalid dates");
                }
            },
        );
    });

    interaction
}
