use std::path::PathBuf;

use chrono::Duration;
use gantt_timeline::io::{self, ChartFile};
use gantt_timeline::model::task::DateWindowInput;
use gantt_timeline::model::OverdueFlags;
use gantt_timeline::{DragMode, Gantt, GanttEvent, GanttOptions, GanttResult, MilestoneInput, TaskInput, ViewMode};
use tracing::{info, warn};

use crate::ui;

/// Main application state.
pub struct GanttViewerApp {
    gantt: Gantt,
    source: Option<PathBuf>,
    status_message: String,
    last_viewport: egui::Vec2,
    scroll_request: Option<f32>,
}

impl GanttViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> GanttResult<Self> {
        ui::theme::apply_theme(&cc.egui_ctx);
        let gantt = sample_chart().into_gantt(gantt_timeline::SystemDateMath)?;
        let scroll = gantt.scroll_position() as f32;
        Ok(Self {
            gantt,
            source: None,
            status_message: "Ready".to_string(),
            last_viewport: egui::Vec2::ZERO,
            scroll_request: Some(scroll),
        })
    }

    pub fn view_mode(&self) -> ViewMode {
        self.gantt.view_mode()
    }

    pub fn source_label(&self) -> String {
        match &self.source {
            Some(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("chart")
                .to_string(),
            None => "Sample chart".to_string(),
        }
    }

    // --- File operations ---

    pub fn load_sample(&mut self) {
        let result = sample_chart().into_gantt(gantt_timeline::SystemDateMath);
        self.install(result, None, "Sample chart loaded".to_string());
    }

    pub fn open_chart(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt Chart", &["json"])
            .pick_file()
        {
            let result = io::load_chart(&path)
                .and_then(|chart| chart.into_gantt(gantt_timeline::SystemDateMath));
            let message = format!("Loaded {}", path.display());
            self.install(result, Some(path), message);
        }
    }

    pub fn import_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        {
            match io::import_csv(&path) {
                Ok(import) => {
                    let skipped = import.skipped;
                    let count = import.tasks.len();
                    let result = ChartFile::from(import).into_gantt(gantt_timeline::SystemDateMath);
                    let message = if skipped > 0 {
                        format!("Imported {count} tasks ({skipped} rows skipped)")
                    } else {
                        format!("Imported {count} tasks")
                    };
                    self.install(result, Some(path), message);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "csv import failed");
                    self.status_message = format!("CSV import failed: {e}");
                }
            }
        }
    }

    fn install(&mut self, result: GanttResult<Gantt>, source: Option<PathBuf>, message: String) {
        match result {
            Ok(gantt) => {
                self.scroll_request = Some(gantt.scroll_position() as f32);
                self.gantt = gantt;
                self.source = source;
                self.last_viewport = egui::Vec2::ZERO;
                self.status_message = message;
            }
            Err(e) => {
                warn!(error = %e, "chart could not be opened");
                self.status_message = format!("Error loading: {e}");
            }
        }
    }

    // --- View operations ---

    pub fn change_view_mode(&mut self, mode: ViewMode) {
        match self.gantt.change_view_mode(mode) {
            Ok(event) => {
                self.scroll_request = Some(self.gantt.scroll_position() as f32);
                self.status_message = describe(&event, &self.gantt);
            }
            Err(e) => self.status_message = format!("Cannot switch to {mode}: {e}"),
        }
    }

    pub fn request_scroll_to_start(&mut self) {
        self.scroll_request = Some(self.gantt.scroll_position() as f32);
    }

    fn sync_viewport(&mut self, size: egui::Vec2) {
        // a re-layout would drop the gesture; pick the new size up once it ends
        if self.gantt.drag_mode() != DragMode::Idle {
            return;
        }
        if (size - self.last_viewport).length() < 1.0 {
            return;
        }
        self.last_viewport = size;
        if let Err(e) = self.gantt.set_viewport(size.x as f64, size.y as f64) {
            warn!(width = size.x, error = %e, "viewport rejected");
        }
    }
}

fn describe<D: gantt_timeline::DateMath>(event: &GanttEvent, gantt: &Gantt<D>) -> String {
    let pattern = gantt.options().date_pattern();
    let dates = gantt.date_math();
    let name = |id: &str| gantt.task(id).map_or_else(|| id.to_string(), |t| t.name.clone());
    match event {
        GanttEvent::DateChange { task_id, start, end } => format!(
            "Updated '{}' ({} → {})",
            name(task_id),
            dates.format(*start, &pattern),
            dates.format(*end, &pattern)
        ),
        GanttEvent::ProgressChange { task_id, progress } => {
            format!("'{}' is {progress:.0}% done", name(task_id))
        }
        GanttEvent::ViewChange(mode) => format!("View: {mode}"),
    }
}

/// Generate a sample chart for demonstration.
fn sample_chart() -> ChartFile {
    let today = chrono::Local::now().date_naive();
    let day = |offset: i64| -> String {
        (today + Duration::days(offset))
            .format("%Y-%m-%d")
            .to_string()
    };

    let mut kickoff = TaskInput::new("kickoff", &day(-5), &day(-3)).with_progress(100.0);
    kickoff.name = "Project Kickoff".to_string();

    let mut requirements = TaskInput::new("requirements", &day(-2), &day(4))
        .with_dependencies("kickoff")
        .with_progress(60.0);
    requirements.name = "Requirements Gathering".to_string();
    requirements.status = Some("In progress".to_string());

    let mut design = TaskInput::new("design", &day(5), &day(12))
        .with_dependencies("requirements")
        .with_class("bar-activity");
    design.name = "UI Design".to_string();
    design.delay = Some(DateWindowInput {
        start: Some(day(6)),
        end: Some(day(14)),
    });

    let mut backend = TaskInput::new("backend", &day(5), &day(20))
        .with_dependencies("requirements")
        .with_class("bar-activity");
    backend.name = "Backend Development".to_string();
    backend.has_overdue = OverdueFlags {
        to_start: true,
        wip: false,
    };
    backend.overdue = Some(DateWindowInput {
        start: Some(day(-1)),
        end: Some(day(5)),
    });

    let mut qa = TaskInput::new("qa", &day(21), &day(27)).with_dependencies("design, backend");
    qa.name = "Testing & QA".to_string();
    qa.info = Some("Regression suite plus exploratory passes".to_string());

    ChartFile {
        tasks: vec![kickoff, requirements, design, backend, qa],
        milestones: vec![
            MilestoneInput::new("Planning Complete", &day(4)),
            MilestoneInput::new("Launch", &day(29)),
        ],
        options: GanttOptions::default(),
    }
}

impl eframe::App for GanttViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_sub())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "Tasks: {} · Milestones: {} · {}",
                                self.gantt.tasks().len(),
                                self.gantt.milestones().len(),
                                self.gantt.view_mode()
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: Gantt chart
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            self.sync_viewport(ui.available_size());
            let scroll_to = self.scroll_request.take();
            let interaction = ui::gantt_chart::show_gantt_chart(&mut self.gantt, scroll_to, ui);
            if interaction.cancelled {
                self.status_message = "Drag cancelled".to_string();
            }
            if let Some(last) = interaction.events.last() {
                info!(events = interaction.events.len(), "chart edited");
                self.status_message = if interaction.events.len() == 1 {
                    describe(last, &self.gantt)
                } else {
                    format!(
                        "{} ({} more tasks moved)",
                        describe(&interaction.events[0], &self.gantt),
                        interaction.events.len() - 1
                    )
                };
            }
        });
    }
}
