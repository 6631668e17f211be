#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod ui;

fn main() -> eframe::Result<()> {
    let _ = gantt_timeline::telemetry::init_default_tracing();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Gantt Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Gantt Viewer",
        options,
        Box::new(|cc| Ok(Box::new(app::GanttViewerApp::new(cc)?))),
    )
}
