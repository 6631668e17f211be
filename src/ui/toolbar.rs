use crate::app::GanttViewerApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use gantt_timeline::ViewMode;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttViewerApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  Open Chart...").clicked() {
                app.open_chart();
                ui.close_menu();
            }
            if ui.button("  Import CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Sample Chart").clicked() {
                app.load_sample();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Timeline Scale").small().weak());
            let mut mode = app.view_mode();
            for candidate in ViewMode::ALL {
                if ui
                    .radio_value(&mut mode, candidate, candidate.label())
                    .clicked()
                {
                    ui.close_menu();
                }
            }
            if mode != app.view_mode() {
                app.change_view_mode(mode);
            }
            ui.separator();
            if ui.button("  Scroll to First Task").clicked() {
                app.request_scroll_to_start();
                ui.close_menu();
            }
        });

        // Right-aligned chart source
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(app.source_label()).size(11.0).weak());
        });
    });
}
