use egui::{Color32, FontId, Rounding, Stroke, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_ODD: Color32 = Color32::from_rgb(28, 28, 37);
pub const BG_TODAY: Color32 = Color32::from_rgba_premultiplied(60, 52, 20, 70);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const GRID_LINE_THICK: Color32 = Color32::from_rgb(64, 67, 82);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);
pub const ARROW: Color32 = Color32::from_rgb(130, 136, 155);

pub const BAR: Color32 = Color32::from_rgb(66, 133, 244);
pub const BAR_ACTIVITY: Color32 = Color32::from_rgb(52, 168, 83);
pub const BAR_ACTIVITY_OVERDUE: Color32 = Color32::from_rgb(251, 140, 0);
pub const BAR_INVALID: Color32 = Color32::from_rgb(90, 92, 104);
pub const PROGRESS_OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 55);
pub const COMPLETION_OVERLAY: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 30);

pub const IN_TIME: Color32 = Color32::from_rgb(52, 168, 83);
pub const LATE: Color32 = Color32::from_rgb(229, 57, 53);
pub const OVERDUE: Color32 = Color32::from_rgba_premultiplied(150, 30, 28, 150);
pub const FLAG: Color32 = Color32::from_rgb(171, 71, 188);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const STATUS_BAR_HEIGHT: f32 = 24.0;
pub const THIN_STROKE: f32 = 0.5;
pub const THICK_STROKE: f32 = 1.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_small() -> FontId {
    FontId::proportional(9.5)
}

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    visuals.widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
