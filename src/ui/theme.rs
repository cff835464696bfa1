use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

pub const BG_BLACK: Color32 = Color32::from_rgb(3, 3, 5);
pub const BG_PANEL: Color32 = Color32::from_rgb(8, 9, 12);
pub const BG_WIDGET: Color32 = Color32::from_rgb(18, 20, 26);
pub const BG_WIDGET_HOVER: Color32 = Color32::from_rgb(28, 32, 42);
pub const BG_WIDGET_ACTIVE: Color32 = Color32::from_rgb(38, 44, 58);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(170, 172, 178);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(105, 108, 116);
pub const TEXT_BRIGHT: Color32 = Color32::from_rgb(222, 224, 230);

pub const ACCENT_GREEN: Color32 = Color32::from_rgb(60, 180, 90);
pub const ACCENT_RED: Color32 = Color32::from_rgb(190, 50, 50);
pub const ACCENT_BLUE: Color32 = Color32::from_rgb(70, 120, 220);
pub const ACCENT_TEAL: Color32 = Color32::from_rgb(40, 170, 170);
pub const ACCENT_ORANGE: Color32 = Color32::from_rgb(200, 130, 40);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgba_premultiplied(40, 60, 90, 77);
pub const BORDER_ACCENT: Color32 = ACCENT_BLUE;

fn widget(bg: Color32, border: Stroke, fg: Color32, expansion: f32) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: border,
        rounding: Rounding::same(4.0),
        fg_stroke: Stroke::new(1.0, fg),
        expansion,
    }
}

fn shadow(y: f32, blur: f32, alpha: u8) -> egui::epaint::Shadow {
    egui::epaint::Shadow {
        offset: egui::vec2(0.0, y),
        blur,
        spread: 0.0,
        color: Color32::from_black_alpha(alpha),
    }
}

pub fn apply_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    let mut visuals = Visuals::dark();
    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.widgets = egui::style::Widgets {
        noninteractive: egui::style::WidgetVisuals {
            weak_bg_fill: BG_PANEL,
            ..widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_MUTED, 0.0)
        },
        inactive: widget(BG_WIDGET, Stroke::new(1.0, BORDER_SUBTLE), TEXT_PRIMARY, 0.0),
        hovered: widget(BG_WIDGET_HOVER, Stroke::new(1.0, BORDER_ACCENT), TEXT_BRIGHT, 1.0),
        active: widget(BG_WIDGET_ACTIVE, Stroke::new(2.0, ACCENT_TEAL), TEXT_BRIGHT, 1.0),
        open: widget(BG_WIDGET_ACTIVE, Stroke::new(1.0, BORDER_ACCENT), TEXT_BRIGHT, 0.0),
    };
    visuals.selection = egui::style::Selection {
        bg_fill: ACCENT_TEAL.gamma_multiply(0.4),
        stroke: Stroke::new(1.0, ACCENT_TEAL),
    };
    visuals.hyperlink_color = ACCENT_BLUE;
    visuals.faint_bg_color = BG_PANEL;
    visuals.extreme_bg_color = BG_BLACK;
    visuals.code_bg_color = BG_BLACK;
    visuals.warn_fg_color = ACCENT_ORANGE;
    visuals.error_fg_color = ACCENT_RED;
    visuals.window_rounding = Rounding::same(6.0);
    visuals.window_shadow = shadow(4.0, 16.0, 128);
    visuals.popup_shadow = shadow(2.0, 8.0, 100);
    visuals.window_fill = BG_PANEL;
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.panel_fill = BG_PANEL;
    visuals.slider_trailing_fill = true;
    visuals.handle_shape = egui::style::HandleShape::Circle;
    visuals.text_cursor.stroke = Stroke::new(2.0, ACCENT_TEAL);
    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.slider_width = 160.0;

    style.text_styles = [
        (TextStyle::Small, FontId::new(11.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
    ]
    .into();

    ctx.set_style(style);
}
