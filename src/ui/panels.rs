use egui::{Color32, Context, RichText, ScrollArea, Ui};

use crate::math::{Axis, Colormap, SolidColor, SurfaceFamily};
use crate::renderer::{CameraMode, PlotMode};
use crate::ui::state::{SurfaceParams, UiState};
use crate::ui::theme::*;

#[derive(Default)]
pub struct UiActions {
    pub reset_camera: bool,
    pub vsync_toggled: bool,
}

/// Read-only numbers shown in the statistics block.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlotStats {
    pub fps: f32,
    pub vertices: usize,
    pub triangles: usize,
    pub edges: usize,
    pub instances: usize,
    pub max_grid: usize,
}

pub fn draw_side_panel(
    ctx: &Context,
    state: &mut UiState,
    params: &mut SurfaceParams,
    stats: &PlotStats,
) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(300.0)
        .max_width(400.0)
        .default_width(320.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("Surface Plot").strong());
                ui.add_space(4.0);
                ui.label(
                    RichText::new(params.family.name())
                        .color(TEXT_MUTED)
                        .size(11.0),
                );
                ui.add_space(16.0);

                let mut edited = false;

                section_header(ui, "SURFACE");
                edited |= combo(ui, "family", &mut params.family, SurfaceFamily::ALL, SurfaceFamily::name);
                ui.add_space(4.0);
                let max_grid = stats.max_grid.max(2);
                edited |= ui
                    .add(egui::Slider::new(&mut params.nu, 2..=max_grid).text("u segments"))
                    .changed();
                edited |= ui
                    .add(egui::Slider::new(&mut params.nv, 2..=max_grid).text("v segments"))
                    .changed();
                edited |= ui
                    .add(egui::Slider::new(&mut params.scale, 0.1..=10.0).text("scale"))
                    .changed();
                ui.add_space(16.0);

                section_header(ui, "COLOR");
                edited |= combo(ui, "colormap", &mut params.colormap, Colormap::all(), Colormap::name);
                ui.horizontal(|ui| {
                    ui.label("Axis:");
                    for axis in Axis::ALL {
                        if ui
                            .selectable_label(params.color_axis == axis, axis.name())
                            .clicked()
                            && params.color_axis != axis
                        {
                            params.color_axis = axis;
                            edited = true;
                        }
                    }
                });
                ui.label(RichText::new("Wireframe").color(TEXT_MUTED).size(11.0));
                edited |= combo(
                    ui,
                    "wireframe_color",
                    &mut params.wireframe_color,
                    SolidColor::ALL,
                    SolidColor::name,
                );
                ui.add_space(16.0);

                if edited {
                    params.mark_changed();
                }

                section_header(ui, "PLOT");
                combo(ui, "plot_mode", &mut params.plot_mode, PlotMode::ALL, PlotMode::name);
                ui.add(egui::Slider::new(&mut params.rotation_speed, 0.0..=5.0).text("rotation"));
                ui.add_enabled(
                    params.family.is_animated(),
                    egui::Slider::new(&mut params.animate_speed, 0.0..=5.0).text("animation"),
                );
                ui.add_space(16.0);

                lighting_controls(ui, params);
                ui.add_space(16.0);

                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "VIEW");
                camera_controls(ui, &mut state.camera_mode);
                if ui.button("Reset Camera").clicked() {
                    actions.reset_camera = true;
                }
                ui.add_space(16.0);

                actions.vsync_toggled = perf_controls(ui, state);
                ui.add_space(16.0);

                if let Some(err) = &state.last_error {
                    error_box(ui, err);
                    ui.add_space(12.0);
                }

                if state.show_stats {
                    stats_panel(ui, stats);
                }
            });
        });

    actions
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn combo<T: Copy + PartialEq>(
    ui: &mut Ui,
    id: &str,
    current: &mut T,
    options: impl IntoIterator<Item = T>,
    name: fn(T) -> &'static str,
) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id)
        .selected_text(name(*current))
        .width(ui.available_width())
        .show_ui(ui, |ui| {
            for option in options {
                if ui.selectable_label(*current == option, name(option)).clicked()
                    && *current != option
                {
                    *current = option;
                    changed = true;
                }
            }
        });
    changed
}

fn lighting_controls(ui: &mut Ui, params: &mut SurfaceParams) {
    section_header(ui, "LIGHTING");
    let lighting = &mut params.lighting;
    ui.add(egui::Slider::new(&mut lighting.ambient, 0.0..=1.0).text("ambient"));
    ui.add(egui::Slider::new(&mut lighting.diffuse, 0.0..=1.0).text("diffuse"));
    ui.add(egui::Slider::new(&mut lighting.specular, 0.0..=1.0).text("specular"));
    ui.add(egui::Slider::new(&mut lighting.shininess, 1.0..=256.0).logarithmic(true).text("shininess"));
    ui.horizontal(|ui| {
        ui.label("Specular color:");
        ui.color_edit_button_rgb(&mut lighting.specular_color);
    });
}

fn camera_controls(ui: &mut Ui, mode: &mut CameraMode) {
    ui.horizontal(|ui| {
        ui.label("Camera:");
        if ui.selectable_label(*mode == CameraMode::Orbital, "Orbital").clicked() {
            *mode = CameraMode::Orbital;
        }
        if ui.selectable_label(*mode == CameraMode::Free, "Free").clicked() {
            *mode = CameraMode::Free;
        }
    });
}

fn perf_controls(ui: &mut Ui, state: &mut UiState) -> bool {
    section_header(ui, "PERFORMANCE");
    let mut vsync_toggled = false;
    ui.horizontal(|ui| {
        vsync_toggled = ui.checkbox(&mut state.vsync_enabled, "VSync").changed();
        ui.checkbox(&mut state.show_stats, "Stats");
    });
    ui.horizontal(|ui| {
        ui.checkbox(&mut state.fps_cap_enabled, "FPS Cap:");
        ui.add_enabled(
            state.fps_cap_enabled,
            egui::DragValue::new(&mut state.fps_cap).range(30..=500).suffix(" fps"),
        );
    });
    vsync_toggled
}

fn error_box(ui: &mut Ui, err: &str) {
    egui::Frame::default()
        .fill(Color32::from_rgb(40, 15, 15))
        .stroke(egui::Stroke::new(1.0, ACCENT_RED))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(err).color(ACCENT_RED).size(11.0));
        });
}

fn stats_panel(ui: &mut Ui, stats: &PlotStats) {
    section_header(ui, "STATISTICS");
    egui::Frame::default()
        .fill(BG_WIDGET)
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.style_mut().override_font_id =
                Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));

            let fps_color = if stats.fps >= 60.0 {
                ACCENT_GREEN
            } else if stats.fps >= 30.0 {
                ACCENT_ORANGE
            } else {
                ACCENT_RED
            };

            egui::Grid::new("stats").num_columns(2).spacing([20.0, 4.0]).show(ui, |ui| {
                ui.label(RichText::new("FPS").color(TEXT_MUTED));
                ui.label(RichText::new(format!("{:.0}", stats.fps)).color(fps_color));
                ui.end_row();

                let rows = [
                    ("Vertices", stats.vertices, ACCENT_BLUE),
                    ("Triangles", stats.triangles, ACCENT_TEAL),
                    ("Edges", stats.edges, TEXT_PRIMARY),
                    ("Instances", stats.instances, TEXT_PRIMARY),
                ];
                for (label, value, color) in rows {
                    ui.label(RichText::new(label).color(TEXT_MUTED));
                    ui.label(RichText::new(fmt_num(value)).color(color));
                    ui.end_row();
                }
            });
        });
}

pub fn draw_help_overlay(ctx: &Context, mode: CameraMode, eye: [f32; 3]) {
    let hint = match mode {
        CameraMode::Orbital => "RMB+Drag - Orbit | Scroll - Zoom | Tab - Free camera",
        CameraMode::Free => "WASD - Move | RMB+Drag - Look | Scroll - Speed | Tab - Orbit",
    };
    egui::Area::new(egui::Id::new("help_overlay"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.style_mut().override_font_id =
                        Some(egui::FontId::new(11.0, egui::FontFamily::Monospace));
                    ui.label(RichText::new(hint).color(TEXT_MUTED));
                    ui.label(
                        RichText::new(format!("Eye: ({:.2}, {:.2}, {:.2})", eye[0], eye[1], eye[2]))
                            .color(TEXT_MUTED),
                    );
                });
        });
}

fn fmt_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fmt_num_uses_suffixes() {
        assert_eq!(fmt_num(512), "512");
        assert_eq!(fmt_num(4_225), "4.2K");
        assert_eq!(fmt_num(2_500_000), "2.50M");
    }

    #[test]
    fn idle_panel_leaves_params_untouched() {
        let ctx = Context::default();
        let mut state = UiState::default();
        let mut params = SurfaceParams::default();
        let before = params.clone();
        let stats = PlotStats {
            max_grid: 128,
            ..Default::default()
        };

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                let actions = draw_side_panel(ctx, &mut state, &mut params, &stats);
                assert!(!actions.reset_camera);
                assert!(!actions.vsync_toggled);
            });
        }
        assert_eq!(params, before);
        assert!(!params.is_changed());
    }
}
