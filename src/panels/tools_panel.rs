use egui::{Button, Key, Modifiers, SelectableLabel, Slider};

use crate::components::ColorSwatch;
use crate::engine::ColoringCanvas;

/// Palette, brush size, tool toggles and undo/clear
pub fn tools_panel(ui: &mut egui::Ui, canvas: &mut ColoringCanvas) {
    let is_eraser = canvas.tools().is_eraser();
    let is_fill = canvas.tools().is_fill();

    ui.horizontal_wrapped(|ui| {
        let palette = canvas.config().palette.clone();
        for entry in &palette {
            let Ok(color) = entry.color() else {
                continue;
            };
            let selected = !is_eraser && canvas.tools().color() == color;
            if ColorSwatch::new(color, &entry.name, selected).show(ui).clicked() {
                log::debug!("Color selected: {} ({})", entry.name, entry.hex);
                canvas.set_color(color);
                canvas.set_eraser(false);
            }
        }

        ui.separator();

        if ui.selectable_label(is_eraser, "Eraser").clicked() {
            canvas.set_eraser(!is_eraser);
        }

        let fill_toggle = ui
            .add_enabled(canvas.boundary_ready(), SelectableLabel::new(is_fill, "Fill"))
            .on_disabled_hover_text("Waiting for the picture to load");
        if fill_toggle.clicked() {
            canvas.set_fill_mode(!is_fill);
        }
    });

    ui.horizontal(|ui| {
        let limits = canvas.config().brush;
        let mut size = canvas.tools().brush_size();
        let slider = Slider::new(&mut size, limits.min..=limits.max)
            .step_by(limits.step as f64)
            .text("Size");
        if ui.add_enabled(!is_fill, slider).changed() {
            canvas.set_brush_size(size);
        }

        ui.separator();

        let undo_shortcut = ui.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Z));
        if ui.add_enabled(canvas.can_undo(), Button::new("Undo")).clicked() || undo_shortcut {
            canvas.undo();
        }
        if ui.button("Clear drawing").clicked() {
            canvas.clear();
        }
    });
}
