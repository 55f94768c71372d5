use egui::{Color32, Response, Sense, Stroke, Ui, vec2};

/// Round palette button showing a single color
pub struct ColorSwatch {
    pub color: Color32,
    pub name: String,
    pub selected: bool,
}

impl ColorSwatch {
    pub fn new(color: Color32, name: impl Into<String>, selected: bool) -> Self {
        Self {
            color,
            name: name.into(),
            selected,
        }
    }

    pub fn show(&self, ui: &mut Ui) -> Response {
        let size = vec2(36.0, 36.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let center = rect.center();
            let mut radius = rect.width() / 2.0 - 3.0;
            if self.selected || response.hovered() {
                radius += 2.0;
            }

            let ring = if self.selected {
                Stroke::new(3.0, ui.visuals().strong_text_color())
            } else {
                Stroke::new(1.0, Color32::from_gray(160))
            };
            ui.painter().circle(center, radius, self.color, ring);
        }

        response.on_hover_text(self.name.as_str())
    }
}
