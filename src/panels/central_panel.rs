use egui::{Color32, ColorImage, Rect, Sense, Stroke, TextureHandle, TextureOptions, pos2};

use crate::engine::ColoringCanvas;
use crate::input::{PointerAdapter, PointerSample};

const FULL_UV: Rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));

/// Displays the drawing multiplied over the line art, and feeds pointer
/// input to the engine
pub struct CanvasView {
    adapter: PointerAdapter,
    texture: Option<TextureHandle>,
    /// Engine display revision the texture was built from
    texture_revision: Option<(u64, u64)>,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            adapter: PointerAdapter::new(Rect::NOTHING),
            texture: None,
            texture_revision: None,
        }
    }
}

impl CanvasView {
    pub fn show(&mut self, ui: &mut egui::Ui, canvas: &mut ColoringCanvas) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::drag());
        let rect = response.rect;

        canvas.resize(rect.size(), ui.ctx().pixels_per_point());
        self.adapter.set_canvas_rect(rect);
        for input in self.adapter.process(PointerSample::from_context(ui.ctx())) {
            canvas.handle_input(input);
        }

        painter.rect_filled(rect, 12.0, Color32::WHITE);
        self.sync_texture(ui.ctx(), canvas);
        if let Some(texture) = &self.texture {
            painter.image(texture.id(), rect, FULL_UV, Color32::WHITE);
        }

        // Brush outline under the cursor while not painting
        let tools = canvas.tools();
        if tools.mode().is_stroke() && !self.adapter.is_dragging() {
            if let Some(hover) = self.adapter.hover_pos() {
                let center = rect.min + hover.to_vec2();
                let radius = tools.brush_size() / 2.0;
                let (fill, outline) = if tools.is_eraser() {
                    (Color32::TRANSPARENT, Color32::from_gray(102))
                } else {
                    let c = tools.color();
                    (Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 0x40), c)
                };
                painter.circle(center, radius, fill, Stroke::new(2.0, outline));
            }
        }
    }

    /// Re-upload the composited canvas when the drawing or line art changed
    fn sync_texture(&mut self, ctx: &egui::Context, canvas: &ColoringCanvas) {
        let revision = canvas.display_revision();
        if self.texture_revision == Some(revision) {
            return;
        }
        self.texture_revision = Some(revision);

        let Some(display) = canvas.display_image() else {
            self.texture = None;
            return;
        };
        let size = [display.width() as usize, display.height() as usize];
        let image = ColorImage::from_rgba_unmultiplied(size, display.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture("canvas", image, TextureOptions::LINEAR)),
        }
    }
}
