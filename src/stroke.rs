use egui::{Color32, Pos2, Rect, pos2};
use image::RgbaImage;

use crate::blend;
use crate::history::History;
use crate::surface::Surface;

/// How a stroke segment is composited
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushBlend {
    /// Multiply at a fixed opacity, like a felt marker
    Marker { opacity: f32 },
    /// Opaque alpha removal
    Eraser,
}

/// Parameters for one segment, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color32,
    pub diameter: f32,
    pub blend: BrushBlend,
}

impl Brush {
    pub fn marker(color: Color32, diameter: f32, opacity: f32) -> Self {
        Self {
            color,
            diameter,
            blend: BrushBlend::Marker { opacity },
        }
    }

    pub fn eraser(diameter: f32) -> Self {
        Self {
            color: Color32::TRANSPARENT,
            diameter,
            blend: BrushBlend::Eraser,
        }
    }
}

/// Turns pointer movement into connected segments on the surface.
///
/// The anchor is the last point drawn to; each `extend_stroke` draws from it
/// and moves it forward, so segments land in input order.
#[derive(Debug, Default, Clone)]
pub struct StrokeEngine {
    anchor: Option<Pos2>,
    segments: usize,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the buffer and remember `point` as the anchor. Nothing is drawn yet.
    pub fn begin_stroke(&mut self, point: Pos2, surface: &Surface, history: &mut History) -> bool {
        if !surface.is_ready() {
            return false;
        }
        history.snapshot(surface);
        self.anchor = Some(point);
        self.segments = 0;
        true
    }

    /// Draw from the anchor to `point`. Ignored when no stroke is in progress.
    pub fn extend_stroke(&mut self, point: Pos2, surface: &mut Surface, brush: &Brush) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        let from = surface.to_device(anchor);
        let to = surface.to_device(point);
        let radius = brush.diameter * surface.pixels_per_point() / 2.0;

        if let Some(buffer) = surface.buffer_mut() {
            draw_segment(buffer, from, to, radius, brush);
            self.segments += 1;
        }
        self.anchor = Some(point);
        true
    }

    /// Finish the current stroke. Returns `false` if none was in progress.
    pub fn end_stroke(&mut self) -> bool {
        match self.anchor.take() {
            Some(_) => {
                log::debug!("Stroke finished after {} segments", self.segments);
                self.segments = 0;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Pos2> {
        self.anchor
    }
}

/// Rasterize one segment in device pixels.
///
/// Caps and joins are round: coverage depends only on the distance to the
/// segment, so the ends are half-discs and consecutive segments meet without
/// gaps.
pub fn draw_segment(buffer: &mut RgbaImage, from: Pos2, to: Pos2, radius: f32, brush: &Brush) {
    if radius <= 0.0 {
        return;
    }
    let (width, height) = buffer.dimensions();
    let reach = radius + 1.0;
    let bounds = Rect::from_two_pos(from, to).expand(reach);

    let x0 = bounds.min.x.floor().max(0.0) as u32;
    let y0 = bounds.min.y.floor().max(0.0) as u32;
    let x1 = (bounds.max.x.ceil().max(0.0) as u32).min(width);
    let y1 = (bounds.max.y.ceil().max(0.0) as u32).min(height);

    let color = [brush.color.r(), brush.color.g(), brush.color.b()];
    for y in y0..y1 {
        for x in x0..x1 {
            let center = pos2(x as f32 + 0.5, y as f32 + 0.5);
            let distance = blend::distance_to_segment(center, from, to);
            let coverage = blend::segment_coverage(distance, radius);
            if coverage <= 0.0 {
                continue;
            }
            let px = buffer.get_pixel_mut(x, y);
            match brush.blend {
                BrushBlend::Marker { opacity } => blend::multiply(px, color, opacity * coverage),
                BrushBlend::Eraser => blend::destination_out(px, coverage),
            }
        }
    }
}
