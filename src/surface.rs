use egui::{Pos2, Rect, Vec2};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::blend;
use crate::codec;
use crate::error::{CanvasError, CanvasResult};

/// Owns the drawing buffer at device resolution.
///
/// Callers work in logical (layout) pixels; the surface converts to buffer
/// pixels by `pixels_per_point`. The buffer is `None` until the host reports
/// a non-zero container size.
#[derive(Debug, Clone)]
pub struct Surface {
    buffer: Option<RgbaImage>,
    logical_size: Vec2,
    pixels_per_point: f32,
    /// Bumped after every mutation so hosts can skip redundant uploads
    revision: u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            buffer: None,
            logical_size: Vec2::ZERO,
            pixels_per_point: 1.0,
            revision: 0,
        }
    }

    /// Allocate a transparent buffer of `logical_size * pixels_per_point`.
    ///
    /// A zero-area size defers allocation: the surface stays not-ready and
    /// every pixel operation is a no-op until a real size arrives.
    /// Returns whether a buffer exists afterwards.
    pub fn initialize(&mut self, logical_size: Vec2, pixels_per_point: f32) -> bool {
        let pixels_per_point = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            pixels_per_point
        } else {
            1.0
        };
        self.logical_size = logical_size;
        self.pixels_per_point = pixels_per_point;

        let (width, height) = self.device_dimensions();
        if width == 0 || height == 0 {
            log::debug!("Deferring surface allocation, container is {:?}", logical_size);
            self.buffer = None;
        } else {
            log::debug!(
                "Allocating {}x{} surface ({:?} @ {}x)",
                width,
                height,
                logical_size,
                pixels_per_point
            );
            self.buffer = Some(RgbaImage::new(width, height));
        }
        self.touch();
        self.buffer.is_some()
    }

    /// Reallocate at a new size and best-effort restore `last_drawing`
    /// scaled to the new logical size.
    ///
    /// Content is not copied pixel-for-pixel: the restore resamples the
    /// serialized drawing, so hard fill edges come back softened.
    pub fn resize(
        &mut self,
        logical_size: Vec2,
        pixels_per_point: f32,
        last_drawing: Option<&str>,
    ) {
        // The new buffer is built completely before it replaces the old one.
        let mut next = Self::new();
        next.revision = self.revision;
        next.initialize(logical_size, pixels_per_point);
        if let Some(data) = last_drawing {
            if let Err(err) = next.restore(data) {
                log::warn!("Could not restore drawing after resize: {}", err);
            }
        }
        *self = next;
    }

    /// Decode a serialized drawing and draw it scaled over the whole buffer
    pub fn restore(&mut self, data: &str) -> CanvasResult<()> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Ok(());
        };
        let Some(drawing) = codec::decode_data_url(data)? else {
            return Ok(());
        };

        let (width, height) = buffer.dimensions();
        let scaled = if drawing.dimensions() == (width, height) {
            drawing
        } else {
            imageops::resize(&drawing, width, height, FilterType::Triangle)
        };
        for (dst, src) in buffer.pixels_mut().zip(scaled.pixels()) {
            blend::source_over(dst, *src);
        }
        self.touch();
        Ok(())
    }

    /// Map a pointer position in screen space into logical canvas coordinates.
    ///
    /// The result is independent of the pixel ratio; buffer scaling happens
    /// later, inside the engines.
    pub fn to_display_coords(pointer: Pos2, canvas_rect: Rect) -> Pos2 {
        (pointer - canvas_rect.min).to_pos2()
    }

    /// Convert a logical point to buffer pixel space
    pub fn to_device(&self, point: Pos2) -> Pos2 {
        (point.to_vec2() * self.pixels_per_point).to_pos2()
    }

    /// The buffer pixel under a logical point, if it is inside the buffer
    pub fn device_pixel(&self, point: Pos2) -> Option<(u32, u32)> {
        let buffer = self.buffer.as_ref()?;
        let device = self.to_device(point);
        let (x, y) = (device.x.floor(), device.y.floor());
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        (x < buffer.width() && y < buffer.height()).then_some((x, y))
    }

    /// Encode the buffer as a PNG data URL
    pub fn serialize(&self) -> CanvasResult<String> {
        let buffer = self.buffer.as_ref().ok_or(CanvasError::SurfaceNotReady)?;
        codec::encode_data_url(buffer)
    }

    /// Reset every pixel to fully transparent
    pub fn clear(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            for px in buffer.pixels_mut() {
                *px = Rgba([0, 0, 0, 0]);
            }
            self.touch();
        }
    }

    /// Replace the buffer contents; ignored when dimensions differ
    pub fn put_image(&mut self, image: &RgbaImage) -> bool {
        match self.buffer.as_mut() {
            Some(buffer) if buffer.dimensions() == image.dimensions() => {
                buffer.copy_from_slice(image.as_raw());
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn buffer(&self) -> Option<&RgbaImage> {
        self.buffer.as_ref()
    }

    /// Mutable access for the engines. Bumps the revision.
    pub fn buffer_mut(&mut self) -> Option<&mut RgbaImage> {
        if self.buffer.is_some() {
            self.touch();
        }
        self.buffer.as_mut()
    }

    pub fn logical_size(&self) -> Vec2 {
        self.logical_size
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Buffer size in device pixels for the current logical size
    pub fn device_dimensions(&self) -> (u32, u32) {
        let scaled = self.logical_size * self.pixels_per_point;
        let dim = |v: f32| if v.is_finite() && v >= 1.0 { v.round() as u32 } else { 0 };
        (dim(scaled.x), dim(scaled.y))
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
