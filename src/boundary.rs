use egui::{Rect, Vec2, pos2, vec2};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Where an image of `image_size` lands when "contain"-fitted into `frame`:
/// aspect ratio kept, centered, letterboxed.
pub fn contain_rect(image_size: Vec2, frame: Rect) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 || frame.width() <= 0.0 || frame.height() <= 0.0 {
        return Rect::from_center_size(frame.center(), Vec2::ZERO);
    }
    let scale = (frame.width() / image_size.x).min(frame.height() / image_size.y);
    Rect::from_center_size(frame.center(), image_size * scale)
}

/// Read-only copy of the line art at buffer resolution, composited on white.
///
/// Fills consult it to find ink: a pixel is "dark" when the mean of its RGB
/// channels is below the outline threshold.
#[derive(Debug, Clone)]
pub struct BoundaryMap {
    raster: RgbaImage,
}

impl BoundaryMap {
    /// Contain-fit `background` into a `width` x `height` white raster
    pub fn build(background: &DynamicImage, width: u32, height: u32) -> Self {
        let mut raster = RgbaImage::from_pixel(width, height, WHITE);
        let frame = Rect::from_min_size(pos2(0.0, 0.0), vec2(width as f32, height as f32));
        let image_size = vec2(background.width() as f32, background.height() as f32);
        let fitted = contain_rect(image_size, frame);

        let fit_w = fitted.width().round() as u32;
        let fit_h = fitted.height().round() as u32;
        if fit_w > 0 && fit_h > 0 {
            let source = background.to_rgba8();
            let scaled = if source.dimensions() == (fit_w, fit_h) {
                source
            } else {
                imageops::resize(&source, fit_w, fit_h, FilterType::Triangle)
            };
            imageops::overlay(
                &mut raster,
                &scaled,
                fitted.min.x.round() as i64,
                fitted.min.y.round() as i64,
            );
        }
        Self { raster }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    /// True when the pixel is part of an ink line. Out-of-range pixels are not.
    #[inline]
    pub fn is_dark(&self, x: u32, y: u32, threshold: u8) -> bool {
        match self.raster.get_pixel_checked(x, y) {
            Some(px) => {
                let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
                sum < threshold as u32 * 3
            }
            None => false,
        }
    }
}

/// Lifecycle of the background the user colors over
#[derive(Debug, Clone, Default)]
pub enum Background {
    /// Blank page; fills are unconstrained
    #[default]
    None,
    /// The host is still fetching/decoding the image; fills are blocked
    Loading,
    /// The image is decoded. `boundary` is absent until the surface has a size.
    Ready {
        image: DynamicImage,
        boundary: Option<BoundaryMap>,
    },
    /// Loading failed; treated like a blank page
    Unavailable,
}

impl Background {
    pub fn ready(image: DynamicImage, buffer_size: Option<(u32, u32)>) -> Self {
        let boundary = buffer_size.map(|(w, h)| BoundaryMap::build(&image, w, h));
        Self::Ready { image, boundary }
    }

    /// Rebuild the boundary for a new buffer size
    pub fn rebuild(&mut self, buffer_size: Option<(u32, u32)>) {
        if let Self::Ready { image, boundary } = self {
            *boundary = buffer_size.map(|(w, h)| BoundaryMap::build(image, w, h));
        }
    }

    pub fn boundary(&self) -> Option<&BoundaryMap> {
        match self {
            Self::Ready { boundary, .. } => boundary.as_ref(),
            _ => None,
        }
    }

    /// False only while an image is still on its way
    pub fn allows_fill(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}
