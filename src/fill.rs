//! Bucket fill constrained by the line art.
//!
//! The flood is 4-connected. It runs on an explicit stack of span seeds: a
//! popped seed is widened left and right into a horizontal run, the run is
//! painted, and the rows above and below are scanned for the start of each
//! eligible run, which is pushed as a new seed. A visited bitmap sized to the
//! buffer keeps every pixel from being examined twice.

use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};

use crate::boundary::{Background, BoundaryMap};
use crate::history::History;
use crate::surface::Surface;

/// Thresholds a fill is judged by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillParams {
    pub fill_alpha: u8,
    pub outline_threshold: u8,
    pub empty_alpha_threshold: u8,
    pub replace_tolerance: u32,
}

/// Which pixels a fill may take over, decided from the seed pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    /// The seed is blank: only blank pixels are eligible
    Empty,
    /// The seed is colored: only pixels close to this color are eligible
    Replace(Rgba<u8>),
}

/// What a fill call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    Filled { mode: RegionMode, pixels: usize },
    /// Seed is outside the buffer, or there is no buffer yet
    OutOfBounds,
    /// Seed sits on an ink line
    OnOutline,
    /// Seed already has the target color
    AlreadyFilled,
    /// The background is still loading
    BoundaryPending,
}

impl FillOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, Self::Filled { .. })
    }
}

#[derive(Debug, Default, Clone)]
pub struct FillEngine;

impl FillEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fill the region around the logical point `seed` with `color`.
    ///
    /// All rejections happen before the history snapshot, so a no-op leaves
    /// both the buffer and the history untouched.
    pub fn fill(
        &self,
        seed: Pos2,
        color: Color32,
        params: &FillParams,
        surface: &mut Surface,
        background: &Background,
        history: &mut History,
    ) -> FillOutcome {
        if !background.allows_fill() {
            return FillOutcome::BoundaryPending;
        }
        let Some((sx, sy)) = surface.device_pixel(seed) else {
            return FillOutcome::OutOfBounds;
        };
        let boundary = background
            .boundary()
            .filter(|map| Some(map.dimensions()) == surface.buffer().map(|b| b.dimensions()));

        if let Some(map) = boundary {
            if map.is_dark(sx, sy, params.outline_threshold) {
                return FillOutcome::OnOutline;
            }
        }

        let target = Rgba([color.r(), color.g(), color.b(), params.fill_alpha]);
        let Some(seed_px) = surface.buffer().map(|b| *b.get_pixel(sx, sy)) else {
            return FillOutcome::OutOfBounds;
        };
        if seed_px == target {
            return FillOutcome::AlreadyFilled;
        }
        let mode = if seed_px[3] < params.empty_alpha_threshold {
            RegionMode::Empty
        } else {
            RegionMode::Replace(seed_px)
        };

        history.snapshot(surface);
        let Some(buffer) = surface.buffer_mut() else {
            return FillOutcome::OutOfBounds;
        };
        let pixels = flood(buffer, boundary, (sx, sy), target, mode, params);
        log::debug!("Filled {} pixels ({:?}) from {:?}", pixels, mode, (sx, sy));
        FillOutcome::Filled { mode, pixels }
    }
}

/// Summed absolute channel difference
#[inline]
fn distance(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    a.0.iter().zip(b.0.iter()).map(|(&x, &y)| x.abs_diff(y) as u32).sum()
}

struct Flood<'a> {
    buffer: &'a mut RgbaImage,
    boundary: Option<&'a BoundaryMap>,
    visited: Vec<bool>,
    width: u32,
    target: Rgba<u8>,
    mode: RegionMode,
    params: &'a FillParams,
}

impl Flood<'_> {
    #[inline]
    fn eligible(&self, x: u32, y: u32) -> bool {
        if self.visited[(y * self.width + x) as usize] {
            return false;
        }
        if let Some(map) = self.boundary {
            if map.is_dark(x, y, self.params.outline_threshold) {
                return false;
            }
        }
        let px = *self.buffer.get_pixel(x, y);
        if px == self.target {
            return false;
        }
        match self.mode {
            RegionMode::Empty => px[3] < self.params.empty_alpha_threshold,
            RegionMode::Replace(seed) => distance(px, seed) <= self.params.replace_tolerance,
        }
    }

    #[inline]
    fn paint(&mut self, x: u32, y: u32) {
        self.visited[(y * self.width + x) as usize] = true;
        self.buffer.put_pixel(x, y, self.target);
    }

    /// Push the first pixel of every eligible run in `left..=right` on row `y`
    fn scan_row(&self, left: u32, right: u32, y: u32, stack: &mut Vec<(u32, u32)>) {
        let mut in_run = false;
        for x in left..=right {
            if self.eligible(x, y) {
                if !in_run {
                    stack.push((x, y));
                    in_run = true;
                }
            } else {
                in_run = false;
            }
        }
    }
}

fn flood(
    buffer: &mut RgbaImage,
    boundary: Option<&BoundaryMap>,
    seed: (u32, u32),
    target: Rgba<u8>,
    mode: RegionMode,
    params: &FillParams,
) -> usize {
    let (width, height) = buffer.dimensions();
    let mut flood = Flood {
        buffer,
        boundary,
        visited: vec![false; width as usize * height as usize],
        width,
        target,
        mode,
        params,
    };
    let mut stack = vec![seed];
    let mut filled = 0;

    while let Some((x, y)) = stack.pop() {
        // Seeds can be taken by an earlier span before they are popped.
        if !flood.eligible(x, y) {
            continue;
        }

        let mut left = x;
        while left > 0 && flood.eligible(left - 1, y) {
            left -= 1;
        }
        let mut right = x;
        while right + 1 < width && flood.eligible(right + 1, y) {
            right += 1;
        }

        for px in left..=right {
            flood.paint(px, y);
        }
        filled += (right - left + 1) as usize;

        if y > 0 {
            flood.scan_row(left, right, y - 1, &mut stack);
        }
        if y + 1 < height {
            flood.scan_row(left, right, y + 1, &mut stack);
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};
    use image::DynamicImage;

    const PARAMS: FillParams = FillParams {
        fill_alpha: 153,
        outline_threshold: 100,
        empty_alpha_threshold: 10,
        replace_tolerance: 96,
    };

    const BLANK: Background = Background::None;

    struct Canvas {
        surface: Surface,
        history: History,
    }

    impl Canvas {
        fn new(size: f32) -> Self {
            let mut surface = Surface::new();
            surface.initialize(vec2(size, size), 1.0);
            Self {
                surface,
                history: History::new(10),
            }
        }

        fn fill(&mut self, background: &Background, seed: Pos2, color: Color32) -> FillOutcome {
            let (surface, history) = (&mut self.surface, &mut self.history);
            FillEngine::new().fill(seed, color, &PARAMS, surface, background, history)
        }

        fn buffer(&self) -> &RgbaImage {
            self.surface.buffer().unwrap()
        }

        fn buffer_mut(&mut self) -> &mut RgbaImage {
            self.surface.buffer_mut().unwrap()
        }
    }

    /// White page with a black vertical line at `x`
    fn divided_background(size: u32, x: u32) -> Background {
        let mut art = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
        for y in 0..size {
            art.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
        Background::ready(DynamicImage::ImageRgba8(art), Some((size, size)))
    }

    #[test]
    fn test_empty_canvas_fills_everything() {
        let mut canvas = Canvas::new(16.0);
        let blue = Color32::from_rgb(0xA8, 0xD8, 0xFF);

        let outcome = canvas.fill(&BLANK, pos2(3.0, 3.0), blue);

        assert_eq!(
            outcome,
            FillOutcome::Filled {
                mode: RegionMode::Empty,
                pixels: 256
            }
        );
        let expected = Rgba([0xA8, 0xD8, 0xFF, 153]);
        assert!(canvas.buffer().pixels().all(|p| *p == expected));
        assert_eq!(canvas.history.depth(), 1);
    }

    #[test]
    fn test_outline_separates_regions() {
        let mut canvas = Canvas::new(20.0);
        let background = divided_background(20, 10);

        let outcome = canvas.fill(&background, pos2(2.0, 2.0), Color32::RED);
        assert_eq!(
            outcome,
            FillOutcome::Filled {
                mode: RegionMode::Empty,
                pixels: 200
            }
        );

        let buffer = canvas.buffer();
        assert_eq!(buffer.get_pixel(9, 19)[3], 153);
        assert_eq!(buffer.get_pixel(10, 5)[3], 0);
        assert_eq!(buffer.get_pixel(11, 5)[3], 0);
    }

    #[test]
    fn test_seed_on_outline_is_noop() {
        let mut canvas = Canvas::new(20.0);
        let background = divided_background(20, 10);

        let outcome = canvas.fill(&background, pos2(10.5, 4.0), Color32::RED);
        assert_eq!(outcome, FillOutcome::OnOutline);
        assert_eq!(canvas.history.depth(), 0);
        assert!(canvas.buffer().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_refill_same_color_is_noop() {
        let mut canvas = Canvas::new(8.0);
        canvas.fill(&BLANK, pos2(1.0, 1.0), Color32::GREEN);
        let before = canvas.buffer().clone();

        let outcome = canvas.fill(&BLANK, pos2(4.0, 4.0), Color32::GREEN);
        assert_eq!(outcome, FillOutcome::AlreadyFilled);
        assert_eq!(canvas.buffer(), &before);
        assert_eq!(canvas.history.depth(), 1);
    }

    #[test]
    fn test_replace_respects_tolerance() {
        let mut canvas = Canvas::new(10.0);
        {
            let buffer = canvas.buffer_mut();
            for px in buffer.pixels_mut() {
                *px = Rgba([100, 100, 100, 153]);
            }
            // close to the seed color: within tolerance
            buffer.put_pixel(5, 5, Rgba([110, 110, 110, 160]));
            // far from it: a different sub-region
            buffer.put_pixel(7, 7, Rgba([20, 200, 20, 255]));
        }

        let outcome = canvas.fill(&BLANK, pos2(0.0, 0.0), Color32::BLUE);
        assert!(matches!(
            outcome,
            FillOutcome::Filled {
                mode: RegionMode::Replace(_),
                pixels: 99
            }
        ));

        let buffer = canvas.buffer();
        assert_eq!(*buffer.get_pixel(5, 5), Rgba([0, 0, 255, 153]));
        assert_eq!(*buffer.get_pixel(7, 7), Rgba([20, 200, 20, 255]));
    }

    #[test]
    fn test_empty_mode_skips_colored_pixels() {
        let mut canvas = Canvas::new(10.0);
        {
            let buffer = canvas.buffer_mut();
            // a colored wall across row 5
            for x in 0..10 {
                buffer.put_pixel(x, 5, Rgba([200, 0, 0, 115]));
            }
        }

        let outcome = canvas.fill(&BLANK, pos2(2.0, 2.0), Color32::BLUE);
        assert_eq!(
            outcome,
            FillOutcome::Filled {
                mode: RegionMode::Empty,
                pixels: 50
            }
        );

        let buffer = canvas.buffer();
        assert_eq!(*buffer.get_pixel(3, 5), Rgba([200, 0, 0, 115]));
        assert_eq!(buffer.get_pixel(3, 8)[3], 0);
    }

    #[test]
    fn test_out_of_bounds_and_pending() {
        let mut canvas = Canvas::new(10.0);

        let outcome = canvas.fill(&BLANK, pos2(10.0, 2.0), Color32::RED);
        assert_eq!(outcome, FillOutcome::OutOfBounds);
        let outcome = canvas.fill(&Background::Loading, pos2(2.0, 2.0), Color32::RED);
        assert_eq!(outcome, FillOutcome::BoundaryPending);
        assert_eq!(canvas.history.depth(), 0);
    }

    #[test]
    fn test_concave_region_is_fully_reached() {
        // A "U" of ink open to the top edge, split by a divider that stops
        // short of the bottom: the flood has to turn back upward.
        let size = 12;
        let mut art = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
        for y in 0..10 {
            art.put_pixel(2, y, Rgba([0, 0, 0, 255]));
            art.put_pixel(9, y, Rgba([0, 0, 0, 255]));
        }
        for y in 0..8 {
            art.put_pixel(5, y, Rgba([0, 0, 0, 255]));
        }
        for x in 2..=9 {
            art.put_pixel(x, 9, Rgba([0, 0, 0, 255]));
        }
        let background = Background::ready(DynamicImage::ImageRgba8(art), Some((size, size)));
        let mut canvas = Canvas::new(size as f32);

        canvas.fill(&background, pos2(3.5, 1.0), Color32::RED);

        let buffer = canvas.buffer();
        // inside the U on both sides of the divider, reached around its bottom
        assert_eq!(buffer.get_pixel(4, 3)[3], 153);
        assert_eq!(buffer.get_pixel(7, 3)[3], 153);
        assert_eq!(buffer.get_pixel(7, 8)[3], 153);
        // outside the U is cut off by the arms and the bottom
        assert_eq!(buffer.get_pixel(0, 5)[3], 0);
        assert_eq!(buffer.get_pixel(5, 11)[3], 0);
    }
}
