//! Per-pixel compositing on straight (non-premultiplied) RGBA8 pixels.
//!
//! The drawing buffer stores straight alpha, like a 2D canvas readback, so
//! every operator here converts to premultiplied space, composites, and
//! divides the alpha back out.

use egui::Pos2;
use image::{Rgba, RgbaImage};

#[inline]
fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Multiply `src` onto `dst` at `opacity` (0..=1).
///
/// Over transparent pixels this leaves `src` at `opacity`; over colored
/// pixels the channels are multiplied, so repeated passes only darken.
pub fn multiply(dst: &mut Rgba<u8>, src: [u8; 3], opacity: f32) {
    let sa = opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let cs = unit(src[c]);
        let cb = unit(dst[c]);
        let premul = sa * (1.0 - da) * cs + sa * da * (cs * cb) + (1.0 - sa) * da * cb;
        dst[c] = to_u8(premul / out_a);
    }
    dst[3] = to_u8(out_a);
}

/// Remove `coverage` (0..=1) of `dst`'s alpha. Full coverage leaves `[0, 0, 0, 0]`.
pub fn destination_out(dst: &mut Rgba<u8>, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let out_a = to_u8(unit(dst[3]) * (1.0 - coverage));
    if out_a == 0 {
        *dst = Rgba([0, 0, 0, 0]);
    } else {
        dst[3] = out_a;
    }
}

/// Source-over of a straight-alpha `src` onto `dst`
pub fn source_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = unit(src[3]);
    if sa <= 0.0 {
        return;
    }
    let da = unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let premul = unit(src[c]) * sa + unit(dst[c]) * da * (1.0 - sa);
        dst[c] = to_u8(premul / out_a);
    }
    dst[3] = to_u8(out_a);
}

/// Opaque image shown to the user: the drawing multiplied over the line art.
///
/// Each pixel is `line_art * lerp(white, drawing, drawing_alpha)`, so ink
/// stays as dark as it was under any color. Without line art (or when it
/// does not match the drawing's size) the drawing is shown over white.
pub fn compose_display(drawing: &RgbaImage, line_art: Option<&RgbaImage>) -> RgbaImage {
    let line_art = line_art.filter(|art| art.dimensions() == drawing.dimensions());
    let mut out = RgbaImage::new(drawing.width(), drawing.height());

    for (x, y, px) in out.enumerate_pixels_mut() {
        let top = drawing.get_pixel(x, y);
        let base = line_art.map_or(Rgba([255, 255, 255, 255]), |art| *art.get_pixel(x, y));
        let a = unit(top[3]);
        for c in 0..3 {
            let tint = 1.0 - a + a * unit(top[c]);
            px[c] = to_u8(unit(base[c]) * tint);
        }
        px[3] = 255;
    }
    out
}

/// Distance from `p` to the segment `a`..`b`
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Antialiased coverage of a pixel whose center is `distance` away from the
/// spine of a round-capped line of `radius`.
#[inline]
pub fn segment_coverage(distance: f32, radius: f32) -> f32 {
    (radius + 0.5 - distance).clamp(0.0, 1.0)
}
