use egui::Color32;

use crate::config::BrushLimits;
use crate::error::{CanvasError, CanvasResult};

/// What a pointer press does on the canvas.
///
/// Eraser and fill are variants of one enum, so they can never be active
/// at the same time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    #[default]
    Brush,
    Eraser,
    Fill,
}

impl ToolMode {
    pub fn is_stroke(&self) -> bool {
        matches!(self, Self::Brush | Self::Eraser)
    }
}

/// Ephemeral brush/fill parameters, set by the host UI
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    mode: ToolMode,
    color: Color32,
    brush_size: f32,
    limits: BrushLimits,
}

impl ToolSettings {
    pub fn new(color: Color32, limits: BrushLimits) -> Self {
        Self {
            mode: ToolMode::Brush,
            color,
            brush_size: limits.default,
            limits,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = Color32::from_rgb(color.r(), color.g(), color.b());
    }

    /// Brush diameter in logical pixels
    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = self.limits.clamp(size);
    }

    pub fn is_eraser(&self) -> bool {
        self.mode == ToolMode::Eraser
    }

    pub fn is_fill(&self) -> bool {
        self.mode == ToolMode::Fill
    }

    /// Turning the eraser on leaves fill mode; turning it off returns to the brush.
    pub fn set_eraser(&mut self, enabled: bool) {
        if enabled {
            self.mode = ToolMode::Eraser;
        } else if self.mode == ToolMode::Eraser {
            self.mode = ToolMode::Brush;
        }
    }

    pub fn set_fill_mode(&mut self, enabled: bool) {
        if enabled {
            self.mode = ToolMode::Fill;
        } else if self.mode == ToolMode::Fill {
            self.mode = ToolMode::Brush;
        }
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into an opaque color
pub fn parse_hex_color(hex: &str) -> CanvasResult<Color32> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(CanvasError::InvalidColor(hex.to_owned()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| CanvasError::InvalidColor(hex.to_owned()))
    };
    Ok(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
