use std::path::Path;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, CanvasResult};
use crate::tools::parse_hex_color;

/// A named swatch offered by the host palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    /// `#RRGGBB`
    pub hex: String,
}

impl PaletteEntry {
    fn new(name: &str, hex: &str) -> Self {
        Self {
            name: name.to_owned(),
            hex: hex.to_owned(),
        }
    }

    pub fn color(&self) -> CanvasResult<Color32> {
        parse_hex_color(&self.hex)
    }
}

/// Brush diameter range exposed to the host slider, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl Default for BrushLimits {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 50.0,
            step: 5.0,
            default: 20.0,
        }
    }
}

impl BrushLimits {
    pub fn clamp(&self, size: f32) -> f32 {
        size.clamp(self.min, self.max)
    }
}

/// Tunables of the coloring engine.
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo snapshots kept
    pub history_capacity: usize,
    /// Opacity of brush segments composited with multiply
    pub marker_opacity: f32,
    /// Alpha written into every filled pixel
    pub fill_alpha: u8,
    /// A boundary pixel whose mean RGB is below this is line art
    pub outline_threshold: u8,
    /// A drawing pixel with alpha below this counts as empty
    pub empty_alpha_threshold: u8,
    /// Max summed |dR|+|dG|+|dB|+|dA| from the seed color in replace fills
    pub replace_tolerance: u32,
    pub brush: BrushLimits,
    pub palette: Vec<PaletteEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            marker_opacity: 0.45,
            fill_alpha: 153,
            outline_threshold: 100,
            empty_alpha_threshold: 10,
            replace_tolerance: 96,
            brush: BrushLimits::default(),
            palette: vec![
                PaletteEntry::new("Red", "#FFB3B3"),
                PaletteEntry::new("Orange", "#FFCC99"),
                PaletteEntry::new("Yellow", "#FFF2AA"),
                PaletteEntry::new("Green", "#A8E6B4"),
                PaletteEntry::new("Blue", "#A8D8FF"),
                PaletteEntry::new("Purple", "#E6B3FF"),
                PaletteEntry::new("Pink", "#FFCCE0"),
                PaletteEntry::new("Brown", "#C89B7B"),
            ],
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::info!("Loading engine config from {}", path.display());
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> CanvasResult<()> {
        if self.history_capacity == 0 {
            return Err(CanvasError::InvalidConfig(
                "history_capacity must be at least 1".to_owned(),
            ));
        }
        if !(self.marker_opacity > 0.0 && self.marker_opacity <= 1.0) {
            return Err(CanvasError::InvalidConfig(format!(
                "marker_opacity must be in (0, 1], got {}",
                self.marker_opacity
            )));
        }
        let brush = &self.brush;
        if !(brush.min > 0.0 && brush.min <= brush.default && brush.default <= brush.max) {
            return Err(CanvasError::InvalidConfig(format!(
                "brush sizes must satisfy 0 < min <= default <= max, got {} / {} / {}",
                brush.min, brush.default, brush.max
            )));
        }
        for entry in &self.palette {
            entry.color()?;
        }
        Ok(())
    }
}
