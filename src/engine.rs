use egui::{Color32, Pos2, Vec2};
use image::{DynamicImage, RgbaImage};

use crate::blend;
use crate::boundary::{Background, BoundaryMap};
use crate::config::EngineConfig;
use crate::error::{CanvasError, CanvasResult};
use crate::fill::{FillEngine, FillOutcome, FillParams};
use crate::history::History;
use crate::input::{PointerInput, PointerPhase};
use crate::stroke::{Brush, StrokeEngine};
use crate::surface::Surface;
use crate::tools::{ToolMode, ToolSettings, parse_hex_color};

/// What the host receives after every completed change: the serialized
/// drawing (`""` after a clear), or the reason it could not be encoded.
pub type SaveResult = Result<String, CanvasError>;

type SaveCallback = Box<dyn FnMut(SaveResult)>;

/// The coloring engine: one drawing buffer over an optional line-art background.
///
/// Input is dispatched to the stroke or fill engine depending on the tool
/// mode. Both take a history snapshot before they change the buffer, and the
/// drawing is handed to the save callback when they finish.
pub struct ColoringCanvas {
    config: EngineConfig,
    surface: Surface,
    history: History,
    strokes: StrokeEngine,
    fills: FillEngine,
    background: Background,
    /// Bumped whenever `background` is replaced
    background_epoch: u64,
    tools: ToolSettings,
    /// Most recent serialized drawing, used to repaint after a resize
    last_drawing: Option<String>,
    on_save: SaveCallback,
}

impl std::fmt::Debug for ColoringCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColoringCanvas")
            .field("surface", &self.surface.device_dimensions())
            .field("history_depth", &self.history.depth())
            .field("stroke_active", &self.strokes.is_active())
            .field("tools", &self.tools)
            .field("boundary_ready", &self.boundary_ready())
            .finish()
    }
}

impl ColoringCanvas {
    pub fn new(config: EngineConfig, on_save: impl FnMut(SaveResult) + 'static) -> Self {
        let color = config
            .palette
            .first()
            .and_then(|entry| entry.color().ok())
            .unwrap_or(Color32::from_rgb(0xFF, 0xB3, 0xB3));
        let tools = ToolSettings::new(color, config.brush);
        Self {
            history: History::new(config.history_capacity),
            surface: Surface::new(),
            strokes: StrokeEngine::new(),
            fills: FillEngine::new(),
            background: Background::None,
            background_epoch: 0,
            tools,
            last_drawing: None,
            on_save: Box::new(on_save),
            config,
        }
    }

    /// Start a fresh page: empty history, no background, and the page's saved
    /// drawing (if any) painted back in. A stroke still in progress on the old
    /// page is finished and saved first.
    pub fn load_page(&mut self, initial_drawing: Option<&str>) {
        self.end_stroke();
        self.history.clear();
        self.replace_background(Background::None);
        self.last_drawing = initial_drawing.filter(|data| !data.is_empty()).map(str::to_owned);

        self.surface.clear();
        self.restore_last_drawing();
    }

    /// Host reports the canvas size in logical pixels and the pixel ratio.
    ///
    /// A stroke in progress is finished and saved first. The buffer is then
    /// rebuilt from the last saved drawing, and history is dropped since its
    /// snapshots have the old size.
    pub fn resize(&mut self, logical_size: Vec2, pixels_per_point: f32) {
        let unchanged = self.surface.logical_size() == logical_size
            && self.surface.pixels_per_point() == pixels_per_point
            && self.surface.is_ready();
        if unchanged {
            return;
        }

        if self.strokes.is_active() {
            self.end_stroke();
        }

        let was_ready = self.surface.is_ready();
        if was_ready {
            self.surface
                .resize(logical_size, pixels_per_point, self.last_drawing.as_deref());
        } else if self.surface.initialize(logical_size, pixels_per_point) {
            self.restore_last_drawing();
        }
        log::info!(
            "Canvas resized to {:?} @ {}x -> {:?}",
            logical_size,
            pixels_per_point,
            self.surface.device_dimensions()
        );

        self.history.clear();
        self.background.rebuild(self.buffer_size());
    }

    // Background -------------------------------------------------------------

    /// A new background is on its way. Fill mode is blocked until it arrives.
    pub fn begin_background_load(&mut self) {
        self.replace_background(Background::Loading);
        self.history.clear();
        if self.tools.is_fill() {
            self.tools.set_fill_mode(false);
        }
    }

    /// The background image finished loading
    pub fn set_background(&mut self, image: DynamicImage) {
        log::info!("Background ready ({}x{})", image.width(), image.height());
        let ready = Background::ready(image, self.buffer_size());
        self.replace_background(ready);
    }

    /// Decode encoded image bytes and use them as the background.
    ///
    /// On failure the background is marked unavailable and fills run
    /// unconstrained.
    pub fn set_background_bytes(&mut self, bytes: &[u8]) -> CanvasResult<()> {
        match image::load_from_memory(bytes) {
            Ok(image) => {
                self.set_background(image);
                Ok(())
            }
            Err(err) => {
                self.background_failed(&err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn background_failed(&mut self, reason: &str) {
        log::warn!("Background unavailable, fills are unconstrained: {}", reason);
        self.replace_background(Background::Unavailable);
    }

    /// Switch to a blank page background
    pub fn clear_background(&mut self) {
        self.replace_background(Background::None);
        self.history.clear();
    }

    /// False while a background is loading. Fills are refused until then.
    pub fn boundary_ready(&self) -> bool {
        self.background.allows_fill()
    }

    // Input ------------------------------------------------------------------

    /// Dispatch a pointer event by tool mode. Lifting the pointer finishes a
    /// stroke in progress whatever the mode is by then.
    pub fn handle_input(&mut self, input: PointerInput) {
        match (self.tools.mode(), input.phase) {
            (_, PointerPhase::End) => {
                self.end_stroke();
            }
            (ToolMode::Fill, PointerPhase::Start) => {
                self.fill(input.pos);
            }
            (ToolMode::Fill, PointerPhase::Move) => {}
            (_, PointerPhase::Start) => {
                self.begin_stroke(input.pos);
            }
            (_, PointerPhase::Move) => {
                self.extend_stroke(input.pos);
            }
        }
    }

    pub fn begin_stroke(&mut self, point: Pos2) -> bool {
        self.strokes.begin_stroke(point, &self.surface, &mut self.history)
    }

    pub fn extend_stroke(&mut self, point: Pos2) -> bool {
        let brush = self.brush();
        self.strokes.extend_stroke(point, &mut self.surface, &brush)
    }

    /// Finish the stroke and save. No-op when no stroke is in progress.
    pub fn end_stroke(&mut self) -> bool {
        if !self.strokes.end_stroke() {
            return false;
        }
        self.emit_save();
        true
    }

    /// Bucket fill at a logical point with the current color
    pub fn fill(&mut self, seed: Pos2) -> FillOutcome {
        let params = self.fill_params();
        let outcome = self.fills.fill(
            seed,
            self.tools.color(),
            &params,
            &mut self.surface,
            &self.background,
            &mut self.history,
        );
        match outcome {
            FillOutcome::Filled { pixels, .. } => {
                log::info!("Fill at {:?} painted {} pixels", seed, pixels);
                self.emit_save();
            }
            other => log::debug!("Fill at {:?} skipped: {:?}", seed, other),
        }
        outcome
    }

    // History ----------------------------------------------------------------

    /// Restore the previous snapshot and save it. Returns `false` if there
    /// was nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.strokes.is_active() {
            self.end_stroke();
        }
        if !self.history.undo(&mut self.surface) {
            return false;
        }
        self.emit_save();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Wipe the drawing. Undoable; the host receives `""`.
    pub fn clear(&mut self) {
        self.end_stroke();
        self.history.snapshot(&self.surface);
        self.surface.clear();
        self.last_drawing = None;
        (self.on_save)(Ok(String::new()));
    }

    /// Current drawing as a PNG data URL
    pub fn serialize(&self) -> CanvasResult<String> {
        self.surface.serialize()
    }

    /// Hand the current drawing to the save callback now (e.g. before
    /// leaving the page). An unencodable surface is reported as `Err`.
    pub fn save(&mut self) {
        self.emit_save();
    }

    // Tool settings ----------------------------------------------------------

    pub fn set_color(&mut self, color: Color32) {
        self.tools.set_color(color);
    }

    pub fn set_color_hex(&mut self, hex: &str) -> CanvasResult<()> {
        self.tools.set_color(parse_hex_color(hex)?);
        Ok(())
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.tools.set_brush_size(size);
    }

    pub fn set_eraser(&mut self, enabled: bool) {
        self.tools.set_eraser(enabled);
    }

    /// Enter or leave fill mode. Entering is refused while the background is
    /// loading, and finishes a stroke in progress.
    pub fn set_fill_mode(&mut self, enabled: bool) -> bool {
        if enabled && !self.boundary_ready() {
            log::debug!("Fill mode blocked until the background is ready");
            return false;
        }
        if enabled {
            self.end_stroke();
        }
        self.tools.set_fill_mode(enabled);
        true
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn is_stroking(&self) -> bool {
        self.strokes.is_active()
    }

    /// Changes whenever `display_image` would return something new
    pub fn display_revision(&self) -> (u64, u64) {
        (self.surface.revision(), self.background_epoch)
    }

    /// The drawing multiplied over the line art, as the user sees it.
    /// `None` until the surface has a size.
    pub fn display_image(&self) -> Option<RgbaImage> {
        let drawing = self.surface.buffer()?;
        let line_art = self.background.boundary().map(BoundaryMap::raster);
        Some(blend::compose_display(drawing, line_art))
    }

    // ------------------------------------------------------------------------

    fn brush(&self) -> Brush {
        if self.tools.is_eraser() {
            Brush::eraser(self.tools.brush_size())
        } else {
            Brush::marker(self.tools.color(), self.tools.brush_size(), self.config.marker_opacity)
        }
    }

    fn fill_params(&self) -> FillParams {
        FillParams {
            fill_alpha: self.config.fill_alpha,
            outline_threshold: self.config.outline_threshold,
            empty_alpha_threshold: self.config.empty_alpha_threshold,
            replace_tolerance: self.config.replace_tolerance,
        }
    }

    fn replace_background(&mut self, background: Background) {
        self.background = background;
        self.background_epoch = self.background_epoch.wrapping_add(1);
    }

    fn buffer_size(&self) -> Option<(u32, u32)> {
        self.surface.buffer().map(|buffer| buffer.dimensions())
    }

    fn restore_last_drawing(&mut self) {
        if let Some(data) = self.last_drawing.as_deref() {
            if let Err(err) = self.surface.restore(data) {
                log::warn!("Ignoring saved drawing that could not be restored: {}", err);
            }
        }
    }

    fn emit_save(&mut self) {
        let result = self.surface.serialize();
        match &result {
            Ok(data) => self.last_drawing = Some(data.clone()),
            Err(err) => log::error!("Failed to serialize drawing: {}", err),
        }
        (self.on_save)(result);
    }
}
