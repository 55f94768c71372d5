use egui::{Context, Pos2, Rect};

use crate::surface::Surface;

/// Phase of a normalized pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

/// The only input the engine sees: a logical canvas position and a phase.
/// Mouse and touch both arrive in this shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pos: Pos2,
    pub phase: PointerPhase,
}

impl PointerInput {
    pub fn start(pos: Pos2) -> Self {
        Self {
            pos,
            phase: PointerPhase::Start,
        }
    }

    pub fn moved(pos: Pos2) -> Self {
        Self {
            pos,
            phase: PointerPhase::Move,
        }
    }

    pub fn end(pos: Pos2) -> Self {
        Self {
            pos,
            phase: PointerPhase::End,
        }
    }
}

/// One frame's worth of raw pointer state, in screen coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSample {
    pub pos: Option<Pos2>,
    pub pressed: bool,
    pub down: bool,
    pub released: bool,
}

impl PointerSample {
    /// Read the primary pointer from egui. Touches are reported by egui as
    /// the primary pointer, so both input kinds go through here.
    pub fn from_context(ctx: &Context) -> Self {
        ctx.input(|input| Self {
            pos: input.pointer.interact_pos(),
            pressed: input.pointer.primary_pressed(),
            down: input.pointer.primary_down(),
            released: input.pointer.primary_released(),
        })
    }
}

/// Converts raw pointer samples into normalized canvas events.
///
/// A drag that leaves the canvas ends there, exactly as if the pointer had
/// been lifted.
#[derive(Debug, Clone)]
pub struct PointerAdapter {
    canvas_rect: Rect,
    dragging: bool,
    last_pos: Option<Pos2>,
}

impl PointerAdapter {
    pub fn new(canvas_rect: Rect) -> Self {
        Self {
            canvas_rect,
            dragging: false,
            last_pos: None,
        }
    }

    /// Update the canvas rectangle (e.g. if window is resized)
    pub fn set_canvas_rect(&mut self, rect: Rect) {
        self.canvas_rect = rect;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Last pointer position seen over the canvas, in canvas coordinates
    pub fn hover_pos(&self) -> Option<Pos2> {
        self.last_pos
            .filter(|pos| self.canvas_rect.contains(*pos))
            .map(|pos| Surface::to_display_coords(pos, self.canvas_rect))
    }

    pub fn process(&mut self, sample: PointerSample) -> Vec<PointerInput> {
        let mut events = Vec::new();
        let rect = self.canvas_rect;
        let to_canvas = move |pos: Pos2| Surface::to_display_coords(pos, rect);

        if let Some(pos) = sample.pos {
            let inside = self.canvas_rect.contains(pos);

            if sample.pressed && inside && !self.dragging {
                self.dragging = true;
                events.push(PointerInput::start(to_canvas(pos)));
            } else if self.dragging && !inside {
                self.dragging = false;
                events.push(PointerInput::end(to_canvas(pos)));
            } else if self.dragging && sample.down && Some(pos) != self.last_pos {
                events.push(PointerInput::moved(to_canvas(pos)));
            }
            self.last_pos = Some(pos);
        } else if self.dragging {
            // Pointer vanished mid-drag (touch lifted, window left)
            self.dragging = false;
            let last = self.last_pos.unwrap_or(self.canvas_rect.min);
            events.push(PointerInput::end(to_canvas(last)));
            self.last_pos = None;
        }

        if self.dragging && (sample.released || !sample.down) {
            self.dragging = false;
            let pos = sample.pos.or(self.last_pos).unwrap_or(self.canvas_rect.min);
            events.push(PointerInput::end(to_canvas(pos)));
        }

        events
    }
}
