use std::collections::VecDeque;

use image::RgbaImage;

use crate::surface::Surface;

/// Bounded stack of full-buffer snapshots for single-step undo.
///
/// Once `capacity` snapshots are held, pushing drops the oldest one; it is
/// gone for good.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<RgbaImage>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a copy of the current buffer. Does nothing while the surface has no buffer.
    pub fn snapshot(&mut self, surface: &Surface) -> bool {
        let Some(buffer) = surface.buffer() else {
            return false;
        };
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(buffer.clone());
        log::debug!("History depth {}", self.snapshots.len());
        true
    }

    /// Restore and pop the newest snapshot.
    ///
    /// Returns `false` when there is nothing to undo. A snapshot whose size no
    /// longer matches the buffer is discarded without touching the surface.
    pub fn undo(&mut self, surface: &mut Surface) -> bool {
        let Some(snapshot) = self.snapshots.pop_back() else {
            log::debug!("Nothing to undo");
            return false;
        };
        if !surface.put_image(&snapshot) {
            log::warn!("Dropping undo snapshot that no longer fits the surface");
            return false;
        }
        true
    }

    /// Returns true if there are snapshots that can be restored
    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.snapshots.len()
    }

    /// Drop every snapshot (new page, new background or resize)
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;
    use image::Rgba;

    fn surface() -> Surface {
        let mut surface = Surface::new();
        surface.initialize(vec2(8.0, 8.0), 1.0);
        surface
    }

    fn paint(surface: &mut Surface, value: u8) {
        for px in surface.buffer_mut().unwrap().pixels_mut() {
            *px = Rgba([value, value, value, 255]);
        }
    }

    #[test]
    fn test_undo_restores_snapshot() {
        let mut surface = surface();
        let mut history = History::new(10);
        paint(&mut surface, 10);
        let before = surface.buffer().unwrap().clone();

        assert!(history.snapshot(&surface));
        paint(&mut surface, 99);
        assert!(history.undo(&mut surface));

        assert_eq!(surface.buffer().unwrap(), &before);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_on_empty_is_noop() {
        let mut surface = surface();
        let mut history = History::new(10);
        paint(&mut surface, 5);
        let before = surface.buffer().unwrap().clone();

        assert!(!history.undo(&mut surface));
        assert_eq!(surface.buffer().unwrap(), &before);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut surface = surface();
        let mut history = History::new(10);
        for step in 0..15u8 {
            paint(&mut surface, step);
            history.snapshot(&surface);
        }
        assert_eq!(history.depth(), 10);

        let mut restored = Vec::new();
        while history.undo(&mut surface) {
            restored.push(surface.buffer().unwrap().get_pixel(0, 0)[0]);
        }
        assert_eq!(restored, (5..15u8).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_without_buffer() {
        let surface = Surface::new();
        let mut history = History::new(3);
        assert!(!history.snapshot(&surface));
        assert_eq!(history.depth(), 0);
    }

    #[test]
    fn test_mismatched_snapshot_is_discarded() {
        let mut surface = surface();
        let mut history = History::new(3);
        history.snapshot(&surface);
        surface.initialize(vec2(4.0, 4.0), 1.0);

        assert!(!history.undo(&mut surface));
        assert_eq!(history.depth(), 0);
    }
}
