use std::cell::RefCell;
use std::rc::Rc;

use coloring_canvas::{CanvasError, ColoringCanvas, EngineConfig, PointerInput, SaveResult};
use egui::{Pos2, pos2, vec2};
use image::{Rgba, RgbaImage};

type Saves = Rc<RefCell<Vec<SaveResult>>>;

fn create_test_canvas(width: f32, height: f32) -> (ColoringCanvas, Saves) {
    let saves: Saves = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&saves);
    let mut canvas = ColoringCanvas::new(EngineConfig::default(), move |result| {
        sink.borrow_mut().push(result);
    });
    canvas.load_page(None);
    canvas.resize(vec2(width, height), 1.0);
    (canvas, saves)
}

fn draw_line(canvas: &mut ColoringCanvas, from: Pos2, to: Pos2) {
    canvas.handle_input(PointerInput::start(from));
    canvas.handle_input(PointerInput::moved(to));
    canvas.handle_input(PointerInput::end(to));
}

fn snapshot(canvas: &ColoringCanvas) -> RgbaImage {
    canvas.surface().buffer().unwrap().clone()
}

fn last_save(saves: &Saves) -> String {
    saves.borrow().last().unwrap().as_ref().unwrap().clone()
}

#[test]
fn test_eraser_clears_band_over_fill() {
    let (mut canvas, saves) = create_test_canvas(100.0, 100.0);
    assert!(canvas.fill(pos2(50.0, 50.0)).is_filled());

    canvas.set_eraser(true);
    canvas.set_brush_size(20.0);
    draw_line(&mut canvas, pos2(10.0, 10.0), pos2(10.0, 50.0));

    let buffer = canvas.surface().buffer().unwrap();
    for y in 11..=49 {
        for x in 0..=19 {
            assert_eq!(*buffer.get_pixel(x, y), Rgba([0, 0, 0, 0]), "pixel ({x}, {y})");
        }
        assert_eq!(buffer.get_pixel(21, y)[3], 153);
    }
    assert_eq!(buffer.get_pixel(10, 70)[3], 153);
    assert_eq!(buffer.get_pixel(60, 30)[3], 153);

    // fill + stroke
    assert_eq!(saves.borrow().len(), 2);
}

#[test]
fn test_marker_stroke_is_translucent() {
    let (mut canvas, saves) = create_test_canvas(80.0, 80.0);
    canvas.set_color_hex("#A8D8FF").unwrap();
    draw_line(&mut canvas, pos2(20.0, 40.0), pos2(60.0, 40.0));

    let buffer = canvas.surface().buffer().unwrap();
    assert_eq!(*buffer.get_pixel(40, 40), Rgba([0xA8, 0xD8, 0xFF, 115]));
    assert_eq!(buffer.get_pixel(40, 10)[3], 0);
    assert_eq!(saves.borrow().len(), 1);
    assert!(!canvas.is_stroking());
}

#[test]
fn test_crossing_strokes_darken() {
    let (mut canvas, _saves) = create_test_canvas(80.0, 80.0);
    canvas.set_color_hex("#A8D8FF").unwrap();
    draw_line(&mut canvas, pos2(10.0, 40.0), pos2(70.0, 40.0));
    let single = *canvas.surface().buffer().unwrap().get_pixel(40, 40);

    draw_line(&mut canvas, pos2(40.0, 10.0), pos2(40.0, 70.0));
    let crossed = *canvas.surface().buffer().unwrap().get_pixel(40, 40);

    assert!(crossed[3] > single[3]);
    assert!(crossed[0] <= single[0]);
    assert!(crossed[1] <= single[1]);
}

#[test]
fn test_press_without_movement_draws_nothing() {
    let (mut canvas, saves) = create_test_canvas(50.0, 50.0);
    let before = snapshot(&canvas);

    canvas.handle_input(PointerInput::start(pos2(25.0, 25.0)));
    canvas.handle_input(PointerInput::end(pos2(25.0, 25.0)));

    assert_eq!(snapshot(&canvas), before);
    assert_eq!(saves.borrow().len(), 1);
}

#[test]
fn test_undo_restores_previous_buffer() {
    let (mut canvas, saves) = create_test_canvas(60.0, 60.0);
    draw_line(&mut canvas, pos2(5.0, 5.0), pos2(30.0, 30.0));
    let after_stroke = snapshot(&canvas);

    assert!(canvas.fill(pos2(55.0, 5.0)).is_filled());
    assert_ne!(snapshot(&canvas), after_stroke);

    assert!(canvas.undo());
    assert_eq!(snapshot(&canvas), after_stroke);
    assert_eq!(saves.borrow().len(), 3);

    assert!(canvas.undo());
    assert!(canvas.surface().buffer().unwrap().pixels().all(|p| p[3] == 0));

    assert!(!canvas.undo());
    assert_eq!(saves.borrow().len(), 4);
}

#[test]
fn test_history_keeps_last_ten_steps() {
    let (mut canvas, _saves) = create_test_canvas(100.0, 100.0);
    canvas.set_brush_size(5.0);

    let mut states = vec![snapshot(&canvas)];
    for i in 0..15 {
        let y = 5.0 + i as f32 * 6.0;
        draw_line(&mut canvas, pos2(10.0, y), pos2(90.0, y));
        states.push(snapshot(&canvas));
    }
    assert_eq!(canvas.history_depth(), 10);

    for _ in 0..10 {
        assert!(canvas.undo());
    }
    assert!(!canvas.undo());

    // The five oldest steps were dropped
    assert_eq!(snapshot(&canvas), states[5]);
    assert_ne!(snapshot(&canvas), states[0]);
}

#[test]
fn test_clear_is_undoable_and_reports_empty() {
    let (mut canvas, saves) = create_test_canvas(40.0, 40.0);
    draw_line(&mut canvas, pos2(5.0, 20.0), pos2(35.0, 20.0));
    let drawn = snapshot(&canvas);

    canvas.clear();
    assert_eq!(last_save(&saves), "");
    assert!(canvas.surface().buffer().unwrap().pixels().all(|p| p[3] == 0));
    assert!(canvas.can_undo());

    assert!(canvas.undo());
    assert_eq!(snapshot(&canvas), drawn);
    assert!(last_save(&saves).starts_with("data:image/png;base64,"));
}

#[test]
fn test_load_page_resets_history_and_buffer() {
    let (mut canvas, _saves) = create_test_canvas(40.0, 40.0);
    draw_line(&mut canvas, pos2(5.0, 5.0), pos2(35.0, 35.0));
    assert!(canvas.can_undo());

    canvas.load_page(None);
    assert!(!canvas.can_undo());
    assert!(canvas.surface().buffer().unwrap().pixels().all(|p| p[3] == 0));
}

#[test]
fn test_initial_drawing_is_restored() {
    let (mut source, _saves) = create_test_canvas(40.0, 30.0);
    source.set_color_hex("#A8D8FF").unwrap();
    source.fill(pos2(1.0, 1.0));
    let data = source.serialize().unwrap();

    let mut same = ColoringCanvas::new(EngineConfig::default(), |_| {});
    same.load_page(Some(&data));
    same.resize(vec2(40.0, 30.0), 1.0);
    assert_eq!(*same.surface().buffer().unwrap().get_pixel(5, 5), Rgba([0xA8, 0xD8, 0xFF, 153]));
    assert!(!same.can_undo());

    // A different size scales the drawing to fit
    let mut larger = ColoringCanvas::new(EngineConfig::default(), |_| {});
    larger.load_page(Some(&data));
    larger.resize(vec2(40.0, 30.0), 2.0);
    let buffer = larger.surface().buffer().unwrap();
    assert_eq!(buffer.dimensions(), (80, 60));
    let px = buffer.get_pixel(40, 30);
    assert!(px[3].abs_diff(153) <= 1);
    assert!(px[0].abs_diff(0xA8) <= 1);
}

#[test]
fn test_undecodable_initial_drawing_starts_blank() {
    let saves: Saves = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&saves);
    let mut canvas = ColoringCanvas::new(EngineConfig::default(), move |result| {
        sink.borrow_mut().push(result);
    });

    canvas.load_page(Some("data:image/png;base64,@@not-base64@@"));
    canvas.resize(vec2(20.0, 20.0), 1.0);

    assert!(canvas.surface().is_ready());
    assert!(canvas.surface().buffer().unwrap().pixels().all(|p| p[3] == 0));
    assert!(saves.borrow().is_empty());
}

#[test]
fn test_save_reports_unready_surface() {
    let saves: Saves = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&saves);
    let mut canvas = ColoringCanvas::new(EngineConfig::default(), move |result| {
        sink.borrow_mut().push(result);
    });
    canvas.load_page(None);

    canvas.save();
    let saves = saves.borrow();
    assert_eq!(saves.len(), 1);
    assert!(matches!(saves[0], Err(CanvasError::SurfaceNotReady)));
}

#[test]
fn test_resize_finishes_stroke_and_drops_history() {
    let (mut canvas, saves) = create_test_canvas(100.0, 100.0);
    canvas.handle_input(PointerInput::start(pos2(10.0, 10.0)));
    canvas.handle_input(PointerInput::moved(pos2(50.0, 10.0)));
    assert!(canvas.is_stroking());

    canvas.resize(vec2(200.0, 100.0), 1.0);

    assert!(!canvas.is_stroking());
    assert_eq!(saves.borrow().len(), 1);
    assert!(!canvas.can_undo());

    // The stroke comes back stretched to the new width
    let buffer = canvas.surface().buffer().unwrap();
    assert_eq!(buffer.dimensions(), (200, 100));
    assert!(buffer.get_pixel(60, 10)[3] > 0);
    assert_eq!(buffer.get_pixel(60, 80)[3], 0);

    // Late events from the interrupted drag are ignored
    canvas.handle_input(PointerInput::moved(pos2(150.0, 80.0)));
    canvas.handle_input(PointerInput::end(pos2(150.0, 80.0)));
    assert_eq!(canvas.surface().buffer().unwrap().get_pixel(150, 80)[3], 0);
    assert_eq!(saves.borrow().len(), 1);
}

#[test]
fn test_resize_to_same_size_keeps_history() {
    let (mut canvas, _saves) = create_test_canvas(50.0, 50.0);
    draw_line(&mut canvas, pos2(5.0, 5.0), pos2(45.0, 45.0));
    let revision = canvas.surface().revision();

    canvas.resize(vec2(50.0, 50.0), 1.0);
    assert!(canvas.can_undo());
    assert_eq!(canvas.surface().revision(), revision);
}

#[test]
fn test_switching_to_fill_mid_stroke_keeps_stroke() {
    let (mut canvas, saves) = create_test_canvas(100.0, 100.0);
    canvas.handle_input(PointerInput::start(pos2(10.0, 10.0)));
    canvas.handle_input(PointerInput::moved(pos2(60.0, 10.0)));

    assert!(canvas.set_fill_mode(true));
    assert!(!canvas.is_stroking());
    assert_eq!(saves.borrow().len(), 1);

    // The pointer-up that follows neither fills nor saves again
    canvas.handle_input(PointerInput::end(pos2(60.0, 10.0)));
    assert_eq!(saves.borrow().len(), 1);
    assert_eq!(canvas.surface().buffer().unwrap().get_pixel(80, 80)[3], 0);

    let saved = coloring_canvas::codec::decode_data_url(&last_save(&saves)).unwrap().unwrap();
    assert!(saved.get_pixel(35, 10)[3] > 0);
}

#[test]
fn test_pointer_up_finishes_stroke_in_any_mode() {
    let (mut canvas, saves) = create_test_canvas(100.0, 100.0);
    canvas.handle_input(PointerInput::start(pos2(10.0, 10.0)));
    canvas.handle_input(PointerInput::moved(pos2(60.0, 10.0)));

    canvas.set_eraser(true);
    canvas.handle_input(PointerInput::end(pos2(60.0, 10.0)));

    assert!(!canvas.is_stroking());
    assert_eq!(saves.borrow().len(), 1);
}

#[test]
fn test_load_page_saves_stroke_in_progress() {
    let (mut canvas, saves) = create_test_canvas(100.0, 100.0);
    canvas.handle_input(PointerInput::start(pos2(10.0, 50.0)));
    canvas.handle_input(PointerInput::moved(pos2(90.0, 50.0)));

    canvas.load_page(None);

    assert!(!canvas.is_stroking());
    assert_eq!(saves.borrow().len(), 1);
    let saved = coloring_canvas::codec::decode_data_url(&last_save(&saves)).unwrap().unwrap();
    assert!(saved.get_pixel(50, 50)[3] > 0);
    assert!(canvas.surface().buffer().unwrap().pixels().all(|p| p[3] == 0));
}

#[test]
fn test_clear_mid_stroke_saves_stroke_first() {
    let (mut canvas, saves) = create_test_canvas(60.0, 60.0);
    canvas.handle_input(PointerInput::start(pos2(5.0, 30.0)));
    canvas.handle_input(PointerInput::moved(pos2(55.0, 30.0)));

    canvas.clear();

    let saves = saves.borrow();
    assert_eq!(saves.len(), 2);
    assert!(saves[0].as_ref().unwrap().starts_with("data:image/png;base64,"));
    assert_eq!(saves[1].as_ref().unwrap(), "");
}
