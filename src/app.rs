use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use futures::channel::oneshot;
use image::DynamicImage;

use crate::config::EngineConfig;
use crate::engine::ColoringCanvas;
use crate::panels::{CanvasView, tools_panel};

/// Storage key for the last saved drawing
const DRAWING_KEY: &str = "coloring_canvas.drawing";

type BackgroundResult = Result<DynamicImage, String>;

/// What the save callback has received so far
#[derive(Debug, Default)]
pub struct SaveLog {
    /// Latest drawing; `Some("")` after a clear
    pub last_drawing: Option<String>,
    pub last_error: Option<String>,
    pub saves: usize,
}

/// Native host around the coloring engine: palette and actions on top, the
/// canvas below, drawings persisted through eframe storage.
pub struct ColoringApp {
    canvas: ColoringCanvas,
    view: CanvasView,
    saved: Rc<RefCell<SaveLog>>,
    background_rx: Option<oneshot::Receiver<BackgroundResult>>,
}

impl ColoringApp {
    /// Called once before the first frame.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: EngineConfig,
        background: Option<PathBuf>,
    ) -> Self {
        let initial: Option<String> = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, DRAWING_KEY));

        let mut app = Self::with_config(config);
        app.canvas.load_page(initial.as_deref());
        if let Some(path) = background {
            app.load_background(path);
        }
        app
    }

    fn with_config(config: EngineConfig) -> Self {
        let saved = Rc::new(RefCell::new(SaveLog::default()));
        let sink = Rc::clone(&saved);
        let canvas = ColoringCanvas::new(config, move |result| {
            let mut log = sink.borrow_mut();
            log.saves += 1;
            match result {
                Ok(drawing) => {
                    log.last_drawing = Some(drawing);
                    log.last_error = None;
                }
                Err(err) => log.last_error = Some(err.to_string()),
            }
        });

        Self {
            canvas,
            view: CanvasView::default(),
            saved,
            background_rx: None,
        }
    }

    /// Decode the background on a worker thread; fill mode waits for it.
    pub fn load_background(&mut self, path: PathBuf) {
        log::info!("Loading background {}", path.display());
        self.canvas.begin_background_load();

        let (tx, rx) = oneshot::channel();
        std::thread::spawn(move || {
            let result = std::fs::read(&path)
                .map_err(|err| format!("{}: {}", path.display(), err))
                .and_then(|bytes| image::load_from_memory(&bytes).map_err(|err| err.to_string()));
            // The receiver is gone only if the app already closed.
            let _ = tx.send(result);
        });
        self.background_rx = Some(rx);
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        let received = match self.background_rx.as_mut() {
            Some(rx) => rx.try_recv(),
            None => return,
        };
        match received {
            Ok(Some(Ok(image))) => {
                self.canvas.set_background(image);
                self.background_rx = None;
            }
            Ok(Some(Err(reason))) => {
                self.canvas.background_failed(&reason);
                self.background_rx = None;
            }
            Ok(None) => ctx.request_repaint(),
            Err(_canceled) => {
                self.canvas.background_failed("background loader stopped");
                self.background_rx = None;
            }
        }
    }

    pub fn canvas(&self) -> &ColoringCanvas {
        &self.canvas
    }

    pub fn save_log(&self) -> std::cell::Ref<'_, SaveLog> {
        self.saved.borrow()
    }
}

impl eframe::App for ColoringApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Some(drawing) = &self.saved.borrow().last_drawing {
            eframe::set_value(storage, DRAWING_KEY, drawing);
        }
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background(ctx);

        egui::TopBottomPanel::top("tools").show(ctx, |ui| {
            tools_panel(ui, &mut self.canvas);
            if let Some(err) = &self.saved.borrow().last_error {
                ui.colored_label(egui::Color32::RED, format!("Drawing not saved: {err}"));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.view.show(ui, &mut self.canvas);
        });
    }
}
