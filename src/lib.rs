#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod blend;
pub mod boundary;
pub mod codec;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod fill;
pub mod history;
pub mod input;
pub mod panels;
pub mod stroke;
pub mod surface;
pub mod tools;

pub use app::ColoringApp;
pub use boundary::{Background, BoundaryMap};
pub use config::EngineConfig;
pub use engine::{ColoringCanvas, SaveResult};
pub use error::{CanvasError, CanvasResult};
pub use fill::{FillOutcome, RegionMode};
pub use history::History;
pub use input::{PointerAdapter, PointerInput, PointerPhase};
pub use stroke::{Brush, StrokeEngine};
pub use surface::Surface;
pub use tools::{ToolMode, ToolSettings};
