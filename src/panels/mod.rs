mod central_panel;
mod tools_panel;

pub use central_panel::CanvasView;
pub use tools_panel::tools_panel;
