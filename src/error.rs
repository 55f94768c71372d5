use thiserror::Error;

/// Errors that can escape the coloring engine.
///
/// Pointer positions outside the canvas, an unlaid-out container, or an
/// empty history are not errors; those are reported through return values.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Surface has no buffer yet (container has zero area)")]
    SurfaceNotReady,

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Malformed drawing data: {0}")]
    MalformedDrawing(String),

    #[error("Invalid base64 in drawing data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type CanvasResult<T> = Result<T, CanvasError>;
