//! The serialized drawing: a PNG wrapped in a `data:` URL.
//!
//! This is the only artifact that leaves the engine. An empty string means
//! "the drawing was cleared".

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbaImage};

use crate::error::{CanvasError, CanvasResult};

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a buffer as a PNG data URL
pub fn encode_data_url(buffer: &RgbaImage) -> CanvasResult<String> {
    let mut png = Vec::new();
    buffer.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    url.push_str(PNG_DATA_URL_PREFIX);
    STANDARD.encode_string(&png, &mut url);
    Ok(url)
}

/// Decode a `data:image/...;base64,` URL (or bare base64) into RGBA pixels.
///
/// Returns `Ok(None)` for the empty "cleared" sentinel.
pub fn decode_data_url(data: &str) -> CanvasResult<Option<RgbaImage>> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }

    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                CanvasError::MalformedDrawing("data URL has no payload".to_owned())
            })?;
            if !header.ends_with(";base64") {
                return Err(CanvasError::MalformedDrawing(format!(
                    "unsupported data URL encoding {header:?}"
                )));
            }
            payload
        }
        None => data,
    };

    let bytes = STANDARD.decode(payload)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(Some(image.to_rgba8()))
}
