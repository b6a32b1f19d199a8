//! Vision-mode capture pipeline.
//!
//! A vision trigger reads a screenshot from the system clipboard and ships
//! it to the generation backend instead of transcript text. The pipeline is
//! a linear sequence of typed stages, each independently testable:
//! clipboard read, PNG encode, base64 payload.

use base64::Engine;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("clipboard is not available: {0}")]
    ClipboardUnavailable(String),

    /// No image on the clipboard. A user-visible condition, not a retry one.
    #[error("no image on the clipboard")]
    NoImage,

    #[error("could not encode clipboard image: {0}")]
    Encode(String),

    #[error("clipboard task failed: {0}")]
    Task(String),
}

/// Raw RGBA pixels lifted off the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Clipboard access seam. Reads are blocking; callers go through
/// [`capture_payload`], which moves them off the async runtime.
pub trait ClipboardSource: Send + Sync {
    fn read_image(&self) -> Result<ClipboardImage, VisionError>;
}

/// The real system clipboard
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn read_image(&self) -> Result<ClipboardImage, VisionError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| VisionError::ClipboardUnavailable(e.to_string()))?;

        let image = clipboard.get_image().map_err(|e| match e {
            arboard::Error::ContentNotAvailable => VisionError::NoImage,
            other => VisionError::ClipboardUnavailable(other.to_string()),
        })?;

        Ok(ClipboardImage {
            width: image.width as u32,
            height: image.height as u32,
            rgba: image.bytes.into_owned(),
        })
    }
}

/// Encode raw clipboard pixels as PNG.
pub fn encode_png(image: &ClipboardImage) -> Result<Vec<u8>, VisionError> {
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.rgba.clone())
        .ok_or_else(|| VisionError::Encode("pixel buffer does not match dimensions".to_string()))?;

    let mut out = Cursor::new(Vec::new());
    buffer
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| VisionError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}

/// Base64 payload for the generation request.
pub fn to_payload(png: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(png)
}

/// Full pipeline: clipboard read, PNG encode, base64 payload.
pub async fn capture_payload(source: Arc<dyn ClipboardSource>) -> Result<String, VisionError> {
    let image = tokio::task::spawn_blocking(move || source.read_image())
        .await
        .map_err(|e| VisionError::Task(e.to_string()))??;

    let png = encode_png(&image)?;
    Ok(to_payload(&png))
}
