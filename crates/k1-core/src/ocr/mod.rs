//! OCR seam: the orchestrator only needs "image in, text out".

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// A text-recognition backend.
///
/// Implementations own rasterization details; the cascade hands them
/// embedded page images and re-runs pattern extraction over the returned
/// text.
pub trait OcrEngine {
    /// Recognize text in an image. An empty string is a valid result for
    /// a blank page.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}
