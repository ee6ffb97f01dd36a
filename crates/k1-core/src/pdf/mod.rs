//! PDF source adapters.

mod reader;

pub use reader::PdfReader;

use std::collections::BTreeMap;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// One extracted table: rows of cell strings.
pub type TableGrid = Vec<Vec<String>>;

/// Read-only access to the raw content channels of a K-1 document.
///
/// Each channel is best-effort and independent of the others. A failing
/// channel returns its own error; the orchestrator converts that into
/// "zero fields contributed" and moves on.
pub trait K1Source {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Best-effort plain text for the whole document.
    fn text(&self) -> Result<String>;

    /// Fillable-form field values keyed by annotation name. Empty when
    /// the PDF carries no filled AcroForm.
    fn form_fields(&self) -> Result<BTreeMap<String, String>>;

    /// Zero or more table grids recovered from the document.
    fn tables(&self) -> Result<Vec<TableGrid>>;

    /// Embedded page images, for OCR on scanned documents.
    fn page_images(&self) -> Result<Vec<DynamicImage>>;
}
