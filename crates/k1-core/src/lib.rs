//! Core library for Schedule K-1 extraction.
//!
//! This crate provides:
//! - PDF reading (text, form-field annotations, table grids, page images)
//! - A cascade of extraction strategies with adequacy-gated fallbacks
//! - K-1 field extraction (EIN, tax year, per-box amounts, capital account)
//! - Confidence scoring and cross-field validation

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use error::{K1Error, Result};
pub use extract::{FieldMerger, K1Orchestrator, PatternCatalog};
pub use models::config::K1Config;
pub use models::record::{
    ExtractionMethod, ExtractionReport, FieldValue, FormType, K1Field, K1Record, RawFieldMap,
};
pub use ocr::OcrEngine;
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use pdf::{K1Source, PdfReader, TableGrid};
