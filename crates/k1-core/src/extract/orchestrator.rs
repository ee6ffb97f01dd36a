//! The strategy cascade.
//!
//! Strategies run in order of cost and reliability: form-field
//! annotations, then pattern matching over embedded text, then table
//! extraction, then OCR. The two expensive stages are gated on how many
//! fields the cheaper ones already produced, so a clean digital PDF never
//! pays for table parsing or rasterization.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{annotations, classify, confidence, merge::FieldMerger, tables, validate};
use super::rules::PatternCatalog;
use crate::models::config::K1Config;
use crate::models::record::{ExtractionMethod, ExtractionReport, K1Record};
use crate::ocr::OcrEngine;
use crate::pdf::{K1Source, PdfReader};

/// Drives the extraction cascade over one document at a time.
///
/// Holds no per-document state; independent instances can process PDFs in
/// parallel.
pub struct K1Orchestrator {
    config: K1Config,
    catalog: PatternCatalog,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl K1Orchestrator {
    pub fn new() -> Self {
        Self::with_config(K1Config::default())
    }

    pub fn with_config(config: K1Config) -> Self {
        Self {
            config,
            catalog: PatternCatalog::standard().clone(),
            ocr: None,
        }
    }

    /// Replace the standard pattern registry.
    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Attach an OCR backend for the final cascade stage. Without one the
    /// OCR stage records a warning and contributes nothing.
    pub fn with_ocr_engine(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Extract from a PDF on disk. A missing file or unreadable container
    /// is the only hard failure; everything downstream degrades to
    /// partial results.
    pub fn extract_path(&self, path: &Path) -> ExtractionReport {
        let start = Instant::now();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if !path.exists() {
            return ExtractionReport::failure(
                file_name,
                format!("input file not found: {}", path.display()),
            );
        }

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                return ExtractionReport::failure(
                    file_name,
                    format!("failed to read {}: {}", path.display(), e),
                );
            }
        };
        let file_size_bytes = data.len() as u64;

        let mut reader = PdfReader::new().with_min_table_columns(self.config.pdf.min_table_columns);
        if let Err(e) = reader.load(&data) {
            let mut report = ExtractionReport::failure(file_name, e.to_string());
            report.processing_time_ms = start.elapsed().as_millis() as u64;
            report.file_size_bytes = file_size_bytes;
            return report;
        }

        let mut report = self.extract_from_source(&reader, &file_name);
        report.processing_time_ms = start.elapsed().as_millis() as u64;
        report.file_size_bytes = file_size_bytes;
        report
    }

    /// Run the cascade against an already-opened source.
    pub fn extract_from_source(&self, source: &dyn K1Source, file_name: &str) -> ExtractionReport {
        let start = Instant::now();
        let gates = &self.config.cascade;
        let mut merger = FieldMerger::new();
        let mut stage_errors = Vec::new();

        // Stage 1: form-field annotations, the cheapest and cleanest read
        match source.form_fields() {
            Ok(fields) if !fields.is_empty() => {
                merger.absorb(annotations::map_form_fields(&fields));
            }
            Ok(_) => debug!("No filled form fields present"),
            Err(e) => {
                warn!("Form-field stage failed: {}", e);
                stage_errors.push(format!("form-field stage: {}", e));
            }
        }
        info!("After form fields: {} fields", merger.field_count());

        // Stage 2: pattern matching over embedded text. Entity fields
        // found here override stage-1 guesses.
        let mut full_text = match source.text() {
            Ok(text) => text,
            Err(e) => {
                warn!("Text stage failed: {}", e);
                stage_errors.push(format!("text stage: {}", e));
                String::new()
            }
        };
        if !full_text.trim().is_empty() {
            merger.absorb(self.catalog.extract(&full_text, ExtractionMethod::PdfText));
        }
        info!("After text patterns: {} fields", merger.field_count());

        // Stage 3: table extraction, only when cheaper stages under-delivered
        if gates.enable_tables && merger.field_count() < gates.table_field_threshold {
            match source.tables() {
                Ok(grids) => merger.absorb(tables::extract_from_tables(&grids)),
                Err(e) => {
                    warn!("Table stage failed: {}", e);
                    stage_errors.push(format!("table stage: {}", e));
                }
            }
            info!("After tables: {} fields", merger.field_count());
        } else {
            debug!(
                "Skipping table stage ({} fields >= threshold {})",
                merger.field_count(),
                gates.table_field_threshold
            );
        }

        // Stage 4: OCR, the expensive last resort for scanned documents.
        // Recognized text goes back through the same pattern catalog.
        let mut ocr_warning = None;
        if gates.enable_ocr && merger.field_count() < gates.ocr_field_threshold {
            match &self.ocr {
                Some(engine) => match source.page_images() {
                    Ok(images) => {
                        let mut ocr_text = String::new();
                        for (index, image) in images.iter().enumerate() {
                            match engine.recognize(image) {
                                Ok(text) if !text.trim().is_empty() => {
                                    if !ocr_text.is_empty() {
                                        ocr_text.push_str("\n\n");
                                    }
                                    ocr_text.push_str(&text);
                                }
                                Ok(_) => debug!("No text recognized on image {}", index + 1),
                                Err(e) => {
                                    warn!("OCR failed on image {}: {}", index + 1, e);
                                    stage_errors.push(format!("OCR on image {}: {}", index + 1, e));
                                }
                            }
                        }
                        if !ocr_text.trim().is_empty() {
                            merger.absorb(self.catalog.extract(&ocr_text, ExtractionMethod::Ocr));
                            if !full_text.trim().is_empty() {
                                full_text.push_str("\n\n");
                            }
                            full_text.push_str(&ocr_text);
                        }
                    }
                    Err(e) => {
                        warn!("Image extraction for OCR failed: {}", e);
                        stage_errors.push(format!("OCR image stage: {}", e));
                    }
                },
                None => {
                    debug!("OCR gate open but no engine configured");
                    ocr_warning =
                        Some("OCR needed but no engine configured; results may be incomplete");
                }
            }
            info!("After OCR: {} fields", merger.field_count());
        }

        if merger.is_empty() {
            let mut report = ExtractionReport::failure(
                file_name,
                "no fields could be extracted by any strategy",
            );
            report.page_count = source.page_count();
            report.processing_time_ms = start.elapsed().as_millis() as u64;
            return report;
        }

        // Finalize: classify, score, validate
        let mut record = K1Record::new();
        merger.apply_to(&mut record);
        record.extraction_method = merger.dominant_method();
        record.form_type = classify::classify(&full_text, record.entity_name.as_deref());
        if !full_text.trim().is_empty() {
            record.raw_text = Some(full_text);
        }
        record.errors = stage_errors;
        record.confidence_score =
            confidence::score(&record, self.config.validation.capital_tolerance);
        record.warnings = validate::validate(&record, &self.config.validation);
        if let Some(warning) = ocr_warning {
            record.warnings.push(warning.to_string());
        }

        info!(
            "Extraction complete: {} fields, form {}, confidence {:.2}",
            record.populated_field_count(),
            record.form_type,
            record.confidence_score
        );

        ExtractionReport {
            success: true,
            record: Some(record),
            error: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
            page_count: source.page_count(),
            file_name: file_name.to_string(),
            file_size_bytes: 0,
        }
    }
}

impl Default for K1Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::models::record::FormType;
    use crate::pdf::TableGrid;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct StubSource {
        text: String,
        form_fields: BTreeMap<String, String>,
        tables: Vec<TableGrid>,
        images: Vec<image::DynamicImage>,
        tables_called: Cell<bool>,
        images_called: Cell<bool>,
    }

    impl K1Source for StubSource {
        fn page_count(&self) -> u32 {
            1
        }

        fn text(&self) -> crate::pdf::Result<String> {
            Ok(self.text.clone())
        }

        fn form_fields(&self) -> crate::pdf::Result<BTreeMap<String, String>> {
            Ok(self.form_fields.clone())
        }

        fn tables(&self) -> crate::pdf::Result<Vec<TableGrid>> {
            self.tables_called.set(true);
            Ok(self.tables.clone())
        }

        fn page_images(&self) -> crate::pdf::Result<Vec<image::DynamicImage>> {
            self.images_called.set(true);
            Ok(self.images.clone())
        }
    }

    struct StubOcr {
        text: String,
    }

    impl OcrEngine for StubOcr {
        fn recognize(
            &self,
            _image: &image::DynamicImage,
        ) -> std::result::Result<String, OcrError> {
            Ok(self.text.clone())
        }
    }

    /// Text rich enough to clear the table-stage adequacy gate.
    fn rich_text() -> String {
        "Schedule K-1 (Form 1065)\n\
         For calendar year 2023\n\
         Partnership's name: ABC Real Estate Partnership LLC\n\
         Employer identification number: 12-3456789\n\
         Partner's name: John Doe\n\
         1 Ordinary business income (loss) . . . 50,000\n\
         2 Net rental real estate income (loss) . . . 10,000\n\
         5 Interest income . . . 2,500\n\
         6a Ordinary dividends . . . 1,000\n\
         7 Royalties . . . 500\n\
         12 Section 179 deduction . . . 800\n\
         Beginning capital account . . . 100,000\n\
         Capital contributed during year . . . 25,000\n\
         Distributions . . . 0\n\
         Ending capital account . . . 175,000\n\
         Profit sharing percentage: 50%\n\
         Loss sharing percentage: 50%\n"
            .to_string()
    }

    #[test]
    fn test_end_to_end_text_scenario() {
        let source = StubSource {
            text: "Employer identification number: 12-3456789\n\
                   Calendar year 2023\n\
                   1. Ordinary business income (loss) . . . 50,000"
                .to_string(),
            ..StubSource::default()
        };
        let report = K1Orchestrator::new().extract_from_source(&source, "sample.pdf");

        assert!(report.success);
        let record = report.record.unwrap();
        assert_eq!(record.ein.as_deref(), Some("12-3456789"));
        assert_eq!(record.tax_year.as_deref(), Some("2023"));
        assert_eq!(record.box_1_ordinary_income, Some(50000.0));
        assert_eq!(record.extraction_method, ExtractionMethod::PdfText);
    }

    #[test]
    fn test_adequate_text_skips_table_stage() {
        let source = StubSource {
            text: rich_text(),
            ..StubSource::default()
        };
        let report = K1Orchestrator::new().extract_from_source(&source, "rich.pdf");

        assert!(report.success);
        assert!(!source.tables_called.get(), "table stage must be gated off");
        assert!(!source.images_called.get(), "OCR stage must be gated off");
    }

    #[test]
    fn test_sparse_result_invokes_ocr() {
        let source = StubSource {
            text: "Employer identification number: 12-3456789".to_string(),
            images: vec![image::DynamicImage::new_rgba8(4, 4)],
            ..StubSource::default()
        };
        let orchestrator = K1Orchestrator::new().with_ocr_engine(Box::new(StubOcr {
            text: "Calendar year 2023\nPartner's name: John Doe".to_string(),
        }));

        let report = orchestrator.extract_from_source(&source, "scan.pdf");

        assert!(source.tables_called.get(), "table stage should have run");
        assert!(source.images_called.get(), "OCR stage should have run");
        let record = report.record.unwrap();
        assert_eq!(record.tax_year.as_deref(), Some("2023"));
        assert_eq!(record.partner_name.as_deref(), Some("John Doe"));
    }

    #[test]
    fn test_ocr_gate_without_engine_warns() {
        let source = StubSource {
            text: "Employer identification number: 12-3456789".to_string(),
            ..StubSource::default()
        };
        let report = K1Orchestrator::new().extract_from_source(&source, "scan.pdf");

        assert!(!source.images_called.get());
        let record = report.record.unwrap();
        assert!(
            record
                .warnings
                .iter()
                .any(|w| w.contains("no engine configured"))
        );
    }

    #[test]
    fn test_total_failure_returns_no_record() {
        let source = StubSource::default();
        let report = K1Orchestrator::new().extract_from_source(&source, "empty.pdf");

        assert!(!report.success);
        assert!(report.record.is_none());
        assert!(report.error.unwrap().contains("no fields"));
    }

    #[test]
    fn test_missing_file_is_a_hard_failure() {
        let report =
            K1Orchestrator::new().extract_path(Path::new("/nonexistent/dir/missing.pdf"));
        assert!(!report.success);
        assert!(report.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_form_fields_beat_later_ocr_for_box_values() {
        let mut form_fields = BTreeMap::new();
        form_fields.insert("f1_34[0]".to_string(), "100,000".to_string());

        let source = StubSource {
            form_fields,
            images: vec![image::DynamicImage::new_rgba8(4, 4)],
            ..StubSource::default()
        };
        let orchestrator = K1Orchestrator::new().with_ocr_engine(Box::new(StubOcr {
            // OCR misreads the same box; the earlier value must survive
            text: "1 Ordinary business income (loss) . . . 700,000".to_string(),
        }));

        let record = orchestrator
            .extract_from_source(&source, "conflict.pdf")
            .record
            .unwrap();
        assert_eq!(record.box_1_ordinary_income, Some(100000.0));
    }

    #[test]
    fn test_pattern_stage_overrides_entity_guess_from_form_fields() {
        let mut form_fields = BTreeMap::new();
        form_fields.insert("f1_7[0]".to_string(), "Wayne Enterpr".to_string());
        for (name, value) in [
            ("f1_34[0]", "1"),
            ("f1_35[0]", "2"),
            ("f1_36[0]", "3"),
            ("f1_40[0]", "4"),
            ("f1_41[0]", "5"),
        ] {
            form_fields.insert(name.to_string(), value.to_string());
        }

        let source = StubSource {
            form_fields,
            text: "Partnership's name: Wayne Enterprises Partnership".to_string(),
            ..StubSource::default()
        };
        let record = K1Orchestrator::new()
            .extract_from_source(&source, "override.pdf")
            .record
            .unwrap();
        assert_eq!(
            record.entity_name.as_deref(),
            Some("Wayne Enterprises Partnership")
        );
    }

    #[test]
    fn test_classification_flows_from_text() {
        let source = StubSource {
            text: "Schedule K-1 (Form 1120S)\nEIN: 12-3456789".to_string(),
            ..StubSource::default()
        };
        let record = K1Orchestrator::new()
            .extract_from_source(&source, "scorp.pdf")
            .record
            .unwrap();
        assert_eq!(record.form_type, FormType::Form1120S);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let source = StubSource {
            text: rich_text(),
            ..StubSource::default()
        };
        let orchestrator = K1Orchestrator::new();
        let first = orchestrator
            .extract_from_source(&source, "idem.pdf")
            .record
            .unwrap();
        let second = orchestrator
            .extract_from_source(&source, "idem.pdf")
            .record
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
