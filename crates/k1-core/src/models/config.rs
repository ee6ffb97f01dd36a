//! Configuration for the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the k1 pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K1Config {
    /// PDF reading configuration.
    pub pdf: PdfConfig,

    /// Strategy-cascade configuration.
    pub cascade: CascadeConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,
}

/// PDF reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum cell count for a text line to be treated as a table row.
    pub min_table_columns: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_table_columns: 2,
        }
    }
}

/// Adequacy gates for the strategy cascade.
///
/// The thresholds are empirically tuned field counts: table extraction
/// runs only while the accumulated result holds fewer than
/// `table_field_threshold` fields, OCR only below `ocr_field_threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Run table extraction when fewer than this many fields accumulated.
    pub table_field_threshold: usize,

    /// Run OCR when fewer than this many fields accumulated.
    pub ocr_field_threshold: usize,

    /// Allow the table stage at all.
    pub enable_tables: bool,

    /// Allow the OCR stage at all.
    pub enable_ocr: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            table_field_threshold: 15,
            ocr_field_threshold: 5,
            enable_tables: true,
            enable_ocr: true,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Dollar tolerance for capital-account reconciliation.
    pub capital_tolerance: f64,

    /// Earliest plausible tax year.
    pub min_tax_year: i32,

    /// Latest plausible tax year.
    pub max_tax_year: i32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            capital_tolerance: 1.0,
            min_tax_year: 2000,
            max_tax_year: 2035,
        }
    }
}

impl K1Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = K1Config::default();
        assert_eq!(config.cascade.table_field_threshold, 15);
        assert_eq!(config.cascade.ocr_field_threshold, 5);
        assert_eq!(config.validation.capital_tolerance, 1.0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: K1Config =
            serde_json::from_str(r#"{"cascade": {"ocr_field_threshold": 3}}"#).unwrap();
        assert_eq!(config.cascade.ocr_field_threshold, 3);
        assert_eq!(config.cascade.table_field_threshold, 15);
        assert!(config.cascade.enable_ocr);
    }
}
