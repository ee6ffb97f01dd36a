//! Heuristic confidence scoring.
//!
//! The score exists to triage extractions for manual review, not to
//! certify correctness. Four weighted signals: completeness of the
//! important-field checklist (40%), presence of the critical identifiers
//! (30%), reliability of the extraction channel (20%), and capital
//! account reconciliation (10%).

use crate::models::record::K1Record;

const WEIGHT_COMPLETENESS: f32 = 0.4;
const WEIGHT_CRITICAL: f32 = 0.3;
const WEIGHT_METHOD: f32 = 0.2;
const WEIGHT_CAPITAL: f32 = 0.1;

/// Produce a confidence score in [0, 1] for a finalized record.
pub fn score(record: &K1Record, capital_tolerance: f64) -> f32 {
    let completeness = record.completeness_score();
    let critical = critical_presence(record);
    let method = record.extraction_method.reliability();
    let capital = capital_subscore(record, capital_tolerance);

    (WEIGHT_COMPLETENESS * completeness
        + WEIGHT_CRITICAL * critical
        + WEIGHT_METHOD * method
        + WEIGHT_CAPITAL * capital)
        .min(1.0)
}

/// Fraction of {EIN, tax year, entity name} present.
fn critical_presence(record: &K1Record) -> f32 {
    let present = [
        record.ein.is_some(),
        record.tax_year.is_some(),
        record.entity_name.is_some(),
    ];
    present.iter().filter(|p| **p).count() as f32 / present.len() as f32
}

/// Full credit when the capital account reconciles, partial credit when
/// the components to check are missing, and a reduced (but never zero)
/// score when the arithmetic contradicts the stated ending balance.
fn capital_subscore(record: &K1Record, tolerance: f64) -> f32 {
    match record.capital_discrepancy() {
        None => 0.7,
        Some(d) if d.abs() <= tolerance => 1.0,
        Some(_) => 0.3,
    }
}
