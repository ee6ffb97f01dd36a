//! Post-extraction validation.
//!
//! Validation annotates, never blocks: every finding is a human-readable
//! warning attached to the record, and no field is ever mutated or
//! rejected here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::config::ValidationConfig;
use crate::models::record::K1Record;

lazy_static! {
    static ref EIN_SHAPE: Regex = Regex::new(r"^\d{2}-\d{7}$").unwrap();
}

/// Check a finalized record and return warnings for anything implausible.
pub fn validate(record: &K1Record, config: &ValidationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Some(ein) = &record.ein {
        if !EIN_SHAPE.is_match(ein) {
            warnings.push(format!(
                "EIN '{}' does not match the expected XX-XXXXXXX shape",
                ein
            ));
        }
    }

    if let Some(year) = &record.tax_year {
        match year.parse::<i32>() {
            Ok(y) if y >= config.min_tax_year && y <= config.max_tax_year => {}
            Ok(y) => warnings.push(format!(
                "tax year {} is outside the plausible range {}-{}",
                y, config.min_tax_year, config.max_tax_year
            )),
            Err(_) => warnings.push(format!("tax year '{}' is not a year", year)),
        }
    }

    for (label, value) in [
        ("profit sharing", record.profit_sharing_percent),
        ("loss sharing", record.loss_sharing_percent),
        ("capital ownership", record.capital_percent),
    ] {
        if let Some(pct) = value {
            if !(0.0..=100.0).contains(&pct) {
                warnings.push(format!(
                    "{} percentage {} is outside the range 0-100",
                    label, pct
                ));
            }
        }
    }

    if let Some(discrepancy) = record.capital_discrepancy() {
        if discrepancy.abs() > config.capital_tolerance {
            warnings.push(format!(
                "capital account does not reconcile: beginning + contributions + income - \
                 distributions differs from ending capital by ${:.2}",
                discrepancy.abs()
            ));
        }
    }

    if let Some(ending) = record.capital_ending {
        if ending < 0.0 {
            warnings.push(format!("ending capital account is negative ({:.2})", ending));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn test_clean_record_has_no_warnings() {
        let record = K1Record {
            ein: Some("12-3456789".into()),
            tax_year: Some("2023".into()),
            profit_sharing_percent: Some(50.0),
            capital_beginning: Some(100000.0),
            capital_contributions: Some(25000.0),
            capital_distributions: Some(0.0),
            capital_ending: Some(175000.0),
            box_1_ordinary_income: Some(50000.0),
            ..K1Record::default()
        };
        assert!(validate(&record, &config()).is_empty());
    }

    #[test]
    fn test_malformed_ein_warns() {
        let record = K1Record {
            ein: Some("123456789".into()),
            ..K1Record::default()
        };
        let warnings = validate(&record, &config());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("EIN"));
    }

    #[test]
    fn test_implausible_tax_year_warns() {
        let record = K1Record {
            tax_year: Some("1987".into()),
            ..K1Record::default()
        };
        let warnings = validate(&record, &config());
        assert!(warnings[0].contains("outside the plausible range"));
    }

    #[test]
    fn test_out_of_range_percentage_warns() {
        let record = K1Record {
            profit_sharing_percent: Some(150.0),
            ..K1Record::default()
        };
        let warnings = validate(&record, &config());
        assert!(warnings[0].contains("outside the range 0-100"));
    }

    #[test]
    fn test_unreconciled_capital_warns() {
        let record = K1Record {
            capital_beginning: Some(500000.0),
            capital_contributions: Some(0.0),
            capital_distributions: Some(50000.0),
            capital_ending: Some(559000.0),
            box_1_ordinary_income: Some(100000.0),
            ..K1Record::default()
        };
        let warnings = validate(&record, &config());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("does not reconcile"));
        assert!(warnings[0].contains("9000.00"));
    }

    #[test]
    fn test_exact_reconciliation_does_not_warn() {
        let record = K1Record {
            capital_beginning: Some(100000.0),
            capital_contributions: Some(25000.0),
            capital_distributions: Some(0.0),
            capital_ending: Some(175000.0),
            box_1_ordinary_income: Some(50000.0),
            ..K1Record::default()
        };
        assert!(validate(&record, &config()).is_empty());
    }

    #[test]
    fn test_negative_ending_capital_warns() {
        let record = K1Record {
            capital_ending: Some(-5000.0),
            ..K1Record::default()
        };
        let warnings = validate(&record, &config());
        assert!(warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_missing_data_cannot_fail_reconciliation() {
        let record = K1Record {
            capital_beginning: Some(100.0),
            ..K1Record::default()
        };
        assert!(validate(&record, &config()).is_empty());
    }
}
