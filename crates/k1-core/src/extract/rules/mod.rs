//! Rule-based field extraction for K-1 text.

pub mod numeric;
mod patterns;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::record::{ExtractionMethod, FieldValue, K1Field, RawFieldMap};

/// What kind of value a rule captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Amount,
    Percent,
}

/// An ordered list of patterns for one semantic field. Patterns are tried
/// in order and the first one that yields a usable value wins.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: K1Field,
    pub kind: ValueKind,
    pub patterns: Vec<Regex>,
}

/// Immutable registry of extraction rules, constructed once and shared.
///
/// Rule order within a field is precision-first: labeled, unambiguous
/// patterns come before generic catch-alls, so a bare nine-digit number
/// is only ever read as an EIN when nothing labeled matched.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    rules: Vec<FieldRule>,
}

lazy_static! {
    static ref STANDARD: PatternCatalog = PatternCatalog::build();
}

impl PatternCatalog {
    /// The built-in rule set for Forms 1065/1120S/1041.
    pub fn standard() -> &'static PatternCatalog {
        &STANDARD
    }

    fn build() -> Self {
        let mut rules = vec![
            FieldRule {
                field: K1Field::Ein,
                kind: ValueKind::Text,
                patterns: patterns::ein_rules(),
            },
            FieldRule {
                field: K1Field::TaxYear,
                kind: ValueKind::Text,
                patterns: patterns::tax_year_rules(),
            },
            FieldRule {
                field: K1Field::EntityName,
                kind: ValueKind::Text,
                patterns: patterns::entity_name_rules(),
            },
            FieldRule {
                field: K1Field::PartnerName,
                kind: ValueKind::Text,
                patterns: patterns::partner_name_rules(),
            },
            FieldRule {
                field: K1Field::PartnerTin,
                kind: ValueKind::Text,
                patterns: patterns::partner_tin_rules(),
            },
        ];

        for (field, box_patterns) in patterns::all_box_rules() {
            rules.push(FieldRule {
                field,
                kind: ValueKind::Amount,
                patterns: box_patterns,
            });
        }
        for (field, capital_patterns) in patterns::capital_rules() {
            rules.push(FieldRule {
                field,
                kind: ValueKind::Amount,
                patterns: capital_patterns,
            });
        }
        for (field, pct_patterns) in patterns::percentage_rules() {
            rules.push(FieldRule {
                field,
                kind: ValueKind::Percent,
                patterns: pct_patterns,
            });
        }

        Self { rules }
    }

    /// Run every rule against `text`, producing a field map tagged with
    /// `strategy`. Fields with no matching rule are simply absent.
    pub fn extract(&self, text: &str, strategy: ExtractionMethod) -> RawFieldMap {
        let mut map = RawFieldMap::new(strategy);

        for rule in &self.rules {
            if map.fields.contains_key(&rule.field) {
                continue;
            }
            for pattern in &rule.patterns {
                let Some(caps) = pattern.captures(text) else {
                    continue;
                };
                let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let value = match rule.kind {
                    ValueKind::Text => {
                        let cleaned = clean_text(raw);
                        (!cleaned.is_empty()).then(|| FieldValue::Text(cleaned))
                    }
                    ValueKind::Amount => numeric::parse_amount(raw).map(FieldValue::Amount),
                    ValueKind::Percent => numeric::parse_percent(raw).map(FieldValue::Percent),
                };
                if let Some(value) = value {
                    map.insert(rule.field, value);
                    break;
                }
            }
        }

        map
    }
}

fn clean_text(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(':')
        .trim_end_matches(&[',', '.'][..])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> RawFieldMap {
        PatternCatalog::standard().extract(text, ExtractionMethod::PdfText)
    }

    #[test]
    fn test_labeled_ein_beats_bare_digits() {
        let map = extract("Account 987654321\nEmployer identification number: 12-3456789");
        assert_eq!(
            map.fields.get(&K1Field::Ein),
            Some(&FieldValue::Text("12-3456789".into()))
        );
    }

    #[test]
    fn test_bare_nine_digits_as_last_resort() {
        let map = extract("id 123456789 on file");
        assert_eq!(
            map.fields.get(&K1Field::Ein),
            Some(&FieldValue::Text("123456789".into()))
        );
    }

    #[test]
    fn test_box_number_must_not_match_inside_longer_number() {
        // Box 12's line must not populate box 1 (or box 2)
        let map = extract("12 Section 179 deduction . . . . . 500");
        assert_eq!(map.fields.get(&K1Field::Box1OrdinaryIncome), None);
        assert_eq!(map.fields.get(&K1Field::Box2RentalRealEstate), None);
        assert_eq!(
            map.fields.get(&K1Field::Box12Section179),
            Some(&FieldValue::Amount(500.0))
        );
    }

    #[test]
    fn test_box_value_with_dotted_leaders() {
        let map = extract("1. Ordinary business income (loss) . . . . . . 50,000");
        assert_eq!(
            map.fields.get(&K1Field::Box1OrdinaryIncome),
            Some(&FieldValue::Amount(50000.0))
        );
    }

    #[test]
    fn test_parenthesized_box_value_is_negative() {
        let map = extract("1 Ordinary business income (loss) . . . (12,500)");
        assert_eq!(
            map.fields.get(&K1Field::Box1OrdinaryIncome),
            Some(&FieldValue::Amount(-12500.0))
        );
    }

    #[test]
    fn test_box_value_on_next_line() {
        let map = extract("Box 5 Interest income\n    2,500");
        assert_eq!(
            map.fields.get(&K1Field::Box5InterestIncome),
            Some(&FieldValue::Amount(2500.0))
        );
    }

    #[test]
    fn test_capital_account_lines() {
        let text = "Capital Account Analysis\n\
                    Beginning capital account . . . . . 500,000\n\
                    Capital contributed during year . .      0\n\
                    Withdrawals & distributions . . . .  50,000\n\
                    Ending capital account . . . . . .  559,000";
        let map = extract(text);
        assert_eq!(
            map.fields.get(&K1Field::CapitalBeginning),
            Some(&FieldValue::Amount(500000.0))
        );
        assert_eq!(
            map.fields.get(&K1Field::CapitalContributions),
            Some(&FieldValue::Amount(0.0))
        );
        assert_eq!(
            map.fields.get(&K1Field::CapitalDistributions),
            Some(&FieldValue::Amount(50000.0))
        );
        assert_eq!(
            map.fields.get(&K1Field::CapitalEnding),
            Some(&FieldValue::Amount(559000.0))
        );
    }

    #[test]
    fn test_negative_capital_value() {
        let map = extract("Ending capital account . . . (20,000)");
        assert_eq!(
            map.fields.get(&K1Field::CapitalEnding),
            Some(&FieldValue::Amount(-20000.0))
        );
    }

    #[test]
    fn test_ownership_percentages() {
        let text = "Profit sharing percentage: 50.00%\nLoss sharing: 25%";
        let map = extract(text);
        assert_eq!(
            map.fields.get(&K1Field::ProfitSharingPercent),
            Some(&FieldValue::Percent(50.0))
        );
        assert_eq!(
            map.fields.get(&K1Field::LossSharingPercent),
            Some(&FieldValue::Percent(25.0))
        );
    }

    #[test]
    fn test_entity_and_partner_names() {
        let text = "Partnership's name: ABC Real Estate Partnership LLC\n\
                    Partner's name: John Doe";
        let map = extract(text);
        assert_eq!(
            map.fields.get(&K1Field::EntityName),
            Some(&FieldValue::Text("ABC Real Estate Partnership LLC".into()))
        );
        assert_eq!(
            map.fields.get(&K1Field::PartnerName),
            Some(&FieldValue::Text("John Doe".into()))
        );
    }

    #[test]
    fn test_entity_name_on_line_after_label() {
        let text = "B  Partnership's name, address, city, state, and ZIP code\n\
                    Wayne Enterprises\n800 South Wells St, Chicago, IL 60607";
        let map = extract(text);
        assert_eq!(
            map.fields.get(&K1Field::EntityName),
            Some(&FieldValue::Text("Wayne Enterprises".into()))
        );
    }

    #[test]
    fn test_tax_year_variants() {
        for text in [
            "For calendar year 2023",
            "Calendar year 2023",
            "Tax year 2023",
            "Year ending 12/31/2023",
        ] {
            let map = extract(text);
            assert_eq!(
                map.fields.get(&K1Field::TaxYear),
                Some(&FieldValue::Text("2023".into())),
                "failed on {text:?}"
            );
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Schedule K-1 (Form 1065)\n\
                    For calendar year 2023\n\
                    Employer identification number: 12-3456789\n\
                    1. Ordinary business income (loss) . . . 50,000";
        let first = extract(text);
        let second = extract(text);
        assert_eq!(first.fields, second.fields);
    }
}
