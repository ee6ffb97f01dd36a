//! K-1 data model: field identifiers, per-strategy field maps, and the
//! extracted record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed enumeration of every semantic field the extractor can produce.
///
/// Strategies and the merger speak in terms of these identifiers; the
/// record maps each one to a typed slot via [`K1Record::set`] and
/// [`K1Record::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum K1Field {
    // Entity / partner identification
    Ein,
    TaxYear,
    EntityName,
    EntityAddress,
    PartnerName,
    PartnerTin,
    PartnerAddress,

    // Part III income boxes
    Box1OrdinaryIncome,
    Box2RentalRealEstate,
    Box3OtherRental,
    Box4GuaranteedPayments,
    Box5InterestIncome,
    Box6aOrdinaryDividends,
    Box6bQualifiedDividends,
    Box7Royalties,
    Box8NetShortTermGain,
    Box9aNetLongTermGain,
    Box9bCollectiblesGain,
    Box9cUnrecaptured1250,
    Box10Net1231Gain,
    Box11OtherIncome,

    // Part III deductions and other items
    Box12Section179,
    Box13OtherDeductions,
    Box14SelfEmployment,
    Box15Credits,
    Box16ForeignTransactions,
    Box17AmtItems,
    Box18TaxExempt,
    Box19Distributions,
    Box20Other,

    // Part II.L capital account analysis
    CapitalBeginning,
    CapitalContributions,
    CapitalDistributions,
    CapitalEnding,

    // Part II.J ownership percentages
    ProfitSharingPercent,
    LossSharingPercent,
    CapitalPercent,
}

impl K1Field {
    /// Every field, in record order.
    pub const ALL: [K1Field; 37] = [
        K1Field::Ein,
        K1Field::TaxYear,
        K1Field::EntityName,
        K1Field::EntityAddress,
        K1Field::PartnerName,
        K1Field::PartnerTin,
        K1Field::PartnerAddress,
        K1Field::Box1OrdinaryIncome,
        K1Field::Box2RentalRealEstate,
        K1Field::Box3OtherRental,
        K1Field::Box4GuaranteedPayments,
        K1Field::Box5InterestIncome,
        K1Field::Box6aOrdinaryDividends,
        K1Field::Box6bQualifiedDividends,
        K1Field::Box7Royalties,
        K1Field::Box8NetShortTermGain,
        K1Field::Box9aNetLongTermGain,
        K1Field::Box9bCollectiblesGain,
        K1Field::Box9cUnrecaptured1250,
        K1Field::Box10Net1231Gain,
        K1Field::Box11OtherIncome,
        K1Field::Box12Section179,
        K1Field::Box13OtherDeductions,
        K1Field::Box14SelfEmployment,
        K1Field::Box15Credits,
        K1Field::Box16ForeignTransactions,
        K1Field::Box17AmtItems,
        K1Field::Box18TaxExempt,
        K1Field::Box19Distributions,
        K1Field::Box20Other,
        K1Field::CapitalBeginning,
        K1Field::CapitalContributions,
        K1Field::CapitalDistributions,
        K1Field::CapitalEnding,
        K1Field::ProfitSharingPercent,
        K1Field::LossSharingPercent,
        K1Field::CapitalPercent,
    ];
}

/// A single extracted value, typed by what the field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free-text field (names, identifiers, addresses).
    Text(String),
    /// Signed dollar amount.
    Amount(f64),
    /// Ownership percentage (validated to [0, 100] post-hoc).
    Percent(f64),
}

impl FieldValue {
    /// Whether this value carries no usable content.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view: amounts and percentages both yield their value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Amount(v) | FieldValue::Percent(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

/// How a field (or a whole record) was obtained.
///
/// The ranking in [`reliability`](ExtractionMethod::reliability) reflects
/// observed error rates per channel: direct text and form fields read
/// clean, tables are layout-sensitive, OCR is noisiest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Values read out of fillable-form annotations.
    FormFields,
    /// Pattern matching over embedded PDF text.
    #[default]
    PdfText,
    /// Values recovered from table grids.
    Table,
    /// Position-based layout heuristics.
    Layout,
    /// Recognized from rasterized pages.
    Ocr,
    /// Human-entered.
    Manual,
}

impl ExtractionMethod {
    /// Fixed reliability weight used by the confidence scorer.
    pub fn reliability(&self) -> f32 {
        match self {
            ExtractionMethod::Manual => 1.0,
            ExtractionMethod::FormFields | ExtractionMethod::PdfText => 0.95,
            ExtractionMethod::Table => 0.8,
            ExtractionMethod::Layout => 0.6,
            ExtractionMethod::Ocr => 0.4,
        }
    }
}

/// The ephemeral output of one extraction strategy: a strategy tag plus
/// whatever fields that strategy recovered. Consumed by the merger and
/// never retained past a single pass.
#[derive(Debug, Clone)]
pub struct RawFieldMap {
    pub strategy: ExtractionMethod,
    pub fields: BTreeMap<K1Field, FieldValue>,
}

impl RawFieldMap {
    pub fn new(strategy: ExtractionMethod) -> Self {
        Self {
            strategy,
            fields: BTreeMap::new(),
        }
    }

    /// Insert a value unless it is blank or the field was already captured
    /// by an earlier (more specific) rule within this strategy.
    pub fn insert(&mut self, field: K1Field, value: FieldValue) {
        if value.is_blank() {
            return;
        }
        self.fields.entry(field).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Which K-1 variant the document is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormType {
    /// Partnership K-1 (the statistically dominant form).
    #[serde(rename = "1065")]
    Form1065,
    /// S-corporation K-1.
    #[serde(rename = "1120S")]
    Form1120S,
    /// Estate/trust K-1.
    #[serde(rename = "1041")]
    Form1041,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FormType::Form1065 => "1065",
            FormType::Form1120S => "1120S",
            FormType::Form1041 => "1041",
            FormType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The canonical extracted record. Every data field is optional: absence
/// means "not found", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct K1Record {
    pub form_type: FormType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_year: Option<String>,
    pub extraction_method: ExtractionMethod,
    /// Overall extraction confidence in [0, 1].
    pub confidence_score: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ein: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_tin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_1_ordinary_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_2_rental_real_estate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_3_other_rental: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_4_guaranteed_payments: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_5_interest_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_6a_ordinary_dividends: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_6b_qualified_dividends: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_7_royalties: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_8_net_short_term_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_9a_net_long_term_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_9b_collectibles_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_9c_unrecaptured_1250: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_10_net_1231_gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_11_other_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_12_section_179: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_13_other_deductions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_14_self_employment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_15_credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_16_foreign_transactions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_17_amt_items: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_18_tax_exempt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_19_distributions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_20_other: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_beginning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_contributions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_distributions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_ending: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_sharing_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_sharing_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_percent: Option<f64>,

    /// Raw extracted text kept for debugging failed extractions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    /// Non-critical issues found during extraction and validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Critical errors encountered while strategies ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl K1Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a value into the typed slot for `field`. Values of the wrong
    /// kind for the slot are ignored.
    pub fn set(&mut self, field: K1Field, value: &FieldValue) {
        match field {
            K1Field::Ein => self.ein = value.as_text().map(str::to_string),
            K1Field::TaxYear => self.tax_year = value.as_text().map(str::to_string),
            K1Field::EntityName => self.entity_name = value.as_text().map(str::to_string),
            K1Field::EntityAddress => self.entity_address = value.as_text().map(str::to_string),
            K1Field::PartnerName => self.partner_name = value.as_text().map(str::to_string),
            K1Field::PartnerTin => self.partner_tin = value.as_text().map(str::to_string),
            K1Field::PartnerAddress => self.partner_address = value.as_text().map(str::to_string),
            K1Field::Box1OrdinaryIncome => self.box_1_ordinary_income = value.as_number(),
            K1Field::Box2RentalRealEstate => self.box_2_rental_real_estate = value.as_number(),
            K1Field::Box3OtherRental => self.box_3_other_rental = value.as_number(),
            K1Field::Box4GuaranteedPayments => self.box_4_guaranteed_payments = value.as_number(),
            K1Field::Box5InterestIncome => self.box_5_interest_income = value.as_number(),
            K1Field::Box6aOrdinaryDividends => self.box_6a_ordinary_dividends = value.as_number(),
            K1Field::Box6bQualifiedDividends => self.box_6b_qualified_dividends = value.as_number(),
            K1Field::Box7Royalties => self.box_7_royalties = value.as_number(),
            K1Field::Box8NetShortTermGain => self.box_8_net_short_term_gain = value.as_number(),
            K1Field::Box9aNetLongTermGain => self.box_9a_net_long_term_gain = value.as_number(),
            K1Field::Box9bCollectiblesGain => self.box_9b_collectibles_gain = value.as_number(),
            K1Field::Box9cUnrecaptured1250 => self.box_9c_unrecaptured_1250 = value.as_number(),
            K1Field::Box10Net1231Gain => self.box_10_net_1231_gain = value.as_number(),
            K1Field::Box11OtherIncome => self.box_11_other_income = value.as_number(),
            K1Field::Box12Section179 => self.box_12_section_179 = value.as_number(),
            K1Field::Box13OtherDeductions => self.box_13_other_deductions = value.as_number(),
            K1Field::Box14SelfEmployment => self.box_14_self_employment = value.as_number(),
            K1Field::Box15Credits => self.box_15_credits = value.as_number(),
            K1Field::Box16ForeignTransactions => {
                self.box_16_foreign_transactions = value.as_number()
            }
            K1Field::Box17AmtItems => self.box_17_amt_items = value.as_number(),
            K1Field::Box18TaxExempt => self.box_18_tax_exempt = value.as_number(),
            K1Field::Box19Distributions => self.box_19_distributions = value.as_number(),
            K1Field::Box20Other => self.box_20_other = value.as_number(),
            K1Field::CapitalBeginning => self.capital_beginning = value.as_number(),
            K1Field::CapitalContributions => self.capital_contributions = value.as_number(),
            K1Field::CapitalDistributions => self.capital_distributions = value.as_number(),
            K1Field::CapitalEnding => self.capital_ending = value.as_number(),
            K1Field::ProfitSharingPercent => self.profit_sharing_percent = value.as_number(),
            K1Field::LossSharingPercent => self.loss_sharing_percent = value.as_number(),
            K1Field::CapitalPercent => self.capital_percent = value.as_number(),
        }
    }

    /// Read the typed slot for `field` back out as a [`FieldValue`].
    pub fn get(&self, field: K1Field) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let amount = |v: Option<f64>| v.map(FieldValue::Amount);
        let percent = |v: Option<f64>| v.map(FieldValue::Percent);

        match field {
            K1Field::Ein => text(&self.ein),
            K1Field::TaxYear => text(&self.tax_year),
            K1Field::EntityName => text(&self.entity_name),
            K1Field::EntityAddress => text(&self.entity_address),
            K1Field::PartnerName => text(&self.partner_name),
            K1Field::PartnerTin => text(&self.partner_tin),
            K1Field::PartnerAddress => text(&self.partner_address),
            K1Field::Box1OrdinaryIncome => amount(self.box_1_ordinary_income),
            K1Field::Box2RentalRealEstate => amount(self.box_2_rental_real_estate),
            K1Field::Box3OtherRental => amount(self.box_3_other_rental),
            K1Field::Box4GuaranteedPayments => amount(self.box_4_guaranteed_payments),
            K1Field::Box5InterestIncome => amount(self.box_5_interest_income),
            K1Field::Box6aOrdinaryDividends => amount(self.box_6a_ordinary_dividends),
            K1Field::Box6bQualifiedDividends => amount(self.box_6b_qualified_dividends),
            K1Field::Box7Royalties => amount(self.box_7_royalties),
            K1Field::Box8NetShortTermGain => amount(self.box_8_net_short_term_gain),
            K1Field::Box9aNetLongTermGain => amount(self.box_9a_net_long_term_gain),
            K1Field::Box9bCollectiblesGain => amount(self.box_9b_collectibles_gain),
            K1Field::Box9cUnrecaptured1250 => amount(self.box_9c_unrecaptured_1250),
            K1Field::Box10Net1231Gain => amount(self.box_10_net_1231_gain),
            K1Field::Box11OtherIncome => amount(self.box_11_other_income),
            K1Field::Box12Section179 => amount(self.box_12_section_179),
            K1Field::Box13OtherDeductions => amount(self.box_13_other_deductions),
            K1Field::Box14SelfEmployment => amount(self.box_14_self_employment),
            K1Field::Box15Credits => amount(self.box_15_credits),
            K1Field::Box16ForeignTransactions => amount(self.box_16_foreign_transactions),
            K1Field::Box17AmtItems => amount(self.box_17_amt_items),
            K1Field::Box18TaxExempt => amount(self.box_18_tax_exempt),
            K1Field::Box19Distributions => amount(self.box_19_distributions),
            K1Field::Box20Other => amount(self.box_20_other),
            K1Field::CapitalBeginning => amount(self.capital_beginning),
            K1Field::CapitalContributions => amount(self.capital_contributions),
            K1Field::CapitalDistributions => amount(self.capital_distributions),
            K1Field::CapitalEnding => amount(self.capital_ending),
            K1Field::ProfitSharingPercent => percent(self.profit_sharing_percent),
            K1Field::LossSharingPercent => percent(self.loss_sharing_percent),
            K1Field::CapitalPercent => percent(self.capital_percent),
        }
    }

    /// Total income across the income boxes that feed capital
    /// reconciliation (boxes 1-5, 6a, 7, 8, 9a, 11).
    pub fn total_income(&self) -> f64 {
        [
            self.box_1_ordinary_income,
            self.box_2_rental_real_estate,
            self.box_3_other_rental,
            self.box_4_guaranteed_payments,
            self.box_5_interest_income,
            self.box_6a_ordinary_dividends,
            self.box_7_royalties,
            self.box_8_net_short_term_gain,
            self.box_9a_net_long_term_gain,
            self.box_11_other_income,
        ]
        .iter()
        .flatten()
        .sum()
    }

    /// Fraction of the important-field checklist that was populated.
    ///
    /// Most boxes are legitimately empty on any given K-1, so completeness
    /// is measured against fields that should always be present rather
    /// than the whole field set.
    pub fn completeness_score(&self) -> f32 {
        let important = [
            self.ein.is_some(),
            self.tax_year.is_some(),
            self.entity_name.is_some(),
            self.partner_name.is_some(),
            self.box_1_ordinary_income.is_some(),
            self.capital_ending.is_some(),
        ];
        let filled = important.iter().filter(|p| **p).count();
        filled as f32 / important.len() as f32
    }

    /// Difference between the reported ending capital and
    /// `beginning + contributions + income - distributions`, when all the
    /// required components are present.
    pub fn capital_discrepancy(&self) -> Option<f64> {
        let beginning = self.capital_beginning?;
        let ending = self.capital_ending?;
        let distributions = self.capital_distributions?;
        let contributions = self.capital_contributions.unwrap_or(0.0);
        let expected = beginning + contributions + self.total_income() - distributions;
        Some(expected - ending)
    }

    /// Whether the capital account reconciles within `tolerance` dollars.
    /// Returns true when the components needed to check are missing.
    pub fn capital_reconciles(&self, tolerance: f64) -> bool {
        self.capital_discrepancy()
            .is_none_or(|d| d.abs() <= tolerance)
    }

    /// Number of populated data fields.
    pub fn populated_field_count(&self) -> usize {
        K1Field::ALL
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }

    /// Human-readable roll-up of the record.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            form_type: self.form_type,
            tax_year: self.tax_year.clone().unwrap_or_else(|| "unknown".into()),
            entity: self
                .entity_name
                .clone()
                .unwrap_or_else(|| "unknown entity".into()),
            partner: self
                .partner_name
                .clone()
                .unwrap_or_else(|| "unknown partner".into()),
            total_income: self.total_income(),
            completeness: self.completeness_score(),
            confidence: self.confidence_score,
            capital_reconciles: self.capital_reconciles(1.0),
        }
    }
}

/// Quick-display summary of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSummary {
    pub form_type: FormType,
    pub tax_year: String,
    pub entity: String,
    pub partner: String,
    pub total_income: f64,
    pub completeness: f32,
    pub confidence: f32,
    pub capital_reconciles: bool,
}

/// Outcome of one extraction run: either a finalized record or a failure
/// description. Serializes flat for JSON/CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<K1Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
    pub page_count: u32,
    pub file_name: String,
    pub file_size_bytes: u64,
}

impl ExtractionReport {
    /// Build a failure report with no record attached.
    pub fn failure(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            error: Some(error.into()),
            processing_time_ms: 0,
            page_count: 0,
            file_name: file_name.into(),
            file_size_bytes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_get_round_trip() {
        let mut record = K1Record::new();
        record.set(K1Field::Ein, &FieldValue::Text("12-3456789".into()));
        record.set(K1Field::Box1OrdinaryIncome, &FieldValue::Amount(50000.0));
        record.set(K1Field::ProfitSharingPercent, &FieldValue::Percent(50.0));

        assert_eq!(record.ein.as_deref(), Some("12-3456789"));
        assert_eq!(record.box_1_ordinary_income, Some(50000.0));
        assert_eq!(
            record.get(K1Field::Box1OrdinaryIncome),
            Some(FieldValue::Amount(50000.0))
        );
        assert_eq!(
            record.get(K1Field::ProfitSharingPercent),
            Some(FieldValue::Percent(50.0))
        );
    }

    #[test]
    fn test_total_income_skips_missing_boxes() {
        let record = K1Record {
            box_1_ordinary_income: Some(50000.0),
            box_2_rental_real_estate: Some(10000.0),
            box_5_interest_income: Some(2500.0),
            box_6b_qualified_dividends: Some(9999.0), // not part of the total
            ..K1Record::default()
        };
        assert_eq!(record.total_income(), 62500.0);
    }

    #[test]
    fn test_capital_reconciles_exact() {
        let record = K1Record {
            capital_beginning: Some(100000.0),
            capital_contributions: Some(25000.0),
            capital_distributions: Some(0.0),
            capital_ending: Some(175000.0),
            box_1_ordinary_income: Some(50000.0),
            ..K1Record::default()
        };
        assert!(record.capital_reconciles(1.0));
    }

    #[test]
    fn test_capital_does_not_reconcile() {
        let record = K1Record {
            capital_beginning: Some(500000.0),
            capital_contributions: Some(0.0),
            capital_distributions: Some(50000.0),
            capital_ending: Some(559000.0),
            box_1_ordinary_income: Some(100000.0),
            ..K1Record::default()
        };
        // 500000 + 0 + 100000 - 50000 = 550000, off by 9000.
        assert!(!record.capital_reconciles(1.0));
        assert_eq!(record.capital_discrepancy(), Some(-9000.0));
    }

    #[test]
    fn test_capital_reconciles_when_unverifiable() {
        let record = K1Record {
            capital_beginning: Some(100000.0),
            ..K1Record::default()
        };
        assert!(record.capital_reconciles(1.0));
    }

    #[test]
    fn test_completeness_score() {
        let record = K1Record {
            ein: Some("12-3456789".into()),
            tax_year: Some("2023".into()),
            entity_name: Some("ABC Partnership LLC".into()),
            ..K1Record::default()
        };
        assert_eq!(record.completeness_score(), 0.5);
    }

    #[test]
    fn test_blank_text_values() {
        assert!(FieldValue::Text("   ".into()).is_blank());
        assert!(!FieldValue::Amount(0.0).is_blank());

        let mut map = RawFieldMap::new(ExtractionMethod::PdfText);
        map.insert(K1Field::EntityName, FieldValue::Text("".into()));
        assert!(map.is_empty());
    }

    #[test]
    fn test_raw_map_first_rule_wins_within_strategy() {
        let mut map = RawFieldMap::new(ExtractionMethod::PdfText);
        map.insert(K1Field::Ein, FieldValue::Text("12-3456789".into()));
        map.insert(K1Field::Ein, FieldValue::Text("98-7654321".into()));
        assert_eq!(
            map.fields.get(&K1Field::Ein),
            Some(&FieldValue::Text("12-3456789".into()))
        );
    }
}
