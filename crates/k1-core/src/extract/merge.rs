//! Merging of per-strategy field maps into one accumulated result.

use std::collections::BTreeMap;

use tracing::trace;

use crate::models::record::{ExtractionMethod, FieldValue, K1Field, K1Record, RawFieldMap};

/// Entity-identifying fields that later strategies may overwrite.
///
/// Numeric box and capital figures are first-writer-wins: a clean early
/// read must never be clobbered by a noisier later strategy. Entity
/// metadata is the one exception, since pattern matching routinely
/// refines a name the form-field pass only guessed at.
pub const ENTITY_OVERRIDE_FIELDS: [K1Field; 4] = [
    K1Field::Ein,
    K1Field::EntityName,
    K1Field::TaxYear,
    K1Field::PartnerName,
];

/// Whether a later strategy may overwrite an already-populated field.
pub fn allows_override(field: K1Field) -> bool {
    ENTITY_OVERRIDE_FIELDS.contains(&field)
}

/// Accumulates strategy outputs in cascade order, remembering which
/// strategy supplied each field.
#[derive(Debug, Default)]
pub struct FieldMerger {
    fields: BTreeMap<K1Field, (FieldValue, ExtractionMethod)>,
}

impl FieldMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one strategy's output into the accumulated result.
    ///
    /// Absent fields are always backfilled. Populated fields are
    /// overwritten only for the entity allow-list, and only with a
    /// non-blank value.
    pub fn absorb(&mut self, map: RawFieldMap) {
        let strategy = map.strategy;
        for (field, value) in map.fields {
            if value.is_blank() {
                continue;
            }
            let occupied = self.fields.contains_key(&field);
            if !occupied {
                trace!("{:?} backfilled by {:?}", field, strategy);
                self.fields.insert(field, (value, strategy));
            } else if allows_override(field) {
                trace!("{:?} overridden by {:?}", field, strategy);
                self.fields.insert(field, (value, strategy));
            }
        }
    }

    /// Number of distinct fields accumulated so far; the quantity the
    /// cascade's adequacy gates compare against.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: K1Field) -> Option<&FieldValue> {
        self.fields.get(&field).map(|(value, _)| value)
    }

    /// The strategy that supplied the most fields. Ties break toward the
    /// earlier (more reliable) cascade stage.
    pub fn dominant_method(&self) -> ExtractionMethod {
        let mut counts: BTreeMap<u8, (usize, ExtractionMethod)> = BTreeMap::new();
        for (_, (_, method)) in &self.fields {
            counts
                .entry(stage_rank(*method))
                .or_insert((0, *method))
                .0 += 1;
        }
        counts
            .into_iter()
            .max_by(|(rank_a, (count_a, _)), (rank_b, (count_b, _))| {
                count_a.cmp(count_b).then(rank_b.cmp(rank_a))
            })
            .map(|(_, (_, method))| method)
            .unwrap_or_default()
    }

    /// Write every accumulated field into the record's typed slots.
    pub fn apply_to(&self, record: &mut K1Record) {
        for (field, (value, _)) in &self.fields {
            record.set(*field, value);
        }
    }
}

fn stage_rank(method: ExtractionMethod) -> u8 {
    match method {
        ExtractionMethod::FormFields => 0,
        ExtractionMethod::PdfText => 1,
        ExtractionMethod::Table => 2,
        ExtractionMethod::Layout => 3,
        ExtractionMethod::Ocr => 4,
        ExtractionMethod::Manual => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(
        strategy: ExtractionMethod,
        entries: &[(K1Field, FieldValue)],
    ) -> RawFieldMap {
        let mut map = RawFieldMap::new(strategy);
        for (field, value) in entries {
            map.insert(*field, value.clone());
        }
        map
    }

    #[test]
    fn test_backfill_missing_fields() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::Box1OrdinaryIncome, FieldValue::Amount(50000.0))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::PdfText,
            &[(K1Field::Box5InterestIncome, FieldValue::Amount(2500.0))],
        ));

        assert_eq!(merger.field_count(), 2);
        assert_eq!(
            merger.get(K1Field::Box5InterestIncome),
            Some(&FieldValue::Amount(2500.0))
        );
    }

    #[test]
    fn test_entity_fields_take_later_value() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::EntityName, FieldValue::Text("Wayne Enterpr".into()))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::PdfText,
            &[(
                K1Field::EntityName,
                FieldValue::Text("Wayne Enterprises".into()),
            )],
        ));

        assert_eq!(
            merger.get(K1Field::EntityName),
            Some(&FieldValue::Text("Wayne Enterprises".into()))
        );
    }

    #[test]
    fn test_box_fields_keep_first_value() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::PdfText,
            &[(K1Field::Box1OrdinaryIncome, FieldValue::Amount(50000.0))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::Ocr,
            &[(K1Field::Box1OrdinaryIncome, FieldValue::Amount(58000.0))],
        ));

        assert_eq!(
            merger.get(K1Field::Box1OrdinaryIncome),
            Some(&FieldValue::Amount(50000.0))
        );
    }

    #[test]
    fn test_capital_fields_keep_first_value() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::CapitalEnding, FieldValue::Amount(175000.0))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::Table,
            &[(K1Field::CapitalEnding, FieldValue::Amount(999.0))],
        ));

        assert_eq!(
            merger.get(K1Field::CapitalEnding),
            Some(&FieldValue::Amount(175000.0))
        );
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::Ein, FieldValue::Text("12-3456789".into()))],
        ));
        let mut blank = RawFieldMap::new(ExtractionMethod::Ocr);
        blank
            .fields
            .insert(K1Field::Ein, FieldValue::Text(" ".into()));
        merger.absorb(blank);

        assert_eq!(
            merger.get(K1Field::Ein),
            Some(&FieldValue::Text("12-3456789".into()))
        );
    }

    #[test]
    fn test_dominant_method_prefers_biggest_contributor() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::Ein, FieldValue::Text("12-3456789".into()))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::Ocr,
            &[
                (K1Field::Box1OrdinaryIncome, FieldValue::Amount(1.0)),
                (K1Field::Box5InterestIncome, FieldValue::Amount(2.0)),
            ],
        ));
        assert_eq!(merger.dominant_method(), ExtractionMethod::Ocr);
    }

    #[test]
    fn test_dominant_method_tie_breaks_to_earlier_stage() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::FormFields,
            &[(K1Field::Ein, FieldValue::Text("12-3456789".into()))],
        ));
        merger.absorb(map_with(
            ExtractionMethod::Ocr,
            &[(K1Field::Box1OrdinaryIncome, FieldValue::Amount(1.0))],
        ));
        assert_eq!(merger.dominant_method(), ExtractionMethod::FormFields);
    }

    #[test]
    fn test_apply_to_record() {
        let mut merger = FieldMerger::new();
        merger.absorb(map_with(
            ExtractionMethod::PdfText,
            &[
                (K1Field::Ein, FieldValue::Text("12-3456789".into())),
                (K1Field::Box1OrdinaryIncome, FieldValue::Amount(50000.0)),
            ],
        ));
        let mut record = K1Record::new();
        merger.apply_to(&mut record);
        assert_eq!(record.ein.as_deref(), Some("12-3456789"));
        assert_eq!(record.box_1_ordinary_income, Some(50000.0));
    }
}
