//! Field recovery from table grids.
//!
//! Many preparers lay the capital-account analysis and income items out
//! as label/value tables. Each row is matched against a small keyword
//! table; the rightmost cell that parses as a number supplies the value.

use tracing::debug;

use super::rules::numeric;
use crate::models::record::{ExtractionMethod, FieldValue, K1Field, RawFieldMap};
use crate::pdf::TableGrid;

/// Row labels worth recognizing, most specific first. A row feeds the
/// first entry whose keyword it contains.
const ROW_LABELS: &[(K1Field, &str)] = &[
    (K1Field::CapitalBeginning, "beginning capital"),
    (K1Field::CapitalEnding, "ending capital"),
    (K1Field::CapitalContributions, "capital contributed"),
    (K1Field::CapitalDistributions, "withdrawals"),
    (K1Field::CapitalDistributions, "distributions"),
    (K1Field::Box1OrdinaryIncome, "ordinary business income"),
    (K1Field::Box2RentalRealEstate, "rental real estate"),
    (K1Field::Box5InterestIncome, "interest income"),
    (K1Field::Box6aOrdinaryDividends, "ordinary dividends"),
    (K1Field::Box7Royalties, "royalties"),
    (K1Field::Box12Section179, "section 179"),
    (K1Field::ProfitSharingPercent, "profit sharing"),
    (K1Field::LossSharingPercent, "loss sharing"),
    (K1Field::CapitalPercent, "ownership percentage"),
];

/// Extract fields from zero or more table grids, tagged
/// [`ExtractionMethod::Table`].
pub fn extract_from_tables(grids: &[TableGrid]) -> RawFieldMap {
    let mut map = RawFieldMap::new(ExtractionMethod::Table);

    for grid in grids {
        for row in grid {
            let Some((field, value)) = match_row(row) else {
                continue;
            };
            map.insert(field, value);
        }
    }

    debug!("Recovered {} fields from {} table grids", map.len(), grids.len());
    map
}

fn match_row(row: &[String]) -> Option<(K1Field, FieldValue)> {
    let label = row
        .iter()
        .filter(|cell| numeric::parse_amount(cell).is_none())
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    if label.is_empty() {
        return None;
    }

    let field = ROW_LABELS
        .iter()
        .find(|(_, keyword)| label.contains(keyword))
        .map(|(field, _)| *field)?;

    // Rightmost numeric cell wins; labels sit left, values right
    let raw = row
        .iter()
        .rev()
        .find(|cell| numeric::parse_amount(cell).is_some())?;

    let value = if matches!(
        field,
        K1Field::ProfitSharingPercent | K1Field::LossSharingPercent | K1Field::CapitalPercent
    ) {
        FieldValue::Percent(numeric::parse_percent(raw)?)
    } else {
        FieldValue::Amount(numeric::parse_amount(raw)?)
    };

    Some((field, value))
}
