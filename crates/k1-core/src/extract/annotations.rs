//! Mapping of AcroForm annotation names onto semantic fields.
//!
//! The official fillable Schedule K-1 names its widgets `f1_N[0]` for
//! text fields and `c1_N[0]` for checkboxes, numbered top to bottom.
//! Checkbox states carry no slot in the record and are ignored.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::rules::numeric;
use crate::models::record::{ExtractionMethod, FieldValue, K1Field, RawFieldMap};

enum Slot {
    Text(K1Field),
    Amount(K1Field),
    Percent(K1Field),
    /// Entity name on the first line, address on the rest.
    EntityNameAddress,
    /// Partner name on the first line, address on the rest.
    PartnerNameAddress,
}

fn slot_for(name: &str) -> Option<Slot> {
    let slot = match name {
        // Part I - partnership information
        "f1_6[0]" => Slot::Text(K1Field::Ein),
        "f1_7[0]" => Slot::EntityNameAddress,

        // Part II - partner information
        "f1_9[0]" => Slot::Text(K1Field::PartnerTin),
        "f1_10[0]" => Slot::PartnerNameAddress,

        // Part II.J - ending share percentages
        "f1_15[0]" => Slot::Percent(K1Field::ProfitSharingPercent),
        "f1_17[0]" => Slot::Percent(K1Field::LossSharingPercent),
        "f1_19[0]" => Slot::Percent(K1Field::CapitalPercent),

        // Part II.L - capital account analysis
        "f1_26[0]" => Slot::Amount(K1Field::CapitalBeginning),
        "f1_27[0]" => Slot::Amount(K1Field::CapitalContributions),
        "f1_30[0]" => Slot::Amount(K1Field::CapitalDistributions),
        "f1_31[0]" => Slot::Amount(K1Field::CapitalEnding),

        // Part III - income, deductions, other items
        "f1_34[0]" => Slot::Amount(K1Field::Box1OrdinaryIncome),
        "f1_35[0]" => Slot::Amount(K1Field::Box2RentalRealEstate),
        "f1_36[0]" => Slot::Amount(K1Field::Box3OtherRental),
        "f1_39[0]" => Slot::Amount(K1Field::Box4GuaranteedPayments),
        "f1_40[0]" => Slot::Amount(K1Field::Box5InterestIncome),
        "f1_41[0]" => Slot::Amount(K1Field::Box6aOrdinaryDividends),
        "f1_42[0]" => Slot::Amount(K1Field::Box6bQualifiedDividends),
        "f1_44[0]" => Slot::Amount(K1Field::Box7Royalties),
        "f1_45[0]" => Slot::Amount(K1Field::Box8NetShortTermGain),
        "f1_46[0]" => Slot::Amount(K1Field::Box9aNetLongTermGain),
        "f1_47[0]" => Slot::Amount(K1Field::Box9bCollectiblesGain),
        "f1_48[0]" => Slot::Amount(K1Field::Box9cUnrecaptured1250),
        "f1_49[0]" => Slot::Amount(K1Field::Box10Net1231Gain),
        "f1_50[0]" => Slot::Amount(K1Field::Box12Section179),
        "f1_51[0]" => Slot::Amount(K1Field::Box17AmtItems),
        "f1_52[0]" => Slot::Amount(K1Field::Box19Distributions),
        "f1_53[0]" => Slot::Amount(K1Field::Box16ForeignTransactions),

        _ => return None,
    };
    Some(slot)
}

/// Convert a raw annotation-name map into a [`RawFieldMap`] tagged
/// [`ExtractionMethod::FormFields`].
pub fn map_form_fields(raw: &BTreeMap<String, String>) -> RawFieldMap {
    let mut map = RawFieldMap::new(ExtractionMethod::FormFields);

    for (name, value) in raw {
        let Some(slot) = slot_for(name) else {
            trace!("unmapped annotation {}", name);
            continue;
        };

        match slot {
            Slot::Text(field) => {
                map.insert(field, FieldValue::Text(value.trim().to_string()));
            }
            Slot::Amount(field) => {
                if let Some(amount) = numeric::parse_amount(value) {
                    map.insert(field, FieldValue::Amount(amount));
                }
            }
            Slot::Percent(field) => {
                if let Some(pct) = numeric::parse_percent(value) {
                    map.insert(field, FieldValue::Percent(pct));
                }
            }
            Slot::EntityNameAddress => {
                let (name_line, address) = split_name_address(value);
                map.insert(K1Field::EntityName, FieldValue::Text(name_line));
                if let Some(address) = address {
                    map.insert(K1Field::EntityAddress, FieldValue::Text(address));
                }
            }
            Slot::PartnerNameAddress => {
                let (name_line, address) = split_name_address(value);
                map.insert(K1Field::PartnerName, FieldValue::Text(name_line));
                if let Some(address) = address {
                    map.insert(K1Field::PartnerAddress, FieldValue::Text(address));
                }
            }
        }
    }

    debug!("Mapped {} fields from {} annotations", map.len(), raw.len());
    map
}

/// Split a combined name/address widget: name on the first line, the
/// remaining lines joined as the address.
fn split_name_address(value: &str) -> (String, Option<String>) {
    let mut lines = value.lines().map(str::trim).filter(|l| !l.is_empty());
    let name = lines.next().unwrap_or("").to_string();
    let rest: Vec<&str> = lines.collect();
    let address = (!rest.is_empty()).then(|| rest.join(", "));
    (name, address)
}
