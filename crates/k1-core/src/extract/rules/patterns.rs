//! Regex pattern tables for K-1 text extraction.
//!
//! Every field gets an ordered list of patterns, most specific first: a
//! labeled match always beats a bare-shape catch-all, which sits last.
//! Box-number patterns anchor the number at the start of a line and
//! require a word boundary after it, so the box "1" rule can never fire
//! inside "10"-"19" (box misattribution is the dominant failure mode of
//! label matching on this form).

use regex::Regex;

use crate::models::record::K1Field;

/// Capture fragment for a currency value, keeping the sign carriers
/// (leading minus, wrapping parens, trailing dash) for the normalizer.
const VALUE: &str = r"(\(?-?\$?\d[\d,]*(?:\.\d+)?\)?-?)";

/// Same, but the preceding filler must not swallow an opening paren.
const GUARDED_FILLER: &str = r"[^\n\d(\-]*";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {pattern:?}: {e}"))
}

pub(super) fn ein_rules() -> Vec<Regex> {
    vec![
        re(r"(?i)employer\s+identification\s+number[\s:.]*(\d{2}[-\s]?\d{7})"),
        re(r"(?i)\bEIN[\s:.]*(\d{2}[-\s]?\d{7})"),
        re(r"(?i)federal\s+id(?:\s+number)?[\s:.]*(\d{2}[-\s]?\d{7})"),
        re(r"(?i)tax\s+id[\s:.]*(\d{2}[-\s]?\d{7})"),
        re(r"\b(\d{2}-\d{7})\b"),
        // Bare nine digits: last resort only
        re(r"\b(\d{9})\b"),
    ]
}

pub(super) fn tax_year_rules() -> Vec<Regex> {
    vec![
        re(r"(?i)for\s+calendar\s+year\s+(20\d{2})"),
        re(r"(?i)calendar\s+year\s+(20\d{2})"),
        re(r"(?i)tax\s+year\s+(?:beginning|ending)?\s*(20\d{2})"),
        re(r"(?i)year\s+ending\s+\d{1,2}/\d{1,2}/(20\d{2})"),
        re(r"\b(202\d)\b"),
    ]
}

pub(super) fn entity_name_rules() -> Vec<Regex> {
    vec![
        // Official layout: the label line mentions name and address, the
        // value sits on the following line
        re(r"(?im)^[ \t]*(?:B\s+)?partnership's\s+name,\s*address[^\n]*\n[ \t]*([^\n]+)"),
        re(r"(?im)^[ \t]*(?:B\s+)?corporation's\s+name,\s*address[^\n]*\n[ \t]*([^\n]+)"),
        re(r"(?i)partnership's\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)corporation's\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)(?:estate's|trust's)\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)entity\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)name\s+of\s+(?:partnership|corporation|estate|trust)[ \t:]+([^\n]+)"),
        // Suffix heuristic for unlabeled text
        re(r"([A-Z][A-Za-z0-9\s&,.'\-]+(?:LLC|LLP|LP|Corporation|Corp|Inc|Partnership))"),
    ]
}

pub(super) fn partner_name_rules() -> Vec<Regex> {
    vec![
        re(r"(?im)^[ \t]*(?:F\s+)?partner's\s+name,\s*address[^\n]*\n[ \t]*([^\n]+)"),
        re(r"(?i)partner's\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)shareholder's\s+name[ \t:]+([^\n]+)"),
        re(r"(?i)beneficiary's\s+name[ \t:]+([^\n]+)"),
    ]
}

pub(super) fn partner_tin_rules() -> Vec<Regex> {
    vec![
        re(r"(?i)partner's\s+(?:SSN|identifying\s+number)[^\n\d]*(\d{2,3}[-\s]?\d{2}[-\s]?\d{4})"),
        re(r"(?i)shareholder's\s+identifying\s+number[^\n\d]*(\d{2,3}[-\s]?\d{2}[-\s]?\d{4})"),
        re(r"\b(\d{3}-\d{2}-\d{4})\b"),
    ]
}

/// Build the pattern set for one numbered box.
///
/// `num` is a regex fragment for the box number ("1", "6a", "4[abc]?"),
/// `keywords` the identifying words of the printed label in order.
pub(super) fn box_rules(num: &str, keywords: &[&str]) -> Vec<Regex> {
    let kw = keywords.join(r"[-\t \w]*");
    vec![
        // Parenthesized negative on the same line; must come first so the
        // generic variant below cannot strip the sign
        re(&format!(
            r"(?im)^[ \t]*(?:box[ \t]+)?{num}\b\.?[ \t]+{kw}[^\n\d]*(\(\d[\d,]*(?:\.\d+)?\))"
        )),
        // Label and value on one line, dotted leaders and all
        re(&format!(
            r"(?im)^[ \t]*(?:box[ \t]+)?{num}\b\.?[ \t]+{kw}[^\n\d\-]*(-?\$?\d[\d,]*(?:\.\d+)?-?)"
        )),
        // Value on the following line (columnar layouts)
        re(&format!(
            r"(?im)^[ \t]*(?:box[ \t]+)?{num}\b\.?[ \t]+{kw}[^\n]*\n[ \t]*(\(?-?\$?\d[\d,]*(?:\.\d+)?\)?-?)"
        )),
    ]
}

/// All numbered boxes with a usable printed label.
///
/// Boxes 9b/9c are deliberately absent: their labels embed digits
/// ("Collectibles (28%) gain") that defeat label/value splitting, so they
/// are populated from form-field annotations only.
pub(super) fn all_box_rules() -> Vec<(K1Field, Vec<Regex>)> {
    vec![
        (
            K1Field::Box1OrdinaryIncome,
            box_rules("1", &["Ordinary", "business", "income"]),
        ),
        (
            K1Field::Box2RentalRealEstate,
            box_rules("2", &["Net", "rental", "real", "estate"]),
        ),
        (
            K1Field::Box3OtherRental,
            box_rules("3", &["Other", "net", "rental"]),
        ),
        (
            K1Field::Box4GuaranteedPayments,
            box_rules("4[abc]?", &["Guaranteed", "payments"]),
        ),
        (
            K1Field::Box5InterestIncome,
            box_rules("5", &["Interest", "income"]),
        ),
        (
            K1Field::Box6aOrdinaryDividends,
            box_rules("6a", &["Ordinary", "dividends"]),
        ),
        (
            K1Field::Box6bQualifiedDividends,
            box_rules("6b", &["Qualified", "dividends"]),
        ),
        (K1Field::Box7Royalties, box_rules("7", &["Royalties"])),
        (
            K1Field::Box8NetShortTermGain,
            box_rules("8", &["Net", "short", "term", "capital"]),
        ),
        (
            K1Field::Box9aNetLongTermGain,
            box_rules("9a", &["Net", "long", "term", "capital"]),
        ),
        (
            K1Field::Box10Net1231Gain,
            box_rules("10", &["Net", "section", "1231"]),
        ),
        (
            K1Field::Box11OtherIncome,
            box_rules("11", &["Other", "income"]),
        ),
        (
            K1Field::Box12Section179,
            box_rules("12", &["Section", "179"]),
        ),
        (
            K1Field::Box13OtherDeductions,
            box_rules("13", &["Other", "deductions"]),
        ),
        (
            K1Field::Box14SelfEmployment,
            box_rules("14", &["Self", "employment", "earnings"]),
        ),
        (K1Field::Box15Credits, box_rules("15", &["Credits"])),
        (
            K1Field::Box16ForeignTransactions,
            box_rules("16", &["Foreign", "transactions"]),
        ),
        (
            K1Field::Box17AmtItems,
            box_rules("17", &["Alternative", "minimum", "tax"]),
        ),
        (
            K1Field::Box18TaxExempt,
            box_rules("18", &["Tax", "exempt", "income"]),
        ),
        (
            K1Field::Box19Distributions,
            box_rules("19", &["Distributions"]),
        ),
        (
            K1Field::Box20Other,
            box_rules("20", &["Other", "information"]),
        ),
    ]
}

pub(super) fn capital_rules() -> Vec<(K1Field, Vec<Regex>)> {
    vec![
        (
            K1Field::CapitalBeginning,
            vec![
                re(&format!(
                    r"(?i)beginning\s+capital\s+account{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(
                    r"(?i)capital\s+account\s+at\s+beginning{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(r"(?i)beginning\s+balance{GUARDED_FILLER}{VALUE}")),
            ],
        ),
        (
            K1Field::CapitalEnding,
            vec![
                re(&format!(
                    r"(?i)ending\s+capital\s+account{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(
                    r"(?i)capital\s+account\s+at\s+end(?:ing)?{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(r"(?i)ending\s+balance{GUARDED_FILLER}{VALUE}")),
            ],
        ),
        (
            K1Field::CapitalContributions,
            vec![
                re(&format!(
                    r"(?i)capital\s+contributed(?:\s+during\s+(?:the\s+)?year)?{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(r"(?i)\bcontributions{GUARDED_FILLER}{VALUE}")),
            ],
        ),
        (
            K1Field::CapitalDistributions,
            vec![
                re(&format!(
                    r"(?i)withdrawals\s*(?:&|and)\s*distributions{GUARDED_FILLER}{VALUE}"
                )),
                re(&format!(r"(?i)\bdistributions{GUARDED_FILLER}{VALUE}")),
                re(&format!(r"(?i)\bwithdrawals{GUARDED_FILLER}{VALUE}")),
            ],
        ),
    ]
}

pub(super) fn percentage_rules() -> Vec<(K1Field, Vec<Regex>)> {
    let pct = r"(\d+(?:\.\d+)?)\s*%";
    vec![
        (
            K1Field::ProfitSharingPercent,
            vec![
                re(&format!(
                    r"(?i)profit\s+sharing(?:\s+percentage)?[^\n\d]*{pct}"
                )),
                re(&format!(r"(?i)share\s+of\s+profit[^\n\d]*{pct}")),
            ],
        ),
        (
            K1Field::LossSharingPercent,
            vec![
                re(&format!(r"(?i)loss\s+sharing(?:\s+percentage)?[^\n\d]*{pct}")),
                re(&format!(r"(?i)share\s+of\s+loss[^\n\d]*{pct}")),
            ],
        ),
        (
            K1Field::CapitalPercent,
            vec![
                re(&format!(r"(?i)capital\s+(?:ownership|percentage)[^\n\d]*{pct}")),
                re(&format!(r"(?i)ownership\s+percentage[^\n\d]*{pct}")),
            ],
        ),
    ]
}
