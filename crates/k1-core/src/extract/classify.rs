//! K-1 form variant classification.

use tracing::debug;

use crate::models::record::FormType;

/// Classify the form variant from extracted text, falling back to entity
/// name keywords when no form title was found. Deterministic: titles are
/// checked in a fixed priority order and the default is 1065, the
/// statistically dominant variant.
pub fn classify(text: &str, entity_name: Option<&str>) -> FormType {
    let lowered = text.to_lowercase();

    // Literal form titles, fixed priority order
    if lowered.contains("form 1065") {
        return FormType::Form1065;
    }
    if lowered.contains("form 1120s") || lowered.contains("form 1120-s") {
        return FormType::Form1120S;
    }
    if lowered.contains("form 1041") {
        return FormType::Form1041;
    }

    // Keyword inference from the entity name
    if let Some(name) = entity_name {
        let name = name.to_lowercase();
        if name.contains("partnership") || name.contains(" lp") || name.contains(" llp") {
            return FormType::Form1065;
        }
        if name.contains("corporation") || name.contains("corp") || name.contains(" inc") {
            return FormType::Form1120S;
        }
        if name.contains("trust") || name.contains("estate") {
            return FormType::Form1041;
        }
    }

    debug!("No form-type signal found, defaulting to 1065");
    FormType::Form1065
}
