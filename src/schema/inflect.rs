//! String inflection for entity-name heuristics.
//!
//! Column resolution guesses physical names by prefixing the entity's
//! singular form, and the polymorphic budget join emits a singular
//! `entity_type` discriminator. Uses the `inflector` crate with a small
//! irregular table checked first, since database vocabularies lean on a few
//! words suffix rules get wrong.

use inflector::Inflector;

/// Irregular singular/plural pairs that matter for schema vocabularies.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("datum", "data"),
];

/// Singularize a word, handling irregulars first then falling back to inflector.
///
/// Words already singular are returned unchanged, so the helper is safe to
/// apply to names of unknown number ("stages" → "stage", "stage" → "stage").
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return (*singular).to_string();
        }
    }

    word.to_singular()
}
