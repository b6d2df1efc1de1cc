//! # Unit Vocabulary Module
//!
//! This module holds the recognized-unit vocabulary: canonical unit strings,
//! the alias table mapping spellings, abbreviations, plurals, and French
//! forms onto canonical units, per-unit base conversion factors, and the
//! descriptor word list the parser strips from ingredient names.
//!
//! Units are partitioned into three categories. Conversion within a category
//! goes through a common base unit: milliliters for volume, grams for weight,
//! "each" for count.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// The three measurement categories units are partitioned into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    /// ml, l, cup, tbsp, tsp, fl-oz, pt, qt, gal
    Volume,
    /// mg, g, kg, oz, lb
    Weight,
    /// each, dozen, pair, plus packaging units (bag, can, box)
    Count,
}

/// Canonical count unit assigned when a quantity has no recognized unit
pub const COUNT_UNIT_EACH: &str = "each";

// Base factors per canonical unit: ml for volume, g for weight, each for
// count. Packaging units (bag, can, box) count as 1 unless a caller says
// otherwise.
static BASE_FACTORS: LazyLock<HashMap<&'static str, (UnitCategory, f64)>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Volume, factor to milliliters
    map.insert("ml", (UnitCategory::Volume, 1.0));
    map.insert("l", (UnitCategory::Volume, 1000.0));
    map.insert("tsp", (UnitCategory::Volume, 4.928_921_593_75));
    map.insert("tbsp", (UnitCategory::Volume, 14.786_764_781_25));
    map.insert("fl-oz", (UnitCategory::Volume, 29.573_529_562_5));
    map.insert("cup", (UnitCategory::Volume, 236.588_236_5));
    map.insert("pt", (UnitCategory::Volume, 473.176_473));
    map.insert("qt", (UnitCategory::Volume, 946.352_946));
    map.insert("gal", (UnitCategory::Volume, 3_785.411_784));

    // Weight, factor to grams
    map.insert("mg", (UnitCategory::Weight, 0.001));
    map.insert("g", (UnitCategory::Weight, 1.0));
    map.insert("kg", (UnitCategory::Weight, 1000.0));
    map.insert("oz", (UnitCategory::Weight, 28.349_523_125));
    map.insert("lb", (UnitCategory::Weight, 453.592_37));

    // Count, factor to single items
    map.insert("each", (UnitCategory::Count, 1.0));
    map.insert("dozen", (UnitCategory::Count, 12.0));
    map.insert("pair", (UnitCategory::Count, 2.0));
    map.insert("bag", (UnitCategory::Count, 1.0));
    map.insert("can", (UnitCategory::Count, 1.0));
    map.insert("box", (UnitCategory::Count, 1.0));

    map
});

/// Unit spellings and their canonical forms, English and French
static UNIT_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Volume units
    map.insert("tsp", "tsp");
    map.insert("teaspoon", "tsp");
    map.insert("teaspoons", "tsp");
    map.insert("tbsp", "tbsp");
    map.insert("tablespoon", "tbsp");
    map.insert("tablespoons", "tbsp");
    map.insert("cup", "cup");
    map.insert("cups", "cup");
    map.insert("fl oz", "fl-oz");
    map.insert("fl-oz", "fl-oz");
    map.insert("floz", "fl-oz");
    map.insert("fluid ounce", "fl-oz");
    map.insert("fluid ounces", "fl-oz");
    map.insert("pint", "pt");
    map.insert("pints", "pt");
    map.insert("pt", "pt");
    map.insert("quart", "qt");
    map.insert("quarts", "qt");
    map.insert("qt", "qt");
    map.insert("gallon", "gal");
    map.insert("gallons", "gal");
    map.insert("gal", "gal");
    map.insert("ml", "ml");
    map.insert("milliliter", "ml");
    map.insert("milliliters", "ml");
    map.insert("millilitre", "ml");
    map.insert("millilitres", "ml");
    map.insert("l", "l");
    map.insert("liter", "l");
    map.insert("liters", "l");
    map.insert("litre", "l");
    map.insert("litres", "l");

    // Weight units
    map.insert("mg", "mg");
    map.insert("milligram", "mg");
    map.insert("milligrams", "mg");
    map.insert("g", "g");
    map.insert("gram", "g");
    map.insert("grams", "g");
    map.insert("kg", "kg");
    map.insert("kilogram", "kg");
    map.insert("kilograms", "kg");
    map.insert("oz", "oz");
    map.insert("ounce", "oz");
    map.insert("ounces", "oz");
    map.insert("lb", "lb");
    map.insert("lbs", "lb");
    map.insert("pound", "lb");
    map.insert("pounds", "lb");

    // Count and packaging units
    map.insert("each", "each");
    map.insert("piece", "each");
    map.insert("pieces", "each");
    map.insert("item", "each");
    map.insert("items", "each");
    map.insert("dozen", "dozen");
    map.insert("doz", "dozen");
    map.insert("pair", "pair");
    map.insert("pairs", "pair");
    map.insert("bag", "bag");
    map.insert("bags", "bag");
    map.insert("can", "can");
    map.insert("cans", "can");
    map.insert("box", "box");
    map.insert("boxes", "box");
    map.insert("package", "bag");
    map.insert("packages", "bag");
    map.insert("pkg", "bag");
    map.insert("packet", "bag");
    map.insert("packets", "bag");

    // French units
    map.insert("cuillère à café", "tsp");
    map.insert("cuillères à café", "tsp");
    map.insert("cac", "tsp");
    map.insert("cuillère à soupe", "tbsp");
    map.insert("cuillères à soupe", "tbsp");
    map.insert("cas", "tbsp");
    map.insert("tasse", "cup");
    map.insert("tasses", "cup");
    map.insert("gramme", "g");
    map.insert("grammes", "g");
    map.insert("kilogramme", "kg");
    map.insert("kilogrammes", "kg");
    map.insert("pièce", "each");
    map.insert("pièces", "each");
    map.insert("boîte", "can");
    map.insert("boîtes", "can");
    map.insert("sachet", "bag");
    map.insert("sachets", "bag");
    map.insert("paquet", "bag");
    map.insert("paquets", "bag");

    map
});

// Descriptor words stripped from candidate ingredient names. These are
// adjectives, never units: "large" in "4 large eggs" must not become a unit.
static DESCRIPTORS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "large", "medium", "small", "big", "fresh", "ripe", "frozen", "chopped", "diced",
        "minced", "sliced", "grated", "shredded", "melted", "softened", "ground", "dried",
        "raw", "cooked", "whole", "boneless", "skinless", "peeled", "crushed", "packed",
        "heaping", "level", "extra", "organic", "unsalted", "salted",
        // French descriptors
        "frais", "fraîche", "grand", "grande", "petit", "petite", "haché", "hachée",
        "surgelé", "surgelée", "mûr", "mûre",
    ]
    .into_iter()
    .collect()
});

/// Normalize a unit spelling to its canonical form.
///
/// Handles case folding, a trailing abbreviation dot ("Tbsp." -> "tbsp"),
/// and a plural fallback. Returns `None` for anything outside the
/// recognized vocabulary.
pub fn normalize_unit(token: &str) -> Option<&'static str> {
    let cleaned = token.trim().trim_end_matches('.').to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(&canonical) = UNIT_ALIASES.get(cleaned.as_str()) {
        return Some(canonical);
    }

    // Plural fallback for spellings the alias table lists only in singular
    if let Some(singular) = cleaned.strip_suffix('s') {
        if let Some(&canonical) = UNIT_ALIASES.get(singular) {
            return Some(canonical);
        }
    }

    None
}

/// Category of a canonical unit, or `None` if the unit is unrecognized
pub fn category_of(unit: &str) -> Option<UnitCategory> {
    BASE_FACTORS.get(unit).map(|(category, _)| *category)
}

/// Category and factor-to-base-unit of a canonical unit
pub fn base_factor(unit: &str) -> Option<(UnitCategory, f64)> {
    BASE_FACTORS.get(unit).copied()
}

/// Check whether a word is a descriptor to strip from ingredient names
pub fn is_descriptor(word: &str) -> bool {
    DESCRIPTORS.contains(word.to_lowercase().as_str())
}

/// All canonical units, for vocabulary-wide tests and diagnostics
pub fn canonical_units() -> Vec<&'static str> {
    let mut units: Vec<&'static str> = BASE_FACTORS.keys().copied().collect();
    units.sort_unstable();
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_common_spellings() {
        assert_eq!(normalize_unit("tablespoon"), Some("tbsp"));
        assert_eq!(normalize_unit("Tbsp."), Some("tbsp"));
        assert_eq!(normalize_unit("TBSP"), Some("tbsp"));
        assert_eq!(normalize_unit("cups"), Some("cup"));
        assert_eq!(normalize_unit("lbs"), Some("lb"));
        assert_eq!(normalize_unit("grams"), Some("g"));
        assert_eq!(normalize_unit("litres"), Some("l"));
    }

    #[test]
    fn test_normalize_french_spellings() {
        assert_eq!(normalize_unit("tasse"), Some("cup"));
        assert_eq!(normalize_unit("cuillère à soupe"), Some("tbsp"));
        assert_eq!(normalize_unit("grammes"), Some("g"));
        assert_eq!(normalize_unit("boîte"), Some("can"));
    }

    #[test]
    fn test_descriptors_are_not_units() {
        for word in ["large", "fresh", "chopped", "frozen"] {
            assert!(is_descriptor(word), "'{}' should be a descriptor", word);
            assert_eq!(
                normalize_unit(word),
                None,
                "'{}' must never normalize to a unit",
                word
            );
        }
    }

    #[test]
    fn test_unknown_unit_rejected() {
        assert_eq!(normalize_unit("parsec"), None);
        assert_eq!(normalize_unit(""), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(category_of("cup"), Some(UnitCategory::Volume));
        assert_eq!(category_of("kg"), Some(UnitCategory::Weight));
        assert_eq!(category_of("dozen"), Some(UnitCategory::Count));
        assert_eq!(category_of("large"), None);
    }

    #[test]
    fn test_every_canonical_unit_has_factor_and_self_alias() {
        for unit in canonical_units() {
            assert!(base_factor(unit).is_some(), "no base factor for {unit}");
            assert_eq!(
                normalize_unit(unit),
                Some(unit),
                "canonical unit {unit} should normalize to itself"
            );
        }
    }

    #[test]
    fn test_dozen_and_pair_factors() {
        let (category, factor) = base_factor("dozen").unwrap();
        assert_eq!(category, UnitCategory::Count);
        assert_eq!(factor, 12.0);

        let (_, pair) = base_factor("pair").unwrap();
        assert_eq!(pair, 2.0);
    }
}
