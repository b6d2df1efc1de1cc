//! # Ingredient Parser
//!
//! This module parses one free-text recipe ingredient line into a structured
//! [`RecipeIngredient`]: a best-effort amount, a canonical unit, and a
//! descriptor-stripped name.
//!
//! ## Features
//!
//! - Integers, decimals, simple fractions ("1/2"), mixed fractions
//!   ("2 1/4"), unicode vulgar fractions ("½"), and ranges ("2-3", taken at
//!   their midpoint)
//! - Unit recognition against the fixed vocabulary in [`crate::unit_table`],
//!   including attached forms ("500g") and multi-word units ("fl oz",
//!   "cuillère à soupe")
//! - Descriptor words ("large", "fresh") are stripped from names and never
//!   mistaken for units
//! - Parsing never fails: the worst case is a name-only ingredient with no
//!   amount, which downstream stages treat as "unmatchable quantity,
//!   name-only match"
//!
//! ## Usage
//!
//! ```rust
//! use pantry_engine::ingredient_parser::parse_ingredient_line;
//!
//! let ingredient = parse_ingredient_line("4 large eggs");
//! assert_eq!(ingredient.parsed_amount, Some(4.0));
//! assert_eq!(ingredient.parsed_unit.as_deref(), Some("each"));
//! assert_eq!(ingredient.normalized_name, "eggs");
//! ```

use crate::ingredient_model::RecipeIngredient;
use crate::unit_table::{self, COUNT_UNIT_EACH};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

lazy_static! {
    static ref DECIMAL_RE: Regex =
        Regex::new(r"^\d+(?:\.\d+)?$").expect("decimal pattern should be valid");
    static ref FRACTION_RE: Regex =
        Regex::new(r"^(\d+)/(\d+)$").expect("fraction pattern should be valid");
    static ref RANGE_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)[-–](\d+(?:\.\d+)?)$")
        .expect("range pattern should be valid");
    static ref ATTACHED_UNIT_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)([a-zA-Z]+)$")
        .expect("attached-unit pattern should be valid");
}

/// Unicode vulgar fraction glyphs and their values
const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('½', 0.5),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅕', 0.2),
    ('⅖', 0.4),
    ('⅗', 0.6),
    ('⅘', 0.8),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

// Leading articles/prepositions removed from names, English and French
const NAME_PREFIXES: &[&str] = &[
    "of", "the", "a", "an", "de", "d'", "du", "des", "la", "le", "les", "l'", "au", "aux",
];

/// Parse a full ingredient list, one `RecipeIngredient` per non-empty line
pub fn parse_ingredient_list(text: &str) -> Vec<RecipeIngredient> {
    let ingredients: Vec<RecipeIngredient> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_ingredient_line)
        .collect();

    debug!("Parsed {} ingredient line(s)", ingredients.len());
    ingredients
}

/// Parse a single free-text ingredient line.
///
/// Tokenizes from the left: the first numeric token becomes the amount, the
/// following token (after descriptor stripping) is tested against the unit
/// vocabulary, and the remaining tokens form the name. Never fails — a line
/// with no recognizable quantity comes back with `parsed_amount = None` and
/// the whole (descriptor-stripped) text as the name.
pub fn parse_ingredient_line(line: &str) -> RecipeIngredient {
    let tokens: Vec<String> = line
        .split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect();

    // Locate the first numeric token
    let mut amount: Option<f64> = None;
    let mut amount_start = tokens.len();
    let mut after_amount = tokens.len();
    let mut attached_unit: Option<&'static str> = None;

    for (i, token) in tokens.iter().enumerate() {
        if let Some(value) = parse_numeric_token(token) {
            amount_start = i;
            after_amount = i + 1;
            // Mixed fraction: a whole number followed by a fraction token
            let combined = tokens
                .get(i + 1)
                .and_then(|next| parse_fraction_token(next))
                .filter(|_| value.fract() == 0.0);
            amount = match combined {
                Some(fraction) => {
                    after_amount = i + 2;
                    Some(value + fraction)
                }
                None => Some(value),
            };
            break;
        }
        // Attached unit form, e.g. "500g" or "250ml"
        if let Some(captures) = ATTACHED_UNIT_RE.captures(token) {
            if let Some(unit) = unit_table::normalize_unit(&captures[2]) {
                if let Ok(value) = captures[1].parse::<f64>() {
                    if value > 0.0 {
                        amount_start = i;
                        after_amount = i + 1;
                        amount = Some(value);
                        attached_unit = Some(unit);
                        break;
                    }
                }
            }
        }
    }

    let mut name_tokens: Vec<&str> = tokens[..amount_start]
        .iter()
        .map(String::as_str)
        .filter(|t| !unit_table::is_descriptor(t))
        .collect();

    let mut unit = attached_unit;
    let mut rest = after_amount;

    if amount.is_some() && unit.is_none() {
        // Descriptors between amount and unit are never units themselves
        while rest < tokens.len() && unit_table::is_descriptor(&tokens[rest]) {
            trace!("Skipping descriptor '{}'", tokens[rest]);
            rest += 1;
        }
        // Greedy multi-token unit lookup handles "fl oz" and the French
        // multi-word spoon units
        'lookup: for len in (1..=3.min(tokens.len() - rest)).rev() {
            let phrase = tokens[rest..rest + len].join(" ");
            if let Some(canonical) = unit_table::normalize_unit(&phrase) {
                unit = Some(canonical);
                rest += len;
                break 'lookup;
            }
        }
    }

    name_tokens.extend(
        tokens[rest..]
            .iter()
            .map(String::as_str)
            .filter(|t| !unit_table::is_descriptor(t)),
    );

    // A quantity without a recognized unit is a count ("4 eggs")
    if amount.is_some() && unit.is_none() {
        unit = Some(COUNT_UNIT_EACH);
    }

    let normalized_name = normalize_name(&name_tokens);

    trace!(
        "Parsed '{}' -> amount={:?} unit={:?} name='{}'",
        line,
        amount,
        unit,
        normalized_name
    );

    let mut ingredient = RecipeIngredient::new(line, &normalized_name);
    if let Some(value) = amount {
        ingredient = ingredient.with_amount(value);
    }
    if let Some(canonical) = unit {
        ingredient = ingredient.with_unit(canonical);
    }
    ingredient
}

/// Parse one token as a number: integer, decimal, fraction, vulgar-fraction
/// glyph, or range (taken at its midpoint). Non-positive values are rejected.
fn parse_numeric_token(token: &str) -> Option<f64> {
    if let Some(&(_, value)) = VULGAR_FRACTIONS
        .iter()
        .find(|(glyph, _)| token.chars().eq(std::iter::once(*glyph)))
    {
        return Some(value);
    }

    if DECIMAL_RE.is_match(token) {
        return token.parse::<f64>().ok().filter(|v| *v > 0.0);
    }

    if let Some(value) = parse_fraction_token(token) {
        return Some(value);
    }

    if let Some(captures) = RANGE_RE.captures(token) {
        let low: f64 = captures[1].parse().ok()?;
        let high: f64 = captures[2].parse().ok()?;
        if low > 0.0 && high >= low {
            return Some((low + high) / 2.0);
        }
    }

    None
}

/// Parse "n/d" into a positive value; zero denominators are rejected
fn parse_fraction_token(token: &str) -> Option<f64> {
    let captures = FRACTION_RE.captures(token)?;
    let numerator: f64 = captures[1].parse().ok()?;
    let denominator: f64 = captures[2].parse().ok()?;
    if denominator == 0.0 || numerator <= 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Trim surrounding punctuation a token picked up from the line
fn clean_token(token: &str) -> String {
    token
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '(' | ')' | '"' | '*'))
        .trim_end_matches('.')
        .to_string()
}

/// Join name tokens, drop a leading article/preposition, and case-fold
fn normalize_name(tokens: &[&str]) -> String {
    let mut tokens = tokens.to_vec();
    if let Some(first) = tokens.first() {
        let folded = first.to_lowercase();
        if tokens.len() > 1 && NAME_PREFIXES.contains(&folded.as_str()) {
            tokens.remove(0);
        }
    }
    tokens.join(" ").to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_ingredient() {
        let result = parse_ingredient_line("2 cups flour");
        assert_eq!(result.parsed_amount, Some(2.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("cup"));
        assert_eq!(result.normalized_name, "flour");
        assert_eq!(result.original_text, "2 cups flour");
    }

    #[test]
    fn test_descriptor_never_becomes_unit() {
        let result = parse_ingredient_line("4 large eggs");
        assert_eq!(result.parsed_amount, Some(4.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("each"));
        assert_eq!(result.normalized_name, "eggs");
    }

    #[test]
    fn test_descriptor_after_unit_stripped() {
        let result = parse_ingredient_line("2 cups fresh broccoli");
        assert_eq!(result.parsed_amount, Some(2.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("cup"));
        assert_eq!(result.normalized_name, "broccoli");
    }

    #[test]
    fn test_parse_fraction() {
        let result = parse_ingredient_line("1/2 cup sugar");
        assert_eq!(result.parsed_amount, Some(0.5));
        assert_eq!(result.parsed_unit.as_deref(), Some("cup"));
        assert_eq!(result.normalized_name, "sugar");
    }

    #[test]
    fn test_parse_mixed_fraction() {
        let result = parse_ingredient_line("2 1/4 cups butter");
        assert_eq!(result.parsed_amount, Some(2.25));
        assert_eq!(result.parsed_unit.as_deref(), Some("cup"));
        assert_eq!(result.normalized_name, "butter");
    }

    #[test]
    fn test_parse_vulgar_fraction() {
        let result = parse_ingredient_line("½ cup milk");
        assert_eq!(result.parsed_amount, Some(0.5));
        assert_eq!(result.parsed_unit.as_deref(), Some("cup"));
        assert_eq!(result.normalized_name, "milk");
    }

    #[test]
    fn test_parse_range_takes_midpoint() {
        let result = parse_ingredient_line("2-3 tbsp olive oil");
        assert_eq!(result.parsed_amount, Some(2.5));
        assert_eq!(result.parsed_unit.as_deref(), Some("tbsp"));
        assert_eq!(result.normalized_name, "olive oil");
    }

    #[test]
    fn test_parse_attached_unit() {
        let result = parse_ingredient_line("500g butter");
        assert_eq!(result.parsed_amount, Some(500.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("g"));
        assert_eq!(result.normalized_name, "butter");
    }

    #[test]
    fn test_parse_abbreviation_with_dot() {
        let result = parse_ingredient_line("1 Tbsp. oil");
        assert_eq!(result.parsed_amount, Some(1.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("tbsp"));
        assert_eq!(result.normalized_name, "oil");
    }

    #[test]
    fn test_parse_multi_word_unit() {
        let result = parse_ingredient_line("8 fl oz water");
        assert_eq!(result.parsed_amount, Some(8.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("fl-oz"));
        assert_eq!(result.normalized_name, "water");
    }

    #[test]
    fn test_parse_french_unit() {
        let result = parse_ingredient_line("2 cuillères à soupe de sucre");
        assert_eq!(result.parsed_amount, Some(2.0));
        assert_eq!(result.parsed_unit.as_deref(), Some("tbsp"));
        assert_eq!(result.normalized_name, "sucre");
    }

    #[test]
    fn test_preposition_removed_from_name() {
        let result = parse_ingredient_line("2 cups of flour");
        assert_eq!(result.normalized_name, "flour");
    }

    #[test]
    fn test_no_quantity_yields_name_only() {
        let result = parse_ingredient_line("salt to taste");
        assert_eq!(result.parsed_amount, None);
        assert_eq!(result.parsed_unit, None);
        assert_eq!(result.normalized_name, "salt to taste");
    }

    #[test]
    fn test_never_fails_on_junk() {
        let result = parse_ingredient_line("!!! ###");
        assert_eq!(result.parsed_amount, None);
        assert_eq!(result.original_text, "!!! ###");
    }

    #[test]
    fn test_name_case_folded() {
        let result = parse_ingredient_line("2 cups All-Purpose Flour");
        assert_eq!(result.normalized_name, "all-purpose flour");
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = parse_ingredient_line("0 cups flour");
        assert_eq!(result.parsed_amount, None);
    }

    #[test]
    fn test_parse_ingredient_list_skips_blank_lines() {
        let text = "2 cups flour\n\n1 tbsp salt\n   \n3 eggs";
        let parsed = parse_ingredient_list(text);

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].normalized_name, "flour");
        assert_eq!(parsed[1].normalized_name, "salt");
        assert_eq!(parsed[2].normalized_name, "eggs");
        assert_eq!(parsed[2].parsed_unit.as_deref(), Some("each"));
    }

    #[test]
    fn test_round_trip_over_vocabulary() {
        for unit in crate::unit_table::canonical_units() {
            for amount in [1.0, 2.5, 0.5] {
                let line = format!("{} {} cocoa", amount, unit);
                let result = parse_ingredient_line(&line);
                assert_eq!(
                    result.parsed_amount,
                    Some(amount),
                    "amount mismatch for '{}'",
                    line
                );
                assert_eq!(
                    result.parsed_unit.as_deref(),
                    Some(unit),
                    "unit mismatch for '{}'",
                    line
                );
                assert_eq!(
                    result.normalized_name, "cocoa",
                    "name mismatch for '{}'",
                    line
                );
            }
        }
    }
}
