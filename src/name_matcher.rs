//! # Name Matcher
//!
//! Scores how well a recipe ingredient name matches candidate inventory lot
//! names, using a fixed-priority tier ladder:
//!
//! 1. **Exact** (100) — identical after case-folding and trimming
//! 2. **Singular/plural variant** (90) — equal with a trailing "s"/"es"
//!    removed from one side
//! 3. **Substring containment** (80) — the shorter name (at least 3 chars)
//!    is contained in the longer
//! 4. **Word overlap** (60-70) — at least one whole shared token; the score
//!    scales with the fraction of shared tokens
//!
//! The first qualifying tier wins per candidate. All qualifying candidates
//! are returned, not just the best, because the lot selector may draw from
//! several lots of the same logical ingredient. The tiers are an ordered
//! list of pure scoring functions rather than a strategy-object hierarchy.

use log::debug;
use std::collections::HashSet;

use crate::ingredient_model::{InventoryLot, MatchCandidate, MatchReason};

/// Scoring tiers in priority order
const TIERS: &[(fn(&str, &str) -> Option<u8>, MatchReason)] = &[
    (exact_score, MatchReason::Exact),
    (plural_variant_score, MatchReason::PluralVariant),
    (substring_score, MatchReason::Substring),
    (word_overlap_score, MatchReason::WordOverlap),
];

/// Score one ingredient/candidate name pair.
///
/// Returns the confidence and tier of the first qualifying tier, or `None`
/// when no tier qualifies.
pub fn score_match(ingredient_name: &str, candidate_name: &str) -> Option<(u8, MatchReason)> {
    let a = normalize(ingredient_name);
    let b = normalize(candidate_name);
    if a.is_empty() || b.is_empty() {
        return None;
    }

    TIERS
        .iter()
        .find_map(|(scorer, reason)| scorer(&a, &b).map(|score| (score, *reason)))
}

/// Match an ingredient name against all inventory lots.
///
/// Returns every candidate at or above `min_confidence`, ordered by
/// confidence, ties broken by larger available quantity, then by nearer
/// expiration (no expiration sorts last), then by lot id for determinism.
pub fn match_candidates(
    ingredient_name: &str,
    lots: &[InventoryLot],
    min_confidence: u8,
) -> Vec<MatchCandidate> {
    let mut scored: Vec<(&InventoryLot, MatchCandidate)> = lots
        .iter()
        .filter_map(|lot| {
            score_match(ingredient_name, &lot.product_name).and_then(|(confidence, reason)| {
                if confidence < min_confidence {
                    return None;
                }
                Some((
                    lot,
                    MatchCandidate {
                        lot_id: lot.id,
                        confidence,
                        reason,
                    },
                ))
            })
        })
        .collect();

    scored.sort_by(|(lot_a, cand_a), (lot_b, cand_b)| {
        cand_b
            .confidence
            .cmp(&cand_a.confidence)
            .then_with(|| {
                lot_b
                    .quantity
                    .partial_cmp(&lot_a.quantity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| lot_a.expiration_key().cmp(&lot_b.expiration_key()))
            .then_with(|| lot_a.id.cmp(&lot_b.id))
    });

    debug!(
        "Matched '{}' against {} lot(s): {} candidate(s) at confidence >= {}",
        ingredient_name,
        lots.len(),
        scored.len(),
        min_confidence
    );

    scored.into_iter().map(|(_, candidate)| candidate).collect()
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

fn exact_score(a: &str, b: &str) -> Option<u8> {
    (a == b).then_some(100)
}

fn plural_variant_score(a: &str, b: &str) -> Option<u8> {
    (is_plural_of(a, b) || is_plural_of(b, a)).then_some(90)
}

fn is_plural_of(longer: &str, shorter: &str) -> bool {
    longer.strip_suffix("es") == Some(shorter) || longer.strip_suffix('s') == Some(shorter)
}

fn substring_score(a: &str, b: &str) -> Option<u8> {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    // 3-char floor prevents trivial one-letter containment
    (shorter.len() >= 3 && longer.contains(shorter)).then_some(80)
}

fn word_overlap_score(a: &str, b: &str) -> Option<u8> {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return None;
    }

    let shared = tokens_a.intersection(&tokens_b).count();
    if shared == 0 {
        return None;
    }

    let fraction = shared as f64 / tokens_a.len().max(tokens_b.len()) as f64;
    Some(60 + (fraction * 10.0).round() as u8)
}

fn tokenize(name: &str) -> HashSet<&str> {
    name.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_exact_match() {
        assert_eq!(score_match("milk", "milk"), Some((100, MatchReason::Exact)));
        assert_eq!(
            score_match("Milk", "  milk "),
            Some((100, MatchReason::Exact))
        );
    }

    #[test]
    fn test_plural_variant() {
        assert_eq!(
            score_match("eggs", "egg"),
            Some((90, MatchReason::PluralVariant))
        );
        assert_eq!(
            score_match("tomato", "tomatoes"),
            Some((90, MatchReason::PluralVariant))
        );
    }

    #[test]
    fn test_substring_containment() {
        assert_eq!(
            score_match("milk", "whole milk"),
            Some((80, MatchReason::Substring))
        );
        // Under the 3-char floor, containment does not qualify
        assert_eq!(score_match("ab", "slab cheese"), None);
    }

    #[test]
    fn test_word_overlap() {
        let (score, reason) = score_match("chicken breast", "breast of turkey").unwrap();
        assert_eq!(reason, MatchReason::WordOverlap);
        assert!((60..=70).contains(&score));
    }

    #[test]
    fn test_hyphen_splits_tokens() {
        let (score, reason) = score_match("all-purpose flour", "flour mix").unwrap();
        // "flour" is shared; substring does not apply in either direction
        assert_eq!(reason, MatchReason::WordOverlap);
        assert!((60..=70).contains(&score));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(score_match("milk", "carrots"), None);
        assert_eq!(score_match("", "milk"), None);
    }

    #[test]
    fn test_exact_outranks_substring_regardless_of_quantity() {
        let lots = vec![
            InventoryLot::new(1, "milk", 0.5, "cup"),
            InventoryLot::new(2, "whole milk", 10.0, "cup"),
        ];

        let candidates = match_candidates("milk", &lots, 60);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].lot_id, 1);
        assert_eq!(candidates[0].reason, MatchReason::Exact);
        assert_eq!(candidates[1].lot_id, 2);
        assert_eq!(candidates[1].reason, MatchReason::Substring);
    }

    #[test]
    fn test_tie_broken_by_quantity_then_expiration() {
        let day = |d| NaiveDate::from_ymd_opt(2026, 8, d).unwrap();
        let lots = vec![
            InventoryLot::new(1, "milk", 1.0, "cup").with_expiration(day(20)),
            InventoryLot::new(2, "milk", 2.0, "cup").with_expiration(day(25)),
            InventoryLot::new(3, "milk", 1.0, "cup").with_expiration(day(10)),
        ];

        let candidates = match_candidates("milk", &lots, 60);

        // Same confidence everywhere: larger quantity first, then nearer
        // expiration among the equal-quantity pair
        let ids: Vec<i64> = candidates.iter().map(|c| c.lot_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_threshold_drops_weak_candidates() {
        let lots = vec![
            InventoryLot::new(1, "milk", 1.0, "cup"),
            InventoryLot::new(2, "oat milk creamer", 1.0, "cup"),
        ];

        let strict = match_candidates("milk", &lots, 90);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].lot_id, 1);
    }

    #[test]
    fn test_all_qualifying_candidates_returned() {
        let lots = vec![
            InventoryLot::new(1, "milk", 1.0, "cup"),
            InventoryLot::new(2, "milk", 0.5, "cup"),
            InventoryLot::new(3, "milks", 2.0, "cup"),
        ];

        let candidates = match_candidates("milk", &lots, 60);
        assert_eq!(candidates.len(), 3);
    }
}
