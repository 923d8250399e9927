//! Text similarity scoring for duplicate-pair detection.
//!
//! The selector depends on the trait, not a concrete heuristic, so
//! the overlap measure can be swapped without touching selection
//! logic. `CharOverlap` at the 0.70 threshold is the default
//! behavioral contract.

use std::collections::HashMap;

/// Score threshold at or above which two texts count as duplicates.
pub const DUPLICATE_THRESHOLD: f64 = 0.70;

pub trait SimilarityScorer: Send + Sync {
    /// Similarity in [0, 1].
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Multiset character-overlap ratio: shared character occurrences
/// over the length of the shorter text.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharOverlap;

impl SimilarityScorer for CharOverlap {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a_chars: Vec<char> = a.chars().collect();
        let b_chars: Vec<char> = b.chars().collect();
        if a_chars.is_empty() || b_chars.is_empty() {
            return 0.0;
        }

        let mut counts: HashMap<char, usize> = HashMap::new();
        for c in &a_chars {
            *counts.entry(*c).or_default() += 1;
        }
        let mut shared = 0usize;
        for c in &b_chars {
            if let Some(n) = counts.get_mut(c) {
                if *n > 0 {
                    *n -= 1;
                    shared += 1;
                }
            }
        }

        shared as f64 / a_chars.len().min(b_chars.len()) as f64
    }
}

/// Dice coefficient over character bigrams.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenBigramOverlap;

impl SimilarityScorer for TokenBigramOverlap {
    fn score(&self, a: &str, b: &str) -> f64 {
        let a_grams = bigrams(a);
        let b_grams = bigrams(b);
        if a_grams.is_empty() || b_grams.is_empty() {
            return if a == b { 1.0 } else { 0.0 };
        }

        let mut counts: HashMap<(char, char), usize> = HashMap::new();
        for g in &a_grams {
            *counts.entry(*g).or_default() += 1;
        }
        let mut shared = 0usize;
        for g in &b_grams {
            if let Some(n) = counts.get_mut(g) {
                if *n > 0 {
                    *n -= 1;
                    shared += 1;
                }
            }
        }

        2.0 * shared as f64 / (a_grams.len() + b_grams.len()) as f64
    }
}

fn bigrams(s: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_score_one() {
        assert_eq!(CharOverlap.score("にわか雨に注意", "にわか雨に注意"), 1.0);
        assert_eq!(TokenBigramOverlap.score("にわか雨に注意", "にわか雨に注意"), 1.0);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        assert_eq!(CharOverlap.score("晴れです", "傘必携"), 0.0);
    }

    #[test]
    fn near_duplicates_cross_threshold() {
        // Same characters, one extra — overlap over the shorter text is high.
        let a = "急な雨に注意です";
        let b = "急な雨にご注意です";
        assert!(CharOverlap.score(a, b) >= DUPLICATE_THRESHOLD);
    }

    #[test]
    fn unrelated_texts_stay_below_threshold() {
        let a = "洗濯日和の一日です";
        let b = "夜は冷え込みます";
        assert!(CharOverlap.score(a, b) < DUPLICATE_THRESHOLD);
        assert!(TokenBigramOverlap.score(a, b) < DUPLICATE_THRESHOLD);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(CharOverlap.score("", "雨"), 0.0);
    }
}
