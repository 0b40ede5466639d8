// Content similarity scoring
//
// The BOLA analyzer compares baseline and mutated bodies with a coarse
// Jaccard similarity over lower-cased word tokens. The scorer is a trait so
// a better differ can be swapped in without disturbing the decision-table
// thresholds (>0.8 high, 0.3-0.8 medium).

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();
}

pub trait SimilarityScorer: Send + Sync {
    /// Score two bodies in [0.0, 1.0]; empty input scores 0.
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Jaccard index over the sets of lower-cased word tokens.
#[derive(Debug, Default)]
pub struct JaccardScorer;

impl SimilarityScorer for JaccardScorer {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let tokens_a = word_tokens(a);
        let tokens_b = word_tokens(b);
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0.0;
        }

        let intersection = tokens_a.intersection(&tokens_b).count();
        let union = tokens_a.union(&tokens_b).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }
}

fn word_tokens(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}
