//! Text matching against the known-name vocabulary
//!
//! OCR output is first reduced to its alphabetic characters, then compared to
//! every vocabulary entry. The default metric is the Indel ratio from
//! `rapidfuzz`; the `strsim` metrics can be selected instead.

pub mod vocabulary;

use rapidfuzz::fuzz;
use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_damerau_levenshtein, normalized_levenshtein, sorensen_dice};

pub use vocabulary::Vocabulary;

/// Keep only alphabetic characters, in order, case preserved
///
/// Digits, punctuation and whitespace are dropped, so `"Pikachu lv.12"`
/// becomes `"Pikachulv"`. Accented letters are alphabetic and survive.
pub fn clean_text(raw: &str) -> String {
    raw.chars().filter(|c| c.is_alphabetic()).collect()
}

/// String similarity metric used to score vocabulary candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// Indel ratio, `2 * LCS / (len(a) + len(b))`
    ///
    /// The default threshold and best-of weights are calibrated on this one.
    #[default]
    Indel,
    /// Normalized Levenshtein distance
    Levenshtein,
    /// Normalized Damerau-Levenshtein distance (transpositions count once)
    DamerauLevenshtein,
    /// Jaro-Winkler similarity
    JaroWinkler,
    /// Sørensen-Dice coefficient over bigrams
    SorensenDice,
}

impl Scorer {
    /// Similarity between two strings on a 0-100 scale (100 = identical)
    pub fn score(self, a: &str, b: &str) -> f64 {
        let similarity = match self {
            Scorer::Indel => fuzz::ratio(a.chars(), b.chars()),
            Scorer::Levenshtein => normalized_levenshtein(a, b),
            Scorer::DamerauLevenshtein => normalized_damerau_levenshtein(a, b),
            Scorer::JaroWinkler => jaro_winkler(a, b),
            Scorer::SorensenDice => sorensen_dice(a, b),
        };
        (similarity * 100.0).clamp(0.0, 100.0)
    }
}

/// Best vocabulary candidate for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Vocabulary entry
    pub name: String,
    /// Similarity score (0 - 100)
    pub score: f64,
}

/// Scores queries against a vocabulary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Matcher {
    /// Similarity metric
    pub scorer: Scorer,
    /// Compare lowercased strings
    pub ignore_case: bool,
}

impl Matcher {
    pub fn new(scorer: Scorer, ignore_case: bool) -> Self {
        Self { scorer, ignore_case }
    }

    /// Score a query against a single name
    pub fn score(&self, query: &str, name: &str) -> f64 {
        if self.ignore_case {
            self.scorer.score(&query.to_lowercase(), &name.to_lowercase())
        } else {
            self.scorer.score(query, name)
        }
    }

    /// Return the highest-scoring vocabulary entry
    ///
    /// Entries are scanned in vocabulary order and only a strictly higher
    /// score replaces the current best, so ties go to the earliest entry.
    /// Returns `None` only for an empty vocabulary.
    pub fn best_match(&self, query: &str, vocabulary: &Vocabulary) -> Option<Candidate> {
        let mut best: Option<(&str, f64)> = None;

        for name in vocabulary.names() {
            let score = self.score(query, name);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((name, score)),
            }
        }

        best.map(|(name, score)| Candidate {
            name: name.to_string(),
            score,
        })
    }
}
