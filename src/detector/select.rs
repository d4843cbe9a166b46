//! Single-best selection among accepted matches

use super::Match;

/// Weight of the similarity score (0 - 100)
pub const SIMILARITY_WEIGHT: f64 = 0.7;
/// Weight of the OCR confidence (0.0 - 1.0)
pub const CONFIDENCE_WEIGHT: f64 = 30.0;

/// Ranking value combining similarity and OCR confidence
pub fn weighted_score(m: &Match) -> f64 {
    m.similarity * SIMILARITY_WEIGHT + m.confidence * CONFIDENCE_WEIGHT
}

/// Pick the single best match
///
/// A lone match is returned as-is. Otherwise the highest [`weighted_score`]
/// wins, ties going to the earliest match.
pub fn select_best(matches: Vec<Match>) -> Option<Match> {
    let mut iter = matches.into_iter();
    let first = iter.next()?;
    Some(pick_best(first, iter))
}

/// Stable argmax of [`weighted_score`], starting from `first`
pub(crate) fn pick_best(first: Match, rest: impl IntoIterator<Item = Match>) -> Match {
    let mut best = first;
    let mut best_score = weighted_score(&best);

    for candidate in rest {
        let score = weighted_score(&candidate);
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}
