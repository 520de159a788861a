//! Deterministic ordering of match results.

use crate::util::math::approx_eq;
use crate::util::{SimMatchError, SimMatchResult};
use std::cmp::Ordering;

/// A candidate that passed the threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// Candidate identity.
    pub id: String,
    /// Candidate location as reported by the source.
    pub location: String,
    /// Similarity to the query in `[-1, 1]`.
    pub score: f64,
}

/// Key used to order matches whose scores tie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Ascending identity.
    #[default]
    Identity,
    /// Ascending location.
    Location,
}

/// Ranking parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankConfig {
    /// Scores within this distance of a tie group's leading score tie.
    pub score_tolerance: f64,
    /// Ordering inside a tie group.
    pub tie_break: TieBreak,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            score_tolerance: 1e-9,
            tie_break: TieBreak::Identity,
        }
    }
}

impl RankConfig {
    /// Checks the tolerance.
    pub fn validate(&self) -> SimMatchResult<()> {
        if !self.score_tolerance.is_finite() || self.score_tolerance < 0.0 {
            return Err(SimMatchError::InvalidConfig(
                "score_tolerance must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

fn tie_cmp(a: &Match, b: &Match, tie_break: TieBreak) -> Ordering {
    match tie_break {
        TieBreak::Identity => a.id.cmp(&b.id).then_with(|| a.location.cmp(&b.location)),
        TieBreak::Location => a.location.cmp(&b.location).then_with(|| a.id.cmp(&b.id)),
    }
}

fn match_cmp_desc(a: &Match, b: &Match, tie_break: TieBreak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| tie_cmp(a, b, tie_break))
}

/// Orders matches by descending score with deterministic tie-breaking.
///
/// Matches are first sorted by exact score, then each run of scores within
/// `score_tolerance` of the run's first score is re-sorted by the tie-break
/// key alone. Both passes use total orders, so the output depends only on
/// the set of matches, never on their input order. Nothing is dropped.
pub fn rank(mut results: Vec<Match>, cfg: &RankConfig) -> Vec<Match> {
    results.sort_by(|a, b| match_cmp_desc(a, b, cfg.tie_break));
    if cfg.score_tolerance <= 0.0 {
        return results;
    }

    let mut start = 0;
    while start < results.len() {
        let lead = results[start].score;
        let mut end = start + 1;
        while end < results.len() && approx_eq(lead, results[end].score, cfg.score_tolerance) {
            end += 1;
        }
        if end - start > 1 {
            results[start..end].sort_by(|a, b| tie_cmp(a, b, cfg.tie_break));
        }
        start = end;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::{rank, Match, RankConfig, TieBreak};

    fn m(id: &str, score: f64) -> Match {
        Match {
            id: id.to_string(),
            location: format!("/store/{id}"),
            score,
        }
    }

    fn ids(matches: &[Match]) -> Vec<&str> {
        matches.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn orders_by_descending_score() {
        let ranked = rank(
            vec![m("a", 0.2), m("b", 0.9), m("c", 0.5)],
            &RankConfig::default(),
        );
        assert_eq!(ids(&ranked), ["b", "c", "a"]);
    }

    #[test]
    fn near_equal_scores_tie_by_identity() {
        let ranked = rank(
            vec![m("z.jpg", 0.91), m("m.jpg", 0.91 - 5e-10), m("a.jpg", 0.5)],
            &RankConfig::default(),
        );
        assert_eq!(ids(&ranked), ["m.jpg", "z.jpg", "a.jpg"]);
    }

    #[test]
    fn output_is_independent_of_input_order() {
        let items = vec![m("d", 0.7), m("b", 0.7), m("c", 0.8), m("a", 0.7)];
        let mut reversed = items.clone();
        reversed.reverse();
        let cfg = RankConfig::default();
        assert_eq!(rank(items, &cfg), rank(reversed, &cfg));
    }

    #[test]
    fn location_tie_break() {
        let mut x = m("x", 0.5);
        x.location = "/b".to_string();
        let mut y = m("y", 0.5);
        y.location = "/a".to_string();
        let cfg = RankConfig {
            tie_break: TieBreak::Location,
            ..RankConfig::default()
        };
        assert_eq!(ids(&rank(vec![x, y], &cfg)), ["y", "x"]);
    }

    #[test]
    fn never_truncates() {
        let items: Vec<_> = (0..50).map(|i| m(&format!("{i:02}"), 0.3)).collect();
        assert_eq!(rank(items, &RankConfig::default()).len(), 50);
    }
}
