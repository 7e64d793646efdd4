//! Exact and fuzzy title matching.
//!
//! Fuzzy matching uses a token-set similarity: titles are split into
//! alphanumeric tokens, and the shared tokens are compared against each
//! side's leftovers. A title whose tokens are a superset of another's scores
//! 100, so "cyberpunk 2077: ultimate edition" matches "cyberpunk 2077".

use std::collections::BTreeSet;

/// Score assigned to an exact key match.
pub const EXACT_SCORE: f64 = 100.0;

/// Default minimum similarity for a fuzzy match.
pub const DEFAULT_THRESHOLD: u8 = 90;

/// Best candidate found for a target key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate<'a> {
    /// Normalized name of the matched candidate
    pub key: &'a str,
    /// Position of the candidate in the pool
    pub index: usize,
    /// Similarity score, 0-100
    pub score: f64,
    /// Whether the key matched exactly rather than by similarity
    pub exact: bool,
}

/// Pre-tokenized candidate keys in caller order.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    keys: Vec<String>,
    tokens: Vec<BTreeSet<String>>,
}

impl CandidatePool {
    /// Builds a pool; iteration order is the order of `keys`.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let tokens = keys.iter().map(|k| tokenize(k)).collect();
        Self { keys, tokens }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Finds the best candidate for `target`.
    ///
    /// An exact key match wins immediately. Otherwise the highest token-set
    /// score is returned if it reaches `threshold`; ties keep the earliest
    /// candidate.
    pub fn resolve(&self, target: &str, threshold: u8) -> Option<MatchCandidate<'_>> {
        if let Some(index) = self.keys.iter().position(|k| k == target) {
            return Some(MatchCandidate {
                key: &self.keys[index],
                index,
                score: EXACT_SCORE,
                exact: true,
            });
        }

        let target_tokens = tokenize(target);
        let mut best: Option<MatchCandidate<'_>> = None;

        for (index, tokens) in self.tokens.iter().enumerate() {
            let score = token_set_score(&target_tokens, tokens);
            if best.is_none_or(|b| score > b.score) {
                best = Some(MatchCandidate { key: &self.keys[index], index, score, exact: false });
            }
        }

        best.filter(|b| b.score >= f64::from(threshold))
    }
}

/// Resolves `target` against `candidates`, returning the matched key.
pub fn resolve<S: AsRef<str>>(target: &str, candidates: &[S], threshold: u8) -> Option<String> {
    let pool = CandidatePool::new(candidates.iter().map(|c| c.as_ref().to_string()));
    pool.resolve(target, threshold).map(|m| m.key.to_string())
}

/// Order- and subset-insensitive similarity between two titles, 0-100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    token_set_score(&tokenize(a), &tokenize(b))
}

fn token_set_score(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = a.intersection(b).map(String::as_str).collect();
    let only_a: Vec<&str> = a.difference(b).map(String::as_str).collect();
    let only_b: Vec<&str> = b.difference(a).map(String::as_str).collect();

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let shared = shared.join(" ");
    let only_a = only_a.join(" ");
    let only_b = only_b.join(" ");

    if shared.is_empty() {
        return ratio(&only_a, &only_b);
    }

    let with_a = format!("{} {}", shared, only_a);
    let with_b = format!("{} {}", shared, only_b);
    ratio(&with_a, &with_b).max(ratio(&shared, &with_a)).max(ratio(&shared, &with_b))
}

/// Normalized Levenshtein similarity, 0-100.
fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn tokenize(s: &str) -> BTreeSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
