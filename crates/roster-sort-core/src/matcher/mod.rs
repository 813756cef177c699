pub mod index;
pub mod similarity;

use crate::normalize::{normalize, tokenize};
use crate::roster::{Roster, RosterRecord};
use ahash::AHashSet;
use index::TokenIndex;
use similarity::indel_ratio;
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub min_token_matches: usize,
    pub fuzzy_threshold: f64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            min_token_matches: 2,
            fuzzy_threshold: 0.60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchMethod {
    /// Count of distinct name tokens found verbatim in the filename.
    Token { matches: usize },
    /// Best full-name similarity ratio.
    Fuzzy { ratio: f64 },
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMethod::Token { .. } => write!(f, "token"),
            MatchMethod::Fuzzy { ratio } => write!(f, "fuzzy({:.2})", ratio),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RosterMatch<'a> {
    pub record: &'a RosterRecord,
    pub position: usize,
    pub method: MatchMethod,
}

/// Per-record data derived once from the roster.
#[derive(Debug)]
struct Candidate {
    /// Distinct name tokens in first-seen order.
    tokens: Vec<String>,
    /// Normalized "surname first middle" and its token-reversed form.
    variants: [String; 2],
}

impl Candidate {
    fn from_record(record: &RosterRecord) -> Self {
        let mut seen = AHashSet::new();
        let tokens: Vec<String> = record
            .name_fields()
            .flat_map(tokenize)
            .filter(|token| seen.insert(token.clone()))
            .collect();

        let full = normalize(&record.display_name());
        let reversed = full.split(' ').rev().collect::<Vec<_>>().join(" ");

        Self {
            tokens,
            variants: [full, reversed],
        }
    }

    fn overlap(&self, filename_tokens: &AHashSet<String>) -> usize {
        self.tokens
            .iter()
            .filter(|token| filename_tokens.contains(*token))
            .count()
    }
}

/// Assigns filenames to roster records: exact token overlap first, fuzzy
/// full-name similarity as a fallback.
pub struct Matcher {
    roster: Roster,
    candidates: Vec<Candidate>,
    index: TokenIndex,
    options: MatchOptions,
}

impl Matcher {
    pub fn new(roster: Roster, options: MatchOptions) -> Self {
        let candidates: Vec<Candidate> = roster.iter().map(Candidate::from_record).collect();
        let index = TokenIndex::build(
            candidates
                .iter()
                .enumerate()
                .map(|(position, c)| (position, c.tokens.as_slice())),
        );

        debug!(
            "Indexed {} distinct tokens across {} roster records",
            index.token_count(),
            candidates.len()
        );

        Self {
            roster,
            candidates,
            index,
            options,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Best roster record for `filename`, or `None` when neither phase
    /// clears its threshold.
    pub fn find_best(&self, filename: &str) -> Option<RosterMatch<'_>> {
        let normalized = normalize(filename);
        let filename_tokens: AHashSet<String> =
            normalized.split(' ').filter(|t| !t.is_empty()).map(String::from).collect();

        if let Some((position, matches)) = self.best_token_overlap(&filename_tokens) {
            if matches >= self.options.min_token_matches {
                return self.found(position, MatchMethod::Token { matches });
            }
        }

        match self.best_fuzzy(&normalized) {
            Some((position, ratio)) if ratio >= self.options.fuzzy_threshold => {
                self.found(position, MatchMethod::Fuzzy { ratio })
            }
            _ => None,
        }
    }

    /// Highest overlap across the roster; ties keep the earliest record.
    /// Records outside the shortlist have zero overlap and never win.
    fn best_token_overlap(&self, filename_tokens: &AHashSet<String>) -> Option<(usize, usize)> {
        let shortlist = self.index.shortlist(filename_tokens.iter().map(String::as_str));

        let mut best: Option<(usize, usize)> = None;
        for position in shortlist {
            let count = self.candidates[position].overlap(filename_tokens);
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((position, count));
            }
        }
        trace!("Token phase best: {:?}", best);
        best
    }

    fn best_fuzzy(&self, normalized_filename: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (position, candidate) in self.candidates.iter().enumerate() {
            for variant in candidate.variants.iter().filter(|v| !v.is_empty()) {
                let ratio = indel_ratio(normalized_filename, variant);
                if ratio > best.map_or(0.0, |(_, r)| r) {
                    best = Some((position, ratio));
                }
            }
        }
        trace!("Fuzzy phase best: {:?}", best);
        best
    }

    fn found(&self, position: usize, method: MatchMethod) -> Option<RosterMatch<'_>> {
        self.roster.get(position).map(|record| RosterMatch {
            record,
            position,
            method,
        })
    }
}
