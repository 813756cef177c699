use ahash::AHashMap;
use std::collections::BTreeSet;

/// Inverted index from name token to roster positions.
///
/// Only used to shortlist records that can have a non-zero token overlap;
/// the precise count is always done against the record's own token list.
#[derive(Debug, Default)]
pub struct TokenIndex {
    postings: AHashMap<String, Vec<usize>>,
}

impl TokenIndex {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a [String])>,
    {
        let mut postings: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (position, tokens) in records {
            for token in tokens {
                let list = postings.entry(token.clone()).or_default();
                if list.last() != Some(&position) {
                    list.push(position);
                }
            }
        }
        Self { postings }
    }

    /// Positions of records sharing at least one token, ascending.
    pub fn shortlist<'a, I>(&self, tokens: I) -> BTreeSet<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens
            .into_iter()
            .filter_map(|token| self.postings.get(token))
            .flatten()
            .copied()
            .collect()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }
}
