use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use dashmap::DashMap;

/// keep document count and document frequencies in a thread-safe way
/// so the training corpus can be counted from rayon workers
#[derive(Debug, Default)]
pub struct Corpus {
    /// number of documents added
    pub add_num: AtomicU64,
    /// number of documents each term appears in
    pub term_counts: DashMap<Box<str>, u64, RandomState>,
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            add_num: AtomicU64::new(0),
            term_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add a document's distinct terms to the corpus
    pub fn add_set<T>(&self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.add_num.fetch_add(1, Ordering::Relaxed);
        for term in terms {
            self.term_counts
                .entry(term.as_ref().into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.add_num.load(Ordering::Relaxed)
    }

    /// Get the number of documents containing `term`
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).map_or(0, |count| *count)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// All terms whose document frequency lies in `[min_df, max_df]`,
    /// sorted lexicographically so column order is reproducible.
    pub fn terms_within(&self, min_df: u64, max_df: u64) -> Vec<(String, u64)> {
        let mut terms: Vec<(String, u64)> = self
            .term_counts
            .iter()
            .filter(|entry| *entry.value() >= min_df && *entry.value() <= max_df)
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        terms
    }
}
