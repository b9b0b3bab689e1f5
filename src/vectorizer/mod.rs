pub mod analyzer;
pub mod corpus;
pub mod term;
pub mod tfidf;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, CsVec};
use tracing::{debug, info};

use crate::config::WeightingConfig;
use crate::error::{Result, SpectralError};
use crate::vectorizer::{analyzer::Analyzer, corpus::Corpus, term::TermFrequency, tfidf::WeightingScheme};

/// Sparse document-term matrix, CSR, one row per document
pub type TermDocumentMatrix = CsMat<f64>;

/// Term-Weighting Model
/// Holds the vocabulary fitted on the training corpus together with the
/// frozen IDF weight of every column.
///
/// - column index of a term = its position in `vocabulary`
/// - `transform` never changes the vocabulary or the weights
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermWeightingModel {
    /// term -> idf, column order
    #[serde(with = "indexmap::map::serde_seq")]
    vocabulary: IndexMap<Box<str>, f64>,
    scheme: WeightingScheme,
    analyzer: Analyzer,
    /// number of training documents
    doc_num: u64,
}

impl TermWeightingModel {
    /// Fit the vocabulary on `corpus` and return it with the weighted matrix.
    /// Row `i` of the matrix corresponds to `corpus[i]`.
    pub fn fit<T>(corpus: &[T], config: &WeightingConfig) -> Result<(Self, TermDocumentMatrix)>
    where
        T: AsRef<str> + Sync,
    {
        if corpus.is_empty() {
            return Err(SpectralError::EmptyCorpus("no documents supplied".to_string()));
        }
        let analyzer = Analyzer::new(config.stop_words);

        // tokenize in parallel, keeping document order
        let freqs: Vec<TermFrequency> = corpus
            .par_iter()
            .map(|doc| analyzer.analyze(doc.as_ref()).into_iter().collect())
            .collect();

        let df = Corpus::new();
        freqs.par_iter().for_each(|freq| df.add_set(&freq.term_set_ref_str()));

        let doc_num = df.get_doc_num();
        let max_df = ((config.max_df * doc_num as f64).floor() as u64).max(1);
        let terms = df.terms_within(config.min_df.max(1), max_df);
        debug!(
            raw_vocab = df.vocab_size(),
            kept_vocab = terms.len(),
            "document frequencies counted"
        );
        if terms.is_empty() {
            return Err(SpectralError::EmptyCorpus(format!(
                "{} documents produced an empty vocabulary",
                doc_num
            )));
        }

        let vocabulary: IndexMap<Box<str>, f64> = terms
            .into_iter()
            .map(|(term, freq)| (term.into_boxed_str(), config.scheme.idf(doc_num, freq)))
            .collect();

        let model = Self {
            vocabulary,
            scheme: config.scheme,
            analyzer,
            doc_num,
        };

        let rows: Vec<(Vec<usize>, Vec<f64>)> =
            freqs.par_iter().map(|freq| model.weighted_row(freq)).collect();
        let mut indptr = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0usize);
        for (ind, val) in rows {
            indices.extend(ind);
            data.extend(val);
            indptr.push(indices.len());
        }
        let matrix = CsMat::new((freqs.len(), model.vocabulary_size()), indptr, indices, data);

        info!(
            documents = matrix.rows(),
            vocabulary = matrix.cols(),
            nnz = matrix.nnz(),
            scheme = ?model.scheme,
            "term-document matrix built"
        );
        Ok((model, matrix))
    }

    /// Weighted sparse vector of arbitrary text, length = vocabulary size.
    /// Out-of-vocabulary terms are dropped; the result may have no entries.
    pub fn transform(&self, text: &str) -> CsVec<f64> {
        let freq: TermFrequency = self.analyzer.analyze(text).into_iter().collect();
        self.transform_freq(&freq)
    }

    /// Weighted sparse vector of an already counted document
    pub fn transform_freq(&self, freq: &TermFrequency) -> CsVec<f64> {
        let (indices, data) = self.weighted_row(freq);
        CsVec::new(self.vocabulary_size(), indices, data)
    }

    /// (sorted column indices, weights) of one document, zero weights omitted
    fn weighted_row(&self, freq: &TermFrequency) -> (Vec<usize>, Vec<f64>) {
        let mut entries: Vec<(usize, f64)> = freq
            .iter()
            .filter_map(|(term, count)| {
                let (col, _, idf) = self.vocabulary.get_full(term)?;
                let w = self.scheme.weight(count, *idf);
                (w != 0.0).then_some((col, w))
            })
            .collect();
        entries.sort_unstable_by_key(|(col, _)| *col);

        if self.scheme.l2_normalize() {
            let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                entries.iter_mut().for_each(|(_, w)| *w /= norm);
            }
        }
        entries.into_iter().unzip()
    }
}

/// Vocabulary access
impl TermWeightingModel {
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// number of training documents
    pub fn doc_count(&self) -> u64 {
        self.doc_num
    }

    pub fn scheme(&self) -> WeightingScheme {
        self.scheme
    }

    /// Column index of a term
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get_index_of(term)
    }

    /// Term at a column index
    pub fn term_at(&self, index: usize) -> Option<&str> {
        self.vocabulary.get_index(index).map(|(term, _)| term.as_ref())
    }

    /// Frozen idf of a term
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).copied()
    }

    /// All terms in column order
    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary.keys().map(|term| term.as_ref()).collect()
    }
}
