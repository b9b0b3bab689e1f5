use std::fmt::{self, Debug};

use ndarray::Array1;
use serde::Serialize;
use tracing::debug;

use crate::engine::{scoring::cosine_scores, Engine};
use crate::error::{Result, SpectralError};
use crate::index::leading_coordinates;
use crate::utils::sort::top_k_desc;

/// One ranked document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    /// 1-based
    pub rank: usize,
    /// cosine similarity in [-1, 1]
    pub score: f64,
    pub doc_id: String,
}

/// Ranked hits of one query plus its position in concept space
#[derive(Clone, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<Hit>,
    /// projected query, length k
    pub query_concepts: Array1<f64>,
}

impl SearchResults {
    /// First three query coordinates, zero padded
    pub fn query_coordinates(&self) -> [f64; 3] {
        leading_coordinates(&self.query_concepts.to_vec())
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl Debug for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "SearchResults [")?;
            for hit in &self.hits {
                writeln!(f, "    {}. {:.6} {:?}", hit.rank, hit.score, hit.doc_id)?;
            }
            write!(f, "]")
        } else {
            f.debug_struct("SearchResults")
                .field("hits", &self.hits)
                .field("query_concepts", &self.query_concepts)
                .finish()
        }
    }
}

/// Result of a query
/// `NoMatch` means the query shares no weighted term with the vocabulary.
/// It is an expected answer, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    NoMatch,
    Matches(SearchResults),
}

impl SearchOutcome {
    pub fn is_no_match(&self) -> bool {
        matches!(self, SearchOutcome::NoMatch)
    }

    pub fn hits(&self) -> &[Hit] {
        match self {
            SearchOutcome::NoMatch => &[],
            SearchOutcome::Matches(results) => &results.hits,
        }
    }

    pub fn into_results(self) -> Option<SearchResults> {
        match self {
            SearchOutcome::NoMatch => None,
            SearchOutcome::Matches(results) => Some(results),
        }
    }
}

impl Engine {
    /// Rank the indexed documents against `text`.
    /// `top_k` above the corpus size is clamped; zero is rejected.
    pub fn search(&self, text: &str, top_k: usize) -> Result<SearchOutcome> {
        if top_k == 0 {
            return Err(SpectralError::InvalidArgument("top_k must be at least 1".to_string()));
        }
        let index = self.index();
        let query = index.model().transform(text);
        if query.nnz() == 0 {
            debug!(query = text, "no vocabulary overlap");
            return Ok(SearchOutcome::NoMatch);
        }

        let query_concepts = index.project(&query)?;
        let scores = cosine_scores(index.document_space(), &query_concepts);
        let hits: Vec<Hit> = top_k_desc(&scores, top_k)
            .into_iter()
            .enumerate()
            .map(|(rank, doc)| Hit {
                rank: rank + 1,
                score: scores[doc],
                doc_id: index.doc_ids()[doc].clone(),
            })
            .collect();
        debug!(
            query = text,
            terms = query.nnz(),
            hits = hits.len(),
            best = ?hits.first().map(|h| h.score),
            "search done"
        );
        Ok(SearchOutcome::Matches(SearchResults { hits, query_concepts }))
    }
}
