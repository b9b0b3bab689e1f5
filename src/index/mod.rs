pub mod serde;

use std::sync::OnceLock;

use ndarray::{Array1, Array2, Axis};
use sprs::CsVec;
use tracing::debug;

use crate::decomposer::Decomposition;
use crate::error::{Result, SpectralError};
use crate::utils::math::l2_norm;
use crate::vectorizer::TermWeightingModel;

/// Concept Index
/// The queryable state of one build: the decomposition triple, the ordered
/// document identifiers and the term-weighting model whose vocabulary
/// defines the columns of `vt`.
///
/// Row `i` of `u`, row `i` of the document-concept matrix and `doc_ids[i]`
/// always describe the same document. Nothing is mutable after `build`.
#[derive(Debug)]
pub struct ConceptIndex {
    decomposition: Decomposition,
    doc_ids: Vec<String>,
    model: TermWeightingModel,
    /// U · diag(σ) and its row norms, computed on first use
    doc_space: OnceLock<DocumentSpace>,
}

#[derive(Debug)]
pub(crate) struct DocumentSpace {
    pub(crate) matrix: Array2<f64>,
    pub(crate) norms: Array1<f64>,
}

impl ConceptIndex {
    /// Assemble an index, checking that every artifact has matching shape.
    pub fn build(
        decomposition: Decomposition,
        doc_ids: Vec<String>,
        model: TermWeightingModel,
    ) -> Result<Self> {
        let (rows, k) = decomposition.u.dim();
        if doc_ids.len() != rows {
            return Err(SpectralError::Alignment(format!(
                "{} document identifiers for {} matrix rows",
                doc_ids.len(),
                rows
            )));
        }
        if model.doc_count() != rows as u64 {
            return Err(SpectralError::Alignment(format!(
                "model was fitted on {} documents, index has {}",
                model.doc_count(),
                rows
            )));
        }
        if decomposition.sigma.len() != k {
            return Err(SpectralError::Alignment(format!(
                "{} concept strengths for {} concept columns",
                decomposition.sigma.len(),
                k
            )));
        }
        if decomposition.vt.nrows() != k {
            return Err(SpectralError::Alignment(format!(
                "term loadings have {} concepts, document loadings {}",
                decomposition.vt.nrows(),
                k
            )));
        }
        if decomposition.vt.ncols() != model.vocabulary_size() {
            return Err(SpectralError::Alignment(format!(
                "term loadings span {} terms, vocabulary has {}",
                decomposition.vt.ncols(),
                model.vocabulary_size()
            )));
        }
        debug!(documents = rows, concepts = k, terms = model.vocabulary_size(), "concept index assembled");
        Ok(Self {
            decomposition,
            doc_ids,
            model,
            doc_space: OnceLock::new(),
        })
    }

    pub(crate) fn document_space(&self) -> &DocumentSpace {
        self.doc_space.get_or_init(|| {
            let matrix = self.decomposition.document_concepts();
            let norms = matrix.map_axis(Axis(1), |row| l2_norm(row.iter().copied()));
            DocumentSpace { matrix, norms }
        })
    }

    /// N × k document-concept matrix, cached for the life of the index
    pub fn document_concept_matrix(&self) -> &Array2<f64> {
        &self.document_space().matrix
    }

    /// Concept-space coordinates of a weighted query vector: q · Vᵗᵀ
    pub fn project(&self, query: &CsVec<f64>) -> Result<Array1<f64>> {
        let vt = &self.decomposition.vt;
        if query.dim() != vt.ncols() {
            return Err(SpectralError::Alignment(format!(
                "query has {} terms, index expects {}",
                query.dim(),
                vt.ncols()
            )));
        }
        let mut out = Array1::zeros(vt.nrows());
        for (term, &weight) in query.iter() {
            out.scaled_add(weight, &vt.column(term));
        }
        Ok(out)
    }

    pub fn document_at(&self, index: usize) -> Option<&str> {
        self.doc_ids.get(index).map(String::as_str)
    }

    /// First three concept coordinates of a document, zero padded when k < 3
    pub fn coordinates(&self, index: usize) -> Option<[f64; 3]> {
        let matrix = self.document_concept_matrix();
        if index >= matrix.nrows() {
            return None;
        }
        Some(leading_coordinates(&matrix.row(index).to_vec()))
    }

    pub fn doc_ids(&self) -> &[String] {
        &self.doc_ids
    }

    pub fn model(&self) -> &TermWeightingModel {
        &self.model
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Number of concepts
    pub fn rank(&self) -> usize {
        self.decomposition.rank()
    }
}

/// First three values, zero padded
pub fn leading_coordinates(values: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (dst, src) in out.iter_mut().zip(values) {
        *dst = *src;
    }
    out
}
