use serde::{Deserialize, Serialize};

/// TF-IDF calculation engine
/// Defines how a (term count, document frequency) pair becomes a weight.
/// Implementations are stateless; the IDF values they produce are frozen
/// into the model at fit time.
pub trait TFIDFEngine {
    /// IDF of a term
    /// # Arguments
    /// * `doc_num` - number of training documents
    /// * `doc_freq` - number of training documents containing the term
    fn idf(doc_num: u64, doc_freq: u64) -> f64;

    /// Weight of a term inside one document
    #[inline]
    fn weight(count: u64, idf: f64) -> f64 {
        count as f64 * idf
    }

    /// Whether each weighted row is scaled to unit L2 norm
    fn l2_normalize() -> bool;
}

/// Textbook weighting: `tf * ln(N / df)`
/// A term present in every document gets weight 0.
#[derive(Debug)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        if doc_freq == 0 {
            return 0.0;
        }
        (doc_num as f64 / doc_freq as f64).ln()
    }

    fn l2_normalize() -> bool {
        false
    }
}

/// Smoothed weighting: `tf * (ln((1 + N) / (1 + df)) + 1)` with unit-length rows
#[derive(Debug)]
pub struct SmoothTFIDFEngine;

impl TFIDFEngine for SmoothTFIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }

    fn l2_normalize() -> bool {
        true
    }
}

/// Persistable choice of engine
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// `DefaultTFIDFEngine`
    #[default]
    Standard,
    /// `SmoothTFIDFEngine`
    Smooth,
}

impl WeightingScheme {
    pub fn idf(self, doc_num: u64, doc_freq: u64) -> f64 {
        match self {
            WeightingScheme::Standard => DefaultTFIDFEngine::idf(doc_num, doc_freq),
            WeightingScheme::Smooth => SmoothTFIDFEngine::idf(doc_num, doc_freq),
        }
    }

    pub fn weight(self, count: u64, idf: f64) -> f64 {
        match self {
            WeightingScheme::Standard => DefaultTFIDFEngine::weight(count, idf),
            WeightingScheme::Smooth => SmoothTFIDFEngine::weight(count, idf),
        }
    }

    pub fn l2_normalize(self) -> bool {
        match self {
            WeightingScheme::Standard => DefaultTFIDFEngine::l2_normalize(),
            WeightingScheme::Smooth => SmoothTFIDFEngine::l2_normalize(),
        }
    }
}
