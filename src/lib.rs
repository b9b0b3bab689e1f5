/// This crate is a latent semantic search engine built on TF-IDF weighting
/// and a truncated singular value decomposition.
pub mod config;
pub mod decomposer;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod utils;
pub mod vectorizer;

/// Query Engine
/// The top-level struct of this crate. It owns a fitted term-weighting model
/// and the concept index built from it, and answers free-text queries with
/// documents ranked by cosine similarity in concept space.
///
/// An `Engine` is immutable once built or loaded. Share it between threads
/// with `Arc<Engine>`.
///
/// # Persistence
/// `save` / `load` write and read a single versioned CBOR bundle holding the
/// vocabulary, the decomposition and the document identifiers together.
pub use engine::Engine;

/// Engine Holder
/// Populated once at process start. Queries issued before that fail with
/// `SpectralError::EngineNotLoaded`, which callers may retry.
pub use engine::EngineCell;

/// Search results
/// - `SearchOutcome`: either `NoMatch` (no query term is in the vocabulary) or ranked matches
/// - `SearchResults`: the ranked hits plus the projected query coordinates
/// - `Hit`: 1-based rank, cosine score and document identifier
pub use engine::search::{Hit, SearchOutcome, SearchResults};

/// Concept Index
/// Decomposition triple, ordered document identifiers and the model whose
/// vocabulary defines the term axis, checked for alignment when assembled.
pub use index::ConceptIndex;

/// Concept Index Data Structure for Serialization
/// The on-disk bundle. Convert it with `into_concept_index`, which validates
/// the format version and the shapes of every part.
pub use index::serde::ConceptIndexData;

/// Rank-k Decomposer and its output triple (U, σ, Vᵗ)
pub use decomposer::{Decomposer, Decomposition};

/// Term-Weighting Model
/// Fits a sorted vocabulary with frozen IDF weights on a training corpus and
/// turns any text into a sparse weighted vector over that vocabulary.
pub use vectorizer::TermWeightingModel;

/// Corpus document-frequency counter
/// Thread-safe, implemented using DashMap and atomics.
pub use vectorizer::corpus::Corpus;

/// Term Frequency structure
/// Occurrence count of each term within one document.
pub use vectorizer::term::TermFrequency;

/// Tokenizer used at fit and query time
pub use vectorizer::analyzer::Analyzer;

/// TF IDF Calculation Engine Trait
/// `DefaultTFIDFEngine` computes `tf * ln(N / df)`, `SmoothTFIDFEngine` the
/// smoothed, L2-normalized variant. `WeightingScheme` selects one and is
/// persisted with the model.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, SmoothTFIDFEngine, TFIDFEngine, WeightingScheme};

pub use config::SpectralConfig;
pub use error::{Result, SpectralError};
