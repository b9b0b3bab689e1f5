mod scoring;
pub mod search;

use std::path::Path;
use std::sync::{Arc, OnceLock};

use tracing::{info, info_span};

use crate::config::SpectralConfig;
use crate::decomposer::Decomposer;
use crate::error::{Result, SpectralError};
use crate::index::ConceptIndex;
use crate::vectorizer::TermWeightingModel;

pub use self::search::{Hit, SearchOutcome, SearchResults};

/// Query Engine
/// Immutable serving state: a fitted model and its concept index.
/// Share it with `Arc<Engine>`; `search` only reads.
#[derive(Debug)]
pub struct Engine {
    index: ConceptIndex,
}

impl Engine {
    pub fn new(index: ConceptIndex) -> Self {
        Self { index }
    }

    /// Fit, decompose and index `corpus` in one batch.
    /// `doc_ids[i]` names `corpus[i]`.
    pub fn build<T>(corpus: &[T], doc_ids: Vec<String>, config: &SpectralConfig) -> Result<Self>
    where
        T: AsRef<str> + Sync,
    {
        config.validate()?;
        if corpus.len() != doc_ids.len() {
            return Err(SpectralError::Alignment(format!(
                "{} documents but {} identifiers",
                corpus.len(),
                doc_ids.len()
            )));
        }
        let _span = info_span!("build", documents = corpus.len()).entered();
        let (model, matrix) = TermWeightingModel::fit(corpus, &config.weighting)?;
        let decomposition = Decomposer::new(config.decompose.clone()).decompose(&matrix, config.decompose.k)?;
        let index = ConceptIndex::build(decomposition, doc_ids, model)?;
        info!(documents = index.len(), concepts = index.rank(), "engine built");
        Ok(Self { index })
    }

    /// Load a bundle written by `save`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        ConceptIndex::load(path).map(Self::new)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.index.save(path)
    }

    pub fn index(&self) -> &ConceptIndex {
        &self.index
    }

    /// First three concept coordinates of document `index`
    pub fn document_coordinates(&self, index: usize) -> Option<[f64; 3]> {
        self.index.coordinates(index)
    }
}

/// Serving-side holder for an engine that is initialized once at startup.
/// Queries issued before `set` fail with `EngineNotLoaded`.
#[derive(Debug, Default)]
pub struct EngineCell {
    engine: OnceLock<Arc<Engine>>,
}

impl EngineCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the engine. Fails if one is already installed.
    pub fn set(&self, engine: Engine) -> Result<Arc<Engine>> {
        let engine = Arc::new(engine);
        self.engine
            .set(Arc::clone(&engine))
            .map_err(|_| SpectralError::InvalidArgument("engine is already loaded".to_string()))?;
        Ok(engine)
    }

    /// Load a bundle from disk and install it
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Engine>> {
        self.set(Engine::load(path)?)
    }

    pub fn get(&self) -> Result<Arc<Engine>> {
        self.engine.get().cloned().ok_or(SpectralError::EngineNotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.get().is_some()
    }

    pub fn search(&self, text: &str, top_k: usize) -> Result<SearchOutcome> {
        self.get()?.search(text, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpectralConfig {
        let mut config = SpectralConfig::default();
        config.decompose.k = 2;
        config.decompose.seed = Some(9);
        config
    }

    fn docs() -> Vec<&'static str> {
        vec!["cat dog", "dog bird", "car engine"]
    }

    fn ids() -> Vec<String> {
        (0..3).map(|i| i.to_string()).collect()
    }

    #[test]
    fn cell_rejects_queries_before_load() {
        let cell = EngineCell::new();
        assert!(!cell.is_loaded());
        assert!(matches!(cell.search("dog", 3), Err(SpectralError::EngineNotLoaded)));
        assert!(!SpectralError::EngineNotLoaded.is_fatal());

        cell.set(Engine::build(&docs(), ids(), &config()).unwrap()).unwrap();
        assert!(cell.is_loaded());
        assert_eq!(cell.search("dog", 3).unwrap().hits().len(), 3);
    }

    #[test]
    fn cell_is_set_once() {
        let cell = EngineCell::new();
        cell.set(Engine::build(&docs(), ids(), &config()).unwrap()).unwrap();
        let again = cell.set(Engine::build(&docs(), ids(), &config()).unwrap());
        assert!(matches!(again, Err(SpectralError::InvalidArgument(_))));
    }

    #[test]
    fn build_checks_identifier_count() {
        let err = Engine::build(&docs(), vec!["only".to_string()], &config()).unwrap_err();
        assert!(matches!(err, SpectralError::Alignment(_)));
    }

    #[test]
    fn build_propagates_decomposition_errors() {
        let mut config = config();
        config.decompose.k = 3;
        assert!(matches!(
            Engine::build(&docs(), ids(), &config),
            Err(SpectralError::Decomposition(_))
        ));
    }

    #[test]
    fn engine_is_shared_across_threads() {
        let engine = Arc::new(Engine::build(&docs(), ids(), &config()).unwrap());
        let expected = engine.search("bird", 3).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.search("bird", 3).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn saved_engine_answers_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.cbor");
        let engine = Engine::build(&docs(), ids(), &config()).unwrap();
        engine.save(&path).unwrap();
        let loaded = Engine::load(&path).unwrap();
        assert_eq!(engine.search("dog bird", 3).unwrap(), loaded.search("dog bird", 3).unwrap());
        assert_eq!(engine.document_coordinates(1), loaded.document_coordinates(1));
    }
}
