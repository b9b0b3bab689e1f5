//! Configuration for index building and query serving.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};
use crate::vectorizer::tfidf::WeightingScheme;

/// Top-level configuration.
/// Every section has a default, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpectralConfig {
    pub weighting: WeightingConfig,
    pub decompose: DecomposeConfig,
    pub search: SearchConfig,
}

/// Term weighting and vocabulary pruning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeightingConfig {
    /// Weighting formula frozen into the model at fit time.
    pub scheme: WeightingScheme,
    /// Drop terms appearing in fewer documents than this.
    pub min_df: u64,
    /// Drop terms appearing in more than this fraction of documents (0.0 - 1.0].
    pub max_df: f64,
    /// Remove English stop-words before counting.
    pub stop_words: bool,
}

impl Default for WeightingConfig {
    fn default() -> Self {
        Self {
            scheme: WeightingScheme::Standard,
            min_df: 1,
            max_df: 1.0,
            stop_words: true,
        }
    }
}

/// Truncated factorization parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecomposeConfig {
    /// Number of concepts kept.
    pub k: usize,
    /// Extra basis vectors carried by the subspace iteration.
    pub oversample: usize,
    pub max_iterations: usize,
    /// Relative change of the leading singular values below which iteration stops.
    pub tolerance: f64,
    /// Seed of the random starting basis. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        Self {
            k: 100,
            oversample: 10,
            max_iterations: 300,
            tolerance: 1e-10,
            seed: None,
        }
    }
}

/// Serving parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl SpectralConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: SpectralConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.weighting.max_df > 0.0 && self.weighting.max_df <= 1.0) {
            return Err(SpectralError::Config(format!(
                "max_df must be in (0, 1], got {}",
                self.weighting.max_df
            )));
        }
        if self.decompose.k == 0 {
            return Err(SpectralError::Config("k must be at least 1".to_string()));
        }
        if self.decompose.max_iterations == 0 {
            return Err(SpectralError::Config("max_iterations must be at least 1".to_string()));
        }
        if !(self.decompose.tolerance > 0.0) {
            return Err(SpectralError::Config("tolerance must be positive".to_string()));
        }
        if self.search.top_k == 0 {
            return Err(SpectralError::Config("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}
