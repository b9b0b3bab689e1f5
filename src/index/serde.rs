use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ::serde::{Deserialize, Serialize};
use tracing::info;

use crate::decomposer::Decomposition;
use crate::error::{Result, SpectralError};
use crate::index::ConceptIndex;
use crate::vectorizer::TermWeightingModel;

/// Format version written into every bundle
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Serializable artifact bundle of one build.
/// The model, the decomposition and the identifiers are always written and
/// read together so a serving process cannot mix artifacts of different builds.
/// Use `into_concept_index` to validate and assemble a `ConceptIndex`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConceptIndexData {
    pub format_version: u32,
    /// each part is optional on the wire so a partial bundle is reported as
    /// an alignment problem rather than a decoding failure
    #[serde(default)]
    pub model: Option<TermWeightingModel>,
    #[serde(default)]
    pub decomposition: Option<Decomposition>,
    #[serde(default)]
    pub doc_ids: Option<Vec<String>>,
}

impl ConceptIndexData {
    pub fn new(model: TermWeightingModel, decomposition: Decomposition, doc_ids: Vec<String>) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            model: Some(model),
            decomposition: Some(decomposition),
            doc_ids: Some(doc_ids),
        }
    }

    /// Validate the bundle and build the index
    pub fn into_concept_index(self) -> Result<ConceptIndex> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(SpectralError::Alignment(format!(
                "bundle format version {} is not supported (expected {})",
                self.format_version, BUNDLE_FORMAT_VERSION
            )));
        }
        let missing = |part: &str| SpectralError::Alignment(format!("bundle is missing the {}", part));
        let model = self.model.ok_or_else(|| missing("term weighting model"))?;
        let decomposition = self.decomposition.ok_or_else(|| missing("decomposition"))?;
        let doc_ids = self.doc_ids.ok_or_else(|| missing("document identifiers"))?;
        ConceptIndex::build(decomposition, doc_ids, model)
    }

    /// Write the bundle as CBOR. The file is written next to `path` first and
    /// renamed into place, so readers never observe a half-written bundle.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_cbor::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "bundle saved");
        Ok(())
    }

    /// Read a bundle without validating it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_cbor::from_reader(reader)?)
    }
}

impl ConceptIndex {
    /// Snapshot of this index for persistence
    pub fn to_data(&self) -> ConceptIndexData {
        ConceptIndexData::new(self.model().clone(), self.decomposition().clone(), self.doc_ids().to_vec())
    }

    /// Load and validate a bundle written by `save`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let index = ConceptIndexData::load(path)?.into_concept_index()?;
        info!(
            path = %path.display(),
            documents = index.len(),
            concepts = index.rank(),
            "bundle loaded"
        );
        Ok(index)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_data().save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DecomposeConfig, WeightingConfig};
    use crate::decomposer::Decomposer;

    fn data() -> ConceptIndexData {
        let docs = vec!["cat dog", "dog bird", "car engine"];
        let (model, matrix) = TermWeightingModel::fit(&docs, &WeightingConfig::default()).unwrap();
        let decomposition = Decomposer::new(DecomposeConfig { seed: Some(11), ..DecomposeConfig::default() })
            .decompose(&matrix, 2)
            .unwrap();
        ConceptIndexData::new(model, decomposition, vec!["0".into(), "1".into(), "2".into()])
    }

    #[test]
    fn save_and_load_preserve_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.cbor");
        let original = data().into_concept_index().unwrap();
        original.save(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = ConceptIndex::load(&path).unwrap();
        assert_eq!(loaded.doc_ids(), original.doc_ids());
        assert_eq!(loaded.model(), original.model());
        assert_eq!(loaded.decomposition().u, original.decomposition().u);
        assert_eq!(loaded.decomposition().sigma, original.decomposition().sigma);
        assert_eq!(loaded.decomposition().vt, original.decomposition().vt);
    }

    #[test]
    fn partial_bundle_is_an_alignment_error() {
        let mut partial = data();
        partial.doc_ids = None;
        assert!(matches!(partial.into_concept_index(), Err(SpectralError::Alignment(_))));

        let mut partial = data();
        partial.model = None;
        assert!(matches!(partial.into_concept_index(), Err(SpectralError::Alignment(_))));
    }

    #[test]
    fn misaligned_bundle_on_disk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cbor");
        let mut bad = data();
        bad.doc_ids = Some(vec!["only-one".into()]);
        bad.save(&path).unwrap();
        assert!(matches!(ConceptIndex::load(&path), Err(SpectralError::Alignment(_))));
    }

    #[test]
    fn model_from_another_corpus_is_rejected() {
        // same five-term vocabulary, four training documents instead of three
        let other = vec!["cat dog", "dog bird", "car engine", "cat bird car"];
        let (model, _) = TermWeightingModel::fit(&other, &WeightingConfig::default()).unwrap();
        let mut skewed = data();
        assert_eq!(skewed.model.as_ref().unwrap().vocabulary_size(), model.vocabulary_size());
        skewed.model = Some(model);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skewed.cbor");
        skewed.save(&path).unwrap();
        assert!(matches!(ConceptIndex::load(&path), Err(SpectralError::Alignment(_))));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut future = data();
        future.format_version = BUNDLE_FORMAT_VERSION + 1;
        assert!(matches!(future.into_concept_index(), Err(SpectralError::Alignment(_))));
    }

    #[test]
    fn garbage_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.cbor");
        std::fs::write(&path, b"not cbor at all").unwrap();
        assert!(matches!(ConceptIndex::load(&path), Err(SpectralError::Serialization(_))));
    }
}
