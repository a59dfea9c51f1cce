use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::checker::{ModelMetadata, TrainedModel};
use super::naive_bayes::NaiveBayesModel;
use super::vectorizer::Vocabulary;
use crate::core::config::MedQaConfig;
use crate::core::error::{MedQaError, Result};


#[derive(Debug, Serialize, Deserialize)]
struct VectorizerArtifact {
    artifact_id: Uuid,
    vocabulary: Vocabulary,
}


#[derive(Debug, Serialize, Deserialize)]
struct ClassifierArtifact {
    artifact_id: Uuid,
    metadata: ModelMetadata,
    classifier: NaiveBayesModel,
}

/// Reads and writes the vectorizer/classifier blobs. They are only valid as a
/// pair carrying the same artifact id.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    vectorizer_path: PathBuf,
    classifier_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(vectorizer_path: impl Into<PathBuf>, classifier_path: impl Into<PathBuf>) -> Self {
        Self {
            vectorizer_path: vectorizer_path.into(),
            classifier_path: classifier_path.into(),
        }
    }

    pub fn from_config(config: &MedQaConfig) -> Self {
        Self::new(config.vectorizer_path(), config.classifier_path())
    }

    pub fn vectorizer_path(&self) -> &Path {
        &self.vectorizer_path
    }

    pub fn classifier_path(&self) -> &Path {
        &self.classifier_path
    }

    pub fn exists(&self) -> bool {
        self.vectorizer_path.exists() && self.classifier_path.exists()
    }

    /// Both blobs are staged as temp files before either is renamed into place.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let artifact_id = model.metadata.artifact_id;

        let vectorizer = stage(
            &self.vectorizer_path,
            &VectorizerArtifact {
                artifact_id,
                vocabulary: model.vocabulary.clone(),
            },
        )?;
        let classifier = stage(
            &self.classifier_path,
            &ClassifierArtifact {
                artifact_id,
                metadata: model.metadata.clone(),
                classifier: model.classifier.clone(),
            },
        )?;

        vectorizer
            .persist(&self.vectorizer_path)
            .map_err(|e| MedQaError::Io(e.error))?;
        classifier
            .persist(&self.classifier_path)
            .map_err(|e| MedQaError::Io(e.error))?;

        info!(
            "Saved model artifacts {} to {} and {}",
            artifact_id,
            self.vectorizer_path.display(),
            self.classifier_path.display()
        );
        Ok(())
    }

    /// `Ok(None)` when neither blob exists yet.
    pub fn load(&self) -> Result<Option<TrainedModel>> {
        let has_vectorizer = self.vectorizer_path.exists();
        let has_classifier = self.classifier_path.exists();

        match (has_vectorizer, has_classifier) {
            (false, false) => {
                warn!("No trained model artifacts found in {}", parent_display(&self.classifier_path));
                return Ok(None);
            }
            (true, false) | (false, true) => {
                let missing = if has_vectorizer { &self.classifier_path } else { &self.vectorizer_path };
                return Err(MedQaError::ArtifactCorrupt(format!(
                    "artifact pair incomplete, missing {}",
                    missing.display()
                )));
            }
            (true, true) => {}
        }

        let vectorizer: VectorizerArtifact = read_blob(&self.vectorizer_path)?;
        let classifier: ClassifierArtifact = read_blob(&self.classifier_path)?;

        if vectorizer.artifact_id != classifier.artifact_id
            || classifier.metadata.artifact_id != classifier.artifact_id
        {
            return Err(MedQaError::ArtifactCorrupt(format!(
                "vectorizer {} does not match classifier {}",
                vectorizer.artifact_id, classifier.artifact_id
            )));
        }
        if vectorizer.vocabulary.len() != classifier.classifier.n_features() {
            return Err(MedQaError::ArtifactCorrupt(format!(
                "vocabulary has {} terms but classifier expects {}",
                vectorizer.vocabulary.len(),
                classifier.classifier.n_features()
            )));
        }
        if classifier.classifier.labels().is_empty() {
            return Err(MedQaError::ArtifactCorrupt("classifier has no labels".to_string()));
        }

        debug!(
            "Loaded artifacts {}: {} terms, {} labels, alpha {}",
            classifier.artifact_id,
            vectorizer.vocabulary.len(),
            classifier.classifier.labels().len(),
            classifier.classifier.alpha()
        );

        Ok(Some(TrainedModel {
            vocabulary: vectorizer.vocabulary,
            classifier: classifier.classifier,
            metadata: classifier.metadata,
        }))
    }
}

fn parent_display(path: &Path) -> String {
    path.parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string())
}

fn stage<T: Serialize>(path: &Path, value: &T) -> Result<NamedTempFile> {
    let parent_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        bincode::serialize_into(&mut writer, value)
            .map_err(|e| MedQaError::Internal(format!("failed to encode {}: {e}", path.display())))?;
        writer.flush()?;
    }
    Ok(temp_file)
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes)
        .map_err(|e| MedQaError::ArtifactCorrupt(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::symptoms::checker::{TrainingOptions, build_model};
    use crate::toolkit::symptoms::training::TrainingExample;

    fn model() -> TrainedModel {
        let examples = vec![
            TrainingExample::new("persistent cough, chest pain", "Lung Cancer"),
            TrainingExample::new("chest pain", "Lung Cancer"),
            TrainingExample::new("coughing blood", "Lung Cancer"),
            TrainingExample::new("severe headache, vision problems", "Brain Tumor"),
            TrainingExample::new("seizures", "Brain Tumor"),
            TrainingExample::new("severe headache", "Brain Tumor"),
        ];
        build_model(&examples, &TrainingOptions::default()).unwrap()
    }

    fn store(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(dir.join("vectorizer.bin"), dir.join("disease_classifier.bin"))
    }

    #[test]
    fn test_load_without_artifacts_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(dir.path()).load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("models"));
        let model = model();
        store.save(&model).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, model);
        for query in ["chest pain", "headache and seizures", "nothing relevant"] {
            assert_eq!(loaded.predict(query).unwrap(), model.predict(query).unwrap());
        }
    }

    #[test]
    fn test_half_pair_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&model()).unwrap();
        fs::remove_file(store.classifier_path()).unwrap();
        assert!(matches!(store.load(), Err(MedQaError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_mismatched_pair_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let first = store(&dir.path().join("a"));
        let second = store(&dir.path().join("b"));
        first.save(&model()).unwrap();
        second.save(&model()).unwrap();

        fs::copy(second.classifier_path(), first.classifier_path()).unwrap();
        assert!(matches!(first.load(), Err(MedQaError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_garbage_blob_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&model()).unwrap();
        fs::write(store.vectorizer_path(), b"not a model").unwrap();
        assert!(matches!(store.load(), Err(MedQaError::ArtifactCorrupt(_))));
    }
}
