use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::knowledge::{
    DiseaseInfo, DiseaseOverlay, KnowledgeDocument, KnowledgeRetriever, load_disease_records,
    load_knowledge_documents,
};
use super::symptoms::{
    ArtifactStore, ClassificationResult, ModelAccuracy, ModelMetadata, TrainedModel,
    TrainingExample, TrainingOptions, build_model, examples_from_records,
};
use crate::core::cache::{CacheStats, QueryCache};
use crate::core::config::MedQaConfig;
use crate::core::error::{MedQaError, Result};
use crate::utils::safe_truncate_ellipsis;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub classification: ClassificationResult,
    pub disease_info: DiseaseInfo,
    /// No vocabulary term matched; the ranking only reflects label priors.
    pub low_signal: bool,
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitializeSummary {
    pub classifier_loaded: bool,
    pub diseases: usize,
    pub documents: usize,
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerCacheStats {
    pub classify: CacheStats,
    pub retrieve: CacheStats,
}

/// Owns every piece of loaded engine state. Each component is immutable and
/// shared through an `Arc`; loads and retrains build the replacement first and
/// then swap it in, bumping the generation that scopes cached results.
/// Writes and reads of the artifact pair are serialized by `training`.
pub struct ToolingManager {
    config: MedQaConfig,
    store: ArtifactStore,
    training: Mutex<()>,
    model: RwLock<Option<Arc<TrainedModel>>>,
    overlay: RwLock<Arc<DiseaseOverlay>>,
    retriever: RwLock<Arc<KnowledgeRetriever>>,
    generation: AtomicU64,
    classify_cache: QueryCache<ClassificationResult>,
    retrieve_cache: QueryCache<Vec<KnowledgeDocument>>,
}

impl ToolingManager {
    pub fn new(config: MedQaConfig) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing ToolingManager (models: {}, data: {})",
            config.models_dir.display(),
            config.data_dir.display()
        );

        Ok(Self {
            store: ArtifactStore::from_config(&config),
            training: Mutex::new(()),
            model: RwLock::new(None),
            overlay: RwLock::new(Arc::new(DiseaseOverlay::new())),
            retriever: RwLock::new(Arc::new(KnowledgeRetriever::default())),
            generation: AtomicU64::new(0),
            classify_cache: QueryCache::new(config.cache_size, config.cache_ttl),
            retrieve_cache: QueryCache::new(config.cache_size, config.cache_ttl),
            config,
        })
    }

    pub fn config(&self) -> &MedQaConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Loads artifacts, disease records and the knowledge corpus. Absent
    /// sources are not errors.
    pub fn initialize(&self) -> Result<InitializeSummary> {
        let summary = InitializeSummary {
            classifier_loaded: self.load_classifier()?,
            diseases: self.load_disease_info()?,
            documents: self.load_knowledge_corpus()?,
        };

        info!(
            "ToolingManager ready: classifier={}, diseases={}, documents={}",
            summary.classifier_loaded, summary.diseases, summary.documents
        );
        Ok(summary)
    }

    pub fn train_classifier(&self, examples: &[TrainingExample]) -> Result<ModelAccuracy> {
        let _training = self.training.lock();
        let model = self.build_and_save(examples)?;

        let accuracy = model.metadata.accuracy;
        self.publish_model(Arc::new(model));
        Ok(accuracy)
    }

    /// Trains from the disease file and refreshes the overlay from the same
    /// records. Model and overlay are published together.
    pub fn train_from_disease_data(&self) -> Result<ModelAccuracy> {
        let path = self.config.diseases_path();
        let records = load_disease_records(&path)?.ok_or(MedQaError::EmptyCorpus)?;

        let examples = examples_from_records(&records);
        let overlay = DiseaseOverlay::from_records(&records);

        let _training = self.training.lock();
        let model = self.build_and_save(&examples)?;

        let accuracy = model.metadata.accuracy;
        self.publish_model_and_overlay(Arc::new(model), overlay);
        Ok(accuracy)
    }

    // Caller holds `training`.
    fn build_and_save(&self, examples: &[TrainingExample]) -> Result<TrainedModel> {
        let options = TrainingOptions::from_config(&self.config);
        let model = build_model(examples, &options)?;
        self.store.save(&model)?;
        Ok(model)
    }

    pub fn load_classifier(&self) -> Result<bool> {
        let _training = self.training.lock();
        match self.store.load()? {
            Some(model) => {
                info!(
                    "Classifier loaded: artifact {}, {} labels, trained {}",
                    model.metadata.artifact_id,
                    model.metadata.labels.len(),
                    model.metadata.trained_at
                );
                self.publish_model(Arc::new(model));
                Ok(true)
            }
            None => {
                warn!("No trained model found. Train the classifier first");
                Ok(false)
            }
        }
    }

    pub fn load_disease_info(&self) -> Result<usize> {
        let overlay = match load_disease_records(&self.config.diseases_path())? {
            Some(records) => DiseaseOverlay::from_records(&records),
            None => DiseaseOverlay::new(),
        };
        let count = overlay.len();
        self.publish_overlay(overlay);
        Ok(count)
    }

    pub fn load_knowledge_corpus(&self) -> Result<usize> {
        let documents = load_knowledge_documents(&self.config.knowledge_path())?.unwrap_or_default();
        let count = documents.len();
        self.publish_retriever(KnowledgeRetriever::new(documents));
        Ok(count)
    }

    pub fn is_classifier_loaded(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn model_metadata(&self) -> Option<ModelMetadata> {
        self.model.read().as_ref().map(|m| m.metadata.clone())
    }

    pub fn classify(&self, symptom_text: &str) -> Result<ClassificationResult> {
        let (generation, model) = {
            let guard = self.model.read();
            (self.generation(), guard.clone())
        };
        let model = model.ok_or(MedQaError::ModelNotLoaded)?;
        self.cached_classify(generation, &model, symptom_text)
    }

    fn cached_classify(
        &self,
        generation: u64,
        model: &TrainedModel,
        symptom_text: &str,
    ) -> Result<ClassificationResult> {
        let key = QueryCache::<ClassificationResult>::make_key("classify", generation, symptom_text, None);
        if let Some(cached) = self.classify_cache.get(&key) {
            debug!("Cache hit for classify '{}'", safe_truncate_ellipsis(symptom_text, 40));
            return Ok(cached);
        }

        let result = model.classify(symptom_text)?;
        self.classify_cache.set(&key, result.clone());
        Ok(result)
    }

    /// Classifies and looks up guidance against one snapshot of model and overlay.
    pub fn diagnose(&self, symptom_text: &str) -> Result<Diagnosis> {
        let (generation, model, overlay) = {
            let model = self.model.read();
            let overlay = self.overlay.read();
            (self.generation(), model.clone(), Arc::clone(&overlay))
        };
        let model = model.ok_or(MedQaError::ModelNotLoaded)?;

        let classification = self.cached_classify(generation, &model, symptom_text)?;
        let disease_info = overlay.lookup(&classification.disease);
        let low_signal = classification.matched_terms == 0;
        if low_signal {
            warn!(
                "Low-signal diagnosis for '{}': no known symptoms matched",
                safe_truncate_ellipsis(symptom_text, 40)
            );
        }

        Ok(Diagnosis {
            classification,
            disease_info,
            low_signal,
        })
    }

    pub fn describe_disease(&self, disease: &str) -> DiseaseInfo {
        let overlay = self.overlay.read().clone();
        overlay.lookup(disease)
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<KnowledgeDocument>> {
        let (generation, retriever) = {
            let guard = self.retriever.read();
            (self.generation(), Arc::clone(&guard))
        };

        let key = QueryCache::<Vec<KnowledgeDocument>>::make_key("retrieve", generation, query, Some(k));
        if let Some(cached) = self.retrieve_cache.get(&key) {
            return Ok(cached);
        }

        let results = retriever.retrieve(query, k)?;
        self.retrieve_cache.set(&key, results.clone());
        Ok(results)
    }

    pub fn search(&self, query: &str) -> Result<Vec<KnowledgeDocument>> {
        self.retrieve(query, self.config.default_top_k)
    }

    pub fn documents_by_category(&self, category: &str) -> Vec<KnowledgeDocument> {
        let retriever = self.retriever.read().clone();
        retriever.documents_by_category(category)
    }

    pub fn cache_stats(&self) -> ManagerCacheStats {
        ManagerCacheStats {
            classify: self.classify_cache.stats(),
            retrieve: self.retrieve_cache.stats(),
        }
    }

    fn publish_model(&self, model: Arc<TrainedModel>) {
        let mut guard = self.model.write();
        *guard = Some(model);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Published classifier, generation {}", generation);
    }

    // Lock order is model then overlay, matching `diagnose`.
    fn publish_model_and_overlay(&self, model: Arc<TrainedModel>, overlay: DiseaseOverlay) {
        let overlay = Arc::new(overlay);
        let mut model_guard = self.model.write();
        let mut overlay_guard = self.overlay.write();
        *model_guard = Some(model);
        *overlay_guard = overlay;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Published classifier and disease overlay, generation {}", generation);
    }

    fn publish_overlay(&self, overlay: DiseaseOverlay) {
        let overlay = Arc::new(overlay);
        let mut guard = self.overlay.write();
        *guard = overlay;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn publish_retriever(&self, retriever: KnowledgeRetriever) {
        let retriever = Arc::new(retriever);
        let mut guard = self.retriever.write();
        *guard = retriever;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Published knowledge corpus, generation {}", generation);
    }
}
