use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::naive_bayes::{LabelProbability, NaiveBayesModel};
use super::training::TrainingExample;
use super::vectorizer::{TfidfVectorizer, Vocabulary};
use crate::core::config::MedQaConfig;
use crate::core::error::{MedQaError, Result};
use crate::utils::{round_to_tenth, safe_truncate_ellipsis};


pub const ALTERNATIVE_RANKS: std::ops::Range<usize> = 1..4;


pub const TOP_PREDICTIONS: usize = 5;


#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub max_features: usize,
    pub test_size: f64,
    pub random_seed: u64,
    pub smoothing_alpha: f64,
}

impl TrainingOptions {
    pub fn from_config(config: &MedQaConfig) -> Self {
        Self {
            max_features: config.max_features,
            test_size: config.test_size,
            random_seed: config.random_seed,
            smoothing_alpha: config.smoothing_alpha,
        }
    }
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self::from_config(&MedQaConfig::default())
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracy {
    /// Fraction of held-out examples predicted correctly, in `[0, 1]`.
    pub accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub artifact_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub accuracy: ModelAccuracy,
    pub labels: Vec<String>,
    pub vocabulary_size: usize,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPredictions {
    pub distribution: Vec<LabelProbability>,
    pub matched_terms: usize,
}

impl RankedPredictions {
    pub fn top(&self) -> Option<&LabelProbability> {
        self.distribution.first()
    }

    pub fn confidence(&self) -> f64 {
        self.top().map(|p| round_to_tenth(p.probability * 100.0)).unwrap_or(0.0)
    }

    pub fn alternatives(&self) -> Vec<(String, f64)> {
        self.ranked(ALTERNATIVE_RANKS)
    }

    pub fn top_predictions(&self) -> Vec<(String, f64)> {
        self.ranked(0..TOP_PREDICTIONS)
    }

    pub fn has_signal(&self) -> bool {
        self.matched_terms > 0
    }

    fn ranked(&self, ranks: std::ops::Range<usize>) -> Vec<(String, f64)> {
        self.distribution
            .iter()
            .skip(ranks.start)
            .take(ranks.end.saturating_sub(ranks.start))
            .map(|p| (p.label.clone(), round_to_tenth(p.probability * 100.0)))
            .collect()
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub disease: String,
    pub confidence: f64,
    pub alternatives: Vec<(String, f64)>,
    pub top_predictions: Vec<(String, f64)>,
    pub matched_terms: usize,
    pub symptoms_analyzed: String,
}

impl ClassificationResult {
    pub fn from_predictions(symptoms: &str, predictions: &RankedPredictions) -> Result<Self> {
        let top = predictions
            .top()
            .ok_or_else(|| MedQaError::Internal("classifier has no labels".to_string()))?;

        Ok(Self {
            disease: top.label.clone(),
            confidence: predictions.confidence(),
            alternatives: predictions.alternatives(),
            top_predictions: predictions.top_predictions(),
            matched_terms: predictions.matched_terms,
            symptoms_analyzed: symptoms.to_string(),
        })
    }
}

/// A vocabulary and the classifier trained against it. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub vocabulary: Vocabulary,
    pub classifier: NaiveBayesModel,
    pub metadata: ModelMetadata,
}

impl TrainedModel {
    pub fn predict(&self, text: &str) -> Result<RankedPredictions> {
        let cleaned = text.trim().to_lowercase();
        if cleaned.is_empty() {
            return Err(MedQaError::InvalidArgument(
                "symptom text must not be empty".to_string(),
            ));
        }

        let vector = self.vocabulary.transform(&cleaned);
        if vector.is_zero() {
            warn!(
                "No known symptom terms in query '{}'",
                safe_truncate_ellipsis(&cleaned, 60)
            );
        }

        let distribution = self.classifier.posterior(&vector);
        debug!(
            "Classified '{}' over {} labels ({} matched terms)",
            safe_truncate_ellipsis(&cleaned, 60),
            distribution.len(),
            vector.nnz()
        );

        Ok(RankedPredictions {
            distribution,
            matched_terms: vector.nnz(),
        })
    }

    pub fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let predictions = self.predict(text)?;
        ClassificationResult::from_predictions(text.trim(), &predictions)
    }
}


pub struct SymptomChecker {
    options: TrainingOptions,
    model: Option<Arc<TrainedModel>>,
}

impl SymptomChecker {
    pub fn new(options: TrainingOptions) -> Self {
        Self { options, model: None }
    }

    pub fn model(&self) -> Option<Arc<TrainedModel>> {
        self.model.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Rebuilds from scratch; the previous model is replaced only on success.
    pub fn train(&mut self, examples: &[TrainingExample]) -> Result<ModelAccuracy> {
        let model = build_model(examples, &self.options)?;
        let accuracy = model.metadata.accuracy;
        self.model = Some(Arc::new(model));
        Ok(accuracy)
    }

    pub fn predict(&self, text: &str) -> Result<RankedPredictions> {
        self.model
            .as_ref()
            .ok_or(MedQaError::ModelNotLoaded)?
            .predict(text)
    }

    pub fn classify(&self, text: &str) -> Result<ClassificationResult> {
        self.model
            .as_ref()
            .ok_or(MedQaError::ModelNotLoaded)?
            .classify(text)
    }
}

impl Default for SymptomChecker {
    fn default() -> Self {
        Self::new(TrainingOptions::default())
    }
}


fn holdout_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return (indices, Vec::new());
    }

    let train = indices.split_off(n_test);
    (train, indices)
}


pub fn build_model(examples: &[TrainingExample], options: &TrainingOptions) -> Result<TrainedModel> {
    if examples.is_empty() {
        return Err(MedQaError::EmptyCorpus);
    }

    info!("Training symptom checker on {} examples", examples.len());

    let texts: Vec<String> = examples
        .iter()
        .map(|e| e.symptoms_text.trim().to_lowercase())
        .collect();
    let vocabulary = TfidfVectorizer::new(options.max_features).fit(&texts)?;
    let vectors: Vec<_> = texts.iter().map(|t| vocabulary.transform(t)).collect();

    let (train_idx, test_idx) = holdout_split(examples.len(), options.test_size, options.random_seed);

    let train_samples: Vec<_> = train_idx
        .iter()
        .map(|&i| (vectors[i].clone(), examples[i].disease_label.clone()))
        .collect();
    let classifier = NaiveBayesModel::fit(&train_samples, vocabulary.len(), options.smoothing_alpha)?;

    let eval_idx = if test_idx.is_empty() { &train_idx } else { &test_idx };
    let correct = eval_idx
        .iter()
        .filter(|&&i| classifier.predict(&vectors[i]).as_deref() == Some(examples[i].disease_label.as_str()))
        .count();

    let accuracy = ModelAccuracy {
        accuracy: correct as f64 / eval_idx.len() as f64,
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    };

    info!(
        "Model trained: {} labels, accuracy {:.2}% on {} held-out examples",
        classifier.labels().len(),
        accuracy.accuracy * 100.0,
        accuracy.test_size
    );

    let metadata = ModelMetadata {
        artifact_id: Uuid::new_v4(),
        trained_at: Utc::now(),
        accuracy,
        labels: classifier.labels().to_vec(),
        vocabulary_size: vocabulary.len(),
    };

    Ok(TrainedModel {
        vocabulary,
        classifier,
        metadata,
    })
}
