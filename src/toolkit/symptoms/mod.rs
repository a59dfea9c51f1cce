

pub mod artifacts;
pub mod checker;
pub mod naive_bayes;
pub mod text;
pub mod training;
pub mod vectorizer;

pub use artifacts::ArtifactStore;
pub use checker::{
    ClassificationResult, ModelAccuracy, ModelMetadata, RankedPredictions, SymptomChecker,
    TrainedModel, TrainingOptions, build_model,
};
pub use naive_bayes::{LabelProbability, NaiveBayesModel};
pub use training::{TrainingExample, examples_from_records};
pub use vectorizer::{FeatureVector, TfidfVectorizer, Vocabulary};
