

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{MedQaError, Result};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedQaConfig {

    pub models_dir: PathBuf,
    pub data_dir: PathBuf,
    pub vectorizer_file: String,
    pub classifier_file: String,
    pub diseases_file: String,
    pub knowledge_file: String,


    pub max_features: usize,
    pub test_size: f64,
    pub random_seed: u64,
    pub smoothing_alpha: f64,


    pub default_top_k: usize,


    pub cache_size: usize,
    pub cache_ttl: u64,
}

impl MedQaConfig {

    pub fn new(models_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            data_dir: data_dir.into(),
            vectorizer_file: "vectorizer.bin".to_string(),
            classifier_file: "disease_classifier.bin".to_string(),
            diseases_file: "diseases.json".to_string(),
            knowledge_file: "medical_knowledge.json".to_string(),

            max_features: crate::DEFAULT_MAX_FEATURES,
            test_size: 0.2,
            random_seed: 42,
            smoothing_alpha: 1.0,

            default_top_k: crate::DEFAULT_TOP_K,

            cache_size: crate::DEFAULT_CACHE_SIZE,
            cache_ttl: crate::DEFAULT_CACHE_TTL,
        }
    }

    /// Layered load: defaults, then an optional file, then `MEDQA_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let config: Self = builder
            .add_source(config::Environment::with_prefix("MEDQA").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }


    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// `MEDQA_*` overrides read through `lookup`; unparsable values are errors.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(
            lookup("MEDQA_MODELS_DIR").unwrap_or_else(|| "models".to_string()),
            lookup("MEDQA_DATA_DIR").unwrap_or_else(|| "data".to_string()),
        );

        if let Some(name) = lookup("MEDQA_VECTORIZER_FILE") {
            config.vectorizer_file = name;
        }
        if let Some(name) = lookup("MEDQA_CLASSIFIER_FILE") {
            config.classifier_file = name;
        }
        if let Some(name) = lookup("MEDQA_DISEASES_FILE") {
            config.diseases_file = name;
        }
        if let Some(name) = lookup("MEDQA_KNOWLEDGE_FILE") {
            config.knowledge_file = name;
        }

        override_parsed(&lookup, "MEDQA_MAX_FEATURES", &mut config.max_features)?;
        override_parsed(&lookup, "MEDQA_TEST_SIZE", &mut config.test_size)?;
        override_parsed(&lookup, "MEDQA_RANDOM_SEED", &mut config.random_seed)?;
        override_parsed(&lookup, "MEDQA_SMOOTHING_ALPHA", &mut config.smoothing_alpha)?;
        override_parsed(&lookup, "MEDQA_DEFAULT_TOP_K", &mut config.default_top_k)?;
        override_parsed(&lookup, "MEDQA_CACHE_SIZE", &mut config.cache_size)?;
        override_parsed(&lookup, "MEDQA_CACHE_TTL", &mut config.cache_ttl)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(MedQaError::Config("max_features must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(MedQaError::Config(format!(
                "test_size must be in [0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.smoothing_alpha.is_finite() && self.smoothing_alpha > 0.0) {
            return Err(MedQaError::Config(format!(
                "smoothing_alpha must be finite and positive, got {}",
                self.smoothing_alpha
            )));
        }
        if self.default_top_k == 0 {
            return Err(MedQaError::Config("default_top_k must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.models_dir.join(&self.vectorizer_file)
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.models_dir.join(&self.classifier_file)
    }

    pub fn diseases_path(&self) -> PathBuf {
        self.data_dir.join(&self.diseases_file)
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.data_dir.join(&self.knowledge_file)
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| MedQaError::Config(format!("{key}={raw}: {e}")))?;
    }
    Ok(())
}

impl Default for MedQaConfig {
    fn default() -> Self {
        Self::new("models", "data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = MedQaConfig::default();
        assert_eq!(config.vectorizer_path(), PathBuf::from("models/vectorizer.bin"));
        assert_eq!(config.classifier_path(), PathBuf::from("models/disease_classifier.bin"));
        assert_eq!(config.knowledge_path(), PathBuf::from("data/medical_knowledge.json"));
        assert_eq!(config.max_features, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medqa.json");
        std::fs::write(&path, r#"{"max_features": 64, "default_top_k": 5}"#).unwrap();

        let config = MedQaConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_features, 64);
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.classifier_file, "disease_classifier.bin");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MedQaConfig::default();
        config.test_size = 1.0;
        assert!(matches!(config.validate(), Err(MedQaError::Config(_))));

        let mut config = MedQaConfig::default();
        config.max_features = 0;
        assert!(config.validate().is_err());

        for alpha in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            let mut config = MedQaConfig::default();
            config.smoothing_alpha = alpha;
            assert!(matches!(config.validate(), Err(MedQaError::Config(_))), "alpha {alpha}");
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_vars_reads_every_override() {
        let config = MedQaConfig::from_vars(vars(&[
            ("MEDQA_MODELS_DIR", "/srv/models"),
            ("MEDQA_CLASSIFIER_FILE", "nb.bin"),
            ("MEDQA_MAX_FEATURES", "128"),
            ("MEDQA_TEST_SIZE", "0.25"),
            ("MEDQA_SMOOTHING_ALPHA", "0.5"),
            ("MEDQA_RANDOM_SEED", "7"),
            ("MEDQA_DEFAULT_TOP_K", "5"),
            ("MEDQA_CACHE_SIZE", "10"),
            ("MEDQA_CACHE_TTL", "60"),
        ]))
        .unwrap();

        assert_eq!(config.classifier_path(), PathBuf::from("/srv/models/nb.bin"));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.max_features, 128);
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.smoothing_alpha, 0.5);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.cache_ttl, 60);
    }

    #[test]
    fn test_from_vars_rejects_invalid_values() {
        let result = MedQaConfig::from_vars(vars(&[("MEDQA_MAX_FEATURES", "0")]));
        assert!(matches!(result, Err(MedQaError::Config(_))));

        let result = MedQaConfig::from_vars(vars(&[("MEDQA_SMOOTHING_ALPHA", "nan")]));
        assert!(matches!(result, Err(MedQaError::Config(_))));

        let result = MedQaConfig::from_vars(vars(&[("MEDQA_CACHE_TTL", "soon")]));
        assert!(matches!(result, Err(MedQaError::Config(_))));
    }
}
