use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::vectorizer::FeatureVector;
use crate::core::error::{MedQaError, Result};


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: String,
    pub probability: f64,
}

/// Multinomial naive Bayes over TF-IDF features with additive smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    labels: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    n_features: usize,
    alpha: f64,
}

impl NaiveBayesModel {
    pub fn fit(samples: &[(FeatureVector, String)], n_features: usize, alpha: f64) -> Result<Self> {
        if samples.is_empty() {
            return Err(MedQaError::EmptyCorpus);
        }
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(MedQaError::InvalidArgument(format!(
                "smoothing alpha must be finite and positive, got {alpha}"
            )));
        }

        let mut per_label: BTreeMap<&str, (usize, Vec<f64>)> = BTreeMap::new();
        for (vector, label) in samples {
            let (count, features) = per_label
                .entry(label.as_str())
                .or_insert_with(|| (0, vec![0.0; n_features]));
            *count += 1;
            for (idx, weight) in vector.iter() {
                if idx >= n_features {
                    return Err(MedQaError::Internal(format!(
                        "feature index {idx} outside vocabulary of {n_features}"
                    )));
                }
                features[idx] += weight;
            }
        }

        let total = samples.len() as f64;
        let mut labels = Vec::with_capacity(per_label.len());
        let mut class_log_prior = Vec::with_capacity(per_label.len());
        let mut feature_log_prob = Vec::with_capacity(per_label.len());

        for (label, (count, features)) in per_label {
            let smoothed_total: f64 = features.iter().sum::<f64>() + alpha * n_features as f64;
            let log_total = smoothed_total.ln();

            labels.push(label.to_string());
            class_log_prior.push((count as f64 / total).ln());
            feature_log_prob.push(
                features
                    .iter()
                    .map(|&f| (f + alpha).ln() - log_total)
                    .collect(),
            );
        }

        debug!(
            "Naive Bayes fitted: {} labels, {} features, {} samples",
            labels.len(),
            n_features,
            samples.len()
        );

        Ok(Self {
            labels,
            class_log_prior,
            feature_log_prob,
            n_features,
            alpha,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn joint_log_likelihood(&self, vector: &FeatureVector) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, log_probs)| {
                prior
                    + vector
                        .iter()
                        .filter_map(|(idx, w)| log_probs.get(idx).map(|lp| lp * w))
                        .sum::<f64>()
            })
            .collect()
    }

    /// Posterior over every known label, probability descending, ties by label.
    pub fn posterior(&self, vector: &FeatureVector) -> Vec<LabelProbability> {
        let jll = self.joint_log_likelihood(vector);
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + jll.iter().map(|v| (v - max).exp()).sum::<f64>().ln();

        let mut distribution: Vec<LabelProbability> = self
            .labels
            .iter()
            .zip(jll)
            .map(|(label, v)| LabelProbability {
                label: label.clone(),
                probability: (v - log_norm).exp(),
            })
            .collect();

        distribution.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.label.cmp(&b.label))
        });
        distribution
    }

    pub fn predict(&self, vector: &FeatureVector) -> Option<String> {
        self.posterior(vector).into_iter().next().map(|p| p.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::symptoms::vectorizer::TfidfVectorizer;

    fn samples() -> (crate::toolkit::symptoms::vectorizer::Vocabulary, Vec<(FeatureVector, String)>) {
        let data = [
            ("cough chest pain", "Lung"),
            ("persistent cough", "Lung"),
            ("headache vision", "Brain"),
            ("severe headache", "Brain"),
        ];
        let texts: Vec<&str> = data.iter().map(|(t, _)| *t).collect();
        let vocab = TfidfVectorizer::default().fit(&texts).unwrap();
        let samples = data
            .iter()
            .map(|(t, l)| (vocab.transform(t), l.to_string()))
            .collect();
        (vocab, samples)
    }

    #[test]
    fn test_fit_rejects_empty_and_bad_alpha() {
        assert!(matches!(NaiveBayesModel::fit(&[], 3, 1.0), Err(MedQaError::EmptyCorpus)));
        let (vocab, samples) = samples();
        assert!(matches!(
            NaiveBayesModel::fit(&samples, vocab.len(), 0.0),
            Err(MedQaError::InvalidArgument(_))
        ));
        for alpha in [f64::NAN, f64::INFINITY, -0.5] {
            assert!(matches!(
                NaiveBayesModel::fit(&samples, vocab.len(), alpha),
                Err(MedQaError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_posterior_sums_to_one_and_ranks() {
        let (vocab, samples) = samples();
        let model = NaiveBayesModel::fit(&samples, vocab.len(), 1.0).unwrap();
        assert_eq!(model.labels(), &["Brain".to_string(), "Lung".to_string()]);

        let posterior = model.posterior(&vocab.transform("cough"));
        let total: f64 = posterior.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(posterior[0].label, "Lung");
        assert_eq!(model.predict(&vocab.transform("headache")).as_deref(), Some("Brain"));
    }

    #[test]
    fn test_zero_vector_ties_break_by_label() {
        let (vocab, samples) = samples();
        let model = NaiveBayesModel::fit(&samples, vocab.len(), 1.0).unwrap();
        let posterior = model.posterior(&FeatureVector::default());
        assert_eq!(posterior[0].label, "Brain");
        assert_eq!(posterior[1].label, "Lung");
        assert!((posterior[0].probability - 0.5).abs() < 1e-12);
    }
}
