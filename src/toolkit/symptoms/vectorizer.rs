use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::text::analyze;
use crate::core::error::{MedQaError, Result};


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of vocabulary features present in the source text.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    index: BTreeMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }

    /// Terms in feature-index order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Raw counts times IDF, L2 normalised. Unknown terms are ignored.
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in analyze(text) {
            if let Some(&idx) = self.index.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx, tf * self.idf[idx]))
            .collect();
        entries.sort_by_key(|&(idx, _)| idx);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in entries.iter_mut() {
                *w /= norm;
            }
        }

        FeatureVector { entries }
    }
}


#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features: max_features.max(1),
        }
    }

    /// Keeps the `max_features` most frequent terms (ties by term), then
    /// numbers them in lexical order.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Result<Vocabulary> {
        if corpus.is_empty() {
            return Err(MedQaError::EmptyCorpus);
        }

        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for document in corpus {
            let terms = analyze(document.as_ref());
            let mut seen = HashSet::new();
            for term in terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            debug!("Corpus of {} documents produced no terms", corpus.len());
            return Err(MedQaError::EmptyCorpus);
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut kept: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort();

        let n_documents = corpus.len();
        let mut index = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (i, term) in kept.into_iter().enumerate() {
            let df = document_frequency.get(&term).copied().unwrap_or(0);
            idf.push(((1.0 + n_documents as f64) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(term, i);
        }

        info!(
            "Vocabulary fitted: {} terms from {} documents",
            idf.len(),
            n_documents
        );

        Ok(Vocabulary {
            index,
            idf,
            n_documents,
        })
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(crate::DEFAULT_MAX_FEATURES)
    }
}
