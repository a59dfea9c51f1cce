use std::collections::HashSet;

use tracing::debug;

use super::models::KnowledgeDocument;
use crate::core::error::{MedQaError, Result};
use crate::toolkit::symptoms::text::whitespace_token_set;
use crate::utils::safe_truncate_ellipsis;


pub const TOPIC_WEIGHT: usize = 2;


#[derive(Debug, Clone)]
struct IndexedDocument {
    document: KnowledgeDocument,
    content_tokens: HashSet<String>,
    topic_tokens: HashSet<String>,
}

impl IndexedDocument {
    fn new(document: KnowledgeDocument) -> Self {
        Self {
            content_tokens: whitespace_token_set(&document.content),
            topic_tokens: whitespace_token_set(&document.topic),
            document,
        }
    }

    fn score(&self, query_tokens: &HashSet<String>) -> usize {
        let content = query_tokens.intersection(&self.content_tokens).count();
        let topic = query_tokens.intersection(&self.topic_tokens).count();
        content + TOPIC_WEIGHT * topic
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument<'a> {
    pub document: &'a KnowledgeDocument,
    pub score: usize,
}

/// Token-overlap retrieval over a fixed corpus, topic hits counting double.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeRetriever {
    documents: Vec<IndexedDocument>,
}

impl KnowledgeRetriever {
    pub fn new(documents: Vec<KnowledgeDocument>) -> Self {
        Self {
            documents: documents.into_iter().map(IndexedDocument::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every document with a positive score, best first, corpus order on ties.
    pub fn rank(&self, query: &str) -> Vec<ScoredDocument<'_>> {
        let query_tokens = whitespace_token_set(query);

        let mut scored: Vec<ScoredDocument<'_>> = self
            .documents
            .iter()
            .map(|indexed| ScoredDocument {
                document: &indexed.document,
                score: indexed.score(&query_tokens),
            })
            .filter(|s| s.score > 0)
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<KnowledgeDocument>> {
        if k == 0 {
            return Err(MedQaError::InvalidArgument("k must be at least 1".to_string()));
        }
        if query.trim().is_empty() {
            return Err(MedQaError::InvalidArgument("query must not be empty".to_string()));
        }

        let results: Vec<KnowledgeDocument> = self
            .rank(query)
            .into_iter()
            .take(k)
            .map(|s| s.document.clone())
            .collect();

        debug!(
            "Retrieved {} documents for '{}'",
            results.len(),
            safe_truncate_ellipsis(query, 60)
        );

        if results.is_empty() {
            return Ok(vec![KnowledgeDocument::fallback()]);
        }
        Ok(results)
    }

    pub fn documents_by_category(&self, category: &str) -> Vec<KnowledgeDocument> {
        self.documents
            .iter()
            .filter(|d| d.document.category == category)
            .map(|d| d.document.clone())
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for indexed in &self.documents {
            if !categories.contains(&indexed.document.category) {
                categories.push(indexed.document.category.clone());
            }
        }
        categories
    }
}
