use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::models::{DiseaseCatalog, KnowledgeDocument};
use crate::core::error::{MedQaError, Result};


fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        warn!("{} not found", path.display());
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| MedQaError::ArtifactCorrupt(format!("{}: {e}", path.display())))
}

/// `diseases.json` is an object keyed by disease id, kept in file order.
pub fn load_disease_records(path: &Path) -> Result<Option<DiseaseCatalog>> {
    let Some(records) = read_json::<DiseaseCatalog>(path)? else {
        return Ok(None);
    };

    for (key, record) in records.iter() {
        if record.info.name.trim().is_empty() {
            return Err(MedQaError::ArtifactCorrupt(format!(
                "{}: disease '{}' has an empty name",
                path.display(),
                key
            )));
        }
    }

    info!("Loaded {} disease records from {}", records.len(), path.display());
    Ok(Some(records))
}


pub fn load_knowledge_documents(path: &Path) -> Result<Option<Vec<KnowledgeDocument>>> {
    let Some(documents) = read_json::<Vec<KnowledgeDocument>>(path)? else {
        return Ok(None);
    };

    if let Some(pos) = documents.iter().position(|d| d.topic.trim().is_empty()) {
        return Err(MedQaError::ArtifactCorrupt(format!(
            "{}: document {} has an empty topic",
            path.display(),
            pos
        )));
    }

    info!("Loaded {} knowledge documents from {}", documents.len(), path.display());
    Ok(Some(documents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_are_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_disease_records(&dir.path().join("diseases.json")).unwrap().is_none());
        assert!(load_knowledge_documents(&dir.path().join("kb.json")).unwrap().is_none());
    }

    #[test]
    fn test_load_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(
            &path,
            r#"[{"topic": "Flu", "content": "fever cough fatigue", "category": "general"}]"#,
        )
        .unwrap();

        let docs = load_knowledge_documents(&path).unwrap().unwrap();
        assert_eq!(docs, vec![KnowledgeDocument::new("Flu", "fever cough fatigue", "general")]);
    }

    #[test]
    fn test_malformed_entries_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();

        let kb = dir.path().join("kb.json");
        fs::write(&kb, r#"[{"topic": "Flu"}]"#).unwrap();
        assert!(matches!(load_knowledge_documents(&kb), Err(MedQaError::ArtifactCorrupt(_))));

        fs::write(&kb, r#"[{"topic": " ", "content": "x"}]"#).unwrap();
        assert!(matches!(load_knowledge_documents(&kb), Err(MedQaError::ArtifactCorrupt(_))));

        let diseases = dir.path().join("diseases.json");
        fs::write(&diseases, r#"{"flu": {"name": "Flu"}}"#).unwrap();
        assert!(matches!(load_disease_records(&diseases), Err(MedQaError::ArtifactCorrupt(_))));

        fs::write(&diseases, "not json").unwrap();
        assert!(matches!(load_disease_records(&diseases), Err(MedQaError::ArtifactCorrupt(_))));
    }
}
