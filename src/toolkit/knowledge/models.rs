use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString,
    IntoStaticStr, Display,
)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Mild,
    Moderate,
    Critical,
    #[default]
    Unknown,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::from_str(value.trim()).unwrap_or_default()
    }
}


pub const DEFAULT_TREATMENT: &str =
    "Please consult a healthcare professional for proper diagnosis and treatment";
pub const DEFAULT_SPECIALIST: &str = "General Physician";
pub const DEFAULT_EMERGENCY_ACTION: &str = "Schedule a consultation with a doctor";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub name: String,
    #[serde(default)]
    pub severity: Severity,
    pub treatment: String,
    pub specialists: Vec<String>,
    pub emergency_action: String,
}

impl DiseaseInfo {
    /// Generic record served for labels the overlay does not know.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            severity: Severity::Moderate,
            treatment: DEFAULT_TREATMENT.to_string(),
            specialists: vec![DEFAULT_SPECIALIST.to_string()],
            emergency_action: DEFAULT_EMERGENCY_ACTION.to_string(),
        }
    }
}

/// One entry of `diseases.json`. Symptoms only feed the training-data builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    #[serde(flatten)]
    pub info: DiseaseInfo,
    #[serde(default)]
    pub symptoms: Vec<String>,
}


/// `diseases.json` entries in file order. A repeated key replaces the earlier
/// record but keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiseaseCatalog {
    entries: Vec<(String, DiseaseRecord)>,
}

impl DiseaseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, record: DiseaseRecord) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = record,
            None => self.entries.push((key, record)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiseaseRecord)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for DiseaseCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = DiseaseCatalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping disease keys to disease records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut catalog = DiseaseCatalog::new();
                while let Some((key, record)) = map.next_entry::<String, DiseaseRecord>()? {
                    catalog.insert(key, record);
                }
                Ok(catalog)
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}


pub const FALLBACK_TOPIC: &str = "General Medical Advice";
pub const FALLBACK_CONTENT: &str =
    "Please consult with a healthcare professional for personalized medical advice.";
pub const FALLBACK_CATEGORY: &str = "general";

fn default_category() -> String {
    FALLBACK_CATEGORY.to_string()
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub topic: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
}

impl KnowledgeDocument {
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            category: category.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_TOPIC, FALLBACK_CONTENT, FALLBACK_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parsing() {
        let parsed: Vec<Severity> = serde_json::from_str(r#"["mild", "Critical", "MODERATE", "severe"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Severity::Mild, Severity::Critical, Severity::Moderate, Severity::Unknown]
        );
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(Severity::Moderate.to_string(), "moderate");
    }

    #[test]
    fn test_disease_record_flattens_info() {
        let record: DiseaseRecord = serde_json::from_str(
            r#"{
                "name": "Lung Cancer",
                "symptoms": ["persistent cough", "chest pain"],
                "severity": "critical",
                "treatment": "Surgery, chemotherapy",
                "specialists": ["Oncologist", "Pulmonologist"],
                "emergency_action": "See an oncologist urgently"
            }"#,
        )
        .unwrap();
        assert_eq!(record.info.name, "Lung Cancer");
        assert_eq!(record.info.severity, Severity::Critical);
        assert_eq!(record.symptoms.len(), 2);
    }

    #[test]
    fn test_disease_record_missing_field_fails() {
        let result: Result<DiseaseRecord, _> =
            serde_json::from_str(r#"{"name": "Flu", "severity": "mild"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_catalog_keeps_file_order() {
        let catalog: DiseaseCatalog = serde_json::from_str(
            r#"{
                "zeta": {"name": "Zeta", "treatment": "t", "specialists": [], "emergency_action": "e"},
                "alpha": {"name": "Alpha", "treatment": "t", "specialists": [], "emergency_action": "e"},
                "zeta": {"name": "Zeta Prime", "treatment": "t", "specialists": [], "emergency_action": "e"}
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = catalog.iter().map(|(_, r)| r.info.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta Prime", "Alpha"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_document_category_defaults_to_general() {
        let doc: KnowledgeDocument =
            serde_json::from_str(r#"{"topic": "Flu", "content": "fever cough"}"#).unwrap();
        assert_eq!(doc.category, "general");
    }

    #[test]
    fn test_fallbacks() {
        let info = DiseaseInfo::fallback("Mystery");
        assert_eq!(info.name, "Mystery");
        assert_eq!(info.severity, Severity::Moderate);
        assert_eq!(info.specialists, vec!["General Physician".to_string()]);

        let doc = KnowledgeDocument::fallback();
        assert_eq!(doc.topic, "General Medical Advice");
        assert_eq!(doc.category, "general");
    }
}
