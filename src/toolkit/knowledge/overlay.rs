use std::collections::HashMap;

use tracing::debug;

use super::models::{DiseaseCatalog, DiseaseInfo};

/// Case-insensitive disease name → record. Labels the classifier knows may be
/// missing here; those resolve to [`DiseaseInfo::fallback`].
#[derive(Debug, Clone, Default)]
pub struct DiseaseOverlay {
    by_name: HashMap<String, DiseaseInfo>,
}

impl DiseaseOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// On duplicate names the first record in file order wins.
    pub fn from_records(records: &DiseaseCatalog) -> Self {
        let mut by_name = HashMap::with_capacity(records.len());
        for (key, record) in records.iter() {
            let name = record.info.name.trim().to_lowercase();
            if by_name.contains_key(&name) {
                debug!("Duplicate disease name '{}' under key '{}' ignored", record.info.name, key);
                continue;
            }
            by_name.insert(name, record.info.clone());
        }
        Self { by_name }
    }

    pub fn from_infos(infos: impl IntoIterator<Item = DiseaseInfo>) -> Self {
        let mut by_name = HashMap::new();
        for info in infos {
            by_name.entry(info.name.trim().to_lowercase()).or_insert(info);
        }
        Self { by_name }
    }

    pub fn get(&self, disease: &str) -> Option<&DiseaseInfo> {
        self.by_name.get(&disease.trim().to_lowercase())
    }

    pub fn lookup(&self, disease: &str) -> DiseaseInfo {
        match self.get(disease) {
            Some(info) => info.clone(),
            None => {
                debug!("No overlay entry for '{}', using fallback", disease);
                DiseaseInfo::fallback(disease)
            }
        }
    }

    pub fn contains(&self, disease: &str) -> bool {
        self.get(disease).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::knowledge::models::{DiseaseRecord, Severity};

    fn info(name: &str, severity: Severity) -> DiseaseInfo {
        DiseaseInfo {
            name: name.to_string(),
            severity,
            treatment: format!("{name} treatment"),
            specialists: vec!["Oncologist".to_string()],
            emergency_action: "Seek care".to_string(),
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let overlay = DiseaseOverlay::from_infos([info("Lung Cancer", Severity::Critical)]);
        let found = overlay.lookup("lung CANCER");
        assert_eq!(found.name, "Lung Cancer");
        assert_eq!(found.severity, Severity::Critical);
        assert!(overlay.contains("LUNG CANCER"));
    }

    #[test]
    fn test_unknown_disease_gets_fallback() {
        let overlay = DiseaseOverlay::new();
        let found = overlay.lookup("totally-unknown-disease");
        assert_eq!(found, DiseaseInfo::fallback("totally-unknown-disease"));
        assert_eq!(found.severity, Severity::Moderate);
    }

    #[test]
    fn test_first_record_in_file_order_wins() {
        let mut records = DiseaseCatalog::new();
        records.insert(
            "b_flu",
            DiseaseRecord { info: info("Flu", Severity::Moderate), symptoms: vec![] },
        );
        records.insert(
            "a_flu",
            DiseaseRecord { info: info("flu", Severity::Mild), symptoms: vec![] },
        );

        let overlay = DiseaseOverlay::from_records(&records);
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.lookup("FLU").severity, Severity::Moderate);
        assert_eq!(overlay.lookup("flu").name, "Flu");
    }
}
