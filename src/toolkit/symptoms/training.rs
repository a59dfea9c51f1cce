use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::toolkit::knowledge::models::DiseaseCatalog;


pub const COMBINATION_SIZE: usize = 3;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub symptoms_text: String,
    pub disease_label: String,
}

impl TrainingExample {
    pub fn new(symptoms_text: impl Into<String>, disease_label: impl Into<String>) -> Self {
        Self {
            symptoms_text: symptoms_text.into(),
            disease_label: disease_label.into(),
        }
    }
}

/// Oversamples each disease: the full symptom list, its first and last three
/// symptoms when there are at least three, then each of the first three alone.
pub fn examples_from_records(records: &DiseaseCatalog) -> Vec<TrainingExample> {
    let mut examples = Vec::new();

    for (key, record) in records.iter() {
        let name = &record.info.name;
        let symptoms: Vec<&str> = record
            .symptoms
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if symptoms.is_empty() {
            warn!("Disease '{}' has no symptoms, skipping for training", key);
            continue;
        }

        examples.push(TrainingExample::new(symptoms.join(", "), name.as_str()));

        if symptoms.len() >= COMBINATION_SIZE {
            examples.push(TrainingExample::new(
                symptoms[..COMBINATION_SIZE].join(", "),
                name.as_str(),
            ));
            examples.push(TrainingExample::new(
                symptoms[symptoms.len() - COMBINATION_SIZE..].join(", "),
                name.as_str(),
            ));
        }

        for symptom in symptoms.iter().take(COMBINATION_SIZE) {
            examples.push(TrainingExample::new(*symptom, name.as_str()));
        }
    }

    info!(
        "Built {} training examples from {} diseases",
        examples.len(),
        records.len()
    );
    examples
}
