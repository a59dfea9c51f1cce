

pub mod core;
pub mod toolkit;
pub mod utils;

pub use utils::{round_to_tenth, safe_truncate, safe_truncate_ellipsis};


pub use crate::core::config::MedQaConfig;
pub use crate::core::error::{MedQaError, Result};
pub use toolkit::knowledge::{DiseaseInfo, KnowledgeDocument, Severity};
pub use toolkit::symptoms::{ClassificationResult, ModelAccuracy, SymptomChecker, TrainingExample};
pub use toolkit::{Diagnosis, ToolingManager};


pub const DEFAULT_MAX_FEATURES: usize = 500;


pub const DEFAULT_TOP_K: usize = 3;


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
