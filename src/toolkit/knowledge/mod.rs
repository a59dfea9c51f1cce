

pub mod loader;
pub mod models;
pub mod overlay;
pub mod retriever;

pub use loader::{load_disease_records, load_knowledge_documents};
pub use models::{DiseaseCatalog, DiseaseInfo, DiseaseRecord, KnowledgeDocument, Severity};
pub use overlay::DiseaseOverlay;
pub use retriever::{KnowledgeRetriever, ScoredDocument};
