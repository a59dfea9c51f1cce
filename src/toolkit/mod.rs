

pub mod knowledge;
pub mod symptoms;
pub mod tooling_manager;


pub use tooling_manager::{Diagnosis, InitializeSummary, ManagerCacheStats, ToolingManager};
