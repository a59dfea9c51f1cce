

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, QueryCache};
pub use self::config::MedQaConfig;
pub use error::{MedQaError, Result};
