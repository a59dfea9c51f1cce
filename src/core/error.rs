use thiserror::Error;


#[derive(Error, Debug)]
pub enum MedQaError {
    #[error("Training corpus is empty")]
    EmptyCorpus,

    #[error("Classifier model not loaded: train or load artifacts first")]
    ModelNotLoaded,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MedQaError {
    /// HTTP-equivalent status the serving layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::EmptyCorpus => 422,
            Self::ModelNotLoaded | Self::ArtifactCorrupt(_) => 503,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<config::ConfigError> for MedQaError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}


pub type Result<T> = std::result::Result<T, MedQaError>;
