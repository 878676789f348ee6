use thiserror::Error;

/// Everything that can stop a run before or while it starts.
///
/// Evolution itself cannot fail once the datasets and parameters are validated,
/// so every variant is raised either while loading or while saving.
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
