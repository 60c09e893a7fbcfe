use thiserror::Error;

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge retrieval error: {0}")]
    Retrieval(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PracticeError>;
