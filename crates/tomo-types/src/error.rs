use thiserror::Error;

#[derive(Error, Debug)]
pub enum TomoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid geometry parameter: {0}")]
    Geometry(String),

    #[error("Model consistency violated: {0}")]
    Consistency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TomoResult<T> = Result<T, TomoError>;
