use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to fetch draft script: {0}")]
    Fetch(String),

    #[error("Failed to materialize template: {0}")]
    Materialize(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Metadata update failed: {0}")]
    Metadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
