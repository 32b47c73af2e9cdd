use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriftError {
    /// Terraform state document is structurally invalid. Fatal to the scan.
    #[error("invalid terraform state: {0}")]
    State(String),

    /// Live snapshot violates the region -> collection -> list shape. Fatal.
    #[error("invalid live snapshot: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
