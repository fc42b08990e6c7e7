use rusqlite;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid dashboard document: {0}")]
    InvalidDocument(String),
    #[error("malformed dashboard: {0}")]
    MalformedDashboard(String),
    #[error("not found: {0}")]
    NotFound(String),
}
