use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickfillError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("Invalid import file: {0}")]
    InvalidImport(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Shortcut '{0}' is already used by another snippet")]
    DuplicateShortcut(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI provider error: {0}")]
    Ai(String),
    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuickfillError>;
