use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OligoError {
    #[error("not found: {0}")]
    NotFound(PathBuf),

    #[error("bad format: {0}")]
    BadFormat(String),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("motifs out of order: '{previous}' then '{next}'")]
    OutOfOrder { previous: String, next: String },
}

pub type Result<T> = std::result::Result<T, OligoError>;
