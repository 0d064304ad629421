//! Error types for the reader
//!
//! The extraction pipeline itself has no failure path. Errors only come
//! from the edges: building a document, compiling rule tables, loading
//! configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReaderError>;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("DOM error: {0}")]
    Dom(#[from] dom::DomError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Document has no root node")]
    EmptyDocument,
}
