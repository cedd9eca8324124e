//! # Quarry Keyword Index
//!
//! Term -> posting-list inverted index with TF-IDF scoring, boosted by the
//! learned vocabulary. Documents are whole files, symbol entries, or
//! generated summaries; the document type scales posting weight so denser
//! sources outrank raw code.

mod index;
mod snapshot;
mod stemmer;

pub use index::{
    DocumentMeta, KeywordHit, KeywordIndex, KeywordSearchOptions, Posting,
};
pub use snapshot::KeywordIndexSnapshot;
pub use stemmer::stem;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
