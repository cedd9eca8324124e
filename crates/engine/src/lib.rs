//! # Quarry Engine
//!
//! The caller-owned handle over one corpus snapshot: learned vocabulary,
//! keyword, literal, similarity and trigram indexes plus the symbol graph,
//! built together and queried together.
//!
//! There is no global state. Construct a [`SearchEngine`] per corpus with
//! [`EngineBuilder`], query it concurrently (all indexes are read-only after
//! build), and swap in a fresh engine from [`SearchEngine::rebuild`] when the
//! corpus changes. Incremental `add_file` / `remove_file` mutate in place and
//! must be exclusive with in-flight queries.

mod builder;
mod engine;
mod options;
mod snapshot;

pub use builder::{EngineBuilder, ProgressCallback};
pub use engine::{EngineStats, SearchEngine};
pub use options::{BuildProgress, BuildStage, IndexBuildOptions, QueryOptions};
pub use snapshot::EngineSnapshot;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Index build exceeded its deadline")]
    DeadlineExceeded,

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error(transparent)]
    Vocabulary(#[from] quarry_vocabulary::VocabularyError),

    #[error(transparent)]
    Keyword(#[from] quarry_keyword_index::IndexError),

    #[error(transparent)]
    Literal(#[from] quarry_literal_index::LiteralError),

    #[error(transparent)]
    Similarity(#[from] quarry_similarity::SimilarityError),

    #[error(transparent)]
    Graph(#[from] quarry_symbol_graph::GraphError),

    #[error("File source error: {0}")]
    Source(#[from] quarry_protocol::ProviderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
