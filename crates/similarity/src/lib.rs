//! # Quarry Similarity
//!
//! Fixed-dimension embeddings with cosine-similarity retrieval, plus a
//! trigram positional index for fuzzy substring matching.
//!
//! Two embedding strategies, selected automatically: vocabulary-weighted
//! (tf-idf into stable per-term slots) once a learned vocabulary exists, and
//! a hashed fallback (djb2 over words, word pairs and 3-char sub-tokens)
//! before one does. Both produce L2-normalized vectors, so similarity is a
//! plain dot product.

mod embed;
mod index;
mod trigram;

pub use embed::{cosine_similarity, Embedder};
pub use index::{Chunk, SimilarityHit, SimilarityIndex};
pub use trigram::{TrigramHit, TrigramIndex};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimilarityError>;

#[derive(Error, Debug)]
pub enum SimilarityError {
    #[error("Unknown file: {0}")]
    UnknownFile(String),
}

/// Default embedding dimension. Large enough that slot collisions stay rare
/// for typical corpus vocabularies, small enough to keep brute-force cosine
/// search cheap.
pub const DEFAULT_DIMENSION: usize = 256;

/// Results below this cosine similarity are dropped before top-K selection.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.1;
