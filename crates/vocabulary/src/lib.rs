//! # Quarry Vocabulary
//!
//! Learns a corpus-specific vocabulary with no hardcoded domain knowledge:
//!
//! - per-term document frequency and source-weighted importance
//! - corpus-local stop words (terms present in too many documents)
//! - synonym clusters from document co-occurrence (Jaccard)
//! - domain concepts from shared naming-convention prefixes/suffixes
//!
//! The learned [`Vocabulary`] feeds keyword scoring and the vocabulary-weighted
//! embedding path. Downstream crates treat it as read-only.

mod config;
mod learner;
mod tokenizer;
mod vocabulary;

pub use config::{SourceWeights, VocabularyConfig};
pub use learner::VocabularyLearner;
pub use tokenizer::{split_identifier, tokenize_query, TokenSource};
pub use vocabulary::{DomainConcept, TermStats, Vocabulary, VocabularyStats};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VocabularyError>;

#[derive(Error, Debug)]
pub enum VocabularyError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
