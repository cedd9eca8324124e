//! # Quarry Symbol Graph
//!
//! Symbol table plus bidirectional call graph, built from the host's per-file
//! parse results. Provides fuzzy name matching, caller/callee tracing,
//! bounded subgraph extraction and call-path discovery.
//!
//! Symbols are keyed both by bare name (first writer wins, for convenience
//! lookup) and by `name@file` (exact identity). The graph is mutated only
//! during build and incremental add/remove, never during query.

mod fuzzy;
mod graph;
mod snapshot;
mod types;

pub use fuzzy::{fuzzy_match_score, FuzzySymbolMatch};
pub use graph::{CallPath, Subgraph, SymbolTrace, TraversalDirection};
pub use snapshot::SymbolGraphSnapshot;
pub use types::{CallEdge, SymbolGraph, SymbolRecord};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
