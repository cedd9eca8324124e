//! # Quarry Protocol
//!
//! Shared data model for the quarry search engine: host input contracts,
//! index result types, the response envelope, and character-budget helpers.
//!
//! Everything here is plain data. Index crates own the behavior.

mod budget;
mod provider;
mod types;

pub use budget::{hard_truncate, BudgetOutcome, TRUNCATION_MARKER};
pub use provider::{
    CompletionOptions, FileSource, LlmProvider, ProviderError, ProviderResult,
};
pub use types::{
    CallGraphInput, CallSite, CodeBlock, DocumentType, Enrichments, IndexOrigin, ParsedSymbol,
    ResponseStats, ScoredResult, SearchResponse, SourceFile, SymbolHit, SymbolKind,
};

pub const SNAPSHOT_VERSION: u32 = 1;
