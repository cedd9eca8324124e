//! # Quarry Assembler
//!
//! Turns a merged, scored result list into one context string that never
//! exceeds the caller's character budget.
//!
//! Three stages: re-score every candidate against the query (heuristic, or
//! LLM file rating when a provider is configured), partition into a verbatim
//! primary tier and a compressible secondary tier, then fit both into the
//! budget. Every LLM step has a deterministic fallback, so assembly always
//! completes without a provider.

mod assemble;
mod score;
mod summarize;
mod tiers;

pub use assemble::{AssembledContext, ContextAssembler};
pub use score::heuristic_relevance;
pub use summarize::priority_truncate;
pub use tiers::{RankedItem, Tiers};

use std::time::Duration;

/// Assembly knobs. `llm_score_scale` maps the provider's 1-10 file rating
/// onto the 0-300 heuristic scale; it is a tuning constant, not a law.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Fraction of the budget reserved for the primary tier.
    pub primary_share: f32,
    /// Relevance at or above this goes primary.
    pub primary_threshold: f32,
    /// Relevance at or above this (but below primary) goes secondary.
    pub secondary_threshold: f32,
    pub max_primary_items: usize,
    pub llm_score_scale: f32,
    pub enable_llm_scoring: bool,
    /// Cap on any single provider call.
    pub llm_timeout: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            primary_share: 0.65,
            primary_threshold: 180.0,
            secondary_threshold: 60.0,
            max_primary_items: 12,
            llm_score_scale: 30.0,
            enable_llm_scoring: true,
            llm_timeout: Duration::from_secs(10),
        }
    }
}
