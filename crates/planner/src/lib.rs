//! # Quarry Planner
//!
//! Turns a natural-language query into an executable search plan: detect the
//! intent, expand the target into lexical variants, fan out across every
//! index, merge into one ranked result list and attach intent-driven
//! call-graph enrichments.
//!
//! The base search always runs across all indexes and all variants no matter
//! what intent was detected. Intent only selects which extras to attempt, so
//! a misclassified query degrades to broad results instead of nothing.

mod execute;
mod intent;
mod variants;

pub use execute::{PlannedSearch, QueryPlanner};
pub use intent::{detect_intent, Intent, QueryPlan};
pub use variants::lexical_variants;

/// Per-query knobs.
#[derive(Debug, Clone)]
pub struct PlannerOptions {
    pub max_results: usize,
    /// Fuzzy symbol matches below this score are ignored.
    pub min_fuzzy_score: u8,
    /// Neighborhood depth for structure enrichment.
    pub enrich_depth: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            min_fuzzy_score: 60,
            enrich_depth: 2,
        }
    }
}
