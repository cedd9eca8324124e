use crate::AssemblerConfig;
use quarry_protocol::ScoredResult;

/// A candidate plus its assembly-stage relevance, which replaces the raw
/// per-index score for partitioning decisions.
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub result: ScoredResult,
    pub relevance: f32,
}

/// Partitioned candidates. Primary is kept verbatim, secondary competes for
/// the remaining budget, the rest is dropped.
#[derive(Debug, Default)]
pub struct Tiers {
    pub primary: Vec<RankedItem>,
    pub secondary: Vec<RankedItem>,
    pub dropped: usize,
}

/// Split ranked items into tiers. Input order does not matter; output tiers
/// are each sorted best-first, primary additionally capped by count so a
/// generous threshold cannot flood the verbatim tier.
#[must_use]
pub fn partition(mut items: Vec<RankedItem>, config: &AssemblerConfig) -> Tiers {
    items.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.result.file.cmp(&b.result.file))
            .then_with(|| a.result.line.cmp(&b.result.line))
    });

    let mut tiers = Tiers::default();
    for item in items {
        if item.relevance >= config.primary_threshold
            && tiers.primary.len() < config.max_primary_items
        {
            tiers.primary.push(item);
        } else if item.relevance >= config.secondary_threshold {
            tiers.secondary.push(item);
        } else {
            tiers.dropped += 1;
        }
    }
    tiers
}
