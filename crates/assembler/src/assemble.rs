use crate::score::heuristic_relevance;
use crate::summarize::{fit_secondary, render_tier};
use crate::tiers::{partition, RankedItem, Tiers};
use crate::AssemblerConfig;
use quarry_protocol::{hard_truncate, LlmProvider, ScoredResult};
use quarry_vocabulary::tokenize_query;
use std::collections::HashMap;
use std::sync::Arc;

/// Assembly output plus the accounting the response envelope needs.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub context: String,
    pub primary_items: usize,
    pub secondary_items: usize,
    pub dropped_items: usize,
    pub truncated: bool,
}

/// Stage 1-3 context assembly over merged query results.
pub struct ContextAssembler {
    provider: Option<Arc<dyn LlmProvider>>,
    config: AssemblerConfig,
}

impl ContextAssembler {
    #[must_use]
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: AssemblerConfig) -> Self {
        Self { provider, config }
    }

    /// Build one context string of at most `budget_chars` characters.
    pub async fn assemble(
        &self,
        results: &[ScoredResult],
        query: &str,
        budget_chars: usize,
    ) -> AssembledContext {
        if results.is_empty() || budget_chars == 0 {
            return AssembledContext {
                context: String::new(),
                primary_items: 0,
                secondary_items: 0,
                dropped_items: results.len(),
                truncated: false,
            };
        }

        let terms = tokenize_query(query);
        let ranked = self.rank(results, query, &terms).await;
        let tiers = partition(ranked, &self.config);
        self.fit(&tiers, query, budget_chars).await
    }

    /// Stage 1: relevance per candidate. LLM file rating when configured,
    /// heuristic otherwise; any file the model failed to rate falls back to
    /// the heuristic per item.
    async fn rank(
        &self,
        results: &[ScoredResult],
        query: &str,
        terms: &[String],
    ) -> Vec<RankedItem> {
        let ratings = match &self.provider {
            Some(provider) if self.config.enable_llm_scoring => {
                self.rate_files(results, query, provider).await
            }
            _ => HashMap::new(),
        };

        results
            .iter()
            .map(|result| {
                let relevance = match ratings.get(&result.file) {
                    Some(rating) => rating * self.config.llm_score_scale,
                    None => heuristic_relevance(terms, result),
                };
                RankedItem {
                    result: result.clone(),
                    relevance,
                }
            })
            .collect()
    }

    /// One classify call rating every distinct file 1-10. Failures and
    /// unparseable lines return an incomplete (possibly empty) map.
    async fn rate_files(
        &self,
        results: &[ScoredResult],
        query: &str,
        provider: &Arc<dyn LlmProvider>,
    ) -> HashMap<String, f32> {
        let mut files: Vec<&str> = Vec::new();
        for result in results {
            if !files.contains(&result.file.as_str()) {
                files.push(&result.file);
            }
        }

        let listing: String = files
            .iter()
            .map(|f| format!("- {f}\n"))
            .collect();
        let prompt = format!(
            "Rate each file 1-10 for relevance to the query {query:?}. \
             Reply with one line per file, formatted exactly as `path: rating`.\n{listing}"
        );

        let reply = match tokio::time::timeout(self.config.llm_timeout, provider.classify(&prompt))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                log::warn!("File rating failed, using heuristic relevance: {err}");
                return HashMap::new();
            }
            Err(_) => {
                log::warn!("File rating timed out, using heuristic relevance");
                return HashMap::new();
            }
        };

        let mut ratings = HashMap::new();
        for line in reply.lines() {
            let Some((path, rating)) = line.rsplit_once(':') else {
                continue;
            };
            let path = path.trim().trim_start_matches("- ");
            if let Ok(value) = rating.trim().parse::<f32>() {
                if files.contains(&path) && (1.0..=10.0).contains(&value) {
                    ratings.insert(path.to_string(), value);
                }
            }
        }
        ratings
    }

    /// Stages 2 and 3: give the primary tier its fixed share, hand the rest
    /// to the secondary tier, concatenate, and enforce the budget one final
    /// time. The output length bound holds no matter what the tiers did.
    async fn fit(&self, tiers: &Tiers, query: &str, budget_chars: usize) -> AssembledContext {
        let header = format!("Query: {query}\n\n");
        let header_len = header.chars().count();
        let available = budget_chars.saturating_sub(header_len);

        let primary_budget = if tiers.secondary.is_empty() {
            available
        } else {
            (available as f32 * self.config.primary_share) as usize
        };
        let primary_out = hard_truncate(&render_tier(&tiers.primary), primary_budget);

        let mut context = header;
        context.push_str(&primary_out.text);

        let mut secondary_squeezed = false;
        if !tiers.secondary.is_empty() {
            let used = context.chars().count();
            let secondary_budget = budget_chars.saturating_sub(used + 2);
            let verbatim_len: usize = render_tier(&tiers.secondary).chars().count();
            let secondary = fit_secondary(
                &tiers.secondary,
                secondary_budget,
                self.provider.as_ref(),
                &self.config,
            )
            .await;
            secondary_squeezed = verbatim_len > secondary_budget;
            if !secondary.is_empty() {
                context.push_str("\n\n");
                context.push_str(&secondary);
            }
        }

        let final_out = hard_truncate(&context, budget_chars);
        AssembledContext {
            context: final_out.text,
            primary_items: tiers.primary.len(),
            secondary_items: tiers.secondary.len(),
            dropped_items: tiers.dropped,
            truncated: primary_out.truncated || secondary_squeezed || final_out.truncated,
        }
    }
}
