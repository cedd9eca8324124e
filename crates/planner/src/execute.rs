use crate::intent::{plan, Intent, QueryPlan};
use crate::PlannerOptions;
use quarry_keyword_index::{KeywordIndex, KeywordSearchOptions};
use quarry_literal_index::{CallSearchOptions, LiteralIndex, LiteralSearchOptions};
use quarry_protocol::{Enrichments, IndexOrigin, ScoredResult};
use quarry_similarity::{SimilarityIndex, TrigramIndex};
use quarry_symbol_graph::{SymbolGraph, TraversalDirection};
use std::collections::HashMap;

// Per-origin scaling onto one comparable scale. Keyword tf-idf sums land in
// low single digits, cosine and trigram scores in [0, 1], fuzzy in [0, 100].
const KEYWORD_SCALE: f32 = 12.0;
const LITERAL_SCORE: f32 = 70.0;
const SIMILARITY_SCALE: f32 = 90.0;
const TRIGRAM_SCALE: f32 = 60.0;

/// Read-only view over one corpus snapshot's indexes. Constructed per query
/// by the engine; holds no state of its own.
pub struct QueryPlanner<'a> {
    pub keyword: &'a KeywordIndex,
    pub literal: &'a LiteralIndex,
    pub similarity: &'a SimilarityIndex,
    pub trigram: &'a TrigramIndex,
    pub graph: &'a SymbolGraph,
}

/// Executed plan: the plan itself, merged ranked results and whatever
/// enrichments the intent produced.
#[derive(Debug)]
pub struct PlannedSearch {
    pub plan: QueryPlan,
    pub results: Vec<ScoredResult>,
    pub enrichments: Enrichments,
}

impl QueryPlanner<'_> {
    /// Plan and run one query end to end.
    #[must_use]
    pub fn execute(&self, query: &str, opts: &PlannerOptions) -> PlannedSearch {
        let plan = plan(query);
        let mut raw: Vec<ScoredResult> = Vec::new();

        // Base fan-out runs for every variant regardless of intent.
        for variant in &plan.variants {
            self.search_keyword(variant, opts, &mut raw);
            self.search_literal(variant, opts, &mut raw);
            self.search_similarity(variant, opts, &mut raw);
            self.search_trigram(variant, opts, &mut raw);
            self.search_symbols(variant, opts, &mut raw);
        }
        // The full query often carries context the variants strip.
        if !plan.variants.iter().any(|v| v == query) {
            self.search_keyword(query, opts, &mut raw);
            self.search_similarity(query, opts, &mut raw);
        }

        let candidates = raw.len();
        let results = merge(raw, opts.max_results);
        let enrichments = self.enrich(&plan, opts);
        log::debug!(
            "Executed {:?} query: {candidates} candidates, {} merged",
            plan.intent,
            results.len()
        );
        PlannedSearch {
            plan,
            results,
            enrichments,
        }
    }

    fn search_keyword(&self, text: &str, opts: &PlannerOptions, out: &mut Vec<ScoredResult>) {
        let kw_opts = KeywordSearchOptions {
            max_results: opts.max_results,
            ..KeywordSearchOptions::default()
        };
        for hit in self.keyword.search(text, &kw_opts) {
            out.push(ScoredResult {
                id: hit.doc_id,
                file: hit.meta.file,
                line: hit.meta.line,
                name: hit.meta.name,
                snippet: String::new(),
                score: hit.score * KEYWORD_SCALE,
                matched_terms: hit.matched_terms,
                origin: IndexOrigin::Keyword,
            });
        }
    }

    fn search_literal(&self, text: &str, opts: &PlannerOptions, out: &mut Vec<ScoredResult>) {
        let lit_opts = LiteralSearchOptions {
            case_sensitive: false,
            whole_word: true,
            max_results: opts.max_results,
            context_lines: 0,
        };
        for hit in self.literal.search_literal(text, &lit_opts) {
            out.push(ScoredResult {
                id: format!("{}:{}", hit.file, hit.line),
                file: hit.file,
                line: hit.line,
                name: None,
                snippet: hit.line_text,
                score: LITERAL_SCORE,
                matched_terms: vec![text.to_lowercase()],
                origin: IndexOrigin::Literal,
            });
        }
    }

    fn search_similarity(&self, text: &str, opts: &PlannerOptions, out: &mut Vec<ScoredResult>) {
        for hit in self.similarity.search(text, opts.max_results) {
            out.push(ScoredResult {
                id: hit.chunk.id.clone(),
                file: hit.chunk.file.clone(),
                line: hit.chunk.start_line,
                name: None,
                snippet: hit.chunk.text,
                score: hit.score * SIMILARITY_SCALE,
                matched_terms: Vec::new(),
                origin: IndexOrigin::Similarity,
            });
        }
    }

    fn search_trigram(&self, text: &str, opts: &PlannerOptions, out: &mut Vec<ScoredResult>) {
        for hit in self.trigram.search(text, opts.max_results) {
            out.push(ScoredResult {
                id: format!("{}:{}", hit.file, hit.line),
                file: hit.file,
                line: hit.line,
                name: None,
                snippet: hit.line_text,
                score: hit.score * TRIGRAM_SCALE,
                matched_terms: vec![text.to_lowercase()],
                origin: IndexOrigin::Trigram,
            });
        }
    }

    fn search_symbols(&self, text: &str, opts: &PlannerOptions, out: &mut Vec<ScoredResult>) {
        for hit in self
            .graph
            .find_symbol_fuzzy(text, opts.min_fuzzy_score, opts.max_results)
        {
            out.push(ScoredResult {
                id: format!("{}@{}", hit.record.name, hit.record.file),
                file: hit.record.file.clone(),
                line: hit.record.line,
                name: Some(hit.record.name.clone()),
                snippet: hit.record.signature,
                score: f32::from(hit.score),
                matched_terms: vec![text.to_lowercase()],
                origin: IndexOrigin::SymbolTable,
            });
        }
    }

    /// Intent-selected extras. Each one is attempted across all variants and
    /// silently omitted when the graph has nothing, which is not an error.
    fn enrich(&self, plan: &QueryPlan, opts: &PlannerOptions) -> Enrichments {
        let mut enrichments = Enrichments::default();
        match plan.intent {
            Intent::Callers => {
                enrichments.callers = self.first_nonempty(plan, |g, v| g.callers_of(v));
                enrichments.call_sites = self.call_sites_for(plan, opts);
            }
            Intent::Callees => {
                enrichments.callees = self.first_nonempty(plan, |g, v| g.callees_of(v));
            }
            Intent::Explain => {
                enrichments.callers = self.first_nonempty(plan, |g, v| g.callers_of(v));
                enrichments.callees = self.first_nonempty(plan, |g, v| g.callees_of(v));
            }
            Intent::Structure => {
                enrichments.callees = self.first_nonempty(plan, |g, v| {
                    let sub = g.build_subgraph(v, opts.enrich_depth, TraversalDirection::Callees);
                    sub.nodes.into_iter().filter(|n| n.as_str() != v).collect()
                });
            }
            Intent::Find | Intent::General => {}
        }
        enrichments
    }

    fn first_nonempty<F>(&self, plan: &QueryPlan, lookup: F) -> Option<Vec<String>>
    where
        F: Fn(&SymbolGraph, &str) -> Vec<String>,
    {
        plan.variants
            .iter()
            .map(|variant| lookup(self.graph, variant))
            .find(|names| !names.is_empty())
    }

    fn call_sites_for(
        &self,
        plan: &QueryPlan,
        opts: &PlannerOptions,
    ) -> Option<Vec<quarry_protocol::CallSite>> {
        let call_opts = CallSearchOptions {
            include_definitions: false,
            max_results: opts.max_results,
        };
        plan.variants
            .iter()
            .map(|variant| self.literal.search_function_calls(variant, &call_opts))
            .find(|sites| !sites.is_empty())
    }
}

/// Merge raw per-index hits: dedup by (file, line) keeping the best score,
/// pool matched terms, sort descending, truncate.
fn merge(raw: Vec<ScoredResult>, max_results: usize) -> Vec<ScoredResult> {
    let mut best: HashMap<(String, u32), ScoredResult> = HashMap::new();
    for hit in raw {
        let key = (hit.file.clone(), hit.line);
        match best.get_mut(&key) {
            Some(existing) => {
                for term in &hit.matched_terms {
                    if !existing.matched_terms.contains(term) {
                        existing.matched_terms.push(term.clone());
                    }
                }
                if hit.score > existing.score {
                    let terms = existing.matched_terms.clone();
                    *existing = hit;
                    existing.matched_terms = terms;
                }
            }
            None => {
                best.insert(key, hit);
            }
        }
    }

    let mut merged: Vec<ScoredResult> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });
    merged.truncate(max_results);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_keyword_index::DocumentMeta;
    use quarry_protocol::{DocumentType, ParsedSymbol, SourceFile, SymbolKind};
    use quarry_similarity::Embedder;
    use quarry_vocabulary::Vocabulary;
    use std::sync::Arc;

    fn corpus() -> Vec<SourceFile> {
        vec![
            SourceFile {
                path: "heap.c".to_string(),
                content: "int heap_insert(Heap *h, int v) {\n    rebalance(h);\n    return 0;\n}\n"
                    .to_string(),
                language: "c".to_string(),
            },
            SourceFile {
                path: "main.c".to_string(),
                content: "int main(void) {\n    heap_insert(h, 7);\n    return 0;\n}\n".to_string(),
                language: "c".to_string(),
            },
        ]
    }

    struct Fixture {
        keyword: KeywordIndex,
        literal: LiteralIndex,
        similarity: SimilarityIndex,
        trigram: TrigramIndex,
        graph: SymbolGraph,
    }

    impl Fixture {
        fn build(with_graph: bool) -> Self {
            let files = corpus();
            let vocabulary = Arc::new(Vocabulary::default());

            let mut keyword = KeywordIndex::new(Arc::clone(&vocabulary));
            for file in &files {
                keyword.add_document(
                    &file.path,
                    &file.content,
                    DocumentType::FileContent,
                    DocumentMeta {
                        file: file.path.clone(),
                        line: 0,
                        name: None,
                    },
                );
            }

            let mut literal = LiteralIndex::new();
            literal.build(&files);
            let mut similarity = SimilarityIndex::new(Embedder::select(None, 64), 10);
            similarity.build(&files);
            let mut trigram = TrigramIndex::new();
            trigram.build(&files);

            let mut graph = SymbolGraph::new();
            if with_graph {
                graph.add_symbol(
                    "heap.c",
                    &ParsedSymbol {
                        name: "heap_insert".to_string(),
                        kind: SymbolKind::Function,
                        line: 1,
                        signature: "int heap_insert(Heap *h, int v)".to_string(),
                    },
                );
                graph.add_symbol(
                    "main.c",
                    &ParsedSymbol {
                        name: "main".to_string(),
                        kind: SymbolKind::Function,
                        line: 1,
                        signature: "int main(void)".to_string(),
                    },
                );
                graph.add_call("main", "heap_insert");
                graph.add_call("heap_insert", "rebalance");
            }

            Self {
                keyword,
                literal,
                similarity,
                trigram,
                graph,
            }
        }

        fn planner(&self) -> QueryPlanner<'_> {
            QueryPlanner {
                keyword: &self.keyword,
                literal: &self.literal,
                similarity: &self.similarity,
                trigram: &self.trigram,
                graph: &self.graph,
            }
        }
    }

    #[test]
    fn callers_query_enriches_from_graph_and_call_sites() {
        let fixture = Fixture::build(true);
        let searched = fixture
            .planner()
            .execute("who calls heap_insert", &PlannerOptions::default());

        assert_eq!(searched.plan.intent, Intent::Callers);
        assert_eq!(searched.enrichments.callers, Some(vec!["main".to_string()]));
        let sites = searched.enrichments.call_sites.as_deref().unwrap_or_default();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].file, "main.c");
        assert!(!searched.results.is_empty());
    }

    #[test]
    fn empty_graph_omits_enrichments_silently() {
        let fixture = Fixture::build(false);
        let searched = fixture
            .planner()
            .execute("who calls heap_insert", &PlannerOptions::default());

        assert!(searched.enrichments.callers.is_none());
        // Base search still delivers results from the literal path.
        assert!(!searched.results.is_empty());
    }

    #[test]
    fn results_are_deduplicated_by_location() {
        let fixture = Fixture::build(true);
        let searched = fixture
            .planner()
            .execute("heap_insert", &PlannerOptions::default());

        let mut seen = std::collections::HashSet::new();
        for result in &searched.results {
            assert!(
                seen.insert((result.file.clone(), result.line)),
                "duplicate location {}:{}",
                result.file,
                result.line
            );
        }
    }

    #[test]
    fn results_sorted_descending_and_bounded() {
        let fixture = Fixture::build(true);
        let opts = PlannerOptions {
            max_results: 3,
            ..PlannerOptions::default()
        };
        let searched = fixture.planner().execute("heap insert rebalance", &opts);

        assert!(searched.results.len() <= 3);
        for pair in searched.results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn general_intent_adds_no_enrichments() {
        let fixture = Fixture::build(true);
        let searched = fixture
            .planner()
            .execute("rebalance after insert", &PlannerOptions::default());
        assert_eq!(searched.plan.intent, Intent::General);
        assert!(searched.enrichments.is_empty());
    }
}
