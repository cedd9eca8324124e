use crate::builder::{attach_call_sites, index_file_documents, symbol_doc_id, EngineBuilder};
use crate::options::{IndexBuildOptions, QueryOptions};
use crate::{EngineError, Result};
use quarry_assembler::{AssemblerConfig, ContextAssembler};
use quarry_keyword_index::KeywordIndex;
use quarry_literal_index::{LiteralIndex, LiteralSearchOptions, RegexOutcome};
use quarry_planner::{PlannedSearch, PlannerOptions, QueryPlanner};
use quarry_protocol::{
    CallGraphInput, CodeBlock, IndexOrigin, LlmProvider, ParsedSymbol, ResponseStats,
    SearchResponse, SourceFile, SymbolHit,
};
use quarry_similarity::{SimilarityIndex, TrigramIndex};
use quarry_symbol_graph::SymbolGraph;
use quarry_vocabulary::{Vocabulary, VocabularyConfig};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Index sizes and build cost, for host dashboards and tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    pub files: usize,
    pub documents: usize,
    pub terms: usize,
    pub symbols: usize,
    pub edges: usize,
    pub chunks: usize,
    pub build_ms: u64,
}

/// One corpus snapshot's worth of indexes. Queries take `&self`; incremental
/// mutation takes `&mut self` and therefore cannot race an in-flight query.
pub struct SearchEngine {
    vocabulary: Arc<Vocabulary>,
    keyword: KeywordIndex,
    literal: LiteralIndex,
    similarity: SimilarityIndex,
    trigram: TrigramIndex,
    graph: SymbolGraph,
    files: HashMap<String, SourceFile>,
    symbols: HashMap<String, Vec<ParsedSymbol>>,
    calls: CallGraphInput,
    build_options: IndexBuildOptions,
    vocabulary_config: VocabularyConfig,
    assembler_config: AssemblerConfig,
    provider: Option<Arc<dyn LlmProvider>>,
    build_ms: u64,
}

impl SearchEngine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn assemble_parts(
        builder: &EngineBuilder,
        vocabulary: Arc<Vocabulary>,
        keyword: KeywordIndex,
        literal: LiteralIndex,
        similarity: SimilarityIndex,
        trigram: TrigramIndex,
        graph: SymbolGraph,
        files: Vec<SourceFile>,
        symbols: HashMap<String, Vec<ParsedSymbol>>,
        calls: CallGraphInput,
        build_ms: u64,
    ) -> Self {
        Self {
            vocabulary,
            keyword,
            literal,
            similarity,
            trigram,
            graph,
            files: files.into_iter().map(|f| (f.path.clone(), f)).collect(),
            symbols,
            calls,
            build_options: builder.options().clone(),
            vocabulary_config: builder.vocabulary_config().clone(),
            assembler_config: builder.assembler_config().clone(),
            provider: builder.provider(),
            build_ms,
        }
    }

    /// Answer one query: plan, fan out, assemble, bound.
    pub async fn query(&self, query: &str, opts: &QueryOptions) -> SearchResponse {
        if self.files.is_empty() {
            return SearchResponse::empty("index not built");
        }
        if query.trim().is_empty() {
            return SearchResponse::empty("empty query");
        }

        let planner = QueryPlanner {
            keyword: &self.keyword,
            literal: &self.literal,
            similarity: &self.similarity,
            trigram: &self.trigram,
            graph: &self.graph,
        };
        let planner_opts = PlannerOptions {
            max_results: opts.max_results,
            ..PlannerOptions::default()
        };
        let planned = planner.execute(query, &planner_opts);
        let assembled = self.assemble_bounded(&planned, query, opts).await;

        self.respond(planned, assembled, opts)
    }

    /// Run assembly under the query timeout. On expiry, re-assemble without
    /// the provider; the deterministic path has no await points that can
    /// stall, so the query still completes.
    async fn assemble_bounded(
        &self,
        planned: &PlannedSearch,
        query: &str,
        opts: &QueryOptions,
    ) -> quarry_assembler::AssembledContext {
        let assembler =
            ContextAssembler::new(self.provider.clone(), self.assembler_config.clone());
        let attempt = tokio::time::timeout(
            opts.timeout,
            assembler.assemble(&planned.results, query, opts.budget_chars),
        )
        .await;

        match attempt {
            Ok(assembled) => assembled,
            Err(_) => {
                log::warn!("Assembly timed out after {:?}, retrying without provider", opts.timeout);
                let fallback_config = AssemblerConfig {
                    enable_llm_scoring: false,
                    ..self.assembler_config.clone()
                };
                ContextAssembler::new(None, fallback_config)
                    .assemble(&planned.results, query, opts.budget_chars)
                    .await
            }
        }
    }

    fn respond(
        &self,
        planned: PlannedSearch,
        assembled: quarry_assembler::AssembledContext,
        opts: &QueryOptions,
    ) -> SearchResponse {
        let mut symbols: Vec<SymbolHit> = Vec::new();
        let mut code_blocks: Vec<CodeBlock> = Vec::new();
        let mut files: Vec<String> = Vec::new();

        for result in &planned.results {
            if !files.contains(&result.file) {
                files.push(result.file.clone());
            }
            match result.origin {
                IndexOrigin::SymbolTable => {
                    let record = result.name.as_deref().and_then(|name| {
                        self.graph
                            .get_symbol_in_file(name, &result.file)
                            .or_else(|| self.graph.get_symbol(name))
                    });
                    if let Some(record) = record {
                        symbols.push(SymbolHit {
                            name: record.name.clone(),
                            kind: record.kind,
                            file: record.file.clone(),
                            line: record.line,
                            signature: record.signature.clone(),
                            summary: record.summary.clone(),
                            score: result.score,
                        });
                    }
                }
                IndexOrigin::Similarity => {
                    let lines = result.snippet.lines().count().max(1) as u32;
                    code_blocks.push(CodeBlock {
                        file: result.file.clone(),
                        start_line: result.line,
                        end_line: result.line + lines - 1,
                        text: result.snippet.clone(),
                        score: result.score,
                    });
                }
                _ => {}
            }
        }

        let stats = ResponseStats {
            candidates_considered: planned.results.len(),
            primary_items: assembled.primary_items,
            secondary_items: assembled.secondary_items,
            dropped_items: assembled.dropped_items,
            context_chars: assembled.context.chars().count(),
            budget_chars: opts.budget_chars,
            truncated: assembled.truncated,
            empty_reason: None,
            query_error: None,
        };

        SearchResponse {
            symbols,
            code_blocks,
            files,
            enrichments: planned.enrichments,
            context: assembled.context,
            stats,
        }
    }

    /// Raw regex passthrough for hosts. A malformed pattern comes back in
    /// the outcome's error field, never as `Err`.
    #[must_use]
    pub fn search_regex(&self, pattern: &str, opts: &LiteralSearchOptions) -> RegexOutcome {
        self.literal.search_regex(pattern, opts)
    }

    /// Add or replace one file across every index. New call edges are given
    /// as (caller, callee) pairs.
    pub fn add_file(
        &mut self,
        file: SourceFile,
        symbols: Vec<ParsedSymbol>,
        calls: Vec<(String, String)>,
    ) -> Result<()> {
        if self.files.contains_key(&file.path) {
            self.remove_file(&file.path)?;
        }

        index_file_documents(&mut self.keyword, &file, Some(&symbols));
        self.literal.add_file(&file);
        self.similarity.add_file(&file);
        self.trigram.add_file(&file);
        for symbol in &symbols {
            self.graph.add_symbol(&file.path, symbol);
        }
        for (caller, callee) in &calls {
            self.graph.add_call(caller, callee);
            self.calls
                .entry(caller.clone())
                .or_default()
                .push(callee.clone());
        }
        attach_call_sites(&mut self.graph, &self.literal);

        self.symbols.insert(file.path.clone(), symbols);
        self.files.insert(file.path.clone(), file);
        Ok(())
    }

    /// Remove one file from every index. The file stays registered until
    /// every index removal has succeeded, so an error never leaves a file
    /// half-removed.
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        if !self.files.contains_key(path) {
            return Err(EngineError::UnknownFile(path.to_string()));
        }

        self.keyword.remove_document(path)?;
        if let Some(symbols) = self.symbols.get(path) {
            let doc_ids: HashSet<String> = symbols
                .iter()
                .map(|symbol| symbol_doc_id(path, symbol))
                .collect();
            for doc_id in &doc_ids {
                self.keyword.remove_document(doc_id)?;
            }
        }
        self.literal.remove_file(path)?;
        self.similarity.remove_file(path)?;
        self.trigram.remove_file(path);
        self.graph.remove_file(path);

        if let Some(symbols) = self.symbols.remove(path) {
            for symbol in &symbols {
                self.calls.remove(&symbol.name);
            }
        }
        self.files.remove(path);
        Ok(())
    }

    /// Build a fresh engine over the current corpus for atomic swap by the
    /// caller. The vocabulary is relearned, so accumulated add/remove drift
    /// in term statistics is washed out.
    pub async fn rebuild(&self) -> Result<SearchEngine> {
        let mut files: Vec<SourceFile> = self.files.values().cloned().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let mut builder = EngineBuilder::new()
            .with_options(self.build_options.clone())
            .with_vocabulary_config(self.vocabulary_config.clone())
            .with_assembler_config(self.assembler_config.clone());
        if let Some(provider) = &self.provider {
            builder = builder.with_provider(Arc::clone(provider));
        }
        builder
            .build(files, self.symbols.clone(), self.calls.clone())
            .await
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            files: self.files.len(),
            documents: self.keyword.document_count(),
            terms: self.keyword.term_count(),
            symbols: self.graph.symbol_count(),
            edges: self.graph.edge_count(),
            chunks: self.similarity.chunk_count(),
            build_ms: self.build_ms,
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn graph(&self) -> &SymbolGraph {
        &self.graph
    }

    pub(crate) fn snapshot_parts(
        &self,
    ) -> (
        &Vocabulary,
        &KeywordIndex,
        &SymbolGraph,
        &HashMap<String, SourceFile>,
        &HashMap<String, Vec<ParsedSymbol>>,
        &CallGraphInput,
    ) {
        (
            &self.vocabulary,
            &self.keyword,
            &self.graph,
            &self.files,
            &self.symbols,
            &self.calls,
        )
    }
}
