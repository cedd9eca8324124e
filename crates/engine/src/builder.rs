use crate::engine::SearchEngine;
use crate::options::{BuildProgress, BuildStage, IndexBuildOptions};
use crate::{EngineError, Result};
use quarry_assembler::AssemblerConfig;
use quarry_keyword_index::{DocumentMeta, KeywordIndex};
use quarry_literal_index::{CallSearchOptions, LiteralIndex};
use quarry_protocol::{
    CallGraphInput, DocumentType, FileSource, LlmProvider, ParsedSymbol, SourceFile,
};
use quarry_similarity::{Embedder, SimilarityIndex, TrigramIndex};
use quarry_symbol_graph::SymbolGraph;
use quarry_vocabulary::{VocabularyConfig, VocabularyLearner};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::yield_now;

pub type ProgressCallback = Arc<dyn Fn(&BuildProgress) + Send + Sync>;

/// Staged engine construction: vocabulary, then keyword, then literal and
/// call sites, then similarity and trigram, then the symbol graph. Yields
/// to the runtime every `batch_size` files so a build cannot starve its
/// host event loop.
pub struct EngineBuilder {
    options: IndexBuildOptions,
    vocabulary_config: VocabularyConfig,
    assembler_config: AssemblerConfig,
    provider: Option<Arc<dyn LlmProvider>>,
    progress: Option<ProgressCallback>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: IndexBuildOptions::default(),
            vocabulary_config: VocabularyConfig::default(),
            assembler_config: AssemblerConfig::default(),
            provider: None,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: IndexBuildOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_vocabulary_config(mut self, config: VocabularyConfig) -> Self {
        self.vocabulary_config = config;
        self
    }

    #[must_use]
    pub fn with_assembler_config(mut self, config: AssemblerConfig) -> Self {
        self.assembler_config = config;
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub(crate) fn options(&self) -> &IndexBuildOptions {
        &self.options
    }

    pub(crate) fn vocabulary_config(&self) -> &VocabularyConfig {
        &self.vocabulary_config
    }

    pub(crate) fn assembler_config(&self) -> &AssemblerConfig {
        &self.assembler_config
    }

    pub(crate) fn provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.provider.clone()
    }

    /// Build from a full snapshot the host already holds.
    pub async fn build(
        &self,
        files: Vec<SourceFile>,
        symbols: HashMap<String, Vec<ParsedSymbol>>,
        calls: CallGraphInput,
    ) -> Result<SearchEngine> {
        let started = Instant::now();
        let files = self.admit(files);
        let total = files.len();

        // Stage 1: vocabulary.
        self.report(BuildStage::Vocabulary, 0, total);
        let learner = VocabularyLearner::new(self.vocabulary_config.clone())?;
        let vocabulary = Arc::new(learner.learn(&files, &symbols));
        self.report(BuildStage::Vocabulary, total, total);
        self.check_deadline(started)?;
        yield_now().await;

        // Stage 2: keyword index over file contents and symbol signatures.
        let mut keyword = KeywordIndex::new(Arc::clone(&vocabulary));
        for (i, file) in files.iter().enumerate() {
            index_file_documents(&mut keyword, file, symbols.get(&file.path));
            if (i + 1) % self.options.batch_size == 0 {
                self.report(BuildStage::Keyword, i + 1, total);
                yield_now().await;
            }
        }
        self.report(BuildStage::Keyword, total, total);
        self.check_deadline(started)?;

        // Stage 3: literal index, deriving call sites as files land.
        let mut literal = LiteralIndex::new();
        for (i, file) in files.iter().enumerate() {
            literal.add_file(file);
            if (i + 1) % self.options.batch_size == 0 {
                self.report(BuildStage::Literal, i + 1, total);
                yield_now().await;
            }
        }
        self.report(BuildStage::Literal, total, total);
        self.check_deadline(started)?;

        // Stage 4: similarity chunks and the trigram index.
        let embedder = Embedder::select(
            Some(Arc::clone(&vocabulary)),
            self.options.embedding_dimension,
        );
        let mut similarity = SimilarityIndex::new(embedder, self.options.chunk_max_lines);
        let mut trigram = TrigramIndex::new();
        for (i, file) in files.iter().enumerate() {
            similarity.add_file(file);
            trigram.add_file(file);
            if (i + 1) % self.options.batch_size == 0 {
                self.report(BuildStage::Similarity, i + 1, total);
                yield_now().await;
            }
        }
        self.report(BuildStage::Similarity, total, total);
        self.check_deadline(started)?;

        // Stage 5: symbol graph plus concrete call sites from the literal
        // index.
        let mut graph = SymbolGraph::build(&symbols, &calls);
        attach_call_sites(&mut graph, &literal);
        self.report(BuildStage::Graph, total, total);

        let build_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "Engine built: {total} files, {} documents, {} symbols in {build_ms}ms",
            keyword.document_count(),
            graph.symbol_count()
        );

        Ok(SearchEngine::assemble_parts(
            self,
            vocabulary,
            keyword,
            literal,
            similarity,
            trigram,
            graph,
            files,
            symbols,
            calls,
            build_ms,
        ))
    }

    /// Pull-based build for hosts that stream file content.
    pub async fn build_from_source(
        &self,
        source: &dyn FileSource,
        symbols: HashMap<String, Vec<ParsedSymbol>>,
        calls: CallGraphInput,
    ) -> Result<SearchEngine> {
        let paths = source.list_files().await?;
        let mut files = Vec::with_capacity(paths.len());
        for (i, path) in paths.iter().enumerate() {
            files.push(source.read_file(path).await?);
            if (i + 1) % self.options.batch_size == 0 {
                yield_now().await;
            }
        }
        self.build(files, symbols, calls).await
    }

    /// Apply exclusion patterns and the size cap.
    fn admit(&self, files: Vec<SourceFile>) -> Vec<SourceFile> {
        files
            .into_iter()
            .filter(|file| {
                if file.content.len() > self.options.max_file_size {
                    log::debug!("Skipping oversized file {}", file.path);
                    return false;
                }
                if self
                    .options
                    .exclude_patterns
                    .iter()
                    .any(|p| file.path.contains(p.as_str()))
                {
                    log::debug!("Skipping excluded file {}", file.path);
                    return false;
                }
                true
            })
            .collect()
    }

    fn report(&self, stage: BuildStage, files_processed: usize, files_total: usize) {
        if let Some(callback) = &self.progress {
            callback(&BuildProgress {
                stage,
                files_processed,
                files_total,
            });
        }
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        match self.options.deadline {
            Some(deadline) if started.elapsed() > deadline => Err(EngineError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Keyword document id for one symbol. The line keeps ids distinct when a
/// file defines the same name more than once (conditional compilation,
/// overloads).
pub(crate) fn symbol_doc_id(path: &str, symbol: &ParsedSymbol) -> String {
    format!("{path}#{}@{}", symbol.name, symbol.line)
}

/// One file becomes one content document plus one document per symbol, so a
/// signature can outrank a whole-file match.
pub(crate) fn index_file_documents(
    keyword: &mut KeywordIndex,
    file: &SourceFile,
    symbols: Option<&Vec<ParsedSymbol>>,
) {
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
    for symbol in symbols.map(Vec::as_slice).unwrap_or_default() {
        keyword.add_document(
            &symbol_doc_id(&file.path, symbol),
            &format!("{} {}", symbol.name, symbol.signature),
            DocumentType::Symbol,
            DocumentMeta {
                file: file.path.clone(),
                line: symbol.line,
                name: Some(symbol.name.clone()),
            },
        );
    }
}

/// Wire the literal index's pre-scanned call sites onto graph callees.
pub(crate) fn attach_call_sites(graph: &mut SymbolGraph, literal: &LiteralIndex) {
    let names: Vec<String> = graph.symbols().map(|r| r.name.clone()).collect();
    let opts = CallSearchOptions::default();
    for name in names {
        let sites = literal.search_function_calls(&name, &opts);
        graph.attach_call_sites(&name, sites);
    }
}
