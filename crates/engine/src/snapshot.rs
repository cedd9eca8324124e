use crate::builder::{attach_call_sites, EngineBuilder};
use crate::engine::SearchEngine;
use crate::{EngineError, Result};
use quarry_keyword_index::{KeywordIndex, KeywordIndexSnapshot};
use quarry_literal_index::LiteralIndex;
use quarry_protocol::{ParsedSymbol, SourceFile, SNAPSHOT_VERSION};
use quarry_similarity::{Embedder, SimilarityIndex, TrigramIndex};
use quarry_symbol_graph::{SymbolGraph, SymbolGraphSnapshot};
use quarry_vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serializable engine state. The learned vocabulary, keyword index and
/// symbol graph are stored directly; the literal, similarity and trigram
/// indexes are derived from the stored files on import, which costs one scan
/// and keeps the snapshot format small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    vocabulary: Vocabulary,
    keyword: KeywordIndexSnapshot,
    graph: SymbolGraphSnapshot,
    files: Vec<SourceFile>,
    symbols: Vec<(String, Vec<ParsedSymbol>)>,
    calls: Vec<(String, Vec<String>)>,
}

impl SearchEngine {
    /// Export everything needed to restore this engine.
    #[must_use]
    pub fn export(&self) -> EngineSnapshot {
        let (vocabulary, keyword, graph, files, symbols, calls) = self.snapshot_parts();

        let mut files: Vec<SourceFile> = files.values().cloned().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let mut symbols: Vec<(String, Vec<ParsedSymbol>)> = symbols
            .iter()
            .map(|(path, list)| (path.clone(), list.clone()))
            .collect();
        symbols.sort_by(|a, b| a.0.cmp(&b.0));
        let mut calls: Vec<(String, Vec<String>)> = calls
            .iter()
            .map(|(caller, callees)| (caller.clone(), callees.clone()))
            .collect();
        calls.sort_by(|a, b| a.0.cmp(&b.0));

        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            vocabulary: vocabulary.clone(),
            keyword: keyword.export(),
            graph: graph.export(),
            files,
            symbols,
            calls,
        }
    }
}

impl EngineBuilder {
    /// Restore an engine from a snapshot, using this builder's options,
    /// provider and configs. A version mismatch fails fast; the caller is
    /// expected to fall back to a full build.
    pub fn import(&self, snapshot: EngineSnapshot) -> Result<SearchEngine> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EngineError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }

        let vocabulary = Arc::new(snapshot.vocabulary);
        let keyword = KeywordIndex::import(snapshot.keyword, Arc::clone(&vocabulary))?;
        let mut graph = SymbolGraph::import(snapshot.graph)?;

        let mut literal = LiteralIndex::new();
        literal.build(&snapshot.files);
        attach_call_sites(&mut graph, &literal);

        let options = self.options();
        let embedder = Embedder::select(Some(Arc::clone(&vocabulary)), options.embedding_dimension);
        let mut similarity = SimilarityIndex::new(embedder, options.chunk_max_lines);
        similarity.build(&snapshot.files);
        let mut trigram = TrigramIndex::new();
        trigram.build(&snapshot.files);

        log::info!(
            "Engine imported: {} files, {} documents, {} symbols",
            snapshot.files.len(),
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
            snapshot.files,
            snapshot.symbols.into_iter().collect(),
            snapshot.calls.into_iter().collect(),
            0,
        ))
    }
}
