use quarry_similarity::DEFAULT_DIMENSION;
use std::time::Duration;

/// Build-time knobs, all defaulted.
#[derive(Debug, Clone)]
pub struct IndexBuildOptions {
    /// Files processed between cooperative yields.
    pub batch_size: usize,
    /// Substring patterns; a path containing one is skipped.
    pub exclude_patterns: Vec<String>,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: usize,
    /// Window height for similarity chunking.
    pub chunk_max_lines: usize,
    pub embedding_dimension: usize,
    /// Abort the build when exceeded, checked between stages.
    pub deadline: Option<Duration>,
}

impl Default for IndexBuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 32,
            exclude_patterns: Vec::new(),
            max_file_size: 1_048_576,
            chunk_max_lines: 80,
            embedding_dimension: DEFAULT_DIMENSION,
            deadline: None,
        }
    }
}

/// Per-query knobs.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Upper bound on `context` length, in characters.
    pub budget_chars: usize,
    pub max_results: usize,
    /// Cap on the LLM-assisted assembly phase; on expiry the query is
    /// re-assembled deterministically instead of failing.
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            budget_chars: 8_000,
            max_results: 20,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Build stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    Vocabulary,
    Keyword,
    Literal,
    Similarity,
    Graph,
}

/// Pushed to the progress callback as each stage advances.
#[derive(Debug, Clone)]
pub struct BuildProgress {
    pub stage: BuildStage,
    pub files_processed: usize,
    pub files_total: usize,
}
