use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One file of the corpus snapshot, as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    /// Repo-relative path.
    pub path: String,
    pub content: String,
    /// Language identifier ("rust", "c", "python", ...). Informational only.
    pub language: String,
}

impl SourceFile {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language: language.into(),
        }
    }
}

/// Symbol kind as reported by the upstream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Field,
    Variable,
    Constant,
    Module,
    Other,
}

impl SymbolKind {
    /// Kinds that describe structure rather than behavior. Used for small
    /// relevance bonuses when a query asks about shape ("what is X").
    #[must_use]
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Struct | Self::Enum | Self::Interface | Self::Module
        )
    }
}

/// Pre-parsed symbol from the host's per-file symbol lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based line of the definition.
    pub line: u32,
    pub signature: String,
}

/// Caller name -> callee names, as reported by the host parser.
pub type CallGraphInput = HashMap<String, Vec<String>>;

/// Indexable unit type. Affects keyword scoring: summaries are denser signal
/// than raw code, so they get the highest boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    FileContent,
    Symbol,
    Comment,
    Summary,
}

impl DocumentType {
    #[must_use]
    pub fn boost(self) -> f32 {
        match self {
            Self::Summary => 2.0,
            Self::Symbol => 1.5,
            Self::Comment => 1.2,
            Self::FileContent => 1.0,
        }
    }
}

/// Which index produced a result. Carried through merge so the assembler can
/// weigh evidence sources differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOrigin {
    Keyword,
    Literal,
    Similarity,
    Trigram,
    SymbolTable,
    CallGraph,
}

/// A scored match from any index. Produced fresh per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: String,
    pub file: String,
    /// 1-based line, 0 when the match covers a whole file.
    pub line: u32,
    /// Symbol or heading name where one applies.
    pub name: Option<String>,
    pub snippet: String,
    pub score: f32,
    pub matched_terms: Vec<String>,
    pub origin: IndexOrigin,
}

/// A concrete invocation location, distinct from a definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    /// 1-based.
    pub line: u32,
    /// 0-based column of the callee name.
    pub column: u32,
    pub line_text: String,
}

/// A symbol entry in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolHit {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub line: u32,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub score: f32,
}

/// A verbatim code region in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBlock {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
    pub score: f32,
}

/// Intent-driven extras. Absent fields mean the call graph had nothing for
/// the target, which is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enrichments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_sites: Option<Vec<CallSite>>,
}

impl Enrichments {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callers.is_none() && self.callees.is_none() && self.call_sites.is_none()
    }
}

/// Query-level accounting, including reasons for an empty result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseStats {
    pub candidates_considered: usize,
    pub primary_items: usize,
    pub secondary_items: usize,
    pub dropped_items: usize,
    pub context_chars: usize,
    pub budget_chars: usize,
    pub truncated: bool,
    /// Set when the engine answered empty because an index was not built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<String>,
    /// Regex compilation failures surface here, never as a hard error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_error: Option<String>,
}

/// Structured output contract to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub symbols: Vec<SymbolHit>,
    pub code_blocks: Vec<CodeBlock>,
    pub files: Vec<String>,
    pub enrichments: Enrichments,
    /// Bounded context string; `context.chars().count()` never exceeds the
    /// requested budget.
    pub context: String,
    pub stats: ResponseStats,
}

impl SearchResponse {
    /// Empty response with an explanatory stats field, used instead of
    /// propagating `None` into scoring math.
    #[must_use]
    pub fn empty(reason: impl Into<String>) -> Self {
        Self {
            symbols: Vec::new(),
            code_blocks: Vec::new(),
            files: Vec::new(),
            enrichments: Enrichments::default(),
            context: String::new(),
            stats: ResponseStats {
                empty_reason: Some(reason.into()),
                ..ResponseStats::default()
            },
        }
    }
}
