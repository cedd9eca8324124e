use async_trait::async_trait;
use thiserror::Error;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failures from an external provider. Callers in this workspace treat every
/// variant the same way: log it and take the deterministic fallback path.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider returned an unusable response: {0}")]
    Malformed(String),

    #[error("Provider call timed out")]
    Timeout,
}

/// Knobs for a single completion call.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

/// External language-model provider. Every call site must carry a non-LLM
/// fallback; an engine without a provider answers every query.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Free-form completion.
    async fn complete(&self, prompt: &str, opts: &CompletionOptions) -> ProviderResult<String>;

    /// Short single-label answer, used for rating and classification.
    async fn classify(&self, prompt: &str) -> ProviderResult<String>;

    /// Longer analytical answer, used for summarization.
    async fn analyze(&self, prompt: &str) -> ProviderResult<String>;
}

/// Pull-based file access for index builds where the host streams content
/// instead of handing over a full snapshot.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// All corpus paths, in host order.
    async fn list_files(&self) -> ProviderResult<Vec<String>>;

    /// Content and language for one path.
    async fn read_file(&self, path: &str) -> ProviderResult<crate::SourceFile>;
}
