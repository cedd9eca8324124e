use crate::tiers::RankedItem;
use crate::AssemblerConfig;
use quarry_protocol::{hard_truncate, LlmProvider};
use std::sync::Arc;

/// Render one candidate as a location comment plus its snippet.
pub(crate) fn render_item(item: &RankedItem) -> String {
    let result = &item.result;
    let mut out = match &result.name {
        Some(name) => format!("// {}:{} {}", result.file, result.line, name),
        None => format!("// {}:{}", result.file, result.line),
    };
    if !result.snippet.is_empty() {
        out.push('\n');
        out.push_str(result.snippet.trim_end());
    }
    out
}

/// Render a tier grouped by file, files in first-appearance (best-first)
/// order, items within a file by relevance.
pub(crate) fn render_tier(items: &[RankedItem]) -> String {
    let mut file_order: Vec<&str> = Vec::new();
    for item in items {
        if !file_order.contains(&item.result.file.as_str()) {
            file_order.push(&item.result.file);
        }
    }

    let mut sections: Vec<String> = Vec::new();
    for file in file_order {
        for item in items.iter().filter(|i| i.result.file == file) {
            sections.push(render_item(item));
        }
    }
    sections.join("\n\n")
}

/// Deterministic stand-in for summarization: keep declaration and comment
/// lines first, then code, then prose, dropping from the back of each class
/// until the text fits. Selected lines keep their original order.
#[must_use]
pub fn priority_truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut selected: Vec<usize> = Vec::new();
    let mut used = 0usize;

    for class in [LineClass::Header, LineClass::Code, LineClass::Prose] {
        for (i, line) in lines.iter().enumerate() {
            if classify_line(line) != class {
                continue;
            }
            let cost = line.chars().count() + 1;
            if used + cost > max_chars {
                continue;
            }
            used += cost;
            selected.push(i);
        }
    }

    selected.sort_unstable();
    let kept: Vec<&str> = selected.into_iter().map(|i| lines[i]).collect();
    hard_truncate(&kept.join("\n"), max_chars).text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Header,
    Code,
    Prose,
}

fn classify_line(line: &str) -> LineClass {
    let trimmed = line.trim_start();
    const HEADER_STARTS: &[&str] = &[
        "//", "/*", "#", "fn ", "pub ", "struct ", "class ", "enum ", "trait ", "interface ",
        "impl ", "def ", "function ", "type ", "typedef ",
    ];
    if HEADER_STARTS.iter().any(|p| trimmed.starts_with(p)) {
        return LineClass::Header;
    }
    if line.starts_with(char::is_whitespace)
        || trimmed.contains(';')
        || trimmed.contains('{')
        || trimmed.contains('}')
        || trimmed.contains('=')
    {
        return LineClass::Code;
    }
    LineClass::Prose
}

/// Fit secondary-tier content into its budget: verbatim when possible, LLM
/// chunk summaries when a provider is at hand, priority truncation otherwise
/// or on any provider failure.
pub(crate) async fn fit_secondary(
    items: &[RankedItem],
    budget: usize,
    provider: Option<&Arc<dyn LlmProvider>>,
    config: &AssemblerConfig,
) -> String {
    if items.is_empty() || budget == 0 {
        return String::new();
    }

    let verbatim = render_tier(items);
    if verbatim.chars().count() <= budget {
        return verbatim;
    }

    if let Some(provider) = provider {
        match summarize_by_file(items, budget, provider, config).await {
            Some(summary) => return hard_truncate(&summary, budget).text,
            None => log::warn!("Secondary summarization failed, falling back to truncation"),
        }
    }
    priority_truncate(&verbatim, budget)
}

/// Chunk by file, best files first; summarize each chunk independently, then
/// merge once more if the summaries together still exceed the budget.
async fn summarize_by_file(
    items: &[RankedItem],
    budget: usize,
    provider: &Arc<dyn LlmProvider>,
    config: &AssemblerConfig,
) -> Option<String> {
    let mut file_order: Vec<&str> = Vec::new();
    for item in items {
        if !file_order.contains(&item.result.file.as_str()) {
            file_order.push(&item.result.file);
        }
    }
    let per_chunk = (budget / file_order.len().max(1)).max(80);

    let mut summaries: Vec<String> = Vec::new();
    for file in file_order {
        let chunk_items: Vec<RankedItem> = items
            .iter()
            .filter(|i| i.result.file == file)
            .cloned()
            .collect();
        let chunk = render_tier(&chunk_items);
        let prompt = format!(
            "Extract only the facts from this code that matter for understanding it. \
             Preserve identifiers and code fragments verbatim. If nothing is notable, \
             reply with an empty line. Stay under {per_chunk} characters.\n\n\
             File: {file}\n{chunk}"
        );
        let summary = call_with_timeout(provider, &prompt, config).await?;
        if !summary.trim().is_empty() {
            summaries.push(format!("// {file}\n{}", summary.trim()));
        }
    }

    let merged = summaries.join("\n\n");
    if merged.chars().count() <= budget {
        return Some(merged);
    }

    let prompt = format!(
        "Merge these notes into one summary of at most {budget} characters. \
         Keep identifiers and code fragments verbatim, drop repetition.\n\n{merged}"
    );
    call_with_timeout(provider, &prompt, config).await
}

async fn call_with_timeout(
    provider: &Arc<dyn LlmProvider>,
    prompt: &str,
    config: &AssemblerConfig,
) -> Option<String> {
    match tokio::time::timeout(config.llm_timeout, provider.analyze(prompt)).await {
        Ok(Ok(text)) => Some(text),
        Ok(Err(err)) => {
            log::warn!("Provider analyze failed: {err}");
            None
        }
        Err(_) => {
            log::warn!("Provider analyze timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_truncate_prefers_headers_over_prose() {
        let text = "fn heap_insert() {\nsome prose explaining things at length\n    x += 1;\n}";
        let out = priority_truncate(text, 40);
        assert!(out.contains("fn heap_insert"));
        assert!(!out.contains("prose explaining"));
        assert!(out.chars().count() <= 40);
    }

    #[test]
    fn priority_truncate_keeps_original_line_order() {
        let text = "// first\nplain prose line\n// second\nmore prose here";
        let out = priority_truncate(text, 20);
        let first = out.find("// first");
        let second = out.find("// second");
        assert!(first.is_some() && second.is_some());
        assert!(first < second);
    }

    #[test]
    fn priority_truncate_is_identity_when_it_fits() {
        let text = "short";
        assert_eq!(priority_truncate(text, 100), "short");
    }
}
