use quarry_keyword_index::stem;
use quarry_protocol::ScoredResult;
use quarry_vocabulary::split_identifier;

pub(crate) const MAX_RELEVANCE: f32 = 300.0;
const ZERO_MATCH_PENALTY: f32 = 80.0;

/// Multi-signal relevance of one candidate against pre-tokenized query
/// terms, on a 0-300 scale.
///
/// Filename evidence weighs highest, then symbol-name matches, then content,
/// with a small bonus for structural kinds. A candidate matching no query
/// term at all takes a flat penalty, so incidental structural bonuses cannot
/// carry an unrelated item into a tier.
#[must_use]
pub fn heuristic_relevance(terms: &[String], item: &ScoredResult) -> f32 {
    let mut relevance = 0.0f32;
    let mut matched_any = false;

    let file_name = item
        .file
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&item.file)
        .to_lowercase();
    let joined: String = terms.concat();

    if !joined.is_empty() && file_name.contains(&joined) {
        relevance += 120.0;
        matched_any = true;
    } else {
        let mut filename_hits = 0;
        for term in terms {
            if file_name.contains(term.as_str()) || file_name.contains(&stem(term)) {
                filename_hits += 1;
            }
        }
        if filename_hits > 0 {
            relevance += 60.0 + 20.0 * (filename_hits - 1) as f32;
            matched_any = true;
        }
    }

    if let Some(name) = &item.name {
        let lower = name.to_lowercase();
        let segments = split_identifier(name);
        if terms.iter().any(|t| *t == lower) {
            relevance += 100.0;
            matched_any = true;
        } else if terms.iter().any(|t| segments.contains(t)) {
            relevance += 70.0;
            matched_any = true;
        } else if terms.iter().any(|t| lower.contains(t.as_str())) {
            relevance += 40.0;
            matched_any = true;
        }
    }

    let snippet = item.snippet.to_lowercase();
    let mut content_hits = 0;
    for term in terms {
        if snippet.contains(term.as_str()) {
            content_hits += 1;
        }
    }
    if content_hits > 0 {
        relevance += (30.0 * content_hits as f32).min(60.0);
        matched_any = true;
    }

    if is_structural(item) {
        relevance += 25.0;
    }

    if !matched_any {
        relevance = (relevance - ZERO_MATCH_PENALTY).max(0.0);
    }
    relevance.min(MAX_RELEVANCE)
}

/// Type-shaped declarations anchor explanations, so they get a nudge even
/// when the query targets a function inside them.
fn is_structural(item: &ScoredResult) -> bool {
    let snippet = &item.snippet;
    ["struct ", "class ", "enum ", "interface ", "trait "]
        .iter()
        .any(|kw| {
            snippet
                .lines()
                .take(3)
                .any(|line| line.trim_start().contains(kw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_protocol::IndexOrigin;

    fn item(file: &str, name: Option<&str>, snippet: &str) -> ScoredResult {
        ScoredResult {
            id: file.to_string(),
            file: file.to_string(),
            line: 1,
            name: name.map(str::to_string),
            snippet: snippet.to_string(),
            score: 0.0,
            matched_terms: Vec::new(),
            origin: IndexOrigin::Keyword,
        }
    }

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn filename_match_outranks_content_match() {
        let q = terms(&["heap"]);
        let by_name = heuristic_relevance(&q, &item("src/heap.c", None, "int x;"));
        let by_body = heuristic_relevance(&q, &item("src/other.c", None, "heap stuff"));
        assert!(by_name > by_body);
    }

    #[test]
    fn exact_symbol_name_outranks_substring() {
        let q = terms(&["heap_insert"]);
        let exact = heuristic_relevance(&q, &item("a.c", Some("heap_insert"), ""));
        let partial = heuristic_relevance(&q, &item("a.c", Some("heap_insert_slow"), ""));
        assert!(exact > partial);
    }

    #[test]
    fn zero_match_candidate_scores_zero_despite_structural_bonus() {
        let q = terms(&["socket"]);
        let score = heuristic_relevance(&q, &item("heap.c", None, "struct Heap { int n; };"));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn relevance_is_capped() {
        let q = terms(&["heap", "insert"]);
        let score = heuristic_relevance(
            &q,
            &item(
                "heapinsert.c",
                Some("heap_insert"),
                "struct Heap; heap insert here",
            ),
        );
        assert!(score <= MAX_RELEVANCE);
    }
}
