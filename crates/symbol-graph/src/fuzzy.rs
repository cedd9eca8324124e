use crate::types::SymbolGraph;
use crate::SymbolRecord;

/// A fuzzy symbol lookup result.
#[derive(Debug, Clone)]
pub struct FuzzySymbolMatch {
    pub record: SymbolRecord,
    pub score: u8,
}

/// Combined fuzzy name score on a 0-100 scale, case-insensitive.
///
/// Strategies, strongest first; the best applicable one wins:
/// - exact match: 100
/// - substring: 85, +10 at start of string, +5 at a word boundary
/// - initials against CamelCase/snake segments: 80
/// - subsequence: 60..=80 scaled by length ratio
/// - Levenshtein similarity: 0 below 0.5 similarity, else scaled into 25..=50
#[must_use]
pub fn fuzzy_match_score(query: &str, candidate: &str) -> u8 {
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }
    let q = query.to_lowercase();
    let c = candidate.to_lowercase();

    if q == c {
        return 100;
    }

    if let Some(at) = c.find(&q) {
        if at == 0 {
            return 95;
        }
        if is_word_boundary(&c, at) {
            return 90;
        }
        return 85;
    }

    if initials_of(candidate) == q {
        return 80;
    }

    if is_subsequence(&q, &c) {
        let ratio = q.len() as f32 / c.len() as f32;
        return (60.0 + 20.0 * ratio) as u8;
    }

    let distance = levenshtein(&q, &c);
    let max_len = q.len().max(c.len());
    let similarity = 1.0 - distance as f32 / max_len as f32;
    if similarity < 0.5 {
        0
    } else {
        (similarity * 50.0) as u8
    }
}

/// Word boundary inside an identifier: after `_`. Case transitions are gone
/// by this point; both sides were lowercased.
fn is_word_boundary(lowered: &str, at: usize) -> bool {
    lowered[..at].ends_with('_')
}

/// First letter of each CamelCase or snake_case segment, lowercased.
/// `HeapSortTree` -> "hst", `heap_sort_tree` -> "hst".
fn initials_of(name: &str) -> String {
    let mut initials = String::new();
    let mut new_segment = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            new_segment = true;
            continue;
        }
        if ch.is_ascii_uppercase() || new_segment {
            initials.push(ch.to_ascii_lowercase());
        }
        new_segment = false;
    }
    initials
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|n| chars.any(|h| h == n))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

impl SymbolGraph {
    /// Fuzzy lookup over every known symbol. Results at or above `min_score`,
    /// best first, bounded by `limit`.
    #[must_use]
    pub fn find_symbol_fuzzy(
        &self,
        name: &str,
        min_score: u8,
        limit: usize,
    ) -> Vec<FuzzySymbolMatch> {
        let mut matches: Vec<FuzzySymbolMatch> = self
            .symbols()
            .filter_map(|record| {
                let score = fuzzy_match_score(name, &record.name);
                (score >= min_score).then(|| FuzzySymbolMatch {
                    record: record.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.record.name.cmp(&b.record.name))
        });
        matches.truncate(limit);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_100() {
        assert_eq!(fuzzy_match_score("heap_insert", "heap_insert"), 100);
        assert_eq!(fuzzy_match_score("x", "x"), 100);
    }

    #[test]
    fn score_is_case_insensitive() {
        assert_eq!(fuzzy_match_score("HeapInsert", "heapinsert"), 100);
        assert_eq!(
            fuzzy_match_score("heap", "HeapSort"),
            fuzzy_match_score("HEAP", "heapsort")
        );
    }

    #[test]
    fn substring_positions_grade_the_score() {
        assert_eq!(fuzzy_match_score("heap", "heap_insert"), 95);
        assert_eq!(fuzzy_match_score("insert", "heap_insert"), 90);
        assert_eq!(fuzzy_match_score("ser", "heap_insert"), 85);
    }

    #[test]
    fn initials_match_camel_and_snake() {
        assert_eq!(fuzzy_match_score("hst", "HeapSortTree"), 80);
        assert_eq!(fuzzy_match_score("hst", "heap_sort_tree"), 80);
    }

    #[test]
    fn subsequence_scales_with_length_ratio() {
        let score = fuzzy_match_score("hpinst", "heap_insert");
        assert!((60..=80).contains(&score));
    }

    #[test]
    fn distant_names_score_zero() {
        assert_eq!(fuzzy_match_score("socket", "render"), 0);
    }

    #[test]
    fn close_typo_lands_in_levenshtein_band() {
        // Not a substring or subsequence, one substitution away.
        let score = fuzzy_match_score("heap_insart", "heap_insert");
        assert!(score > 0 && score <= 50, "got {score}");
    }

    #[test]
    fn levenshtein_band_stays_monotonic() {
        let one_edit = fuzzy_match_score("heap_insert", "heap_insart");
        let two_edits = fuzzy_match_score("heap_insert", "haap_insart");
        assert!(one_edit > two_edits, "got {one_edit} vs {two_edits}");
        assert!(two_edits > 0 && one_edit <= 50);
    }
}
