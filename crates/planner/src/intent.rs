use crate::variants::lexical_variants;
use once_cell::sync::Lazy;
use regex::Regex;

/// Closed set of recognized query intents. Each drives a `match` over
/// enrichment strategies in the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Callers,
    Callees,
    Explain,
    Structure,
    Find,
    General,
}

/// A parsed query: detected intent, the extracted target entity and its
/// lexical variants, in generation order.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub intent: Intent,
    pub target: String,
    pub variants: Vec<String>,
}

/// Ordered intent templates; first capture wins. Kept as one table so the
/// precedence between overlapping phrasings is visible in one place.
static INTENT_TEMPLATES: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    let table: &[(Intent, &str)] = &[
        (Intent::Callers, r"(?i)^who\s+calls\s+(.+)$"),
        (Intent::Callers, r"(?i)^(?:what|find\s+what)\s+calls\s+(.+)$"),
        (Intent::Callers, r"(?i)^callers?\s+of\s+(.+)$"),
        (Intent::Callees, r"(?i)^what\s+does\s+(.+?)\s+call\??$"),
        (Intent::Callees, r"(?i)^callees?\s+of\s+(.+)$"),
        (Intent::Explain, r"(?i)^(?:explain|describe)\s+(.+)$"),
        (Intent::Explain, r"(?i)^how\s+does\s+(.+?)\s+work\??$"),
        (Intent::Explain, r"(?i)^what\s+is\s+(.+)$"),
        (
            Intent::Structure,
            r"(?i)^(?:structure|architecture|overview)\s+of\s+(.+)$",
        ),
        (
            Intent::Structure,
            r"(?i)^how\s+is\s+(.+?)\s+(?:structured|organized)\??$",
        ),
        (Intent::Find, r"(?i)^(?:find|show|locate|search\s+for)\s+(.+)$"),
        (Intent::Find, r"(?i)^where\s+is\s+(.+?)(?:\s+defined)?\??$"),
    ];
    table
        .iter()
        .map(|(intent, pattern)| {
            // Table patterns are fixed at compile time; a bad one is a build
            // defect, not a runtime input failure.
            let regex = Regex::new(pattern).expect("intent template");
            (*intent, regex)
        })
        .collect()
});

/// Classify a query and extract its target. Unmatched queries fall through
/// to [`Intent::General`] with the whole query as target.
#[must_use]
pub fn detect_intent(query: &str) -> (Intent, String) {
    let trimmed = query.trim();
    for (intent, template) in INTENT_TEMPLATES.iter() {
        if let Some(captures) = template.captures(trimmed) {
            if let Some(target) = captures.get(1) {
                return (*intent, clean_target(target.as_str()));
            }
        }
    }
    (Intent::General, clean_target(trimmed))
}

/// Full planning step: intent plus variant expansion.
#[must_use]
pub fn plan(query: &str) -> QueryPlan {
    let (intent, target) = detect_intent(query);
    let variants = lexical_variants(&target);
    log::debug!("Planned {intent:?} for target {target:?}: {} variants", variants.len());
    QueryPlan {
        intent,
        target,
        variants,
    }
}

/// Strip quoting and filler the templates capture along with the entity.
fn clean_target(raw: &str) -> String {
    let mut target = raw.trim().trim_matches(['"', '\'', '`']).trim();
    target = target.trim_end_matches(['?', '.', '!']).trim();
    for filler in ["function", "method", "symbol", "the"] {
        if let Some(stripped) = target.strip_suffix(filler) {
            target = stripped.trim();
        }
    }
    if let Some(stripped) = target.strip_prefix("the ") {
        target = stripped.trim();
    }
    target.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn who_calls_query_yields_callers_intent_and_variants() {
        let plan = plan("who calls heap_insert");
        assert_eq!(plan.intent, Intent::Callers);
        assert_eq!(plan.target, "heap_insert");
        for expected in ["heap_insert", "heapinsert", "heapInsert", "HeapInsert", "HEAP_INSERT"] {
            assert!(
                plan.variants.iter().any(|v| v == expected),
                "missing variant {expected} in {:?}",
                plan.variants
            );
        }
    }

    #[test]
    fn callees_phrasing() {
        let (intent, target) = detect_intent("what does parse_frame call?");
        assert_eq!(intent, Intent::Callees);
        assert_eq!(target, "parse_frame");
    }

    #[test]
    fn explain_strips_filler_and_punctuation() {
        let (intent, target) = detect_intent("explain the heap_insert function");
        assert_eq!(intent, Intent::Explain);
        assert_eq!(target, "heap_insert");
    }

    #[test]
    fn find_and_structure_phrasings() {
        assert_eq!(detect_intent("where is Config defined?").0, Intent::Find);
        assert_eq!(
            detect_intent("structure of the scheduler").0,
            Intent::Structure
        );
    }

    #[test]
    fn unmatched_query_falls_through_to_general() {
        let (intent, target) = detect_intent("heap rebalancing after insert");
        assert_eq!(intent, Intent::General);
        assert_eq!(target, "heap rebalancing after insert");
    }

    #[test]
    fn earlier_templates_take_precedence() {
        // "what calls X" is callers, not callees, despite both mentioning call.
        assert_eq!(detect_intent("what calls heap_insert").0, Intent::Callers);
    }
}
