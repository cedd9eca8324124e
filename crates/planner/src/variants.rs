use quarry_vocabulary::split_identifier;

/// Expand a target into the identifier spellings a codebase might use.
///
/// Natural-language targets rarely match identifiers verbatim, so `heap
/// insert` also tries `heapinsert`, `heap_insert`, `HEAP_INSERT`,
/// `heapInsert` and `HeapInsert`. Deduplicated, generation order preserved.
#[must_use]
pub fn lexical_variants(target: &str) -> Vec<String> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let words: Vec<String> = trimmed
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .flat_map(split_identifier)
        .collect();

    let mut variants: Vec<String> = vec![trimmed.to_string(), trimmed.to_lowercase()];
    if !words.is_empty() {
        let snake = words.join("_");
        variants.push(words.concat());
        variants.push(snake.to_uppercase());
        variants.push(snake);
        variants.push(camel_case(&words));
        variants.push(pascal_case(&words));
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
    variants
}

fn camel_case(words: &[String]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn pascal_case(words: &[String]) -> String {
    words.iter().map(|w| capitalize(w)).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snake_target_covers_all_spellings() {
        let variants = lexical_variants("heap_insert");
        assert_eq!(
            variants,
            vec!["heap_insert", "heapinsert", "HEAP_INSERT", "heapInsert", "HeapInsert"]
        );
    }

    #[test]
    fn spaced_words_are_joined() {
        let variants = lexical_variants("heap sort");
        assert!(variants.contains(&"heapsort".to_string()));
        assert!(variants.contains(&"heap_sort".to_string()));
        assert!(variants.contains(&"HeapSort".to_string()));
    }

    #[test]
    fn camel_target_round_trips_through_segments() {
        let variants = lexical_variants("parseFrame");
        assert!(variants.contains(&"parseFrame".to_string()));
        assert!(variants.contains(&"parse_frame".to_string()));
        assert!(variants.contains(&"ParseFrame".to_string()));
    }

    #[test]
    fn duplicates_are_collapsed_order_preserved() {
        let variants = lexical_variants("main");
        assert_eq!(variants, vec!["main", "MAIN", "Main"]);
    }

    #[test]
    fn empty_target_yields_no_variants() {
        assert!(lexical_variants("   ").is_empty());
    }
}
