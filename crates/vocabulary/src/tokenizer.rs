use quarry_protocol::SourceFile;

/// Where a token was observed. Drives the per-source weight multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSource {
    Identifier,
    TypeName,
    Comment,
    StringLiteral,
    Path,
    Body,
}

/// Small universal bootstrap stop list: language keywords and English glue.
/// Distinct from learned corpus-local stop words, which are discovered from
/// document frequency.
pub(crate) const BOOTSTRAP_STOPWORDS: &[&str] = &[
    // English glue
    "the", "a", "an", "of", "to", "in", "is", "it", "and", "or", "not", "for", "on", "with", "as",
    "at", "by", "be", "this", "that", "from", "are", "was", "will", "can", "has", "have", "its",
    // Cross-language keywords
    "if", "else", "while", "do", "switch", "case", "break", "continue", "return", "new", "true",
    "false", "null", "none", "void", "int", "let", "var", "const", "fn", "def", "pub", "use",
    "mod", "impl", "self", "static", "struct", "enum", "type", "match", "loop", "where", "mut",
    "ref", "class", "import", "export", "function", "async", "await", "try", "catch", "throw",
    "public", "private", "protected", "extends", "implements", "interface", "package", "goto",
];

#[must_use]
pub(crate) fn is_bootstrap_stopword(term: &str) -> bool {
    BOOTSTRAP_STOPWORDS.contains(&term)
}

/// Split an identifier on snake_case and camelCase boundaries into lowercase
/// parts. `HeapSortTree` -> [heap, sort, tree], `heap_insert` -> [heap, insert].
#[must_use]
pub fn split_identifier(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for segment in word.split(|c: char| c == '_' || c == '-' || !c.is_ascii_alphanumeric()) {
        if segment.is_empty() {
            continue;
        }
        split_camel(segment, &mut parts);
    }
    parts
}

fn split_camel(segment: &str, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut prev_upper = false;
    for (i, ch) in segment.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            // Boundary on lower->Upper, and on the last capital of an acronym
            // run (HTTPServer -> http, server).
            let next_lower = segment
                .chars()
                .nth(i + 1)
                .is_some_and(|n| n.is_ascii_lowercase());
            if !current.is_empty() && (!prev_upper || next_lower) {
                push_part(&mut current, out);
            }
            current.push(ch.to_ascii_lowercase());
            prev_upper = true;
        } else {
            current.push(ch.to_ascii_lowercase());
            prev_upper = false;
        }
    }
    push_part(&mut current, out);
}

fn push_part(current: &mut String, out: &mut Vec<String>) {
    if current.len() >= 2 && !current.chars().all(|c| c.is_ascii_digit()) {
        out.push(current.clone());
    }
    current.clear();
}

/// Tokenize a free-text query: whitespace words plus identifier-boundary
/// parts, lowercased, bootstrap stop words removed.
#[must_use]
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for word in query.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        for part in split_identifier(word) {
            if !is_bootstrap_stopword(&part) && !terms.contains(&part) {
                terms.push(part);
            }
        }
    }
    terms
}

/// Text region, tracked so tokens can be attributed to a source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Code,
    LineComment,
    BlockComment,
    Str(char),
}

/// Tokenize one file into `(term, source)` pairs. A lightweight region scanner
/// separates comments and string literals from code; no language grammar is
/// involved (symbol extraction is an upstream concern).
pub(crate) fn tokenize_file(file: &SourceFile) -> Vec<(String, TokenSource)> {
    let mut tokens = Vec::new();

    // Path components count as their own source: directory and file names are
    // deliberate naming and often carry the best domain terms.
    for part in split_identifier(&file.path) {
        if !is_bootstrap_stopword(&part) {
            tokens.push((part, TokenSource::Path));
        }
    }

    let mut region = Region::Code;
    let mut word = String::new();
    let mut chars = file.content.chars().peekable();

    while let Some(ch) = chars.next() {
        let next = chars.peek().copied();
        match region {
            Region::Code => match ch {
                '/' if next == Some('/') => {
                    flush_word(&mut word, region, &mut tokens);
                    chars.next();
                    region = Region::LineComment;
                }
                '/' if next == Some('*') => {
                    flush_word(&mut word, region, &mut tokens);
                    chars.next();
                    region = Region::BlockComment;
                }
                '#' => {
                    flush_word(&mut word, region, &mut tokens);
                    region = Region::LineComment;
                }
                '"' | '\'' | '`' => {
                    flush_word(&mut word, region, &mut tokens);
                    region = Region::Str(ch);
                }
                c if c.is_ascii_alphanumeric() || c == '_' => word.push(c),
                _ => flush_word(&mut word, region, &mut tokens),
            },
            Region::LineComment => match ch {
                '\n' => {
                    flush_word(&mut word, region, &mut tokens);
                    region = Region::Code;
                }
                c if c.is_ascii_alphanumeric() || c == '_' => word.push(c),
                _ => flush_word(&mut word, region, &mut tokens),
            },
            Region::BlockComment => match ch {
                '*' if next == Some('/') => {
                    flush_word(&mut word, region, &mut tokens);
                    chars.next();
                    region = Region::Code;
                }
                c if c.is_ascii_alphanumeric() || c == '_' => word.push(c),
                _ => flush_word(&mut word, region, &mut tokens),
            },
            Region::Str(quote) => match ch {
                '\\' => {
                    // Skip the escaped character so \" does not close the string.
                    chars.next();
                }
                c if c == quote => {
                    flush_word(&mut word, region, &mut tokens);
                    region = Region::Code;
                }
                c if c.is_ascii_alphanumeric() || c == '_' => word.push(c),
                _ => flush_word(&mut word, region, &mut tokens),
            },
        }
    }
    flush_word(&mut word, region, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, region: Region, out: &mut Vec<(String, TokenSource)>) {
    if word.is_empty() {
        return;
    }
    let source = match region {
        Region::LineComment | Region::BlockComment => TokenSource::Comment,
        Region::Str(_) => TokenSource::StringLiteral,
        // Identifier-shaped words (snake or mixed case) are attributed to the
        // identifier source; bare lowercase words fall into the code body.
        Region::Code => {
            let has_snake = word.contains('_');
            let has_mixed = word.chars().any(|c| c.is_ascii_lowercase())
                && word.chars().any(|c| c.is_ascii_uppercase());
            if has_snake || has_mixed {
                TokenSource::Identifier
            } else {
                TokenSource::Body
            }
        }
    };
    for part in split_identifier(word) {
        if !is_bootstrap_stopword(&part) {
            out.push((part, source));
        }
    }
    word.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_snake_and_camel() {
        assert_eq!(split_identifier("heap_insert"), vec!["heap", "insert"]);
        assert_eq!(split_identifier("heapInsert"), vec!["heap", "insert"]);
        assert_eq!(split_identifier("HeapSortTree"), vec!["heap", "sort", "tree"]);
        assert_eq!(split_identifier("HTTPServer"), vec!["http", "server"]);
    }

    #[test]
    fn query_tokens_drop_bootstrap_stops() {
        let terms = tokenize_query("how does the heap_insert function work");
        assert!(terms.contains(&"heap".to_string()));
        assert!(terms.contains(&"insert".to_string()));
        assert!(!terms.contains(&"the".to_string()));
        assert!(!terms.contains(&"function".to_string()));
    }

    #[test]
    fn attributes_comment_and_string_sources() {
        let file = SourceFile::new(
            "x.c",
            "// rebalance subtree\nint heap_insert(Node *n) { puts(\"overflow guard\"); }\n",
            "c",
        );
        let tokens = tokenize_file(&file);
        assert!(tokens.contains(&("rebalance".to_string(), TokenSource::Comment)));
        assert!(tokens.contains(&("heap".to_string(), TokenSource::Identifier)));
        assert!(tokens.contains(&("overflow".to_string(), TokenSource::StringLiteral)));
        // "puts" is a bare lowercase code word -> body source
        assert!(tokens.contains(&("puts".to_string(), TokenSource::Body)));
    }

    #[test]
    fn path_components_are_tokenized() {
        let file = SourceFile::new("src/heap_tree/insert.c", "", "c");
        let tokens = tokenize_file(&file);
        assert!(tokens.contains(&("heap".to_string(), TokenSource::Path)));
        assert!(tokens.contains(&("tree".to_string(), TokenSource::Path)));
        assert!(tokens.contains(&("insert".to_string(), TokenSource::Path)));
    }
}
