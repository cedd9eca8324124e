use crate::files::FileEntry;
use crate::LiteralIndex;
use quarry_protocol::CallSite;
use regex::Regex;
use std::collections::HashMap;

/// Reserved words that look like `name(` but are never function calls.
const EXCLUDED_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "do", "switch", "case", "return", "sizeof", "typeof", "catch",
    "match", "new", "delete", "defined", "elif", "except", "raise", "with", "yield", "await",
    "assert", "until", "unless", "not", "and", "or", "in",
];

/// Definition-line shapes, one per language family. A call site whose line
/// matches one of these (with the callee name spliced in) is treated as the
/// definition, not an invocation.
pub const DEFINITION_PATTERNS: &[&str] = &[
    // C-style: return type tokens, then the name, then the parameter list.
    r"^\s*(?:[A-Za-z_][\w:<>,\*&\s\[\]]*[\s\*&])NAME\s*\(",
    // Rust / Python / JS keyword-led definitions.
    r"^\s*(?:pub(?:\(\w+\))?\s+)?(?:async\s+)?fn\s+NAME\s*[\(<]",
    r"^\s*(?:async\s+)?def\s+NAME\s*\(",
    r"\bfunction\s+NAME\s*\(",
];

#[derive(Debug, Clone)]
pub struct CallSearchOptions {
    /// Include lines that look like the function's definition.
    pub include_definitions: bool,
    pub max_results: usize,
}

impl Default for CallSearchOptions {
    fn default() -> Self {
        Self {
            include_definitions: false,
            max_results: 100,
        }
    }
}

/// Scan one file for the four call shapes (`name(`, `.name(`, `->name(`,
/// `::name(`) and record each site keyed by callee name.
pub(crate) fn scan_file(
    path: &str,
    entry: &FileEntry,
    call_sites: &mut HashMap<String, Vec<CallSite>>,
) {
    let bytes = entry.content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !(b.is_ascii_alphabetic() || b == b'_') {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }

        // Skip horizontal whitespace between the name and a possible paren.
        let mut j = i;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'(' {
            continue;
        }

        let name = &entry.content[start..i];
        if EXCLUDED_KEYWORDS.contains(&name) {
            continue;
        }

        let (line, column) = entry.position_of(start);
        call_sites.entry(name.to_string()).or_default().push(CallSite {
            file: path.to_string(),
            line,
            column,
            line_text: entry.line_text(line).to_string(),
        });
    }
}

/// Heuristic definition detector for `search_function_calls`.
fn is_probable_definition(line: &str, name: &str) -> bool {
    let escaped = regex::escape(name);
    DEFINITION_PATTERNS.iter().any(|template| {
        let pattern = template.replace("NAME", &escaped);
        Regex::new(&pattern).is_ok_and(|re| re.is_match(line))
    })
}

impl LiteralIndex {
    /// All recorded call sites of `name`. O(1) map lookup; definition lines
    /// are filtered out unless the caller asks for them.
    #[must_use]
    pub fn search_function_calls(&self, name: &str, opts: &CallSearchOptions) -> Vec<CallSite> {
        let Some(sites) = self.call_sites.get(name) else {
            return Vec::new();
        };

        let mut out: Vec<CallSite> = sites
            .iter()
            .filter(|site| opts.include_definitions || !is_probable_definition(&site.line_text, name))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        out.truncate(opts.max_results);
        out
    }

    /// Names with at least one recorded call site.
    #[must_use]
    pub fn known_callees(&self) -> usize {
        self.call_sites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_protocol::SourceFile;

    fn index_of(files: &[(&str, &str)]) -> LiteralIndex {
        let files: Vec<SourceFile> = files
            .iter()
            .map(|(p, c)| SourceFile::new(*p, *c, "c"))
            .collect();
        let mut index = LiteralIndex::new();
        index.build(&files);
        index
    }

    #[test]
    fn finds_call_site_but_not_definition() {
        let index = index_of(&[
            ("a.c", "int heap_insert(Node *n) {\n  return 0;\n}\n"),
            ("b.c", "void build(void) {\n  heap_insert(root);\n}\n"),
        ]);
        let calls =
            index.search_function_calls("heap_insert", &CallSearchOptions::default());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file, "b.c");
        assert_eq!(calls[0].line, 2);
    }

    #[test]
    fn include_definitions_adds_the_definition_line() {
        let index = index_of(&[
            ("a.c", "int heap_insert(Node *n) { return 0; }\n"),
            ("b.c", "heap_insert(root);\n"),
        ]);
        let opts = CallSearchOptions {
            include_definitions: true,
            ..CallSearchOptions::default()
        };
        let calls = index.search_function_calls("heap_insert", &opts);
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn recognizes_method_and_scoped_call_shapes() {
        let index = index_of(&[(
            "x.cc",
            "void run() {\n  obj.flush();\n  ptr->flush();\n  Io::flush();\n}\n",
        )]);
        let calls = index.search_function_calls("flush", &CallSearchOptions::default());
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn control_flow_keywords_are_not_callees() {
        let index = index_of(&[("x.c", "if (a) { while (b) { f(c); } }\n")]);
        assert!(index
            .search_function_calls("if", &CallSearchOptions::default())
            .is_empty());
        assert!(index
            .search_function_calls("while", &CallSearchOptions::default())
            .is_empty());
        assert_eq!(
            index
                .search_function_calls("f", &CallSearchOptions::default())
                .len(),
            1
        );
    }

    #[test]
    fn rust_and_python_definitions_are_excluded() {
        let index = index_of(&[
            ("m.rs", "pub fn parse_frame(buf: &[u8]) {}\nparse_frame(&data);\n"),
            ("m.py", "def parse_frame(buf):\n    pass\nparse_frame(data)\n"),
        ]);
        let calls =
            index.search_function_calls("parse_frame", &CallSearchOptions::default());
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| !c.line_text.contains("fn ")
            && !c.line_text.contains("def ")));
    }

    #[test]
    fn remove_file_drops_its_sites() {
        let mut index = index_of(&[
            ("a.c", "helper(1);\n"),
            ("b.c", "helper(2);\n"),
        ]);
        index.remove_file("a.c").unwrap();
        let calls = index.search_function_calls("helper", &CallSearchOptions::default());
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].file, "b.c");
    }
}
