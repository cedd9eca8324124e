use crate::LiteralIndex;
use regex::RegexBuilder;

#[derive(Debug, Clone)]
pub struct LiteralSearchOptions {
    pub case_sensitive: bool,
    /// Require identifier-boundary characters around the match.
    pub whole_word: bool,
    pub max_results: usize,
    /// Lines of surrounding context captured per match.
    pub context_lines: usize,
}

impl Default for LiteralSearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            max_results: 100,
            context_lines: 0,
        }
    }
}

/// One literal or regex match with its recovered location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralMatch {
    pub file: String,
    /// 1-based.
    pub line: u32,
    /// 0-based byte column.
    pub column: u32,
    pub line_text: String,
    /// Surrounding lines when `context_lines > 0`, in file order.
    pub context: Vec<String>,
}

/// Regex search outcome. A malformed pattern produces an empty match set and
/// an error string; it never surfaces as `Err` to the caller.
#[derive(Debug, Clone, Default)]
pub struct RegexOutcome {
    pub matches: Vec<LiteralMatch>,
    pub error: Option<String>,
}

impl LiteralIndex {
    /// Exact substring search across all files.
    #[must_use]
    pub fn search_literal(&self, pattern: &str, opts: &LiteralSearchOptions) -> Vec<LiteralMatch> {
        if pattern.is_empty() || self.files.is_empty() {
            return Vec::new();
        }

        // ASCII-only folding: full Unicode lowercasing can change byte
        // length, which would shift every recovered line/column offset.
        let needle = if opts.case_sensitive {
            pattern.to_string()
        } else {
            pattern.to_ascii_lowercase()
        };

        let mut out = Vec::new();
        for path in self.paths() {
            if out.len() >= opts.max_results {
                break;
            }
            let entry = &self.files[path];
            let haystack = if opts.case_sensitive {
                entry.content.clone()
            } else {
                entry.content.to_ascii_lowercase()
            };

            let mut from = 0;
            while let Some(rel) = haystack[from..].find(&needle) {
                let offset = from + rel;
                from = offset + needle.len().max(1);

                if opts.whole_word && !is_word_bounded(&haystack, offset, needle.len()) {
                    continue;
                }

                let (line, column) = entry.position_of(offset);
                out.push(LiteralMatch {
                    file: path.to_string(),
                    line,
                    column,
                    line_text: entry.line_text(line).to_string(),
                    context: context_for(entry, line, opts.context_lines),
                });
                if out.len() >= opts.max_results {
                    break;
                }
            }
        }
        out
    }

    /// Regex search across all files. The cursor is force-advanced past
    /// zero-width matches so patterns like `a*` cannot loop forever.
    #[must_use]
    pub fn search_regex(&self, pattern: &str, opts: &LiteralSearchOptions) -> RegexOutcome {
        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(!opts.case_sensitive)
            .build()
        {
            Ok(re) => re,
            Err(err) => {
                log::debug!("Malformed regex query '{pattern}': {err}");
                return RegexOutcome {
                    matches: Vec::new(),
                    error: Some(format!("invalid regex: {err}")),
                };
            }
        };

        let mut out = Vec::new();
        'files: for path in self.paths() {
            let entry = &self.files[path];
            let mut at = 0;
            while at <= entry.content.len() {
                let Some(m) = regex.find_at(&entry.content, at) else {
                    break;
                };

                // Zero-width guard: always make progress.
                at = if m.end() > m.start() {
                    m.end()
                } else {
                    next_char_boundary(&entry.content, m.end())
                };

                let (line, column) = entry.position_of(m.start());
                out.push(LiteralMatch {
                    file: path.to_string(),
                    line,
                    column,
                    line_text: entry.line_text(line).to_string(),
                    context: context_for(entry, line, opts.context_lines),
                });
                if out.len() >= opts.max_results {
                    break 'files;
                }
            }
        }

        RegexOutcome {
            matches: out,
            error: None,
        }
    }
}

fn is_word_bounded(haystack: &str, offset: usize, len: usize) -> bool {
    let before = haystack[..offset].chars().next_back();
    let after = haystack[offset + len..].chars().next();
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    !before.is_some_and(is_word) && !after.is_some_and(is_word)
}

fn next_char_boundary(text: &str, mut at: usize) -> usize {
    at += 1;
    while at < text.len() && !text.is_char_boundary(at) {
        at += 1;
    }
    at
}

fn context_for(entry: &crate::FileEntry, line: u32, context_lines: usize) -> Vec<String> {
    if context_lines == 0 {
        return Vec::new();
    }
    let first = line.saturating_sub(context_lines as u32).max(1);
    let last = (line + context_lines as u32).min(entry.line_count() as u32);
    (first..=last)
        .filter(|n| *n != line)
        .map(|n| entry.line_text(n).to_string())
        .collect()
}
