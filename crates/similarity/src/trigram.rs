use quarry_protocol::SourceFile;
use std::collections::{HashMap, HashSet};

/// A fuzzy substring match verified against the actual line text.
#[derive(Debug, Clone, PartialEq)]
pub struct TrigramHit {
    pub file: String,
    /// 1-based.
    pub line: u32,
    pub line_text: String,
    /// Fraction of query trigrams present in the line, in (0, 1].
    pub score: f32,
}

/// Trigram positional index for fuzzy substring search, independent of the
/// embedding path.
///
/// A file enters the candidate set only when it contains at least half of the
/// query's trigrams; candidate lines are then re-verified against their text,
/// so index false positives can never reach the caller.
pub struct TrigramIndex {
    /// trigram -> file -> lines containing it.
    grams: HashMap<[u8; 3], HashMap<String, HashSet<u32>>>,
    /// Lowercased line text per file, for verification and reporting.
    lines: HashMap<String, Vec<String>>,
}

/// Minimum fraction of query trigrams a file (and then a line) must contain.
const CANDIDATE_THRESHOLD: f32 = 0.5;

impl TrigramIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grams: HashMap::new(),
            lines: HashMap::new(),
        }
    }

    pub fn build(&mut self, files: &[SourceFile]) {
        self.grams.clear();
        self.lines.clear();
        for file in files {
            self.add_file(file);
        }
        log::info!(
            "Trigram index built: {} files, {} distinct trigrams",
            self.lines.len(),
            self.grams.len()
        );
    }

    pub fn add_file(&mut self, file: &SourceFile) {
        if self.lines.contains_key(&file.path) {
            self.remove_file(&file.path);
        }
        let lines: Vec<String> = file.content.lines().map(str::to_lowercase).collect();
        for (i, line) in lines.iter().enumerate() {
            let line_no = i as u32 + 1;
            for gram in trigrams(line) {
                self.grams
                    .entry(gram)
                    .or_default()
                    .entry(file.path.clone())
                    .or_default()
                    .insert(line_no);
            }
        }
        self.lines.insert(file.path.clone(), lines);
    }

    pub fn remove_file(&mut self, path: &str) {
        self.lines.remove(path);
        self.grams.retain(|_, by_file| {
            by_file.remove(path);
            !by_file.is_empty()
        });
    }

    /// Fuzzy substring search. The query is lowercased and reduced to its
    /// trigram set; matches are ranked by the fraction of query trigrams the
    /// line actually contains.
    #[must_use]
    pub fn search(&self, query: &str, max_results: usize) -> Vec<TrigramHit> {
        let query = query.to_lowercase();
        let query_grams: Vec<[u8; 3]> = trigrams(&query).into_iter().collect();
        if query_grams.is_empty() || self.lines.is_empty() {
            return Vec::new();
        }
        let needed = (query_grams.len() as f32 * CANDIDATE_THRESHOLD).ceil() as usize;

        // Stage 1: file-level admission by trigram overlap.
        let mut file_hits: HashMap<&str, usize> = HashMap::new();
        for gram in &query_grams {
            if let Some(by_file) = self.grams.get(gram) {
                for file in by_file.keys() {
                    *file_hits.entry(file.as_str()).or_insert(0) += 1;
                }
            }
        }
        let mut candidates: Vec<&str> = file_hits
            .into_iter()
            .filter(|(_, hits)| *hits >= needed)
            .map(|(file, _)| file)
            .collect();
        candidates.sort_unstable();

        // Stage 2: line-level verification against the stored text. The gram
        // index says which lines to look at; the text says whether the grams
        // are really there.
        let mut out = Vec::new();
        for file in candidates {
            let Some(lines) = self.lines.get(file) else {
                continue;
            };
            let mut line_candidates: HashSet<u32> = HashSet::new();
            for gram in &query_grams {
                if let Some(by_file) = self.grams.get(gram) {
                    if let Some(line_set) = by_file.get(file) {
                        line_candidates.extend(line_set);
                    }
                }
            }
            let mut line_nos: Vec<u32> = line_candidates.into_iter().collect();
            line_nos.sort_unstable();

            for line_no in line_nos {
                let Some(text) = lines.get(line_no as usize - 1) else {
                    continue;
                };
                let present = query_grams
                    .iter()
                    .filter(|gram| {
                        std::str::from_utf8(&gram[..]).is_ok_and(|g| text.contains(g))
                    })
                    .count();
                if present >= needed {
                    out.push(TrigramHit {
                        file: file.to_string(),
                        line: line_no,
                        line_text: text.clone(),
                        score: present as f32 / query_grams.len() as f32,
                    });
                }
            }
        }

        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.file.cmp(&b.file))
                .then(a.line.cmp(&b.line))
        });
        out.truncate(max_results);
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for TrigramIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct ASCII trigrams of a lowercased line. Non-ASCII text is skipped;
/// identifiers and code punctuation are what this index is for.
fn trigrams(text: &str) -> HashSet<[u8; 3]> {
    let bytes: Vec<u8> = text
        .bytes()
        .filter(|b| b.is_ascii() && !b.is_ascii_whitespace())
        .collect();
    let mut grams = HashSet::new();
    for window in bytes.windows(3) {
        grams.insert([window[0], window[1], window[2]]);
    }
    grams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(files: &[(&str, &str)]) -> TrigramIndex {
        let files: Vec<SourceFile> = files
            .iter()
            .map(|(p, c)| SourceFile::new(*p, *c, "c"))
            .collect();
        let mut index = TrigramIndex::new();
        index.build(&files);
        index
    }

    #[test]
    fn finds_exact_substring() {
        let index = index_of(&[
            ("a.c", "int heap_insert(Node *n);\n"),
            ("b.c", "int socket_accept(int fd);\n"),
        ]);
        let hits = index.search("heap_insert", 10);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].file, "a.c");
        assert_eq!(hits[0].line, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tolerates_partial_trigram_overlap() {
        let index = index_of(&[("a.c", "int heap_insert(Node *n);\n")]);
        // Typo: one edit; most trigrams still overlap.
        let hits = index.search("heap_imsert", 10);
        assert!(!hits.is_empty());
        assert!(hits[0].score >= 0.5 && hits[0].score < 1.0);
    }

    #[test]
    fn unrelated_query_finds_nothing() {
        let index = index_of(&[("a.c", "int heap_insert(Node *n);\n")]);
        assert!(index.search("zzzzzzzqqqqqq", 10).is_empty());
    }

    #[test]
    fn case_insensitive_matching() {
        let index = index_of(&[("a.c", "HeapInsert(root);\n")]);
        let hits = index.search("heapinsert", 10);
        assert!(!hits.is_empty());
    }

    #[test]
    fn remove_file_purges_grams() {
        let mut index = index_of(&[("a.c", "heap_insert(x);\n")]);
        index.remove_file("a.c");
        assert!(index.is_empty());
        assert!(index.search("heap_insert", 10).is_empty());
    }
}
