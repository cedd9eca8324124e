use crate::embed::{cosine_similarity, Embedder};
use crate::{Result, SimilarityError, DEFAULT_MIN_SIMILARITY};
use quarry_protocol::SourceFile;
use serde::{Deserialize, Serialize};

/// A bounded text window over one file with an associated vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub file: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
}

/// A cosine-ranked chunk match.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Brute-force cosine index over file chunks.
///
/// Brute force is deliberate: corpora here are single projects, and a scan
/// over a few thousand 256-dim vectors is faster than maintaining an ANN
/// structure that must also support per-file removal.
pub struct SimilarityIndex {
    embedder: Embedder,
    chunk_max_lines: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    min_similarity: f32,
}

impl SimilarityIndex {
    #[must_use]
    pub fn new(embedder: Embedder, chunk_max_lines: usize) -> Self {
        Self {
            embedder,
            chunk_max_lines: chunk_max_lines.max(1),
            chunks: Vec::new(),
            vectors: Vec::new(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }

    pub fn set_min_similarity(&mut self, floor: f32) {
        self.min_similarity = floor;
    }

    /// Build from a full snapshot, replacing previous state.
    pub fn build(&mut self, files: &[SourceFile]) {
        self.chunks.clear();
        self.vectors.clear();
        for file in files {
            self.add_file(file);
        }
        log::info!("Similarity index built: {} chunks", self.chunks.len());
    }

    /// Chunk one file and embed each window.
    pub fn add_file(&mut self, file: &SourceFile) {
        if self.chunks.iter().any(|c| c.file == file.path) {
            let _ = self.remove_file(&file.path);
        }
        for chunk in chunk_file(file, self.chunk_max_lines) {
            let vector = self.embedder.embed(&chunk.text);
            self.chunks.push(chunk);
            self.vectors.push(vector);
        }
    }

    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        let before = self.chunks.len();
        let mut kept_chunks = Vec::with_capacity(before);
        let mut kept_vectors = Vec::with_capacity(before);
        for (chunk, vector) in self.chunks.drain(..).zip(self.vectors.drain(..)) {
            if chunk.file != path {
                kept_chunks.push(chunk);
                kept_vectors.push(vector);
            }
        }
        self.chunks = kept_chunks;
        self.vectors = kept_vectors;
        if self.chunks.len() == before {
            return Err(SimilarityError::UnknownFile(path.to_string()));
        }
        Ok(())
    }

    /// Embed the query text and rank chunks by cosine similarity. Scores
    /// below the similarity floor are dropped before top-K selection.
    #[must_use]
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SimilarityHit> {
        if self.chunks.is_empty() {
            log::debug!("Similarity search on empty index");
            return Vec::new();
        }
        let query_vector = self.embedder.embed(query);
        self.search_vector(&query_vector, top_k)
    }

    /// Rank chunks against a pre-computed query vector.
    #[must_use]
    pub fn search_vector(&self, query: &[f32], top_k: usize) -> Vec<SimilarityHit> {
        if query.len() != self.embedder.dimension() {
            log::warn!(
                "Similarity query dimension {} does not match index dimension {}",
                query.len(),
                self.embedder.dimension()
            );
            return Vec::new();
        }

        let mut hits: Vec<SimilarityHit> = self
            .vectors
            .iter()
            .zip(self.chunks.iter())
            .filter_map(|(vector, chunk)| {
                let score = cosine_similarity(query, vector);
                (score >= self.min_similarity).then(|| SimilarityHit {
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }
}

/// Split a file into line-bounded windows of at most `max_lines`.
fn chunk_file(file: &SourceFile, max_lines: usize) -> Vec<Chunk> {
    let lines: Vec<&str> = file.content.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    lines
        .chunks(max_lines)
        .enumerate()
        .map(|(i, window)| {
            let start_line = (i * max_lines) as u32 + 1;
            let end_line = start_line + window.len() as u32 - 1;
            Chunk {
                id: format!("{}:{start_line}-{end_line}", file.path),
                file: file.path.clone(),
                start_line,
                end_line,
                text: window.join("\n"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hashed_index(files: &[(&str, &str)]) -> SimilarityIndex {
        let files: Vec<SourceFile> = files
            .iter()
            .map(|(p, c)| SourceFile::new(*p, *c, "c"))
            .collect();
        let mut index = SimilarityIndex::new(Embedder::Hashed { dimension: 128 }, 40);
        index.build(&files);
        index
    }

    #[test]
    fn ranks_related_chunks_first() {
        let index = hashed_index(&[
            ("heap.c", "void heap_insert(Node *n) { rebalance(n); }"),
            ("net.c", "int socket_accept(int fd) { return accept(fd); }"),
        ]);
        let hits = index.search("heap insert rebalance", 5);
        assert!(!hits.is_empty());
        assert_eq!(hits[0].chunk.file, "heap.c");
    }

    #[test]
    fn similarity_floor_drops_weak_matches() {
        let mut index = hashed_index(&[("a.c", "alpha beta gamma")]);
        index.set_min_similarity(0.99);
        let hits = index.search("entirely unrelated words here", 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn chunks_split_on_line_boundaries() {
        let content = (1..=100)
            .map(|i| format!("line_{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let file = SourceFile::new("big.c", content, "c");
        let chunks = chunk_file(&file, 40);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 40);
        assert_eq!(chunks[2].start_line, 81);
        assert_eq!(chunks[2].end_line, 100);
    }

    #[test]
    fn remove_file_drops_its_chunks() {
        let mut index = hashed_index(&[("a.c", "alpha"), ("b.c", "beta")]);
        assert_eq!(index.chunk_count(), 2);
        index.remove_file("a.c").unwrap();
        assert_eq!(index.chunk_count(), 1);
        assert!(index.remove_file("a.c").is_err());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = hashed_index(&[("a.c", "alpha")]);
        assert!(index.search_vector(&[1.0, 0.0], 5).is_empty());
    }
}
